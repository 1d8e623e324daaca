//! Immutable, frame-sharing trajectory container.
//!
//! Frames are reference counted: slicing, reversing and splicing produce new
//! trajectories whose frames point at the same allocations as their parents.
//! Two trajectories share a frame when both hold the same `Arc`, which is the
//! notion of "shared subtrajectory" used by the replay engine and the
//! decorrelation analysis.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Plain coordinate frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Flattened coordinates (or order parameters) of the configuration.
    pub coordinates: Vec<f64>,
}

impl Frame {
    /// Creates a frame from raw coordinates.
    pub fn new(coordinates: Vec<f64>) -> Self {
        Self { coordinates }
    }

    /// Creates a one-dimensional frame.
    pub fn scalar(value: f64) -> Self {
        Self {
            coordinates: vec![value],
        }
    }

    /// Returns the coordinate along `axis`, if present.
    pub fn coordinate(&self, axis: usize) -> Option<f64> {
        self.coordinates.get(axis).copied()
    }

    /// Number of coordinates stored in the frame.
    pub fn dimension(&self) -> usize {
        self.coordinates.len()
    }
}

/// Ordered, immutable sequence of frames.
pub struct Trajectory<F> {
    frames: Arc<Vec<Arc<F>>>,
}

impl<F> Clone for Trajectory<F> {
    fn clone(&self) -> Self {
        Self {
            frames: Arc::clone(&self.frames),
        }
    }
}

impl<F> Default for Trajectory<F> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<F: fmt::Debug> fmt::Debug for Trajectory<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<F> Trajectory<F> {
    /// Wraps freshly created frames.
    pub fn new(frames: Vec<F>) -> Self {
        Self::from_shared(frames.into_iter().map(Arc::new).collect())
    }

    /// Builds a trajectory from frames that may already be shared.
    pub fn from_shared(frames: Vec<Arc<F>>) -> Self {
        Self {
            frames: Arc::new(frames),
        }
    }

    /// Trajectory without frames.
    pub fn empty() -> Self {
        Self::from_shared(Vec::new())
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the trajectory holds no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Shared handles of every frame, in time order.
    pub fn frames(&self) -> &[Arc<F>] {
        &self.frames
    }

    /// Frame at `index`.
    pub fn get(&self, index: usize) -> Option<&F> {
        self.frames.get(index).map(|frame| frame.as_ref())
    }

    /// Shared handle of the frame at `index`.
    pub fn frame(&self, index: usize) -> Option<&Arc<F>> {
        self.frames.get(index)
    }

    /// First frame.
    pub fn first(&self) -> Option<&F> {
        self.frames.first().map(|frame| frame.as_ref())
    }

    /// Last frame.
    pub fn last(&self) -> Option<&F> {
        self.frames.last().map(|frame| frame.as_ref())
    }

    /// Iterates over frames in time order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &F> + ExactSizeIterator + '_ {
        self.frames.iter().map(|frame| frame.as_ref())
    }

    /// Resolves a possibly negative index (counted from the end) into a
    /// position inside the trajectory.
    pub fn resolve_index(&self, index: isize) -> Option<usize> {
        let len = isize::try_from(self.len()).ok()?;
        let resolved = if index < 0 { index + len } else { index };
        if (0..len).contains(&resolved) {
            usize::try_from(resolved).ok()
        } else {
            None
        }
    }

    /// Same frames in reverse time order.
    pub fn reversed(&self) -> Self {
        Self::from_shared(self.frames.iter().rev().cloned().collect())
    }

    /// Frames in `start..end`; both bounds are clamped to the trajectory.
    pub fn slice(&self, start: usize, end: usize) -> Self {
        let end = end.min(self.len());
        let start = start.min(end);
        Self::from_shared(self.frames[start..end].to_vec())
    }

    /// Frames from `start` to the end.
    pub fn tail_from(&self, start: usize) -> Self {
        self.slice(start, self.len())
    }

    /// Frames before `end`.
    pub fn head_until(&self, end: usize) -> Self {
        self.slice(0, end)
    }

    /// `self` followed by `other`, sharing the frames of both.
    pub fn concat(&self, other: &Self) -> Self {
        let mut frames = Vec::with_capacity(self.len() + other.len());
        frames.extend(self.frames.iter().cloned());
        frames.extend(other.frames.iter().cloned());
        Self::from_shared(frames)
    }

    /// Whether the frame at `index` is the very same frame as `other[other_index]`.
    pub fn shares_frame(&self, index: usize, other: &Self, other_index: usize) -> bool {
        match (self.frames.get(index), other.frames.get(other_index)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Number of frames of `self` that are also held by `other`.
    pub fn shared_frame_count(&self, other: &Self) -> usize {
        let theirs: HashSet<*const F> = other.frames.iter().map(Arc::as_ptr).collect();
        self.frames
            .iter()
            .filter(|frame| theirs.contains(&Arc::as_ptr(*frame)))
            .count()
    }

    /// Whether any frame is shared with `other`.
    pub fn shares_frames_with(&self, other: &Self) -> bool {
        self.shared_frame_count(other) > 0
    }
}

impl Trajectory<Frame> {
    /// One-dimensional trajectory, one frame per value.
    pub fn from_scalars(values: &[f64]) -> Self {
        Self::new(values.iter().copied().map(Frame::scalar).collect())
    }

    /// First coordinate of every frame; frames without coordinates yield NaN.
    pub fn scalars(&self) -> Vec<f64> {
        self.iter()
            .map(|frame| frame.coordinate(0).unwrap_or(f64::NAN))
            .collect()
    }
}

impl<F: PartialEq> PartialEq for Trajectory<F> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.frames, &other.frames)
            || (self.len() == other.len()
                && self
                    .frames
                    .iter()
                    .zip(other.frames.iter())
                    .all(|(a, b)| Arc::ptr_eq(a, b) || a == b))
    }
}

impl<F> FromIterator<F> for Trajectory<F> {
    fn from_iter<I: IntoIterator<Item = F>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<F: Serialize> Serialize for Trajectory<F> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de, F: Deserialize<'de>> Deserialize<'de> for Trajectory<F> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<F>::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_share_frames_with_parent() {
        let traj = Trajectory::from_scalars(&[0.0, 1.0, 2.0, 3.0]);
        let tail = traj.tail_from(2);
        assert_eq!(tail.scalars(), vec![2.0, 3.0]);
        assert!(tail.shares_frame(0, &traj, 2));
        assert_eq!(tail.shared_frame_count(&traj), 2);
    }

    #[test]
    fn equal_values_are_not_shared_frames() {
        let a = Trajectory::from_scalars(&[1.0, 2.0]);
        let b = Trajectory::from_scalars(&[1.0, 2.0]);
        assert_eq!(a, b);
        assert!(!a.shares_frames_with(&b));
    }

    #[test]
    fn slice_bounds_are_clamped() {
        let traj = Trajectory::from_scalars(&[0.0, 1.0, 2.0]);
        assert_eq!(traj.slice(1, 10).len(), 2);
        assert!(traj.slice(5, 2).is_empty());
    }
}
