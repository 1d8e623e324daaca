//! Boundary and transition ensembles evaluated over a [`StateSet`].
//!
//! Splits are reported as half-open [`Segment`]s into the input so callers
//! can account for the frames that were cut away.

use serde::{Deserialize, Serialize};

use crate::trajectory::Trajectory;
use crate::volume::StateSet;

/// Half-open frame range `start..end` inside a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// First frame of the segment.
    pub start: usize,
    /// One past the last frame of the segment.
    pub end: usize,
}

impl Segment {
    /// Number of frames covered.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the segment is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frames cut from a trajectory of `total` frames to obtain this segment.
    pub fn removed(&self, total: usize) -> usize {
        total.saturating_sub(self.len())
    }

    /// Frames cut after the segment in a trajectory of `total` frames.
    pub fn removed_after(&self, total: usize) -> usize {
        total.saturating_sub(self.end)
    }

    /// Extracts the segment from `trajectory`.
    pub fn apply<F>(&self, trajectory: &Trajectory<F>) -> Trajectory<F> {
        trajectory.slice(self.start, self.end)
    }
}

impl<F> StateSet<F> {
    fn labels(&self, trajectory: &Trajectory<F>) -> Vec<Option<usize>> {
        trajectory.iter().map(|frame| self.state_of(frame)).collect()
    }

    /// Every subtrajectory that leaves all states and then touches a state
    /// for exactly one frame, in time order.
    pub fn split_forward(&self, trajectory: &Trajectory<F>) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut run_start = None;
        for (index, label) in self.labels(trajectory).into_iter().enumerate() {
            match label {
                None => {
                    run_start.get_or_insert(index);
                }
                Some(_) => {
                    if let Some(start) = run_start.take() {
                        segments.push(Segment {
                            start,
                            end: index + 1,
                        });
                    }
                }
            }
        }
        segments
    }

    /// Every subtrajectory made of one in-state frame followed by frames
    /// outside all states, in time order.
    pub fn split_backward(&self, trajectory: &Trajectory<F>) -> Vec<Segment> {
        let labels = self.labels(trajectory);
        let mut segments = Vec::new();
        let mut anchor: Option<usize> = None;
        for (index, label) in labels.iter().enumerate() {
            if label.is_some() {
                if let Some(start) = anchor {
                    if index > start + 1 {
                        segments.push(Segment { start, end: index });
                    }
                }
                anchor = Some(index);
            }
        }
        if let Some(start) = anchor {
            if labels.len() > start + 1 {
                segments.push(Segment {
                    start,
                    end: labels.len(),
                });
            }
        }
        segments
    }

    /// Every subtrajectory that starts in one state, leaves all states and
    /// ends in a different state.
    pub fn split_transitions(&self, trajectory: &Trajectory<F>) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut last_in: Option<(usize, usize)> = None;
        for (index, label) in self.labels(trajectory).into_iter().enumerate() {
            let Some(state) = label else { continue };
            if let Some((start, from)) = last_in {
                if state != from && index > start + 1 {
                    segments.push(Segment {
                        start,
                        end: index + 1,
                    });
                }
            }
            last_in = Some((index, state));
        }
        segments
    }

    /// Minimal forward one-way segment: the first forward split.
    pub fn trim_forward(&self, trajectory: &Trajectory<F>) -> Option<Segment> {
        self.split_forward(trajectory).into_iter().next()
    }

    /// Minimal backward one-way segment: the last backward split.
    pub fn trim_backward(&self, trajectory: &Trajectory<F>) -> Option<Segment> {
        self.split_backward(trajectory).into_iter().last()
    }
}
