//! State-region predicates.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::trajectory::Frame;

/// Region of configuration space used as a path-sampling boundary condition.
pub trait Volume<F>: Send + Sync {
    /// Whether `frame` lies inside the region.
    fn contains(&self, frame: &F) -> bool;

    /// Label used in diagnostics and state tables.
    fn name(&self) -> &str;
}

/// Half-open interval `lower <= x < upper` on a single coordinate.
///
/// A missing bound is unbounded on that side. Frames that do not have the
/// requested coordinate are never inside the volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeVolume {
    /// Name of the state.
    pub name: String,
    /// Coordinate index evaluated by the volume.
    #[serde(default)]
    pub coordinate: usize,
    /// Inclusive lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,
    /// Exclusive upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
}

impl RangeVolume {
    /// Creates a range volume over `coordinate`.
    pub fn new(
        name: impl Into<String>,
        coordinate: usize,
        lower: Option<f64>,
        upper: Option<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            coordinate,
            lower,
            upper,
        }
    }

    /// Everything strictly below `upper`.
    pub fn below(name: impl Into<String>, coordinate: usize, upper: f64) -> Self {
        Self::new(name, coordinate, None, Some(upper))
    }

    /// Everything at or above `lower`.
    pub fn at_or_above(name: impl Into<String>, coordinate: usize, lower: f64) -> Self {
        Self::new(name, coordinate, Some(lower), None)
    }

    fn contains_value(&self, value: f64) -> bool {
        self.lower.map_or(true, |lower| value >= lower)
            && self.upper.map_or(true, |upper| value < upper)
    }
}

impl Volume<Frame> for RangeVolume {
    fn contains(&self, frame: &Frame) -> bool {
        frame
            .coordinate(self.coordinate)
            .map_or(false, |value| self.contains_value(value))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Ordered collection of disjoint state volumes.
pub struct StateSet<F> {
    states: Vec<Arc<dyn Volume<F>>>,
}

impl<F> Clone for StateSet<F> {
    fn clone(&self) -> Self {
        Self {
            states: self.states.clone(),
        }
    }
}

impl<F> Default for StateSet<F> {
    fn default() -> Self {
        Self { states: Vec::new() }
    }
}

impl<F> fmt::Debug for StateSet<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSet")
            .field("states", &self.names())
            .finish()
    }
}

impl<F> StateSet<F> {
    /// Creates an empty state set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a state set from already shared volumes.
    pub fn from_volumes(states: Vec<Arc<dyn Volume<F>>>) -> Self {
        Self { states }
    }

    /// Appends a state and returns the set.
    pub fn with_state(mut self, state: impl Volume<F> + 'static) -> Self {
        self.push(state);
        self
    }

    /// Appends a state.
    pub fn push(&mut self, state: impl Volume<F> + 'static) {
        self.states.push(Arc::new(state));
    }

    /// Number of states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no state is defined.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// State names in definition order.
    pub fn names(&self) -> Vec<&str> {
        self.states.iter().map(|state| state.name()).collect()
    }

    /// Index of the first state containing `frame`.
    pub fn state_of(&self, frame: &F) -> Option<usize> {
        self.states.iter().position(|state| state.contains(frame))
    }

    /// Name of the first state containing `frame`.
    pub fn state_name(&self, frame: &F) -> Option<&str> {
        self.state_of(frame)
            .and_then(|index| self.states.get(index))
            .map(|state| state.name())
    }

    /// Whether `frame` lies in any state.
    pub fn in_any(&self, frame: &F) -> bool {
        self.state_of(frame).is_some()
    }
}

impl From<Vec<RangeVolume>> for StateSet<Frame> {
    fn from(volumes: Vec<RangeVolume>) -> Self {
        volumes
            .into_iter()
            .fold(StateSet::new(), |set, volume| set.with_state(volume))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_bounds_are_half_open() {
        let right = RangeVolume::at_or_above("right", 0, 10.0);
        assert!(right.contains(&Frame::scalar(10.0)));
        assert!(!right.contains(&Frame::scalar(9.99)));

        let left = RangeVolume::below("left", 0, 0.0);
        assert!(left.contains(&Frame::scalar(-0.1)));
        assert!(!left.contains(&Frame::scalar(0.0)));
    }

    #[test]
    fn missing_coordinate_is_outside() {
        let volume = RangeVolume::new("far", 3, None, None);
        assert!(!volume.contains(&Frame::scalar(1.0)));
    }
}
