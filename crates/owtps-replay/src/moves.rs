use std::fmt;
use std::sync::Arc;

use owtps_core::Trajectory;
use serde::{Deserialize, Serialize};

/// Time direction in which a one-way trial was generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// Shot forward in time from the shooting point.
    Forward,
    /// Shot backward in time from the shooting point.
    Backward,
}

impl Direction {
    /// `+1` for forward, `-1` for backward.
    pub fn sign(self) -> i32 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }

    /// Whether this is the forward direction.
    pub fn is_forward(self) -> bool {
        matches!(self, Direction::Forward)
    }

    /// Mover that records shots in this direction.
    pub fn mover(self) -> MoverKind {
        match self {
            Direction::Forward => MoverKind::ForwardShooting,
            Direction::Backward => MoverKind::BackwardShooting,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Backward => write!(f, "backward"),
        }
    }
}

/// Movers of the one-way shooting scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MoverKind {
    /// One-way forward shooting.
    ForwardShooting,
    /// One-way backward shooting.
    BackwardShooting,
}

impl MoverKind {
    /// Stable label used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            MoverKind::ForwardShooting => "forward-shooting",
            MoverKind::BackwardShooting => "backward-shooting",
        }
    }

    /// Move group the mover belongs to.
    pub fn group(&self) -> &'static str {
        "shooting"
    }

    /// Direction the mover shoots in.
    pub fn direction(&self) -> Direction {
        match self {
            MoverKind::ForwardShooting => Direction::Forward,
            MoverKind::BackwardShooting => Direction::Backward,
        }
    }
}

/// One externally computed shooting move, ready for replay.
#[derive(Debug, Serialize, Deserialize)]
pub struct MoveRecord<F> {
    /// Replica whose current trajectory was shot from.
    pub replica: usize,
    /// Trial trajectory (one-way segment or pre-joined path).
    pub trial: Trajectory<F>,
    /// Shooting frame in the current trajectory; negative counts from the end.
    pub shooting_index: isize,
    /// Whether the external engine accepted the trial.
    pub accepted: bool,
    /// Direction of the shot.
    pub direction: Direction,
}

impl<F> Clone for MoveRecord<F> {
    fn clone(&self) -> Self {
        Self {
            replica: self.replica,
            trial: self.trial.clone(),
            shooting_index: self.shooting_index,
            accepted: self.accepted,
            direction: self.direction,
        }
    }
}

impl<F> MoveRecord<F> {
    /// Record for replica 0, the only replica of plain TPS.
    pub fn new(trial: Trajectory<F>, shooting_index: isize, accepted: bool, direction: Direction) -> Self {
        Self {
            replica: 0,
            trial,
            shooting_index,
            accepted,
            direction,
        }
    }

    /// Same record aimed at another replica.
    pub fn with_replica(mut self, replica: usize) -> Self {
        self.replica = replica;
        self
    }
}

/// Joins a one-way `segment` to `current` at `shooting_index`.
///
/// Forward keeps `current[..=shooting_index]` and appends the segment.
/// Backward prepends the segment to `current[shooting_index..]`.
pub fn splice<F>(
    current: &Trajectory<F>,
    shooting_index: usize,
    segment: &Trajectory<F>,
    direction: Direction,
) -> Trajectory<F> {
    match direction {
        Direction::Forward => current.head_until(shooting_index + 1).concat(segment),
        Direction::Backward => segment.concat(&current.tail_from(shooting_index)),
    }
}

/// Number of frames of `current` that a trial shot at `shooting_index` carries over.
pub fn carried_len(current_len: usize, shooting_index: usize, direction: Direction) -> usize {
    match direction {
        Direction::Forward => (shooting_index + 1).min(current_len),
        Direction::Backward => current_len.saturating_sub(shooting_index),
    }
}

/// Inverse of [`splice`]: the new frames of a pre-joined trial.
pub fn one_way_segment<F>(
    joined: &Trajectory<F>,
    carried: usize,
    direction: Direction,
) -> Trajectory<F> {
    match direction {
        Direction::Forward => joined.tail_from(carried),
        Direction::Backward => joined.head_until(joined.len().saturating_sub(carried)),
    }
}

fn same_frame<F: PartialEq>(a: &Arc<F>, b: &Arc<F>) -> bool {
    Arc::ptr_eq(a, b) || a == b
}

/// Whether a pre-joined `trial` carries over the part of `current` that a shot
/// at `shooting_index` in `direction` keeps.
pub fn reuses_current<F: PartialEq>(
    current: &Trajectory<F>,
    trial: &Trajectory<F>,
    shooting_index: usize,
    direction: Direction,
) -> bool {
    let carried = carried_len(current.len(), shooting_index, direction);
    if carried == 0 || trial.len() < carried {
        return false;
    }
    let ours = match direction {
        Direction::Forward => &current.frames()[..carried],
        Direction::Backward => &current.frames()[shooting_index..],
    };
    let theirs = match direction {
        Direction::Forward => &trial.frames()[..carried],
        Direction::Backward => &trial.frames()[trial.len() - carried..],
    };
    ours.iter().zip(theirs).all(|(a, b)| same_frame(a, b))
}
