//! Post-hoc statistics over a replayed step history.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use owtps_core::errors::{codes, ErrorInfo};
use owtps_core::{OwtpsError, Trajectory};
use serde::{Deserialize, Serialize};

use crate::engine::StepRecord;

/// Accepted and attempted trials of a mover or group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoverAcceptance {
    /// Accepted trials.
    pub accepted: usize,
    /// Attempted trials.
    pub trials: usize,
}

impl MoverAcceptance {
    /// Acceptance ratio, 0 when nothing was tried.
    pub fn rate(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.accepted as f64 / self.trials as f64
        }
    }

    fn record(&mut self, accepted: bool) {
        self.trials += 1;
        if accepted {
            self.accepted += 1;
        }
    }
}

/// Acceptance per move group and per mover, in order of first appearance.
///
/// Group keys are the group names (`shooting`); mover keys are the mover
/// labels (`forward-shooting`, `backward-shooting`).
pub fn acceptance_summary<F>(steps: &[StepRecord<F>]) -> IndexMap<String, MoverAcceptance> {
    let mut summary: IndexMap<String, MoverAcceptance> = IndexMap::new();
    for change in steps.iter().filter_map(|step| step.change.shooting()) {
        summary
            .entry(change.mover.group().to_string())
            .or_default()
            .record(change.accepted);
        summary
            .entry(change.mover.as_str().to_string())
            .or_default()
            .record(change.accepted);
    }
    summary
}

/// Length of the active trajectory of `replica` at every step that holds it.
pub fn path_lengths<F>(steps: &[StepRecord<F>], replica: usize) -> Vec<usize> {
    steps
        .iter()
        .filter_map(|step| step.active.get(replica))
        .map(|sample| sample.trajectory.len())
        .collect()
}

fn overlaps<F: PartialEq>(a: &Trajectory<F>, b: &Trajectory<F>) -> bool {
    a.shares_frames_with(b)
        || a
            .frames()
            .iter()
            .any(|x| b.frames().iter().any(|y| Arc::ptr_eq(x, y) || x == y))
}

/// Active trajectories of `replica` that share no frame with the previously
/// reported decorrelated trajectory.
///
/// Frames match by identity or, for histories read back from disk, by value.
pub fn decorrelated_trajectories<F: PartialEq>(
    steps: &[StepRecord<F>],
    replica: usize,
) -> Vec<Trajectory<F>> {
    let mut found: Vec<Trajectory<F>> = Vec::new();
    for sample in steps.iter().filter_map(|step| step.active.get(replica)) {
        let fresh = match found.last() {
            Some(last) => !overlaps(last, &sample.trajectory),
            None => true,
        };
        if fresh {
            found.push(sample.trajectory.clone());
        }
    }
    found
}

#[derive(Debug, Serialize)]
struct StepRow<'a> {
    step: usize,
    replica: Option<usize>,
    mover: &'a str,
    accepted: Option<bool>,
    shooting_index: Option<usize>,
    segment_length: Option<usize>,
    trial_length: Option<usize>,
    active_lengths: String,
}

/// Writes one CSV row per step.
pub fn write_step_table<F, P: AsRef<Path>>(
    steps: &[StepRecord<F>],
    path: P,
) -> Result<(), OwtpsError> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path).map_err(|err| csv_error(path, err))?;
    for step in steps {
        let shooting = step.change.shooting();
        let active_lengths = step
            .active
            .iter()
            .map(|sample| sample.trajectory.len().to_string())
            .collect::<Vec<_>>()
            .join(";");
        writer
            .serialize(StepRow {
                step: step.step,
                replica: shooting.map(|change| change.replica),
                mover: shooting.map_or("initial", |change| change.mover.as_str()),
                accepted: shooting.map(|change| change.accepted),
                shooting_index: shooting.map(|change| change.shooting_index),
                segment_length: shooting.map(|change| change.segment_len),
                trial_length: shooting.map(|change| change.trial.len()),
                active_lengths,
            })
            .map_err(|err| csv_error(path, err))?;
    }
    writer.flush().map_err(|err| {
        OwtpsError::Storage(
            ErrorInfo::new(codes::STORAGE_IO, err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })
}

fn csv_error(path: &Path, err: csv::Error) -> OwtpsError {
    OwtpsError::Storage(
        ErrorInfo::new(codes::STORAGE_IO, err.to_string())
            .with_context("path", path.display().to_string()),
    )
}
