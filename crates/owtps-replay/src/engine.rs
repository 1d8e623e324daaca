//! Replay of externally computed shooting moves.
//!
//! The engine owns the active [`SampleSet`] and turns every [`MoveRecord`]
//! into a [`StepRecord`], the same bookkeeping a path sampling simulation
//! would have produced had it run the trials itself. Accepted trials replace
//! the replica's trajectory; rejected ones are recorded and leave it untouched.

use std::collections::BTreeMap;

use log::{debug, warn};
use owtps_core::errors::{codes, ErrorInfo};
use owtps_core::{OwtpsError, Trajectory};
use serde::{Deserialize, Serialize};

use crate::config::{ReplayConfig, TrialForm};
use crate::moves::{self, MoveRecord, MoverKind};
use crate::sample::{Sample, SampleSet};
use crate::storage::{NullStorage, StepStorage};

/// Move scheme description stored ahead of the first step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveScheme {
    /// Scheme name.
    pub name: String,
    /// Movers by group.
    pub groups: BTreeMap<String, Vec<MoverKind>>,
    /// Probability of picking each mover, as the external engine used it.
    pub choice_probability: BTreeMap<String, f64>,
    /// Form in which trials are recorded.
    pub trial_form: TrialForm,
}

impl MoveScheme {
    /// Two movers of equal weight in a single shooting group.
    pub fn one_way_shooting(trial_form: TrialForm) -> Self {
        let movers = vec![MoverKind::ForwardShooting, MoverKind::BackwardShooting];
        let choice_probability = movers
            .iter()
            .map(|mover| (mover.as_str().to_string(), 0.5))
            .collect();
        let mut groups = BTreeMap::new();
        groups.insert("shooting".to_string(), movers);
        Self {
            name: "one-way-shooting".to_string(),
            groups,
            choice_probability,
            trial_form,
        }
    }
}

/// Details of a replayed shooting move.
#[derive(Debug, Serialize, Deserialize)]
pub struct ShootingChange<F> {
    /// Mover that produced the trial.
    pub mover: MoverKind,
    /// Replica the move acted on.
    pub replica: usize,
    /// Whether the trial replaced the replica's trajectory.
    pub accepted: bool,
    /// Shooting frame, resolved to a position in the input trajectory.
    pub shooting_index: usize,
    /// Number of newly generated frames in the trial.
    pub segment_len: usize,
    /// Full trial path.
    pub trial: Trajectory<F>,
}

impl<F> Clone for ShootingChange<F> {
    fn clone(&self) -> Self {
        Self {
            mover: self.mover,
            replica: self.replica,
            accepted: self.accepted,
            shooting_index: self.shooting_index,
            segment_len: self.segment_len,
            trial: self.trial.clone(),
        }
    }
}

/// What happened at a step.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepChange<F> {
    /// Initial conditions (step 0).
    Initial,
    /// A replayed shooting move.
    Shooting(ShootingChange<F>),
}

impl<F> Clone for StepChange<F> {
    fn clone(&self) -> Self {
        match self {
            StepChange::Initial => StepChange::Initial,
            StepChange::Shooting(change) => StepChange::Shooting(change.clone()),
        }
    }
}

impl<F> StepChange<F> {
    /// Shooting details, when the step is a move.
    pub fn shooting(&self) -> Option<&ShootingChange<F>> {
        match self {
            StepChange::Initial => None,
            StepChange::Shooting(change) => Some(change),
        }
    }

    /// Mover of the step, if any.
    pub fn mover(&self) -> Option<MoverKind> {
        self.shooting().map(|change| change.mover)
    }

    /// Acceptance of the step, if it was a move.
    pub fn accepted(&self) -> Option<bool> {
        self.shooting().map(|change| change.accepted)
    }
}

/// One entry of the step history.
#[derive(Debug, Serialize, Deserialize)]
pub struct StepRecord<F> {
    /// Step number; 0 holds the initial conditions.
    pub step: usize,
    /// Sample set before the move; absent for step 0.
    pub previous: Option<SampleSet<F>>,
    /// Sample set after the move.
    pub active: SampleSet<F>,
    /// Change applied at this step.
    pub change: StepChange<F>,
}

impl<F> Clone for StepRecord<F> {
    fn clone(&self) -> Self {
        Self {
            step: self.step,
            previous: self.previous.clone(),
            active: self.active.clone(),
            change: self.change.clone(),
        }
    }
}

/// Counts returned by [`ReplayEngine::run`].
///
/// An empty batch has `first_step == last_step + 1`, so [`BlockSummary::steps`]
/// is an empty range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummary {
    /// First step number produced by the block.
    pub first_step: usize,
    /// Last step number produced by the block.
    pub last_step: usize,
    /// Move records replayed.
    pub proposed: usize,
    /// Move records that were accepted.
    pub accepted: usize,
}

impl BlockSummary {
    /// Step numbers produced by the block.
    pub fn steps(&self) -> std::ops::RangeInclusive<usize> {
        self.first_step..=self.last_step
    }

    /// Whether the block replayed no moves.
    pub fn is_empty(&self) -> bool {
        self.proposed == 0
    }
}

/// Deterministic replay of move records into a step history.
pub struct ReplayEngine<F, S = NullStorage> {
    config: ReplayConfig,
    scheme: MoveScheme,
    initial: SampleSet<F>,
    sample_set: SampleSet<F>,
    step: usize,
    started: bool,
    storage: Option<S>,
}

impl<F: PartialEq> ReplayEngine<F, NullStorage> {
    /// Engine that keeps no step history.
    pub fn without_storage(initial: SampleSet<F>, config: ReplayConfig) -> Self {
        Self::with_storage(initial, config, None)
    }
}

impl<F: PartialEq, S: StepStorage<F>> ReplayEngine<F, S> {
    /// Engine writing to `storage`, when given.
    pub fn with_storage(initial: SampleSet<F>, config: ReplayConfig, storage: Option<S>) -> Self {
        let scheme = MoveScheme::one_way_shooting(config.trial_form);
        Self {
            config,
            scheme,
            sample_set: initial.clone(),
            initial,
            step: 0,
            started: false,
            storage,
        }
    }

    /// Number of the last step produced.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Whether step 0 has been recorded.
    pub fn is_running(&self) -> bool {
        self.started
    }

    /// Active sample set.
    pub fn sample_set(&self) -> &SampleSet<F> {
        &self.sample_set
    }

    /// Sample set the replay started from.
    pub fn initial_conditions(&self) -> &SampleSet<F> {
        &self.initial
    }

    /// Move scheme recorded ahead of the first step.
    pub fn scheme(&self) -> &MoveScheme {
        &self.scheme
    }

    /// Engine settings.
    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// Attached storage.
    pub fn storage(&self) -> Option<&S> {
        self.storage.as_ref()
    }

    /// Attached storage, mutably.
    pub fn storage_mut(&mut self) -> Option<&mut S> {
        self.storage.as_mut()
    }

    /// Consumes the engine and hands back its storage.
    pub fn into_storage(self) -> Option<S> {
        self.storage
    }

    /// Records the scheme and the initial conditions. Calling it again is a no-op.
    pub fn start(&mut self) -> Result<(), OwtpsError> {
        if self.started {
            return Ok(());
        }
        self.initial.sanity_check()?;
        if let Some(storage) = self.storage.as_mut() {
            storage.save_scheme(&self.scheme)?;
            storage.save_step(&StepRecord {
                step: 0,
                previous: None,
                active: self.initial.clone(),
                change: StepChange::Initial,
            })?;
        }
        self.started = true;
        debug!("replay started with {} replica(s)", self.initial.len());
        Ok(())
    }

    /// Replays a single move and returns the step it produced.
    pub fn apply(&mut self, record: MoveRecord<F>) -> Result<StepRecord<F>, OwtpsError> {
        self.start()?;
        let step = self.step + 1;
        let (current, ensemble) = {
            let input = self.sample_set.get(record.replica).ok_or_else(|| {
                OwtpsError::Replay(
                    ErrorInfo::new(codes::UNKNOWN_REPLICA, "move names an unknown replica")
                        .with_context("replica", record.replica.to_string())
                        .with_context("step", step.to_string()),
                )
            })?;
            (input.trajectory.clone(), input.ensemble.clone())
        };
        let shooting_index = current.resolve_index(record.shooting_index).ok_or_else(|| {
            OwtpsError::Trajectory(
                ErrorInfo::new(
                    codes::SHOOTING_INDEX_OUT_OF_RANGE,
                    "shooting index outside the current trajectory",
                )
                .with_context("index", record.shooting_index.to_string())
                .with_context("length", current.len().to_string())
                .with_context("step", step.to_string()),
            )
        })?;

        let (trial, segment_len) = match self.config.trial_form {
            TrialForm::OneWay => (
                moves::splice(&current, shooting_index, &record.trial, record.direction),
                record.trial.len(),
            ),
            TrialForm::PreJoined => {
                if moves::reuses_current(&current, &record.trial, shooting_index, record.direction) {
                    let carried = moves::carried_len(current.len(), shooting_index, record.direction);
                    (record.trial.clone(), record.trial.len() - carried)
                } else if record.accepted {
                    return Err(OwtpsError::Replay(
                        no_overlap(step, "accepted trial shares no frames with the current path")
                            .with_context("direction", record.direction.to_string()),
                    ));
                } else {
                    warn!(
                        "step {step}: rejected {} trial shares no frames with the current path",
                        record.direction
                    );
                    (record.trial.clone(), record.trial.len())
                }
            }
        };
        if record.accepted && segment_len == 0 {
            return Err(OwtpsError::Replay(no_overlap(
                step,
                "accepted trial adds no new frames",
            )));
        }

        let active = if record.accepted {
            self.sample_set
                .apply_samples([Sample::new(record.replica, trial.clone(), ensemble)])
        } else {
            self.sample_set.clone()
        };
        let step_record = StepRecord {
            step,
            previous: Some(self.sample_set.clone()),
            active: active.clone(),
            change: StepChange::Shooting(ShootingChange {
                mover: record.direction.mover(),
                replica: record.replica,
                accepted: record.accepted,
                shooting_index,
                segment_len,
                trial,
            }),
        };

        if let Some(storage) = self.storage.as_mut() {
            storage.save_step(&step_record)?;
        }
        let frequency = self.config.save_frequency;
        if frequency > 0 && step % frequency == 0 {
            self.sample_set.sanity_check()?;
            if let Some(storage) = self.storage.as_mut() {
                storage.sync()?;
            }
        }
        self.step = step;
        self.sample_set = active;
        Ok(step_record)
    }

    /// Replays a batch of moves in order and syncs storage at the end.
    pub fn run<I>(&mut self, moves: I) -> Result<BlockSummary, OwtpsError>
    where
        I: IntoIterator<Item = MoveRecord<F>>,
    {
        self.start()?;
        let first_step = self.step + 1;
        let mut proposed = 0;
        let mut accepted = 0;
        for record in moves {
            let step = self.apply(record)?;
            proposed += 1;
            if step.change.accepted() == Some(true) {
                accepted += 1;
            }
        }
        if let Some(storage) = self.storage.as_mut() {
            storage.sync()?;
        }
        debug!(
            "replayed {proposed} move(s), {accepted} accepted, now at step {}",
            self.step
        );
        Ok(BlockSummary {
            first_step,
            last_step: self.step,
            proposed,
            accepted,
        })
    }

    /// Flushes and closes the storage.
    pub fn close(&mut self) -> Result<(), OwtpsError> {
        match self.storage.as_mut() {
            Some(storage) => storage.close(),
            None => Ok(()),
        }
    }
}

fn no_overlap(step: usize, message: &str) -> ErrorInfo {
    ErrorInfo::new(codes::NO_OVERLAP, message).with_context("step", step.to_string())
}
