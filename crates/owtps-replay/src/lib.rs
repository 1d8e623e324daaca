#![deny(missing_docs)]

//! Replays externally computed one-way shooting moves into a path sampling
//! step history.

/// Acceptance, path length and decorrelation statistics.
pub mod analysis;
/// Replay settings.
pub mod config;
/// The replay engine and the step records it emits.
pub mod engine;
/// Move records and trajectory splicing.
pub mod moves;
/// Replica samples and sample sets.
pub mod sample;
/// Step history sinks.
pub mod storage;

pub use analysis::{
    acceptance_summary, decorrelated_trajectories, path_lengths, write_step_table,
    MoverAcceptance,
};
pub use config::{ReplayConfig, TrialForm};
pub use engine::{
    BlockSummary, MoveScheme, ReplayEngine, ShootingChange, StepChange, StepRecord,
};
pub use moves::{Direction, MoveRecord, MoverKind};
pub use sample::{Sample, SampleSet};
pub use storage::{JsonLinesStorage, MemoryStorage, NullStorage, StepStorage, StoredRun};
