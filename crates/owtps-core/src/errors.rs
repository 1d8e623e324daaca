//! Structured error types shared across the conversion crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable machine readable error codes.
pub mod codes {
    /// Summary line does not have 4 or 5 fields, or an index field is not an integer.
    pub const MALFORMED_SUMMARY_LINE: &str = "malformed-summary-line";
    /// Direction token outside the forward/backward vocabularies.
    pub const UNRECOGNIZED_DIRECTION: &str = "unrecognized-direction";
    /// Acceptance token outside the truthy/falsy vocabularies.
    pub const UNRECOGNIZED_ACCEPTANCE: &str = "unrecognized-acceptance";
    /// Full-trajectory mode without a 5th field.
    pub const MISSING_TRIAL_SHOOTING_INDEX: &str = "missing-trial-shooting-index";
    /// Initial trajectory holds no subtrajectory in the sampling ensemble.
    pub const EMPTY_INITIAL_SUBTRAJECTORY: &str = "empty-initial-subtrajectory";
    /// Trimming found no boundary segment for an accepted trial.
    pub const UNTRIMMABLE_ACCEPTED_TRIAL: &str = "untrimmable-accepted-trial";
    /// Accepted trial cannot be reconciled with the current trajectory.
    pub const NO_OVERLAP: &str = "no-overlap";
    /// Shooting index outside the trajectory it refers to.
    pub const SHOOTING_INDEX_OUT_OF_RANGE: &str = "shooting-index-out-of-range";
    /// Untrimmed shooting index points into frames that were trimmed away.
    pub const SHOOTING_INDEX_IN_TRIMMED_REGION: &str = "shooting-index-in-trimmed-region";
    /// Move record names a replica absent from the sample set.
    pub const UNKNOWN_REPLICA: &str = "unknown-replica";
    /// Sample set failed its periodic consistency check.
    pub const SAMPLE_SET_INCONSISTENT: &str = "sample-set-inconsistent";
    /// Trajectory file could not be read.
    pub const TRAJECTORY_READ: &str = "trajectory-read";
    /// Trajectory file contents could not be parsed.
    pub const TRAJECTORY_PARSE: &str = "trajectory-parse";
    /// Both shooting-basis flags were given with contradicting meaning.
    pub const CONFLICTING_SHOOTING_BASIS: &str = "conflicting-shooting-basis";
    /// Summary file could not be opened or read.
    pub const SUMMARY_READ: &str = "summary-read";
    /// Configuration file could not be read.
    pub const CONFIG_READ: &str = "config-read";
    /// Configuration file contents could not be decoded.
    pub const CONFIG_PARSE: &str = "config-parse";
    /// Output could not be written or flushed.
    pub const STORAGE_IO: &str = "storage-io";
    /// Stored record could not be encoded or decoded.
    pub const STORAGE_FORMAT: &str = "storage-format";
    /// Write attempted after the storage was closed.
    pub const STORAGE_CLOSED: &str = "storage-closed";
    /// Manifest directory could not be created.
    pub const MANIFEST_MKDIR: &str = "manifest-mkdir";
    /// Manifest could not be encoded.
    pub const MANIFEST_SERIALIZE: &str = "manifest-serialize";
    /// Manifest could not be written.
    pub const MANIFEST_WRITE: &str = "manifest-write";
    /// Manifest could not be read.
    pub const MANIFEST_READ: &str = "manifest-read";
    /// Manifest contents could not be decoded.
    pub const MANIFEST_PARSE: &str = "manifest-parse";
}

/// Structured payload attached to every [`OwtpsError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (file names, indices, lengths, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the conversion pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum OwtpsError {
    /// Summary file tokenisation errors.
    #[error("summary error: {0}")]
    Summary(ErrorInfo),
    /// Trajectory loading and indexing errors.
    #[error("trajectory error: {0}")]
    Trajectory(ErrorInfo),
    /// State-region and boundary-ensemble errors.
    #[error("ensemble error: {0}")]
    Ensemble(ErrorInfo),
    /// Move replay errors.
    #[error("replay error: {0}")]
    Replay(ErrorInfo),
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Persistence errors.
    #[error("storage error: {0}")]
    Storage(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl OwtpsError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            OwtpsError::Summary(info)
            | OwtpsError::Trajectory(info)
            | OwtpsError::Ensemble(info)
            | OwtpsError::Replay(info)
            | OwtpsError::Config(info)
            | OwtpsError::Storage(info) => info,
        }
    }

    /// Shorthand for `self.info().code`.
    pub fn code(&self) -> &str {
        &self.info().code
    }

    /// Adds a context entry without changing the family.
    pub fn with_context(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        match self {
            OwtpsError::Summary(info) => OwtpsError::Summary(info.with_context(key, value)),
            OwtpsError::Trajectory(info) => OwtpsError::Trajectory(info.with_context(key, value)),
            OwtpsError::Ensemble(info) => OwtpsError::Ensemble(info.with_context(key, value)),
            OwtpsError::Replay(info) => OwtpsError::Replay(info.with_context(key, value)),
            OwtpsError::Config(info) => OwtpsError::Config(info.with_context(key, value)),
            OwtpsError::Storage(info) => OwtpsError::Storage(info.with_context(key, value)),
        }
    }
}
