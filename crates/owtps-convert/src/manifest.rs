use std::fs;
use std::path::{Path, PathBuf};

use owtps_core::errors::{codes, ErrorInfo};
use owtps_core::{OwtpsError, Segment};
use owtps_replay::ReplayConfig;
use serde::{Deserialize, Serialize};

use crate::config::OutputConfig;
use crate::offsets::TrimOffsets;
use crate::options::OptionSet;

/// Record of a finished conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionManifest {
    /// Summary file that was converted.
    pub summary: PathBuf,
    /// Hex SHA-256 of the summary contents.
    pub summary_sha256: String,
    /// Trajectory file the initial path was taken from.
    pub initial: PathBuf,
    /// Whether the initial file was named by the first summary line.
    pub initial_from_summary: bool,
    /// Topology passed along with the trajectories, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology: Option<PathBuf>,
    /// Options in force.
    pub options: OptionSet,
    /// Replay settings.
    pub replay: ReplayConfig,
    /// Frames of the initial trajectory file.
    pub initial_frames: usize,
    /// Transition kept from the initial trajectory.
    pub initial_segment: Segment,
    /// Moves replayed.
    pub moves: usize,
    /// Accepted moves.
    pub accepted: usize,
    /// Last step number written.
    pub last_step: usize,
    /// Trim offsets after the last move.
    pub final_offsets: TrimOffsets,
    /// Files written next to the manifest.
    pub outputs: OutputConfig,
    /// RFC 3339 creation time.
    pub created_at: String,
}

impl ConversionManifest {
    /// Writes the manifest as pretty JSON.
    pub fn write(&self, path: &Path) -> Result<(), OwtpsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                OwtpsError::Storage(
                    ErrorInfo::new(codes::MANIFEST_MKDIR, err.to_string())
                        .with_context("path", parent.display().to_string()),
                )
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|err| {
            OwtpsError::Storage(
                ErrorInfo::new(codes::MANIFEST_SERIALIZE, err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        fs::write(path, json).map_err(|err| {
            OwtpsError::Storage(
                ErrorInfo::new(codes::MANIFEST_WRITE, err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }

    /// Loads a manifest from disk.
    pub fn load(path: &Path) -> Result<Self, OwtpsError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            OwtpsError::Storage(
                ErrorInfo::new(codes::MANIFEST_READ, err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        serde_json::from_str(&contents).map_err(|err| {
            OwtpsError::Storage(
                ErrorInfo::new(codes::MANIFEST_PARSE, err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }
}
