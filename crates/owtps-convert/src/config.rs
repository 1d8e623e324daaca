use std::fs;
use std::path::{Path, PathBuf};

use owtps_core::errors::{codes, ErrorInfo};
use owtps_core::{Frame, OwtpsError, RangeVolume, StateSet};
use owtps_replay::ReplayConfig;
use serde::{Deserialize, Serialize};

use crate::loader::TextTrajectoryLoader;
use crate::options::{ConversionOptions, OptionSet, OptionsFile};

/// Conversion settings read from YAML.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConverterConfig {
    /// State regions bounding the path ensemble.
    pub states: Vec<RangeVolume>,
    /// Options applied to accepted lines (and rejected ones unless overridden).
    pub options: ConversionOptions,
    /// Options applied to rejected lines.
    pub rejected_options: Option<ConversionOptions>,
    /// Replay engine settings.
    pub replay: ReplayConfig,
    /// Summary lines parsed and replayed together.
    pub block_size: usize,
    /// Text trajectory loader settings.
    pub loader: TextTrajectoryLoader,
    /// Output file names.
    pub output: OutputConfig,
}

#[derive(Deserialize)]
struct ConverterConfigFile {
    states: Vec<RangeVolume>,
    #[serde(default)]
    options: Option<OptionsFile>,
    #[serde(default)]
    rejected_options: Option<OptionsFile>,
    #[serde(default)]
    replay: ReplayConfig,
    #[serde(default = "default_block_size")]
    block_size: usize,
    #[serde(default)]
    loader: TextTrajectoryLoader,
    #[serde(default)]
    output: OutputConfig,
}

impl TryFrom<ConverterConfigFile> for ConverterConfig {
    type Error = OwtpsError;

    fn try_from(raw: ConverterConfigFile) -> Result<Self, Self::Error> {
        let options = match raw.options {
            Some(options) => ConversionOptions::try_from(options)
                .map_err(|err| err.with_context("section", "options"))?,
            None => ConversionOptions::default(),
        };
        let rejected_options = raw
            .rejected_options
            .map(ConversionOptions::try_from)
            .transpose()
            .map_err(|err| err.with_context("section", "rejected_options"))?;
        Ok(Self {
            states: raw.states,
            options,
            rejected_options,
            replay: raw.replay,
            block_size: raw.block_size,
            loader: raw.loader,
            output: raw.output,
        })
    }
}

fn default_block_size() -> usize {
    100
}

impl ConverterConfig {
    /// Config with default settings for the given states.
    pub fn with_states(states: Vec<RangeVolume>) -> Self {
        Self {
            states,
            options: ConversionOptions::default(),
            rejected_options: None,
            replay: ReplayConfig::default(),
            block_size: default_block_size(),
            loader: TextTrajectoryLoader::default(),
            output: OutputConfig::default(),
        }
    }

    /// Parses YAML text; contradicting basis flags keep their own error code.
    pub fn from_yaml_str(contents: &str) -> Result<Self, OwtpsError> {
        let raw: ConverterConfigFile = serde_yaml::from_str(contents).map_err(|err| {
            OwtpsError::Config(ErrorInfo::new(codes::CONFIG_PARSE, err.to_string()))
        })?;
        Self::try_from(raw)
    }

    /// Reads and parses a YAML file.
    pub fn load(path: &Path) -> Result<Self, OwtpsError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            OwtpsError::Config(
                ErrorInfo::new(codes::CONFIG_READ, err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Self::from_yaml_str(&contents)
            .map_err(|err| err.with_context("path", path.display().to_string()))
    }

    /// Options for accepted and rejected lines.
    pub fn option_set(&self) -> OptionSet {
        let set = OptionSet::new(self.options);
        match self.rejected_options {
            Some(rejected) => set.with_rejected(rejected),
            None => set,
        }
    }

    /// State set built from the configured regions.
    pub fn state_set(&self) -> StateSet<Frame> {
        StateSet::from(self.states.clone())
    }
}

/// Names of the files written into the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// JSON lines step history.
    #[serde(default = "default_steps_filename")]
    pub steps_file: PathBuf,
    /// CSV step table.
    #[serde(default = "default_table_filename")]
    pub table_file: PathBuf,
    /// Conversion manifest.
    #[serde(default = "default_manifest_filename")]
    pub manifest_file: PathBuf,
}

fn default_steps_filename() -> PathBuf {
    PathBuf::from("steps.jsonl")
}

fn default_table_filename() -> PathBuf {
    PathBuf::from("steps.csv")
}

fn default_manifest_filename() -> PathBuf {
    PathBuf::from("manifest.json")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            steps_file: default_steps_filename(),
            table_file: default_table_filename(),
            manifest_file: default_manifest_filename(),
        }
    }
}
