#![deny(missing_docs)]

//! Conversion of one-way shooting summary files into a replayed path
//! sampling history.

/// YAML configuration.
pub mod config;
/// Block-wise summary conversion.
pub mod converter;
/// Per-frame state label tables.
pub mod labels;
/// Trajectory file loaders.
pub mod loader;
/// Conversion manifest.
pub mod manifest;
/// Trim offset bookkeeping.
pub mod offsets;
/// Conversion options.
pub mod options;
/// Summary line parsing.
pub mod parser;
/// End-to-end conversion into an output directory.
pub mod pipeline;

pub use config::{ConverterConfig, OutputConfig};
pub use converter::{ConversionReport, OneWayConverter, SummaryFile};
pub use labels::{label_frames, write_label_table, LabelRow, LabelSettings};
pub use loader::{MemoryLoader, TextTrajectoryLoader, TrajectoryLoader};
pub use manifest::ConversionManifest;
pub use offsets::TrimOffsets;
pub use options::{ConversionOptions, OptionSet, ShootingBasis};
pub use parser::{parse_acceptance, parse_direction, ParsedLine, SummaryLine, SummaryParser};
pub use pipeline::{convert_to_dir, ConvertOutcome, ConvertRequest};
