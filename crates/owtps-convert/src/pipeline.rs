//! End-to-end conversion into an output directory.

use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;
use log::info;
use owtps_core::errors::{codes, ErrorInfo};
use owtps_core::{Frame, OwtpsError};
use owtps_replay::{write_step_table, JsonLinesStorage};

use crate::config::ConverterConfig;
use crate::converter::{ConversionReport, OneWayConverter, SummaryFile};
use crate::loader::TrajectoryLoader;
use crate::manifest::ConversionManifest;
use crate::parser::SummaryParser;

/// Inputs of a conversion run.
pub struct ConvertRequest {
    /// Summary file.
    pub summary: PathBuf,
    /// Initial trajectory; the first summary line names it when absent.
    pub initial: Option<PathBuf>,
    /// Topology recorded in the manifest.
    pub topology: Option<PathBuf>,
    /// Directory receiving the step history, step table and manifest.
    pub output_dir: PathBuf,
    /// Overrides the configured block size.
    pub block_size: Option<usize>,
    /// Receives one line per converted summary line.
    pub progress: Option<Box<dyn Write>>,
}

impl ConvertRequest {
    /// Request with only the required inputs.
    pub fn new(summary: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            summary: summary.into(),
            initial: None,
            topology: None,
            output_dir: output_dir.into(),
            block_size: None,
            progress: None,
        }
    }

    /// Sets the initial trajectory file.
    pub fn with_initial(mut self, initial: impl Into<PathBuf>) -> Self {
        self.initial = Some(initial.into());
        self
    }
}

/// Result of [`convert_to_dir`].
#[derive(Debug)]
pub struct ConvertOutcome {
    /// Manifest that was written.
    pub manifest: ConversionManifest,
    /// Conversion counts.
    pub report: ConversionReport,
    /// Location of the step history.
    pub steps_path: PathBuf,
    /// Location of the manifest.
    pub manifest_path: PathBuf,
}

/// Converts a summary file and writes `steps.jsonl`, `steps.csv` and
/// `manifest.json` (or the configured names) into the output directory.
pub fn convert_to_dir(
    config: &ConverterConfig,
    request: ConvertRequest,
) -> Result<ConvertOutcome, OwtpsError> {
    let summary = SummaryFile::read(&request.summary)?;
    let loader = config.loader.clone();
    let parser = SummaryParser::new(loader.clone(), config.state_set(), config.option_set())
        .with_base_dir(summary.base_dir());

    let (initial_path, skip, initial_from_summary) = match &request.initial {
        Some(path) => (path.clone(), 0, false),
        None => {
            let (index, file) = summary.initial_entry().ok_or_else(|| {
                OwtpsError::Summary(
                    ErrorInfo::new(
                        codes::MALFORMED_SUMMARY_LINE,
                        "summary holds no line naming an initial trajectory",
                    )
                    .with_context("path", request.summary.display().to_string()),
                )
            })?;
            (parser.resolve_path(file), index + 1, true)
        }
    };
    let initial = loader.load_trajectory(&initial_path)?;
    let initial_frames = initial.len();

    let steps_path = request.output_dir.join(&config.output.steps_file);
    let storage = JsonLinesStorage::create(&steps_path)?;
    let mut converter =
        OneWayConverter::new(parser, initial, config.replay.clone(), Some(storage))?;
    if let Some(sink) = request.progress {
        converter = converter.with_progress(sink);
    }
    let block_size = request.block_size.unwrap_or(config.block_size);
    let report = converter.run(&summary, skip, block_size)?;
    converter.finish()?;

    let stored = JsonLinesStorage::read::<Frame>(&steps_path)?;
    write_step_table(&stored.steps, request.output_dir.join(&config.output.table_file))?;

    let manifest = ConversionManifest {
        summary: request.summary.clone(),
        summary_sha256: summary.digest(),
        initial: initial_path,
        initial_from_summary,
        topology: request.topology.clone(),
        options: config.option_set(),
        replay: config.replay.clone(),
        initial_frames,
        initial_segment: converter.initial_segment(),
        moves: report.moves,
        accepted: report.accepted,
        last_step: report.last_step,
        final_offsets: report.offsets,
        outputs: config.output.clone(),
        created_at: Utc::now().to_rfc3339(),
    };
    let manifest_path = request.output_dir.join(&config.output.manifest_file);
    manifest.write(&manifest_path)?;
    info!(
        "converted {} move(s), {} accepted, into {}",
        report.moves,
        report.accepted,
        request.output_dir.display()
    );
    Ok(ConvertOutcome {
        manifest,
        report,
        steps_path,
        manifest_path,
    })
}
