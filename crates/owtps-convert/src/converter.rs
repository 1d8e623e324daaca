//! Block-wise conversion of a summary file into a replayed step history.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use owtps_core::errors::{codes, ErrorInfo};
use owtps_core::{OwtpsError, Segment, Trajectory};
use owtps_replay::{
    Direction, NullStorage, ReplayConfig, ReplayEngine, Sample, SampleSet, StepStorage,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::loader::TrajectoryLoader;
use crate::offsets::TrimOffsets;
use crate::parser::{is_move_line, SummaryParser};

/// Summary file held in memory.
#[derive(Debug, Clone)]
pub struct SummaryFile {
    path: PathBuf,
    text: String,
}

impl SummaryFile {
    /// Reads the summary at `path`.
    pub fn read(path: impl Into<PathBuf>) -> Result<Self, OwtpsError> {
        let path = path.into();
        let text = fs::read_to_string(&path).map_err(|err| {
            OwtpsError::Summary(
                ErrorInfo::new(codes::SUMMARY_READ, err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Ok(Self { path, text })
    }

    /// Summary built from text; `path` anchors relative file names.
    pub fn from_text(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Location of the summary.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory relative trajectory names resolve against.
    pub fn base_dir(&self) -> PathBuf {
        self.path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    /// Raw lines.
    pub fn lines(&self) -> Vec<&str> {
        self.text.lines().collect()
    }

    /// Hex SHA-256 of the summary contents.
    pub fn digest(&self) -> String {
        format!("{:x}", Sha256::digest(self.text.as_bytes()))
    }

    /// Position and file name of the first move line, used as the initial
    /// trajectory when none is given separately.
    pub fn initial_entry(&self) -> Option<(usize, &str)> {
        self.text
            .lines()
            .enumerate()
            .find(|(_, line)| is_move_line(line))
            .and_then(|(index, line)| line.split_whitespace().next().map(|file| (index, file)))
    }
}

/// Counts reported by [`OneWayConverter::run_lines`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionReport {
    /// Move lines converted.
    pub moves: usize,
    /// Accepted moves among them.
    pub accepted: usize,
    /// Blocks replayed.
    pub blocks: usize,
    /// Step number after the last move.
    pub last_step: usize,
    /// Offsets after the last move.
    pub offsets: TrimOffsets,
}

/// Owns the parser, the replay engine and the running trim offsets.
pub struct OneWayConverter<F, L, S = NullStorage> {
    parser: SummaryParser<F, L>,
    engine: ReplayEngine<F, S>,
    offsets: TrimOffsets,
    initial_segment: Segment,
    progress: Option<Box<dyn Write>>,
}

impl<F, L, S> OneWayConverter<F, L, S>
where
    F: PartialEq,
    L: TrajectoryLoader<F>,
    S: StepStorage<F>,
{
    /// Selects the transition inside `initial` and starts the replay from it.
    ///
    /// The frames cut before and after the transition seed the offsets.
    pub fn new(
        parser: SummaryParser<F, L>,
        initial: Trajectory<F>,
        replay: ReplayConfig,
        storage: Option<S>,
    ) -> Result<Self, OwtpsError> {
        let candidates = parser.states().split_transitions(&initial);
        let segment = match candidates.as_slice() {
            [] => {
                return Err(OwtpsError::Ensemble(
                    ErrorInfo::new(
                        codes::EMPTY_INITIAL_SUBTRAJECTORY,
                        "initial trajectory holds no transition between two states",
                    )
                    .with_context("frames", initial.len().to_string())
                    .with_hint("check the state definitions against the initial trajectory"),
                ));
            }
            [only] => *only,
            [first, ..] => {
                warn!(
                    "initial trajectory holds {} transitions; using frames {}..{}",
                    candidates.len(),
                    first.start,
                    first.end
                );
                *first
            }
        };
        let offsets = TrimOffsets::from_initial(segment, initial.len());
        let sample = Sample::new(0, segment.apply(&initial), replay.ensemble.clone());
        let mut engine = ReplayEngine::with_storage(SampleSet::new(vec![sample]), replay, storage);
        engine.start()?;
        info!(
            "initial path: {} of {} frames kept, offsets bw={} fw={}",
            segment.len(),
            initial.len(),
            offsets.extra_bw_frames,
            offsets.extra_fw_frames
        );
        Ok(Self {
            parser,
            engine,
            offsets,
            initial_segment: segment,
            progress: None,
        })
    }

    /// Loads the initial trajectory through the parser's loader.
    pub fn from_initial_file(
        parser: SummaryParser<F, L>,
        initial_file: &str,
        replay: ReplayConfig,
        storage: Option<S>,
    ) -> Result<Self, OwtpsError> {
        let initial = parser.load(initial_file)?;
        Self::new(parser, initial, replay, storage)
    }

    /// Writes one line per processed summary line to `sink`.
    pub fn with_progress(mut self, sink: Box<dyn Write>) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Running offsets.
    pub fn offsets(&self) -> TrimOffsets {
        self.offsets
    }

    /// Part of the initial trajectory used as step 0.
    pub fn initial_segment(&self) -> Segment {
        self.initial_segment
    }

    /// Summary parser.
    pub fn parser(&self) -> &SummaryParser<F, L> {
        &self.parser
    }

    /// Replay engine.
    pub fn engine(&self) -> &ReplayEngine<F, S> {
        &self.engine
    }

    /// Consumes the converter and returns its engine.
    pub fn into_engine(self) -> ReplayEngine<F, S> {
        self.engine
    }

    /// Converts every line of `summary`, skipping the first `skip` lines.
    pub fn run(
        &mut self,
        summary: &SummaryFile,
        skip: usize,
        block_size: usize,
    ) -> Result<ConversionReport, OwtpsError> {
        let lines = summary.lines();
        let remaining = lines.get(skip..).unwrap_or_default();
        self.run_lines(remaining, skip + 1, block_size)
            .map_err(|err| err.with_context("summary", summary.path().display().to_string()))
    }

    /// Converts `lines` in blocks of `block_size` consecutive lines.
    ///
    /// `first_line` is the 1-based number of `lines[0]` in the summary file.
    pub fn run_lines(
        &mut self,
        lines: &[&str],
        first_line: usize,
        block_size: usize,
    ) -> Result<ConversionReport, OwtpsError> {
        let block_size = block_size.max(1);
        let mut report = ConversionReport {
            moves: 0,
            accepted: 0,
            blocks: 0,
            last_step: self.engine.step(),
            offsets: self.offsets,
        };
        for (block, chunk) in lines.chunks(block_size).enumerate() {
            let (parsed, offsets) = self.parser.parse_block(
                chunk.iter().copied(),
                first_line + block * block_size,
                self.offsets,
            )?;
            if parsed.is_empty() {
                continue;
            }
            let described: Vec<(PathBuf, Direction, bool)> = parsed
                .iter()
                .map(|entry| {
                    (
                        entry.source.clone(),
                        entry.record.direction,
                        entry.record.accepted,
                    )
                })
                .collect();
            let summary = self
                .engine
                .run(parsed.into_iter().map(|entry| entry.record))?;
            self.offsets = offsets;
            for (position, (source, direction, accepted)) in described.iter().enumerate() {
                self.report_progress(summary.first_step + position, source, *direction, *accepted)?;
            }
            report.moves += summary.proposed;
            report.accepted += summary.accepted;
            report.blocks += 1;
            debug!(
                "block {block}: steps {}..={}, {} accepted",
                summary.first_step, summary.last_step, summary.accepted
            );
        }
        report.last_step = self.engine.step();
        report.offsets = self.offsets;
        Ok(report)
    }

    /// Closes the engine's storage and flushes the progress sink.
    pub fn finish(&mut self) -> Result<(), OwtpsError> {
        self.engine.close()?;
        if let Some(sink) = self.progress.as_mut() {
            sink.flush().map_err(progress_error)?;
        }
        Ok(())
    }

    fn report_progress(
        &mut self,
        step: usize,
        source: &Path,
        direction: Direction,
        accepted: bool,
    ) -> Result<(), OwtpsError> {
        let Some(sink) = self.progress.as_mut() else {
            return Ok(());
        };
        let verdict = if accepted { "accepted" } else { "rejected" };
        writeln!(
            sink,
            "step {step}: {} {direction} {verdict}",
            source.display()
        )
        .map_err(progress_error)
    }
}

fn progress_error(err: std::io::Error) -> OwtpsError {
    OwtpsError::Storage(
        ErrorInfo::new(codes::STORAGE_IO, err.to_string()).with_context("sink", "progress"),
    )
}
