//! Summary file lines to move records.
//!
//! A summary line reads
//! `file_name shooting_index direction accepted [shooting_index_in_trial]`.
//! Conversion is a pure function of the line, the options selected by the
//! line's acceptance flag and the incoming [`TrimOffsets`]; the next offsets
//! come back alongside the record.

use std::path::{Path, PathBuf};

use log::debug;
use owtps_core::errors::{codes, ErrorInfo};
use owtps_core::{OwtpsError, StateSet, Trajectory};
use owtps_replay::{Direction, MoveRecord};

use crate::loader::TrajectoryLoader;
use crate::offsets::TrimOffsets;
use crate::options::{OptionSet, ShootingBasis};

const FORWARD_TOKENS: [&str; 5] = ["+1", "1", "FW", "F", "FORWARD"];
const BACKWARD_TOKENS: [&str; 4] = ["-1", "BW", "B", "BACKWARD"];
const TRUE_TOKENS: [&str; 6] = ["1", "T", "TRUE", "Y", "YES", "ACC"];
const FALSE_TOKENS: [&str; 6] = ["0", "F", "FALSE", "N", "NO", "REJ"];

/// Reads a direction token, ignoring case.
pub fn parse_direction(token: &str) -> Result<Direction, OwtpsError> {
    let upper = token.to_ascii_uppercase();
    if FORWARD_TOKENS.contains(&upper.as_str()) {
        Ok(Direction::Forward)
    } else if BACKWARD_TOKENS.contains(&upper.as_str()) {
        Ok(Direction::Backward)
    } else {
        Err(OwtpsError::Summary(
            ErrorInfo::new(codes::UNRECOGNIZED_DIRECTION, "unrecognized direction")
                .with_context("token", token)
                .with_hint("use FW/BW, F/B, FORWARD/BACKWARD or +1/-1"),
        ))
    }
}

/// Reads an acceptance token, ignoring case.
pub fn parse_acceptance(token: &str) -> Result<bool, OwtpsError> {
    let upper = token.to_ascii_uppercase();
    if TRUE_TOKENS.contains(&upper.as_str()) {
        Ok(true)
    } else if FALSE_TOKENS.contains(&upper.as_str()) {
        Ok(false)
    } else {
        Err(OwtpsError::Summary(
            ErrorInfo::new(codes::UNRECOGNIZED_ACCEPTANCE, "unrecognized acceptance flag")
                .with_context("token", token)
                .with_hint("use T/F, TRUE/FALSE, Y/N, YES/NO, ACC/REJ or 1/0"),
        ))
    }
}

/// Whether a summary line carries a move (not blank, not a `#` comment).
pub fn is_move_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.starts_with('#')
}

fn parse_index(token: &str, line: &str) -> Result<isize, OwtpsError> {
    token.parse::<isize>().map_err(|_| {
        OwtpsError::Summary(
            ErrorInfo::new(codes::MALFORMED_SUMMARY_LINE, "shooting index is not an integer")
                .with_context("token", token)
                .with_context("line", line),
        )
    })
}

/// Tokens of one summary line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryLine {
    /// Trajectory file name as written.
    pub file: String,
    /// Shooting index in the current trajectory.
    pub shooting_index: isize,
    /// Shot direction.
    pub direction: Direction,
    /// Acceptance flag.
    pub accepted: bool,
    /// Shooting index inside the trajectory file, if given.
    pub trial_shooting_index: Option<isize>,
}

impl SummaryLine {
    /// Splits and validates a line of 4 or 5 whitespace separated fields.
    pub fn parse(line: &str) -> Result<Self, OwtpsError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if !(4..=5).contains(&fields.len()) {
            return Err(OwtpsError::Summary(
                ErrorInfo::new(
                    codes::MALFORMED_SUMMARY_LINE,
                    format!("expected 4 or 5 fields, found {}", fields.len()),
                )
                .with_context("line", line.trim())
                .with_hint("file_name shooting_index direction accepted [shooting_index_in_trial]"),
            ));
        }
        Ok(Self {
            file: fields[0].to_string(),
            shooting_index: parse_index(fields[1], line.trim())?,
            direction: parse_direction(fields[2])?,
            accepted: parse_acceptance(fields[3])?,
            trial_shooting_index: fields
                .get(4)
                .map(|token| parse_index(token, line.trim()))
                .transpose()?,
        })
    }
}

/// Result of converting one line.
#[derive(Debug)]
pub struct ParsedLine<F> {
    /// Move ready for replay.
    pub record: MoveRecord<F>,
    /// Offsets to hand to the next line.
    pub offsets: TrimOffsets,
    /// Trajectory file the move was read from.
    pub source: PathBuf,
    /// Frames removed by trimming, when the trial was trimmed.
    pub trimmed_frames: Option<usize>,
}

/// Converts summary lines using an injected loader and the state definitions.
pub struct SummaryParser<F, L> {
    loader: L,
    states: StateSet<F>,
    options: OptionSet,
    base_dir: Option<PathBuf>,
}

impl<F, L: TrajectoryLoader<F>> SummaryParser<F, L> {
    /// Parser resolving relative file names against the working directory.
    pub fn new(loader: L, states: StateSet<F>, options: OptionSet) -> Self {
        Self {
            loader,
            states,
            options,
            base_dir: None,
        }
    }

    /// Resolves relative file names against `dir` (the summary file's directory).
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Options in force.
    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    /// Options in force, mutably.
    pub fn options_mut(&mut self) -> &mut OptionSet {
        &mut self.options
    }

    /// State definitions used for trimming.
    pub fn states(&self) -> &StateSet<F> {
        &self.states
    }

    /// Loader used for trajectory files.
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Location of `file` after base directory resolution.
    pub fn resolve_path(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        match &self.base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Loads the trajectory named by `file`.
    pub fn load(&self, file: &str) -> Result<Trajectory<F>, OwtpsError> {
        self.loader.load_trajectory(&self.resolve_path(file))
    }

    /// Converts one raw summary line.
    pub fn parse_line(&self, line: &str, offsets: TrimOffsets) -> Result<ParsedLine<F>, OwtpsError> {
        let tokens = SummaryLine::parse(line)?;
        self.convert(&tokens, offsets)
    }

    /// Converts an already tokenised line.
    pub fn convert(&self, line: &SummaryLine, offsets: TrimOffsets) -> Result<ParsedLine<F>, OwtpsError> {
        let options = *self.options.for_line(line.accepted);
        let direction = line.direction;
        let source = self.resolve_path(&line.file);
        let mut trial = self.loader.load_trajectory(&source)?;
        let reversed = options.auto_reverse && direction == Direction::Backward;
        if reversed {
            trial = trial.reversed();
        }

        let shooting_index = match options.shooting_basis {
            ShootingBasis::Trimmed => line.shooting_index,
            ShootingBasis::Untrimmed => offsets
                .correct_shooting_index(line.shooting_index)
                .map_err(|err| err.with_context("file", line.file.clone()))?,
        };

        let mut next = offsets;
        let mut trimmed_frames = None;
        if options.full_trajectory {
            let index = line.trial_shooting_index.ok_or_else(|| {
                OwtpsError::Summary(
                    ErrorInfo::new(
                        codes::MISSING_TRIAL_SHOOTING_INDEX,
                        "full-trajectory mode needs the shooting index inside the trial file",
                    )
                    .with_context("file", line.file.clone()),
                )
            })?;
            let mut position = trial.resolve_index(index).ok_or_else(|| {
                OwtpsError::Trajectory(
                    ErrorInfo::new(
                        codes::SHOOTING_INDEX_OUT_OF_RANGE,
                        "trial shooting index outside the trajectory file",
                    )
                    .with_context("file", line.file.clone())
                    .with_context("index", index.to_string())
                    .with_context("length", trial.len().to_string()),
                )
            })?;
            if reversed {
                position = trial.len() - 1 - position;
            }
            trial = match direction {
                Direction::Forward => trial.tail_from(position),
                Direction::Backward => trial.head_until(position + 1),
            };
        } else if options.trims() {
            let segment = match direction {
                Direction::Forward => self.states.trim_forward(&trial),
                Direction::Backward => self.states.trim_backward(&trial),
            };
            match segment {
                Some(segment) => {
                    let removed = segment.removed(trial.len());
                    trial = segment.apply(&trial);
                    trimmed_frames = Some(removed);
                    if line.accepted {
                        next = next.after_trim(direction, removed);
                    }
                }
                None if line.accepted => {
                    return Err(OwtpsError::Ensemble(
                        ErrorInfo::new(
                            codes::UNTRIMMABLE_ACCEPTED_TRIAL,
                            "accepted trial never reaches a state",
                        )
                        .with_context("file", line.file.clone())
                        .with_context("direction", direction.to_string()),
                    ));
                }
                None => debug!(
                    "{}: rejected {direction} trial has no boundary segment, kept untrimmed",
                    line.file
                ),
            }
        }

        if options.includes_shooting_point || options.full_trajectory {
            trial = match direction {
                Direction::Forward => trial.tail_from(1),
                Direction::Backward => trial.head_until(trial.len().saturating_sub(1)),
            };
        }

        Ok(ParsedLine {
            record: MoveRecord::new(trial, shooting_index, line.accepted, direction),
            offsets: next,
            source,
            trimmed_frames,
        })
    }

    /// Converts consecutive lines, threading the offsets through them.
    ///
    /// Blank and comment lines are skipped. `first_line` numbers the first
    /// entry of `lines` in error context.
    pub fn parse_block<'a, I>(
        &self,
        lines: I,
        first_line: usize,
        offsets: TrimOffsets,
    ) -> Result<(Vec<ParsedLine<F>>, TrimOffsets), OwtpsError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut parsed = Vec::new();
        let mut offsets = offsets;
        for (number, line) in lines.into_iter().enumerate() {
            if !is_move_line(line) {
                continue;
            }
            let entry = self
                .parse_line(line, offsets)
                .map_err(|err| err.with_context("summary_line", (first_line + number).to_string()))?;
            offsets = entry.offsets;
            parsed.push(entry);
        }
        Ok((parsed, offsets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_vocabulary() {
        for token in ["+1", "1", "fw", "F", "Forward"] {
            assert_eq!(parse_direction(token).unwrap(), Direction::Forward);
        }
        for token in ["-1", "bw", "B", "backward"] {
            assert_eq!(parse_direction(token).unwrap(), Direction::Backward);
        }
        let err = parse_direction("sideways").unwrap_err();
        assert_eq!(err.code(), codes::UNRECOGNIZED_DIRECTION);
    }

    #[test]
    fn acceptance_vocabulary() {
        for token in ["1", "t", "True", "y", "YES", "acc"] {
            assert!(parse_acceptance(token).unwrap());
        }
        for token in ["0", "f", "false", "N", "no", "Rej"] {
            assert!(!parse_acceptance(token).unwrap());
        }
        assert_eq!(
            parse_acceptance("maybe").unwrap_err().code(),
            codes::UNRECOGNIZED_ACCEPTANCE
        );
    }

    #[test]
    fn field_count_and_integers_are_checked() {
        let err = SummaryLine::parse("t1.dat 4 BW").unwrap_err();
        assert_eq!(err.code(), codes::MALFORMED_SUMMARY_LINE);
        let err = SummaryLine::parse("t1.dat 4 BW T 1 2").unwrap_err();
        assert_eq!(err.code(), codes::MALFORMED_SUMMARY_LINE);
        let err = SummaryLine::parse("t1.dat four BW T").unwrap_err();
        assert_eq!(err.code(), codes::MALFORMED_SUMMARY_LINE);

        let line = SummaryLine::parse("  t1.dat -3 -1 REJ 7 ").unwrap();
        assert_eq!(line.shooting_index, -3);
        assert_eq!(line.direction, Direction::Backward);
        assert!(!line.accepted);
        assert_eq!(line.trial_shooting_index, Some(7));
    }

    #[test]
    fn comments_are_not_moves() {
        assert!(!is_move_line("   "));
        assert!(!is_move_line("# header"));
        assert!(is_move_line("t1.dat 4 BW T"));
    }
}
