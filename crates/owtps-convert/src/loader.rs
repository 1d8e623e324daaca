//! Trajectory file loaders.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use owtps_core::errors::{codes, ErrorInfo};
use owtps_core::{Frame, OwtpsError, Trajectory};
use serde::{Deserialize, Serialize};

/// Turns a file name from the summary into a trajectory.
pub trait TrajectoryLoader<F> {
    /// Loads the trajectory stored at `path`.
    fn load_trajectory(&self, path: &Path) -> Result<Trajectory<F>, OwtpsError>;
}

/// Whitespace separated text, one frame per line.
///
/// Blank lines and everything after `#` are ignored. With `columns` set,
/// only those columns (0-based) become frame coordinates, in the given order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextTrajectoryLoader {
    /// Columns kept as coordinates; all columns when `None`.
    #[serde(default)]
    pub columns: Option<Vec<usize>>,
}

impl TextTrajectoryLoader {
    /// Loader keeping every column.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader keeping only `columns`.
    pub fn with_columns(columns: Vec<usize>) -> Self {
        Self {
            columns: Some(columns),
        }
    }

    /// Parses trajectory text; `origin` only labels errors.
    pub fn parse(&self, text: &str, origin: &Path) -> Result<Trajectory<Frame>, OwtpsError> {
        let mut frames = Vec::new();
        for (number, raw) in text.lines().enumerate() {
            let content = raw.split('#').next().unwrap_or_default().trim();
            if content.is_empty() {
                continue;
            }
            let values = content
                .split_whitespace()
                .map(|token| token.parse::<f64>().map_err(|_| token))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|token| {
                    parse_error(origin, number + 1, format!("not a number: {token}"))
                })?;
            let coordinates = match &self.columns {
                None => values,
                Some(columns) => columns
                    .iter()
                    .map(|&column| {
                        values.get(column).copied().ok_or_else(|| {
                            parse_error(
                                origin,
                                number + 1,
                                format!("missing column {column} (line has {})", values.len()),
                            )
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            };
            frames.push(Frame::new(coordinates));
        }
        Ok(Trajectory::new(frames))
    }
}

impl TrajectoryLoader<Frame> for TextTrajectoryLoader {
    fn load_trajectory(&self, path: &Path) -> Result<Trajectory<Frame>, OwtpsError> {
        let text = fs::read_to_string(path).map_err(|err| {
            OwtpsError::Trajectory(
                ErrorInfo::new(codes::TRAJECTORY_READ, err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        self.parse(&text, path)
    }
}

fn parse_error(origin: &Path, line: usize, message: String) -> OwtpsError {
    OwtpsError::Trajectory(
        ErrorInfo::new(codes::TRAJECTORY_PARSE, message)
            .with_context("path", origin.display().to_string())
            .with_context("line", line.to_string()),
    )
}

/// Trajectories registered in memory under file names.
///
/// Lookups try the full path first and then its file name, so the loader
/// works no matter which directory the summary file was resolved against.
#[derive(Debug)]
pub struct MemoryLoader<F> {
    trajectories: HashMap<PathBuf, Trajectory<F>>,
}

impl<F> Default for MemoryLoader<F> {
    fn default() -> Self {
        Self {
            trajectories: HashMap::new(),
        }
    }
}

impl<F> MemoryLoader<F> {
    /// Empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `trajectory` under `name`.
    pub fn insert(&mut self, name: impl Into<PathBuf>, trajectory: Trajectory<F>) {
        self.trajectories.insert(name.into(), trajectory);
    }

    /// Builder form of [`MemoryLoader::insert`].
    pub fn with(mut self, name: impl Into<PathBuf>, trajectory: Trajectory<F>) -> Self {
        self.insert(name, trajectory);
        self
    }
}

impl<F> TrajectoryLoader<F> for MemoryLoader<F> {
    fn load_trajectory(&self, path: &Path) -> Result<Trajectory<F>, OwtpsError> {
        self.trajectories
            .get(path)
            .or_else(|| {
                path.file_name()
                    .and_then(|name| self.trajectories.get(Path::new(name)))
            })
            .cloned()
            .ok_or_else(|| {
                OwtpsError::Trajectory(
                    ErrorInfo::new(codes::TRAJECTORY_READ, "no trajectory registered under this name")
                        .with_context("path", path.display().to_string()),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_and_columns() {
        let text = "# time x y\n0 1.5 2.0\n\n1 -0.5 3.0 # trailing\n";
        let loader = TextTrajectoryLoader::with_columns(vec![1]);
        let traj = loader.parse(text, Path::new("demo.dat")).unwrap();
        assert_eq!(traj.scalars(), vec![1.5, -0.5]);
        let all = TextTrajectoryLoader::new()
            .parse(text, Path::new("demo.dat"))
            .unwrap();
        assert_eq!(all.get(1).map(|f| f.dimension()), Some(3));
    }

    #[test]
    fn bad_tokens_report_the_line() {
        let err = TextTrajectoryLoader::new()
            .parse("1.0\nabc\n", Path::new("bad.dat"))
            .unwrap_err();
        assert_eq!(err.code(), codes::TRAJECTORY_PARSE);
        assert_eq!(err.info().context.get("line").map(String::as_str), Some("2"));
    }

    #[test]
    fn memory_loader_falls_back_to_file_name() {
        let loader = MemoryLoader::new().with("t1.dat", Trajectory::from_scalars(&[1.0]));
        assert!(loader.load_trajectory(Path::new("/runs/t1.dat")).is_ok());
        assert!(loader.load_trajectory(Path::new("t2.dat")).is_err());
    }
}
