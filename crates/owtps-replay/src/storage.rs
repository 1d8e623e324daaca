//! Step history sinks.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use owtps_core::errors::{codes, ErrorInfo};
use owtps_core::OwtpsError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::engine::{MoveScheme, StepRecord};

/// Destination of the replayed step history.
pub trait StepStorage<F> {
    /// Stores the move scheme; called once before step 0.
    fn save_scheme(&mut self, scheme: &MoveScheme) -> Result<(), OwtpsError>;

    /// Appends one step.
    fn save_step(&mut self, step: &StepRecord<F>) -> Result<(), OwtpsError>;

    /// Makes everything saved so far durable.
    fn sync(&mut self) -> Result<(), OwtpsError> {
        Ok(())
    }

    /// Syncs and releases the storage.
    fn close(&mut self) -> Result<(), OwtpsError> {
        self.sync()
    }
}

/// Storage that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStorage;

impl<F> StepStorage<F> for NullStorage {
    fn save_scheme(&mut self, _scheme: &MoveScheme) -> Result<(), OwtpsError> {
        Ok(())
    }

    fn save_step(&mut self, _step: &StepRecord<F>) -> Result<(), OwtpsError> {
        Ok(())
    }
}

/// In-memory step history.
#[derive(Debug)]
pub struct MemoryStorage<F> {
    scheme: Option<MoveScheme>,
    steps: Vec<StepRecord<F>>,
    syncs: usize,
    closed: bool,
}

impl<F> Default for MemoryStorage<F> {
    fn default() -> Self {
        Self {
            scheme: None,
            steps: Vec::new(),
            syncs: 0,
            closed: false,
        }
    }
}

impl<F> MemoryStorage<F> {
    /// Empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored scheme.
    pub fn scheme(&self) -> Option<&MoveScheme> {
        self.scheme.as_ref()
    }

    /// Stored steps, step 0 first.
    pub fn steps(&self) -> &[StepRecord<F>] {
        &self.steps
    }

    /// Consumes the storage and returns its steps.
    pub fn into_steps(self) -> Vec<StepRecord<F>> {
        self.steps
    }

    /// Number of syncs requested so far.
    pub fn sync_count(&self) -> usize {
        self.syncs
    }

    /// Whether [`StepStorage::close`] was called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<F> StepStorage<F> for MemoryStorage<F> {
    fn save_scheme(&mut self, scheme: &MoveScheme) -> Result<(), OwtpsError> {
        self.scheme = Some(scheme.clone());
        Ok(())
    }

    fn save_step(&mut self, step: &StepRecord<F>) -> Result<(), OwtpsError> {
        self.steps.push(step.clone());
        Ok(())
    }

    fn sync(&mut self) -> Result<(), OwtpsError> {
        self.syncs += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), OwtpsError> {
        self.closed = true;
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum EntryRef<'a, F> {
    Scheme(&'a MoveScheme),
    Step(&'a StepRecord<F>),
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum Entry<F> {
    Scheme(MoveScheme),
    Step(StepRecord<F>),
}

/// Contents of a JSON lines step file.
#[derive(Debug)]
pub struct StoredRun<F> {
    /// Scheme line, if present.
    pub scheme: Option<MoveScheme>,
    /// Step lines in file order.
    pub steps: Vec<StepRecord<F>>,
}

/// Append-only JSON lines storage, one entry per line.
pub struct JsonLinesStorage {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl JsonLinesStorage {
    /// Creates (or truncates) the file at `path`, creating parent directories.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, OwtpsError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| io_error(&path, err))?;
            }
        }
        let file = File::create(&path).map_err(|err| io_error(&path, err))?;
        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
        })
    }

    /// Location of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads back a file written by this storage.
    pub fn read<F: DeserializeOwned>(path: &Path) -> Result<StoredRun<F>, OwtpsError> {
        let file = File::open(path).map_err(|err| io_error(path, err))?;
        let mut run = StoredRun {
            scheme: None,
            steps: Vec::new(),
        };
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|err| io_error(path, err))?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: Entry<F> = serde_json::from_str(&line).map_err(|err| {
                OwtpsError::Storage(
                    ErrorInfo::new(codes::STORAGE_FORMAT, err.to_string())
                        .with_context("path", path.display().to_string())
                        .with_context("line", (number + 1).to_string()),
                )
            })?;
            match entry {
                Entry::Scheme(scheme) => run.scheme = Some(scheme),
                Entry::Step(step) => run.steps.push(step),
            }
        }
        Ok(run)
    }

    fn write_entry<F: Serialize>(&mut self, entry: &EntryRef<'_, F>) -> Result<(), OwtpsError> {
        let path = self.path.clone();
        let writer = self.writer.as_mut().ok_or_else(|| {
            OwtpsError::Storage(
                ErrorInfo::new(codes::STORAGE_CLOSED, "storage already closed")
                    .with_context("path", path.display().to_string()),
            )
        })?;
        serde_json::to_writer(&mut *writer, entry).map_err(|err| {
            OwtpsError::Storage(
                ErrorInfo::new(codes::STORAGE_FORMAT, err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        writer.write_all(b"\n").map_err(|err| io_error(&path, err))
    }
}

impl<F: Serialize> StepStorage<F> for JsonLinesStorage {
    fn save_scheme(&mut self, scheme: &MoveScheme) -> Result<(), OwtpsError> {
        self.write_entry::<F>(&EntryRef::Scheme(scheme))
    }

    fn save_step(&mut self, step: &StepRecord<F>) -> Result<(), OwtpsError> {
        self.write_entry(&EntryRef::Step(step))
    }

    fn sync(&mut self) -> Result<(), OwtpsError> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush().map_err(|err| io_error(&self.path, err)),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> Result<(), OwtpsError> {
        <Self as StepStorage<F>>::sync(self)?;
        self.writer = None;
        Ok(())
    }
}

fn io_error(path: &Path, err: std::io::Error) -> OwtpsError {
    OwtpsError::Storage(
        ErrorInfo::new(codes::STORAGE_IO, err.to_string())
            .with_context("path", path.display().to_string()),
    )
}
