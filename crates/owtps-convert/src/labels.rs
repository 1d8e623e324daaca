//! Per-frame state label tables.
//!
//! Each frame becomes one tab separated row:
//! `state  time  stop  source  position  coordinates...`, where `state` is
//! the name of the state holding the frame (`I` when none does) and `stop`
//! turns `True` once the trajectory prefix has visited two different states.

use std::io::Write;

use owtps_core::errors::{codes, ErrorInfo};
use owtps_core::{Frame, OwtpsError, StateSet, Trajectory};
use serde::{Deserialize, Serialize};

/// Label of frames outside every state.
pub const INTERMEDIATE: &str = "I";

/// Time axis and frame positions of a label table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelSettings {
    /// Time of the first frame.
    #[serde(default)]
    pub start_time: f64,
    /// Time between frames.
    #[serde(default = "default_dt")]
    pub dt: f64,
    /// Position increment per frame (for example bytes per frame).
    #[serde(default)]
    pub frame_size: f64,
}

fn default_dt() -> f64 {
    1.0
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            dt: default_dt(),
            frame_size: 0.0,
        }
    }
}

/// One row of a label table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRow {
    /// State name or [`INTERMEDIATE`].
    pub state: String,
    /// Frame time.
    pub time: f64,
    /// Whether the prefix ending here has visited two different states.
    pub stop: bool,
    /// Trajectory file the frame came from.
    pub source: String,
    /// Accumulated frame position.
    pub position: f64,
    /// Frame coordinates.
    pub coordinates: Vec<f64>,
}

/// Labels every frame of `trajectory`.
pub fn label_frames(
    trajectory: &Trajectory<Frame>,
    states: &StateSet<Frame>,
    source: &str,
    settings: &LabelSettings,
) -> Vec<LabelRow> {
    let mut first_visited: Option<usize> = None;
    let mut stop = false;
    trajectory
        .iter()
        .enumerate()
        .map(|(index, frame)| {
            let state = states.state_of(frame);
            if let Some(state) = state {
                match first_visited {
                    None => first_visited = Some(state),
                    Some(first) if first != state => stop = true,
                    Some(_) => {}
                }
            }
            LabelRow {
                state: states
                    .state_name(frame)
                    .unwrap_or(INTERMEDIATE)
                    .to_string(),
                time: settings.start_time + index as f64 * settings.dt,
                stop,
                source: source.to_string(),
                position: index as f64 * settings.frame_size,
                coordinates: frame.coordinates.clone(),
            }
        })
        .collect()
}

/// Writes `rows` as a headerless tab separated table.
pub fn write_label_table<W: Write>(rows: &[LabelRow], writer: W) -> Result<(), OwtpsError> {
    let mut table = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_writer(writer);
    for row in rows {
        let mut record = vec![
            row.state.clone(),
            row.time.to_string(),
            if row.stop { "True" } else { "False" }.to_string(),
            row.source.clone(),
            row.position.to_string(),
        ];
        record.extend(row.coordinates.iter().map(f64::to_string));
        table.write_record(&record).map_err(table_error)?;
    }
    table.flush().map_err(|err| {
        OwtpsError::Storage(ErrorInfo::new(codes::STORAGE_IO, err.to_string()))
    })
}

fn table_error(err: csv::Error) -> OwtpsError {
    OwtpsError::Storage(
        ErrorInfo::new(codes::STORAGE_IO, err.to_string()).with_context("table", "labels"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use owtps_core::RangeVolume;

    fn states() -> StateSet<Frame> {
        StateSet::from(vec![
            RangeVolume::below("A", 0, 0.0),
            RangeVolume::at_or_above("B", 0, 10.0),
        ])
    }

    #[test]
    fn stop_flag_turns_on_at_second_state() {
        let traj = Trajectory::from_scalars(&[-1.0, 3.0, -0.5, 11.0, 4.0]);
        let settings = LabelSettings {
            start_time: 2.0,
            dt: 0.5,
            frame_size: 10.0,
        };
        let rows = label_frames(&traj, &states(), "run.dat", &settings);
        let labels: Vec<&str> = rows.iter().map(|row| row.state.as_str()).collect();
        assert_eq!(labels, vec!["A", "I", "A", "B", "I"]);
        let stops: Vec<bool> = rows.iter().map(|row| row.stop).collect();
        assert_eq!(stops, vec![false, false, false, true, true]);
        assert_eq!(rows[2].time, 3.0);
        assert_eq!(rows[3].position, 30.0);
    }

    #[test]
    fn table_is_tab_separated() {
        let traj = Trajectory::from_scalars(&[-1.0, 12.5]);
        let rows = label_frames(&traj, &states(), "run.dat", &LabelSettings::default());
        let mut out = Vec::new();
        write_label_table(&rows, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "A\t0\tFalse\trun.dat\t0\t-1");
        assert_eq!(lines[1], "B\t1\tTrue\trun.dat\t0\t12.5");
    }
}
