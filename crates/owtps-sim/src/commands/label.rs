use std::error::Error;
use std::io;
use std::path::PathBuf;

use clap::Args;
use owtps_convert::{label_frames, write_label_table, ConverterConfig, LabelSettings, TrajectoryLoader};

#[derive(Args, Debug)]
pub struct LabelArgs {
    /// Trajectory file to label.
    pub trajectory: PathBuf,
    /// YAML file with the states and loader settings.
    #[arg(long)]
    pub config: PathBuf,
    /// Time between frames.
    #[arg(long, default_value_t = 1.0)]
    pub dt: f64,
    /// Time of the first frame.
    #[arg(long, default_value_t = 0.0)]
    pub start_time: f64,
    /// Position increment per frame.
    #[arg(long, default_value_t = 0.0)]
    pub frame_size: f64,
}

pub fn run(args: &LabelArgs) -> Result<(), Box<dyn Error>> {
    let config = ConverterConfig::load(&args.config)?;
    let trajectory = config.loader.load_trajectory(&args.trajectory)?;
    let settings = LabelSettings {
        start_time: args.start_time,
        dt: args.dt,
        frame_size: args.frame_size,
    };
    let source = args.trajectory.display().to_string();
    let rows = label_frames(&trajectory, &config.state_set(), &source, &settings);
    write_label_table(&rows, io::stdout().lock())?;
    Ok(())
}
