use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use owtps_core::Frame;
use owtps_replay::{acceptance_summary, decorrelated_trajectories, path_lengths, JsonLinesStorage};
use serde_json::json;

#[derive(Args, Debug)]
pub struct SummarizeArgs {
    /// Step history written by `owtps-sim convert`.
    #[arg(long)]
    pub steps: PathBuf,
    /// Replica to report path lengths and decorrelation for.
    #[arg(long, default_value_t = 0)]
    pub replica: usize,
}

pub fn run(args: &SummarizeArgs) -> Result<(), Box<dyn Error>> {
    let stored = JsonLinesStorage::read::<Frame>(&args.steps)?;
    let acceptance = acceptance_summary(&stored.steps);
    let lengths = path_lengths(&stored.steps, args.replica);
    let decorrelated = decorrelated_trajectories(&stored.steps, args.replica);
    let report = json!({
        "steps": stored.steps.len(),
        "replica": args.replica,
        "acceptance": acceptance,
        "path_lengths": lengths,
        "decorrelated": decorrelated.len(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
