use std::error::Error;
use std::io;
use std::path::PathBuf;

use clap::Args;
use log::info;
use owtps_convert::{convert_to_dir, ConvertRequest, ConverterConfig};

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Summary file, one shooting move per line.
    pub summary: PathBuf,
    /// YAML file with the states and conversion options.
    #[arg(long, visible_alias = "nc")]
    pub config: PathBuf,
    /// Directory receiving the step history, step table and manifest.
    #[arg(long)]
    pub output: PathBuf,
    /// Initial trajectory; the first summary line names it when omitted.
    #[arg(long)]
    pub initial: Option<PathBuf>,
    /// Topology file, recorded in the manifest.
    #[arg(long)]
    pub top: Option<PathBuf>,
    /// Summary lines replayed per block.
    #[arg(long)]
    pub block_size: Option<usize>,
    /// Suppress the per-line progress output on stderr.
    #[arg(long)]
    pub quiet: bool,
}

pub fn run(args: ConvertArgs) -> Result<(), Box<dyn Error>> {
    let config = ConverterConfig::load(&args.config)?;
    let mut request = ConvertRequest::new(&args.summary, &args.output);
    request.initial = args.initial;
    request.topology = args.top;
    request.block_size = args.block_size;
    if !args.quiet {
        request.progress = Some(Box::new(io::stderr()));
    }
    let outcome = convert_to_dir(&config, request)?;
    info!(
        "converted {} move(s), {} accepted, history in {}",
        outcome.report.moves,
        outcome.report.accepted,
        outcome.steps_path.display()
    );
    println!("{}", serde_json::to_string_pretty(&outcome.report)?);
    Ok(())
}
