use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    convert::{self, ConvertArgs},
    label::{self, LabelArgs},
    summarize::{self, SummarizeArgs},
};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "owtps-sim", about = "One-way TPS summary converter")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a summary file into a step history.
    Convert(ConvertArgs),
    /// Print acceptance, path lengths and decorrelation of a step history.
    Summarize(SummarizeArgs),
    /// Print the per-frame state label table of a trajectory.
    Label(LabelArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match cli.command {
        Command::Convert(args) => convert::run(args),
        Command::Summarize(args) => summarize::run(&args),
        Command::Label(args) => label::run(&args),
    }
}
