//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Root growth simulation under hexose and amino acid co-limitation
#[derive(Parser, Debug)]
#[command(name = "rhizoflux-engine")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Base configuration file (defaults apply when it does not exist)
    #[arg(
        short,
        long,
        global = true,
        env = "RHIZOFLUX_CONFIG",
        default_value = "rhizoflux-config.yaml",
        value_hint = ValueHint::FilePath
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one simulation
    Run {
        /// Scenario file to take overrides from
        #[arg(long, requires = "name", value_hint = ValueHint::FilePath)]
        scenarios: Option<PathBuf>,

        /// Scenario to run
        #[arg(long, requires = "scenarios")]
        name: Option<String>,

        /// Override the configured number of steps
        #[arg(long)]
        steps: Option<u64>,

        /// Write the step summaries as JSON
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Run the scenarios of a file, one process each
    Batch {
        /// Scenario file
        #[arg(long, value_hint = ValueHint::FilePath)]
        scenarios: PathBuf,

        /// Maximum concurrent runs (default: available cores)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Directory receiving one `<scenario>.json` summary file per run
        #[arg(long, value_hint = ValueHint::DirPath)]
        output_dir: Option<PathBuf>,

        /// Run only these scenarios (repeatable)
        #[arg(long = "only")]
        only: Vec<String>,
    },
}
