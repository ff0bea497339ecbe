//! Command-line interface.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "adgm-register")]
#[command(about = "Extracts regulated-activity data for ADGM FSRA-licensed firms from the public register")]
#[command(version)]
pub struct Args {
    /// File with company display names, one per line
    #[arg(
        short,
        long,
        env = "COMPANY_NAMES_FILE_PATH",
        required_unless_present = "init"
    )]
    pub input: Option<PathBuf>,

    /// Output CSV file; interrupted or failed runs write `partial_<name>` instead
    #[arg(short, long, default_value = "adgm_public_register_data.csv")]
    pub output: PathBuf,

    /// Maximum concurrent register fetches
    #[arg(short = 'j', long, default_value_t = 10)]
    pub parallel_jobs: usize,

    /// Configuration file (defaults to ./config/adgm-register.toml, built-in
    /// defaults when absent)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Verbose logging (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Write the default configuration file and exit
    #[arg(long)]
    pub init: bool,
}
