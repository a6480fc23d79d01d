//! Command line arguments.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "deskbot", about = "IT department assistant bot", version)]
pub struct Cli {
    /// Directory holding the layered TOML configuration files.
    #[arg(short, long, env = "DESKBOT_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Overrides the configured log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    pub log_level: Option<String>,
}
