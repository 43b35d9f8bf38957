//! Command-line configuration.
//!
//! Every option can also come from the environment:
//!
//! - `LUMBUNG_HISTORY`: file for interactive line history (optional)
//! - `LUMBUNG_LOG`: tracing filter directive (default: `warn`)

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(version, about = "Single-table B+Tree key-value store", long_about = None)]
pub struct Config {
    /// Database file; created when missing
    pub db_path: PathBuf,

    /// Keep interactive line history in this file
    #[arg(long, env = "LUMBUNG_HISTORY")]
    pub history: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `lumbung=trace`; logs go to stderr
    #[arg(long = "log", env = "LUMBUNG_LOG", default_value = "warn")]
    pub log_filter: String,
}
