use std::path::PathBuf;

use clap::Parser;

/// Name the server is invoked as, used in usage text.
pub const BIN_NAME: &str = "proven-logd";

/// Command line of the server.
#[derive(Clone, Debug, Parser)]
#[command(name = BIN_NAME, about = "Run the server with managed logging", long_about = None)]
pub struct Args {
    /// Log to stdout instead of a log file (otherwise stdout is detached after startup)
    #[arg(short, long, env = "PROVEN_LOGD_FOREGROUND")]
    pub foreground: bool,

    /// Logging configuration file (TOML)
    #[arg(value_name = "CONFIG")]
    pub config: Option<PathBuf>,
}
