//! Command-line arguments, parsed with [`clap`].
//!
//! Each flag can also come from the environment; an explicit flag wins.

use clap::Parser;

const ENV_HELP: &str = "Environment:
  DRAGTUI_API_BASE      Results API base URL (or a forward-proxy URL)
  DRAGTUI_AUTH_TOKEN    Token sent as the Auth-Token header";

/// Live drag racing results in your terminal
#[derive(Parser, Debug, Default, Clone, PartialEq, Eq)]
#[command(author, version, about, long_about = None, after_help = ENV_HELP)]
pub struct CliArgs {
    /// Category code to select when a menu loads
    #[arg(short, long, env = "DRAGTUI_CATEGORY", value_name = "CODE")]
    pub category: Option<String>,

    /// Race date (YYYY-MM-DD or DD/MM/YYYY), default today
    #[arg(short, long, value_name = "DATE")]
    pub date: Option<String>,

    /// Log level for the log pane (error, warn, info, debug)
    #[arg(long, env = "DRAGTUI_LOG", value_name = "LEVEL")]
    pub log_level: Option<String>,
}
