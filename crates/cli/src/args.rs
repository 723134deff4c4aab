//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// profile-scout: score social profiles as growth-service prospects
#[derive(Parser, Debug)]
#[command(name = "profile-scout")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a single profile
    Analyze(AnalyzeArgs),

    /// Analyze every username listed in a file
    Batch(BatchArgs),

    /// List the best stored opportunities
    Opportunities(OpportunitiesArgs),

    /// Show past analyses of a profile
    History(HistoryArgs),

    /// Mark a profile as contacted
    Contact(OutreachArgs),

    /// Mark a profile as converted
    Convert(OutreachArgs),

    /// Recent opportunities not yet contacted
    Report(ReportArgs),

    /// Re-analyze the configured usernames on a schedule
    Watch(WatchArgs),

    /// Serve the HTTP API
    Serve(ServeArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show status
    Doctor(DoctorArgs),
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Username to analyze (with or without @)
    pub username: String,

    /// Analyze this snapshot file instead of fetching from the source
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Export the report as JSON (to PATH, or the export dir when no path is given)
    #[arg(long, num_args = 0..=1, value_name = "PATH")]
    pub export: Option<Option<PathBuf>>,

    /// Do not store the result
    #[arg(long)]
    pub no_save: bool,

    /// Fetch a fresh snapshot even when a recent analysis is stored
    #[arg(long)]
    pub force: bool,

    /// Maximum issues and recommendations shown in the text report
    #[arg(long)]
    pub top: Option<usize>,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// File with one username per line (use - for stdin)
    pub file: PathBuf,

    /// Minimum score counted as an opportunity in the summary
    #[arg(long, default_value_t = 5.0)]
    pub min_score: f64,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Append each report to this JSONL file
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// Re-fetch every profile, ignoring recent stored analyses
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct OpportunitiesArgs {
    /// Maximum profiles listed
    #[arg(long, default_value_t = 20)]
    pub limit: usize,

    /// Minimum opportunity score
    #[arg(long, default_value_t = 5.0)]
    pub min_score: f64,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Username to look up
    pub username: String,

    /// Maximum analyses listed
    #[arg(long, default_value_t = 10)]
    pub limit: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct OutreachArgs {
    /// Username of the lead
    pub username: String,

    /// Free-form notes stored with the lead
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Look-back window in days
    #[arg(long, default_value_t = 7)]
    pub days: i64,

    /// Minimum opportunity score
    #[arg(long, default_value_t = 6.0)]
    pub min_score: f64,

    /// Maximum profiles listed
    #[arg(long, default_value_t = 20)]
    pub limit: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on (overrides [server].bind)
    #[arg(long)]
    pub bind: Option<String>,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Run one analysis cycle and exit
    #[arg(long)]
    pub once: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./config.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration as TOML
    Show,
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
