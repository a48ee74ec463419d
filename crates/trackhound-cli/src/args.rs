use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "trackhound")]
#[command(author, version, about = "Find and download one audio track from a free-text query")]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Track to search for (shorthand for `fetch <QUERY>`)
    #[arg(value_name = "QUERY", num_args = 1.., trailing_var_arg = true)]
    pub query: Vec<String>,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search every source in order and save the first match
    Fetch {
        /// Track title, artist, or both
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        #[command(flatten)]
        options: FetchOptions,
    },

    /// Fetch every query in a file (one per line)
    Batch {
        /// File containing queries; blank lines and `#` comments are skipped
        #[arg(short, long)]
        input: PathBuf,

        /// Queries processed concurrently
        #[arg(short, long, default_value = "2")]
        parallel: usize,

        /// Pause between starting queries, in milliseconds
        #[arg(long, default_value = "1000")]
        pause_ms: u64,

        #[command(flatten)]
        options: FetchOptions,
    },

    /// Check external tools
    Doctor,

    /// Show configuration
    Config,
}

#[derive(clap::Args, Clone)]
pub struct FetchOptions {
    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// What to do when a source finds a track over the duration or size cap
    #[arg(long, value_enum)]
    pub on_track_limit: Option<LimitPolicy>,

    /// Keep the temporary artifact instead of copying it out (for debugging)
    #[arg(long)]
    pub keep_temp: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimitPolicy {
    /// Stop at the first source that reports a limit violation
    Abort,
    /// Keep trying the remaining sources
    Skip,
}

impl From<LimitPolicy> for trackhound_core::config::TrackLimitPolicy {
    fn from(policy: LimitPolicy) -> Self {
        match policy {
            LimitPolicy::Abort => Self::Abort,
            LimitPolicy::Skip => Self::Skip,
        }
    }
}
