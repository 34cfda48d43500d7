//! CLI argument definitions and shared statics.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "profile", version, about = "Insulin profile engine CLI")]
pub struct Cli {
    /// Path to config TOML (defaults apply when omitted)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print results and errors as JSON, log as JSON lines
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides `[logging] level`
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Profile document plus the switch parameters applied on top of it.
#[derive(Args, Debug, Clone)]
pub struct ProfileArgs {
    /// Nightscout profile JSON (units, dia, timezone, sens, carbratio, basal, target_low, target_high)
    #[arg(long, value_name = "FILE")]
    pub profile: PathBuf,

    /// Scaling percentage; must be > 0
    #[arg(long, value_name = "P", allow_negative_numbers = true)]
    pub percentage: Option<i32>,

    /// Timeshift in whole hours
    #[arg(long, value_name = "H", allow_negative_numbers = true)]
    pub timeshift: Option<i32>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate basal, carb ratio, sensitivity and targets at one instant
    Eval {
        #[command(flatten)]
        profile: ProfileArgs,
        /// Instant to evaluate (RFC 3339); defaults to now in the profile's zone
        #[arg(long, value_name = "RFC3339")]
        at: Option<String>,
    },
    /// Check the profile against pump capabilities and hard limits
    Validate {
        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// Print the canonical Nightscout JSON
    Export {
        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// Bake percentage and timeshift into a midnight-aligned profile
    Normalize {
        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// Apply a temporary basal and print the delivered rate
    Override {
        #[command(flatten)]
        profile: ProfileArgs,
        /// Override rate: U/h, or percent of schedule with --percent
        #[arg(long, value_name = "R")]
        rate: f64,
        /// Treat --rate as percent of the scheduled basal
        #[arg(long, action = ArgAction::SetTrue)]
        percent: bool,
        /// Override length in minutes; must be > 0
        #[arg(long = "duration-min", value_name = "M", allow_negative_numbers = true)]
        duration_min: i64,
        /// Override start (RFC 3339); defaults to --at
        #[arg(long, value_name = "RFC3339")]
        start: Option<String>,
        /// Instant to evaluate (RFC 3339); defaults to now in the profile's zone
        #[arg(long, value_name = "RFC3339")]
        at: Option<String>,
    },
}
