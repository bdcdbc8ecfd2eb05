use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "dbprobe")]
#[command(about = "Database server threshold monitor")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON output format
    #[arg(long, global = true)]
    pub json: bool,

    /// Log alerts instead of sending them
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Initialize fresh configuration
    Init,
    /// Set configuration value
    Set {
        /// Configuration key (e.g., thresholds.cpu_utilization_threshold)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one monitoring cycle (default)
    Check,

    /// Send a test alert through the configured notifier
    #[command(name = "test-notify")]
    TestNotify,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}
