// Command handlers module
pub mod check;
pub mod config;
pub mod notify;

use anyhow::Result;
use std::path::PathBuf;

use crate::alerts::notifications::{EmailNotifier, LogNotifier, Notifier};
use crate::config::Config;

// Re-export command handlers for easy access
pub use check::handle_check_command;
pub use config::handle_config_action;
pub use notify::handle_test_notify_command;

/// Loads the config from `--config` when given, otherwise from the default path.
pub fn load_config(path: Option<&str>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(&PathBuf::from(path)),
        None => Config::load(),
    }
}

/// Email delivery unless notifications are disabled or this is a dry run.
pub fn build_notifier(config: &Config, dry_run: bool) -> Result<Box<dyn Notifier>> {
    if dry_run || !config.notifications.enabled {
        tracing::info!("Email delivery disabled, alerts will only be logged");
        return Ok(Box::new(LogNotifier));
    }
    Ok(Box::new(EmailNotifier::from_config(&config.smtp)?))
}
