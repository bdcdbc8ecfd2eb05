use anyhow::{Context, Result};

use crate::alerts::notifications::send_test_notification;
use crate::commands::build_notifier;
use crate::config::Config;

pub fn handle_test_notify_command(config: &Config, dry_run: bool, json_output: bool) -> Result<()> {
    let notifier = build_notifier(config, dry_run)?;
    send_test_notification(notifier.as_ref(), &config.server.name)
        .context("Failed to send test notification")?;

    if json_output {
        println!(r#"{{"status": "success", "message": "Test notification sent"}}"#);
    } else if dry_run || !config.notifications.enabled {
        println!("Test notification logged (delivery disabled)");
    } else {
        println!("Test notification sent to {}", config.smtp.recipient);
    }
    Ok(())
}
