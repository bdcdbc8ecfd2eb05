// dbprobe: database server threshold monitor
use clap::Parser;

use dbprobe::cli::{Cli, Commands};
use dbprobe::commands::{handle_check_command, handle_config_action, handle_test_notify_command, load_config};
use dbprobe::config::Config;
use dbprobe::logging;

fn load_or_exit(path: Option<&str>) -> Config {
    // Invalid thresholds stop the run here
    match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load configuration: {e:#}");
            std::process::exit(1);
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command.unwrap_or(Commands::Check) {
        Commands::Config { action } => {
            handle_config_action(action, cli.config.as_deref(), cli.json);
        }
        Commands::TestNotify => {
            let config = load_or_exit(cli.config.as_deref());
            handle_test_notify_command(&config, cli.dry_run, cli.json)?;
        }
        Commands::Check => {
            let config = load_or_exit(cli.config.as_deref());
            let report = handle_check_command(&config, cli.dry_run, cli.json)?;
            if report.has_failed_deliveries() {
                std::process::exit(1);
            }
        }
    }
    Ok(())
}
