use std::path::PathBuf;

use crate::cli::ConfigAction;
use crate::commands::load_config;
use crate::config::Config;

fn target_path(custom: Option<&str>) -> anyhow::Result<PathBuf> {
    match custom {
        Some(path) => Ok(PathBuf::from(path)),
        None => Config::default_path(),
    }
}

fn fail(json_output: bool, message: &str, e: &anyhow::Error) -> ! {
    if json_output {
        println!(
            "{}",
            serde_json::json!({ "status": "error", "message": format!("{}: {:#}", message, e) })
        );
    } else {
        eprintln!("Error: {}: {:#}", message, e);
    }
    std::process::exit(1);
}

pub fn handle_config_action(action: ConfigAction, custom_path: Option<&str>, json_output: bool) {
    let config_path = match target_path(custom_path) {
        Ok(path) => path,
        Err(e) => fail(json_output, "Failed to resolve config path", &e),
    };

    match action {
        ConfigAction::Init => match Config::default().save_to(&config_path) {
            Ok(()) => {
                if json_output {
                    println!(
                        r#"{{"status": "success", "message": "Configuration initialized successfully"}}"#
                    );
                } else {
                    println!("Configuration initialized at: {}", config_path.display());
                }
            }
            Err(e) => fail(json_output, "Failed to initialize config", &e),
        },
        ConfigAction::Show => match load_config(custom_path) {
            Ok(config) => {
                if json_output {
                    match serde_json::to_string_pretty(&config) {
                        Ok(json) => println!("{}", json),
                        Err(e) => fail(json_output, "Failed to serialize config to JSON", &e.into()),
                    }
                } else {
                    match toml::to_string_pretty(&config) {
                        Ok(toml_str) => {
                            println!("Configuration ({})", config_path.display());
                            println!("{}", toml_str);
                        }
                        Err(e) => fail(json_output, "Failed to serialize config", &e.into()),
                    }
                }
            }
            Err(e) => fail(json_output, "Failed to load config", &e),
        },
        ConfigAction::Set { key, value } => {
            let mut config = match load_config(custom_path) {
                Ok(config) => config,
                Err(e) => fail(json_output, "Failed to load config", &e),
            };
            if let Err(e) = config.set_value(&key, &value) {
                fail(json_output, "Invalid configuration", &e);
            }
            if let Err(e) = config.save_to(&config_path) {
                fail(json_output, "Failed to save config", &e);
            }

            tracing::info!(key = %key, value = %value, "Configuration updated");
            if json_output {
                println!(
                    "{}",
                    serde_json::json!({
                        "status": "success",
                        "message": format!("Configuration updated: {} = {}", key, value)
                    })
                );
            } else {
                println!("Configuration updated: {} = {}", key, value);
            }
        }
    }
}
