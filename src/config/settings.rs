use serde::{Deserialize, Serialize};
use anyhow::{Result, Context};
use std::path::{Path, PathBuf};
use std::fs;

use crate::alerts::thresholds::Thresholds;
use crate::config::ConfigError;
use crate::models::metric::MetricKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub thresholds: Thresholds,
    pub queries: QueryConfig,
    pub smtp: SmtpConfig,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    pub database_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    pub cpu_utilization: String,
    pub memory_usage: String,
    pub io_wait_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub sender: String,
    pub recipient: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>, // name of the variable holding the password
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub enabled: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            cpu_utilization: "SELECT cpu_usage, COUNT(*) AS num_samples FROM sys_time_machine GROUP BY cpu_usage".to_string(),
            memory_usage: "SELECT sga_alloc, COUNT(*) AS num_samples FROM sgastat GROUP BY sga_alloc".to_string(),
            io_wait_time: "SELECT time_waited, COUNT(*) AS num_samples FROM session_wait GROUP BY time_waited".to_string(),
        }
    }
}

impl QueryConfig {
    pub fn get(&self, metric: MetricKind) -> &str {
        match metric {
            MetricKind::CpuUtilization => &self.cpu_utilization,
            MetricKind::MemoryUsage => &self.memory_usage,
            MetricKind::IoWaitTime => &self.io_wait_time,
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            sender: "sender@example.com".to_string(),
            recipient: "recipient@example.com".to_string(),
            username: None,
            password_env: Some("DBPROBE_SMTP_PASSWORD".to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "database server".to_string(),
                database_path: "~/.local/share/dbprobe/stats.db".to_string(),
            },
            thresholds: Thresholds::default(),
            queries: QueryConfig::default(),
            smtp: SmtpConfig::default(),
            notifications: NotificationConfig { enabled: true },
        }
    }
}

impl ServerConfig {
    /// Database path with a leading `~/` expanded to the home directory.
    pub fn resolved_database_path(&self) -> Result<PathBuf> {
        expand_home(&self.database_path)
    }
}

impl Config {
    /// Loads the default config file, writing one with defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_path()?;

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            tracing::info!(path = %config_path.display(), "Wrote default configuration");
            return Ok(config);
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config.validate()
            .with_context(|| format!("Invalid configuration in: {}", config_path.display()))?;

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let contents = self.to_commented_toml();

        fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds.validate()?;
        if self.server.name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "server.name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Generate TOML configuration with comments explaining all options
    pub fn to_commented_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# dbprobe Configuration File\n");
        output.push_str("#\n");
        output.push_str("# Each run performs one check: it reads the statistics database, averages\n");
        output.push_str("# each metric, and emails an alert for every threshold that is exceeded.\n");
        output.push_str("\n");

        output.push_str("# =============================================================================\n");
        output.push_str("# SERVER SETTINGS\n");
        output.push_str("# =============================================================================\n");
        output.push_str("\n");
        output.push_str("[server]\n");
        output.push_str("# Name of the monitored server, used in alert subjects\n");
        output.push_str(&format!("name = {}\n", quote(&self.server.name)));
        output.push_str("\n");
        output.push_str("# SQLite database holding the sampled server statistics\n");
        output.push_str("# A leading ~/ is expanded to your home directory\n");
        output.push_str(&format!("database_path = {}\n", quote(&self.server.database_path)));
        output.push_str("\n");

        output.push_str("# =============================================================================\n");
        output.push_str("# THRESHOLDS\n");
        output.push_str("# =============================================================================\n");
        output.push_str("\n");
        output.push_str("[thresholds]\n");
        output.push_str("# An alert is sent when an average is strictly greater than its threshold.\n");
        output.push_str("# Thresholds must be non-negative numbers.\n");
        output.push_str("\n");
        output.push_str("# Average CPU utilization, in percent\n");
        output.push_str(&format!("cpu_utilization_threshold = {:?}\n", self.thresholds.cpu_utilization_threshold));
        output.push_str("\n");
        output.push_str("# Average memory usage, in percent\n");
        output.push_str(&format!("memory_usage_threshold = {:?}\n", self.thresholds.memory_usage_threshold));
        output.push_str("\n");
        output.push_str("# Average I/O wait time, in milliseconds\n");
        output.push_str(&format!("io_wait_time_threshold = {:?}\n", self.thresholds.io_wait_time_threshold));
        output.push_str("\n");

        output.push_str("# =============================================================================\n");
        output.push_str("# QUERIES\n");
        output.push_str("# =============================================================================\n");
        output.push_str("\n");
        output.push_str("[queries]\n");
        output.push_str("# Each query must return two columns: a measured value and the number of\n");
        output.push_str("# samples taken at that value. Rows with a NULL value are ignored.\n");
        output.push_str(&format!("cpu_utilization = {}\n", quote(&self.queries.cpu_utilization)));
        output.push_str(&format!("memory_usage = {}\n", quote(&self.queries.memory_usage)));
        output.push_str(&format!("io_wait_time = {}\n", quote(&self.queries.io_wait_time)));
        output.push_str("\n");

        output.push_str("# =============================================================================\n");
        output.push_str("# SMTP SETTINGS\n");
        output.push_str("# =============================================================================\n");
        output.push_str("\n");
        output.push_str("[smtp]\n");
        output.push_str("# Mail server, connected with STARTTLS\n");
        output.push_str(&format!("host = {}\n", quote(&self.smtp.host)));
        output.push_str(&format!("port = {}\n", self.smtp.port));
        output.push_str("\n");
        output.push_str(&format!("sender = {}\n", quote(&self.smtp.sender)));
        output.push_str(&format!("recipient = {}\n", quote(&self.smtp.recipient)));
        output.push_str("\n");
        output.push_str("# Login for the mail server. Leave username unset to send without\n");
        output.push_str("# authentication. The password is never stored here: it is read from\n");
        output.push_str("# the environment variable named by password_env.\n");
        match &self.smtp.username {
            Some(username) => output.push_str(&format!("username = {}\n", quote(username))),
            None => output.push_str("# username = \"alerts@example.com\"\n"),
        }
        match &self.smtp.password_env {
            Some(var) => output.push_str(&format!("password_env = {}\n", quote(var))),
            None => output.push_str("# password_env = \"DBPROBE_SMTP_PASSWORD\"\n"),
        }
        output.push_str("\n");

        output.push_str("# =============================================================================\n");
        output.push_str("# NOTIFICATIONS\n");
        output.push_str("# =============================================================================\n");
        output.push_str("\n");
        output.push_str("[notifications]\n");
        output.push_str("# true  - Email every alert (default)\n");
        output.push_str("# false - Only write alerts to the log\n");
        output.push_str(&format!("enabled = {}\n", self.notifications.enabled));
        output.push_str("\n");

        output.push_str("# =============================================================================\n");
        output.push_str("# USAGE NOTES\n");
        output.push_str("# =============================================================================\n");
        output.push_str("#\n");
        output.push_str("#   --config /path/file    Use a different config file\n");
        output.push_str("#   --dry-run              Log alerts instead of sending them\n");
        output.push_str("#\n");
        output.push_str("# To reset to defaults: dbprobe config init\n");
        output.push_str("# To modify values:     dbprobe config set thresholds.cpu_utilization_threshold 85\n");
        output.push_str("# To view current:      dbprobe config show\n");

        output
    }

    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Failed to determine home directory")?;
        Ok(home.join(".config").join("dbprobe").join("config.toml"))
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "server.name" => {
                if value.trim().is_empty() {
                    anyhow::bail!("server.name must not be empty");
                }
                self.server.name = value.to_string();
            }
            "server.database_path" => self.server.database_path = value.to_string(),
            "thresholds.cpu_utilization_threshold" => {
                self.thresholds.set(MetricKind::CpuUtilization, parse_threshold(key, value)?)?;
            }
            "thresholds.memory_usage_threshold" => {
                self.thresholds.set(MetricKind::MemoryUsage, parse_threshold(key, value)?)?;
            }
            "thresholds.io_wait_time_threshold" => {
                self.thresholds.set(MetricKind::IoWaitTime, parse_threshold(key, value)?)?;
            }
            "queries.cpu_utilization" => self.queries.cpu_utilization = value.to_string(),
            "queries.memory_usage" => self.queries.memory_usage = value.to_string(),
            "queries.io_wait_time" => self.queries.io_wait_time = value.to_string(),
            "smtp.host" => self.smtp.host = value.to_string(),
            "smtp.port" => {
                self.smtp.port = value.parse()
                    .with_context(|| format!("Invalid port value: {}", value))?;
            }
            "smtp.sender" | "smtp.recipient" => {
                value.parse::<lettre::Address>()
                    .with_context(|| format!("Invalid email address: {}", value))?;
                if key == "smtp.sender" {
                    self.smtp.sender = value.to_string();
                } else {
                    self.smtp.recipient = value.to_string();
                }
            }
            "smtp.username" => self.smtp.username = non_empty(value),
            "smtp.password_env" => self.smtp.password_env = non_empty(value),
            "notifications.enabled" => {
                self.notifications.enabled = value.parse()
                    .with_context(|| format!("Invalid boolean value: {}", value))?;
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string()).into()),
        }
        Ok(())
    }
}

fn parse_threshold(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|_| ConfigError::InvalidThreshold {
        name: key.trim_start_matches("thresholds.").to_string(),
        value: value.to_string(),
    })
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn quote(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}

fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir()
                .context("Failed to determine home directory")?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}
