//! Configuration settings structures for deskbot
//!
//! All structures can be loaded from TOML files and environment variables;
//! every field carries a serde default so partial files are fine.

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "deskbot".to_string()
}

fn default_db_path() -> String {
    "deskbot.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> u64 {
    25
}

fn default_erp_timeout() -> u64 {
    10
}

fn default_daily_reset_cron() -> String {
    // Every day at midnight
    "0 0 0 * * *".to_string()
}

fn default_monthly_reset_cron() -> String {
    // First day of each month at midnight
    "0 0 0 1 * *".to_string()
}

fn default_leaderboard_cron() -> String {
    "0 0 0 * * *".to_string()
}

fn default_checkpoint_poll_cron() -> String {
    // Every minute
    "0 * * * * *".to_string()
}

fn default_digest_hour_start() -> u32 {
    14
}

fn default_digest_hour_end() -> u32 {
    17
}

fn default_assignees() -> Vec<String> {
    ["Pavel", "Dmitry", "Nikita", "Alexey"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Sections
// ============================================================================

/// Application basic information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default = "default_app_name")]
    pub name: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
        }
    }
}

/// Sqlite database configuration. One local file; the schema is created
/// lazily on first use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the database file
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Sqlite busy timeout in seconds
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
            busy_timeout: default_busy_timeout(),
        }
    }
}

/// Logger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether console output is enabled
    #[serde(default = "default_true")]
    pub console: bool,

    /// Emit JSON instead of human-readable lines
    #[serde(default)]
    pub json: bool,

    /// Optional log file path; no file sink when unset
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: default_true(),
            json: false,
            file: None,
        }
    }
}

/// Telegram transport configuration. The bot token comes from
/// `DESKBOT_TELEGRAM__TOKEN`, never from a committed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API base URL (overridable for tests)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Bot token
    #[serde(default)]
    pub token: String,

    /// Long-poll timeout in seconds
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout: u64,

    /// Chat that receives developer alerts and daily reports
    #[serde(default)]
    pub dev_chat_id: i64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            token: String::new(),
            poll_timeout: default_poll_timeout(),
            dev_chat_id: 0,
        }
    }
}

/// ERP / access-log integration configuration. Credentials come from
/// `DESKBOT_ERP__USERNAME` / `DESKBOT_ERP__PASSWORD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErpConfig {
    /// Endpoint polled for access-log checkpoints
    #[serde(default)]
    pub poll_url: String,

    /// Endpoint receiving submitted events
    #[serde(default)]
    pub submit_url: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Request timeout in seconds
    #[serde(default = "default_erp_timeout")]
    pub timeout: u64,

    /// Door names whose checkpoints trigger watcher notifications
    #[serde(default)]
    pub watched_doors: Vec<String>,

    /// Chat ids notified on a watched-door checkpoint change
    #[serde(default)]
    pub watcher_chat_ids: Vec<i64>,
}

// A derived default would zero the timeout when the whole section is
// absent; the field default must hold either way.
impl Default for ErpConfig {
    fn default() -> Self {
        Self {
            poll_url: String::new(),
            submit_url: String::new(),
            username: String::new(),
            password: String::new(),
            timeout: default_erp_timeout(),
            watched_doors: Vec::new(),
            watcher_chat_ids: Vec::new(),
        }
    }
}

/// Scheduled jobs configuration. All cadence is configuration, not policy:
/// cron expressions use the six-field form with seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Whether the scheduler runs at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Zeroes the `today` counters
    #[serde(default = "default_daily_reset_cron")]
    pub daily_reset_cron: String,

    /// Zeroes the `month` counters
    #[serde(default = "default_monthly_reset_cron")]
    pub monthly_reset_cron: String,

    /// Sends the function leaderboard to the dev chat
    #[serde(default = "default_leaderboard_cron")]
    pub leaderboard_cron: String,

    /// Polls the ERP access-log feed
    #[serde(default = "default_checkpoint_poll_cron")]
    pub checkpoint_poll_cron: String,

    /// Inclusive hour range inside which the daily duty digest fires at a
    /// randomised minute
    #[serde(default = "default_digest_hour_start")]
    pub digest_hour_start: u32,

    #[serde(default = "default_digest_hour_end")]
    pub digest_hour_end: u32,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            daily_reset_cron: default_daily_reset_cron(),
            monthly_reset_cron: default_monthly_reset_cron(),
            leaderboard_cron: default_leaderboard_cron(),
            checkpoint_poll_cron: default_checkpoint_poll_cron(),
            digest_hour_start: default_digest_hour_start(),
            digest_hour_end: default_digest_hour_end(),
        }
    }
}

/// Duty scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyConfig {
    /// Fixed set of assignee names offered in the duty-entry flow
    #[serde(default = "default_assignees")]
    pub assignees: Vec<String>,
}

impl Default for DutyConfig {
    fn default() -> Self {
        Self {
            assignees: default_assignees(),
        }
    }
}

// ============================================================================
// Main Settings Structure
// ============================================================================

/// Complete application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logger: LoggerSettings,

    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub erp: ErpConfig,

    #[serde(default)]
    pub jobs: JobsConfig,

    #[serde(default)]
    pub duty: DutyConfig,
}

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Settings {
    /// Validates the loaded settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.is_empty() {
            return Err(ConfigError::validation(
                "database.path",
                "Database path cannot be empty",
            ));
        }

        if !VALID_LOG_LEVELS.contains(&self.logger.level.to_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logger.level",
                format!(
                    "Invalid log level '{}'. Valid levels are: trace, debug, info, warn, error",
                    self.logger.level
                ),
            ));
        }

        if self.telegram.poll_timeout == 0 {
            return Err(ConfigError::validation(
                "telegram.poll_timeout",
                "Poll timeout must be greater than 0 seconds",
            ));
        }

        if self.duty.assignees.is_empty() {
            return Err(ConfigError::validation(
                "duty.assignees",
                "At least one duty assignee must be configured",
            ));
        }

        if self.jobs.digest_hour_start > self.jobs.digest_hour_end
            || self.jobs.digest_hour_end > 23
        {
            return Err(ConfigError::validation(
                "jobs.digest_hour_start",
                "Digest hour range must satisfy start <= end <= 23",
            ));
        }

        Ok(())
    }
}
