//! Configuration system for the reminder service.
//!
//! Configuration is loaded from multiple sources with the following precedence:
//! 1. Environment variables (highest priority)
//! 2. `config.toml` file
//! 3. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `REMINDERS_SERVER_HOST` - Server bind address
//! - `REMINDERS_SERVER_PORT` - Server port
//! - `REMINDERS_DATABASE_TYPE` - `sqlite` or `postgres`
//! - `REMINDERS_DATABASE_URL` - Database connection URL
//! - `REMINDERS_LOG_LEVEL` - Log level (trace, debug, info, warn, error)
//! - `REMINDERS_LOOKAHEAD_DAYS` - Days ahead of expiry to start reminding
//! - `REMINDERS_BASE_URL` - Public app URL used in email links
//! - `REMINDERS_LOCALE` - Reminder language (`en`, `fr`)
//! - `REMINDERS_EMAIL_ENABLED` - Send reminder emails
//! - `REMINDERS_EMAIL_API_URL` - Email HTTP API endpoint
//! - `REMINDERS_EMAIL_API_KEY` - Email API key
//! - `REMINDERS_EMAIL_FROM` - Sender address
//! - `REMINDERS_JOBS_ENABLED` - Run the in-process cron trigger
//! - `REMINDERS_JOBS_CRON` - Cron expression for the reminder job

use config::Config;
use serde::Deserialize;
use std::env;
use std::sync::OnceLock;

use crate::errors::{ReminderError, ReminderResult};
use crate::notification::Locale;
use crate::validation::{validate_base_url, validate_email, validate_not_empty, validate_range};

/// Global configuration singleton.
static CONFIG: OnceLock<ReminderConfig> = OnceLock::new();

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub reminders: ReminderSettings,
    pub email: EmailConfig,
    pub jobs: JobsConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database type: "sqlite" or "postgres"
    pub db_type: String,
    pub sqlite_url: String,
    pub postgres_url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: "sqlite".to_string(),
            sqlite_url: "sqlite://reminders.db".to_string(),
            postgres_url: "postgres://localhost/marketplace".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    /// Log level: trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
        }
    }
}

/// Behaviour of the reminder job.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReminderSettings {
    /// How far ahead of expiry reminders start (default: 3 days)
    pub lookahead_days: u32,
    /// Public app URL, prefixed to dashboard links in emails
    pub base_url: String,
    pub locale: Locale,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            lookahead_days: 3,
            base_url: "http://localhost:5173".to_string(),
            locale: Locale::En,
        }
    }
}

impl ReminderSettings {
    pub fn lookahead(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.lookahead_days))
    }
}

/// Email provider configuration. Disabled unless explicitly enabled.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub enabled: bool,
    pub api_url: String,
    pub api_key: String,
    pub from_address: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: "https://api.resend.com/emails".to_string(),
            api_key: String::new(),
            from_address: String::new(),
        }
    }
}

/// In-process scheduling of the reminder job.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    pub enabled: bool,
    /// Cron expression (with seconds) for the reminder job
    pub reminder_cron: String,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // Daily at 08:00 UTC
            reminder_cron: "0 0 8 * * *".to_string(),
        }
    }
}

fn config_err(e: config::ConfigError) -> ReminderError {
    ReminderError::ConfigError(e.to_string())
}

impl ReminderConfig {
    /// Load configuration from file and environment, without caching.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. `config.toml` file (optional)
    /// 3. Environment variables
    pub fn load() -> ReminderResult<Self> {
        let defaults = ReminderConfig::default();

        let builder = Config::builder()
            .set_default("server.host", defaults.server.host)
            .map_err(config_err)?
            .set_default("server.port", i64::from(defaults.server.port))
            .map_err(config_err)?
            .set_default("database.db_type", defaults.database.db_type)
            .map_err(config_err)?
            .set_default("database.sqlite_url", defaults.database.sqlite_url)
            .map_err(config_err)?
            .set_default("database.postgres_url", defaults.database.postgres_url)
            .map_err(config_err)?
            .set_default("logging.enabled", defaults.logging.enabled)
            .map_err(config_err)?
            .set_default("logging.level", defaults.logging.level)
            .map_err(config_err)?
            .set_default(
                "reminders.lookahead_days",
                i64::from(defaults.reminders.lookahead_days),
            )
            .map_err(config_err)?
            .set_default("reminders.base_url", defaults.reminders.base_url)
            .map_err(config_err)?
            .set_default("reminders.locale", defaults.reminders.locale.to_string())
            .map_err(config_err)?
            .set_default("email.enabled", defaults.email.enabled)
            .map_err(config_err)?
            .set_default("email.api_url", defaults.email.api_url)
            .map_err(config_err)?
            .set_default("email.api_key", defaults.email.api_key)
            .map_err(config_err)?
            .set_default("email.from_address", defaults.email.from_address)
            .map_err(config_err)?
            .set_default("jobs.enabled", defaults.jobs.enabled)
            .map_err(config_err)?
            .set_default("jobs.reminder_cron", defaults.jobs.reminder_cron)
            .map_err(config_err)?
            // Load from config.toml (optional)
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables
            .set_override_option("server.host", env::var("REMINDERS_SERVER_HOST").ok())
            .map_err(config_err)?
            .set_override_option(
                "server.port",
                env::var("REMINDERS_SERVER_PORT")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok()),
            )
            .map_err(config_err)?
            .set_override_option("database.db_type", env::var("REMINDERS_DATABASE_TYPE").ok())
            .map_err(config_err)?
            .set_override_option(
                "database.sqlite_url",
                env::var("REMINDERS_DATABASE_URL")
                    .ok()
                    .filter(|url| url.starts_with("sqlite")),
            )
            .map_err(config_err)?
            .set_override_option(
                "database.postgres_url",
                env::var("REMINDERS_DATABASE_URL")
                    .ok()
                    .filter(|url| url.starts_with("postgres")),
            )
            .map_err(config_err)?
            .set_override_option(
                "logging.enabled",
                env::var("REMINDERS_LOGGING_ENABLED")
                    .ok()
                    .and_then(|v| v.parse::<bool>().ok()),
            )
            .map_err(config_err)?
            .set_override_option("logging.level", env::var("REMINDERS_LOG_LEVEL").ok())
            .map_err(config_err)?
            .set_override_option(
                "reminders.lookahead_days",
                env::var("REMINDERS_LOOKAHEAD_DAYS")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok()),
            )
            .map_err(config_err)?
            .set_override_option("reminders.base_url", env::var("REMINDERS_BASE_URL").ok())
            .map_err(config_err)?
            .set_override_option(
                "reminders.locale",
                env::var("REMINDERS_LOCALE").ok().map(|v| v.to_lowercase()),
            )
            .map_err(config_err)?
            .set_override_option(
                "email.enabled",
                env::var("REMINDERS_EMAIL_ENABLED")
                    .ok()
                    .and_then(|v| v.parse::<bool>().ok()),
            )
            .map_err(config_err)?
            .set_override_option("email.api_url", env::var("REMINDERS_EMAIL_API_URL").ok())
            .map_err(config_err)?
            .set_override_option("email.api_key", env::var("REMINDERS_EMAIL_API_KEY").ok())
            .map_err(config_err)?
            .set_override_option("email.from_address", env::var("REMINDERS_EMAIL_FROM").ok())
            .map_err(config_err)?
            .set_override_option(
                "jobs.enabled",
                env::var("REMINDERS_JOBS_ENABLED")
                    .ok()
                    .and_then(|v| v.parse::<bool>().ok()),
            )
            .map_err(config_err)?
            .set_override_option("jobs.reminder_cron", env::var("REMINDERS_JOBS_CRON").ok())
            .map_err(config_err)?;

        let settings = builder
            .build()
            .map_err(|e| ReminderError::ConfigError(format!("failed to build config: {e}")))?;

        settings
            .try_deserialize()
            .map_err(|e| ReminderError::ConfigError(format!("failed to deserialize config: {e}")))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ReminderResult<()> {
        let to_config_err = |e: crate::validation::ValidationError| {
            ReminderError::ConfigError(e.to_string())
        };

        if self.server.port == 0 {
            return Err(ReminderError::ConfigError(
                "server.port must be greater than 0".to_string(),
            ));
        }

        match self.database.db_type.as_str() {
            "sqlite" | "postgres" => {}
            other => {
                return Err(ReminderError::ConfigError(format!(
                    "database.db_type must be 'sqlite' or 'postgres', got '{other}'"
                )));
            }
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ReminderError::ConfigError(format!(
                    "logging.level must be one of: trace, debug, info, warn, error. Got '{other}'"
                )));
            }
        }

        validate_range(self.reminders.lookahead_days, 1, 30, "reminders.lookahead_days")
            .map_err(to_config_err)?;
        validate_base_url(&self.reminders.base_url, "reminders.base_url")
            .map_err(to_config_err)?;

        if self.email.enabled {
            validate_not_empty(&self.email.api_key, "email.api_key").map_err(to_config_err)?;
            validate_email(&self.email.from_address, "email.from_address")
                .map_err(to_config_err)?;
            validate_not_empty(&self.email.api_url, "email.api_url").map_err(to_config_err)?;
        }

        validate_not_empty(&self.jobs.reminder_cron, "jobs.reminder_cron")
            .map_err(to_config_err)?;

        Ok(())
    }
}

/// Get the global configuration.
///
/// This loads the configuration on first access and caches it.
/// Returns an error if configuration loading or validation fails.
pub fn get_config() -> ReminderResult<&'static ReminderConfig> {
    if let Some(config) = CONFIG.get() {
        return Ok(config);
    }

    let config = ReminderConfig::load()?;
    config.validate()?;

    // Another thread may have won the race; either value is valid
    Ok(CONFIG.get_or_init(|| config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ReminderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.reminders.lookahead_days, 3);
        assert_eq!(config.reminders.lookahead(), chrono::Duration::days(3));
        assert!(!config.email.enabled);
    }

    #[test]
    fn enabled_email_requires_credentials() {
        let mut config = ReminderConfig::default();
        config.email.enabled = true;
        assert!(config.validate().is_err());

        config.email.api_key = "re_test".to_string();
        config.email.from_address = "reminders@example.com".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn lookahead_must_be_in_range() {
        let mut config = ReminderConfig::default();
        config.reminders.lookahead_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_db_type_rejected() {
        let mut config = ReminderConfig::default();
        config.database.db_type = "mysql".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("database.db_type"));
    }
}
