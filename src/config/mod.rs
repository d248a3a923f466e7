use crate::core::{AppError, Result};
use chrono::NaiveTime;
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jobs: JobsConfig,
    pub mail: MailConfig,
    pub insight: InsightConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
}

/// Batch job timing and limits
#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    pub scheduler_enabled: bool,
    /// Daily UTC time of the report cycle
    pub report_run_at: NaiveTime,
    /// Daily UTC time of the recurring-transaction cycle
    pub recurring_run_at: NaiveTime,
    pub commit_timeout_ms: u64,
    pub cursor_batch_size: u32,
}

impl JobsConfig {
    pub fn commit_timeout(&self) -> Duration {
        Duration::from_millis(self.commit_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_address: String,
    /// Prefix used when rendering amounts
    pub currency_symbol: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsightConfig {
    /// Insights and receipt scanning are disabled without a key
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_ms: u64,
}

impl InsightConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Read an optional variable, falling back to `default`
pub(crate) fn env_or<T: FromStr>(key: &str, default: &str) -> Result<T> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| AppError::Configuration(format!("Invalid {}", key)))
}

fn env_time(key: &str, default: &str) -> Result<NaiveTime> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    NaiveTime::parse_from_str(&raw, "%H:%M")
        .map_err(|_| AppError::Configuration(format!("Invalid {} (expected HH:MM)", key)))
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            jobs: JobsConfig {
                scheduler_enabled: env_or("SCHEDULER_ENABLED", "true")?,
                report_run_at: env_time("REPORT_JOB_RUN_AT", "02:30")?,
                recurring_run_at: env_time("RECURRING_JOB_RUN_AT", "00:05")?,
                commit_timeout_ms: env_or("JOB_COMMIT_TIMEOUT_MS", "10000")?,
                cursor_batch_size: env_or("JOB_CURSOR_BATCH_SIZE", "100")?,
            },
            mail: MailConfig {
                smtp_host: env::var("SMTP_HOST")
                    .map_err(|_| AppError::Configuration("SMTP_HOST not set".to_string()))?,
                smtp_port: env_or("SMTP_PORT", "587")?,
                smtp_username: env::var("SMTP_USERNAME").unwrap_or_default(),
                smtp_password: env::var("SMTP_PASSWORD").unwrap_or_default(),
                from_address: env::var("MAIL_FROM")
                    .map_err(|_| AppError::Configuration("MAIL_FROM not set".to_string()))?,
                currency_symbol: env::var("CURRENCY_SYMBOL").unwrap_or_else(|_| "$".to_string()),
            },
            insight: InsightConfig {
                api_key: env::var("GEMINI_API_KEY").ok().filter(|k| !k.trim().is_empty()),
                model: env::var("GEMINI_MODEL")
                    .unwrap_or_else(|_| "gemini-2.0-flash".to_string()),
                base_url: env::var("GEMINI_BASE_URL").unwrap_or_else(|_| {
                    crate::modules::insights::services::DEFAULT_GEMINI_BASE_URL.to_string()
                }),
                timeout_ms: env_or("GEMINI_TIMEOUT_MS", "8000")?,
            },
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.jobs.cursor_batch_size == 0 {
            return Err(AppError::Configuration(
                "Job cursor batch size must be greater than 0".to_string(),
            ));
        }

        if self.jobs.commit_timeout_ms == 0 {
            return Err(AppError::Configuration(
                "Job commit timeout must be greater than 0".to_string(),
            ));
        }

        if self.insight.timeout_ms == 0 {
            return Err(AppError::Configuration(
                "Insight timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
