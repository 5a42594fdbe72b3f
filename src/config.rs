use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::database::RetryPolicy;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Storage retry discipline applied around every storage call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_retry_attempts")]
    pub attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_retry_attempts(),
            delay_ms: default_retry_delay_ms(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.attempts, Duration::from_millis(self.delay_ms))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_scheduler_enabled")]
    pub enabled: bool,
    #[serde(default = "default_overdue_sweep_interval_secs")]
    pub overdue_sweep_interval_secs: u64,
    #[serde(default = "default_generation_interval_secs")]
    pub generation_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_scheduler_enabled(),
            overdue_sweep_interval_secs: default_overdue_sweep_interval_secs(),
            generation_interval_secs: default_generation_interval_secs(),
        }
    }
}

fn default_retry_attempts() -> u32 {
    5
}

fn default_retry_delay_ms() -> u64 {
    100
}

fn default_scheduler_enabled() -> bool {
    true
}

fn default_overdue_sweep_interval_secs() -> u64 {
    3600
}

fn default_generation_interval_secs() -> u64 {
    6 * 3600
}

impl Config {
    pub fn from_toml() -> AppResult<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // Without a config file everything comes from the environment.
        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::parse(&config_str)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let database_url = env::var("DATABASE_URL").map_err(|_| {
                    AppError::ConfigError(format!(
                        "DATABASE_URL is not set and {config_path} was not found"
                    ))
                })?;

                Config {
                    server: ServerConfig {
                        host: "0.0.0.0".to_string(),
                        port: 8080,
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: 10,
                    },
                    retry: RetryConfig::default(),
                    scheduler: SchedulerConfig::default(),
                }
            }
            Err(e) => {
                return Err(AppError::ConfigError(format!(
                    "Unable to read config file {config_path}: {e}"
                )));
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn parse(config_str: &str) -> AppResult<Self> {
        toml::from_str(config_str)
            .map_err(|e| AppError::ConfigError(format!("Failed to parse config file: {e}")))
    }

    /// Environment variables win over file values.
    pub fn apply_env_overrides(&mut self) {
        fn parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
            env::var(name).ok().and_then(|v| v.parse::<T>().ok())
        }

        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Some(p) = parsed("SERVER_PORT") {
            self.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(mc) = parsed("DB_MAX_CONNECTIONS") {
            self.database.max_connections = mc;
        }
        if let Some(n) = parsed("STORAGE_RETRY_ATTEMPTS") {
            self.retry.attempts = n;
        }
        if let Some(ms) = parsed("STORAGE_RETRY_DELAY_MS") {
            self.retry.delay_ms = ms;
        }
        if let Some(enabled) = parsed("SCHEDULER_ENABLED") {
            self.scheduler.enabled = enabled;
        }
        if let Some(secs) = parsed("OVERDUE_SWEEP_INTERVAL_SECS") {
            self.scheduler.overdue_sweep_interval_secs = secs;
        }
        if let Some(secs) = parsed("GENERATION_INTERVAL_SECS") {
            self.scheduler.generation_interval_secs = secs;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let config = Config::parse(
            r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [database]
            url = "sqlite::memory:"
            max_connections = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.retry.attempts, 5);
        assert_eq!(config.retry.delay_ms, 100);
        assert!(config.scheduler.enabled);
        assert_eq!(config.scheduler.overdue_sweep_interval_secs, 3600);
    }

    #[test]
    fn test_parse_retry_section() {
        let config = Config::parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [database]
            url = "postgres://localhost/clube"
            max_connections = 5

            [retry]
            attempts = 3
            delay_ms = 250

            [scheduler]
            enabled = false
            "#,
        )
        .unwrap();

        let policy = config.retry.policy();
        assert_eq!(policy.attempts, 3);
        assert_eq!(policy.delay, Duration::from_millis(250));
        assert!(!config.scheduler.enabled);
        assert_eq!(config.scheduler.generation_interval_secs, 21600);
    }

    #[test]
    fn test_parse_rejects_missing_database() {
        let result = Config::parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            "#,
        );
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_config_error_converts_into_anyhow() {
        fn load(config_str: &str) -> anyhow::Result<Config> {
            Ok(Config::parse(config_str)?)
        }
        let err = load("not = [valid").unwrap_err();
        assert!(err.to_string().starts_with("Config error: Failed to parse config file"));
    }
}
