//! Process configuration read from the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `LOG_MODE` | `local` |
//! | `SRV_HOST` | `0.0.0.0` |
//! | `SRV_PORT` | `8080` |
//! | `REQUEST_TIMEOUT_SECS` | `30` |
//! | `HEALTH_CHECK_INTERVAL_SECS` | `5` |
//! | `SHUTDOWN_TIMEOUT_SECS` | `30` |
//!
//! Storage is configured separately, see [`crate::db::RepositoryFactory`].

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Output format and verbosity of the process log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    /// Human-readable text at debug level.
    #[default]
    Local,
    /// JSON at debug level.
    Dev,
    /// JSON at info level.
    Prod,
}

impl FromStr for LogMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "dev" => Ok(Self::Dev),
            "prod" => Ok(Self::Prod),
            _ => Err(format!("Unknown log mode: {}", s)),
        }
    }
}

impl LogMode {
    /// Default level filter when `RUST_LOG` is unset.
    pub fn default_filter(&self) -> &'static str {
        match self {
            Self::Local | Self::Dev => "debug",
            Self::Prod => "info",
        }
    }

    pub fn is_json(&self) -> bool {
        !matches!(self, Self::Local)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub log_mode: LogMode,
    pub host: String,
    pub port: u16,
    pub request_timeout: Duration,
    pub health_check_interval: Duration,
    pub shutdown_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_mode: LogMode::Local,
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout: Duration::from_secs(30),
            health_check_interval: Duration::from_secs(5),
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

fn parse_var<T: FromStr>(key: &str) -> Result<Option<T>, String>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid value for {}: {}", key, e)),
        Err(_) => Ok(None),
    }
}

fn secs_var(key: &str, default: Duration) -> Result<Duration, String> {
    match parse_var::<u64>(key)? {
        Some(0) => Err(format!("{} must be greater than zero", key)),
        Some(secs) => Ok(Duration::from_secs(secs)),
        None => Ok(default),
    }
}

impl AppConfig {
    /// Read configuration from the environment. Unset variables take their
    /// defaults; set but malformed ones are an error.
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();
        Ok(Self {
            log_mode: parse_var("LOG_MODE")?.unwrap_or(defaults.log_mode),
            host: std::env::var("SRV_HOST").unwrap_or(defaults.host),
            port: parse_var("SRV_PORT")?.unwrap_or(defaults.port),
            request_timeout: secs_var("REQUEST_TIMEOUT_SECS", defaults.request_timeout)?,
            health_check_interval: secs_var(
                "HEALTH_CHECK_INTERVAL_SECS",
                defaults.health_check_interval,
            )?,
            shutdown_timeout: secs_var("SHUTDOWN_TIMEOUT_SECS", defaults.shutdown_timeout)?,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| format!("Invalid listen address {}:{}: {}", self.host, self.port, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_mode_from_str() {
        assert_eq!("local".parse::<LogMode>().unwrap(), LogMode::Local);
        assert_eq!("PROD".parse::<LogMode>().unwrap(), LogMode::Prod);
        assert!("verbose".parse::<LogMode>().is_err());
        assert!(!LogMode::Local.is_json());
        assert_eq!(LogMode::Prod.default_filter(), "info");
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 9000,
            ..Default::default()
        };
        assert_eq!(config.socket_addr().unwrap().port(), 9000);

        let config = AppConfig {
            host: "not a host".to_string(),
            ..Default::default()
        };
        assert!(config.socket_addr().is_err());
    }
}
