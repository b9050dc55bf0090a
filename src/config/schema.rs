//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::log::Format;

/// Root configuration for a service built on this crate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Logger construction.
    pub log: LogConfig,

    /// Admin HTTP server.
    pub admin: AdminConfig,

    /// Database connection.
    pub database: DatabaseConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// Line encoding (logfmt, json, nop).
    pub format: Format,

    /// Output stream.
    pub output: LogOutput,

    /// Number of `caller_N` fields recorded per line. `0` turns caller
    /// fields off entirely, so lines no longer carry `caller_0`.
    pub caller_depth: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: Format::Logfmt,
            output: LogOutput::Stdout,
            caller_depth: 1,
        }
    }
}

/// Stream a logger built from config writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
}

/// Admin server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Bind address, `host:port` or `:port` for all interfaces.
    pub bind_address: String,

    /// Served from `/version` when set.
    pub version: Option<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            bind_address: ":9090".to_string(),
            version: None,
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Schema to connect to.
    pub database_name: String,

    /// MySQL connection settings; no database is used when absent.
    pub mysql: Option<MySqlConfig>,
}

/// MySQL connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MySqlConfig {
    /// Server address, `host:port`.
    pub address: String,

    pub user: String,

    pub password: String,

    /// Pool size (default: `MYSQL_MAX_CONNECTIONS` or 16).
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connect/acquire timeout in seconds (default: `MYSQL_TIMEOUT` or 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for MySqlConfig {
    fn default() -> Self {
        Self {
            address: "localhost:3306".to_string(),
            user: String::new(),
            password: String::new(),
            max_connections: default_max_connections(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

pub(crate) fn default_max_connections() -> u32 {
    parse_max_connections(std::env::var("MYSQL_MAX_CONNECTIONS").ok().as_deref())
}

pub(crate) fn default_timeout_secs() -> u64 {
    parse_timeout_secs(std::env::var("MYSQL_TIMEOUT").ok().as_deref())
}

/// Positive integers are accepted; anything else falls back to 16.
pub(crate) fn parse_max_connections(raw: Option<&str>) -> u32 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(16)
}

/// Accepts bare seconds or a duration such as `45s`, `2m` or `1m30s`;
/// anything else falls back to 30.
pub(crate) fn parse_timeout_secs(raw: Option<&str>) -> u64 {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return 30;
    };
    match parse_duration_secs(raw) {
        Some(secs) if secs > 0 => secs,
        _ => {
            tracing::warn!(value = raw, "MYSQL_TIMEOUT is not a valid duration, using 30s");
            30
        }
    }
}

fn parse_duration_secs(raw: &str) -> Option<u64> {
    if let Ok(secs) = raw.parse::<u64>() {
        return Some(secs);
    }

    let mut total: u64 = 0;
    let mut rest = raw;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit())?;
        if digits == 0 {
            return None;
        }
        let value: u64 = rest[..digits].parse().ok()?;
        let unit = match rest.as_bytes()[digits] {
            b'h' => 3600,
            b'm' => 60,
            b's' => 1,
            _ => return None,
        };
        total = total.checked_add(value.checked_mul(unit)?)?;
        rest = &rest[digits + 1..];
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_connections_parsing() {
        assert_eq!(parse_max_connections(None), 16);
        assert_eq!(parse_max_connections(Some("32")), 32);
        assert_eq!(parse_max_connections(Some("0")), 16);
        assert_eq!(parse_max_connections(Some("-4")), 16);
        assert_eq!(parse_max_connections(Some("lots")), 16);
    }

    #[test]
    fn test_timeout_parsing() {
        assert_eq!(parse_timeout_secs(None), 30);
        assert_eq!(parse_timeout_secs(Some("45s")), 45);
        assert_eq!(parse_timeout_secs(Some("10")), 10);
        assert_eq!(parse_timeout_secs(Some("1m")), 60);
        assert_eq!(parse_timeout_secs(Some("1m30s")), 90);
        assert_eq!(parse_timeout_secs(Some("1h")), 3600);
        assert_eq!(parse_timeout_secs(Some("0s")), 30);
        assert_eq!(parse_timeout_secs(Some("500ms")), 30);
        assert_eq!(parse_timeout_secs(Some("soon")), 30);
    }

    #[test]
    fn test_sections_default_when_missing() {
        let config: ServiceConfig = toml::from_str("[log]\nformat = \"json\"\n").unwrap();
        assert_eq!(config.log.format, Format::Json);
        assert_eq!(config.log.caller_depth, 1);
        assert_eq!(config.admin.bind_address, ":9090");
        assert!(config.database.mysql.is_none());
    }
}
