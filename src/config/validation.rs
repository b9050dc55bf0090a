//! Configuration validation.
//!
//! Serde handles syntax; this pass checks values. All problems are
//! reported together rather than stopping at the first one.

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::ServiceConfig;
use crate::log::caller::MAX_DEPTH;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Expands `:port` to `0.0.0.0:port` and parses the result.
pub fn parse_bind_address(addr: &str) -> Result<SocketAddr, std::net::AddrParseError> {
    if addr.starts_with(':') {
        format!("0.0.0.0{addr}").parse()
    } else {
        addr.parse()
    }
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = parse_bind_address(&config.admin.bind_address) {
        errors.push(ValidationError {
            field: "admin.bind_address",
            message: format!("{:?} is not a socket address ({e})", config.admin.bind_address),
        });
    }

    if config.log.caller_depth > MAX_DEPTH {
        errors.push(ValidationError {
            field: "log.caller_depth",
            message: format!("must be at most {MAX_DEPTH}"),
        });
    }

    if let Some(mysql) = &config.database.mysql {
        if mysql.address.trim().is_empty() {
            errors.push(ValidationError {
                field: "database.mysql.address",
                message: "must not be empty".to_string(),
            });
        }
        if mysql.max_connections == 0 {
            errors.push(ValidationError {
                field: "database.mysql.max_connections",
                message: "must be greater than zero".to_string(),
            });
        }
        if config.database.database_name.trim().is_empty() {
            errors.push(ValidationError {
                field: "database.database_name",
                message: "required when mysql is configured".to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
