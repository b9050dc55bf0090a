//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::Format;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[log]
format = "json"
caller_depth = 2

[admin]
bind_address = "127.0.0.1:0"
version = "v0.1.0"

[database]
database_name = "test"

[database.mysql]
address = "localhost:3306"
user = "moov"
password = "secret"
max_connections = 4
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.log.format, Format::Json);
        assert_eq!(config.log.caller_depth, 2);
        assert_eq!(config.admin.version.as_deref(), Some("v0.1.0"));
        let mysql = config.database.mysql.unwrap();
        assert_eq!(mysql.max_connections, 4);
        assert_eq!(mysql.user, "moov");
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("[log\nformat=").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_error_message() {
        let err = parse_config("[admin]\nbind_address = \"bogus\"\n").unwrap_err();
        assert!(err.to_string().starts_with("Validation failed: admin.bind_address"));
    }
}
