//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → Logger::from_config / AdminServer / database::MySql
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - MySQL pool defaults honour `MYSQL_MAX_CONNECTIONS` and `MYSQL_TIMEOUT`
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{AdminConfig, DatabaseConfig, LogConfig, LogOutput, MySqlConfig, ServiceConfig};
