//! Database connection helpers.
//!
//! # Data Flow
//! ```text
//! DatabaseConfig
//!     → mysql.rs (connect options, pool, ping)
//!     → pool sampler task (every minute until shutdown)
//!     → observability::metrics (mysql_connections gauge)
//! ```

pub mod mysql;

use thiserror::Error;

pub use mysql::{connect, is_unique_violation, MySql, ER_DUP_ENTRY};

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("no database configured")]
    NotConfigured,

    #[error("database name is required")]
    MissingDatabaseName,

    #[error("invalid mysql address {0:?}")]
    InvalidAddress(String),

    #[error(transparent)]
    Connect(#[from] crate::log::Error),
}
