//! Service foundation library.
//!
//! The centre of the crate is [`log::Logger`], an immutable contextual
//! logger whose error helpers log and return an error in one call. The
//! admin server and database helpers take a `Logger` at construction.

pub mod admin;
pub mod config;
pub mod database;
pub mod lifecycle;
pub mod log;
pub mod observability;

pub use admin::AdminServer;
pub use config::ServiceConfig;
pub use lifecycle::Shutdown;
pub use log::{Level, Logger};
