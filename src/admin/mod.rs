//! Administrative HTTP server.
//!
//! # Routes
//! - `GET /metrics`: Prometheus text exposition
//! - `GET /live`, `GET /ready`: registered health checks as JSON
//! - `GET /debug/pprof/cmdline`: process arguments
//! - `GET /version` and any path added with `AdminServer::add_handler`
//!
//! # Design Decisions
//! - Extra routes live in an `ArcSwap` table read by the fallback handler,
//!   so they can be registered after the server has started
//! - The server reports serve failures through the `Logger` it was given

pub mod handlers;
pub mod server;

pub use server::{AdminError, AdminServer, AdminState, Handler, HealthCheck};
