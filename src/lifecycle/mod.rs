//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! signals.rs: SIGINT/SIGTERM → Shutdown::trigger
//! shutdown.rs: Shutdown broadcast → admin server graceful stop
//!                                 → database pool sampler exit
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
