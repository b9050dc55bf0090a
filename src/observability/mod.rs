//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! crate internals (sink failures, admin lifecycle, pool sampler)
//!     → logging.rs (tracing subscriber for the host process)
//!
//! database pool sampler
//!     → metrics.rs (gauges via the `metrics` facade)
//!     → Prometheus recorder
//!     → admin server GET /metrics
//! ```
//!
//! # Design Decisions
//! - One process-wide recorder, installed lazily on first use
//! - Application log lines go through `crate::log::Logger`; `tracing` is
//!   only for the crate's own diagnostics

pub mod logging;
pub mod metrics;
