//! Diagnostic `tracing` setup for host processes.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "service_base=info,tower_http=info";

/// Installs a fmt subscriber filtered by `RUST_LOG`.
///
/// Returns an error when a global subscriber is already set.
pub fn init_tracing() -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
}
