//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mysql_connections` (gauge): pool connections by `state`
//!   (`idle`, `inuse`, `open`)

use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Returns the process-wide Prometheus handle, installing the recorder on
/// first call.
///
/// If another recorder already owns the global slot, a detached recorder is
/// used so rendering still works (it will simply stay empty).
pub fn prometheus_handle() -> PrometheusHandle {
    HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(error = %e, "Prometheus recorder not installed, using a detached one");
                PrometheusBuilder::new().build_recorder().handle()
            }
        })
        .clone()
}

/// Renders every registered metric in the Prometheus text format.
pub fn render() -> String {
    prometheus_handle().render()
}

/// Records MySQL pool connection counts.
pub fn record_mysql_connections(idle: usize, in_use: usize, open: usize) {
    metrics::gauge!("mysql_connections", "state" => "idle").set(idle as f64);
    metrics::gauge!("mysql_connections", "state" => "inuse").set(in_use as f64);
    metrics::gauge!("mysql_connections", "state" => "open").set(open as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_gauges_are_rendered() {
        let handle = prometheus_handle();
        record_mysql_connections(2, 3, 5);

        let text = handle.render();
        assert!(text.contains("mysql_connections"), "{text}");
        assert!(text.contains("state=\"inuse\""), "{text}");
    }
}
