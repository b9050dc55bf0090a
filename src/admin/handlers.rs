use std::collections::BTreeMap;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::admin::server::AdminState;
use crate::observability::metrics;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

pub async fn get_metrics() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], metrics::render())
}

pub async fn get_live(State(state): State<AdminState>) -> Response {
    run_checks(&state.liveness_checks())
}

pub async fn get_ready(State(state): State<AdminState>) -> Response {
    run_checks(&state.readiness_checks())
}

/// NUL-separated process arguments, as pprof's cmdline endpoint serves them.
pub async fn get_cmdline() -> impl IntoResponse {
    let args: Vec<String> = std::env::args_os()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        args.join("\0"),
    )
}

/// Routes requests to handlers registered at runtime.
pub async fn dispatch(State(state): State<AdminState>, request: Request) -> Response {
    match state.handler(request.uri().path()) {
        Some(handler) => handler(request).await,
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn run_checks(checks: &[(String, crate::admin::server::HealthCheck)]) -> Response {
    let mut results = BTreeMap::new();
    let mut healthy = true;
    for (name, check) in checks {
        let outcome = match check() {
            Ok(()) => "good".to_string(),
            Err(e) => {
                healthy = false;
                e
            }
        };
        results.insert(name.clone(), outcome);
    }

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(results)).into_response()
}
