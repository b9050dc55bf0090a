//! Admin server lifecycle and route registry.

use std::collections::HashMap;
use std::future::Future;
use std::net::{AddrParseError, SocketAddr};
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;
use axum::{
    extract::Request,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures_util::future::BoxFuture;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::admin::handlers::*;
use crate::config::validation::parse_bind_address;
use crate::config::AdminConfig;
use crate::lifecycle::Shutdown;
use crate::log::Logger;

/// A handler registered at runtime.
pub type Handler = Arc<dyn Fn(Request) -> BoxFuture<'static, Response> + Send + Sync>;

/// A liveness or readiness probe. `Err` carries the reason it failed.
pub type HealthCheck = Arc<dyn Fn() -> Result<(), String> + Send + Sync>;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("invalid bind address {address:?}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: AddrParseError,
    },

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("admin server already started on {0}")]
    AlreadyStarted(SocketAddr),

    #[error("admin server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Shared state injected into admin handlers.
#[derive(Clone, Default)]
pub struct AdminState {
    handlers: Arc<ArcSwap<HashMap<String, Handler>>>,
    liveness: Arc<ArcSwap<Vec<(String, HealthCheck)>>>,
    readiness: Arc<ArcSwap<Vec<(String, HealthCheck)>>>,
}

impl AdminState {
    pub fn handler(&self, path: &str) -> Option<Handler> {
        self.handlers.load().get(path).cloned()
    }

    pub fn liveness_checks(&self) -> Vec<(String, HealthCheck)> {
        self.liveness.load_full().as_ref().clone()
    }

    pub fn readiness_checks(&self) -> Vec<(String, HealthCheck)> {
        self.readiness.load_full().as_ref().clone()
    }

    fn insert_handler(&self, path: String, handler: Handler) {
        self.handlers.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.insert(path.clone(), handler.clone());
            next
        });
    }

    fn insert_check(
        table: &ArcSwap<Vec<(String, HealthCheck)>>,
        name: String,
        check: HealthCheck,
    ) {
        table.rcu(|current| {
            let mut next: Vec<_> = current
                .iter()
                .filter(|(existing, _)| *existing != name)
                .cloned()
                .collect();
            next.push((name.clone(), check.clone()));
            next
        });
    }
}

/// Admin HTTP server with start/stop lifecycle.
pub struct AdminServer {
    bind_address: String,
    logger: Logger,
    state: AdminState,
    shutdown: Shutdown,
    local_addr: OnceLock<SocketAddr>,
    task: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl AdminServer {
    /// Creates a server for `bind_address` (`host:port` or `:port`).
    /// Nothing is bound until [`AdminServer::start`].
    pub fn new(bind_address: impl Into<String>, logger: Logger) -> Self {
        Self {
            bind_address: bind_address.into(),
            logger,
            state: AdminState::default(),
            shutdown: Shutdown::new(),
            local_addr: OnceLock::new(),
            task: parking_lot::Mutex::new(None),
        }
    }

    pub fn from_config(config: &AdminConfig, logger: Logger) -> Self {
        let server = Self::new(config.bind_address.clone(), logger);
        if let Some(version) = &config.version {
            server.add_version_handler(version.clone());
        }
        server
    }

    /// `:<port>` once started, otherwise the configured address.
    pub fn bind_addr(&self) -> String {
        match self.local_addr.get() {
            Some(addr) => format!(":{}", addr.port()),
            None => self.bind_address.clone(),
        }
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    pub fn state(&self) -> AdminState {
        self.state.clone()
    }

    /// Registers `handler` for `path`. Works before and after `start`.
    ///
    /// Built-in routes take precedence over registered ones.
    pub fn add_handler<F, Fut, R>(&self, path: &str, handler: F)
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        let handler: Handler = Arc::new(move |request| -> BoxFuture<'static, Response> {
            let fut = handler(request);
            Box::pin(async move { fut.await.into_response() })
        });
        self.state.insert_handler(path, handler);
    }

    /// Serves `version` as plain text from `GET /version`.
    pub fn add_version_handler(&self, version: impl Into<String>) {
        let version: Arc<str> = Arc::from(version.into());
        self.add_handler("/version", move |_request| {
            let version = Arc::clone(&version);
            async move { version.to_string() }
        });
    }

    pub fn add_liveness_check<F>(&self, name: impl Into<String>, check: F)
    where
        F: Fn() -> Result<(), String> + Send + Sync + 'static,
    {
        AdminState::insert_check(&self.state.liveness, name.into(), Arc::new(check));
    }

    pub fn add_readiness_check<F>(&self, name: impl Into<String>, check: F)
    where
        F: Fn() -> Result<(), String> + Send + Sync + 'static,
    {
        AdminState::insert_check(&self.state.readiness, name.into(), Arc::new(check));
    }

    /// Binds the listener and serves in a background task.
    ///
    /// Returns the bound address. Fails if the server was already started.
    pub async fn start(&self) -> Result<SocketAddr, AdminError> {
        if let Some(addr) = self.local_addr.get() {
            return Err(AdminError::AlreadyStarted(*addr));
        }

        let addr = parse_bind_address(&self.bind_address).map_err(|source| {
            AdminError::InvalidAddress {
                address: self.bind_address.clone(),
                source,
            }
        })?;

        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(source) => {
                self.logger
                    .error()
                    .logf(format_args!("admin server failed to bind {addr}: {source}"));
                return Err(AdminError::Bind {
                    address: self.bind_address.clone(),
                    source,
                });
            }
        };
        let local = listener.local_addr().map_err(|source| AdminError::Bind {
            address: self.bind_address.clone(),
            source,
        })?;
        if self.local_addr.set(local).is_err() {
            return Err(AdminError::AlreadyStarted(local));
        }

        let app = Self::build_router(self.state.clone());
        let logger = self.logger.with_map([("admin_address", local)]);
        let shutdown = self.shutdown.clone();

        let handle = tokio::spawn(async move {
            tracing::info!(address = %local, "Admin server listening");
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.wait().await })
                .await;
            if let Err(e) = served {
                let _ = logger.error().log_error("admin server stopped", Some(e));
            }
            tracing::info!(address = %local, "Admin server stopped");
        });
        *self.task.lock() = Some(handle);

        Ok(local)
    }

    /// Starts the server and waits until it shuts down.
    pub async fn listen(&self) -> Result<(), AdminError> {
        self.start().await?;
        self.wait().await
    }

    /// Waits for the background serve task to finish.
    pub async fn wait(&self) -> Result<(), AdminError> {
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            handle.await?;
        }
        Ok(())
    }

    /// Stops accepting connections and drains in-flight requests.
    pub fn shutdown(&self) {
        self.shutdown.trigger();
    }

    fn build_router(state: AdminState) -> Router {
        Router::new()
            .route("/metrics", get(get_metrics))
            .route("/live", get(get_live))
            .route("/ready", get(get_ready))
            .route("/debug/pprof/cmdline", get(get_cmdline))
            .fallback(dispatch)
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }
}

impl Drop for AdminServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}
