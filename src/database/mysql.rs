//! MySQL pool construction, statistics and error inspection.

use std::time::Duration;

use sqlx::mysql::{MySqlConnectOptions, MySqlDatabaseError, MySqlPool, MySqlPoolOptions};
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::DatabaseConfig;
use crate::database::DatabaseError;
use crate::lifecycle::Shutdown;
use crate::log::Logger;
use crate::observability::metrics;

/// MySQL error number for duplicate entries (`ER_DUP_ENTRY`).
pub const ER_DUP_ENTRY: u16 = 1062;

/// How often pool statistics are sampled.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(60);

const DEFAULT_PORT: u16 = 3306;

/// A configured, not yet connected MySQL pool.
#[derive(Debug)]
pub struct MySql {
    options: MySqlConnectOptions,
    max_connections: u32,
    timeout: Duration,
    logger: Logger,
}

impl MySql {
    pub fn new(logger: Logger, config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let mysql = config.mysql.as_ref().ok_or(DatabaseError::NotConfigured)?;
        if config.database_name.trim().is_empty() {
            return Err(DatabaseError::MissingDatabaseName);
        }
        let (host, port) = parse_address(&mysql.address)?;

        let options = MySqlConnectOptions::new()
            .host(&host)
            .port(port)
            .username(&mysql.user)
            .password(&mysql.password)
            .database(&config.database_name)
            .charset("utf8mb4");

        Ok(Self {
            options,
            max_connections: mysql.max_connections,
            timeout: Duration::from_secs(mysql.timeout_secs),
            logger: logger.with_map([
                ("database", config.database_name.as_str()),
                ("mysql_address", mysql.address.as_str()),
            ]),
        })
    }

    pub fn connect_options(&self) -> &MySqlConnectOptions {
        &self.options
    }

    pub fn max_connections(&self) -> u32 {
        self.max_connections
    }

    /// Opens the pool, verifies it with a ping and starts sampling pool
    /// statistics until `shutdown` fires.
    pub async fn connect(&self, shutdown: &Shutdown) -> Result<MySqlPool, DatabaseError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.timeout)
            .connect_with(self.options.clone())
            .await
            .map_err(|e| self.logger.error().log_errorf("connecting to mysql", e))?;

        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(|e| self.logger.error().log_errorf("pinging mysql", e))?;

        spawn_pool_sampler(pool.clone(), SAMPLE_INTERVAL, shutdown.clone());
        self.logger.info().log("mysql connection pool ready");
        Ok(pool)
    }
}

/// Connects a pool from `config` in one call.
pub async fn connect(
    logger: Logger,
    config: &DatabaseConfig,
    shutdown: &Shutdown,
) -> Result<MySqlPool, DatabaseError> {
    MySql::new(logger, config)?.connect(shutdown).await
}

/// Records idle, in-use and open connection counts for `pool`.
pub fn record_pool_stats(pool: &MySqlPool) {
    let open = pool.size() as usize;
    let idle = pool.num_idle();
    metrics::record_mysql_connections(idle, open.saturating_sub(idle), open);
}

/// Samples `pool` every `period` until `shutdown` fires, including when it
/// fired before the sampler started.
fn spawn_pool_sampler(pool: MySqlPool, period: Duration, shutdown: Shutdown) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::debug!(period = ?period, "MySQL pool sampler starting");
        let mut ticker = time::interval(period);
        let stopped = shutdown.wait();
        tokio::pin!(stopped);
        loop {
            tokio::select! {
                biased;
                _ = &mut stopped => {
                    tracing::debug!("MySQL pool sampler received shutdown signal, exiting loop");
                    break;
                }
                _ = ticker.tick() => record_pool_stats(&pool),
            }
        }
    })
}

/// True when `err` reports a duplicate entry on a unique key.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db) = err {
        if let Some(mysql) = db.try_downcast_ref::<MySqlDatabaseError>() {
            if mysql.number() == ER_DUP_ENTRY {
                return true;
            }
        }
    }
    err.to_string().contains("Duplicate entry")
}

/// Splits `host:port`, also accepting the `tcp(host:port)` form.
fn parse_address(address: &str) -> Result<(String, u16), DatabaseError> {
    let trimmed = address.trim();
    let inner = trimmed
        .strip_prefix("tcp(")
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(trimmed);
    if inner.is_empty() {
        return Err(DatabaseError::InvalidAddress(address.to_string()));
    }

    match inner.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|_| DatabaseError::InvalidAddress(address.to_string()))?;
            let host = if host.is_empty() { "localhost" } else { host };
            Ok((host.to_string(), port))
        }
        None => Ok((inner.to_string(), DEFAULT_PORT)),
    }
}
