//! Demo host for the service foundation.
//!
//! Loads configuration, builds the root logger, serves the admin endpoints
//! and optionally opens a MySQL pool, then waits for SIGINT/SIGTERM.
//! Startup failures are logged at `fatal` and end the process here; the
//! logger itself never exits.

use std::path::PathBuf;
use std::process;

use clap::Parser;

use service_base::config::{load_config, ServiceConfig};
use service_base::lifecycle::signals::shutdown_on_signal;
use service_base::observability::logging::init_tracing;
use service_base::{database, AdminServer, Logger, Shutdown};

#[derive(Parser)]
#[command(name = "service-base")]
#[command(about = "Run the admin server and database pool from a config file")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    if let Err(e) = init_tracing() {
        eprintln!("tracing already initialised: {e}");
    }

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    let logger = Logger::from_config(&config.log).with_key_value(["app", env!("CARGO_PKG_NAME")]);
    logger.info().logf(format_args!(
        "starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    ));

    let shutdown = Shutdown::new();
    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    let admin = AdminServer::from_config(&config.admin, logger.clone());
    if config.admin.version.is_none() {
        admin.add_version_handler(env!("CARGO_PKG_VERSION"));
    }
    match admin.start().await {
        Ok(addr) => logger.info().with_map([("admin_address", addr)]).log("admin server started"),
        Err(e) => {
            logger.fatal().log_error("admin server failed to start", Some(e));
            process::exit(1);
        }
    }

    let pool = if config.database.mysql.is_some() {
        match database::connect(logger.clone(), &config.database, &shutdown).await {
            Ok(pool) => {
                let probe = pool.clone();
                admin.add_readiness_check("mysql", move || {
                    if probe.is_closed() {
                        Err("pool closed".to_string())
                    } else {
                        Ok(())
                    }
                });
                Some(pool)
            }
            Err(e) => {
                logger.fatal().log_error("database setup failed", Some(e));
                process::exit(1);
            }
        }
    } else {
        None
    };

    shutdown.wait().await;

    admin.shutdown();
    admin.wait().await?;
    if let Some(pool) = pool {
        pool.close().await;
    }

    logger.info().log("shutdown complete");
    Ok(())
}
