//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use service_base::{AdminServer, Logger};

/// Start an admin server on an ephemeral local port.
#[allow(dead_code)]
pub async fn start_admin(logger: Logger) -> (AdminServer, SocketAddr) {
    let server = AdminServer::new("127.0.0.1:0", logger);
    let addr = server.start().await.expect("admin server should bind");
    (server, addr)
}

/// HTTP client that never reuses connections or honours proxy settings.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .timeout(Duration::from_secs(5))
        .no_proxy()
        .build()
        .unwrap()
}

/// Field value of `key` in a logfmt line, unquoted.
#[allow(dead_code)]
pub fn field<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let prefix = format!("{key}=");
    let start = line
        .match_indices(&prefix)
        .map(|(i, _)| i)
        .find(|&i| i == 0 || line.as_bytes()[i - 1] == b' ')?
        + prefix.len();
    let rest = &line[start..];
    if let Some(quoted) = rest.strip_prefix('"') {
        let mut escaped = false;
        for (i, c) in quoted.char_indices() {
            match c {
                '\\' if !escaped => escaped = true,
                '"' if !escaped => return Some(&quoted[..i]),
                _ => escaped = false,
            }
        }
        Some(quoted)
    } else {
        Some(rest.split(' ').next().unwrap_or(rest))
    }
}
