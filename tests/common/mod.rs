//! Shared utilities for lifecycle tests.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use service_kit::http::build_router;
use service_kit::lifecycle::{RunError, Shutdown, Supervisor};
use service_kit::observability::metrics::install_recorder;
use service_kit::{Logger, ServiceConfig};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A supervised service listening on an ephemeral port.
pub struct RunningService {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), RunError>>,
}

impl RunningService {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Assemble `routes` with the default configuration and start supervising it.
pub async fn start_service(routes: Router, shutdown_timeout: Duration) -> RunningService {
    let config = ServiceConfig::builder("lifecycle-test")
        .shutdown_timeout(shutdown_timeout)
        .build();
    let router = build_router(&config, routes, Logger::new(&config.name), install_recorder())
        .unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let supervisor = Supervisor::new(config.shutdown_timeout);
    let shutdown = supervisor.shutdown_handle();
    let handle = tokio::spawn(supervisor.run(router, listener));

    RunningService {
        addr,
        shutdown,
        handle,
    }
}

/// Client without connection pooling, so every request opens a new connection.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
