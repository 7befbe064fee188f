//! Test server harness for E2E testing
//!
//! Provides `TestBridgeServer` for spawning real bridge instances in tests,
//! and `test_router` for in-process requests via `tower::ServiceExt::oneshot`.

use crate::fixtures::test_config;
use axum::Router;
use bridge_service::config::Config;
use bridge_service::observability::metrics::init_metrics_recorder;
use bridge_service::routes::{self, AppState};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;

/// Global metrics handle for test servers
static TEST_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics handle shared by all test servers in this process.
///
/// The first caller installs the global recorder; if that fails (another
/// test binary component already did), a standalone recorder is used.
pub fn test_metrics_handle() -> PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// Build the real router for `config`.
pub fn router_for(config: Config) -> Result<Router, anyhow::Error> {
    let state = Arc::new(
        AppState::from_config(config)
            .map_err(|e| anyhow::anyhow!("Failed to create state: {}", e))?,
    );
    Ok(routes::build_routes(state, test_metrics_handle()))
}

/// Build the real router for the test configuration against `irma_url`.
pub fn test_router(irma_url: &str, extra: &[(&str, &str)]) -> Result<Router, anyhow::Error> {
    router_for(test_config(irma_url, extra)?)
}

/// Test harness for spawning the bridge in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health() -> Result<(), anyhow::Error> {
///     let server = TestBridgeServer::spawn("http://127.0.0.1:1").await?;
///     let response = reqwest::get(format!("{}/health", server.url())).await?;
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestBridgeServer {
    addr: SocketAddr,
    config: Config,
    _handle: JoinHandle<()>,
}

impl TestBridgeServer {
    /// Spawn a bridge talking to the IRMA server at `irma_url`.
    ///
    /// The server binds to a random available port (127.0.0.1:0).
    pub async fn spawn(irma_url: &str) -> Result<Self, anyhow::Error> {
        Self::spawn_with(irma_url, &[]).await
    }

    /// Spawn a bridge with `extra` configuration options.
    pub async fn spawn_with(irma_url: &str, extra: &[(&str, &str)]) -> Result<Self, anyhow::Error> {
        let config = test_config(irma_url, extra)?;
        let app = router_for(config.clone())?;

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        // Spawn server in background
        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for TestBridgeServer {
    fn drop(&mut self) {
        // Abort the server task so the port is released when the test ends.
        self._handle.abort();
    }
}
