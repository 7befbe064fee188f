//! HTTP routes for the disclosure bridge.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::errors::BridgeError;
use crate::handlers;
use crate::services::{IrmaClient, RetryPolicy};
use crate::tokens::{AccessTokenIssuer, TrustedFactsIssuer};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::warn;

/// Lower bound for the whole-request timeout.
const MIN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Headroom between the IRMA call budget and the request timeout.
const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Client for the IRMA requestor API.
    pub irma: IrmaClient,

    /// Signs and verifies trusted facts with the backend secret.
    pub trusted_facts: TrustedFactsIssuer,

    /// Signs Jitsi access tokens with the Jitsi secret.
    pub access_tokens: AccessTokenIssuer,
}

impl AppState {
    /// Build the shared state from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::UpstreamUnavailable` if the IRMA HTTP client cannot be built.
    pub fn from_config(config: Config) -> Result<Self, BridgeError> {
        let irma = IrmaClient::new(
            &config.irma_server,
            config.irma_timeout,
            RetryPolicy::new(config.irma_max_retries),
        )?;

        let trusted_facts = TrustedFactsIssuer::new(
            config.backend_name.clone(),
            config.backend_secret.clone(),
            config.trusted_facts_ttl,
        );

        let access_tokens = AccessTokenIssuer::new(
            config.backend_name.clone(),
            config.jitsi_name.clone(),
            config.jitsi_domain.clone(),
            config.jitsi_secret.clone(),
        );

        Ok(Self {
            config,
            irma,
            trusted_facts,
            access_tokens,
        })
    }
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `GET /session?room=<name>` - Start a disclosure session
/// - `POST /disclose` - Exchange a finished disclosure for a Jitsi token
/// - `GET /health` - Liveness probe (simple "OK")
/// - `GET /metrics` - Prometheus metrics endpoint
/// - TraceLayer for request logging
/// - Request timeout outlasting a fully retried IRMA call (at least 30 seconds)
/// - CORS, if allowed origins are configured
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let cors = state.config.allowed_origins.as_deref().map(cors_layer);
    let timeout = request_timeout(state.config.irma_timeout, state.config.irma_max_retries);

    let bridge_routes = Router::new()
        .route("/session", get(handlers::start_session))
        .route("/disclose", post(handlers::disclose))
        .route("/health", get(handlers::health_check))
        .with_state(state);

    // Metrics route with its own state
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let router = bridge_routes
        .merge(metrics_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout));

    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

/// Timeout for a whole request. Each handler makes at most one IRMA call, so
/// the call must finish (and fail with a proper error response) before this
/// fires.
fn request_timeout(irma_timeout: Duration, irma_max_retries: u32) -> Duration {
    RetryPolicy::new(irma_max_retries)
        .worst_case(irma_timeout)
        .saturating_add(REQUEST_TIMEOUT_MARGIN)
        .max(MIN_REQUEST_TIMEOUT)
}

/// CORS for the web frontend, which is served from another origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(target: "bridge.routes", origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_clone() {
        // Required for Axum's State extractor.
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[test]
    fn test_config_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<Config>();
    }

    #[test]
    fn test_request_timeout_has_floor() {
        assert_eq!(
            request_timeout(Duration::from_secs(1), 0),
            MIN_REQUEST_TIMEOUT
        );
    }

    #[test]
    fn test_request_timeout_outlasts_irma_budget() {
        use crate::config::{
            DEFAULT_IRMA_MAX_RETRIES, DEFAULT_IRMA_TIMEOUT_SECONDS, MAX_IRMA_MAX_RETRIES,
            MAX_IRMA_TIMEOUT_SECONDS,
        };

        for (timeout_seconds, retries) in [
            (DEFAULT_IRMA_TIMEOUT_SECONDS, DEFAULT_IRMA_MAX_RETRIES),
            (DEFAULT_IRMA_TIMEOUT_SECONDS, MAX_IRMA_MAX_RETRIES),
            (MAX_IRMA_TIMEOUT_SECONDS, MAX_IRMA_MAX_RETRIES),
        ] {
            let irma_timeout = Duration::from_secs(timeout_seconds);
            let budget = RetryPolicy::new(retries).worst_case(irma_timeout);
            let timeout = request_timeout(irma_timeout, retries);
            assert!(
                timeout >= budget + REQUEST_TIMEOUT_MARGIN,
                "{timeout:?} does not outlast {budget:?}"
            );
        }

        // Defaults: 3 x 10s + 250ms + 500ms backoff, plus margin
        assert_eq!(
            request_timeout(Duration::from_secs(10), 2),
            Duration::from_millis(35_750)
        );
    }

    #[test]
    fn test_cors_layer_accepts_wildcard_and_lists() {
        let _any = cors_layer(&["*".to_string()]);
        let _list = cors_layer(&[
            "https://meet.example.org".to_string(),
            "bad\norigin".to_string(),
        ]);
    }
}
