//! IRMA server HTTP client.
//!
//! Talks to the requestor API of an IRMA server:
//! - `POST /session` starts a disclosure session for a room policy
//! - `GET /session/{token}/result` reads back what the user disclosed
//!
//! # Retries
//!
//! Transport failures (including timeouts) and 5xx responses are retried
//! with exponential backoff. 4xx responses are never retried.

use crate::errors::BridgeError;
use crate::models::{
    AttributeConDisCon, DisclosedIdentity, DisclosureRequest, ProofStatus, SessionPackage,
    SessionResult, SessionStatus,
};
use crate::observability::metrics::{record_irma_request, record_irma_retry};
use reqwest::{Client, RequestBuilder, Response};
use std::time::{Duration, Instant};
use tracing::{error, info, instrument, warn};

/// Connect timeout for the IRMA server.
const IRMA_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Initial backoff between retries.
const INITIAL_BACKOFF_MS: u64 = 250;

/// Backoff cap.
const MAX_BACKOFF_MS: u64 = 2_000;

const OP_START_SESSION: &str = "start_session";
const OP_FETCH_RESULT: &str = "fetch_result";

/// How often and how patiently failed IRMA calls are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; 0 disables retrying.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_backoff: Duration::from_millis(MAX_BACKOFF_MS),
        }
    }

    /// Delay before retry number `attempt` (0-based), doubling up to the cap.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Longest a single call can take when every attempt runs into
    /// `attempt_timeout`: all attempts plus the backoff between them.
    pub fn worst_case(&self, attempt_timeout: Duration) -> Duration {
        let attempts = attempt_timeout.saturating_mul(self.max_retries.saturating_add(1));
        (0..self.max_retries)
            .map(|attempt| self.backoff_for(attempt))
            .fold(attempts, Duration::saturating_add)
    }
}

/// HTTP client for the IRMA requestor API.
#[derive(Debug, Clone)]
pub struct IrmaClient {
    /// HTTP client with configured timeouts.
    client: Client,

    /// IRMA server base URL, without trailing slash.
    base_url: String,

    retry: RetryPolicy,
}

impl IrmaClient {
    /// Create a new IRMA client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - IRMA server URL (e.g., "http://localhost:8088")
    /// * `timeout` - Per-request timeout
    /// * `retry` - Retry policy for transport errors and 5xx responses
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::UpstreamUnavailable` if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self, BridgeError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(IRMA_CONNECT_TIMEOUT.min(timeout))
            .build()
            .map_err(|e| {
                error!(target: "bridge.services.irma_client", error = %e, "Failed to build HTTP client");
                BridgeError::UpstreamUnavailable(format!("HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    /// Start a disclosure session for `policy`.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::UpstreamUnavailable` if the IRMA server is
    /// unreachable, rejects the request, or returns an unparseable package.
    #[instrument(skip_all)]
    pub async fn start_session(
        &self,
        policy: &AttributeConDisCon,
    ) -> Result<SessionPackage, BridgeError> {
        let url = format!("{}/session", self.base_url);
        let request = DisclosureRequest::new(policy);

        let response = self
            .send_with_retry(OP_START_SESSION, || self.client.post(&url).json(&request))
            .await?;

        response.json::<SessionPackage>().await.map_err(|e| {
            error!(target: "bridge.services.irma_client", error = %e, "Failed to parse IRMA session package");
            BridgeError::UpstreamUnavailable(format!("Invalid session package: {e}"))
        })
    }

    /// Fetch the result of a disclosure session.
    ///
    /// # Errors
    ///
    /// - `BridgeError::UpstreamUnavailable` if the IRMA server fails
    /// - `BridgeError::SessionNotDone` if the status is anything but DONE
    /// - `BridgeError::InvalidProof` if a proof status other than VALID is reported
    #[instrument(skip_all)]
    pub async fn fetch_result(&self, session_token: &str) -> Result<DisclosedIdentity, BridgeError> {
        let url = format!("{}/session/{}/result", self.base_url, session_token);

        let response = self
            .send_with_retry(OP_FETCH_RESULT, || self.client.get(&url))
            .await?;

        let result = response.json::<SessionResult>().await.map_err(|e| {
            error!(target: "bridge.services.irma_client", error = %e, "Failed to parse IRMA session result");
            BridgeError::UpstreamUnavailable(format!("Invalid session result: {e}"))
        })?;

        if result.status != SessionStatus::Done {
            info!(target: "bridge.services.irma_client", status = %result.status, "Session not done");
            return Err(BridgeError::SessionNotDone {
                status: result.status,
            });
        }

        if let Some(proof) = result.proof_status {
            if proof != ProofStatus::Valid {
                warn!(target: "bridge.services.irma_client", proof_status = %proof, "Disclosure proof not valid");
                return Err(BridgeError::InvalidProof(proof));
            }
        }

        Ok(DisclosedIdentity::from_disclosed(&result.disclosed))
    }

    /// Send a request built by `build`, retrying per the retry policy.
    async fn send_with_retry<F>(
        &self,
        operation: &'static str,
        build: F,
    ) -> Result<Response, BridgeError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt: u32 = 0;

        loop {
            let start = Instant::now();
            let failure = match build().send().await {
                Ok(response) if response.status().is_success() => {
                    record_irma_request(operation, "success", start.elapsed());
                    return Ok(response);
                }
                Ok(response) if response.status().is_server_error() => {
                    format!("IRMA server returned {}", response.status())
                }
                Ok(response) => {
                    let status = response.status();
                    record_irma_request(operation, "rejected", start.elapsed());
                    let body = response.text().await.unwrap_or_default();
                    warn!(
                        target: "bridge.services.irma_client",
                        operation,
                        status = %status,
                        body = %body,
                        "IRMA server rejected request"
                    );
                    return Err(BridgeError::UpstreamUnavailable(format!(
                        "IRMA server rejected {operation} with {status}"
                    )));
                }
                Err(e) => e.to_string(),
            };

            record_irma_request(operation, "error", start.elapsed());

            if attempt >= self.retry.max_retries {
                warn!(
                    target: "bridge.services.irma_client",
                    operation,
                    attempts = attempt + 1,
                    error = %failure,
                    "IRMA request failed, giving up"
                );
                return Err(BridgeError::UpstreamUnavailable(failure));
            }

            let delay = self.retry.backoff_for(attempt);
            warn!(
                target: "bridge.services.irma_client",
                operation,
                attempt = attempt + 1,
                backoff_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %failure,
                "IRMA request failed, will retry"
            );
            record_irma_retry(operation);
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
