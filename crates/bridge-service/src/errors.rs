//! Disclosure bridge error types.
//!
//! All errors map to HTTP status codes via the `IntoResponse` impl.
//! Upstream and signing failures are logged server-side; the client only
//! sees a generic message for those.

use crate::models::{ProofStatus, SessionStatus};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::jwt::JwtError;
use serde::Serialize;
use thiserror::Error;

/// Bridge error type.
///
/// Maps to HTTP status codes:
/// - UnknownRoom, MissingTrustedFacts, InvalidTrustedFacts: 400 Bad Request
/// - InvalidProof: 403 Forbidden
/// - SessionNotDone: 410 Gone once the session ended, else 425 Too Early
/// - UpstreamUnavailable, Signing: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Unknown room: {0:?}")]
    UnknownRoom(String),

    #[error("Disclosure needs trustedFacts")]
    MissingTrustedFacts,

    #[error("Invalid trusted facts: {0}")]
    InvalidTrustedFacts(JwtError),

    #[error("IRMA server unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("IRMA session not done: {status}")]
    SessionNotDone { status: SessionStatus },

    #[error("IRMA proof not valid: {0}")]
    InvalidProof(ProofStatus),

    #[error("Token signing failed: {0}")]
    Signing(String),
}

impl BridgeError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            BridgeError::UnknownRoom(_)
            | BridgeError::MissingTrustedFacts
            | BridgeError::InvalidTrustedFacts(_) => StatusCode::BAD_REQUEST,
            BridgeError::InvalidProof(_) => StatusCode::FORBIDDEN,
            BridgeError::SessionNotDone { status } if status.is_terminal() => StatusCode::GONE,
            BridgeError::SessionNotDone { .. } => too_early(),
            BridgeError::UpstreamUnavailable(_) | BridgeError::Signing(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Bounded label for the `status`/`outcome` metric dimensions.
    pub fn metric_label(&self) -> &'static str {
        match self {
            BridgeError::UnknownRoom(_) => "unknown_room",
            BridgeError::MissingTrustedFacts => "missing_trusted_facts",
            BridgeError::InvalidTrustedFacts(_) => "invalid_trusted_facts",
            BridgeError::UpstreamUnavailable(_) => "upstream_unavailable",
            BridgeError::SessionNotDone { status } if status.is_terminal() => "session_ended",
            BridgeError::SessionNotDone { .. } => "session_pending",
            BridgeError::InvalidProof(_) => "invalid_proof",
            BridgeError::Signing(_) => "signing_error",
        }
    }
}

/// 425 Too Early, which `http` has no named constant for.
fn too_early() -> StatusCode {
    StatusCode::from_u16(425).unwrap_or(StatusCode::CONFLICT)
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (code, message) = match &self {
            BridgeError::UnknownRoom(room) => (
                "UNKNOWN_ROOM",
                format!("No disclosure policy for room {room:?}"),
            ),
            BridgeError::MissingTrustedFacts => (
                "MISSING_TRUSTED_FACTS",
                "disclosure needs trustedFacts".to_string(),
            ),
            BridgeError::InvalidTrustedFacts(err) => {
                tracing::debug!(target: "bridge.errors", error = ?err, "Rejected trusted facts");
                ("INVALID_TRUSTED_FACTS", err.to_string())
            }
            BridgeError::UpstreamUnavailable(reason) => {
                // Log actual reason server-side
                tracing::error!(target: "bridge.errors", reason = %reason, "IRMA server unavailable");
                (
                    "INTERNAL_ERROR",
                    "The disclosure service is temporarily unavailable".to_string(),
                )
            }
            BridgeError::SessionNotDone { status } if status.is_terminal() => (
                "SESSION_ENDED",
                format!("Disclosure session ended with status {status}"),
            ),
            BridgeError::SessionNotDone { status } => (
                "SESSION_PENDING",
                format!("Disclosure session is not finished yet (status {status})"),
            ),
            BridgeError::InvalidProof(proof) => (
                "INVALID_PROOF",
                format!("Disclosure proof was not accepted ({proof})"),
            ),
            BridgeError::Signing(reason) => {
                tracing::error!(target: "bridge.errors", reason = %reason, "Token signing failed");
                ("INTERNAL_ERROR", "An internal error occurred".to_string())
            }
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(error_response)).into_response()
    }
}
