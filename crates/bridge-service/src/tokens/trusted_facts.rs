//! Trusted facts: the session token and room, signed by the bridge.
//!
//! Issued by `GET /session` and handed back on `POST /disclose`, so the
//! bridge needs no server-side session store.

use crate::errors::BridgeError;
use common::jwt::{self, ClaimExpectations};
use common::secret::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

/// Claims carried by a trusted-facts token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedFactsClaims {
    /// IRMA requestor token of the disclosure session.
    pub token: String,

    /// Room whose policy was requested.
    pub room: String,

    /// The bridge's backend name.
    pub iss: String,

    pub iat: i64,

    pub exp: i64,
}

/// Custom Debug implementation that redacts the session token.
impl fmt::Debug for TrustedFactsClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustedFactsClaims")
            .field("token", &"[REDACTED]")
            .field("room", &self.room)
            .field("iss", &self.iss)
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .finish()
    }
}

/// Verified trusted facts.
#[derive(Clone, PartialEq, Eq)]
pub struct TrustedFacts {
    pub session_token: String,
    pub room: String,
}

impl fmt::Debug for TrustedFacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustedFacts")
            .field("session_token", &"[REDACTED]")
            .field("room", &self.room)
            .finish()
    }
}

/// Signs and verifies trusted facts with the backend secret.
#[derive(Debug, Clone)]
pub struct TrustedFactsIssuer {
    issuer: String,
    secret: SecretString,
    ttl: Duration,
}

impl TrustedFactsIssuer {
    pub fn new(issuer: impl Into<String>, secret: SecretString, ttl: Duration) -> Self {
        Self {
            issuer: issuer.into(),
            secret,
            ttl,
        }
    }

    /// Build the claims for a session, issued at `now`.
    pub fn claims_at(&self, session_token: &str, room: &str, now: i64) -> TrustedFactsClaims {
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        TrustedFactsClaims {
            token: session_token.to_string(),
            room: room.to_string(),
            iss: self.issuer.clone(),
            iat: now,
            exp: now.saturating_add(ttl),
        }
    }

    /// Sign trusted facts for a freshly started session.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::Signing` if encoding fails.
    #[instrument(skip_all, fields(room = %room))]
    pub fn issue(&self, session_token: &str, room: &str) -> Result<String, BridgeError> {
        let claims = self.claims_at(session_token, room, jwt::unix_now());
        jwt::sign_hs256(&claims, &self.secret).map_err(|e| BridgeError::Signing(e.to_string()))
    }

    /// Verify trusted facts presented by a client.
    ///
    /// Checks signature, algorithm, issuer, and expiry.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::InvalidTrustedFacts` on any verification failure.
    #[instrument(skip_all)]
    pub fn verify(&self, token: &str) -> Result<TrustedFacts, BridgeError> {
        let expectations = ClaimExpectations::new().issuer(self.issuer.clone());
        let claims: TrustedFactsClaims = jwt::verify_hs256(token, &self.secret, &expectations)
            .map_err(|e| {
                debug!(target: "bridge.tokens", error = ?e, "Trusted facts rejected");
                BridgeError::InvalidTrustedFacts(e)
            })?;

        Ok(TrustedFacts {
            session_token: claims.token,
            room: claims.room,
        })
    }
}
