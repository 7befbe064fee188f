//! HS256 JWT utilities shared by the bridge.
//!
//! Both tokens the bridge produces are symmetric HS256 JWTs:
//! - trusted facts, signed and later verified by the bridge itself
//! - Jitsi access tokens, signed by the bridge and verified by Jitsi
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Only HS256 is accepted; any other `alg` header is rejected
//! - `exp` is always required; `iss`/`aud`/`sub` are required when expected
//! - Validation errors share one generic message; details are logged at debug

use crate::secret::{ExposeSecret, SecretString};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum accepted JWT size in bytes (8KB).
///
/// Trusted facts arrive as a query or form parameter from an untrusted
/// client; anything larger is rejected before base64 decoding or HMAC work.
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

/// Default leeway applied to `exp` checks.
pub const DEFAULT_LEEWAY: Duration = Duration::from_secs(30);

// =============================================================================
// Error Types
// =============================================================================

/// Errors from signing or verifying a JWT.
///
/// Validation variants intentionally render the same message so that a
/// client cannot probe which check failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtError {
    /// Token size exceeds [`MAX_JWT_SIZE_BYTES`].
    #[error("The token is invalid or expired")]
    TokenTooLarge,

    /// Token is not a well-formed HS256 JWT.
    #[error("The token is invalid or expired")]
    MalformedToken,

    /// HMAC signature does not match.
    #[error("The token is invalid or expired")]
    InvalidSignature,

    /// `exp` is in the past.
    #[error("The token is invalid or expired")]
    Expired,

    /// A required registered claim is missing or has an unexpected value.
    #[error("The token is invalid or expired")]
    ClaimMismatch,

    /// Encoding the token failed.
    #[error("Token signing failed: {0}")]
    Signing(String),
}

// =============================================================================
// Claim Expectations
// =============================================================================

/// Registered claims a verified token must carry.
///
/// # Example
///
/// ```rust,ignore
/// let expect = ClaimExpectations::new().issuer("bridge").audience("jitsi");
/// let claims: MyClaims = verify_hs256(token, &secret, &expect)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimExpectations {
    issuer: Option<String>,
    audience: Option<String>,
    subject: Option<String>,
    leeway: Duration,
}

impl Default for ClaimExpectations {
    fn default() -> Self {
        Self {
            issuer: None,
            audience: None,
            subject: None,
            leeway: DEFAULT_LEEWAY,
        }
    }
}

impl ClaimExpectations {
    /// Only `exp` is checked, with [`DEFAULT_LEEWAY`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `iss` to equal `issuer`.
    #[must_use]
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Require `aud` to contain `audience`.
    #[must_use]
    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Require `sub` to equal `subject`.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Override the `exp` leeway.
    #[must_use]
    pub fn leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway.as_secs();
        validation.validate_exp = true;

        let mut required = vec!["exp"];
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
            required.push("iss");
        }
        if let Some(audience) = &self.audience {
            validation.set_audience(&[audience]);
            required.push("aud");
        } else {
            validation.validate_aud = false;
        }
        if let Some(subject) = &self.subject {
            validation.sub = Some(subject.clone());
            required.push("sub");
        }
        validation.set_required_spec_claims(&required);
        validation
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Current Unix timestamp in seconds, used for `iat`/`exp`.
#[must_use]
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Sign `claims` as an HS256 JWT with `typ: JWT`.
///
/// # Errors
///
/// Returns `JwtError::Signing` if the claims cannot be serialized.
pub fn sign_hs256<T: Serialize>(claims: &T, secret: &SecretString) -> Result<String, JwtError> {
    let mut header = Header::new(Algorithm::HS256);
    header.typ = Some("JWT".to_string());

    let key = EncodingKey::from_secret(secret.expose_secret().as_bytes());
    encode(&header, claims, &key).map_err(|e| JwtError::Signing(e.to_string()))
}

/// Verify an HS256 JWT and deserialize its claims.
///
/// The size check runs before any parsing.
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds [`MAX_JWT_SIZE_BYTES`]
/// - `MalformedToken` - Bad structure, base64, JSON, or a non-HS256 `alg`
/// - `InvalidSignature` - HMAC mismatch (wrong secret or tampered token)
/// - `Expired` - `exp` is in the past beyond the leeway
/// - `ClaimMismatch` - `iss`/`aud`/`sub`/`exp` missing or unexpected
pub fn verify_hs256<T: DeserializeOwned>(
    token: &str,
    secret: &SecretString,
    expectations: &ClaimExpectations,
) -> Result<T, JwtError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtError::TokenTooLarge);
    }

    let key = DecodingKey::from_secret(secret.expose_secret().as_bytes());

    decode::<T>(token, &key, &expectations.validation())
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(target: "common.jwt", error = %e, "Token verification failed");
            classify(e.kind())
        })
}

fn classify(kind: &ErrorKind) -> JwtError {
    match kind {
        ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => JwtError::Expired,
        ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::InvalidSubject
        | ErrorKind::MissingRequiredClaim(_) => JwtError::ClaimMismatch,
        _ => JwtError::MalformedToken,
    }
}

// =============================================================================
// Tests
// =============================================================================
