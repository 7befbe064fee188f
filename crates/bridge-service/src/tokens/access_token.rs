//! Jitsi access tokens.
//!
//! The claim layout follows the Jitsi token authentication module: the room
//! name and a `context.user` block, with `aud`/`iss`/`sub` naming the Jitsi
//! application, the bridge, and the Jitsi domain.

use crate::errors::BridgeError;
use common::jwt;
use common::secret::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::instrument;

/// Lifetime of an access token.
pub const ACCESS_TOKEN_TTL_SECONDS: i64 = 3600;

/// User block of the Jitsi context claim.
///
/// All fields are always serialized; the bridge only fills in `name`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JitsiUser {
    pub avatar: String,
    pub name: String,
    pub email: String,
    pub id: String,
}

/// The display name is disclosed personal data.
impl fmt::Debug for JitsiUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JitsiUser")
            .field("avatar", &self.avatar)
            .field("name", &"[REDACTED]")
            .field("email", &self.email)
            .field("id", &self.id)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JitsiContext {
    pub group: String,
    pub user: JitsiUser,
}

/// Claims of a Jitsi access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JitsiClaims {
    pub room: String,
    pub context: JitsiContext,
    pub aud: String,
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs Jitsi access tokens with the Jitsi secret.
#[derive(Debug, Clone)]
pub struct AccessTokenIssuer {
    /// `iss`: the bridge's backend name.
    issuer: String,

    /// `aud`: the Jitsi application name.
    audience: String,

    /// `sub`: the Jitsi domain.
    subject: String,

    secret: SecretString,
}

impl AccessTokenIssuer {
    pub fn new(
        issuer: impl Into<String>,
        audience: impl Into<String>,
        subject: impl Into<String>,
        secret: SecretString,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            subject: subject.into(),
            secret,
        }
    }

    /// Build the claims for `display_name` in `room`, issued at `now`.
    pub fn claims_at(&self, room: &str, display_name: &str, now: i64) -> JitsiClaims {
        JitsiClaims {
            room: room.to_string(),
            context: JitsiContext {
                group: String::new(),
                user: JitsiUser {
                    name: display_name.to_string(),
                    ..JitsiUser::default()
                },
            },
            aud: self.audience.clone(),
            iss: self.issuer.clone(),
            sub: self.subject.clone(),
            iat: now,
            exp: now.saturating_add(ACCESS_TOKEN_TTL_SECONDS),
        }
    }

    /// Sign an access token for `display_name` in `room`.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::Signing` if encoding fails.
    #[instrument(skip_all, fields(room = %room))]
    pub fn issue(&self, room: &str, display_name: &str) -> Result<String, BridgeError> {
        let claims = self.claims_at(room, display_name, jwt::unix_now());
        jwt::sign_hs256(&claims, &self.secret).map_err(|e| BridgeError::Signing(e.to_string()))
    }
}
