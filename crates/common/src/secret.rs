//! Secret types for protecting signing keys from accidental logging.
//!
//! This module re-exports types from the [`secrecy`] crate. Both HMAC
//! secrets held by the bridge (the backend secret that signs trusted facts
//! and the Jitsi secret that signs access tokens) are stored as
//! [`SecretString`], so any struct deriving `Debug` around them prints
//! `[REDACTED]` instead of key material.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct Signer {
//!     issuer: String,
//!     secret: SecretString,
//! }
//!
//! let signer = Signer {
//!     issuer: "bridge".to_string(),
//!     secret: SecretString::from("hs256-key"),
//! };
//!
//! assert!(!format!("{signer:?}").contains("hs256-key"));
//! assert_eq!(signer.secret.expose_secret(), "hs256-key");
//! ```
//!
//! # Serde Integration
//!
//! With the `serde` feature enabled, secrets deserialize straight out of the
//! JSON configuration file:
//!
//! ```rust
//! use serde::Deserialize;
//! use common::secret::SecretString;
//!
//! #[derive(Debug, Deserialize)]
//! struct Secrets {
//!     #[serde(rename = "backend-secret")]
//!     backend_secret: SecretString,
//! }
//!
//! let parsed: Secrets = serde_json::from_str(r#"{"backend-secret": "k"}"#).unwrap();
//! assert!(format!("{parsed:?}").contains("REDACTED"));
//! ```

pub use secrecy::{ExposeSecret, SecretString};

/// Returns true if the secret is empty or consists only of whitespace.
///
/// An HS256 key like that would sign tokens anyone can forge, so
/// configuration loading treats it the same as a missing secret.
#[must_use]
pub fn is_blank(secret: &SecretString) -> bool {
    secret.expose_secret().trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretString::from("jitsi-shared-key");
        let debug_str = format!("{secret:?}");

        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("jitsi-shared-key"));
    }

    #[test]
    fn test_expose_secret_returns_inner_value() {
        let secret = SecretString::from("backend-key");
        assert_eq!(secret.expose_secret(), "backend-key");
    }

    #[test]
    fn test_deserialize_from_config_json() {
        #[allow(dead_code)]
        #[derive(Debug, Deserialize)]
        struct SigningConfig {
            #[serde(rename = "backend-name")]
            backend_name: String,
            #[serde(rename = "backend-secret")]
            backend_secret: SecretString,
        }

        let json = r#"{"backend-name": "bridge", "backend-secret": "my-secret-value"}"#;
        let config: SigningConfig = serde_json::from_str(json).expect("deserialize");

        assert_eq!(config.backend_secret.expose_secret(), "my-secret-value");

        let debug = format!("{config:?}");
        assert!(debug.contains("bridge"));
        assert!(!debug.contains("my-secret-value"));
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(&SecretString::from("")));
        assert!(is_blank(&SecretString::from("   \t")));
        assert!(!is_blank(&SecretString::from("k")));
    }

    #[test]
    fn test_clone_works() {
        let secret = SecretString::from("cloneable");
        let cloned = secret.clone();
        assert_eq!(cloned.expose_secret(), "cloneable");
    }
}
