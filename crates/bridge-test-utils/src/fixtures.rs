//! Fixed test configuration and token helpers.

use bridge_service::config::{self, Config};
use bridge_service::tokens::access_token::JitsiClaims;
use bridge_service::tokens::trusted_facts::TrustedFactsClaims;
use common::jwt::{self, ClaimExpectations};
use common::secret::SecretString;
use std::collections::HashMap;

pub const TEST_BACKEND_NAME: &str = "test-bridge";
pub const TEST_BACKEND_SECRET: &str = "test-backend-secret";
pub const TEST_JITSI_NAME: &str = "test-jitsi";
pub const TEST_JITSI_SECRET: &str = "test-jitsi-secret";
pub const TEST_JITSI_DOMAIN: &str = "meet.test";

/// Policy of the `demo` room: the first name.
pub const DEMO_ROOM_POLICY: &str = r#"[[["irma-demo.MijnOverheid.fullName.firstname"]]]"#;

/// Policy of the `adults` room: first name plus either age attribute.
pub const ADULTS_ROOM_POLICY: &str = r#"[
    [["irma-demo.MijnOverheid.fullName.firstname"]],
    [["irma-demo.MijnOverheid.ageLimits.over18"], ["irma-demo.RU.studentCard.age"]]
]"#;

/// Options for a bridge talking to `irma_url`, with rooms `demo` and
/// `adults` and no default room.
pub fn test_vars(irma_url: &str) -> HashMap<String, String> {
    HashMap::from([
        (config::LISTEN_ADDRESS.to_string(), "127.0.0.1:0".to_string()),
        (config::IRMA_SERVER.to_string(), irma_url.to_string()),
        (
            config::ROOM_MAP.to_string(),
            format!(r#"{{"demo": {DEMO_ROOM_POLICY}, "adults": {ADULTS_ROOM_POLICY}}}"#),
        ),
        (config::BACKEND_NAME.to_string(), TEST_BACKEND_NAME.to_string()),
        (config::BACKEND_SECRET.to_string(), TEST_BACKEND_SECRET.to_string()),
        (config::JITSI_NAME.to_string(), TEST_JITSI_NAME.to_string()),
        (config::JITSI_SECRET.to_string(), TEST_JITSI_SECRET.to_string()),
        (config::JITSI_DOMAIN.to_string(), TEST_JITSI_DOMAIN.to_string()),
        (config::IRMA_TIMEOUT_SECONDS.to_string(), "2".to_string()),
        (config::IRMA_MAX_RETRIES.to_string(), "0".to_string()),
    ])
}

/// Test configuration, with `extra` options overriding the defaults.
pub fn test_config(irma_url: &str, extra: &[(&str, &str)]) -> Result<Config, anyhow::Error> {
    let mut vars = test_vars(irma_url);
    for (key, value) in extra {
        vars.insert((*key).to_string(), (*value).to_string());
    }
    Config::from_vars(&vars).map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))
}

/// Verify trusted facts with the test backend secret and return the claims.
pub fn decode_trusted_facts(token: &str) -> Result<TrustedFactsClaims, anyhow::Error> {
    let expect = ClaimExpectations::new().issuer(TEST_BACKEND_NAME);
    jwt::verify_hs256(token, &SecretString::from(TEST_BACKEND_SECRET), &expect)
        .map_err(|e| anyhow::anyhow!("Trusted facts did not verify: {:?}", e))
}

/// Verify a Jitsi access token the way the Jitsi token module would.
pub fn decode_access_token(token: &str) -> Result<JitsiClaims, anyhow::Error> {
    let expect = ClaimExpectations::new()
        .issuer(TEST_BACKEND_NAME)
        .audience(TEST_JITSI_NAME)
        .subject(TEST_JITSI_DOMAIN);
    jwt::verify_hs256(token, &SecretString::from(TEST_JITSI_SECRET), &expect)
        .map_err(|e| anyhow::anyhow!("Access token did not verify: {:?}", e))
}

/// Sign trusted facts for an arbitrary session, as a client could not.
pub fn forge_trusted_facts(session_token: &str, room: &str, secret: &str) -> String {
    let claims = TrustedFactsClaims {
        token: session_token.to_string(),
        room: room.to_string(),
        iss: TEST_BACKEND_NAME.to_string(),
        iat: jwt::unix_now(),
        exp: jwt::unix_now() + 900,
    };
    jwt::sign_hs256(&claims, &SecretString::from(secret)).expect("sign trusted facts")
}

/// Trusted facts that expired an hour ago, signed with the test backend secret.
pub fn forge_expired_trusted_facts(session_token: &str, room: &str) -> String {
    let issued = jwt::unix_now() - 7_200;
    let claims = TrustedFactsClaims {
        token: session_token.to_string(),
        room: room.to_string(),
        iss: TEST_BACKEND_NAME.to_string(),
        iat: issued,
        exp: issued + 3_600,
    };
    jwt::sign_hs256(&claims, &SecretString::from(TEST_BACKEND_SECRET)).expect("sign trusted facts")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_is_valid() {
        let config = test_config("http://127.0.0.1:1", &[]).unwrap();
        assert!(config.rooms.resolve("demo").is_ok());
        assert!(config.rooms.resolve("adults").is_ok());
        assert!(config.rooms.resolve("other").is_err());
    }

    #[test]
    fn test_forged_with_backend_secret_decodes() {
        let token = forge_trusted_facts("tok9", "demo", TEST_BACKEND_SECRET);
        let claims = decode_trusted_facts(&token).unwrap();
        assert_eq!(claims.token, "tok9");
        assert_eq!(claims.room, "demo");
    }
}
