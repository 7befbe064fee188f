//! Data models for the disclosure bridge.
//!
//! Two groups of types live here:
//! - IRMA wire types (condiscon policies, session package, session result)
//! - Bridge API types (query/form parameters and JSON responses)

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// IRMA: disclosure policies
// ============================================================================

/// JSON-LD context of an IRMA disclosure request.
pub const DISCLOSURE_CONTEXT: &str = "https://irma.app/ld/request/disclosure/v2";

/// A single requested attribute inside an inner conjunction.
///
/// IRMA accepts either a bare attribute type identifier or an object that
/// additionally pins the value or demands a non-null value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeRequest {
    /// Bare attribute type, e.g. `irma-demo.MijnOverheid.fullName.firstname`.
    Type(String),

    /// Attribute type with optional constraints.
    Detailed {
        #[serde(rename = "type")]
        attribute_type: String,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,

        #[serde(rename = "notNull", default, skip_serializing_if = "is_false")]
        not_null: bool,
    },
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if passes a reference
fn is_false(value: &bool) -> bool {
    !*value
}

/// Attributes that must all be disclosed together.
pub type AttributeCon = Vec<AttributeRequest>;

/// Alternatives; the user picks exactly one inner conjunction.
pub type AttributeDisCon = Vec<AttributeCon>;

/// A room policy: every disjunction must be satisfied.
pub type AttributeConDisCon = Vec<AttributeDisCon>;

/// Disclosure session request sent to `POST <irma-server>/session`.
#[derive(Debug, Clone, Serialize)]
pub struct DisclosureRequest<'a> {
    #[serde(rename = "@context")]
    pub context: &'static str,

    pub disclose: &'a AttributeConDisCon,
}

impl<'a> DisclosureRequest<'a> {
    pub fn new(disclose: &'a AttributeConDisCon) -> Self {
        Self {
            context: DISCLOSURE_CONTEXT,
            disclose,
        }
    }
}

// ============================================================================
// IRMA: session package
// ============================================================================

/// Session pointer handed to the user's IRMA app (usually as a QR code).
///
/// Fields the bridge does not know about are kept so that the pointer
/// reaches the client exactly as the IRMA server produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPointer {
    /// URL the IRMA app connects to.
    pub u: String,

    /// Session type, `disclosing` for the bridge.
    pub irmaqr: String,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Response of the IRMA server to a new session request.
#[derive(Clone, Deserialize)]
pub struct SessionPackage {
    /// Requestor token used to fetch the session result later.
    pub token: String,

    #[serde(rename = "sessionPtr")]
    pub session_ptr: SessionPointer,
}

/// The requestor token lets anyone read the disclosed attributes, so it is
/// kept out of Debug output.
impl fmt::Debug for SessionPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionPackage")
            .field("token", &"[REDACTED]")
            .field("session_ptr", &self.session_ptr)
            .finish()
    }
}

// ============================================================================
// IRMA: session result
// ============================================================================

/// Session status as reported by the IRMA server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Initialized,
    Pairing,
    Connected,
    Cancelled,
    Done,
    Timeout,
    #[serde(other)]
    Unknown,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Initialized => "INITIALIZED",
            SessionStatus::Pairing => "PAIRING",
            SessionStatus::Connected => "CONNECTED",
            SessionStatus::Cancelled => "CANCELLED",
            SessionStatus::Done => "DONE",
            SessionStatus::Timeout => "TIMEOUT",
            SessionStatus::Unknown => "UNKNOWN",
        }
    }

    /// True once the session can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Cancelled | SessionStatus::Done | SessionStatus::Timeout
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict of the IRMA server on the disclosure proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProofStatus {
    Valid,
    Invalid,
    InvalidTimestamp,
    UnmatchedRequest,
    MissingAttributes,
    Expired,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ProofStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProofStatus::Valid => "VALID",
            ProofStatus::Invalid => "INVALID",
            ProofStatus::InvalidTimestamp => "INVALID_TIMESTAMP",
            ProofStatus::UnmatchedRequest => "UNMATCHED_REQUEST",
            ProofStatus::MissingAttributes => "MISSING_ATTRIBUTES",
            ProofStatus::Expired => "EXPIRED",
            ProofStatus::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// One attribute released by the user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DisclosedAttribute {
    /// Attribute type identifier.
    #[serde(default)]
    pub id: String,

    /// Raw attribute value; `null` for optional attributes left empty.
    #[serde(rename = "rawvalue", default)]
    pub raw_value: Option<String>,
}

/// Result of `GET <irma-server>/session/<token>/result`.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionResult {
    pub status: SessionStatus,

    #[serde(rename = "proofStatus", default)]
    pub proof_status: Option<ProofStatus>,

    /// One inner list per disjunction, holding the conjunction the user chose.
    #[serde(default)]
    pub disclosed: Vec<Vec<DisclosedAttribute>>,
}

/// Attribute values released in a finished session, in disclosure order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisclosedIdentity {
    pub values: Vec<String>,
}

impl DisclosedIdentity {
    /// Collect raw values across all chosen conjunctions, skipping nulls.
    pub fn from_disclosed(disclosed: &[Vec<DisclosedAttribute>]) -> Self {
        let values = disclosed
            .iter()
            .flatten()
            .filter_map(|attr| attr.raw_value.clone())
            .collect();
        Self { values }
    }

    /// Nickname used in the Jitsi room: all values separated by spaces.
    pub fn display_name(&self) -> String {
        self.values.join(" ")
    }
}

// ============================================================================
// Bridge API
// ============================================================================

/// Query parameters of `GET /session`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionParams {
    #[serde(default)]
    pub room: String,
}

/// Response of `GET /session`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    #[serde(rename = "sessionPtr")]
    pub session_ptr: SessionPointer,

    #[serde(rename = "trustedFacts")]
    pub trusted_facts: String,
}

/// Query or form parameters of `POST /disclose`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscloseParams {
    #[serde(rename = "trustedFacts", default)]
    pub trusted_facts: Option<String>,
}

/// Response of `POST /disclose`: everything needed to enter the Jitsi room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscloseResponse {
    pub name: String,
    pub room: String,
    pub jwt: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_condiscon_accepts_bare_and_detailed_attributes() {
        let policy: AttributeConDisCon = serde_json::from_value(json!([
            [
                ["irma-demo.MijnOverheid.fullName.firstname"],
                [{"type": "irma-demo.RU.studentCard.studentID", "notNull": true}]
            ],
            [
                [{"type": "irma-demo.MijnOverheid.ageLimits.over18", "value": "yes"}]
            ]
        ]))
        .unwrap();

        assert_eq!(policy.len(), 2);
        assert_eq!(
            policy[0][0][0],
            AttributeRequest::Type("irma-demo.MijnOverheid.fullName.firstname".to_string())
        );
        assert_eq!(
            policy[0][1][0],
            AttributeRequest::Detailed {
                attribute_type: "irma-demo.RU.studentCard.studentID".to_string(),
                value: None,
                not_null: true,
            }
        );
        assert_eq!(
            policy[1][0][0],
            AttributeRequest::Detailed {
                attribute_type: "irma-demo.MijnOverheid.ageLimits.over18".to_string(),
                value: Some("yes".to_string()),
                not_null: false,
            }
        );
    }

    #[test]
    fn test_disclosure_request_envelope() {
        let policy: AttributeConDisCon = vec![vec![vec![
            AttributeRequest::Type("irma-demo.MijnOverheid.fullName.firstname".to_string()),
            AttributeRequest::Detailed {
                attribute_type: "irma-demo.MijnOverheid.fullName.familyname".to_string(),
                value: None,
                not_null: false,
            },
        ]]];

        let json = serde_json::to_value(DisclosureRequest::new(&policy)).unwrap();

        assert_eq!(
            json,
            json!({
                "@context": "https://irma.app/ld/request/disclosure/v2",
                "disclose": [[[
                    "irma-demo.MijnOverheid.fullName.firstname",
                    {"type": "irma-demo.MijnOverheid.fullName.familyname"}
                ]]]
            })
        );
    }

    #[test]
    fn test_session_package_keeps_unknown_pointer_fields() {
        let package: SessionPackage = serde_json::from_value(json!({
            "token": "KzxuWKwL5KGLKr4uerws",
            "sessionPtr": {"u": "https://irma.example/irma/session/abc", "irmaqr": "disclosing", "v": "2"},
            "frontendRequest": {"authorization": "ignored"}
        }))
        .unwrap();

        assert_eq!(package.token, "KzxuWKwL5KGLKr4uerws");
        assert_eq!(package.session_ptr.irmaqr, "disclosing");

        let pointer = serde_json::to_value(&package.session_ptr).unwrap();
        assert_eq!(pointer["v"], "2");
        assert_eq!(pointer["u"], "https://irma.example/irma/session/abc");
    }

    #[test]
    fn test_session_package_debug_redacts_token() {
        let package: SessionPackage = serde_json::from_value(json!({
            "token": "secret-requestor-token",
            "sessionPtr": {"u": "https://irma.example/s", "irmaqr": "disclosing"}
        }))
        .unwrap();

        let debug = format!("{package:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("secret-requestor-token"));
    }

    #[test]
    fn test_session_result_parsing() {
        let result: SessionResult = serde_json::from_value(json!({
            "token": "tok1",
            "status": "DONE",
            "type": "disclosing",
            "proofStatus": "VALID",
            "disclosed": [[
                {"id": "irma-demo.MijnOverheid.fullName.firstname", "rawvalue": "Bob", "status": "PRESENT"}
            ]]
        }))
        .unwrap();

        assert_eq!(result.status, SessionStatus::Done);
        assert_eq!(result.proof_status, Some(ProofStatus::Valid));
        assert_eq!(result.disclosed[0][0].raw_value.as_deref(), Some("Bob"));
    }

    #[test]
    fn test_session_result_pending_without_disclosure() {
        let result: SessionResult =
            serde_json::from_value(json!({"status": "CONNECTED"})).unwrap();

        assert_eq!(result.status, SessionStatus::Connected);
        assert!(result.proof_status.is_none());
        assert!(result.disclosed.is_empty());
    }

    #[test]
    fn test_unrecognized_status_maps_to_unknown() {
        let result: SessionResult = serde_json::from_value(json!({"status": "SOMETHING_NEW"})).unwrap();
        assert_eq!(result.status, SessionStatus::Unknown);
        assert!(!result.status.is_terminal());
    }

    #[test]
    fn test_status_terminality() {
        assert!(SessionStatus::Done.is_terminal());
        assert!(SessionStatus::Cancelled.is_terminal());
        assert!(SessionStatus::Timeout.is_terminal());
        assert!(!SessionStatus::Initialized.is_terminal());
        assert!(!SessionStatus::Pairing.is_terminal());
        assert!(!SessionStatus::Connected.is_terminal());
    }

    #[test]
    fn test_display_name_joins_values_in_order() {
        let identity = DisclosedIdentity {
            values: vec!["Alice".to_string(), "30".to_string()],
        };
        assert_eq!(identity.display_name(), "Alice 30");
    }

    #[test]
    fn test_display_name_empty_disclosure() {
        let identity = DisclosedIdentity::from_disclosed(&[]);
        assert_eq!(identity.display_name(), "");
    }

    #[test]
    fn test_identity_flattens_conjunctions_and_skips_null() {
        let disclosed: Vec<Vec<DisclosedAttribute>> = serde_json::from_value(json!([
            [
                {"id": "a.b.c.first", "rawvalue": "Alice"},
                {"id": "a.b.c.middle", "rawvalue": null}
            ],
            [
                {"id": "a.b.c.age", "rawvalue": "30"}
            ]
        ]))
        .unwrap();

        let identity = DisclosedIdentity::from_disclosed(&disclosed);
        assert_eq!(identity.values, vec!["Alice", "30"]);
        assert_eq!(identity.display_name(), "Alice 30");
    }

    #[test]
    fn test_api_field_names() {
        let response = DiscloseResponse {
            name: "Bob".to_string(),
            room: "demo".to_string(),
            jwt: "eyJ...".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json, json!({"name": "Bob", "room": "demo", "jwt": "eyJ..."}));

        let params: DiscloseParams = serde_json::from_value(json!({"trustedFacts": "abc"})).unwrap();
        assert_eq!(params.trusted_facts.as_deref(), Some("abc"));
    }
}
