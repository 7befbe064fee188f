//! Mock IRMA server for tests.
//!
//! Wraps a wiremock `MockServer` and mounts the two requestor API
//! endpoints the bridge uses.

use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Session pointer URL handed out by the mock.
pub const MOCK_SESSION_URL: &str = "https://irma.test/irma/session/mock-qr";

/// wiremock based stand-in for an IRMA server.
pub struct MockIrmaServer {
    server: MockServer,
}

impl MockIrmaServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL to configure as `irma-server`.
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// The underlying wiremock server, for custom mocks and request inspection.
    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// `POST /session` answers with a session package for `token`.
    pub async fn mount_session(&self, token: &str) {
        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": token,
                "sessionPtr": {"u": MOCK_SESSION_URL, "irmaqr": "disclosing"}
            })))
            .mount(&self.server)
            .await;
    }

    /// `POST /session` answers only after `delay`, standing in for a hung server.
    pub async fn mount_session_delayed(&self, token: &str, delay: Duration) {
        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({
                        "token": token,
                        "sessionPtr": {"u": MOCK_SESSION_URL, "irmaqr": "disclosing"}
                    }))
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    /// `POST /session` answers with `status` and no body.
    pub async fn mount_session_failure(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// `GET /session/{token}/result` answers with a finished, valid session
    /// disclosing `values` as one conjunction.
    pub async fn mount_done(&self, token: &str, values: &[&str]) {
        let attributes: Vec<Value> = values
            .iter()
            .map(|v| json!({"id": "irma-demo.MijnOverheid.fullName.firstname", "rawvalue": v, "status": "PRESENT"}))
            .collect();

        self.mount_result(
            token,
            json!({
                "token": token,
                "status": "DONE",
                "type": "disclosing",
                "proofStatus": "VALID",
                "disclosed": [attributes]
            }),
        )
        .await;
    }

    /// `GET /session/{token}/result` answers with `status` and nothing disclosed.
    pub async fn mount_status(&self, token: &str, status: &str) {
        self.mount_result(token, json!({"token": token, "status": status}))
            .await;
    }

    /// `GET /session/{token}/result` answers with an arbitrary result body.
    pub async fn mount_result(&self, token: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/session/{token}/result")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// `GET /session/{token}/result` answers with `status` and no body.
    pub async fn mount_result_failure(&self, token: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!("/session/{token}/result")))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Number of requests received for `path`.
    pub async fn requests_to(&self, request_path: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == request_path)
            .count()
    }
}
