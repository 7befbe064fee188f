//! End-to-end flow: start a session, then exchange the disclosure for an
//! access token, over real HTTP.

use bridge_test_utils::{
    decode_access_token, decode_trusted_facts, MockIrmaServer, TestBridgeServer,
    TEST_BACKEND_NAME, TEST_JITSI_DOMAIN, TEST_JITSI_NAME,
};

#[tokio::test]
async fn test_session_then_disclose() -> Result<(), anyhow::Error> {
    let irma = MockIrmaServer::start().await;
    irma.mount_session("tok1").await;
    irma.mount_done("tok1", &["Bob"]).await;

    let server = TestBridgeServer::spawn(&irma.uri()).await?;
    let client = reqwest::Client::new();

    // Step 1: the frontend asks for a session for room "demo"
    let session: serde_json::Value = client
        .get(format!("{}/session", server.url()))
        .query(&[("room", "demo")])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let trusted_facts = session["trustedFacts"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("trustedFacts missing"))?
        .to_string();

    let facts = decode_trusted_facts(&trusted_facts)?;
    assert_eq!(facts.token, "tok1");
    assert_eq!(facts.room, "demo");

    // Step 2: after the user disclosed, the frontend posts the trusted facts back
    let response = client
        .post(format!("{}/disclose", server.url()))
        .form(&[("trustedFacts", trusted_facts.as_str())])
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["name"], "Bob");
    assert_eq!(body["room"], "demo");

    let claims = decode_access_token(body["jwt"].as_str().unwrap_or_default())?;
    assert_eq!(claims.room, "demo");
    assert_eq!(claims.context.user.name, "Bob");
    assert_eq!(claims.context.user.email, "");
    assert_eq!(claims.context.group, "");
    assert_eq!(claims.iss, TEST_BACKEND_NAME);
    assert_eq!(claims.aud, TEST_JITSI_NAME);
    assert_eq!(claims.sub, TEST_JITSI_DOMAIN);
    assert_eq!(claims.exp - claims.iat, 3600);

    assert_eq!(irma.requests_to("/session").await, 1);
    assert_eq!(irma.requests_to("/session/tok1/result").await, 1);

    Ok(())
}

#[tokio::test]
async fn test_trusted_facts_can_be_redeemed_again() -> Result<(), anyhow::Error> {
    let irma = MockIrmaServer::start().await;
    irma.mount_session("tok2").await;
    irma.mount_done("tok2", &["Alice", "30"]).await;

    let server = TestBridgeServer::spawn(&irma.uri()).await?;
    let client = reqwest::Client::new();

    let session: serde_json::Value = client
        .get(format!("{}/session?room=adults", server.url()))
        .send()
        .await?
        .json()
        .await?;
    let trusted_facts = session["trustedFacts"].as_str().unwrap_or_default().to_string();

    for _ in 0..2 {
        let body: serde_json::Value = client
            .post(format!("{}/disclose", server.url()))
            .form(&[("trustedFacts", trusted_facts.as_str())])
            .send()
            .await?
            .json()
            .await?;
        assert_eq!(body["name"], "Alice 30");
        assert_eq!(body["room"], "adults");
    }

    Ok(())
}

#[tokio::test]
async fn test_expired_trusted_facts_are_rejected() -> Result<(), anyhow::Error> {
    let irma = MockIrmaServer::start().await;
    irma.mount_session("tok3").await;
    irma.mount_done("tok3", &["Bob"]).await;

    // Verification allows 30s of leeway, so expiry is exercised with facts issued in the past
    let server =
        TestBridgeServer::spawn_with(&irma.uri(), &[("trusted-facts-ttl-seconds", "1")]).await?;
    let client = reqwest::Client::new();

    let session: serde_json::Value = client
        .get(format!("{}/session?room=demo", server.url()))
        .send()
        .await?
        .json()
        .await?;
    let trusted_facts = session["trustedFacts"].as_str().unwrap_or_default();
    let claims = decode_trusted_facts(trusted_facts)?;
    assert_eq!(claims.exp - claims.iat, 1);

    let stale = bridge_test_utils::forge_expired_trusted_facts("tok3", "demo");
    let response = client
        .post(format!("{}/disclose", server.url()))
        .form(&[("trustedFacts", stale.as_str())])
        .send()
        .await?;

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "INVALID_TRUSTED_FACTS");

    Ok(())
}
