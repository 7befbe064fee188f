//! `POST /disclose`: exchange a finished disclosure for a Jitsi access token.

use crate::errors::BridgeError;
use crate::models::{DiscloseParams, DiscloseResponse};
use crate::observability::metrics::record_disclosure;
use crate::routes::AppState;
use axum::extract::{Query, State};
use axum::{Form, Json};
use std::sync::Arc;
use tracing::{info, instrument};

/// Handler for POST /disclose
///
/// `trustedFacts` is read from an urlencoded body or, failing that, from the
/// query string. The IRMA session it names must be DONE with a valid proof.
///
/// ## Response
///
/// ```json
/// {"name": "Alice 30", "room": "demo", "jwt": "eyJ..."}
/// ```
///
/// ## Errors
///
/// - 400 if trusted facts are missing or do not verify
/// - 403 if the IRMA server rejected the proof
/// - 425 while the session is still in progress, 410 once it was cancelled or timed out
/// - 500 if the IRMA server fails or signing fails
#[instrument(skip_all, name = "bridge.disclose")]
pub async fn disclose(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DiscloseParams>,
    form: Option<Form<DiscloseParams>>,
) -> Result<Json<DiscloseResponse>, BridgeError> {
    let presented = form
        .and_then(|Form(params)| non_empty(params.trusted_facts))
        .or_else(|| non_empty(query.trusted_facts));

    let result = match presented {
        Some(trusted_facts) => exchange(&state, &trusted_facts).await,
        None => Err(BridgeError::MissingTrustedFacts),
    };

    match &result {
        Ok(_) => record_disclosure("success"),
        Err(e) => record_disclosure(e.metric_label()),
    }

    result.map(Json)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

async fn exchange(state: &AppState, trusted_facts: &str) -> Result<DiscloseResponse, BridgeError> {
    let facts = state.trusted_facts.verify(trusted_facts)?;
    let identity = state.irma.fetch_result(&facts.session_token).await?;
    let name = identity.display_name();
    let jwt = state.access_tokens.issue(&facts.room, &name)?;

    info!(
        target: "bridge.handlers.disclose",
        room = %facts.room,
        attributes = identity.values.len(),
        "Access token issued"
    );

    Ok(DiscloseResponse {
        name,
        room: facts.room,
        jwt,
    })
}
