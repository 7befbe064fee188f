//! `GET /session`: start a disclosure session for a room.

use crate::errors::BridgeError;
use crate::models::{SessionParams, SessionResponse};
use crate::observability::metrics::record_session_started;
use crate::routes::AppState;
use axum::extract::{Query, State};
use axum::Json;
use std::sync::Arc;
use tracing::{info, instrument};

/// Handler for GET /session?room=<name>
///
/// Resolves the room's policy, starts an IRMA disclosure session for it,
/// and returns the session pointer with trusted facts binding the session
/// to the room.
///
/// ## Errors
///
/// - 400 `UNKNOWN_ROOM` if the room has no policy and there is no default
/// - 500 if the IRMA server fails or signing fails
#[instrument(skip_all, name = "bridge.session.start", fields(room = %params.room))]
pub async fn start_session(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SessionParams>,
) -> Result<Json<SessionResponse>, BridgeError> {
    let result = start(&state, &params.room).await;

    match &result {
        Ok(_) => record_session_started("success"),
        Err(e) => record_session_started(e.metric_label()),
    }

    result.map(Json)
}

async fn start(state: &AppState, room: &str) -> Result<SessionResponse, BridgeError> {
    let policy = state.config.rooms.resolve(room)?;
    let package = state.irma.start_session(policy).await?;
    let trusted_facts = state.trusted_facts.issue(&package.token, room)?;

    info!(target: "bridge.handlers.session", room = %room, "Disclosure session started");

    Ok(SessionResponse {
        session_ptr: package.session_ptr,
        trusted_facts,
    })
}
