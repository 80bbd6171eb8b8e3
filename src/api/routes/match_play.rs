use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::engine::{Command, EngineSnapshot, MatchSummary, Outcome};

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub outcome: Outcome,
    pub snapshot: EngineSnapshot,

    /// Set when persisting the transition failed; the transition still stands
    pub persistence_error: Option<String>,
}

pub async fn get_match(State(state): State<AppState>) -> Json<EngineSnapshot> {
    let session = state.session.read().await;
    Json(EngineSnapshot::capture(session.engine()))
}

pub async fn apply_command(
    State(state): State<AppState>,
    payload: Result<Json<Command>, JsonRejection>,
) -> Result<Json<CommandResponse>, ApiError> {
    let Json(command) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let mut session = state.session.write().await;
    let outcome = session.apply(command);

    Ok(Json(CommandResponse {
        outcome,
        snapshot: EngineSnapshot::capture(session.engine()),
        persistence_error: session.last_error().map(str::to_string),
    }))
}

pub async fn get_report(State(state): State<AppState>) -> Result<Json<MatchSummary>, ApiError> {
    let session = state.session.read().await;
    let data = session
        .engine()
        .data()
        .ok_or_else(|| ApiError::NotFound("no active match".to_string()))?;

    Ok(Json(MatchSummary::build(data)))
}
