use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::engine::{Command, EngineSnapshot, MatchSession, MatchSummary};
use crate::models::{MatchData, MatchId, SetScore, TeamNames};

/// One row of the completed-match list.
#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub id: MatchId,
    pub team_names: TeamNames,
    pub sets_won: SetScore,
    pub date: Option<NaiveDate>,
    pub location: String,
    pub created_at: DateTime<Utc>,
}

impl From<&MatchData> for HistoryEntry {
    fn from(data: &MatchData) -> Self {
        Self {
            id: data.id.clone(),
            team_names: data.team_names.clone(),
            sets_won: data.sets_won,
            date: data.date,
            location: data.location.clone(),
            created_at: data.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub matches: Vec<HistoryEntry>,
    pub count: usize,
}

pub async fn list_history(State(state): State<AppState>) -> Json<HistoryResponse> {
    let mut session = state.session.write().await;
    let matches: Vec<HistoryEntry> = session.history().iter().map(HistoryEntry::from).collect();
    let count = matches.len();

    Json(HistoryResponse { matches, count })
}

pub async fn get_completed(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MatchSummary>, ApiError> {
    let id = MatchId::from(id.as_str());
    let mut session = state.session.write().await;
    let data = session
        .completed(&id)
        .ok_or_else(|| ApiError::NotFound(format!("completed match {}", id)))?;

    Ok(Json(MatchSummary::build(&data)))
}

pub async fn delete_completed(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = MatchId::from(id.as_str());
    let mut session = state.session.write().await;
    let outcome = session.apply(Command::DeleteCompleted {
        match_id: id.clone(),
    });

    if outcome.is_ignored() {
        return Err(rejection(&mut session, &id));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn open_completed(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EngineSnapshot>, ApiError> {
    let id = MatchId::from(id.as_str());
    let mut session = state.session.write().await;
    let outcome = session.apply(Command::OpenCompleted {
        match_id: id.clone(),
    });

    if outcome.is_ignored() {
        return Err(rejection(&mut session, &id));
    }
    Ok(Json(EngineSnapshot::capture(session.engine())))
}

/// Why a history command was ignored: the match is unknown, or a match is
/// being played.
fn rejection(session: &mut MatchSession, id: &MatchId) -> ApiError {
    if session.completed(id).is_none() {
        ApiError::NotFound(format!("completed match {}", id))
    } else {
        ApiError::Conflict("a match is in progress".to_string())
    }
}

#[cfg(test)]
mod tests {
    use crate::api::build_router;
    use crate::api::state::AppState;
    use crate::engine::{Command, MatchSession};
    use crate::models::{MatchRules, MatchSetup, Team};
    use crate::storage::MatchRepository;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::util::ServiceExt;

    /// State with one saved match, returning to the start screen.
    fn setup_test_state() -> (AppState, String) {
        let mut session = MatchSession::new(MatchRules::default(), MatchRepository::in_memory());
        session.apply(Command::StartMatch(MatchSetup::new("Home", "Away")));
        session.apply(Command::SelectFirstServer { team: Team::Own });
        session.apply(Command::EndMatch);
        session.apply(Command::SaveMatch);
        let id = session.engine().data().unwrap().id.to_string();
        session.apply(Command::StartNewMatch);

        (AppState::new(session, "*"), id)
    }

    async fn request(app: axum::Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_list_history() {
        let (state, id) = setup_test_state();
        let (status, json) = request(build_router(state), "GET", "/api/history").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["count"], 1);
        assert_eq!(json["matches"][0]["id"], id);
        assert_eq!(json["matches"][0]["team_names"]["own"], "Home");
    }

    #[tokio::test]
    async fn test_get_completed() {
        let (state, id) = setup_test_state();
        let (status, json) = request(
            build_router(state.clone()),
            "GET",
            &format!("/api/history/{}", id),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["match"]["is_match_over"], true);

        let (status, _) = request(build_router(state), "GET", "/api/history/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_open_completed() {
        let (state, id) = setup_test_state();
        let (status, json) = request(
            build_router(state),
            "POST",
            &format!("/api/history/{}/open", id),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["view"], "report");
        assert_eq!(json["is_saved"], true);
    }

    #[tokio::test]
    async fn test_delete_completed() {
        let (state, id) = setup_test_state();
        let uri = format!("/api/history/{}", id);

        let (status, _) = request(build_router(state.clone()), "DELETE", &uri).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, json) = request(build_router(state), "DELETE", &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_history_blocked_during_play() {
        let (state, id) = setup_test_state();
        {
            let mut session = state.session.write().await;
            session.apply(Command::StartMatch(MatchSetup::new("Next", "Team")));
        }

        let (status, json) = request(
            build_router(state),
            "DELETE",
            &format!("/api/history/{}", id),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"]["code"], "CONFLICT");
    }
}
