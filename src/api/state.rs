use std::sync::Arc;

use crate::engine::MatchSession;

#[derive(Clone)]
pub struct AppState {
    /// Single live session; commands are applied one at a time
    pub session: Arc<tokio::sync::RwLock<MatchSession>>,
    pub cors_origin: String,
}

impl AppState {
    pub fn new(session: MatchSession, cors_origin: impl Into<String>) -> Self {
        Self {
            session: Arc::new(tokio::sync::RwLock::new(session)),
            cors_origin: cors_origin.into(),
        }
    }
}
