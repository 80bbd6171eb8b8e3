//! Engine plus persistence.
//!
//! Persistence runs after each transition and never rolls it back: a failed
//! write is logged and the in-memory match carries on.

use tracing::{info, warn};

use crate::models::{MatchData, MatchId, MatchRules};
use crate::storage::{MatchRepository, StorageError};

use super::{Command, MatchEngine, Outcome, View};

#[derive(Debug)]
pub struct MatchSession {
    engine: MatchEngine,
    repo: MatchRepository,
    /// Last persistence failure, cleared by the next successful write
    last_error: Option<String>,
}

impl MatchSession {
    /// Session on the start screen.
    pub fn new(rules: MatchRules, repo: MatchRepository) -> Self {
        Self {
            engine: MatchEngine::new(rules),
            repo,
            last_error: None,
        }
    }

    /// Session resuming the last active match, if one can be loaded.
    pub fn open(rules: MatchRules, repo: MatchRepository) -> Self {
        let mut session = Self::new(rules, repo);

        let resumed = session
            .repo
            .last_active()
            .and_then(|id| match id {
                Some(id) => session.repo.load(&id),
                None => Ok(None),
            });

        match resumed {
            Ok(Some(data)) => {
                let saved = session.repo.is_completed(&data.id).unwrap_or_else(|e| {
                    warn!(error = %e, "Could not read completed index");
                    false
                });
                info!(match_id = %data.id, set = data.current_set, "Resuming match");
                session.engine = MatchEngine::resume(rules, data, saved);
            }
            Ok(None) => {}
            Err(e) => session.record_failure("resume", &e),
        }

        session
    }

    pub fn engine(&self) -> &MatchEngine {
        &self.engine
    }

    pub fn repository(&self) -> &MatchRepository {
        &self.repo
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn apply(&mut self, command: Command) -> Outcome {
        match command {
            Command::OpenCompleted { match_id } => self.open_completed(&match_id),
            Command::DeleteCompleted { match_id } => self.delete_completed(&match_id),
            Command::SaveMatch => {
                let outcome = self.engine.apply(Command::SaveMatch);
                if !outcome.is_ignored() {
                    self.persist_completed();
                }
                outcome
            }
            Command::StartNewMatch => {
                let outcome = self.engine.apply(Command::StartNewMatch);
                if !outcome.is_ignored() {
                    self.write("clear last active", |repo| repo.clear_last_active());
                }
                outcome
            }
            command => {
                let outcome = self.engine.apply(command);
                let finished = matches!(outcome, Outcome::MatchFinished { .. });
                let live = matches!(self.engine.view(), View::Serving | View::InProgress);
                if !outcome.is_ignored() && (live || finished) {
                    self.autosave();
                }
                outcome
            }
        }
    }

    /// Completed matches for the history view. Failures yield an empty list.
    pub fn history(&mut self) -> Vec<MatchData> {
        match self.repo.list_completed() {
            Ok(matches) => matches,
            Err(e) => {
                self.record_failure("list history", &e);
                Vec::new()
            }
        }
    }

    /// A completed match by id.
    pub fn completed(&mut self, id: &MatchId) -> Option<MatchData> {
        match self.repo.is_completed(id).and_then(|done| {
            if done {
                self.repo.load(id)
            } else {
                Ok(None)
            }
        }) {
            Ok(data) => data,
            Err(e) => {
                self.record_failure("load completed", &e);
                None
            }
        }
    }

    fn open_completed(&mut self, id: &MatchId) -> Outcome {
        if !self.is_browsing() {
            return Outcome::Ignored;
        }
        match self.completed(id) {
            Some(data) => {
                self.engine.open_completed(data);
                Outcome::Applied
            }
            None => Outcome::Ignored,
        }
    }

    fn delete_completed(&mut self, id: &MatchId) -> Outcome {
        if !self.is_browsing() {
            return Outcome::Ignored;
        }
        match self.repo.is_completed(id) {
            Ok(true) => {}
            Ok(false) => return Outcome::Ignored,
            Err(e) => {
                self.record_failure("delete completed", &e);
                return Outcome::Ignored;
            }
        }

        self.write("delete completed", |repo| repo.delete_completed(id));
        if self.engine.forget(id) {
            self.write("clear last active", |repo| repo.clear_last_active());
        }
        Outcome::Applied
    }

    /// Completed matches can be opened or deleted only while no match is
    /// being played.
    fn is_browsing(&self) -> bool {
        matches!(self.engine.view(), View::Start | View::History | View::Report)
    }

    fn autosave(&mut self) {
        let Some(data) = self.engine.data().cloned() else {
            return;
        };
        self.write("autosave", |repo| {
            repo.save(&data)?;
            repo.set_last_active(&data.id)
        });
    }

    fn persist_completed(&mut self) {
        let Some(data) = self.engine.data().cloned() else {
            return;
        };
        self.write("save completed", |repo| {
            repo.save_completed(&data)?;
            repo.clear_last_active()
        });
    }

    fn write(
        &mut self,
        action: &str,
        op: impl FnOnce(&MatchRepository) -> Result<(), StorageError>,
    ) {
        match op(&self.repo) {
            Ok(()) => self.last_error = None,
            Err(e) => self.record_failure(action, &e),
        }
    }

    fn record_failure(&mut self, action: &str, error: &StorageError) {
        warn!(action, error = %error, "Persistence failed");
        self.last_error = Some(format!("{action}: {error}"));
    }
}
