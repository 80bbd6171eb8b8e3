//! Match state machine.
//!
//! [`MatchEngine`] owns the single live [`MatchData`] and moves it between
//! views in response to [`Command`]s. Every guarded command is a no-op when
//! its precondition fails; the caller sees [`Outcome::Ignored`] and nothing
//! changes. Score, server and endability are derived from the point log on
//! every read.

mod command;
mod session;
mod summary;

pub use command::*;
pub use session::*;
pub use summary::*;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::calculate::{
    allowed_categories, can_end_set, is_decider_set, is_match_won, report_for_log, set_target,
};
use crate::models::{
    MatchData, MatchId, MatchRules, MatchSetup, PointCategory, PointType, Rotation, SetScore,
    Team,
};
use crate::tracker;

/// Screen the match flow is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Start,
    /// Waiting for the first server of the current set
    Serving,
    InProgress,
    Report,
    History,
}

#[derive(Debug, Clone)]
pub struct MatchEngine {
    rules: MatchRules,
    data: Option<MatchData>,
    view: View,
    /// View to go back to when history browsing is closed
    history_return: View,
    /// Endability after the previous transition
    was_endable: bool,
    is_saved: bool,
}

impl MatchEngine {
    /// Engine on the start screen with no match.
    pub fn new(rules: MatchRules) -> Self {
        Self {
            rules,
            data: None,
            view: View::Start,
            history_return: View::Start,
            was_endable: false,
            is_saved: false,
        }
    }

    /// Re-enter the flow for a stored match.
    pub fn resume(rules: MatchRules, data: MatchData, is_saved: bool) -> Self {
        let view = if data.is_match_over {
            View::Report
        } else if data.first_server(data.current_set).is_some() {
            View::InProgress
        } else {
            View::Serving
        };

        let mut engine = Self {
            rules,
            data: Some(data),
            view,
            history_return: View::Start,
            was_endable: false,
            is_saved,
        };
        engine.was_endable = engine.can_end_set();
        engine
    }

    pub fn rules(&self) -> &MatchRules {
        &self.rules
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn data(&self) -> Option<&MatchData> {
        self.data.as_ref()
    }

    pub fn is_saved(&self) -> bool {
        self.is_saved
    }

    /// Score of the set being played.
    pub fn score(&self) -> SetScore {
        self.data
            .as_ref()
            .map(|d| d.current_set_log.score())
            .unwrap_or_default()
    }

    pub fn serving_team(&self) -> Option<Team> {
        self.data.as_ref().and_then(tracker::current_server)
    }

    pub fn set_target(&self) -> u32 {
        let sets_won = self.data.as_ref().map(|d| d.sets_won).unwrap_or_default();
        set_target(&self.rules, &sets_won)
    }

    pub fn is_decider_set(&self) -> bool {
        self.data
            .as_ref()
            .is_some_and(|d| is_decider_set(&self.rules, &d.sets_won))
    }

    pub fn can_end_set(&self) -> bool {
        self.data.as_ref().is_some_and(|d| {
            !d.is_match_over && can_end_set(&self.rules, &d.current_set_log.score(), &d.sets_won)
        })
    }

    pub fn can_reset_set(&self) -> bool {
        self.view == View::InProgress
            && self
                .data
                .as_ref()
                .is_some_and(|d| !d.current_set_log.is_empty())
    }

    /// Categories the collaborator may offer for `point_type` right now.
    pub fn allowed_categories(&self, point_type: PointType) -> Vec<PointCategory> {
        allowed_categories(point_type, self.serving_team())
    }

    /// Prompt for the current set while it is endable.
    pub fn end_set_prompt(&self) -> Option<EndSetPrompt> {
        if self.view != View::InProgress || !self.can_end_set() {
            return None;
        }
        let data = self.data.as_ref()?;
        let score = data.current_set_log.score();
        let winner = score.leader()?;

        let mut sets_after = data.sets_won;
        *sets_after.get_mut(winner) += 1;

        Some(EndSetPrompt {
            set_number: data.current_set,
            winner,
            score,
            ends_match: is_match_won(&self.rules, &sets_after),
        })
    }

    /// Replace the live match with a completed one for review.
    pub fn open_completed(&mut self, data: MatchData) {
        debug!(match_id = %data.id, "Opening completed match");
        self.data = Some(data);
        self.view = View::Report;
        self.history_return = View::Start;
        self.was_endable = false;
        self.is_saved = true;
    }

    /// Forget the live match if it is `match_id` (it was deleted).
    pub fn forget(&mut self, match_id: &MatchId) -> bool {
        if self.data.as_ref().is_some_and(|d| &d.id == match_id) {
            self.discard();
            true
        } else {
            false
        }
    }

    pub fn apply(&mut self, command: Command) -> Outcome {
        let name = command.name();
        let outcome = match command {
            Command::StartMatch(setup) => self.start_match(setup),
            Command::SelectFirstServer { team } => self.select_first_server(team),
            Command::AddPoint {
                point_type,
                category,
            } => self.add_point(point_type, category),
            Command::Undo => self.undo(),
            Command::ResetSet => self.reset_set(),
            Command::ConfirmEndSet => self.confirm_end_set(),
            Command::CancelEndSet => self.cancel_end_set(),
            Command::OverrideRotation { team, rotation } => self.override_rotation(team, rotation),
            Command::RenameTeam { team, name } => self.rename_team(team, name),
            Command::RecolorTeam { team, color } => self.recolor_team(team, color),
            Command::EndMatch => self.end_match(),
            Command::SaveMatch => self.save_match(),
            Command::StartNewMatch => self.start_new_match(),
            Command::ViewHistory => self.view_history(),
            Command::CloseHistory => self.close_history(),
            // Need the repository; handled by the session
            Command::OpenCompleted { .. } | Command::DeleteCompleted { .. } => Outcome::Ignored,
        };

        debug!(command = name, view = ?self.view, outcome = ?outcome, "Command applied");
        outcome
    }

    fn start_match(&mut self, setup: MatchSetup) -> Outcome {
        if self.view != View::Start {
            return Outcome::Ignored;
        }

        let data = MatchData::new(setup);
        info!(
            match_id = %data.id,
            own = %data.team_names.own,
            rival = %data.team_names.rival,
            "Match started"
        );

        self.data = Some(data);
        self.view = View::Serving;
        self.was_endable = false;
        self.is_saved = false;
        Outcome::Applied
    }

    fn select_first_server(&mut self, team: Team) -> Outcome {
        if self.view != View::Serving {
            return Outcome::Ignored;
        }
        let Some(data) = self.data.as_mut() else {
            return Outcome::Ignored;
        };

        let set = data.current_set;
        data.set_first_server(set, team);
        if !data.has_starting_rotation(set) {
            data.set_starting_rotation(set, data.current_rotation);
        }
        data.current_rotation = data.starting_rotation(set);

        debug!(set, server = %team, "First server selected");
        self.view = View::InProgress;
        self.was_endable = false;
        Outcome::Applied
    }

    fn add_point(&mut self, point_type: PointType, category: PointCategory) -> Outcome {
        if self.view != View::InProgress {
            return Outcome::Ignored;
        }
        if !self.allowed_categories(point_type).contains(&category) {
            debug!(point = point_type.code(), category = category.code(), "Category not allowed");
            return Outcome::Ignored;
        }
        let Some(data) = self.data.as_mut() else {
            return Outcome::Ignored;
        };

        match tracker::record_point(data, point_type, category) {
            Some(_) => self.check_end_set(),
            None => Outcome::Ignored,
        }
    }

    fn undo(&mut self) -> Outcome {
        if self.view != View::InProgress {
            return Outcome::Ignored;
        }
        let Some(data) = self.data.as_mut() else {
            return Outcome::Ignored;
        };
        if data.is_match_over {
            return Outcome::Ignored;
        }

        match tracker::undo_last_point(data) {
            Some(_) => self.check_end_set(),
            None => Outcome::Ignored,
        }
    }

    fn reset_set(&mut self) -> Outcome {
        if self.view != View::InProgress {
            return Outcome::Ignored;
        }
        let Some(data) = self.data.as_mut() else {
            return Outcome::Ignored;
        };

        if tracker::reset_current_set(data) {
            self.check_end_set()
        } else {
            Outcome::Ignored
        }
    }

    /// Compare endability with the previous transition; only the rising edge
    /// asks for confirmation.
    fn check_end_set(&mut self) -> Outcome {
        let endable = self.can_end_set();
        let rising = endable && !self.was_endable;
        self.was_endable = endable;

        if rising {
            if let Some(prompt) = self.end_set_prompt() {
                debug!(set = prompt.set_number, score = ?prompt.score, "Set can end");
                return Outcome::EndSetRequested(prompt);
            }
        }
        Outcome::Applied
    }

    fn confirm_end_set(&mut self) -> Outcome {
        if self.view != View::InProgress || !self.can_end_set() {
            return Outcome::Ignored;
        }
        let rules = self.rules;
        let Some(data) = self.data.as_mut() else {
            return Outcome::Ignored;
        };

        let set_number = data.current_set;
        let score = data.current_set_log.score();
        let Some(winner) = score.leader() else {
            return Outcome::Ignored;
        };

        let report = report_for_log(set_number, &data.current_set_log, data.first_server(set_number));
        data.history.push(report);
        *data.sets_won.get_mut(winner) += 1;
        data.current_set_log.clear();
        data.current_set += 1;
        self.was_endable = false;

        info!(
            match_id = %data.id,
            set = set_number,
            winner = %winner,
            own = score.own,
            rival = score.rival,
            "Set finished"
        );

        if is_match_won(&rules, &data.sets_won) {
            data.is_match_over = true;
            self.view = View::Report;
            info!(
                match_id = %data.id,
                own_sets = data.sets_won.own,
                rival_sets = data.sets_won.rival,
                "Match finished"
            );
            return Outcome::MatchFinished {
                winner: Some(winner),
                sets_won: data.sets_won,
            };
        }

        let next = data.current_set;
        if !data.has_starting_rotation(next) {
            data.set_starting_rotation(next, Default::default());
        }
        data.current_rotation = data.starting_rotation(next);

        let previous_server = data.first_server(set_number);
        self.view = match previous_server {
            Some(server) if !is_decider_set(&rules, &data.sets_won) => {
                data.set_first_server(next, server.opponent());
                View::InProgress
            }
            _ => View::Serving,
        };

        Outcome::SetFinished {
            set_number,
            winner,
            score,
        }
    }

    fn cancel_end_set(&mut self) -> Outcome {
        if self.view != View::InProgress || !self.can_end_set() {
            return Outcome::Ignored;
        }
        self.undo()
    }

    fn override_rotation(&mut self, team: Team, rotation: Rotation) -> Outcome {
        let view = self.view;
        let Some(data) = self.data.as_mut() else {
            return Outcome::Ignored;
        };
        if data.is_match_over {
            return Outcome::Ignored;
        }

        let set = data.current_set;
        match view {
            View::Serving => {
                let mut start = data.starting_rotation(set);
                *start.get_mut(team) = rotation;
                data.set_starting_rotation(set, start);
                data.current_rotation = start;
            }
            View::InProgress => {
                *data.current_rotation.get_mut(team) = rotation;
                if data.current_set_log.is_empty() {
                    data.set_starting_rotation(set, data.current_rotation);
                }
            }
            _ => return Outcome::Ignored,
        }

        debug!(set, team = %team, rotation = %rotation, "Rotation overridden");
        Outcome::Applied
    }

    fn rename_team(&mut self, team: Team, name: String) -> Outcome {
        let name = name.trim();
        let Some(data) = self.data.as_mut() else {
            return Outcome::Ignored;
        };
        if name.is_empty() {
            return Outcome::Ignored;
        }

        *data.team_names.get_mut(team) = name.to_string();
        Outcome::Applied
    }

    fn recolor_team(&mut self, team: Team, color: String) -> Outcome {
        let Some(data) = self.data.as_mut() else {
            return Outcome::Ignored;
        };
        if color.trim().is_empty() {
            return Outcome::Ignored;
        }

        *data.team_colors.get_mut(team) = color;
        Outcome::Applied
    }

    fn end_match(&mut self) -> Outcome {
        if !matches!(self.view, View::Serving | View::InProgress) {
            return Outcome::Ignored;
        }
        let Some(data) = self.data.as_mut() else {
            return Outcome::Ignored;
        };

        data.is_match_over = true;
        self.view = View::Report;
        self.was_endable = false;

        info!(match_id = %data.id, "Match ended early");
        Outcome::MatchFinished {
            winner: data.match_leader(),
            sets_won: data.sets_won,
        }
    }

    fn save_match(&mut self) -> Outcome {
        if self.view != View::Report || self.data.is_none() {
            return Outcome::Ignored;
        }
        self.is_saved = true;
        Outcome::Applied
    }

    fn start_new_match(&mut self) -> Outcome {
        if self.data.is_none() && self.view == View::Start {
            return Outcome::Ignored;
        }
        self.discard();
        Outcome::Applied
    }

    fn view_history(&mut self) -> Outcome {
        if !matches!(self.view, View::Start | View::Report) {
            return Outcome::Ignored;
        }
        self.history_return = self.view;
        self.view = View::History;
        Outcome::Applied
    }

    fn close_history(&mut self) -> Outcome {
        if self.view != View::History {
            return Outcome::Ignored;
        }
        self.view = if self.data.is_some() {
            self.history_return
        } else {
            View::Start
        };
        Outcome::Applied
    }

    fn discard(&mut self) {
        self.data = None;
        self.view = View::Start;
        self.history_return = View::Start;
        self.was_endable = false;
        self.is_saved = false;
    }
}
