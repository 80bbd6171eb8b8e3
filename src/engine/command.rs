//! Input events and transition outputs of the match engine.

use serde::{Deserialize, Serialize};

use crate::models::{
    MatchId, MatchSetup, PointCategory, PointType, Rotation, SetScore, Team,
};

/// A discrete user action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    StartMatch(MatchSetup),
    SelectFirstServer {
        team: Team,
    },
    AddPoint {
        point_type: PointType,
        #[serde(default)]
        category: PointCategory,
    },
    Undo,
    ResetSet,
    ConfirmEndSet,
    /// Decline the end-of-set prompt by undoing the rally that triggered it.
    CancelEndSet,
    OverrideRotation {
        team: Team,
        rotation: Rotation,
    },
    RenameTeam {
        team: Team,
        name: String,
    },
    RecolorTeam {
        team: Team,
        color: String,
    },
    /// Finish the match now regardless of the set count.
    EndMatch,
    SaveMatch,
    StartNewMatch,
    ViewHistory,
    CloseHistory,
    OpenCompleted {
        match_id: MatchId,
    },
    DeleteCompleted {
        match_id: MatchId,
    },
}

impl Command {
    /// Action name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Command::StartMatch(_) => "start_match",
            Command::SelectFirstServer { .. } => "select_first_server",
            Command::AddPoint { .. } => "add_point",
            Command::Undo => "undo",
            Command::ResetSet => "reset_set",
            Command::ConfirmEndSet => "confirm_end_set",
            Command::CancelEndSet => "cancel_end_set",
            Command::OverrideRotation { .. } => "override_rotation",
            Command::RenameTeam { .. } => "rename_team",
            Command::RecolorTeam { .. } => "recolor_team",
            Command::EndMatch => "end_match",
            Command::SaveMatch => "save_match",
            Command::StartNewMatch => "start_new_match",
            Command::ViewHistory => "view_history",
            Command::CloseHistory => "close_history",
            Command::OpenCompleted { .. } => "open_completed",
            Command::DeleteCompleted { .. } => "delete_completed",
        }
    }
}

/// Details shown when a set becomes endable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndSetPrompt {
    pub set_number: u32,
    pub winner: Team,
    pub score: SetScore,

    /// Confirming would also finish the match
    pub ends_match: bool,
}

/// Result of applying a [`Command`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// Precondition failed; nothing changed.
    Ignored,
    Applied,
    /// The set just became endable; ask before archiving it.
    EndSetRequested(EndSetPrompt),
    SetFinished {
        set_number: u32,
        winner: Team,
        score: SetScore,
    },
    MatchFinished {
        winner: Option<Team>,
        sets_won: SetScore,
    },
}

impl Outcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, Outcome::Ignored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_command_wire_format() {
        let cmd: Command = serde_json::from_value(json!({
            "action": "add_point",
            "point_type": "own_point_from_play",
            "category": "attack"
        }))
        .unwrap();
        assert_eq!(
            cmd,
            Command::AddPoint {
                point_type: PointType::OwnPointFromPlay,
                category: PointCategory::Attack,
            }
        );
        assert_eq!(cmd.name(), "add_point");
    }

    #[test]
    fn test_command_accepts_scoresheet_codes() {
        let cmd: Command = serde_json::from_value(json!({
            "action": "add_point",
            "point_type": "PRE"
        }))
        .unwrap();
        assert_eq!(
            cmd,
            Command::AddPoint {
                point_type: PointType::OwnPointFromRivalError,
                category: PointCategory::Other,
            }
        );
    }

    #[test]
    fn test_start_match_command() {
        let cmd: Command = serde_json::from_value(json!({
            "action": "start_match",
            "team_names": { "own": "Home", "rival": "Away" },
            "starting_rotation": { "own": 3, "rival": 1 }
        }))
        .unwrap();
        match cmd {
            Command::StartMatch(setup) => {
                assert_eq!(setup.team_names.rival, "Away");
                assert_eq!(setup.starting_rotation.own.get(), 3);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_invalid_rotation_rejected() {
        let result: Result<Command, _> = serde_json::from_value(json!({
            "action": "override_rotation",
            "team": "own",
            "rotation": 7
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = Outcome::SetFinished {
            set_number: 2,
            winner: Team::Rival,
            score: SetScore::new(20, 25),
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["kind"], "set_finished");
        assert_eq!(value["winner"], "rival");
        assert_eq!(value["score"]["rival"], 25);

        let ignored = serde_json::to_value(Outcome::Ignored).unwrap();
        assert_eq!(ignored, json!({ "kind": "ignored" }));
    }
}
