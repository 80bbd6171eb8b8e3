//! The match aggregate.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    default_team_colors, MatchId, PointLog, RotationPair, SetReport, SetScore, Team, TeamColors,
    TeamNames,
};

/// Everything chosen on the start screen before the first rally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSetup {
    pub team_names: TeamNames,

    #[serde(default = "default_team_colors")]
    pub team_colors: TeamColors,

    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub date: Option<NaiveDate>,

    #[serde(default)]
    pub time: Option<NaiveTime>,

    /// Rotations both teams start the first set in
    #[serde(default)]
    pub starting_rotation: RotationPair,
}

impl MatchSetup {
    pub fn new(own_name: impl Into<String>, rival_name: impl Into<String>) -> Self {
        Self {
            team_names: TeamNames::new(own_name.into(), rival_name.into()),
            team_colors: default_team_colors(),
            location: String::new(),
            date: None,
            time: None,
            starting_rotation: RotationPair::default(),
        }
    }

    pub fn with_starting_rotation(mut self, rotation: RotationPair) -> Self {
        self.starting_rotation = rotation;
        self
    }
}

/// A match in progress or completed.
///
/// The live point log, the current rotations and the set history are the only
/// stored state; score and server are always derived from the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchData {
    pub id: MatchId,

    pub team_names: TeamNames,

    #[serde(default = "default_team_colors")]
    pub team_colors: TeamColors,

    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub date: Option<NaiveDate>,

    #[serde(default)]
    pub time: Option<NaiveTime>,

    /// Set being played, starting at 1
    pub current_set: u32,

    /// Rallies of the current set
    #[serde(default)]
    pub current_set_log: PointLog,

    #[serde(default)]
    pub sets_won: SetScore,

    /// Reports of finished sets, in set order
    #[serde(default)]
    pub history: Vec<SetReport>,

    #[serde(default)]
    pub is_match_over: bool,

    /// First server of each set (index = set number − 1)
    #[serde(default)]
    pub first_serve_by: Vec<Option<Team>>,

    /// Starting rotations of each set (index = set number − 1)
    #[serde(default)]
    pub starting_rotations: Vec<RotationPair>,

    #[serde(default)]
    pub current_rotation: RotationPair,

    /// When this match was created
    pub created_at: DateTime<Utc>,
}

impl MatchData {
    /// Create a fresh match with a new identifier and empty history.
    pub fn new(setup: MatchSetup) -> Self {
        Self {
            id: MatchId::generate(),
            team_names: setup.team_names,
            team_colors: setup.team_colors,
            location: setup.location,
            date: setup.date,
            time: setup.time,
            current_set: 1,
            current_set_log: PointLog::new(),
            sets_won: SetScore::default(),
            history: Vec::new(),
            is_match_over: false,
            first_serve_by: Vec::new(),
            starting_rotations: vec![setup.starting_rotation],
            current_rotation: setup.starting_rotation,
            created_at: Utc::now(),
        }
    }

    /// First server recorded for `set_number`, if chosen yet.
    pub fn first_server(&self, set_number: u32) -> Option<Team> {
        set_index(set_number)
            .and_then(|i| self.first_serve_by.get(i).copied())
            .flatten()
    }

    pub fn set_first_server(&mut self, set_number: u32, team: Team) {
        if let Some(i) = set_index(set_number) {
            if self.first_serve_by.len() <= i {
                self.first_serve_by.resize(i + 1, None);
            }
            self.first_serve_by[i] = Some(team);
        }
    }

    /// Starting rotation of `set_number`, or both teams in rotation 1.
    pub fn starting_rotation(&self, set_number: u32) -> RotationPair {
        set_index(set_number)
            .and_then(|i| self.starting_rotations.get(i).copied())
            .unwrap_or_default()
    }

    pub fn set_starting_rotation(&mut self, set_number: u32, rotation: RotationPair) {
        if let Some(i) = set_index(set_number) {
            if self.starting_rotations.len() <= i {
                self.starting_rotations.resize(i + 1, RotationPair::default());
            }
            self.starting_rotations[i] = rotation;
        }
    }

    /// Whether a starting rotation was recorded for `set_number`.
    pub fn has_starting_rotation(&self, set_number: u32) -> bool {
        set_index(set_number).is_some_and(|i| i < self.starting_rotations.len())
    }

    pub fn team_name(&self, team: Team) -> &str {
        self.team_names.get(team)
    }

    /// Team ahead on sets, if any.
    pub fn match_leader(&self) -> Option<Team> {
        self.sets_won.leader()
    }
}

fn set_index(set_number: u32) -> Option<usize> {
    set_number.checked_sub(1).map(|i| i as usize)
}
