//! Team identity and per-team value pairs.

use serde::{Deserialize, Serialize};

/// One of the two sides of a match, from the tracking team's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Own,
    Rival,
}

impl Team {
    pub const BOTH: [Team; 2] = [Team::Own, Team::Rival];

    /// The other side of the net.
    pub fn opponent(self) -> Self {
        match self {
            Team::Own => Team::Rival,
            Team::Rival => Team::Own,
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Team::Own => write!(f, "own"),
            Team::Rival => write!(f, "rival"),
        }
    }
}

/// A value held once for each team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamPair<T> {
    pub own: T,
    pub rival: T,
}

impl<T> TeamPair<T> {
    pub fn new(own: T, rival: T) -> Self {
        Self { own, rival }
    }

    pub fn get(&self, team: Team) -> &T {
        match team {
            Team::Own => &self.own,
            Team::Rival => &self.rival,
        }
    }

    pub fn get_mut(&mut self, team: Team) -> &mut T {
        match team {
            Team::Own => &mut self.own,
            Team::Rival => &mut self.rival,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> TeamPair<U> {
        TeamPair {
            own: f(self.own),
            rival: f(self.rival),
        }
    }
}

/// Points in a set, or sets in a match.
pub type SetScore = TeamPair<u32>;

impl SetScore {
    /// Total rallies played.
    pub fn total(&self) -> u32 {
        self.own + self.rival
    }

    /// The team that is ahead, if any.
    pub fn leader(&self) -> Option<Team> {
        match self.own.cmp(&self.rival) {
            std::cmp::Ordering::Greater => Some(Team::Own),
            std::cmp::Ordering::Less => Some(Team::Rival),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Lead of `team` over the other side (negative when trailing).
    pub fn margin(&self, team: Team) -> i64 {
        i64::from(*self.get(team)) - i64::from(*self.get(team.opponent()))
    }
}

/// Display names of both teams.
pub type TeamNames = TeamPair<String>;

/// Display colors of both teams, as `"H S% L%"` strings.
pub type TeamColors = TeamPair<String>;

/// Colors used when a match record carries none.
pub fn default_team_colors() -> TeamColors {
    TeamPair::new("145 63% 49%".to_string(), "0 84% 60%".to_string())
}
