//! Point events and the per-set point log.

use serde::{Deserialize, Serialize};

use super::{Rotation, SetScore, Team};

/// How a rally ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointType {
    /// Own team scored with a winning action.
    #[serde(alias = "PPM")]
    OwnPointFromPlay,
    /// Own team scored from a rival error.
    #[serde(alias = "PRE")]
    OwnPointFromRivalError,
    /// Rival scored from an own error.
    #[serde(alias = "PPE")]
    RivalPointFromOwnError,
    /// Rival scored with a winning action.
    #[serde(alias = "PRM")]
    RivalPointFromPlay,
}

impl PointType {
    pub const ALL: [PointType; 4] = [
        PointType::OwnPointFromPlay,
        PointType::OwnPointFromRivalError,
        PointType::RivalPointFromOwnError,
        PointType::RivalPointFromPlay,
    ];

    /// The team that wins the rally.
    pub fn winner(self) -> Team {
        match self {
            PointType::OwnPointFromPlay | PointType::OwnPointFromRivalError => Team::Own,
            PointType::RivalPointFromOwnError | PointType::RivalPointFromPlay => Team::Rival,
        }
    }

    /// Whether the rally ended on an error by the losing team.
    pub fn is_error(self) -> bool {
        matches!(
            self,
            PointType::OwnPointFromRivalError | PointType::RivalPointFromOwnError
        )
    }

    /// Short code used on scoresheets.
    pub fn code(self) -> &'static str {
        match self {
            PointType::OwnPointFromPlay => "PPM",
            PointType::OwnPointFromRivalError => "PRE",
            PointType::RivalPointFromOwnError => "PPE",
            PointType::RivalPointFromPlay => "PRM",
        }
    }
}

/// The skill that decided the rally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointCategory {
    #[serde(alias = "SAQUE")]
    Serve,
    #[serde(alias = "ATAQUE")]
    Attack,
    #[serde(alias = "BLOQUEO")]
    Block,
    #[serde(alias = "RECEPCION")]
    Reception,
    #[serde(alias = "DEFENSA")]
    Defense,
    #[default]
    #[serde(alias = "OTRO")]
    Other,
}

impl PointCategory {
    pub const ALL: [PointCategory; 6] = [
        PointCategory::Serve,
        PointCategory::Attack,
        PointCategory::Block,
        PointCategory::Reception,
        PointCategory::Defense,
        PointCategory::Other,
    ];

    /// Short code used on scoresheets.
    pub fn code(self) -> &'static str {
        match self {
            PointCategory::Serve => "SAQUE",
            PointCategory::Attack => "ATAQUE",
            PointCategory::Block => "BLOQUEO",
            PointCategory::Reception => "RECEPCION",
            PointCategory::Defense => "DEFENSA",
            PointCategory::Other => "OTRO",
        }
    }
}

/// A single rally outcome, with both teams' rotations as they were
/// before the rally was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointEvent {
    #[serde(rename = "type")]
    pub point_type: PointType,

    #[serde(default)]
    pub category: PointCategory,

    /// Own rotation when the rally was played
    #[serde(default)]
    pub own_rotation: Rotation,

    /// Rival rotation when the rally was played
    #[serde(default)]
    pub rival_rotation: Rotation,
}

impl PointEvent {
    pub fn winner(&self) -> Team {
        self.point_type.winner()
    }

    /// Rotation `team` held when the rally was played.
    pub fn rotation_of(&self, team: Team) -> Rotation {
        match team {
            Team::Own => self.own_rotation,
            Team::Rival => self.rival_rotation,
        }
    }
}

/// Ordered rallies of one set. Insertion order is match chronology.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointLog(Vec<PointEvent>);

impl PointLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: PointEvent) {
        self.0.push(event);
    }

    /// Remove the most recent rally. There is no other way to drop history.
    pub fn pop(&mut self) -> Option<PointEvent> {
        self.0.pop()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn last(&self) -> Option<&PointEvent> {
        self.0.last()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PointEvent> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[PointEvent] {
        &self.0
    }

    /// Tally the log by point type.
    pub fn counts(&self) -> PointCounts {
        self.iter().fold(PointCounts::default(), |mut counts, event| {
            counts.record(event.point_type);
            counts
        })
    }

    /// Current score of the set.
    pub fn score(&self) -> SetScore {
        self.counts().score()
    }
}

impl From<Vec<PointEvent>> for PointLog {
    fn from(events: Vec<PointEvent>) -> Self {
        Self(events)
    }
}

impl FromIterator<PointEvent> for PointLog {
    fn from_iter<I: IntoIterator<Item = PointEvent>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PointLog {
    type Item = &'a PointEvent;
    type IntoIter = std::slice::Iter<'a, PointEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Number of rallies of each point type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointCounts {
    /// Own winning actions
    pub own_points: u32,
    /// Rival errors (own team scores)
    pub rival_errors: u32,
    /// Own errors (rival scores)
    pub own_errors: u32,
    /// Rival winning actions
    pub rival_points: u32,
}

impl PointCounts {
    pub fn record(&mut self, point_type: PointType) {
        *self.slot(point_type) += 1;
    }

    pub fn get(&self, point_type: PointType) -> u32 {
        match point_type {
            PointType::OwnPointFromPlay => self.own_points,
            PointType::OwnPointFromRivalError => self.rival_errors,
            PointType::RivalPointFromOwnError => self.own_errors,
            PointType::RivalPointFromPlay => self.rival_points,
        }
    }

    fn slot(&mut self, point_type: PointType) -> &mut u32 {
        match point_type {
            PointType::OwnPointFromPlay => &mut self.own_points,
            PointType::OwnPointFromRivalError => &mut self.rival_errors,
            PointType::RivalPointFromOwnError => &mut self.own_errors,
            PointType::RivalPointFromPlay => &mut self.rival_points,
        }
    }

    pub fn score(&self) -> SetScore {
        SetScore::new(
            self.own_points + self.rival_errors,
            self.own_errors + self.rival_points,
        )
    }

    pub fn total(&self) -> u32 {
        self.own_points + self.rival_errors + self.own_errors + self.rival_points
    }
}

impl std::ops::AddAssign for PointCounts {
    fn add_assign(&mut self, other: Self) {
        self.own_points += other.own_points;
        self.rival_errors += other.rival_errors;
        self.own_errors += other.own_errors;
        self.rival_points += other.rival_points;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(point_type: PointType) -> PointEvent {
        PointEvent {
            point_type,
            category: PointCategory::Attack,
            own_rotation: Rotation::default(),
            rival_rotation: Rotation::default(),
        }
    }

    #[test]
    fn test_point_type_winner() {
        assert_eq!(PointType::OwnPointFromPlay.winner(), Team::Own);
        assert_eq!(PointType::OwnPointFromRivalError.winner(), Team::Own);
        assert_eq!(PointType::RivalPointFromOwnError.winner(), Team::Rival);
        assert_eq!(PointType::RivalPointFromPlay.winner(), Team::Rival);
    }

    #[test]
    fn test_point_type_accepts_legacy_codes() {
        let t: PointType = serde_json::from_str("\"PRE\"").unwrap();
        assert_eq!(t, PointType::OwnPointFromRivalError);
        let t: PointType = serde_json::from_str("\"rival_point_from_play\"").unwrap();
        assert_eq!(t, PointType::RivalPointFromPlay);
    }

    #[test]
    fn test_category_accepts_legacy_names() {
        let c: PointCategory = serde_json::from_str("\"RECEPCION\"").unwrap();
        assert_eq!(c, PointCategory::Reception);
    }

    #[test]
    fn test_event_defaults_missing_fields() {
        let e: PointEvent = serde_json::from_str(r#"{"type":"PPM"}"#).unwrap();
        assert_eq!(e.category, PointCategory::Other);
        assert_eq!(e.own_rotation, Rotation::default());
        assert_eq!(e.rival_rotation, Rotation::default());
    }

    #[test]
    fn test_log_is_lifo() {
        let mut log = PointLog::new();
        log.push(event(PointType::OwnPointFromPlay));
        log.push(event(PointType::RivalPointFromPlay));

        assert_eq!(log.pop().unwrap().point_type, PointType::RivalPointFromPlay);
        assert_eq!(log.len(), 1);
        assert_eq!(log.last().unwrap().point_type, PointType::OwnPointFromPlay);
    }

    #[test]
    fn test_score_totals_match_log_length() {
        let log: PointLog = [
            PointType::OwnPointFromPlay,
            PointType::OwnPointFromRivalError,
            PointType::RivalPointFromOwnError,
            PointType::OwnPointFromPlay,
            PointType::RivalPointFromPlay,
        ]
        .into_iter()
        .map(event)
        .collect();

        let counts = log.counts();
        assert_eq!(counts.own_points, 2);
        assert_eq!(counts.rival_errors, 1);
        assert_eq!(counts.own_errors, 1);
        assert_eq!(counts.rival_points, 1);

        let score = log.score();
        assert_eq!(score, SetScore::new(3, 2));
        assert_eq!(score.total() as usize, log.len());
    }

    #[test]
    fn test_log_serializes_as_array() {
        let mut log = PointLog::new();
        log.push(event(PointType::OwnPointFromPlay));
        let json = serde_json::to_value(&log).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["type"], "own_point_from_play");
        assert_eq!(json[0]["own_rotation"], 1);
    }
}
