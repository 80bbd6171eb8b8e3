//! Statistics calculation engine.
//!
//! Pure functions deriving live and post-set figures from point logs:
//! - Score and current server
//! - Set/match thresholds
//! - Efficiency, sideout and break-point reports per set
//! - Full-match totals, category breakdowns and score progression

mod set_report;
mod totals;

pub use set_report::*;
pub use totals::*;

use crate::models::{MatchRules, PointCategory, PointLog, PointType, SetScore, Team};

/// Team serving the next rally.
///
/// With an empty log this is the recorded first server of the set; otherwise
/// the winner of the last rally serves next.
pub fn serving_team(log: &PointLog, first_server: Option<Team>) -> Option<Team> {
    match log.last() {
        Some(last) => Some(last.winner()),
        None => first_server,
    }
}

/// Whether a rally won by `winner` is a sideout, given who served it.
pub fn is_sideout(winner: Team, server: Option<Team>) -> bool {
    server == Some(winner.opponent())
}

/// (actions − errors) / (actions + errors), or 0 with no actions or errors.
pub fn efficiency(actions: u32, errors: u32) -> f64 {
    let total = actions + errors;
    if total == 0 {
        0.0
    } else {
        (f64::from(actions) - f64::from(errors)) / f64::from(total)
    }
}

/// Ratio guarded against a zero denominator.
pub fn ratio(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        f64::from(numerator) / f64::from(denominator)
    }
}

/// Whether both teams are one set away from winning the match.
pub fn is_decider_set(rules: &MatchRules, sets_won: &SetScore) -> bool {
    let one_away = rules.sets_to_win_match.saturating_sub(1);
    sets_won.own == one_away && sets_won.rival == one_away
}

/// Target score of the set being played.
pub fn set_target(rules: &MatchRules, sets_won: &SetScore) -> u32 {
    if is_decider_set(rules, sets_won) {
        rules.set_points_decider
    } else {
        rules.set_points_regular
    }
}

/// A set can end once one side reached the target and leads by the margin.
pub fn can_end_set(rules: &MatchRules, score: &SetScore, sets_won: &SetScore) -> bool {
    let target = set_target(rules, sets_won);
    let margin = i64::from(rules.required_point_difference);

    Team::BOTH
        .iter()
        .any(|&team| *score.get(team) >= target && score.margin(team) >= margin)
}

/// Whether `sets_won` already decides the match.
pub fn is_match_won(rules: &MatchRules, sets_won: &SetScore) -> bool {
    sets_won.own >= rules.sets_to_win_match || sets_won.rival >= rules.sets_to_win_match
}

/// Categories offered for a point type given who is serving.
///
/// The receiving team cannot score or err on serve, and the serving team
/// cannot err on reception.
pub fn allowed_categories(point_type: PointType, server: Option<Team>) -> Vec<PointCategory> {
    let base: &[PointCategory] = if point_type.is_error() {
        &[
            PointCategory::Attack,
            PointCategory::Serve,
            PointCategory::Reception,
            PointCategory::Defense,
            PointCategory::Other,
        ]
    } else {
        &[
            PointCategory::Attack,
            PointCategory::Serve,
            PointCategory::Block,
            PointCategory::Other,
        ]
    };

    // Team whose action or error decided the rally
    let actor = if point_type.is_error() {
        point_type.winner().opponent()
    } else {
        point_type.winner()
    };

    base.iter()
        .copied()
        .filter(|&category| match server {
            Some(server) if server == actor => category != PointCategory::Reception,
            Some(_) => category != PointCategory::Serve,
            None => true,
        })
        .collect()
}
