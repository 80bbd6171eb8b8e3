//! Serializable read models built from the engine and match data.

use serde::Serialize;

use crate::calculate::{
    category_breakdown, match_totals, report_for_log, score_progression, CategoryBreakdown,
    MatchTotals, ScoreStep,
};
use crate::models::{
    MatchData, PointCategory, PointCounts, PointType, SetReport, SetScore, Team, TeamPair,
};

use super::{EndSetPrompt, MatchEngine, View};

/// Categories that may be offered for one point button.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryMenu {
    pub point_type: PointType,
    pub categories: Vec<PointCategory>,
}

/// Live figures of the set being played.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveSet {
    pub set_number: u32,
    pub score: SetScore,
    pub point_counts: PointCounts,
    pub serving_team: Option<Team>,
    pub target: u32,
    pub is_decider: bool,
    pub can_end_set: bool,
    pub can_reset_set: bool,
    pub end_set_prompt: Option<EndSetPrompt>,
    pub menus: Vec<CategoryMenu>,
}

/// Everything a collaborator needs to render the current view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub view: View,
    pub is_saved: bool,
    #[serde(rename = "match")]
    pub match_data: Option<MatchData>,
    pub live: Option<LiveSet>,
}

impl EngineSnapshot {
    pub fn capture(engine: &MatchEngine) -> Self {
        let live = engine
            .data()
            .filter(|_| matches!(engine.view(), View::Serving | View::InProgress))
            .map(|data| LiveSet {
                set_number: data.current_set,
                score: engine.score(),
                point_counts: data.current_set_log.counts(),
                serving_team: engine.serving_team(),
                target: engine.set_target(),
                is_decider: engine.is_decider_set(),
                can_end_set: engine.can_end_set(),
                can_reset_set: engine.can_reset_set(),
                end_set_prompt: engine.end_set_prompt(),
                menus: PointType::ALL
                    .iter()
                    .map(|&point_type| CategoryMenu {
                        point_type,
                        categories: engine.allowed_categories(point_type),
                    })
                    .collect(),
            });

        Self {
            view: engine.view(),
            is_saved: engine.is_saved(),
            match_data: engine.data().cloned(),
            live,
        }
    }
}

/// One set with its point analysis and score timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetSummary {
    pub report: SetReport,
    pub categories: TeamPair<CategoryBreakdown>,
    pub progression: Vec<ScoreStep>,

    /// Set still being played
    pub in_progress: bool,
}

impl SetSummary {
    fn new(report: SetReport, in_progress: bool) -> Self {
        Self {
            categories: category_breakdown(&report.point_log),
            progression: score_progression(&report.point_log),
            report,
            in_progress,
        }
    }
}

/// Full report of a match: every set plus match totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSummary {
    #[serde(rename = "match")]
    pub match_data: MatchData,
    pub sets: Vec<SetSummary>,
    pub totals: MatchTotals,
    pub categories: TeamPair<CategoryBreakdown>,
}

impl MatchSummary {
    pub fn build(data: &MatchData) -> Self {
        let mut sets: Vec<SetSummary> = data
            .history
            .iter()
            .cloned()
            .map(|report| SetSummary::new(report, false))
            .collect();

        if !data.current_set_log.is_empty() {
            let live = report_for_log(
                data.current_set,
                &data.current_set_log,
                data.first_server(data.current_set),
            );
            sets.push(SetSummary::new(live, true));
        }

        let mut categories = TeamPair::<CategoryBreakdown>::default();
        for set in &sets {
            for team in Team::BOTH {
                let total = categories.get_mut(team);
                let set_counts = set.categories.get(team);
                total.attacks += set_counts.attacks;
                total.aces += set_counts.aces;
                total.blocks += set_counts.blocks;
                total.opponent_errors += set_counts.opponent_errors;
                total.others += set_counts.others;
                total.total += set_counts.total;
            }
        }

        Self {
            match_data: data.clone(),
            sets,
            totals: match_totals(data),
            categories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Command;
    use crate::models::{MatchRules, MatchSetup};
    use pretty_assertions::assert_eq;

    fn engine_with_points(types: &[PointType]) -> MatchEngine {
        let mut engine = MatchEngine::new(MatchRules::default());
        engine.apply(Command::StartMatch(MatchSetup::new("Home", "Away")));
        engine.apply(Command::SelectFirstServer { team: Team::Own });
        for &point_type in types {
            engine.apply(Command::AddPoint {
                point_type,
                category: PointCategory::Attack,
            });
        }
        engine
    }

    #[test]
    fn test_snapshot_live_set() {
        let engine = engine_with_points(&[PointType::OwnPointFromPlay, PointType::RivalPointFromPlay]);
        let snapshot = EngineSnapshot::capture(&engine);

        assert_eq!(snapshot.view, View::InProgress);
        let live = snapshot.live.unwrap();
        assert_eq!(live.score, SetScore::new(1, 1));
        assert_eq!(live.serving_team, Some(Team::Rival));
        assert_eq!(live.target, 25);
        assert!(live.can_reset_set);
        assert!(live.end_set_prompt.is_none());
        assert_eq!(live.menus.len(), 4);

        // Own is receiving: no own aces on offer
        let own_points = &live.menus[0];
        assert_eq!(own_points.point_type, PointType::OwnPointFromPlay);
        assert!(!own_points.categories.contains(&PointCategory::Serve));
    }

    #[test]
    fn test_snapshot_start_view() {
        let engine = MatchEngine::new(MatchRules::default());
        let value = serde_json::to_value(EngineSnapshot::capture(&engine)).unwrap();
        assert_eq!(value["view"], "start");
        assert!(value["match"].is_null());
        assert!(value["live"].is_null());
    }

    #[test]
    fn test_summary_includes_live_set() {
        let engine = engine_with_points(&[
            PointType::OwnPointFromPlay,
            PointType::OwnPointFromRivalError,
            PointType::RivalPointFromPlay,
        ]);
        let summary = MatchSummary::build(engine.data().unwrap());

        assert_eq!(summary.sets.len(), 1);
        assert!(summary.sets[0].in_progress);
        assert_eq!(summary.sets[0].progression.len(), 3);
        assert_eq!(summary.categories.own.attacks, 1);
        assert_eq!(summary.categories.own.opponent_errors, 1);
        assert_eq!(summary.categories.rival.total, 1);
        assert_eq!(summary.totals.total_score, SetScore::new(2, 1));
    }
}
