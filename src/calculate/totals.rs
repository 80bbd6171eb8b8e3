use serde::Serialize;

use crate::models::{
    MatchData, PointCategory, PointCounts, PointLog, PointType, RotationTable, SetScore, Team,
    TeamPair,
};

use super::{efficiency, ratio, report_for_log, service_runs};

/// Aggregate statistics over every set of a match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchTotals {
    pub sets_won: SetScore,

    /// Points scored across all sets
    pub total_score: SetScore,

    pub point_counts: PointCounts,
    pub own_efficiency: f64,
    pub rival_error_impact: f64,
    pub sideout_percentage: TeamPair<f64>,
    pub points_per_serve: TeamPair<f64>,
    pub break_points: TeamPair<u32>,
    pub rotation_stats: RotationTable,
    pub rival_rotation_stats: RotationTable,

    /// Number of sets included, counting a set in progress
    pub sets_counted: u32,
}

/// Fold all finished sets plus the live set into match totals.
///
/// Stored per-set reports supply point counts, break points and rotation
/// tables; service runs are re-derived from each set's log with that set's
/// recorded first server.
pub fn match_totals(data: &MatchData) -> MatchTotals {
    let mut counts = PointCounts::default();
    let mut break_points = TeamPair::<u32>::default();
    let mut runs = TeamPair::<u32>::default();
    let mut own_table = RotationTable::new();
    let mut rival_table = RotationTable::new();
    let mut sets_counted = 0;

    let live = (!data.current_set_log.is_empty()).then(|| {
        report_for_log(
            data.current_set,
            &data.current_set_log,
            data.first_server(data.current_set),
        )
    });

    for report in data.history.iter().chain(live.as_ref()) {
        let first_server = data.first_server(report.set_number);
        let set_runs = service_runs(&report.point_log, first_server);

        counts += report.point_counts;
        break_points.own += report.break_points.own;
        break_points.rival += report.break_points.rival;
        runs.own += set_runs.own;
        runs.rival += set_runs.rival;
        own_table.merge(&report.rotation_stats);
        rival_table.merge(&report.rival_rotation_stats);
        sets_counted += 1;
    }

    let own_sideouts = own_table.total();
    let rival_sideouts = rival_table.total();

    MatchTotals {
        sets_won: data.sets_won,
        total_score: counts.score(),
        point_counts: counts,
        own_efficiency: efficiency(counts.own_points, counts.own_errors),
        rival_error_impact: 1.0 - efficiency(counts.rival_points, counts.rival_errors),
        sideout_percentage: TeamPair::new(
            ratio(own_sideouts.sideouts, own_sideouts.sideout_chances),
            ratio(rival_sideouts.sideouts, rival_sideouts.sideout_chances),
        ),
        points_per_serve: TeamPair::new(
            ratio(counts.score().own, runs.own),
            ratio(counts.score().rival, runs.rival),
        ),
        break_points,
        rotation_stats: own_table,
        rival_rotation_stats: rival_table,
        sets_counted,
    }
}

/// How one team's points were won.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdown {
    pub attacks: u32,
    pub aces: u32,
    pub blocks: u32,
    pub opponent_errors: u32,
    pub others: u32,
    pub total: u32,
}

/// Split each team's points by the skill that won them.
pub fn category_breakdown(log: &PointLog) -> TeamPair<CategoryBreakdown> {
    let mut breakdown = TeamPair::<CategoryBreakdown>::default();

    for event in log {
        let entry = breakdown.get_mut(event.winner());
        entry.total += 1;

        if event.point_type.is_error() {
            entry.opponent_errors += 1;
            continue;
        }

        match event.category {
            PointCategory::Attack => entry.attacks += 1,
            PointCategory::Serve => entry.aces += 1,
            PointCategory::Block => entry.blocks += 1,
            _ => entry.others += 1,
        }
    }

    breakdown
}

/// Running score after one rally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreStep {
    /// Rally number within the set, starting at 1
    pub rally: u32,
    pub score: SetScore,
    pub point_type: PointType,
    pub category: PointCategory,
    pub winner: Team,
}

/// Score after every rally of a set, in order.
pub fn score_progression(log: &PointLog) -> Vec<ScoreStep> {
    let mut score = SetScore::default();

    log.iter()
        .zip(1..)
        .map(|(event, rally)| {
            let winner = event.winner();
            *score.get_mut(winner) += 1;
            ScoreStep {
                rally,
                score,
                point_type: event.point_type,
                category: event.category,
                winner,
            }
        })
        .collect()
}
