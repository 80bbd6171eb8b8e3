use crate::models::{PointCounts, PointLog, RotationTable, SetReport, SetScore, Team, TeamPair};

use super::{efficiency, ratio};

/// Build the report of a finished set.
///
/// A single pass over the log tracks the serving team starting from
/// `first_server`. On every rally the receiving team gets a sideout chance on
/// the rotation it held; winning it is a sideout and moves the serve, losing
/// it is a break point for the server. When the first server is unknown the
/// first rally is not attributed and its winner is taken as the next server.
pub fn calculate_set_report(
    set_number: u32,
    point_counts: PointCounts,
    final_score: SetScore,
    log: &PointLog,
    first_server: Option<Team>,
) -> SetReport {
    let mut tables = TeamPair::new(RotationTable::new(), RotationTable::new());
    let mut break_points = TeamPair::<u32>::default();
    let mut server = first_server;

    for event in log {
        let winner = event.winner();

        for team in Team::BOTH {
            let delta = if team == winner { 1 } else { -1 };
            tables.get_mut(team).entry(event.rotation_of(team)).gp += delta;
        }

        if let Some(serving) = server {
            let receiver = serving.opponent();
            let stat = tables.get_mut(receiver).entry(event.rotation_of(receiver));
            stat.sideout_chances += 1;
            if winner == receiver {
                stat.sideouts += 1;
            } else {
                *break_points.get_mut(serving) += 1;
            }
        }

        server = Some(winner);
    }

    let own_totals = tables.own.total();
    let rival_totals = tables.rival.total();
    let runs = service_runs(log, first_server);

    let own_efficiency = efficiency(point_counts.own_points, point_counts.own_errors);
    let rival_efficiency = efficiency(point_counts.rival_points, point_counts.rival_errors);

    SetReport {
        set_number,
        final_score,
        point_counts,
        own_efficiency,
        rival_error_impact: 1.0 - rival_efficiency,
        point_log: log.clone(),
        rotation_stats: tables.own,
        rival_rotation_stats: tables.rival,
        sideout_percentage: TeamPair::new(
            ratio(own_totals.sideouts, own_totals.sideout_chances),
            ratio(rival_totals.sideouts, rival_totals.sideout_chances),
        ),
        points_per_serve: TeamPair::new(
            ratio(final_score.own, runs.own),
            ratio(final_score.rival, runs.rival),
        ),
        break_points,
    }
}

/// Report for a log, tallying counts and score from the log itself.
pub fn report_for_log(set_number: u32, log: &PointLog, first_server: Option<Team>) -> SetReport {
    let counts = log.counts();
    calculate_set_report(set_number, counts, counts.score(), log, first_server)
}

/// Number of service rotations credited to each team in a set.
///
/// The first rally counts for the first server; every later rally counts for
/// the team that lost the rally before it.
pub fn service_runs(log: &PointLog, first_server: Option<Team>) -> TeamPair<u32> {
    let mut runs = TeamPair::<u32>::default();

    if !log.is_empty() {
        if let Some(team) = first_server {
            *runs.get_mut(team) += 1;
        }
    }
    for pair in log.as_slice().windows(2) {
        *runs.get_mut(pair[0].winner().opponent()) += 1;
    }

    runs
}
