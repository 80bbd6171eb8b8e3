//! Point tracking for the live set.
//!
//! Appends rallies to the current set log, rotates the team that wins serve
//! back, and reverses both on undo. Rotations before each rally are stored on
//! the event so undo never has to re-derive them.

use tracing::debug;

use crate::calculate::{is_sideout, serving_team};
use crate::models::{MatchData, PointCategory, PointEvent, PointType, Team};

/// Team serving the next rally of the current set.
pub fn current_server(data: &MatchData) -> Option<Team> {
    serving_team(&data.current_set_log, data.first_server(data.current_set))
}

/// Record a rally in the current set.
///
/// The event keeps the rotations both teams held during the rally. When the
/// receiving team wins it rotates. Returns the appended event, or `None` once
/// the match is over.
pub fn record_point(
    data: &mut MatchData,
    point_type: PointType,
    category: PointCategory,
) -> Option<PointEvent> {
    if data.is_match_over {
        return None;
    }

    let server = current_server(data);
    let event = PointEvent {
        point_type,
        category,
        own_rotation: data.current_rotation.own,
        rival_rotation: data.current_rotation.rival,
    };
    data.current_set_log.push(event);

    let winner = point_type.winner();
    if is_sideout(winner, server) {
        data.current_rotation.advance(winner);
    }

    debug!(
        set = data.current_set,
        point = point_type.code(),
        category = category.code(),
        rotation = ?data.current_rotation,
        "Point recorded"
    );
    Some(event)
}

/// Remove the last rally of the current set and restore the rotations held
/// when it was played.
pub fn undo_last_point(data: &mut MatchData) -> Option<PointEvent> {
    let event = data.current_set_log.pop()?;
    data.current_rotation.own = event.own_rotation;
    data.current_rotation.rival = event.rival_rotation;

    debug!(set = data.current_set, point = event.point_type.code(), "Point undone");
    Some(event)
}

/// Clear the current set log and put both teams back in the set's starting
/// rotation. Returns `false` when there was nothing to reset.
pub fn reset_current_set(data: &mut MatchData) -> bool {
    if data.current_set_log.is_empty() {
        return false;
    }

    data.current_set_log.clear();
    data.current_rotation = data.starting_rotation(data.current_set);

    debug!(set = data.current_set, "Set reset");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchSetup, Rotation, RotationPair, SetScore};
    use pretty_assertions::assert_eq;

    use PointType::*;

    fn rot(n: u8) -> Rotation {
        Rotation::new(n).unwrap()
    }

    fn new_match(first_server: Team) -> MatchData {
        let mut data = MatchData::new(MatchSetup::new("Home", "Away"));
        data.set_first_server(1, first_server);
        data
    }

    #[test]
    fn test_one_sideout_each_rotates_both_teams_once() {
        let mut data = new_match(Team::Own);
        for t in [
            OwnPointFromPlay,
            OwnPointFromPlay,
            RivalPointFromPlay,
            RivalPointFromPlay,
            RivalPointFromPlay,
            OwnPointFromPlay,
        ] {
            record_point(&mut data, t, PointCategory::Attack);
        }

        assert_eq!(data.current_set_log.score(), SetScore::new(3, 3));
        assert_eq!(data.current_rotation, RotationPair::new(rot(6), rot(6)));
        assert_eq!(current_server(&data), Some(Team::Own));
    }

    #[test]
    fn test_sideout_rotates_receiving_team() {
        let mut data = new_match(Team::Rival);

        // Own receives and wins: sideout, own rotates 1 -> 6
        let event = record_point(&mut data, OwnPointFromPlay, PointCategory::Attack).unwrap();
        assert_eq!(event.own_rotation, rot(1));
        assert_eq!(data.current_rotation.own, rot(6));
        assert_eq!(data.current_rotation.rival, rot(1));
        assert_eq!(current_server(&data), Some(Team::Own));

        // Own serves and wins again: no rotation
        record_point(&mut data, OwnPointFromRivalError, PointCategory::Reception);
        assert_eq!(data.current_rotation.own, rot(6));

        // Rival breaks back on own serve: rival rotates
        record_point(&mut data, RivalPointFromOwnError, PointCategory::Serve);
        assert_eq!(data.current_rotation.rival, rot(6));
        assert_eq!(data.current_rotation.own, rot(6));
        assert_eq!(current_server(&data), Some(Team::Rival));
        assert_eq!(data.current_set_log.score(), SetScore::new(2, 1));
    }

    #[test]
    fn test_serving_team_keeps_rotation() {
        let mut data = new_match(Team::Own);
        for _ in 0..5 {
            record_point(&mut data, OwnPointFromPlay, PointCategory::Serve);
        }
        assert_eq!(data.current_rotation, RotationPair::default());
    }

    #[test]
    fn test_unknown_first_server_never_rotates_on_first_rally() {
        let mut data = MatchData::new(MatchSetup::new("Home", "Away"));
        record_point(&mut data, OwnPointFromPlay, PointCategory::Attack);
        assert_eq!(data.current_rotation, RotationPair::default());
        assert_eq!(current_server(&data), Some(Team::Own));
    }

    #[test]
    fn test_record_then_undo_restores_state() {
        let mut data = new_match(Team::Rival);
        record_point(&mut data, RivalPointFromPlay, PointCategory::Block);
        let before = data.clone();

        record_point(&mut data, OwnPointFromPlay, PointCategory::Attack);
        assert_ne!(data, before);

        let undone = undo_last_point(&mut data).unwrap();
        assert_eq!(undone.point_type, OwnPointFromPlay);
        assert_eq!(data, before);
    }

    #[test]
    fn test_undo_on_empty_log_is_noop() {
        let mut data = new_match(Team::Own);
        let before = data.clone();
        assert_eq!(undo_last_point(&mut data), None);
        assert_eq!(data, before);
    }

    #[test]
    fn test_score_always_matches_log_length() {
        let mut data = new_match(Team::Own);
        let types = [
            OwnPointFromPlay,
            RivalPointFromPlay,
            RivalPointFromOwnError,
            OwnPointFromRivalError,
            OwnPointFromRivalError,
            RivalPointFromPlay,
        ];
        for (i, &t) in types.iter().enumerate() {
            record_point(&mut data, t, PointCategory::Other);
            assert_eq!(data.current_set_log.score().total() as usize, i + 1);
        }
    }

    #[test]
    fn test_no_points_after_match_over() {
        let mut data = new_match(Team::Own);
        data.is_match_over = true;
        assert_eq!(record_point(&mut data, OwnPointFromPlay, PointCategory::Attack), None);
        assert!(data.current_set_log.is_empty());
    }

    #[test]
    fn test_reset_restores_starting_rotation() {
        let start = RotationPair::new(rot(4), rot(2));
        let mut data = MatchData::new(MatchSetup::new("Home", "Away").with_starting_rotation(start));
        data.set_first_server(1, Team::Own);

        record_point(&mut data, RivalPointFromPlay, PointCategory::Attack);
        record_point(&mut data, OwnPointFromPlay, PointCategory::Attack);
        assert_ne!(data.current_rotation, start);

        assert!(reset_current_set(&mut data));
        assert!(data.current_set_log.is_empty());
        assert_eq!(data.current_rotation, start);
        assert!(!reset_current_set(&mut data));
    }
}
