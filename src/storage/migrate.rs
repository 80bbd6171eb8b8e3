//! Upgrades stored match documents to the current shape.
//!
//! Older documents used camelCase keys, stored point logs as bare type codes,
//! kept a single shared rotation number and lacked the sideout/serve figures
//! on set reports. Everything here works on raw JSON before the typed
//! deserialization, except the report backfill which reuses the set report
//! calculator once the document parses.

use chrono::{NaiveDate, NaiveTime, Utc};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::calculate::calculate_set_report;
use crate::models::{default_team_colors, MatchData, PointLog, Rotation};

use super::StorageError;

const MATCH_KEYS: &[(&str, &str)] = &[
    ("matchId", "id"),
    ("teamNames", "team_names"),
    ("teamColors", "team_colors"),
    ("currentSet", "current_set"),
    ("currentSetPointsLog", "current_set_log"),
    ("setsWon", "sets_won"),
    ("matchHistory", "history"),
    ("isMatchOver", "is_match_over"),
    ("firstServeBy", "first_serve_by"),
    ("startingRotations", "starting_rotations"),
    ("currentRotation", "current_rotation"),
    ("createdAt", "created_at"),
];

const REPORT_KEYS: &[(&str, &str)] = &[
    ("setNumber", "set_number"),
    ("finalScore", "final_score"),
    ("pointCounts", "point_counts"),
    ("ownEfficiency", "own_efficiency"),
    ("rivalErrorImpact", "rival_error_impact"),
    ("pointLog", "point_log"),
    ("rotationStats", "rotation_stats"),
    ("rivalRotationStats", "rival_rotation_stats"),
    ("sideoutPercentage", "sideout_percentage"),
    ("pointsPerServe", "points_per_serve"),
    ("breakPoints", "break_points"),
];

const COUNT_KEYS: &[(&str, &str)] = &[
    ("PPM", "own_points"),
    ("PRE", "rival_errors"),
    ("PPE", "own_errors"),
    ("PRM", "rival_points"),
];

const EVENT_KEYS: &[(&str, &str)] = &[
    ("ownRotation", "own_rotation"),
    ("rivalRotation", "rival_rotation"),
    // Shared per-rally rotation of older documents, tracked for the own team
    ("rotation", "own_rotation"),
];

const STAT_KEYS: &[(&str, &str)] = &[("sideoutChances", "sideout_chances")];

/// Derived figures a report must carry; reports missing any are recomputed.
const DERIVED_REPORT_KEYS: &[&str] = &[
    "rival_rotation_stats",
    "sideout_percentage",
    "points_per_serve",
    "break_points",
];

/// Parse a stored document into [`MatchData`], upgrading legacy shapes.
///
/// `id` is used when the document does not carry its own identifier.
pub fn migrate_document(id: &str, document: Value) -> Result<MatchData, StorageError> {
    let Value::Object(mut doc) = document else {
        return Err(StorageError::Corrupt(format!("match {id} is not an object")));
    };

    rename_keys(&mut doc, MATCH_KEYS);
    doc.entry("id").or_insert_with(|| json!(id));

    if doc.get("team_colors").map_or(true, Value::is_null) {
        doc.insert("team_colors".to_string(), json!(default_team_colors()));
    }
    if doc.get("location").map_or(true, Value::is_null) {
        doc.insert("location".to_string(), json!(""));
    }
    normalize_date(&mut doc);
    normalize_time(&mut doc);

    if let Some(rotation) = doc.get_mut("current_rotation") {
        normalize_rotation_pair(rotation);
    }
    if let Some(Value::Array(rotations)) = doc.get_mut("starting_rotations") {
        rotations.iter_mut().for_each(normalize_rotation_pair);
    }
    if let Some(log) = doc.get_mut("current_set_log") {
        migrate_point_log(log);
    }

    let mut stale_reports = Vec::new();
    if let Some(Value::Array(history)) = doc.get_mut("history") {
        for (index, report) in history.iter_mut().enumerate() {
            if migrate_report(report)? {
                stale_reports.push(index);
            }
        }
    }

    if !doc.contains_key("current_set") {
        let sets_played = doc
            .get("history")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        doc.insert("current_set".to_string(), json!(sets_played + 1));
    }
    doc.entry("created_at")
        .or_insert_with(|| json!(Utc::now().to_rfc3339()));

    let mut data: MatchData = serde_json::from_value(Value::Object(doc))?;

    for index in stale_reports {
        let report = &data.history[index];
        let first_server = data.first_server(index as u32 + 1);
        let recomputed = calculate_set_report(
            report.set_number,
            report.point_counts,
            report.final_score,
            &report.point_log,
            first_server,
        );
        debug!(match_id = %data.id, set = recomputed.set_number, "Recomputed set report");
        data.history[index] = recomputed;
    }

    Ok(data)
}

fn rename_keys(obj: &mut Map<String, Value>, keys: &[(&str, &str)]) {
    for (legacy, current) in keys {
        if let Some(value) = obj.remove(*legacy) {
            obj.entry(current.to_string()).or_insert(value);
        }
    }
}

fn normalize_date(doc: &mut Map<String, Value>) {
    let date = match doc.get("date") {
        Some(Value::String(s)) if !s.trim().is_empty() => {
            // Accept full timestamps by keeping the date part
            let day = s.trim().get(..10).unwrap_or(s.trim());
            match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
                Ok(date) => json!(date),
                Err(_) => {
                    warn!("Dropping unreadable match date {:?}", s);
                    Value::Null
                }
            }
        }
        _ => Value::Null,
    };
    doc.insert("date".to_string(), date);
}

fn normalize_time(doc: &mut Map<String, Value>) {
    let time = match doc.get("time") {
        Some(Value::String(s)) if !s.trim().is_empty() => {
            let s = s.trim();
            let parsed = NaiveTime::parse_from_str(s, "%H:%M:%S")
                .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"));
            match parsed {
                Ok(time) => json!(time),
                Err(_) => {
                    warn!("Dropping unreadable match time {:?}", s);
                    Value::Null
                }
            }
        }
        _ => Value::Null,
    };
    doc.insert("time".to_string(), time);
}

/// A valid rotation number, or rotation 1 for anything else.
fn normalize_rotation(value: &Value) -> Value {
    let rotation = value
        .as_u64()
        .and_then(|n| u8::try_from(n).ok())
        .and_then(|n| Rotation::new(n).ok())
        .unwrap_or_default();
    json!(rotation)
}

/// Both-team rotation object. A bare number is the superseded shared
/// rotation and is taken as the own team's.
fn normalize_rotation_pair(value: &mut Value) {
    match value {
        Value::Object(pair) => {
            for team in ["own", "rival"] {
                let rotation = normalize_rotation(pair.get(team).unwrap_or(&Value::Null));
                pair.insert(team.to_string(), rotation);
            }
        }
        other => {
            let own = normalize_rotation(other);
            *other = json!({ "own": own, "rival": 1 });
        }
    }
}

fn migrate_point_log(log: &mut Value) {
    let Value::Array(events) = log else {
        *log = json!([]);
        return;
    };

    for event in events.iter_mut() {
        if let Value::String(code) = event {
            let code = code.clone();
            *event = json!({ "type": code, "category": "other" });
            continue;
        }
        if let Value::Object(fields) = event {
            rename_keys(fields, EVENT_KEYS);
            for key in ["own_rotation", "rival_rotation"] {
                let rotation = normalize_rotation(fields.get(key).unwrap_or(&Value::Null));
                fields.insert(key.to_string(), rotation);
            }
        }
    }
}

fn migrate_rotation_table(table: &mut Value) {
    let Value::Object(rows) = table else {
        *table = json!({});
        return;
    };

    rows.retain(|key, _| {
        key.parse::<u8>()
            .ok()
            .and_then(|n| Rotation::new(n).ok())
            .is_some()
    });
    for row in rows.values_mut() {
        if let Value::Object(stat) = row {
            rename_keys(stat, STAT_KEYS);
        }
    }
}

/// Upgrade one set report in place. Returns whether its derived figures must
/// be recomputed.
fn migrate_report(report: &mut Value) -> Result<bool, StorageError> {
    let Value::Object(fields) = report else {
        return Err(StorageError::Corrupt("set report is not an object".to_string()));
    };

    rename_keys(fields, REPORT_KEYS);

    let log = fields.entry("point_log").or_insert_with(|| json!([]));
    migrate_point_log(log);

    if let Some(Value::Object(counts)) = fields.get_mut("point_counts") {
        rename_keys(counts, COUNT_KEYS);
    }
    for key in ["rotation_stats", "rival_rotation_stats"] {
        if let Some(table) = fields.get_mut(key) {
            migrate_rotation_table(table);
        }
    }

    let missing_totals = !fields.contains_key("point_counts") || !fields.contains_key("final_score");
    if missing_totals {
        let log: PointLog = serde_json::from_value(fields["point_log"].clone())?;
        let counts = log.counts();
        fields
            .entry("point_counts")
            .or_insert_with(|| json!(counts));
        fields
            .entry("final_score")
            .or_insert_with(|| json!(counts.score()));
    }

    let stale = missing_totals
        || DERIVED_REPORT_KEYS
            .iter()
            .any(|key| fields.get(*key).map_or(true, Value::is_null));
    Ok(stale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculate::report_for_log;
    use crate::models::{
        MatchSetup, PointCategory, PointType, RotationPair, SetScore, Team, TeamPair,
    };
    use crate::tracker::record_point;
    use pretty_assertions::assert_eq;

    fn legacy_document() -> Value {
        json!({
            "matchId": "legacy-1",
            "teamNames": { "own": "Home", "rival": "Away" },
            "location": "Gym",
            "date": "2024-05-10",
            "time": "18:30",
            "currentSet": 2,
            "currentSetPointsLog": ["PPM", "PRM"],
            "setsWon": { "own": 1, "rival": 0 },
            "matchHistory": [{
                "setNumber": 1,
                "finalScore": { "own": 2, "rival": 1 },
                "pointCounts": { "PPM": 1, "PRE": 1, "PPE": 0, "PRM": 1 },
                "ownEfficiency": 1.0,
                "rivalErrorImpact": 1.0,
                "pointLog": ["PPM", "PRM", "PRE"],
                "rotationStats": {},
                "rivalRotationStats": {}
            }],
            "isMatchOver": false,
            "firstServeBy": ["own", "rival"],
            "currentRotation": 3
        })
    }

    #[test]
    fn test_migrates_legacy_document() {
        let data = migrate_document("legacy-1", legacy_document()).unwrap();

        assert_eq!(data.id.as_str(), "legacy-1");
        assert_eq!(data.team_names.rival, "Away");
        assert_eq!(data.team_colors, default_team_colors());
        assert_eq!(data.date, NaiveDate::from_ymd_opt(2024, 5, 10));
        assert_eq!(data.time, NaiveTime::from_hms_opt(18, 30, 0));
        assert_eq!(data.current_set, 2);
        assert_eq!(data.sets_won, SetScore::new(1, 0));
        assert_eq!(data.current_set_log.len(), 2);
        assert_eq!(data.current_set_log.as_slice()[0].category, PointCategory::Other);
        assert_eq!(data.current_rotation.own.get(), 3);
        assert_eq!(data.current_rotation.rival.get(), 1);
        assert_eq!(data.first_server(2), Some(Team::Rival));
    }

    #[test]
    fn test_recomputes_missing_report_figures() {
        let data = migrate_document("legacy-1", legacy_document()).unwrap();
        let report = &data.history[0];

        // Own served first: PPM break, PRM sideout, PRE sideout
        assert_eq!(report.point_counts.own_points, 1);
        assert_eq!(report.break_points, TeamPair::new(1, 0));
        assert_eq!(report.rival_rotation_stats.total().sideout_chances, 2);
        assert_eq!(report.rotation_stats.total().sideouts, 1);
        assert_eq!(report.sideout_percentage.own, 1.0);
    }

    #[test]
    fn test_shared_event_rotation_is_own_rotation() {
        let doc = json!({
            "matchId": "older",
            "teamNames": { "own": "Home", "rival": "Away" },
            "currentSet": 2,
            "currentSetPointsLog": [{ "type": "PPM", "category": "ATAQUE", "rotation": 4 }],
            "setsWon": { "own": 0, "rival": 1 },
            "matchHistory": [{
                "setNumber": 1,
                "finalScore": { "own": 1, "rival": 2 },
                "pointCounts": { "PPM": 1, "PRE": 0, "PPE": 1, "PRM": 1 },
                "ownEfficiency": 0.0,
                "rivalErrorImpact": 1.0,
                "pointLog": [
                    { "type": "PPM", "category": "ATAQUE", "rotation": 4 },
                    { "type": "PRM", "category": "SAQUE", "rotation": 4 },
                    { "type": "PPE", "category": "OTRO", "rotation": 3 }
                ],
                "rotationStats": { "1": { "gp": 0, "sideouts": 0, "sideoutChances": 0 } },
                "sideoutPercentage": { "own": 0.0, "rival": 0.0 },
                "pointsPerServe": { "own": 0.0, "rival": 0.0 },
                "breakPoints": { "own": 0, "rival": 0 }
            }],
            "firstServeBy": ["own"],
            "currentRotation": 4,
            "createdAt": "2023-09-01T10:00:00Z"
        });
        let data = migrate_document("older", doc).unwrap();

        let live = data.current_set_log.as_slice()[0];
        assert_eq!(live.own_rotation.get(), 4);
        assert_eq!(live.rival_rotation, Rotation::default());

        // No rival table stored, so the report is rebuilt from the log
        let report = &data.history[0];
        let own = &report.rotation_stats;
        assert_eq!(own.get(Rotation::new(4).unwrap()).gp, 0);
        assert_eq!(own.get(Rotation::new(3).unwrap()).gp, -1);
        assert_eq!(own.get(Rotation::new(3).unwrap()).sideout_chances, 1);
        assert_eq!(own.get(Rotation::default()).gp, 0);
        assert_eq!(report.rival_rotation_stats.get(Rotation::default()).gp, 1);
        assert_eq!(report.break_points, TeamPair::new(1, 1));
    }

    #[test]
    fn test_current_documents_pass_through() {
        let mut data = MatchData::new(MatchSetup::new("Home", "Away"));
        data.set_first_server(1, Team::Own);
        record_point(&mut data, PointType::RivalPointFromPlay, PointCategory::Block);
        record_point(&mut data, PointType::OwnPointFromRivalError, PointCategory::Serve);
        data.history
            .push(report_for_log(1, &data.current_set_log, Some(Team::Own)));

        let value = serde_json::to_value(&data).unwrap();
        let migrated = migrate_document(data.id.as_str(), value).unwrap();
        assert_eq!(migrated, data);
    }

    #[test]
    fn test_out_of_range_rotations_reset() {
        let doc = json!({
            "id": "x",
            "team_names": { "own": "A", "rival": "B" },
            "current_set": 1,
            "current_set_log": [
                { "type": "own_point_from_play", "own_rotation": 9, "rival_rotation": 0 }
            ],
            "current_rotation": { "own": 7, "rival": 2 },
            "starting_rotations": [4],
            "created_at": "2024-01-01T00:00:00Z"
        });
        let data = migrate_document("x", doc).unwrap();

        let event = data.current_set_log.as_slice()[0];
        assert_eq!(event.own_rotation, Rotation::default());
        assert_eq!(event.rival_rotation, Rotation::default());
        assert_eq!(data.current_rotation.own, Rotation::default());
        assert_eq!(data.current_rotation.rival.get(), 2);
        assert_eq!(
            data.starting_rotation(1),
            RotationPair::new(Rotation::new(4).unwrap(), Rotation::default())
        );
    }

    #[test]
    fn test_blank_date_and_time_become_none() {
        let mut doc = legacy_document();
        doc["date"] = json!("");
        doc["time"] = json!("not a time");
        let data = migrate_document("legacy-1", doc).unwrap();
        assert_eq!(data.date, None);
        assert_eq!(data.time, None);
    }

    #[test]
    fn test_rejects_unparseable_documents() {
        assert!(migrate_document("x", json!([1, 2, 3])).is_err());
        assert!(migrate_document("x", json!({ "id": "x" })).is_err());

        let mut doc = legacy_document();
        doc["currentSetPointsLog"] = json!(["XYZ"]);
        assert!(migrate_document("legacy-1", doc).is_err());
    }
}
