use std::fmt;
use std::path::Path;

use anyhow::Result;
use serde_json::Value;

use crate::open_data;

/// Event type names the analysis cares about; everything else is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    Pass,
    Carry,
    Shot,
    Pressure,
    Duel,
    Interception,
    BallRecovery,
    Clearance,
    Block,
    FoulCommitted,
    Other(String),
}

impl EventType {
    pub fn from_name(name: &str) -> Self {
        match name {
            "Pass" => Self::Pass,
            "Carry" => Self::Carry,
            "Shot" => Self::Shot,
            "Pressure" => Self::Pressure,
            "Duel" => Self::Duel,
            "Interception" => Self::Interception,
            "Ball Recovery" => Self::BallRecovery,
            "Clearance" => Self::Clearance,
            "Block" => Self::Block,
            "Foul Committed" => Self::FoulCommitted,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pass => "Pass",
            Self::Carry => "Carry",
            Self::Shot => "Shot",
            Self::Pressure => "Pressure",
            Self::Duel => "Duel",
            Self::Interception => "Interception",
            Self::BallRecovery => "Ball Recovery",
            Self::Clearance => "Clearance",
            Self::Block => "Block",
            Self::FoulCommitted => "Foul Committed",
            Self::Other(name) => name,
        }
    }

    /// Pressing-type actions: Pressure, Duel, Interception, Ball Recovery.
    pub fn is_press(&self) -> bool {
        matches!(
            self,
            Self::Pressure | Self::Duel | Self::Interception | Self::BallRecovery
        )
    }

    /// Actions that count as a regained ball after a press.
    pub fn is_recovery(&self) -> bool {
        matches!(self, Self::BallRecovery | Self::Interception)
    }

    pub fn is_defensive(&self) -> bool {
        self.is_press() || matches!(self, Self::Clearance | Self::Block | Self::FoulCommitted)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One flattened row of the event table.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub match_id: u64,
    pub home_team: String,
    pub away_team: String,
    pub team: Option<String>,
    pub player: Option<String>,
    pub period: u32,
    pub minute: u32,
    pub second: u32,
    pub event_type: Option<EventType>,
    pub possession: Option<i64>,
    pub play_pattern: Option<String>,
    pub loc_x: Option<f64>,
    pub loc_y: Option<f64>,
    pub pass_end_x: Option<f64>,
    pub pass_end_y: Option<f64>,
    pub under_pressure: bool,
    pub shot_xg: Option<f64>,
}

impl EventRecord {
    pub fn is_type(&self, kind: &EventType) -> bool {
        self.event_type.as_ref() == Some(kind)
    }

    pub fn type_name(&self) -> Option<&str> {
        self.event_type.as_ref().map(EventType::as_str)
    }

    pub fn is_team(&self, team: &str) -> bool {
        self.team.as_deref() == Some(team)
    }
}

#[derive(Debug, Clone)]
pub struct EventTableBuild {
    pub events: Vec<EventRecord>,
    pub matches_listed: usize,
    pub matches_read: usize,
    pub missing_matches: Vec<u64>,
}

/// Flattens every match of a competition season into one event table.
pub fn build_events_table(
    root: &Path,
    competition_id: u32,
    season_id: u32,
) -> Result<EventTableBuild> {
    let matches = open_data::list_matches(root, competition_id, season_id)?;
    log::info!(
        "building event table for competition {competition_id} season {season_id}: {} matches listed",
        matches.len()
    );

    let mut events = Vec::new();
    let mut matches_read = 0usize;
    let mut missing_matches = Vec::new();

    for m in &matches {
        if !open_data::events_path(root, m.match_id).exists() {
            log::warn!("match {} has no event file, skipping", m.match_id);
            missing_matches.push(m.match_id);
            continue;
        }
        let raw_events = open_data::read_events(root, m.match_id)?;
        log::debug!("match {}: {} raw events", m.match_id, raw_events.len());
        events.extend(
            raw_events
                .iter()
                .map(|raw| flatten_event(m.match_id, m.home_team(), m.away_team(), raw)),
        );
        matches_read += 1;
    }

    log::info!("event table built: {} rows from {matches_read} matches", events.len());
    Ok(EventTableBuild {
        events,
        matches_listed: matches.len(),
        matches_read,
        missing_matches,
    })
}

pub fn flatten_event(match_id: u64, home_team: &str, away_team: &str, raw: &Value) -> EventRecord {
    let (loc_x, loc_y) = flatten_location(raw.get("location"));

    let (pass_end_x, pass_end_y) = match raw.get("pass") {
        Some(pass) if pass.is_object() => flatten_location(pass.get("end_location")),
        _ => (None, None),
    };

    let shot_xg = match raw.get("shot") {
        Some(shot) if shot.is_object() => shot.get("statsbomb_xg").and_then(Value::as_f64),
        _ => None,
    };

    EventRecord {
        match_id,
        home_team: home_team.to_string(),
        away_team: away_team.to_string(),
        team: nested_name(raw, "team"),
        player: nested_name(raw, "player"),
        period: as_u32(raw.get("period")),
        minute: as_u32(raw.get("minute")),
        second: as_u32(raw.get("second")),
        event_type: nested_name(raw, "type").map(|name| EventType::from_name(&name)),
        possession: raw.get("possession").and_then(Value::as_i64),
        play_pattern: nested_name(raw, "play_pattern"),
        loc_x,
        loc_y,
        pass_end_x,
        pass_end_y,
        under_pressure: raw
            .get("under_pressure")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        shot_xg,
    }
}

/// `[x, y, ...]` with numeric x and y; anything else is a missing pair.
pub fn flatten_location(value: Option<&Value>) -> (Option<f64>, Option<f64>) {
    let Some(items) = value.and_then(Value::as_array) else {
        return (None, None);
    };
    if items.len() < 2 {
        return (None, None);
    }
    match (items[0].as_f64(), items[1].as_f64()) {
        (Some(x), Some(y)) => (Some(x), Some(y)),
        _ => (None, None),
    }
}

fn nested_name(raw: &Value, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(|v| v.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn as_u32(value: Option<&Value>) -> u32 {
    value
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn location_requires_two_numeric_items() {
        assert_eq!(
            flatten_location(Some(&json!([60.5, 40.0]))),
            (Some(60.5), Some(40.0))
        );
        assert_eq!(
            flatten_location(Some(&json!([118.0, 41.0, 2.1]))),
            (Some(118.0), Some(41.0))
        );
        assert_eq!(flatten_location(Some(&json!([60.5]))), (None, None));
        assert_eq!(flatten_location(Some(&json!("60,40"))), (None, None));
        assert_eq!(flatten_location(Some(&json!([null, 40.0]))), (None, None));
        assert_eq!(flatten_location(None), (None, None));
    }

    #[test]
    fn event_type_names_round_trip() {
        for name in ["Pass", "Ball Recovery", "Foul Committed", "Dribbled Past"] {
            assert_eq!(EventType::from_name(name).as_str(), name);
        }
        assert!(EventType::BallRecovery.is_press());
        assert!(EventType::Clearance.is_defensive());
        assert!(!EventType::Clearance.is_press());
        assert!(!EventType::Other("Pressure ".to_string()).is_press());
    }

    #[test]
    fn flatten_event_only_fills_applicable_fields() {
        let raw = json!({
            "period": 1,
            "minute": 12,
            "second": 7,
            "type": {"id": 30, "name": "Pass"},
            "team": {"id": 1, "name": "Alpha"},
            "player": {"id": 9, "name": "A. Nine"},
            "possession": 14,
            "play_pattern": {"name": "Regular Play"},
            "location": [50.0, 30.0],
            "pass": {"end_location": [70.0, 35.0]}
        });
        let row = flatten_event(7, "Alpha", "Beta", &raw);
        assert_eq!(row.event_type, Some(EventType::Pass));
        assert_eq!(row.pass_end_x, Some(70.0));
        assert_eq!(row.shot_xg, None);
        assert!(!row.under_pressure);
        assert_eq!(row.possession, Some(14));
        assert_eq!(row.minute, 12);

        let shot = json!({
            "type": {"name": "Shot"},
            "under_pressure": true,
            "location": "bad",
            "shot": {"statsbomb_xg": 0.31}
        });
        let row = flatten_event(7, "Alpha", "Beta", &shot);
        assert_eq!(row.shot_xg, Some(0.31));
        assert_eq!((row.loc_x, row.loc_y), (None, None));
        assert_eq!(row.pass_end_x, None);
        assert!(row.under_pressure);
        assert_eq!(row.team, None);
    }
}
