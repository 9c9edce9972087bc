use std::collections::BTreeSet;

use anyhow::Result;
use once_cell::unsync::OnceCell;
use serde::Serialize;
use thiserror::Error;

use crate::config::AppConfig;
use crate::dataset;
use crate::event_table::EventRecord;
use crate::features::{PlayerFeatureRow, build_player_features};
use crate::press::{
    PressHeatmap, PressSuccess, TriggerCount, press_intensity_heatmap, press_success_proxy,
    press_triggers,
};
use crate::tactics::{
    PatternRecommendation, TeamSummary, best_role, recommend_patterns, role_fit_scores,
    team_summary,
};

pub const TRIGGER_ROWS: usize = 10;

/// Selections that match nothing. Reported to the caller rather than treated as a failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("no events found for team {0}")]
    UnknownTeam(String),
    #[error("team {0} has events but none with a player name")]
    NoNamedPlayers(String),
    #[error("no player feature rows for the selected lineup of {team}")]
    EmptyLineup { team: String },
}

#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub team: String,
    /// `None` analyzes every player of the team.
    pub lineup: Option<Vec<String>>,
    pub opponent: Option<String>,
    /// Overrides the configured press look-ahead.
    pub window_events: Option<usize>,
}

impl AnalysisRequest {
    pub fn for_team(team: impl Into<String>) -> Self {
        Self {
            team: team.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleRow {
    pub player: String,
    pub ball_progression: f64,
    pub chance_creation: f64,
    pub def_intensity: f64,
    pub under_pressure_rate: f64,
    pub best_role: &'static str,
    pub best_role_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamReport {
    pub team: String,
    pub opponent: Option<String>,
    pub players: Vec<RoleRow>,
    pub summary: TeamSummary,
    pub heatmap: PressHeatmap,
    pub triggers: Vec<TriggerCount>,
    pub press_success: PressSuccess,
    pub patterns: Vec<PatternRecommendation>,
}

/// Read-only base tables, loaded on first use and kept until [`Session::reload`].
pub struct Session {
    config: AppConfig,
    events: OnceCell<Vec<EventRecord>>,
    features: OnceCell<Vec<PlayerFeatureRow>>,
}

impl Session {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            events: OnceCell::new(),
            features: OnceCell::new(),
        }
    }

    /// Session over an in-memory table. A later `reload` reads the configured file instead.
    pub fn with_events(config: AppConfig, events: Vec<EventRecord>) -> Self {
        Self {
            config,
            events: OnceCell::with_value(events),
            features: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn events(&self) -> Result<&[EventRecord]> {
        self.events
            .get_or_try_init(|| dataset::read_events_table(&self.config.events_path))
            .map(Vec::as_slice)
    }

    pub fn features(&self) -> Result<&[PlayerFeatureRow]> {
        let events = self.events()?;
        Ok(self
            .features
            .get_or_init(|| build_player_features(events))
            .as_slice())
    }

    pub fn reload(&mut self) {
        self.events.take();
        self.features.take();
        log::info!("base tables dropped, next access reloads {}", self.config.events_path.display());
    }

    pub fn is_loaded(&self) -> bool {
        self.events.get().is_some()
    }

    pub fn teams(&self) -> Result<Vec<String>> {
        let teams = self
            .events()?
            .iter()
            .filter_map(|e| e.team.clone())
            .collect::<BTreeSet<_>>();
        Ok(teams.into_iter().collect())
    }

    pub fn players(&self, team: &str) -> Result<Vec<String>> {
        let players = self
            .events()?
            .iter()
            .filter(|e| e.is_team(team))
            .filter_map(|e| e.player.clone())
            .collect::<BTreeSet<_>>();
        Ok(players.into_iter().collect())
    }

    /// First `lineup_size` players of the team in name order.
    pub fn default_lineup(&self, team: &str) -> Result<Vec<String>> {
        let mut players = self.players(team)?;
        players.truncate(self.config.lineup_size);
        Ok(players)
    }

    pub fn analyze(&self, request: &AnalysisRequest) -> Result<TeamReport> {
        let events = self.events()?;
        let features = self.features()?;

        let team_rows = features
            .iter()
            .filter(|r| r.team == request.team)
            .collect::<Vec<_>>();
        if team_rows.is_empty() {
            let team = request.team.clone();
            if events.iter().any(|e| e.is_team(&team)) {
                return Err(AnalysisError::NoNamedPlayers(team).into());
            }
            return Err(AnalysisError::UnknownTeam(team).into());
        }

        let lineup_rows = match &request.lineup {
            Some(lineup) => team_rows
                .into_iter()
                .filter(|r| lineup.iter().any(|p| *p == r.player))
                .collect::<Vec<_>>(),
            None => team_rows,
        };
        let Some(summary) = team_summary(lineup_rows.iter().copied()) else {
            return Err(AnalysisError::EmptyLineup {
                team: request.team.clone(),
            }
            .into());
        };

        let mut players = lineup_rows
            .iter()
            .filter_map(|row| role_row(row))
            .collect::<Vec<_>>();
        players.sort_by(|a, b| b.best_role_score.total_cmp(&a.best_role_score));

        let opponent_summary = request.opponent.as_deref().and_then(|opp| {
            let summary = team_summary(features.iter().filter(|r| r.team == opp));
            if summary.is_none() {
                log::debug!("opponent {opp} has no feature rows");
            }
            summary
        });

        let window = request.window_events.unwrap_or(self.config.press_window);
        let mut triggers = press_triggers(events, &request.team);
        triggers.truncate(TRIGGER_ROWS);

        log::info!(
            "analysis for {}: {} players, window {window}",
            request.team,
            players.len()
        );
        Ok(TeamReport {
            team: request.team.clone(),
            opponent: request.opponent.clone(),
            players,
            summary,
            heatmap: press_intensity_heatmap(events, &request.team, self.config.heat_grid),
            triggers,
            press_success: press_success_proxy(events, &request.team, window),
            patterns: recommend_patterns(&summary, opponent_summary.as_ref()),
        })
    }
}

fn role_row(row: &PlayerFeatureRow) -> Option<RoleRow> {
    let scores = role_fit_scores(row);
    let best = best_role(&scores)?;
    Some(RoleRow {
        player: row.player.clone(),
        ball_progression: round_to(row.ball_progression, 2),
        chance_creation: round_to(row.chance_creation, 2),
        def_intensity: round_to(row.def_intensity, 2),
        under_pressure_rate: round_to(row.under_pressure_rate, 3),
        best_role: best.role,
        best_role_score: round_to(best.score, 2),
    })
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

#[cfg(test)]
mod tests {
    use super::round_to;

    #[test]
    fn rounding_matches_display_precision() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(0.12361, 3), 0.124);
        assert_eq!(round_to(-2.349, 2), -2.35);
    }
}
