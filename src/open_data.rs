use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct Competition {
    pub competition_id: u32,
    pub season_id: u32,
    #[serde(default)]
    pub competition_name: String,
    #[serde(default)]
    pub season_name: String,
    #[serde(default)]
    pub country_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchInfo {
    pub match_id: u64,
    #[serde(default)]
    pub match_date: Option<String>,
    home_team: HomeTeam,
    away_team: AwayTeam,
}

#[derive(Debug, Clone, Deserialize)]
struct HomeTeam {
    home_team_name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct AwayTeam {
    away_team_name: String,
}

impl MatchInfo {
    pub fn home_team(&self) -> &str {
        &self.home_team.home_team_name
    }

    pub fn away_team(&self) -> &str {
        &self.away_team.away_team_name
    }
}

pub fn competitions_path(root: &Path) -> PathBuf {
    root.join("data").join("competitions.json")
}

pub fn matches_path(root: &Path, competition_id: u32, season_id: u32) -> PathBuf {
    root.join("data")
        .join("matches")
        .join(competition_id.to_string())
        .join(format!("{season_id}.json"))
}

pub fn events_path(root: &Path, match_id: u64) -> PathBuf {
    root.join("data").join("events").join(format!("{match_id}.json"))
}

pub fn list_competitions(root: &Path) -> Result<Vec<Competition>> {
    read_json(&competitions_path(root))
}

pub fn list_matches(root: &Path, competition_id: u32, season_id: u32) -> Result<Vec<MatchInfo>> {
    read_json(&matches_path(root, competition_id, season_id))
}

/// Raw nested event objects for one match, in file order.
pub fn read_events(root: &Path, match_id: u64) -> Result<Vec<Value>> {
    read_json(&events_path(root, match_id))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))
}
