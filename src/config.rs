use std::path::PathBuf;

const DEFAULT_OPEN_DATA_DIR: &str = "data/raw/statsbomb-open-data";
const DEFAULT_EVENTS_PATH: &str = "data/processed/events.parquet";
const DEFAULT_COMPETITION_ID: u32 = 2;
const DEFAULT_SEASON_ID: u32 = 44;
const DEFAULT_PRESS_WINDOW: usize = crate::press::DEFAULT_WINDOW_EVENTS;
const DEFAULT_GRID: HeatGrid = HeatGrid { x: 6, y: 4 };
const DEFAULT_LINEUP_SIZE: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatGrid {
    pub x: usize,
    pub y: usize,
}

impl Default for HeatGrid {
    fn default() -> Self {
        DEFAULT_GRID
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub open_data_dir: PathBuf,
    pub events_path: PathBuf,
    pub competition_id: u32,
    pub season_id: u32,
    pub press_window: usize,
    pub heat_grid: HeatGrid,
    pub lineup_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            open_data_dir: PathBuf::from(DEFAULT_OPEN_DATA_DIR),
            events_path: PathBuf::from(DEFAULT_EVENTS_PATH),
            competition_id: DEFAULT_COMPETITION_ID,
            season_id: DEFAULT_SEASON_ID,
            press_window: DEFAULT_PRESS_WINDOW,
            heat_grid: DEFAULT_GRID,
            lineup_size: DEFAULT_LINEUP_SIZE,
        }
    }
}

impl AppConfig {
    /// Loads `.env.local` / `.env` (when present) and reads the `PITCH_*` variables.
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            open_data_dir: non_empty("PITCH_OPEN_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.open_data_dir),
            events_path: non_empty("PITCH_EVENTS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.events_path),
            competition_id: non_empty("PITCH_COMPETITION_ID")
                .and_then(|v| v.trim().parse::<u32>().ok())
                .unwrap_or(defaults.competition_id),
            season_id: non_empty("PITCH_SEASON_ID")
                .and_then(|v| v.trim().parse::<u32>().ok())
                .unwrap_or(defaults.season_id),
            press_window: non_empty("PITCH_PRESS_WINDOW")
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(defaults.press_window),
            heat_grid: non_empty("PITCH_HEAT_GRID")
                .and_then(|v| parse_grid(&v))
                .unwrap_or(defaults.heat_grid),
            lineup_size: non_empty("PITCH_LINEUP_SIZE")
                .and_then(|v| v.trim().parse::<usize>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.lineup_size),
        }
    }
}

/// Parses `"6x4"` style grid specs. Both dimensions must be at least 1.
pub fn parse_grid(raw: &str) -> Option<HeatGrid> {
    let (x, y) = raw.trim().split_once(['x', 'X'])?;
    let x = x.trim().parse::<usize>().ok().filter(|n| *n > 0)?;
    let y = y.trim().parse::<usize>().ok().filter(|n| *n > 0)?;
    Some(HeatGrid { x, y })
}
