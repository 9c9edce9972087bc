//! Event-based pressing proxies: where a team presses, what it presses after, and how often
//! a press is followed by a regain.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::config::HeatGrid;
use crate::event_table::EventRecord;

/// Opponent-half proxy for a high press.
pub const HIGH_PRESS_X: f64 = 60.0;
pub const DEFAULT_WINDOW_EVENTS: usize = 5;
pub const UNKNOWN_TYPE: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeatCell {
    pub bin_x: usize,
    pub bin_y: usize,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PressHeatmap {
    pub cells: Vec<HeatCell>,
    pub high_share: f64,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerCount {
    pub previous_type: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PressSuccess {
    pub press_events: usize,
    pub successes: usize,
    pub success_rate: f64,
    pub window_events: usize,
}

fn is_team_press(event: &EventRecord, team: &str) -> bool {
    event.is_team(team) && event.event_type.as_ref().is_some_and(|t| t.is_press())
}

/// Buckets the team's located press events into an equal-width grid spanning the observed
/// x and y ranges. Cells are ordered by (bin_x, bin_y); empty cells are omitted.
pub fn press_intensity_heatmap(events: &[EventRecord], team: &str, grid: HeatGrid) -> PressHeatmap {
    let points = events
        .iter()
        .filter(|e| is_team_press(e, team))
        .filter_map(|e| Some((e.loc_x?, e.loc_y?)))
        .collect::<Vec<_>>();

    if points.is_empty() {
        return PressHeatmap {
            cells: Vec::new(),
            high_share: 0.0,
            total: 0,
        };
    }

    let xs = points.iter().map(|(x, _)| *x).collect::<Vec<_>>();
    let ys = points.iter().map(|(_, y)| *y).collect::<Vec<_>>();
    let x_bins = EqualWidthBins::spanning(&xs, grid.x.max(1));
    let y_bins = EqualWidthBins::spanning(&ys, grid.y.max(1));

    let mut counts: BTreeMap<(usize, usize), usize> = BTreeMap::new();
    for (x, y) in &points {
        *counts.entry((x_bins.bin(*x), y_bins.bin(*y))).or_default() += 1;
    }

    let high = points.iter().filter(|(x, _)| *x >= HIGH_PRESS_X).count();
    PressHeatmap {
        cells: counts
            .into_iter()
            .map(|((bin_x, bin_y), count)| HeatCell { bin_x, bin_y, count })
            .collect(),
        high_share: high as f64 / points.len() as f64,
        total: points.len(),
    }
}

/// Right-closed equal-width intervals over `[min, max]`, lowest value included.
#[derive(Debug, Clone)]
struct EqualWidthBins {
    edges: Vec<f64>,
    degenerate: bool,
}

impl EqualWidthBins {
    fn spanning(values: &[f64], bins: usize) -> Self {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if max <= min {
            return Self {
                edges: vec![min; bins + 1],
                degenerate: true,
            };
        }

        let step = (max - min) / bins as f64;
        let mut edges = (0..=bins).map(|k| min + k as f64 * step).collect::<Vec<_>>();
        edges[bins] = max;
        edges[0] -= (max - min) * 0.001;
        Self {
            edges,
            degenerate: false,
        }
    }

    fn count(&self) -> usize {
        self.edges.len() - 1
    }

    fn bin(&self, value: f64) -> usize {
        let last = self.count() - 1;
        if self.degenerate {
            return last / 2;
        }
        self.edges[1..]
            .iter()
            .position(|edge| value <= *edge)
            .unwrap_or(last)
    }
}

/// All events grouped per match (ascending id), each group ordered by period, minute, second.
/// The sort is stable so same-second events keep file order.
fn chronological_by_match(events: &[EventRecord]) -> Vec<Vec<&EventRecord>> {
    let mut ordered = events.iter().collect::<Vec<_>>();
    ordered.sort_by_key(|e| (e.match_id, e.period, e.minute, e.second));

    let mut out: Vec<Vec<&EventRecord>> = Vec::new();
    for event in ordered {
        match out.last_mut() {
            Some(current) if current[0].match_id == event.match_id => current.push(event),
            _ => out.push(vec![event]),
        }
    }
    out
}

/// Frequency table of the event type immediately preceding each of the team's press events
/// (any team), most frequent first. Ties keep first-seen order.
pub fn press_triggers(events: &[EventRecord], team: &str) -> Vec<TriggerCount> {
    let mut table: Vec<TriggerCount> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for match_events in chronological_by_match(events) {
        for pair in match_events.windows(2) {
            let (prev, current) = (pair[0], pair[1]);
            if !is_team_press(current, team) {
                continue;
            }
            let name = prev.type_name().unwrap_or(UNKNOWN_TYPE);
            match index.get(name) {
                Some(&slot) => table[slot].count += 1,
                None => {
                    index.insert(name.to_string(), table.len());
                    table.push(TriggerCount {
                        previous_type: name.to_string(),
                        count: 1,
                    });
                }
            }
        }
    }

    table.sort_by(|a, b| b.count.cmp(&a.count));
    table
}

/// A press succeeds when one of the next `window_events` events of the same match is a Ball
/// Recovery or Interception by the same team. Windows of consecutive presses may overlap.
pub fn press_success_proxy(events: &[EventRecord], team: &str, window_events: usize) -> PressSuccess {
    let mut press_events = 0usize;
    let mut successes = 0usize;

    for match_events in chronological_by_match(events) {
        for (idx, event) in match_events.iter().enumerate() {
            if !is_team_press(event, team) {
                continue;
            }
            press_events += 1;
            let end = idx.saturating_add(window_events).min(match_events.len() - 1);
            let regained = match_events[idx + 1..=end].iter().any(|e| {
                e.is_team(team) && e.event_type.as_ref().is_some_and(|t| t.is_recovery())
            });
            if regained {
                successes += 1;
            }
        }
    }

    PressSuccess {
        press_events,
        successes,
        success_rate: if press_events == 0 {
            0.0
        } else {
            successes as f64 / press_events as f64
        },
        window_events,
    }
}
