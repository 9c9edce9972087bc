use std::collections::BTreeMap;

use serde::Serialize;

use crate::event_table::{EventRecord, EventType};

pub const PROGRESSIVE_PASS_MIN_X: f64 = 15.0;
pub const FINAL_THIRD_X: f64 = 80.0;
pub const BOX_ENTRY_X: f64 = 102.0;
pub const BOX_Y_MIN: f64 = 18.0;
pub const BOX_Y_MAX: f64 = 62.0;

/// Derived per-event flags.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EventFlags {
    /// `pass_end_x - loc_x`, only for passes with both coordinates.
    pub pass_len_x: Option<f64>,
    pub is_pass: bool,
    pub prog_pass: bool,
    pub final_third_entry: bool,
    pub box_entry_pass: bool,
    pub is_carry: bool,
    pub is_shot: bool,
    pub is_def: bool,
}

pub fn event_flags(event: &EventRecord) -> EventFlags {
    let mut flags = EventFlags {
        is_carry: event.is_type(&EventType::Carry) && event.loc_x.is_some(),
        is_shot: event.is_type(&EventType::Shot),
        is_def: event
            .event_type
            .as_ref()
            .is_some_and(EventType::is_defensive),
        ..EventFlags::default()
    };

    if !event.is_type(&EventType::Pass) {
        return flags;
    }
    let (Some(start_x), Some(end_x)) = (event.loc_x, event.pass_end_x) else {
        return flags;
    };

    let len_x = end_x - start_x;
    flags.is_pass = true;
    flags.pass_len_x = Some(len_x);
    flags.prog_pass = len_x >= PROGRESSIVE_PASS_MIN_X;
    flags.final_third_entry = end_x >= FINAL_THIRD_X && start_x < FINAL_THIRD_X;
    flags.box_entry_pass = end_x >= BOX_ENTRY_X
        && event
            .pass_end_y
            .is_some_and(|y| (BOX_Y_MIN..=BOX_Y_MAX).contains(&y));
    flags
}

pub fn add_engineered_flags(events: &[EventRecord]) -> Vec<EventFlags> {
    events.iter().map(event_flags).collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressionWeights {
    pub prog_pass_per_100: f64,
    pub final_third_entries_per_100: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreationWeights {
    pub box_entry_pass_per_100: f64,
    pub shots_per_100: f64,
}

/// Coefficients of the three composite axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisWeights {
    pub ball_progression: ProgressionWeights,
    pub chance_creation: CreationWeights,
    pub def_intensity: f64,
}

impl AxisWeights {
    pub const STANDARD: Self = Self {
        ball_progression: ProgressionWeights {
            prog_pass_per_100: 0.6,
            final_third_entries_per_100: 0.4,
        },
        chance_creation: CreationWeights {
            box_entry_pass_per_100: 0.7,
            shots_per_100: 0.3,
        },
        def_intensity: 1.0,
    };

    pub fn ball_progression(&self, rates: &RateMetrics) -> f64 {
        let w = self.ball_progression;
        w.prog_pass_per_100 * rates.prog_pass_per_100
            + w.final_third_entries_per_100 * rates.final_third_entries_per_100
    }

    pub fn chance_creation(&self, rates: &RateMetrics) -> f64 {
        let w = self.chance_creation;
        w.box_entry_pass_per_100 * rates.box_entry_pass_per_100 + w.shots_per_100 * rates.shots_per_100
    }

    pub fn def_intensity(&self, rates: &RateMetrics) -> f64 {
        self.def_intensity * rates.def_actions_per_100
    }
}

impl Default for AxisWeights {
    fn default() -> Self {
        Self::STANDARD
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RateMetrics {
    pub prog_pass_per_100: f64,
    pub def_actions_per_100: f64,
    pub shots_per_100: f64,
    pub box_entry_pass_per_100: f64,
    pub final_third_entries_per_100: f64,
}

/// Count per 100 events. Zero events yields 0.0 rather than an undefined rate.
pub fn per_100(count: usize, events: usize) -> f64 {
    if events == 0 {
        return 0.0;
    }
    count as f64 / (events as f64 / 100.0)
}

/// One aggregated row per (team, player).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerFeatureRow {
    pub team: String,
    pub player: String,
    pub events: usize,
    pub passes: usize,
    pub carries: usize,
    pub shots: usize,
    pub def_actions: usize,
    pub prog_passes: usize,
    pub final_third_entries: usize,
    pub box_entry_passes: usize,
    pub under_pressure_rate: f64,
    pub xg_sum: f64,
    #[serde(flatten)]
    pub rates: RateMetrics,
    pub ball_progression: f64,
    pub chance_creation: f64,
    pub def_intensity: f64,
}

impl PlayerFeatureRow {
    pub fn shots_per_100(&self) -> f64 {
        self.rates.shots_per_100
    }
}

#[derive(Debug, Clone, Default)]
struct GroupTotals {
    events: usize,
    passes: usize,
    carries: usize,
    shots: usize,
    def_actions: usize,
    prog_passes: usize,
    final_third_entries: usize,
    box_entry_passes: usize,
    under_pressure: usize,
    xg_sum: Option<f64>,
}

impl GroupTotals {
    fn add(&mut self, event: &EventRecord, flags: &EventFlags) {
        self.events += 1;
        self.passes += usize::from(flags.is_pass);
        self.carries += usize::from(flags.is_carry);
        self.shots += usize::from(flags.is_shot);
        self.def_actions += usize::from(flags.is_def);
        self.prog_passes += usize::from(flags.prog_pass);
        self.final_third_entries += usize::from(flags.final_third_entry);
        self.box_entry_passes += usize::from(flags.box_entry_pass);
        self.under_pressure += usize::from(event.under_pressure);
        if let Some(xg) = event.shot_xg {
            *self.xg_sum.get_or_insert(0.0) += xg;
        }
    }

    fn into_row(self, team: String, player: String, weights: &AxisWeights) -> PlayerFeatureRow {
        let rates = RateMetrics {
            prog_pass_per_100: per_100(self.prog_passes, self.events),
            def_actions_per_100: per_100(self.def_actions, self.events),
            shots_per_100: per_100(self.shots, self.events),
            box_entry_pass_per_100: per_100(self.box_entry_passes, self.events),
            final_third_entries_per_100: per_100(self.final_third_entries, self.events),
        };
        let under_pressure_rate = if self.events == 0 {
            0.0
        } else {
            self.under_pressure as f64 / self.events as f64
        };
        PlayerFeatureRow {
            team,
            player,
            events: self.events,
            passes: self.passes,
            carries: self.carries,
            shots: self.shots,
            def_actions: self.def_actions,
            prog_passes: self.prog_passes,
            final_third_entries: self.final_third_entries,
            box_entry_passes: self.box_entry_passes,
            under_pressure_rate,
            // A group without any xG value reports 0.0.
            xg_sum: self.xg_sum.unwrap_or(0.0),
            ball_progression: weights.ball_progression(&rates),
            chance_creation: weights.chance_creation(&rates),
            def_intensity: weights.def_intensity(&rates),
            rates,
        }
    }
}

pub fn build_player_features(events: &[EventRecord]) -> Vec<PlayerFeatureRow> {
    build_player_features_with(events, &AxisWeights::STANDARD)
}

/// Aggregates events by (team, player), sorted by team then player. Rows missing either
/// key are left out.
pub fn build_player_features_with(
    events: &[EventRecord],
    weights: &AxisWeights,
) -> Vec<PlayerFeatureRow> {
    let mut groups: BTreeMap<(&str, &str), GroupTotals> = BTreeMap::new();
    for event in events {
        let (Some(team), Some(player)) = (event.team.as_deref(), event.player.as_deref()) else {
            continue;
        };
        groups
            .entry((team, player))
            .or_default()
            .add(event, &event_flags(event));
    }

    groups
        .into_iter()
        .map(|((team, player), totals)| {
            totals.into_row(team.to_string(), player.to_string(), weights)
        })
        .collect()
}
