use std::cmp::Ordering;

use serde::Serialize;

use crate::features::PlayerFeatureRow;

/// Coefficients of one role-fit score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoleWeights {
    pub ball_progression: f64,
    pub chance_creation: f64,
    pub def_intensity: f64,
    pub press_resistance: f64,
    pub shots_per_100: f64,
}

impl RoleWeights {
    const ZERO: Self = Self {
        ball_progression: 0.0,
        chance_creation: 0.0,
        def_intensity: 0.0,
        press_resistance: 0.0,
        shots_per_100: 0.0,
    };

    pub fn score(&self, input: &RoleInputs) -> f64 {
        self.ball_progression * input.ball_progression
            + self.chance_creation * input.chance_creation
            + self.def_intensity * input.def_intensity
            + self.press_resistance * input.press_resistance
            + self.shots_per_100 * input.shots_per_100
    }
}

/// Roles in tie-break order: among equal scores the earlier role wins.
pub const ROLE_PROFILES: [(&str, RoleWeights); 6] = [
    (
        "Deep Playmaker",
        RoleWeights {
            ball_progression: 0.55,
            press_resistance: 0.25,
            chance_creation: 0.20,
            ..RoleWeights::ZERO
        },
    ),
    (
        "Box-to-Box 8",
        RoleWeights {
            ball_progression: 0.35,
            chance_creation: 0.25,
            def_intensity: 0.40,
            ..RoleWeights::ZERO
        },
    ),
    (
        "Creative 10",
        RoleWeights {
            ball_progression: 0.25,
            chance_creation: 0.60,
            press_resistance: 0.15,
            ..RoleWeights::ZERO
        },
    ),
    (
        "Pressing Forward",
        RoleWeights {
            chance_creation: 0.20,
            def_intensity: 0.55,
            shots_per_100: 0.25,
            ..RoleWeights::ZERO
        },
    ),
    (
        "Ball-Winning Mid",
        RoleWeights {
            ball_progression: 0.20,
            chance_creation: 0.10,
            def_intensity: 0.70,
            ..RoleWeights::ZERO
        },
    ),
    (
        "Wide Creator",
        RoleWeights {
            ball_progression: 0.20,
            chance_creation: 0.70,
            press_resistance: 0.10,
            ..RoleWeights::ZERO
        },
    ),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoleInputs {
    pub ball_progression: f64,
    pub chance_creation: f64,
    pub def_intensity: f64,
    pub press_resistance: f64,
    pub shots_per_100: f64,
}

impl RoleInputs {
    pub fn from_row(row: &PlayerFeatureRow) -> Self {
        Self {
            ball_progression: row.ball_progression,
            chance_creation: row.chance_creation,
            def_intensity: row.def_intensity,
            press_resistance: (1.0 - row.under_pressure_rate).max(0.0),
            shots_per_100: row.shots_per_100(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleScore {
    pub role: &'static str,
    pub score: f64,
}

/// Scores for every role, in `ROLE_PROFILES` order.
pub fn role_fit_scores(row: &PlayerFeatureRow) -> Vec<RoleScore> {
    let inputs = RoleInputs::from_row(row);
    ROLE_PROFILES
        .iter()
        .map(|&(role, weights)| RoleScore {
            role,
            score: weights.score(&inputs),
        })
        .collect()
}

pub fn best_role(scores: &[RoleScore]) -> Option<&RoleScore> {
    let mut best: Option<&RoleScore> = None;
    for candidate in scores {
        match best {
            Some(current) if candidate.score <= current.score => {}
            _ => best = Some(candidate),
        }
    }
    best
}

/// Mean axes over a lineup; press resistance is the lineup mean of `1 - under_pressure_rate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TeamSummary {
    pub ball_progression: f64,
    pub chance_creation: f64,
    pub def_intensity: f64,
    pub press_resistance: f64,
}

pub fn team_summary<'a, I>(rows: I) -> Option<TeamSummary>
where
    I: IntoIterator<Item = &'a PlayerFeatureRow>,
{
    let mut n = 0usize;
    let mut total = TeamSummary {
        ball_progression: 0.0,
        chance_creation: 0.0,
        def_intensity: 0.0,
        press_resistance: 0.0,
    };
    for row in rows {
        n += 1;
        total.ball_progression += row.ball_progression;
        total.chance_creation += row.chance_creation;
        total.def_intensity += row.def_intensity;
        total.press_resistance += 1.0 - row.under_pressure_rate;
    }
    if n == 0 {
        return None;
    }
    let n = n as f64;
    Some(TeamSummary {
        ball_progression: total.ball_progression / n,
        chance_creation: total.chance_creation / n,
        def_intensity: total.def_intensity / n,
        press_resistance: total.press_resistance / n,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternWeights {
    pub press_resistance: f64,
    pub ball_progression: f64,
    pub chance_creation: f64,
    pub def_intensity: f64,
}

impl PatternWeights {
    const ZERO: Self = Self {
        press_resistance: 0.0,
        ball_progression: 0.0,
        chance_creation: 0.0,
        def_intensity: 0.0,
    };

    pub fn score(&self, summary: &TeamSummary) -> f64 {
        self.press_resistance * summary.press_resistance
            + self.ball_progression * summary.ball_progression
            + self.chance_creation * summary.chance_creation
            + self.def_intensity * summary.def_intensity
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PatternProfile {
    pub name: &'static str,
    pub rationale: &'static str,
    pub weights: PatternWeights,
}

pub const PATTERN_PROFILES: [PatternProfile; 4] = [
    PatternProfile {
        name: "Bait press → vertical into striker + layoff (3rd man)",
        rationale: "Punishes aggressive pressing: invite pressure, then break lines quickly.",
        weights: PatternWeights {
            press_resistance: 0.45,
            ball_progression: 0.35,
            chance_creation: 0.20,
            ..PatternWeights::ZERO
        },
    },
    PatternProfile {
        name: "Half-space overload + third-man run",
        rationale: "Creates a free man between lines and breaks compact blocks.",
        weights: PatternWeights {
            ball_progression: 0.50,
            chance_creation: 0.40,
            press_resistance: 0.10,
            ..PatternWeights::ZERO
        },
    },
    PatternProfile {
        name: "Counterpress trap after loss (5-second rule)",
        rationale: "Win the ball high and attack before the opponent is set.",
        weights: PatternWeights {
            def_intensity: 0.60,
            press_resistance: 0.20,
            ball_progression: 0.20,
            ..PatternWeights::ZERO
        },
    },
    PatternProfile {
        name: "Fast switch to weak side",
        rationale: "Stretches defensive compactness and creates 1v1 wide.",
        weights: PatternWeights {
            ball_progression: 0.60,
            press_resistance: 0.20,
            chance_creation: 0.20,
            ..PatternWeights::ZERO
        },
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternRecommendation {
    pub name: &'static str,
    pub rationale: &'static str,
    pub score: f64,
}

/// Patterns ranked by score, highest first; equal scores keep `PATTERN_PROFILES` order.
/// The opponent summary is not used by the ranking yet.
pub fn recommend_patterns(
    summary: &TeamSummary,
    _opponent: Option<&TeamSummary>,
) -> Vec<PatternRecommendation> {
    let mut out = PATTERN_PROFILES
        .iter()
        .map(|p| PatternRecommendation {
            name: p.name,
            rationale: p.rationale,
            score: p.weights.score(summary),
        })
        .collect::<Vec<_>>();
    out.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_weights_sum_to_one() {
        for (role, w) in ROLE_PROFILES {
            let sum = w.ball_progression
                + w.chance_creation
                + w.def_intensity
                + w.press_resistance
                + w.shots_per_100;
            assert!((sum - 1.0).abs() < 1e-12, "{role}");
        }
        for p in PATTERN_PROFILES {
            let w = p.weights;
            let sum = w.press_resistance + w.ball_progression + w.chance_creation + w.def_intensity;
            assert!((sum - 1.0).abs() < 1e-12, "{}", p.name);
        }
    }

    #[test]
    fn best_role_prefers_first_listed_on_ties() {
        let scores = vec![
            RoleScore { role: "A", score: 1.0 },
            RoleScore { role: "B", score: 2.0 },
            RoleScore { role: "C", score: 2.0 },
        ];
        assert_eq!(best_role(&scores).map(|s| s.role), Some("B"));
        assert!(best_role(&[]).is_none());
    }

    #[test]
    fn all_zero_summary_keeps_pattern_order() {
        let summary = TeamSummary {
            ball_progression: 0.0,
            chance_creation: 0.0,
            def_intensity: 0.0,
            press_resistance: 0.0,
        };
        let names = recommend_patterns(&summary, None)
            .into_iter()
            .map(|p| p.name)
            .collect::<Vec<_>>();
        let expected = PATTERN_PROFILES.iter().map(|p| p.name).collect::<Vec<_>>();
        assert_eq!(names, expected);
    }
}
