use pitch_intel::event_table::{EventRecord, EventType};
use pitch_intel::features::{PlayerFeatureRow, build_player_features};
use pitch_intel::tactics::{
    PATTERN_PROFILES, ROLE_PROFILES, RoleInputs, TeamSummary, best_role, recommend_patterns,
    role_fit_scores, team_summary,
};

fn player_row(events: Vec<EventRecord>) -> PlayerFeatureRow {
    build_player_features(&events)
        .into_iter()
        .next()
        .expect("one player row")
}

fn record(kind: EventType, under_pressure: bool) -> EventRecord {
    EventRecord {
        match_id: 1,
        home_team: "Home".to_string(),
        away_team: "Away".to_string(),
        team: Some("Home".to_string()),
        player: Some("P".to_string()),
        period: 1,
        minute: 0,
        second: 0,
        event_type: Some(kind),
        possession: None,
        play_pattern: None,
        loc_x: Some(50.0),
        loc_y: Some(40.0),
        pass_end_x: None,
        pass_end_y: None,
        under_pressure,
        shot_xg: None,
    }
}

fn summary(bp: f64, cc: f64, di: f64, pr: f64) -> TeamSummary {
    TeamSummary {
        ball_progression: bp,
        chance_creation: cc,
        def_intensity: di,
        press_resistance: pr,
    }
}

#[test]
fn every_role_is_scored_in_table_order() {
    let row = player_row(vec![record(EventType::Pressure, false)]);
    let scores = role_fit_scores(&row);
    assert_eq!(scores.len(), ROLE_PROFILES.len());
    for (score, (role, _)) in scores.iter().zip(ROLE_PROFILES) {
        assert_eq!(score.role, role);
    }
}

#[test]
fn pure_defender_fits_ball_winning_mid() {
    let row = player_row(vec![
        record(EventType::Pressure, false),
        record(EventType::Interception, false),
    ]);
    let scores = role_fit_scores(&row);
    let best = best_role(&scores).expect("scores present");
    assert_eq!(best.role, "Ball-Winning Mid");
    assert!((best.score - 70.0).abs() < 1e-9);
}

#[test]
fn press_resistance_never_negative() {
    let row = player_row(vec![record(EventType::Carry, true)]);
    assert_eq!(row.under_pressure_rate, 1.0);
    assert_eq!(RoleInputs::from_row(&row).press_resistance, 0.0);

    let calm = player_row(vec![record(EventType::Carry, false)]);
    assert_eq!(RoleInputs::from_row(&calm).press_resistance, 1.0);
}

#[test]
fn role_scores_are_deterministic() {
    let events = vec![
        record(EventType::Shot, false),
        record(EventType::Duel, true),
        record(EventType::Pass, false),
    ];
    let a = role_fit_scores(&player_row(events.clone()));
    let b = role_fit_scores(&player_row(events));
    assert_eq!(a, b);
}

#[test]
fn team_summary_means_over_rows() {
    let a = player_row(vec![record(EventType::Pressure, true)]);
    let b = player_row(vec![record(EventType::Carry, false)]);
    let s = team_summary([&a, &b]).expect("two rows");
    assert_eq!(s.def_intensity, 50.0);
    assert_eq!(s.press_resistance, 0.5);
    assert_eq!(s.ball_progression, 0.0);

    assert!(team_summary(std::iter::empty::<&PlayerFeatureRow>()).is_none());
}

#[test]
fn patterns_are_ranked_descending() {
    let ranked = recommend_patterns(&summary(10.0, 5.0, 60.0, 0.9), None);
    assert_eq!(ranked.len(), PATTERN_PROFILES.len());
    assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    assert_eq!(ranked[0].name, "Counterpress trap after loss (5-second rule)");
}

#[test]
fn progression_heavy_team_prefers_switches() {
    let ranked = recommend_patterns(&summary(40.0, 0.0, 0.0, 0.0), None);
    let names = ranked.iter().map(|p| p.name).collect::<Vec<_>>();
    assert_eq!(
        names,
        vec![
            "Fast switch to weak side",
            "Half-space overload + third-man run",
            "Bait press → vertical into striker + layoff (3rd man)",
            "Counterpress trap after loss (5-second rule)",
        ]
    );
}

#[test]
fn opponent_does_not_change_the_ranking() {
    let own = summary(12.0, 8.0, 30.0, 0.8);
    let opponent = summary(1.0, 90.0, 2.0, 0.1);
    assert_eq!(
        recommend_patterns(&own, None),
        recommend_patterns(&own, Some(&opponent))
    );
}
