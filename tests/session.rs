use std::path::PathBuf;

use pitch_intel::config::AppConfig;
use pitch_intel::dataset::write_events_table;
use pitch_intel::event_table::{EventRecord, build_events_table};
use pitch_intel::report_export::export_report;
use pitch_intel::session::{AnalysisError, AnalysisRequest, Session};

fn fixture_events() -> Vec<EventRecord> {
    let mut root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    root.push("tests");
    root.push("fixtures");
    root.push("open-data");
    build_events_table(&root, 2, 44)
        .expect("fixture build should succeed")
        .events
}

fn fixture_session() -> Session {
    Session::with_events(AppConfig::default(), fixture_events())
}

#[test]
fn lists_teams_and_players() {
    let session = fixture_session();
    assert_eq!(
        session.teams().expect("teams"),
        vec!["Alpha".to_string(), "Beta".to_string(), "Gamma".to_string()]
    );
    assert_eq!(
        session.players("Alpha").expect("players"),
        vec!["A One".to_string(), "A Three".to_string(), "A Two".to_string()]
    );
    assert!(session.players("Omega").expect("players").is_empty());
}

#[test]
fn default_lineup_is_capped() {
    let config = AppConfig {
        lineup_size: 2,
        ..AppConfig::default()
    };
    let session = Session::with_events(config, fixture_events());
    assert_eq!(
        session.default_lineup("Alpha").expect("lineup"),
        vec!["A One".to_string(), "A Three".to_string()]
    );
}

#[test]
fn analyzes_full_squad() {
    let session = fixture_session();
    let report = session
        .analyze(&AnalysisRequest::for_team("Alpha"))
        .expect("analysis");

    let ranked = report
        .players
        .iter()
        .map(|r| (r.player.as_str(), r.best_role, r.best_role_score))
        .collect::<Vec<_>>();
    assert_eq!(
        ranked,
        vec![
            ("A Three", "Ball-Winning Mid", 70.0),
            ("A Two", "Ball-Winning Mid", 41.75),
            ("A One", "Pressing Forward", 28.67),
        ]
    );
    assert_eq!(report.players[1].under_pressure_rate, 0.25);
    assert_eq!(report.players[2].def_intensity, 33.33);

    assert!((report.summary.ball_progression - 15.0).abs() < 1e-9);
    assert!((report.summary.press_resistance - 2.75 / 3.0).abs() < 1e-9);

    assert_eq!(report.heatmap.total, 5);
    assert_eq!(report.triggers[0].previous_type, "Pass");
    assert_eq!(report.press_success.successes, 2);
    assert_eq!(report.press_success.window_events, 5);
    assert_eq!(
        report.patterns[0].name,
        "Counterpress trap after loss (5-second rule)"
    );
    assert_eq!(report.patterns.len(), 4);
}

#[test]
fn lineup_restricts_rows_and_summary() {
    let session = fixture_session();
    let request = AnalysisRequest {
        lineup: Some(vec!["A Two".to_string(), "Not Playing".to_string()]),
        opponent: Some("Gamma".to_string()),
        window_events: Some(1),
        ..AnalysisRequest::for_team("Alpha")
    };
    let report = session.analyze(&request).expect("analysis");
    assert_eq!(report.players.len(), 1);
    assert!((report.summary.def_intensity - 50.0).abs() < 1e-9);
    assert_eq!(report.opponent.as_deref(), Some("Gamma"));
    assert_eq!(report.press_success.window_events, 1);
    assert_eq!(report.press_success.successes, 1);
    // Press analysis always covers the whole team.
    assert_eq!(report.heatmap.total, 5);
}

#[test]
fn no_data_selections_are_typed_errors() {
    let session = fixture_session();

    let err = session
        .analyze(&AnalysisRequest::for_team("Omega"))
        .expect_err("unknown team");
    assert_eq!(
        err.downcast_ref::<AnalysisError>(),
        Some(&AnalysisError::UnknownTeam("Omega".to_string()))
    );

    let request = AnalysisRequest {
        lineup: Some(Vec::new()),
        ..AnalysisRequest::for_team("Alpha")
    };
    let err = session.analyze(&request).expect_err("empty lineup");
    assert!(matches!(
        err.downcast_ref::<AnalysisError>(),
        Some(AnalysisError::EmptyLineup { team }) if team == "Alpha"
    ));
}

#[test]
fn team_without_named_players_is_not_unknown() {
    let mut events = fixture_events();
    for e in events.iter_mut().filter(|e| e.is_team("Beta")) {
        e.player = None;
    }
    let session = Session::with_events(AppConfig::default(), events);
    assert!(session.teams().expect("teams").contains(&"Beta".to_string()));

    let err = session
        .analyze(&AnalysisRequest::for_team("Beta"))
        .expect_err("no player rows");
    assert_eq!(
        err.downcast_ref::<AnalysisError>(),
        Some(&AnalysisError::NoNamedPlayers("Beta".to_string()))
    );
}

#[test]
fn loads_lazily_and_reloads_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("events.parquet");
    let events = fixture_events();
    write_events_table(&path, &events).expect("write parquet");

    let config = AppConfig {
        events_path: path.clone(),
        ..AppConfig::default()
    };
    let mut session = Session::new(config);
    assert!(!session.is_loaded());
    assert_eq!(session.events().expect("events").len(), events.len());
    assert!(session.is_loaded());

    let alpha_only = events
        .into_iter()
        .filter(|e| e.is_team("Alpha"))
        .collect::<Vec<_>>();
    write_events_table(&path, &alpha_only).expect("rewrite parquet");
    assert_eq!(session.teams().expect("teams").len(), 3);

    session.reload();
    assert!(!session.is_loaded());
    assert_eq!(session.teams().expect("teams"), vec!["Alpha".to_string()]);
}

#[test]
fn missing_table_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = AppConfig {
        events_path: dir.path().join("absent.parquet"),
        ..AppConfig::default()
    };
    let session = Session::new(config);
    assert!(session.teams().is_err());
    assert!(!session.is_loaded());
}

#[test]
fn report_exports_to_workbook() {
    let session = fixture_session();
    let report = session
        .analyze(&AnalysisRequest::for_team("Alpha"))
        .expect("analysis");
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("alpha.xlsx");

    let summary = export_report(&path, &report).expect("export");
    assert_eq!(summary.players, 3);
    assert_eq!(summary.heat_cells, 4);
    assert_eq!(summary.triggers, 4);
    assert_eq!(summary.patterns, 4);
    assert!(std::fs::metadata(&path).expect("workbook written").len() > 0);
}
