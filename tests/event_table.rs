use std::path::PathBuf;

use pitch_intel::event_table::{EventType, build_events_table};
use pitch_intel::features::build_player_features;
use pitch_intel::open_data::{list_competitions, list_matches, read_events};

fn fixture_root() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("open-data");
    path
}

#[test]
fn reads_competitions_and_matches() {
    let root = fixture_root();
    let competitions = list_competitions(&root).expect("competitions should parse");
    assert_eq!(competitions.len(), 2);
    assert_eq!(competitions[0].competition_name, "Premier League");
    assert_eq!(competitions[0].season_id, 44);

    let matches = list_matches(&root, 2, 44).expect("matches should parse");
    assert_eq!(matches.len(), 3);
    assert_eq!(matches[1].home_team(), "Gamma");
    assert_eq!(matches[1].away_team(), "Alpha");
    assert_eq!(matches[0].match_date.as_deref(), Some("2003-08-16"));
}

#[test]
fn missing_season_file_is_an_error() {
    let err = list_matches(&fixture_root(), 99, 1).expect_err("no such season");
    assert!(format!("{err:#}").contains("99"));
}

#[test]
fn builds_table_and_skips_unreleased_matches() {
    let build = build_events_table(&fixture_root(), 2, 44).expect("build should succeed");
    assert_eq!(build.matches_listed, 3);
    assert_eq!(build.matches_read, 2);
    assert_eq!(build.missing_matches, vec![1003]);
    assert_eq!(build.events.len(), 18);

    let raw_first_match = read_events(&fixture_root(), 1001).expect("events should parse");
    let first_match = build
        .events
        .iter()
        .filter(|e| e.match_id == 1001)
        .collect::<Vec<_>>();
    assert_eq!(first_match.len(), raw_first_match.len());
    assert!(first_match.iter().all(|e| e.home_team == "Alpha" && e.away_team == "Beta"));

    let lineup_event = first_match[0];
    assert_eq!(lineup_event.event_type, Some(EventType::Other("Starting XI".to_string())));
    assert_eq!(lineup_event.player, None);
    assert_eq!(lineup_event.loc_x, None);

    let pass = first_match[2];
    assert_eq!(pass.event_type, Some(EventType::Pass));
    assert_eq!((pass.loc_x, pass.loc_y), (Some(70.0), Some(30.0)));
    assert_eq!((pass.pass_end_x, pass.pass_end_y), (Some(90.0), Some(30.0)));
    assert!(pass.under_pressure);
    assert_eq!(pass.play_pattern.as_deref(), Some("Regular Play"));

    let shot = first_match[5];
    assert_eq!(shot.shot_xg, Some(0.3));
    assert_eq!(shot.pass_end_x, None);

    let block = build
        .events
        .iter()
        .find(|e| e.is_type(&EventType::Block))
        .expect("block event");
    assert_eq!((block.loc_x, block.loc_y), (None, None));
    assert_eq!(block.match_id, 1002);
}

#[test]
fn rebuilding_is_deterministic() {
    let first = build_events_table(&fixture_root(), 2, 44).expect("first build");
    let second = build_events_table(&fixture_root(), 2, 44).expect("second build");
    assert_eq!(first.events, second.events);
    assert_eq!(
        build_player_features(&first.events),
        build_player_features(&second.events)
    );
}
