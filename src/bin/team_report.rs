use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use pitch_intel::config::AppConfig;
use pitch_intel::report_export;
use pitch_intel::session::{AnalysisError, AnalysisRequest, Session, TeamReport};

#[derive(Parser)]
#[command(name = "team_report", about = "Role fits, pressing profile and patterns for one team")]
struct Cli {
    #[arg(long)]
    team: String,

    /// Lineup player; repeat for each player (defaults to the whole squad)
    #[arg(long = "player")]
    players: Vec<String>,

    #[arg(long)]
    opponent: Option<String>,

    /// Press success look-ahead in events
    #[arg(long, env = "PITCH_PRESS_WINDOW")]
    window: Option<usize>,

    /// Event table to read (defaults to PITCH_EVENTS_PATH)
    #[arg(long)]
    events: Option<PathBuf>,

    /// Also write the report to this workbook
    #[arg(long)]
    xlsx: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if let Some(path) = cli.events {
        config.events_path = path;
    }
    let session = Session::new(config);

    let request = AnalysisRequest {
        team: cli.team,
        lineup: (!cli.players.is_empty()).then_some(cli.players),
        opponent: cli.opponent,
        window_events: cli.window,
    };

    let report = match session.analyze(&request) {
        Ok(report) => report,
        Err(err) => {
            if let Some(no_data) = err.downcast_ref::<AnalysisError>() {
                eprintln!("no data: {no_data}");
                return Ok(ExitCode::from(2));
            }
            return Err(err);
        }
    };

    print_report(&report);

    if let Some(path) = cli.xlsx {
        let summary = report_export::export_report(&path, &report)?;
        println!(
            "\nWorkbook: {} ({} players, {} triggers, {} patterns)",
            path.display(),
            summary.players,
            summary.triggers,
            summary.patterns
        );
    }

    Ok(ExitCode::SUCCESS)
}

fn print_report(report: &TeamReport) {
    match &report.opponent {
        Some(opponent) => println!("{} vs {opponent}", report.team),
        None => println!("{}", report.team),
    }

    println!(
        "\n{:<28} {:>6} {:>6} {:>6} {:>6}  {:<18} {:>6}",
        "Player", "Prog", "Create", "Def", "UP", "Best role", "Score"
    );
    for row in &report.players {
        println!(
            "{:<28} {:>6.2} {:>6.2} {:>6.2} {:>6.3}  {:<18} {:>6.2}",
            row.player,
            row.ball_progression,
            row.chance_creation,
            row.def_intensity,
            row.under_pressure_rate,
            row.best_role,
            row.best_role_score
        );
    }

    let s = &report.summary;
    println!("\nTeam summary");
    println!("  ball progression  {:.3}", s.ball_progression);
    println!("  chance creation   {:.3}", s.chance_creation);
    println!("  def intensity     {:.3}", s.def_intensity);
    println!("  press resistance  {:.3}", s.press_resistance);

    let p = &report.press_success;
    println!("\nPressing");
    println!(
        "  press events {} | high share {:.3} | success {}/{} = {:.3} (window {})",
        report.heatmap.total,
        report.heatmap.high_share,
        p.successes,
        p.press_events,
        p.success_rate,
        p.window_events
    );
    for t in &report.triggers {
        println!("  after {:<20} {}", t.previous_type, t.count);
    }

    println!("\nPatterns");
    for (rank, pattern) in report.patterns.iter().enumerate() {
        println!("  {}. {} ({:.3})", rank + 1, pattern.name, pattern.score);
        println!("     {}", pattern.rationale);
    }
}
