use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};

use pitch_intel::config::AppConfig;
use pitch_intel::dataset::{self, DatasetManifest};
use pitch_intel::event_table;
use pitch_intel::open_data;

#[derive(Parser)]
#[command(
    name = "build_events",
    about = "Flatten an open-data competition season into the persisted event table"
)]
struct Cli {
    /// Open-data root (defaults to PITCH_OPEN_DATA_DIR)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the competitions and seasons in the open-data manifest
    Competitions,
    /// Build and persist the event table for one competition season
    Build {
        #[arg(long)]
        competition: Option<u32>,

        #[arg(long)]
        season: Option<u32>,

        /// Output parquet file (defaults to PITCH_EVENTS_PATH)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = AppConfig::from_env();
    let root = cli.root.unwrap_or_else(|| config.open_data_dir.clone());

    match cli.command {
        Commands::Competitions => {
            let mut competitions = open_data::list_competitions(&root)?;
            competitions.sort_by_key(|c| (c.competition_id, c.season_id));
            for c in &competitions {
                println!(
                    "{:>4} {:>4}  {} {} ({})",
                    c.competition_id,
                    c.season_id,
                    c.competition_name,
                    c.season_name,
                    c.country_name.as_deref().unwrap_or("n/a")
                );
            }
            println!("{} competition seasons", competitions.len());
        }
        Commands::Build {
            competition,
            season,
            out,
        } => {
            let competition_id = competition.unwrap_or(config.competition_id);
            let season_id = season.unwrap_or(config.season_id);
            let out = out.unwrap_or_else(|| config.events_path.clone());

            let build = event_table::build_events_table(&root, competition_id, season_id)?;
            if build.events.is_empty() {
                return Err(anyhow!(
                    "no events found for competition {competition_id} season {season_id} under {}",
                    root.display()
                ));
            }

            dataset::write_events_table(&out, &build.events)?;
            let manifest = DatasetManifest::new(
                competition_id,
                season_id,
                build.matches_read,
                build.events.len(),
            );
            dataset::write_manifest(&out, &manifest)?;

            println!("Event table build complete");
            println!("Out: {}", out.display());
            println!("Competition/season: {competition_id}/{season_id}");
            println!("Matches: {}/{}", build.matches_read, build.matches_listed);
            println!("Rows: {}", build.events.len());
            if !build.missing_matches.is_empty() {
                println!("  missing event files: {}", build.missing_matches.len());
                for id in build.missing_matches.iter().take(6) {
                    println!("   - {id}");
                }
            }
        }
    }

    Ok(())
}
