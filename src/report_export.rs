use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::session::TeamReport;

pub struct ExportSummary {
    pub players: usize,
    pub heat_cells: usize,
    pub triggers: usize,
    pub patterns: usize,
}

enum Cell {
    Text(String),
    Number(f64),
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Cell::Number(value as f64)
    }
}

fn header(names: &[&str]) -> Vec<Cell> {
    names.iter().map(|n| Cell::from(*n)).collect()
}

/// Writes one analysis run as a workbook: players, summary, press heatmap, triggers, patterns.
pub fn export_report(path: &Path, report: &TeamReport) -> Result<ExportSummary> {
    let mut players_rows = vec![header(&[
        "Player",
        "Ball Progression",
        "Chance Creation",
        "Def Intensity",
        "Under Pressure Rate",
        "Best Role",
        "Best Role Score",
    ])];
    for row in &report.players {
        players_rows.push(vec![
            row.player.clone().into(),
            row.ball_progression.into(),
            row.chance_creation.into(),
            row.def_intensity.into(),
            row.under_pressure_rate.into(),
            row.best_role.into(),
            row.best_role_score.into(),
        ]);
    }

    let s = &report.summary;
    let success = &report.press_success;
    let summary_rows = vec![
        header(&["Metric", "Value"]),
        vec!["Team".into(), report.team.clone().into()],
        vec![
            "Opponent".into(),
            report.opponent.clone().unwrap_or_default().into(),
        ],
        vec!["Ball Progression".into(), s.ball_progression.into()],
        vec!["Chance Creation".into(), s.chance_creation.into()],
        vec!["Def Intensity".into(), s.def_intensity.into()],
        vec!["Press Resistance".into(), s.press_resistance.into()],
        vec!["Press Events".into(), report.heatmap.total.into()],
        vec!["High Press Share".into(), report.heatmap.high_share.into()],
        vec!["Press Window (events)".into(), success.window_events.into()],
        vec!["Press Successes".into(), success.successes.into()],
        vec!["Press Success Rate".into(), success.success_rate.into()],
    ];

    let mut heat_rows = vec![header(&["Zone X", "Zone Y", "Count"])];
    for cell in &report.heatmap.cells {
        heat_rows.push(vec![cell.bin_x.into(), cell.bin_y.into(), cell.count.into()]);
    }

    let mut trigger_rows = vec![header(&["Previous Type", "Count"])];
    for t in &report.triggers {
        trigger_rows.push(vec![t.previous_type.clone().into(), t.count.into()]);
    }

    let mut pattern_rows = vec![header(&["Pattern", "Score", "Why"])];
    for p in &report.patterns {
        pattern_rows.push(vec![p.name.into(), p.score.into(), p.rationale.into()]);
    }

    let mut workbook = Workbook::new();
    for (name, rows) in [
        ("Players", &players_rows),
        ("Summary", &summary_rows),
        ("PressHeatmap", &heat_rows),
        ("PressTriggers", &trigger_rows),
        ("Patterns", &pattern_rows),
    ] {
        let sheet = workbook.add_worksheet();
        sheet.set_name(name)?;
        write_rows(sheet, rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportSummary {
        players: report.players.len(),
        heat_cells: report.heatmap.cells.len(),
        triggers: report.triggers.len(),
        patterns: report.patterns.len(),
    })
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<Cell>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            let (r, c) = (row_idx as u32, col_idx as u16);
            match value {
                Cell::Text(text) => worksheet.write_string(r, c, text),
                Cell::Number(n) => worksheet.write_number(r, c, *n),
            }
            .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
