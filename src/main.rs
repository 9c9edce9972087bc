use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use pitch_intel::config::AppConfig;
use pitch_intel::dataset;
use pitch_intel::report_export;
use pitch_intel::session::{AnalysisError, AnalysisRequest, Session, TeamReport};

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Teams,
    Lineup,
}

struct App {
    session: Session,
    teams: Vec<String>,
    team_idx: usize,
    players: Vec<String>,
    in_lineup: Vec<bool>,
    player_idx: usize,
    opponent_idx: Option<usize>,
    focus: Focus,
    report: Option<TeamReport>,
    logs: VecDeque<String>,
    should_quit: bool,
    help_overlay: bool,
}

impl App {
    fn new(config: AppConfig) -> Self {
        let mut app = Self {
            session: Session::new(config),
            teams: Vec::new(),
            team_idx: 0,
            players: Vec::new(),
            in_lineup: Vec::new(),
            player_idx: 0,
            opponent_idx: None,
            focus: Focus::Teams,
            report: None,
            logs: VecDeque::with_capacity(MAX_LOGS),
            should_quit: false,
            help_overlay: false,
        };
        app.load_teams();
        app
    }

    fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Teams => Focus::Lineup,
                    Focus::Lineup => Focus::Teams,
                }
            }
            KeyCode::Char('j') | KeyCode::Down => self.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.select_prev(),
            KeyCode::Char(' ') => self.toggle_player(),
            KeyCode::Char('o') | KeyCode::Char('O') => self.cycle_opponent(),
            KeyCode::Enter => self.run_analysis(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.reload(),
            KeyCode::Char('e') | KeyCode::Char('E') => self.export(),
            KeyCode::Char('?') => self.help_overlay = !self.help_overlay,
            _ => {}
        }
    }

    fn select_next(&mut self) {
        match self.focus {
            Focus::Teams => {
                if self.team_idx + 1 < self.teams.len() {
                    self.team_idx += 1;
                    self.select_team();
                }
            }
            Focus::Lineup => {
                if self.player_idx + 1 < self.players.len() {
                    self.player_idx += 1;
                }
            }
        }
    }

    fn select_prev(&mut self) {
        match self.focus {
            Focus::Teams => {
                if self.team_idx > 0 {
                    self.team_idx -= 1;
                    self.select_team();
                }
            }
            Focus::Lineup => self.player_idx = self.player_idx.saturating_sub(1),
        }
    }

    fn selected_team(&self) -> Option<&str> {
        self.teams.get(self.team_idx).map(String::as_str)
    }

    fn opponent(&self) -> Option<&str> {
        self.opponent_idx
            .and_then(|idx| self.teams.get(idx))
            .map(String::as_str)
    }

    fn load_teams(&mut self) {
        match self.session.teams() {
            Ok(teams) => {
                self.push_log(format!("[INFO] Loaded {} teams", teams.len()));
                self.teams = teams;
                self.log_manifest();
            }
            Err(err) => {
                self.teams.clear();
                self.push_log(format!("[WARN] Event table unavailable: {err:#}"));
            }
        }
        self.team_idx = self.team_idx.min(self.teams.len().saturating_sub(1));
        self.opponent_idx = None;
        self.select_team();
    }

    fn log_manifest(&mut self) {
        match dataset::read_manifest(&self.session.config().events_path) {
            Ok(Some(m)) => self.push_log(format!(
                "[INFO] Dataset: competition {} season {}, {} matches, {} rows, built {}",
                m.competition_id, m.season_id, m.matches, m.rows, m.built_at
            )),
            Ok(None) => {}
            Err(err) => self.push_log(format!("[WARN] Dataset manifest: {err:#}")),
        }
    }

    fn select_team(&mut self) {
        self.report = None;
        self.player_idx = 0;
        let Some(team) = self.selected_team().map(str::to_string) else {
            self.players.clear();
            self.in_lineup.clear();
            return;
        };

        let players = self.session.players(&team).unwrap_or_default();
        let default = self.session.default_lineup(&team).unwrap_or_default();
        self.in_lineup = players.iter().map(|p| default.contains(p)).collect();
        self.players = players;
        if self.opponent_idx == Some(self.team_idx) {
            self.opponent_idx = None;
        }
    }

    fn toggle_player(&mut self) {
        if self.focus != Focus::Lineup {
            return;
        }
        if let Some(flag) = self.in_lineup.get_mut(self.player_idx) {
            *flag = !*flag;
        }
    }

    fn cycle_opponent(&mut self) {
        let total = self.teams.len();
        let mut next = self.opponent_idx.map_or(0, |idx| idx + 1);
        if next == self.team_idx {
            next += 1;
        }
        self.opponent_idx = (next < total).then_some(next);
        let label = self.opponent().unwrap_or("none").to_string();
        self.push_log(format!("[INFO] Opponent: {label}"));
    }

    fn lineup(&self) -> Vec<String> {
        self.players
            .iter()
            .zip(&self.in_lineup)
            .filter(|(_, selected)| **selected)
            .map(|(p, _)| p.clone())
            .collect()
    }

    fn run_analysis(&mut self) {
        let Some(team) = self.selected_team().map(str::to_string) else {
            self.push_log("[INFO] No team selected");
            return;
        };
        let request = AnalysisRequest {
            team: team.clone(),
            lineup: Some(self.lineup()),
            opponent: self.opponent().map(str::to_string),
            window_events: None,
        };

        match self.session.analyze(&request) {
            Ok(report) => {
                self.push_log(format!(
                    "[INFO] Analysis for {team}: {} players, {} press events",
                    report.players.len(),
                    report.press_success.press_events
                ));
                self.report = Some(report);
            }
            Err(err) => {
                self.report = None;
                match err.downcast_ref::<AnalysisError>() {
                    Some(no_data) => self.push_log(format!("[WARN] {no_data}")),
                    None => self.push_log(format!("[WARN] Analysis failed: {err:#}")),
                }
            }
        }
    }

    fn reload(&mut self) {
        self.session.reload();
        self.push_log("[INFO] Reloading event table");
        self.load_teams();
    }

    fn export(&mut self) {
        let Some(report) = &self.report else {
            self.push_log("[INFO] Run an analysis before exporting");
            return;
        };
        let path = PathBuf::from("reports").join(format!("{}.xlsx", file_stem(&report.team)));
        let result = std::fs::create_dir_all("reports")
            .map_err(anyhow::Error::from)
            .and_then(|_| report_export::export_report(&path, report));
        match result {
            Ok(summary) => self.push_log(format!(
                "[INFO] Exported {} players to {}",
                summary.players,
                path.display()
            )),
            Err(err) => self.push_log(format!("[WARN] Export failed: {err:#}")),
        }
    }
}

fn file_stem(team: &str) -> String {
    team.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn main() -> io::Result<()> {
    env_logger::init();
    let config = AppConfig::from_env();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(config);
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(app)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    render_body(frame, chunks[1], app);

    let footer = Paragraph::new(
        "Tab Focus | j/k/↑/↓ Move | Space Toggle | o Opponent | Enter Analyze | e Export | r Reload | ? Help | q Quit",
    )
    .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    if app.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(app: &App) -> String {
    let team = app.selected_team().unwrap_or("-");
    let opponent = app.opponent().unwrap_or("-");
    let selected = app.in_lineup.iter().filter(|s| **s).count();
    let cfg = app.session.config();
    let line1 = format!("  PITCH INTEL | Team: {team} | Opponent: {opponent} | Lineup: {selected}");
    let line2 = format!(
        "  Data: {} | Window: {} events | Grid: {}x{}",
        cfg.events_path.display(),
        cfg.press_window,
        cfg.heat_grid.x,
        cfg.heat_grid.y
    );
    format!("{line1}\n{line2}")
}

fn render_body(frame: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(5)])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(26),
            Constraint::Length(30),
            Constraint::Min(40),
        ])
        .split(rows[0]);

    render_list(
        frame,
        columns[0],
        "Teams",
        &team_lines(app),
        app.team_idx,
        app.focus == Focus::Teams,
    );
    render_list(
        frame,
        columns[1],
        "Lineup",
        &lineup_lines(app),
        app.player_idx,
        app.focus == Focus::Lineup,
    );
    render_report(frame, columns[2], app.report.as_ref(), app);

    let console = Paragraph::new(console_text(app))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, rows[1]);
}

fn team_lines(app: &App) -> Vec<String> {
    app.teams
        .iter()
        .enumerate()
        .map(|(idx, team)| {
            let marker = if Some(idx) == app.opponent_idx { "vs " } else { "" };
            format!("{marker}{team}")
        })
        .collect()
}

fn lineup_lines(app: &App) -> Vec<String> {
    app.players
        .iter()
        .zip(&app.in_lineup)
        .map(|(player, selected)| {
            let mark = if *selected { "[x]" } else { "[ ]" };
            format!("{mark} {player}")
        })
        .collect()
}

fn render_list(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    lines: &[String],
    selected: usize,
    focused: bool,
) {
    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let block = Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if lines.is_empty() {
        frame.render_widget(Paragraph::new("Nothing loaded"), inner);
        return;
    }

    let (start, end) = visible_range(selected, lines.len(), inner.height as usize);
    for (row, idx) in (start..end).enumerate() {
        let line_area = Rect {
            x: inner.x,
            y: inner.y + row as u16,
            width: inner.width,
            height: 1,
        };
        let style = if idx == selected && focused {
            Style::default().add_modifier(Modifier::REVERSED)
        } else if idx == selected {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        render_cell_text(frame, line_area, &lines[idx], style);
    }
}

fn render_cell_text(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    let text_area = Rect {
        x: area.x,
        y: area.y + (area.height / 2),
        width: area.width,
        height: 1,
    };
    let paragraph = Paragraph::new(text).style(style);
    frame.render_widget(paragraph, text_area);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 || visible == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn render_report(frame: &mut Frame, area: Rect, report: Option<&TeamReport>, app: &App) {
    let Some(report) = report else {
        let empty = Paragraph::new("Pick a team and lineup, then press Enter")
            .block(Block::default().title("Report").borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(9), Constraint::Length(8)])
        .split(area);

    let players = Paragraph::new(players_text(report))
        .block(Block::default().title("Players").borders(Borders::ALL));
    frame.render_widget(players, rows[0]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(rows[1]);

    let summary = Paragraph::new(summary_text(report))
        .block(Block::default().title("Summary").borders(Borders::ALL));
    frame.render_widget(summary, middle[0]);

    let heat = Paragraph::new(heatmap_text(report, app))
        .block(Block::default().title("Press Heatmap").borders(Borders::ALL));
    frame.render_widget(heat, middle[1]);

    let triggers = Paragraph::new(triggers_text(report))
        .block(Block::default().title("Press Triggers").borders(Borders::ALL));
    frame.render_widget(triggers, middle[2]);

    let patterns = Paragraph::new(patterns_text(report))
        .block(Block::default().title("Patterns").borders(Borders::ALL));
    frame.render_widget(patterns, rows[2]);
}

fn players_text(report: &TeamReport) -> String {
    let mut lines = vec![format!(
        "{:<24} {:>6} {:>6} {:>6} {:>6}  {:<18} {:>6}",
        "Player", "Prog", "Create", "Def", "UP", "Best role", "Score"
    )];
    for row in &report.players {
        lines.push(format!(
            "{:<24} {:>6.2} {:>6.2} {:>6.2} {:>6.3}  {:<18} {:>6.2}",
            truncate(&row.player, 24),
            row.ball_progression,
            row.chance_creation,
            row.def_intensity,
            row.under_pressure_rate,
            row.best_role,
            row.best_role_score
        ));
    }
    lines.join("\n")
}

fn summary_text(report: &TeamReport) -> String {
    let s = &report.summary;
    let p = &report.press_success;
    [
        format!("Ball progression: {:.2}", s.ball_progression),
        format!("Chance creation:  {:.2}", s.chance_creation),
        format!("Def intensity:    {:.2}", s.def_intensity),
        format!("Press resistance: {:.3}", s.press_resistance),
        format!("High press share: {:.3}", report.heatmap.high_share),
        format!(
            "Press success:    {}/{} ({:.3}, {} ev)",
            p.successes, p.press_events, p.success_rate, p.window_events
        ),
    ]
    .join("\n")
}

fn heatmap_text(report: &TeamReport, app: &App) -> String {
    if report.heatmap.total == 0 {
        return "No located press events".to_string();
    }
    let grid = app.session.config().heat_grid;
    let mut counts = vec![vec![0usize; grid.x]; grid.y];
    for cell in &report.heatmap.cells {
        if let Some(slot) = counts
            .get_mut(cell.bin_y)
            .and_then(|row| row.get_mut(cell.bin_x))
        {
            *slot = cell.count;
        }
    }
    counts
        .iter()
        .map(|row| {
            row.iter()
                .map(|c| format!("{c:>4}"))
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn triggers_text(report: &TeamReport) -> String {
    if report.triggers.is_empty() {
        return "No press events".to_string();
    }
    report
        .triggers
        .iter()
        .map(|t| format!("{:<16} {:>4}", truncate(&t.previous_type, 16), t.count))
        .collect::<Vec<_>>()
        .join("\n")
}

fn patterns_text(report: &TeamReport) -> String {
    report
        .patterns
        .iter()
        .map(|p| format!("{:>7.2}  {}\n         {}", p.score, p.name, p.rationale))
        .collect::<Vec<_>>()
        .join("\n")
}

fn truncate(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

fn console_text(app: &App) -> String {
    if app.logs.is_empty() {
        return "No messages yet".to_string();
    }
    app.logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Pitch Intel - Help",
        "",
        "  Tab          Switch between teams and lineup",
        "  j/k or ↑/↓   Move",
        "  Space        Toggle player in lineup",
        "  o            Cycle opponent",
        "  Enter        Run analysis",
        "  e            Export report to reports/<team>.xlsx",
        "  r            Reload event table",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
