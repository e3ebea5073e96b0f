use std::collections::VecDeque;
use std::io;
use std::sync::mpsc;
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

use volley_tracker::advisory::Advisory;
use volley_tracker::config::TrackerConfig;
use volley_tracker::lineup::{POSITIONS, Slot};
use volley_tracker::rally::{CourtPoint, FaultKind, PointType, RallyPhase, Team};
use volley_tracker::roster::{PlayerEdit, PlayerId};
use volley_tracker::sim::{self, FeedEvent};
use volley_tracker::state::{Command, Notice, Tracker};
use volley_tracker::stats::{self, PointCounters};
use volley_tracker::{export, persist};

const MAX_LOGS: usize = 200;
const CURSOR_STEP: f32 = 10.0;
const HEAT_COLS: usize = 5;
const HEAT_ROWS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Players,
    Lineup,
    Subs,
    Heatmap,
    Stats,
    Matches,
}

impl Tab {
    const ALL: [Tab; 6] = [
        Tab::Players,
        Tab::Lineup,
        Tab::Subs,
        Tab::Heatmap,
        Tab::Stats,
        Tab::Matches,
    ];

    fn label(self) -> &'static str {
        match self {
            Tab::Players => "Players",
            Tab::Lineup => "Lineup",
            Tab::Subs => "Subs",
            Tab::Heatmap => "Heatmap",
            Tab::Stats => "Stats",
            Tab::Matches => "Matches",
        }
    }

    fn step(self, forward: bool) -> Self {
        let idx = Tab::ALL.iter().position(|t| *t == self).unwrap_or(0);
        let len = Tab::ALL.len();
        let next = if forward { idx + 1 } else { idx + len - 1 };
        Tab::ALL[next % len]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputPurpose {
    Opponent,
    SaveOpponent,
    NewMatch,
    PlayerName(PlayerId),
}

#[derive(Debug, Clone)]
struct TextInput {
    purpose: InputPurpose,
    buffer: String,
}

impl TextInput {
    fn title(&self) -> &'static str {
        match self.purpose {
            InputPurpose::Opponent => "Opponent name",
            InputPurpose::SaveOpponent => "Opponent name (required to save)",
            InputPurpose::NewMatch => "New match: opponent name",
            InputPurpose::PlayerName(_) => "Player name",
        }
    }
}

struct Toast {
    text: String,
    shown_at: Instant,
}

struct App {
    tracker: Tracker,
    cfg: TrackerConfig,
    should_quit: bool,
    tab: Tab,
    selected: usize,
    cursor: CourtPoint,
    input: Option<TextInput>,
    overlay_set: Option<usize>,
    stats_match_scope: bool,
    logs: VecDeque<String>,
    toast: Option<Toast>,
    help_overlay: bool,
}

impl App {
    fn new(cfg: TrackerConfig) -> Self {
        Self {
            tracker: Tracker::from_config(&cfg),
            cfg,
            should_quit: false,
            tab: Tab::Players,
            selected: 0,
            cursor: CourtPoint::CENTER,
            input: None,
            overlay_set: None,
            stats_match_scope: false,
            logs: VecDeque::with_capacity(MAX_LOGS),
            toast: None,
            help_overlay: false,
        }
    }

    fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    fn show_toast(&mut self, text: impl Into<String>) {
        self.toast = Some(Toast {
            text: text.into(),
            shown_at: Instant::now(),
        });
    }

    fn clear_toast_if_expired(&mut self, now: Instant) {
        let Some(toast) = &self.toast else {
            return;
        };
        if now.duration_since(toast.shown_at).as_secs() >= self.cfg.toast_secs {
            self.toast = None;
        }
    }

    fn team_name(&self, team: Team) -> String {
        match team {
            Team::Home => self.cfg.home_name.clone(),
            Team::Away if self.tracker.opponent().is_empty() => "AWAY".to_string(),
            Team::Away => self.tracker.opponent().to_string(),
        }
    }

    fn dispatch(&mut self, cmd: Command) -> bool {
        match self.tracker.apply(cmd) {
            Ok(notices) => {
                for notice in notices {
                    self.announce(&notice);
                }
                true
            }
            Err(err) => {
                self.reject(&err);
                false
            }
        }
    }

    fn announce(&mut self, notice: &Notice) {
        let text = match notice {
            Notice::SetEnded { winner, score, .. } => {
                let msg = format!("Set to {} ({})", self.team_name(*winner), score.display());
                self.show_toast(msg.clone());
                msg
            }
            Notice::MatchEnded { winner, sets } => {
                let msg = format!(
                    "Match to {} ({}-{})",
                    self.team_name(*winner),
                    sets.home,
                    sets.away
                );
                self.show_toast(msg.clone());
                msg
            }
            Notice::MatchSaved { .. } => {
                let msg = notice.describe();
                self.show_toast("Match saved");
                msg
            }
            Notice::LineupEditRequested => {
                self.tab = Tab::Lineup;
                self.selected = 0;
                notice.describe()
            }
            Notice::NewMatchStarted => {
                self.overlay_set = None;
                notice.describe()
            }
            _ => notice.describe(),
        };
        self.push_log(format!("[INFO] {text}"));
    }

    fn reject(&mut self, err: &Advisory) {
        self.push_log(format!("[WARN] {err}"));
        self.show_toast(err.to_string());
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.input.is_some() {
            self.on_input_key(key);
            return;
        }
        if self.help_overlay {
            if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc) {
                self.help_overlay = false;
            }
            return;
        }

        let phase = self.tracker.state().phase;
        match phase {
            RallyPhase::AwaitingOutcome { .. } => {
                self.on_outcome_key(key);
                return;
            }
            RallyPhase::AwaitingFaultKind { .. } => {
                self.on_fault_key(key);
                return;
            }
            RallyPhase::SetComplete { .. } => {
                if self.on_set_end_key(key) {
                    return;
                }
            }
            RallyPhase::MatchComplete { .. } if !self.tracker.state().saved => {
                if self.on_match_end_key(key) {
                    return;
                }
            }
            _ => {}
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.help_overlay = true,
            KeyCode::Tab => self.switch_tab(true),
            KeyCode::BackTab => self.switch_tab(false),
            KeyCode::Left => self.move_cursor(-CURSOR_STEP, 0.0),
            KeyCode::Right => self.move_cursor(CURSOR_STEP, 0.0),
            KeyCode::Up => self.move_cursor(0.0, -CURSOR_STEP),
            KeyCode::Down => self.move_cursor(0.0, CURSOR_STEP),
            KeyCode::Char('j') => self.select_next(),
            KeyCode::Char('k') => self.select_prev(),
            KeyCode::Char('h') => {
                let at = self.cursor;
                self.dispatch(Command::ScoreRally {
                    team: Team::Home,
                    at,
                });
            }
            KeyCode::Char('a') => {
                let at = self.cursor;
                self.dispatch(Command::ScoreRally {
                    team: Team::Away,
                    at,
                });
            }
            KeyCode::Char('f') => {
                let serving = self.tracker.state().serving;
                self.dispatch(Command::ServiceFault { serving });
            }
            KeyCode::Char('t') => {
                self.dispatch(Command::TakeTimeout(Team::Home));
            }
            KeyCode::Char('T') => {
                self.dispatch(Command::TakeTimeout(Team::Away));
            }
            KeyCode::Char('r') => {
                self.dispatch(Command::Rotate(Team::Home));
            }
            KeyCode::Char('R') => {
                self.dispatch(Command::Rotate(Team::Away));
            }
            KeyCode::Char('c') => {
                let other = self.tracker.state().serving.other();
                self.dispatch(Command::ChooseServe(other));
            }
            KeyCode::Char('o') => self.open_input(InputPurpose::Opponent),
            KeyCode::Char('n') => self.open_input(InputPurpose::NewMatch),
            KeyCode::Char('x') => self.export_archive(),
            _ => self.on_tab_key(key),
        }
    }

    fn on_outcome_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c @ '1'..='5') => {
                let idx = c as usize - '1' as usize;
                self.dispatch(Command::ClassifyOutcome(PointType::ALL[idx]));
            }
            KeyCode::Esc => {
                self.dispatch(Command::CancelRally);
            }
            KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
    }

    fn on_fault_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c @ '1'..='3') => {
                let idx = c as usize - '1' as usize;
                self.dispatch(Command::ConfirmServiceFault(FaultKind::ALL[idx]));
            }
            KeyCode::Esc => {
                self.dispatch(Command::CancelRally);
            }
            KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
    }

    fn on_set_end_key(&mut self, key: KeyEvent) -> bool {
        let keep_lineup = match key.code {
            KeyCode::Char('k') | KeyCode::Enter => true,
            KeyCode::Char('e') => false,
            _ => return false,
        };
        self.dispatch(Command::StartNewSet { keep_lineup });
        true
    }

    fn on_match_end_key(&mut self, key: KeyEvent) -> bool {
        if key.code != KeyCode::Char('s') {
            return false;
        }
        if self.tracker.opponent().is_empty() {
            self.open_input(InputPurpose::SaveOpponent);
        } else {
            let opponent = self.tracker.opponent().to_string();
            let date = self.tracker.date();
            self.dispatch(Command::Save { opponent, date });
        }
        true
    }

    fn open_input(&mut self, purpose: InputPurpose) {
        let buffer = match purpose {
            InputPurpose::Opponent | InputPurpose::SaveOpponent => {
                self.tracker.opponent().to_string()
            }
            InputPurpose::NewMatch => String::new(),
            InputPurpose::PlayerName(id) => self
                .tracker
                .roster()
                .get(id)
                .map(|p| p.name.clone())
                .unwrap_or_default(),
        };
        self.input = Some(TextInput { purpose, buffer });
    }

    fn on_input_key(&mut self, key: KeyEvent) {
        let Some(input) = self.input.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Char(c) => input.buffer.push(c),
            KeyCode::Backspace => {
                input.buffer.pop();
            }
            KeyCode::Esc => self.input = None,
            KeyCode::Enter => {
                let Some(input) = self.input.take() else {
                    return;
                };
                let text = input.buffer;
                let cmd = match input.purpose {
                    InputPurpose::Opponent => Command::SetOpponent(text),
                    InputPurpose::SaveOpponent => Command::Save {
                        opponent: text,
                        date: self.tracker.date(),
                    },
                    InputPurpose::NewMatch => Command::NewMatch { opponent: text },
                    InputPurpose::PlayerName(id) => Command::UpdatePlayer {
                        id,
                        edit: PlayerEdit::Name(text),
                    },
                };
                let purpose = input.purpose;
                if !self.dispatch(cmd) && purpose == InputPurpose::SaveOpponent {
                    self.input = Some(TextInput {
                        purpose,
                        buffer: String::new(),
                    });
                }
            }
            _ => {}
        }
    }

    fn on_tab_key(&mut self, key: KeyEvent) {
        match self.tab {
            Tab::Players => self.on_players_key(key),
            Tab::Lineup => self.on_lineup_key(key),
            Tab::Subs => self.on_subs_key(key),
            Tab::Heatmap => match key.code {
                KeyCode::Char(']') => self.cycle_overlay(true),
                KeyCode::Char('[') => self.cycle_overlay(false),
                _ => {}
            },
            Tab::Stats => {
                if key.code == KeyCode::Char('v') {
                    self.stats_match_scope = !self.stats_match_scope;
                }
            }
            Tab::Matches => {
                if key.code == KeyCode::Char('e') {
                    self.export_selected_match();
                }
            }
        }
    }

    fn on_players_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('+') {
            self.dispatch(Command::AddPlayer);
            return;
        }
        let Some(player) = self.tracker.roster().players().get(self.selected) else {
            return;
        };
        let id = player.id;
        let number = player.number;
        let role = player.role();
        let is_libero = player.is_libero();
        let cmd = match key.code {
            KeyCode::Char('e') | KeyCode::Enter => {
                self.open_input(InputPurpose::PlayerName(id));
                return;
            }
            KeyCode::Char('d') => Command::RemovePlayer(id),
            KeyCode::Char(']') => Command::UpdatePlayer {
                id,
                edit: PlayerEdit::Number(number.saturating_add(1)),
            },
            KeyCode::Char('[') => Command::UpdatePlayer {
                id,
                edit: PlayerEdit::Number(number.saturating_sub(1)),
            },
            KeyCode::Char('p') => Command::UpdatePlayer {
                id,
                edit: PlayerEdit::Role(role.next()),
            },
            KeyCode::Char('l') => Command::UpdatePlayer {
                id,
                edit: PlayerEdit::Libero(!is_libero),
            },
            _ => return,
        };
        self.dispatch(cmd);
        self.clamp_selection();
    }

    fn on_lineup_key(&mut self, key: KeyEvent) {
        let slot = lineup_slot(self.selected);
        let current = self.tracker.lineup(Team::Home).get(slot);
        let player = match key.code {
            KeyCode::Char(']') => self.cycle_player(current, true),
            KeyCode::Char('[') => self.cycle_player(current, false),
            KeyCode::Backspace => None,
            _ => return,
        };
        self.dispatch(Command::Assign {
            team: Team::Home,
            slot,
            player,
        });
    }

    fn cycle_player(&self, current: Option<PlayerId>, forward: bool) -> Option<PlayerId> {
        let ids: Vec<PlayerId> = self
            .tracker
            .roster()
            .players()
            .iter()
            .map(|p| p.id)
            .collect();
        if ids.is_empty() {
            return None;
        }
        let pos = current.and_then(|id| ids.iter().position(|p| *p == id));
        let next = match (pos, forward) {
            (None, true) => 0,
            (None, false) => ids.len() - 1,
            (Some(idx), true) => (idx + 1) % ids.len(),
            (Some(idx), false) => (idx + ids.len() - 1) % ids.len(),
        };
        Some(ids[next])
    }

    fn on_subs_key(&mut self, key: KeyEvent) {
        let KeyCode::Char(c @ '1'..='6') = key.code else {
            return;
        };
        let pos = c as u8 - b'0';
        let bench_id = self
            .tracker
            .lineup(Team::Home)
            .bench(self.tracker.roster())
            .get(self.selected)
            .map(|p| p.id);
        let Some(bench_id) = bench_id else {
            self.push_log("[INFO] No bench player selected");
            return;
        };
        let Some(court_id) = self.tracker.lineup(Team::Home).at(pos) else {
            self.push_log(format!("[WARN] Position {pos} is empty"));
            return;
        };
        self.dispatch(Command::Substitute {
            team: Team::Home,
            bench: bench_id,
            court: court_id,
        });
        self.clamp_selection();
    }

    fn cycle_overlay(&mut self, forward: bool) {
        let count = self.tracker.state().saved_sets.len();
        if count == 0 {
            self.overlay_set = None;
            return;
        }
        self.overlay_set = match (self.overlay_set, forward) {
            (None, true) => Some(0),
            (None, false) => Some(count - 1),
            (Some(idx), true) if idx + 1 < count => Some(idx + 1),
            (Some(idx), false) if idx > 0 => Some(idx - 1),
            _ => None,
        };
    }

    fn export_archive(&mut self) {
        let path = self.cfg.archive_path();
        match persist::export_archive(self.tracker.archive(), &path) {
            Ok(()) => {
                self.push_log(format!(
                    "[INFO] Exported {} match(es) to {}",
                    self.tracker.archive().len(),
                    path.display()
                ));
                self.show_toast("Archive exported");
            }
            Err(err) => {
                self.push_log(format!("[WARN] Export failed: {err:#}"));
                self.show_toast("Export failed");
            }
        }
    }

    fn export_selected_match(&mut self) {
        let Some(saved) = self.tracker.archive().get(self.selected).cloned() else {
            self.push_log("[INFO] No saved match selected");
            return;
        };
        let file = format!(
            "match-{}-{}.xlsx",
            self.selected + 1,
            saved.date.format("%Y%m%d")
        );
        let path = self.cfg.export_dir.join(file);
        if let Err(err) = std::fs::create_dir_all(&self.cfg.export_dir) {
            self.push_log(format!("[WARN] Export failed: {err}"));
            return;
        }
        match export::export_saved_match_xlsx(&saved, self.tracker.roster(), &path) {
            Ok(report) => {
                self.push_log(format!(
                    "[INFO] Workbook written to {} ({} sets, {} rallies)",
                    path.display(),
                    report.sets,
                    report.rallies
                ));
                self.show_toast("Workbook exported");
            }
            Err(err) => {
                self.push_log(format!("[WARN] Workbook export failed: {err:#}"));
                self.show_toast("Export failed");
            }
        }
    }

    fn switch_tab(&mut self, forward: bool) {
        self.tab = self.tab.step(forward);
        self.selected = 0;
    }

    fn move_cursor(&mut self, dx: f32, dy: f32) {
        self.cursor = CourtPoint::new(self.cursor.x() + dx, self.cursor.y() + dy);
    }

    fn list_len(&self) -> usize {
        match self.tab {
            Tab::Players => self.tracker.roster().players().len(),
            Tab::Lineup => POSITIONS.len() + 1,
            Tab::Subs => self
                .tracker
                .lineup(Team::Home)
                .bench(self.tracker.roster())
                .len(),
            Tab::Matches => self.tracker.archive().len(),
            Tab::Heatmap | Tab::Stats => 0,
        }
    }

    fn select_next(&mut self) {
        let len = self.list_len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.list_len().saturating_sub(1));
    }
}

fn lineup_slot(row: usize) -> Slot {
    POSITIONS
        .get(row)
        .map(|pos| Slot::Position(*pos))
        .unwrap_or(Slot::Libero)
}

fn main() -> io::Result<()> {
    let cfg = TrackerConfig::from_env();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let mut app = App::new(cfg);
    if app.cfg.demo {
        sim::spawn_demo_feed(
            tx,
            app.tracker.clone(),
            app.cfg.sim_seed,
            app.cfg.demo_rally_interval,
        );
    } else {
        drop(tx);
    }
    app.push_log(format!(
        "[INFO] Tracking {} vs {}",
        app.team_name(Team::Home),
        app.team_name(Team::Away)
    ));
    let res = run_app(&mut terminal, &mut app, rx);

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

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<FeedEvent>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(event) = rx.try_recv() {
            match event {
                FeedEvent::Command(cmd) => {
                    app.dispatch(cmd);
                }
                FeedEvent::Log(line) => app.push_log(line),
            }
        }
        app.clear_toast_if_expired(Instant::now());

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

fn team_color(team: Team) -> Color {
    match team {
        Team::Home => Color::Cyan,
        Team::Away => Color::Yellow,
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

    let header = Paragraph::new(header_text(app))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    render_body(frame, chunks[1], app);

    let footer = Paragraph::new(footer_text(app))
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    render_prompt(frame, frame.size(), app);
    if let Some(toast) = &app.toast {
        render_toast(frame, frame.size(), &toast.text);
    }
    if app.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(app: &App) -> String {
    let state = app.tracker.state();
    let serve_marker = |team: Team| if state.serving == team { "●" } else { " " };
    let line1 = format!(
        "{} {} {:>2} - {:<2} {} {}   Sets {}-{}",
        serve_marker(Team::Home),
        app.team_name(Team::Home),
        state.score.home,
        state.score.away,
        app.team_name(Team::Away),
        serve_marker(Team::Away),
        state.sets.home,
        state.sets.away,
    );
    let line2 = format!(
        "Set {} (to {}) | {} | {}",
        state.set_number(),
        state.target(),
        state.phase.label(),
        app.tracker.date().format("%Y-%m-%d")
    );
    format!("{line1}\n{line2}")
}

fn footer_text(app: &App) -> String {
    if app.input.is_some() {
        return "Type | Enter Confirm | Esc Cancel".to_string();
    }
    let state = app.tracker.state();
    match state.phase {
        RallyPhase::AwaitingOutcome { .. } => "1-5 Outcome | Esc Cancel rally".to_string(),
        RallyPhase::AwaitingFaultKind { .. } => "1-3 Fault kind | Esc Cancel".to_string(),
        RallyPhase::SetComplete { .. } => "k/Enter Keep lineup | e Edit lineup".to_string(),
        RallyPhase::MatchComplete { .. } if !state.saved => {
            "s Save match | n New match | x Export | ? Help | q Quit".to_string()
        }
        _ => "h/a Point home/away | f Service fault | t/T Timeout | r/R Rotate | Tab Panels | ? Help | q Quit"
            .to_string(),
    }
}

fn render_body(frame: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(5)])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(30), Constraint::Length(46)])
        .split(rows[0]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(9), Constraint::Length(3)])
        .split(columns[0]);

    render_court(frame, left[0], app);

    let strip = Paragraph::new(score_strip_text(app))
        .block(Block::default().title("Score Log").borders(Borders::ALL));
    frame.render_widget(strip, left[1]);

    render_side_panel(frame, columns[1], app);

    let console = Paragraph::new(console_text(app))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, rows[1]);
}

/// Character grid for both halves: away on top, net in the middle, home below.
struct CourtCanvas {
    width: usize,
    half: usize,
    cells: Vec<Vec<(char, Style)>>,
}

impl CourtCanvas {
    fn new(width: usize, half: usize) -> Self {
        let mut cells = vec![vec![(' ', Style::default()); width]; half * 2 + 1];
        cells[half] = vec![('─', Style::default().fg(Color::White)); width];
        Self { width, half, cells }
    }

    fn cell(&self, team: Team, p: CourtPoint) -> (usize, usize) {
        let col = ((p.x() / 100.0) * (self.width - 1) as f32).round() as usize;
        let depth = ((p.y() / 100.0) * (self.half - 1) as f32).round() as usize;
        let row = match team {
            Team::Away => depth,
            Team::Home => self.half + 1 + depth,
        };
        (row.min(self.cells.len() - 1), col.min(self.width - 1))
    }

    fn put(&mut self, team: Team, p: CourtPoint, ch: char, style: Style) {
        let (row, col) = self.cell(team, p);
        self.cells[row][col] = (ch, style);
    }

    fn put_label(&mut self, team: Team, p: CourtPoint, label: &str, style: Style) {
        let (row, col) = self.cell(team, p);
        let len = label.chars().count();
        let start = col.saturating_sub(len / 2).min(self.width.saturating_sub(len));
        for (offset, ch) in label.chars().enumerate() {
            if let Some(cell) = self.cells[row].get_mut(start + offset) {
                *cell = (ch, style);
            }
        }
    }

    fn into_lines(self) -> Vec<Line<'static>> {
        self.cells
            .into_iter()
            .map(|row| {
                Line::from(
                    row.into_iter()
                        .map(|(ch, style)| Span::styled(ch.to_string(), style))
                        .collect::<Vec<_>>(),
                )
            })
            .collect()
    }
}

fn render_court(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default().title(court_title(app)).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = inner.width as usize;
    let half = (inner.height.saturating_sub(1) / 2) as usize;
    if width < 12 || half < 3 {
        let msg = Paragraph::new("Court needs more room").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(msg, inner);
        return;
    }

    let mut canvas = CourtCanvas::new(width, half);
    let rallies = match app.overlay_set {
        Some(idx) => app
            .tracker
            .state()
            .saved_sets
            .get(idx)
            .map(|s| s.rallies.as_slice())
            .unwrap_or(&[]),
        None => app.tracker.state().rallies.as_slice(),
    };
    // A rally dot sits on the half of the side that lost it.
    for rally in rallies {
        canvas.put(
            rally.team.other(),
            rally.at,
            '•',
            Style::default().fg(team_color(rally.team)),
        );
    }

    let cursor_style = Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD);
    canvas.put(Team::Home, app.cursor, '+', cursor_style);
    canvas.put(Team::Away, app.cursor, '+', cursor_style);

    for team in [Team::Home, Team::Away] {
        let displayed = app.tracker.displayed_lineup(team);
        let style = Style::default()
            .fg(team_color(team))
            .add_modifier(Modifier::BOLD);
        for (idx, player) in displayed.iter().enumerate() {
            let pos = POSITIONS[idx];
            let label = match player {
                Some(id) => court_label(app, team, *id),
                None => format!("{pos}:--"),
            };
            canvas.put_label(team, app.tracker.court_spot(team, pos), &label, style);
        }
    }

    frame.render_widget(Paragraph::new(canvas.into_lines()), inner);
}

fn court_title(app: &App) -> String {
    match app.overlay_set {
        Some(idx) => match app.tracker.state().saved_sets.get(idx) {
            Some(set) => format!("Court | overlay: set {}", set.set_number),
            None => "Court".to_string(),
        },
        None => "Court".to_string(),
    }
}

fn court_label(app: &App, team: Team, id: PlayerId) -> String {
    match (team, app.tracker.roster().get(id)) {
        (Team::Home, Some(p)) => format!("{}{}", p.role().code(), p.number),
        _ => format!("#{id}"),
    }
}

fn score_strip_text(app: &App) -> String {
    let state = app.tracker.state();
    let events: Vec<String> = state
        .score_log_for_set(state.set_number())
        .map(|e| {
            let tag = match e.team {
                Team::Home => "H",
                Team::Away => "A",
            };
            format!("{} {tag}", e.score_label())
        })
        .collect();
    if events.is_empty() {
        return "No points yet".to_string();
    }
    let start = events.len().saturating_sub(10);
    events[start..].join("  ")
}

fn render_side_panel(frame: &mut Frame, area: Rect, app: &App) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let tabs: Vec<Span> = Tab::ALL
        .iter()
        .map(|tab| {
            let style = if *tab == app.tab {
                Style::default().fg(Color::Black).bg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Span::styled(format!(" {} ", tab.label()), style)
        })
        .collect();
    frame.render_widget(Paragraph::new(Line::from(tabs)), sections[0]);

    let text = match app.tab {
        Tab::Players => players_text(app),
        Tab::Lineup => lineup_text(app),
        Tab::Subs => subs_text(app),
        Tab::Heatmap => heatmap_text(app),
        Tab::Stats => stats_text(app),
        Tab::Matches => matches_text(app),
    };
    let panel = Paragraph::new(text)
        .block(Block::default().title(app.tab.label()).borders(Borders::ALL));
    frame.render_widget(panel, sections[1]);
}

fn marker(selected: bool) -> &'static str {
    if selected { ">" } else { " " }
}

fn players_text(app: &App) -> String {
    let lineup = app.tracker.lineup(Team::Home);
    let mut lines = Vec::new();
    for (idx, p) in app.tracker.roster().players().iter().enumerate() {
        let court = match lineup.position_of(p.id) {
            Some(pos) => format!("P{pos}"),
            None if lineup.libero() == Some(p.id) => "L".to_string(),
            None => String::new(),
        };
        lines.push(format!(
            "{} #{:<3} {:<16} {:<4} {}",
            marker(idx == app.selected),
            p.number,
            p.name,
            p.role().code(),
            court
        ));
    }
    if let Some(p) = app.tracker.roster().players().get(app.selected) {
        lines.push(format!("Selected: {}", p.role().label()));
    }
    lines.push(String::new());
    lines.push("+ Add | e Rename | d Remove | [/] Number | p Role | l Libero".to_string());
    lines.join("\n")
}

fn lineup_text(app: &App) -> String {
    let roster = app.tracker.roster();
    let lineup = app.tracker.lineup(Team::Home);
    let mut lines = Vec::new();
    for row in 0..=POSITIONS.len() {
        let slot = lineup_slot(row);
        let who = lineup
            .get(slot)
            .map(|id| roster.display_name(id))
            .unwrap_or_else(|| "--".to_string());
        lines.push(format!(
            "{} {:<7} {}",
            marker(row == app.selected),
            slot.label(),
            who
        ));
    }
    if let Some(server) = lineup.server() {
        lines.push(format!("Server: {}", roster.display_name(server)));
    }
    if let Some(pos) = lineup.first_empty_position() {
        lines.push(format!("! position {pos} empty: rotation paused"));
    }
    for id in lineup.duplicates() {
        lines.push(format!("! {} holds two positions", roster.display_name(id)));
    }
    lines.push(String::new());
    lines.push("[/] Cycle player | Backspace Clear | r Rotate".to_string());
    lines.join("\n")
}

fn subs_text(app: &App) -> String {
    let state = app.tracker.state();
    let roster = app.tracker.roster();
    let mut lines = vec![format!(
        "Subs left: home {} away {} | Timeouts: home {} away {}",
        state.subs.remaining(Team::Home),
        state.subs.remaining(Team::Away),
        state.timeouts_left(Team::Home),
        state.timeouts_left(Team::Away),
    )];
    lines.push("Bench:".to_string());
    let bench = app.tracker.lineup(Team::Home).bench(roster);
    if bench.is_empty() {
        lines.push("  (nobody on the bench)".to_string());
    }
    for (idx, p) in bench.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            marker(idx == app.selected),
            roster.display_name(p.id),
            p.role().code()
        ));
    }
    lines.push("This set:".to_string());
    for rec in state.subs.records(Team::Home) {
        lines.push(format!(
            "  {} -> {}",
            roster.display_name(rec.player_out),
            roster.display_name(rec.player_in)
        ));
    }
    for score in state.timeouts.get(Team::Home) {
        lines.push(format!("  timeout at {}", score.display()));
    }
    lines.push(String::new());
    lines.push("1-6 Sub selected bench player into position".to_string());
    lines.join("\n")
}

fn heatmap_text(app: &App) -> String {
    let state = app.tracker.state();
    let (title, rallies) = match app.overlay_set.and_then(|idx| state.saved_sets.get(idx)) {
        Some(set) => (format!("Set {}", set.set_number), set.rallies.as_slice()),
        None => ("Current set".to_string(), state.rallies.as_slice()),
    };
    let mut lines = vec![title];
    for team in [Team::Home, Team::Away] {
        lines.push(format!(
            "{} won ({}):",
            app.team_name(team),
            stats::rallies_won_by(rallies, team).count()
        ));
        for row in stats::heat_grid(rallies, team, HEAT_COLS, HEAT_ROWS) {
            let cells: Vec<String> = row.iter().map(|n| format!("{n:>3}")).collect();
            lines.push(format!("  {}", cells.join("")));
        }
    }
    lines.push(String::new());
    lines.push("[/] Overlay finished sets".to_string());
    lines.join("\n")
}

fn stats_text(app: &App) -> String {
    let state = app.tracker.state();
    let (scope, counters) = if app.stats_match_scope {
        ("Match", state.match_stats)
    } else {
        ("Set", state.set_stats)
    };
    let mut lines = vec![format!(
        "{scope:<14} {:>8} {:>8}",
        truncate(&app.team_name(Team::Home), 8),
        truncate(&app.team_name(Team::Away), 8)
    )];
    let home: &PointCounters = counters.get(Team::Home);
    let away: &PointCounters = counters.get(Team::Away);
    for ((label, h), (_, a)) in home.rows().iter().zip(away.rows().iter()) {
        lines.push(format!("{label:<14} {h:>8} {a:>8}"));
    }
    lines.push(format!("{:<14} {:>8} {:>8}", "Total", home.total(), away.total()));
    lines.push(String::new());
    lines.push("v Toggle set/match".to_string());
    lines.join("\n")
}

fn matches_text(app: &App) -> String {
    let archive = app.tracker.archive();
    if archive.is_empty() {
        return "No saved matches".to_string();
    }
    let mut lines: Vec<String> = archive
        .matches()
        .iter()
        .enumerate()
        .map(|(idx, m)| {
            let result = if m.winner == Team::Home { "W" } else { "L" };
            format!(
                "{} {} vs {:<14} {}-{} {result}",
                marker(idx == app.selected),
                m.date.format("%Y-%m-%d"),
                truncate(&m.opponent, 14),
                m.final_score.home,
                m.final_score.away
            )
        })
        .collect();
    lines.push(String::new());
    lines.push("e Export workbook | x Export archive".to_string());
    lines.join("\n")
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn console_text(app: &App) -> String {
    if app.logs.is_empty() {
        return "No alerts yet".to_string();
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

fn render_prompt(frame: &mut Frame, area: Rect, app: &App) {
    if let Some(input) = &app.input {
        let popup = centered_rect(50, 20, area);
        frame.render_widget(Clear, popup);
        let widget = Paragraph::new(format!("{}_", input.buffer))
            .block(Block::default().title(input.title()).borders(Borders::ALL));
        frame.render_widget(widget, popup);
        return;
    }
    let state = app.tracker.state();
    let (title, body) = match state.phase {
        RallyPhase::AwaitingOutcome { team, .. } => {
            let mut lines = vec![format!("Point to {}. How was it won?", app.team_name(team))];
            for (idx, kind) in PointType::ALL.iter().enumerate() {
                lines.push(format!("  {} {}", idx + 1, kind.label()));
            }
            ("Outcome", lines.join("\n"))
        }
        RallyPhase::AwaitingFaultKind { serving } => {
            let mut lines = vec![format!("Service fault by {}", app.team_name(serving))];
            for (idx, kind) in FaultKind::ALL.iter().enumerate() {
                lines.push(format!("  {} {}", idx + 1, kind.label()));
            }
            ("Service fault", lines.join("\n"))
        }
        RallyPhase::SetComplete { winner } => (
            "Set over",
            format!(
                "{} takes the set {}\n\n  k Keep lineup\n  e Edit lineup",
                app.team_name(winner),
                state.score.display()
            ),
        ),
        RallyPhase::MatchComplete { winner } if !state.saved => (
            "Match over",
            format!(
                "{} wins {}-{}\n\n  s Save match\n  n New match",
                app.team_name(winner),
                state.sets.home,
                state.sets.away
            ),
        ),
        _ => return,
    };
    let popup = centered_rect(40, 35, area);
    frame.render_widget(Clear, popup);
    let widget = Paragraph::new(body).block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(widget, popup);
}

fn render_toast(frame: &mut Frame, area: Rect, text: &str) {
    let width = (text.chars().count() as u16 + 4).min(area.width);
    let rect = Rect {
        x: area.x + area.width.saturating_sub(width),
        y: area.y,
        width,
        height: 3.min(area.height),
    };
    frame.render_widget(Clear, rect);
    let toast = Paragraph::new(text.to_string())
        .style(Style::default().fg(Color::White).bg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(toast, rect);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Volley Tracker - Help",
        "",
        "Scoring:",
        "  arrows       Move landing cursor",
        "  h / a        Point to home / away at cursor",
        "  f            Service fault by serving team",
        "  t / T        Timeout home / away",
        "  r / R        Rotate home / away",
        "  c            Switch first server (before first point)",
        "",
        "Match:",
        "  o            Set opponent",
        "  n            New match",
        "  x            Export archive (JSON)",
        "",
        "Panels:",
        "  Tab / S-Tab  Switch panel",
        "  j / k        Move selection",
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
