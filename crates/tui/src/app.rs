use std::{io, sync::Arc, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use memo_core::{
    cache::ResultCache,
    deck::{Card, CARD_COUNT, PAIR_COUNT},
    engine::{MatchEngine, RoundEvent, RoundResult, RoundStatus, SelectOutcome},
    format::{format_elapsed, format_optional},
    gateway::Gateway,
    leaderboard::{fetch_leaderboard, LeaderboardEntry},
    score::ScoreReporter,
    session::{self, LoginError, Session},
    AppConfig, LocalStore,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::{runtime::Handle, sync::mpsc};
use tracing::{error, info, warn};

use crate::block_font;

const TICK_RATE: Duration = Duration::from_millis(250);
const GRID_COLUMNS: usize = 5;
const GRID_ROWS: usize = CARD_COUNT / GRID_COLUMNS;
const MAX_USERNAME_LEN: usize = 24;
const START_MENU: [&str; 4] = ["Start", "Ranking", "Log out", "Quit"];
const COMPLETION_MENU: [&str; 2] = ["Retry", "Ranking"];
const FACE_DOWN: &str = "░░░░";

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    accent_alt: Color,
    muted: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            accent_alt: Color::Blue,
            muted: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Login,
    Start,
    Game,
    Ranking,
}

enum AppEvent {
    Input(Event),
    Tick,
}

#[derive(Debug, Clone)]
struct Completion {
    elapsed: Duration,
    new_best: bool,
    previous_best: Option<Duration>,
}

/// Terminal front end: screens, input handling and the single event loop
/// that owns the match engine.
pub struct MemoApp {
    gateway: Arc<dyn Gateway>,
    reporter: ScoreReporter,
    cache: ResultCache,
    engine: MatchEngine,
    round_rx: Option<mpsc::UnboundedReceiver<RoundEvent>>,
    session: Option<Session>,
    screen: Screen,
    state: UiState,
    theme: Theme,
}

impl MemoApp {
    pub fn new(
        config: &AppConfig,
        gateway: Arc<dyn Gateway>,
        store: Arc<dyn LocalStore>,
        runtime: Handle,
    ) -> Self {
        let (round_tx, round_rx) = mpsc::unbounded_channel();
        let cache = ResultCache::new(store);
        Self {
            reporter: ScoreReporter::new(gateway.clone(), cache.clone()),
            gateway,
            cache,
            engine: MatchEngine::new(config.engine(), round_tx, runtime),
            round_rx: Some(round_rx),
            session: None,
            screen: Screen::Login,
            state: UiState::default(),
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let Some(mut round_rx) = self.round_rx.take() else {
            anyhow::bail!("event loop already running");
        };

        match session::restore(self.gateway.as_ref()).await {
            Ok(Some(session)) => {
                self.state
                    .set_status(format!("Welcome back, {}", session.username));
                self.session = Some(session);
                self.open_start();
            }
            Ok(None) => self.state.set_status("Enter a username to begin".to_string()),
            Err(err) => {
                warn!("Failed to restore session: {err}");
                self.state
                    .set_status(format!("Could not restore session: {err}"));
            }
        }

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }

            tokio::select! {
                maybe_event = event_rx.recv() => match maybe_event {
                    Some(AppEvent::Input(event)) => {
                        if let Err(err) = self.handle_input(event).await {
                            self.state.set_status(format!("Error: {err}"));
                        }
                    }
                    Some(AppEvent::Tick) => {}
                    None => break,
                },
                Some(event) = round_rx.recv() => {
                    self.engine.handle_event(event);
                }
            }

            if self.state.should_quit {
                break;
            }
        }

        self.engine.teardown();
        restore_terminal(&mut terminal)?;
        Ok(())
    }

    fn open_start(&mut self) {
        self.screen = Screen::Start;
        self.state.menu_cursor = 0;
        self.refresh_results();
    }

    fn refresh_results(&mut self) {
        match (self.cache.previous(), self.cache.best()) {
            (Ok(previous), Ok(best)) => {
                self.state.previous = previous;
                self.state.best = best;
            }
            (Err(err), _) | (_, Err(err)) => {
                warn!("Failed to read cached results: {err}");
                self.state
                    .set_status(format!("Could not read local results: {err}"));
            }
        }
    }

    fn start_round(&mut self) {
        let round = self.engine.start();
        info!(%round, "Round started from menu");
        self.screen = Screen::Game;
        self.state.grid_cursor = 0;
        self.state.completion = None;
        self.state.completion_cursor = 0;
        self.state.set_status("Find all pairs".to_string());
    }

    async fn finish_round(&mut self, result: RoundResult) {
        let report = self
            .reporter
            .report_result(self.session.as_ref(), result.elapsed)
            .await;
        if report.warnings.is_empty() {
            let message = if report.new_best {
                format!("New best: {}s", format_elapsed(report.elapsed))
            } else {
                format!("Finished in {}s", format_elapsed(report.elapsed))
            };
            self.state.set_status(message);
        } else {
            let notices: Vec<String> = report.warnings.iter().map(|w| w.to_string()).collect();
            self.state.set_status(notices.join(" • "));
        }
        self.state.completion = Some(Completion {
            elapsed: report.elapsed,
            new_best: report.new_best,
            previous_best: report.previous_best,
        });
        self.state.completion_cursor = 0;
        self.refresh_results();
    }

    async fn open_ranking(&mut self) {
        self.engine.teardown();
        self.screen = Screen::Ranking;
        self.state.ranking_state.select(None);
        match fetch_leaderboard(self.gateway.as_ref()).await {
            Ok(entries) => {
                info!(total = entries.len(), "Ranking loaded");
                if !entries.is_empty() {
                    self.state.ranking_state.select(Some(0));
                }
                self.state.ranking = entries;
                self.state.set_status("Ranking loaded".to_string());
            }
            Err(err) => {
                error!(?err, "Ranking fetch failed");
                self.state.ranking.clear();
                self.state
                    .set_status(format!("Could not load the ranking: {err}"));
            }
        }
    }

    async fn submit_login(&mut self) {
        match session::login(self.gateway.as_ref(), &self.state.login_input).await {
            Ok(session) => {
                self.state.set_status(format!("Welcome, {}", session.username));
                self.session = Some(session);
                self.state.login_input.clear();
                self.open_start();
            }
            Err(LoginError::EmptyUsername) => {
                self.state
                    .set_status("Enter a username to continue".to_string());
            }
            Err(err) => {
                error!(?err, "Sign-in failed");
                self.state.set_status(format!("Sign-in failed: {err}"));
            }
        }
    }

    async fn logout(&mut self) {
        if let Some(session) = self.session.take() {
            if let Err(err) = session::logout(self.gateway.as_ref(), session).await {
                warn!("Sign-out failed: {err}");
                self.state.set_status(format!("Sign-out failed: {err}"));
                self.screen = Screen::Login;
                return;
            }
        }
        self.screen = Screen::Login;
        self.state.set_status("Signed out".to_string());
    }

    async fn handle_input(&mut self, event: Event) -> Result<()> {
        let Event::Key(key) = event else {
            return Ok(());
        };
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            self.state.should_quit = true;
            return Ok(());
        }
        match self.screen {
            Screen::Login => self.handle_login_key(key).await,
            Screen::Start => self.handle_start_key(key).await,
            Screen::Game if self.state.completion.is_some() => {
                self.handle_completion_key(key).await
            }
            Screen::Game => self.handle_game_key(key).await,
            Screen::Ranking => self.handle_ranking_key(key),
        }
        Ok(())
    }

    async fn handle_login_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.state.should_quit = true,
            KeyCode::Enter => self.submit_login().await,
            KeyCode::Backspace => {
                self.state.login_input.pop();
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                if self.state.login_input.chars().count() < MAX_USERNAME_LEN {
                    self.state.login_input.push(ch);
                }
            }
            _ => {}
        }
    }

    async fn handle_start_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.state.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => {
                self.state.menu_cursor = (self.state.menu_cursor + 1) % START_MENU.len();
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.menu_cursor =
                    (self.state.menu_cursor + START_MENU.len() - 1) % START_MENU.len();
            }
            KeyCode::Enter => match self.state.menu_cursor {
                0 => self.start_round(),
                1 => self.open_ranking().await,
                2 => self.logout().await,
                _ => self.state.should_quit = true,
            },
            _ => {}
        }
    }

    async fn handle_game_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.engine.teardown();
                self.open_start();
                self.state.set_status("Round abandoned".to_string());
            }
            KeyCode::Char('r') => self.start_round(),
            KeyCode::Left | KeyCode::Char('h') => self.move_grid_cursor(0, -1),
            KeyCode::Right | KeyCode::Char('l') => self.move_grid_cursor(0, 1),
            KeyCode::Up | KeyCode::Char('k') => self.move_grid_cursor(-1, 0),
            KeyCode::Down | KeyCode::Char('j') => self.move_grid_cursor(1, 0),
            KeyCode::Enter | KeyCode::Char(' ') => self.select_under_cursor().await,
            _ => {}
        }
    }

    async fn handle_completion_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down | KeyCode::Tab => {
                self.state.completion_cursor = (self.state.completion_cursor + 1) % COMPLETION_MENU.len();
            }
            KeyCode::Enter => {
                if self.state.completion_cursor == 0 {
                    self.engine.restart();
                    self.state.completion = None;
                    self.state.grid_cursor = 0;
                    self.state.set_status("Find all pairs".to_string());
                } else {
                    self.state.completion = None;
                    self.open_ranking().await;
                }
            }
            KeyCode::Esc => {
                self.state.completion = None;
                self.open_start();
            }
            _ => {}
        }
    }

    fn handle_ranking_key(&mut self, key: KeyEvent) {
        let total = self.state.ranking.len();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Backspace => self.open_start(),
            KeyCode::Down | KeyCode::Char('j') if total > 0 => {
                let next = self
                    .state
                    .ranking_state
                    .selected()
                    .map(|index| (index + 1).min(total - 1))
                    .unwrap_or(0);
                self.state.ranking_state.select(Some(next));
            }
            KeyCode::Up | KeyCode::Char('k') if total > 0 => {
                let previous = self
                    .state
                    .ranking_state
                    .selected()
                    .map(|index| index.saturating_sub(1))
                    .unwrap_or(0);
                self.state.ranking_state.select(Some(previous));
            }
            _ => {}
        }
    }

    fn move_grid_cursor(&mut self, rows: isize, cols: isize) {
        let row = (self.state.grid_cursor / GRID_COLUMNS) as isize;
        let col = (self.state.grid_cursor % GRID_COLUMNS) as isize;
        let row = (row + rows).clamp(0, GRID_ROWS as isize - 1) as usize;
        let col = (col + cols).clamp(0, GRID_COLUMNS as isize - 1) as usize;
        self.state.grid_cursor = row * GRID_COLUMNS + col;
    }

    async fn select_under_cursor(&mut self) {
        let Some(id) = self.engine.deck().at(self.state.grid_cursor).map(|card| card.id) else {
            return;
        };
        match self.engine.select_card(id) {
            SelectOutcome::Matched {
                completed: Some(result),
                ..
            } => self.finish_round(result).await,
            SelectOutcome::Matched { pair_key, .. } => {
                self.state.set_status(format!(
                    "Pair found: {pair_key} ({}/{PAIR_COUNT})",
                    self.engine.matched().len()
                ));
            }
            SelectOutcome::Mismatched => self.state.set_status("No match".to_string()),
            SelectOutcome::Revealed | SelectOutcome::Rejected(_) => {}
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        match self.screen {
            Screen::Login => self.draw_login(frame),
            Screen::Start => self.draw_start(frame),
            Screen::Game => self.draw_game(frame),
            Screen::Ranking => self.draw_ranking(frame),
        }
    }

    fn draw_login(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(8),
                Constraint::Min(5),
                Constraint::Length(3),
            ])
            .split(area);
        self.render_banner(frame, layout[0]);

        let width = 40.min(layout[1].width.max(1));
        let form_area = centered_rect(width, 5, layout[1]);
        let input = Line::from(vec![
            Span::styled(
                self.state.login_input.clone(),
                Style::default().fg(self.theme.primary_fg),
            ),
            Span::styled("▏", Style::default().fg(self.theme.accent)),
        ]);
        let form = Paragraph::new(vec![
            Line::from("Welcome to MEMO!"),
            Line::from("Enter username:"),
            input,
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Sign in"));
        frame.render_widget(form, form_area);

        self.render_status(frame, layout[2], "Enter: sign in • Esc: quit");
    }

    fn draw_start(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(8),
                Constraint::Length(4),
                Constraint::Min(6),
                Constraint::Length(3),
            ])
            .split(area);
        self.render_banner(frame, layout[0]);

        let player = self
            .session
            .as_ref()
            .map(|session| session.username.clone())
            .unwrap_or_else(|| "guest".to_string());
        let results = Paragraph::new(vec![
            Line::from(format!("Player: {player}")),
            Line::from(format!(
                "Best result: {}   Previous: {}",
                format_optional(self.state.best),
                format_optional(self.state.previous)
            )),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(results, layout[1]);

        let menu_height = (START_MENU.len() as u16 + 2).min(layout[2].height);
        let menu_area = centered_rect(24.min(layout[2].width.max(1)), menu_height, layout[2]);
        let menu_lines: Vec<Line> = START_MENU
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                if idx == self.state.menu_cursor {
                    Line::from(Span::styled(
                        format!("▶ {item}"),
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(Span::styled(
                        format!("  {item}"),
                        Style::default().fg(self.theme.primary_fg),
                    ))
                }
            })
            .collect();
        let menu = Paragraph::new(menu_lines)
            .block(Block::default().borders(Borders::ALL).title("Menu"))
            .alignment(Alignment::Center);
        frame.render_widget(menu, menu_area);

        self.render_status(frame, layout[3], "j/k: move • Enter: choose • q: quit");
    }

    fn draw_game(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(7),
                Constraint::Min(GRID_ROWS as u16 * 3),
                Constraint::Length(3),
            ])
            .split(area);

        let timer_color = match self.engine.status() {
            RoundStatus::Complete => self.theme.success,
            _ => self.theme.accent,
        };
        let mut timer_lines: Vec<Line> = block_font::render_flat(&format_elapsed(self.engine.elapsed()))
            .into_iter()
            .map(|line| Line::from(Span::styled(line, Style::default().fg(timer_color))))
            .collect();
        timer_lines.push(Line::from(Span::styled(
            format!("Pairs {}/{PAIR_COUNT}", self.engine.matched().len()),
            Style::default().fg(self.theme.muted),
        )));
        frame.render_widget(
            Paragraph::new(timer_lines).alignment(Alignment::Center),
            layout[0],
        );

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Ratio(1, GRID_ROWS as u32); GRID_ROWS])
            .split(layout[1]);
        for (row_index, row_area) in rows.iter().enumerate() {
            let cells = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Ratio(1, GRID_COLUMNS as u32); GRID_COLUMNS])
                .split(*row_area);
            for (col_index, cell) in cells.iter().enumerate() {
                let position = row_index * GRID_COLUMNS + col_index;
                if let Some(card) = self.engine.deck().at(position) {
                    self.render_card(frame, *cell, position, card);
                }
            }
        }

        self.render_status(
            frame,
            layout[2],
            "arrows/hjkl: move • Enter/Space: flip • r: reshuffle • Esc: menu",
        );

        if let Some(completion) = &self.state.completion {
            self.render_completion(frame, completion);
        }
    }

    fn render_card(&self, frame: &mut Frame, area: Rect, position: usize, card: &Card) {
        let face_up = self.engine.is_face_up(card.id);
        let matched = self.engine.is_matched(card.id);
        let selected = self.engine.selection().contains(&card.id);

        let (text, style) = if matched {
            (card.content, Style::default().fg(self.theme.success))
        } else if selected {
            (
                card.content,
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )
        } else if face_up {
            (card.content, Style::default().fg(self.theme.primary_fg))
        } else {
            (FACE_DOWN, Style::default().fg(self.theme.muted))
        };

        let border_style = if position == self.state.grid_cursor {
            Style::default()
                .fg(self.theme.warning)
                .add_modifier(Modifier::BOLD)
        } else if matched {
            Style::default().fg(self.theme.success)
        } else {
            Style::default().fg(self.theme.accent_alt)
        };

        let padding = area.height.saturating_sub(3) / 2;
        let mut lines = vec![Line::from(""); padding as usize];
        lines.push(Line::from(Span::styled(text, style)));
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).border_style(border_style));
        frame.render_widget(paragraph, area);
    }

    fn render_completion(&self, frame: &mut Frame, completion: &Completion) {
        let area = centered_rect(36, 9, frame.size());
        let mut lines = vec![
            Line::from(Span::styled(
                format!("Your result: {}s", format_elapsed(completion.elapsed)),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(if completion.new_best {
                Span::styled("New best score!", Style::default().fg(self.theme.success))
            } else {
                Span::styled(
                    format!("Best: {}s", format_optional(completion.previous_best)),
                    Style::default().fg(self.theme.muted),
                )
            }),
            Line::from(""),
        ];
        for (idx, item) in COMPLETION_MENU.iter().enumerate() {
            let style = if idx == self.state.completion_cursor {
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.primary_fg)
            };
            let marker = if idx == self.state.completion_cursor { "▶" } else { " " };
            lines.push(Line::from(Span::styled(format!("{marker} {item}"), style)));
        }

        frame.render_widget(Clear, area);
        let modal = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Round complete"));
        frame.render_widget(modal, area);
    }

    fn draw_ranking(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(3)])
            .split(area);

        let me = self.session.as_ref().map(|session| &session.user_id);
        let items: Vec<ListItem> = if self.state.ranking.is_empty() {
            vec![ListItem::new(Line::from(Span::styled(
                "No results yet",
                Style::default().fg(self.theme.muted),
            )))]
        } else {
            self.state
                .ranking
                .iter()
                .map(|entry| ranking_item(entry, me == Some(&entry.user_id), &self.theme))
                .collect()
        };

        let list_area = centered_rect(48.min(layout[0].width.max(1)), layout[0].height, layout[0]);
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Ranking"))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        frame.render_stateful_widget(list, list_area, &mut self.state.ranking_state);

        self.render_status(frame, layout[1], "j/k: scroll • Esc: back");
    }

    fn render_banner(&self, frame: &mut Frame, area: Rect) {
        let content: Vec<Line> = block_font::render("MEMO")
            .into_iter()
            .map(|line| {
                Line::from(Span::styled(
                    line,
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD),
                ))
            })
            .collect();
        frame.render_widget(
            Paragraph::new(content).alignment(Alignment::Center),
            area,
        );
    }

    fn render_status(&self, frame: &mut Frame, area: Rect, hint: &str) {
        let style = if self.state.status.starts_with("Could not")
            || self.state.status.starts_with("Sign-in failed")
            || self.state.status.starts_with("Error")
        {
            Style::default().fg(self.theme.danger)
        } else {
            Style::default().fg(self.theme.primary_fg)
        };
        let line = Line::from(vec![
            Span::styled(
                format!("[{}] ", self.state.status_at),
                Style::default().fg(self.theme.muted),
            ),
            Span::styled(self.state.status.clone(), style),
            Span::styled(format!("   {hint}"), Style::default().fg(self.theme.muted)),
        ]);
        let paragraph = Paragraph::new(line)
            .block(Block::default().borders(Borders::ALL).title("Status"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn ranking_item<'a>(entry: &LeaderboardEntry, is_me: bool, theme: &Theme) -> ListItem<'a> {
    let style = if is_me {
        Style::default()
            .fg(theme.accent)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.primary_fg)
    };
    ListItem::new(Line::from(vec![
        Span::styled(format!("{:>3}. ", entry.position), Style::default().fg(theme.muted)),
        Span::styled(format!("{:<28}", entry.display_name), style),
        Span::styled(
            format!("{:>9}s", format_elapsed(entry.best_score)),
            Style::default().fg(theme.success),
        ),
    ]))
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

struct UiState {
    status: String,
    status_at: String,
    should_quit: bool,
    login_input: String,
    menu_cursor: usize,
    grid_cursor: usize,
    completion: Option<Completion>,
    completion_cursor: usize,
    ranking: Vec<LeaderboardEntry>,
    ranking_state: ListState,
    previous: Option<Duration>,
    best: Option<Duration>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            status: "Ready".to_string(),
            status_at: Local::now().format("%H:%M:%S").to_string(),
            should_quit: false,
            login_input: String::new(),
            menu_cursor: 0,
            grid_cursor: 0,
            completion: None,
            completion_cursor: 0,
            ranking: Vec::new(),
            ranking_state: ListState::default(),
            previous: None,
            best: None,
        }
    }
}

impl UiState {
    fn set_status(&mut self, message: String) {
        self.status = message;
        self.status_at = Local::now().format("%H:%M:%S").to_string();
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
