use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use miette::IntoDiagnostic;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::app::{App, Overview, ProgressEvent, ProgressSink};
use crate::assembler::{ResultItem, SearchResponse};
use crate::fuzzy::Similar;
use crate::source::ObjectSource;

const EVENTS_MAX: usize = 4;
const LOGS_MAX: usize = 200;
const HINTS: &[&str] = &[
    "Tip: words are matched one by one, typos are tolerated",
    "Tip: TAB completes the last word from the catalog",
    "Tip: F5 or :reindex rebuilds the index from storage",
    "Tip: F1 help, F2 results, F4 logs, Esc quits",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Results,
    Logs,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    List,
    Index,
    Ready,
    Search,
}

impl Phase {
    fn label(self) -> &'static str {
        match self {
            Phase::List => "List",
            Phase::Index => "Index",
            Phase::Ready => "Ready",
            Phase::Search => "Search",
        }
    }
}

#[derive(Debug)]
struct AppState {
    status: String,
    phase: Phase,
    events: VecDeque<String>,
    logs: VecDeque<String>,
    view: View,
    response: SearchResponse,
    last_query: Option<String>,
    latency_ms: Option<u128>,
    overview: Option<Overview>,
    universe: Vec<String>,
    busy: bool,
    hint_index: usize,
    last_hint_update: Instant,
}

pub struct Tui {
    state: Arc<Mutex<AppState>>,
    input: String,
    history: Vec<String>,
    history_index: Option<usize>,
    selected: usize,
    log_scroll: u16,
}

struct TuiProgress {
    state: Arc<Mutex<AppState>>,
}

impl ProgressSink for TuiProgress {
    fn event(&self, event: ProgressEvent) {
        if let Ok(mut state) = self.state.lock() {
            let message = event.message.trim().to_string();
            if let Some((phase, payload)) = parse_phase(&message) {
                state.phase = phase;
                state.status = payload.to_string();
            } else {
                state.status = message.clone();
            }
            if let Some(elapsed) = event.elapsed {
                state.latency_ms = Some(elapsed.as_millis());
            }
            push_bounded(&mut state.events, message.clone(), EVENTS_MAX);
            push_bounded(
                &mut state.logs,
                format!("[{}] {message}", timestamp()),
                LOGS_MAX,
            );
        }
    }
}

enum Action {
    None,
    Quit,
    Search(String),
    Reindex,
}

impl Tui {
    pub fn new(overview: Option<Overview>) -> Self {
        Self {
            state: Arc::new(Mutex::new(AppState {
                status: "ready".to_string(),
                phase: Phase::Ready,
                events: VecDeque::new(),
                logs: VecDeque::new(),
                view: View::Results,
                response: SearchResponse::default(),
                last_query: None,
                latency_ms: None,
                universe: Vec::new(),
                overview,
                busy: false,
                hint_index: 0,
                last_hint_update: Instant::now(),
            })),
            input: String::new(),
            history: Vec::new(),
            history_index: None,
            selected: 0,
            log_scroll: 0,
        }
    }

    pub fn run<S: ObjectSource, M: Similar>(&mut self, app: &App<S, M>) -> miette::Result<()> {
        self.refresh_universe(app);

        let mut stdout = io::stdout();
        enable_raw_mode().into_diagnostic()?;
        stdout.execute(EnterAlternateScreen).into_diagnostic()?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).into_diagnostic()?;
        terminal.clear().into_diagnostic()?;

        let result = self.event_loop(app, &mut terminal);

        disable_raw_mode().into_diagnostic()?;
        let mut stdout = io::stdout();
        stdout.execute(LeaveAlternateScreen).into_diagnostic()?;
        result
    }

    fn event_loop<S: ObjectSource, M: Similar>(
        &mut self,
        app: &App<S, M>,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> miette::Result<()> {
        let mut tick = 0usize;
        loop {
            self.rotate_hint();
            self.draw(terminal, tick)?;

            if event::poll(Duration::from_millis(120)).into_diagnostic()? {
                if let Event::Key(key) = event::read().into_diagnostic()? {
                    match self.handle_key(key) {
                        Action::None => {}
                        Action::Quit => return Ok(()),
                        Action::Search(query) => self.search(app, &query),
                        Action::Reindex => self.reindex(app, terminal)?,
                    }
                }
            }

            tick = tick.wrapping_add(1);
        }
    }

    fn draw(
        &self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        tick: usize,
    ) -> miette::Result<()> {
        if let Ok(state) = self.state.lock() {
            terminal
                .draw(|frame| draw_ui(frame, self, &state, tick))
                .into_diagnostic()?;
        }
        Ok(())
    }

    fn search<S: ObjectSource, M: Similar>(&mut self, app: &App<S, M>, query: &str) {
        let sink = TuiProgress {
            state: self.state.clone(),
        };
        let response = app.search(query, &sink);
        self.selected = 0;
        if let Ok(mut state) = self.state.lock() {
            state.response = response;
            state.last_query = Some(query.to_string());
            state.view = View::Results;
        }
    }

    // Ingestion runs on a scoped worker so the screen keeps redrawing. The old
    // snapshot keeps serving until the new one is swapped in.
    fn reindex<S: ObjectSource, M: Similar>(
        &mut self,
        app: &App<S, M>,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> miette::Result<()> {
        self.set_busy(true);
        let sink = TuiProgress {
            state: self.state.clone(),
        };
        let outcome = thread::scope(|scope| {
            let handle = scope.spawn(|| app.index(&sink));
            let mut tick = 0usize;
            while !handle.is_finished() {
                self.draw(terminal, tick)?;
                thread::sleep(Duration::from_millis(60));
                tick = tick.wrapping_add(1);
            }
            handle
                .join()
                .map_err(|_| miette::Report::msg("index worker panicked"))
        })?;
        self.set_busy(false);

        match outcome {
            Ok(overview) => {
                if let Ok(mut state) = self.state.lock() {
                    state.overview = Some(overview);
                }
                self.refresh_universe(app);
                if let Some(query) = self.last_query() {
                    self.search(app, &query);
                }
            }
            Err(err) => {
                sink.event(ProgressEvent {
                    message: format!("reindex failed: {err}"),
                    elapsed: None,
                });
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.kind != KeyEventKind::Press {
            return Action::None;
        }
        match key.code {
            KeyCode::Esc => return Action::Quit,
            KeyCode::F(1) => self.set_view(View::Help),
            KeyCode::F(2) => self.set_view(View::Results),
            KeyCode::F(4) => self.set_view(View::Logs),
            KeyCode::F(5) => return Action::Reindex,
            KeyCode::Tab => {
                let completed = self.autocomplete();
                self.input = completed;
            }
            KeyCode::Up => {
                if self.input.is_empty() {
                    self.selected = self.selected.saturating_sub(1);
                } else {
                    self.history_up();
                }
            }
            KeyCode::Down => {
                if self.input.is_empty() {
                    let max = self.result_count().saturating_sub(1);
                    self.selected = (self.selected + 1).min(max);
                } else {
                    self.history_down();
                }
            }
            KeyCode::PageUp => self.scroll_logs(5),
            KeyCode::PageDown => self.scroll_logs(-5),
            KeyCode::Enter => return self.take_command(),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(ch) => self.input.push(ch),
            _ => {}
        }
        Action::None
    }

    fn take_command(&mut self) -> Action {
        let current = self.input.trim().to_string();
        self.input.clear();
        self.history_index = None;
        if current.is_empty() {
            return Action::None;
        }
        self.history.push(current.clone());
        match current.as_str() {
            ":q" | ":quit" => Action::Quit,
            ":reindex" => Action::Reindex,
            ":logs" => {
                self.set_view(View::Logs);
                Action::None
            }
            ":help" => {
                self.set_view(View::Help);
                Action::None
            }
            _ => Action::Search(current),
        }
    }

    fn autocomplete(&self) -> String {
        let (head, last) = match self.input.rsplit_once(' ') {
            Some((head, last)) => (format!("{head} "), last),
            None => (String::new(), self.input.as_str()),
        };
        if last.is_empty() {
            return self.input.clone();
        }
        let universe = self
            .state
            .lock()
            .map(|state| state.universe.clone())
            .unwrap_or_default();
        let mut best: Option<(usize, &String)> = None;
        for entry in &universe {
            if let Some(score) = fuzzy_score(last, entry) {
                match best {
                    Some((best_score, _)) if score >= best_score => {}
                    _ => best = Some((score, entry)),
                }
            }
        }
        match best {
            Some((_, entry)) => format!("{head}{entry}"),
            None => self.input.clone(),
        }
    }

    fn refresh_universe<S: ObjectSource, M: Similar>(&self, app: &App<S, M>) {
        let snapshot = app.snapshot();
        let universe = snapshot
            .store
            .universe()
            .into_iter()
            .filter(|entry| !entry.contains(' '))
            .map(str::to_string)
            .collect();
        if let Ok(mut state) = self.state.lock() {
            state.universe = universe;
        }
    }

    fn result_count(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.response.results.len())
            .unwrap_or(0)
    }

    fn last_query(&self) -> Option<String> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.last_query.clone())
    }

    fn set_view(&self, view: View) {
        if let Ok(mut state) = self.state.lock() {
            state.view = view;
        }
    }

    fn set_busy(&self, busy: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.busy = busy;
            if busy {
                state.phase = Phase::List;
                state.status = "rebuilding index".to_string();
            }
        }
    }

    fn rotate_hint(&self) {
        if let Ok(mut state) = self.state.lock() {
            if state.last_hint_update.elapsed() >= Duration::from_secs(5) {
                state.hint_index = (state.hint_index + 1) % HINTS.len().max(1);
                state.last_hint_update = Instant::now();
            }
        }
    }

    fn history_up(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let next = match self.history_index {
            Some(index) if index > 0 => index - 1,
            Some(_) => 0,
            None => self.history.len().saturating_sub(1),
        };
        self.history_index = Some(next);
        if let Some(value) = self.history.get(next).cloned() {
            self.input = value;
        }
    }

    fn history_down(&mut self) {
        let next = match self.history_index {
            Some(index) if index + 1 < self.history.len() => index + 1,
            _ => {
                self.history_index = None;
                self.input.clear();
                return;
            }
        };
        self.history_index = Some(next);
        if let Some(value) = self.history.get(next).cloned() {
            self.input = value;
        }
    }

    fn scroll_logs(&mut self, delta: i16) {
        let max = self.state.lock().map(|state| state.logs.len()).unwrap_or(0);
        let max_scroll = max.saturating_sub(1) as i16;
        let next = (self.log_scroll as i16 + delta).clamp(0, max_scroll.max(0));
        self.log_scroll = next as u16;
    }
}

fn draw_ui(frame: &mut ratatui::Frame, tui: &Tui, state: &AppState, tick: usize) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(4),
        ])
        .split(frame.area());

    frame.render_widget(draw_header(state, tick), chunks[0]);

    match state.view {
        View::Results => {
            let main = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
                .split(chunks[1]);
            frame.render_widget(draw_results(state, tui.selected), main[0]);
            let selected = state.response.results.get(tui.selected);
            frame.render_widget(draw_detail(selected), main[1]);
        }
        View::Logs => frame.render_widget(draw_logs_view(state, tui.log_scroll), chunks[1]),
        View::Help => frame.render_widget(draw_help(), chunks[1]),
    }

    draw_command_line(frame, tui, state, chunks[2]);
}

fn draw_header(state: &AppState, tick: usize) -> Paragraph<'static> {
    let hb = if state.busy && tick % 2 == 0 { "*" } else { " " };
    let phase_color = if state.busy {
        Color::Cyan
    } else {
        Color::Green
    };
    let header_line = Line::from(vec![
        Span::styled(
            "META-FINDER",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(env!("CARGO_PKG_VERSION"), Style::default().fg(Color::Gray)),
        Span::raw("   Phase: "),
        Span::styled(state.phase.label(), Style::default().fg(phase_color)),
        Span::raw("   "),
        Span::styled(state.status.clone(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(hb, Style::default().fg(Color::Green)),
    ]);
    let summary = match &state.overview {
        Some(overview) => format!(
            "Index: {} files · {} metadata keys · {} tag keys · built {}",
            overview.stats.files,
            overview.stats.metadata_keys,
            overview.stats.tag_keys,
            overview.built_at.as_deref().unwrap_or("-")
        ),
        None => "Index: empty (F5 to build)".to_string(),
    };
    Paragraph::new(vec![
        header_line,
        Line::from(Span::styled(summary, Style::default().fg(Color::Gray))),
    ])
    .alignment(Alignment::Left)
    .block(Block::default().borders(Borders::BOTTOM))
}

fn draw_results(state: &AppState, selected: usize) -> Paragraph<'static> {
    let title = match (&state.last_query, state.latency_ms) {
        (Some(query), Some(ms)) => format!(
            "Results for '{query}' ({} · {ms} ms)",
            state.response.results.len()
        ),
        (Some(query), None) => format!("Results for '{query}'"),
        _ => "Results".to_string(),
    };
    let mut lines = Vec::new();
    if state.response.is_empty() {
        let hint = if state.last_query.is_some() {
            "no match"
        } else {
            "type a query and press Enter"
        };
        lines.push(Line::from(Span::styled(
            hint,
            Style::default().fg(Color::DarkGray),
        )));
    }
    for (index, item) in state.response.results.iter().enumerate() {
        let style = if index == selected {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        lines.push(Line::from(vec![
            Span::styled(format!(" {} ", item.filename), style),
            Span::styled(
                format!("  {} hits", item.matches.len()),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }
    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: true })
}

fn draw_detail(item: Option<&ResultItem>) -> Paragraph<'static> {
    let label = |text: &'static str| Span::styled(text, Style::default().fg(Color::Cyan));
    let lines = match item {
        Some(item) => {
            let mut lines = vec![
                Line::from(vec![label("file     "), Span::raw(item.filename.clone())]),
                Line::from(vec![label("url      "), Span::raw(item.url.clone())]),
                Line::from(vec![label("metadata "), Span::raw(item.metadata.clone())]),
                Line::from(vec![label("tags     "), Span::raw(item.tags.clone())]),
                Line::from(label("match")),
            ];
            for reason in &item.matches {
                lines.push(Line::from(Span::styled(
                    format!("  · {reason}"),
                    Style::default().fg(Color::Green),
                )));
            }
            lines
        }
        None => vec![Line::from(Span::styled(
            "nothing selected",
            Style::default().fg(Color::DarkGray),
        ))],
    };
    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Detail"))
        .wrap(Wrap { trim: false })
}

fn draw_logs_view(state: &AppState, scroll: u16) -> Paragraph<'static> {
    let total = state.logs.len();
    let visible = 20usize;
    let start = total.saturating_sub(scroll as usize + visible);
    let lines: Vec<Line> = state
        .logs
        .iter()
        .skip(start)
        .take(visible)
        .map(|line| Line::from(line.clone()))
        .collect();
    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Logs (PgUp/PgDown)"),
        )
        .wrap(Wrap { trim: true })
}

fn draw_help() -> Paragraph<'static> {
    let lines = vec![
        Line::from("F1 Help  F2 Results  F4 Logs  F5 Reindex  Esc Quit"),
        Line::from("Enter runs the query; words are matched independently"),
        Line::from("Up/Down move the selection (or walk history while typing)"),
        Line::from("TAB completes the last word from catalog keys and values"),
        Line::from("Commands: :reindex  :logs  :help  :q"),
    ];
    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Help"))
        .wrap(Wrap { trim: true })
}

fn draw_command_line(frame: &mut ratatui::Frame, tui: &Tui, state: &AppState, area: Rect) {
    let prefix = "search> ";
    let hint = HINTS.get(state.hint_index).copied().unwrap_or("");
    let recent = state.events.back().cloned().unwrap_or_default();
    let lines = vec![
        Line::from(vec![
            Span::styled(
                prefix,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(tui.input.clone()),
        ]),
        Line::from(Span::styled(recent, Style::default().fg(Color::DarkGray))),
        Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::TOP)),
        area,
    );

    let mut cursor_x = area
        .x
        .saturating_add((prefix.len() + tui.input.chars().count()) as u16);
    if cursor_x >= area.x.saturating_add(area.width) {
        cursor_x = area.x.saturating_add(area.width.saturating_sub(1));
    }
    frame.set_cursor_position((cursor_x, area.y.saturating_add(1)));
}

fn parse_phase(message: &str) -> Option<(Phase, &str)> {
    let (head, rest) = message.split_once(';')?;
    let phase = match head.strip_prefix("phase=")? {
        "List" => Phase::List,
        "Index" => Phase::Index,
        "Ready" => Phase::Ready,
        "Search" => Phase::Search,
        _ => return None,
    };
    Some((phase, rest.trim()))
}

fn push_bounded(buffer: &mut VecDeque<String>, item: String, max: usize) {
    buffer.push_back(item);
    while buffer.len() > max {
        buffer.pop_front();
    }
}

fn timestamp() -> String {
    let now = SystemTime::now();
    let secs = now
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_secs();
    let mins = (secs / 60) % 60;
    let hours = (secs / 3600) % 24;
    let seconds = secs % 60;
    format!("{hours:02}:{mins:02}:{seconds:02}")
}

fn fuzzy_score(needle: &str, hay: &str) -> Option<usize> {
    let mut score = 0usize;
    let mut iter = hay.chars();
    for ch in needle.chars() {
        let mut found = false;
        for h in iter.by_ref() {
            score += 1;
            if h.eq_ignore_ascii_case(&ch) {
                found = true;
                break;
            }
        }
        if !found {
            return None;
        }
    }
    Some(score + hay.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_messages_parse() {
        assert_eq!(
            parse_phase("phase=Index; test/a.txt"),
            Some((Phase::Index, "test/a.txt"))
        );
        assert_eq!(parse_phase("phase=Bogus; x"), None);
        assert_eq!(parse_phase("plain message"), None);
    }

    #[test]
    fn subsequence_scoring_prefers_tight_matches() {
        let tight = fuzzy_score("src", "source").unwrap();
        let loose = fuzzy_score("src", "insertedBy=research").unwrap();
        assert!(tight < loose);
        assert_eq!(fuzzy_score("xyz", "source"), None);
    }

    #[test]
    fn autocomplete_replaces_last_word() {
        let mut tui = Tui::new(None);
        if let Ok(mut state) = tui.state.lock() {
            state.universe = vec!["insertedBy".to_string(), "source".to_string()];
        }
        tui.input = "me sorc".to_string();
        assert_eq!(tui.autocomplete(), "me source");
    }

    #[test]
    fn commands_are_recognised() {
        let mut tui = Tui::new(None);
        tui.input = ":reindex".to_string();
        assert!(matches!(tui.take_command(), Action::Reindex));
        tui.input = "raw txt".to_string();
        assert!(matches!(tui.take_command(), Action::Search(q) if q == "raw txt"));
        assert_eq!(tui.history.len(), 2);
    }
}
