// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod color;

pub use color::{css_color, parse_css_color};

use anyhow::{Context, Result, anyhow};
use color::text_color;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};
use winlens_app::{
    AppCommand, AppEvent, AppState, EventDictionary, FetchError, FocusPane, LoadOutcome,
    PageRequest, PaginationPhase, Query, QueryDataPaginator, QueryFormField, QueryStatus,
    SessionToken, VisualBlock, WindowPage,
};

const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const LINES_PER_WINDOW: usize = 3;

/// Backend access for the terminal loop.
///
/// The blocking methods do the work; the `spawn_*` methods report back through
/// the internal channel and default to running inline, which is what tests
/// want. Real runtimes override them to use worker threads.
pub trait AppRuntime {
    fn list_queries(&mut self) -> Result<Vec<Query>>;
    fn run_query(&mut self, src: Option<&str>, dst: Option<&str>) -> Result<Query>;
    fn load_page(&mut self, request: &PageRequest) -> Result<WindowPage, FetchError>;
    fn load_dictionary(&mut self) -> Result<Arc<EventDictionary>, FetchError>;

    fn spawn_page_load(&mut self, request: PageRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let page = self.load_page(&request);
        let dictionary = page.is_ok().then(|| self.load_dictionary());
        tx.send(InternalEvent::PageLoaded {
            token: request.token,
            page,
            dictionary,
        })
        .map_err(|_| anyhow!("page event channel closed"))?;
        Ok(())
    }

    fn spawn_dictionary_load(
        &mut self,
        token: SessionToken,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let result = self.load_dictionary();
        tx.send(InternalEvent::DictionaryLoaded { token, result })
            .map_err(|_| anyhow!("dictionary event channel closed"))?;
        Ok(())
    }

    fn spawn_run_query(
        &mut self,
        src: Option<String>,
        dst: Option<String>,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let result = self
            .run_query(src.as_deref(), dst.as_deref())
            .map_err(|error| format!("{error:#}"));
        tx.send(InternalEvent::QueryRan(result))
            .map_err(|_| anyhow!("query event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    PageLoaded {
        token: SessionToken,
        page: Result<WindowPage, FetchError>,
        /// Fetched after a successful page so rendering can happen in one go.
        dictionary: Option<Result<Arc<EventDictionary>, FetchError>>,
    },
    DictionaryLoaded {
        token: SessionToken,
        result: Result<Arc<EventDictionary>, FetchError>,
    },
    QueryRan(Result<Query, String>),
}

#[derive(Debug, Clone)]
struct ViewData {
    paginator: QueryDataPaginator,
    window_scroll: usize,
    block_cursor: usize,
    status_token: u64,
    query_running: bool,
    help_visible: bool,
}

impl ViewData {
    fn new(paginator: QueryDataPaginator) -> Self {
        Self {
            paginator,
            window_scroll: 0,
            block_cursor: 0,
            status_token: 0,
            query_running: false,
            help_visible: false,
        }
    }

    fn focused_blocks(&self) -> Vec<&VisualBlock> {
        self.paginator
            .windows()
            .get(self.window_scroll)
            .map(|window| window.observation.iter().chain(&window.prediction).collect())
            .unwrap_or_default()
    }

    fn focused_block(&self) -> Option<&VisualBlock> {
        self.focused_blocks().get(self.block_cursor).copied()
    }
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    paginator: QueryDataPaginator,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(paginator);
    let (internal_tx, internal_rx) = mpsc::channel();

    refresh_queries(state, runtime, &mut view_data, &internal_tx);

    let mut result = Ok(());
    loop {
        process_internal_events(state, runtime, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event
            && let Event::Key(key) = event::read().context("read event")?
            && handle_key_event(state, runtime, &mut view_data, &internal_tx, key)
        {
            break;
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::PageLoaded {
                token,
                page,
                dictionary,
            } => handle_page_loaded(state, view_data, tx, token, page, dictionary),
            InternalEvent::DictionaryLoaded { token, result } => {
                handle_dictionary_loaded(state, view_data, tx, token, result);
            }
            InternalEvent::QueryRan(result) => {
                handle_query_ran(state, runtime, view_data, tx, result);
            }
        }
    }
}

fn handle_page_loaded(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    token: SessionToken,
    page: Result<WindowPage, FetchError>,
    dictionary: Option<Result<Arc<EventDictionary>, FetchError>>,
) {
    let (rows, exhausted) = match view_data.paginator.complete_load(token, page) {
        Ok(LoadOutcome::Loaded { rows, exhausted }) => (rows, exhausted),
        Ok(LoadOutcome::Stale | LoadOutcome::Skipped) => return,
        Err(error) => {
            emit_status(
                state,
                view_data,
                tx,
                format!("load failed: {error}; press r to retry"),
            );
            return;
        }
    };

    match dictionary {
        Some(Ok(dictionary)) => {
            view_data.paginator.render_pending(&dictionary);
        }
        Some(Err(error)) => {
            view_data.paginator.record_error(token, error.clone());
            emit_status(
                state,
                view_data,
                tx,
                format!("event dictionary unavailable: {error}; press r to retry"),
            );
            return;
        }
        None => {}
    }

    let message = if exhausted {
        match view_data.paginator.state().total {
            0 => "query produced no windows".to_owned(),
            total => format!("all {total} windows loaded"),
        }
    } else {
        format!("loaded {rows} windows")
    };
    emit_status(state, view_data, tx, message);
}

fn handle_dictionary_loaded(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    token: SessionToken,
    result: Result<Arc<EventDictionary>, FetchError>,
) {
    if token != view_data.paginator.token() {
        debug!(token = token.get(), "dropping dictionary for stale session");
        return;
    }
    match result {
        Ok(dictionary) => {
            let rendered = view_data.paginator.render_pending(&dictionary);
            emit_status(state, view_data, tx, format!("rendered {rendered} windows"));
        }
        Err(error) => {
            view_data.paginator.record_error(token, error.clone());
            emit_status(
                state,
                view_data,
                tx,
                format!("event dictionary unavailable: {error}; press r to retry"),
            );
        }
    }
}

fn handle_query_ran<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    result: Result<Query, String>,
) {
    view_data.query_running = false;
    let query = match result {
        Ok(query) => query,
        Err(error) => {
            emit_status(state, view_data, tx, format!("query failed: {error}"));
            return;
        }
    };

    let id = query.id.clone();
    let rows = query.rows;
    let mut queries = match runtime.list_queries() {
        Ok(queries) => queries,
        Err(error) => {
            warn!("query list refresh failed: {error:#}");
            state.queries.clone()
        }
    };
    if !queries.iter().any(|known| known.id == id) {
        queries.push(query);
    }

    state.dispatch(AppCommand::ReplaceQueries(queries));
    state.dispatch(AppCommand::Select(id.clone()));
    if state.focus == FocusPane::Queries {
        state.dispatch(AppCommand::ToggleFocus);
    }
    start_session(state, runtime, view_data, tx);
    emit_status(state, view_data, tx, format!("query {id}: {rows} windows"));
}

fn refresh_queries<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    match runtime.list_queries() {
        Ok(queries) => {
            let events = state.dispatch(AppCommand::ReplaceQueries(queries));
            apply_app_events(state, runtime, view_data, tx, events);
        }
        Err(error) => emit_status(
            state,
            view_data,
            tx,
            format!("load queries failed: {error:#}; check [server] base_url"),
        ),
    }
}

fn apply_app_events<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    events: Vec<AppEvent>,
) {
    for event in events {
        if let AppEvent::QuerySelected(_) = event {
            start_session(state, runtime, view_data, tx);
        }
    }
}

/// Discards whatever the windows pane shows and loads the first page of the
/// selected query.
fn start_session<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    view_data.window_scroll = 0;
    view_data.block_cursor = 0;
    let Some(query) = state.selected_query().cloned() else {
        view_data.paginator.clear();
        return;
    };
    view_data.paginator.reset(&query);

    if query.status != QueryStatus::Done {
        emit_status(
            state,
            view_data,
            tx,
            format!("query {} is {}; no windows yet", query.id, query.status.as_str()),
        );
        return;
    }
    request_page(state, runtime, view_data, tx);
}

fn request_page<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    let Some(request) = view_data.paginator.begin_load() else {
        let message = match view_data.paginator.phase() {
            PaginationPhase::Loading => "already loading",
            PaginationPhase::Exhausted => "all windows loaded",
            PaginationPhase::Idle => "select a query first",
        };
        emit_status(state, view_data, tx, message);
        return;
    };

    let token = request.token;
    if let Err(error) = runtime.spawn_page_load(request, tx.clone()) {
        let error = FetchError::network(format!("{error:#}"));
        let _ = view_data.paginator.complete_load(token, Err(error.clone()));
        emit_status(state, view_data, tx, format!("load failed: {error}"));
    }
}

/// Pages whose dictionary lookup failed are redrawn first; otherwise the page
/// that failed is requested again at the same offset.
fn retry_load<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    if view_data.paginator.has_pending() {
        let token = view_data.paginator.token();
        if let Err(error) = runtime.spawn_dictionary_load(token, tx.clone()) {
            emit_status(state, view_data, tx, format!("retry failed: {error:#}"));
        }
        return;
    }
    request_page(state, runtime, view_data, tx);
}

fn submit_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    if view_data.query_running {
        emit_status(state, view_data, tx, "a query is already running");
        return;
    }
    if let Err(error) = state.form.validate() {
        emit_status(state, view_data, tx, error.to_string());
        return;
    }

    let (src, dst) = state.form.filters();
    let (src, dst) = (src.map(str::to_owned), dst.map(str::to_owned));
    state.dispatch(AppCommand::CloseForm);
    view_data.query_running = true;
    emit_status(state, view_data, tx, "running query...");
    if let Err(error) = runtime.spawn_run_query(src, dst, tx.clone()) {
        view_data.query_running = false;
        emit_status(state, view_data, tx, format!("query failed: {error:#}"));
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return false;
    }

    if let FocusPane::Form(field) = state.focus {
        handle_form_key(state, runtime, view_data, internal_tx, field, key);
        return false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('?') => {
            view_data.help_visible = true;
            return false;
        }
        KeyCode::Tab => {
            state.dispatch(AppCommand::ToggleFocus);
            return false;
        }
        KeyCode::Char('n') => {
            state.dispatch(AppCommand::OpenForm);
            return false;
        }
        KeyCode::Char('R') => {
            refresh_queries(state, runtime, view_data, internal_tx);
            return false;
        }
        KeyCode::Char('m') => {
            request_page(state, runtime, view_data, internal_tx);
            return false;
        }
        KeyCode::Char('r') => {
            retry_load(state, runtime, view_data, internal_tx);
            return false;
        }
        _ => {}
    }

    match state.focus {
        FocusPane::Queries => handle_queries_key(state, runtime, view_data, internal_tx, key),
        FocusPane::Windows => handle_windows_key(state, runtime, view_data, internal_tx, key),
        FocusPane::Form(_) => {}
    }
    false
}

fn handle_queries_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let command = match key.code {
        KeyCode::Char('j') | KeyCode::Down => AppCommand::SelectNext,
        KeyCode::Char('k') | KeyCode::Up => AppCommand::SelectPrev,
        KeyCode::Enter => AppCommand::ToggleFocus,
        _ => return,
    };
    let events = state.dispatch(command);
    apply_app_events(state, runtime, view_data, internal_tx, events);
}

fn handle_windows_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let last_window = view_data.paginator.windows().len().saturating_sub(1);
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            view_data.window_scroll = (view_data.window_scroll + 1).min(last_window);
            view_data.block_cursor = 0;
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.window_scroll = view_data.window_scroll.saturating_sub(1);
            view_data.block_cursor = 0;
        }
        KeyCode::Char('g') => {
            view_data.window_scroll = 0;
            view_data.block_cursor = 0;
        }
        KeyCode::Char('G') => {
            view_data.window_scroll = last_window;
            view_data.block_cursor = 0;
        }
        KeyCode::Char('l') | KeyCode::Right => {
            let last_block = view_data.focused_blocks().len().saturating_sub(1);
            view_data.block_cursor = (view_data.block_cursor + 1).min(last_block);
        }
        KeyCode::Char('h') | KeyCode::Left => {
            view_data.block_cursor = view_data.block_cursor.saturating_sub(1);
        }
        KeyCode::Enter => request_page(state, runtime, view_data, internal_tx),
        _ => {}
    }
}

fn handle_form_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    field: QueryFormField,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => {
            state.dispatch(AppCommand::CloseForm);
            emit_status(state, view_data, internal_tx, "query canceled");
        }
        KeyCode::Tab | KeyCode::BackTab => {
            state.dispatch(AppCommand::NextFormField);
        }
        KeyCode::Enter => submit_form(state, runtime, view_data, internal_tx),
        KeyCode::Backspace => {
            state.form.field_mut(field).pop();
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            state.form.field_mut(field).push(ch);
        }
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(header_text(state, view_data))
        .block(Block::default().title("winlens").borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(layout[1]);

    let queries = Paragraph::new(query_list_lines(state))
        .block(pane_block("queries".to_owned(), state.focus == FocusPane::Queries));
    frame.render_widget(queries, body[0]);

    let visible_lines = usize::from(body[1].height.saturating_sub(2));
    let windows = Paragraph::new(window_lines(view_data, visible_lines))
        .wrap(Wrap { trim: false })
        .block(pane_block(
            windows_title(view_data),
            state.focus == FocusPane::Windows,
        ));
    frame.render_widget(windows, body[1]);

    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);

    if let FocusPane::Form(field) = state.focus {
        let area = centered_rect(60, 40, frame.area());
        frame.render_widget(Clear, area);
        let form = Paragraph::new(form_overlay_text(state, field))
            .block(Block::default().title("run query").borders(Borders::ALL));
        frame.render_widget(form, area);
    }

    if view_data.help_visible {
        let area = centered_rect(70, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn pane_block(title: String, focused: bool) -> Block<'static> {
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(style)
}

fn header_text(state: &AppState, view_data: &ViewData) -> String {
    let selected = state
        .selected_query()
        .map_or_else(|| "no query selected".to_owned(), Query::describe);
    let running = if view_data.query_running {
        " | query running"
    } else {
        ""
    };
    format!(
        "{} queries | {selected} | style: {}{running}",
        state.queries.len(),
        view_data.paginator.renderer().strategy().as_str()
    )
}

fn status_color(status: QueryStatus) -> Color {
    match status {
        QueryStatus::Pending => Color::DarkGray,
        QueryStatus::Running => Color::Yellow,
        QueryStatus::Done => Color::Green,
        QueryStatus::Error => Color::Red,
    }
}

fn query_list_lines(state: &AppState) -> Vec<Line<'static>> {
    if state.queries.is_empty() {
        return vec![Line::from("no queries yet -- press n to run one")];
    }
    state
        .queries
        .iter()
        .map(|query| {
            let selected = state.selected.as_ref() == Some(&query.id);
            let (marker, style) = if selected {
                ("> ", Style::default().add_modifier(Modifier::BOLD))
            } else {
                ("  ", Style::default())
            };
            Line::from(vec![
                Span::raw(marker),
                Span::styled(
                    format!("[{}]", query.status.as_str()),
                    Style::default().fg(status_color(query.status)),
                ),
                Span::styled(format!(" {} ({} rows)", query.describe(), query.rows), style),
            ])
        })
        .collect()
}

fn windows_title(view_data: &ViewData) -> String {
    let paginator = &view_data.paginator;
    if paginator.query_id().is_none() {
        return "windows".to_owned();
    }
    format!(
        "windows {}/{}",
        paginator.windows().len(),
        paginator.state().total
    )
}

fn window_lines(view_data: &ViewData, visible_lines: usize) -> Vec<Line<'static>> {
    let paginator = &view_data.paginator;
    if paginator.query_id().is_none() {
        return vec![Line::from("select a query to load its windows")];
    }

    let footer = footer_lines(view_data);
    let room = visible_lines.saturating_sub(footer.len()) / LINES_PER_WINDOW;
    let mut lines = Vec::new();
    for (offset, window) in paginator
        .windows()
        .iter()
        .skip(view_data.window_scroll)
        .take(room.max(1))
        .enumerate()
    {
        let cursor = (offset == 0).then_some(view_data.block_cursor);
        lines.push(Line::styled(
            window.title(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        lines.push(block_line("obs ", &window.observation, cursor));
        let prediction_cursor =
            cursor.and_then(|cursor| cursor.checked_sub(window.observation.len()));
        lines.push(block_line("pred", &window.prediction, prediction_cursor));
    }
    lines.extend(footer);
    lines
}

fn block_line(label: &str, blocks: &[VisualBlock], cursor: Option<usize>) -> Line<'static> {
    let muted = Style::default().fg(Color::DarkGray);
    let mut spans = vec![Span::styled(format!("{label} "), muted)];
    if blocks.is_empty() {
        spans.push(Span::styled("-", muted));
    }
    for (index, block) in blocks.iter().enumerate() {
        let mut style = block_style(block);
        if cursor == Some(index) {
            style = style.add_modifier(Modifier::UNDERLINED | Modifier::BOLD);
        }
        spans.push(Span::styled(format!(" {} ", block.label), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

fn block_style(block: &VisualBlock) -> Style {
    let style = Style::default()
        .bg(css_color(&block.background))
        .fg(text_color(block.text));
    if block.decorated {
        style
    } else {
        style.add_modifier(Modifier::ITALIC)
    }
}

/// Load-more affordance, error affordance, and the focused block's tooltip.
fn footer_lines(view_data: &ViewData) -> Vec<Line<'static>> {
    let paginator = &view_data.paginator;
    let mut lines = Vec::new();

    if let Some(block) = view_data.focused_block() {
        lines.push(Line::styled(
            block.tooltip.replace('\n', " | "),
            Style::default().fg(Color::Gray),
        ));
    }

    if let Some(error) = paginator.last_error() {
        lines.push(Line::styled(
            format!("error: {error} -- press r to retry"),
            Style::default().fg(Color::Red),
        ));
    }

    match paginator.phase() {
        PaginationPhase::Loading => lines.push(Line::from("loading...")),
        PaginationPhase::Exhausted => {
            let total = paginator.state().total;
            let message = if total == 0 {
                "no windows".to_owned()
            } else {
                format!("all {total} windows loaded")
            };
            lines.push(Line::styled(message, Style::default().fg(Color::DarkGray)));
        }
        PaginationPhase::Idle => {
            if let Some(label) = paginator.progress_label() {
                lines.push(Line::styled(
                    format!("{label} -- press m"),
                    Style::default().fg(Color::Cyan),
                ));
            }
        }
    }
    lines
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    if view_data.help_visible {
        return String::new();
    }
    let (focus, hints) = match state.focus {
        FocusPane::Queries => (
            "QUERIES",
            "j/k select | enter windows | n new | R refresh | tab | ? help | q quit",
        ),
        FocusPane::Windows => (
            "WINDOWS",
            "j/k scroll | h/l block | m more | r retry | tab | ? help | q quit",
        ),
        FocusPane::Form(_) => ("FORM", "enter run | tab next field | esc cancel"),
    };
    match &state.status_line {
        Some(status) => format!("{focus} | {status} | {hints}"),
        None => format!("{focus} | {hints}"),
    }
}

fn form_overlay_text(state: &AppState, active: QueryFormField) -> String {
    let line = |field: QueryFormField| {
        let marker = if field == active { ">" } else { " " };
        format!("{marker} {}: {}", field.label(), state.form.field(field))
    };
    [
        line(QueryFormField::Src),
        line(QueryFormField::Dst),
        String::new(),
        "at least one of src or dst is required".to_owned(),
    ]
    .join("\n")
}

fn help_overlay_text() -> &'static str {
    "\
queries
  j/k, up/down   select query (loads its first page)
  enter          focus windows
  n              run a new query
  R              refresh query list

windows
  j/k            scroll windows
  h/l            move between event blocks
  g/G            first/last window
  m, enter       load more windows
  r              retry the last failed load

anywhere
  tab            switch pane
  ?              toggle help
  q, ctrl+q      quit"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
