use std::fs::OpenOptions;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind}, execute, terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen}};
use ratatui::{backend::CrosstermBackend, Terminal, widgets::{Block, Borders, List, ListItem, Paragraph, ListState, Wrap}, layout::{Layout, Constraint, Direction}, style::{Style, Modifier, Color}, text::{Line, Span}};
use tracing_subscriber::EnvFilter;

use taskboard::{
    application::{context::AppContext, view::{displayed_tasks, reorder_in_view}},
    config::Config,
    domain::{storage::KeyValueStorage, task::{Filter, Task, TaskColor, TaskId, TaskPatch}, theme::Theme},
    infrastructure::sqlite_storage::{prepare_sqlite_file, SqliteStorage},
};

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    init_tracing(&config)?;

    prepare_sqlite_file(&config.database_url)?;
    let storage = SqliteStorage::connect(&config.database_url)?;
    let ctx = AppContext::init(storage);
    tracing::info!(database_url = %config.database_url, "starting");

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, App::new(ctx, config.database_url.clone()));

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    tracing::info!("shutdown");
    res
}

/// The UI owns the screen, so logs only go somewhere when a file is configured.
fn init_tracing(config: &Config) -> Result<()> {
    let Some(path) = &config.log_file else { return Ok(()) };
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode { View, Create, Edit, Search, ConfirmDelete }

#[derive(Clone, Copy, PartialEq, Eq)]
enum ActiveField { Title, Description }

struct Palette { fg: Color, bg: Color, accent: Color, dim: Color }

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Light => Palette { fg: Color::Black, bg: Color::White, accent: Color::Blue, dim: Color::DarkGray },
        Theme::Dark => Palette { fg: Color::Gray, bg: Color::Black, accent: Color::Cyan, dim: Color::DarkGray },
    }
}

fn swatch(color: TaskColor) -> Color {
    let (r, g, b) = color.rgb();
    Color::Rgb(r, g, b)
}

struct App<S: KeyValueStorage> {
    ctx: AppContext<S>,
    database_url: String,
    selected: usize,
    last_tick: Instant,
    mode: Mode,
    list_state: ListState,
    filter: Filter,
    query: String,
    field: ActiveField,
    draft_title: String,
    draft_desc: String,
    draft_color: TaskColor,
    target: Option<TaskId>,
    message: Option<String>,
}

impl<S: KeyValueStorage> App<S> {
    fn new(ctx: AppContext<S>, database_url: String) -> Self {
        let mut app = Self {
            ctx,
            database_url,
            selected: 0,
            last_tick: Instant::now(),
            mode: Mode::View,
            list_state: ListState::default(),
            filter: Filter::All,
            query: String::new(),
            field: ActiveField::Title,
            draft_title: String::new(),
            draft_desc: String::new(),
            draft_color: TaskColor::default(),
            target: None,
            message: None,
        };
        app.clamp_selection();
        app
    }

    fn displayed(&self) -> Vec<&Task> {
        displayed_tasks(self.ctx.tasks.all_tasks(), self.filter, &self.query)
    }

    fn selected_task(&self) -> Option<&Task> {
        self.displayed().get(self.selected).copied()
    }

    fn selected_id(&self) -> Option<TaskId> {
        self.selected_task().map(|t| t.id.clone())
    }

    fn clamp_selection(&mut self) {
        let len = self.displayed().len();
        if len == 0 { self.selected = 0; self.list_state.select(None); }
        else { if self.selected >= len { self.selected = len - 1; } self.list_state.select(Some(self.selected)); }
    }

    fn reset_drafts(&mut self) {
        self.field = ActiveField::Title;
        self.draft_title.clear();
        self.draft_desc.clear();
        self.draft_color = TaskColor::default();
        self.target = None;
    }

    fn active_draft(&mut self) -> &mut String {
        match self.field { ActiveField::Title => &mut self.draft_title, ActiveField::Description => &mut self.draft_desc }
    }

    /// Moves the selected task one slot within the displayed list.
    fn shift_selected(&mut self, up: bool) {
        let destination = if up { self.selected.checked_sub(1) } else { Some(self.selected + 1) };
        if reorder_in_view(&mut self.ctx.tasks, self.filter, &self.query, self.selected, destination) {
            if let Some(d) = destination { self.selected = d; }
        }
        self.clamp_selection();
    }

    fn save_draft(&mut self) {
        let result = match self.target.clone() {
            None => self.ctx.tasks
                .add_task(&self.draft_title, Some(self.draft_desc.as_str()), Some(self.draft_color))
                .map(|_| ()),
            Some(id) => {
                let patch = TaskPatch {
                    text: Some(self.draft_title.clone()),
                    description: Some(self.draft_desc.clone()),
                    color: Some(self.draft_color),
                    completed: None,
                };
                self.ctx.tasks.update_task(&id, patch).map(|_| ())
            }
        };
        match result {
            Ok(()) => {
                self.mode = Mode::View;
                self.message = None;
                self.reset_drafts();
                self.clamp_selection();
            }
            // Stay in the form so the title can be fixed
            Err(e) => self.message = Some(e.to_string()),
        }
    }

    fn handle_view_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') => return false,
            KeyCode::Up => { if self.selected > 0 { self.selected -= 1; } }
            KeyCode::Down => { if self.selected + 1 < self.displayed().len() { self.selected += 1; } }
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(id) = self.selected_id() { self.ctx.tasks.toggle_task(&id); }
            }
            KeyCode::Char('n') => {
                self.reset_drafts();
                self.message = None;
                self.mode = Mode::Create;
            }
            KeyCode::Char('e') => {
                if let Some(task) = self.selected_task() {
                    let (id, title, desc, color) = (task.id.clone(), task.text.clone(), task.description.clone(), task.color);
                    self.reset_drafts();
                    self.target = Some(id);
                    self.draft_title = title;
                    self.draft_desc = desc;
                    self.draft_color = color;
                    self.message = None;
                    self.mode = Mode::Edit;
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_id() {
                    self.target = Some(id);
                    self.mode = Mode::ConfirmDelete;
                }
            }
            KeyCode::Char('f') => self.filter = self.filter.next(),
            KeyCode::Char('/') => self.mode = Mode::Search,
            KeyCode::Esc => self.query.clear(),
            KeyCode::Char('K') => self.shift_selected(true),
            KeyCode::Char('J') => self.shift_selected(false),
            KeyCode::Char('t') => { self.ctx.theme.toggle_theme(); }
            _ => {}
        }
        self.clamp_selection();
        true
    }

    fn handle_form_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => { self.mode = Mode::View; self.message = None; self.reset_drafts(); }
            KeyCode::Enter => self.save_draft(),
            KeyCode::Backspace => { self.active_draft().pop(); }
            KeyCode::Char(c) => self.active_draft().push(c),
            KeyCode::Tab => { self.field = match self.field { ActiveField::Title => ActiveField::Description, ActiveField::Description => ActiveField::Title }; }
            KeyCode::F(2) => self.draft_color = self.draft_color.next(),
            _ => {}
        }
    }

    fn handle_search_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => { self.query.clear(); self.mode = Mode::View; }
            KeyCode::Enter => self.mode = Mode::View,
            KeyCode::Backspace => { self.query.pop(); }
            KeyCode::Char(c) => self.query.push(c),
            _ => {}
        }
        self.clamp_selection();
    }

    fn handle_confirm_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('y') => {
                if let Some(id) = self.target.take() { self.ctx.tasks.delete_task(&id); }
                self.mode = Mode::View;
            }
            KeyCode::Char('n') | KeyCode::Esc => { self.target = None; self.mode = Mode::View; }
            _ => {}
        }
        self.clamp_selection();
    }
}

fn detail_text(task: &Task) -> String {
    let fmt = |at: chrono::DateTime<chrono::Utc>| at.with_timezone(&chrono::Local).format("%A, %B %e, %Y %H:%M").to_string();
    let desc = if task.description.is_empty() { "(no description)" } else { task.description.as_str() };
    let mut out = format!(
        "{}\n\nDescription:\n{}\n\nStatus: {}\nCreated: {}",
        task.text,
        desc,
        if task.completed { "Completed" } else { "Pending" },
        fmt(task.created_at),
    );
    if let (true, Some(at)) = (task.was_edited(), task.updated_at) {
        out.push_str(&format!("\nLast updated: {}", fmt(at)));
    }
    out.push_str(&format!("\nColor: {}", task.color.name()));
    out
}

fn run_app<S: KeyValueStorage>(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, mut app: App<S>) -> Result<()> {
    let tick_rate = Duration::from_millis(200);

    loop {
        terminal.draw(|f| {
            let colors = palette(app.ctx.theme.theme());
            let base = Style::default().fg(colors.fg).bg(colors.bg);
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(1),
                    Constraint::Length(3),
                ])
                .split(f.size());

            let stats = app.ctx.tasks.task_stats();
            let header = Paragraph::new(format!(
                "Total {}  |  Pending {}  |  Completed {}  |  Filter [{}]  |  Theme {}",
                stats.total, stats.pending, stats.completed, app.filter.label(), app.ctx.theme.theme(),
            ))
            .style(base)
            .block(Block::default().borders(Borders::ALL).title("Task Manager").border_style(Style::default().fg(colors.accent)));
            f.render_widget(header, chunks[0]);

            let middle = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(chunks[1]);

            let displayed = app.displayed();
            let list_items: Vec<ListItem> = displayed.iter().map(|t| {
                let mark = if t.completed { "[x] " } else { "[ ] " };
                let title_style = if t.completed { Style::default().fg(colors.dim).add_modifier(Modifier::CROSSED_OUT) } else { Style::default() };
                ListItem::new(Line::from(vec![
                    Span::styled("■ ", Style::default().fg(swatch(t.color))),
                    Span::raw(mark),
                    Span::styled(t.text.clone(), title_style),
                ]))
            }).collect();
            let empty = displayed.is_empty();
            let detail = app.selected_task().map(detail_text).unwrap_or_default();
            drop(displayed);

            let list_title = if app.query.is_empty() { format!("tasks [{}]", app.filter.label()) } else { format!("tasks [{}] matching \"{}\"", app.filter.label(), app.query) };
            if empty {
                let hint = match app.filter { Filter::All => "No tasks yet. Press n to add one!".to_string(), other => format!("No {} tasks yet.", other.as_str()) };
                f.render_widget(Paragraph::new(hint).style(base).block(Block::default().borders(Borders::ALL).title(list_title)), middle[0]);
            } else {
                let list = List::new(list_items)
                    .style(base)
                    .block(Block::default().borders(Borders::ALL).title(list_title))
                    .highlight_style(Style::default().fg(colors.accent).add_modifier(Modifier::BOLD | Modifier::REVERSED))
                    .highlight_symbol(">> ");
                f.render_stateful_widget(list, middle[0], &mut app.list_state);
            }

            let details = Paragraph::new(detail)
                .style(base)
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title("details"));
            f.render_widget(details, middle[1]);

            let field_name = match app.field { ActiveField::Title => "Title", ActiveField::Description => "Desc" };
            let field_value = match app.field { ActiveField::Title => &app.draft_title, ActiveField::Description => &app.draft_desc };
            let footer_text = match app.mode {
                Mode::View => format!("{}  |  Enter toggle, n new, e edit, d delete, f filter, / search, K/J move, t theme, q quit", app.database_url),
                Mode::Create | Mode::Edit => format!("{}: {}_  |  Color {} (F2)  |  Tab switch, Enter save, Esc cancel", field_name, field_value, app.draft_color.name()),
                Mode::Search => format!("Search: {}_  |  Enter keep, Esc clear", app.query),
                Mode::ConfirmDelete => "Delete this task? This cannot be undone. (y/n)".to_string(),
            };
            let footer_text = match &app.message { Some(m) => format!("{m}  |  {footer_text}"), None => footer_text };
            let footer = Paragraph::new(footer_text)
                .style(base)
                .block(Block::default().borders(Borders::ALL).title(match app.mode { Mode::View => "info", Mode::Create => "create", Mode::Edit => "edit", Mode::Search => "search", Mode::ConfirmDelete => "confirm" }));
            f.render_widget(footer, chunks[2]);
        })?;

        let timeout = tick_rate.saturating_sub(app.last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                // Only act on key presses; ignore repeats and releases to prevent duplicate input
                if key.kind != KeyEventKind::Press { continue; }
                match app.mode {
                    Mode::View => { if !app.handle_view_key(key.code) { break; } }
                    Mode::Create | Mode::Edit => app.handle_form_key(key.code),
                    Mode::Search => app.handle_search_key(key.code),
                    Mode::ConfirmDelete => app.handle_confirm_key(key.code),
                }
            }
        }
        if app.last_tick.elapsed() >= tick_rate {
            app.last_tick = Instant::now();
        }
    }
    Ok(())
}
