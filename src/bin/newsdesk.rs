use std::{
    fs, io,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};

use newsdesk::client::NewsClient;
use newsdesk::config::{Config, ImageSource};
use newsdesk::document::Document;
use newsdesk::editor::DocumentEditor;
use newsdesk::html::{parse_html, serialize_document};
use newsdesk::news::NewsDraft;
use newsdesk::render::{RenderResult, render_document, render_view};
use newsdesk::telemetry;
use newsdesk::theme::Theme;
use newsdesk::toolbar::{CONTROLS, DispatchOutcome, Toolbar, ToolbarCommand};
use newsdesk::upload::ImageLoader;

const STATUS_TIMEOUT: Duration = Duration::from_secs(4);
const MOUSE_SCROLL_LINES: usize = 3;

#[derive(Parser)]
#[command(version, about = "Write and publish news articles from the terminal", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, env = "NEWSDESK_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Base url of the news backend
    #[arg(long, env = "NEWSDESK_API_URL", global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit a draft, creating it if needed
    Edit {
        draft: PathBuf,

        /// Set the article title
        #[arg(long)]
        title: Option<String>,
    },
    /// Show stored HTML, a draft, or a published article
    View {
        file: Option<PathBuf>,

        /// Fetch the article with this id from the backend
        #[arg(long, conflicts_with = "file")]
        remote: Option<String>,
    },
    /// Print the HTML of a draft
    Export { draft: PathBuf },
    /// Send a draft to the backend
    Submit { draft: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::load(path),
        None => Config::load_default(),
    }
    .context("failed to load configuration")?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }

    match cli.command {
        Commands::Edit { draft, title } => {
            let _guard = file_tracing(&config)?;
            edit(draft, title, config)
        }
        Commands::View { file, remote } => {
            let _guard = file_tracing(&config)?;
            view(file, remote, &config)
        }
        Commands::Export { draft } => {
            telemetry::setup_stderr_tracing();
            let draft = NewsDraft::load(&draft)
                .with_context(|| format!("failed to read {}", draft.display()))?;
            println!("{}", serialize_document(&draft.document));
            Ok(())
        }
        Commands::Submit { draft: path } => {
            telemetry::setup_stderr_tracing();
            let draft = NewsDraft::load(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let request = draft.submission().context("draft is not ready")?;
            let response = NewsClient::new(config.api_base_url.as_str())
                .create_news(&request)
                .context("submission failed")?;
            if response.message.is_empty() {
                println!("Submitted \"{}\"", request.title);
            } else {
                println!("{}", response.message);
            }
            Ok(())
        }
    }
}

fn file_tracing(config: &Config) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = config.log_dir();
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;
    Ok(telemetry::setup_file_tracing(&log_dir))
}

fn edit(path: PathBuf, title: Option<String>, config: Config) -> Result<()> {
    let initial_status = (!path.exists()).then(|| "New draft".to_string());
    let mut draft = NewsDraft::load_or_new(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if let Some(title) = title {
        draft.title = title;
    }
    tracing::info!(path = %path.display(), "editing draft");
    let mut app = App::new(draft, path, config, initial_status);
    with_terminal(|terminal| run_app(terminal, &mut app))
}

fn view(file: Option<PathBuf>, remote: Option<String>, config: &Config) -> Result<()> {
    let (title, html) = match (file, remote) {
        (_, Some(id)) => {
            let article = NewsClient::new(config.api_base_url.as_str())
                .fetch_news(&id)
                .with_context(|| format!("failed to fetch article {id}"))?;
            (article.title, article.content_html)
        }
        (Some(path), None) => load_view_source(&path)?,
        (None, None) => bail!("either a file or --remote <id> is required"),
    };
    let mut viewer = Viewer::new(title, &html);
    with_terminal(|terminal| run_app(terminal, &mut viewer))
}

/// Drafts are read through their document, anything else is taken as HTML.
fn load_view_source(path: &Path) -> Result<(String, String)> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        let draft = NewsDraft::load(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        return Ok((draft.title, serialize_document(&draft.document)));
    }
    let html =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok((path.display().to_string(), html))
}

fn with_terminal<F>(body: F) -> Result<()>
where
    F: FnOnce(&mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()>,
{
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("failed to initialize terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().ok();

    let res = body(&mut terminal).context("application error");

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    res
}

trait Screen {
    fn draw(&mut self, frame: &mut Frame);
    fn handle_event(&mut self, event: Event) -> Result<()>;
    /// Returns true when the screen needs a redraw.
    fn on_tick(&mut self) -> bool;
    fn should_quit(&self) -> bool;
}

fn run_app<B: ratatui::backend::Backend, S: Screen>(
    terminal: &mut Terminal<B>,
    screen: &mut S,
) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();
    let mut needs_redraw = true;

    while !screen.should_quit() {
        if needs_redraw {
            terminal
                .draw(|frame| screen.draw(frame))
                .context("failed to draw frame")?;
            needs_redraw = false;
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout).context("event poll failed")? {
            let evt = event::read().context("failed to read event")?;
            if !matches!(evt, Event::Resize(_, _)) {
                screen.handle_event(evt)?;
            }
            needs_redraw = true;
        }

        if last_tick.elapsed() >= tick_rate {
            if screen.on_tick() {
                needs_redraw = true;
            }
            last_tick = Instant::now();
        }
    }

    Ok(())
}

fn editor_wrap_configuration(width: usize) -> (usize, usize) {
    if width == 0 {
        return (1, 0);
    }
    if width < 60 {
        let wrap_width = width.saturating_sub(1).max(1);
        return (wrap_width, 0);
    }
    if width < 100 {
        let padding = 2.min(width / 2);
        let wrap_width = width.saturating_sub(padding.saturating_mul(2)).max(1);
        return (wrap_width, padding);
    }
    let mut left_padding = width.saturating_sub(100) / 2 + 4;
    let max_padding = width.saturating_sub(1) / 2;
    if left_padding > max_padding {
        left_padding = max_padding;
    }
    let wrap_width = width.saturating_sub(left_padding.saturating_mul(2)).max(1);
    (wrap_width, left_padding)
}

#[derive(Clone, Copy)]
enum MenuAction {
    Toolbar(ToolbarCommand),
    EditTitle,
    Save,
    TogglePreview,
    Submit,
}

#[derive(Clone, Copy)]
struct MenuShortcut {
    key: char,
    requires_shift: bool,
}

impl MenuShortcut {
    const fn new(key: char) -> Self {
        Self {
            key,
            requires_shift: false,
        }
    }

    const fn with_shift(key: char) -> Self {
        Self {
            key,
            requires_shift: true,
        }
    }

    fn matches(&self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        match code {
            KeyCode::Char(ch) if ch == self.key => {
                if self.requires_shift {
                    modifiers == KeyModifiers::SHIFT
                } else {
                    modifiers.is_empty()
                }
            }
            _ => false,
        }
    }
}

#[derive(Clone, Copy)]
struct MenuItem {
    label: &'static str,
    action: Option<MenuAction>,
    shortcut: Option<MenuShortcut>,
    pressed: bool,
}

impl MenuItem {
    fn enabled_with_shortcut(
        label: &'static str,
        action: MenuAction,
        shortcut: MenuShortcut,
    ) -> Self {
        Self {
            label,
            action: Some(action),
            shortcut: Some(shortcut),
            pressed: false,
        }
    }

    fn disabled_with_shortcut(label: &'static str, shortcut: MenuShortcut) -> Self {
        Self {
            label,
            action: None,
            shortcut: Some(shortcut),
            pressed: false,
        }
    }

    fn pressed(mut self, pressed: bool) -> Self {
        self.pressed = pressed;
        self
    }

    fn is_enabled(&self) -> bool {
        self.action.is_some()
    }
}

enum MenuEntry {
    Section(&'static str),
    Separator,
    Item(MenuItem),
}

struct ContextMenuState {
    entries: Vec<MenuEntry>,
    selected_index: usize,
}

impl ContextMenuState {
    fn new(entries: Vec<MenuEntry>) -> Self {
        let selected_index = entries
            .iter()
            .enumerate()
            .find(|(_, entry)| matches!(entry, MenuEntry::Item(item) if item.is_enabled()))
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        Self {
            entries,
            selected_index,
        }
    }

    fn move_selection(&mut self, delta: i32) {
        if self.entries.is_empty() {
            return;
        }

        let len = self.entries.len() as i32;
        let mut idx = self.selected_index as i32;

        for _ in 0..len {
            idx = (idx + delta).rem_euclid(len);
            if matches!(self.entries[idx as usize], MenuEntry::Item(_)) {
                self.selected_index = idx as usize;
                break;
            }
        }
    }

    fn current_action(&self) -> Option<MenuAction> {
        match self.entries.get(self.selected_index) {
            Some(MenuEntry::Item(item)) => item.action,
            _ => None,
        }
    }

    fn shortcut_action(
        &mut self,
        code: KeyCode,
        modifiers: KeyModifiers,
    ) -> (bool, Option<MenuAction>) {
        for (idx, entry) in self.entries.iter().enumerate() {
            if let MenuEntry::Item(item) = entry
                && let Some(shortcut) = item.shortcut
                && shortcut.matches(code, modifiers)
            {
                self.selected_index = idx;
                return (true, item.action);
            }
        }
        (false, None)
    }
}

/// The command palette: every toolbar control plus the draft actions. Toolbar
/// entries use the same key as their Alt shortcut.
fn build_menu_entries(editor: &DocumentEditor) -> Vec<MenuEntry> {
    let mut entries = Vec::new();
    let has_caret = editor.selection().is_some();
    let mut section = None;
    for control in CONTROLS {
        let title = match control.command {
            ToolbarCommand::ToggleMark(_) => "Text style",
            ToolbarCommand::ToggleBlock(_) => "Block",
            ToolbarCommand::ToggleAlign(_) => "Alignment",
            ToolbarCommand::InsertImage => "Insert",
        };
        if section != Some(title) {
            if section.is_some() {
                entries.push(MenuEntry::Separator);
            }
            entries.push(MenuEntry::Section(title));
            section = Some(title);
        }
        let shortcut = if control.shortcut.requires_shift {
            MenuShortcut::with_shift(control.shortcut.key.to_ascii_uppercase())
        } else {
            MenuShortcut::new(control.shortcut.key)
        };
        let item = if has_caret {
            MenuItem::enabled_with_shortcut(control.label, MenuAction::Toolbar(control.command), shortcut)
                .pressed(Toolbar::is_pressed(editor, control.command))
        } else {
            MenuItem::disabled_with_shortcut(control.label, shortcut)
        };
        entries.push(MenuEntry::Item(item));
    }
    entries.push(MenuEntry::Separator);
    entries.push(MenuEntry::Section("Draft"));
    entries.push(MenuEntry::Item(MenuItem::enabled_with_shortcut(
        "Edit title...",
        MenuAction::EditTitle,
        MenuShortcut::new('t'),
    )));
    entries.push(MenuEntry::Item(MenuItem::enabled_with_shortcut(
        "Save",
        MenuAction::Save,
        MenuShortcut::new('s'),
    )));
    entries.push(MenuEntry::Item(MenuItem::enabled_with_shortcut(
        "HTML preview",
        MenuAction::TogglePreview,
        MenuShortcut::new('v'),
    )));
    entries.push(MenuEntry::Item(MenuItem::enabled_with_shortcut(
        "Submit",
        MenuAction::Submit,
        MenuShortcut::new('n'),
    )));
    entries
}

fn is_context_menu_shortcut(code: KeyCode, modifiers: KeyModifiers) -> bool {
    match code {
        KeyCode::Esc => modifiers.is_empty(),
        KeyCode::Char(' ') => modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum PromptKind {
    ImagePath,
    Title,
}

impl PromptKind {
    fn title(self) -> &'static str {
        match self {
            PromptKind::ImagePath => "Image file",
            PromptKind::Title => "Title",
        }
    }
}

struct Prompt {
    kind: PromptKind,
    input: String,
}

struct StatusMessage {
    text: String,
    shown_at: Instant,
    is_error: bool,
}

struct App {
    editor: DocumentEditor,
    title: String,
    uploaded_images: Vec<String>,
    draft_path: PathBuf,
    config: Config,
    theme: Theme,
    scroll_top: usize,
    follow_cursor: bool,
    should_quit: bool,
    dirty: bool,
    preview: bool,
    status_message: Option<StatusMessage>,
    context_menu: Option<ContextMenuState>,
    prompt: Option<Prompt>,
    image_loader: Option<ImageLoader>,
    preferred_column: Option<u16>,
    last_render: Option<RenderResult>,
    last_text_area: Rect,
    toolbar_hitboxes: Vec<(Rect, ToolbarCommand)>,
    mouse_dragging: bool,
}

impl App {
    fn new(
        draft: NewsDraft,
        draft_path: PathBuf,
        config: Config,
        initial_status: Option<String>,
    ) -> Self {
        let mut editor = DocumentEditor::new(draft.document);
        editor.focus();
        Self {
            editor,
            title: draft.title,
            uploaded_images: draft.uploaded_images,
            draft_path,
            config,
            theme: Theme::default(),
            scroll_top: 0,
            follow_cursor: true,
            should_quit: false,
            dirty: false,
            preview: false,
            status_message: initial_status.map(|text| StatusMessage {
                text,
                shown_at: Instant::now(),
                is_error: false,
            }),
            context_menu: None,
            prompt: None,
            image_loader: None,
            preferred_column: None,
            last_render: None,
            last_text_area: Rect::default(),
            toolbar_hitboxes: Vec::new(),
            mouse_dragging: false,
        }
    }

    fn set_status(&mut self, text: impl Into<String>) {
        self.status_message = Some(StatusMessage {
            text: text.into(),
            shown_at: Instant::now(),
            is_error: false,
        });
    }

    fn set_error(&mut self, text: impl Into<String>) {
        self.status_message = Some(StatusMessage {
            text: text.into(),
            shown_at: Instant::now(),
            is_error: true,
        });
    }

    fn draft(&self) -> NewsDraft {
        NewsDraft {
            title: self.title.clone(),
            document: self.editor.document().clone(),
            uploaded_images: self.uploaded_images.clone(),
        }
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
        self.preferred_column = None;
    }

    fn draw_frame(&mut self, frame: &mut Frame) {
        let area = frame.area();
        if area.height < 3 || area.width == 0 {
            return;
        }

        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(area);
        let toolbar_area = vertical[0];
        let main_area = vertical[1];
        let status_area = vertical[2];

        self.draw_toolbar(frame, toolbar_area);

        let editor_area = if self.preview {
            let horizontal = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(main_area);
            self.draw_preview(frame, horizontal[1]);
            horizontal[0]
        } else {
            main_area
        };

        let horizontal = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(editor_area);
        let (wrap_width, left_padding) = editor_wrap_configuration(horizontal[0].width as usize);
        let text_area = Rect::new(
            horizontal[0].x + left_padding as u16,
            horizontal[0].y,
            (wrap_width as u16).min(horizontal[0].width),
            horizontal[0].height,
        );
        let scrollbar_area = horizontal[1];

        let render = render_document(&self.editor, wrap_width, &self.theme);
        let viewport_height = text_area.height as usize;
        self.adjust_scroll(&render, viewport_height);

        let paragraph = Paragraph::new(Text::from(render.lines.clone()))
            .style(Style::default().bg(self.theme.background))
            .scroll((self.scroll_top as u16, 0));
        frame.render_widget(paragraph, text_area);
        self.draw_scrollbar(frame, scrollbar_area, render.total_lines, viewport_height);

        if self.context_menu.is_none()
            && self.prompt.is_none()
            && let Some(cursor) = render.cursor
            && cursor.line >= self.scroll_top
            && cursor.line < self.scroll_top + viewport_height
            && text_area.width > 0
        {
            let cursor_y = text_area.y + (cursor.line - self.scroll_top) as u16;
            let cursor_x = text_area.x + cursor.column.min(text_area.width - 1);
            frame.set_cursor_position(Position::new(cursor_x, cursor_y));
        }

        self.last_text_area = text_area;
        self.last_render = Some(render);

        let status_line = self.status_line(status_area.width as usize);
        frame.render_widget(
            Paragraph::new(status_line).style(self.theme.status_bar_style()),
            status_area,
        );

        if self.context_menu.is_some() {
            self.render_context_menu(frame, area);
        }
        if self.prompt.is_some() {
            self.render_prompt(frame, area);
        }
    }

    fn draw_toolbar(&mut self, frame: &mut Frame, area: Rect) {
        self.toolbar_hitboxes.clear();
        let mut spans = Vec::new();
        let mut x = area.x;
        let mut previous = None;
        for control in CONTROLS {
            let group = std::mem::discriminant(&control.command);
            if previous.is_some_and(|prev| prev != group) {
                spans.push(Span::styled(" \u{2502}", self.theme.toolbar_style()));
                x += 2;
            }
            previous = Some(group);
            let label = format!(" {} ", control.icon);
            let width = label.chars().count() as u16;
            let style = if Toolbar::is_pressed(&self.editor, control.command) {
                self.theme.toolbar_pressed_style()
            } else {
                self.theme.toolbar_style()
            };
            if x + width <= area.x + area.width {
                self.toolbar_hitboxes
                    .push((Rect::new(x, area.y, width, 1), control.command));
            }
            spans.push(Span::styled(label, style));
            x += width;
        }
        frame.render_widget(
            Paragraph::new(Line::from(spans)).style(self.theme.toolbar_style()),
            area,
        );
    }

    fn draw_preview(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Preview ")
            .borders(Borders::LEFT)
            .border_style(self.theme.preview_border_style());
        let inner = block.inner(area);
        let html = serialize_document(self.editor.document());
        let lines = render_view(&parse_html(&html), inner.width.max(1) as usize, &self.theme);
        frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
    }

    fn draw_scrollbar(&self, frame: &mut Frame, area: Rect, total_lines: usize, viewport: usize) {
        if area.height == 0 || viewport == 0 || total_lines <= viewport {
            return;
        }
        let knob_size = ((viewport * viewport) / total_lines).clamp(1, viewport);
        let max_scroll = total_lines - viewport;
        let knob_start = (self.scroll_top * (viewport - knob_size)) / max_scroll.max(1);
        let knob_end = knob_start + knob_size;

        for row in 0..viewport.min(area.height as usize) {
            let style = if row >= knob_start && row < knob_end {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            let cell = Rect::new(area.x, area.y + row as u16, 1, 1);
            frame.render_widget(Paragraph::new(Line::from(Span::styled(" ", style))), cell);
        }
    }

    fn render_context_menu(&self, frame: &mut Frame, area: Rect) {
        let Some(menu) = &self.context_menu else {
            return;
        };
        if area.width < 3 || area.height < 3 {
            return;
        }

        let mut max_label_width = 0usize;
        let mut max_section_width = 0usize;
        for entry in &menu.entries {
            match entry {
                MenuEntry::Item(item) => {
                    max_label_width = max_label_width.max(item.label.chars().count() + 2);
                }
                MenuEntry::Section(title) => {
                    max_section_width = max_section_width.max(title.chars().count());
                }
                MenuEntry::Separator => {}
            }
        }

        let shortcut_width = 1;
        let content_width = (max_label_width + 2 + shortcut_width).max(max_section_width) as u16;
        let width = (content_width + 4).min(area.width).max(10.min(area.width));
        let height = (menu.entries.len() as u16 + 2)
            .min(area.height)
            .max(3.min(area.height));
        let popup_area = Rect::new(
            area.x + (area.width.saturating_sub(width)) / 2,
            area.y + (area.height.saturating_sub(height)) / 2,
            width,
            height,
        );
        frame.render_widget(Clear, popup_area);

        let separator_width = popup_area.width.saturating_sub(4).max(4) as usize;
        let popup_style = self.theme.menu_style();
        let mut items = Vec::new();
        for entry in &menu.entries {
            match entry {
                MenuEntry::Section(title) => {
                    items.push(ListItem::new(Line::from(Span::styled(
                        *title,
                        popup_style.add_modifier(Modifier::BOLD),
                    ))));
                }
                MenuEntry::Separator => {
                    items.push(ListItem::new(Line::from(Span::styled(
                        "\u{2500}".repeat(separator_width),
                        self.theme.menu_disabled_style(),
                    ))));
                }
                MenuEntry::Item(item) => {
                    let check = if item.pressed { "\u{2713} " } else { "  " };
                    let key = item.shortcut.map(|shortcut| shortcut.key).unwrap_or(' ');
                    let content = format!(
                        "{check}{label:<label_width$}  {key}",
                        label = item.label,
                        label_width = max_label_width - 2,
                    );
                    let style = if item.is_enabled() {
                        Style::default()
                    } else {
                        self.theme.menu_disabled_style()
                    };
                    items.push(ListItem::new(Line::from(Span::styled(content, style))));
                }
            }
        }

        let mut state = ListState::default();
        state.select(Some(menu.selected_index));
        let list = List::new(items)
            .highlight_style(self.theme.menu_selected_style())
            .style(popup_style)
            .block(
                Block::default()
                    .title("Commands")
                    .borders(Borders::ALL)
                    .style(popup_style),
            );
        frame.render_stateful_widget(list, popup_area, &mut state);
    }

    fn render_prompt(&self, frame: &mut Frame, area: Rect) {
        let Some(prompt) = &self.prompt else {
            return;
        };
        let width = area.width.saturating_sub(4).min(72).max(10.min(area.width));
        let popup_area = Rect::new(
            area.x + (area.width.saturating_sub(width)) / 2,
            area.y + area.height.saturating_sub(3) / 2,
            width,
            3.min(area.height),
        );
        frame.render_widget(Clear, popup_area);
        let block = Block::default()
            .title(format!(" {} ", prompt.kind.title()))
            .borders(Borders::ALL)
            .style(self.theme.menu_style());
        let inner = block.inner(popup_area);
        let visible: String = {
            let count = prompt.input.chars().count();
            let skip = count.saturating_sub(inner.width.saturating_sub(1) as usize);
            prompt.input.chars().skip(skip).collect()
        };
        let cursor_x = inner.x + visible.chars().count() as u16;
        frame.render_widget(Paragraph::new(visible).block(block), popup_area);
        frame.set_cursor_position(Position::new(cursor_x, inner.y));
    }

    fn status_line(&mut self, terminal_width: usize) -> Line<'static> {
        self.prune_status_message();

        let position = self.cursor_position_text();
        if let Some(message) = &self.status_message {
            let style = if message.is_error {
                self.theme.notice_error_style()
            } else {
                self.theme.status_bar_style()
            };
            return Line::from(vec![
                Span::raw(format!("{position} ")),
                Span::styled(message.text.clone(), style),
            ]);
        }

        let title = if self.title.trim().is_empty() {
            "(untitled)".to_string()
        } else {
            self.title.clone()
        };
        let marker = if self.dirty { "*" } else { "" };
        let breadcrumbs = self
            .editor
            .cursor_breadcrumbs()
            .filter(|labels| !labels.is_empty())
            .map(|labels| labels.join(" > "))
            .unwrap_or_default();
        let word_count = count_words(self.editor.document());
        let loading = self
            .image_loader
            .as_ref()
            .and_then(|loader| loader.path().file_name())
            .map(|name| format!(" [loading {}]", name.to_string_lossy()))
            .unwrap_or_default();

        let all_shortcuts = ["^T:Title", "F5:Preview", "F10:Submit", "Esc:Menu", "^S:Save", "^Q:Quit"];

        let mut spans = vec![
            Span::raw(position),
            Span::raw(" "),
            Span::styled(
                format!("{title}{marker}"),
                self.theme.title_style().bg(self.theme.status_bar_bg),
            ),
        ];
        if !breadcrumbs.is_empty() {
            spans.push(Span::raw(" "));
            spans.push(Span::raw(breadcrumbs));
        }
        spans.push(Span::raw(format!(", {word_count} words{loading}")));

        let left_width: usize = spans.iter().map(|span| span.content.chars().count()).sum();
        let min_padding = 1;
        let mut shortcuts_to_show = Vec::new();
        let mut shortcuts_width = 0;
        for shortcut in all_shortcuts.iter().rev() {
            let test_width = if shortcuts_to_show.is_empty() {
                shortcut.chars().count()
            } else {
                shortcuts_width + 1 + shortcut.chars().count()
            };
            if left_width + min_padding + test_width <= terminal_width {
                shortcuts_to_show.insert(0, *shortcut);
                shortcuts_width = test_width;
            } else {
                break;
            }
        }

        if !shortcuts_to_show.is_empty() {
            let padding = terminal_width
                .saturating_sub(left_width)
                .saturating_sub(shortcuts_width)
                .max(min_padding);
            spans.push(Span::raw(" ".repeat(padding)));
            spans.push(Span::raw(shortcuts_to_show.join(" ")));
        }

        Line::from(spans)
    }

    fn prune_status_message(&mut self) {
        if let Some(message) = &self.status_message
            && message.shown_at.elapsed() > STATUS_TIMEOUT
        {
            self.status_message = None;
        }
    }

    fn adjust_scroll(&mut self, render: &RenderResult, viewport_height: usize) {
        let viewport = viewport_height.max(1);
        let max_scroll = render.total_lines.saturating_sub(viewport);
        if self.follow_cursor
            && let Some(cursor) = render.cursor
        {
            if cursor.line < self.scroll_top {
                self.scroll_top = cursor.line;
            } else if cursor.line >= self.scroll_top + viewport {
                self.scroll_top = cursor.line + 1 - viewport;
            }
        }
        self.scroll_top = self.scroll_top.min(max_scroll);
    }

    fn cursor_position_text(&self) -> String {
        match self.editor.focus_position() {
            Some(position) => format!("{}:{}", position.segment + 1, position.offset + 1),
            None => "?:?".to_string(),
        }
    }

    /// Moves by visual lines using the last layout, so wrapped lines are
    /// stepped through one at a time.
    fn move_vertical(&mut self, delta: isize, extend: bool) -> bool {
        let Some(render) = &self.last_render else {
            return if delta < 0 {
                self.editor.move_up(extend)
            } else {
                self.editor.move_down(extend)
            };
        };
        let Some(cursor) = render.cursor else {
            return false;
        };
        let column = *self.preferred_column.get_or_insert(cursor.column);
        let target = cursor.line.saturating_add_signed(delta);
        let target = target.min(render.total_lines.saturating_sub(1));
        if target == cursor.line {
            return if delta < 0 {
                self.editor.move_to_document_start(extend)
            } else {
                self.editor.move_to_document_end(extend)
            };
        }
        let Some(position) = render.position_near(target, column) else {
            return false;
        };
        self.editor.move_to_position(position, extend)
    }

    fn run_toolbar(&mut self, command: ToolbarCommand) {
        match Toolbar::dispatch(&mut self.editor, command) {
            DispatchOutcome::Applied => self.mark_dirty(),
            DispatchOutcome::Unchanged => {}
            DispatchOutcome::ImageRequested => {
                if self.image_loader.is_some() {
                    self.set_status("An image is still loading");
                } else {
                    self.prompt = Some(Prompt {
                        kind: PromptKind::ImagePath,
                        input: String::new(),
                    });
                }
            }
        }
    }

    fn open_context_menu(&mut self) {
        self.context_menu = Some(ContextMenuState::new(build_menu_entries(&self.editor)));
    }

    fn close_context_menu(&mut self) {
        self.context_menu = None;
    }

    fn handle_context_menu_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
        if self.context_menu.is_none() {
            return Ok(false);
        }

        match code {
            KeyCode::Esc => {
                self.close_context_menu();
            }
            KeyCode::Up => {
                if let Some(menu) = self.context_menu.as_mut() {
                    menu.move_selection(-1);
                }
            }
            KeyCode::Down => {
                if let Some(menu) = self.context_menu.as_mut() {
                    menu.move_selection(1);
                }
            }
            KeyCode::Enter => {
                if let Some(action) = self
                    .context_menu
                    .as_ref()
                    .and_then(|menu| menu.current_action())
                {
                    self.close_context_menu();
                    self.execute_menu_action(action)?;
                }
            }
            KeyCode::Char(' ') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.close_context_menu();
            }
            KeyCode::Char(_) => {
                let found = self
                    .context_menu
                    .as_mut()
                    .map(|menu| menu.shortcut_action(code, modifiers));
                if let Some((true, Some(action))) = found {
                    self.close_context_menu();
                    self.execute_menu_action(action)?;
                }
            }
            _ => {}
        }
        Ok(true)
    }

    fn execute_menu_action(&mut self, action: MenuAction) -> Result<()> {
        match action {
            MenuAction::Toolbar(command) => self.run_toolbar(command),
            MenuAction::EditTitle => self.open_title_prompt(),
            MenuAction::Save => self.save()?,
            MenuAction::TogglePreview => self.toggle_preview(),
            MenuAction::Submit => self.submit(),
        }
        Ok(())
    }

    fn open_title_prompt(&mut self) {
        self.prompt = Some(Prompt {
            kind: PromptKind::Title,
            input: self.title.clone(),
        });
    }

    fn toggle_preview(&mut self) {
        self.preview = !self.preview;
        self.preferred_column = None;
        self.set_status(if self.preview {
            "HTML preview on"
        } else {
            "HTML preview off"
        });
    }

    fn handle_prompt_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        let Some(prompt) = self.prompt.as_mut() else {
            return false;
        };
        match code {
            KeyCode::Esc => {
                self.prompt = None;
            }
            KeyCode::Backspace => {
                prompt.input.pop();
            }
            KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => {
                prompt.input.clear();
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                prompt.input.push(ch);
            }
            KeyCode::Enter => {
                if let Some(prompt) = self.prompt.take() {
                    self.confirm_prompt(prompt);
                }
            }
            _ => {}
        }
        true
    }

    fn confirm_prompt(&mut self, prompt: Prompt) {
        match prompt.kind {
            PromptKind::Title => {
                let title = prompt.input.trim().to_string();
                if title != self.title {
                    self.title = title;
                    self.dirty = true;
                }
            }
            PromptKind::ImagePath => {
                let input = prompt.input.trim();
                if input.is_empty() {
                    return;
                }
                let path = expand_home(input);
                tracing::info!(path = %path.display(), "loading image");
                self.image_loader = Some(ImageLoader::spawn(path, self.config.images.clone()));
                self.set_status("Loading image...");
            }
        }
    }

    /// Inserts a finished image read. The editor is only touched here, on the
    /// event loop, once the worker reports back.
    fn poll_image_loader(&mut self) -> bool {
        let Some(result) = self.image_loader.as_ref().and_then(|loader| loader.poll()) else {
            return false;
        };
        self.image_loader = None;
        match result {
            Ok(image) => {
                if Toolbar::insert_prepared_image(&mut self.editor, &image) {
                    if self.config.images.source == ImageSource::Upload
                        && !self.uploaded_images.contains(&image.src)
                    {
                        self.uploaded_images.push(image.src.clone());
                    }
                    self.mark_dirty();
                    self.set_status(format!("Inserted {}", image.name));
                } else {
                    self.set_error("Place the caret in the document to insert an image");
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "image rejected");
                self.set_error(err.to_string());
            }
        }
        true
    }

    fn save(&mut self) -> Result<()> {
        self.draft()
            .save(&self.draft_path)
            .with_context(|| format!("failed to write {}", self.draft_path.display()))?;
        self.dirty = false;
        self.set_status("Saved");
        Ok(())
    }

    /// Backend failures only produce a notice; the draft stays as it is.
    fn submit(&mut self) {
        let request = match self.draft().submission() {
            Ok(request) => request,
            Err(err) => {
                self.set_error(err.to_string());
                return;
            }
        };
        let client = NewsClient::new(self.config.api_base_url.as_str());
        match client.create_news(&request) {
            Ok(response) => {
                let message = if response.message.is_empty() {
                    "Submitted".to_string()
                } else {
                    response.message
                };
                self.set_status(message);
            }
            Err(err) => {
                tracing::warn!(error = %err, "submission failed");
                self.set_error(format!("Submit failed: {err}"));
            }
        }
    }

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Result<()> {
        if self.handle_prompt_key(code, modifiers) {
            return Ok(());
        }
        if self.handle_context_menu_key(code, modifiers)? {
            return Ok(());
        }
        if is_context_menu_shortcut(code, modifiers) {
            self.open_context_menu();
            return Ok(());
        }
        if let Some(control) = Toolbar::find_shortcut(code, modifiers) {
            self.run_toolbar(control.command);
            return Ok(());
        }

        let previous = self.editor.focus_position();
        let shift = modifiers.contains(KeyModifiers::SHIFT);
        let control = modifiers.contains(KeyModifiers::CONTROL);
        let mut vertical = false;

        match code {
            KeyCode::Char('q') | KeyCode::Char('c') if control => {
                self.should_quit = true;
            }
            KeyCode::Char('s') if control => self.save()?,
            KeyCode::Char('t') if control => self.open_title_prompt(),
            KeyCode::Char('a') if control => {
                self.editor.select_all();
            }
            KeyCode::F(5) => self.toggle_preview(),
            KeyCode::F(10) => self.submit(),
            KeyCode::Left if control => {
                self.editor.move_word_left(shift);
            }
            KeyCode::Right if control => {
                self.editor.move_word_right(shift);
            }
            KeyCode::Left => {
                self.editor.move_left(shift);
            }
            KeyCode::Right => {
                self.editor.move_right(shift);
            }
            KeyCode::Up => {
                vertical = true;
                self.move_vertical(-1, shift);
            }
            KeyCode::Down => {
                vertical = true;
                self.move_vertical(1, shift);
            }
            KeyCode::PageUp => {
                vertical = true;
                let page = self.last_text_area.height.max(1) as isize;
                self.move_vertical(-page, shift);
            }
            KeyCode::PageDown => {
                vertical = true;
                let page = self.last_text_area.height.max(1) as isize;
                self.move_vertical(page, shift);
            }
            KeyCode::Home if control => {
                self.editor.move_to_document_start(shift);
            }
            KeyCode::End if control => {
                self.editor.move_to_document_end(shift);
            }
            KeyCode::Home => {
                self.editor.move_to_segment_start(shift);
            }
            KeyCode::End => {
                self.editor.move_to_segment_end(shift);
            }
            KeyCode::Char('j') if control => {
                if self.editor.insert_soft_break() {
                    self.mark_dirty();
                }
            }
            KeyCode::Char('w') if control => {
                if self.editor.delete_word_backward() {
                    self.mark_dirty();
                }
            }
            KeyCode::Backspace if control || modifiers.contains(KeyModifiers::ALT) => {
                if self.editor.delete_word_backward() {
                    self.mark_dirty();
                }
            }
            KeyCode::Backspace => {
                if self.editor.backspace() {
                    self.mark_dirty();
                }
            }
            KeyCode::Delete => {
                if self.editor.delete_forward() {
                    self.mark_dirty();
                }
            }
            KeyCode::Enter if shift || control => {
                if self.editor.insert_soft_break() {
                    self.mark_dirty();
                }
            }
            KeyCode::Enter => {
                if self.editor.insert_block_break() {
                    self.mark_dirty();
                }
            }
            KeyCode::Char(ch) if !control && !modifiers.contains(KeyModifiers::ALT) => {
                if self.editor.insert_char(ch) {
                    self.mark_dirty();
                }
            }
            _ => {}
        }

        if !vertical {
            self.preferred_column = None;
        }
        if self.editor.focus_position() != previous {
            self.follow_cursor = true;
        }
        Ok(())
    }

    fn position_at(&self, column: u16, row: u16) -> Option<newsdesk::editor::CaretPosition> {
        let area = self.last_text_area;
        if row < area.y || row >= area.y + area.height {
            return None;
        }
        let render = self.last_render.as_ref()?;
        let line = self.scroll_top + (row - area.y) as usize;
        render.position_near(line, column.saturating_sub(area.x))
    }

    fn handle_mouse_event(&mut self, event: MouseEvent) {
        if self.context_menu.is_some() || self.prompt.is_some() {
            return;
        }
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let hit = self
                    .toolbar_hitboxes
                    .iter()
                    .find(|(rect, _)| rect.contains(Position::new(event.column, event.row)))
                    .map(|(_, command)| *command);
                if let Some(command) = hit {
                    self.run_toolbar(command);
                    return;
                }
                if let Some(position) = self.position_at(event.column, event.row) {
                    let extend = event.modifiers.contains(KeyModifiers::SHIFT);
                    self.editor.move_to_position(position, extend);
                    self.preferred_column = None;
                    self.follow_cursor = true;
                    self.mouse_dragging = true;
                }
            }
            MouseEventKind::Drag(MouseButton::Left) if self.mouse_dragging => {
                if let Some(position) = self.position_at(event.column, event.row) {
                    self.editor.move_to_position(position, true);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.mouse_dragging = false;
            }
            MouseEventKind::ScrollUp => {
                self.scroll_top = self.scroll_top.saturating_sub(MOUSE_SCROLL_LINES);
                self.follow_cursor = false;
            }
            MouseEventKind::ScrollDown => {
                self.scroll_top += MOUSE_SCROLL_LINES;
                self.follow_cursor = false;
            }
            _ => {}
        }
    }
}

impl Screen for App {
    fn draw(&mut self, frame: &mut Frame) {
        self.draw_frame(frame);
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) => self.handle_key(code, modifiers)?,
            Event::Mouse(mouse_event) => self.handle_mouse_event(mouse_event),
            Event::Paste(text) => {
                if let Some(prompt) = self.prompt.as_mut() {
                    prompt.input.push_str(text.trim_end_matches('\n'));
                } else if self.editor.insert_text(&text) {
                    self.mark_dirty();
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn on_tick(&mut self) -> bool {
        let had_message = self.status_message.is_some();
        self.prune_status_message();
        let loaded = self.poll_image_loader();
        loaded || (had_message && self.status_message.is_none())
    }

    fn should_quit(&self) -> bool {
        self.should_quit
    }
}

/// Read-only rendering of stored HTML.
struct Viewer {
    title: String,
    tree: newsdesk::html::ViewTree,
    theme: Theme,
    scroll_top: usize,
    last_total_lines: usize,
    last_viewport_height: usize,
    should_quit: bool,
}

impl Viewer {
    fn new(title: String, html: &str) -> Self {
        Self {
            title,
            tree: parse_html(html),
            theme: Theme::default(),
            scroll_top: 0,
            last_total_lines: 0,
            last_viewport_height: 0,
            should_quit: false,
        }
    }

    fn scroll_by(&mut self, delta: isize) {
        let max_scroll = self
            .last_total_lines
            .saturating_sub(self.last_viewport_height.max(1));
        self.scroll_top = self.scroll_top.saturating_add_signed(delta).min(max_scroll);
    }
}

impl Screen for Viewer {
    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        if area.height < 2 || area.width == 0 {
            return;
        }
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(area);
        let (wrap_width, left_padding) = editor_wrap_configuration(vertical[0].width as usize);
        let text_area = Rect::new(
            vertical[0].x + left_padding as u16,
            vertical[0].y,
            (wrap_width as u16).min(vertical[0].width),
            vertical[0].height,
        );
        let lines = render_view(&self.tree, wrap_width, &self.theme);
        self.last_total_lines = lines.len();
        self.last_viewport_height = text_area.height as usize;
        self.scroll_by(0);
        frame.render_widget(
            Paragraph::new(Text::from(lines)).scroll((self.scroll_top as u16, 0)),
            text_area,
        );

        let status = Line::from(vec![
            Span::styled(
                self.title.clone(),
                self.theme.title_style().bg(self.theme.status_bar_bg),
            ),
            Span::raw(format!(
                "  {}/{}  q:Quit",
                (self.scroll_top + 1).min(self.last_total_lines),
                self.last_total_lines
            )),
        ]);
        frame.render_widget(
            Paragraph::new(status).style(self.theme.status_bar_style()),
            vertical[1],
        );
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        let page = self.last_viewport_height.max(1) as isize;
        match event {
            Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) => match code {
                KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                    self.should_quit = true;
                }
                KeyCode::Up | KeyCode::Char('k') => self.scroll_by(-1),
                KeyCode::Down | KeyCode::Char('j') => self.scroll_by(1),
                KeyCode::PageUp => self.scroll_by(-page),
                KeyCode::PageDown | KeyCode::Char(' ') => self.scroll_by(page),
                KeyCode::Home => self.scroll_top = 0,
                KeyCode::End => self.scroll_by(isize::MAX),
                _ => {}
            },
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollUp => self.scroll_by(-(MOUSE_SCROLL_LINES as isize)),
                MouseEventKind::ScrollDown => self.scroll_by(MOUSE_SCROLL_LINES as isize),
                _ => {}
            },
            _ => {}
        }
        Ok(())
    }

    fn on_tick(&mut self) -> bool {
        false
    }

    fn should_quit(&self) -> bool {
        self.should_quit
    }
}

fn count_words(document: &Document) -> usize {
    document
        .roots()
        .iter()
        .map(|root| document.text_content(*root).split_whitespace().count())
        .sum()
}

fn expand_home(input: &str) -> PathBuf {
    match input.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(input)),
        None => PathBuf::from(input),
    }
}
