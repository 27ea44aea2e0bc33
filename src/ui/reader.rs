use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Paragraph},
};

use crate::bible::{self, Bible};
use crate::chapters::ChapterIndex;
use crate::cli::Cli;
use crate::config::{Config, get_app_data_prefix};
use crate::logging;
use crate::models::{ChapterCoordinate, ReadingPosition};
use crate::picker::PickerAction;
use crate::session::ReaderSession;
use crate::settings::{Font, Keymaps, Settings, Theme};
use crate::state::State;
use crate::ui::windows::help::HelpWindow;
use crate::ui::windows::picker::PickerWindow;
use crate::ui::windows::settings::SettingsWindow;

/// Event poll interval; also throttles the scroll pipeline.
const POLL_INTERVAL_MS: u64 = 32;
/// Rows moved per mouse wheel notch.
const MOUSE_SCROLL_ROWS: isize = 3;
/// Text column width when the configuration does not pin one.
const DEFAULT_TEXT_WIDTH: usize = 72;

const SETTINGS_ENTRY_COUNT: usize = 4;

/// The terminal frontend: owns the terminal, the reading session, the
/// position database, and the popup windows, and runs the event loop.
pub struct Reader {
    config: Config,
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    db_state: Option<State>,
    session: ReaderSession,
    dataset_id: String,
    picker_win: PickerWindow,
    show_help: bool,
    settings_visible: bool,
    settings_index: usize,
    fetch_rx: Option<mpsc::Receiver<Bible>>,
    started: Instant,
    should_quit: bool,
}

impl Reader {
    pub fn new(
        config: Config,
        dataset: Bible,
        dataset_id: String,
        fetch_url: Option<String>,
    ) -> eyre::Result<Self> {
        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::new(backend)?;

        // Reading without persistence is better than not reading at all.
        let db_state = match State::new() {
            Ok(state) => Some(state),
            Err(err) => {
                logging::warn(format!("reading positions will not be saved: {err}"));
                None
            }
        };

        let (width, height) = crossterm::terminal::size().unwrap_or((100, 30));
        let header = if config.settings.show_top_bar { 1 } else { 0 };
        let session = ReaderSession::new(
            dataset,
            config.settings.scroll,
            text_width_for(&config.settings, width),
            (height as usize).saturating_sub(header).max(1),
        );

        let fetch_rx = fetch_url.and_then(|url| spawn_fetch(url));

        Ok(Self {
            config,
            terminal,
            db_state,
            session,
            dataset_id,
            picker_win: PickerWindow::new(),
            show_help: false,
            settings_visible: false,
            settings_index: 0,
            fetch_rx,
            started: Instant::now(),
            should_quit: false,
        })
    }

    pub fn run(&mut self, initial_goto: Option<&str>) -> eyre::Result<()> {
        self.restore_position();
        if let Some(spec) = initial_goto {
            self.jump_to_spec(spec);
        }

        crossterm::terminal::enable_raw_mode()?;
        crossterm::execute!(io::stdout(), crossterm::terminal::EnterAlternateScreen)?;
        if self.config.settings.mouse_support {
            crossterm::execute!(io::stdout(), crossterm::event::EnableMouseCapture)?;
        }

        self.terminal.clear()?;
        self.terminal.hide_cursor()?;

        // Main event loop
        loop {
            if self.should_quit {
                break;
            }

            let now = self.now_ms();
            if let Some(write) = self.session.take_due_write(now) {
                self.persist(&write);
            }
            self.poll_fetch();

            self.draw()?;

            if crossterm::event::poll(Duration::from_millis(POLL_INTERVAL_MS))? {
                match crossterm::event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.handle_key_event(key)?;
                    }
                    Event::Mouse(mouse) => self.handle_mouse_event(mouse),
                    Event::Resize(width, height) => self.apply_size(width, height),
                    _ => {}
                }
            }
        }

        // Flush the debounced position write before cleaning up.
        if let Some(write) = self.session.take_due_write(u64::MAX) {
            self.persist(&write);
        }

        self.terminal.clear()?;
        self.terminal.show_cursor()?;
        if self.config.settings.mouse_support {
            crossterm::execute!(io::stdout(), crossterm::event::DisableMouseCapture)?;
        }
        crossterm::execute!(io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
        crossterm::terminal::disable_raw_mode()?;

        Ok(())
    }

    fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn restore_position(&mut self) {
        let saved = match &self.db_state {
            Some(db) => db.reading_position(&self.dataset_id).unwrap_or_else(|err| {
                logging::warn(format!("loading the reading position failed: {err}"));
                None
            }),
            None => None,
        };
        self.session.restore(saved);
    }

    fn persist(&self, position: &ReadingPosition) {
        let Some(db) = &self.db_state else { return };
        // Stored timestamps are wall-clock; the session's are loop-relative.
        let mut stamped = position.clone();
        stamped.timestamp = chrono::Utc::now().timestamp();
        if let Err(err) = db.set_reading_position(&self.dataset_id, &stamped) {
            logging::warn(format!("saving the reading position failed: {err}"));
        }
    }

    fn poll_fetch(&mut self) {
        let Some(rx) = &self.fetch_rx else { return };
        match rx.try_recv() {
            Ok(full) => {
                logging::info(format!("full dataset ready ({} books)", full.len()));
                self.session.swap_dataset(full);
                self.fetch_rx = None;
            }
            Err(mpsc::TryRecvError::Empty) => {}
            Err(mpsc::TryRecvError::Disconnected) => self.fetch_rx = None,
        }
    }

    fn jump_to_spec(&mut self, spec: &str) {
        let (name, chapter) = Cli::parse_goto(spec);
        let Some(book) = self.session.bible().position_of_book(&name) else {
            logging::warn(format!("unknown book: {name}"));
            return;
        };
        let chapter_index = chapter.unwrap_or(1).saturating_sub(1) as usize;
        self.jump(ChapterCoordinate::new(book, chapter_index));
    }

    /// Explicit navigation persists immediately, skipping the debounce.
    fn jump(&mut self, coord: ChapterCoordinate) {
        let now = self.now_ms();
        match self.session.go_to(coord, now) {
            Ok(position) => self.persist(&position),
            Err(err) => logging::warn(format!("navigation failed: {err}")),
        }
    }

    fn apply_size(&mut self, width: u16, height: u16) {
        let header = if self.config.settings.show_top_bar { 1 } else { 0 };
        let body = (height as usize).saturating_sub(header).max(1);
        self.session
            .resize(text_width_for(&self.config.settings, width), body);
    }

    fn apply_terminal_size(&mut self) {
        let (width, height) = crossterm::terminal::size().unwrap_or((100, 30));
        self.apply_size(width, height);
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> eyre::Result<()> {
        if self.show_help {
            self.show_help = false;
            return Ok(());
        }
        if self.picker_win.visible {
            self.handle_picker_key(key);
            return Ok(());
        }
        if self.settings_visible {
            self.handle_settings_key(key)?;
            return Ok(());
        }

        let now = self.now_ms();
        match key.code {
            KeyCode::Up => self.session.scroll_by(-1, now),
            KeyCode::Down => self.session.scroll_by(1, now),
            KeyCode::PageUp => self.session.page_by(-1, now),
            KeyCode::PageDown | KeyCode::Char(' ') => self.session.page_by(1, now),
            KeyCode::Home => self.jump(ChapterCoordinate::new(0, 0)),
            KeyCode::Char(ch) => self.handle_main_char(ch, now),
            _ => {}
        }
        Ok(())
    }

    fn handle_main_char(&mut self, ch: char, now: u64) {
        let keymaps = self.config.keymaps.clone();
        if Keymaps::matches(&keymaps.quit, ch) {
            self.should_quit = true;
        } else if Keymaps::matches(&keymaps.scroll_up, ch) {
            self.session.scroll_by(-1, now);
        } else if Keymaps::matches(&keymaps.scroll_down, ch) {
            self.session.scroll_by(1, now);
        } else if Keymaps::matches(&keymaps.page_up, ch) {
            self.session.page_by(-1, now);
        } else if Keymaps::matches(&keymaps.page_down, ch) {
            self.session.page_by(1, now);
        } else if Keymaps::matches(&keymaps.next_chapter, ch) {
            self.session.next_chapter(now);
        } else if Keymaps::matches(&keymaps.prev_chapter, ch) {
            self.session.previous_chapter(now);
        } else if Keymaps::matches(&keymaps.beginning, ch) {
            self.jump(ChapterCoordinate::new(0, 0));
        } else if Keymaps::matches(&keymaps.picker, ch) {
            let current = self.session.current();
            self.picker_win.open(self.session.bible(), current);
        } else if Keymaps::matches(&keymaps.settings, ch) {
            self.settings_visible = true;
            self.settings_index = 0;
        } else if Keymaps::matches(&keymaps.help, ch) {
            self.show_help = true;
        }
    }

    fn handle_picker_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('t') => self.picker_win.close(),
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(picker) = self.picker_win.picker.as_mut() {
                    picker.select_next(self.session.bible());
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(picker) = self.picker_win.picker.as_mut() {
                    picker.select_previous();
                }
            }
            KeyCode::Backspace | KeyCode::Left | KeyCode::Char('h') => {
                let stays = self
                    .picker_win
                    .picker
                    .as_mut()
                    .is_some_and(|picker| picker.back());
                if !stays {
                    self.picker_win.close();
                }
            }
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
                let current = self.session.current();
                let mut target = None;
                if let Some(picker) = self.picker_win.picker.as_mut()
                    && let PickerAction::Navigate(coord) =
                        picker.confirm(self.session.bible(), current)
                {
                    target = Some(coord);
                }
                if let Some(coord) = target {
                    self.picker_win.close();
                    self.jump(coord);
                }
            }
            _ => {}
        }
    }

    fn handle_settings_key(&mut self, key: KeyEvent) -> eyre::Result<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('s') => {
                self.settings_visible = false;
                if let Err(err) = self.config.save() {
                    logging::warn(format!("saving the configuration failed: {err}"));
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.settings_index = (self.settings_index + 1).min(SETTINGS_ENTRY_COUNT - 1);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.settings_index = self.settings_index.saturating_sub(1);
            }
            KeyCode::Enter => self.activate_setting()?,
            _ => {}
        }
        Ok(())
    }

    fn activate_setting(&mut self) -> eyre::Result<()> {
        match self.settings_index {
            0 => {
                let font = self.config.settings.font;
                self.config.settings.font = cycle(Font::all(), font);
            }
            1 => {
                let theme = self.config.settings.theme;
                self.config.settings.theme = cycle(Theme::all(), theme);
            }
            2 => {
                self.config.settings.mouse_support = !self.config.settings.mouse_support;
                if self.config.settings.mouse_support {
                    crossterm::execute!(io::stdout(), crossterm::event::EnableMouseCapture)?;
                } else {
                    crossterm::execute!(io::stdout(), crossterm::event::DisableMouseCapture)?;
                }
            }
            3 => {
                self.config.settings.show_top_bar = !self.config.settings.show_top_bar;
                self.apply_terminal_size();
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        if !self.config.settings.mouse_support {
            return;
        }
        let now = self.now_ms();
        match mouse.kind {
            MouseEventKind::ScrollDown => self.session.scroll_by(MOUSE_SCROLL_ROWS, now),
            MouseEventKind::ScrollUp => self.session.scroll_by(-MOUSE_SCROLL_ROWS, now),
            _ => {}
        }
    }

    fn draw(&mut self) -> eyre::Result<()> {
        let entries = settings_entries(&self.config.settings);
        let Self {
            terminal,
            session,
            config,
            picker_win,
            show_help,
            settings_visible,
            settings_index,
            ..
        } = self;

        terminal.draw(|frame| {
            render_reader(frame, session, &config.settings);

            if *show_help {
                HelpWindow::render(frame, frame.area());
            } else if picker_win.visible {
                picker_win.render(frame, frame.area(), session.bible());
            } else if *settings_visible {
                SettingsWindow::render(frame, frame.area(), &entries, *settings_index);
            }
        })?;
        Ok(())
    }
}

fn text_width_for(settings: &Settings, terminal_width: u16) -> usize {
    settings
        .text_width
        .unwrap_or(DEFAULT_TEXT_WIDTH)
        .min((terminal_width as usize).saturating_sub(2))
        .max(10)
}

fn spawn_fetch(url: String) -> Option<mpsc::Receiver<Bible>> {
    let cache_dir = match get_app_data_prefix() {
        Ok(prefix) => prefix,
        Err(err) => {
            logging::warn(format!("no cache directory, skipping the fetch: {err}"));
            return None;
        }
    };
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || match bible::fetch_cached(&url, &cache_dir) {
        Ok(full) => {
            let _ = tx.send(full);
        }
        Err(err) => logging::warn(format!("fetching the full dataset failed: {err}")),
    });
    Some(rx)
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: T) -> T {
    let pos = all.iter().position(|&v| v == current).unwrap_or(0);
    all[(pos + 1) % all.len()]
}

fn settings_entries(settings: &Settings) -> Vec<String> {
    vec![
        format!("Font: {}", settings.font.label()),
        format!("Theme: {}", settings.theme.label()),
        format!("Mouse support: {}", settings.mouse_support),
        format!("Show top bar: {}", settings.show_top_bar),
    ]
}

fn theme_style(theme: Theme) -> Style {
    match theme {
        Theme::Light => Style::default().fg(Color::Black).bg(Color::White),
        Theme::Dark => Style::default().fg(Color::Gray).bg(Color::Black),
        Theme::Auto => Style::default(),
    }
}

fn render_reader(frame: &mut Frame, session: &ReaderSession, settings: &Settings) {
    let style = theme_style(settings.theme);
    let frame_area = frame.area();
    frame.render_widget(Block::default().style(style), frame_area);

    let (chunks, header_height) = if settings.show_top_bar {
        let chunks = Layout::default()
            .direction(ratatui::layout::Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Min(0),    // Main content
            ])
            .split(frame_area);
        (chunks, 1)
    } else {
        let chunks = Layout::default()
            .direction(ratatui::layout::Direction::Vertical)
            .constraints([Constraint::Min(0)])
            .split(frame_area);
        (chunks, 0)
    };

    if settings.show_top_bar {
        let total = session.bible().chapter_count();
        let percent_text = ChapterIndex::new(session.bible())
            .linear_position(session.current())
            .ok()
            .filter(|_| total > 0)
            .map(|pos| format!("{}%", ((pos + 1) * 100) / total));
        let header_line = build_header_line(
            &session.current_label(),
            percent_text.as_deref(),
            chunks[0].width,
        );
        frame.render_widget(Paragraph::new(Line::from(header_line)).style(style), chunks[0]);
    }

    let content_chunk = chunks[if header_height > 0 { 1 } else { 0 }];
    let content_width = (session.window().text_width() as u16).min(content_chunk.width);
    let left_pad = (content_chunk.width.saturating_sub(content_width)) / 2;
    let content_area = Rect {
        x: content_chunk.x + left_pad,
        y: content_chunk.y,
        width: content_width,
        height: content_chunk.height,
    };

    let lines: Vec<Line> = session.visible_lines().into_iter().map(Line::from).collect();
    frame.render_widget(Paragraph::new(lines).style(style), content_area);
}

fn build_header_line(title: &str, right_text: Option<&str>, width: u16) -> String {
    let width = width as usize;
    if width == 0 {
        return String::new();
    }

    // Work in characters throughout; book names are arbitrary UTF-8 and a
    // byte-indexed truncation would panic inside a char.
    let mut buffer = vec![' '; width];
    let right_len = right_text.map(|text| text.chars().count()).unwrap_or(0);
    let content_width = if right_len > 0 {
        width.saturating_sub(right_len + 1)
    } else {
        width
    };

    let mut title_chars: Vec<char> = title.chars().collect();
    title_chars.truncate(content_width);
    let title_start = (content_width.saturating_sub(title_chars.len())) / 2;
    for (i, &ch) in title_chars.iter().enumerate() {
        if title_start + i < buffer.len() {
            buffer[title_start + i] = ch;
        }
    }

    if let Some(right_text) = right_text {
        let start = width.saturating_sub(right_len);
        for (i, ch) in right_text.chars().enumerate() {
            if start + i < buffer.len() {
                buffer[start + i] = ch;
            }
        }
    }

    buffer.into_iter().collect()
}
