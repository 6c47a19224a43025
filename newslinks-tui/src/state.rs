//! Terminal-independent UI state: input editing, the limit control, search
//! status and the rendered results.
use crate::command::{Command, parse_command};
use crate::styles;
use crate::transcript::TranscriptLine;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use newslinks_config::NewslinksConfig;
use newslinks_web::{SearchFailure, SearchOutcome, SearchRequest};
use ratatui::style::Style;

const BRAILLE_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
pub const EMPTY_KEYWORD: &str = "Please enter a keyword first.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchStatus {
    Idle,
    Running { query: String },
    Complete { found: usize },
    Failed { error: String },
}

impl SearchStatus {
    pub fn label(&self) -> String {
        match self {
            SearchStatus::Idle => "Idle".into(),
            SearchStatus::Running { query } => format!("Searching Google News for \"{query}\"…"),
            SearchStatus::Complete { found: 0 } => "No links found.".into(),
            SearchStatus::Complete { found } => format!("Found {found} unique links"),
            SearchStatus::Failed { error } => format!("Search failed: {error}"),
        }
    }

    pub fn style(&self) -> Style {
        match self {
            SearchStatus::Idle => styles::system(),
            SearchStatus::Running { .. } => styles::running(),
            SearchStatus::Complete { found: 0 } => styles::warning(),
            SearchStatus::Complete { .. } => styles::success(),
            SearchStatus::Failed { .. } => styles::error(),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, SearchStatus::Running { .. })
    }
}

/// What the event loop should do after an input.
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    None,
    Search(SearchRequest),
    Quit,
}

pub struct TuiState {
    // input line
    input: String,
    input_cursor: usize,

    // limit control
    limit: u32,
    min_limit: u32,
    max_limit: u32,
    max_pages: u32,

    // output
    status: SearchStatus,
    lines: Vec<TranscriptLine>,
    debug_lines: Vec<String>,
    show_debug: bool,
    scroll: usize, // from bottom

    spin_idx: usize,
    dirty: bool,
}

impl TuiState {
    pub fn new(cfg: &NewslinksConfig) -> Self {
        let s = &cfg.search;
        Self {
            input: String::new(),
            input_cursor: 0,
            limit: s.default_limit.clamp(s.min_limit, s.max_limit),
            min_limit: s.min_limit,
            max_limit: s.max_limit,
            max_pages: s.max_pages,
            status: SearchStatus::Idle,
            lines: vec![TranscriptLine::new(
                "Type a keyword and press Enter. `/help` lists commands.",
                styles::system(),
            )],
            debug_lines: Vec::new(),
            show_debug: false,
            scroll: 0,
            spin_idx: 0,
            dirty: true,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_cursor(&self) -> usize {
        self.input_cursor
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn limit_range(&self) -> (u32, u32) {
        (self.min_limit, self.max_limit)
    }

    pub fn status(&self) -> &SearchStatus {
        &self.status
    }

    pub fn lines(&self) -> &[TranscriptLine] {
        &self.lines
    }

    pub fn debug_lines(&self) -> &[String] {
        &self.debug_lines
    }

    pub fn show_debug(&self) -> bool {
        self.show_debug
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Returns the dirty flag and clears it.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn spinner(&self) -> &'static str {
        if self.status.is_running() {
            BRAILLE_FRAMES[self.spin_idx % BRAILLE_FRAMES.len()]
        } else {
            " "
        }
    }

    pub fn step_spinner(&mut self) {
        if self.status.is_running() {
            self.spin_idx = (self.spin_idx + 1) % BRAILLE_FRAMES.len();
            self.dirty = true;
        }
    }

    pub fn set_limit(&mut self, limit: u32) {
        self.limit = limit.clamp(self.min_limit, self.max_limit);
        self.dirty = true;
    }

    pub fn toggle_debug(&mut self) {
        self.show_debug = !self.show_debug;
        self.dirty = true;
    }

    fn push_styled<S: Into<String>>(&mut self, s: S, style: Style) {
        self.lines.push(TranscriptLine::new(s, style));
        self.scroll = 0;
        self.dirty = true;
    }

    fn push_blank(&mut self) {
        self.push_styled(String::new(), Style::default());
    }

    pub fn report_error(&mut self, message: &str) {
        self.push_styled(format!("× Error: {message}"), styles::error());
    }

    fn cursor_left(&mut self) {
        if self.input_cursor == 0 {
            return;
        }
        self.input_cursor -= 1;
        while self.input_cursor > 0 && !self.input.is_char_boundary(self.input_cursor) {
            self.input_cursor -= 1;
        }
    }

    fn cursor_right(&mut self) {
        if self.input_cursor >= self.input.len() {
            return;
        }
        self.input_cursor += 1;
        while self.input_cursor < self.input.len()
            && !self.input.is_char_boundary(self.input_cursor)
        {
            self.input_cursor += 1;
        }
    }

    fn insert_char(&mut self, ch: char) {
        self.input.insert(self.input_cursor, ch);
        self.input_cursor += ch.len_utf8();
    }

    fn backspace(&mut self) {
        if self.input_cursor == 0 {
            return;
        }
        let mut prev = self.input_cursor - 1;
        while prev > 0 && !self.input.is_char_boundary(prev) {
            prev -= 1;
        }
        self.input.drain(prev..self.input_cursor);
        self.input_cursor = prev;
    }

    fn delete(&mut self) {
        if self.input_cursor >= self.input.len() {
            return;
        }
        let start = self.input_cursor;
        let mut end = start + 1;
        while end < self.input.len() && !self.input.is_char_boundary(end) {
            end += 1;
        }
        self.input.drain(start..end);
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => return Action::Quit,
            KeyCode::Up if ctrl => self.set_limit(self.limit.saturating_add(1)),
            KeyCode::Down if ctrl => self.set_limit(self.limit.saturating_sub(1)),
            KeyCode::Tab => self.toggle_debug(),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_add(5),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_sub(5),
            KeyCode::Up => self.scroll = self.scroll.saturating_add(1),
            KeyCode::Down => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Enter => {
                let line = std::mem::take(&mut self.input);
                self.input_cursor = 0;
                self.dirty = true;
                return self.submit(&line);
            }
            KeyCode::Left => self.cursor_left(),
            KeyCode::Right => self.cursor_right(),
            KeyCode::Home => self.input_cursor = 0,
            KeyCode::End => self.input_cursor = self.input.len(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Esc => {
                self.input.clear();
                self.input_cursor = 0;
            }
            KeyCode::Char(ch) => self.insert_char(ch),
            _ => return Action::None,
        }
        self.dirty = true;
        Action::None
    }

    /// Route a submitted input line: commands first, then a search.
    pub fn submit(&mut self, line: &str) -> Action {
        let s = line.trim();
        if s.starts_with('/') {
            return self.handle_command(parse_command(s));
        }
        if s.is_empty() {
            self.push_styled(EMPTY_KEYWORD, styles::warning());
            return Action::None;
        }
        if self.status.is_running() {
            self.push_styled("A search is already running; please wait.", styles::warning());
            return Action::None;
        }

        let request = match SearchRequest::new(s, self.limit)
            .and_then(|r| r.with_max_pages(self.max_pages))
        {
            Ok(request) => request,
            Err(e) => {
                self.push_styled(format!("× {e}"), styles::error());
                return Action::None;
            }
        };

        self.lines.clear();
        self.debug_lines.clear();
        self.push_styled(format!("→ {} (limit {})", request.query(), request.limit()), styles::header());
        self.status = SearchStatus::Running {
            query: request.query().to_string(),
        };
        Action::Search(request)
    }

    fn handle_command(&mut self, cmd: Command) -> Action {
        match cmd {
            Command::Quit => return Action::Quit,
            Command::Help => {
                self.push_styled("Commands:", styles::label());
                self.push_styled("  <keyword>       search Google News", styles::value());
                self.push_styled(
                    format!("  /limit <n>      links to return ({}-{})", self.min_limit, self.max_limit),
                    styles::value(),
                );
                self.push_styled("  /debug          show or hide the debug log (Tab)", styles::value());
                self.push_styled("  /quit           exit (Ctrl+C)", styles::value());
                self.push_styled("  Ctrl+Up/Down    adjust the limit", styles::dim());
                self.push_blank();
            }
            Command::Limit(None) => {
                self.push_styled(
                    format!(
                        "Limit: {} (range {}-{})",
                        self.limit, self.min_limit, self.max_limit
                    ),
                    styles::system(),
                );
            }
            Command::Limit(Some(n)) => {
                self.set_limit(n);
                self.push_styled(format!("✓ Limit set to {}", self.limit), styles::system());
            }
            Command::BadLimit(raw) => {
                self.push_styled(format!("× Not a number: {raw}"), styles::error());
            }
            Command::Debug => self.toggle_debug(),
            Command::Unknown(s) => {
                self.push_styled(format!("× Unknown command: {s}"), styles::error());
                self.push_styled("Try `/help`.", styles::dim());
            }
        }
        Action::None
    }

    /// Record the outcome of the search started by the last [`Action::Search`].
    pub fn finish(&mut self, result: Result<SearchOutcome, SearchFailure>) {
        match result {
            Ok(outcome) => {
                self.status = SearchStatus::Complete {
                    found: outcome.urls.len(),
                };
                for (i, url) in outcome.urls.iter().enumerate() {
                    self.push_styled(format!("{:02}. {url}", i + 1), styles::link());
                }
                self.debug_lines = outcome.debug.into_lines();
            }
            Err(failure) => {
                self.status = SearchStatus::Failed {
                    error: failure.error.to_string(),
                };
                self.debug_lines = failure.debug.into_lines();
            }
        }
        self.dirty = true;
    }
}
