use crate::diary_entry::{DiaryEntry, Mood};
use crate::diary_state::DiaryState;
use crate::editor::{Editor, FormatKind, FormatOutcome, MediaAction, Selection};
use crate::lock::LockGate;
use crate::markup;
use crate::media::{AudioRecorder, ImagePicker};
use crate::search::{Query, SearchCriteria};
use crate::stats::{self, TrendRange};
use crate::theme::{parse_hex, Palette, Theme};
use chrono::Local;
use color_eyre::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Sparkline, Wrap},
    Frame, Terminal,
};
use std::io::{stdout, Stdout};
use unicode_width::UnicodeWidthStr;

pub enum Action {
    Write,
    View,
    Edit,
    Delete,
    Search,
    AdvancedSearch,
    ClearSearch,
    FilterCategory,
    AddCategory,
    Statistics,
    MoodTracker,
    Theme,
    SetPassword,
    Lock,
    Export,
    Quit,
}

pub enum LockOutcome {
    Unlocked,
    Quit,
}

pub struct UI {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    selected: usize,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum DraftField {
    Content,
    Mood,
    Tags,
    Category,
}

impl DraftField {
    const ORDER: [DraftField; 4] = [
        DraftField::Content,
        DraftField::Mood,
        DraftField::Tags,
        DraftField::Category,
    ];
}

/// Everything being edited on the compose screen.
struct Draft {
    editor: Editor,
    mood: Option<Mood>,
    tags: Vec<String>,
    tag_input: String,
    category: Option<String>,
    images: Vec<String>,
    voice_note: Option<String>,
    focus: DraftField,
    toolbar_armed: bool,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SearchField {
    Text,
    Start,
    End,
    Mood,
    Tags,
}

impl SearchField {
    const ORDER: [SearchField; 5] = [
        SearchField::Text,
        SearchField::Start,
        SearchField::End,
        SearchField::Mood,
        SearchField::Tags,
    ];
}

impl UI {
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;

        Ok(UI {
            terminal,
            selected: 0,
        })
    }

    pub fn selected_entry<'a>(&self, visible: &[&'a DiaryEntry]) -> Option<&'a DiaryEntry> {
        visible.get(self.selected).copied()
    }

    pub fn display(
        &mut self,
        diary_state: &DiaryState,
        visible: &[&DiaryEntry],
        query: &Query,
        theme: &Theme,
    ) -> Result<()> {
        if self.selected >= visible.len() {
            self.selected = visible.len().saturating_sub(1);
        }
        let palette = theme.palette();
        let streak = stats::compute_streak(diary_state.get_entries(), Local::now().date_naive());
        let total = diary_state.get_entries().len();
        let selected = self.selected;

        self.terminal.draw(|f| {
            paint_background(f, &palette);
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(1)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Length(1),
                    Constraint::Min(0),
                    Constraint::Length(3),
                ])
                .split(f.area());

            let heading = if streak > 0 {
                format!("My Diary  ·  {streak} day streak")
            } else {
                "My Diary".to_string()
            };
            f.render_widget(title(&heading, &palette), chunks[0]);

            let status = Paragraph::new(query_status(query, diary_state, visible.len(), total))
                .style(Style::default().fg(palette.text));
            f.render_widget(status, chunks[1]);

            let width = chunks[2].width.saturating_sub(6) as usize;
            let items: Vec<ListItem> = visible
                .iter()
                .map(|entry| entry_item(entry, diary_state, width, &palette))
                .collect();
            let entries_list = List::new(items)
                .block(bordered("Entries", &palette))
                .highlight_style(
                    Style::default()
                        .bg(palette.secondary)
                        .add_modifier(Modifier::BOLD),
                )
                .highlight_symbol("> ");
            let mut list_state = ListState::default().with_selected(if visible.is_empty() {
                None
            } else {
                Some(selected)
            });
            f.render_stateful_widget(entries_list, chunks[2], &mut list_state);

            let controls = if total == 0 {
                "w: Write, n: New category, p: Theme, P: Password, q: Quit"
            } else {
                "w: Write, Enter: View, e: Edit, d: Delete, /: Search, a: Advanced, c: Category, x: Clear\n\
                 t: Stats, m: Moods, n: New category, p: Theme, P: Password, l: Lock, E: Export, q: Quit"
            };
            f.render_widget(instructions(controls, &palette), chunks[3]);
        })?;

        Ok(())
    }

    pub fn handle_input(&mut self, visible_count: usize) -> Result<Option<Action>> {
        let Some(key) = read_key()? else {
            return Ok(None);
        };
        let has_entries = visible_count > 0;
        let action = match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < visible_count {
                    self.selected += 1;
                }
                None
            }
            KeyCode::Char('w') => Some(Action::Write),
            KeyCode::Enter | KeyCode::Char('v') if has_entries => Some(Action::View),
            KeyCode::Char('e') if has_entries => Some(Action::Edit),
            KeyCode::Char('d') if has_entries => Some(Action::Delete),
            KeyCode::Char('/') | KeyCode::Char('s') => Some(Action::Search),
            KeyCode::Char('a') => Some(Action::AdvancedSearch),
            KeyCode::Char('x') => Some(Action::ClearSearch),
            KeyCode::Char('c') => Some(Action::FilterCategory),
            KeyCode::Char('n') => Some(Action::AddCategory),
            KeyCode::Char('t') => Some(Action::Statistics),
            KeyCode::Char('m') => Some(Action::MoodTracker),
            KeyCode::Char('p') => Some(Action::Theme),
            KeyCode::Char('P') => Some(Action::SetPassword),
            KeyCode::Char('l') => Some(Action::Lock),
            KeyCode::Char('E') => Some(Action::Export),
            KeyCode::Char('q') => Some(Action::Quit),
            _ => None,
        };
        Ok(action)
    }

    /// Compose screen for a new entry (`existing` is `None`) or an edit.
    /// Returns the entry to save, or `None` when cancelled.
    pub fn compose_entry(
        &mut self,
        existing: Option<&DiaryEntry>,
        diary_state: &DiaryState,
        theme: &Theme,
        picker: &mut dyn ImagePicker,
        recorder: &mut dyn AudioRecorder,
    ) -> Result<Option<DiaryEntry>> {
        let mut draft = Draft {
            editor: Editor::new(existing.map_or("", |e| e.content.as_str())),
            mood: existing.and_then(|e| e.mood),
            tags: existing.map(|e| e.tags().to_vec()).unwrap_or_default(),
            tag_input: String::new(),
            category: existing.and_then(|e| e.category.clone()),
            images: existing.map(|e| e.images().to_vec()).unwrap_or_default(),
            voice_note: existing.and_then(|e| e.voice_note.clone()),
            focus: DraftField::Content,
            toolbar_armed: false,
        };
        let heading = if existing.is_some() {
            "Edit Diary Entry"
        } else {
            "New Diary Entry"
        };
        let palette = theme.palette();

        loop {
            let recording = recorder.is_recording();
            self.terminal
                .draw(|f| draw_compose(f, heading, &draft, diary_state, recording, &palette))?;

            let Some(key) = read_key()? else {
                continue;
            };

            if draft.toolbar_armed {
                draft.toolbar_armed = false;
                let Some(kind) = toolbar_kind(&key) else {
                    continue;
                };
                match draft.editor.apply_format(kind) {
                    FormatOutcome::Delegated(MediaAction::InsertImage) => {
                        if let Some(reference) = self.pick_image(picker, theme)? {
                            draft.editor.insert_image(&reference);
                        }
                    }
                    FormatOutcome::Delegated(MediaAction::ToggleRecording) => {
                        self.toggle_recording(&mut draft, recorder, theme)?;
                    }
                    FormatOutcome::Wrapped | FormatOutcome::Unwrapped => {}
                }
                continue;
            }

            if is_ctrl(&key, 's') {
                if markup::plain_text(draft.editor.content()).trim().is_empty() {
                    self.alert("Empty Entry", "Write something before saving.", theme)?;
                    continue;
                }
                if recorder.is_recording() {
                    self.toggle_recording(&mut draft, recorder, theme)?;
                }
                return Ok(Some(finish_draft(draft, existing)));
            }
            if key.code == KeyCode::Esc {
                if recorder.is_recording() {
                    if let Err(e) = recorder.stop() {
                        tracing::warn!("Failed to stop recording on cancel: {}", e);
                    }
                }
                return Ok(None);
            }
            match key.code {
                KeyCode::Tab => {
                    draft.focus = cycle(&DraftField::ORDER, &draft.focus, true);
                    continue;
                }
                KeyCode::BackTab => {
                    draft.focus = cycle(&DraftField::ORDER, &draft.focus, false);
                    continue;
                }
                _ => {}
            }
            if is_ctrl(&key, 'g') {
                if let Some(reference) = self.pick_image(picker, theme)? {
                    draft.images.push(reference);
                }
                continue;
            }
            if is_ctrl(&key, 'd') {
                draft.images.pop();
                continue;
            }
            if is_ctrl(&key, 'o') {
                if let Some(saved) = existing {
                    draft.editor.set_content_html(&saved.content);
                }
                continue;
            }
            if is_ctrl(&key, 'r') {
                self.toggle_recording(&mut draft, recorder, theme)?;
                continue;
            }
            if is_ctrl(&key, 'p') {
                if let Some(reference) = draft.voice_note.clone() {
                    if let Err(e) = recorder.play(&reference) {
                        tracing::error!("Error playing audio: {}", e);
                        self.alert("Playback Error", &e.to_string(), theme)?;
                    }
                }
                continue;
            }

            match draft.focus {
                DraftField::Content => handle_content_key(&mut draft, &key),
                DraftField::Mood => match key.code {
                    KeyCode::Left => draft.mood = cycle(&mood_options(), &draft.mood, false),
                    KeyCode::Right => draft.mood = cycle(&mood_options(), &draft.mood, true),
                    _ => {}
                },
                DraftField::Tags => match key.code {
                    KeyCode::Enter => {
                        let tag = draft.tag_input.trim().to_string();
                        if !tag.is_empty() && !draft.tags.contains(&tag) {
                            draft.tags.push(tag);
                        }
                        draft.tag_input.clear();
                    }
                    KeyCode::Backspace if draft.tag_input.is_empty() => {
                        draft.tags.pop();
                    }
                    _ => {
                        edit_line(&mut draft.tag_input, &key);
                    }
                },
                DraftField::Category => {
                    let options: Vec<Option<String>> = std::iter::once(None)
                        .chain(
                            diary_state
                                .get_categories()
                                .iter()
                                .map(|c| Some(c.id.clone())),
                        )
                        .collect();
                    match key.code {
                        KeyCode::Left => draft.category = cycle(&options, &draft.category, false),
                        KeyCode::Right => draft.category = cycle(&options, &draft.category, true),
                        _ => {}
                    }
                }
            }
        }
    }

    fn pick_image(&mut self, picker: &mut dyn ImagePicker, theme: &Theme) -> Result<Option<String>> {
        let Some(source) = self.prompt("Insert Image", "Image file path", "", false, theme)? else {
            return Ok(None);
        };
        match picker.pick(&source) {
            Ok(reference) => Ok(reference),
            Err(e) => {
                tracing::error!("Error picking image: {}", e);
                self.alert("Error", &format!("Failed to pick image: {e}"), theme)?;
                Ok(None)
            }
        }
    }

    fn toggle_recording(
        &mut self,
        draft: &mut Draft,
        recorder: &mut dyn AudioRecorder,
        theme: &Theme,
    ) -> Result<()> {
        let result = if recorder.is_recording() {
            recorder.stop().map(|reference| {
                if reference.is_some() {
                    draft.voice_note = reference;
                }
            })
        } else {
            recorder.start()
        };
        if let Err(e) = result {
            tracing::error!("Error handling audio recording: {}", e);
            self.alert(
                "Error",
                &format!("Failed to handle audio recording: {e}"),
                theme,
            )?;
        }
        Ok(())
    }

    pub fn view_full_entry(
        &mut self,
        entry: &DiaryEntry,
        diary_state: &DiaryState,
        theme: &Theme,
        recorder: &mut dyn AudioRecorder,
    ) -> Result<()> {
        let palette = theme.palette();
        let mut scroll: u16 = 0;

        loop {
            self.terminal.draw(|f| {
                paint_background(f, &palette);
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .margin(1)
                    .constraints([
                        Constraint::Length(3),
                        Constraint::Min(5),
                        Constraint::Length(6),
                        Constraint::Length(3),
                    ])
                    .split(f.area());

                f.render_widget(title(&format!("Entry from {}", entry.date), &palette), chunks[0]);

                let content = Paragraph::new(markup::render(&entry.content, &palette))
                    .block(bordered("Content", &palette))
                    .wrap(Wrap { trim: false })
                    .scroll((scroll, 0));
                f.render_widget(content, chunks[1]);

                let details = Paragraph::new(entry_details(entry, diary_state, &palette))
                    .block(bordered("Details", &palette));
                f.render_widget(details, chunks[2]);

                let hint = if entry.voice_note.is_some() {
                    "Up/Down: Scroll, p: Play voice note, Esc: Back"
                } else {
                    "Up/Down: Scroll, Esc: Back"
                };
                f.render_widget(instructions(hint, &palette), chunks[3]);
            })?;

            let Some(key) = read_key()? else {
                continue;
            };
            match key.code {
                KeyCode::Up => scroll = scroll.saturating_sub(1),
                KeyCode::Down => scroll = scroll.saturating_add(1),
                KeyCode::Char('p') => {
                    if let Some(reference) = &entry.voice_note {
                        if let Err(e) = recorder.play(reference) {
                            tracing::error!("Error playing audio: {}", e);
                            self.alert(
                                "Playback Error",
                                "There was an error playing the audio.",
                                theme,
                            )?;
                        }
                    }
                }
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => break,
                _ => {}
            }
        }

        Ok(())
    }

    pub fn lock_screen(&mut self, gate: &mut LockGate, theme: &Theme) -> Result<LockOutcome> {
        let palette = theme.palette();
        let mut password = String::new();
        let mut message = String::new();

        loop {
            let hint = if gate.biometrics_available() {
                "Enter: Unlock Diary (biometrics first), Esc: Quit"
            } else {
                "Enter: Unlock Diary, Esc: Quit"
            };
            self.terminal.draw(|f| {
                paint_background(f, &palette);
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .margin(1)
                    .constraints([
                        Constraint::Length(3),
                        Constraint::Length(2),
                        Constraint::Length(3),
                        Constraint::Length(2),
                        Constraint::Min(0),
                        Constraint::Length(3),
                    ])
                    .split(f.area());

                f.render_widget(title("My Diary", &palette), chunks[0]);
                let welcome = Paragraph::new("Welcome Back")
                    .style(Style::default().fg(palette.primary))
                    .alignment(Alignment::Center);
                f.render_widget(welcome, chunks[1]);

                let masked = "•".repeat(password.chars().count());
                let input = Paragraph::new(masked.clone())
                    .style(Style::default().fg(palette.text))
                    .block(bordered("Enter your password", &palette));
                f.render_widget(input, chunks[2]);
                f.set_cursor_position((
                    chunks[2].x + 1 + masked.width() as u16,
                    chunks[2].y + 1,
                ));

                let error = Paragraph::new(message.clone())
                    .style(Style::default().fg(Color::Red))
                    .alignment(Alignment::Center);
                f.render_widget(error, chunks[3]);
                f.render_widget(instructions(hint, &palette), chunks[5]);
            })?;

            let Some(key) = read_key()? else {
                continue;
            };
            match key.code {
                KeyCode::Esc => return Ok(LockOutcome::Quit),
                KeyCode::Enter => match gate.unlock(&password) {
                    Ok(Some(method)) => {
                        tracing::info!("Journal unlocked with {:?}", method);
                        return Ok(LockOutcome::Unlocked);
                    }
                    Ok(None) => {
                        message = "Incorrect Password. Please try again.".to_string();
                        password.clear();
                    }
                    Err(e) => {
                        tracing::error!("Error verifying password: {}", e);
                        message = "Failed to verify password. Please try again.".to_string();
                    }
                },
                _ => {
                    edit_line(&mut password, &key);
                }
            }
        }
    }

    /// Single-line input. `None` when cancelled with Esc.
    pub fn prompt(
        &mut self,
        heading: &str,
        label: &str,
        initial: &str,
        masked: bool,
        theme: &Theme,
    ) -> Result<Option<String>> {
        let palette = theme.palette();
        let mut value = initial.to_string();

        loop {
            self.terminal.draw(|f| {
                paint_background(f, &palette);
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .margin(1)
                    .constraints([
                        Constraint::Length(3),
                        Constraint::Length(3),
                        Constraint::Min(1),
                    ])
                    .split(f.area());

                f.render_widget(title(heading, &palette), chunks[0]);

                let shown = if masked {
                    "•".repeat(value.chars().count())
                } else {
                    value.clone()
                };
                let inner_width = chunks[1].width.saturating_sub(2) as usize;
                let offset = shown.width().saturating_sub(inner_width.saturating_sub(1));
                let input = Paragraph::new(shown.clone())
                    .style(Style::default().fg(palette.text))
                    .block(bordered(label, &palette))
                    .scroll((0, offset as u16));
                f.render_widget(input, chunks[1]);
                f.set_cursor_position((
                    chunks[1].x + 1 + (shown.width() - offset) as u16,
                    chunks[1].y + 1,
                ));

                f.render_widget(instructions("Enter: Submit, Esc: Cancel", &palette), chunks[2]);
            })?;

            let Some(key) = read_key()? else {
                continue;
            };
            match key.code {
                KeyCode::Enter => return Ok(Some(value)),
                KeyCode::Esc => return Ok(None),
                _ => {
                    edit_line(&mut value, &key);
                }
            }
        }
    }

    /// Non-blocking notice: any key dismisses it.
    pub fn alert(&mut self, heading: &str, message: &str, theme: &Theme) -> Result<()> {
        let palette = theme.palette();
        loop {
            self.terminal.draw(|f| {
                paint_background(f, &palette);
                let area = centered(f.area(), 60, 7);
                let body = Paragraph::new(message.to_string())
                    .style(Style::default().fg(palette.text))
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true })
                    .block(bordered(heading, &palette));
                f.render_widget(body, area);
            })?;
            if read_key()?.is_some() {
                return Ok(());
            }
        }
    }

    pub fn confirm(&mut self, heading: &str, message: &str, theme: &Theme) -> Result<bool> {
        let palette = theme.palette();
        loop {
            self.terminal.draw(|f| {
                paint_background(f, &palette);
                let area = centered(f.area(), 60, 7);
                let body = Paragraph::new(vec![
                    Line::from(message.to_string()),
                    Line::from(""),
                    Line::from(Span::styled(
                        "y: Delete, n: Cancel",
                        Style::default().fg(palette.primary),
                    )),
                ])
                .style(Style::default().fg(palette.text))
                .alignment(Alignment::Center)
                .block(bordered(heading, &palette));
                f.render_widget(body, area);
            })?;
            let Some(key) = read_key()? else {
                continue;
            };
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => return Ok(true),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => return Ok(false),
                _ => {}
            }
        }
    }

    pub fn advanced_search(
        &mut self,
        initial: SearchCriteria,
        theme: &Theme,
    ) -> Result<Option<SearchCriteria>> {
        let palette = theme.palette();
        let mut criteria = initial;
        let mut start = criteria
            .start_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let mut end = criteria
            .end_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let mut tag_input = String::new();
        let mut focus = SearchField::Text;
        let mut message = String::new();

        loop {
            self.terminal.draw(|f| {
                paint_background(f, &palette);
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .margin(1)
                    .constraints([
                        Constraint::Length(3),
                        Constraint::Length(3),
                        Constraint::Length(3),
                        Constraint::Length(3),
                        Constraint::Length(3),
                        Constraint::Length(3),
                        Constraint::Length(1),
                        Constraint::Min(0),
                        Constraint::Length(3),
                    ])
                    .split(f.area());

                f.render_widget(title("Advanced Search", &palette), chunks[0]);

                let mood = criteria
                    .mood
                    .map_or("Any".to_string(), |m| format!("{} {}", m.emoji(), m));
                let tags = if criteria.tags.is_empty() {
                    tag_input.clone()
                } else {
                    format!("[{}] {}", criteria.tags.join("] ["), tag_input)
                };
                let fields = [
                    (SearchField::Text, "Search text", criteria.text.clone()),
                    (SearchField::Start, "Start date (YYYY-MM-DD)", start.clone()),
                    (SearchField::End, "End date (YYYY-MM-DD)", end.clone()),
                    (SearchField::Mood, "Mood (Left/Right)", mood),
                    (SearchField::Tags, "Tags (Enter adds)", tags),
                ];
                for (i, (field, label, value)) in fields.into_iter().enumerate() {
                    let area = chunks[i + 1];
                    let block = field_block(label, field == focus, &palette);
                    let width = value.width();
                    f.render_widget(
                        Paragraph::new(value)
                            .style(Style::default().fg(palette.text))
                            .block(block),
                        area,
                    );
                    if field == focus && field != SearchField::Mood {
                        f.set_cursor_position((area.x + 1 + width as u16, area.y + 1));
                    }
                }

                let error = Paragraph::new(message.clone()).style(Style::default().fg(Color::Red));
                f.render_widget(error, chunks[6]);
                f.render_widget(
                    instructions("Tab: Next field, Enter: Search, Esc: Cancel", &palette),
                    chunks[8],
                );
            })?;

            let Some(key) = read_key()? else {
                continue;
            };
            match key.code {
                KeyCode::Esc => return Ok(None),
                KeyCode::Tab | KeyCode::Down => focus = cycle(&SearchField::ORDER, &focus, true),
                KeyCode::BackTab | KeyCode::Up => {
                    focus = cycle(&SearchField::ORDER, &focus, false)
                }
                KeyCode::Enter if focus == SearchField::Tags && !tag_input.trim().is_empty() => {
                    criteria.add_tag(&tag_input);
                    tag_input.clear();
                }
                KeyCode::Enter => {
                    match (parse_optional_date(&start), parse_optional_date(&end)) {
                        (Ok(start_date), Ok(end_date)) => {
                            criteria.start_date = start_date;
                            criteria.end_date = end_date;
                            return Ok(Some(criteria));
                        }
                        _ => message = "Dates must look like 2026-10-18".to_string(),
                    }
                }
                _ => match focus {
                    SearchField::Text => {
                        edit_line(&mut criteria.text, &key);
                    }
                    SearchField::Start => {
                        edit_line(&mut start, &key);
                    }
                    SearchField::End => {
                        edit_line(&mut end, &key);
                    }
                    SearchField::Mood => match key.code {
                        KeyCode::Left => criteria.mood = cycle(&mood_options(), &criteria.mood, false),
                        KeyCode::Right => criteria.mood = cycle(&mood_options(), &criteria.mood, true),
                        _ => {}
                    },
                    SearchField::Tags => {
                        if key.code == KeyCode::Backspace && tag_input.is_empty() {
                            if let Some(last) = criteria.tags.last().cloned() {
                                criteria.remove_tag(&last);
                            }
                        } else {
                            edit_line(&mut tag_input, &key);
                        }
                    }
                },
            }
        }
    }

    /// `Some(None)` selects "All"; `None` means cancelled.
    pub fn pick_category(
        &mut self,
        diary_state: &DiaryState,
        current: Option<String>,
        theme: &Theme,
    ) -> Result<Option<Option<String>>> {
        let palette = theme.palette();
        let categories = diary_state.get_categories();
        let mut selected_index = current
            .as_deref()
            .and_then(|id| categories.iter().position(|c| c.id == id))
            .map_or(0, |i| i + 1);

        loop {
            self.terminal.draw(|f| {
                paint_background(f, &palette);
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .margin(1)
                    .constraints([
                        Constraint::Length(3),
                        Constraint::Min(3),
                        Constraint::Length(3),
                    ])
                    .split(f.area());

                f.render_widget(title("Filter by Category", &palette), chunks[0]);

                let items: Vec<ListItem> = std::iter::once(ListItem::new(Line::from(Span::styled(
                    "All",
                    Style::default().fg(palette.text),
                ))))
                .chain(categories.iter().map(|c| {
                    let dot = parse_hex(&c.color).unwrap_or(palette.primary);
                    ListItem::new(Line::from(vec![
                        Span::styled("● ", Style::default().fg(dot)),
                        Span::styled(c.name.clone(), Style::default().fg(palette.text)),
                    ]))
                }))
                .collect();
                let list = List::new(items)
                    .block(bordered("Categories", &palette))
                    .highlight_style(Style::default().bg(palette.secondary).add_modifier(Modifier::BOLD))
                    .highlight_symbol("> ");
                f.render_stateful_widget(
                    list,
                    chunks[1],
                    &mut ListState::default().with_selected(Some(selected_index)),
                );

                f.render_widget(
                    instructions("Up/Down: Navigate, Enter: Select, Esc: Cancel", &palette),
                    chunks[2],
                );
            })?;

            let Some(key) = read_key()? else {
                continue;
            };
            match key.code {
                KeyCode::Up => selected_index = selected_index.saturating_sub(1),
                KeyCode::Down => {
                    if selected_index < categories.len() {
                        selected_index += 1;
                    }
                }
                KeyCode::Enter => {
                    let choice = selected_index
                        .checked_sub(1)
                        .and_then(|i| categories.get(i))
                        .map(|c| c.id.clone());
                    return Ok(Some(choice));
                }
                KeyCode::Esc => return Ok(None),
                _ => {}
            }
        }
    }

    pub fn statistics(&mut self, entries: &[DiaryEntry], top_n: usize, theme: &Theme) -> Result<()> {
        let palette = theme.palette();
        let summary = stats::calculate_statistics(entries);
        let streak = stats::compute_streak(entries, Local::now().date_naive());
        let moods = stats::mood_histogram(entries);
        let tags = stats::top_tags(entries, top_n);

        let mut lines = vec![
            Line::from(format!("Total entries:  {}", summary.total_entries)),
            Line::from(format!("Total words:    {}", summary.word_count)),
            Line::from(format!("Top mood:       {}", summary.top_mood)),
            Line::from(format!("Top tag:        {}", summary.top_tag)),
            Line::from(format!("Current streak: {} days", streak)),
            Line::from(""),
            section("Mood Distribution", &palette),
        ];
        let max_mood = moods.iter().map(|(_, n)| *n).max().unwrap_or(0);
        lines.extend(moods.iter().map(|(mood, n)| {
            bar_line(&format!("{} {:<9}", mood.emoji(), mood.as_str()), *n, max_mood, &palette)
        }));
        lines.push(Line::from(""));
        lines.push(section(&format!("Top {} Tags", top_n), &palette));
        let max_tag = tags.first().map_or(0, |(_, n)| *n);
        lines.extend(
            tags.iter()
                .map(|(tag, n)| bar_line(&format!("{:<12}", markup::truncate(tag, 12)), *n, max_tag, &palette)),
        );

        loop {
            self.terminal.draw(|f| {
                paint_background(f, &palette);
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .margin(1)
                    .constraints([
                        Constraint::Length(3),
                        Constraint::Min(5),
                        Constraint::Length(3),
                    ])
                    .split(f.area());

                f.render_widget(title("Statistics", &palette), chunks[0]);
                f.render_widget(
                    Paragraph::new(lines.clone())
                        .style(Style::default().fg(palette.text))
                        .block(bordered("Your Diary", &palette)),
                    chunks[1],
                );
                f.render_widget(instructions("Esc: Back", &palette), chunks[2]);
            })?;

            if read_key()?.is_some() {
                return Ok(());
            }
        }
    }

    pub fn mood_tracker(&mut self, entries: &[DiaryEntry], theme: &Theme) -> Result<()> {
        let palette = theme.palette();
        let today = Local::now().date_naive();
        let breakdown = stats::mood_breakdown(entries);
        let mut range = TrendRange::Week;

        loop {
            let trend = stats::mood_trend(entries, range, today);
            let values: Vec<u64> = trend.iter().map(|p| u64::from(p.value)).collect();
            let span_label = match (trend.first(), trend.last()) {
                (Some(first), Some(last)) => format!(
                    "{} to {}",
                    first.date.format("%b %-d"),
                    last.date.format("%b %-d")
                ),
                _ => "No entries in this range".to_string(),
            };

            self.terminal.draw(|f| {
                paint_background(f, &palette);
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .margin(1)
                    .constraints([
                        Constraint::Length(3),
                        Constraint::Length(1),
                        Constraint::Length(8),
                        Constraint::Min(3),
                        Constraint::Length(3),
                    ])
                    .split(f.area());

                f.render_widget(title("Mood Tracker", &palette), chunks[0]);

                let tabs: Vec<Span> = TrendRange::ALL
                    .iter()
                    .map(|r| {
                        let style = if *r == range {
                            Style::default().fg(palette.background).bg(palette.primary)
                        } else {
                            Style::default().fg(palette.text)
                        };
                        Span::styled(format!(" {} ", r.label()), style)
                    })
                    .collect();
                f.render_widget(Paragraph::new(Line::from(tabs)), chunks[1]);

                let chart = Sparkline::default()
                    .block(bordered(&span_label, &palette))
                    .data(&values)
                    .max(5)
                    .style(Style::default().fg(palette.primary));
                f.render_widget(chart, chunks[2]);

                let mut lines: Vec<Line> = breakdown
                    .iter()
                    .map(|share| {
                        Line::from(format!(
                            "{} {:<9} {:>3} entries  {:>3}%",
                            share.mood.emoji(),
                            share.mood.as_str(),
                            share.count,
                            share.percentage
                        ))
                    })
                    .collect();
                if lines.is_empty() {
                    lines.push(Line::from(stats::NO_MOOD_DATA));
                }
                f.render_widget(
                    Paragraph::new(lines)
                        .style(Style::default().fg(palette.text))
                        .block(bordered("Mood Stats", &palette)),
                    chunks[3],
                );
                f.render_widget(
                    instructions("Left/Right: Change range, Esc: Back", &palette),
                    chunks[4],
                );
            })?;

            let Some(key) = read_key()? else {
                continue;
            };
            match key.code {
                KeyCode::Left => range = cycle(&TrendRange::ALL, &range, false),
                KeyCode::Right => range = cycle(&TrendRange::ALL, &range, true),
                KeyCode::Esc | KeyCode::Char('q') => return Ok(()),
                _ => {}
            }
        }
    }

    /// Theme picker with live preview of the highlighted theme.
    pub fn pick_theme(&mut self, current: &Theme) -> Result<Option<Theme>> {
        let catalog = Theme::catalog();
        let mut selected_index = catalog
            .iter()
            .position(|t| t.name == current.name)
            .unwrap_or(0);

        loop {
            let palette = catalog[selected_index].palette();
            self.terminal.draw(|f| {
                paint_background(f, &palette);
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .margin(1)
                    .constraints([
                        Constraint::Length(3),
                        Constraint::Min(3),
                        Constraint::Length(3),
                    ])
                    .split(f.area());

                f.render_widget(title("Choose a theme", &palette), chunks[0]);

                let items: Vec<ListItem> = catalog
                    .iter()
                    .map(|t| {
                        let p = t.palette();
                        let marker = if t.name == current.name { " (current)" } else { "" };
                        ListItem::new(Line::from(vec![
                            Span::styled("  ", Style::default().bg(p.background)),
                            Span::styled("  ", Style::default().bg(p.primary)),
                            Span::styled("  ", Style::default().bg(p.secondary)),
                            Span::styled("  ", Style::default().bg(p.text)),
                            Span::styled(
                                format!(" {}{}", t.name, marker),
                                Style::default().fg(palette.text),
                            ),
                        ]))
                    })
                    .collect();
                let list = List::new(items)
                    .block(bordered("Themes", &palette))
                    .highlight_style(Style::default().add_modifier(Modifier::BOLD))
                    .highlight_symbol("> ");
                f.render_stateful_widget(
                    list,
                    chunks[1],
                    &mut ListState::default().with_selected(Some(selected_index)),
                );

                f.render_widget(
                    instructions("Up/Down: Preview, Enter: Apply, Esc: Cancel", &palette),
                    chunks[2],
                );
            })?;

            let Some(key) = read_key()? else {
                continue;
            };
            match key.code {
                KeyCode::Up => selected_index = selected_index.saturating_sub(1),
                KeyCode::Down => {
                    if selected_index + 1 < catalog.len() {
                        selected_index += 1;
                    }
                }
                KeyCode::Enter => return Ok(Some(catalog[selected_index].clone())),
                KeyCode::Esc => return Ok(None),
                _ => {}
            }
        }
    }
}

impl Drop for UI {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

fn read_key() -> Result<Option<KeyEvent>> {
    match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => Ok(Some(key)),
        _ => Ok(None),
    }
}

fn is_ctrl(key: &KeyEvent, c: char) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(c)
}

/// Plain typing into a one-line buffer. Returns whether the key was used.
fn edit_line(buffer: &mut String, key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            buffer.push(c);
            true
        }
        KeyCode::Backspace => buffer.pop().is_some(),
        _ => false,
    }
}

fn handle_content_key(draft: &mut Draft, key: &KeyEvent) {
    let extend = key.modifiers.contains(KeyModifiers::SHIFT);
    let editor = &mut draft.editor;
    if is_ctrl(key, 't') {
        draft.toolbar_armed = true;
        return;
    }
    if is_ctrl(key, 'z') {
        editor.undo();
        return;
    }
    if is_ctrl(key, 'y') {
        editor.redo();
        return;
    }
    if is_ctrl(key, 'l') {
        editor.clear();
        return;
    }
    match key.code {
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            editor.insert_text(c.encode_utf8(&mut [0; 4]));
        }
        KeyCode::Enter => editor.insert_text("\n"),
        KeyCode::Backspace => {
            editor.delete_backward();
        }
        KeyCode::Delete => {
            editor.delete_forward();
        }
        KeyCode::Left => editor.move_left(extend),
        KeyCode::Right => editor.move_right(extend),
        KeyCode::Up => editor.move_up(extend),
        KeyCode::Down => editor.move_down(extend),
        KeyCode::Home => editor.move_home(extend),
        KeyCode::End => editor.move_end(extend),
        _ => {}
    }
}

fn toolbar_key(kind: FormatKind) -> char {
    match kind {
        FormatKind::Bold => 'b',
        FormatKind::Italic => 'i',
        FormatKind::Underline => 'u',
        FormatKind::Code => 'c',
        FormatKind::Heading1 => '1',
        FormatKind::Heading2 => '2',
        FormatKind::AlignLeft => 'l',
        FormatKind::AlignCenter => 'e',
        FormatKind::AlignRight => 'r',
        FormatKind::Blockquote => 'q',
        FormatKind::BulletList => '-',
        FormatKind::NumberedList => 'n',
        FormatKind::Link => 'k',
        FormatKind::Image => 'g',
        FormatKind::Record => 'v',
    }
}

fn toolbar_kind(key: &KeyEvent) -> Option<FormatKind> {
    let KeyCode::Char(c) = key.code else {
        return None;
    };
    FormatKind::TOOLBAR
        .iter()
        .copied()
        .find(|k| toolbar_key(*k) == c)
}

fn finish_draft(draft: Draft, existing: Option<&DiaryEntry>) -> DiaryEntry {
    let content = draft.editor.content().trim().to_string();
    let mut entry = match existing {
        Some(e) => e.clone(),
        None => DiaryEntry::new(String::new()),
    };
    entry.content = content;
    entry.mood = draft.mood;
    entry.tags = (!draft.tags.is_empty()).then_some(draft.tags);
    entry.category = draft.category;
    entry.voice_note = draft.voice_note;
    entry.images = (!draft.images.is_empty()).then_some(draft.images);
    entry
}

fn mood_options() -> Vec<Option<Mood>> {
    std::iter::once(None)
        .chain(Mood::ALL.iter().copied().map(Some))
        .collect()
}

/// Next (or previous) element after `current`, wrapping around.
fn cycle<T: Clone + PartialEq>(options: &[T], current: &T, forward: bool) -> T {
    let len = options.len();
    let index = options.iter().position(|o| o == current).unwrap_or(0);
    let next = if forward {
        (index + 1) % len
    } else {
        (index + len - 1) % len
    };
    options[next].clone()
}

fn parse_optional_date(text: &str) -> std::result::Result<Option<chrono::NaiveDate>, ()> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    crate::diary_entry::parse_date(text).map(Some).ok_or(())
}

fn paint_background(f: &mut Frame, palette: &Palette) {
    let background = Block::default().style(Style::default().bg(palette.background).fg(palette.text));
    f.render_widget(background, f.area());
}

fn title(text: &str, palette: &Palette) -> Paragraph<'static> {
    Paragraph::new(text.to_string())
        .style(
            Style::default()
                .fg(palette.primary)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
}

fn instructions(text: &str, palette: &Palette) -> Paragraph<'static> {
    Paragraph::new(text.to_string())
        .style(Style::default().fg(palette.primary).add_modifier(Modifier::ITALIC))
        .alignment(Alignment::Center)
}

fn bordered(text: &str, palette: &Palette) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.primary))
        .title(text.to_string())
}

fn field_block(label: &str, focused: bool, palette: &Palette) -> Block<'static> {
    let block = bordered(label, palette);
    if focused {
        block.border_style(
            Style::default()
                .fg(palette.primary)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED),
        )
    } else {
        block
    }
}

fn section(text: &str, palette: &Palette) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default()
            .fg(palette.primary)
            .add_modifier(Modifier::BOLD),
    ))
}

fn bar_line(label: &str, count: usize, max: usize, palette: &Palette) -> Line<'static> {
    const BAR_WIDTH: usize = 30;
    let filled = if max == 0 { 0 } else { count * BAR_WIDTH / max };
    Line::from(vec![
        Span::raw(format!("{label} ")),
        Span::styled("█".repeat(filled.max(1)), Style::default().fg(palette.primary)),
        Span::raw(format!(" {count}")),
    ])
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn query_status(query: &Query, diary_state: &DiaryState, shown: usize, total: usize) -> String {
    let filter = match query {
        Query::Simple { text, category } => {
            let mut parts = Vec::new();
            if !text.is_empty() {
                parts.push(format!("search \"{text}\""));
            }
            if let Some(id) = category {
                let name = diary_state
                    .category(id)
                    .map_or("Unknown", |c| c.name.as_str());
                parts.push(format!("category {name}"));
            }
            parts.join(", ")
        }
        Query::Advanced(_) => "advanced search".to_string(),
    };
    if filter.is_empty() {
        format!("{total} entries")
    } else {
        format!("Showing {shown} of {total} entries ({filter})")
    }
}

fn entry_item(
    entry: &DiaryEntry,
    diary_state: &DiaryState,
    width: usize,
    palette: &Palette,
) -> ListItem<'static> {
    let mood = entry.mood.map_or("  ", Mood::emoji);
    let mut meta = Vec::new();
    if !entry.tags().is_empty() {
        meta.push(format!("Tags: {}", entry.tags().join(", ")));
    }
    if let Some(id) = &entry.category {
        let name = diary_state
            .category(id)
            .map_or("Unknown", |c| c.name.as_str());
        meta.push(format!("Category: {name}"));
    }
    if !entry.images().is_empty() {
        meta.push(format!("{} image(s)", entry.images().len()));
    }
    if entry.voice_note.is_some() {
        meta.push("voice note".to_string());
    }

    let header = format!("[{}] {} ", entry.date, mood);
    let preview_width = width.saturating_sub(header.width());
    ListItem::new(vec![
        Line::from(vec![
            Span::styled(header, Style::default().fg(palette.primary)),
            Span::styled(
                markup::preview(&entry.content, preview_width),
                Style::default().fg(palette.text),
            ),
        ]),
        Line::from(Span::styled(
            markup::truncate(&meta.join(" · "), width),
            Style::default().fg(palette.text).add_modifier(Modifier::DIM),
        )),
    ])
}

fn entry_details(entry: &DiaryEntry, diary_state: &DiaryState, palette: &Palette) -> Vec<Line<'static>> {
    let label = Style::default().fg(palette.primary);
    let value = Style::default().fg(palette.text);
    let row = |name: &str, text: String| {
        Line::from(vec![
            Span::styled(format!("{name:<11}"), label),
            Span::styled(text, value),
        ])
    };
    let category = entry.category.as_ref().map_or("None".to_string(), |id| {
        diary_state
            .category(id)
            .map_or("Unknown".to_string(), |c| c.name.clone())
    });
    vec![
        row(
            "Mood",
            entry
                .mood
                .map_or("None".to_string(), |m| format!("{} {}", m.emoji(), m)),
        ),
        row("Tags", entry.tags().join(", ")),
        row("Category", category),
        row("Images", entry.images().len().to_string()),
        row(
            "Voice note",
            entry.voice_note.clone().unwrap_or_else(|| "None".to_string()),
        ),
    ]
}

fn draw_compose(
    f: &mut Frame,
    heading: &str,
    draft: &Draft,
    diary_state: &DiaryState,
    recording: bool,
    palette: &Palette,
) {
    paint_background(f, palette);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(6),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(f.area());

    f.render_widget(title(heading, palette), chunks[0]);
    render_toolbar(f, chunks[1], draft, palette);
    render_content(f, chunks[2], draft, palette);

    let mood = draft
        .mood
        .map_or("None".to_string(), |m| format!("{} {}", m.emoji(), m));
    f.render_widget(
        Paragraph::new(mood)
            .style(Style::default().fg(palette.text))
            .block(field_block("Mood (Left/Right)", draft.focus == DraftField::Mood, palette)),
        chunks[3],
    );

    let tags = if draft.tags.is_empty() {
        draft.tag_input.clone()
    } else {
        format!("[{}] {}", draft.tags.join("] ["), draft.tag_input)
    };
    let tags_width = tags.width();
    f.render_widget(
        Paragraph::new(tags)
            .style(Style::default().fg(palette.text))
            .block(field_block("Tags (Enter adds)", draft.focus == DraftField::Tags, palette)),
        chunks[4],
    );
    if draft.focus == DraftField::Tags {
        f.set_cursor_position((chunks[4].x + 1 + tags_width as u16, chunks[4].y + 1));
    }

    let category = draft.category.as_ref().map_or("None".to_string(), |id| {
        diary_state
            .category(id)
            .map_or("Unknown".to_string(), |c| c.name.clone())
    });
    let media = format!(
        "{}   Images: {}   Voice note: {}",
        category,
        draft.images.len(),
        if recording {
            "recording…"
        } else if draft.voice_note.is_some() {
            "attached"
        } else {
            "none"
        }
    );
    f.render_widget(
        Paragraph::new(media)
            .style(Style::default().fg(palette.text))
            .block(field_block(
                "Category (Left/Right) / Media",
                draft.focus == DraftField::Category,
                palette,
            )),
        chunks[5],
    );

    f.render_widget(
        instructions(
            "Ctrl+S: Save, Esc: Cancel, Tab: Next field, Ctrl+T: Format, Ctrl+Z/Y: Undo/Redo\n\
             Ctrl+G: Attach image, Ctrl+D: Remove image, Ctrl+R: Record, Ctrl+P: Play, Ctrl+L: Clear, Ctrl+O: Revert",
            palette,
        ),
        chunks[6],
    );
}

fn render_toolbar(f: &mut Frame, area: Rect, draft: &Draft, palette: &Palette) {
    let formats = draft.editor.formats();
    let spans: Vec<Span> = FormatKind::TOOLBAR
        .iter()
        .map(|kind| {
            let style = if formats.is_active(*kind) {
                Style::default().fg(palette.background).bg(palette.primary)
            } else {
                Style::default().fg(palette.text)
            };
            Span::styled(format!(" {}:{} ", toolbar_key(*kind), kind.label()), style)
        })
        .collect();
    let active: Vec<&str> = formats.active().map(|s| s.kind.label()).collect();
    let history = match (draft.editor.can_undo(), draft.editor.can_redo()) {
        (true, true) => "  undo/redo",
        (true, false) => "  undo",
        (false, true) => "  redo",
        (false, false) => "",
    };
    let heading = if draft.toolbar_armed {
        "Format: press a key".to_string()
    } else if active.is_empty() {
        format!("Toolbar (Ctrl+T){history}")
    } else {
        format!("Toolbar (Ctrl+T)  [{}]{history}", active.join(", "))
    };
    let toolbar = Paragraph::new(Line::from(spans))
        .wrap(Wrap { trim: true })
        .block(field_block(&heading, draft.toolbar_armed, palette));
    f.render_widget(toolbar, area);
}

fn render_content(f: &mut Frame, area: Rect, draft: &Draft, palette: &Palette) {
    let editor = &draft.editor;
    let content = editor.content();
    let caret = editor.caret();
    let row = content[..caret].matches('\n').count();
    let line_start = content[..caret].rfind('\n').map_or(0, |i| i + 1);
    let col = content[line_start..caret].width();

    let inner_width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2) as usize;
    let scroll_y = row.saturating_sub(inner_height.saturating_sub(1));
    let scroll_x = col.saturating_sub(inner_width.saturating_sub(1));

    let focused = draft.focus == DraftField::Content;
    let paragraph = Paragraph::new(editor_lines(content, editor.selection(), palette))
        .style(Style::default().fg(palette.text))
        .block(field_block("Content", focused, palette))
        .scroll((scroll_y as u16, scroll_x as u16));
    f.render_widget(paragraph, area);

    if focused {
        f.set_cursor_position((
            area.x + 1 + (col - scroll_x) as u16,
            area.y + 1 + (row - scroll_y) as u16,
        ));
    }
}

/// Raw content lines with the selection shown reversed.
fn editor_lines(content: &str, selection: Selection, palette: &Palette) -> Vec<Line<'static>> {
    let selected = Style::default()
        .fg(palette.text)
        .add_modifier(Modifier::REVERSED);
    let mut lines = Vec::new();
    let mut offset = 0;
    for raw in content.split('\n') {
        let start = offset;
        let end = offset + raw.len();
        let s = selection.start.clamp(start, end) - start;
        let e = selection.end.clamp(start, end) - start;
        let mut spans = Vec::new();
        if s > 0 {
            spans.push(Span::raw(raw[..s].to_string()));
        }
        if e > s {
            spans.push(Span::styled(raw[s..e].to_string(), selected));
        }
        if e < raw.len() {
            spans.push(Span::raw(raw[e..].to_string()));
        }
        lines.push(Line::from(spans));
        offset = end + 1;
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_wraps_both_ways() {
        let options = mood_options();
        assert_eq!(cycle(&options, &None, true), Some(Mood::Happy));
        assert_eq!(cycle(&options, &None, false), Some(Mood::Stressed));
        assert_eq!(cycle(&options, &Some(Mood::Stressed), true), None);
    }

    #[test]
    fn toolbar_keys_are_unique() {
        for kind in FormatKind::TOOLBAR {
            let key = KeyEvent::new(KeyCode::Char(toolbar_key(kind)), KeyModifiers::NONE);
            assert_eq!(toolbar_kind(&key), Some(kind));
        }
    }

    #[test]
    fn selection_is_split_across_lines() {
        let palette = Theme::default().palette();
        let lines = editor_lines("ab\ncd", Selection::new(1, 4), &palette);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans[1].content, "b");
        assert_eq!(lines[1].spans[0].content, "c");
        assert!(lines[1].spans[0].style.add_modifier.contains(Modifier::REVERSED));
    }

    #[test]
    fn optional_dates_accept_blank_and_iso() {
        assert_eq!(parse_optional_date(" "), Ok(None));
        assert!(parse_optional_date("2026-10-18").unwrap().is_some());
        assert!(parse_optional_date("tomorrow").is_err());
    }
}
