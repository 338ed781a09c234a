//! Inline tag formatter for entry content.
//!
//! Content is a flat string annotated with paired markers such as `<b>...</b>`.
//! The editor tracks a selection, which formats enclose it, and a linear
//! snapshot history for undo/redo.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    Bold,
    Italic,
    Underline,
    Code,
    Heading1,
    Heading2,
    AlignLeft,
    AlignCenter,
    AlignRight,
    Blockquote,
    BulletList,
    NumberedList,
    Link,
    Image,
    Record,
}

impl FormatKind {
    /// Toolbar order. Format detection scans kinds in this order.
    pub const TOOLBAR: [FormatKind; 15] = [
        FormatKind::Bold,
        FormatKind::Italic,
        FormatKind::Underline,
        FormatKind::Code,
        FormatKind::Heading1,
        FormatKind::Heading2,
        FormatKind::AlignLeft,
        FormatKind::AlignCenter,
        FormatKind::AlignRight,
        FormatKind::Blockquote,
        FormatKind::BulletList,
        FormatKind::NumberedList,
        FormatKind::Link,
        FormatKind::Image,
        FormatKind::Record,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            FormatKind::Bold => "b",
            FormatKind::Italic => "i",
            FormatKind::Underline => "u",
            FormatKind::Code => "code",
            FormatKind::Heading1 => "h1",
            FormatKind::Heading2 => "h2",
            FormatKind::AlignLeft => "align-left",
            FormatKind::AlignCenter => "align-center",
            FormatKind::AlignRight => "align-right",
            FormatKind::Blockquote => "blockquote",
            FormatKind::BulletList => "ul",
            FormatKind::NumberedList => "ol",
            FormatKind::Link => "link",
            FormatKind::Image => "image",
            FormatKind::Record => "record",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FormatKind::Bold => "Bold",
            FormatKind::Italic => "Italic",
            FormatKind::Underline => "Underline",
            FormatKind::Code => "Code",
            FormatKind::Heading1 => "Heading 1",
            FormatKind::Heading2 => "Heading 2",
            FormatKind::AlignLeft => "Align Left",
            FormatKind::AlignCenter => "Center",
            FormatKind::AlignRight => "Align Right",
            FormatKind::Blockquote => "Quote",
            FormatKind::BulletList => "Bullet List",
            FormatKind::NumberedList => "Numbered List",
            FormatKind::Link => "Insert Link",
            FormatKind::Image => "Insert Image",
            FormatKind::Record => "Record Audio",
        }
    }

    /// `Image` and `Record` trigger media actions instead of wrapping text.
    pub fn is_marker(self) -> bool {
        !matches!(self, FormatKind::Image | FormatKind::Record)
    }

    pub fn from_tag(tag: &str) -> Option<FormatKind> {
        FormatKind::TOOLBAR
            .iter()
            .copied()
            .find(|k| k.is_marker() && k.tag() == tag)
    }

    pub fn open_marker(self) -> String {
        format!("<{}>", self.tag())
    }

    pub fn close_marker(self) -> String {
        format!("</{}>", self.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn new(a: usize, b: usize) -> Self {
        Selection {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn caret(at: usize) -> Self {
        Selection { start: at, end: at }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpan {
    pub kind: FormatKind,
    pub active: bool,
    /// Byte range covering both markers, present when active.
    pub range: Option<Range<usize>>,
}

/// Result of format detection for one selection, one span per marker kind.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Formats {
    spans: Vec<FormatSpan>,
}

impl Formats {
    pub fn get(&self, kind: FormatKind) -> Option<&FormatSpan> {
        self.spans.iter().find(|s| s.kind == kind)
    }

    pub fn is_active(&self, kind: FormatKind) -> bool {
        self.get(kind).is_some_and(|s| s.active)
    }

    pub fn active(&self) -> impl Iterator<Item = &FormatSpan> {
        self.spans.iter().filter(|s| s.active)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Open,
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub range: Range<usize>,
    pub kind: FormatKind,
    pub marker: Marker,
}

/// A matched open/close marker pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerPair {
    pub kind: FormatKind,
    pub open: Range<usize>,
    pub close: Range<usize>,
}

impl MarkerPair {
    pub fn span(&self) -> Range<usize> {
        self.open.start..self.close.end
    }
}

/// Lists every known marker in `content`, in position order.
pub fn tokenize(content: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut from = 0;
    while let Some(offset) = content[from..].find('<') {
        let start = from + offset;
        from = start + 1;
        let rest = &content[start + 1..];
        let (marker, name_start) = match rest.strip_prefix('/') {
            Some(_) => (Marker::Close, start + 2),
            None => (Marker::Open, start + 1),
        };
        let Some(len) = content[name_start..].find('>') else {
            break;
        };
        if let Some(kind) = FormatKind::from_tag(&content[name_start..name_start + len]) {
            let end = name_start + len + 1;
            tokens.push(Token {
                range: start..end,
                kind,
                marker,
            });
            from = end;
        }
    }
    tokens
}

/// Pairs markers with a stack per kind. Stray closes and unclosed opens are
/// left out.
pub fn pair_markers(tokens: &[Token]) -> Vec<MarkerPair> {
    let mut open: Vec<(FormatKind, Vec<Range<usize>>)> = Vec::new();
    let mut pairs = Vec::new();
    for token in tokens {
        let slot = match open.iter().position(|(k, _)| *k == token.kind) {
            Some(i) => i,
            None => {
                open.push((token.kind, Vec::new()));
                open.len() - 1
            }
        };
        let stack = &mut open[slot].1;
        match token.marker {
            Marker::Open => stack.push(token.range.clone()),
            Marker::Close => {
                if let Some(opened) = stack.pop() {
                    pairs.push(MarkerPair {
                        kind: token.kind,
                        open: opened,
                        close: token.range.clone(),
                    });
                }
            }
        }
    }
    pairs
}

/// For each marker kind, the innermost pair whose open marker starts at or
/// before `range.start` and whose close marker starts at or after `range.end`.
pub fn parse_formats(content: &str, range: Selection) -> Formats {
    let pairs = pair_markers(&tokenize(content));
    let spans = FormatKind::TOOLBAR
        .iter()
        .copied()
        .filter(|k| k.is_marker())
        .map(|kind| {
            let enclosing = pairs
                .iter()
                .filter(|p| {
                    p.kind == kind && p.open.start <= range.start && p.close.start >= range.end
                })
                .max_by_key(|p| p.open.start);
            FormatSpan {
                kind,
                active: enclosing.is_some(),
                range: enclosing.map(MarkerPair::span),
            }
        })
        .collect();
    Formats { spans }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaAction {
    InsertImage,
    ToggleRecording,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatOutcome {
    Wrapped,
    Unwrapped,
    /// The kind is handled by the caller; the buffer was not touched.
    Delegated(MediaAction),
}

pub const IMAGE_ALT: &str = "Inserted image";

pub struct Editor {
    content: String,
    anchor: usize,
    caret: usize,
    formats: Formats,
    history: Vec<String>,
    history_index: usize,
}

impl Editor {
    pub fn new(initial: &str) -> Self {
        let mut editor = Editor {
            content: initial.to_string(),
            anchor: initial.len(),
            caret: initial.len(),
            formats: Formats::default(),
            history: vec![initial.to_string()],
            history_index: 0,
        };
        editor.refresh_formats();
        editor
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn selection(&self) -> Selection {
        Selection::new(self.anchor, self.caret)
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn formats(&self) -> &Formats {
        &self.formats
    }

    pub fn can_undo(&self) -> bool {
        self.history_index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.history_index + 1 < self.history.len()
    }

    pub fn set_selection(&mut self, anchor: usize, caret: usize) {
        self.anchor = clamp(&self.content, anchor);
        self.caret = clamp(&self.content, caret);
        self.refresh_formats();
    }

    pub fn move_left(&mut self, extend: bool) {
        let target = prev_boundary(&self.content, self.caret);
        self.move_caret(target, extend);
    }

    pub fn move_right(&mut self, extend: bool) {
        let target = next_boundary(&self.content, self.caret);
        self.move_caret(target, extend);
    }

    pub fn move_home(&mut self, extend: bool) {
        let target = self.content[..self.caret].rfind('\n').map_or(0, |i| i + 1);
        self.move_caret(target, extend);
    }

    pub fn move_end(&mut self, extend: bool) {
        let target = self.content[self.caret..]
            .find('\n')
            .map_or(self.content.len(), |i| self.caret + i);
        self.move_caret(target, extend);
    }

    pub fn move_up(&mut self, extend: bool) {
        let line_start = self.content[..self.caret].rfind('\n').map_or(0, |i| i + 1);
        if line_start == 0 {
            self.move_caret(0, extend);
            return;
        }
        let column = self.content[line_start..self.caret].chars().count();
        let prev_start = self.content[..line_start - 1]
            .rfind('\n')
            .map_or(0, |i| i + 1);
        let target = advance_chars(&self.content, prev_start, line_start - 1, column);
        self.move_caret(target, extend);
    }

    pub fn move_down(&mut self, extend: bool) {
        let Some(offset) = self.content[self.caret..].find('\n') else {
            self.move_caret(self.content.len(), extend);
            return;
        };
        let line_start = self.content[..self.caret].rfind('\n').map_or(0, |i| i + 1);
        let column = self.content[line_start..self.caret].chars().count();
        let next_start = self.caret + offset + 1;
        let next_end = self.content[next_start..]
            .find('\n')
            .map_or(self.content.len(), |i| next_start + i);
        let target = advance_chars(&self.content, next_start, next_end, column);
        self.move_caret(target, extend);
    }

    fn move_caret(&mut self, target: usize, extend: bool) {
        self.caret = target;
        if !extend {
            self.anchor = target;
        }
        self.refresh_formats();
    }

    /// Replaces the selection with `text`, leaving the caret after it.
    pub fn insert_text(&mut self, text: &str) {
        let sel = self.selection();
        let mut next = String::with_capacity(self.content.len() + text.len());
        next.push_str(&self.content[..sel.start]);
        next.push_str(text);
        next.push_str(&self.content[sel.end..]);
        let caret = sel.start + text.len();
        self.commit(next, caret, caret);
    }

    pub fn delete_backward(&mut self) -> bool {
        let sel = self.selection();
        let range = if sel.is_empty() {
            if sel.start == 0 {
                return false;
            }
            prev_boundary(&self.content, sel.start)..sel.start
        } else {
            sel.start..sel.end
        };
        self.delete_range(range);
        true
    }

    pub fn delete_forward(&mut self) -> bool {
        let sel = self.selection();
        let range = if sel.is_empty() {
            if sel.end >= self.content.len() {
                return false;
            }
            sel.start..next_boundary(&self.content, sel.start)
        } else {
            sel.start..sel.end
        };
        self.delete_range(range);
        true
    }

    fn delete_range(&mut self, range: Range<usize>) {
        let mut next = self.content.clone();
        next.replace_range(range.clone(), "");
        self.commit(next, range.start, range.start);
    }

    /// Toggles `kind` over the selection: unwraps the enclosing pair when the
    /// format is active, otherwise wraps the selection in a new pair.
    pub fn apply_format(&mut self, kind: FormatKind) -> FormatOutcome {
        match kind {
            FormatKind::Image => return FormatOutcome::Delegated(MediaAction::InsertImage),
            FormatKind::Record => return FormatOutcome::Delegated(MediaAction::ToggleRecording),
            _ => {}
        }

        let open = kind.open_marker();
        let close = kind.close_marker();
        let active = self
            .formats
            .get(kind)
            .filter(|s| s.active)
            .and_then(|s| s.range.clone());

        match active {
            Some(span) => {
                let inner = span.start + open.len()..span.end - close.len();
                let mut next = String::with_capacity(self.content.len());
                next.push_str(&self.content[..span.start]);
                next.push_str(&self.content[inner.clone()]);
                next.push_str(&self.content[span.end..]);
                let shift = |p: usize| {
                    if p >= span.end {
                        p - open.len() - close.len()
                    } else if p > inner.end {
                        inner.end - open.len()
                    } else if p >= inner.start {
                        p - open.len()
                    } else {
                        p.min(span.start)
                    }
                };
                let (anchor, caret) = (shift(self.anchor), shift(self.caret));
                self.commit(next, anchor, caret);
                FormatOutcome::Unwrapped
            }
            None => {
                let sel = self.selection();
                let mut next = String::with_capacity(self.content.len() + open.len() + close.len());
                next.push_str(&self.content[..sel.start]);
                next.push_str(&open);
                next.push_str(&self.content[sel.start..sel.end]);
                next.push_str(&close);
                next.push_str(&self.content[sel.end..]);
                let (anchor, caret) = (self.anchor + open.len(), self.caret + open.len());
                self.commit(next, anchor, caret);
                FormatOutcome::Wrapped
            }
        }
    }

    /// Replaces the selection with an image tag for `reference`.
    pub fn insert_image(&mut self, reference: &str) {
        let tag = format!("<img src=\"{reference}\" alt=\"{IMAGE_ALT}\" />");
        self.insert_text(&tag);
    }

    pub fn set_content_html(&mut self, html: &str) {
        let end = html.len();
        self.commit(html.to_string(), end, end);
    }

    pub fn clear(&mut self) {
        self.commit(String::new(), 0, 0);
    }

    pub fn undo(&mut self) -> bool {
        if self.history_index == 0 {
            return false;
        }
        self.history_index -= 1;
        self.restore();
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.history_index += 1;
        self.restore();
        true
    }

    fn restore(&mut self) {
        self.content = self.history[self.history_index].clone();
        self.anchor = clamp(&self.content, self.anchor);
        self.caret = clamp(&self.content, self.caret);
        self.refresh_formats();
    }

    fn commit(&mut self, next: String, anchor: usize, caret: usize) {
        self.history.truncate(self.history_index + 1);
        self.history.push(next.clone());
        self.history_index = self.history.len() - 1;
        self.content = next;
        self.anchor = clamp(&self.content, anchor);
        self.caret = clamp(&self.content, caret);
        self.refresh_formats();
    }

    fn refresh_formats(&mut self) {
        self.formats = parse_formats(&self.content, self.selection());
    }
}

fn clamp(content: &str, pos: usize) -> usize {
    let mut pos = pos.min(content.len());
    while !content.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

fn prev_boundary(content: &str, pos: usize) -> usize {
    content[..pos].char_indices().last().map_or(0, |(i, _)| i)
}

fn next_boundary(content: &str, pos: usize) -> usize {
    content[pos..]
        .chars()
        .next()
        .map_or(pos, |c| pos + c.len_utf8())
}

fn advance_chars(content: &str, from: usize, limit: usize, count: usize) -> usize {
    content[from..limit]
        .char_indices()
        .nth(count)
        .map_or(limit, |(i, _)| from + i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor_with(content: &str, start: usize, end: usize) -> Editor {
        let mut editor = Editor::new(content);
        editor.set_selection(start, end);
        editor
    }

    #[test]
    fn parse_formats_finds_enclosing_pair() {
        let content = "say <b>hello</b> there";
        let formats = parse_formats(content, Selection::new(8, 10));
        let bold = formats.get(FormatKind::Bold).unwrap();
        assert!(bold.active);
        assert_eq!(bold.range, Some(4..16));
        assert!(!formats.is_active(FormatKind::Italic));

        let outside = parse_formats(content, Selection::new(17, 20));
        assert!(!outside.is_active(FormatKind::Bold));
    }

    #[test]
    fn parse_formats_is_deterministic() {
        let content = "<i>a <b>b</b></i> <u>c</u>";
        let sel = Selection::new(8, 8);
        assert_eq!(parse_formats(content, sel), parse_formats(content, sel));
        assert!(parse_formats(content, sel).is_active(FormatKind::Italic));
    }

    #[test]
    fn nested_same_kind_pairs_pick_innermost() {
        let content = "<b>x <b>y</b> z</b>";
        let inner = parse_formats(content, Selection::caret(8));
        assert_eq!(inner.get(FormatKind::Bold).unwrap().range, Some(5..13));

        let outer = parse_formats(content, Selection::caret(15));
        assert_eq!(outer.get(FormatKind::Bold).unwrap().range, Some(0..19));
    }

    #[test]
    fn unbalanced_markers_are_inactive() {
        let formats = parse_formats("<b>never closed", Selection::caret(5));
        assert!(!formats.is_active(FormatKind::Bold));
        let formats = parse_formats("stray</i> close", Selection::caret(2));
        assert!(!formats.is_active(FormatKind::Italic));
    }

    #[test]
    fn tokenizer_ignores_unknown_tags() {
        let tokens = tokenize("<img src=\"x\" /> <h1>t</h1> <p>");
        let kinds: Vec<_> = tokens.iter().map(|t| (t.kind, t.marker)).collect();
        assert_eq!(
            kinds,
            vec![
                (FormatKind::Heading1, Marker::Open),
                (FormatKind::Heading1, Marker::Close)
            ]
        );
    }

    #[test]
    fn wrap_then_unwrap_restores_content() {
        let mut editor = editor_with("hello world", 0, 5);
        assert_eq!(editor.apply_format(FormatKind::Bold), FormatOutcome::Wrapped);
        assert_eq!(editor.content(), "<b>hello</b> world");
        assert_eq!(editor.selection(), Selection::new(3, 8));
        assert!(editor.formats().is_active(FormatKind::Bold));

        assert_eq!(editor.apply_format(FormatKind::Bold), FormatOutcome::Unwrapped);
        assert_eq!(editor.content(), "hello world");
        assert_eq!(editor.selection(), Selection::new(0, 5));
        assert!(!editor.formats().is_active(FormatKind::Bold));
    }

    #[test]
    fn empty_selection_wraps_an_empty_span() {
        let mut editor = Editor::new("note: ");
        editor.apply_format(FormatKind::Code);
        assert_eq!(editor.content(), "note: <code></code>");
        assert_eq!(editor.caret(), 12);
        assert!(editor.formats().is_active(FormatKind::Code));
        editor.insert_text("x");
        assert_eq!(editor.content(), "note: <code>x</code>");
    }

    #[test]
    fn media_kinds_are_delegated_without_history() {
        let mut editor = Editor::new("text");
        assert_eq!(
            editor.apply_format(FormatKind::Image),
            FormatOutcome::Delegated(MediaAction::InsertImage)
        );
        assert_eq!(
            editor.apply_format(FormatKind::Record),
            FormatOutcome::Delegated(MediaAction::ToggleRecording)
        );
        assert_eq!(editor.content(), "text");
        assert!(!editor.can_undo());
    }

    #[test]
    fn undo_and_redo_step_through_snapshots() {
        let mut editor = editor_with("abc", 1, 2);
        editor.apply_format(FormatKind::Italic);
        let formatted = editor.content().to_string();

        assert!(editor.undo());
        assert_eq!(editor.content(), "abc");
        assert!(!editor.undo());

        assert!(editor.redo());
        assert_eq!(editor.content(), formatted);
        assert!(!editor.redo());
    }

    #[test]
    fn new_edit_truncates_redo_entries() {
        let mut editor = Editor::new("");
        editor.insert_text("a");
        editor.insert_text("b");
        editor.undo();
        editor.insert_text("c");
        assert_eq!(editor.content(), "ac");
        assert!(!editor.redo());
        editor.undo();
        assert_eq!(editor.content(), "a");
    }

    #[test]
    fn one_history_entry_per_format_and_none_for_selection() {
        let mut editor = Editor::new("abc");
        editor.set_selection(0, 3);
        editor.move_left(false);
        assert!(!editor.can_undo());
        editor.set_selection(0, 3);
        editor.apply_format(FormatKind::Underline);
        assert!(editor.undo());
        assert!(!editor.undo());
    }

    #[test]
    fn set_content_and_clear_are_recorded() {
        let mut editor = Editor::new("old");
        editor.set_content_html("<h1>new</h1>");
        editor.clear();
        assert_eq!(editor.content(), "");
        editor.undo();
        assert_eq!(editor.content(), "<h1>new</h1>");
        editor.undo();
        assert_eq!(editor.content(), "old");
    }

    #[test]
    fn insert_image_replaces_selection() {
        let mut editor = editor_with("see pic", 4, 7);
        editor.insert_image("data:image/png;base64,AAA");
        assert_eq!(
            editor.content(),
            "see <img src=\"data:image/png;base64,AAA\" alt=\"Inserted image\" />"
        );
    }

    #[test]
    fn deletes_respect_char_boundaries() {
        let mut editor = Editor::new("héllo");
        editor.set_selection(3, 3);
        assert!(editor.delete_backward());
        assert_eq!(editor.content(), "hllo");
        editor.set_selection(0, 0);
        assert!(!editor.delete_backward());
        assert!(editor.delete_forward());
        assert_eq!(editor.content(), "llo");
    }

    #[test]
    fn vertical_moves_keep_column() {
        let mut editor = Editor::new("abcd\nxy\nlonger");
        editor.set_selection(3, 3);
        editor.move_down(false);
        assert_eq!(editor.caret(), 7);
        editor.move_down(false);
        assert_eq!(editor.caret(), 10);
        editor.move_up(false);
        editor.move_up(false);
        assert_eq!(editor.caret(), 2);
    }
}
