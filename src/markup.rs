use crate::editor::{tokenize, FormatKind, Marker};
use crate::theme::Palette;
use ratatui::{
    layout::Alignment,
    style::{Modifier, Style},
    text::{Line, Span},
};
use unicode_width::UnicodeWidthChar;

const IMAGE_PLACEHOLDER: &str = "[image]";

/// Renders tagged content as styled terminal lines.
pub fn render(content: &str, palette: &Palette) -> Vec<Line<'static>> {
    let mut renderer = Renderer {
        palette,
        active: Vec::new(),
        spans: Vec::new(),
        alignment: None,
        lines: Vec::new(),
    };
    let mut pos = 0;
    for token in tokenize(content) {
        renderer.push_text(&content[pos..token.range.start]);
        match token.marker {
            Marker::Open => renderer.active.push(token.kind),
            Marker::Close => {
                if let Some(i) = renderer.active.iter().rposition(|k| *k == token.kind) {
                    renderer.active.remove(i);
                }
            }
        }
        pos = token.range.end;
    }
    renderer.push_text(&content[pos..]);
    renderer.finish_line();
    renderer.lines
}

struct Renderer<'a> {
    palette: &'a Palette,
    active: Vec<FormatKind>,
    spans: Vec<Span<'static>>,
    alignment: Option<Alignment>,
    lines: Vec<Line<'static>>,
}

impl Renderer<'_> {
    fn push_text(&mut self, text: &str) {
        let style = style_for(&self.active, self.palette);
        let mut parts = text.split('\n').peekable();
        while let Some(part) = parts.next() {
            if !part.is_empty() {
                if let Some(alignment) = alignment_for(&self.active) {
                    self.alignment = Some(alignment);
                }
                self.spans.push(Span::styled(replace_images(part), style));
            }
            if parts.peek().is_some() {
                self.finish_line();
            }
        }
    }

    fn finish_line(&mut self) {
        let line = Line::from(std::mem::take(&mut self.spans))
            .alignment(self.alignment.take().unwrap_or(Alignment::Left));
        self.lines.push(line);
    }
}

fn style_for(active: &[FormatKind], palette: &Palette) -> Style {
    let mut style = Style::default().fg(palette.text);
    for kind in active {
        style = match kind {
            FormatKind::Bold => style.add_modifier(Modifier::BOLD),
            FormatKind::Italic | FormatKind::Blockquote => style.add_modifier(Modifier::ITALIC),
            FormatKind::Underline => style.add_modifier(Modifier::UNDERLINED),
            FormatKind::Code => style.fg(palette.secondary),
            FormatKind::Heading1 | FormatKind::Heading2 => {
                style.fg(palette.primary).add_modifier(Modifier::BOLD)
            }
            FormatKind::Link => style.fg(palette.primary).add_modifier(Modifier::UNDERLINED),
            _ => style,
        };
    }
    style
}

fn alignment_for(active: &[FormatKind]) -> Option<Alignment> {
    active.iter().rev().find_map(|k| match k {
        FormatKind::AlignLeft => Some(Alignment::Left),
        FormatKind::AlignCenter => Some(Alignment::Center),
        FormatKind::AlignRight => Some(Alignment::Right),
        _ => None,
    })
}

fn replace_images(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("<img ") {
        out.push_str(&rest[..start]);
        match rest[start..].find('>') {
            Some(end) => {
                out.push_str(IMAGE_PLACEHOLDER);
                rest = &rest[start + end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Content with every known marker removed and images replaced by a placeholder.
pub fn plain_text(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut pos = 0;
    for token in tokenize(content) {
        out.push_str(&content[pos..token.range.start]);
        pos = token.range.end;
    }
    out.push_str(&content[pos..]);
    replace_images(&out)
}

/// First non-empty line of the plain text, cut to `width` terminal columns.
pub fn preview(content: &str, width: usize) -> String {
    let plain = plain_text(content);
    let first = plain.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    truncate(first.trim(), width)
}

pub fn truncate(text: &str, width: usize) -> String {
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            if width > 0 {
                out.pop();
                out.push('…');
            }
            return out;
        }
        used += w;
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Theme;

    #[test]
    fn plain_text_strips_markers_and_images() {
        let content = "<h1>Day</h1>\nwent <b>well</b> <img src=\"x\" alt=\"Inserted image\" />";
        assert_eq!(plain_text(content), "Day\nwent well [image]");
    }

    #[test]
    fn preview_uses_first_non_empty_line() {
        assert_eq!(preview("\n  <i>morning</i> walk\nmore", 40), "morning walk");
        assert_eq!(preview("abcdef", 4), "abc…");
    }

    #[test]
    fn render_styles_spans_and_splits_lines() {
        let palette = Theme::default().palette();
        let lines = render("plain <b>bold</b>\n<align-center>mid</align-center>", &palette);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans.len(), 2);
        assert!(lines[0].spans[1].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(lines[1].alignment, Some(Alignment::Center));
        assert_eq!(lines[1].spans[0].content, "mid");
    }
}
