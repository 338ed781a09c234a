use crate::diary_entry::DiaryEntry;
use crate::error::{JournalError, Result};
use crate::theme::Theme;
use chrono::Local;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

pub trait Exporter {
    /// Turns a generated markup document into a shareable file.
    fn export(&mut self, document: &str) -> Result<PathBuf>;
}

/// Writes the document as an `.html` file in a fixed directory.
pub struct HtmlFileExporter {
    dir: PathBuf,
}

impl HtmlFileExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        HtmlFileExporter { dir: dir.into() }
    }
}

impl Exporter for HtmlFileExporter {
    fn export(&mut self, document: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| JournalError::storage(&self.dir, e))?;
        let path = self.dir.join(format!(
            "diary-export-{}.html",
            Local::now().format("%Y%m%d-%H%M%S")
        ));
        fs::write(&path, document).map_err(|e| JournalError::Export(format!("{}: {e}", path.display())))?;
        tracing::info!("Exported journal to {}", path.display());
        Ok(path)
    }
}

/// Builds the export document. Entry content is already markup and is embedded
/// as-is; everything else is escaped.
pub fn render_document(entries: &[DiaryEntry], theme: &Theme) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n\
         body {{ font-family: Arial, sans-serif; }}\n\
         h1 {{ color: {}; }}\n\
         .entry {{ margin-bottom: 20px; border-bottom: 1px solid #ccc; padding-bottom: 10px; }}\n\
         .date {{ font-weight: bold; }}\n\
         .content {{ margin-top: 5px; }}\n\
         </style>\n</head>\n<body>\n<h1>My Diary Entries</h1>\n",
        escape(&theme.primary_color)
    );
    for entry in entries {
        html.push_str("<div class=\"entry\">\n");
        let _ = writeln!(html, "<div class=\"date\">{}</div>", escape(&entry.date));
        let _ = writeln!(html, "<div class=\"content\">{}</div>", entry.content);
        if let Some(mood) = entry.mood {
            let _ = writeln!(html, "<div>Mood: {}</div>", mood);
        }
        if !entry.tags().is_empty() {
            let _ = writeln!(html, "<div>Tags: {}</div>", escape(&entry.tags().join(", ")));
        }
        html.push_str("</div>\n");
    }
    html.push_str("</body>\n</html>\n");
    html
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diary_entry::Mood;
    use tempfile::TempDir;

    fn sample() -> Vec<DiaryEntry> {
        let mut entry = DiaryEntry::new("<b>Great</b> day".to_string());
        entry.date = "October 18, 2026".to_string();
        entry.mood = Some(Mood::Excited);
        entry.tags = Some(vec!["fun".into(), "<x>".into()]);
        vec![entry, DiaryEntry::new("plain".to_string())]
    }

    #[test]
    fn document_lists_every_entry() {
        let html = render_document(&sample(), &Theme::default());
        assert!(html.contains("h1 { color: #3b82f6; }"));
        assert!(html.contains("<div class=\"content\"><b>Great</b> day</div>"));
        assert!(html.contains("<div>Mood: excited</div>"));
        assert!(html.contains("<div>Tags: fun, &lt;x&gt;</div>"));
        assert_eq!(html.matches("<div class=\"entry\">").count(), 2);
        assert_eq!(html.matches("Mood:").count(), 1);
    }

    #[test]
    fn exporter_writes_html_file() {
        let temp = TempDir::new().unwrap();
        let mut exporter = HtmlFileExporter::new(temp.path().join("out"));
        let path = exporter.export("<html></html>").unwrap();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("html"));
        assert_eq!(fs::read_to_string(path).unwrap(), "<html></html>");
    }
}
