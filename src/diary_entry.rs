use chrono::{DateTime, Local, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Display format used for `DiaryEntry::date`, e.g. "October 18, 2026".
pub const DATE_FORMAT: &str = "%B %-d, %Y";

const PARSE_FORMATS: [&str; 3] = ["%B %d, %Y", "%Y-%m-%d", "%m/%d/%Y"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Neutral,
    Sad,
    Excited,
    Calm,
    Stressed,
}

impl Mood {
    pub const ALL: [Mood; 6] = [
        Mood::Happy,
        Mood::Neutral,
        Mood::Sad,
        Mood::Excited,
        Mood::Calm,
        Mood::Stressed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Neutral => "neutral",
            Mood::Sad => "sad",
            Mood::Excited => "excited",
            Mood::Calm => "calm",
            Mood::Stressed => "stressed",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Mood::Happy => "😄",
            Mood::Neutral => "😐",
            Mood::Sad => "😔",
            Mood::Excited => "🎉",
            Mood::Calm => "🧘",
            Mood::Stressed => "😰",
        }
    }

    /// Position on the mood trend chart, happiest highest.
    pub fn value(self) -> u8 {
        match self {
            Mood::Happy => 5,
            Mood::Excited => 4,
            Mood::Calm => 3,
            Mood::Neutral => 2,
            Mood::Stressed => 1,
            Mood::Sad => 0,
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiaryEntry {
    pub id: String,
    pub date: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl DiaryEntry {
    pub fn new(content: String) -> Self {
        let now = Local::now();
        DiaryEntry {
            id: id_for(now),
            date: format_date(now.date_naive()),
            content,
            mood: None,
            tags: None,
            category: None,
            voice_note: None,
            images: None,
        }
    }

    /// Calendar day of the entry, if its display date can be read back.
    pub fn day(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }

    pub fn tags(&self) -> &[String] {
        self.tags.as_deref().unwrap_or(&[])
    }

    pub fn images(&self) -> &[String] {
        self.images.as_deref().unwrap_or(&[])
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags().iter().any(|t| t == tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: String,
}

impl Category {
    pub fn new(name: String) -> Self {
        let color: u32 = rand::thread_rng().gen_range(0..=0xFF_FFFF);
        Category {
            id: id_for(Local::now()),
            name,
            color: format!("#{:06x}", color),
        }
    }
}

pub fn id_for(at: DateTime<Local>) -> String {
    at.timestamp_millis().to_string()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    PARSE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_date_reads_back() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        let shown = format_date(date);
        assert_eq!(shown, "March 7, 2026");
        assert_eq!(parse_date(&shown), Some(date));
        assert_eq!(parse_date("2026-03-07"), Some(date));
        assert_eq!(parse_date("someday"), None);
    }

    #[test]
    fn entry_json_uses_collection_field_names() {
        let mut entry = DiaryEntry::new("hello".to_string());
        entry.id = "1".to_string();
        entry.date = "March 7, 2026".to_string();
        entry.mood = Some(Mood::Calm);
        entry.voice_note = Some("file:///tmp/a.wav".to_string());

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["mood"], "calm");
        assert_eq!(json["voiceNote"], "file:///tmp/a.wav");
        assert!(json.get("tags").is_none());

        let back: DiaryEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn category_color_is_hex() {
        let category = Category::new("Work".to_string());
        assert_eq!(category.color.len(), 7);
        assert!(category.color.starts_with('#'));
        assert!(u32::from_str_radix(&category.color[1..], 16).is_ok());
    }
}
