use ratatui::style::Color;
use serde::{Deserialize, Serialize};

/// A named colour palette. Stored as `#rrggbb` strings so the theme blob keeps
/// the same shape as the other collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub name: String,
    pub background_color: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub text_color: String,
}

/// Terminal colours resolved from a `Theme`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Color,
    pub primary: Color,
    pub secondary: Color,
    pub text: Color,
}

impl Theme {
    fn from_hex(name: &str, background: &str, primary: &str, secondary: &str, text: &str) -> Self {
        Theme {
            name: name.to_string(),
            background_color: background.to_string(),
            primary_color: primary.to_string(),
            secondary_color: secondary.to_string(),
            text_color: text.to_string(),
        }
    }

    /// The themes offered by the theme picker.
    pub fn catalog() -> Vec<Theme> {
        vec![
            Theme::from_hex("Light", "#ffffff", "#0062ff", "#e8f0fe", "#18181b"),
            Theme::from_hex("Dark", "#121212", "#60a5fa", "#27272a", "#fafafa"),
            Theme::from_hex("Sepia", "#fdf6e9", "#9c4221", "#eaddc7", "#433127"),
            Theme::from_hex("Ocean", "#f0f9ff", "#0369a1", "#bae6fd", "#0c4a6e"),
            Theme::from_hex("Forest", "#f1f8f4", "#166534", "#bbf7d0", "#14532d"),
            Theme::from_hex("Purple", "#faf5ff", "#7e22ce", "#e9d5ff", "#581c87"),
            Theme::from_hex("Sunset", "#fff7ed", "#c2410c", "#fed7aa", "#7c2d12"),
        ]
    }

    /// All four colours parse as `#rrggbb`.
    pub fn is_valid(&self) -> bool {
        [
            &self.background_color,
            &self.primary_color,
            &self.secondary_color,
            &self.text_color,
        ]
        .iter()
        .all(|c| parse_hex(c).is_some())
    }

    pub fn palette(&self) -> Palette {
        Palette {
            background: parse_hex(&self.background_color).unwrap_or(Color::Reset),
            primary: parse_hex(&self.primary_color).unwrap_or(Color::Cyan),
            secondary: parse_hex(&self.secondary_color).unwrap_or(Color::Gray),
            text: parse_hex(&self.text_color).unwrap_or(Color::Reset),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::from_hex("Light", "#ffffff", "#3b82f6", "#e2e8f0", "#1a202c")
    }
}

pub fn parse_hex(s: &str) -> Option<Color> {
    let hex = s.trim().strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_hex("#0062ff"), Some(Color::Rgb(0, 0x62, 0xff)));
        assert_eq!(parse_hex(" #FFFFFF "), Some(Color::Rgb(255, 255, 255)));
        assert_eq!(parse_hex("0062ff"), None);
        assert_eq!(parse_hex("#12345"), None);
        assert_eq!(parse_hex("#zzzzzz"), None);
    }

    #[test]
    fn catalog_themes_are_valid_and_unique() {
        let catalog = Theme::catalog();
        assert_eq!(catalog.len(), 7);
        assert!(catalog.iter().all(Theme::is_valid));
        let mut names: Vec<_> = catalog.iter().map(|t| t.name.as_str()).collect();
        names.dedup();
        assert_eq!(names.len(), 7);
    }

    #[test]
    fn theme_json_matches_stored_shape() {
        let json = serde_json::to_value(Theme::default()).unwrap();
        assert_eq!(json["primaryColor"], "#3b82f6");
        assert_eq!(json["name"], "Light");
    }

    #[test]
    fn bad_colors_fall_back_in_palette() {
        let mut theme = Theme::default();
        theme.primary_color = "blue".to_string();
        assert!(!theme.is_valid());
        assert_eq!(theme.palette().primary, Color::Cyan);
    }
}
