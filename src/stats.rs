//! Aggregates over the entry collection: histograms, streak, statistics and
//! mood trend. Everything here is a pure function of its inputs.

use crate::diary_entry::{DiaryEntry, Mood};
use chrono::{Duration, Months, NaiveDate};

pub const NO_MOOD_DATA: &str = "No mood data";
pub const NO_TAGS: &str = "No tags";

/// Mood counts in order of first occurrence.
pub fn mood_histogram(entries: &[DiaryEntry]) -> Vec<(Mood, usize)> {
    let mut counts: Vec<(Mood, usize)> = Vec::new();
    for mood in entries.iter().filter_map(|e| e.mood) {
        match counts.iter_mut().find(|(m, _)| *m == mood) {
            Some((_, n)) => *n += 1,
            None => counts.push((mood, 1)),
        }
    }
    counts
}

/// Tag counts in order of first occurrence. A tag repeated inside one entry
/// counts once for that entry.
pub fn tag_frequency(entries: &[DiaryEntry]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for entry in entries {
        let tags = entry.tags();
        for (i, tag) in tags.iter().enumerate() {
            if tags[..i].contains(tag) {
                continue;
            }
            match counts.iter_mut().find(|(t, _)| t == tag) {
                Some((_, n)) => *n += 1,
                None => counts.push((tag.clone(), 1)),
            }
        }
    }
    counts
}

/// The `n` most used tags; ties keep first-occurrence order.
pub fn top_tags(entries: &[DiaryEntry], n: usize) -> Vec<(String, usize)> {
    let mut counts = tag_frequency(entries);
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(n);
    counts
}

/// Consecutive days with at least one entry, counting back from `today`.
pub fn compute_streak(entries: &[DiaryEntry], today: NaiveDate) -> usize {
    let mut days: Vec<NaiveDate> = entries.iter().filter_map(DiaryEntry::day).collect();
    days.sort_unstable_by(|a, b| b.cmp(a));

    let mut streak = 0;
    let mut current = today;
    for day in days {
        if day == current {
            streak += 1;
            current -= Duration::days(1);
        } else if day < current {
            break;
        }
    }
    streak
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statistics {
    pub total_entries: usize,
    pub word_count: usize,
    pub top_mood: String,
    pub top_tag: String,
}

pub fn calculate_statistics(entries: &[DiaryEntry]) -> Statistics {
    let word_count = entries
        .iter()
        .map(|e| e.content.split_whitespace().count())
        .sum();
    let top_mood = most_frequent(mood_histogram(entries))
        .map_or_else(|| NO_MOOD_DATA.to_string(), |m| m.to_string());
    let top_tag = most_frequent(tag_frequency(entries)).unwrap_or_else(|| NO_TAGS.to_string());

    Statistics {
        total_entries: entries.len(),
        word_count,
        top_mood,
        top_tag,
    }
}

// First key wins among equal counts.
fn most_frequent<K>(counts: Vec<(K, usize)>) -> Option<K> {
    let mut best: Option<(K, usize)> = None;
    for (key, n) in counts {
        if best.as_ref().map_or(true, |(_, top)| n > *top) {
            best = Some((key, n));
        }
    }
    best.map(|(k, _)| k)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendRange {
    Week,
    Month,
    Year,
}

impl TrendRange {
    pub const ALL: [TrendRange; 3] = [TrendRange::Week, TrendRange::Month, TrendRange::Year];

    pub fn label(self) -> &'static str {
        match self {
            TrendRange::Week => "week",
            TrendRange::Month => "month",
            TrendRange::Year => "year",
        }
    }

    fn since(self, today: NaiveDate) -> NaiveDate {
        let earlier = match self {
            TrendRange::Week => today.checked_sub_signed(Duration::days(7)),
            TrendRange::Month => today.checked_sub_months(Months::new(1)),
            TrendRange::Year => today.checked_sub_months(Months::new(12)),
        };
        earlier.unwrap_or(NaiveDate::MIN)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendPoint {
    pub date: NaiveDate,
    /// Mood chart value, 0 when the entry has no mood.
    pub value: u8,
}

/// Mood values of entries inside `range`, oldest first.
pub fn mood_trend(entries: &[DiaryEntry], range: TrendRange, today: NaiveDate) -> Vec<TrendPoint> {
    let since = range.since(today);
    let mut points: Vec<TrendPoint> = entries
        .iter()
        .filter_map(|e| {
            let date = e.day()?;
            (date >= since).then(|| TrendPoint {
                date,
                value: e.mood.map_or(0, Mood::value),
            })
        })
        .collect();
    points.sort_by_key(|p| p.date);
    points
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoodShare {
    pub mood: Mood,
    pub count: usize,
    pub percentage: u32,
}

/// Share of each mood among entries that have one, rounded to whole percent.
pub fn mood_breakdown(entries: &[DiaryEntry]) -> Vec<MoodShare> {
    let histogram = mood_histogram(entries);
    let total: usize = histogram.iter().map(|(_, n)| n).sum();
    histogram
        .into_iter()
        .map(|(mood, count)| MoodShare {
            mood,
            count,
            percentage: ((count as f64 / total as f64) * 100.0).round() as u32,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diary_entry::format_date;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn on(days_ago: i64) -> DiaryEntry {
        let mut e = DiaryEntry::new("entry".to_string());
        e.date = format_date(today() - Duration::days(days_ago));
        e
    }

    fn tagged(tags: &[&str]) -> DiaryEntry {
        let mut e = on(0);
        e.tags = Some(tags.iter().map(|t| t.to_string()).collect());
        e
    }

    fn with_mood(mood: Mood) -> DiaryEntry {
        let mut e = on(0);
        e.mood = Some(mood);
        e
    }

    #[test]
    fn streak_stops_at_first_gap() {
        let entries = vec![on(3), on(0), on(1)];
        assert_eq!(compute_streak(&entries, today()), 2);
    }

    #[test]
    fn streak_counts_each_day_once() {
        let entries = vec![on(0), on(0), on(1), on(1), on(2)];
        assert_eq!(compute_streak(&entries, today()), 3);
    }

    #[test]
    fn streak_needs_an_entry_today() {
        assert_eq!(compute_streak(&[on(1), on(2)], today()), 0);
        assert_eq!(compute_streak(&[], today()), 0);
    }

    #[test]
    fn streak_skips_future_entries() {
        let entries = vec![on(-2), on(0)];
        assert_eq!(compute_streak(&entries, today()), 1);
    }

    #[test]
    fn empty_statistics_use_sentinels() {
        let stats = calculate_statistics(&[]);
        assert_eq!(
            stats,
            Statistics {
                total_entries: 0,
                word_count: 0,
                top_mood: NO_MOOD_DATA.to_string(),
                top_tag: NO_TAGS.to_string(),
            }
        );
    }

    #[test]
    fn statistics_count_words_and_pick_first_top() {
        let mut a = with_mood(Mood::Sad);
        a.content = "one two  three\nfour".to_string();
        a.tags = Some(vec!["x".into()]);
        let mut b = with_mood(Mood::Happy);
        b.tags = Some(vec!["y".into()]);
        let stats = calculate_statistics(&[a, b]);
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.word_count, 5);
        assert_eq!(stats.top_mood, "sad");
        assert_eq!(stats.top_tag, "x");
    }

    #[test]
    fn tag_frequency_counts_once_per_entry() {
        let entries = vec![tagged(&["a", "b"]), tagged(&["a"]), tagged(&["b", "b"])];
        assert_eq!(
            tag_frequency(&entries),
            vec![("a".to_string(), 2), ("b".to_string(), 2)]
        );
    }

    #[test]
    fn top_tags_sort_stably() {
        let entries = vec![tagged(&["a", "b", "c"]), tagged(&["c"]), tagged(&["b"])];
        let top = top_tags(&entries, 2);
        assert_eq!(top, vec![("b".to_string(), 2), ("c".to_string(), 2)]);
    }

    #[test]
    fn mood_histogram_keeps_first_occurrence_order() {
        let entries = vec![
            with_mood(Mood::Calm),
            on(0),
            with_mood(Mood::Happy),
            with_mood(Mood::Calm),
        ];
        assert_eq!(
            mood_histogram(&entries),
            vec![(Mood::Calm, 2), (Mood::Happy, 1)]
        );
    }

    #[test]
    fn breakdown_rounds_percentages() {
        let entries = vec![
            with_mood(Mood::Calm),
            with_mood(Mood::Calm),
            with_mood(Mood::Sad),
        ];
        let shares = mood_breakdown(&entries);
        assert_eq!(shares[0].percentage, 67);
        assert_eq!(shares[1].percentage, 33);
        assert!(mood_breakdown(&[]).is_empty());
    }

    #[test]
    fn trend_filters_by_range_and_sorts() {
        let mut recent = on(2);
        recent.mood = Some(Mood::Happy);
        let entries = vec![recent, on(20), on(0)];
        let week = mood_trend(&entries, TrendRange::Week, today());
        assert_eq!(
            week.iter().map(|p| p.value).collect::<Vec<_>>(),
            vec![5, 0]
        );
        assert_eq!(mood_trend(&entries, TrendRange::Month, today()).len(), 3);
    }
}
