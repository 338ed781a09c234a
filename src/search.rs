use crate::diary_entry::{DiaryEntry, Mood};
use chrono::NaiveDate;

/// Advanced search query. Empty fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    pub text: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub mood: Option<Mood>,
    pub tags: Vec<String>,
}

impl SearchCriteria {
    /// Adds a tag unless it is blank or already present.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.tags.iter().any(|t| t == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
    }

    fn matches(&self, entry: &DiaryEntry) -> bool {
        let day = entry.day();
        let matches_text = contains_ignore_case(&entry.content, &self.text);
        let matches_start = self
            .start_date
            .map_or(true, |start| day.is_some_and(|d| d >= start));
        let matches_end = self
            .end_date
            .map_or(true, |end| day.is_some_and(|d| d <= end));
        let matches_mood = self.mood.map_or(true, |mood| entry.mood == Some(mood));
        let matches_tags =
            self.tags.is_empty() || self.tags.iter().any(|tag| entry.has_tag(tag));

        matches_text && matches_start && matches_end && matches_mood && matches_tags
    }
}

/// The list view either runs the quick search (text plus selected category) or
/// an advanced search, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Simple {
        text: String,
        category: Option<String>,
    },
    Advanced(SearchCriteria),
}

impl Default for Query {
    fn default() -> Self {
        Query::Simple {
            text: String::new(),
            category: None,
        }
    }
}

impl Query {
    pub fn matches(&self, entry: &DiaryEntry) -> bool {
        match self {
            Query::Simple { text, category } => {
                let matches_text = contains_ignore_case(&entry.content, text)
                    || entry.tags().iter().any(|t| contains_ignore_case(t, text));
                let matches_category = category
                    .as_deref()
                    .map_or(true, |c| entry.category.as_deref() == Some(c));
                matches_text && matches_category
            }
            Query::Advanced(criteria) => criteria.matches(entry),
        }
    }
}

/// Entries matching `query`, in their original order.
pub fn filter_entries<'a>(entries: &'a [DiaryEntry], query: &Query) -> Vec<&'a DiaryEntry> {
    entries.iter().filter(|e| query.matches(e)).collect()
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, date: &str, content: &str) -> DiaryEntry {
        let mut e = DiaryEntry::new(content.to_string());
        e.id = id.to_string();
        e.date = date.to_string();
        e
    }

    fn sample() -> Vec<DiaryEntry> {
        let mut a = entry("1", "October 10, 2026", "Long <b>Walk</b> by the river");
        a.mood = Some(Mood::Calm);
        a.tags = Some(vec!["outdoors".into(), "health".into()]);
        a.category = Some("c1".into());
        let mut b = entry("2", "October 12, 2026", "Deadline at work");
        b.mood = Some(Mood::Stressed);
        b.tags = Some(vec!["work".into()]);
        b.category = Some("c2".into());
        let c = entry("3", "October 15, 2026", "Quiet evening walk");
        vec![a, b, c]
    }

    fn ids(found: &[&DiaryEntry]) -> Vec<String> {
        found.iter().map(|e| e.id.clone()).collect()
    }

    #[test]
    fn empty_criteria_keep_everything_in_order() {
        let entries = sample();
        let found = filter_entries(&entries, &Query::Advanced(SearchCriteria::default()));
        assert_eq!(ids(&found), vec!["1", "2", "3"]);
        let found = filter_entries(&entries, &Query::default());
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn advanced_conditions_are_conjunctive() {
        let entries = sample();
        let criteria = SearchCriteria {
            text: "WALK".into(),
            ..Default::default()
        };
        assert_eq!(
            ids(&filter_entries(&entries, &Query::Advanced(criteria.clone()))),
            vec!["1", "3"]
        );

        let criteria = SearchCriteria {
            mood: Some(Mood::Calm),
            ..criteria
        };
        assert_eq!(
            ids(&filter_entries(&entries, &Query::Advanced(criteria))),
            vec!["1"]
        );
    }

    #[test]
    fn date_bounds_are_inclusive_calendar_days() {
        let entries = sample();
        let criteria = SearchCriteria {
            start_date: NaiveDate::from_ymd_opt(2026, 10, 12),
            end_date: NaiveDate::from_ymd_opt(2026, 10, 15),
            ..Default::default()
        };
        assert_eq!(
            ids(&filter_entries(&entries, &Query::Advanced(criteria))),
            vec!["2", "3"]
        );
    }

    #[test]
    fn unreadable_dates_fail_only_bounded_searches() {
        let entries = vec![entry("9", "sometime", "text")];
        let bounded = SearchCriteria {
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1),
            ..Default::default()
        };
        assert!(filter_entries(&entries, &Query::Advanced(bounded)).is_empty());
        assert_eq!(
            filter_entries(&entries, &Query::Advanced(SearchCriteria::default())).len(),
            1
        );
    }

    #[test]
    fn tag_filter_matches_any_tag() {
        let entries = sample();
        let mut criteria = SearchCriteria::default();
        assert!(criteria.add_tag("work"));
        assert!(criteria.add_tag("health"));
        assert!(!criteria.add_tag(" work "));
        assert_eq!(
            ids(&filter_entries(&entries, &Query::Advanced(criteria))),
            vec!["1", "2"]
        );
    }

    #[test]
    fn simple_query_checks_text_tags_and_category() {
        let entries = sample();
        let by_tag = Query::Simple {
            text: "OUTDOOR".into(),
            category: None,
        };
        assert_eq!(ids(&filter_entries(&entries, &by_tag)), vec!["1"]);

        let by_category = Query::Simple {
            text: String::new(),
            category: Some("c2".into()),
        };
        assert_eq!(ids(&filter_entries(&entries, &by_category)), vec!["2"]);

        let both = Query::Simple {
            text: "walk".into(),
            category: Some("c2".into()),
        };
        assert!(filter_entries(&entries, &both).is_empty());
    }
}
