use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Bucket, DateKey, DayContent};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum VisibilityMode {
    #[default]
    Standard,
    AlwaysOnTop,
}

impl VisibilityMode {
    pub fn is_always_on_top(&self) -> bool {
        matches!(self, VisibilityMode::AlwaysOnTop)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ViewMode {
    #[default]
    Date,
    Forever,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Yellow,
    Blue,
    Green,
    Dark,
    Purple,
    Pink,
}

/// Window position and size in screen pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WindowBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowBounds {
    fn default() -> Self {
        Self {
            x: 100,
            y: 100,
            width: 320,
            height: 400,
        }
    }
}

impl WindowBounds {
    pub const MIN_WIDTH: u32 = 280;
    pub const MIN_HEIGHT: u32 = 300;

    /// Resizing never shrinks a note below the minimum size.
    pub fn clamped(self) -> Self {
        Self {
            width: self.width.max(Self::MIN_WIDTH),
            height: self.height.max(Self::MIN_HEIGHT),
            ..self
        }
    }
}

fn default_x() -> i32 {
    WindowBounds::default().x
}

fn default_y() -> i32 {
    WindowBounds::default().y
}

fn default_width() -> u32 {
    WindowBounds::default().width
}

fn default_height() -> u32 {
    WindowBounds::default().height
}

fn default_expanded() -> bool {
    true
}

fn default_forever_content() -> DayContent {
    DayContent::empty(Bucket::Forever)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub visibility_mode: VisibilityMode,
    #[serde(default)]
    pub view_mode: ViewMode,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_selected_date: Option<DateKey>,
    #[serde(default)]
    pub day_contents: BTreeMap<DateKey, DayContent>,
    #[serde(default = "default_forever_content")]
    pub forever_content: DayContent,
    #[serde(default = "default_x")]
    pub x: i32,
    #[serde(default = "default_y")]
    pub y: i32,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_expanded")]
    pub is_tasks_expanded: bool,
    #[serde(default = "default_expanded")]
    pub is_notes_expanded: bool,
}

impl Group {
    pub fn new(title: impl Into<String>, now: DateTime<Utc>) -> Self {
        let bounds = WindowBounds::default();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            created_at: now,
            updated_at: now,
            visibility_mode: VisibilityMode::Standard,
            view_mode: ViewMode::Date,
            theme: Theme::default(),
            last_selected_date: None,
            day_contents: BTreeMap::new(),
            forever_content: default_forever_content(),
            x: bounds.x,
            y: bounds.y,
            width: bounds.width,
            height: bounds.height,
            is_tasks_expanded: true,
            is_notes_expanded: true,
        }
    }

    /// The bucket edits target while `date` is on screen.
    pub fn active_bucket(&self, date: DateKey) -> Bucket {
        match self.view_mode {
            ViewMode::Forever => Bucket::Forever,
            ViewMode::Date => Bucket::Date(date),
        }
    }

    /// Absent date keys read as empty content.
    pub fn content(&self, bucket: &Bucket) -> Cow<'_, DayContent> {
        match bucket {
            Bucket::Forever => Cow::Borrowed(&self.forever_content),
            Bucket::Date(key) => match self.day_contents.get(key) {
                Some(content) => Cow::Borrowed(content),
                None => Cow::Owned(DayContent::empty(*bucket)),
            },
        }
    }

    /// Creates the date entry on first write.
    pub fn content_mut(&mut self, bucket: &Bucket) -> &mut DayContent {
        match bucket {
            Bucket::Forever => &mut self.forever_content,
            Bucket::Date(key) => self
                .day_contents
                .entry(*key)
                .or_insert_with(|| DayContent::empty(*bucket)),
        }
    }

    /// Replaces the bucket named by `content.date`.
    pub fn put_content(&mut self, content: DayContent) {
        match content.date {
            Bucket::Forever => self.forever_content = content,
            Bucket::Date(key) => {
                self.day_contents.insert(key, content);
            }
        }
    }

    pub fn buckets(&self) -> impl Iterator<Item = &DayContent> {
        self.day_contents
            .values()
            .chain(std::iter::once(&self.forever_content))
    }

    pub fn buckets_mut(&mut self) -> impl Iterator<Item = &mut DayContent> {
        self.day_contents
            .values_mut()
            .chain(std::iter::once(&mut self.forever_content))
    }

    pub fn todo_ids(&self) -> Vec<&str> {
        self.buckets()
            .flat_map(|content| content.todos.iter().map(|todo| todo.id.as_str()))
            .collect()
    }

    pub fn date_summary(&self, date: DateKey) -> DateSummary {
        let Some(content) = self.day_contents.get(&date) else {
            return DateSummary::default();
        };
        let (completed, total) = content.progress();
        DateSummary {
            has_content: total > 0 || content.has_notes(),
            all_done: total > 0 && completed == total,
        }
    }

    pub fn bounds(&self) -> WindowBounds {
        WindowBounds {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }

    pub fn set_bounds(&mut self, bounds: WindowBounds) {
        self.x = bounds.x;
        self.y = bounds.y;
        self.width = bounds.width;
        self.height = bounds.height;
    }
}

/// Calendar marker for one date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateSummary {
    /// Any todo, or notes that are not blank.
    pub has_content: bool,
    /// At least one todo, and every todo completed.
    pub all_done: bool,
}

/// Case-insensitive title search; a blank query matches every group.
pub fn filter_groups<'a>(groups: &'a [Group], query: &str) -> Vec<&'a Group> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return groups.iter().collect();
    }
    groups
        .iter()
        .filter(|group| group.title.to_lowercase().contains(&query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(raw: &str) -> DateKey {
        raw.parse().unwrap()
    }

    #[test]
    fn new_groups_are_empty_and_standard() {
        let group = Group::new("Work", Utc::now());
        assert!(group.day_contents.is_empty());
        assert!(group.forever_content.is_empty());
        assert_eq!(group.visibility_mode, VisibilityMode::Standard);
        assert_eq!(group.view_mode, ViewMode::Date);
        assert_eq!(group.created_at, group.updated_at);
    }

    #[test]
    fn absent_date_reads_as_empty_without_creating_entry() {
        let group = Group::new("Work", Utc::now());
        let bucket = Bucket::Date(key("2024-06-01"));

        let content = group.content(&bucket);
        assert!(content.is_empty());
        assert_eq!(content.date, bucket);
        assert!(group.day_contents.is_empty());
    }

    #[test]
    fn date_summary_marks_content_and_completion() {
        let mut group = Group::new("Work", Utc::now());
        let day = key("2024-06-01");
        assert_eq!(group.date_summary(day), DateSummary::default());

        group.content_mut(&Bucket::Date(day)).notes = "  ".into();
        assert!(!group.date_summary(day).has_content);
        group.content_mut(&Bucket::Date(day)).notes = "plan".into();
        assert_eq!(
            group.date_summary(day),
            DateSummary { has_content: true, all_done: false }
        );

        let content = group.content_mut(&Bucket::Date(day));
        let first = content.add_todo("a").unwrap();
        let second = content.add_todo("b").unwrap();
        content.toggle_todo(&first, Utc::now());
        assert!(!group.date_summary(day).all_done);

        group
            .content_mut(&Bucket::Date(day))
            .toggle_todo(&second, Utc::now());
        assert_eq!(
            group.date_summary(day),
            DateSummary { has_content: true, all_done: true }
        );
    }

    #[test]
    fn view_mode_selects_active_bucket() {
        let mut group = Group::new("Work", Utc::now());
        let today = key("2024-06-01");
        assert_eq!(group.active_bucket(today), Bucket::Date(today));

        group.view_mode = ViewMode::Forever;
        assert_eq!(group.active_bucket(today), Bucket::Forever);
    }

    #[test]
    fn serializes_with_camel_case_and_date_keyed_map() {
        let mut group = Group::new("Work", Utc::now());
        group
            .content_mut(&Bucket::Date(key("2024-06-01")))
            .add_todo("Ship release");

        let value = serde_json::to_value(&group).unwrap();
        assert_eq!(value["visibilityMode"], "standard");
        assert_eq!(value["viewMode"], "date");
        assert_eq!(value["foreverContent"]["date"], "forever");
        assert_eq!(value["dayContents"]["2024-06-01"]["date"], "2024-06-01");

        let back: Group = serde_json::from_value(value).unwrap();
        assert_eq!(back, group);
    }

    #[test]
    fn legacy_records_without_optional_fields_load() {
        let raw = r#"{
            "id": "g1",
            "title": "Legacy",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z",
            "visibilityMode": "alwaysOnTop"
        }"#;
        let group: Group = serde_json::from_str(raw).unwrap();
        assert!(group.visibility_mode.is_always_on_top());
        assert_eq!(group.bounds(), WindowBounds::default());
        assert!(group.is_tasks_expanded && group.is_notes_expanded);
        assert_eq!(group.forever_content.date, Bucket::Forever);
    }

    #[test]
    fn title_filter_ignores_case_and_blank_queries() {
        let now = Utc::now();
        let groups = vec![Group::new("Work", now), Group::new("Home chores", now)];

        assert_eq!(filter_groups(&groups, "  ").len(), 2);
        let hits = filter_groups(&groups, "HOME");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Home chores");
    }
}
