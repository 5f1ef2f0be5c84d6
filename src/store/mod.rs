//! The content store: the durable `groups` collection and every mutation of it.
//!
//! Each operation is one read-modify-write transaction on the persistence thread,
//! and every accepted mutation stamps a strictly newer `updated_at` on the group it
//! touched.

mod error;

use chrono::{DateTime, Duration, Utc};
use log::{info, warn};

use crate::db::{repositories::Edit, Database};
use crate::models::{Bucket, DayContent, Group};

pub use error::{StoreError, StoreResult};

const GROUPS_KEY: &str = "groups";

/// `now`, unless the clock has not moved past `previous`.
fn next_stamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

#[derive(Clone)]
pub struct ContentStore {
    db: Database,
}

impl ContentStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list_groups(&self) -> StoreResult<Vec<Group>> {
        let groups: Option<Vec<Group>> = self
            .db
            .get_document(GROUPS_KEY)
            .await
            .map_err(StoreError::storage)?;
        Ok(groups.unwrap_or_default())
    }

    pub async fn find_group(&self, group_id: &str) -> StoreResult<Group> {
        self.list_groups()
            .await?
            .into_iter()
            .find(|group| group.id == group_id)
            .ok_or_else(|| StoreError::NotFound(group_id.to_string()))
    }

    pub async fn create_group(&self, title: &str) -> StoreResult<Group> {
        let title = title.trim();
        if title.is_empty() {
            return Err(StoreError::ValidationIgnored("group title is blank"));
        }

        let group = Group::new(title, Utc::now());
        let created = group.clone();
        self.db
            .update_document(GROUPS_KEY, move |groups: &mut Vec<Group>| {
                groups.push(group);
                Edit::Commit(())
            })
            .await
            .map_err(StoreError::storage)?;

        info!("Created group {} ({})", created.id, created.title);
        Ok(created)
    }

    /// Replaces the stored group wholesale. `id` and `created_at` stay as stored;
    /// `updated_at` is always re-stamped, even when nothing else changed.
    pub async fn update_group(&self, group: Group) -> StoreResult<Group> {
        self.db
            .update_document(GROUPS_KEY, move |groups: &mut Vec<Group>| {
                let Some(stored) = groups.iter_mut().find(|stored| stored.id == group.id) else {
                    return Edit::Discard(Err(StoreError::NotFound(group.id)));
                };
                let mut next = group;
                next.created_at = stored.created_at;
                next.updated_at = next_stamp(stored.updated_at, Utc::now());
                *stored = next.clone();
                Edit::Commit(Ok(next))
            })
            .await
            .map_err(StoreError::storage)?
    }

    pub async fn delete_group(&self, group_id: &str) -> StoreResult<()> {
        let id = group_id.to_string();
        self.db
            .update_document(GROUPS_KEY, move |groups: &mut Vec<Group>| {
                let before = groups.len();
                groups.retain(|group| group.id != id);
                if groups.len() == before {
                    Edit::Discard(Err(StoreError::NotFound(id)))
                } else {
                    Edit::Commit(Ok(()))
                }
            })
            .await
            .map_err(StoreError::storage)??;

        info!("Deleted group {group_id}");
        Ok(())
    }

    /// `None` when the date has no stored content yet. The forever bucket always
    /// exists.
    pub async fn get_day_content(
        &self,
        group_id: &str,
        bucket: Bucket,
    ) -> StoreResult<Option<DayContent>> {
        let group = self.find_group(group_id).await?;
        Ok(match bucket {
            Bucket::Forever => Some(group.forever_content),
            Bucket::Date(key) => group.day_contents.get(&key).cloned(),
        })
    }

    /// Writes one bucket of a group. Equivalent to a group update restricted to
    /// `content.date`, including the `updated_at` stamp.
    pub async fn set_day_content(
        &self,
        group_id: &str,
        content: DayContent,
    ) -> StoreResult<DayContent> {
        let id = group_id.to_string();
        self.db
            .update_document(GROUPS_KEY, move |groups: &mut Vec<Group>| {
                let Some(group) = groups.iter_mut().find(|group| group.id == id) else {
                    return Edit::Discard(Err(StoreError::NotFound(id)));
                };
                group.put_content(content.clone());
                group.updated_at = next_stamp(group.updated_at, Utc::now());
                Edit::Commit(Ok(content))
            })
            .await
            .map_err(StoreError::storage)?
    }

    /// Timers persisted as running have no ticker after a restart; park them as
    /// paused with their remaining time intact. Returns how many were parked.
    pub async fn pause_running_timers(&self) -> StoreResult<usize> {
        self.db
            .update_document(GROUPS_KEY, |groups: &mut Vec<Group>| {
                let now = Utc::now();
                let mut parked = 0;
                for group in groups.iter_mut() {
                    let group_id = group.id.clone();
                    let mut touched = false;
                    for content in group.buckets_mut() {
                        for todo in content.todos.iter_mut().filter(|todo| todo.is_timer_running) {
                            warn!(
                                "Recovered running timer for todo {} in group {} ({}); pausing",
                                todo.id, group_id, content.date
                            );
                            todo.is_timer_running = false;
                            touched = true;
                            parked += 1;
                        }
                    }
                    if touched {
                        group.updated_at = next_stamp(group.updated_at, now);
                    }
                }
                if parked > 0 {
                    Edit::Commit(parked)
                } else {
                    Edit::Discard(0)
                }
            })
            .await
            .map_err(StoreError::storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DateKey, ViewMode};
    use crate::timer::state;

    fn open_temp() -> (tempfile::TempDir, ContentStore) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("store.sqlite3")).unwrap();
        (dir, ContentStore::new(db))
    }

    fn day(raw: &str) -> Bucket {
        Bucket::Date(raw.parse::<DateKey>().unwrap())
    }

    #[tokio::test]
    async fn create_assigns_identity_and_defaults() {
        let (_dir, store) = open_temp();
        let group = store.create_group("  Work ").await.unwrap();

        assert_eq!(group.title, "Work");
        assert!(!group.id.is_empty());
        assert!(group.day_contents.is_empty());

        let listed = store.list_groups().await.unwrap();
        assert_eq!(listed, vec![group]);
    }

    #[tokio::test]
    async fn blank_title_is_ignored_not_stored() {
        let (_dir, store) = open_temp();
        let err = store.create_group("   ").await.unwrap_err();
        assert!(matches!(err, StoreError::ValidationIgnored(_)));
        assert!(store.list_groups().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_restamps_even_when_unchanged() {
        let (_dir, store) = open_temp();
        let group = store.create_group("Work").await.unwrap();

        let first = store.update_group(group.clone()).await.unwrap();
        let second = store.update_group(first.clone()).await.unwrap();
        assert!(first.updated_at > group.updated_at);
        assert!(second.updated_at > first.updated_at);
        assert_eq!(second.created_at, group.created_at);
    }

    #[tokio::test]
    async fn update_replaces_whole_group_last_writer_wins() {
        let (_dir, store) = open_temp();
        let base = store.create_group("Work").await.unwrap();

        // Two windows start from the same read.
        let mut renamed = base.clone();
        renamed.title = "Renamed".into();
        let mut forever = base.clone();
        forever.view_mode = ViewMode::Forever;

        store.update_group(renamed).await.unwrap();
        store.update_group(forever).await.unwrap();

        let stored = store.find_group(&base.id).await.unwrap();
        assert_eq!(stored.view_mode, ViewMode::Forever);
        assert_eq!(stored.title, "Work");
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let (_dir, store) = open_temp();
        let ghost = Group::new("Ghost", Utc::now());

        assert!(store.update_group(ghost.clone()).await.unwrap_err().is_not_found());
        assert!(store.delete_group(&ghost.id).await.unwrap_err().is_not_found());
        assert!(store
            .get_day_content(&ghost.id, Bucket::Forever)
            .await
            .unwrap_err()
            .is_not_found());
        assert!(store
            .set_day_content(&ghost.id, DayContent::empty(Bucket::Forever))
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn delete_removes_only_that_group() {
        let (_dir, store) = open_temp();
        let work = store.create_group("Work").await.unwrap();
        let home = store.create_group("Home").await.unwrap();

        store.delete_group(&work.id).await.unwrap();
        let remaining = store.list_groups().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, home.id);
    }

    #[tokio::test]
    async fn day_content_reads_absent_as_none_and_writes_stamp_group() {
        let (_dir, store) = open_temp();
        let group = store.create_group("Work").await.unwrap();
        let monday = day("2024-06-03");

        assert!(store.get_day_content(&group.id, monday).await.unwrap().is_none());
        let forever = store.get_day_content(&group.id, Bucket::Forever).await.unwrap();
        assert_eq!(forever, Some(DayContent::empty(Bucket::Forever)));

        let mut content = DayContent::empty(monday);
        content.notes = "standup".into();
        content.add_todo("Ship release");
        let saved = store.set_day_content(&group.id, content.clone()).await.unwrap();
        assert_eq!(saved, content);

        let fetched = store.get_day_content(&group.id, monday).await.unwrap();
        assert_eq!(fetched, Some(content));
        let stored = store.find_group(&group.id).await.unwrap();
        assert!(stored.updated_at > group.updated_at);
    }

    #[tokio::test]
    async fn recovery_pauses_running_timers_and_keeps_remaining() {
        let (_dir, store) = open_temp();
        let mut group = store.create_group("Work").await.unwrap();
        let id = group.forever_content.add_todo("Focus").unwrap();
        state::start(&mut group.forever_content, &id).unwrap();
        state::tick(&mut group.forever_content, &id);
        store.update_group(group.clone()).await.unwrap();

        assert_eq!(store.pause_running_timers().await.unwrap(), 1);
        let stored = store.find_group(&group.id).await.unwrap();
        let todo = stored.forever_content.todo(&id).unwrap();
        assert!(!todo.is_timer_running);
        assert_eq!(todo.remaining_time, Some(1499));

        assert_eq!(store.pause_running_timers().await.unwrap(), 0);
    }
}
