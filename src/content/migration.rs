//! Relocating todos and notes between buckets of one group.
//!
//! Both moves edit the group in place, removing from the source and adding to the
//! target before the caller sends the whole group back to the store in one update.
//! A todo or note fragment is never visible in two buckets, nor in none.

use crate::models::{Bucket, Group};

/// Placed between existing target notes and the notes moved in.
pub const NOTES_SEPARATOR: &str = "<br><br>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    SameBucket,
    /// The todo is not in the source bucket.
    Missing,
    /// Source notes are blank.
    NothingToMove,
}

impl MoveOutcome {
    pub fn is_moved(&self) -> bool {
        matches!(self, MoveOutcome::Moved)
    }
}

/// Moves a todo to the end of the target bucket. A running timer arrives paused so
/// the target keeps at most one running item.
pub fn move_todo(group: &mut Group, source: &Bucket, todo_id: &str, target: &Bucket) -> MoveOutcome {
    if group.content(source).position(todo_id).is_none() {
        return MoveOutcome::Missing;
    }
    if source == target {
        return MoveOutcome::SameBucket;
    }

    let Some(mut todo) = group.content_mut(source).remove_todo(todo_id) else {
        return MoveOutcome::Missing;
    };
    todo.is_timer_running = false;
    group.content_mut(target).todos.push(todo);
    MoveOutcome::Moved
}

/// Appends the source notes after the target notes and clears the source.
pub fn move_notes(group: &mut Group, source: &Bucket, target: &Bucket) -> MoveOutcome {
    if !group.content(source).has_notes() {
        return MoveOutcome::NothingToMove;
    }
    if source == target {
        return MoveOutcome::SameBucket;
    }

    let moved = std::mem::take(&mut group.content_mut(source).notes);
    let target_content = group.content_mut(target);
    target_content.notes = if target_content.notes.is_empty() {
        moved
    } else {
        format!("{}{NOTES_SEPARATOR}{moved}", target_content.notes)
    };
    MoveOutcome::Moved
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::Utc;

    use super::*;
    use crate::models::DateKey;
    use crate::timer::state;

    fn day(raw: &str) -> Bucket {
        Bucket::Date(raw.parse::<DateKey>().unwrap())
    }

    fn texts(group: &Group, bucket: &Bucket) -> Vec<String> {
        group
            .content(bucket)
            .todos
            .iter()
            .map(|todo| todo.text.clone())
            .collect()
    }

    fn seeded() -> (Group, Vec<String>) {
        let mut group = Group::new("Work", Utc::now());
        let monday = day("2024-06-03");
        let ids = ["a", "b", "c"]
            .iter()
            .map(|text| group.content_mut(&monday).add_todo(text).unwrap())
            .collect();
        group.content_mut(&day("2024-06-04")).add_todo("x").unwrap();
        (group, ids)
    }

    #[test]
    fn moved_todo_lands_at_end_of_target() {
        let (mut group, ids) = seeded();
        let outcome = move_todo(&mut group, &day("2024-06-03"), &ids[0], &day("2024-06-04"));

        assert_eq!(outcome, MoveOutcome::Moved);
        assert_eq!(texts(&group, &day("2024-06-03")), vec!["b", "c"]);
        assert_eq!(texts(&group, &day("2024-06-04")), vec!["x", "a"]);
    }

    #[test]
    fn moving_there_and_back_keeps_membership_but_not_position() {
        let (mut group, ids) = seeded();
        let monday = day("2024-06-03");

        move_todo(&mut group, &monday, &ids[0], &Bucket::Forever);
        move_todo(&mut group, &Bucket::Forever, &ids[0], &monday);

        // Same members, but "a" now sits at the end instead of its original index.
        assert_eq!(texts(&group, &monday), vec!["b", "c", "a"]);
        assert!(group.forever_content.todos.is_empty());
    }

    #[test]
    fn todo_ids_stay_unique_across_many_moves() {
        let (mut group, ids) = seeded();
        let buckets = [day("2024-06-03"), day("2024-06-04"), Bucket::Forever, day("2024-07-01")];

        for step in 0..24 {
            let id = &ids[step % ids.len()];
            let source = *buckets
                .iter()
                .find(|bucket| group.content(bucket).position(id).is_some())
                .unwrap();
            let target = buckets[(step * 7 + 1) % buckets.len()];
            move_todo(&mut group, &source, id, &target);

            let all = group.todo_ids();
            let unique: HashSet<_> = all.iter().collect();
            assert_eq!(all.len(), unique.len());
            assert_eq!(all.len(), 4);
        }
    }

    #[test]
    fn same_bucket_and_missing_items_are_no_ops() {
        let (mut group, ids) = seeded();
        let monday = day("2024-06-03");
        let before = group.clone();

        assert_eq!(move_todo(&mut group, &monday, &ids[1], &monday), MoveOutcome::SameBucket);
        assert_eq!(
            move_todo(&mut group, &Bucket::Forever, &ids[1], &monday),
            MoveOutcome::Missing
        );
        assert_eq!(group, before);
    }

    #[test]
    fn running_timer_is_paused_by_the_move() {
        let (mut group, ids) = seeded();
        let monday = day("2024-06-03");
        state::start(group.content_mut(&monday), &ids[2]).unwrap();
        state::tick(group.content_mut(&monday), &ids[2]);

        move_todo(&mut group, &monday, &ids[2], &Bucket::Forever);
        let moved = &group.forever_content.todos[0];
        assert!(!moved.is_timer_running);
        assert_eq!(moved.remaining_time, Some(1499));
    }

    #[test]
    fn notes_are_appended_after_existing_target_notes() {
        let mut group = Group::new("Work", Utc::now());
        let (source, target) = (day("2024-06-03"), day("2024-06-04"));
        group.content_mut(&source).notes = "A".into();
        group.content_mut(&target).notes = "B".into();

        assert!(move_notes(&mut group, &source, &target).is_moved());
        assert_eq!(group.content(&target).notes, "B<br><br>A");
        assert_eq!(group.content(&source).notes, "");
    }

    #[test]
    fn notes_into_empty_target_are_taken_verbatim() {
        let mut group = Group::new("Work", Utc::now());
        group.forever_content.notes = "someday".into();

        let target = day("2024-06-05");
        assert!(move_notes(&mut group, &Bucket::Forever, &target).is_moved());
        assert_eq!(group.content(&target).notes, "someday");
        assert!(group.forever_content.notes.is_empty());
    }

    #[test]
    fn blank_notes_and_same_bucket_do_nothing() {
        let mut group = Group::new("Work", Utc::now());
        let (source, target) = (day("2024-06-03"), day("2024-06-04"));
        group.content_mut(&source).notes = "  \n ".into();
        group.content_mut(&target).notes = "B".into();
        let before = group.clone();

        assert_eq!(move_notes(&mut group, &source, &target), MoveOutcome::NothingToMove);
        group.content_mut(&source).notes = "A".into();
        assert_eq!(move_notes(&mut group, &source, &source), MoveOutcome::SameBucket);
        assert_eq!(group.content(&target).notes, before.content(&target).notes);
        assert_eq!(group.content(&source).notes, "A");
    }
}
