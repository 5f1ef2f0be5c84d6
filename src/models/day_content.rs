use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Bucket, TodoItem};

/// Notes and todos of a single bucket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayContent {
    pub date: Bucket,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub todos: Vec<TodoItem>,
}

impl DayContent {
    pub fn empty(bucket: Bucket) -> Self {
        Self {
            date: bucket,
            notes: String::new(),
            todos: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty() && self.todos.is_empty()
    }

    /// Whitespace-only notes count as no notes.
    pub fn has_notes(&self) -> bool {
        !self.notes.trim().is_empty()
    }

    pub fn position(&self, todo_id: &str) -> Option<usize> {
        self.todos.iter().position(|todo| todo.id == todo_id)
    }

    pub fn todo(&self, todo_id: &str) -> Option<&TodoItem> {
        self.todos.iter().find(|todo| todo.id == todo_id)
    }

    pub fn todo_mut(&mut self, todo_id: &str) -> Option<&mut TodoItem> {
        self.todos.iter_mut().find(|todo| todo.id == todo_id)
    }

    pub fn running_todo(&self) -> Option<&TodoItem> {
        self.todos.iter().find(|todo| todo.is_timer_running)
    }

    /// Appends a new item and returns its id. Blank text is ignored.
    pub fn add_todo(&mut self, text: &str) -> Option<String> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let todo = TodoItem::new(text);
        let id = todo.id.clone();
        self.todos.push(todo);
        Some(id)
    }

    /// Returns the new completion state, or `None` if the item is not here.
    pub fn toggle_todo(&mut self, todo_id: &str, now: DateTime<Utc>) -> Option<bool> {
        let todo = self.todo_mut(todo_id)?;
        let completed = !todo.completed;
        todo.set_completed(completed, now);
        Some(completed)
    }

    pub fn remove_todo(&mut self, todo_id: &str) -> Option<TodoItem> {
        let index = self.position(todo_id)?;
        Some(self.todos.remove(index))
    }

    /// Moves the item at `from` so it ends up at index `to`.
    pub fn reorder_todo(&mut self, from: usize, to: usize) -> bool {
        if from == to || from >= self.todos.len() || to >= self.todos.len() {
            return false;
        }
        let item = self.todos.remove(from);
        self.todos.insert(to, item);
        true
    }

    /// Editing a description also discloses it.
    pub fn set_description(&mut self, todo_id: &str, description: &str) -> bool {
        let Some(todo) = self.todo_mut(todo_id) else {
            return false;
        };
        todo.description = if description.is_empty() {
            None
        } else {
            Some(description.to_string())
        };
        todo.is_expanded = true;
        true
    }

    pub fn toggle_expanded(&mut self, todo_id: &str) -> bool {
        match self.todo_mut(todo_id) {
            Some(todo) => {
                todo.is_expanded = !todo.is_expanded;
                true
            }
            None => false,
        }
    }

    /// `(completed, total)` for progress display.
    pub fn progress(&self) -> (usize, usize) {
        let completed = self.todos.iter().filter(|todo| todo.completed).count();
        (completed, self.todos.len())
    }
}
