use serde::{Deserialize, Serialize};

use crate::models::{DayContent, TodoItem};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum TimerPhase {
    #[default]
    Idle,
    Running,
    Paused,
    Expired,
}

/// Derives the phase from the persisted timer fields of a todo.
pub fn phase_of(todo: &TodoItem) -> TimerPhase {
    if todo.is_timer_running {
        return TimerPhase::Running;
    }
    match todo.remaining_time {
        None => TimerPhase::Idle,
        Some(0) => TimerPhase::Expired,
        Some(remaining) if remaining == todo.full_duration_secs() => TimerPhase::Idle,
        Some(_) => TimerPhase::Paused,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StartOutcome {
    /// Items in the same bucket that were running and are now paused.
    pub paused: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Counting(u32),
    Expired,
    /// The item is gone or no longer running; the ticker should stand down.
    NotRunning,
}

/// Starts the countdown on `todo_id`, pausing whichever sibling was running.
pub fn start(content: &mut DayContent, todo_id: &str) -> Option<StartOutcome> {
    content.todo(todo_id)?;

    let mut outcome = StartOutcome::default();
    for todo in content.todos.iter_mut() {
        if todo.id == todo_id {
            let remaining = match todo.remaining_time {
                None | Some(0) => todo.full_duration_secs(),
                Some(remaining) => remaining,
            };
            todo.remaining_time = Some(remaining);
            todo.is_timer_running = true;
        } else if todo.is_timer_running {
            todo.is_timer_running = false;
            outcome.paused.push(todo.id.clone());
        }
    }
    Some(outcome)
}

/// Freezes a running countdown at its current value.
pub fn pause(content: &mut DayContent, todo_id: &str) -> bool {
    match content.todo_mut(todo_id) {
        Some(todo) if todo.is_timer_running => {
            todo.is_timer_running = false;
            true
        }
        _ => false,
    }
}

/// Play/pause button: pauses a running timer, otherwise starts it. Returns the
/// resulting phase alongside the start side effects.
pub fn toggle(content: &mut DayContent, todo_id: &str) -> Option<(TimerPhase, StartOutcome)> {
    if content.todo(todo_id)?.is_timer_running {
        pause(content, todo_id);
        Some((TimerPhase::Paused, StartOutcome::default()))
    } else {
        start(content, todo_id).map(|outcome| (TimerPhase::Running, outcome))
    }
}

pub fn stop(content: &mut DayContent, todo_id: &str) -> bool {
    match content.todo_mut(todo_id) {
        Some(todo) => {
            todo.reset_timer();
            true
        }
        None => false,
    }
}

/// One second of countdown. Reaching zero expires the timer instead of going negative.
pub fn tick(content: &mut DayContent, todo_id: &str) -> TickOutcome {
    let Some(todo) = content.todo_mut(todo_id) else {
        return TickOutcome::NotRunning;
    };
    if !todo.is_timer_running {
        return TickOutcome::NotRunning;
    }

    let remaining = todo.remaining_time.unwrap_or(0).saturating_sub(1);
    todo.remaining_time = Some(remaining);
    if remaining == 0 {
        todo.is_timer_running = false;
        TickOutcome::Expired
    } else {
        TickOutcome::Counting(remaining)
    }
}

/// Changing the duration rewinds the countdown to the new length.
pub fn set_duration(content: &mut DayContent, todo_id: &str, minutes: u32) -> bool {
    if minutes == 0 {
        return false;
    }
    match content.todo_mut(todo_id) {
        Some(todo) => {
            todo.timer_duration = minutes;
            todo.remaining_time = Some(todo.full_duration_secs());
            true
        }
        None => false,
    }
}

/// `MM:SS`, minutes unbounded.
pub fn format_remaining(total_secs: u32) -> String {
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}
