use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_TIMER_MINUTES: u32 = 25;

fn default_timer_duration() -> u32 {
    DEFAULT_TIMER_MINUTES
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_expanded: bool,
    /// Focus duration in minutes.
    #[serde(default = "default_timer_duration")]
    pub timer_duration: u32,
    /// Seconds left on the countdown; `None` until the timer is first used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_time: Option<u32>,
    #[serde(default)]
    pub is_timer_running: bool,
}

impl TodoItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            completed: false,
            created_at: Utc::now(),
            completed_at: None,
            description: None,
            is_expanded: false,
            timer_duration: DEFAULT_TIMER_MINUTES,
            remaining_time: Some(DEFAULT_TIMER_MINUTES * 60),
            is_timer_running: false,
        }
    }

    pub fn full_duration_secs(&self) -> u32 {
        self.timer_duration.saturating_mul(60)
    }

    /// Not running, with the countdown rewound to the full duration.
    pub fn reset_timer(&mut self) {
        self.is_timer_running = false;
        self.remaining_time = Some(self.full_duration_secs());
    }

    /// Flip completion. `completed_at` tracks the false -> true edge only, and a
    /// finished task cannot keep counting down.
    pub fn set_completed(&mut self, completed: bool, now: DateTime<Utc>) {
        if completed == self.completed {
            return;
        }
        self.completed = completed;
        if completed {
            self.completed_at = Some(now);
            if self.is_timer_running {
                self.reset_timer();
            }
        } else {
            self.completed_at = None;
        }
    }
}
