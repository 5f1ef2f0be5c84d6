use std::time::Duration;

use rand::seq::SliceRandom;

use crate::models::Bucket;
use crate::settings::SyncSettings;
use crate::store::StoreError;

pub const GROUP_DELETED: &str = "Group was deleted";
pub const SAVE_FAILED: &str = "Could not save changes";
pub const TASK_MOVED: &str = "Task moved!";
pub const NOTES_MOVED: &str = "Notes moved!";
pub const TIMER_FINISHED: &str = "Timer Finished! Great Focus!";

const QUOTES: [&str; 8] = [
    "Nice, one more done!",
    "You're on a roll!",
    "Future you will thank you.",
    "Making progress!",
    "Keep it up!",
    "One step closer.",
    "Small wins matter.",
    "Excellent work!",
];

/// A short-lived, non-modal message for the window's toast area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub ttl: Duration,
}

impl Notice {
    pub fn new(message: impl Into<String>, ttl: Duration) -> Self {
        Self {
            message: message.into(),
            ttl,
        }
    }

    pub fn completion(settings: &SyncSettings) -> Self {
        let quote = QUOTES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(QUOTES[0]);
        Self::new(quote, settings.notice_ttl())
    }

    pub fn is_completion_quote(&self) -> bool {
        QUOTES.contains(&self.message.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowEvent {
    Notice(Notice),
    TimerExpired { bucket: Bucket, todo_id: String },
    Closed,
}

/// What the user sees for a failed store call. Ignored input stays silent.
pub fn notice_for(err: &StoreError, settings: &SyncSettings) -> Option<Notice> {
    let message = match err {
        StoreError::ValidationIgnored(_) => return None,
        StoreError::NotFound(_) => GROUP_DELETED,
        StoreError::StorageUnavailable(_)
        | StoreError::InvalidRequest(_)
        | StoreError::ServiceStopped => SAVE_FAILED,
    };
    Some(Notice::new(message, settings.notice_ttl()))
}
