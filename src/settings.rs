use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

/// Loop periods below this would stall the runtime.
const MIN_INTERVAL_MS: u64 = 1;

/// Timing of the window-side loops, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncSettings {
    /// How often a window re-fetches the group list.
    pub poll_interval_ms: u64,
    /// Grace period between "group was deleted" and the window closing.
    pub close_delay_ms: u64,
    pub tick_interval_ms: u64,
    pub notice_ttl_ms: u64,
    pub confirmation_ttl_ms: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2_000,
            close_delay_ms: 1_000,
            tick_interval_ms: 1_000,
            notice_ttl_ms: 3_000,
            confirmation_ttl_ms: 2_000,
        }
    }
}

impl SyncSettings {
    /// Faster loops for poking at the app by hand.
    pub fn debug() -> Self {
        Self {
            poll_interval_ms: 500,
            close_delay_ms: 250,
            tick_interval_ms: 100,
            ..Self::default()
        }
    }

    /// Zero intervals from a hand-edited file fall back to the defaults.
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.poll_interval_ms == 0 {
            warn!("poll_interval_ms must be positive; using {}", defaults.poll_interval_ms);
            self.poll_interval_ms = defaults.poll_interval_ms;
        }
        if self.tick_interval_ms == 0 {
            warn!("tick_interval_ms must be positive; using {}", defaults.tick_interval_ms);
            self.tick_interval_ms = defaults.tick_interval_ms;
        }
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_INTERVAL_MS))
    }

    pub fn close_delay(&self) -> Duration {
        Duration::from_millis(self.close_delay_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(MIN_INTERVAL_MS))
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::from_millis(self.notice_ttl_ms)
    }

    pub fn confirmation_ttl(&self) -> Duration {
        Duration::from_millis(self.confirmation_ttl_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct UserSettings {
    sync: SyncSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let mut data: UserSettings = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring unreadable settings at {}: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };
        data.sync = data.sync.sanitized();

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn sync(&self) -> SyncSettings {
        self.read().sync.clone()
    }

    pub fn update_sync(&self, settings: SyncSettings) -> Result<()> {
        let mut guard = self.write();
        guard.sync = settings.sanitized();
        self.persist(&guard)
    }

    fn read(&self) -> RwLockReadGuard<'_, UserSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, UserSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
