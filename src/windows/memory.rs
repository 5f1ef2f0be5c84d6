use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use anyhow::Result;

use crate::models::WindowBounds;

use super::{WindowHost, WindowId, WindowOptions};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryWindow {
    pub group_id: String,
    pub bounds: WindowBounds,
    pub always_on_top: bool,
    pub focus_count: u32,
    pub alive: bool,
}

/// Window host that keeps window state in memory. Used headless and in tests.
#[derive(Default)]
pub struct MemoryHost {
    next_id: AtomicU64,
    windows: Mutex<HashMap<WindowId, MemoryWindow>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<WindowId, MemoryWindow>> {
        self.windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn with_window(&self, window: WindowId, apply: impl FnOnce(&mut MemoryWindow)) {
        if let Some(state) = self.lock().get_mut(&window).filter(|state| state.alive) {
            apply(state);
        }
    }

    pub fn window(&self, window: WindowId) -> Option<MemoryWindow> {
        self.lock().get(&window).cloned()
    }

    pub fn live_windows_for(&self, group_id: &str) -> Vec<WindowId> {
        self.lock()
            .iter()
            .filter(|(_, state)| state.alive && state.group_id == group_id)
            .map(|(id, _)| *id)
            .collect()
    }
}

impl WindowHost for MemoryHost {
    fn create(&self, group_id: &str, options: &WindowOptions) -> Result<WindowId> {
        let id = WindowId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.lock().insert(
            id,
            MemoryWindow {
                group_id: group_id.to_string(),
                bounds: options.bounds,
                always_on_top: options.always_on_top,
                focus_count: 0,
                alive: true,
            },
        );
        Ok(id)
    }

    fn is_alive(&self, window: WindowId) -> bool {
        self.lock().get(&window).is_some_and(|state| state.alive)
    }

    fn focus(&self, window: WindowId) {
        self.with_window(window, |state| state.focus_count += 1);
    }

    fn close(&self, window: WindowId) {
        self.with_window(window, |state| state.alive = false);
    }

    fn set_always_on_top(&self, window: WindowId, always_on_top: bool) {
        self.with_window(window, |state| state.always_on_top = always_on_top);
    }

    fn bounds(&self, window: WindowId) -> Option<WindowBounds> {
        self.lock()
            .get(&window)
            .filter(|state| state.alive)
            .map(|state| state.bounds)
    }

    fn set_bounds(&self, window: WindowId, bounds: WindowBounds) {
        self.with_window(window, |state| state.bounds = bounds);
    }
}
