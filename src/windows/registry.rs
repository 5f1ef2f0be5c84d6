use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use log::info;

use crate::models::{Group, WindowBounds};

use super::{WindowHost, WindowId, WindowOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Created(WindowId),
    /// A live window already existed and was brought forward.
    Focused(WindowId),
}

impl OpenOutcome {
    pub fn window(&self) -> WindowId {
        match self {
            OpenOutcome::Created(id) | OpenOutcome::Focused(id) => *id,
        }
    }
}

/// Group id -> window handle, at most one live handle per group.
pub struct WindowRegistry {
    host: Arc<dyn WindowHost>,
    windows: HashMap<String, WindowId>,
}

impl WindowRegistry {
    pub fn new(host: Arc<dyn WindowHost>) -> Self {
        Self {
            host,
            windows: HashMap::new(),
        }
    }

    /// The live window for `group_id`, dropping the entry if the host already
    /// destroyed it.
    fn live(&mut self, group_id: &str) -> Option<WindowId> {
        let window = *self.windows.get(group_id)?;
        if self.host.is_alive(window) {
            Some(window)
        } else {
            self.windows.remove(group_id);
            None
        }
    }

    /// Lookup before create. An existing window gets the group's current
    /// visibility mode re-applied, since it may have changed elsewhere.
    pub fn open(&mut self, group: &Group) -> Result<OpenOutcome> {
        let always_on_top = group.visibility_mode.is_always_on_top();

        if let Some(window) = self.live(&group.id) {
            self.host.set_always_on_top(window, always_on_top);
            self.host.focus(window);
            return Ok(OpenOutcome::Focused(window));
        }

        let options = WindowOptions {
            bounds: group.bounds(),
            always_on_top,
        };
        let window = self.host.create(&group.id, &options)?;
        self.windows.insert(group.id.clone(), window);
        info!("Opened window {:?} for group {}", window, group.id);
        Ok(OpenOutcome::Created(window))
    }

    pub fn close(&mut self, group_id: &str) -> bool {
        match self.windows.remove(group_id) {
            Some(window) => {
                self.host.close(window);
                info!("Closed window {:?} for group {}", window, group_id);
                true
            }
            None => false,
        }
    }

    /// Changes stacking while keeping the window where it is.
    pub fn set_always_on_top(&mut self, group_id: &str, always_on_top: bool) -> bool {
        let Some(window) = self.live(group_id) else {
            return false;
        };
        let bounds = self.host.bounds(window);
        self.host.set_always_on_top(window, always_on_top);
        if let Some(bounds) = bounds {
            self.host.set_bounds(window, bounds);
        }
        true
    }

    pub fn update_position(&mut self, group_id: &str, bounds: WindowBounds) -> bool {
        match self.live(group_id) {
            Some(window) => {
                self.host.set_bounds(window, bounds);
                true
            }
            None => false,
        }
    }

    pub fn position(&mut self, group_id: &str) -> Option<WindowBounds> {
        let window = self.live(group_id)?;
        self.host.bounds(window)
    }

    pub fn is_open(&mut self, group_id: &str) -> bool {
        self.live(group_id).is_some()
    }

    pub fn open_count(&self) -> usize {
        self.windows.len()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::VisibilityMode;
    use crate::windows::MemoryHost;

    fn registry() -> (Arc<MemoryHost>, WindowRegistry) {
        let host = Arc::new(MemoryHost::new());
        let registry = WindowRegistry::new(host.clone());
        (host, registry)
    }

    #[test]
    fn second_open_focuses_instead_of_creating() {
        let (host, mut registry) = registry();
        let group = Group::new("Work", Utc::now());

        let first = registry.open(&group).unwrap();
        let second = registry.open(&group).unwrap();

        assert!(matches!(first, OpenOutcome::Created(_)));
        assert_eq!(second, OpenOutcome::Focused(first.window()));
        assert_eq!(host.live_windows_for(&group.id).len(), 1);
        assert_eq!(host.window(first.window()).unwrap().focus_count, 1);
    }

    #[test]
    fn reopen_reapplies_current_visibility() {
        let (host, mut registry) = registry();
        let mut group = Group::new("Work", Utc::now());
        let window = registry.open(&group).unwrap().window();
        assert!(!host.window(window).unwrap().always_on_top);

        group.visibility_mode = VisibilityMode::AlwaysOnTop;
        registry.open(&group).unwrap();
        assert!(host.window(window).unwrap().always_on_top);
    }

    #[test]
    fn stale_handles_are_replaced() {
        let (host, mut registry) = registry();
        let group = Group::new("Work", Utc::now());
        let first = registry.open(&group).unwrap().window();

        // The window went away without going through the registry.
        host.close(first);
        assert!(!registry.is_open(&group.id));
        assert_eq!(registry.open_count(), 0);
        let second = registry.open(&group).unwrap();
        assert!(matches!(second, OpenOutcome::Created(id) if id != first));
        assert_eq!(host.live_windows_for(&group.id).len(), 1);
    }

    #[test]
    fn stacking_change_keeps_bounds() {
        let (host, mut registry) = registry();
        let group = Group::new("Work", Utc::now());
        let window = registry.open(&group).unwrap().window();
        let moved = WindowBounds { x: 640, y: 80, width: 300, height: 500 };
        assert!(registry.update_position(&group.id, moved));

        assert!(registry.set_always_on_top(&group.id, true));
        let state = host.window(window).unwrap();
        assert!(state.always_on_top);
        assert_eq!(state.bounds, moved);
        assert_eq!(registry.position(&group.id), Some(moved));
    }

    #[test]
    fn operations_on_unopened_groups_report_false() {
        let (_host, mut registry) = registry();
        assert!(!registry.set_always_on_top("nope", true));
        assert!(!registry.update_position("nope", WindowBounds::default()));
        assert!(registry.position("nope").is_none());
        assert!(!registry.close("nope"));
    }
}
