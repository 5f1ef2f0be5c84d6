use std::collections::HashMap;
use std::sync::{atomic::Ordering, Arc, Weak};

use tokio::sync::{broadcast, Mutex};

use crate::settings::SyncSettings;
use crate::store::StoreResult;
use crate::sync::StoreClient;

use super::{Inner, NoteWindow, WindowEvent};

const ENABLE_LOGS: bool = true;

use crate::log_info;

pub(super) type AttachedTable = Arc<Mutex<HashMap<String, Weak<Inner>>>>;

/// The window controllers of one process, at most one per group.
#[derive(Clone)]
pub struct NoteWindows {
    client: StoreClient,
    attached: AttachedTable,
}

impl NoteWindows {
    pub fn new(client: StoreClient) -> Self {
        Self {
            client,
            attached: AttachedTable::default(),
        }
    }

    /// Focuses the group's window when a controller is already attached and hands
    /// back that controller; otherwise opens the native window and attaches a new
    /// one. The table stays locked for the whole call, so racing opens of one
    /// group end up sharing a controller.
    pub async fn open(
        &self,
        group_id: &str,
        settings: SyncSettings,
    ) -> StoreResult<(NoteWindow, broadcast::Receiver<WindowEvent>)> {
        let mut attached = self.attached.lock().await;
        attached.retain(|_, inner| is_live(inner));

        if let Some(window) = attached.get(group_id).and_then(NoteWindow::upgrade) {
            self.client.open_note(group_id)?;
            log_info!("group {group_id} already has a window; focusing it");
            let events = window.subscribe();
            return Ok((window, events));
        }

        let (window, events) =
            NoteWindow::attach(self.client.clone(), group_id, settings, self.attached.clone())
                .await?;
        attached.insert(group_id.to_string(), Arc::downgrade(&window.inner));
        Ok((window, events))
    }

    /// The live controller for `group_id`, if any.
    pub async fn get(&self, group_id: &str) -> Option<NoteWindow> {
        let attached = self.attached.lock().await;
        attached
            .get(group_id)
            .filter(|inner| is_live(inner))
            .and_then(NoteWindow::upgrade)
    }

    pub async fn open_count(&self) -> usize {
        let attached = self.attached.lock().await;
        attached.values().filter(|inner| is_live(inner)).count()
    }
}

fn is_live(inner: &Weak<Inner>) -> bool {
    inner
        .upgrade()
        .is_some_and(|inner| !inner.closed.load(Ordering::SeqCst))
}

/// Drops the entry for `inner`'s group if it still points at `inner`.
pub(super) async fn detach(table: &AttachedTable, inner: &Arc<Inner>) {
    let mut attached = table.lock().await;
    let ours = attached
        .get(&inner.group_id)
        .is_some_and(|entry| std::ptr::eq(entry.as_ptr(), Arc::as_ptr(inner)));
    if ours {
        attached.remove(&inner.group_id);
    }
}
