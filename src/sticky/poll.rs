use std::sync::Arc;

use tokio::time::{self, Instant, MissedTickBehavior};

use crate::store::StoreResult;

use super::{NoteWindow, GROUP_DELETED};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Unchanged,
    /// The stored group was newer and replaced the local view.
    Refreshed,
    Deleted,
}

impl NoteWindow {
    /// One existence check against the store.
    pub async fn poll(&self) -> StoreResult<PollOutcome> {
        let groups = self.inner.client.list_groups().await?;
        let Some(remote) = groups
            .into_iter()
            .find(|group| group.id == self.inner.group_id)
        else {
            return Ok(PollOutcome::Deleted);
        };

        let refreshed = {
            let mut view = self.inner.view.lock().await;
            if self.is_closed() || remote.updated_at <= view.group.updated_at {
                false
            } else {
                view.group = remote;
                true
            }
        };

        if refreshed {
            self.arm_running_timers().await;
            Ok(PollOutcome::Refreshed)
        } else {
            Ok(PollOutcome::Unchanged)
        }
    }

    async fn group_deleted(&self) {
        log_warn!("group {} no longer exists; closing its window", self.inner.group_id);
        self.notify(GROUP_DELETED, self.inner.settings.notice_ttl());
        tokio::select! {
            _ = time::sleep(self.inner.settings.close_delay()) => self.close().await,
            _ = self.inner.cancel.cancelled() => {}
        }
    }
}

pub(super) fn spawn_poll_loop(window: &NoteWindow) {
    let inner = Arc::downgrade(&window.inner);
    let cancel = window.inner.cancel.clone();
    let group_id = window.inner.group_id.clone();
    let period = window.inner.settings.poll_interval();

    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let Some(window) = NoteWindow::upgrade(&inner) else {
                        break;
                    };
                    match window.poll().await {
                        Ok(PollOutcome::Deleted) => {
                            window.group_deleted().await;
                            break;
                        }
                        Ok(PollOutcome::Refreshed) => {
                            log_info!("group {group_id} changed elsewhere; view refreshed");
                        }
                        Ok(PollOutcome::Unchanged) => {}
                        Err(err) => log_warn!("poll for group {group_id} failed: {err}"),
                    }
                }
                _ = cancel.cancelled() => {
                    log_info!("poll loop for group {group_id} shutting down");
                    break;
                }
            }
        }
    });
}
