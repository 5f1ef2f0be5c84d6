//! The controller behind one sticky-note window.
//!
//! A window keeps the last canonical copy of its group and turns every user action
//! into one whole-group update built from that copy. The async view lock is held
//! for the full read-modify-send-adopt cycle, so actions from one window land in
//! order. A poll loop notices deletions and remote edits; one ticker per running
//! countdown drives the timers.

mod attached;
mod events;
mod poll;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Weak,
};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;

use crate::content::{self, MoveOutcome};
use crate::models::{Bucket, DateKey, DayContent, Group, Theme, ViewMode, VisibilityMode, WindowBounds};
use crate::settings::SyncSettings;
use crate::store::{StoreError, StoreResult};
use crate::sync::StoreClient;
use crate::timer::{state, TickOutcome, TickerControl, TickerKey, TickerSet, TimerPhase};

use attached::AttachedTable;

pub use attached::NoteWindows;
pub use events::{
    notice_for, Notice, WindowEvent, GROUP_DELETED, NOTES_MOVED, SAVE_FAILED, TASK_MOVED,
    TIMER_FINISHED,
};
pub use poll::PollOutcome;

const ENABLE_LOGS: bool = true;

/// Events a slow listener may fall behind by before it starts skipping.
const EVENT_BUFFER: usize = 64;

use crate::{log_info, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Tasks,
    Notes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jump {
    Yesterday,
    Today,
    Tomorrow,
}

impl Jump {
    fn date(self) -> Option<DateKey> {
        let today = DateKey::today();
        match self {
            Jump::Yesterday => today.offset_days(-1),
            Jump::Today => Some(today),
            Jump::Tomorrow => today.offset_days(1),
        }
    }
}

struct ViewState {
    group: Group,
    current_date: DateKey,
}

struct Inner {
    group_id: String,
    client: StoreClient,
    settings: SyncSettings,
    view: Mutex<ViewState>,
    events: broadcast::Sender<WindowEvent>,
    closed: AtomicBool,
    cancel: CancellationToken,
    tickers: TickerSet,
    attached: AttachedTable,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[derive(Clone)]
pub struct NoteWindow {
    inner: Arc<Inner>,
}

impl NoteWindow {
    /// Opens the native window for `group_id` and attaches a new controller to it.
    /// Position and stacking are restored from the stored group.
    async fn attach(
        client: StoreClient,
        group_id: &str,
        settings: SyncSettings,
        attached: AttachedTable,
    ) -> StoreResult<(Self, broadcast::Receiver<WindowEvent>)> {
        client.open_note(group_id)?;
        let group = client
            .list_groups()
            .await?
            .into_iter()
            .find(|group| group.id == group_id)
            .ok_or_else(|| StoreError::NotFound(group_id.to_string()))?;

        client.update_position(group_id, group.bounds()).await?;
        client
            .set_always_on_top(group_id, group.visibility_mode.is_always_on_top())
            .await?;

        let (events, receiver) = broadcast::channel(EVENT_BUFFER);
        let current_date = group.last_selected_date.unwrap_or_else(DateKey::today);
        let window = NoteWindow {
            inner: Arc::new(Inner {
                group_id: group_id.to_string(),
                client,
                settings,
                view: Mutex::new(ViewState {
                    group,
                    current_date,
                }),
                events,
                closed: AtomicBool::new(false),
                cancel: CancellationToken::new(),
                tickers: TickerSet::new(),
                attached,
            }),
        };

        poll::spawn_poll_loop(&window);
        window.arm_running_timers().await;
        log_info!("window attached to group {group_id} on {current_date}");
        Ok((window, receiver))
    }

    fn upgrade(inner: &Weak<Inner>) -> Option<Self> {
        inner.upgrade().map(|inner| NoteWindow { inner })
    }

    /// Another listener for this window's notices and lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<WindowEvent> {
        self.inner.events.subscribe()
    }

    pub fn group_id(&self) -> &str {
        &self.inner.group_id
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    pub async fn group(&self) -> Group {
        self.inner.view.lock().await.group.clone()
    }

    pub async fn current_date(&self) -> DateKey {
        self.inner.view.lock().await.current_date
    }

    /// Forever in forever view, otherwise the bucket of the date on screen.
    pub async fn active_bucket(&self) -> Bucket {
        let view = self.inner.view.lock().await;
        view.group.active_bucket(view.current_date)
    }

    pub async fn active_content(&self) -> DayContent {
        let view = self.inner.view.lock().await;
        let bucket = view.group.active_bucket(view.current_date);
        view.group.content(&bucket).into_owned()
    }

    pub async fn armed_timers(&self) -> Vec<TickerKey> {
        self.inner.tickers.armed().await
    }

    pub async fn rename(&self, title: &str) -> StoreResult<bool> {
        let title = title.trim();
        self.mutate(|group, _| {
            if title.is_empty() {
                return None;
            }
            group.title = title.to_string();
            Some(())
        })
        .await
        .map(|applied| applied.is_some())
    }

    pub async fn set_theme(&self, theme: Theme) -> StoreResult<bool> {
        self.mutate(|group, _| {
            group.theme = theme;
            Some(())
        })
        .await
        .map(|applied| applied.is_some())
    }

    /// Persists the mode on the group, then changes the native window's stacking.
    pub async fn set_visibility(&self, mode: VisibilityMode) -> StoreResult<bool> {
        let applied = self
            .mutate(|group, _| {
                group.visibility_mode = mode;
                Some(())
            })
            .await?;
        if applied.is_none() {
            return Ok(false);
        }
        self.forward(
            self.inner
                .client
                .set_always_on_top(&self.inner.group_id, mode.is_always_on_top())
                .await,
        )
    }

    pub async fn set_view_mode(&self, mode: ViewMode) -> StoreResult<bool> {
        self.mutate(|group, _| {
            group.view_mode = mode;
            Some(())
        })
        .await
        .map(|applied| applied.is_some())
    }

    pub async fn toggle_section(&self, section: Section) -> StoreResult<bool> {
        self.mutate(|group, _| {
            match section {
                Section::Tasks => group.is_tasks_expanded = !group.is_tasks_expanded,
                Section::Notes => group.is_notes_expanded = !group.is_notes_expanded,
            }
            Some(())
        })
        .await
        .map(|applied| applied.is_some())
    }

    pub async fn go_to_date(&self, date: DateKey) -> StoreResult<bool> {
        self.navigate(|_| Some(date)).await
    }

    /// Returns false when the target date is out of calendar range.
    pub async fn shift_days(&self, days: i64) -> StoreResult<bool> {
        self.navigate(|current| current.offset_days(days)).await
    }

    pub async fn jump_to(&self, jump: Jump) -> StoreResult<bool> {
        self.navigate(|_| jump.date()).await
    }

    async fn navigate(&self, next: impl FnOnce(DateKey) -> Option<DateKey>) -> StoreResult<bool> {
        self.mutate(|group, current| {
            let date = next(*current)?;
            *current = date;
            group.last_selected_date = Some(date);
            Some(())
        })
        .await
        .map(|applied| applied.is_some())
    }

    pub async fn edit_notes(&self, notes: &str) -> StoreResult<bool> {
        self.edit_active(|_, content| {
            content.notes = notes.to_string();
            Some(())
        })
        .await
        .map(|applied| applied.is_some())
    }

    /// Returns the new item's id; blank text adds nothing.
    pub async fn add_todo(&self, text: &str) -> StoreResult<Option<String>> {
        self.edit_active(|_, content| content.add_todo(text)).await
    }

    /// Returns the new completion state. Completing an item stops its countdown
    /// and shows a motivational notice.
    pub async fn toggle_todo(&self, todo_id: &str) -> StoreResult<Option<bool>> {
        let toggled = self
            .edit_active(|bucket, content| {
                content
                    .toggle_todo(todo_id, Utc::now())
                    .map(|completed| (bucket, completed))
            })
            .await?;

        let Some((bucket, completed)) = toggled else {
            return Ok(None);
        };
        if completed {
            self.inner
                .tickers
                .cancel_ticker(&(bucket, todo_id.to_string()))
                .await;
            self.emit(WindowEvent::Notice(Notice::completion(&self.inner.settings)));
        }
        Ok(Some(completed))
    }

    pub async fn delete_todo(&self, todo_id: &str) -> StoreResult<bool> {
        let removed = self
            .edit_active(|bucket, content| content.remove_todo(todo_id).map(|_| bucket))
            .await?;
        match removed {
            Some(bucket) => {
                self.inner
                    .tickers
                    .cancel_ticker(&(bucket, todo_id.to_string()))
                    .await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn reorder_todo(&self, from: usize, to: usize) -> StoreResult<bool> {
        self.edit_active(|_, content| content.reorder_todo(from, to).then_some(()))
            .await
            .map(|applied| applied.is_some())
    }

    pub async fn set_description(&self, todo_id: &str, description: &str) -> StoreResult<bool> {
        self.edit_active(|_, content| content.set_description(todo_id, description).then_some(()))
            .await
            .map(|applied| applied.is_some())
    }

    pub async fn toggle_description(&self, todo_id: &str) -> StoreResult<bool> {
        self.edit_active(|_, content| content.toggle_expanded(todo_id).then_some(()))
            .await
            .map(|applied| applied.is_some())
    }

    pub async fn set_timer_duration(&self, todo_id: &str, minutes: u32) -> StoreResult<bool> {
        self.edit_active(|_, content| state::set_duration(content, todo_id, minutes).then_some(()))
            .await
            .map(|applied| applied.is_some())
    }

    /// Moves a todo from the bucket on screen to `target`.
    pub async fn move_todo(&self, todo_id: &str, target: Bucket) -> StoreResult<MoveOutcome> {
        let mut outcome = MoveOutcome::Missing;
        let moved = self
            .mutate(|group, current| {
                let source = group.active_bucket(*current);
                outcome = content::move_todo(group, &source, todo_id, &target);
                outcome.is_moved().then_some(source)
            })
            .await?;

        if let Some(source) = moved {
            self.inner
                .tickers
                .cancel_ticker(&(source, todo_id.to_string()))
                .await;
            self.notify(TASK_MOVED, self.inner.settings.confirmation_ttl());
        }
        Ok(outcome)
    }

    /// Moves the notes of the bucket on screen to `target`.
    pub async fn move_notes(&self, target: Bucket) -> StoreResult<MoveOutcome> {
        let mut outcome = MoveOutcome::NothingToMove;
        let moved = self
            .mutate(|group, current| {
                let source = group.active_bucket(*current);
                outcome = content::move_notes(group, &source, &target);
                outcome.is_moved().then_some(())
            })
            .await?;

        if moved.is_some() {
            self.notify(NOTES_MOVED, self.inner.settings.confirmation_ttl());
        }
        Ok(outcome)
    }

    pub async fn start_timer(&self, todo_id: &str) -> StoreResult<bool> {
        let started = self
            .edit_active(|bucket, content| {
                state::start(content, todo_id).map(|outcome| (bucket, outcome))
            })
            .await?;

        let Some((bucket, outcome)) = started else {
            return Ok(false);
        };
        for paused in outcome.paused {
            self.inner.tickers.cancel_ticker(&(bucket, paused)).await;
        }
        self.arm_timer(bucket, todo_id).await;
        Ok(true)
    }

    pub async fn pause_timer(&self, todo_id: &str) -> StoreResult<bool> {
        let paused = self
            .edit_active(|bucket, content| state::pause(content, todo_id).then_some(bucket))
            .await?;
        match paused {
            Some(bucket) => {
                self.inner
                    .tickers
                    .cancel_ticker(&(bucket, todo_id.to_string()))
                    .await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Play/pause. Returns the phase the item ended up in.
    pub async fn toggle_timer(&self, todo_id: &str) -> StoreResult<Option<TimerPhase>> {
        let toggled = self
            .edit_active(|bucket, content| {
                state::toggle(content, todo_id).map(|(phase, outcome)| (bucket, phase, outcome))
            })
            .await?;

        let Some((bucket, phase, outcome)) = toggled else {
            return Ok(None);
        };
        for paused in outcome.paused {
            self.inner.tickers.cancel_ticker(&(bucket, paused)).await;
        }
        if phase == TimerPhase::Running {
            self.arm_timer(bucket, todo_id).await;
        } else {
            self.inner
                .tickers
                .cancel_ticker(&(bucket, todo_id.to_string()))
                .await;
        }
        Ok(Some(phase))
    }

    pub async fn stop_timer(&self, todo_id: &str) -> StoreResult<bool> {
        let stopped = self
            .edit_active(|bucket, content| state::stop(content, todo_id).then_some(bucket))
            .await?;
        match stopped {
            Some(bucket) => {
                self.inner
                    .tickers
                    .cancel_ticker(&(bucket, todo_id.to_string()))
                    .await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Persists the bounds on the group and moves the native window. Sizes below
    /// the minimum are raised to it.
    pub async fn update_position(&self, bounds: WindowBounds) -> StoreResult<bool> {
        let bounds = bounds.clamped();
        let applied = self
            .mutate(|group, _| {
                group.set_bounds(bounds);
                Some(())
            })
            .await?;
        if applied.is_none() {
            return Ok(false);
        }
        self.forward(
            self.inner
                .client
                .update_position(&self.inner.group_id, bounds)
                .await,
        )
    }

    /// Stops the poll loop and every ticker, then releases the native window.
    /// Writes already in flight still land, but their results are dropped.
    pub async fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.cancel.cancel();
        self.inner.tickers.cancel_all().await;
        attached::detach(&self.inner.attached, &self.inner).await;
        if let Err(err) = self.inner.client.close_note(&self.inner.group_id) {
            log_warn!("could not release window for group {}: {err}", self.inner.group_id);
        }
        log_info!("window for group {} closed", self.inner.group_id);
        self.emit(WindowEvent::Closed);
    }

    /// The core of every action: edit a copy of the current group, send it whole,
    /// adopt what the store answers. `None` from `edit` means nothing to send.
    async fn mutate<R>(
        &self,
        edit: impl FnOnce(&mut Group, &mut DateKey) -> Option<R>,
    ) -> StoreResult<Option<R>> {
        if self.is_closed() {
            return Ok(None);
        }
        let mut view = self.inner.view.lock().await;
        let mut draft = view.group.clone();
        let mut current_date = view.current_date;
        let Some(result) = edit(&mut draft, &mut current_date) else {
            return Ok(None);
        };

        match self.inner.client.update_group(draft).await {
            Ok(canonical) => {
                if self.is_closed() {
                    return Ok(None);
                }
                view.group = canonical;
                view.current_date = current_date;
                Ok(Some(result))
            }
            Err(err) => {
                drop(view);
                self.fail(&err);
                Err(err)
            }
        }
    }

    /// `mutate` against the bucket on screen.
    async fn edit_active<R>(
        &self,
        edit: impl FnOnce(Bucket, &mut DayContent) -> Option<R>,
    ) -> StoreResult<Option<R>> {
        self.mutate(|group, current| {
            let bucket = group.active_bucket(*current);
            edit(bucket, group.content_mut(&bucket))
        })
        .await
    }

    fn forward(&self, result: StoreResult<bool>) -> StoreResult<bool> {
        result.inspect_err(|err| self.fail(err))
    }

    async fn arm_timer(&self, bucket: Bucket, todo_id: &str) {
        if self.is_closed() {
            return;
        }
        let inner = Arc::downgrade(&self.inner);
        let id = todo_id.to_string();
        let key = (bucket, id.clone());
        self.inner
            .tickers
            .spawn_ticker(key, self.inner.settings.tick_interval(), move || {
                let inner = inner.clone();
                let id = id.clone();
                async move {
                    match NoteWindow::upgrade(&inner) {
                        Some(window) => window.tick(bucket, &id).await,
                        None => TickerControl::Stop,
                    }
                }
            })
            .await;
    }

    /// Arms a ticker for every running item that does not have one yet.
    async fn arm_running_timers(&self) {
        let running: Vec<TickerKey> = {
            let view = self.inner.view.lock().await;
            view.group
                .buckets()
                .flat_map(|content| {
                    content
                        .todos
                        .iter()
                        .filter(|todo| todo.is_timer_running)
                        .map(move |todo| (content.date, todo.id.clone()))
                })
                .collect()
        };
        let armed = self.inner.tickers.armed().await;
        for (bucket, todo_id) in running {
            if !armed.contains(&(bucket, todo_id.clone())) {
                self.arm_timer(bucket, &todo_id).await;
            }
        }
    }

    async fn tick(&self, bucket: Bucket, todo_id: &str) -> TickerControl {
        if self.is_closed() {
            return TickerControl::Stop;
        }
        let mut view = self.inner.view.lock().await;
        let mut draft = view.group.clone();
        let outcome = state::tick(draft.content_mut(&bucket), todo_id);
        if outcome == TickOutcome::NotRunning {
            return TickerControl::Stop;
        }

        match self.inner.client.update_group(draft).await {
            Ok(canonical) if !self.is_closed() => view.group = canonical,
            Ok(_) => return TickerControl::Stop,
            Err(err) => {
                drop(view);
                self.fail(&err);
                return TickerControl::Stop;
            }
        }
        drop(view);

        if outcome == TickOutcome::Expired {
            log_info!("timer for todo {todo_id} in {bucket} finished");
            self.notify(TIMER_FINISHED, self.inner.settings.notice_ttl());
            self.emit(WindowEvent::TimerExpired {
                bucket,
                todo_id: todo_id.to_string(),
            });
            return TickerControl::Stop;
        }
        TickerControl::Continue
    }

    /// Surfaces a failed store call. Losing our own group closes the window after
    /// the close delay.
    fn fail(&self, err: &StoreError) {
        log_warn!("store call for group {} failed: {err}", self.inner.group_id);
        if let Some(notice) = notice_for(err, &self.inner.settings) {
            self.emit(WindowEvent::Notice(notice));
        }
        if err.is_not_found() {
            self.schedule_close(self.inner.settings.close_delay());
        }
    }

    fn schedule_close(&self, delay: Duration) {
        let window = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            window.close().await;
        });
    }

    fn notify(&self, message: &str, ttl: Duration) {
        self.emit(WindowEvent::Notice(Notice::new(message, ttl)));
    }

    fn emit(&self, event: WindowEvent) {
        // Nobody listening is fine; the window works headless.
        let _ = self.inner.events.send(event);
    }
}
