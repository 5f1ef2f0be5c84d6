pub mod content;
pub mod db;
pub mod models;
pub mod settings;
pub mod sticky;
pub mod store;
pub mod sync;
pub mod timer;
pub mod utils;
pub mod windows;

use std::{env, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use log::{info, warn};
use serde_json::Value;
use tokio::{sync::broadcast, task::JoinHandle};

use db::Database;
use settings::{SettingsStore, SyncSettings};
use sticky::{NoteWindow, NoteWindows, WindowEvent};
use store::{ContentStore, StoreResult};
use sync::{channels, StoreClient, StoreService};
use windows::{MemoryHost, WindowHost};

const DATA_DIR_ENV: &str = "FLOATNOTES_DATA_DIR";
const DEBUG_ENV: &str = "FLOATNOTES_DEBUG";

pub struct AppState {
    pub client: StoreClient,
    pub windows: NoteWindows,
    pub settings: SettingsStore,
    pub data_dir: PathBuf,
    service: JoinHandle<()>,
}

impl AppState {
    /// Timing for new windows. `FLOATNOTES_DEBUG` swaps in the fast preset.
    pub fn sync_settings(&self) -> SyncSettings {
        if debug_mode() {
            SyncSettings::debug()
        } else {
            self.settings.sync()
        }
    }

    /// Opens the group's window, or focuses it and returns the controller already
    /// attached to it.
    pub async fn open_note(
        &self,
        group_id: &str,
    ) -> StoreResult<(NoteWindow, broadcast::Receiver<WindowEvent>)> {
        self.windows.open(group_id, self.sync_settings()).await
    }

    /// Drops this handle's clients and waits for the service to drain. Windows
    /// still holding a client keep the service alive.
    pub async fn shutdown(self) {
        let AppState {
            client,
            windows,
            service,
            ..
        } = self;
        drop(windows);
        drop(client);
        if let Err(err) = service.await {
            warn!("Store service ended abnormally: {err}");
        }
    }
}

fn debug_mode() -> bool {
    env::var(DEBUG_ENV)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn resolve_data_dir(override_dir: Option<PathBuf>) -> Result<PathBuf> {
    match override_dir {
        Some(dir) => Ok(dir),
        None => Ok(dirs::data_dir()
            .context("No platform data directory; set FLOATNOTES_DATA_DIR")?
            .join("floatnotes")),
    }
}

/// `FLOATNOTES_DATA_DIR`, else the platform data directory joined with `floatnotes`.
pub fn data_dir() -> Result<PathBuf> {
    resolve_data_dir(env::var_os(DATA_DIR_ENV).map(PathBuf::from))
}

/// Opens the store under `data_dir`, parks timers left running by the previous
/// process, and starts the store service.
pub async fn bootstrap(data_dir: PathBuf, host: Arc<dyn WindowHost>) -> Result<AppState> {
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    let database = Database::new(data_dir.join("floatnotes.sqlite3"))?;
    let store = ContentStore::new(database);

    let parked = store
        .pause_running_timers()
        .await
        .context("Failed to recover running timers")?;
    if parked > 0 {
        warn!("Paused {parked} timer(s) left running by the previous session");
    }

    let settings = SettingsStore::new(data_dir.join("settings.json"))?;
    let (client, service) = StoreService::spawn(store, host);
    let windows = NoteWindows::new(client.clone());

    Ok(AppState {
        client,
        windows,
        settings,
        data_dir,
        service,
    })
}

/// `floatnotes [channel] [json-payload]`: invokes one channel against the store
/// in the data directory and prints the JSON answer.
pub fn run(args: Vec<String>) -> Result<()> {
    utils::logging::init();

    let mut args = args.into_iter();
    let channel = args
        .next()
        .unwrap_or_else(|| channels::GROUPS_LIST.to_string());
    let payload = match args.next() {
        Some(raw) => serde_json::from_str(&raw)
            .with_context(|| format!("Payload for {channel} is not valid JSON"))?,
        None => Value::Null,
    };

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(async move {
        let state = bootstrap(data_dir()?, Arc::new(MemoryHost::new())).await?;
        info!("Float Notes store ready at {}", state.data_dir.display());

        let response = state
            .client
            .invoke(&channel, payload)
            .await
            .with_context(|| format!("{channel} failed"))?;
        println!("{}", serde_json::to_string_pretty(&response)?);

        state.shutdown().await;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Bucket;
    use crate::timer::state;

    #[test]
    fn explicit_data_dir_wins() {
        let dir = PathBuf::from("/tmp/floatnotes-test");
        assert_eq!(resolve_data_dir(Some(dir.clone())).unwrap(), dir);
    }

    #[tokio::test]
    async fn bootstrap_parks_timers_from_the_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let group_id = {
            let db = Database::new(dir.path().join("floatnotes.sqlite3")).unwrap();
            let store = ContentStore::new(db);
            let mut group = store.create_group("Work").await.unwrap();
            let id = group.forever_content.add_todo("Focus").unwrap();
            state::start(&mut group.forever_content, &id).unwrap();
            store.update_group(group.clone()).await.unwrap();
            group.id
        };

        let app = bootstrap(dir.path().to_path_buf(), Arc::new(MemoryHost::new()))
            .await
            .unwrap();
        let forever = app
            .client
            .get_day_content(&group_id, Bucket::Forever)
            .await
            .unwrap()
            .unwrap();
        assert!(forever.running_todo().is_none());
        assert_eq!(forever.todos[0].remaining_time, Some(25 * 60));
        assert!(app.data_dir.join("floatnotes.sqlite3").exists());
        app.shutdown().await;
    }

    #[tokio::test]
    async fn opened_notes_use_stored_settings() {
        let dir = tempfile::tempdir().unwrap();
        let app = bootstrap(dir.path().to_path_buf(), Arc::new(MemoryHost::new()))
            .await
            .unwrap();
        let fast = SyncSettings {
            poll_interval_ms: 50,
            ..SyncSettings::default()
        };
        app.settings.update_sync(fast.clone()).unwrap();
        if !debug_mode() {
            assert_eq!(app.sync_settings(), fast);
        }

        let group = app.client.create_group("Work").await.unwrap();
        let (window, _events) = app.open_note(&group.id).await.unwrap();
        assert_eq!(window.group().await.title, "Work");
        let (again, _events) = app.open_note(&group.id).await.unwrap();
        assert_eq!(app.windows.open_count().await, 1);
        window.close().await;
        assert!(again.is_closed());
        assert_eq!(app.windows.open_count().await, 0);
        drop((window, again));
        app.shutdown().await;
    }
}
