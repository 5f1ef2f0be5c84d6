use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};

use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

use crate::models::Bucket;

const ENABLE_LOGS: bool = false;

/// `time::interval` rejects a zero period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

use crate::log_info;

/// One countdown per (bucket, todo id).
pub type TickerKey = (Bucket, String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerControl {
    Continue,
    Stop,
}

/// The running countdowns of one window.
#[derive(Clone, Default)]
pub struct TickerSet {
    tickers: Arc<Mutex<HashMap<TickerKey, JoinHandle<()>>>>,
}

impl TickerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a fixed-period ticker for `key`, aborting whatever was armed under the
    /// same key. The first tick lands one `period` from now; `on_tick` decides
    /// whether the ticker keeps going.
    pub async fn spawn_ticker<F, Fut>(&self, key: TickerKey, period: Duration, mut on_tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = TickerControl> + Send + 'static,
    {
        let mut tickers = self.tickers.lock().await;
        if let Some(handle) = tickers.remove(&key) {
            handle.abort();
        }

        let period = period.max(MIN_PERIOD);
        let label = format!("{}/{}", key.0, key.1);
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if on_tick().await == TickerControl::Stop {
                    log_info!("ticker {label} stood down");
                    break;
                }
            }
        });

        tickers.insert(key, handle);
    }

    pub async fn cancel_ticker(&self, key: &TickerKey) -> bool {
        match self.tickers.lock().await.remove(key) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub async fn cancel_all(&self) {
        for (_, handle) in self.tickers.lock().await.drain() {
            handle.abort();
        }
    }

    /// Keys whose ticker task is still alive.
    pub async fn armed(&self) -> Vec<TickerKey> {
        self.tickers
            .lock()
            .await
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(key, _)| key.clone())
            .collect()
    }
}
