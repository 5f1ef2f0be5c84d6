use std::sync::Arc;

use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use crate::store::{ContentStore, StoreResult};
use crate::windows::{WindowHost, WindowRegistry};

use super::client::StoreClient;
use super::protocol::{DeleteResponse, Request};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// Owns the content store and the window registry. Requests are applied one at a
/// time, in the order they arrive.
pub struct StoreService {
    store: ContentStore,
    registry: WindowRegistry,
    requests: mpsc::UnboundedReceiver<Request>,
}

impl StoreService {
    /// Starts the service task. It runs until every client handle is dropped.
    pub fn spawn(store: ContentStore, host: Arc<dyn WindowHost>) -> (StoreClient, JoinHandle<()>) {
        let (sender, requests) = mpsc::unbounded_channel();
        let service = StoreService {
            store,
            registry: WindowRegistry::new(host),
            requests,
        };
        let handle = tokio::spawn(service.run());
        (StoreClient::new(sender), handle)
    }

    async fn run(mut self) {
        log_info!("store service started");
        while let Some(request) = self.requests.recv().await {
            self.handle(request).await;
        }
        log_info!("store service stopped; no clients left");
    }

    async fn handle(&mut self, request: Request) {
        let channel = request.channel();
        match request {
            Request::ListGroups { reply } => {
                respond(channel, reply, self.store.list_groups().await);
            }
            Request::CreateGroup { payload, reply } => {
                respond(channel, reply, self.store.create_group(&payload.title).await);
            }
            Request::UpdateGroup { group, reply } => {
                respond(channel, reply, self.store.update_group(group).await);
            }
            Request::DeleteGroup { payload, reply } => {
                let result = self.store.delete_group(&payload.id).await;
                if result.is_ok() {
                    self.registry.close(&payload.id);
                }
                respond(channel, reply, result.map(|()| DeleteResponse { success: true }));
            }
            Request::GetDayContent { query, reply } => {
                let result = self.store.get_day_content(&query.group_id, query.date_key).await;
                respond(channel, reply, result);
            }
            Request::SetDayContent { payload, reply } => {
                let result = self
                    .store
                    .set_day_content(&payload.group_id, payload.day_content)
                    .await;
                respond(channel, reply, result);
            }
            Request::OpenNote { payload } => {
                // Fetched fresh so a focused window picks up the current visibility.
                match self.store.find_group(&payload.group_id).await {
                    Ok(group) => {
                        if let Err(err) = self.registry.open(&group) {
                            log_error!("failed to open window for group {}: {err:#}", group.id);
                        }
                    }
                    Err(err) => log_warn!("not opening window for {}: {err}", payload.group_id),
                }
            }
            Request::SetAlwaysOnTop { payload, reply } => {
                let applied = self
                    .registry
                    .set_always_on_top(&payload.group_id, payload.always_on_top);
                respond(channel, reply, Ok(applied));
            }
            Request::UpdatePosition { payload, reply } => {
                let applied = self
                    .registry
                    .update_position(&payload.group_id, payload.bounds());
                respond(channel, reply, Ok(applied));
            }
            Request::GetPosition { payload, reply } => {
                respond(channel, reply, Ok(self.registry.position(&payload.group_id)));
            }
            Request::CloseNote { payload } => {
                self.registry.close(&payload.group_id);
            }
        }
    }
}

fn respond<T>(channel: &str, reply: oneshot::Sender<StoreResult<T>>, result: StoreResult<T>) {
    if let Err(err) = &result {
        log_warn!("{channel} failed: {err}");
    }
    // The caller may have gone away (window closed mid-request); the work is done
    // either way.
    let _ = reply.send(result);
}
