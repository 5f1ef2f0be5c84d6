use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::models::{Bucket, DayContent, Group, WindowBounds};
use crate::store::{StoreError, StoreResult};

use super::protocol::{
    channels, AlwaysOnTopPayload, CreateGroupPayload, DayContentQuery, DeleteGroupPayload,
    DeleteResponse, GroupIdPayload, PositionPayload, Reply, Request, SetDayContentPayload,
};

/// Handle to the store service. Cheap to clone; one per window.
#[derive(Clone)]
pub struct StoreClient {
    sender: mpsc::UnboundedSender<Request>,
}

impl StoreClient {
    pub(crate) fn new(sender: mpsc::UnboundedSender<Request>) -> Self {
        Self { sender }
    }

    async fn call<T>(&self, build: impl FnOnce(Reply<T>) -> Request) -> StoreResult<T> {
        let (reply, response) = oneshot::channel();
        self.send(build(reply))?;
        response.await.map_err(|_| StoreError::ServiceStopped)?
    }

    fn send(&self, request: Request) -> StoreResult<()> {
        self.sender
            .send(request)
            .map_err(|_| StoreError::ServiceStopped)
    }

    pub async fn list_groups(&self) -> StoreResult<Vec<Group>> {
        self.call(|reply| Request::ListGroups { reply }).await
    }

    pub async fn create_group(&self, title: &str) -> StoreResult<Group> {
        let payload = CreateGroupPayload {
            title: title.to_string(),
        };
        self.call(|reply| Request::CreateGroup { payload, reply }).await
    }

    pub async fn update_group(&self, group: Group) -> StoreResult<Group> {
        self.call(|reply| Request::UpdateGroup { group, reply }).await
    }

    pub async fn delete_group(&self, id: &str) -> StoreResult<DeleteResponse> {
        let payload = DeleteGroupPayload { id: id.to_string() };
        self.call(|reply| Request::DeleteGroup { payload, reply }).await
    }

    pub async fn get_day_content(
        &self,
        group_id: &str,
        date_key: Bucket,
    ) -> StoreResult<Option<DayContent>> {
        let query = DayContentQuery {
            group_id: group_id.to_string(),
            date_key,
        };
        self.call(|reply| Request::GetDayContent { query, reply }).await
    }

    pub async fn set_day_content(
        &self,
        group_id: &str,
        day_content: DayContent,
    ) -> StoreResult<DayContent> {
        let payload = SetDayContentPayload {
            group_id: group_id.to_string(),
            day_content,
        };
        self.call(|reply| Request::SetDayContent { payload, reply }).await
    }

    /// Fire-and-forget: opens the group's window or focuses the existing one.
    pub fn open_note(&self, group_id: &str) -> StoreResult<()> {
        self.send(Request::OpenNote {
            payload: group_id_payload(group_id),
        })
    }

    pub async fn set_always_on_top(&self, group_id: &str, always_on_top: bool) -> StoreResult<bool> {
        let payload = AlwaysOnTopPayload {
            group_id: group_id.to_string(),
            always_on_top,
        };
        self.call(|reply| Request::SetAlwaysOnTop { payload, reply }).await
    }

    pub async fn update_position(&self, group_id: &str, bounds: WindowBounds) -> StoreResult<bool> {
        let payload = PositionPayload::new(group_id, bounds);
        self.call(|reply| Request::UpdatePosition { payload, reply }).await
    }

    pub async fn get_position(&self, group_id: &str) -> StoreResult<Option<WindowBounds>> {
        let payload = group_id_payload(group_id);
        self.call(|reply| Request::GetPosition { payload, reply }).await
    }

    /// Fire-and-forget: a window announcing that it closed itself.
    pub fn close_note(&self, group_id: &str) -> StoreResult<()> {
        self.send(Request::CloseNote {
            payload: group_id_payload(group_id),
        })
    }

    /// Routes a JSON payload by channel name. Fire-and-forget channels answer
    /// `null` once the request is queued.
    pub async fn invoke(&self, channel: &str, payload: Value) -> StoreResult<Value> {
        match channel {
            channels::GROUPS_LIST => to_json(self.list_groups().await?),
            channels::GROUPS_CREATE => {
                let payload: CreateGroupPayload = from_json(channel, payload)?;
                to_json(self.create_group(&payload.title).await?)
            }
            channels::GROUPS_UPDATE => to_json(self.update_group(from_json(channel, payload)?).await?),
            channels::GROUPS_DELETE => {
                let payload: DeleteGroupPayload = from_json(channel, payload)?;
                to_json(self.delete_group(&payload.id).await?)
            }
            channels::DAY_CONTENT_GET => {
                let query: DayContentQuery = from_json(channel, payload)?;
                to_json(self.get_day_content(&query.group_id, query.date_key).await?)
            }
            channels::DAY_CONTENT_SET => {
                let payload: SetDayContentPayload = from_json(channel, payload)?;
                to_json(
                    self.set_day_content(&payload.group_id, payload.day_content)
                        .await?,
                )
            }
            channels::STICKY_NOTE_OPEN => {
                let payload: GroupIdPayload = from_json(channel, payload)?;
                self.open_note(&payload.group_id)?;
                Ok(Value::Null)
            }
            channels::STICKY_NOTE_SET_ALWAYS_ON_TOP => {
                let payload: AlwaysOnTopPayload = from_json(channel, payload)?;
                to_json(
                    self.set_always_on_top(&payload.group_id, payload.always_on_top)
                        .await?,
                )
            }
            channels::STICKY_NOTE_UPDATE_POSITION => {
                let payload: PositionPayload = from_json(channel, payload)?;
                to_json(
                    self.update_position(&payload.group_id, payload.bounds())
                        .await?,
                )
            }
            channels::STICKY_NOTE_GET_POSITION => {
                let payload: GroupIdPayload = from_json(channel, payload)?;
                to_json(self.get_position(&payload.group_id).await?)
            }
            channels::STICKY_NOTE_CLOSE => {
                let payload: GroupIdPayload = from_json(channel, payload)?;
                self.close_note(&payload.group_id)?;
                Ok(Value::Null)
            }
            other => Err(StoreError::InvalidRequest(format!("unknown channel {other}"))),
        }
    }
}

fn group_id_payload(group_id: &str) -> GroupIdPayload {
    GroupIdPayload {
        group_id: group_id.to_string(),
    }
}

fn from_json<T: DeserializeOwned>(channel: &str, payload: Value) -> StoreResult<T> {
    serde_json::from_value(payload)
        .map_err(|err| StoreError::InvalidRequest(format!("bad payload for {channel}: {err}")))
}

fn to_json<T: Serialize>(value: T) -> StoreResult<Value> {
    serde_json::to_value(value)
        .map_err(|err| StoreError::InvalidRequest(format!("unserializable response: {err}")))
}
