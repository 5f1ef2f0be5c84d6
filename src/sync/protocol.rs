use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::models::{Bucket, DayContent, Group, WindowBounds};
use crate::store::StoreResult;

pub mod channels {
    pub const GROUPS_LIST: &str = "groups:list";
    pub const GROUPS_CREATE: &str = "groups:create";
    pub const GROUPS_UPDATE: &str = "groups:update";
    pub const GROUPS_DELETE: &str = "groups:delete";
    pub const DAY_CONTENT_GET: &str = "dayContent:get";
    pub const DAY_CONTENT_SET: &str = "dayContent:set";
    pub const STICKY_NOTE_OPEN: &str = "stickyNote:open";
    pub const STICKY_NOTE_SET_ALWAYS_ON_TOP: &str = "stickyNote:setAlwaysOnTop";
    pub const STICKY_NOTE_UPDATE_POSITION: &str = "stickyNote:updatePosition";
    pub const STICKY_NOTE_GET_POSITION: &str = "stickyNote:getPosition";
    pub const STICKY_NOTE_CLOSE: &str = "stickyNote:close";
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupPayload {
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteGroupPayload {
    pub id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DayContentQuery {
    pub group_id: String,
    pub date_key: Bucket,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SetDayContentPayload {
    pub group_id: String,
    pub day_content: DayContent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupIdPayload {
    pub group_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AlwaysOnTopPayload {
    pub group_id: String,
    pub always_on_top: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PositionPayload {
    pub group_id: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PositionPayload {
    pub fn new(group_id: impl Into<String>, bounds: WindowBounds) -> Self {
        Self {
            group_id: group_id.into(),
            x: bounds.x,
            y: bounds.y,
            width: bounds.width,
            height: bounds.height,
        }
    }

    pub fn bounds(&self) -> WindowBounds {
        WindowBounds {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

pub type Reply<T> = oneshot::Sender<StoreResult<T>>;

/// One message to the store service. Requests with a reply slot resolve once the
/// service has applied them; the others are fire-and-forget.
pub enum Request {
    ListGroups {
        reply: Reply<Vec<Group>>,
    },
    CreateGroup {
        payload: CreateGroupPayload,
        reply: Reply<Group>,
    },
    UpdateGroup {
        group: Group,
        reply: Reply<Group>,
    },
    DeleteGroup {
        payload: DeleteGroupPayload,
        reply: Reply<DeleteResponse>,
    },
    GetDayContent {
        query: DayContentQuery,
        reply: Reply<Option<DayContent>>,
    },
    SetDayContent {
        payload: SetDayContentPayload,
        reply: Reply<DayContent>,
    },
    OpenNote {
        payload: GroupIdPayload,
    },
    SetAlwaysOnTop {
        payload: AlwaysOnTopPayload,
        reply: Reply<bool>,
    },
    UpdatePosition {
        payload: PositionPayload,
        reply: Reply<bool>,
    },
    GetPosition {
        payload: GroupIdPayload,
        reply: Reply<Option<WindowBounds>>,
    },
    CloseNote {
        payload: GroupIdPayload,
    },
}

impl Request {
    pub fn channel(&self) -> &'static str {
        match self {
            Request::ListGroups { .. } => channels::GROUPS_LIST,
            Request::CreateGroup { .. } => channels::GROUPS_CREATE,
            Request::UpdateGroup { .. } => channels::GROUPS_UPDATE,
            Request::DeleteGroup { .. } => channels::GROUPS_DELETE,
            Request::GetDayContent { .. } => channels::DAY_CONTENT_GET,
            Request::SetDayContent { .. } => channels::DAY_CONTENT_SET,
            Request::OpenNote { .. } => channels::STICKY_NOTE_OPEN,
            Request::SetAlwaysOnTop { .. } => channels::STICKY_NOTE_SET_ALWAYS_ON_TOP,
            Request::UpdatePosition { .. } => channels::STICKY_NOTE_UPDATE_POSITION,
            Request::GetPosition { .. } => channels::STICKY_NOTE_GET_POSITION,
            Request::CloseNote { .. } => channels::STICKY_NOTE_CLOSE,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn payloads_use_camel_case_keys() {
        let query: DayContentQuery =
            serde_json::from_value(json!({"groupId": "g1", "dateKey": "2024-06-03"})).unwrap();
        assert_eq!(query.group_id, "g1");
        assert_eq!(query.date_key.to_string(), "2024-06-03");

        let forever: DayContentQuery =
            serde_json::from_value(json!({"groupId": "g1", "dateKey": "forever"})).unwrap();
        assert_eq!(forever.date_key, Bucket::Forever);

        let on_top = serde_json::to_value(AlwaysOnTopPayload {
            group_id: "g1".into(),
            always_on_top: true,
        })
        .unwrap();
        assert_eq!(on_top, json!({"groupId": "g1", "alwaysOnTop": true}));
    }

    #[test]
    fn position_payload_flattens_bounds() {
        let bounds = WindowBounds { x: -20, y: 40, width: 320, height: 400 };
        let payload = PositionPayload::new("g1", bounds);
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"groupId": "g1", "x": -20, "y": 40, "width": 320, "height": 400})
        );
        assert_eq!(payload.bounds(), bounds);
    }

    #[test]
    fn malformed_date_keys_are_rejected() {
        let parsed = serde_json::from_value::<DayContentQuery>(
            json!({"groupId": "g1", "dateKey": "June 3rd"}),
        );
        assert!(parsed.is_err());
    }
}
