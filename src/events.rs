//! JSON frames exchanged over `/socket`: `{"event": <name>, "data": <payload>}`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::db::Message;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "joinRooms")]
    JoinRooms(JoinRooms),
    #[serde(rename = "leave-room")]
    LeaveRoom(LeaveRoom),
    #[serde(rename = "sent-message")]
    SentMessage(SentMessage),
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::JoinRooms(_) => "joinRooms",
            ClientEvent::LeaveRoom(_) => "leave-room",
            ClientEvent::SentMessage(_) => "sent-message",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinRooms {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub rooms: Vec<AnnouncedRoom>,
}

/// Clients also send the member list they know about; the stored member
/// list is what counts, so only the id is read.
#[derive(Debug, Clone, Deserialize)]
pub struct AnnouncedRoom {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeaveRoom {
    pub room: String,
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SentMessage {
    pub room: String,
    pub message: MessageText,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageText {
    pub msg: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "online")]
    Online {
        #[serde(rename = "userId")]
        user_id: String,
    },
    #[serde(rename = "online-users")]
    OnlineUsers {
        #[serde(rename = "onlineUsers")]
        online_users: HashMap<String, bool>,
    },
    #[serde(rename = "user-left")]
    UserLeft(UserLeft),
    #[serde(rename = "message")]
    Message(RoomMessage),
    #[serde(rename = "offline")]
    Offline {
        #[serde(rename = "userId")]
        user_id: String,
    },
    #[serde(rename = "error")]
    Error { event: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserLeft {
    pub room: String,
    pub id: String,
    pub name: String,
    #[serde(rename = "Date", with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomMessage {
    pub room: String,
    pub message: Message,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_client_frames() {
        let frame = json!({
            "event": "joinRooms",
            "data": { "userId": "u1", "rooms": [{ "id": "r1", "users": ["u1", "u2"] }] }
        });
        let ClientEvent::JoinRooms(join) = serde_json::from_value::<ClientEvent>(frame).unwrap() else {
            panic!("expected joinRooms");
        };
        assert_eq!(join.user_id, "u1");
        assert_eq!(join.rooms[0].id, "r1");

        let frame = json!({ "event": "sent-message", "data": { "room": "r1", "message": { "msg": "hi" } } });
        let event: ClientEvent = serde_json::from_value(frame).unwrap();
        assert_eq!(event.name(), "sent-message");

        let frame = json!({ "event": "typing", "data": {} });
        assert!(serde_json::from_value::<ClientEvent>(frame).is_err());
    }

    #[test]
    fn server_frames_use_wire_names() {
        let online = serde_json::to_value(ServerEvent::Online { user_id: "u1".into() }).unwrap();
        assert_eq!(online, json!({ "event": "online", "data": { "userId": "u1" } }));

        let users = ServerEvent::OnlineUsers { online_users: HashMap::from([("u2".to_owned(), false)]) };
        assert_eq!(
            serde_json::to_value(users).unwrap(),
            json!({ "event": "online-users", "data": { "onlineUsers": { "u2": false } } })
        );

        let left = ServerEvent::UserLeft(UserLeft {
            room: "r1".into(),
            id: "u1".into(),
            name: "Bob".into(),
            date: OffsetDateTime::UNIX_EPOCH,
        });
        assert_eq!(
            serde_json::to_value(left).unwrap(),
            json!({
                "event": "user-left",
                "data": { "room": "r1", "id": "u1", "name": "Bob", "Date": "1970-01-01T00:00:00Z" }
            })
        );
    }
}
