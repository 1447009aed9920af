use std::collections::HashMap;

use axum::{
    debug_handler,
    extract::{ws::{Message as WsMessage, WebSocket}, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use tokio::task::JoinHandle;
use tower_sessions::Session;

use crate::{
    appresult::ChatError,
    db,
    events::{ClientEvent, JoinRooms, LeaveRoom, SentMessage, ServerEvent},
    hub::Outbox,
    presence::ConnId,
    session::USER_ID,
    AppResult, AppState,
};

use super::{leave::leave_room, msg::send_message};

#[debug_handler(state = AppState)]
pub(crate) async fn socket(
    State(state): State<AppState>,
    session: Session,
    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let Some(user_id) = session.get::<String>(USER_ID).await? else {
        return Ok(StatusCode::UNAUTHORIZED.into_response());
    };

    Ok(ws.on_upgrade(move |stream| run(state, user_id, stream)))
}

async fn run(state: AppState, user_id: String, stream: WebSocket) {
    let (mut conn, mut outbox) = Connection::open(state, user_id);
    let (mut sender, mut receiver) = stream.split();

    let mut writer = tokio::spawn(async move {
        while let Some(event) = outbox.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(err) => {
                    tracing::error!(%err, "couldn't encode event");
                    continue;
                }
            };
            if sender.send(WsMessage::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            frame = receiver.next() => {
                let Some(Ok(frame)) = frame else { break };
                match frame {
                    WsMessage::Text(text) => match serde_json::from_str::<ClientEvent>(text.as_str()) {
                        Ok(event) => conn.handle(event).await,
                        Err(err) => tracing::warn!(conn_id = %conn.id, %err, "ignoring malformed frame"),
                    },
                    WsMessage::Close(_) => break,
                    _ => {}
                }
            }
            _ = &mut writer => break,
        }
    }

    conn.close().await;
    writer.abort();
}

/// Server side of one socket, bound to the signed-in user that opened it.
pub(crate) struct Connection {
    pub(crate) id: ConnId,
    user_id: String,
    state: AppState,
    announcements: Vec<JoinHandle<()>>,
}

impl Connection {
    pub(crate) fn open(state: AppState, user_id: String) -> (Connection, Outbox) {
        let (id, outbox) = state.hub.connect();
        tracing::debug!(conn_id = %id, %user_id, "socket opened");
        (
            Connection {
                id,
                user_id,
                state,
                announcements: Vec::new(),
            },
            outbox,
        )
    }

    pub(crate) async fn handle(&mut self, event: ClientEvent) {
        let name = event.name();
        let result = match event {
            ClientEvent::JoinRooms(join) => self.join_rooms(join).await,
            ClientEvent::LeaveRoom(leave) => self.leave_room(leave).await,
            ClientEvent::SentMessage(sent) => self.sent_message(sent).await,
        };

        if let Err(err) = result {
            tracing::warn!(conn_id = %self.id, user_id = %self.user_id, event = name, %err, "event failed");
            self.state.hub.to_conn(self.id, ServerEvent::Error {
                event: name.to_owned(),
                message: err.to_string(),
            });
        }
    }

    fn check_identity(&self, claimed: &str) -> Result<(), ChatError> {
        if claimed != self.user_id {
            return Err(ChatError::IdentityMismatch(claimed.to_owned()));
        }
        Ok(())
    }

    async fn join_rooms(&mut self, JoinRooms { user_id, rooms }: JoinRooms) -> Result<(), ChatError> {
        self.check_identity(&user_id)?;
        let AppState { db_pool, presence, hub, config, .. } = &self.state;

        if presence.register(&self.user_id, self.id) {
            tracing::info!(user_id = %self.user_id, "online");
        }

        let memberships = db::users::room_ids(db_pool, &self.user_id).await?;
        let mut joined = Vec::new();
        let mut online_users = HashMap::new();
        for room in rooms {
            if !memberships.contains(&room.id) {
                tracing::debug!(user_id = %self.user_id, room_id = %room.id, "skipping room the user is not in");
                continue;
            }
            hub.join_channel(self.id, &room.id);

            let members = db::rooms::member_ids(db_pool, &room.id).await?;
            online_users.extend(presence.online_status(members.iter().map(String::as_str)));
            joined.push(room.id);
        }

        hub.to_conn(self.id, ServerEvent::OnlineUsers { online_users });

        let hub = hub.clone();
        let delay = config.online_delay;
        let (conn_id, user_id) = (self.id, self.user_id.clone());
        self.announcements.retain(|task| !task.is_finished());
        self.announcements.push(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            for room_id in &joined {
                hub.to_room_except(room_id, conn_id, ServerEvent::Online { user_id: user_id.clone() });
            }
        }));

        Ok(())
    }

    /// The notice uses the stored display name; the one in the frame is only
    /// a fallback for a user record that has gone missing.
    async fn leave_room(&mut self, LeaveRoom { room, id, name }: LeaveRoom) -> Result<(), ChatError> {
        self.check_identity(&id)?;
        let AppState { db_pool, presence, hub, .. } = &self.state;

        let name = match db::users::find_by_id(db_pool, &self.user_id).await? {
            Some(user) => user.name,
            None => name,
        };
        leave_room(db_pool, hub, presence, self.id, &self.user_id, &room, &name).await?;
        Ok(())
    }

    async fn sent_message(&mut self, SentMessage { room, message }: SentMessage) -> Result<(), ChatError> {
        send_message(&self.state.db_pool, &self.state.hub, self.id, &self.user_id, &room, &message.msg).await?;
        Ok(())
    }

    /// Tears the connection down. Pending online announcements are dropped,
    /// and if this was the user's last socket their rooms hear `offline`.
    pub(crate) async fn close(mut self) {
        for task in self.announcements.drain(..) {
            task.abort();
        }

        let AppState { db_pool, presence, hub, .. } = &self.state;
        hub.disconnect(self.id);
        tracing::debug!(conn_id = %self.id, user_id = %self.user_id, "socket closed");

        let Some(user_id) = presence.unregister(self.id) else {
            return;
        };
        tracing::info!(%user_id, "offline");

        match db::users::room_ids(db_pool, &user_id).await {
            Ok(room_ids) => {
                for room_id in room_ids {
                    hub.to_room(&room_id, ServerEvent::Offline { user_id: user_id.clone() });
                }
            }
            Err(err) => tracing::error!(%user_id, %err, "couldn't load rooms for offline notice"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;
    use crate::{config::Config, db::test_pool};

    async fn state_with_room(online_delay: Duration) -> (AppState, String) {
        let db_pool = test_pool().await;
        let config = Config {
            online_delay,
            ..Config::default()
        };
        let room = db::rooms::create(&db_pool, "R").await.unwrap();
        for user_id in ["A", "B"] {
            db::rooms::push_member(&db_pool, &room.id, user_id).await.unwrap();
            db::users::push_room(&db_pool, user_id, &room.id).await.unwrap();
        }
        (AppState::new(db_pool, config).unwrap(), room.id)
    }

    fn join(user_id: &str, room_id: &str) -> ClientEvent {
        serde_json::from_value(serde_json::json!({
            "event": "joinRooms",
            "data": { "userId": user_id, "rooms": [{ "id": room_id, "users": ["A", "B"] }] }
        }))
        .unwrap()
    }

    async fn next(outbox: &mut Outbox) -> ServerEvent {
        timeout(Duration::from_secs(2), outbox.recv()).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn join_reports_room_mates_then_announces_after_the_delay() {
        let (state, room_id) = state_with_room(Duration::from_millis(20)).await;

        let (mut b, mut rx_b) = Connection::open(state.clone(), "B".to_owned());
        b.handle(join("B", &room_id)).await;
        let ServerEvent::OnlineUsers { online_users } = next(&mut rx_b).await else {
            panic!("expected online-users");
        };
        assert_eq!(online_users, HashMap::from([("A".to_owned(), false), ("B".to_owned(), true)]));

        let (mut a, mut rx_a) = Connection::open(state.clone(), "A".to_owned());
        a.handle(join("A", &room_id)).await;
        let ServerEvent::OnlineUsers { online_users } = next(&mut rx_a).await else {
            panic!("expected online-users");
        };
        assert!(online_users["A"] && online_users["B"]);

        // B never hears its own announcement.
        assert_eq!(next(&mut rx_b).await, ServerEvent::Online { user_id: "A".to_owned() });

        a.close().await;
        assert_eq!(next(&mut rx_b).await, ServerEvent::Offline { user_id: "A".to_owned() });
        assert!(!state.presence.is_online("A"));
    }

    #[tokio::test]
    async fn closing_inside_the_delay_cancels_the_announcement() {
        let (state, room_id) = state_with_room(Duration::from_millis(200)).await;

        let (mut b, mut rx_b) = Connection::open(state.clone(), "B".to_owned());
        b.handle(join("B", &room_id)).await;
        next(&mut rx_b).await;

        let (mut a, _rx_a) = Connection::open(state.clone(), "A".to_owned());
        a.handle(join("A", &room_id)).await;
        a.close().await;

        assert_eq!(next(&mut rx_b).await, ServerEvent::Offline { user_id: "A".to_owned() });
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn second_tab_keeps_the_user_online() {
        let (state, room_id) = state_with_room(Duration::from_millis(5)).await;

        let (mut tab1, _rx1) = Connection::open(state.clone(), "A".to_owned());
        let (mut tab2, _rx2) = Connection::open(state.clone(), "A".to_owned());
        tab1.handle(join("A", &room_id)).await;
        tab2.handle(join("A", &room_id)).await;

        tab1.close().await;
        assert!(state.presence.is_online("A"));
        tab2.close().await;
        assert!(!state.presence.is_online("A"));
    }

    #[tokio::test]
    async fn foreign_identities_and_rooms_are_refused() {
        let (state, room_id) = state_with_room(Duration::from_millis(5)).await;
        let (mut a, mut rx_a) = Connection::open(state.clone(), "A".to_owned());

        a.handle(join("B", &room_id)).await;
        let ServerEvent::Error { event, .. } = next(&mut rx_a).await else {
            panic!("expected error");
        };
        assert_eq!(event, "joinRooms");
        assert!(!state.presence.is_online("A"));

        a.handle(join("A", "not-my-room")).await;
        next(&mut rx_a).await;
        assert!(!state.hub.is_subscribed(a.id, "not-my-room"));
        assert!(!state.hub.is_subscribed(a.id, &room_id));
    }

    #[tokio::test]
    async fn leave_notice_uses_the_stored_name() {
        let db_pool = test_pool().await;
        let user = db::users::create_local(&db_pool, "Bob", "bob@example.com", "hash").await.unwrap();
        let room = db::rooms::create(&db_pool, "R").await.unwrap();
        db::rooms::push_member(&db_pool, &room.id, &user.id).await.unwrap();
        db::users::push_room(&db_pool, &user.id, &room.id).await.unwrap();
        let state = AppState::new(db_pool.clone(), Config::default()).unwrap();

        let (mut tab, mut rx) = Connection::open(state, user.id.clone());
        let leave = serde_json::from_value(serde_json::json!({
            "event": "leave-room",
            "data": { "room": room.id, "id": user.id, "name": "Somebody Else" }
        }))
        .unwrap();
        tab.handle(leave).await;

        assert!(rx.try_recv().is_err());
        let last = db::rooms::messages(&db_pool, &room.id).await.unwrap().pop().unwrap();
        assert_eq!(last.msg, "Bob left");
    }
}
