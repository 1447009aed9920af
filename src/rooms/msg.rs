use sqlx::SqlitePool;

use crate::{
    appresult::ChatError,
    db::{self, Message},
    events::{RoomMessage, ServerEvent},
    hub::Hub,
    presence::ConnId,
};

/// Stores a message from `user_id` and relays it to everyone else in the
/// room. The sender already shows its own copy, so it gets nothing back.
pub(crate) async fn send_message(
    db_pool: &SqlitePool,
    hub: &Hub,
    conn_id: ConnId,
    user_id: &str,
    room_id: &str,
    text: &str,
) -> Result<Message, ChatError> {
    if !hub.is_subscribed(conn_id, room_id) {
        return Err(ChatError::NotSubscribed(room_id.to_owned()));
    }
    if !db::rooms::is_member(db_pool, room_id, user_id).await? {
        return Err(ChatError::NotMember {
            user_id: user_id.to_owned(),
            room_id: room_id.to_owned(),
        });
    }
    if text.trim().is_empty() {
        return Err(ChatError::EmptyMessage);
    }

    let message = Message::new(text, user_id);
    db::rooms::push_message(db_pool, room_id, &message).await?;

    let reached = hub.to_room_except(
        room_id,
        conn_id,
        ServerEvent::Message(RoomMessage {
            room: room_id.to_owned(),
            message: message.clone(),
        }),
    );
    tracing::debug!(room_id, user_id, reached, "message relayed");

    Ok(message)
}
