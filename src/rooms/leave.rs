use sqlx::SqlitePool;

use crate::{
    appresult::ChatError,
    db::{self, Message},
    events::{ServerEvent, UserLeft},
    hub::Hub,
    presence::{ConnId, Presence},
};

/// Takes `user_id` out of `room_id` on both sides of the membership,
/// records a "<name> left" notice and tells the rest of the room.
///
/// The three writes are independent: each is attempted even if an earlier
/// one failed, and nothing is rolled back. The room only hears about the
/// departure once all of them went through.
///
/// Every socket of the user is unsubscribed, not just `conn_id`.
pub(crate) async fn leave_room(
    db_pool: &SqlitePool,
    hub: &Hub,
    presence: &Presence,
    conn_id: ConnId,
    user_id: &str,
    room_id: &str,
    name: &str,
) -> Result<UserLeft, ChatError> {
    if !db::rooms::is_member(db_pool, room_id, user_id).await? {
        return Err(ChatError::NotMember {
            user_id: user_id.to_owned(),
            room_id: room_id.to_owned(),
        });
    }

    let notice = Message::system(format!("{name} left"));

    let pulled_member = db::rooms::pull_member(db_pool, room_id, user_id).await;
    let appended = db::rooms::push_message(db_pool, room_id, &notice).await;
    let pulled_room = db::users::pull_room(db_pool, user_id, room_id).await;

    hub.leave_channel(conn_id, room_id);
    for tab in presence.connections(user_id) {
        hub.leave_channel(tab, room_id);
    }

    pulled_member?;
    appended?;
    pulled_room?;

    let left = UserLeft {
        room: room_id.to_owned(),
        id: user_id.to_owned(),
        name: name.to_owned(),
        date: notice.date,
    };
    hub.to_room_except(room_id, conn_id, ServerEvent::UserLeft(left.clone()));
    tracing::info!(user_id, room_id, "{name} left");

    Ok(left)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        db::{test_pool, SYSTEM_SENDER},
        rooms::msg::send_message,
    };

    #[tokio::test]
    async fn leaving_updates_both_sides_and_notifies_the_room() {
        let db_pool = test_pool().await;
        let hub = Hub::new();
        let presence = Presence::new();
        let room = db::rooms::create(&db_pool, "R").await.unwrap();
        for user_id in ["A", "B"] {
            db::rooms::push_member(&db_pool, &room.id, user_id).await.unwrap();
            db::users::push_room(&db_pool, user_id, &room.id).await.unwrap();
        }

        let (conn_a, mut rx_a) = hub.connect();
        let (conn_b, mut rx_b) = hub.connect();
        hub.join_channel(conn_a, &room.id);
        hub.join_channel(conn_b, &room.id);

        let left = leave_room(&db_pool, &hub, &presence, conn_b, "B", &room.id, "Bob").await.unwrap();

        assert_eq!(db::rooms::member_ids(&db_pool, &room.id).await.unwrap(), ["A"]);
        assert!(db::users::room_ids(&db_pool, "B").await.unwrap().is_empty());

        let last = db::rooms::messages(&db_pool, &room.id).await.unwrap().pop().unwrap();
        assert_eq!(last.msg, "Bob left");
        assert_eq!(last.user_sent, SYSTEM_SENDER);

        assert_eq!(rx_a.try_recv().unwrap(), ServerEvent::UserLeft(left));
        assert!(rx_b.try_recv().is_err());
        assert!(!hub.is_subscribed(conn_b, &room.id));
    }

    #[tokio::test]
    async fn non_members_cannot_leave() {
        let db_pool = test_pool().await;
        let hub = Hub::new();
        let room = db::rooms::create(&db_pool, "R").await.unwrap();
        let (conn, _rx) = hub.connect();

        let err = leave_room(&db_pool, &hub, &Presence::new(), conn, "C", &room.id, "Carl").await.unwrap_err();
        assert!(matches!(err, ChatError::NotMember { .. }));
        assert!(db::rooms::messages(&db_pool, &room.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn leaving_from_one_tab_closes_the_room_in_every_tab() {
        let db_pool = test_pool().await;
        let hub = Hub::new();
        let presence = Presence::new();
        let room = db::rooms::create(&db_pool, "R").await.unwrap();
        for user_id in ["A", "B"] {
            db::rooms::push_member(&db_pool, &room.id, user_id).await.unwrap();
            db::users::push_room(&db_pool, user_id, &room.id).await.unwrap();
        }

        let (conn_a, _rx_a) = hub.connect();
        let (tab1, _rx1) = hub.connect();
        let (tab2, mut rx2) = hub.connect();
        for (user_id, conn) in [("A", conn_a), ("B", tab1), ("B", tab2)] {
            presence.register(user_id, conn);
            hub.join_channel(conn, &room.id);
        }

        leave_room(&db_pool, &hub, &presence, tab1, "B", &room.id, "Bob").await.unwrap();
        assert!(!hub.is_subscribed(tab1, &room.id));
        assert!(!hub.is_subscribed(tab2, &room.id));
        assert!(rx2.try_recv().is_err());

        let err = send_message(&db_pool, &hub, tab2, "B", &room.id, "still here").await.unwrap_err();
        assert!(matches!(err, ChatError::NotSubscribed(_)));

        send_message(&db_pool, &hub, conn_a, "A", &room.id, "private").await.unwrap();
        assert!(rx2.try_recv().is_err());

        let stored: Vec<_> = db::rooms::messages(&db_pool, &room.id)
            .await
            .unwrap()
            .into_iter()
            .map(|message| (message.msg, message.user_sent))
            .collect();
        assert_eq!(
            stored,
            [
                ("Bob left".to_owned(), SYSTEM_SENDER.to_owned()),
                ("private".to_owned(), "A".to_owned()),
            ]
        );
    }
}
