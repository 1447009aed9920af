use sqlx::SqlitePool;

use super::{new_id, Message, Room};

pub async fn create(db_pool: &SqlitePool, name: &str) -> Result<Room, sqlx::Error> {
    let room = Room {
        id: new_id(),
        name: name.to_owned(),
    };
    sqlx::query("INSERT INTO rooms (id,name) VALUES (?,?)")
        .bind(&room.id)
        .bind(&room.name)
        .execute(db_pool)
        .await?;
    Ok(room)
}

pub async fn find(db_pool: &SqlitePool, room_id: &str) -> Result<Option<Room>, sqlx::Error> {
    sqlx::query_as("SELECT id,name FROM rooms WHERE id=?")
        .bind(room_id)
        .fetch_optional(db_pool)
        .await
}

pub async fn set_name(db_pool: &SqlitePool, room_id: &str, name: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE rooms SET name=? WHERE id=?")
        .bind(name)
        .bind(room_id)
        .execute(db_pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn member_ids(db_pool: &SqlitePool, room_id: &str) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT user_id FROM room_members WHERE room_id=? ORDER BY user_id")
        .bind(room_id)
        .fetch_all(db_pool)
        .await?;
    Ok(rows.into_iter().map(|(user_id,)| user_id).collect())
}

pub async fn is_member(db_pool: &SqlitePool, room_id: &str, user_id: &str) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM room_members WHERE room_id=? AND user_id=?")
        .bind(room_id)
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(row.is_some())
}

pub async fn push_member(db_pool: &SqlitePool, room_id: &str, user_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO room_members (room_id,user_id) VALUES (?,?)")
        .bind(room_id)
        .bind(user_id)
        .execute(db_pool)
        .await?;
    Ok(())
}

pub async fn pull_member(db_pool: &SqlitePool, room_id: &str, user_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM room_members WHERE room_id=? AND user_id=?")
        .bind(room_id)
        .bind(user_id)
        .execute(db_pool)
        .await?;
    Ok(())
}

pub async fn push_message(db_pool: &SqlitePool, room_id: &str, message: &Message) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO messages (room_id,msg,user_sent,sent_at) VALUES (?,?,?,?)")
        .bind(room_id)
        .bind(&message.msg)
        .bind(&message.user_sent)
        .bind(message.date)
        .execute(db_pool)
        .await?;
    Ok(())
}

pub async fn messages(db_pool: &SqlitePool, room_id: &str) -> Result<Vec<Message>, sqlx::Error> {
    sqlx::query_as("SELECT msg,user_sent,sent_at FROM messages WHERE room_id=? ORDER BY seq")
        .bind(room_id)
        .fetch_all(db_pool)
        .await
}
