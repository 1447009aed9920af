pub mod rooms;
pub mod users;

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, FromRow, SqlitePool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Sender id of messages that no person wrote.
pub const SYSTEM_SENDER: &str = "bot";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL,
    password_hash TEXT,
    auth_with     TEXT NOT NULL,
    google_id     TEXT
);
CREATE UNIQUE INDEX IF NOT EXISTS users_local_email ON users (email) WHERE auth_with = 'local';
CREATE UNIQUE INDEX IF NOT EXISTS users_google_id ON users (google_id) WHERE google_id IS NOT NULL;

CREATE TABLE IF NOT EXISTS user_rooms (
    user_id  TEXT NOT NULL,
    room_id  TEXT NOT NULL,
    position INTEGER NOT NULL,
    PRIMARY KEY (user_id, room_id)
);

CREATE TABLE IF NOT EXISTS rooms (
    id   TEXT PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS room_members (
    room_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    PRIMARY KEY (room_id, user_id)
);

CREATE TABLE IF NOT EXISTS messages (
    seq       INTEGER PRIMARY KEY AUTOINCREMENT,
    room_id   TEXT NOT NULL,
    msg       TEXT NOT NULL,
    user_sent TEXT NOT NULL,
    sent_at   TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS messages_room ON messages (room_id, seq);
"#;

/// Opens the pool and creates any missing tables.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let db_pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    sqlx::raw_sql(SCHEMA).execute(&db_pool).await?;
    Ok(db_pool)
}

pub(crate) fn new_id() -> String {
    Uuid::now_v7().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AuthWith {
    Local,
    Google,
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub auth_with: AuthWith,
    pub google_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Room {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub msg: String,
    #[serde(rename = "userSent")]
    pub user_sent: String,
    #[serde(rename = "Date", with = "time::serde::rfc3339")]
    #[sqlx(rename = "sent_at")]
    pub date: OffsetDateTime,
}

impl Message {
    pub fn new(msg: impl Into<String>, user_sent: impl Into<String>) -> Message {
        Message {
            msg: msg.into(),
            user_sent: user_sent.into(),
            date: OffsetDateTime::now_utc(),
        }
    }

    pub fn system(msg: impl Into<String>) -> Message {
        Message::new(msg, SYSTEM_SENDER)
    }
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    connect("sqlite::memory:", 1).await.unwrap()
}
