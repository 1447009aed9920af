use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{db::{self, User}, AppResult};

pub const USER_ID: &str = "user_id";
pub const CSRF_STATE: &str = "csrf_state";
pub const PKCE_VERIFIER: &str = "pkce_verifier";
pub const FLASH: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

/// A one-shot notice shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub msg: String,
}

pub async fn flash(session: &Session, kind: FlashKind, msg: impl Into<String>) -> Result<(), tower_sessions::session::Error> {
    let mut flashes = session.get::<Vec<Flash>>(FLASH).await?.unwrap_or_default();
    flashes.push(Flash { kind, msg: msg.into() });
    session.insert(FLASH, flashes).await
}

pub async fn take_flashes(session: &Session) -> Result<Vec<Flash>, tower_sessions::session::Error> {
    Ok(session.remove::<Vec<Flash>>(FLASH).await?.unwrap_or_default())
}

pub async fn sign_in(session: &Session, user_id: &str) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(USER_ID, user_id).await
}

/// The signed-in user, if the session still points at an existing one.
pub async fn current_user(session: &Session, db_pool: &SqlitePool) -> AppResult<Option<User>> {
    let Some(user_id) = session.get::<String>(USER_ID).await? else {
        return Ok(None);
    };
    Ok(db::users::find_by_id(db_pool, &user_id).await?)
}
