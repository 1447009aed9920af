use axum::{debug_handler, response::Redirect};
use tower_sessions::Session;

use crate::{session::{self, FlashKind}, AppResult};

#[debug_handler]
pub(crate) async fn logout(session: Session) -> AppResult<Redirect> {
    session.clear().await;
    session::flash(&session, FlashKind::Success, "You are logged out").await?;
    Ok(Redirect::to("/users/login"))
}
