use axum::{debug_handler, extract::{Path, State}, http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{db::{self, Message}, session::USER_ID, AppResult};

#[derive(Serialize)]
struct RoomView {
    id: String,
    name: String,
    users: Vec<String>,
    messages: Vec<Message>,
}

/// Room details and history, for members only.
#[debug_handler]
pub(crate) async fn room(
    Path(room_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user_id) = session.get::<String>(USER_ID).await? else {
        return Ok(StatusCode::UNAUTHORIZED.into_response());
    };

    let Some(room) = db::rooms::find(&db_pool, &room_id).await? else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    let users = db::rooms::member_ids(&db_pool, &room.id).await?;
    if !users.contains(&user_id) {
        return Ok(StatusCode::UNAUTHORIZED.into_response());
    }

    let messages = db::rooms::messages(&db_pool, &room.id).await?;
    Ok(Json(RoomView {
        id: room.id,
        name: room.name,
        users,
        messages,
    })
    .into_response())
}
