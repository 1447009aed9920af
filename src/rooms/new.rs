use axum::{debug_handler, extract::{Path, State}, response::{IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{db, session::{self, FlashKind, USER_ID}, AppResult};

#[derive(Debug, Deserialize)]
pub(crate) struct NewRoomForm {
    name: String,
}

#[debug_handler]
pub(crate) async fn new_room(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(NewRoomForm { name }): Form<NewRoomForm>,
) -> AppResult<Response> {
    let Some(user_id) = session.get::<String>(USER_ID).await? else {
        return Ok(Redirect::to("/users/login").into_response());
    };

    let name = name.trim();
    if name.is_empty() {
        session::flash(&session, FlashKind::Error, "Room name can't be empty").await?;
        return Ok(Redirect::to("/dashboard").into_response());
    }

    let room = db::rooms::create(&db_pool, name).await?;
    db::rooms::push_member(&db_pool, &room.id, &user_id).await?;
    db::users::push_room(&db_pool, &user_id, &room.id).await?;
    tracing::info!(room_id = %room.id, %user_id, "room created");

    Ok(Redirect::to("/dashboard").into_response())
}

#[debug_handler]
pub(crate) async fn join_room(
    Path(room_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user_id) = session.get::<String>(USER_ID).await? else {
        return Ok(Redirect::to("/users/login").into_response());
    };

    if db::rooms::find(&db_pool, &room_id).await?.is_none() {
        session::flash(&session, FlashKind::Error, "That room doesn't exist").await?;
        return Ok(Redirect::to("/dashboard").into_response());
    }

    db::rooms::push_member(&db_pool, &room_id, &user_id).await?;
    db::users::push_room(&db_pool, &user_id, &room_id).await?;
    tracing::info!(%room_id, %user_id, "joined room");

    Ok(Redirect::to("/dashboard").into_response())
}
