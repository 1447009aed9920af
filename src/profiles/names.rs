use axum::{debug_handler, extract::State, response::{IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{db, session::{self, FlashKind, USER_ID}, AppResult, AppState};

#[derive(Deserialize)]
pub(crate) struct ProfileNameForm {
    #[serde(rename = "profileName")]
    profile_name: String,
}

#[derive(Deserialize)]
pub(crate) struct RoomNameForm {
    id: String,
    #[serde(rename = "roomProfileName")]
    room_profile_name: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn update_profile_name(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(ProfileNameForm { profile_name }): Form<ProfileNameForm>,
) -> AppResult<Response> {
    let Some(user_id) = session.get::<String>(USER_ID).await? else {
        return Ok(Redirect::to("/users/login").into_response());
    };

    let name = profile_name.trim();
    if name.is_empty() {
        session::flash(&session, FlashKind::Error, "Name can't be empty").await?;
    } else {
        db::users::set_name(&db_pool, &user_id, name).await?;
    }

    Ok(Redirect::to("/dashboard").into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn update_room_name(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(RoomNameForm { id, room_profile_name }): Form<RoomNameForm>,
) -> AppResult<Response> {
    let Some(user_id) = session.get::<String>(USER_ID).await? else {
        return Ok(Redirect::to("/users/login").into_response());
    };

    if !db::rooms::is_member(&db_pool, &id, &user_id).await? {
        tracing::warn!(%user_id, room_id = %id, "rename refused, not a member");
        session::flash(&session, FlashKind::Error, "You are not in that room").await?;
        return Ok(Redirect::to("/dashboard").into_response());
    }

    let name = room_profile_name.trim();
    if name.is_empty() {
        session::flash(&session, FlashKind::Error, "Room name can't be empty").await?;
    } else {
        db::rooms::set_name(&db_pool, &id, name).await?;
    }

    Ok(Redirect::to("/dashboard").into_response())
}
