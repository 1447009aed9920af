use axum::{debug_handler, extract::State, response::{Html, IntoResponse, Redirect, Response}};
use serde::Serialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{db, include_res, res, session::{self, FlashKind, USER_ID}, AppResult};

#[derive(Serialize)]
struct ChatBoot<'a> {
    #[serde(rename = "userId")]
    user_id: &'a str,
    name: &'a str,
    rooms: Vec<BootRoom>,
}

#[derive(Serialize)]
struct BootRoom {
    id: String,
    name: String,
    users: Vec<String>,
}

#[debug_handler]
pub async fn welcome(session: Session) -> AppResult<Response> {
    if session.get::<String>(USER_ID).await?.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }

    Ok(Html(include_res!(str, "/pages/welcome.html")).into_response())
}

#[debug_handler]
pub async fn dashboard(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user) = session::current_user(&session, &db_pool).await? else {
        session::flash(&session, FlashKind::Error, "Please log in to view that resource").await?;
        return Ok(Redirect::to("/users/login").into_response());
    };

    let mut room_items = String::new();
    let mut rooms = Vec::new();
    for room_id in db::users::room_ids(&db_pool, &user.id).await? {
        let Some(room) = db::rooms::find(&db_pool, &room_id).await? else {
            tracing::warn!(user_id = %user.id, %room_id, "user lists a room that doesn't exist");
            continue;
        };

        room_items += &include_res!(str, "/pages/room_item.html")
            .replace("{id}", &res::escape_html(&room.id))
            .replace("{name}", &res::escape_html(&room.name));

        rooms.push(BootRoom {
            users: db::rooms::member_ids(&db_pool, &room.id).await?,
            id: room.id,
            name: room.name,
        });
    }

    let boot = res::script_json(&ChatBoot {
        user_id: &user.id,
        name: &user.name,
        rooms,
    })?;

    let flashes = session::take_flashes(&session).await?;
    Ok(
        Html(
            include_res!(str, "/pages/dashboard.html")
                .replace("{boot}", &boot)
                .replace("{alerts}", &res::alerts(&flashes, &[]))
                .replace("{name}", &res::escape_html(&user.name))
                .replace("{room_items}", &room_items)
        ).into_response()
    )
}
