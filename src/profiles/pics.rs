use std::{path::Path as FsPath, sync::Arc};

use axum::{
    debug_handler,
    extract::{Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tower_sessions::Session;

use crate::{db, session::{self, FlashKind, USER_ID}, AppResult, AppState, Config};

const DEFAULT_PROFILE_PIC: &str = "icon.png";
const DEFAULT_ROOM_PIC: &str = "default.png";

#[debug_handler(state = AppState)]
pub(crate) async fn profile_pic(
    Path(file): Path<String>,
    State(config): State<Arc<Config>>,
    session: Session,
    request: Request,
) -> AppResult<Response> {
    if session.get::<String>(USER_ID).await?.is_none() {
        return please_log_in(&session).await;
    }

    Ok(serve_image(&config.profile_pics_dir, &file, DEFAULT_PROFILE_PIC, request).await)
}

/// Room pictures are named `<room id>.png` and only shown to members.
#[debug_handler(state = AppState)]
pub(crate) async fn room_pic(
    Path(file): Path<String>,
    State(db_pool): State<SqlitePool>,
    State(config): State<Arc<Config>>,
    session: Session,
    request: Request,
) -> AppResult<Response> {
    let Some(user_id) = session.get::<String>(USER_ID).await? else {
        return please_log_in(&session).await;
    };

    let room_id = file.strip_suffix(".png").unwrap_or(&file);
    let rooms = db::users::room_ids(&db_pool, &user_id).await?;
    if !rooms.iter().any(|id| id == room_id) {
        tracing::debug!(%user_id, %room_id, "user not present in room");
        return Ok(StatusCode::UNAUTHORIZED.into_response());
    }

    Ok(serve_image(&config.room_pics_dir, &file, DEFAULT_ROOM_PIC, request).await)
}

async fn please_log_in(session: &Session) -> AppResult<Response> {
    session::flash(session, FlashKind::Error, "Please log in to view that resource").await?;
    Ok(Redirect::to("/users/login").into_response())
}

fn is_plain_file_name(file: &str) -> bool {
    !file.is_empty() && !file.starts_with('.') && !file.contains(['/', '\\'])
}

/// Serves `dir/file`, or `dir/fallback` when there is no such file.
async fn serve_image(dir: &FsPath, file: &str, fallback: &str, request: Request) -> Response {
    let mut path = dir.join(fallback);
    if is_plain_file_name(file) {
        let wanted = dir.join(file);
        if tokio::fs::metadata(&wanted).await.is_ok_and(|meta| meta.is_file()) {
            path = wanted;
        }
    }

    match ServeFile::new(&path).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}
