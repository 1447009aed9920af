use axum::{debug_handler, extract::State, response::{Html, IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{db, include_res, res, session::{self, FlashKind, USER_ID}, AppResult};

#[derive(Deserialize)]
pub(crate) struct LoginForm {
    email: String,
    password: String,
}

#[debug_handler]
pub(crate) async fn login_page(session: Session) -> AppResult<Response> {
    if session.get::<String>(USER_ID).await?.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }

    let flashes = session::take_flashes(&session).await?;
    Ok(Html(
        include_res!(str, "/pages/login.html")
            .replace("{alerts}", &res::alerts(&flashes, &[]))
    ).into_response())
}

#[debug_handler]
pub(crate) async fn login(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(LoginForm { email, password }): Form<LoginForm>,
) -> AppResult<Redirect> {
    let email = email.trim().to_owned();
    let user = db::users::find_local_by_email(&db_pool, &email).await?;
    let Some((user, password_hash)) = user.and_then(|user| {
        let hash = user.password_hash.clone()?;
        Some((user, hash))
    }) else {
        session::flash(&session, FlashKind::Error, "That email is not registered").await?;
        return Ok(Redirect::to("/users/login"));
    };

    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &password_hash)).await??;
    if !matches {
        session::flash(&session, FlashKind::Error, "Password incorrect").await?;
        return Ok(Redirect::to("/users/login"));
    }

    session::sign_in(&session, &user.id).await?;
    tracing::info!(user_id = %user.id, "welcome {}", user.name);

    Ok(Redirect::to("/dashboard"))
}
