use anyhow::anyhow;
use axum::{debug_handler, extract::{Query, State}, response::{IntoResponse, Redirect, Response}};
use oauth2::{AuthorizationCode, CsrfToken, PkceCodeChallenge, PkceCodeVerifier, Scope, TokenResponse};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{db, session::{self, FlashKind, CSRF_STATE, PKCE_VERIFIER}, AppResult, AppState, GetField};

use super::{clients::GOOGLE_USERINFO_URL, random_alias, Clients};

#[derive(Deserialize)]
pub struct LockinQuery {
    pub state: Option<String>,
    pub code: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn google_login(
    State(clients): State<Clients>,
    session: Session,
) -> AppResult<Response> {
    let Some(client) = clients.google() else {
        session::flash(&session, FlashKind::Error, "Google sign-in is not configured").await?;
        return Ok(Redirect::to("/users/login").into_response());
    };

    let (pkce_code_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

    let (authorize_url, csrf_state) = client.authorize_url(CsrfToken::new_random)
        .add_scope(Scope::new("openid".to_string()))
        .add_scope(Scope::new("email".to_string()))
        .add_scope(Scope::new("profile".to_string()))
        .set_pkce_challenge(pkce_code_challenge)
        .url();

    session.insert(CSRF_STATE, csrf_state.secret()).await?;
    session.insert(PKCE_VERIFIER, pkce_verifier.secret()).await?;

    Ok(Redirect::to(authorize_url.as_str()).into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn lockin(
    Query(LockinQuery { state, code }): Query<LockinQuery>,
    State(db_pool): State<SqlitePool>,
    State(clients): State<Clients>,
    session: Session,
) -> AppResult<Response> {
    let Some(client) = clients.google() else {
        return Ok(Redirect::to("/users/login").into_response());
    };

    let state = CsrfToken::new(state.ok_or(anyhow!("OAuth: without state"))?);
    let code = AuthorizationCode::new(code.ok_or(anyhow!("OAuth: without code"))?);

    let Some(stored_state) = session.remove::<String>(CSRF_STATE).await? else {
        return Err(anyhow!("no csrf_state"))?;
    };

    if state.secret().as_str() != stored_state.as_str() {
        return Err(anyhow!("csrf tokens don't match"))?;
    }

    let Some(pkce_verifier) = session.remove::<String>(PKCE_VERIFIER).await? else {
        return Err(anyhow!("no pkce_verifier"))?;
    };

    let http_client = reqwest::ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .build()?;
    let token_result = client
        .exchange_code(code)
        .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier))
        .request_async(&http_client)
        .await?;

    let profile: serde_json::Value = http_client.get(GOOGLE_USERINFO_URL)
        .bearer_auth(token_result.access_token().secret())
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let google_id = profile.get_str_field("id")?;
    let user = match db::users::find_by_google_id(&db_pool, &google_id).await? {
        Some(user) => user,
        None => {
            let name = profile.get_str_field("name").unwrap_or_else(|_| random_alias());
            let email = profile.get_str_field("email").unwrap_or_default();
            let user = db::users::create_google(&db_pool, &google_id, &name, &email).await?;
            tracing::info!(user_id = %user.id, "registered {} through google", user.name);
            user
        }
    };

    session::sign_in(&session, &user.id).await?;
    tracing::info!(user_id = %user.id, "welcome {}", user.name);

    Ok(Redirect::to("/dashboard").into_response())
}
