pub mod appresult;
pub mod auth;
pub mod config;
pub mod db;
pub mod events;
pub mod hub;
pub mod index;
pub mod presence;
pub mod profiles;
pub mod res;
pub mod rooms;
pub mod session;

use std::sync::Arc;

use axum::{extract::FromRef, routing::get, Router};
use serde_json::Value;
use sqlx::SqlitePool;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

pub use appresult::{AppError, AppResult, ChatError};
pub use config::Config;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub clients: auth::Clients,
    pub presence: Arc<presence::Presence>,
    pub hub: Arc<hub::Hub>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, config: Config) -> anyhow::Result<AppState> {
        Ok(AppState {
            db_pool,
            clients: auth::Clients::from_config(config.google.as_ref())?,
            presence: Arc::new(presence::Presence::new()),
            hub: Arc::new(hub::Hub::new()),
            config: Arc::new(config),
        })
    }
}

pub fn app(app_state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(app_state.config.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(app_state.config.session_inactivity));

    let public = ServeDir::new(&app_state.config.public_dir);

    Router::new()
        .route("/", get(index::welcome))
        .route("/dashboard", get(index::dashboard))

        .merge(auth::router())
        .merge(rooms::router())
        .merge(profiles::router())

        .fallback_service(public)
        .with_state(app_state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
}

pub trait GetField {
    fn get_str_field(&self, field: &str) -> AppResult<String>;
}

impl GetField for Value {
    fn get_str_field(&self, field: &str) -> AppResult<String> {
        Ok(
            self.get(field)
            .ok_or(anyhow::anyhow!("expected {field} in {self}"))?
            .as_str()
            .ok_or(anyhow::anyhow!("expected {field} in {self} to be string"))?
            .to_owned()
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::GetField;

    #[test]
    fn reads_string_fields() {
        let profile = json!({ "id": "123", "verified_email": true });
        assert_eq!(profile.get_str_field("id").unwrap(), "123");
        assert!(profile.get_str_field("verified_email").is_err());
        assert!(profile.get_str_field("name").is_err());
    }
}
