mod leave;
mod msg;
mod new;
mod room;
mod ws;

use axum::{routing::{get, post}, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rooms", post(new::new_room))
        .route("/rooms/{id}", get(room::room))
        .route("/rooms/{id}/join", post(new::join_room))
        .route("/socket", get(ws::socket))
}
