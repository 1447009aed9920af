mod names;
mod pics;

use axum::{routing::{get, post}, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/updateProfileName", post(names::update_profile_name))
        .route("/users/updateRoomName", post(names::update_room_name))
        .route("/profilePics/{file}", get(pics::profile_pic))
        .route("/roomProfilePics/{file}", get(pics::room_pic))
}
