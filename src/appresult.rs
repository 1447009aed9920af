use axum::{http::StatusCode, response::{IntoResponse, Response}};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, backtrace = %self.0.backtrace(), "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "something went wrong",
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// Failures of socket events. These never close the connection; the
/// originating client gets an `error` event instead.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("user {user_id} is not a member of room {room_id}")]
    NotMember { user_id: String, room_id: String },

    #[error("connection has not joined room {0}")]
    NotSubscribed(String),

    #[error("message is empty")]
    EmptyMessage,

    #[error("event is for user {0}, not the signed-in user")]
    IdentityMismatch(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
