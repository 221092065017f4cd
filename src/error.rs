use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Domain errors returned synchronously to the caller of a registry or
/// rules operation. None of these leave any state behind: validation
/// completes before the first mutation. Push-transport failures are not
/// part of this taxonomy; they are logged and discarded where they
/// happen and never surface to the mutation caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("unknown game id")]
    NotFound,
    #[error("game is not open to join")]
    IllegalJoin,
    #[error("game is not accepting moves")]
    InvalidState,
    #[error("it is not your turn")]
    NotYourTurn,
    #[error("cell is out of range or already taken")]
    InvalidCell,
}

impl GameError {
    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            GameError::InvalidRequest(_) => "invalid-request",
            GameError::NotFound => "not-found",
            GameError::IllegalJoin => "illegal-join",
            GameError::InvalidState => "invalid-state",
            GameError::NotYourTurn => "not-your-turn",
            GameError::InvalidCell => "invalid-cell",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            GameError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GameError::NotFound => StatusCode::NOT_FOUND,
            GameError::IllegalJoin
            | GameError::InvalidState
            | GameError::NotYourTurn
            | GameError::InvalidCell => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for GameError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.code(),
            "message": self.to_string(),
        }));
        (self.status(), body).into_response()
    }
}
