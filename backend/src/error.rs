//! HTTP error mapping
//!
//! Every failure leaves the server as `{"success": false, "error": "..."}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use shared::protocol::ErrorBody;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Game not found")]
    GameNotFound,

    #[error("{0}")]
    BadRequest(String),

    /// The request was understood but the game refused it (bad move, wrong turn).
    /// Reported with 200 so socket and HTTP callers see the same payload.
    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::GameNotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Rejected(_) => StatusCode::OK,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::GameNotFound,
            StoreError::Join(_) => ApiError::BadRequest(err.to_string()),
            StoreError::Move(e) => ApiError::Rejected(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("[API] {}", self);
        }
        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{JoinError, MoveError};

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::GameNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Rejected("x".into()).status(), StatusCode::OK);
        assert_eq!(
            ApiError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_errors_map_to_api_errors() {
        assert!(matches!(
            ApiError::from(StoreError::NotFound),
            ApiError::GameNotFound
        ));

        let join = ApiError::from(StoreError::Join(JoinError::GameFull));
        assert_eq!(join.to_string(), "Cannot join game");
        assert_eq!(join.status(), StatusCode::BAD_REQUEST);

        let rejected = ApiError::from(StoreError::Move(MoveError::NotYourTurn));
        assert_eq!(rejected.to_string(), "Not your turn");
        assert_eq!(rejected.status(), StatusCode::OK);
    }
}
