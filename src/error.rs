use axum::{
    Json,
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::{routes::ApiResponse, store::StoreError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unable to prepare the ping_history table: {0}")]
    Bootstrap(#[source] StoreError),
    #[error("failed to read ping history: {0}")]
    History(#[from] sqlx::Error),
    #[error("{0}")]
    InvalidQuery(String),
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidQuery(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Bootstrap(e) => {
                error!(error = %e, "ping_history bootstrap failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Unable to create the ping_history table".to_string(),
                )
            }
            Self::History(e) => {
                error!(error = %e, "ping history query failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to fetch ping history".to_string(),
                )
            }
            Self::InvalidQuery(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        (status, Json(ApiResponse::<()>::failure(message))).into_response()
    }
}
