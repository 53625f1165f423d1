use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::encoding::EncodeError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Response encoding error: {0}")]
    Encoding(#[from] EncodeError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Details stay in the log; clients only see a generic message
        tracing::error!(error = %self, "Request failed");

        let body = serde_json::json!({ "error": "Internal server error" });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
