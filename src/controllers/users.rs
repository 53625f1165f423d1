//! Controller for the users resource.

use async_trait::async_trait;
use axum::{
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::encoding::json_response;
use crate::routing::Handler;

/// Acknowledgement body returned by the users resource.
#[derive(Debug, Serialize)]
pub struct Status {
    pub status: &'static str,
}

impl Status {
    pub const OK: Status = Status { status: "ok" };
}

/// Handles `/users` and everything under `/users/`.
///
/// Holds no state. Every method receives the same `{"status":"ok"}` JSON
/// acknowledgement.
#[derive(Debug, Default, Clone, Copy)]
pub struct UserController;

impl UserController {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Handler for UserController {
    async fn handle(&self, request: Request) -> Response {
        tracing::debug!(
            method = %request.method(),
            path = %request.uri().path(),
            "Handling users request"
        );

        match json_response(StatusCode::OK, &Status::OK) {
            Ok(response) => response,
            Err(e) => e.into_response(),
        }
    }
}
