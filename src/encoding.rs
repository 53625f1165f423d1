//! JSON response encoding.
//!
//! `encode_json` writes a value to any byte sink, newline terminated.
//! `json_response` does the same into a buffer and wraps it in an HTTP
//! response with the JSON content type set.

use std::io::Write;

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    response::Response,
};
use serde::Serialize;

use crate::error::AppError;

/// Content type attached by [`json_response`].
pub const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("Failed to serialize value: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to write encoded value: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for EncodeError {
    fn from(err: serde_json::Error) -> Self {
        // serde_json reports sink failures through its own error type
        if err.is_io() {
            EncodeError::Io(err.into())
        } else {
            EncodeError::Serialize(err)
        }
    }
}

/// Serialize `value` as compact JSON into `writer`, followed by a newline.
///
/// Nothing is buffered: on a serialization error the sink may already hold a
/// partial document.
pub fn encode_json<T, W>(value: &T, mut writer: W) -> Result<(), EncodeError>
where
    T: Serialize + ?Sized,
    W: Write,
{
    serde_json::to_writer(&mut writer, value)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Build a JSON response from `value`.
///
/// The body is encoded in full before the response is built, so a failure
/// never produces a truncated body.
pub fn json_response<T>(status: StatusCode, value: &T) -> Result<Response, AppError>
where
    T: Serialize + ?Sized,
{
    let mut body = Vec::new();
    encode_json(value, &mut body)?;

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    Ok(response)
}
