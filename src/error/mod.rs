//! Error handling module

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Failure talking to the LED controller
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Request to {endpoint} failed: {source}")]
    Request {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned {status}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("Invalid device URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// The synchronizer task is no longer running
#[derive(Error, Debug, PartialEq, Eq)]
#[error("Device synchronizer has stopped")]
pub struct SyncStopped;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ColorError {
    #[error("Invalid hex color: {0:?} (expected #rrggbb)")]
    InvalidHex(String),

    #[error("Invalid color channel: {0:?} (expected 0-255)")]
    InvalidChannel(String),
}

/// Errors returned by the device emulator's HTTP handlers
#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl IntoResponse for EmulatorError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            EmulatorError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            EmulatorError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
        };

        let body = Json(serde_json::json!({
            "error": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}
