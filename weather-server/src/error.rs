//! Error types of the HTTP surface and the listener lifecycle.

use std::io;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use weather_core::WeatherError;

use crate::handler::Pretty;

/// Errors a request can end with. Converted into a `{"message": ...}` body.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required query parameter is missing or empty.
    #[error("invalid {0}")]
    InvalidParam(&'static str),

    /// The weather provider failed. Details stay in the logs.
    #[error("failed to get weather")]
    Upstream(#[source] WeatherError),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidParam(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Display never includes the source, so upstream detail is not leaked.
        let body = ErrorResponse {
            message: self.to_string(),
        };
        (self.status(), Pretty(body)).into_response()
    }
}

/// Why a single run of the listener ended without being stopped.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("tls setup failed: {0}")]
    Tls(String),

    #[error("listener failed: {0}")]
    Serve(#[from] io::Error),

    #[error("listener exited unexpectedly")]
    Exited,
}

/// Fatal outcome of the restart loop.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("server failed {attempts} times, giving up")]
    TooManyFailures {
        attempts: u32,
        #[source]
        last: ServerError,
    },
}
