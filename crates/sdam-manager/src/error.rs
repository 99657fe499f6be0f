/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Error types shared across the manager.
//!
//! Every error kind carries the HTTP status class it surfaces as; API
//! handlers convert errors into `{"message": "..."}` JSON bodies with
//! the mapped status line.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The request body could not be parsed, or a required field was
    /// missing or of the wrong type.
    #[error("invalid json: {0}")]
    InvalidJson(String),

    /// An id parameter failed the well-formed-identifier check. The
    /// store is never queried for malformed ids.
    #[error("invalid id: {0}")]
    InvalidId(String),

    /// The requested document (or app-on-agent coupling) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A connection to the store could not be obtained.
    #[error("database connection failed: {0}")]
    DbConnection(String),

    /// The store rejected or failed an operation.
    #[error("database operation failed: {0}")]
    DbOperation(String),

    /// A remote agent response could not be interpreted.
    #[error("internal server error: {0}")]
    InternalServer(String),

    /// A remote operation was rejected by every targeted agent.
    #[error("operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// The HTTP status this error surfaces as.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidJson(_) | Error::InvalidId(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::DbConnection(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::DbOperation(_) | Error::InternalServer(_) | Error::OperationFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<diesel::result::Error> for Error {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::NotFound => Error::NotFound("document not found".to_string()),
            other => Error::DbOperation(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for Error {
    fn from(e: r2d2::Error) -> Self {
        Error::DbConnection(e.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(serde_json::json!({"message": self.to_string()}));
        (status, body).into_response()
    }
}
