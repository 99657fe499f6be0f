/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! API v1 module for the SDAM manager.
//!
//! This module defines the structure and routes for version 1 of the SDAM
//! API: the agent surface, the mirroring group surface, and the CORS layer
//! applied to both. Handlers are thin adapters: they extract path
//! parameters, bodies and peer addresses, delegate to the orchestrators,
//! and serialize the outcome.

pub mod agents;
pub mod groups;
pub mod health;

use crate::api::AppState;
use axum::http::header::HeaderName;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use sdam_utils::config::Cors;
use sdam_utils::logging::prelude::*;
use serde_json::Value;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Constructs and returns the main router for API v1.
///
/// Everything under `/api/v1` shares one CORS layer derived from the
/// `cors` settings group; unparseable origins, methods or headers in the
/// configuration are skipped rather than failing bring-up.
pub fn routes(cors: &Cors) -> Router<AppState> {
    let origins = if cors.allowed_origins.iter().any(|origin| origin == "*") {
        warn!("CORS is open to every origin; restrict allowed_origins outside development");
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            cors.allowed_origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok()),
        )
    };
    let methods: Vec<Method> = cors
        .allowed_methods
        .iter()
        .filter_map(|method| method.parse().ok())
        .collect();
    let headers: Vec<HeaderName> = cors
        .allowed_headers
        .iter()
        .filter_map(|header| header.parse().ok())
        .collect();

    Router::new()
        .merge(agents::routes())
        .merge(groups::routes())
        .layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(methods)
                .allow_headers(headers)
                .max_age(Duration::from_secs(cors.max_age_seconds)),
        )
}

/// Converts a proxied agent outcome into an HTTP response.
///
/// The status line carries the remote (or aggregated) status code
/// verbatim; operations without a success payload answer with an empty
/// body.
pub(crate) fn proxy_response(code: u16, body: Option<Value>) -> Response {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match body {
        Some(value) => (status, Json(value)).into_response(),
        None => status.into_response(),
    }
}
