/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Health and metrics endpoints.
//!
//! These live outside the versioned API surface: `/healthz` reports
//! process liveness, `/readyz` checks that a store connection can be
//! obtained, and `/metrics` renders the Prometheus registry.

use crate::api::AppState;
use crate::metrics;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Router};
use sdam_utils::logging::prelude::*;

/// Creates and returns the router for health-related endpoints.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(render_metrics))
}

/// Liveness probe.
async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe; fails while the store is unreachable.
async fn readyz(State(state): State<AppState>) -> StatusCode {
    match state.dal.pool.get() {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            warn!("readiness check failed: {}", e);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Prometheus text exposition of all manager metrics.
async fn render_metrics() -> String {
    metrics::render()
}
