/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # API Routes Aggregator Module
//!
//! This module aggregates all API routes and provides a function to
//! configure the main router: the versioned operator surface under
//! `/api/v1` plus the unversioned health and metrics endpoints.

use crate::dal::DAL;
use crate::manager::agents::AgentManager;
use crate::manager::groups::GroupManager;
use crate::metrics;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use sdam_utils::config::Cors;

pub mod v1;

/// Shared state for the application
///
/// This struct holds the orchestrators and the Data Access Layer which are
/// shared across all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// Agent orchestrator
    pub agents: AgentManager,
    /// Group orchestrator
    pub groups: GroupManager,
    /// The Data Access Layer instance, used by readiness probing
    pub dal: DAL,
}

/// Configures and returns the main application router with all API routes
///
/// # Arguments
///
/// * `cors_config` - CORS settings applied to the `/api/v1` surface
///
/// # Returns
///
/// Returns a configured `Router` instance that includes all API routes and middleware.
pub fn configure_api_routes(cors_config: &Cors) -> Router<AppState> {
    Router::new()
        .nest("/api/v1", v1::routes(cors_config))
        .merge(v1::health::routes())
        .layer(middleware::from_fn(track_metrics))
}

/// Records every handled request in the HTTP request counter.
async fn track_metrics(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    metrics::track_http_request(&path, method.as_str(), response.status().as_str());
    response
}
