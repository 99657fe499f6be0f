/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Group surface of the operator API.
//!
//! Mirrors the agent surface with `/groups/{groupID}` in place of
//! `/agents/{agentID}`: membership management plus application lifecycle
//! operations fanned out to the whole group.

use crate::api::v1::proxy_response;
use crate::api::AppState;
use crate::error::Error;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::{
    routing::{get, post},
    Json, Router,
};
use sdam_models::models::groups::Group;
use sdam_utils::logging::prelude::*;
use serde_json::Value;

/// Creates and returns the router for group-related endpoints.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/groups", get(list_groups).post(create_group))
        .route("/groups/:group_id", get(get_group).delete(delete_group))
        .route("/groups/:group_id/join", post(join_group))
        .route("/groups/:group_id/leave", post(leave_group))
        .route("/groups/:group_id/deploy", post(deploy_app))
        .route("/groups/:group_id/apps", get(list_apps))
        .route(
            "/groups/:group_id/apps/:app_id",
            get(get_app).post(update_app_info).delete(delete_app),
        )
        .route("/groups/:group_id/apps/:app_id/start", post(start_app))
        .route("/groups/:group_id/apps/:app_id/stop", post(stop_app))
        .route("/groups/:group_id/apps/:app_id/update", post(update_app))
}

/// Lists all groups.
async fn list_groups(State(state): State<AppState>) -> Result<Json<Value>, Error> {
    match state.groups.list() {
        Ok(groups) => Ok(Json(groups)),
        Err(e) => {
            error!("failed to list groups: {}", e);
            Err(e)
        }
    }
}

/// Creates a new, empty group.
async fn create_group(State(state): State<AppState>) -> Result<Json<Group>, Error> {
    info!("handling group creation");
    match state.groups.create() {
        Ok(group) => Ok(Json(group)),
        Err(e) => {
            error!("failed to create group: {}", e);
            Err(e)
        }
    }
}

/// Retrieves a specific group by id.
async fn get_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<Group>, Error> {
    match state.groups.get(&group_id) {
        Ok(group) => Ok(Json(group)),
        Err(e) => {
            error!("failed to get group {}: {}", group_id, e);
            Err(e)
        }
    }
}

/// Deletes a group.
async fn delete_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<StatusCode, Error> {
    info!("handling deletion of group {}", group_id);
    match state.groups.delete(&group_id) {
        Ok(()) => Ok(StatusCode::OK),
        Err(e) => {
            error!("failed to delete group {}: {}", group_id, e);
            Err(e)
        }
    }
}

/// Adds the agents named in the body to the group.
async fn join_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    body: String,
) -> Result<StatusCode, Error> {
    match state.groups.join(&group_id, &body) {
        Ok(()) => Ok(StatusCode::OK),
        Err(e) => {
            error!("failed to join agents to group {}: {}", group_id, e);
            Err(e)
        }
    }
}

/// Removes the agents named in the body from the group.
async fn leave_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    body: String,
) -> Result<StatusCode, Error> {
    match state.groups.leave(&group_id, &body) {
        Ok(()) => Ok(StatusCode::OK),
        Err(e) => {
            error!("failed to remove agents from group {}: {}", group_id, e);
            Err(e)
        }
    }
}

/// Deploys an app to every member of the group.
async fn deploy_app(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    body: String,
) -> Result<Response, Error> {
    info!("handling app deployment to group {}", group_id);
    match state.groups.deploy_app(&group_id, &body).await {
        Ok((code, response)) => Ok(proxy_response(code, response)),
        Err(e) => {
            error!("failed to deploy app to group {}: {}", group_id, e);
            Err(e)
        }
    }
}

/// Aggregates the installed apps across the group's members.
async fn list_apps(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<Value>, Error> {
    match state.groups.info_apps(&group_id) {
        Ok(apps) => Ok(Json(apps)),
        Err(e) => {
            error!("failed to list apps of group {}: {}", group_id, e);
            Err(e)
        }
    }
}

/// Queries one app's information from every member that has it.
async fn get_app(
    State(state): State<AppState>,
    Path((group_id, app_id)): Path<(String, String)>,
) -> Result<Response, Error> {
    match state.groups.info_app(&group_id, &app_id).await {
        Ok((code, response)) => Ok(proxy_response(code, response)),
        Err(e) => {
            error!("failed to get app {} of group {}: {}", app_id, group_id, e);
            Err(e)
        }
    }
}

/// Pushes an updated app description to every member that has the app.
async fn update_app_info(
    State(state): State<AppState>,
    Path((group_id, app_id)): Path<(String, String)>,
    body: String,
) -> Result<Response, Error> {
    match state.groups.update_app_info(&group_id, &app_id, &body).await {
        Ok((code, response)) => Ok(proxy_response(code, response)),
        Err(e) => {
            error!(
                "failed to update app {} info in group {}: {}",
                app_id, group_id, e
            );
            Err(e)
        }
    }
}

/// Deletes the app from every member that has it.
async fn delete_app(
    State(state): State<AppState>,
    Path((group_id, app_id)): Path<(String, String)>,
) -> Result<Response, Error> {
    info!("handling deletion of app {} in group {}", app_id, group_id);
    match state.groups.delete_app(&group_id, &app_id).await {
        Ok((code, response)) => Ok(proxy_response(code, response)),
        Err(e) => {
            error!("failed to delete app {} in group {}: {}", app_id, group_id, e);
            Err(e)
        }
    }
}

/// Starts the app on every member that has it.
async fn start_app(
    State(state): State<AppState>,
    Path((group_id, app_id)): Path<(String, String)>,
) -> Result<Response, Error> {
    match state.groups.start_app(&group_id, &app_id).await {
        Ok((code, response)) => Ok(proxy_response(code, response)),
        Err(e) => {
            error!("failed to start app {} in group {}: {}", app_id, group_id, e);
            Err(e)
        }
    }
}

/// Stops the app on every member that has it.
async fn stop_app(
    State(state): State<AppState>,
    Path((group_id, app_id)): Path<(String, String)>,
) -> Result<Response, Error> {
    match state.groups.stop_app(&group_id, &app_id).await {
        Ok((code, response)) => Ok(proxy_response(code, response)),
        Err(e) => {
            error!("failed to stop app {} in group {}: {}", app_id, group_id, e);
            Err(e)
        }
    }
}

/// Asks every member that has the app to refresh its images.
async fn update_app(
    State(state): State<AppState>,
    Path((group_id, app_id)): Path<(String, String)>,
) -> Result<Response, Error> {
    match state.groups.update_app(&group_id, &app_id).await {
        Ok((code, response)) => Ok(proxy_response(code, response)),
        Err(e) => {
            error!("failed to update app {} in group {}: {}", app_id, group_id, e);
            Err(e)
        }
    }
}
