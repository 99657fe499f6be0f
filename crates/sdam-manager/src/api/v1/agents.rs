/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Agent surface of the operator API.
//!
//! This module provides routes and handlers for registration, heartbeats,
//! and application lifecycle operations addressed at a single agent.

use crate::api::v1::proxy_response;
use crate::api::AppState;
use crate::error::Error;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::{
    routing::{get, post},
    Json, Router,
};
use sdam_models::models::agents::Agent;
use sdam_utils::logging::prelude::*;
use serde_json::Value;
use std::net::SocketAddr;

/// Creates and returns the router for agent-related endpoints.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/agents", get(list_agents))
        .route("/agents/register", post(register_agent))
        .route("/agents/:agent_id", get(get_agent))
        .route("/agents/:agent_id/unregister", post(unregister_agent))
        .route("/agents/:agent_id/ping", post(ping_agent))
        .route("/agents/:agent_id/deploy", post(deploy_app))
        .route("/agents/:agent_id/apps", get(list_apps))
        .route(
            "/agents/:agent_id/apps/:app_id",
            get(get_app).post(update_app_info).delete(delete_app),
        )
        .route("/agents/:agent_id/apps/:app_id/start", post(start_app))
        .route("/agents/:agent_id/apps/:app_id/stop", post(stop_app))
        .route("/agents/:agent_id/apps/:app_id/update", post(update_app))
}

/// Lists all registered agents.
async fn list_agents(State(state): State<AppState>) -> Result<Json<Value>, Error> {
    match state.agents.list() {
        Ok(agents) => Ok(Json(agents)),
        Err(e) => {
            error!("failed to list agents: {}", e);
            Err(e)
        }
    }
}

/// Retrieves a specific agent by id.
async fn get_agent(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> Result<Json<Agent>, Error> {
    match state.agents.get(&agent_id) {
        Ok(agent) => Ok(Json(agent)),
        Err(e) => {
            error!("failed to get agent {}: {}", agent_id, e);
            Err(e)
        }
    }
}

/// Registers a new service deployment agent.
///
/// The body must carry the agent's IP; registering an already known IP
/// answers with the existing id.
async fn register_agent(State(state): State<AppState>, body: String) -> Result<Json<Value>, Error> {
    info!("handling agent registration");
    match state.agents.register(&body) {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            error!("failed to register agent: {}", e);
            Err(e)
        }
    }
}

/// Unregisters an agent and forgets its heartbeat timer.
async fn unregister_agent(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> Result<StatusCode, Error> {
    info!("handling unregistration of agent {}", agent_id);
    match state.agents.unregister(&agent_id).await {
        Ok(()) => Ok(StatusCode::OK),
        Err(e) => {
            error!("failed to unregister agent {}: {}", agent_id, e);
            Err(e)
        }
    }
}

/// Records a heartbeat from an agent.
async fn ping_agent(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Path(agent_id): Path<String>,
    body: String,
) -> Result<StatusCode, Error> {
    match state.agents.ping(&agent_id, &peer.ip().to_string(), &body) {
        Ok(()) => Ok(StatusCode::OK),
        Err(e) => {
            error!("failed to record heartbeat for agent {}: {}", agent_id, e);
            Err(e)
        }
    }
}

/// Deploys an app to the agent; the remote outcome is proxied back.
async fn deploy_app(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    body: String,
) -> Result<Response, Error> {
    info!("handling app deployment to agent {}", agent_id);
    match state.agents.deploy_app(&agent_id, &body).await {
        Ok((code, response)) => Ok(proxy_response(code, response)),
        Err(e) => {
            error!("failed to deploy app to agent {}: {}", agent_id, e);
            Err(e)
        }
    }
}

/// Lists the apps deployed on the agent.
async fn list_apps(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> Result<Response, Error> {
    match state.agents.info_apps(&agent_id).await {
        Ok((code, response)) => Ok(proxy_response(code, response)),
        Err(e) => {
            error!("failed to list apps on agent {}: {}", agent_id, e);
            Err(e)
        }
    }
}

/// Retrieves one app's information from the agent.
async fn get_app(
    State(state): State<AppState>,
    Path((agent_id, app_id)): Path<(String, String)>,
) -> Result<Response, Error> {
    match state.agents.info_app(&agent_id, &app_id).await {
        Ok((code, response)) => Ok(proxy_response(code, response)),
        Err(e) => {
            error!("failed to get app {} on agent {}: {}", app_id, agent_id, e);
            Err(e)
        }
    }
}

/// Pushes an updated app description to the agent.
async fn update_app_info(
    State(state): State<AppState>,
    Path((agent_id, app_id)): Path<(String, String)>,
    body: String,
) -> Result<Response, Error> {
    match state.agents.update_app_info(&agent_id, &app_id, &body).await {
        Ok((code, response)) => Ok(proxy_response(code, response)),
        Err(e) => {
            error!(
                "failed to update app {} info on agent {}: {}",
                app_id, agent_id, e
            );
            Err(e)
        }
    }
}

/// Deletes an app from the agent.
async fn delete_app(
    State(state): State<AppState>,
    Path((agent_id, app_id)): Path<(String, String)>,
) -> Result<Response, Error> {
    info!("handling deletion of app {} on agent {}", app_id, agent_id);
    match state.agents.delete_app(&agent_id, &app_id).await {
        Ok((code, response)) => Ok(proxy_response(code, response)),
        Err(e) => {
            error!("failed to delete app {} on agent {}: {}", app_id, agent_id, e);
            Err(e)
        }
    }
}

/// Starts an app on the agent.
async fn start_app(
    State(state): State<AppState>,
    Path((agent_id, app_id)): Path<(String, String)>,
) -> Result<Response, Error> {
    match state.agents.start_app(&agent_id, &app_id).await {
        Ok((code, response)) => Ok(proxy_response(code, response)),
        Err(e) => {
            error!("failed to start app {} on agent {}: {}", app_id, agent_id, e);
            Err(e)
        }
    }
}

/// Stops an app on the agent.
async fn stop_app(
    State(state): State<AppState>,
    Path((agent_id, app_id)): Path<(String, String)>,
) -> Result<Response, Error> {
    match state.agents.stop_app(&agent_id, &app_id).await {
        Ok((code, response)) => Ok(proxy_response(code, response)),
        Err(e) => {
            error!("failed to stop app {} on agent {}: {}", app_id, agent_id, e);
            Err(e)
        }
    }
}

/// Asks the agent to refresh all images of an app.
async fn update_app(
    State(state): State<AppState>,
    Path((agent_id, app_id)): Path<(String, String)>,
) -> Result<Response, Error> {
    match state.agents.update_app(&agent_id, &app_id).await {
        Ok((code, response)) => Ok(proxy_response(code, response)),
        Err(e) => {
            error!(
                "failed to update app {} on agent {}: {}",
                app_id, agent_id, e
            );
            Err(e)
        }
    }
}
