/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Orchestration Module
//!
//! This module contains the two orchestrators at the heart of the manager:
//! the agent orchestrator ([`agents::AgentManager`]) for per-agent
//! operations and the heartbeat lifecycle, and the group orchestrator
//! ([`groups::GroupManager`]) for fan-out operations and their aggregated
//! results. Both receive their collaborators (DAL, messenger, heartbeat
//! monitor) at construction.

use crate::error::Error;
use crate::messenger::Address;
use sdam_models::models::agents::Agent;
use serde_json::Value;

pub mod agents;
pub mod groups;
pub mod heartbeat;

/// Returns true for 2xx status codes.
pub(crate) fn is_success_code(code: u16) -> bool {
    (200..=299).contains(&code)
}

/// Parses an inbound request body as a JSON object.
///
/// Anything other than a well-formed JSON object is an `InvalidJson`
/// error, surfaced as a 400 to the caller.
pub(crate) fn parse_json_object(body: &str) -> Result<serde_json::Map<String, Value>, Error> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(Error::InvalidJson("body must be a JSON object".to_string())),
        Err(_) => Err(Error::InvalidJson("body could not be parsed".to_string())),
    }
}

/// Parses a remote agent response body as a JSON object.
///
/// Remote bodies that fail to parse abort the operation with an
/// `InternalServer` error even when the remote call itself succeeded.
pub(crate) fn parse_response(body: &str) -> Result<Value, Error> {
    match serde_json::from_str::<Value>(body) {
        Ok(value @ Value::Object(_)) => Ok(value),
        _ => Err(Error::InternalServer(
            "agent response could not be parsed".to_string(),
        )),
    }
}

/// Parses every remote response body of a fan-out; any parse failure
/// fails the whole operation.
pub(crate) fn parse_responses(bodies: &[String]) -> Result<Vec<Value>, Error> {
    bodies.iter().map(|body| parse_response(body)).collect()
}

/// Builds the single-element address list for a per-agent dispatch.
pub(crate) fn agent_address(agent: &Agent) -> [Address; 1] {
    [Address {
        host: agent.host.clone(),
        port: agent.port.clone(),
    }]
}

/// Builds the address list for a group dispatch, aligned with `members`.
pub(crate) fn member_addresses(members: &[Agent]) -> Vec<Address> {
    members
        .iter()
        .map(|agent| Address {
            host: agent.host.clone(),
            port: agent.port.clone(),
        })
        .collect()
}
