/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Agent orchestrator.
//!
//! Drives the registration lifecycle, the heartbeat timer lifecycle, and
//! the application operations addressed at a single agent. App operations
//! share one skeleton: resolve the agent from the store, dispatch one
//! HTTP request through the messenger, parse the response, and apply
//! store post-effects only when the remote call succeeded.

use crate::dal::DAL;
use crate::error::Error;
use crate::manager::heartbeat::HeartbeatMonitor;
use crate::manager::{agent_address, is_success_code, parse_json_object, parse_response};
use crate::messenger::Messenger;
use sdam_models::models::agents::{Agent, NewAgent, STATUS_CONNECTED};
use sdam_utils::logging::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;

/// Orchestrates per-agent operations.
#[derive(Clone)]
pub struct AgentManager {
    dal: DAL,
    messenger: Arc<dyn Messenger>,
    heartbeats: HeartbeatMonitor,
    /// Port newly registered agents are assumed to listen on.
    default_port: String,
}

impl AgentManager {
    pub fn new(
        dal: DAL,
        messenger: Arc<dyn Messenger>,
        heartbeats: HeartbeatMonitor,
        default_port: String,
    ) -> Self {
        AgentManager {
            dal,
            messenger,
            heartbeats,
            default_port,
        }
    }

    /// Registers an agent by IP address.
    ///
    /// Registration is idempotent: if an agent already exists under the
    /// given IP its id is returned unchanged. A new agent is stored with
    /// the well-known edge-agent port and status `connected`.
    pub fn register(&self, body: &str) -> Result<Value, Error> {
        let body_map = parse_json_object(body)?;
        let ip = body_map
            .get("ip")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidJson("ip field is required".to_string()))?;

        match self.dal.agents().get_by_ip(ip) {
            Ok(agent) => Ok(json!({ "id": agent.id })),
            Err(Error::NotFound(_)) => {
                let new_agent =
                    NewAgent::new(ip.to_string(), self.default_port.clone(), STATUS_CONNECTED.to_string())
                        .map_err(Error::InvalidJson)?;
                let agent = self.dal.agents().create(&new_agent)?;
                info!("registered new agent {} at {}", agent.id, agent.host);
                Ok(json!({ "id": agent.id }))
            }
            Err(e) => Err(e),
        }
    }

    /// Unregisters an agent.
    ///
    /// The agent is asked to unregister itself first; if it refuses (a
    /// non-2xx response) nothing is mutated. On success the heartbeat
    /// timer entry is dropped and the record deleted.
    pub async fn unregister(&self, agent_id: &str) -> Result<(), Error> {
        let agent = self.dal.agents().get(agent_id)?;

        let (codes, _bodies) = self.messenger.unregister(&agent_address(&agent)).await;
        if !is_success_code(codes[0]) {
            return Err(Error::OperationFailed(format!(
                "agent '{}' rejected unregistration with status {}",
                agent_id, codes[0]
            )));
        }

        self.heartbeats.remove(agent.id);
        self.dal.agents().delete(agent_id)?;
        info!("unregistered agent {}", agent_id);
        Ok(())
    }

    /// Records a heartbeat from an agent.
    ///
    /// The body must carry an `interval` field holding the number of
    /// minutes until the next heartbeat, either as a JSON string or as an
    /// integer; anything else is rejected as invalid JSON.
    pub fn ping(&self, agent_id: &str, source_ip: &str, body: &str) -> Result<(), Error> {
        let agent = self.dal.agents().get(agent_id)?;

        let body_map = parse_json_object(body)?;
        let interval = parse_interval(&body_map)?;

        debug!(
            "heartbeat from agent {} ({}) with interval {}m",
            agent_id, source_ip, interval
        );
        self.heartbeats.record(agent.id, interval)
    }

    /// Returns one agent record.
    pub fn get(&self, agent_id: &str) -> Result<Agent, Error> {
        self.dal.agents().get(agent_id)
    }

    /// Returns all agent records, wrapped as `{"agents": [...]}`.
    pub fn list(&self) -> Result<Value, Error> {
        let agents = self.dal.agents().list()?;
        let connected = agents
            .iter()
            .filter(|agent| agent.status == STATUS_CONNECTED)
            .count();
        crate::metrics::set_connected_agents(connected as i64);
        Ok(json!({ "agents": agents }))
    }

    /// Deploys an app to the agent.
    ///
    /// On a 2xx response the app id returned by the agent is added to the
    /// agent's installed set before the response is handed back.
    pub async fn deploy_app(&self, agent_id: &str, body: &str) -> Result<(u16, Option<Value>), Error> {
        let agent = self.dal.agents().get(agent_id)?;

        let (codes, bodies) = self
            .messenger
            .deploy_app(&agent_address(&agent), body)
            .await;
        let response = parse_response(&bodies[0])?;

        if is_success_code(codes[0]) {
            let app_id = response
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    Error::InternalServer("deploy response did not carry an app id".to_string())
                })?;
            self.dal.agents().add_app(agent_id, app_id)?;
        }

        Ok((codes[0], Some(response)))
    }

    /// Lists the apps deployed on the agent.
    pub async fn info_apps(&self, agent_id: &str) -> Result<(u16, Option<Value>), Error> {
        let agent = self.dal.agents().get(agent_id)?;

        let (codes, bodies) = self.messenger.info_apps(&agent_address(&agent)).await;
        let response = parse_response(&bodies[0])?;
        Ok((codes[0], Some(response)))
    }

    /// Returns one app's information from the agent.
    pub async fn info_app(&self, agent_id: &str, app_id: &str) -> Result<(u16, Option<Value>), Error> {
        let agent = self.dal.agents().get_by_app_id(agent_id, app_id)?;

        let (codes, bodies) = self
            .messenger
            .info_app(&agent_address(&agent), app_id)
            .await;
        let response = parse_response(&bodies[0])?;
        Ok((codes[0], Some(response)))
    }

    /// Pushes an updated app description to the agent.
    pub async fn update_app_info(
        &self,
        agent_id: &str,
        app_id: &str,
        body: &str,
    ) -> Result<(u16, Option<Value>), Error> {
        let agent = self.dal.agents().get_by_app_id(agent_id, app_id)?;

        let (codes, bodies) = self
            .messenger
            .update_app_info(&agent_address(&agent), app_id, body)
            .await;
        let response = parse_response(&bodies[0])?;
        Ok((codes[0], Some(response)))
    }

    /// Asks the agent to refresh all images of an app.
    pub async fn update_app(&self, agent_id: &str, app_id: &str) -> Result<(u16, Option<Value>), Error> {
        let agent = self.dal.agents().get_by_app_id(agent_id, app_id)?;

        let (codes, bodies) = self
            .messenger
            .update_app(&agent_address(&agent), app_id)
            .await;
        let response = parse_response(&bodies[0])?;
        Ok((codes[0], Some(response)))
    }

    /// Starts an app on the agent.
    pub async fn start_app(&self, agent_id: &str, app_id: &str) -> Result<(u16, Option<Value>), Error> {
        let agent = self.dal.agents().get_by_app_id(agent_id, app_id)?;

        let (codes, bodies) = self
            .messenger
            .start_app(&agent_address(&agent), app_id)
            .await;
        let response = parse_response(&bodies[0])?;
        Ok((codes[0], Some(response)))
    }

    /// Stops an app on the agent.
    pub async fn stop_app(&self, agent_id: &str, app_id: &str) -> Result<(u16, Option<Value>), Error> {
        let agent = self.dal.agents().get_by_app_id(agent_id, app_id)?;

        let (codes, bodies) = self
            .messenger
            .stop_app(&agent_address(&agent), app_id)
            .await;
        let response = parse_response(&bodies[0])?;
        Ok((codes[0], Some(response)))
    }

    /// Deletes an app from the agent.
    ///
    /// A non-2xx agent response is returned verbatim without touching the
    /// store; on success the app id is removed from the installed set.
    pub async fn delete_app(&self, agent_id: &str, app_id: &str) -> Result<(u16, Option<Value>), Error> {
        let agent = self.dal.agents().get_by_app_id(agent_id, app_id)?;

        let (codes, bodies) = self
            .messenger
            .delete_app(&agent_address(&agent), app_id)
            .await;

        if !is_success_code(codes[0]) {
            let response = parse_response(&bodies[0])?;
            return Ok((codes[0], Some(response)));
        }

        self.dal.agents().delete_app(agent_id, app_id)?;
        Ok((codes[0], None))
    }
}

/// Extracts the heartbeat interval in minutes from a parsed body.
///
/// The original edge agents send the interval as a JSON string; integral
/// numbers are accepted as well. Anything non-integral is rejected
/// rather than silently treated as zero.
fn parse_interval(body: &serde_json::Map<String, Value>) -> Result<u64, Error> {
    let value = body
        .get("interval")
        .ok_or_else(|| Error::InvalidJson("interval field is required".to_string()))?;

    match value {
        Value::String(text) => text
            .trim()
            .parse::<u64>()
            .map_err(|_| Error::InvalidJson("interval must be a whole number of minutes".to_string())),
        Value::Number(number) => number
            .as_u64()
            .ok_or_else(|| Error::InvalidJson("interval must be a whole number of minutes".to_string())),
        _ => Err(Error::InvalidJson(
            "interval must be a whole number of minutes".to_string(),
        )),
    }
}
