/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Group orchestrator.
//!
//! Membership CRUD delegates to the store; application operations fan out
//! one HTTP request per member through the messenger and reduce the
//! per-member outcomes into a single aggregated response. The aggregate
//! status is a pure function of the per-member status codes: all 2xx is
//! `OK`, none is `ERROR`, anything in between is `MULTI_STATUS`.

use crate::dal::DAL;
use crate::error::Error;
use crate::manager::{is_success_code, member_addresses, parse_json_object, parse_responses};
use crate::messenger::Messenger;
use sdam_models::models::agents::Agent;
use sdam_models::models::groups::Group;
use sdam_utils::logging::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;

/// Tri-valued reduction of per-member outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateStatus {
    /// Every member reported success.
    Ok,
    /// Some members succeeded, at least one failed.
    MultiStatus,
    /// Every member reported failure.
    Error,
}

impl AggregateStatus {
    /// HTTP status the aggregate surfaces as.
    pub fn http_code(&self) -> u16 {
        match self {
            AggregateStatus::Ok => 200,
            AggregateStatus::MultiStatus => 207,
            AggregateStatus::Error => 500,
        }
    }
}

/// Reduces per-member status codes into the aggregate status.
pub(crate) fn decide_result_code(codes: &[u16]) -> AggregateStatus {
    let successes = codes.iter().filter(|code| is_success_code(**code)).count();
    if successes == codes.len() {
        AggregateStatus::Ok
    } else if successes == 0 {
        AggregateStatus::Error
    } else {
        AggregateStatus::MultiStatus
    }
}

/// Builds the per-member response entries of a partial-failure response.
///
/// Each entry carries the member id and the member's status code; failed
/// members additionally carry the `message` of their response body.
pub(crate) fn make_separate_responses(
    members: &[Agent],
    codes: &[u16],
    responses: &[Value],
) -> Vec<Value> {
    members
        .iter()
        .enumerate()
        .map(|(i, member)| {
            let mut entry = serde_json::Map::new();
            entry.insert("id".to_string(), json!(member.id));
            entry.insert("code".to_string(), json!(codes[i]));
            if !is_success_code(codes[i]) {
                entry.insert(
                    "message".to_string(),
                    responses[i].get("message").cloned().unwrap_or(Value::Null),
                );
            }
            Value::Object(entry)
        })
        .collect()
}

/// Orchestrates group-level operations.
#[derive(Clone)]
pub struct GroupManager {
    dal: DAL,
    messenger: Arc<dyn Messenger>,
}

impl GroupManager {
    pub fn new(dal: DAL, messenger: Arc<dyn Messenger>) -> Self {
        GroupManager { dal, messenger }
    }

    /// Creates a new, empty group.
    pub fn create(&self) -> Result<Group, Error> {
        let group = self.dal.groups().create()?;
        info!("created group {}", group.id);
        Ok(group)
    }

    /// Returns one group record.
    pub fn get(&self, group_id: &str) -> Result<Group, Error> {
        self.dal.groups().get(group_id)
    }

    /// Returns all group records, wrapped as `{"groups": [...]}`.
    pub fn list(&self) -> Result<Value, Error> {
        let groups = self.dal.groups().list()?;
        Ok(json!({ "groups": groups }))
    }

    /// Adds the agents named in the body to the group's member set.
    ///
    /// The body must carry an `agents` array of agent ids; the ids are
    /// added one by one, stopping at the first store error.
    pub fn join(&self, group_id: &str, body: &str) -> Result<(), Error> {
        for agent_id in agent_ids_from_body(body)? {
            self.dal.groups().join(group_id, &agent_id)?;
        }
        Ok(())
    }

    /// Removes the agents named in the body from the group's member set.
    pub fn leave(&self, group_id: &str, body: &str) -> Result<(), Error> {
        for agent_id in agent_ids_from_body(body)? {
            self.dal.groups().leave(group_id, &agent_id)?;
        }
        Ok(())
    }

    /// Deletes a group.
    pub fn delete(&self, group_id: &str) -> Result<(), Error> {
        self.dal.groups().delete(group_id)?;
        info!("deleted group {}", group_id);
        Ok(())
    }

    /// Deploys an app to every member of the group.
    ///
    /// Members that answer 2xx get the returned app id added to their
    /// installed set. On full success the response is `{"id": ...}`; on
    /// partial or total failure the per-member outcomes are reported,
    /// with the installed app id included whenever at least one member
    /// succeeded.
    pub async fn deploy_app(&self, group_id: &str, body: &str) -> Result<(u16, Option<Value>), Error> {
        let members = self.dal.groups().members(group_id)?;

        let (codes, bodies) = self
            .messenger
            .deploy_app(&member_addresses(&members), body)
            .await;
        let responses = parse_responses(&bodies)?;

        let mut installed_app_id: Option<String> = None;
        for (i, member) in members.iter().enumerate() {
            if is_success_code(codes[i]) {
                let app_id = responses[i]
                    .get("id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        Error::InternalServer("deploy response did not carry an app id".to_string())
                    })?;
                self.dal.agents().add_app(&member.id.to_string(), app_id)?;
                installed_app_id = Some(app_id.to_string());
            }
        }

        let result = decide_result_code(&codes);
        if result != AggregateStatus::Ok {
            let mut response = serde_json::Map::new();
            response.insert(
                "responses".to_string(),
                Value::Array(make_separate_responses(&members, &codes, &responses)),
            );
            if let Some(app_id) = installed_app_id {
                response.insert("id".to_string(), json!(app_id));
            }
            return Ok((result.http_code(), Some(Value::Object(response))));
        }

        Ok((
            result.http_code(),
            Some(json!({ "id": installed_app_id.unwrap_or_default() })),
        ))
    }

    /// Aggregates the installed apps across the group's members.
    ///
    /// This is a local aggregation over the store, without any fan-out:
    /// each distinct app id is reported with the members that have it.
    pub fn info_apps(&self, group_id: &str) -> Result<Value, Error> {
        let members = self.dal.groups().members(group_id)?;

        let mut apps: Vec<(String, Vec<Value>)> = Vec::new();
        for member in &members {
            for app_id in &member.apps {
                match apps.iter_mut().find(|(id, _)| id == app_id) {
                    Some((_, holders)) => holders.push(json!(member.id)),
                    None => apps.push((app_id.clone(), vec![json!(member.id)])),
                }
            }
        }

        let entries: Vec<Value> = apps
            .into_iter()
            .map(|(id, holders)| json!({ "id": id, "members": holders }))
            .collect();
        Ok(json!({ "apps": entries }))
    }

    /// Queries one app's information from every member that has it.
    pub async fn info_app(&self, group_id: &str, app_id: &str) -> Result<(u16, Option<Value>), Error> {
        let members = self.dal.groups().members_by_app_id(group_id, app_id)?;

        let (codes, bodies) = self
            .messenger
            .info_app(&member_addresses(&members), app_id)
            .await;
        let responses = parse_responses(&bodies)?;

        let result = decide_result_code(&codes);
        if result != AggregateStatus::Ok {
            // Merge the response bodies of successful members into their
            // entries; the member id and code stay authoritative.
            let mut entries = make_separate_responses(&members, &codes, &responses);
            for (i, entry) in entries.iter_mut().enumerate() {
                if is_success_code(codes[i]) {
                    merge_body_fields(entry, &responses[i]);
                }
            }
            return Ok((result.http_code(), Some(json!({ "responses": entries }))));
        }

        let entries: Vec<Value> = members
            .iter()
            .enumerate()
            .map(|(i, member)| {
                let mut entry = serde_json::Map::new();
                entry.insert("id".to_string(), json!(member.id));
                let mut entry = Value::Object(entry);
                merge_body_fields(&mut entry, &responses[i]);
                entry
            })
            .collect();
        Ok((result.http_code(), Some(json!({ "responses": entries }))))
    }

    /// Pushes an updated app description to every member that has the app.
    pub async fn update_app_info(
        &self,
        group_id: &str,
        app_id: &str,
        body: &str,
    ) -> Result<(u16, Option<Value>), Error> {
        let members = self.dal.groups().members_by_app_id(group_id, app_id)?;

        let (codes, bodies) = self
            .messenger
            .update_app_info(&member_addresses(&members), app_id, body)
            .await;
        let responses = parse_responses(&bodies)?;

        Ok(aggregate_response(&members, &codes, &responses))
    }

    /// Asks every member that has the app to refresh its images.
    pub async fn update_app(&self, group_id: &str, app_id: &str) -> Result<(u16, Option<Value>), Error> {
        let members = self.dal.groups().members_by_app_id(group_id, app_id)?;

        let (codes, bodies) = self
            .messenger
            .update_app(&member_addresses(&members), app_id)
            .await;
        let responses = parse_responses(&bodies)?;

        Ok(aggregate_response(&members, &codes, &responses))
    }

    /// Starts the app on every member that has it.
    pub async fn start_app(&self, group_id: &str, app_id: &str) -> Result<(u16, Option<Value>), Error> {
        let members = self.dal.groups().members_by_app_id(group_id, app_id)?;

        let (codes, bodies) = self
            .messenger
            .start_app(&member_addresses(&members), app_id)
            .await;
        let responses = parse_responses(&bodies)?;

        Ok(aggregate_response(&members, &codes, &responses))
    }

    /// Stops the app on every member that has it.
    pub async fn stop_app(&self, group_id: &str, app_id: &str) -> Result<(u16, Option<Value>), Error> {
        let members = self.dal.groups().members_by_app_id(group_id, app_id)?;

        let (codes, bodies) = self
            .messenger
            .stop_app(&member_addresses(&members), app_id)
            .await;
        let responses = parse_responses(&bodies)?;

        Ok(aggregate_response(&members, &codes, &responses))
    }

    /// Deletes the app from every member that has it.
    ///
    /// Members that answer 2xx have the app removed from their installed
    /// set before the aggregate is computed.
    pub async fn delete_app(&self, group_id: &str, app_id: &str) -> Result<(u16, Option<Value>), Error> {
        let members = self.dal.groups().members_by_app_id(group_id, app_id)?;

        let (codes, bodies) = self
            .messenger
            .delete_app(&member_addresses(&members), app_id)
            .await;
        let responses = parse_responses(&bodies)?;

        for (i, member) in members.iter().enumerate() {
            if is_success_code(codes[i]) {
                self.dal
                    .agents()
                    .delete_app(&member.id.to_string(), app_id)?;
            }
        }

        Ok(aggregate_response(&members, &codes, &responses))
    }
}

/// Standard aggregate for operations without a success payload: no body
/// on full success, per-member outcomes otherwise.
fn aggregate_response(members: &[Agent], codes: &[u16], responses: &[Value]) -> (u16, Option<Value>) {
    let result = decide_result_code(codes);
    if result != AggregateStatus::Ok {
        let entries = make_separate_responses(members, codes, responses);
        return (result.http_code(), Some(json!({ "responses": entries })));
    }
    (result.http_code(), None)
}

/// Copies all body fields into the entry, leaving `id` and `code` as set
/// by the aggregation.
fn merge_body_fields(entry: &mut Value, body: &Value) {
    if let (Value::Object(entry), Some(body)) = (entry, body.as_object()) {
        for (key, value) in body {
            if key != "id" && key != "code" {
                entry.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Extracts the agent id list of a join/leave body.
fn agent_ids_from_body(body: &str) -> Result<Vec<String>, Error> {
    let body_map = parse_json_object(body)?;
    let ids = body_map
        .get("agents")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::InvalidJson("agents field is required".to_string()))?;

    ids.iter()
        .map(|id| {
            id.as_str()
                .map(str::to_string)
                .ok_or_else(|| Error::InvalidJson("agents must be an array of id strings".to_string()))
        })
        .collect()
}
