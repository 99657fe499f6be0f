/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! This module provides a Data Access Layer (DAL) for managing Agent entities in the database.
//!
//! It uses Diesel ORM for database operations and includes functionality for creating,
//! retrieving, updating, and deleting agents, and for maintaining the set of
//! applications installed on each agent.

use crate::dal::{parse_id, DAL};
use crate::error::Error;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types;
use sdam_models::models::agents::{Agent, NewAgent};
use sdam_models::schema::agents;
use uuid::Uuid;

/// Represents the Data Access Layer for Agent-related operations.
pub struct AgentsDAL<'a> {
    /// Reference to the main DAL instance.
    pub dal: &'a DAL,
}

impl<'a> AgentsDAL<'a> {
    /// Creates a new agent in the database.
    ///
    /// # Arguments
    ///
    /// * `new_agent` - A reference to the NewAgent struct containing the agent details.
    ///
    /// # Returns
    ///
    /// Returns a Result containing the created Agent on success, or an Error on failure.
    pub fn create(&self, new_agent: &NewAgent) -> Result<Agent, Error> {
        let conn = &mut self.dal.pool.get()?;
        Ok(diesel::insert_into(agents::table)
            .values(new_agent)
            .get_result(conn)?)
    }

    /// Retrieves an agent by its id.
    ///
    /// Fails with `Error::InvalidId` before any query if the id is malformed,
    /// and with `Error::NotFound` if no agent exists under the id.
    pub fn get(&self, agent_id: &str) -> Result<Agent, Error> {
        let uuid = parse_id(agent_id)?;
        let conn = &mut self.dal.pool.get()?;
        Ok(agents::table.filter(agents::id.eq(uuid)).first(conn)?)
    }

    /// Retrieves the agent registered under the given network address.
    pub fn get_by_ip(&self, ip: &str) -> Result<Agent, Error> {
        let conn = &mut self.dal.pool.get()?;
        Ok(agents::table.filter(agents::host.eq(ip)).first(conn)?)
    }

    /// Retrieves an agent only if the given app is installed on it.
    ///
    /// An agent without the app is indistinguishable from a missing agent:
    /// both fail with `Error::NotFound`.
    pub fn get_by_app_id(&self, agent_id: &str, app_id: &str) -> Result<Agent, Error> {
        let uuid = parse_id(agent_id)?;
        let conn = &mut self.dal.pool.get()?;
        Ok(agents::table
            .filter(agents::id.eq(uuid))
            .filter(agents::apps.contains(vec![app_id.to_string()]))
            .first(conn)?)
    }

    /// Lists all agents.
    pub fn list(&self) -> Result<Vec<Agent>, Error> {
        let conn = &mut self.dal.pool.get()?;
        Ok(agents::table.select(agents::all_columns).load::<Agent>(conn)?)
    }

    /// Updates an agent's network address.
    pub fn update_address(&self, agent_id: &str, host: &str, port: &str) -> Result<(), Error> {
        let uuid = parse_id(agent_id)?;
        let conn = &mut self.dal.pool.get()?;
        let updated = diesel::update(agents::table.filter(agents::id.eq(uuid)))
            .set((agents::host.eq(host), agents::port.eq(port)))
            .execute(conn)?;

        if updated == 0 {
            return Err(Error::NotFound(format!("agent '{}' does not exist", agent_id)));
        }
        Ok(())
    }

    /// Updates an agent's status.
    ///
    /// # Arguments
    ///
    /// * `agent_id` - The id of the agent to update.
    /// * `status` - A string slice representing the new status.
    pub fn update_status(&self, agent_id: &str, status: &str) -> Result<(), Error> {
        let uuid = parse_id(agent_id)?;
        let conn = &mut self.dal.pool.get()?;
        let updated = diesel::update(agents::table.filter(agents::id.eq(uuid)))
            .set(agents::status.eq(status))
            .execute(conn)?;

        if updated == 0 {
            return Err(Error::NotFound(format!("agent '{}' does not exist", agent_id)));
        }
        Ok(())
    }

    /// Adds an app id to the agent's installed set.
    ///
    /// The insertion is idempotent: adding an app that is already present
    /// leaves the set unchanged and succeeds.
    pub fn add_app(&self, agent_id: &str, app_id: &str) -> Result<(), Error> {
        let uuid = parse_id(agent_id)?;
        let conn = &mut self.dal.pool.get()?;
        let updated = sql_query(
            "UPDATE agents SET apps = array_append(apps, $2) \
             WHERE id = $1 AND NOT ($2 = ANY(apps))",
        )
        .bind::<sql_types::Uuid, _>(uuid)
        .bind::<sql_types::Text, _>(app_id)
        .execute(conn)?;

        if updated == 0 {
            // Either the app was already present or the agent is missing;
            // only the latter is an error.
            agents::table
                .filter(agents::id.eq(uuid))
                .select(agents::id)
                .first::<Uuid>(conn)?;
        }
        Ok(())
    }

    /// Removes an app id from the agent's installed set.
    ///
    /// Removing an app that is not present is a no-op; a missing agent
    /// fails with `Error::NotFound`.
    pub fn delete_app(&self, agent_id: &str, app_id: &str) -> Result<(), Error> {
        let uuid = parse_id(agent_id)?;
        let conn = &mut self.dal.pool.get()?;
        let updated = sql_query("UPDATE agents SET apps = array_remove(apps, $2) WHERE id = $1")
            .bind::<sql_types::Uuid, _>(uuid)
            .bind::<sql_types::Text, _>(app_id)
            .execute(conn)?;

        if updated == 0 {
            return Err(Error::NotFound(format!("agent '{}' does not exist", agent_id)));
        }
        Ok(())
    }

    /// Deletes an agent record.
    pub fn delete(&self, agent_id: &str) -> Result<(), Error> {
        let uuid = parse_id(agent_id)?;
        let conn = &mut self.dal.pool.get()?;
        let deleted = diesel::delete(agents::table.filter(agents::id.eq(uuid))).execute(conn)?;

        if deleted == 0 {
            return Err(Error::NotFound(format!("agent '{}' does not exist", agent_id)));
        }
        Ok(())
    }
}
