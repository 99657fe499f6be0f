/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! This module provides a Data Access Layer (DAL) for managing Group entities in the database.
//!
//! Groups hold a set of agent ids. The store does not enforce referential
//! integrity on membership; expansion of members to agent records skips
//! ids with no backing agent.

use crate::dal::{parse_id, DAL};
use crate::error::Error;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types;
use sdam_models::models::agents::Agent;
use sdam_models::models::groups::Group;
use sdam_models::schema::{agents, groups};
use uuid::Uuid;

/// Represents the Data Access Layer for Group-related operations.
pub struct GroupsDAL<'a> {
    /// Reference to the main DAL instance.
    pub dal: &'a DAL,
}

impl<'a> GroupsDAL<'a> {
    /// Creates a new, empty group.
    pub fn create(&self) -> Result<Group, Error> {
        let conn = &mut self.dal.pool.get()?;
        Ok(diesel::insert_into(groups::table)
            .default_values()
            .get_result(conn)?)
    }

    /// Retrieves a group by its id.
    pub fn get(&self, group_id: &str) -> Result<Group, Error> {
        let uuid = parse_id(group_id)?;
        let conn = &mut self.dal.pool.get()?;
        Ok(groups::table.filter(groups::id.eq(uuid)).first(conn)?)
    }

    /// Lists all groups.
    pub fn list(&self) -> Result<Vec<Group>, Error> {
        let conn = &mut self.dal.pool.get()?;
        Ok(groups::table.select(groups::all_columns).load::<Group>(conn)?)
    }

    /// Expands a group's member ids to full agent records.
    ///
    /// Member ids without a backing agent record are skipped.
    pub fn members(&self, group_id: &str) -> Result<Vec<Agent>, Error> {
        let uuid = parse_id(group_id)?;
        let conn = &mut self.dal.pool.get()?;
        let group: Group = groups::table.filter(groups::id.eq(uuid)).first(conn)?;
        Ok(agents::table
            .filter(agents::id.eq_any(group.members))
            .order((agents::created_at.asc(), agents::id.asc()))
            .load::<Agent>(conn)?)
    }

    /// Expands a group's member ids to the agent records that have the
    /// given app installed.
    pub fn members_by_app_id(&self, group_id: &str, app_id: &str) -> Result<Vec<Agent>, Error> {
        let uuid = parse_id(group_id)?;
        let conn = &mut self.dal.pool.get()?;
        let group: Group = groups::table.filter(groups::id.eq(uuid)).first(conn)?;
        Ok(agents::table
            .filter(agents::id.eq_any(group.members))
            .filter(agents::apps.contains(vec![app_id.to_string()]))
            .order((agents::created_at.asc(), agents::id.asc()))
            .load::<Agent>(conn)?)
    }

    /// Adds an agent id to the group's member set.
    ///
    /// The insertion is idempotent. The agent id is shape-checked but is
    /// not required to reference an extant agent.
    pub fn join(&self, group_id: &str, agent_id: &str) -> Result<(), Error> {
        let group_uuid = parse_id(group_id)?;
        let agent_uuid = parse_id(agent_id)?;
        let conn = &mut self.dal.pool.get()?;
        let updated = sql_query(
            "UPDATE groups SET members = array_append(members, $2) \
             WHERE id = $1 AND NOT ($2 = ANY(members))",
        )
        .bind::<sql_types::Uuid, _>(group_uuid)
        .bind::<sql_types::Uuid, _>(agent_uuid)
        .execute(conn)?;

        if updated == 0 {
            // Either the agent was already a member or the group is missing.
            groups::table
                .filter(groups::id.eq(group_uuid))
                .select(groups::id)
                .first::<Uuid>(conn)?;
        }
        Ok(())
    }

    /// Removes an agent id from the group's member set.
    ///
    /// Removing a non-member is a no-op; a missing group fails with
    /// `Error::NotFound`.
    pub fn leave(&self, group_id: &str, agent_id: &str) -> Result<(), Error> {
        let group_uuid = parse_id(group_id)?;
        let agent_uuid = parse_id(agent_id)?;
        let conn = &mut self.dal.pool.get()?;
        let updated = sql_query("UPDATE groups SET members = array_remove(members, $2) WHERE id = $1")
            .bind::<sql_types::Uuid, _>(group_uuid)
            .bind::<sql_types::Uuid, _>(agent_uuid)
            .execute(conn)?;

        if updated == 0 {
            return Err(Error::NotFound(format!("group '{}' does not exist", group_id)));
        }
        Ok(())
    }

    /// Deletes a group record.
    pub fn delete(&self, group_id: &str) -> Result<(), Error> {
        let uuid = parse_id(group_id)?;
        let conn = &mut self.dal.pool.get()?;
        let deleted = diesel::delete(groups::table.filter(groups::id.eq(uuid))).execute(conn)?;

        if deleted == 0 {
            return Err(Error::NotFound(format!("group '{}' does not exist", group_id)));
        }
        Ok(())
    }
}
