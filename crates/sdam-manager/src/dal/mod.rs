/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Data Access Layer (DAL) Module
//!
//! This module provides an abstraction layer for database operations in the
//! SDAM manager. It includes structures and methods for interacting with the
//! persistent entities: agents and agent groups.
//!
//! ## Main Structures
//!
//! - `DAL`: The main Data Access Layer struct that provides access to all sub-DALs.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sdam_manager::dal::DAL;
//! use sdam_manager::db::create_shared_connection_pool;
//!
//! let pool = create_shared_connection_pool("database_url", "sdam", 5);
//! let dal = DAL::new(pool);
//!
//! let agents = dal.agents().list().expect("Failed to list agents");
//! ```

use crate::db::ConnectionPool;
use crate::error::Error;
use uuid::Uuid;

pub mod agents;
use agents::AgentsDAL;

pub mod groups;
use groups::GroupsDAL;

/// The main Data Access Layer struct.
///
/// This struct serves as the central point for database operations,
/// managing a connection pool and providing access to specific DAL
/// implementations for different entities.
#[derive(Clone)]
pub struct DAL {
    /// A connection pool for PostgreSQL database connections.
    pub pool: ConnectionPool,
}

impl DAL {
    /// Creates a new DAL instance with the given connection pool.
    pub fn new(pool: ConnectionPool) -> Self {
        DAL { pool }
    }

    /// Provides access to the Agents Data Access Layer.
    pub fn agents(&self) -> AgentsDAL {
        AgentsDAL { dal: self }
    }

    /// Provides access to the Groups Data Access Layer.
    pub fn groups(&self) -> GroupsDAL {
        GroupsDAL { dal: self }
    }
}

/// Checks the shape of an id parameter before any store interaction.
///
/// Malformed ids are rejected with `Error::InvalidId` without touching
/// the database.
pub(crate) fn parse_id(id: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(id).map_err(|_| Error::InvalidId(format!("malformed identifier '{}'", id)))
}
