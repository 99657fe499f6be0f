// src/models/agents.rs

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of an agent whose heartbeats arrive within the expected window.
pub const STATUS_CONNECTED: &str = "connected";
/// Status of an agent whose heartbeat window elapsed without a ping.
pub const STATUS_DISCONNECTED: &str = "disconnected";

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::agents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Agent {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub host: String,
    pub port: String,
    pub apps: Vec<String>,
    pub status: String,
}

#[derive(Insertable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::agents)]
pub struct NewAgent {
    pub host: String,
    pub port: String,
    pub status: String,
}

impl NewAgent {
    pub fn new(host: String, port: String, status: String) -> Result<Self, String> {
        // Check for empty strings
        if host.trim().is_empty() {
            return Err("Host cannot be empty".to_string());
        }
        if port.trim().is_empty() {
            return Err("Port cannot be empty".to_string());
        }
        if !port.chars().all(|c| c.is_ascii_digit()) {
            return Err("Port must be numeric".to_string());
        }
        if status != STATUS_CONNECTED && status != STATUS_DISCONNECTED {
            return Err("Status must be 'connected' or 'disconnected'".to_string());
        }

        Ok(NewAgent { host, port, status })
    }
}
