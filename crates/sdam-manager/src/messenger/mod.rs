/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Messenger Module
//!
//! Abstracted interface for the HTTP messages exchanged with edge agents.
//!
//! Every operation takes an ordered list of member addresses and returns
//! two vectors of the same length: the per-member status codes and the
//! per-member raw response bodies, aligned with the input order. The
//! operations never fail as a whole; transport failures are reported
//! in-band as a `500` code with a `{"message": "..."}` body so that one
//! unreachable agent cannot hide the outcomes of the others.

use async_trait::async_trait;

pub mod http;
pub use http::HttpMessenger;

/// Network address of one edge agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub host: String,
    pub port: String,
}

impl Address {
    /// Builds the absolute URL of an agent API endpoint.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}:{}/api/v1{}", self.host, self.port, path)
    }
}

/// Interface for dispatching application lifecycle requests to edge agents.
///
/// Implemented over real HTTP by [`HttpMessenger`]; tests substitute a
/// scripted implementation.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// POST `/api/v1/deploy` with the app description as body.
    async fn deploy_app(&self, members: &[Address], data: &str) -> (Vec<u16>, Vec<String>);

    /// GET `/api/v1/apps`.
    async fn info_apps(&self, members: &[Address]) -> (Vec<u16>, Vec<String>);

    /// GET `/api/v1/apps/{app_id}`.
    async fn info_app(&self, members: &[Address], app_id: &str) -> (Vec<u16>, Vec<String>);

    /// POST `/api/v1/apps/{app_id}` with the updated description as body.
    async fn update_app_info(
        &self,
        members: &[Address],
        app_id: &str,
        data: &str,
    ) -> (Vec<u16>, Vec<String>);

    /// POST `/api/v1/apps/{app_id}/update`.
    async fn update_app(&self, members: &[Address], app_id: &str) -> (Vec<u16>, Vec<String>);

    /// POST `/api/v1/apps/{app_id}/start`.
    async fn start_app(&self, members: &[Address], app_id: &str) -> (Vec<u16>, Vec<String>);

    /// POST `/api/v1/apps/{app_id}/stop`.
    async fn stop_app(&self, members: &[Address], app_id: &str) -> (Vec<u16>, Vec<String>);

    /// DELETE `/api/v1/apps/{app_id}`.
    async fn delete_app(&self, members: &[Address], app_id: &str) -> (Vec<u16>, Vec<String>);

    /// POST `/api/v1/unregister`.
    async fn unregister(&self, members: &[Address]) -> (Vec<u16>, Vec<String>);
}
