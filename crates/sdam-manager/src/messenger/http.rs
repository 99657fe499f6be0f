/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! HTTP implementation of the [`Messenger`] interface.
//!
//! One Tokio task is spawned per target URL, each carrying its input
//! index; the results arrive on a channel in completion order and are
//! sorted back into the input order before being returned. A single
//! attempt is made per request, with no retries and no timeout beyond
//! the HTTP client's defaults.

use crate::messenger::{Address, Messenger};
use crate::metrics;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use sdam_utils::logging::prelude::*;
use std::time::Instant;
use tokio::sync::mpsc;

/// Messenger implementation backed by a shared `reqwest` client.
#[derive(Clone)]
pub struct HttpMessenger {
    client: Client,
}

impl HttpMessenger {
    pub fn new() -> Self {
        HttpMessenger {
            client: Client::new(),
        }
    }

    /// Performs all requests concurrently and collects the outcomes in
    /// input order.
    async fn send_requests(
        &self,
        method: Method,
        urls: Vec<String>,
        data: Option<String>,
    ) -> (Vec<u16>, Vec<String>) {
        let count = urls.len();
        let started = Instant::now();
        let (tx, mut rx) = mpsc::channel::<(usize, u16, String)>(count.max(1));

        for (index, url) in urls.into_iter().enumerate() {
            let client = self.client.clone();
            let method = method.clone();
            let data = data.clone();
            let tx = tx.clone();

            tokio::spawn(async move {
                debug!("sending http request: {} {}", method, url);

                let mut request = client.request(method, &url);
                if let Some(body) = data {
                    request = request.header(CONTENT_TYPE, "application/json").body(body);
                }

                let (code, body) = match request.send().await {
                    Ok(response) => {
                        let code = response.status().as_u16();
                        match response.text().await {
                            Ok(text) => (code, text),
                            Err(e) => (500, transport_failure_body(&e.to_string())),
                        }
                    }
                    Err(e) => {
                        warn!("http request to {} failed: {}", url, e);
                        (500, transport_failure_body(&e.to_string()))
                    }
                };

                // The receiver outlives every sender; a send can only fail
                // if the collector was dropped, in which case the result
                // is moot anyway.
                let _ = tx.send((index, code, body)).await;
            });
        }
        drop(tx);

        let mut results = Vec::with_capacity(count);
        while let Some(result) = rx.recv().await {
            results.push(result);
        }
        results.sort_by_key(|(index, _, _)| *index);

        metrics::observe_fanout(count, started.elapsed().as_secs_f64());

        let codes = results.iter().map(|(_, code, _)| *code).collect();
        let bodies = results.into_iter().map(|(_, _, body)| body).collect();
        (codes, bodies)
    }
}

impl Default for HttpMessenger {
    fn default() -> Self {
        Self::new()
    }
}

/// In-band body reported for a request that never produced a response.
fn transport_failure_body(message: &str) -> String {
    serde_json::json!({ "message": message }).to_string()
}

fn urls_for(members: &[Address], path: &str) -> Vec<String> {
    members.iter().map(|member| member.url(path)).collect()
}

#[async_trait]
impl Messenger for HttpMessenger {
    async fn deploy_app(&self, members: &[Address], data: &str) -> (Vec<u16>, Vec<String>) {
        self.send_requests(
            Method::POST,
            urls_for(members, "/deploy"),
            Some(data.to_string()),
        )
        .await
    }

    async fn info_apps(&self, members: &[Address]) -> (Vec<u16>, Vec<String>) {
        self.send_requests(Method::GET, urls_for(members, "/apps"), None)
            .await
    }

    async fn info_app(&self, members: &[Address], app_id: &str) -> (Vec<u16>, Vec<String>) {
        self.send_requests(Method::GET, urls_for(members, &format!("/apps/{}", app_id)), None)
            .await
    }

    async fn update_app_info(
        &self,
        members: &[Address],
        app_id: &str,
        data: &str,
    ) -> (Vec<u16>, Vec<String>) {
        self.send_requests(
            Method::POST,
            urls_for(members, &format!("/apps/{}", app_id)),
            Some(data.to_string()),
        )
        .await
    }

    async fn update_app(&self, members: &[Address], app_id: &str) -> (Vec<u16>, Vec<String>) {
        self.send_requests(
            Method::POST,
            urls_for(members, &format!("/apps/{}/update", app_id)),
            None,
        )
        .await
    }

    async fn start_app(&self, members: &[Address], app_id: &str) -> (Vec<u16>, Vec<String>) {
        self.send_requests(
            Method::POST,
            urls_for(members, &format!("/apps/{}/start", app_id)),
            None,
        )
        .await
    }

    async fn stop_app(&self, members: &[Address], app_id: &str) -> (Vec<u16>, Vec<String>) {
        self.send_requests(
            Method::POST,
            urls_for(members, &format!("/apps/{}/stop", app_id)),
            None,
        )
        .await
    }

    async fn delete_app(&self, members: &[Address], app_id: &str) -> (Vec<u16>, Vec<String>) {
        self.send_requests(
            Method::DELETE,
            urls_for(members, &format!("/apps/{}", app_id)),
            None,
        )
        .await
    }

    async fn unregister(&self, members: &[Address]) -> (Vec<u16>, Vec<String>) {
        self.send_requests(Method::POST, urls_for(members, "/unregister"), None)
            .await
    }
}
