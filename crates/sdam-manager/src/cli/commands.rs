/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

use crate::api::{self, AppState};
use crate::dal::DAL;
use crate::db::create_shared_connection_pool;
use crate::manager::agents::AgentManager;
use crate::manager::groups::GroupManager;
use crate::manager::heartbeat::HeartbeatMonitor;
use crate::messenger::{HttpMessenger, Messenger};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use sdam_utils::config::Settings;
use sdam_utils::logging::prelude::*;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::oneshot;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("../sdam-models/migrations");

/// Function to start the SDAM manager server
///
/// This function initializes the database, runs migrations, wires the
/// orchestrators together, configures API routes, and starts the server
/// with graceful shutdown support.
pub async fn serve(config: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting SDAM manager application");

    // Create database connection pool
    info!("Creating database connection pool");
    let connection_pool = create_shared_connection_pool(
        &config.database.url,
        "sdam",
        config.database.max_connections,
    );
    info!("Database connection pool created successfully");

    // Run pending migrations
    info!("Running pending database migrations");
    {
        let mut conn = connection_pool.get().expect("Failed to get DB connection");
        conn.run_pending_migrations(MIGRATIONS)
            .expect("Failed to run migrations");
    }
    info!("Database migrations completed successfully");

    // Initialize Data Access Layer
    info!("Initializing Data Access Layer");
    let dal = DAL::new(connection_pool.clone());

    // Wire the orchestrators
    let messenger: Arc<dyn Messenger> = Arc::new(HttpMessenger::new());
    let heartbeats = HeartbeatMonitor::new(dal.clone(), config.agent.latency_slack_minutes);
    let agents = AgentManager::new(
        dal.clone(),
        messenger.clone(),
        heartbeats,
        config.agent.default_port.clone(),
    );
    let groups = GroupManager::new(dal.clone(), messenger);

    // Configure API routes
    info!("Configuring API routes");
    let state = AppState {
        agents,
        groups,
        dal,
    };
    let app = api::configure_api_routes(&config.cors).with_state(state);

    // Set up the server address
    let addr = &config.server.bind;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Set up shutdown signal handler
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        signal::ctrl_c().await.expect("Failed to listen for ctrl+c");
        shutdown_tx.send(()).ok();
    });

    // Start the server with graceful shutdown
    info!("SDAM manager is now running");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown(shutdown_rx))
    .await?;

    Ok(())
}

/// Handles the shutdown process for the manager.
///
/// This function waits for a shutdown signal before letting in-flight
/// requests drain.
async fn shutdown(shutdown_rx: oneshot::Receiver<()>) {
    let _ = shutdown_rx.await;
    info!("Shutdown signal received");
}
