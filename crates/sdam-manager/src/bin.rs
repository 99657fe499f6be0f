/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! SDAM Manager CLI application
//!
//! This module provides the command-line interface for the SDAM manager
//! application.

use sdam_manager::cli::{commands, parse_cli, Commands};
use sdam_utils::config::Settings;

/// Main function to run the SDAM manager application
///
/// This function initializes the application, parses command-line arguments,
/// and executes the appropriate command based on user input.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = parse_cli();

    // Load configuration
    let config = Settings::new(cli.config.clone()).expect("Failed to load configuration");

    // Initialize logging
    sdam_utils::logging::init(&config.log.level, &config.log.format)
        .expect("Failed to initialize logging");

    // Execute the appropriate command
    match cli.command {
        Commands::Serve => commands::serve(&config).await?,
    }

    Ok(())
}
