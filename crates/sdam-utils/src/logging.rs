/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # SDAM Logging Module
//!
//! Structured logging for the SDAM crates, built on `tracing`.
//!
//! The global subscriber is installed once at process start from the
//! `log` settings group. The configured level is interpreted as a
//! tracing filter directive, so both a bare level ("info", "debug") and
//! a full directive ("sdam_manager=debug,info") work; setting `RUST_LOG`
//! overrides the configured level entirely. The `format` setting picks
//! between human-readable and JSON line output.
//!
//! Crates emit events through [`prelude`], which re-exports the tracing
//! event macros:
//!
//! ```ignore
//! use sdam_utils::logging::prelude::*;
//!
//! info!("registered new agent {}", agent_id);
//! ```

use tracing_subscriber::EnvFilter;

/// Filter applied when the configured level is not a valid directive.
const FALLBACK_DIRECTIVE: &str = "info";

/// Installs the global tracing subscriber.
///
/// # Arguments
/// * `level` - Filter directive from the configuration ("debug", "info", ...)
/// * `format` - Output format, "text" for human-readable lines or "json"
///
/// # Errors
/// Fails if a global subscriber is already installed.
pub fn init(level: &str, format: &str) -> Result<(), String> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_filter(level))
        .with_target(false);

    let installed = if format.eq_ignore_ascii_case("json") {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| format!("failed to install tracing subscriber: {}", e))
}

/// Resolves the effective filter: `RUST_LOG` wins over the configured
/// level, and an unparseable level degrades to [`FALLBACK_DIRECTIVE`].
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_DIRECTIVE))
}

pub mod prelude {
    pub use tracing::{debug, error, info, trace, warn};
}
