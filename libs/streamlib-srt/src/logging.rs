// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Host-side `tracing` subscriber for processes without their own.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Environment variable consulted before `RUST_LOG`.
pub const LOG_ENV_VAR: &str = "STREAMLIB_SRT_LOG";

static INIT: Once = Once::new();

/// Install a stderr fmt subscriber filtered by `STREAMLIB_SRT_LOG`, then
/// `RUST_LOG`, then `info`.
///
/// Runs at most once per process. A subscriber the host already installed
/// is left in place.
pub fn init_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("info"));

        // Ignore if already initialized
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();

        tracing::debug!(
            "[SRT] Control surface logging initialized (SRT {})",
            crate::version::SRT_VERSION_STRING
        );
    });
}
