// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Logging for the chanfs crates
//!
//! Usage:
//! - Set CHANFS_LOG=off (default) - no logs
//! - Set CHANFS_LOG=info - namespace changes
//! - Set CHANFS_LOG=debug - chain allocation, flushes, cache purges
//! - Set CHANFS_LOG=warn or CHANFS_LOG=error - problems only

use std::sync::Once;

// Re-export emit so macros can use it
pub use emit;

/// Environment variable holding the log level
pub const LOG_ENV: &str = "CHANFS_LOG";

static INIT: Once = Once::new();

/// Minimum level for a CHANFS_LOG value. `None` means logging is off.
/// Unknown values fall back to info.
pub fn level_from_env(value: Option<&str>) -> Option<emit::Level> {
    match value.map(str::trim).unwrap_or("off") {
        "" | "off" => None,
        "debug" => Some(emit::Level::Debug),
        "warn" => Some(emit::Level::Warn),
        "error" => Some(emit::Level::Error),
        _ => Some(emit::Level::Info),
    }
}

/// Initialize logging based on the CHANFS_LOG environment variable
///
/// Safe to call more than once; only the first call has an effect.
pub fn init_diagnostics() {
    INIT.call_once(|| {
        let value = std::env::var(LOG_ENV).ok();
        let Some(level) = level_from_env(value.as_deref()) else {
            return;
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(level))
            .init();

        // The runtime lives for the rest of the process
        std::mem::forget(rt);

        if let Some(value) = value {
            if !matches!(value.trim(), "debug" | "info" | "warn" | "error") {
                emit::warn!("unknown CHANFS_LOG value {value}, using info");
            }
        }
    });
}

/// Namespace changes a user might want to see: files created, entries renamed
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Internal detail: chain allocation, in-place rewrites, cache purges
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Recoverable problems
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Failures that stop an operation
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

pub use init_diagnostics as init;
