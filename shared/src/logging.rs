//! Shared logging utilities for consistent tracing across the orchestrator

use chrono::{DateTime, Utc};
use tracing::{error, info};

/// Build the default filter directive for the given base level
pub fn default_filter(log_level: Option<&str>) -> String {
    let base_level = log_level.unwrap_or("info");
    format!("orchestrator={base_level},shared={base_level},reqwest=warn,hyper=warn")
}

/// Initialize the tracing subscriber
///
/// `RUST_LOG` takes precedence over `log_level` when it is set.
pub fn init_tracing(log_level: Option<&str>) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(log_level)));

    // try_init so tests and embedding hosts that already installed a subscriber keep it
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}

/// Macro for site-aware info logging
#[macro_export]
macro_rules! site_info {
    ($site_id:expr, $($arg:tt)*) => {
        tracing::info!(
            site = %$site_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for site-aware warning logging
#[macro_export]
macro_rules! site_warn {
    ($site_id:expr, $($arg:tt)*) => {
        tracing::warn!(
            site = %$site_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for site-aware error logging
#[macro_export]
macro_rules! site_error {
    ($site_id:expr, $($arg:tt)*) => {
        tracing::error!(
            site = %$site_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for site-aware debug logging
#[macro_export]
macro_rules! site_debug {
    ($site_id:expr, $($arg:tt)*) => {
        tracing::debug!(
            site = %$site_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Contextual logging helper for startup messages
pub fn log_startup(details: &str) {
    info!(timestamp = format_timestamp(), "🚀 Starting {}", details);
}

/// Contextual logging helper for shutdown messages
pub fn log_shutdown(reason: &str) {
    info!(timestamp = format_timestamp(), "🛑 Shutting down: {}", reason);
}

/// Contextual logging helper for error conditions
pub fn log_error(context: &str, error: &dyn std::fmt::Display) {
    error!(
        timestamp = format_timestamp(),
        error = %error,
        "❌ {} failed: {}",
        context,
        error
    );
}

/// Contextual logging helper for success conditions
pub fn log_success(message: &str) {
    info!(timestamp = format_timestamp(), "✅ {}", message);
}

/// Contextual logging helper for progress updates
pub fn log_progress(action: &str, details: &str) {
    info!(timestamp = format_timestamp(), "📋 {}: {}", action, details);
}
