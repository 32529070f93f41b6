//! # Structured Logging Module
//!
//! Environment-aware structured logging for bulk runs. Console output is
//! human readable by default and switches to JSON lines when
//! `BULKOPS_LOG_FORMAT=json`. `RUST_LOG` always wins over the environment
//! default level.

use crate::constants::env;
use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));

        let layer = if use_json_format() {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        // Don't panic if the host application already installed a subscriber
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing");
        }

        tracing::info!(
            environment = %environment,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

fn get_environment() -> String {
    std::env::var(env::ENVIRONMENT)
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        "test" => "warn",
        _ => "debug",
    }
}

fn use_json_format() -> bool {
    std::env::var(env::LOG_FORMAT)
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Log structured data for run lifecycle events
pub fn log_run_operation(
    operation: &str,
    run_id: &str,
    total: usize,
    total_batches: usize,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        run_id = %run_id,
        total = total,
        total_batches = total_batches,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "📦 RUN_OPERATION"
    );
}

/// Log structured data for a single batch
pub fn log_batch_operation(
    operation: &str,
    run_id: &str,
    batch_index: usize,
    batch_count: usize,
    batch_size: usize,
    failed: Option<usize>,
) {
    tracing::debug!(
        operation = %operation,
        run_id = %run_id,
        batch_index = batch_index,
        batch_count = batch_count,
        batch_size = batch_size,
        failed = failed,
        timestamp = %Utc::now().to_rfc3339(),
        "🔁 BATCH_OPERATION"
    );
}
