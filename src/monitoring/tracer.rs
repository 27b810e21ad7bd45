/*!
 * Structured Tracing
 * Subscriber setup and per-operation spans for tracker operations
 */

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, span, warn, Level, Span};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Enables JSON output when set to `1` or `true`
pub const ENV_TRACE_JSON: &str = "APPLET_MONITOR_TRACE_JSON";

static NEXT_OPERATION: AtomicU64 = AtomicU64::new(1);

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - APPLET_MONITOR_TRACE_JSON: Enable JSON output (default: false)
///
/// `log` records from the lower layers are bridged in. Returns false if a
/// global subscriber was already installed.
pub fn init_tracing() -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(ENV_TRACE_JSON)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!(json = use_json, "structured tracing initialized");
    }
    installed
}

/// Span around one tracker operation
///
/// Logs completion at debug, or a warning when the operation took longer
/// than `slow_threshold`.
pub struct OperationSpan {
    span: Span,
    start: Instant,
    operation: &'static str,
    operation_id: u64,
    slow_threshold: Duration,
}

impl OperationSpan {
    pub fn new(operation: &'static str, slow_threshold: Duration) -> Self {
        let operation_id = NEXT_OPERATION.fetch_add(1, Ordering::Relaxed);
        let span = span!(
            Level::DEBUG,
            "operation",
            operation,
            operation_id,
            duration_us = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            operation,
            operation_id,
            slow_threshold,
        }
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Monotonic id for correlating log lines of one operation
    pub fn operation_id(&self) -> u64 {
        self.operation_id
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Enter the span context
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for OperationSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();
        self.span.record("duration_us", duration.as_micros() as u64);

        if duration > self.slow_threshold {
            warn!(
                operation = self.operation,
                operation_id = self.operation_id,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow operation detected"
            );
        } else {
            debug!(
                operation = self.operation,
                operation_id = self.operation_id,
                duration_us = duration.as_micros() as u64,
                "operation completed"
            );
        }
    }
}
