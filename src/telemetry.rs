//! Tracing setup and request-scoped trace IDs.
//!
//! Every request runs inside a task-local [`TraceContext`] so error bodies can
//! report the same ID that appears in the logs and the `x-request-id` header.

use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use log::LevelFilter;
use thiserror::Error;
use tokio::task_local;
use tracing::Instrument;
use tracing_log::LogTracer;
use tracing_subscriber::{
    EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError,
};

use crate::config::AppConfig;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied request ID that is reused as the trace ID.
const MAX_REQUEST_ID_LEN: usize = 128;

#[derive(Debug, Clone)]
pub struct TraceContext {
    pub trace_id: String,
}

task_local! {
    static CURRENT: TraceContext;
}

#[derive(Debug, Error)]
pub enum TelemetryInitError {
    #[error("failed to install log tracer bridge: {0}")]
    LogTracer(#[from] log::SetLoggerError),
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] TryInitError),
}

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Installs the global subscriber once per process. SeaORM and sqlx emit
/// through `log::`, so a `LogTracer` bridge is installed as well.
///
/// Repeated calls after a successful install are no-ops. Fails when another
/// logger or subscriber already owns the global slot.
pub fn init_tracing(config: &AppConfig) -> Result<(), TelemetryInitError> {
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    install(config).inspect_err(|_| INSTALLED.store(false, Ordering::SeqCst))
}

fn install(config: &AppConfig) -> Result<(), TelemetryInitError> {
    LogTracer::builder()
        .with_max_level(LevelFilter::Trace)
        .init()?;

    let output = if config.log_format == "pretty" {
        fmt::layer().pretty().boxed()
    } else {
        fmt::layer().json().with_current_span(true).boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter(&config.log_level))
        .with(output)
        .try_init()?;
    Ok(())
}

/// `RUST_LOG` when set, otherwise the configured level.
fn env_filter(configured: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(configured))
}

/// Runs `future` with `context` as the task's trace context.
pub async fn with_trace_context<F: Future>(context: TraceContext, future: F) -> F::Output {
    CURRENT.scope(context, future).await
}

/// The trace ID of the request being handled on this task, if any.
pub fn current_trace_id() -> Option<String> {
    CURRENT.try_with(|ctx| ctx.trace_id.clone()).ok()
}

/// Reuses a sane caller-supplied `x-request-id`, else mints a fresh one.
fn request_trace_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string())
}

/// Outermost middleware: opens the request span, scopes the trace context
/// and echoes the trace ID back in `x-request-id`.
pub async fn trace_context_middleware(request: Request, next: Next) -> Response {
    let trace_id = request_trace_id(request.headers());
    let span = tracing::info_span!(
        "request",
        trace_id = %trace_id,
        method = %request.method(),
        path = %request.uri().path(),
    );
    let context = TraceContext {
        trace_id: trace_id.clone(),
    };

    let mut response = with_trace_context(context, next.run(request))
        .instrument(span)
        .await;
    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
