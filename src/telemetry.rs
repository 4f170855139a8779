//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! Behavior:
//! - LOG_LEVEL controls the filter (e.g. "debug" or detailed directives like
//!   "info,question=debug,streak=debug,tower_http=info").
//! - LOG_FORMAT selects "pretty" (default) or "json" structured logs.
//! - LOG_SPANS=close|full adds span lifecycle events, which carry the
//!   `time.busy`/`time.idle` of each instrumented operation.
//!
//! Targets in use: `codestreak` (service), `question` (daily selection and
//! cache), `streak` (user updates).

use tracing::info;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,question=debug,streak=debug,codestreak=debug,tower_http=info,axum=info";

/// Span lifecycle events for a `LOG_SPANS` value; unknown values mean none.
fn span_events(value: Option<&str>) -> FmtSpan {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("close") => FmtSpan::CLOSE,
        Some("full") => FmtSpan::FULL,
        _ => FmtSpan::NONE,
    }
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let filter_desc = filter.to_string();
    let spans = std::env::var("LOG_SPANS").ok();
    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(span_events(spans.as_deref()))
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }

    info!(
        target: "codestreak",
        filter = %filter_desc,
        format = if json { "json" } else { "pretty" },
        spans = spans.as_deref().unwrap_or("none"),
        "Tracing initialized"
    );
}
