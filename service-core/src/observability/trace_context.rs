//! W3C Trace Context propagation for outbound HTTP calls.
//!
//! See: https://www.w3.org/TR/trace-context/

use opentelemetry::trace::TraceContextExt;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Header name for W3C traceparent
pub const TRACEPARENT_HEADER: &str = "traceparent";

/// Header name for W3C tracestate
pub const TRACESTATE_HEADER: &str = "tracestate";

/// Format the current span's context as a `traceparent` value.
///
/// Returns `None` when there is no sampled OpenTelemetry span, which is the
/// case whenever the OTLP exporter is disabled.
pub fn current_traceparent() -> Option<String> {
    let context = Span::current().context();
    let otel_span = context.span();
    let span_context = otel_span.span_context();

    if !span_context.is_valid() {
        return None;
    }

    // version-trace_id-span_id-trace_flags
    Some(format!(
        "00-{}-{}-{:02x}",
        span_context.trace_id(),
        span_context.span_id(),
        span_context.trace_flags().to_u8()
    ))
}

/// Headers carrying the current trace context; empty without an active span.
pub fn trace_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();

    let Some(traceparent) = current_traceparent() else {
        return headers;
    };
    if let Ok(value) = HeaderValue::from_str(&traceparent) {
        headers.insert(TRACEPARENT_HEADER, value);
    }

    let context = Span::current().context();
    let tracestate = context.span().span_context().trace_state().header();
    if !tracestate.is_empty()
        && let Ok(value) = HeaderValue::from_str(&tracestate)
    {
        headers.insert(TRACESTATE_HEADER, value);
    }

    headers
}

/// Attach trace context headers to an outgoing reqwest request.
pub trait PropagateTrace {
    fn with_trace_context(self) -> Self;
}

impl PropagateTrace for reqwest::RequestBuilder {
    fn with_trace_context(self) -> Self {
        self.headers(trace_headers())
    }
}
