pub mod logging;
pub mod trace_context;

pub use logging::init_tracing;
pub use trace_context::{
    PropagateTrace, TRACEPARENT_HEADER, TRACESTATE_HEADER, current_traceparent, trace_headers,
};
