pub mod cors;
pub mod metrics;

pub use cors::cors_headers_middleware;
pub use metrics::metrics_middleware;
