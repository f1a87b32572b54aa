use axum::{extract::Request, http::header, middleware::Next, response::IntoResponse};

/// Attach the browser CORS headers to every response, errors included.
///
/// Preflight requests are answered by the relay route itself, so this is a
/// plain header stamp rather than a CORS negotiation layer.
pub async fn cors_headers_middleware(req: Request, next: Next) -> impl IntoResponse {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        header::HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        header::HeaderValue::from_static("Content-Type"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        header::HeaderValue::from_static("POST, OPTIONS"),
    );

    response
}
