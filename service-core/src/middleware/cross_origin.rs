//! Cross-origin headers shared by every response.
//!
//! Browsers only expose `SharedArrayBuffer` and related capture APIs to
//! cross-origin isolated pages, which requires the COOP/COEP pair below on
//! the document and on every subresource it loads.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

pub const CROSS_ORIGIN_OPENER_POLICY: &str = "cross-origin-opener-policy";
pub const CROSS_ORIGIN_EMBEDDER_POLICY: &str = "cross-origin-embedder-policy";

/// Attach allow-origin and isolation headers to whatever the inner service
/// produced, including static files and 404s.
pub async fn cross_origin_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    apply_cross_origin_headers(response.headers_mut());
    response
}

pub fn apply_cross_origin_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        CROSS_ORIGIN_OPENER_POLICY,
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        CROSS_ORIGIN_EMBEDDER_POLICY,
        HeaderValue::from_static("require-corp"),
    );
}

/// Empty 200 answering a CORS preflight with fully permissive grants.
pub fn preflight_response() -> Response {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "*"),
        ],
    )
        .into_response()
}
