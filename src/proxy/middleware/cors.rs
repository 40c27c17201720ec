// CORS handling
use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

const ALLOWED_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, OPTIONS";
const PREFLIGHT_MAX_AGE: &str = "86400";

/// Permissive CORS headers for ordinary responses. Origin is mirrored.
///
/// No `Access-Control-Allow-Credentials`; `preflight_response` must agree.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

/// Answer every OPTIONS request with an empty 204 before routing.
///
/// Must sit outside `cors_layer`, which would otherwise answer preflights
/// itself with 200.
pub async fn preflight_guard(request: Request, next: Next) -> Response {
    if request.method() != Method::OPTIONS {
        return next.run(request).await;
    }

    tracing::debug!("Preflight: {}", request.uri());
    preflight_response(request.headers())
}

fn preflight_response(req_headers: &HeaderMap) -> Response {
    let mirror = |name: header::HeaderName, fallback: &'static str| {
        req_headers
            .get(name)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static(fallback))
    };

    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        mirror(header::ORIGIN, "*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        mirror(header::ACCESS_CONTROL_REQUEST_METHOD, ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        mirror(header::ACCESS_CONTROL_REQUEST_HEADERS, "*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(PREFLIGHT_MAX_AGE),
    );
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("0"));
    response
}
