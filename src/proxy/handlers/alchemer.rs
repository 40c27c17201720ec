// Alchemer proxy handler
use axum::{
    extract::{rejection::BytesRejection, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

use crate::proxy::error::ProxyError;
use crate::proxy::mappers::{parse_envelope, ProxyRequest};
use crate::proxy::server::AppState;

/// Forward one envelope to the upstream API with server credentials attached.
///
/// Validation order: body shape, `path`, then credentials. Nothing is sent
/// upstream unless all three pass.
pub async fn handle_proxy(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let raw = match body {
        Ok(raw) => raw,
        Err(rejection) => {
            // Keep the rejection's status, e.g. 413 past the body limit
            warn!("Unreadable request body: {}", rejection.body_text());
            let mut response = ProxyError::ClientInput(format!(
                "Invalid request body: {}",
                rejection.body_text()
            ))
            .into_response();
            *response.status_mut() = rejection.status();
            return response;
        }
    };

    let request = match parse_envelope(&raw).and_then(ProxyRequest::try_from) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected proxy request: {}", e);
            return e.into_response();
        }
    };

    let credentials = match state.credentials.resolve() {
        Ok(credentials) => credentials,
        Err(e) => {
            error!("{}", e);
            return e.into_response();
        }
    };

    let span = tracing::info_span!(
        "proxy",
        request_id = %Uuid::new_v4(),
        method = %request.method,
        path = %request.normalized_path,
    );

    async {
        match state.upstream.forward(&request, &credentials).await {
            Ok(reply) => {
                info!("Upstream replied {}", reply.status.as_u16());
                let content_type = reply
                    .content_type
                    .unwrap_or_else(|| HeaderValue::from_static("application/json"));
                (reply.status, [(header::CONTENT_TYPE, content_type)], reply.body).into_response()
            }
            Err(e) => {
                if let ProxyError::Upstream {
                    status, details, ..
                } = &e
                {
                    error!(
                        "Alchemer Proxy Error: {} {} -> {:?}: {} (details: {})",
                        request.method,
                        request.path,
                        status,
                        e,
                        details
                            .as_ref()
                            .map(|d| d.to_string())
                            .unwrap_or_else(|| "none".to_string())
                    );
                } else {
                    error!("Alchemer Proxy Error: {} {}: {}", request.method, request.path, e);
                }
                e.into_response_for(&request.path, request.method.as_str())
            }
        }
    }
    .instrument(span)
    .await
}
