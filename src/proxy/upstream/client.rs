// Upstream client implementation
// One outbound call per proxied request, credentials injected into the query

use bytes::Bytes;
use reqwest::{header, Client, StatusCode};
use serde_json::Value;
use url::Url;

use crate::error::{AppError, AppResult};
use crate::proxy::config::ProxyConfig;
use crate::proxy::credentials::{ResolvedCredentials, API_SECRET_PARAM, API_TOKEN_PARAM};
use crate::proxy::error::ProxyError;
use crate::proxy::mappers::ProxyRequest;

/// Successful upstream reply, relayed verbatim.
#[derive(Debug)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub content_type: Option<header::HeaderValue>,
    pub body: Bytes,
}

pub struct UpstreamClient {
    http_client: Client,
    base_url: Url,
}

impl UpstreamClient {
    pub fn new(config: &ProxyConfig) -> AppResult<Self> {
        let base_url = Url::parse(&config.upstream_base_url).map_err(|e| {
            AppError::Config(format!(
                "Invalid upstream_base_url {}: {}",
                config.upstream_base_url, e
            ))
        })?;

        let http_client = crate::utils::http::create_client_with_proxy(
            config.request_timeout,
            Some(&config.upstream_proxy),
        )?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the outbound URL: base + normalized path, caller params, then credentials.
    ///
    /// The path is concatenated as text rather than resolved with `Url::join`,
    /// so a path like `//other.host/x` stays on the upstream host.
    pub fn build_url(
        &self,
        request: &ProxyRequest,
        credentials: &ResolvedCredentials<'_>,
    ) -> Result<Url, ProxyError> {
        let raw = format!("{}{}", self.base_url, request.normalized_path);
        let mut url = Url::parse(&raw).map_err(|e| {
            ProxyError::ClientInput(format!("Invalid request body: bad path '{}': {}", request.path, e))
        })?;

        // Keep a query embedded in the path, minus any credential names
        let embedded: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_credential_param(key))
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        url.set_query(None);

        {
            let mut query = url.query_pairs_mut();
            query.extend_pairs(embedded);
            for (key, value) in &request.params {
                if !is_credential_param(key) {
                    query.append_pair(key, value);
                }
            }
            query.append_pair(API_TOKEN_PARAM, credentials.token);
            query.append_pair(API_SECRET_PARAM, credentials.secret);
        }

        Ok(url)
    }

    /// Issue the single upstream call. No retries.
    pub async fn forward(
        &self,
        request: &ProxyRequest,
        credentials: &ResolvedCredentials<'_>,
    ) -> Result<UpstreamReply, ProxyError> {
        let url = self.build_url(request, credentials)?;

        let mut builder = self
            .http_client
            .request(request.method.clone(), url)
            .header(header::ACCEPT, "application/json");
        if let Some(body) = request.outbound_body() {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
        let body = response.bytes().await.map_err(transport_error)?;

        if status.is_success() {
            Ok(UpstreamReply {
                status,
                content_type,
                body,
            })
        } else {
            Err(status_error(status, &body))
        }
    }
}

fn is_credential_param(key: &str) -> bool {
    key == API_TOKEN_PARAM || key == API_SECRET_PARAM
}

/// The request URL carries the credentials, so it is stripped before the
/// error is rendered anywhere.
fn transport_error(err: reqwest::Error) -> ProxyError {
    let status = err.status();
    let err = err.without_url();
    let message = if err.is_timeout() {
        "Upstream request timed out".to_string()
    } else {
        format!("Upstream request failed: {}", err)
    };
    ProxyError::Upstream {
        status,
        message,
        details: None,
    }
}

fn status_error(status: StatusCode, body: &[u8]) -> ProxyError {
    let details = match serde_json::from_slice::<Value>(body) {
        Ok(value) => Some(value),
        Err(_) => {
            let text = String::from_utf8_lossy(body).trim().to_string();
            (!text.is_empty()).then_some(Value::String(text))
        }
    };

    let message = details
        .as_ref()
        .and_then(|d| d.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Upstream request failed with status {}", status));

    ProxyError::Upstream {
        status: Some(status),
        message,
        details,
    }
}
