use crate::proxy::credentials::Credentials;
use crate::proxy::error::ProxyError;
use crate::proxy::upstream::UpstreamClient;
use crate::proxy::ProxyConfig;
use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

/// Axum application state. Built once at startup, read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub credentials: Arc<Credentials>,
    pub upstream: Arc<UpstreamClient>,
}

impl AppState {
    pub fn new(config: ProxyConfig, credentials: Credentials) -> crate::error::AppResult<Self> {
        let upstream = UpstreamClient::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            credentials: Arc::new(credentials),
            upstream: Arc::new(upstream),
        })
    }
}

/// Build the router: one proxy route plus health check.
pub fn build_router(state: AppState) -> Router {
    use crate::proxy::{handlers, middleware};

    let body_limit = state.config.max_body_bytes;

    Router::new()
        .route("/", any(handlers::alchemer::handle_proxy))
        .route("/healthz", get(health_check_handler))
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(middleware::access_log_middleware))
        .layer(middleware::cors_layer())
        .layer(axum::middleware::from_fn(middleware::preflight_guard))
        .with_state(state)
}

/// Axum server instance
pub struct ProxyServer {
    shutdown_tx: Option<oneshot::Sender<()>>,
    local_addr: std::net::SocketAddr,
}

impl ProxyServer {
    /// Bind and start serving in a background task.
    pub async fn start(
        host: &str,
        port: u16,
        state: AppState,
    ) -> crate::error::AppResult<(Self, tokio::task::JoinHandle<()>)> {
        let app = build_router(state);

        let addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
            crate::error::AppError::Server(format!("Failed to bind address {}: {}", addr, e))
        })?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Survey proxy started at http://{}", local_addr);

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            use hyper::server::conn::http1;
            use hyper_util::rt::TokioIo;
            use hyper_util::service::TowerToHyperService;

            loop {
                tokio::select! {
                    res = listener.accept() => {
                        match res {
                            Ok((stream, _)) => {
                                let io = TokioIo::new(stream);
                                let service = TowerToHyperService::new(app.clone());

                                // Dropping the connection drops the handler future,
                                // which cancels any in-flight upstream call.
                                tokio::task::spawn(async move {
                                    if let Err(err) = http1::Builder::new()
                                        .serve_connection(io, service)
                                        .await
                                    {
                                        debug!("Connection handling finished or errored: {:?}", err);
                                    }
                                });
                            }
                            Err(e) => {
                                error!("Failed to accept connection: {:?}", e);
                            }
                        }
                    }
                    _ = &mut shutdown_rx => {
                        tracing::info!("Survey proxy stopped listening");
                        break;
                    }
                }
            }
        });

        Ok((
            Self {
                shutdown_tx: Some(shutdown_tx),
                local_addr,
            },
            handle,
        ))
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> std::net::SocketAddr {
        self.local_addr
    }

    /// Stop server
    pub fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Health check handler
async fn health_check_handler() -> Response {
    Json(serde_json::json!({
        "status": "ok"
    }))
    .into_response()
}

async fn not_found_handler() -> Response {
    let mut response = ProxyError::ClientInput("Not found".to_string()).into_response();
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_start_and_stop() {
        let state = AppState::new(ProxyConfig::default(), Credentials::default()).unwrap();
        let (server, handle) = ProxyServer::start("127.0.0.1", 0, state).await.unwrap();
        assert_ne!(server.local_addr().port(), 0);

        let url = format!("http://{}/healthz", server.local_addr());
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let body: serde_json::Value = client
            .get(&url)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");

        server.stop();
        handle.await.unwrap();
    }
}
