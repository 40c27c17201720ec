pub mod error;
pub mod modules;
pub mod proxy; // Proxy service module
pub mod utils;

use std::path::PathBuf;

use error::AppResult;
use proxy::{AppState, Credentials, ProxyServer};
use tracing::info;

/// Command line overrides applied on top of the config file.
#[derive(Debug, Default, Clone)]
pub struct RunOptions {
    pub config_path: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Load config, initialize logging and serve until Ctrl-C.
pub async fn run(options: RunOptions) -> AppResult<()> {
    let config_path = match options.config_path {
        Some(path) => path,
        None => modules::config::default_config_path()?,
    };
    let mut config = modules::config::load_proxy_config(&config_path)?;
    if let Some(port) = options.port {
        config.port = port;
    }

    let _log_guard = modules::logger::init_logger(config.log_dir.as_deref());
    info!("Loaded config from {:?}", config_path);

    let credentials = Credentials::from_env();
    if !credentials.is_configured() {
        // Reported per request as well; the server still starts.
        tracing::warn!(
            "Upstream credentials incomplete; set {} and {}",
            proxy::credentials::API_TOKEN_ENV,
            proxy::credentials::API_SECRET_ENV
        );
    }

    let host = options
        .host
        .unwrap_or_else(|| config.get_bind_address().to_string());
    let port = config.port;
    let state = AppState::new(config, credentials)?;

    let (server, handle) = ProxyServer::start(&host, port, state).await?;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    server.stop();
    handle
        .await
        .map_err(|e| error::AppError::Server(format!("Server task failed: {}", e)))?;

    Ok(())
}
