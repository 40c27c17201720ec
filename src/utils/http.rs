use crate::proxy::config::UpstreamProxyConfig;
use reqwest::{Client, Proxy};

const USER_AGENT: &str = concat!("survey-proxy/", env!("CARGO_PKG_VERSION"));

/// Create an HTTP client with the given timeout and optional outbound proxy.
/// An unparsable proxy address is logged and ignored. Redirects are not
/// followed; a 3xx goes back to the caller.
pub fn create_client_with_proxy(
    timeout_secs: u64,
    proxy_config: Option<&UpstreamProxyConfig>,
) -> reqwest::Result<Client> {
    let mut builder = Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        // Redirect targets carry the credential query and reqwest logs them
        .redirect(reqwest::redirect::Policy::none());

    if let Some(config) = proxy_config {
        if config.enabled && !config.url.is_empty() {
            match Proxy::all(&config.url) {
                Ok(proxy) => {
                    builder = builder.proxy(proxy);
                    tracing::info!("HTTP client upstream proxy enabled: {}", config.url);
                }
                Err(e) => {
                    tracing::error!("Invalid proxy address: {}, error: {}", config.url, e);
                }
            }
        }
    }

    builder.build()
}
