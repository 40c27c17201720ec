// proxy module - credential-injecting reverse proxy for the survey API

pub mod config;
pub mod credentials;
pub mod error;
pub mod server;

pub mod handlers; // API endpoint handlers
pub mod mappers; // Envelope normalization
pub mod middleware; // Axum middleware
pub mod upstream; // Upstream client

pub use config::ProxyConfig;
pub use credentials::Credentials;
pub use error::ProxyError;
pub use server::{build_router, AppState, ProxyServer};
