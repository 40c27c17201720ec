// Middleware module - Axum middleware

pub mod cors;
pub mod logging;

pub use cors::{cors_layer, preflight_guard};
pub use logging::access_log_middleware;
