// Server-held upstream credentials
use secrecy::{ExposeSecret, SecretString};

use crate::proxy::error::ProxyError;

pub const API_TOKEN_ENV: &str = "ALCHEMER_API_TOKEN";
pub const API_SECRET_ENV: &str = "ALCHEMER_API_SECRET";

/// Query parameter names the upstream expects the credentials under.
pub const API_TOKEN_PARAM: &str = "api_token";
pub const API_SECRET_PARAM: &str = "api_token_secret";

/// Credential pair read once at startup.
///
/// Either half may be absent; that is reported per request rather than at
/// startup so the server still answers health checks and preflights.
#[derive(Clone, Default)]
pub struct Credentials {
    token: Option<SecretString>,
    secret: Option<SecretString>,
}

/// Borrowed view of a complete credential pair.
pub struct ResolvedCredentials<'a> {
    pub token: &'a str,
    pub secret: &'a str,
}

impl Credentials {
    pub fn new(token: Option<String>, secret: Option<String>) -> Self {
        Self {
            token: non_empty(token),
            secret: non_empty(secret),
        }
    }

    /// Read the pair from the process environment.
    pub fn from_env() -> Self {
        Self::new(
            std::env::var(API_TOKEN_ENV).ok(),
            std::env::var(API_SECRET_ENV).ok(),
        )
    }

    pub fn is_configured(&self) -> bool {
        self.token.is_some() && self.secret.is_some()
    }

    /// Return both halves, or a configuration error naming what is missing.
    pub fn resolve(&self) -> Result<ResolvedCredentials<'_>, ProxyError> {
        match (&self.token, &self.secret) {
            (Some(token), Some(secret)) => Ok(ResolvedCredentials {
                token: token.expose_secret(),
                secret: secret.expose_secret(),
            }),
            (token, secret) => {
                let missing: Vec<&str> = [
                    token.is_none().then_some(API_TOKEN_ENV),
                    secret.is_none().then_some(API_SECRET_ENV),
                ]
                .into_iter()
                .flatten()
                .collect();

                Err(ProxyError::Configuration(format!(
                    "Server credentials not configured. Please set {}.",
                    missing.join(" and ")
                )))
            }
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<SecretString> {
    value
        .filter(|v| !v.is_empty())
        .map(|v| SecretString::new(v.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_complete_pair() {
        let creds = Credentials::new(Some("tok".into()), Some("sec".into()));
        let resolved = creds.resolve().unwrap();
        assert_eq!(resolved.token, "tok");
        assert_eq!(resolved.secret, "sec");
    }

    #[test]
    fn test_missing_secret_is_named() {
        let creds = Credentials::new(Some("tok".into()), None);
        match creds.resolve() {
            Err(ProxyError::Configuration(msg)) => {
                assert_eq!(
                    msg,
                    "Server credentials not configured. Please set ALCHEMER_API_SECRET."
                );
            }
            _ => panic!("expected configuration error"),
        }
    }

    #[test]
    fn test_empty_values_count_as_missing() {
        let creds = Credentials::new(Some(String::new()), Some(String::new()));
        assert!(!creds.is_configured());
        match creds.resolve() {
            Err(ProxyError::Configuration(msg)) => {
                assert!(msg.contains("ALCHEMER_API_TOKEN and ALCHEMER_API_SECRET"));
            }
            _ => panic!("expected configuration error"),
        }
    }

    #[test]
    fn test_debug_redacts() {
        let creds = Credentials::new(Some("tok-value".into()), Some("sec-value".into()));
        let printed = format!("{:?}", creds);
        assert!(!printed.contains("tok-value"));
        assert!(!printed.contains("sec-value"));
        assert!(printed.contains("[REDACTED]"));
    }
}
