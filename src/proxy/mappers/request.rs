// Inbound envelope -> validated proxy request
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::proxy::error::ProxyError;

pub const PATH_REQUIRED: &str = "Path is required";

/// Raw inbound JSON envelope. Every field is optional on the wire.
#[derive(Debug, Default, Deserialize)]
pub struct ProxyEnvelope {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<Map<String, Value>>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub body: Option<Value>,
}

/// Validated, normalized description of one upstream call.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    /// Path exactly as the caller sent it, echoed back in error bodies.
    pub path: String,
    /// Path with a single leading slash removed.
    pub normalized_path: String,
    pub method: Method,
    pub params: Vec<(String, String)>,
    pub body: Value,
}

/// Parse the raw inbound body. An empty body is an empty envelope.
pub fn parse_envelope(raw: &[u8]) -> Result<ProxyEnvelope, ProxyError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(ProxyEnvelope::default());
    }
    serde_json::from_slice(raw)
        .map_err(|e| ProxyError::ClientInput(format!("Invalid request body: {}", e)))
}

impl TryFrom<ProxyEnvelope> for ProxyRequest {
    type Error = ProxyError;

    fn try_from(envelope: ProxyEnvelope) -> Result<Self, Self::Error> {
        let path = envelope.path.unwrap_or_default();
        let normalized_path = normalize_path(&path)
            .ok_or_else(|| ProxyError::ClientInput(PATH_REQUIRED.to_string()))?
            .to_string();

        let method = parse_method(envelope.method.as_deref())?;

        let params = envelope
            .params
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(key, value)| param_to_string(value).map(|v| (key, v)))
            .collect();

        let body = envelope.data.or(envelope.body).unwrap_or(Value::Null);

        Ok(Self {
            path,
            normalized_path,
            method,
            params,
            body,
        })
    }
}

impl ProxyRequest {
    /// Body to send upstream. GET and DELETE never carry one, nor do empty payloads.
    pub fn outbound_body(&self) -> Option<&Value> {
        if self.method == Method::GET || self.method == Method::DELETE {
            return None;
        }
        (!is_empty_payload(&self.body)).then_some(&self.body)
    }
}

/// Strip one leading slash. `None` when nothing usable remains.
pub fn normalize_path(path: &str) -> Option<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.trim().is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_method(raw: Option<&str>) -> Result<Method, ProxyError> {
    let raw = raw.map(str::trim).filter(|m| !m.is_empty()).unwrap_or("GET");
    Method::from_bytes(raw.to_ascii_uppercase().as_bytes()).map_err(|_| {
        ProxyError::ClientInput(format!("Invalid request body: unsupported method '{}'", raw))
    })
}

fn param_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: Value) -> Result<ProxyRequest, ProxyError> {
        let envelope: ProxyEnvelope = serde_json::from_value(value).unwrap();
        ProxyRequest::try_from(envelope)
    }

    fn assert_path_required(result: Result<ProxyRequest, ProxyError>) {
        match result {
            Err(ProxyError::ClientInput(msg)) => assert_eq!(msg, PATH_REQUIRED),
            other => panic!("expected path error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_and_blank_paths_rejected() {
        assert_path_required(request(json!({})));
        assert_path_required(request(json!({ "path": "" })));
        assert_path_required(request(json!({ "path": "/" })));
        assert_path_required(request(json!({ "path": "   " })));
        assert_path_required(request(json!({ "path": null })));
    }

    #[test]
    fn test_single_leading_slash_stripped() {
        let a = request(json!({ "path": "/survey/1/quotas" })).unwrap();
        let b = request(json!({ "path": "survey/1/quotas" })).unwrap();
        assert_eq!(a.normalized_path, "survey/1/quotas");
        assert_eq!(a.normalized_path, b.normalized_path);
        assert_eq!(a.path, "/survey/1/quotas");

        let c = request(json!({ "path": "//survey" })).unwrap();
        assert_eq!(c.normalized_path, "/survey");
    }

    #[test]
    fn test_method_defaults_and_case() {
        assert_eq!(request(json!({ "path": "x" })).unwrap().method, Method::GET);
        assert_eq!(
            request(json!({ "path": "x", "method": "" })).unwrap().method,
            Method::GET
        );
        assert_eq!(
            request(json!({ "path": "x", "method": "put" })).unwrap().method,
            Method::PUT
        );
        assert!(matches!(
            request(json!({ "path": "x", "method": "BAD METHOD" })),
            Err(ProxyError::ClientInput(_))
        ));
    }

    #[test]
    fn test_params_are_stringified() {
        let req = request(json!({
            "path": "x",
            "params": {
                "page": 2,
                "name": "Quota A",
                "active": true,
                "skip": null,
                "groups": [[{ "operator": "20" }]]
            }
        }))
        .unwrap();

        let params: std::collections::HashMap<_, _> = req.params.into_iter().collect();
        assert_eq!(params["page"], "2");
        assert_eq!(params["name"], "Quota A");
        assert_eq!(params["active"], "true");
        assert_eq!(params["groups"], r#"[[{"operator":"20"}]]"#);
        assert!(!params.contains_key("skip"));
    }

    #[test]
    fn test_body_only_for_mutating_methods() {
        let get = request(json!({ "path": "x", "method": "GET", "data": { "a": 1 } })).unwrap();
        assert!(get.outbound_body().is_none());

        let delete =
            request(json!({ "path": "x", "method": "DELETE", "data": { "a": 1 } })).unwrap();
        assert!(delete.outbound_body().is_none());

        let post = request(json!({ "path": "x", "method": "POST", "data": { "a": 1 } })).unwrap();
        assert_eq!(post.outbound_body(), Some(&json!({ "a": 1 })));

        let empty = request(json!({ "path": "x", "method": "PUT", "data": {} })).unwrap();
        assert!(empty.outbound_body().is_none());
    }

    #[test]
    fn test_data_preferred_over_body() {
        let req = request(json!({
            "path": "x",
            "method": "PATCH",
            "data": { "from": "data" },
            "body": { "from": "body" }
        }))
        .unwrap();
        assert_eq!(req.outbound_body(), Some(&json!({ "from": "data" })));

        let fallback =
            request(json!({ "path": "x", "method": "PATCH", "body": { "from": "body" } }))
                .unwrap();
        assert_eq!(fallback.outbound_body(), Some(&json!({ "from": "body" })));
    }

    #[test]
    fn test_parse_envelope() {
        assert!(parse_envelope(b"").unwrap().path.is_none());
        assert!(parse_envelope(b"  \n").unwrap().path.is_none());
        assert!(matches!(
            parse_envelope(b"{not json"),
            Err(ProxyError::ClientInput(_))
        ));
        assert!(matches!(
            parse_envelope(br#"{ "path": 12 }"#),
            Err(ProxyError::ClientInput(_))
        ));
    }
}
