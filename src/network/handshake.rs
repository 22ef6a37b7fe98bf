//! WebSocket upgrade request parsing.
//!
//! The upgrade request carries the session cookie (header) and the document
//! parameters (query string); the token arrives later in the auth frame.

use http::header::COOKIE;
use std::collections::HashMap;

/// Values captured from the HTTP upgrade request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandshakeParts {
    pub cookie: Option<String>,
    pub params: HashMap<String, String>,
}

impl HandshakeParts {
    pub fn from_request<B>(req: &http::Request<B>) -> Self {
        Self {
            cookie: cookie_header(req.headers()),
            params: query_params(req.uri().query()),
        }
    }
}

/// Join every `Cookie` header into one credential string.
fn cookie_header(headers: &http::HeaderMap) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.join("; "))
    }
}

/// Decode a query string. Repeated keys keep the first value.
fn query_params(query: Option<&str>) -> HashMap<String, String> {
    let mut params = HashMap::new();
    if let Some(query) = query {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params.entry(key.into_owned()).or_insert_with(|| value.into_owned());
        }
    }
    params
}
