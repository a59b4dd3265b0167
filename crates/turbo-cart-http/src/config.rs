//! HTTP transport configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use turbo_cart_sync::config::duration_ms;

/// Where the storefront lives and how to talk to it.
///
/// Paths default to the storefront's routes. The request timeout is a
/// socket-level bound; the engine applies its own timeout on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpTransportConfig {
    /// Scheme, host and port, e.g. `https://shop.example.com`.
    pub base_url: String,

    pub cart_path: String,
    pub add_path: String,
    pub remove_path: String,
    pub update_path: String,

    /// Header carrying the anti-forgery token.
    pub csrf_header: String,
    /// Form field carrying the anti-forgery token.
    pub csrf_field: String,
    /// Static anti-forgery token, if the host already knows it.
    pub csrf_token: Option<String>,

    /// Raw `Cookie` header value identifying the session.
    pub session_cookie: Option<String>,

    #[serde(rename = "request_timeout_ms", with = "duration_ms")]
    pub request_timeout: Duration,
}

impl HttpTransportConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            cart_path: "/get-cart/".to_string(),
            add_path: "/add-to-cart/".to_string(),
            remove_path: "/remove-from-cart/".to_string(),
            update_path: "/update-cart/".to_string(),
            csrf_header: "X-CSRFToken".to_string(),
            csrf_field: "csrfmiddlewaretoken".to_string(),
            csrf_token: None,
            session_cookie: None,
            request_timeout: Duration::from_secs(15),
        }
    }
}
