//! Anti-forgery token sources.

use parking_lot::RwLock;

/// Supplies the anti-forgery token attached to every mutation.
///
/// Queried per request so a rotated token is picked up without rebuilding
/// the transport.
pub trait AntiForgeryToken: Send + Sync + 'static {
    fn token(&self) -> Option<String>;
}

/// A token the host sets and may replace.
#[derive(Debug, Default)]
pub struct StaticToken {
    value: RwLock<Option<String>>,
}

impl StaticToken {
    pub fn new(token: Option<String>) -> Self {
        Self {
            value: RwLock::new(token),
        }
    }

    /// Read the token from a `Cookie` header, e.g. `csrftoken=...; sessionid=...`.
    pub fn from_cookie_header(header: &str, name: &str) -> Self {
        Self::new(cookie_value(header, name))
    }

    pub fn set(&self, token: Option<String>) {
        *self.value.write() = token;
    }
}

impl AntiForgeryToken for StaticToken {
    fn token(&self) -> Option<String> {
        self.value.read().clone()
    }
}

/// Value of cookie `name` in a `Cookie` header, if present and non-empty.
pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
