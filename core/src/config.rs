//! Redirect-following configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::http::is_token;

/// Hop bound used when the caller does not pick one.
pub const DEFAULT_MAX_HOPS: usize = 10;

/// Credential headers removed when a redirect leaves the current origin.
pub const DEFAULT_SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "proxy-authorization"];

/// Tunables for a redirect chain.
///
/// Every field is optional when deserializing, so `{}` is the default config
/// and `{"max_hops": 3}` only lowers the bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedirectConfig {
    /// Redirects followed before the chain fails with `TooManyRedirects`.
    pub max_hops: usize,
    /// Header names stripped on cross-origin hops, lowercase.
    pub sensitive_headers: Vec<String>,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            max_hops: DEFAULT_MAX_HOPS,
            sensitive_headers: DEFAULT_SENSITIVE_HEADERS
                .iter()
                .map(|h| h.to_string())
                .collect(),
        }
    }
}

impl RedirectConfig {
    /// Load from a JSON document; header names are validated and lowercased.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let mut config: RedirectConfig = serde_json::from_str(raw)?;
        for name in &mut config.sensitive_headers {
            if !is_token(name) {
                return Err(ConfigError::InvalidHeaderName(name.clone()));
            }
            name.make_ascii_lowercase();
        }
        Ok(config)
    }

    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    pub fn with_sensitive_header(mut self, name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if !self.sensitive_headers.contains(&name) {
            self.sensitive_headers.push(name);
        }
        self
    }

    pub fn is_sensitive(&self, name: &str) -> bool {
        self.sensitive_headers
            .iter()
            .any(|h| h.eq_ignore_ascii_case(name))
    }
}
