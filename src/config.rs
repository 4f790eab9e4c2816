use std::env;
use std::net::{AddrParseError, SocketAddr};

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:3000/api";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Where the browser finds the REST API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(env::var("API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.into()))
    }

    /// Value baked in at build time; the browser has no process environment.
    pub fn compiled() -> Self {
        Self::new(option_env!("API_BASE").unwrap_or(DEFAULT_API_BASE))
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DevServerConfig {
    pub bind_addr: SocketAddr,
}

impl DevServerConfig {
    pub fn from_env() -> Result<Self, AddrParseError> {
        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.into())
            .parse()?;
        Ok(Self { bind_addr })
    }
}
