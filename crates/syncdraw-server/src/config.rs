//! Relay configuration parsed from environment variables.

use std::net::{AddrParseError, SocketAddr};

pub const DEFAULT_BIND: &str = "0.0.0.0:1234";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

impl ServerConfig {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `SYNCDRAW_BIND`: listen address, default `0.0.0.0:1234`
    pub fn from_env() -> Result<Self, AddrParseError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AddrParseError> {
        let raw = lookup("SYNCDRAW_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        Ok(Self {
            bind: raw.trim().parse()?,
        })
    }
}
