//! Server configuration from environment variables.

use std::env;
use std::net::SocketAddr;

use anyhow::Context;
use tablesnap_core::MAX_FILE_SIZE;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// - `TABLESNAP_LISTEN_ADDR`: bind address (default: "0.0.0.0:3000")
    /// - `TABLESNAP_MAX_UPLOAD_BYTES`: largest accepted upload (default: 20MB)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_values(
            env::var("TABLESNAP_LISTEN_ADDR").ok(),
            env::var("TABLESNAP_MAX_UPLOAD_BYTES").ok(),
        )
    }

    fn from_values(
        listen_addr: Option<String>,
        max_upload_bytes: Option<String>,
    ) -> anyhow::Result<Self> {
        let listen_addr = listen_addr.unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_addr
            .parse()
            .with_context(|| format!("Invalid TABLESNAP_LISTEN_ADDR: {}", listen_addr))?;

        let max_upload_bytes = match max_upload_bytes {
            Some(value) => value
                .parse()
                .with_context(|| format!("Invalid TABLESNAP_MAX_UPLOAD_BYTES: {}", value))?,
            None => MAX_FILE_SIZE,
        };

        Ok(Self {
            listen_addr,
            max_upload_bytes,
        })
    }
}
