pub mod server;
pub mod thread;

use std::net::{IpAddr, SocketAddr};

use crate::error::GatewayError;

pub const DEFAULT_HTTP_HOST: &str = "0.0.0.0";
pub const DEFAULT_HTTP_PORT: u16 = 8080;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16, // 0 picks a free port
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HTTP_HOST.to_string(),
            port: DEFAULT_HTTP_PORT,
        }
    }
}

impl HttpConfig {
    /// Resolves `host` and `port` to the address to bind.
    ///
    /// IP literals (IPv4, IPv6, bracketed IPv6) are used as is; anything else
    /// is looked up as a host name and the first address wins.
    pub async fn socket_addr(&self) -> Result<SocketAddr, GatewayError> {
        let host = self.host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }

        if host.is_empty() || host.contains(char::is_whitespace) {
            return Err(self.invalid("not a host name or IP address"));
        }

        let mut addrs = tokio::net::lookup_host((host, self.port))
            .await
            .map_err(|e| self.invalid(&e.to_string()))?;
        addrs
            .next()
            .ok_or_else(|| self.invalid("host name has no addresses"))
    }

    fn invalid(&self, reason: &str) -> GatewayError {
        GatewayError::InvalidAddress(format!("{}:{} ({})", self.host, self.port, reason))
    }
}
