//! APRS-IS server addresses.

use std::fmt;
use std::str::FromStr;

/// Round-robin DNS name of the APRS-IS tier 2 network.
pub const DEFAULT_HOST: &str = "rotate.aprs2.net";

/// User-defined filter port, which accepts position uploads.
pub const DEFAULT_PORT: u16 = 14580;

/// An APRS-IS server entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AprsIsServer {
    /// Hostname or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl AprsIsServer {
    /// Create a new server address.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// The public rotate pool.
    pub fn rotate() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }

    /// Get the address string for connection (host:port).
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AprsIsServer {
    fn default() -> Self {
        Self::rotate()
    }
}

impl fmt::Display for AprsIsServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address())
    }
}

impl FromStr for AprsIsServer {
    type Err = String;

    /// Parse `host` or `host:port`; the port defaults to 14580.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (host, port) = match s.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| format!("invalid port: {}", port))?;
                (host, port)
            }
            None => (s, DEFAULT_PORT),
        };
        if host.is_empty() {
            return Err("server host cannot be empty".to_string());
        }
        Ok(Self::new(host, port))
    }
}
