//! Server configuration loaded from environment variables.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Default location of the notes file, relative to the working directory.
pub const DEFAULT_DATA_FILE: &str = "data/notes.json";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// Path of the JSON file holding all notes (from NOTES_API_DATA_FILE)
    pub data_file: PathBuf,
    /// Interface to bind (from NOTES_API_HOST)
    pub host: IpAddr,
    /// Port for the HTTP API (from NOTES_API_PORT)
    pub port: u16,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Values that fail to parse fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let data_file = lookup("NOTES_API_DATA_FILE")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_file);

        let host = lookup("NOTES_API_HOST")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.host);

        let port = lookup("NOTES_API_PORT")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.port);

        Self {
            data_file,
            host,
            port,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
        }
    }
}
