//! Gateway configuration: the listen port and the server roster.
//!
//! Stored as a JSON document. The canonical shape is always a roster:
//!
//! ```json
//! {
//!     "PORT": 5000,
//!     "SERVERS": [
//!         {
//!             "ID": "…",
//!             "NAME": "NAS",
//!             "WOL_MAC_ADDRESS": "00:11:22:33:44:55",
//!             "BROADCAST_ADDRESS": "255.255.255.255",
//!             "SITE_URL": "http://nas.local",
//!             "WAIT_TIME_SECONDS": 30
//!         }
//!     ]
//! }
//! ```
//!
//! Older deployments used a flattened single-server document (the same
//! fields at top level, no `SERVERS`); that shape is still accepted on load
//! and normalized to a roster of length one. Saving always writes the
//! roster shape.
//!
//! The default location is the platform config directory
//! (e.g. `~/.config/wolgate/gateway.json` on Linux), overridable with the
//! `WOLGATE_CONFIG_DIR` environment variable.

use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::wol::MacAddr;

pub const CONFIG_FILE: &str = "gateway.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("A server named {0:?} already exists")]
    DuplicateName(String),

    #[error("No server with id {0:?}")]
    UnknownServer(String),

    #[error("Config directory not found")]
    NoDirFound,
}

/// One managed machine in the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerEntry {
    /// Stable identifier; admin edit/delete and `/wake` address entries by
    /// this, never by roster position.
    #[serde(rename = "ID", default)]
    pub id: String,

    /// Display label, unique within the roster.
    #[serde(rename = "NAME")]
    pub name: String,

    /// Hardware address of the interface to wake.
    #[serde(rename = "WOL_MAC_ADDRESS")]
    pub mac_address: MacAddr,

    /// Where the magic packet is broadcast.
    #[serde(rename = "BROADCAST_ADDRESS", default = "default_broadcast")]
    pub broadcast_address: Ipv4Addr,

    /// Where the browser is sent once the machine is up.
    #[serde(rename = "SITE_URL")]
    pub site_url: String,

    /// How long the waiting page counts down before redirecting.
    #[serde(rename = "WAIT_TIME_SECONDS")]
    pub wait_seconds: u32,
}

impl ServerEntry {
    /// Create an entry with a freshly generated ID.
    pub fn new(
        name: impl Into<String>,
        mac_address: MacAddr,
        broadcast_address: Ipv4Addr,
        site_url: impl Into<String>,
        wait_seconds: u32,
    ) -> Self {
        Self {
            id: new_entry_id(),
            name: name.into(),
            mac_address,
            broadcast_address,
            site_url: site_url.into(),
            wait_seconds,
        }
    }
}

fn new_entry_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn default_broadcast() -> Ipv4Addr {
    Ipv4Addr::BROADCAST
}

/// Process-wide gateway settings plus the roster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayConfig {
    #[serde(rename = "PORT")]
    pub port: u16,

    #[serde(rename = "SERVERS")]
    pub servers: Vec<ServerEntry>,
}

/// On-disk shape: either the roster form or the legacy flattened
/// single-server form. Normalized to a roster immediately after parsing.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(rename = "PORT")]
    port: u16,

    #[serde(rename = "SERVERS", default)]
    servers: Option<Vec<ServerEntry>>,

    // Legacy single-server fields.
    #[serde(rename = "NAME", default)]
    name: Option<String>,
    #[serde(rename = "WOL_MAC_ADDRESS", default)]
    mac_address: Option<MacAddr>,
    #[serde(rename = "BROADCAST_ADDRESS", default)]
    broadcast_address: Option<Ipv4Addr>,
    #[serde(rename = "SITE_URL", default)]
    site_url: Option<String>,
    #[serde(rename = "WAIT_TIME_SECONDS", default)]
    wait_seconds: Option<u32>,
}

impl RawConfig {
    fn into_config(self) -> Result<GatewayConfig, String> {
        let servers = match self.servers {
            Some(servers) => servers,
            None => {
                let (mac_address, site_url, wait_seconds) =
                    match (self.mac_address, self.site_url, self.wait_seconds) {
                        (Some(mac), Some(url), Some(wait)) => (mac, url, wait),
                        _ => {
                            return Err(
                                "missing SERVERS (or the legacy single-server fields)".to_string()
                            );
                        }
                    };
                vec![ServerEntry {
                    id: String::new(),
                    name: self.name.unwrap_or_else(|| "Server".to_string()),
                    mac_address,
                    broadcast_address: self.broadcast_address.unwrap_or_else(default_broadcast),
                    site_url,
                    wait_seconds,
                }]
            }
        };
        Ok(GatewayConfig {
            port: self.port,
            servers,
        })
    }
}

impl<'de> Deserialize<'de> for GatewayConfig {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawConfig::deserialize(deserializer)?;
        raw.into_config().map_err(serde::de::Error::custom)
    }
}

impl GatewayConfig {
    /// Get config directory path, honoring `WOLGATE_CONFIG_DIR`.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        if let Ok(dir) = std::env::var("WOLGATE_CONFIG_DIR") {
            if !dir.trim().is_empty() {
                return Ok(PathBuf::from(dir));
            }
        }
        dirs::config_dir()
            .map(|p| p.join("wolgate"))
            .ok_or(ConfigError::NoDirFound)
    }

    /// Get config file path.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Load config from the default location.
    ///
    /// A missing or malformed file is an error; the gateway has nothing
    /// sensible to serve without a roster.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load config from a specific path, assign IDs to entries written
    /// before IDs existed, and validate every field.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let mut config: GatewayConfig = serde_json::from_str(&content)?;
        config.assign_missing_ids();
        config.validate()?;
        Ok(config)
    }

    /// Save config to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    /// Save config to a specific path (full overwrite, always roster shape).
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::debug!("saved config to {}", path.display());
        Ok(())
    }

    fn assign_missing_ids(&mut self) {
        for server in &mut self.servers {
            if server.id.is_empty() {
                server.id = new_entry_id();
            }
        }
    }

    /// Check the port range, every entry's fields, and name uniqueness.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid(
                "PORT must be between 1 and 65535".to_string(),
            ));
        }
        for server in &self.servers {
            validate_entry(server)?;
        }
        for (i, server) in self.servers.iter().enumerate() {
            if self.servers[..i].iter().any(|s| s.name == server.name) {
                return Err(ConfigError::DuplicateName(server.name.clone()));
            }
        }
        Ok(())
    }

    /// Get a roster entry by ID.
    pub fn get_server(&self, id: &str) -> Option<&ServerEntry> {
        self.servers.iter().find(|s| s.id == id)
    }

    /// Resolve a `/wake` selector: ID match first, then exact name.
    /// No selector picks the first roster entry, so a single-server
    /// deployment's bare `/wake` URL keeps working.
    pub fn resolve_server(&self, selector: Option<&str>) -> Option<&ServerEntry> {
        match selector {
            None => self.servers.first(),
            Some(sel) => self
                .servers
                .iter()
                .find(|s| s.id == sel)
                .or_else(|| self.servers.iter().find(|s| s.name == sel)),
        }
    }

    /// Append a new entry. The roster is untouched on any failure.
    pub fn add_server(&mut self, server: ServerEntry) -> Result<(), ConfigError> {
        validate_entry(&server)?;
        if self.servers.iter().any(|s| s.name == server.name) {
            return Err(ConfigError::DuplicateName(server.name));
        }
        self.servers.push(server);
        Ok(())
    }

    /// Replace the entry with the given ID, keeping its ID.
    pub fn update_server(&mut self, id: &str, mut server: ServerEntry) -> Result<(), ConfigError> {
        validate_entry(&server)?;
        let pos = self
            .servers
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| ConfigError::UnknownServer(id.to_string()))?;
        if self
            .servers
            .iter()
            .any(|s| s.id != id && s.name == server.name)
        {
            return Err(ConfigError::DuplicateName(server.name));
        }
        server.id = id.to_string();
        self.servers[pos] = server;
        Ok(())
    }

    /// Remove and return the entry with the given ID.
    pub fn remove_server(&mut self, id: &str) -> Result<ServerEntry, ConfigError> {
        let pos = self
            .servers
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| ConfigError::UnknownServer(id.to_string()))?;
        Ok(self.servers.remove(pos))
    }
}

fn validate_entry(server: &ServerEntry) -> Result<(), ConfigError> {
    if server.name.trim().is_empty() {
        return Err(ConfigError::Invalid("NAME must be set".to_string()));
    }
    if server.site_url.trim().is_empty() {
        return Err(ConfigError::Invalid("SITE_URL must be set".to_string()));
    }
    if server.wait_seconds == 0 {
        return Err(ConfigError::Invalid(
            "WAIT_TIME_SECONDS must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
