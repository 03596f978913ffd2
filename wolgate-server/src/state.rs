//! Shared server state.
//!
//! Both on-disk stores live behind a `RwLock`; every admin mutation runs as
//! a single load-mutate-save cycle under the write lock, and the in-memory
//! copy is only committed after the file write succeeds. Two browsers
//! editing at once therefore serialize instead of silently overwriting each
//! other.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;

use wolgate_core::config::{ConfigError, GatewayConfig};
use wolgate_core::creds::{AdminCredentials, CredsError};

use crate::session::SessionStore;

pub type SharedState = Arc<AppState>;

/// Shared application state.
pub struct AppState {
    pub config: RwLock<GatewayConfig>,
    pub config_path: PathBuf,

    pub creds: RwLock<AdminCredentials>,
    pub creds_path: PathBuf,

    /// Logged-in admin sessions.
    pub sessions: SessionStore,

    /// UDP port magic packets are sent to. The conventional port 9 in
    /// production; integration tests point this at a loopback listener.
    pub wol_port: u16,
}

impl AppState {
    pub fn new(
        config: GatewayConfig,
        config_path: PathBuf,
        creds: AdminCredentials,
        creds_path: PathBuf,
    ) -> Self {
        Self {
            config: RwLock::new(config),
            config_path,
            creds: RwLock::new(creds),
            creds_path,
            sessions: SessionStore::new(),
            wol_port: wolgate_core::DEFAULT_WOL_PORT,
        }
    }

    pub fn with_wol_port(mut self, port: u16) -> Self {
        self.wol_port = port;
        self
    }

    /// Run a roster mutation and persist it atomically with respect to
    /// other admin requests. On any error the in-memory config is untouched.
    pub async fn update_config<T>(
        &self,
        mutate: impl FnOnce(&mut GatewayConfig) -> Result<T, ConfigError>,
    ) -> Result<T, ConfigError> {
        let mut config = self.config.write().await;
        let mut next = config.clone();
        let out = mutate(&mut next)?;
        next.save_to(&self.config_path)?;
        *config = next;
        Ok(out)
    }

    /// Same discipline for the credentials record.
    pub async fn update_creds<T>(
        &self,
        mutate: impl FnOnce(&mut AdminCredentials) -> Result<T, CredsError>,
    ) -> Result<T, CredsError> {
        let mut creds = self.creds.write().await;
        let mut next = creds.clone();
        let out = mutate(&mut next)?;
        next.save_to(&self.creds_path)?;
        *creds = next;
        Ok(out)
    }
}
