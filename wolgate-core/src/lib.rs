//! wolgate-core: Shared library for the Wake-on-LAN gateway
//!
//! This crate provides:
//! - The gateway configuration store (listen port + server roster)
//! - The administrator credentials store (argon2id password, TOTP secret)
//! - TOTP code generation and verification
//! - Magic packet construction and UDP transmission

pub mod config;
pub mod creds;
pub mod totp;
pub mod wol;

pub use config::{ConfigError, GatewayConfig, ServerEntry};
pub use creds::{AdminCredentials, CredsError};
pub use totp::{Totp, TotpError};
pub use wol::{MacAddr, MagicPacket, WolError};

/// Conventional UDP port magic packets are broadcast to.
pub const DEFAULT_WOL_PORT: u16 = wol::WOL_PORT;
