//! Application settings (TOML)
//!
//! Relay endpoint, reconnect policy, host targeting and window behavior.
//! The file is created with defaults on first start and values are clamped to
//! safe ranges after every load.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::connection::BackoffPolicy;
use crate::constants::{config, hosts, protocol, timing, validation};
use crate::error::ConnectError;

/// Top-level settings file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub connection: ConnectionSettings,
    #[serde(default)]
    pub pad: PadSettings,
    #[serde(default)]
    pub window: WindowSettings,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Relay endpoint and reconnect/liveness policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    #[serde(default = "default_server_host")]
    pub server_host: String,
    #[serde(default = "default_server_port")]
    pub server_port: u16,
    /// Use `wss://` instead of `ws://`
    #[serde(default)]
    pub secure: bool,
    #[serde(default = "default_reconnect_min_ms")]
    pub reconnect_min_ms: u64,
    #[serde(default = "default_reconnect_max_ms")]
    pub reconnect_max_ms: u64,
    #[serde(default = "default_reconnect_factor")]
    pub reconnect_factor: f64,
    #[serde(default = "default_status_ttl_ms")]
    pub status_ttl_ms: u64,
}

/// Command targeting and document sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PadSettings {
    /// Host used when zero or several hosts are online
    #[serde(default = "default_host")]
    pub default_host: String,
    /// Always send to this host, regardless of what is online
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_host: Option<String>,
    /// Path or http(s) URL of the default profile document
    #[serde(default = "default_fallback_document")]
    pub fallback_document: String,
    /// Refetch the fallback document every N seconds (0 = push updates only)
    #[serde(default)]
    pub auto_sync_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSettings {
    #[serde(default = "default_window_width")]
    pub width: f32,
    #[serde(default = "default_window_height")]
    pub height: f32,
    #[serde(default)]
    pub fullscreen: bool,
}

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub secure: bool,
    pub default_host: Option<String>,
    pub target_host: Option<String>,
    pub fallback_document: Option<String>,
    pub fullscreen: bool,
    pub log_level: Option<String>,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_server_host() -> String {
    protocol::DEFAULT_SERVER.to_string()
}

fn default_server_port() -> u16 {
    protocol::DEFAULT_PORT
}

fn default_reconnect_min_ms() -> u64 {
    timing::RECONNECT_MIN_MS
}

fn default_reconnect_max_ms() -> u64 {
    timing::RECONNECT_MAX_MS
}

fn default_reconnect_factor() -> f64 {
    timing::RECONNECT_FACTOR
}

fn default_status_ttl_ms() -> u64 {
    timing::STATUS_TTL_MS
}

fn default_host() -> String {
    hosts::DEFAULT_HOST.to_string()
}

fn default_fallback_document() -> String {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(config::APP_DIR);
    path.push(config::FALLBACK_FILENAME);
    path.to_string_lossy().into_owned()
}

fn default_window_width() -> f32 {
    1024.0
}

fn default_window_height() -> f32 {
    600.0
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            connection: ConnectionSettings::default(),
            pad: PadSettings::default(),
            window: WindowSettings::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            server_host: default_server_host(),
            server_port: default_server_port(),
            secure: false,
            reconnect_min_ms: default_reconnect_min_ms(),
            reconnect_max_ms: default_reconnect_max_ms(),
            reconnect_factor: default_reconnect_factor(),
            status_ttl_ms: default_status_ttl_ms(),
        }
    }
}

impl Default for PadSettings {
    fn default() -> Self {
        Self {
            default_host: default_host(),
            target_host: None,
            fallback_document: default_fallback_document(),
            auto_sync_secs: 0,
        }
    }
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
            fullscreen: false,
        }
    }
}

impl Settings {
    pub fn path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path.push(config::SETTINGS_FILENAME);
        path
    }

    /// Directory backing the local key-value storage
    pub fn storage_dir() -> PathBuf {
        let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path.push(config::STORAGE_DIR);
        path
    }

    /// Load settings from `path`, writing defaults there if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "Settings file not found, creating defaults");
            let settings = Settings::default();
            settings.save_to(path)?;
            return Ok(settings);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;
        let mut settings: Settings = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse TOML from {:?}", path))?;
        settings.validate_and_clamp();

        info!(path = %path.display(), endpoint = %settings.endpoint_string(), "Loaded settings");
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create settings directory {:?}", parent))?;
        }
        let toml_string =
            toml::to_string_pretty(self).context("Failed to serialize settings to TOML")?;
        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write settings to {:?}", path))?;
        info!(path = %path.display(), "Saved settings");
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: SettingsOverrides) {
        if let Some(host) = overrides.server_host {
            self.connection.server_host = host;
        }
        if let Some(port) = overrides.server_port {
            self.connection.server_port = port;
        }
        if overrides.secure {
            self.connection.secure = true;
        }
        if let Some(host) = overrides.default_host {
            self.pad.default_host = host;
        }
        if let Some(host) = overrides.target_host {
            self.pad.target_host = Some(host);
        }
        if let Some(source) = overrides.fallback_document {
            self.pad.fallback_document = source;
        }
        if overrides.fullscreen {
            self.window.fullscreen = true;
        }
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
        self.validate_and_clamp();
    }

    /// Clamp values to safe ranges
    fn validate_and_clamp(&mut self) {
        use validation::*;
        let conn = &mut self.connection;

        if !(MIN_RECONNECT_MS..=MAX_RECONNECT_MS).contains(&conn.reconnect_min_ms) {
            warn!(reconnect_min_ms = conn.reconnect_min_ms, "reconnect_min_ms out of range, clamping");
            conn.reconnect_min_ms = conn.reconnect_min_ms.clamp(MIN_RECONNECT_MS, MAX_RECONNECT_MS);
        }
        if !(MIN_RECONNECT_MS..=MAX_RECONNECT_MS).contains(&conn.reconnect_max_ms) {
            warn!(reconnect_max_ms = conn.reconnect_max_ms, "reconnect_max_ms out of range, clamping");
            conn.reconnect_max_ms = conn.reconnect_max_ms.clamp(MIN_RECONNECT_MS, MAX_RECONNECT_MS);
        }
        if conn.reconnect_max_ms < conn.reconnect_min_ms {
            warn!(
                reconnect_min_ms = conn.reconnect_min_ms,
                reconnect_max_ms = conn.reconnect_max_ms,
                "reconnect_max_ms below reconnect_min_ms, raising"
            );
            conn.reconnect_max_ms = conn.reconnect_min_ms;
        }
        if !conn.reconnect_factor.is_finite()
            || !(MIN_RECONNECT_FACTOR..=MAX_RECONNECT_FACTOR).contains(&conn.reconnect_factor)
        {
            warn!(reconnect_factor = conn.reconnect_factor, "reconnect_factor out of range, using default");
            conn.reconnect_factor = default_reconnect_factor();
        }
        if !(MIN_STATUS_TTL_MS..=MAX_STATUS_TTL_MS).contains(&conn.status_ttl_ms) {
            warn!(status_ttl_ms = conn.status_ttl_ms, "status_ttl_ms out of range, clamping");
            conn.status_ttl_ms = conn.status_ttl_ms.clamp(MIN_STATUS_TTL_MS, MAX_STATUS_TTL_MS);
        }
        if conn.server_host.trim().is_empty() {
            warn!("server_host is empty, using default");
            conn.server_host = default_server_host();
        }

        if self.pad.default_host.trim().is_empty() {
            warn!("default_host is empty, using default");
            self.pad.default_host = default_host();
        }
        if self
            .pad
            .target_host
            .as_deref()
            .is_some_and(|host| host.trim().is_empty())
        {
            self.pad.target_host = None;
        }
    }

    fn endpoint_string(&self) -> String {
        let scheme = if self.connection.secure { "wss" } else { "ws" };
        format!(
            "{scheme}://{}:{}",
            self.connection.server_host.trim(),
            self.connection.server_port
        )
    }

    /// Relay websocket URL (`wss://` when `secure` is set)
    pub fn endpoint(&self) -> Result<Url, ConnectError> {
        let endpoint = self.endpoint_string();
        Url::parse(&endpoint).map_err(|err| ConnectError::InvalidEndpoint {
            endpoint,
            reason: err.to_string(),
        })
    }

    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(self.connection.reconnect_min_ms),
            Duration::from_millis(self.connection.reconnect_max_ms),
            self.connection.reconnect_factor,
        )
    }

    pub fn status_ttl(&self) -> Duration {
        Duration::from_millis(self.connection.status_ttl_ms)
    }

    pub fn auto_sync_interval(&self) -> Option<Duration> {
        (self.pad.auto_sync_secs > 0).then(|| Duration::from_secs(self.pad.auto_sync_secs))
    }
}
