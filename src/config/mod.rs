//! Configuration management for nexus-pad
//!
//! Two kinds of configuration live here:
//! - **settings**: local application settings (TOML, one per device)
//! - **profile**: the shared profile/button document (JSON, synced with the relay)

pub mod profile;
pub mod settings;

pub use settings::{Settings, SettingsOverrides};
