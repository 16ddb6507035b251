//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Paths and filenames under the platform config/data directories
pub mod config {
    /// Directory name under `dirs::config_dir()` / `dirs::data_dir()`
    pub const APP_DIR: &str = "nexus-pad";

    /// Settings file name (TOML)
    pub const SETTINGS_FILENAME: &str = "settings.toml";

    /// Default fallback document name, looked up next to the settings file
    pub const FALLBACK_FILENAME: &str = "profiles.json";

    /// Key-value storage directory under the data dir
    pub const STORAGE_DIR: &str = "storage";
}

/// Local key-value storage keys
pub mod storage {
    /// Full configuration document snapshot
    pub const DOCUMENT_KEY: &str = "nexuspad_config";
}

/// Relay wire protocol constants
pub mod protocol {
    /// Default relay websocket port
    pub const DEFAULT_PORT: u16 = 8765;

    /// Client kind announced in the `hello` frame
    pub const CLIENT_KIND: &str = "ui";

    /// Default relay host
    pub const DEFAULT_SERVER: &str = "127.0.0.1";
}

/// Connection and liveness timing
pub mod timing {
    /// First reconnect delay after a close/error
    pub const RECONNECT_MIN_MS: u64 = 800;

    /// Upper bound for the reconnect delay
    pub const RECONNECT_MAX_MS: u64 = 4000;

    /// Growth factor applied after each consecutive failure
    pub const RECONNECT_FACTOR: f64 = 1.4;

    /// Relay is considered offline when no `status` frame arrived for this long
    pub const STATUS_TTL_MS: u64 = 7000;

    /// How often the liveness watchdog runs
    pub const WATCHDOG_INTERVAL_MS: u64 = 1000;

    /// Input ignored for this long after the sleep overlay is shown
    pub const SLEEP_WAKE_GRACE_MS: u64 = 500;
}

/// Command target defaults
pub mod hosts {
    /// Host used when zero or several hosts are online and no override is set
    pub const DEFAULT_HOST: &str = "BureauMSI";
}

/// Grid layout defaults
pub mod layout {
    /// Columns used when a profile has no `grid` section
    pub const DEFAULT_GRID_COLS: u32 = 4;

    /// Label given to buttons created from the "add" slot
    pub const NEW_BUTTON_LABEL: &str = "New";
}

/// Notification durations (milliseconds)
pub mod toast {
    pub const ACK_MS: u64 = 1500;
    pub const ERROR_MS: u64 = 2000;
    pub const SHORT_MS: u64 = 1000;
    pub const LONG_MS: u64 = 3000;
}

/// Validation limits for settings values
pub mod validation {
    /// Lowest accepted reconnect delay
    pub const MIN_RECONNECT_MS: u64 = 100;

    /// Highest accepted reconnect delay (one minute)
    pub const MAX_RECONNECT_MS: u64 = 60_000;

    /// Reconnect growth factor range
    pub const MIN_RECONNECT_FACTOR: f64 = 1.0;
    pub const MAX_RECONNECT_FACTOR: f64 = 4.0;

    /// Status TTL range
    pub const MIN_STATUS_TTL_MS: u64 = 1000;
    pub const MAX_STATUS_TTL_MS: u64 = 120_000;
}
