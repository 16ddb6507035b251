#![forbid(unsafe_code)]

mod config;
mod connection;
mod constants;
mod controller;
mod error;
mod gui;
mod render;
mod store;
mod sync;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{Level as TraceLevel, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Registry, fmt, reload};

use config::{Settings, SettingsOverrides};

/// Touchscreen macro pad for a command relay
#[derive(Parser, Debug)]
#[command(name = "nexus-pad", version)]
struct Cli {
    /// Settings file (default: ~/.config/nexus-pad/settings.toml)
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Relay host name or address
    #[arg(long)]
    server: Option<String>,
    /// Relay port
    #[arg(long)]
    port: Option<u16>,
    /// Connect with wss:// instead of ws://
    #[arg(long, default_value_t = false)]
    secure: bool,
    /// Host that receives commands when zero or several hosts are online
    #[arg(long)]
    default_host: Option<String>,
    /// Always send commands to this host
    #[arg(long)]
    target_host: Option<String>,
    /// Path or http(s) URL of the default profile document
    #[arg(long)]
    fallback: Option<String>,
    /// Start fullscreen
    #[arg(long, default_value_t = false)]
    fullscreen: bool,
    /// trace, debug, info, warn or error (overrides LOG_LEVEL)
    #[arg(long)]
    log_level: Option<String>,
    /// Forget the locally cached profile document before loading
    #[arg(long, default_value_t = false)]
    reset_cache: bool,
}

fn parse_level(value: &str) -> TraceLevel {
    match value.to_lowercase().as_str() {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    }
}

type LogFilter = reload::Handle<LevelFilter, Registry>;

/// Subscriber whose level can be changed once the settings file is read
fn build_subscriber(level: TraceLevel) -> (impl tracing::Subscriber + Send + Sync + 'static, LogFilter) {
    let (filter, handle) = reload::Layer::new(LevelFilter::from_level(level));
    (tracing_subscriber::registry().with(filter).with(fmt::layer()), handle)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // CLI first, then LOG_LEVEL, then the settings file
    let explicit_level = cli
        .log_level
        .clone()
        .or_else(|| std::env::var("LOG_LEVEL").ok());
    let (subscriber, log_filter) =
        build_subscriber(parse_level(explicit_level.as_deref().unwrap_or("info")));
    tracing::subscriber::set_global_default(subscriber)?;

    let settings_path = cli.settings.clone().unwrap_or_else(Settings::path);
    let mut settings = Settings::load_from(&settings_path)?;
    if explicit_level.is_none() {
        log_filter.reload(LevelFilter::from_level(parse_level(&settings.log_level)))?;
    }

    settings.apply_overrides(SettingsOverrides {
        server_host: cli.server,
        server_port: cli.port,
        secure: cli.secure,
        default_host: cli.default_host,
        target_host: cli.target_host,
        fallback_document: cli.fallback,
        fullscreen: cli.fullscreen,
        log_level: cli.log_level,
    });
    info!(
        path = %settings_path.display(),
        server = %settings.connection.server_host,
        port = settings.connection.server_port,
        "Settings loaded"
    );

    gui::run_gui(settings, cli.reset_cache)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_defaults_to_info() {
        assert_eq!(parse_level("DEBUG"), TraceLevel::DEBUG);
        assert_eq!(parse_level("warn"), TraceLevel::WARN);
        assert_eq!(parse_level("verbose"), TraceLevel::INFO);
    }

    #[test]
    fn test_log_level_reloads_after_install() {
        let (subscriber, filter) = build_subscriber(TraceLevel::INFO);
        tracing::subscriber::with_default(subscriber, || {
            assert!(tracing::enabled!(TraceLevel::INFO));
            assert!(!tracing::enabled!(TraceLevel::DEBUG));

            filter.reload(LevelFilter::DEBUG).unwrap();
            assert!(tracing::enabled!(TraceLevel::DEBUG));
        });
    }

    #[test]
    fn test_cli_overrides_parse() {
        let cli = Cli::parse_from([
            "nexus-pad",
            "--server",
            "10.0.0.2",
            "--port",
            "9000",
            "--target-host",
            "Desk",
            "--reset-cache",
        ]);
        assert_eq!(cli.server.as_deref(), Some("10.0.0.2"));
        assert_eq!(cli.port, Some(9000));
        assert_eq!(cli.target_host.as_deref(), Some("Desk"));
        assert!(cli.reset_cache);
        assert!(!cli.secure);
    }
}
