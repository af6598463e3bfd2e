//! Demo application configuration
//!
//! Loads the engine configuration plus demo wiring from a TOML document,
//! then applies command-line overrides on top. The default location is
//! `~/.uplink/config.toml`; a missing default file just means defaults.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use uplink_runtime::UplinkConfig;

use crate::cli::Cli;

/// Demo switch identifier used when none is configured.
pub const DEFAULT_SWITCH_ID: &str = "5dc1564130a1b2c3d4e5f6a7";

// ----------------------------------------------------------------------------
// Application Configuration
// ----------------------------------------------------------------------------

/// Complete configuration for the demo binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Engine configuration handed straight to the builder.
    pub engine: UplinkConfig,
    /// Demo device wiring.
    pub demo: DemoConfig,
}

/// Demo-specific configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Identifier of the demo switch.
    pub switch_id: String,
    /// Whether to run the local-network discovery listener.
    pub discovery: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            switch_id: DEFAULT_SWITCH_ID.into(),
            discovery: true,
        }
    }
}

// ----------------------------------------------------------------------------
// Loading
// ----------------------------------------------------------------------------

impl AppConfig {
    /// Load the file the flags point at, or the default path when present,
    /// then apply flag overrides.
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(Path::new(path))?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    debug!("no configuration file, starting from defaults");
                    Self::default()
                }
            },
        };
        config.apply(cli);
        Ok(config)
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        info!(path = %path.display(), "loading configuration");
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("could not read {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("could not parse {}", path.display()))
    }

    /// Command-line flags override anything the file set.
    fn apply(&mut self, cli: &Cli) {
        if let Some(app_key) = &cli.app_key {
            self.engine.credentials.app_key = app_key.clone();
        }
        if let Some(signing_key) = &cli.signing_key {
            self.engine.credentials.signing_key = signing_key.clone();
        }
        if let Some(server) = &cli.server {
            self.engine.connection.server_url = server.to_string();
        }
        if let Some(platform) = &cli.platform {
            self.engine.connection.platform = platform.clone();
        }
        if let Some(switch) = &cli.switch {
            self.demo.switch_id = switch.clone();
        }
        if cli.no_discovery {
            self.demo.discovery = false;
        }
    }
}

/// `~/.uplink/config.toml`.
fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".uplink").join("config.toml"))
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "uplink",
            "--app-key",
            "k1",
            "--signing-key",
            "s1",
            "--server",
            "wss://gateway.example/ws",
            "--no-discovery",
        ]);
        let mut config = AppConfig::default();
        config.apply(&cli);

        assert_eq!(config.engine.credentials.app_key, "k1");
        assert_eq!(config.engine.credentials.signing_key, "s1");
        assert_eq!(config.engine.connection.server_url, "wss://gateway.example/ws");
        assert!(!config.demo.discovery);
        assert_eq!(config.demo.switch_id, DEFAULT_SWITCH_ID);
        assert!(config.engine.validate().is_ok());
    }

    #[test]
    fn test_document_parses_into_engine_config() {
        let doc = r#"
            [engine.credentials]
            app_key = "a"
            signing_key = "s"

            [engine.connection]
            server_url = "wss://example.invalid/ws"
            platform = "rust"
            reconnect_pause_ms = 500
            tick_interval_ms = 25

            [engine.queue]
            capacity = 32

            [demo]
            switch_id = "aabbccddeeff001122334455"
            discovery = false
        "#;
        let config: AppConfig = toml::from_str(doc).unwrap();

        assert_eq!(config.engine.connection.reconnect_pause_ms, 500);
        assert_eq!(config.engine.queue.capacity, Some(32));
        assert_eq!(config.demo.switch_id, "aabbccddeeff001122334455");
        assert!(!config.demo.discovery);
        assert!(config.engine.validate().is_ok());
    }

    #[test]
    fn test_partial_document_keeps_demo_defaults() {
        let doc = r#"
            [engine.credentials]
            app_key = "a"
            signing_key = "s"
        "#;
        let config: AppConfig = toml::from_str(doc).unwrap();

        assert_eq!(config.demo.switch_id, DEFAULT_SWITCH_ID);
        assert!(config.demo.discovery);
        assert!(config.engine.validate().is_ok());
    }
}
