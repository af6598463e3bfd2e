//! Command-line interface definitions and parsing

use clap::Parser;
use url::Url;

#[derive(Parser)]
#[command(name = "uplink", version, about = "Run a demo uplink device process")]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Application key presented to the gateway
    #[arg(long)]
    pub app_key: Option<String>,

    /// Shared secret used to sign and verify payloads
    #[arg(long)]
    pub signing_key: Option<String>,

    /// Gateway websocket URL
    #[arg(long)]
    pub server: Option<Url>,

    /// Platform tag presented in connection headers
    #[arg(long)]
    pub platform: Option<String>,

    /// Demo switch identifier (24 hexadecimal characters)
    #[arg(long)]
    pub switch: Option<String>,

    /// Disable the local-network discovery listener
    #[arg(long)]
    pub no_discovery: bool,
}
