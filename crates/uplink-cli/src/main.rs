//! Uplink demo binary
//!
//! Wires the engine to the live transports: a websocket link to the gateway,
//! an optional local-network discovery listener, and one demo switch whose
//! power transitions are logged.

mod cli;
mod config;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use uplink_runtime::{DeviceId, PowerControl, PowerState, Switch, UplinkEngine};
use uplink_udp::UdpLink;
use uplink_ws::WsLink;

use crate::cli::Cli;
use crate::config::AppConfig;

/// Controller that logs every requested transition and accepts it.
struct LoggingPower;

impl PowerControl for LoggingPower {
    fn on_power_state(&mut self, device_id: &DeviceId, state: PowerState) -> bool {
        info!(device = %device_id, state = state.as_str(), "power state applied");
        true
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = AppConfig::load(&cli)?;
    let switch_id = DeviceId::parse(&config.demo.switch_id)
        .with_context(|| format!("invalid demo switch id {:?}", config.demo.switch_id))?;

    let mut builder = UplinkEngine::builder(config.engine.clone())
        .register_device(Box::new(Switch::new(switch_id.clone(), LoggingPower)))
        .attach_link(Box::new(WsLink::new()));
    if config.demo.discovery {
        builder = builder.attach_link(Box::new(UdpLink::new()));
    }
    let mut engine = builder.build()?;

    info!(
        server = %config.engine.connection.server_url,
        device = %switch_id,
        discovery = config.demo.discovery,
        "uplink demo starting"
    );
    engine.run(shutdown_signal()).await;
    info!("uplink demo exited");
    Ok(())
}

/// Resolves when the process receives ctrl-c.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "ctrl-c handler failed, shutting down");
    }
}

/// Setup logging based on verbosity level
fn setup_logging(verbose: bool) {
    let log_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();
}
