//! Transport link boundary
//!
//! The engine core never touches a socket. Concrete drivers (websocket
//! stream, UDP discovery listener) implement [`TransportLink`] and the engine
//! drives them through it: connect with a [`ConnectOptions`] descriptor, poll
//! for ready inbound frames, send raw outbound bytes.

use core::fmt;

use crate::config::UplinkConfig;
use crate::errors::TransportError;
use crate::queue::FrameQueue;
use crate::types::TransportKind;

// ----------------------------------------------------------------------------
// Connect Options
// ----------------------------------------------------------------------------

/// Everything a driver needs to establish its link.
///
/// `device_ids` is the registry descriptor: registered identifiers joined
/// with `;` in registration order. The stream driver presents all four values
/// as connection headers.
#[derive(Clone)]
pub struct ConnectOptions {
    pub server_url: String,
    pub app_key: String,
    pub device_ids: String,
    pub platform: String,
}

impl ConnectOptions {
    /// Assemble the descriptor from configuration plus the registered
    /// device list.
    pub fn from_config(config: &UplinkConfig, device_ids: impl Into<String>) -> Self {
        Self {
            server_url: config.connection.server_url.clone(),
            app_key: config.credentials.app_key.clone(),
            device_ids: device_ids.into(),
            platform: config.connection.platform.clone(),
        }
    }
}

impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("server_url", &self.server_url)
            .field("app_key", &"..")
            .field("device_ids", &self.device_ids)
            .field("platform", &self.platform)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Transport Link Trait
// ----------------------------------------------------------------------------

/// Driver for one transport channel.
#[async_trait::async_trait]
pub trait TransportLink: Send {
    /// Which channel this driver serves.
    fn kind(&self) -> TransportKind;

    /// Establish the link described by the connect options.
    async fn connect(&mut self, options: &ConnectOptions) -> Result<(), TransportError>;

    /// Tear the link down. Best effort; never fails.
    async fn disconnect(&mut self);

    /// Whether the link is currently up.
    fn is_connected(&self) -> bool;

    /// Surface ready inbound data as frames on the queue.
    ///
    /// Must return promptly when nothing is ready; the engine polls every
    /// tick. A connectivity drop may surface here as an error or simply as
    /// `is_connected` turning false afterwards.
    async fn poll(&mut self, inbound: &mut FrameQueue) -> Result<(), TransportError>;

    /// Transmit one outbound frame's bytes.
    async fn send(&mut self, payload: &[u8]) -> Result<(), TransportError>;
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
