//! UDP discovery transport
//!
//! [`UdpLink`] listens on the local-network discovery group so nearby
//! controllers can reach devices without going through the gateway. Requests
//! arrive as single datagrams; the response goes back to the address the most
//! recent request came from.

use std::io;
use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::UdpSocket;
use tracing::{debug, warn};

use uplink_core::errors::TransportError;
use uplink_core::queue::{Frame, FrameQueue};
use uplink_core::transport::{ConnectOptions, TransportLink};
use uplink_core::types::TransportKind;

/// Multicast group the discovery listener joins.
pub const MULTICAST_GROUP: Ipv4Addr = Ipv4Addr::new(224, 9, 9, 9);

/// Port the discovery listener binds.
pub const MULTICAST_PORT: u16 = 3333;

/// Largest datagram the listener accepts. Envelopes are compact JSON and fit
/// comfortably.
const MAX_DATAGRAM: usize = 2048;

// ----------------------------------------------------------------------------
// UDP Link
// ----------------------------------------------------------------------------

/// UDP driver for the engine's discovery channel.
pub struct UdpLink {
    bind_addr: SocketAddr,
    group: Option<Ipv4Addr>,
    socket: Option<UdpSocket>,
    reply_to: Option<SocketAddr>,
}

impl UdpLink {
    /// Listener on the standard discovery group and port.
    pub fn new() -> Self {
        Self::bound(
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, MULTICAST_PORT)),
            Some(MULTICAST_GROUP),
        )
    }

    /// Listener on a custom address, optionally joining a multicast group.
    pub fn bound(bind_addr: SocketAddr, group: Option<Ipv4Addr>) -> Self {
        Self {
            bind_addr,
            group,
            socket: None,
            reply_to: None,
        }
    }

    /// Address the socket actually bound, once connected.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }
}

impl Default for UdpLink {
    fn default() -> Self {
        Self::new()
    }
}

fn connect_error(err: impl ToString) -> TransportError {
    TransportError::Connect {
        reason: err.to_string(),
    }
}

fn send_error(err: impl ToString) -> TransportError {
    TransportError::Send {
        reason: err.to_string(),
    }
}

#[async_trait::async_trait]
impl TransportLink for UdpLink {
    fn kind(&self) -> TransportKind {
        TransportKind::Udp
    }

    async fn connect(&mut self, _options: &ConnectOptions) -> Result<(), TransportError> {
        let socket = UdpSocket::bind(self.bind_addr)
            .await
            .map_err(connect_error)?;
        if let Some(group) = self.group {
            socket
                .join_multicast_v4(group, Ipv4Addr::UNSPECIFIED)
                .map_err(connect_error)?;
        }
        debug!(addr = %self.bind_addr, group = ?self.group, "discovery listener bound");
        self.socket = Some(socket);
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.socket = None;
        self.reply_to = None;
    }

    fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    async fn poll(&mut self, inbound: &mut FrameQueue) -> Result<(), TransportError> {
        let Some(socket) = self.socket.as_ref() else {
            return Ok(());
        };
        let mut buf = [0u8; MAX_DATAGRAM];
        loop {
            match socket.try_recv_from(&mut buf) {
                Ok((len, addr)) => {
                    self.reply_to = Some(addr);
                    inbound.push(Frame::new(TransportKind::Udp, &buf[..len]));
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(err) => {
                    // Datagram errors are transient; keep the socket.
                    warn!(error = %err, "discovery receive failed");
                    return Ok(());
                }
            }
        }
    }

    async fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let Some(socket) = self.socket.as_ref() else {
            return Err(TransportError::NotConnected);
        };
        let Some(target) = self.reply_to else {
            return Err(send_error("no requester to answer yet"));
        };
        socket.send_to(payload, target).await.map_err(send_error)?;
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
