//! Websocket stream transport
//!
//! [`WsLink`] is the persistent-stream driver: it dials the gateway with the
//! credentials presented as handshake headers, surfaces inbound text messages
//! as frames, and transmits outbound frames as text messages. The engine owns
//! the pacing; this driver only moves bytes.

use futures::{FutureExt, SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use uplink_core::errors::TransportError;
use uplink_core::queue::{Frame, FrameQueue};
use uplink_core::transport::{ConnectOptions, TransportLink};
use uplink_core::types::TransportKind;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ----------------------------------------------------------------------------
// Websocket Link
// ----------------------------------------------------------------------------

/// Websocket driver for the engine's stream channel.
#[derive(Default)]
pub struct WsLink {
    stream: Option<WsStream>,
}

impl WsLink {
    pub fn new() -> Self {
        Self { stream: None }
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
impl TransportLink for WsLink {
    fn kind(&self) -> TransportKind {
        TransportKind::Websocket
    }

    async fn connect(&mut self, options: &ConnectOptions) -> Result<(), TransportError> {
        let mut request = options
            .server_url
            .as_str()
            .into_client_request()
            .map_err(connect_error)?;
        let headers = request.headers_mut();
        headers.insert(
            "appkey",
            HeaderValue::from_str(&options.app_key).map_err(connect_error)?,
        );
        headers.insert(
            "deviceids",
            HeaderValue::from_str(&options.device_ids).map_err(connect_error)?,
        );
        headers.insert(
            "platform",
            HeaderValue::from_str(&options.platform).map_err(connect_error)?,
        );

        let (stream, response) = connect_async(request).await.map_err(connect_error)?;
        debug!(status = %response.status(), "websocket handshake accepted");
        self.stream = Some(stream);
        Ok(())
    }

    async fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.close(None).await;
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn poll(&mut self, inbound: &mut FrameQueue) -> Result<(), TransportError> {
        loop {
            let Some(stream) = self.stream.as_mut() else {
                return Ok(());
            };
            // Only consume messages the stream already buffered; the engine
            // polls again next tick.
            match stream.next().now_or_never() {
                None => return Ok(()),
                Some(Some(Ok(Message::Text(text)))) => {
                    inbound.push(Frame::text(TransportKind::Websocket, text));
                }
                Some(Some(Ok(Message::Binary(bytes)))) => {
                    inbound.push(Frame::new(TransportKind::Websocket, bytes));
                }
                Some(Some(Ok(Message::Ping(data)))) => {
                    let _ = stream.send(Message::Pong(data)).await;
                }
                Some(Some(Ok(Message::Pong(_) | Message::Frame(_)))) => {}
                Some(Some(Ok(Message::Close(_)))) => {
                    debug!("server closed the websocket");
                    self.stream = None;
                    return Ok(());
                }
                Some(Some(Err(err))) => {
                    warn!(error = %err, "websocket receive failed");
                    self.stream = None;
                    return Ok(());
                }
                Some(None) => {
                    debug!("websocket stream ended");
                    self.stream = None;
                    return Ok(());
                }
            }
        }
    }

    async fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(TransportError::NotConnected);
        };
        let text = String::from_utf8(payload.to_vec()).map_err(send_error)?;
        if let Err(err) = stream.send(Message::Text(text)).await {
            self.stream = None;
            return Err(send_error(err));
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
