//! Test utilities for deterministic testing of the engine loop
//!
//! `MockLink` is a fully scripted transport driver: tests queue inbound
//! bytes, script connect failures, and inspect everything the engine sent,
//! all through a cloneable handle.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use uplink_core::envelope::{Envelope, Header, Payload, SignatureObject};
use uplink_core::errors::TransportError;
use uplink_core::queue::{Frame, FrameQueue};
use uplink_core::signature::{SignatureCodec, SigningKey};
use uplink_core::transport::{ConnectOptions, TransportLink};
use uplink_core::types::{Timestamp, TransportKind};
use uplink_core::UplinkConfig;

/// A valid switch identifier used across scenarios.
pub const SWITCH_ID: &str = "5dc1564130a1b2c3d4e5f6a7";

/// A second valid identifier for multi-device scenarios.
#[allow(dead_code)]
pub const SECOND_ID: &str = "aabbccddeeff001122334455";

// ----------------------------------------------------------------------------
// Mock Transport Link
// ----------------------------------------------------------------------------

#[derive(Default)]
struct MockLinkState {
    connected: bool,
    fail_connects: u32,
    inbound: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    connect_calls: u32,
    disconnect_calls: u32,
    last_options: Option<ConnectOptions>,
}

/// Cloneable handle scripting and inspecting a [`MockLink`] from the test
/// body while the engine owns the link itself.
#[derive(Clone, Default)]
pub struct MockLinkHandle {
    inner: Arc<Mutex<MockLinkState>>,
}

impl MockLinkHandle {
    /// Queue raw bytes the link will surface on its next connected poll.
    #[allow(dead_code)]
    pub fn push_inbound(&self, payload: Vec<u8>) {
        self.inner.lock().unwrap().inbound.push_back(payload);
    }

    /// Make the next `count` connect attempts fail.
    #[allow(dead_code)]
    pub fn fail_next_connects(&self, count: u32) {
        self.inner.lock().unwrap().fail_connects = count;
    }

    /// Simulate the transport dropping out from under the engine.
    #[allow(dead_code)]
    pub fn drop_connection(&self) {
        self.inner.lock().unwrap().connected = false;
    }

    /// Everything the engine sent, oldest first.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.inner.lock().unwrap().sent.clone()
    }

    pub fn connect_calls(&self) -> u32 {
        self.inner.lock().unwrap().connect_calls
    }

    #[allow(dead_code)]
    pub fn disconnect_calls(&self) -> u32 {
        self.inner.lock().unwrap().disconnect_calls
    }

    /// Options the engine presented on the most recent connect attempt.
    #[allow(dead_code)]
    pub fn last_options(&self) -> Option<ConnectOptions> {
        self.inner.lock().unwrap().last_options.clone()
    }
}

/// Scripted in-memory transport driver.
pub struct MockLink {
    kind: TransportKind,
    handle: MockLinkHandle,
}

impl MockLink {
    pub fn new(kind: TransportKind) -> (Self, MockLinkHandle) {
        let handle = MockLinkHandle::default();
        (
            Self {
                kind,
                handle: handle.clone(),
            },
            handle,
        )
    }
}

#[async_trait::async_trait]
impl TransportLink for MockLink {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    async fn connect(&mut self, options: &ConnectOptions) -> Result<(), TransportError> {
        let mut state = self.handle.inner.lock().unwrap();
        state.connect_calls += 1;
        state.last_options = Some(options.clone());
        if state.fail_connects > 0 {
            state.fail_connects -= 1;
            return Err(TransportError::Connect {
                reason: "scripted failure".into(),
            });
        }
        state.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) {
        let mut state = self.handle.inner.lock().unwrap();
        state.disconnect_calls += 1;
        state.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.handle.inner.lock().unwrap().connected
    }

    async fn poll(&mut self, inbound: &mut FrameQueue) -> Result<(), TransportError> {
        let mut state = self.handle.inner.lock().unwrap();
        if !state.connected {
            return Ok(());
        }
        while let Some(payload) = state.inbound.pop_front() {
            inbound.push(Frame::new(self.kind, payload));
        }
        Ok(())
    }

    async fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let mut state = self.handle.inner.lock().unwrap();
        if !state.connected {
            return Err(TransportError::NotConnected);
        }
        state.sent.push(payload.to_vec());
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Envelope Builders
// ----------------------------------------------------------------------------

/// Codec over the testing configuration's signing key, matching what an
/// engine built from [`UplinkConfig::testing`] signs and verifies with.
pub fn testing_codec() -> SignatureCodec {
    SignatureCodec::new(SigningKey::from(
        UplinkConfig::testing().credentials.signing_key,
    ))
}

/// Serialized, correctly signed request bytes the way the remote service
/// would produce them.
#[allow(dead_code)]
pub fn signed_request(device_id: &str, action: &str, value: Value) -> Vec<u8> {
    let mut envelope = Envelope {
        header: Header::default(),
        payload: Payload {
            action: action.to_string(),
            cause: None,
            client_id: Some("test-client".into()),
            created_at: Timestamp::from_secs(1_563_459_000),
            device_id: device_id.to_string(),
            message: None,
            reply_token: Some("request-token".into()),
            success: None,
            kind: None,
            value,
        },
        signature: SignatureObject::default(),
    };
    testing_codec()
        .seal(&mut envelope)
        .expect("test envelope must sign");
    envelope.to_bytes().expect("test envelope must serialize")
}

/// Parse bytes a link captured back into an envelope.
#[allow(dead_code)]
pub fn decode(bytes: &[u8]) -> Envelope {
    Envelope::from_bytes(bytes).expect("sent frame must parse")
}
