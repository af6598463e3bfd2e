//! Request dispatch
//!
//! The dispatcher is the consumer side of the inbound queue and the producer
//! side of the outbound queue. Every inbound frame goes through the same
//! pass: parse, verify, route to the registered device, answer. Anything
//! that fails before verification is dropped without a response; after
//! verification there is always exactly one signed response per request.
//!
//! The dispatcher also implements [`EventSink`], signing and queueing the
//! spontaneous events devices emit between requests.

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::device::EventSink;
use crate::envelope::Envelope;
use crate::errors::Result;
use crate::queue::{Frame, FrameQueue};
use crate::registry::DeviceRegistry;
use crate::signature::SignatureCodec;
use crate::types::{DeviceId, EventCause, ReplyToken, SystemTimeSource, TimeSource, TransportKind};

// ----------------------------------------------------------------------------
// Dispatcher
// ----------------------------------------------------------------------------

/// Verifies, routes, and answers inbound request frames.
pub struct Dispatcher {
    codec: SignatureCodec,
    clock: Box<dyn TimeSource>,
    outbound: FrameQueue,
}

impl Dispatcher {
    pub fn new(codec: SignatureCodec, outbound: FrameQueue) -> Self {
        Self {
            codec,
            clock: Box::new(SystemTimeSource),
            outbound,
        }
    }

    /// Replace the wall-clock source. Tests use this to pin `createdAt`.
    pub fn with_clock(mut self, clock: impl TimeSource + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Process one inbound frame end to end.
    ///
    /// Unparseable or unauthenticated frames are dropped with no outbound
    /// response. A verified request always yields a signed response on the
    /// transport it arrived on, even when no device matches.
    pub fn dispatch(&mut self, frame: Frame, registry: &mut DeviceRegistry) {
        let envelope = match Envelope::from_bytes(&frame.payload) {
            Ok(envelope) => envelope,
            Err(err) => {
                debug!(transport = %frame.transport, error = %err, "dropping unparseable frame");
                return;
            }
        };
        if !self.codec.check(&envelope) {
            debug!(
                transport = %frame.transport,
                device_id = %envelope.payload.device_id,
                "dropping frame with bad signature"
            );
            return;
        }

        let request = envelope.payload;
        let mut response = Envelope::response_to(&request, self.clock.now());
        match registry.lookup_mut(&request.device_id) {
            Some(device) => {
                let outcome = device.handle_request(&request.action, &request.value);
                debug!(
                    device_id = %request.device_id,
                    action = %request.action,
                    handled = outcome.handled,
                    "request dispatched"
                );
                response.payload.success = Some(outcome.handled);
                response.payload.value = outcome.value;
            }
            None => {
                warn!(device_id = %request.device_id, "request for unregistered device");
            }
        }

        if let Err(err) = self.enqueue(response, frame.transport) {
            error!(error = %err, "response could not be signed, dropping");
        }
    }

    /// Take the next outbound frame, oldest first.
    pub fn pop_outbound(&mut self) -> Option<Frame> {
        self.outbound.pop()
    }

    pub fn outbound_len(&self) -> usize {
        self.outbound.len()
    }

    /// Sign an envelope and queue it for delivery on the given transport.
    fn enqueue(&mut self, mut envelope: Envelope, transport: TransportKind) -> Result<()> {
        self.codec.seal(&mut envelope)?;
        let bytes = envelope.to_bytes()?;
        self.outbound.push(Frame::new(transport, bytes));
        Ok(())
    }
}

impl EventSink for Dispatcher {
    /// Events always leave on the persistent stream, whatever triggered them.
    fn send_event(
        &mut self,
        device_id: &DeviceId,
        action: &str,
        cause: EventCause,
        value: Value,
    ) -> Result<()> {
        let envelope = Envelope::event(
            device_id,
            action,
            cause,
            self.clock.now(),
            ReplyToken::generate(),
        )
        .with_value(value);
        debug!(device_id = %device_id, action, "event queued");
        self.enqueue(envelope, TransportKind::Websocket)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
