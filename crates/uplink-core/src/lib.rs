//! Uplink Core Protocol Implementation
//!
//! This crate provides the transport-agnostic half of the uplink protocol:
//! frame queues, the signed JSON envelope, device registration and dispatch,
//! and the connection lifecycle state machine. It performs no IO of its own;
//! the transport drivers and the async engine loop live in sibling crates.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod config;
pub mod connection;
pub mod device;
pub mod dispatch;
pub mod envelope;
pub mod errors;
pub mod queue;
pub mod registry;
pub mod signature;
pub mod transport;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use config::{ConnectionConfig, CredentialsConfig, QueueConfig, UplinkConfig};
pub use connection::{LinkAction, LinkEvent, LinkState, LinkTransition};
pub use device::{
    actions, AcceptAll, DeviceHandler, EventSink, HandlerOutcome, PowerControl, Switch,
    TemperatureSensor,
};
pub use dispatch::Dispatcher;
pub use envelope::{
    Envelope, EnvelopeKind, Header, Payload, SignatureObject, PAYLOAD_VERSION, SIGNATURE_VERSION,
};
pub use errors::{
    ConfigError, EnvelopeError, RegistryError, Result, SignatureError, TransportError, UplinkError,
};
pub use queue::{Frame, FrameQueue};
pub use registry::DeviceRegistry;
pub use signature::{SignatureCodec, SigningKey};
pub use transport::{ConnectOptions, TransportLink};
pub use types::{
    DeviceId, EventCause, PowerState, ReplyToken, SystemTimeSource, TimeSource, Timestamp,
    TransportKind, DEVICE_ID_LEN,
};
