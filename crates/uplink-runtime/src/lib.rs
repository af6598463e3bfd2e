//! Uplink Runtime Engine
//!
//! This crate contains the supervisor engine for the uplink protocol:
//! `UplinkEngine` owns the device registry, the frame queues, and the
//! attached transport links, and drives connects, polls, dispatch, and
//! outbound sends from a single tick loop.
//!
//! This is the "engine" of the stack. `uplink-core` provides the protocol
//! logic (envelopes, signatures, routing); transport crates provide the
//! drivers the engine attaches.

pub mod engine;

pub use engine::{UplinkEngine, UplinkEngineBuilder};

// Re-export core types for convenience
pub use uplink_core::{
    config::{ConnectionConfig, CredentialsConfig, QueueConfig, UplinkConfig},
    connection::LinkState,
    device::{
        actions, AcceptAll, DeviceHandler, EventSink, HandlerOutcome, PowerControl, Switch,
        TemperatureSensor,
    },
    errors::{Result, TransportError, UplinkError},
    registry::DeviceRegistry,
    transport::{ConnectOptions, TransportLink},
    types::{DeviceId, EventCause, PowerState, TimeSource, TransportKind},
};
