//! Core types for the uplink protocol
//!
//! This module defines the fundamental identifier, time, and wire-enum types
//! used throughout the engine, using newtype patterns for semantic validation
//! and type safety.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::RegistryError;

// ----------------------------------------------------------------------------
// Device Identifier
// ----------------------------------------------------------------------------

/// Number of characters in a device identifier.
pub const DEVICE_ID_LEN: usize = 24;

/// Unique identifier for a registered device.
///
/// The remote service issues identifiers as 24 hexadecimal characters; both
/// cases are accepted and the original casing is preserved, since routing
/// compares identifiers byte-for-byte as issued.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Validate and wrap a device identifier.
    pub fn parse(id: &str) -> Result<Self, RegistryError> {
        if id.len() != DEVICE_ID_LEN || hex::decode(id).is_err() {
            return Err(RegistryError::InvalidDeviceId(id.to_string()));
        }
        Ok(Self(id.to_string()))
    }

    /// View the identifier as issued by the remote service.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceId {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

impl PartialEq<str> for DeviceId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for DeviceId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// ----------------------------------------------------------------------------
// Timestamp
// ----------------------------------------------------------------------------

/// Second-resolution timestamp since the Unix epoch.
///
/// The wire format carries `createdAt` in epoch seconds, so the engine keeps
/// the same resolution end to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create a timestamp from epoch seconds.
    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Get the current wall-clock timestamp.
    pub fn now() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self(duration.as_secs())
    }

    /// Get the raw epoch seconds.
    pub fn as_secs(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ----------------------------------------------------------------------------
// Time Source Trait
// ----------------------------------------------------------------------------

/// Trait supplying wall-clock timestamps to the engine.
///
/// The engine never reads the clock directly; everything that stamps
/// `createdAt` fields goes through this trait so tests can pin time.
pub trait TimeSource: Send + Sync {
    /// Get the current timestamp.
    fn now(&self) -> Timestamp;
}

impl<T: TimeSource + ?Sized> TimeSource for Box<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// Standard library implementation of [`TimeSource`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl SystemTimeSource {
    pub fn new() -> Self {
        Self
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

// ----------------------------------------------------------------------------
// Reply Token
// ----------------------------------------------------------------------------

/// Correlation token carried in `replyToken` payload fields.
///
/// Requests carry a token chosen by the remote service and responses echo it;
/// spontaneous events generate a fresh one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyToken(String);

impl ReplyToken {
    /// Generate a fresh unique token.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for ReplyToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for ReplyToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl fmt::Display for ReplyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ----------------------------------------------------------------------------
// Transport Kind
// ----------------------------------------------------------------------------

/// Identifies which transport channel a frame arrived on or must leave by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportKind {
    /// Persistent bidirectional stream to the remote service.
    Websocket,
    /// Datagram discovery listener on the local network.
    Udp,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Websocket => write!(f, "websocket"),
            TransportKind::Udp => write!(f, "udp"),
        }
    }
}

// ----------------------------------------------------------------------------
// Power State
// ----------------------------------------------------------------------------

/// On/off state exchanged in `setPowerState` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerState {
    On,
    Off,
}

impl PowerState {
    /// Wire form used inside action values.
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerState::On => "On",
            PowerState::Off => "Off",
        }
    }

    /// Parse the wire form, returning `None` for anything else.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "On" => Some(PowerState::On),
            "Off" => Some(PowerState::Off),
            _ => None,
        }
    }

    pub fn is_on(&self) -> bool {
        matches!(self, PowerState::On)
    }
}

impl From<bool> for PowerState {
    fn from(on: bool) -> Self {
        if on {
            PowerState::On
        } else {
            PowerState::Off
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ----------------------------------------------------------------------------
// Event Cause
// ----------------------------------------------------------------------------

/// Why a spontaneous event was emitted, carried in the `cause` payload field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventCause {
    /// A person interacted with the device directly.
    #[serde(rename = "PHYSICAL_INTERACTION")]
    PhysicalInteraction,
    /// Periodic telemetry initiated by the device itself.
    #[serde(rename = "PERIODIC_POLL")]
    PeriodicPoll,
}

impl EventCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCause::PhysicalInteraction => "PHYSICAL_INTERACTION",
            EventCause::PeriodicPoll => "PERIODIC_POLL",
        }
    }
}

impl fmt::Display for EventCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
