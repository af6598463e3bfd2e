//! Error types for the uplink engine
//!
//! This module contains all error types used throughout the core, grouped by
//! the subsystem they belong to, plus the main UplinkError type that unifies
//! them. Nothing in here is fatal to the process: every failure degrades to
//! "this message is not serviced".

use crate::types::{DeviceId, TransportKind};

// ----------------------------------------------------------------------------
// Specific Error Types
// ----------------------------------------------------------------------------

/// Payload signing and verification errors.
///
/// Verification failure is deliberately NOT represented here: a bad signature
/// is an expected condition answered by dropping the message, so `verify`
/// returns a bool instead of an error.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("payload could not be canonicalized: {0}")]
    Canonicalization(#[from] serde_json::Error),
    #[error("signing key was rejected by the mac")]
    Key,
}

/// Wire envelope errors.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Device registration and lookup errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid device id {0:?}: must be exactly 24 hexadecimal characters")]
    InvalidDeviceId(String),
    #[error("device {0} is already registered")]
    DuplicateDevice(DeviceId),
    #[error("no device registered under {0}")]
    NotFound(String),
    #[error("device {id} is not a {expected}")]
    KindMismatch { id: String, expected: &'static str },
}

/// Transport link errors surfaced by drivers or the engine's transport table.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("no {0} transport is attached")]
    NotAttached(TransportKind),
    #[error("a {0} transport is already attached")]
    AlreadyAttached(TransportKind),
    #[error("link is not connected")]
    NotConnected,
    #[error("connect failed: {reason}")]
    Connect { reason: String },
    #[error("send failed: {reason}")]
    Send { reason: String },
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("app key is empty")]
    MissingAppKey,
    #[error("signing key is empty")]
    MissingSigningKey,
    #[error("server url is empty")]
    MissingServerUrl,
    #[error("queue capacity must be nonzero when set")]
    ZeroQueueCapacity,
}

// ----------------------------------------------------------------------------
// Unified Error Type
// ----------------------------------------------------------------------------

/// Core error type for the uplink engine.
#[derive(Debug, thiserror::Error)]
pub enum UplinkError {
    #[error("signature error: {0}")]
    Signature(#[from] SignatureError),

    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

// ----------------------------------------------------------------------------
// Convenience Error Constructors
// ----------------------------------------------------------------------------

impl UplinkError {
    /// Create a transport connect failure from any displayable cause.
    pub fn connect_failed<R: ToString>(reason: R) -> Self {
        UplinkError::Transport(TransportError::Connect {
            reason: reason.to_string(),
        })
    }

    /// Create a transport send failure from any displayable cause.
    pub fn send_failed<R: ToString>(reason: R) -> Self {
        UplinkError::Transport(TransportError::Send {
            reason: reason.to_string(),
        })
    }

    /// Create a not-connected transport error.
    pub fn not_connected() -> Self {
        UplinkError::Transport(TransportError::NotConnected)
    }
}

// ----------------------------------------------------------------------------
// Type Aliases
// ----------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, UplinkError>;
