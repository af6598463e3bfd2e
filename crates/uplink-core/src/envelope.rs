//! Wire envelopes
//!
//! Everything exchanged with the remote service is a JSON envelope: a version
//! header, a payload carrying the action, and a signature object over the
//! payload. This module defines the typed structure plus the two outbound
//! construction paths (responses to requests, spontaneous events).
//!
//! Payload fields are declared in lexicographic order and optional fields are
//! omitted when absent, so compact serialization of a `Payload` IS the
//! canonical form the signature codec signs. Nested `value` objects stay
//! sorted because `serde_json`'s default map keeps keys ordered.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::EnvelopeError;
use crate::types::{DeviceId, EventCause, ReplyToken, Timestamp};

/// Payload format revision carried in every header.
pub const PAYLOAD_VERSION: u8 = 2;
/// Signature scheme revision carried in every header.
pub const SIGNATURE_VERSION: u8 = 1;

// ----------------------------------------------------------------------------
// Header
// ----------------------------------------------------------------------------

/// Envelope version header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    #[serde(rename = "payloadVersion")]
    pub payload_version: u8,
    #[serde(rename = "signatureVersion")]
    pub signature_version: u8,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            payload_version: PAYLOAD_VERSION,
            signature_version: SIGNATURE_VERSION,
        }
    }
}

// ----------------------------------------------------------------------------
// Payload
// ----------------------------------------------------------------------------

/// Message category carried in the payload `type` field.
///
/// Inbound requests frequently omit the field, hence `Option<EnvelopeKind>`
/// on [`Payload::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeKind {
    Request,
    Response,
    Event,
}

/// Envelope payload: the signed portion of every message.
///
/// Field declaration order is lexicographic by wire name; do not reorder, the
/// signature codec depends on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<EventCause>,
    #[serde(rename = "clientId", skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Timestamp,
    #[serde(rename = "deviceId")]
    pub device_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "replyToken", skip_serializing_if = "Option::is_none")]
    pub reply_token: Option<ReplyToken>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<EnvelopeKind>,
    #[serde(default = "empty_object")]
    pub value: Value,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

// ----------------------------------------------------------------------------
// Signature Object
// ----------------------------------------------------------------------------

/// Signature object attached beside the payload.
///
/// Defaults to an empty tag when an inbound message carries no signature;
/// verification then fails and the message is dropped, which is the required
/// handling for unsigned traffic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureObject {
    #[serde(rename = "HMAC", default)]
    pub hmac: String,
}

// ----------------------------------------------------------------------------
// Envelope
// ----------------------------------------------------------------------------

/// A complete wire message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub header: Header,
    pub payload: Payload,
    #[serde(default)]
    pub signature: SignatureObject,
}

impl Envelope {
    /// Build the response envelope answering an inbound request.
    ///
    /// Correlation fields (`action`, `clientId`, `deviceId`, `replyToken`)
    /// echo the request; `success` starts false and is flipped only after a
    /// handler confirms the action.
    pub fn response_to(request: &Payload, now: Timestamp) -> Self {
        Self {
            header: Header::default(),
            payload: Payload {
                action: request.action.clone(),
                cause: None,
                client_id: request.client_id.clone(),
                created_at: now,
                device_id: request.device_id.clone(),
                message: Some("OK".into()),
                reply_token: request.reply_token.clone(),
                success: Some(false),
                kind: Some(EnvelopeKind::Response),
                value: empty_object(),
            },
            signature: SignatureObject::default(),
        }
    }

    /// Build a spontaneous event envelope for a device.
    pub fn event(
        device_id: &DeviceId,
        action: &str,
        cause: EventCause,
        now: Timestamp,
        reply_token: ReplyToken,
    ) -> Self {
        Self {
            header: Header::default(),
            payload: Payload {
                action: action.to_string(),
                cause: Some(cause),
                client_id: None,
                created_at: now,
                device_id: device_id.as_str().to_string(),
                message: None,
                reply_token: Some(reply_token),
                success: None,
                kind: Some(EnvelopeKind::Event),
                value: empty_object(),
            },
            signature: SignatureObject::default(),
        }
    }

    /// Replace the payload value object.
    pub fn with_value(mut self, value: Value) -> Self {
        self.payload.value = value;
        self
    }

    /// Parse an envelope from raw frame bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Serialize the whole envelope for transmission.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        Ok(serde_json::to_vec(self)?)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
