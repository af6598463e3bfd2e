//! Device handlers
//!
//! A device is anything that can answer actions addressed to its identifier.
//! The dispatcher routes each verified request to exactly one handler by
//! device id; handlers report whether they accepted the action and what value
//! the response should carry. Devices emit spontaneous events through an
//! [`EventSink`] rather than talking to a transport themselves.

use core::any::Any;

use serde_json::Value;

use crate::errors::Result;
use crate::types::{DeviceId, EventCause};

pub mod switch;
pub mod temperature;

pub use switch::{AcceptAll, PowerControl, Switch};
pub use temperature::TemperatureSensor;

// ----------------------------------------------------------------------------
// Action Names
// ----------------------------------------------------------------------------

/// Wire-level action names understood by the bundled device kinds.
pub mod actions {
    /// Request to switch a device on or off; also the event emitted when the
    /// device changes state on its own.
    pub const SET_POWER_STATE: &str = "setPowerState";
    /// Telemetry event carrying a temperature and humidity reading.
    pub const CURRENT_TEMPERATURE: &str = "currentTemperature";
}

// ----------------------------------------------------------------------------
// Handler Outcome
// ----------------------------------------------------------------------------

/// What a handler did with a request.
///
/// `handled` becomes the response's `success` flag; `value` becomes its
/// `value` object.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerOutcome {
    pub handled: bool,
    pub value: Value,
}

impl HandlerOutcome {
    /// The request was accepted and produced the given response value.
    pub fn handled(value: Value) -> Self {
        Self {
            handled: true,
            value,
        }
    }

    /// The request was refused or not understood.
    pub fn unhandled() -> Self {
        Self {
            handled: false,
            value: Value::Object(serde_json::Map::new()),
        }
    }
}

// ----------------------------------------------------------------------------
// Device Handler Trait
// ----------------------------------------------------------------------------

/// A registered device that answers actions addressed to it.
///
/// Implementations also expose themselves as [`Any`] so callers holding the
/// registry can recover the concrete device type after registration.
pub trait DeviceHandler: Send {
    /// The identifier this handler answers for.
    fn device_id(&self) -> &DeviceId;

    /// Process a request action and produce the response outcome.
    fn handle_request(&mut self, action: &str, value: &Value) -> HandlerOutcome;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

// ----------------------------------------------------------------------------
// Event Sink Trait
// ----------------------------------------------------------------------------

/// Accepts spontaneous device events for signing and delivery.
pub trait EventSink {
    /// Queue an event envelope on behalf of a device.
    fn send_event(
        &mut self,
        device_id: &DeviceId,
        action: &str,
        cause: EventCause,
        value: Value,
    ) -> Result<()>;
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
