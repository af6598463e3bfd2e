//! Power switch device
//!
//! The simplest device kind: answers `setPowerState` requests and reports
//! state changes it makes on its own. What "switching" physically means is
//! delegated to a [`PowerControl`] controller so the same device type can
//! drive a relay, a mock, or nothing at all.

use core::any::Any;

use serde_json::{json, Value};
use tracing::debug;

use crate::device::{actions, DeviceHandler, EventSink, HandlerOutcome};
use crate::errors::Result;
use crate::types::{DeviceId, EventCause, PowerState};

// ----------------------------------------------------------------------------
// Power Control Trait
// ----------------------------------------------------------------------------

/// Applies a requested power state to whatever the device controls.
///
/// Returning `false` refuses the transition; the response then reports
/// `success: false` and the device keeps its previous state.
pub trait PowerControl: Send {
    fn on_power_state(&mut self, device_id: &DeviceId, state: PowerState) -> bool;
}

/// Controller that accepts every transition; the device just latches the
/// requested state.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl PowerControl for AcceptAll {
    fn on_power_state(&mut self, _device_id: &DeviceId, _state: PowerState) -> bool {
        true
    }
}

/// Parse and apply a `setPowerState` request value through a controller.
///
/// Returns the applied state, or `None` when the value is malformed or the
/// controller refuses.
pub(crate) fn apply_power_request(
    control: &mut dyn PowerControl,
    device_id: &DeviceId,
    value: &Value,
) -> Option<PowerState> {
    let state = value
        .get("state")
        .and_then(Value::as_str)
        .and_then(PowerState::from_wire)?;
    control.on_power_state(device_id, state).then_some(state)
}

// ----------------------------------------------------------------------------
// Switch
// ----------------------------------------------------------------------------

/// On/off device answering `setPowerState`.
pub struct Switch {
    id: DeviceId,
    control: Box<dyn PowerControl>,
    last_state: Option<PowerState>,
}

impl Switch {
    pub fn new(id: DeviceId, control: impl PowerControl + 'static) -> Self {
        Self {
            id,
            control: Box::new(control),
            last_state: None,
        }
    }

    /// Switch with the accept-everything controller.
    pub fn latching(id: DeviceId) -> Self {
        Self::new(id, AcceptAll)
    }

    /// Last state the switch acknowledged, if any yet.
    pub fn last_state(&self) -> Option<PowerState> {
        self.last_state
    }

    /// Report a device-initiated state change as a signed event.
    ///
    /// Latches the reported state.
    pub fn send_power_state_event(
        &mut self,
        sink: &mut dyn EventSink,
        state: PowerState,
        cause: EventCause,
    ) -> Result<()> {
        self.last_state = Some(state);
        sink.send_event(
            &self.id,
            actions::SET_POWER_STATE,
            cause,
            json!({ "state": state.as_str() }),
        )
    }
}

impl DeviceHandler for Switch {
    fn device_id(&self) -> &DeviceId {
        &self.id
    }

    fn handle_request(&mut self, action: &str, value: &Value) -> HandlerOutcome {
        match action {
            actions::SET_POWER_STATE => {
                match apply_power_request(self.control.as_mut(), &self.id, value) {
                    Some(state) => {
                        self.last_state = Some(state);
                        HandlerOutcome::handled(json!({ "state": state.as_str() }))
                    }
                    None => HandlerOutcome::unhandled(),
                }
            }
            other => {
                debug!(device_id = %self.id, action = other, "unsupported action");
                HandlerOutcome::unhandled()
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
