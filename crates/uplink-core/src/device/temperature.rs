//! Temperature sensor device
//!
//! Reports temperature and humidity readings as `currentTemperature` events
//! and accepts `setPowerState` like any switchable device. Readings are
//! caller-driven; the sensor never schedules its own polling.

use core::any::Any;

use serde_json::{json, Value};
use tracing::debug;

use crate::device::switch::{apply_power_request, AcceptAll, PowerControl};
use crate::device::{actions, DeviceHandler, EventSink, HandlerOutcome};
use crate::errors::Result;
use crate::types::{DeviceId, EventCause, PowerState};

/// Round a reading to one decimal place for the wire.
fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ----------------------------------------------------------------------------
// Temperature Sensor
// ----------------------------------------------------------------------------

/// Switchable temperature and humidity sensor.
pub struct TemperatureSensor {
    id: DeviceId,
    control: Box<dyn PowerControl>,
    last_state: Option<PowerState>,
}

impl TemperatureSensor {
    pub fn new(id: DeviceId, control: impl PowerControl + 'static) -> Self {
        Self {
            id,
            control: Box::new(control),
            last_state: None,
        }
    }

    /// Sensor with the accept-everything power controller.
    pub fn latching(id: DeviceId) -> Self {
        Self::new(id, AcceptAll)
    }

    /// Last power state the sensor acknowledged, if any yet.
    pub fn last_state(&self) -> Option<PowerState> {
        self.last_state
    }

    /// Report a reading as a signed event.
    ///
    /// Temperature is rounded to one decimal place; humidity goes out as
    /// measured.
    pub fn send_temperature_event(
        &self,
        sink: &mut dyn EventSink,
        temperature: f64,
        humidity: f64,
        cause: EventCause,
    ) -> Result<()> {
        sink.send_event(
            &self.id,
            actions::CURRENT_TEMPERATURE,
            cause,
            json!({
                "humidity": humidity,
                "temperature": round_tenths(temperature),
            }),
        )
    }

    /// Report a device-initiated power state change as a signed event.
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

impl DeviceHandler for TemperatureSensor {
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
