//! Device registry
//!
//! Owns every registered device handler for the life of the process and
//! resolves inbound `deviceId` fields to handlers. Fleets are small, so
//! lookup is a linear scan over inline storage and registration order is
//! preserved (the connect descriptor depends on it).

use core::any::type_name;
use core::fmt;

use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::device::DeviceHandler;
use crate::errors::RegistryError;
use crate::types::DeviceId;

// ----------------------------------------------------------------------------
// Device Registry
// ----------------------------------------------------------------------------

/// Collection of registered device handlers.
pub struct DeviceRegistry {
    devices: SmallVec<[Box<dyn DeviceHandler>; 4]>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self {
            devices: SmallVec::new(),
        }
    }

    /// Register a device handler.
    ///
    /// A handler whose identifier is already registered is refused; routing
    /// requires each identifier to resolve to exactly one handler.
    pub fn register(&mut self, device: Box<dyn DeviceHandler>) -> Result<(), RegistryError> {
        let id = device.device_id();
        if self.devices.iter().any(|d| d.device_id() == id) {
            warn!(device_id = %id, "duplicate device registration refused");
            return Err(RegistryError::DuplicateDevice(id.clone()));
        }
        debug!(device_id = %id, "device registered");
        self.devices.push(device);
        Ok(())
    }

    /// Find the handler registered under an identifier.
    pub fn lookup(&self, id: &str) -> Option<&dyn DeviceHandler> {
        self.devices
            .iter()
            .find(|d| d.device_id().as_str() == id)
            .map(|d| d.as_ref())
    }

    /// Mutable variant of [`lookup`](Self::lookup).
    pub fn lookup_mut(&mut self, id: &str) -> Option<&mut (dyn DeviceHandler + 'static)> {
        self.devices
            .iter_mut()
            .find(|d| d.device_id().as_str() == id)
            .map(|d| d.as_mut())
    }

    /// Find a handler and recover its concrete device type.
    ///
    /// Distinguishes an unknown identifier from one registered under a
    /// different device type.
    pub fn lookup_as<T: DeviceHandler + 'static>(&self, id: &str) -> Result<&T, RegistryError> {
        let device = self
            .lookup(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        device
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| RegistryError::KindMismatch {
                id: id.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Mutable variant of [`lookup_as`](Self::lookup_as).
    pub fn lookup_as_mut<T: DeviceHandler + 'static>(
        &mut self,
        id: &str,
    ) -> Result<&mut T, RegistryError> {
        let device = self
            .lookup_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        device
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or_else(|| RegistryError::KindMismatch {
                id: id.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Registered identifiers joined with `;` in registration order.
    ///
    /// This is the device list the stream transport presents when connecting.
    pub fn descriptor(&self) -> String {
        self.devices
            .iter()
            .map(|d| d.device_id().as_str())
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Iterate registered identifiers in registration order.
    pub fn device_ids(&self) -> impl Iterator<Item = &DeviceId> {
        self.devices.iter().map(|d| d.device_id())
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DeviceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceRegistry")
            .field("devices", &self.descriptor())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Switch, TemperatureSensor};
    use crate::types::PowerState;
    use serde_json::json;

    fn id(s: &str) -> DeviceId {
        DeviceId::parse(s).unwrap()
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = DeviceRegistry::new();
        registry
            .register(Box::new(Switch::latching(id("5dc1564130a1b2c3d4e5f6a7"))))
            .unwrap();
        registry
            .register(Box::new(Switch::latching(id("aabbccddeeff001122334455"))))
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.lookup("5dc1564130a1b2c3d4e5f6a7").is_some());
        assert!(registry.lookup("aabbccddeeff001122334455").is_some());
        assert!(registry.lookup("000000000000000000000000").is_none());
    }

    #[test]
    fn test_duplicate_registration_is_refused() {
        let mut registry = DeviceRegistry::new();
        registry
            .register(Box::new(Switch::latching(id("5dc1564130a1b2c3d4e5f6a7"))))
            .unwrap();

        let err = registry
            .register(Box::new(Switch::latching(id("5dc1564130a1b2c3d4e5f6a7"))))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateDevice(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_mut_reaches_the_handler() {
        let mut registry = DeviceRegistry::new();
        registry
            .register(Box::new(Switch::latching(id("5dc1564130a1b2c3d4e5f6a7"))))
            .unwrap();

        let device = registry.lookup_mut("5dc1564130a1b2c3d4e5f6a7").unwrap();
        let outcome = device.handle_request("setPowerState", &json!({ "state": "On" }));
        assert!(outcome.handled);
    }

    #[test]
    fn test_typed_lookup_distinguishes_missing_from_wrong_kind() {
        let mut registry = DeviceRegistry::new();
        registry
            .register(Box::new(Switch::latching(id("5dc1564130a1b2c3d4e5f6a7"))))
            .unwrap();

        let switch = registry
            .lookup_as::<Switch>("5dc1564130a1b2c3d4e5f6a7")
            .unwrap();
        assert_eq!(switch.last_state(), None);

        let missing = registry.lookup_as::<Switch>("000000000000000000000000");
        assert!(matches!(missing, Err(RegistryError::NotFound(_))));

        let wrong = registry.lookup_as::<TemperatureSensor>("5dc1564130a1b2c3d4e5f6a7");
        assert!(matches!(wrong, Err(RegistryError::KindMismatch { .. })));
    }

    #[test]
    fn test_typed_lookup_mut_reaches_concrete_methods() {
        let mut registry = DeviceRegistry::new();
        registry
            .register(Box::new(Switch::latching(id("5dc1564130a1b2c3d4e5f6a7"))))
            .unwrap();

        let switch = registry
            .lookup_as_mut::<Switch>("5dc1564130a1b2c3d4e5f6a7")
            .unwrap();
        switch.handle_request("setPowerState", &json!({ "state": "Off" }));
        assert_eq!(switch.last_state(), Some(PowerState::Off));
    }

    #[test]
    fn test_descriptor_joins_ids_in_registration_order() {
        let mut registry = DeviceRegistry::new();
        assert_eq!(registry.descriptor(), "");

        registry
            .register(Box::new(Switch::latching(id("5dc1564130a1b2c3d4e5f6a7"))))
            .unwrap();
        assert_eq!(registry.descriptor(), "5dc1564130a1b2c3d4e5f6a7");

        registry
            .register(Box::new(TemperatureSensor::latching(id(
                "aabbccddeeff001122334455",
            ))))
            .unwrap();
        assert_eq!(
            registry.descriptor(),
            "5dc1564130a1b2c3d4e5f6a7;aabbccddeeff001122334455"
        );
    }
}
