//! Centralized Configuration Management
//!
//! This module consolidates the engine's configuration structures: the
//! credentials shared with the remote service, connection behavior, and
//! queue sizing. The CLI deserializes the same structures from TOML.

use core::time::Duration;

use crate::errors::ConfigError;

// ----------------------------------------------------------------------------
// Credentials Configuration
// ----------------------------------------------------------------------------

/// Credentials issued by the remote service for one device process.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Application key presented in connection headers.
    pub app_key: String,
    /// Shared secret used to sign and verify payloads.
    pub signing_key: String,
}

impl CredentialsConfig {
    pub fn new(app_key: impl Into<String>, signing_key: impl Into<String>) -> Self {
        Self {
            app_key: app_key.into(),
            signing_key: signing_key.into(),
        }
    }

    /// Fixed throwaway credentials for tests.
    pub fn testing() -> Self {
        Self {
            app_key: "test-app-key".into(),
            signing_key: "test-signing-key".into(),
        }
    }
}

// ----------------------------------------------------------------------------
// Connection Configuration
// ----------------------------------------------------------------------------

/// Configuration for the persistent connection and the supervisor loop.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Server the persistent-stream transport dials.
    pub server_url: String,
    /// Platform tag presented in connection headers.
    pub platform: String,
    /// Pause between the disconnect and connect halves of a reconnect.
    pub reconnect_pause_ms: u64,
    /// Interval between supervisor ticks in the `run()` loop.
    pub tick_interval_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            server_url: "wss://gateway.uplink.example".into(),
            platform: "rust".into(),
            reconnect_pause_ms: 1000, // observed service expects a short gap
            tick_interval_ms: 50,     // keeps outbound latency low
        }
    }
}

impl ConnectionConfig {
    /// Create configuration for tests against a local endpoint.
    pub fn testing() -> Self {
        Self {
            server_url: "ws://127.0.0.1:18080".into(),
            platform: "test".into(),
            reconnect_pause_ms: 10,
            tick_interval_ms: 1,
        }
    }

    pub fn reconnect_pause(&self) -> Duration {
        Duration::from_millis(self.reconnect_pause_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

// ----------------------------------------------------------------------------
// Queue Configuration
// ----------------------------------------------------------------------------

/// Configuration for the inbound and outbound frame queues.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum queued frames per queue. `None` leaves the queue unbounded;
    /// when set, the newest frame is rejected once the bound is reached.
    pub capacity: Option<usize>,
}

impl QueueConfig {
    /// Unbounded queues, matching the protocol's default behavior.
    pub fn unbounded() -> Self {
        Self { capacity: None }
    }

    /// Bounded queues with reject-newest overflow.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
        }
    }

    /// Small bounded queues so tests can exercise overflow quickly.
    pub fn testing() -> Self {
        Self { capacity: Some(16) }
    }
}

// ----------------------------------------------------------------------------
// Master Configuration
// ----------------------------------------------------------------------------

/// Master configuration consolidating every engine concern.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct UplinkConfig {
    /// Service credentials.
    pub credentials: CredentialsConfig,
    /// Connection and supervisor behavior.
    pub connection: ConnectionConfig,
    /// Frame queue sizing.
    pub queue: QueueConfig,
}

impl UplinkConfig {
    /// Create new configuration with default values.
    pub fn new(app_key: impl Into<String>, signing_key: impl Into<String>) -> Self {
        Self {
            credentials: CredentialsConfig::new(app_key, signing_key),
            ..Default::default()
        }
    }

    /// Create configuration optimized for testing.
    pub fn testing() -> Self {
        Self {
            credentials: CredentialsConfig::testing(),
            connection: ConnectionConfig::testing(),
            queue: QueueConfig::testing(),
        }
    }

    /// Builder method for overriding the server URL.
    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        self.connection.server_url = server_url.into();
        self
    }

    /// Builder method for overriding the platform tag.
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.connection.platform = platform.into();
        self
    }

    /// Builder method for overriding queue sizing.
    pub fn with_queue(mut self, queue: QueueConfig) -> Self {
        self.queue = queue;
        self
    }

    /// Validate the configuration for consistency and feasibility.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.credentials.app_key.is_empty() {
            return Err(ConfigError::MissingAppKey);
        }
        if self.credentials.signing_key.is_empty() {
            return Err(ConfigError::MissingSigningKey);
        }
        if self.connection.server_url.is_empty() {
            return Err(ConfigError::MissingServerUrl);
        }
        if self.queue.capacity == Some(0) {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
