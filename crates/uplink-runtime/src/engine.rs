//! Engine context and supervisor loop
//!
//! `UplinkEngine` is the explicit context object that owns everything the
//! protocol needs at runtime: the device registry, the inbound queue, the
//! dispatcher (which owns the outbound queue), and the attached transport
//! links with their lifecycle states. One `tick()` performs a full
//! supervisor pass; `run()` repeats ticks on the configured interval until a
//! shutdown future resolves.

use std::fmt;
use std::future::Future;

use serde_json::Value;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use uplink_core::config::UplinkConfig;
use uplink_core::connection::{LinkAction, LinkEvent, LinkState};
use uplink_core::device::{DeviceHandler, EventSink};
use uplink_core::dispatch::Dispatcher;
use uplink_core::errors::{Result, TransportError};
use uplink_core::queue::FrameQueue;
use uplink_core::registry::DeviceRegistry;
use uplink_core::signature::{SignatureCodec, SigningKey};
use uplink_core::transport::{ConnectOptions, TransportLink};
use uplink_core::types::{DeviceId, EventCause, TimeSource, TransportKind};

// ----------------------------------------------------------------------------
// Link Slot
// ----------------------------------------------------------------------------

/// One attached transport driver plus its lifecycle state.
struct LinkSlot {
    link: Box<dyn TransportLink>,
    state: LinkState,
}

impl LinkSlot {
    /// Feed an event through the state machine and keep the new state.
    fn apply(&mut self, event: LinkEvent) -> LinkAction {
        let transition = self.state.transition(event);
        self.state = transition.next;
        transition.action
    }
}

// ----------------------------------------------------------------------------
// Engine Builder
// ----------------------------------------------------------------------------

/// Builder assembling an [`UplinkEngine`] from configuration, devices, and
/// transport links.
pub struct UplinkEngineBuilder {
    config: UplinkConfig,
    clock: Option<Box<dyn TimeSource>>,
    devices: Vec<Box<dyn DeviceHandler>>,
    links: Vec<Box<dyn TransportLink>>,
}

impl UplinkEngineBuilder {
    fn new(config: UplinkConfig) -> Self {
        Self {
            config,
            clock: None,
            devices: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Queue a device for registration.
    pub fn register_device(mut self, device: Box<dyn DeviceHandler>) -> Self {
        self.devices.push(device);
        self
    }

    /// Queue a transport link for attachment.
    pub fn attach_link(mut self, link: Box<dyn TransportLink>) -> Self {
        self.links.push(link);
        self
    }

    /// Replace the wall-clock source stamping `createdAt` fields.
    ///
    /// Production deployments plug a network-synchronized source in here;
    /// tests pin the clock.
    pub fn with_clock(mut self, clock: impl TimeSource + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Validate the configuration and assemble the engine.
    pub fn build(self) -> Result<UplinkEngine> {
        self.config.validate()?;

        let codec = SignatureCodec::new(SigningKey::from(
            self.config.credentials.signing_key.clone(),
        ));
        let mut dispatcher = Dispatcher::new(codec, FrameQueue::from_config(&self.config.queue));
        if let Some(clock) = self.clock {
            dispatcher = dispatcher.with_clock(clock);
        }

        let mut engine = UplinkEngine {
            inbound: FrameQueue::from_config(&self.config.queue),
            config: self.config,
            registry: DeviceRegistry::new(),
            dispatcher,
            links: Vec::new(),
            auto_connect: true,
        };
        for device in self.devices {
            engine.register_device(device)?;
        }
        for link in self.links {
            engine.attach_link(link)?;
        }
        Ok(engine)
    }
}

// ----------------------------------------------------------------------------
// Engine
// ----------------------------------------------------------------------------

/// The uplink engine context.
///
/// Single logical thread of execution: every queue mutation happens inside
/// `tick()` on the caller's task, so dispatch order is exactly arrival order.
pub struct UplinkEngine {
    config: UplinkConfig,
    registry: DeviceRegistry,
    inbound: FrameQueue,
    dispatcher: Dispatcher,
    links: Vec<LinkSlot>,
    auto_connect: bool,
}

impl UplinkEngine {
    /// Start building an engine around a configuration.
    pub fn builder(config: UplinkConfig) -> UplinkEngineBuilder {
        UplinkEngineBuilder::new(config)
    }

    /// Engine with no devices or links yet; both can be added afterwards.
    pub fn new(config: UplinkConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Register a device handler.
    pub fn register_device(&mut self, device: Box<dyn DeviceHandler>) -> Result<()> {
        self.registry.register(device)?;
        Ok(())
    }

    /// Attach a transport link. At most one link per transport kind.
    pub fn attach_link(&mut self, link: Box<dyn TransportLink>) -> Result<()> {
        let kind = link.kind();
        if self.links.iter().any(|slot| slot.link.kind() == kind) {
            return Err(TransportError::AlreadyAttached(kind).into());
        }
        debug!(transport = %kind, "transport attached");
        self.links.push(LinkSlot {
            link,
            state: LinkState::default(),
        });
        Ok(())
    }

    /// True when at least one link is attached and every link is up.
    pub fn is_connected(&self) -> bool {
        !self.links.is_empty() && self.links.iter().all(|slot| slot.state.is_connected())
    }

    /// Lifecycle state of the link serving a transport kind.
    pub fn link_state(&self, kind: TransportKind) -> Option<LinkState> {
        self.links
            .iter()
            .find(|slot| slot.link.kind() == kind)
            .map(|slot| slot.state)
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Borrow the registry and the event sink at the same time.
    ///
    /// Devices live inside the registry and emit events through the
    /// dispatcher, so callers need both halves mutably at once.
    pub fn split(&mut self) -> (&mut DeviceRegistry, &mut Dispatcher) {
        (&mut self.registry, &mut self.dispatcher)
    }

    /// One supervisor pass: connect attempts, transport polls, full inbound
    /// drain, then at most one outbound send.
    pub async fn tick(&mut self) {
        self.connect_links().await;
        self.poll_links().await;
        while let Some(frame) = self.inbound.pop() {
            self.dispatcher.dispatch(frame, &mut self.registry);
        }
        self.send_one_outbound().await;
    }

    /// Tick on the configured interval until the shutdown future resolves.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval(self.config.connection.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(
            tick_interval_ms = self.config.connection.tick_interval_ms,
            "engine loop started"
        );
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    self.stop().await;
                    return;
                }
                _ = ticker.tick() => self.tick().await,
            }
        }
    }

    /// Drop every link, wait the configured pause, and connect again.
    pub async fn reconnect(&mut self) {
        info!(
            pause_ms = self.config.connection.reconnect_pause_ms,
            "reconnecting"
        );
        self.disconnect_links().await;
        tokio::time::sleep(self.config.connection.reconnect_pause()).await;
        self.auto_connect = true;
        self.connect_links().await;
    }

    /// Disconnect and stay down; `reconnect` brings the engine back up.
    pub async fn stop(&mut self) {
        info!("engine stopped");
        self.auto_connect = false;
        self.disconnect_links().await;
    }

    async fn connect_links(&mut self) {
        if !self.auto_connect {
            return;
        }
        if self.links.iter().all(|slot| slot.state.is_connected()) {
            return;
        }
        let options = ConnectOptions::from_config(&self.config, self.registry.descriptor());
        for slot in &mut self.links {
            if slot.state.is_connected() {
                continue;
            }
            if slot.apply(LinkEvent::ConnectRequested) != LinkAction::OpenTransport {
                continue;
            }
            match slot.link.connect(&options).await {
                Ok(()) => {
                    info!(
                        transport = %slot.link.kind(),
                        server = %options.server_url,
                        "link connected"
                    );
                    slot.apply(LinkEvent::ConnectSucceeded);
                }
                Err(err) => {
                    warn!(
                        transport = %slot.link.kind(),
                        error = %err,
                        "connect attempt failed"
                    );
                    slot.apply(LinkEvent::ConnectFailed);
                }
            }
        }
    }

    async fn poll_links(&mut self) {
        for slot in &mut self.links {
            if let Err(err) = slot.link.poll(&mut self.inbound).await {
                warn!(transport = %slot.link.kind(), error = %err, "poll failed");
            }
            if slot.state.is_connected() && !slot.link.is_connected() {
                warn!(transport = %slot.link.kind(), "link lost");
                slot.apply(LinkEvent::TransportLost);
            }
        }
    }

    /// Hand the oldest outbound frame to its link. Outbound stays queued
    /// while any link is down; a frame whose transport has no link at all
    /// is dropped.
    async fn send_one_outbound(&mut self) {
        if !self.is_connected() {
            return;
        }
        let frame = match self.dispatcher.pop_outbound() {
            Some(frame) => frame,
            None => return,
        };
        match self
            .links
            .iter_mut()
            .find(|slot| slot.link.kind() == frame.transport)
        {
            Some(slot) => {
                if let Err(err) = slot.link.send(&frame.payload).await {
                    warn!(transport = %frame.transport, error = %err, "send failed, frame dropped");
                }
            }
            None => {
                warn!(transport = %frame.transport, "no link for outbound frame, dropping");
            }
        }
    }

    async fn disconnect_links(&mut self) {
        for slot in &mut self.links {
            if slot.apply(LinkEvent::StopRequested) == LinkAction::CloseTransport {
                slot.link.disconnect().await;
            }
        }
    }
}

impl fmt::Debug for UplinkEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UplinkEngine")
            .field("registry", &self.registry)
            .field("inbound", &self.inbound)
            .field("links", &self.links.len())
            .field("auto_connect", &self.auto_connect)
            .finish_non_exhaustive()
    }
}

impl EventSink for UplinkEngine {
    fn send_event(
        &mut self,
        device_id: &DeviceId,
        action: &str,
        cause: EventCause,
        value: Value,
    ) -> Result<()> {
        self.dispatcher.send_event(device_id, action, cause, value)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
