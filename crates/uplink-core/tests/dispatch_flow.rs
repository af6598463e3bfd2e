//! End-to-end dispatch scenarios
//!
//! Drives inbound frames through the dispatcher exactly the way the engine
//! loop does, then checks the outbound envelopes field by field.

use test_utils::{
    decode_frame, request_envelope, signed_request_frame, test_codec, MockTimeSource, SWITCH_ID,
};

use serde_json::json;
use uplink_core::device::{actions, EventSink, Switch, TemperatureSensor};
use uplink_core::dispatch::Dispatcher;
use uplink_core::envelope::EnvelopeKind;
use uplink_core::queue::{Frame, FrameQueue};
use uplink_core::registry::DeviceRegistry;
use uplink_core::signature::{SignatureCodec, SigningKey};
use uplink_core::types::{DeviceId, EventCause, PowerState, TransportKind};

const SENSOR_ID: &str = "aabbccddeeff001122334455";

fn dispatcher_at(secs: u64) -> Dispatcher {
    Dispatcher::new(test_codec(), FrameQueue::new()).with_clock(MockTimeSource::new_at(secs))
}

fn registry_with_switch() -> DeviceRegistry {
    let mut registry = DeviceRegistry::new();
    registry
        .register(Box::new(Switch::latching(
            DeviceId::parse(SWITCH_ID).unwrap(),
        )))
        .unwrap();
    registry
}

#[test]
fn test_signed_power_request_round_trips() {
    let mut dispatcher = dispatcher_at(1_563_460_000);
    let mut registry = registry_with_switch();

    dispatcher.dispatch(
        signed_request_frame(
            TransportKind::Websocket,
            SWITCH_ID,
            actions::SET_POWER_STATE,
            json!({ "state": "On" }),
        ),
        &mut registry,
    );

    let out = dispatcher.pop_outbound().expect("response expected");
    assert_eq!(out.transport, TransportKind::Websocket);

    let envelope = decode_frame(&out);
    assert_eq!(envelope.payload.kind, Some(EnvelopeKind::Response));
    assert_eq!(envelope.payload.action, actions::SET_POWER_STATE);
    assert_eq!(envelope.payload.device_id, SWITCH_ID);
    assert_eq!(envelope.payload.success, Some(true));
    assert_eq!(envelope.payload.value, json!({ "state": "On" }));
    assert_eq!(envelope.payload.client_id.as_deref(), Some("test-client"));
    assert_eq!(envelope.payload.message.as_deref(), Some("OK"));
    assert_eq!(envelope.payload.reply_token, Some("request-token".into()));
    assert_eq!(envelope.payload.created_at.as_secs(), 1_563_460_000);
    assert!(test_codec().check(&envelope));

    // The handler really ran.
    let switch = registry.lookup_as::<Switch>(SWITCH_ID).unwrap();
    assert_eq!(switch.last_state(), Some(PowerState::On));

    assert!(dispatcher.pop_outbound().is_none());
}

#[test]
fn test_tampered_request_is_dropped_silently() {
    let mut dispatcher = dispatcher_at(0);
    let mut registry = registry_with_switch();

    // Sign, then alter the payload.
    let mut envelope = request_envelope(SWITCH_ID, actions::SET_POWER_STATE, json!({ "state": "On" }));
    test_codec().seal(&mut envelope).unwrap();
    envelope.payload.value = json!({ "state": "Off" });
    dispatcher.dispatch(
        Frame::new(TransportKind::Websocket, envelope.to_bytes().unwrap()),
        &mut registry,
    );

    // Signed under a different key entirely.
    let stranger = SignatureCodec::new(SigningKey::from("some-other-key"));
    let mut envelope = request_envelope(SWITCH_ID, actions::SET_POWER_STATE, json!({ "state": "On" }));
    stranger.seal(&mut envelope).unwrap();
    dispatcher.dispatch(
        Frame::new(TransportKind::Websocket, envelope.to_bytes().unwrap()),
        &mut registry,
    );

    assert_eq!(dispatcher.outbound_len(), 0);
    let switch = registry.lookup_as::<Switch>(SWITCH_ID).unwrap();
    assert_eq!(switch.last_state(), None);
}

#[test]
fn test_unsigned_request_is_dropped() {
    let mut dispatcher = dispatcher_at(0);
    let mut registry = registry_with_switch();

    let envelope = request_envelope(SWITCH_ID, actions::SET_POWER_STATE, json!({ "state": "On" }));
    dispatcher.dispatch(
        Frame::new(TransportKind::Websocket, envelope.to_bytes().unwrap()),
        &mut registry,
    );
    assert_eq!(dispatcher.outbound_len(), 0);
}

#[test]
fn test_malformed_bytes_are_dropped() {
    let mut dispatcher = dispatcher_at(0);
    let mut registry = registry_with_switch();

    dispatcher.dispatch(Frame::text(TransportKind::Udp, "not json"), &mut registry);
    dispatcher.dispatch(
        Frame::text(TransportKind::Udp, r#"{"not": "an envelope"}"#),
        &mut registry,
    );
    assert_eq!(dispatcher.outbound_len(), 0);
}

#[test]
fn test_unknown_device_answers_with_failure() {
    let mut dispatcher = dispatcher_at(0);
    let mut registry = registry_with_switch();

    dispatcher.dispatch(
        signed_request_frame(
            TransportKind::Websocket,
            "000000000000000000000000",
            actions::SET_POWER_STATE,
            json!({ "state": "On" }),
        ),
        &mut registry,
    );

    let envelope = decode_frame(&dispatcher.pop_outbound().expect("response expected"));
    assert_eq!(envelope.payload.success, Some(false));
    assert_eq!(envelope.payload.value, json!({}));
    assert!(test_codec().check(&envelope));
}

#[test]
fn test_requests_route_by_exact_identifier() {
    let first = "aaaaaaaaaaaaaaaaaaaaaaa1";
    let second = "aaaaaaaaaaaaaaaaaaaaaaa2";

    let mut dispatcher = dispatcher_at(0);
    let mut registry = DeviceRegistry::new();
    registry
        .register(Box::new(Switch::latching(DeviceId::parse(first).unwrap())))
        .unwrap();
    registry
        .register(Box::new(Switch::latching(DeviceId::parse(second).unwrap())))
        .unwrap();

    dispatcher.dispatch(
        signed_request_frame(
            TransportKind::Websocket,
            second,
            actions::SET_POWER_STATE,
            json!({ "state": "On" }),
        ),
        &mut registry,
    );

    assert_eq!(
        registry.lookup_as::<Switch>(first).unwrap().last_state(),
        None
    );
    assert_eq!(
        registry.lookup_as::<Switch>(second).unwrap().last_state(),
        Some(PowerState::On)
    );
}

#[test]
fn test_responses_preserve_request_order() {
    let mut dispatcher = dispatcher_at(0);
    let mut registry = registry_with_switch();

    let mut inbound = FrameQueue::new();
    for token in ["token-1", "token-2", "token-3"] {
        let mut envelope =
            request_envelope(SWITCH_ID, actions::SET_POWER_STATE, json!({ "state": "On" }));
        envelope.payload.reply_token = Some(token.into());
        test_codec().seal(&mut envelope).unwrap();
        inbound.push(Frame::new(
            TransportKind::Websocket,
            envelope.to_bytes().unwrap(),
        ));
    }

    // Drain the way the engine does: whole queue, oldest first.
    while let Some(frame) = inbound.pop() {
        dispatcher.dispatch(frame, &mut registry);
    }

    for expected in ["token-1", "token-2", "token-3"] {
        let envelope = decode_frame(&dispatcher.pop_outbound().expect("response expected"));
        assert_eq!(envelope.payload.reply_token, Some(expected.into()));
    }
    assert!(dispatcher.pop_outbound().is_none());
}

#[test]
fn test_event_envelopes_have_the_event_shape() {
    let mut dispatcher = dispatcher_at(1_700_000_000);
    let id = DeviceId::parse(SWITCH_ID).unwrap();

    dispatcher
        .send_event(
            &id,
            actions::SET_POWER_STATE,
            EventCause::PhysicalInteraction,
            json!({ "state": "On" }),
        )
        .unwrap();
    dispatcher
        .send_event(
            &id,
            actions::SET_POWER_STATE,
            EventCause::PhysicalInteraction,
            json!({ "state": "Off" }),
        )
        .unwrap();

    let first = decode_frame(&dispatcher.pop_outbound().unwrap());
    assert_eq!(first.payload.kind, Some(EnvelopeKind::Event));
    assert_eq!(first.payload.cause, Some(EventCause::PhysicalInteraction));
    assert_eq!(first.payload.created_at.as_secs(), 1_700_000_000);
    assert!(first.payload.success.is_none());
    assert!(first.payload.client_id.is_none());
    assert!(first.payload.message.is_none());
    assert!(first.payload.reply_token.is_some());
    assert!(test_codec().check(&first));

    // Every event gets its own token.
    let second = decode_frame(&dispatcher.pop_outbound().unwrap());
    assert_ne!(first.payload.reply_token, second.payload.reply_token);
}

#[test]
fn test_temperature_event_flows_through_the_sink() {
    let mut dispatcher = dispatcher_at(1_700_000_000);
    let mut registry = DeviceRegistry::new();
    registry
        .register(Box::new(TemperatureSensor::latching(
            DeviceId::parse(SENSOR_ID).unwrap(),
        )))
        .unwrap();

    let sensor = registry.lookup_as::<TemperatureSensor>(SENSOR_ID).unwrap();
    sensor
        .send_temperature_event(&mut dispatcher, 23.46, 51.2, EventCause::PeriodicPoll)
        .unwrap();

    let out = dispatcher.pop_outbound().expect("event expected");
    assert_eq!(out.transport, TransportKind::Websocket);
    let envelope = decode_frame(&out);
    assert_eq!(envelope.payload.action, actions::CURRENT_TEMPERATURE);
    assert_eq!(envelope.payload.device_id, SENSOR_ID);
    assert_eq!(
        envelope.payload.value,
        json!({ "humidity": 51.2, "temperature": 23.5 })
    );
    assert!(test_codec().check(&envelope));
}
