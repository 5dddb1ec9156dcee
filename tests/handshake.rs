#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Handshake-phase scenarios: the controller against a loopback peer.
//! Covers the success branch, the no-candidate and broken-channel aborts,
//! and channel setup failures.

use std::time::Duration;

use exchange_protocol::config::ExchangeConfig;
use exchange_protocol::core::codec::{TaggedCodec, WireCodec};
use exchange_protocol::core::message::{MaybeNum, Message, ValueReport, ValueRequest};
use exchange_protocol::error::ExchangeError;
use exchange_protocol::transport::{LoopbackTransport, Transport, TransportError, TransportMode};
use exchange_protocol::{ExchangeController, HandshakeOutcome};

const REQUEST_TOPIC: &str = "messages.ValueRequest";
const REPORT_TOPIC: &str = "messages.ValueReport";

fn test_config() -> ExchangeConfig {
    ExchangeConfig::default_with_overrides(|config| {
        config.protocol.startup_delay = Duration::ZERO;
    })
}

fn encode(message: &dyn Message) -> Vec<u8> {
    let codec = TaggedCodec::with_catalog();
    let mut out = Vec::new();
    codec.serialize(message, &mut out).expect("encode");
    out
}

/// Controller wired to a peer: the peer publishes into the controller's rx
/// and subscribes (to the report topic only, so receiving anything proves
/// the reply went out on the right topic) to the controller's tx.
fn open_controller() -> (
    ExchangeController<LoopbackTransport, TaggedCodec>,
    LoopbackTransport,
    LoopbackTransport,
) {
    let (ctl_tx, mut peer_rx) = LoopbackTransport::pair();
    let (mut peer_tx, ctl_rx) = LoopbackTransport::pair();

    peer_tx.open(TransportMode::Write).unwrap();
    peer_rx.open(TransportMode::Read).unwrap();
    peer_rx.subscribe(REPORT_TOPIC).unwrap();

    let controller = ExchangeController::open(
        ctl_tx,
        ctl_rx,
        TaggedCodec::with_catalog(),
        &test_config(),
    )
    .expect("setup");
    (controller, peer_tx, peer_rx)
}

#[test]
fn test_handshake_replies_to_the_opening_request() {
    let (mut controller, mut peer_tx, mut peer_rx) = open_controller();

    let request = ValueRequest {
        num: MaybeNum::set(123.4),
    };
    peer_tx.publish(&encode(&request), REQUEST_TOPIC).unwrap();

    let outcome = controller.run_handshake().expect("handshake");
    assert_eq!(outcome, HandshakeOutcome::ValueRequested);

    // exactly one publish, on the report topic, carrying the fixed
    // acknowledgment (nothing derived from the request's 123.4)
    let codec = TaggedCodec::with_catalog();
    let mut frame = vec![0u8; peer_rx.max_receive_size()];
    let count = peer_rx.recv(&mut frame).expect("reply frame");

    let mut report = ValueReport::default();
    assert!(codec.deserialize(&frame[..count], &mut report));
    assert_eq!(report.value(), Some(1.0));

    assert!(matches!(
        peer_rx.recv(&mut frame),
        Err(TransportError::Closed)
    ));
}

#[test]
fn test_handshake_aborts_when_no_candidate_matches() {
    let (mut controller, mut peer_tx, mut peer_rx) = open_controller();

    // a well-formed frame of an unexpected type, on a subscribed topic
    let unexpected = ValueReport::default();
    peer_tx.publish(&encode(&unexpected), REPORT_TOPIC).unwrap();

    let result = controller.run_handshake();
    assert!(matches!(
        result,
        Err(ExchangeError::NoCandidateMatched { .. })
    ));

    // a failed handshake publishes nothing
    let mut frame = vec![0u8; peer_rx.max_receive_size()];
    assert!(matches!(
        peer_rx.recv(&mut frame),
        Err(TransportError::Closed)
    ));
}

#[test]
fn test_handshake_aborts_on_garbage_frame() {
    let (mut controller, mut peer_tx, _peer_rx) = open_controller();

    peer_tx.publish(&[0xDE, 0xAD, 0xBE], REQUEST_TOPIC).unwrap();

    let result = controller.run_handshake();
    assert!(matches!(
        result,
        Err(ExchangeError::NoCandidateMatched { candidates }) if candidates == [ValueRequest::NAME]
    ));
}

#[test]
fn test_handshake_aborts_on_broken_channel() {
    // nothing ever published: the drained loopback reports a dead channel
    let (mut controller, _peer_tx, _peer_rx) = open_controller();

    let result = controller.run_handshake();
    assert!(matches!(result, Err(ExchangeError::Transport { .. })));
}

#[test]
fn test_setup_fails_on_unopenable_channel() {
    let (ctl_tx, _peer_rx) = LoopbackTransport::pair();
    let (_peer_tx, mut ctl_rx) = LoopbackTransport::pair();

    // pre-opened rx: the controller's own open must fail and abort startup
    ctl_rx.open(TransportMode::Read).unwrap();

    let result = ExchangeController::open(
        ctl_tx,
        ctl_rx,
        TaggedCodec::with_catalog(),
        &test_config(),
    );
    assert!(matches!(
        result,
        Err(ExchangeError::TransportOpen {
            operation: "open rx",
            ..
        })
    ));
}
