// test-only module included via protocol/mod.rs
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::cell::Cell;

use crate::core::codec::{CodecError, TaggedCodec, WireCodec};
use crate::core::message::{MaybeNum, Message, ValueHolder, ValueReport, ValueRequest};
use crate::protocol::framing::{receive, receive_any, send, FrameBuffer, ReceiveError};
use crate::transport::{LoopbackTransport, Transport, TransportError, TransportMode};

const NS: &str = "messages";

fn open_pair() -> (LoopbackTransport, LoopbackTransport) {
    let (mut tx, mut rx) = LoopbackTransport::pair();
    tx.open(TransportMode::Write).unwrap();
    rx.open(TransportMode::Read).unwrap();
    rx.subscribe("messages.").unwrap();
    (tx, rx)
}

/// Wraps the reference codec and counts decode attempts, to observe the
/// short-circuit behavior of `receive_any`.
struct CountingCodec {
    inner: TaggedCodec,
    decode_calls: Cell<usize>,
}

impl CountingCodec {
    fn new() -> Self {
        Self {
            inner: TaggedCodec::with_catalog(),
            decode_calls: Cell::new(0),
        }
    }
}

impl WireCodec for CountingCodec {
    fn serialize(&self, message: &dyn Message, out: &mut Vec<u8>) -> Result<(), CodecError> {
        self.inner.serialize(message, out)
    }

    fn deserialize(&self, bytes: &[u8], message: &mut dyn Message) -> bool {
        self.decode_calls.set(self.decode_calls.get() + 1);
        self.inner.deserialize(bytes, message)
    }
}

#[test]
fn test_send_then_receive_roundtrip() {
    let codec = TaggedCodec::with_catalog();
    let (mut tx, mut rx) = open_pair();
    let mut buf = FrameBuffer::new();

    let outbound = ValueRequest {
        num: MaybeNum::set(3.0),
    };
    send(&outbound, &mut tx, &codec, NS, &mut buf).expect("send");

    let mut inbound = ValueRequest::default();
    receive(&mut inbound, &mut rx, &codec, &mut buf).expect("receive");
    assert_eq!(inbound, outbound);
}

#[test]
fn test_receive_rejects_frame_of_wrong_type() {
    let codec = TaggedCodec::with_catalog();
    let (mut tx, mut rx) = open_pair();
    let mut buf = FrameBuffer::new();

    send(&ValueReport::default(), &mut tx, &codec, NS, &mut buf).expect("send");

    let mut inbound = ValueRequest::default();
    let result = receive(&mut inbound, &mut rx, &codec, &mut buf);
    assert!(matches!(
        &result,
        Err(ReceiveError::Decode { type_name }) if *type_name == ValueRequest::NAME
    ));
}

#[test]
fn test_receive_any_empty_set_never_touches_transport() {
    let codec = TaggedCodec::with_catalog();
    // A drained channel: any recv would fail, so Ok(None) proves the
    // transport was never asked.
    let (_tx, mut rx) = open_pair();
    let mut buf = FrameBuffer::new();

    let mut candidates: [&mut dyn Message; 0] = [];
    let matched = receive_any(&mut candidates, &mut rx, &codec, &mut buf).expect("no transport use");
    assert_eq!(matched, None);
}

#[test]
fn test_receive_any_picks_the_matching_candidate() {
    let codec = TaggedCodec::with_catalog();
    let (mut tx, mut rx) = open_pair();
    let mut buf = FrameBuffer::new();

    // frame carries a ValueReport; candidate order is [request, report]
    send(&ValueReport::default(), &mut tx, &codec, NS, &mut buf).expect("send");

    let mut request = ValueRequest::default();
    let mut report = ValueReport::default();
    let mut candidates: [&mut dyn Message; 2] = [&mut request, &mut report];
    let matched = receive_any(&mut candidates, &mut rx, &codec, &mut buf).expect("receive");
    assert_eq!(matched, Some(1));
}

#[test]
fn test_receive_any_short_circuits_after_first_match() {
    let codec = CountingCodec::new();
    let (mut tx, mut rx) = open_pair();
    let mut buf = FrameBuffer::new();

    send(&ValueRequest::default(), &mut tx, &codec, NS, &mut buf).expect("send");

    let mut request = ValueRequest::default();
    let mut report = ValueReport::default();
    let mut candidates: [&mut dyn Message; 2] = [&mut request, &mut report];
    let matched = receive_any(&mut candidates, &mut rx, &codec, &mut buf).expect("receive");

    assert_eq!(matched, Some(0));
    // the first candidate matched; the second was never attempted
    assert_eq!(codec.decode_calls.get(), 1);
}

#[test]
fn test_receive_any_reports_no_match() {
    let codec = TaggedCodec::with_catalog();
    let (mut tx, mut rx) = open_pair();
    let mut buf = FrameBuffer::new();

    // a registered type that is not in the candidate set
    send(&ValueHolder::default(), &mut tx, &codec, NS, &mut buf).expect("send");

    let mut request = ValueRequest::default();
    let mut candidates: [&mut dyn Message; 1] = [&mut request];
    let matched = receive_any(&mut candidates, &mut rx, &codec, &mut buf).expect("receive");
    assert_eq!(matched, None);
}

#[test]
fn test_receive_any_surfaces_transport_failure() {
    let codec = TaggedCodec::with_catalog();
    let (_tx, mut rx) = open_pair();
    let mut buf = FrameBuffer::new();

    let mut request = ValueRequest::default();
    let mut candidates: [&mut dyn Message; 1] = [&mut request];
    let result = receive_any(&mut candidates, &mut rx, &codec, &mut buf);
    assert!(matches!(result, Err(TransportError::Closed)));
}

#[test]
fn test_buffer_is_reset_between_sends() {
    let codec = TaggedCodec::with_catalog();
    let (mut tx, mut rx) = open_pair();
    let mut buf = FrameBuffer::new();

    // larger frame first, then a smaller one through the same buffer
    let large = ValueReport {
        holder: Some(Box::new(ValueHolder {
            num: MaybeNum::set(8.0),
        })),
    };
    let small = ValueRequest::default();

    send(&large, &mut tx, &codec, NS, &mut buf).expect("send large");
    send(&small, &mut tx, &codec, NS, &mut buf).expect("send small");

    // both published frames must be byte-identical to fresh encodes: a
    // buffer that appended instead of resetting would leak the first
    // frame's bytes into the second
    let mut expected_large = Vec::new();
    codec.serialize(&large, &mut expected_large).expect("encode");
    let mut expected_small = Vec::new();
    codec.serialize(&small, &mut expected_small).expect("encode");

    let mut frame = vec![0u8; rx.max_receive_size()];
    let first = rx.recv(&mut frame).expect("first frame");
    assert_eq!(&frame[..first], expected_large.as_slice());

    let second = rx.recv(&mut frame).expect("second frame");
    assert_eq!(&frame[..second], expected_small.as_slice());
}
