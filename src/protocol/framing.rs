//! # Framing Helpers
//!
//! `send`, `receive`, and `receive_any` (the primitives the controller
//! drives the exchange with) plus the caller-owned [`FrameBuffer`] they
//! encode and decode through.
//!
//! The buffer is owned by the caller and reused across calls at the caller's
//! discretion: it is fully cleared before each encode and resized/truncated
//! around each receive, so no bytes ever leak from one frame into the next.
//! Nothing here retains frame contents after the decode outcome is known.

use thiserror::Error;
use tracing::{debug, error};

use crate::core::codec::{CodecError, WireCodec};
use crate::core::message::Message;
use crate::transport::{Transport, TransportError};

/// Reusable encode/decode buffer, owned by the caller.
///
/// One buffer must not be shared across concurrently running send and
/// receive paths; the synchronous controller owns exactly one.
#[derive(Default)]
pub struct FrameBuffer {
    bytes: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last frame's bytes (what was just encoded or received).
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

/// Send failure, with the failing stage distinguishable for diagnostics.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("encode failed: {0}")]
    Encode(#[from] CodecError),

    #[error("publish failed: {0}")]
    Publish(#[from] TransportError),
}

/// Receive failure, with the failing stage distinguishable for diagnostics.
#[derive(Error, Debug)]
pub enum ReceiveError {
    #[error("transport receive failed: {0}")]
    Transport(#[from] TransportError),

    #[error("frame did not decode as {type_name}")]
    Decode { type_name: &'static str },
}

/// Encode `message` into `buf` and publish it on its derived topic.
pub fn send(
    message: &dyn Message,
    channel: &mut dyn Transport,
    codec: &dyn WireCodec,
    namespace: &str,
    buf: &mut FrameBuffer,
) -> Result<(), SendError> {
    let type_name = message.type_name();

    buf.bytes.clear();
    codec.serialize(message, &mut buf.bytes).map_err(|e| {
        error!(type_name, error = %e, "Failed to serialize message");
        SendError::Encode(e)
    })?;

    let topic = message.topic(namespace);
    channel.publish(&buf.bytes, &topic).map_err(|e| {
        error!(type_name, %topic, error = %e, "Failed to publish message");
        SendError::Publish(e)
    })?;

    debug!(type_name, %topic, bytes = buf.bytes.len(), "Sent message");
    Ok(())
}

/// Block for one frame and decode it as the concrete type behind `message`.
pub fn receive(
    message: &mut dyn Message,
    channel: &mut dyn Transport,
    codec: &dyn WireCodec,
    buf: &mut FrameBuffer,
) -> Result<(), ReceiveError> {
    let type_name = message.type_name();

    recv_frame(channel, buf).map_err(|e| {
        error!(type_name, error = %e, "Failed to receive bytes");
        ReceiveError::Transport(e)
    })?;
    debug!(type_name, bytes = buf.bytes.len(), "Received frame");

    if codec.deserialize(&buf.bytes, message) {
        debug!(type_name, "Deserialized message");
        Ok(())
    } else {
        error!(type_name, "Failed to deserialize frame");
        Err(ReceiveError::Decode { type_name })
    }
}

/// Block for one frame and decode it against each candidate in order.
///
/// Returns the index of the first candidate that decodes the frame, `None`
/// if no candidate matches. Decode attempts stop at the first match. At most
/// one candidate can match a frame; if two candidates' shapes ever
/// overlapped, only first-in-order-wins is defined.
///
/// An empty candidate set is a no-match without touching the transport.
pub fn receive_any(
    candidates: &mut [&mut dyn Message],
    channel: &mut dyn Transport,
    codec: &dyn WireCodec,
    buf: &mut FrameBuffer,
) -> Result<Option<usize>, TransportError> {
    if candidates.is_empty() {
        return Ok(None);
    }

    recv_frame(channel, buf).map_err(|e| {
        error!(error = %e, "Failed to receive bytes for candidate set");
        e
    })?;

    for (index, candidate) in candidates.iter_mut().enumerate() {
        if codec.deserialize(&buf.bytes, &mut **candidate) {
            debug!(
                type_name = candidate.type_name(),
                index, "Deserialized candidate"
            );
            return Ok(Some(index));
        }
    }

    debug!(bytes = buf.bytes.len(), "Frame matched no candidate");
    Ok(None)
}

/// Receive one frame into `buf`: size to capacity, receive, truncate to the
/// delivered length.
fn recv_frame(channel: &mut dyn Transport, buf: &mut FrameBuffer) -> Result<(), TransportError> {
    buf.bytes.resize(channel.max_receive_size(), 0);
    let count = channel.recv(&mut buf.bytes)?;
    buf.bytes.truncate(count);
    Ok(())
}
