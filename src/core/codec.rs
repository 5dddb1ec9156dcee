//! # Wire Codec
//!
//! The [`WireCodec`] contract the protocol core consumes, and the reference
//! [`TaggedCodec`] implementation.
//!
//! The protocol layer doesn't care how bytes are made; it needs something
//! that can turn a catalog message into a frame and recognize, from raw
//! bytes, which registered type a frame carries. `deserialize` reports plain
//! success/failure: "this frame is not the type you asked for" is an
//! expected outcome during candidate disambiguation, not an error.
//!
//! ## Wire Format (reference codec)
//! ```text
//! [tag: length-prefixed type name] [payload: length-prefixed bytes]
//! ```
//! The tag is checked against the codec's [`TypeRegistry`] before any payload
//! decode is attempted, so a frame matches at most one registered type.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use thiserror::Error;
use tracing::debug;

use crate::core::message::Message;
use crate::core::registry::TypeRegistry;

/// Errors on the encode side of the codec.
///
/// Decode has no error channel: a frame that fails to parse as the requested
/// type is a no-match, reported as `false`.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Failed to encode {type_name}
    #[error("failed to encode {type_name}: {reason}")]
    Encode {
        type_name: &'static str,
        reason: String,
    },

    /// The message's type is not in the codec's registry.
    #[error("message type {0} is not registered")]
    UnregisteredType(&'static str),
}

/// Encodes and decodes catalog messages to and from frames.
pub trait WireCodec {
    /// Encode `message` into `out` (appended; callers clear the buffer).
    fn serialize(&self, message: &dyn Message, out: &mut Vec<u8>) -> Result<(), CodecError>;

    /// Attempt to parse `bytes` as the concrete type behind `message`.
    ///
    /// Returns `true` and populates `message` if the frame carries that
    /// type; returns `false`, leaving `message` untouched, if it carries a
    /// different type, an unknown type, or doesn't parse at all.
    fn deserialize(&self, bytes: &[u8], message: &mut dyn Message) -> bool;
}

#[derive(Serialize, Deserialize)]
struct TaggedFrame<'a> {
    #[serde(borrow)]
    tag: Cow<'a, str>,
    #[serde(borrow)]
    payload: Cow<'a, [u8]>,
}

/// Reference [`WireCodec`]: tag-before-payload envelope over the catalog's
/// binary layout, validated against a [`TypeRegistry`].
pub struct TaggedCodec {
    registry: TypeRegistry,
}

impl TaggedCodec {
    pub fn new(registry: TypeRegistry) -> Self {
        Self { registry }
    }

    /// A codec over the full built-in catalog.
    pub fn with_catalog() -> Self {
        Self::new(TypeRegistry::with_catalog())
    }

    /// Reconstruct whichever registered type a frame carries, from its wire
    /// tag alone. This is the polymorphic path: the caller learns the
    /// concrete type from the returned message's name.
    pub fn decode_any(&self, bytes: &[u8]) -> Option<Box<dyn Message>> {
        let frame: TaggedFrame = bincode::deserialize(bytes).ok()?;
        let mut message = self.registry.construct(&frame.tag)?;
        message.decode_payload(&frame.payload).then_some(message)
    }
}

impl Default for TaggedCodec {
    fn default() -> Self {
        Self::with_catalog()
    }
}

impl WireCodec for TaggedCodec {
    fn serialize(&self, message: &dyn Message, out: &mut Vec<u8>) -> Result<(), CodecError> {
        let type_name = message.type_name();
        if !self.registry.contains(type_name) {
            return Err(CodecError::UnregisteredType(type_name));
        }

        let mut payload = Vec::new();
        message.encode_payload(&mut payload)?;

        let frame = TaggedFrame {
            tag: Cow::Borrowed(type_name),
            payload: Cow::Owned(payload),
        };
        bincode::serialize_into(&mut *out, &frame).map_err(|e| CodecError::Encode {
            type_name,
            reason: e.to_string(),
        })
    }

    fn deserialize(&self, bytes: &[u8], message: &mut dyn Message) -> bool {
        let frame: TaggedFrame = match bincode::deserialize(bytes) {
            Ok(frame) => frame,
            Err(_) => {
                debug!(bytes = bytes.len(), "Frame is not a tagged envelope");
                return false;
            }
        };

        if !self.registry.contains(frame.tag.as_ref()) {
            debug!(tag = %frame.tag, "Unknown wire tag");
            return false;
        }
        if frame.tag != message.type_name() {
            // well-formed frame of a different type: a clean no-match
            return false;
        }

        message.decode_payload(&frame.payload)
    }
}
