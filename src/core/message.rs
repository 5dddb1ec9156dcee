//! # Message Catalog
//!
//! The closed set of message types the exchange protocol trades, plus the
//! [`Message`] trait that gives each of them a stable wire identity.
//!
//! Each catalog type carries a maybe-numeric payload ([`MaybeNum`]): a
//! numeric field paired with a flag that says whether the field is set.
//! [`ValueReport`] additionally embeds a [`ValueHolder`] by exclusively-owned
//! handle (composed, not inherited): built by the sender and discarded after
//! encoding.
//!
//! Type names double as routing keys: the topic a message is published on is
//! derived from its name via [`topic_for`], so every type has exactly one
//! topic.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;

use crate::core::codec::CodecError;

/// Derive the pub/sub topic for a message type name.
///
/// The convention is fixed: `<namespace>.<TypeName>`. Publishing on any other
/// topic makes the message unreceivable by a correctly-subscribed peer.
pub fn topic_for(namespace: &str, type_name: &str) -> String {
    format!("{namespace}.{type_name}")
}

/// A member of the message catalog.
///
/// Implementations pair a stable type name (the wire tag and topic key) with
/// payload encode/decode over the catalog's binary layout. Decode
/// either fully replaces the value or leaves it untouched; a message being
/// populated must not be read until decode reports success.
pub trait Message: fmt::Debug + Send {
    /// Stable type name; used for the wire tag and for topic derivation.
    fn type_name(&self) -> &'static str;

    /// The topic this message publishes on under `namespace`.
    fn topic(&self, namespace: &str) -> String {
        topic_for(namespace, self.type_name())
    }

    /// Encode the payload into `out` (appended, not replacing).
    fn encode_payload(&self, out: &mut Vec<u8>) -> Result<(), CodecError>;

    /// Attempt to decode `bytes` as this concrete type. On success the value
    /// is replaced wholesale; on failure it is left untouched.
    fn decode_payload(&mut self, bytes: &[u8]) -> bool;

    /// Upcast for callers that hold a `Box<dyn Message>` from the registry.
    fn as_any(&self) -> &dyn Any;
}

/// A numeric field plus a flag that says whether the field holds a value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct MaybeNum {
    value: f64,
    valid: bool,
}

impl MaybeNum {
    /// A set value.
    pub fn set(value: f64) -> Self {
        Self { value, valid: true }
    }

    /// The unset value (the default).
    pub fn unset() -> Self {
        Self::default()
    }

    /// The value, if set.
    pub fn get(&self) -> Option<f64> {
        self.valid.then_some(self.value)
    }

    pub fn is_set(&self) -> bool {
        self.valid
    }
}

/// Opening request of the handshake; also the steady-state outbound message.
///
/// The payload is not inspected by the protocol: the reply is a fixed
/// acknowledgment regardless of what the request carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ValueRequest {
    pub num: MaybeNum,
}

impl ValueRequest {
    pub const NAME: &'static str = "ValueRequest";
}

impl Message for ValueRequest {
    fn type_name(&self) -> &'static str {
        Self::NAME
    }

    fn encode_payload(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        encode_with(Self::NAME, self, out)
    }

    fn decode_payload(&mut self, bytes: &[u8]) -> bool {
        decode_into(self, bytes)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Nested maybe-numeric holder, embedded by [`ValueReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ValueHolder {
    pub num: MaybeNum,
}

impl ValueHolder {
    pub const NAME: &'static str = "ValueHolder";
}

impl Message for ValueHolder {
    fn type_name(&self) -> &'static str {
        Self::NAME
    }

    fn encode_payload(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        encode_with(Self::NAME, self, out)
    }

    fn decode_payload(&mut self, bytes: &[u8]) -> bool {
        decode_into(self, bytes)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Handshake reply and steady-state inbound message.
///
/// Embeds at most one [`ValueHolder`]: built by the sender, owned
/// exclusively through the `Box`, dropped once the report is encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ValueReport {
    pub holder: Option<Box<ValueHolder>>,
}

impl ValueReport {
    pub const NAME: &'static str = "ValueReport";

    /// The holder's value, if a holder is embedded and its value is set.
    pub fn value(&self) -> Option<f64> {
        self.holder.as_ref().and_then(|h| h.num.get())
    }
}

impl Message for ValueReport {
    fn type_name(&self) -> &'static str {
        Self::NAME
    }

    fn encode_payload(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        encode_with(Self::NAME, self, out)
    }

    fn decode_payload(&mut self, bytes: &[u8]) -> bool {
        decode_into(self, bytes)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn encode_with<M: Serialize>(
    type_name: &'static str,
    message: &M,
    out: &mut Vec<u8>,
) -> Result<(), CodecError> {
    bincode::serialize_into(&mut *out, message).map_err(|e| CodecError::Encode {
        type_name,
        reason: e.to_string(),
    })
}

fn decode_into<M: for<'de> Deserialize<'de>>(message: &mut M, bytes: &[u8]) -> bool {
    match bincode::deserialize(bytes) {
        Ok(decoded) => {
            *message = decoded;
            true
        }
        Err(_) => false,
    }
}
