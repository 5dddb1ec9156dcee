//! # Core Protocol Components
//!
//! The message catalog, the type registry, and the wire codec seam.
//!
//! This module provides the data layer of the exchange: what the messages
//! are, how they are identified on the wire, and how they are turned into
//! and recovered from frames.
//!
//! ## Components
//! - **Message**: catalog types with stable names and maybe-numeric payloads
//! - **Registry**: type tag → constructor map, the codec's capability set
//! - **Codec**: the [`codec::WireCodec`] contract plus the reference
//!   tagged-envelope implementation
//!
//! ## Wire Format (reference codec)
//! ```text
//! [tag: type name] [payload: catalog binary layout]
//! ```

pub mod codec;
pub mod message;
pub mod registry;
