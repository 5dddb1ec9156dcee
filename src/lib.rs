//! # Exchange Protocol
//!
//! Point-to-point message-exchange protocol core for pub/sub transports.
//!
//! One party emits a typed request, the counterpart recognizes which of
//! several expected message variants arrived, and the two proceed through a
//! short fixed sequence of typed exchanges: a one-shot handshake, then a
//! steady-state send/receive loop. This crate is that exchange logic: what
//! to send, what to wait for, how to disambiguate among acceptable incoming
//! shapes, and how to react to transport or serialization failures.
//!
//! The concrete transport and wire serializer sit behind narrow traits
//! ([`transport::Transport`], [`core::codec::WireCodec`]); reference
//! implementations (an in-memory loopback pair and a tagged binary codec)
//! make the core runnable end to end with no external infrastructure.
//!
//! ## Components
//! - **Catalog** ([`core::message`]): the closed message set with stable,
//!   topic-deriving type names
//! - **Registry** ([`core::registry`]): type tag → constructor map
//! - **Codec** ([`core::codec`]): the serializer seam
//! - **Transport** ([`transport`]): the pub/sub channel seam
//! - **Framing** ([`protocol::framing`]): send/receive/receive-any over a
//!   caller-owned buffer
//! - **Controller** ([`protocol::controller`]): handshake and steady-state
//!   loop
//!
//! ## Example
//! ```rust
//! use exchange_protocol::config::ExchangeConfig;
//! use exchange_protocol::core::codec::TaggedCodec;
//! use exchange_protocol::core::message::{MaybeNum, ValueRequest};
//! use exchange_protocol::protocol::framing::{send, FrameBuffer};
//! use exchange_protocol::transport::{LoopbackTransport, Transport, TransportMode};
//!
//! let config = ExchangeConfig::default();
//! let (mut tx, mut rx) = LoopbackTransport::pair();
//! tx.open(TransportMode::Write).unwrap();
//! rx.open(TransportMode::Read).unwrap();
//! rx.subscribe("messages.ValueRequest").unwrap();
//!
//! let codec = TaggedCodec::with_catalog();
//! let mut buf = FrameBuffer::new();
//! let request = ValueRequest { num: MaybeNum::set(1.0) };
//! send(&request, &mut tx, &codec, &config.protocol.topic_namespace, &mut buf).unwrap();
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod utils;

pub use config::ExchangeConfig;
pub use error::{ExchangeError, Result};
pub use protocol::controller::{ExchangeController, HandshakeOutcome};
pub use protocol::framing::FrameBuffer;
