//! # Transport Channel
//!
//! The narrow pub/sub transport contract the protocol core rides on, and a
//! loopback reference implementation.
//!
//! A channel is opened in a single mode (read, write, or read with local
//! loopback), configured through string key/value options, and then used for
//! topic-scoped publishing or blocking, size-bounded receiving. The core
//! assumes the channel is reliable-enough once opened: there is no reconnect
//! or backoff here.
//!
//! Delivery guarantees, socket management, and proxy behavior belong to the
//! implementation behind the trait; the core only sees this contract.

use thiserror::Error;

pub mod loopback;

pub use loopback::LoopbackTransport;

/// Mode a channel is opened in. One channel, one mode, for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Subscribe-and-receive side.
    Read,
    /// Publish side.
    Write,
    /// Subscribe-and-receive side, bypassing any broker/proxy and listening
    /// locally.
    ReadLoopback,
}

impl TransportMode {
    /// Whether a channel opened in this mode may subscribe and receive.
    pub fn is_read(self) -> bool {
        matches!(self, TransportMode::Read | TransportMode::ReadLoopback)
    }
}

/// Option keys every transport implementation recognizes.
pub mod option_keys {
    /// Host the publish side connects to.
    pub const PUBLISH_IP: &str = "PublishIP";
    /// Port the publish side connects to.
    pub const PUBLISH_PORT: &str = "PublishPort";
    /// Host the subscribe side connects to.
    pub const SUBSCRIBE_IP: &str = "SubscribeIP";
    /// Port the subscribe side connects to.
    pub const SUBSCRIBE_PORT: &str = "SubscribePort";
    /// Identity tag attached to the channel, for diagnostics on the far side.
    pub const IDENTITY: &str = "Identity";
}

/// Transport-layer failures.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("channel is not open")]
    NotOpen,

    #[error("channel is already open")]
    AlreadyOpen,

    #[error("operation not permitted in {0:?} mode")]
    WrongMode(TransportMode),

    #[error("unrecognized option: {0}")]
    UnknownOption(String),

    #[error("channel closed")]
    Closed,

    #[error("frame of {frame} bytes exceeds receive capacity of {capacity}")]
    FrameTooLarge { frame: usize, capacity: usize },

    #[error("publish failed: {0}")]
    Publish(String),

    #[error("receive failed: {0}")]
    Recv(String),
}

/// The pub/sub channel contract consumed by the protocol core.
pub trait Transport {
    /// Open the channel in `mode`. Options must be applied beforehand.
    fn open(&mut self, mode: TransportMode) -> Result<(), TransportError>;

    /// Set a configuration option. See [`option_keys`] for recognized keys.
    fn set_option(&mut self, name: &str, value: &str) -> Result<(), TransportError>;

    /// Register interest in a topic (prefix-matched). Must be called after
    /// open and before the first receive.
    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError>;

    /// Publish one frame on `topic`. Returns the number of bytes published.
    fn publish(&mut self, bytes: &[u8], topic: &str) -> Result<usize, TransportError>;

    /// Receive one frame into `buf`, blocking until a frame arrives or the
    /// channel fails. Returns the frame length.
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Largest frame a single `recv` call can deliver.
    fn max_receive_size(&self) -> usize;

    /// Close the channel. Further operations fail with
    /// [`TransportError::NotOpen`].
    fn close(&mut self);
}
