//! # Error Types
//!
//! Error handling for the exchange protocol.
//!
//! This module defines the failure taxonomy of the protocol core, from
//! channel-setup problems to mid-exchange transport and decode failures.
//!
//! ## Error Categories
//! - **Startup Errors**: channel configuration, open, and subscribe failures
//! - **Handshake Errors**: blocking-receive failures and unmatched frames
//! - **Exchange Errors**: send/receive failures during the steady-state loop
//!
//! None of these are retried automatically and none are swallowed: every
//! failure path produces a diagnostic naming the failing operation and the
//! message type involved before the error is surfaced to the caller.
//!
//! All errors implement `std::error::Error` for interoperability.

use thiserror::Error;

use crate::protocol::framing::{ReceiveError, SendError};
use crate::transport::TransportError;

/// Error message constants to reduce allocations in error paths.
/// Static strings are borrowed, avoiding heap allocations for common error cases.
pub mod constants {
    /// Channel setup errors
    pub const ERR_OPEN_TX: &str = "Failed to open publish channel";
    pub const ERR_OPEN_RX: &str = "Failed to open subscribe channel";
    pub const ERR_SUBSCRIBE: &str = "Failed to subscribe to inbound topic";

    /// Handshake errors
    pub const ERR_NO_CANDIDATE: &str = "Failed to receive a proper message to start any sequence";
    pub const ERR_HANDSHAKE_RECV: &str = "Transport failed while waiting for the opening message";

    /// Steady-state loop errors
    pub const ERR_LOOP_RECV: &str = "Receive failed; the exchange can no longer make progress";

    /// Configuration errors
    pub const ERR_PORTS_NO_COMMA: &str = "Unexpected lack of comma in PORTS value";
}

/// Primary error type for all exchange operations.
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// Channel configuration, open, or subscribe failed during startup. Fatal.
    #[error("transport open failed during {operation}: {source}")]
    TransportOpen {
        operation: &'static str,
        #[source]
        source: TransportError,
    },

    /// The transport broke underneath a blocking receive in the handshake. Fatal.
    #[error("transport failure while waiting for {type_name}: {source}")]
    Transport {
        type_name: &'static str,
        #[source]
        source: TransportError,
    },

    /// A frame arrived during the handshake but no candidate type decoded it. Fatal.
    #[error("no candidate matched the received frame (candidates: {candidates:?})")]
    NoCandidateMatched { candidates: Vec<&'static str> },

    /// Encode or publish failed. Fatal in the handshake; logged and skipped
    /// in the steady-state loop.
    #[error("failed to send {type_name}: {source}")]
    Send {
        type_name: &'static str,
        #[source]
        source: SendError,
    },

    /// Receive or decode failed in the steady-state loop. Fatal.
    #[error("failed to receive {type_name}: {source}")]
    Receive {
        type_name: &'static str,
        #[source]
        source: ReceiveError,
    },

    /// Configuration loading or validation failed.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Type alias for Results using ExchangeError
pub type Result<T> = std::result::Result<T, ExchangeError>;
