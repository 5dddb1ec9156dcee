//! # Timing Constants
//!
//! Delays around channel setup. None of these are protocol timeouts: the
//! core blocks indefinitely on receive. They only pace the startup sequence
//! while the underlying transport finishes connecting.

use std::time::Duration;

/// Default settle delay after opening and subscribing the channel pair,
/// before the first exchange.
pub const STARTUP_DELAY: Duration = Duration::from_millis(10);
