//! # Protocol Layer
//!
//! The exchange logic itself: framing helpers over a caller-owned buffer,
//! and the controller that drives the handshake phase and the steady-state
//! loop.
//!
//! ## Components
//! - **Framing**: `send` / `receive` / `receive_any` and the
//!   candidate-disambiguation primitive
//! - **Controller**: channel setup, handshake, steady-state loop,
//!   fatal/non-fatal failure policy
//!
//! ## Exchange Shape
//! ```text
//! peer                    controller
//!   | -- ValueRequest  -->  |   handshake: recv, disambiguate, reply
//!   | <-- ValueReport  ---  |
//!   | <-- ValueRequest ---  |   steady state: send, then block for the
//!   | --- ValueReport  -->  |   report, forever or until receive fails
//! ```

pub mod controller;
pub mod framing;

#[cfg(test)]
mod tests;
