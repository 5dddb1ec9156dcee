//! # Exchange Controller
//!
//! Orchestrates the exchange: channel setup, the one-shot handshake phase,
//! and the steady-state send/receive loop.
//!
//! The controller exclusively owns both channel handles and the single
//! encode/decode buffer for the lifetime of the exchange: the whole thing
//! is synchronous and single-threaded, and every receive blocks until the
//! transport delivers a frame or fails. There are no timeouts and no retries
//! in here: failure policy is decided per call site (see `run_loop` for the
//! one deliberate asymmetry), and the only delay anywhere is the
//! configurable post-open settle pause.

use std::thread;
use tracing::{debug, error, info, warn};

use crate::config::ExchangeConfig;
use crate::core::codec::WireCodec;
use crate::core::message::{
    topic_for, MaybeNum, Message, ValueHolder, ValueReport, ValueRequest,
};
use crate::error::{constants, ExchangeError, Result};
use crate::protocol::framing::{receive, receive_any, send, FrameBuffer};
use crate::transport::{option_keys, Transport, TransportMode};

/// Value carried by the handshake reply. Protocol-defined: the reply is a
/// fixed acknowledgment and takes nothing from the inbound request.
const REPLY_VALUE: f64 = 1.0;

/// Which protocol branch the handshake established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeOutcome {
    /// The peer opened with a [`ValueRequest`]; the acknowledging
    /// [`ValueReport`] was published.
    ValueRequested,
}

/// Drives the two-party exchange over a pair of channels.
pub struct ExchangeController<T: Transport, C: WireCodec> {
    tx: T,
    rx: T,
    codec: C,
    buf: FrameBuffer,
    namespace: String,
}

impl<T: Transport, C: WireCodec> ExchangeController<T, C> {
    /// Configure and open both channels, subscribe to the inbound topics,
    /// and wait out the transport's connection settle time.
    ///
    /// # Errors
    /// Any option, open, or subscribe failure is fatal and reported as
    /// [`ExchangeError::TransportOpen`]; there is no defined recovery from a
    /// channel that cannot be set up.
    pub fn open(mut tx: T, mut rx: T, codec: C, config: &ExchangeConfig) -> Result<Self> {
        let channel = &config.channel;

        set_channel_option(&mut tx, option_keys::PUBLISH_IP, &channel.publish_ip)?;
        set_channel_option(
            &mut tx,
            option_keys::PUBLISH_PORT,
            &channel.publish_port.to_string(),
        )?;
        set_channel_option(&mut rx, option_keys::SUBSCRIBE_IP, &channel.subscribe_ip)?;
        set_channel_option(
            &mut rx,
            option_keys::SUBSCRIBE_PORT,
            &channel.subscribe_port.to_string(),
        )?;
        if let Some(identity) = &channel.identity {
            set_channel_option(&mut tx, option_keys::IDENTITY, identity)?;
            set_channel_option(&mut rx, option_keys::IDENTITY, identity)?;
        }

        tx.open(TransportMode::Write).map_err(|source| {
            error!(error = %source, "{}", constants::ERR_OPEN_TX);
            ExchangeError::TransportOpen {
                operation: "open tx",
                source,
            }
        })?;
        info!("Opened tx channel");

        let rx_mode = if channel.local_loopback {
            TransportMode::ReadLoopback
        } else {
            TransportMode::Read
        };
        rx.open(rx_mode).map_err(|source| {
            error!(error = %source, "{}", constants::ERR_OPEN_RX);
            ExchangeError::TransportOpen {
                operation: "open rx",
                source,
            }
        })?;
        info!("Opened rx channel");

        let namespace = config.protocol.topic_namespace.clone();
        for type_name in [ValueRequest::NAME, ValueReport::NAME] {
            let topic = topic_for(&namespace, type_name);
            rx.subscribe(&topic).map_err(|source| {
                error!(%topic, error = %source, "{}", constants::ERR_SUBSCRIBE);
                ExchangeError::TransportOpen {
                    operation: "subscribe",
                    source,
                }
            })?;
            debug!(%topic, "Subscribed");
        }

        // Give the transport time to finish connecting before the first
        // exchange. Settle time, not a protocol timeout.
        if !config.protocol.startup_delay.is_zero() {
            thread::sleep(config.protocol.startup_delay);
        }

        Ok(Self {
            tx,
            rx,
            codec,
            buf: FrameBuffer::new(),
            namespace,
        })
    }

    /// Run the one-shot handshake: block for the opening message,
    /// disambiguate it against the candidate set, and answer the matched
    /// branch with its fixed reply.
    ///
    /// # Errors
    /// All handshake failures are fatal and none are retried: a broken
    /// channel is [`ExchangeError::Transport`], an unmatched first frame is
    /// [`ExchangeError::NoCandidateMatched`], and a failed reply is
    /// [`ExchangeError::Send`].
    pub fn run_handshake(&mut self) -> Result<HandshakeOutcome> {
        info!("Waiting for first message");

        let mut request = ValueRequest::default();
        let mut candidates: [&mut dyn Message; 1] = [&mut request];
        let matched = receive_any(&mut candidates, &mut self.rx, &self.codec, &mut self.buf)
            .map_err(|source| {
                error!(error = %source, "{}", constants::ERR_HANDSHAKE_RECV);
                ExchangeError::Transport {
                    type_name: ValueRequest::NAME,
                    source,
                }
            })?;

        match matched {
            Some(0) => {
                info!(type_name = ValueRequest::NAME, "Received opening request");

                let reply = handshake_reply();
                send(
                    &reply,
                    &mut self.tx,
                    &self.codec,
                    &self.namespace,
                    &mut self.buf,
                )
                .map_err(|source| ExchangeError::Send {
                    type_name: ValueReport::NAME,
                    source,
                })?;
                info!(type_name = ValueReport::NAME, "Sent handshake reply");

                Ok(HandshakeOutcome::ValueRequested)
            }
            _ => {
                error!("{}", constants::ERR_NO_CANDIDATE);
                Err(ExchangeError::NoCandidateMatched {
                    candidates: vec![ValueRequest::NAME],
                })
            }
        }
    }

    /// Run the steady-state loop: each iteration publishes a fresh request
    /// and blocks for one report. Never returns on success; the returned
    /// value is the first fatal failure.
    ///
    /// Send and receive are deliberately asymmetric: the outbound side has
    /// no acknowledgment dependency, so a failed send is logged and the
    /// iteration proceeds to the receive; a failed receive means the
    /// exchange can no longer make progress and terminates the loop.
    pub fn run_loop(&mut self) -> ExchangeError {
        loop {
            // Fresh instance every iteration; no payload carries over.
            let request = ValueRequest::default();
            if let Err(source) = send(
                &request,
                &mut self.tx,
                &self.codec,
                &self.namespace,
                &mut self.buf,
            ) {
                warn!(
                    type_name = ValueRequest::NAME,
                    error = %source,
                    "Send failed; continuing to receive"
                );
            }

            let mut report = ValueReport::default();
            if let Err(source) = receive(&mut report, &mut self.rx, &self.codec, &mut self.buf) {
                error!(error = %source, "{}", constants::ERR_LOOP_RECV);
                return ExchangeError::Receive {
                    type_name: ValueReport::NAME,
                    source,
                };
            }
            debug!(value = ?report.value(), "Exchange iteration complete");
        }
    }

    /// Close both channels.
    pub fn close(mut self) {
        self.tx.close();
        self.rx.close();
    }
}

fn handshake_reply() -> ValueReport {
    ValueReport {
        holder: Some(Box::new(ValueHolder {
            num: MaybeNum::set(REPLY_VALUE),
        })),
    }
}

fn set_channel_option<T: Transport>(
    channel: &mut T,
    name: &'static str,
    value: &str,
) -> Result<()> {
    channel
        .set_option(name, value)
        .map_err(|source| ExchangeError::TransportOpen {
            operation: name,
            source,
        })
}
