//! # Loopback Transport
//!
//! In-memory connected channel pair implementing the [`Transport`] contract.
//!
//! This is the reference transport: it lets the protocol core run end to end
//! in tests and local setups without any external infrastructure. Frames
//! published on one endpoint are queued for the other; `recv` pops the next
//! frame whose topic matches a subscription, discarding frames nobody
//! subscribed to. Subscriptions are prefix-matched, like the pub/sub
//! primitives this stands in for.
//!
//! A drained inbox reports [`TransportError::Closed`]: in the synchronous
//! single-threaded model there is no one left to publish, which is the
//! loopback equivalent of a broken channel.

use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::transport::{option_keys, Transport, TransportError, TransportMode};

/// Largest frame a loopback `recv` call delivers.
const MAX_RECEIVE_SIZE: usize = 64 * 1024;

type Inbox = Arc<Mutex<VecDeque<(String, Bytes)>>>;

/// One endpoint of an in-memory channel pair.
pub struct LoopbackTransport {
    mode: Option<TransportMode>,
    options: HashMap<String, String>,
    subscriptions: Vec<String>,
    /// Frames the peer published to us.
    inbox: Inbox,
    /// Frames we publish, queued for the peer.
    peer: Inbox,
}

impl LoopbackTransport {
    /// Create a connected pair. Publishing on either endpoint queues the
    /// frame for the other.
    pub fn pair() -> (Self, Self) {
        let left = Arc::new(Mutex::new(VecDeque::new()));
        let right = Arc::new(Mutex::new(VecDeque::new()));
        (
            Self::endpoint(Arc::clone(&left), Arc::clone(&right)),
            Self::endpoint(right, left),
        )
    }

    fn endpoint(inbox: Inbox, peer: Inbox) -> Self {
        Self {
            mode: None,
            options: HashMap::new(),
            subscriptions: Vec::new(),
            inbox,
            peer,
        }
    }

    /// The value an option was set to, if any. Mostly useful in tests.
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }

    /// Number of frames waiting in this endpoint's inbox, matched or not.
    pub fn pending(&self) -> usize {
        self.inbox.lock().map(|q| q.len()).unwrap_or(0)
    }

    fn is_subscribed(&self, topic: &str) -> bool {
        self.subscriptions
            .iter()
            .any(|prefix| topic.starts_with(prefix.as_str()))
    }
}

impl Transport for LoopbackTransport {
    fn open(&mut self, mode: TransportMode) -> Result<(), TransportError> {
        if self.mode.is_some() {
            return Err(TransportError::AlreadyOpen);
        }
        self.mode = Some(mode);
        Ok(())
    }

    fn set_option(&mut self, name: &str, value: &str) -> Result<(), TransportError> {
        match name {
            option_keys::PUBLISH_IP
            | option_keys::PUBLISH_PORT
            | option_keys::SUBSCRIBE_IP
            | option_keys::SUBSCRIBE_PORT
            | option_keys::IDENTITY => {
                self.options.insert(name.to_string(), value.to_string());
                Ok(())
            }
            _ => Err(TransportError::UnknownOption(name.to_string())),
        }
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        match self.mode {
            None => Err(TransportError::NotOpen),
            Some(mode) if !mode.is_read() => Err(TransportError::WrongMode(mode)),
            Some(_) => {
                self.subscriptions.push(topic.to_string());
                Ok(())
            }
        }
    }

    fn publish(&mut self, bytes: &[u8], topic: &str) -> Result<usize, TransportError> {
        match self.mode {
            None => Err(TransportError::NotOpen),
            Some(TransportMode::Write) => {
                let mut queue = self.peer.lock().map_err(|_| TransportError::Closed)?;
                queue.push_back((topic.to_string(), Bytes::copy_from_slice(bytes)));
                Ok(bytes.len())
            }
            Some(mode) => Err(TransportError::WrongMode(mode)),
        }
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        match self.mode {
            None => return Err(TransportError::NotOpen),
            Some(mode) if !mode.is_read() => return Err(TransportError::WrongMode(mode)),
            Some(_) => {}
        }

        loop {
            let next = {
                let mut queue = self.inbox.lock().map_err(|_| TransportError::Closed)?;
                queue.pop_front()
            };
            let Some((topic, frame)) = next else {
                return Err(TransportError::Closed);
            };

            if !self.is_subscribed(&topic) {
                debug!(%topic, "Discarding frame on unsubscribed topic");
                continue;
            }
            if frame.len() > buf.len() {
                return Err(TransportError::FrameTooLarge {
                    frame: frame.len(),
                    capacity: buf.len(),
                });
            }

            buf[..frame.len()].copy_from_slice(&frame);
            return Ok(frame.len());
        }
    }

    fn max_receive_size(&self) -> usize {
        MAX_RECEIVE_SIZE
    }

    fn close(&mut self) {
        self.mode = None;
        self.subscriptions.clear();
    }
}
