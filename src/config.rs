//! # Configuration Management
//!
//! Centralized configuration for the exchange protocol library.
//!
//! This module provides structured configuration for the channel pair and
//! the protocol surface around it: endpoints, identity, topic namespace,
//! and the post-open settle delay.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Environment variables via `from_env()`
//! - Positional argument overrides via `apply_args()` (args win over env)
//! - Direct instantiation with defaults
//!
//! Channel setup consumes this; the protocol core itself never reads the
//! environment or the command line.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{warn, Level};

use crate::error::{constants, ExchangeError, Result};
use crate::utils::timeout;

/// Default host for both channel sides.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port the publish side connects to.
pub const DEFAULT_PUBLISH_PORT: u16 = 6667;

/// Default port the subscribe side connects to.
pub const DEFAULT_SUBSCRIBE_PORT: u16 = 6668;

/// Default topic namespace; topics are `<namespace>.<TypeName>`.
pub const DEFAULT_NAMESPACE: &str = "messages";

/// Environment variable naming the transport host.
pub const ENV_HOSTNAME: &str = "EXCHANGE_TRANSPORT_HOSTNAME";

/// Environment variable carrying `"<pub-port>,<sub-port>"`.
pub const ENV_PORTS: &str = "EXCHANGE_TRANSPORT_PORTS";

/// Main configuration structure for an exchange endpoint.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ExchangeConfig {
    /// Channel endpoint configuration
    #[serde(default)]
    pub channel: ChannelConfig,

    /// Protocol-surface configuration
    #[serde(default)]
    pub protocol: ProtocolConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ExchangeConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ExchangeError::Config(format!("Failed to read config file: {e}")))?;
        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ExchangeError::Config(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables, starting from defaults.
    ///
    /// `EXCHANGE_TRANSPORT_HOSTNAME` sets both channel hosts;
    /// `EXCHANGE_TRANSPORT_PORTS` is expected as `"<pub-port>,<sub-port>"`.
    /// Malformed values are diagnosed and the defaults kept.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var(ENV_HOSTNAME) {
            config.channel.publish_ip = host.clone();
            config.channel.subscribe_ip = host;
        }

        if let Ok(ports) = std::env::var(ENV_PORTS) {
            config.apply_ports(&ports);
        }

        config
    }

    /// Apply positional argument overrides: `[host] [sub-port] [pub-port]`.
    /// Arguments override whatever the environment set. `args[0]` is the
    /// program name, as handed to a conventional entry point.
    pub fn apply_args(&mut self, args: &[String]) {
        if let Some(host) = args.get(1) {
            self.channel.publish_ip = host.clone();
            self.channel.subscribe_ip = host.clone();
        }
        if let Some(port) = args.get(2) {
            match port.parse() {
                Ok(port) => self.channel.subscribe_port = port,
                Err(_) => warn!(value = %port, "Ignoring unparseable subscribe port argument"),
            }
        }
        if let Some(port) = args.get(3) {
            match port.parse() {
                Ok(port) => self.channel.publish_port = port,
                Err(_) => warn!(value = %port, "Ignoring unparseable publish port argument"),
            }
        }
    }

    /// Split a `"<pub-port>,<sub-port>"` pair. Publish port first: the pair
    /// is written from the proxy's point of view, reversed from ours.
    fn apply_ports(&mut self, ports: &str) {
        let Some((publish, subscribe)) = ports.split_once(',') else {
            warn!(value = %ports, "{}", constants::ERR_PORTS_NO_COMMA);
            return;
        };
        match publish.parse() {
            Ok(port) => self.channel.publish_port = port,
            Err(_) => warn!(value = %publish, "Ignoring unparseable publish port"),
        }
        match subscribe.parse() {
            Ok(port) => self.channel.subscribe_port = port,
            Err(_) => warn!(value = %subscribe, "Ignoring unparseable subscribe port"),
        }
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Validate the configuration for common issues and misconfigurations.
    ///
    /// Returns a list of validation errors. Empty list means the
    /// configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.channel.validate());
        errors.extend(self.protocol.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ExchangeError::Config(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Channel endpoint configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChannelConfig {
    /// Host the publish side connects to
    pub publish_ip: String,

    /// Port the publish side connects to
    pub publish_port: u16,

    /// Host the subscribe side connects to
    pub subscribe_ip: String,

    /// Port the subscribe side connects to
    pub subscribe_port: u16,

    /// Identity tag attached to both channels, if any
    pub identity: Option<String>,

    /// Open the subscribe side in local-loopback mode, bypassing any
    /// broker/proxy
    pub local_loopback: bool,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            publish_ip: String::from(DEFAULT_HOST),
            publish_port: DEFAULT_PUBLISH_PORT,
            subscribe_ip: String::from(DEFAULT_HOST),
            subscribe_port: DEFAULT_SUBSCRIBE_PORT,
            identity: None,
            local_loopback: false,
        }
    }
}

impl ChannelConfig {
    /// Validate channel configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.publish_ip.is_empty() {
            errors.push("Publish host cannot be empty".to_string());
        }
        if self.subscribe_ip.is_empty() {
            errors.push("Subscribe host cannot be empty".to_string());
        }

        if self.publish_port == 0 {
            errors.push("Publish port cannot be 0".to_string());
        }
        if self.subscribe_port == 0 {
            errors.push("Subscribe port cannot be 0".to_string());
        }

        if self.publish_port == self.subscribe_port && self.publish_ip == self.subscribe_ip {
            errors.push(format!(
                "Publish and subscribe sides both target {}:{} (the pair must differ)",
                self.publish_ip, self.publish_port
            ));
        }

        if let Some(identity) = &self.identity {
            if identity.is_empty() {
                errors.push("Identity tag cannot be empty when set".to_string());
            }
        }

        errors
    }
}

/// Protocol-surface configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProtocolConfig {
    /// Topic namespace; every message publishes on `<namespace>.<TypeName>`
    pub topic_namespace: String,

    /// Settle delay after opening the channels, before the first exchange.
    /// A transport-connection workaround, not a protocol timeout.
    #[serde(with = "duration_serde")]
    pub startup_delay: Duration,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            topic_namespace: String::from(DEFAULT_NAMESPACE),
            startup_delay: timeout::STARTUP_DELAY,
        }
    }
}

impl ProtocolConfig {
    /// Validate protocol configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.topic_namespace.is_empty() {
            errors.push("Topic namespace cannot be empty".to_string());
        } else if self.topic_namespace.ends_with('.') {
            errors.push(format!(
                "Topic namespace must not end with '.': '{}'",
                self.topic_namespace
            ));
        }

        if self.startup_delay.as_secs() > 10 {
            errors.push("Startup delay too long (maximum: 10s)".to_string());
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to log to console
    pub log_to_console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("exchange-protocol"),
            log_level: Level::INFO,
            log_to_console: true,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for Duration serialization/deserialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
