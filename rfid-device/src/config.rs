//! Node configuration

use rfid_core::{AccessError, AccessResult};
use rfid_security::constants::{DEFAULT_HANDSHAKE_SECRET, DEFAULT_OPERATIONAL_SECRET};
use rfid_security::SecretDerivation;
use rfid_transport::SerialSettings;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable holding the handshake secret
pub const ENV_HANDSHAKE_KEY: &str = "HANDSHAKE_KEY";
/// Environment variable holding the operational secret
pub const ENV_SECRET_KEY: &str = "SECRET_KEY";
/// Environment variable naming the serial port
pub const ENV_SERIAL_PORT: &str = "RFID_SERIAL_PORT";
/// Environment variable holding the baud rate
pub const ENV_BAUD_RATE: &str = "RFID_BAUD_RATE";
/// Environment variable holding the control loop interval in milliseconds
pub const ENV_POLL_MS: &str = "RFID_POLL_MS";

/// Node configuration
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Handshake and operational secrets
    pub secrets: SecretDerivation,
    /// Host link settings
    pub serial: SerialSettings,
    /// Pause between two control loop iterations
    pub poll_interval: Duration,
}

impl NodeConfig {
    /// Default control loop interval
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

    /// Read the configuration from the process environment
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> AccessResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AccessResult<Self> {
        let defaults = Self::default();

        let handshake = lookup(ENV_HANDSHAKE_KEY).unwrap_or_else(|| DEFAULT_HANDSHAKE_SECRET.to_string());
        let operational = lookup(ENV_SECRET_KEY).unwrap_or_else(|| DEFAULT_OPERATIONAL_SECRET.to_string());
        if handshake.is_empty() || operational.is_empty() {
            return Err(AccessError::Config("Secrets must not be empty".to_string()));
        }

        let port_name = lookup(ENV_SERIAL_PORT).unwrap_or(defaults.serial.port_name);
        let baud_rate = match lookup(ENV_BAUD_RATE) {
            Some(value) => parse_number::<u32>(ENV_BAUD_RATE, &value)?,
            None => defaults.serial.baud_rate,
        };
        let poll_interval = match lookup(ENV_POLL_MS) {
            Some(value) => Duration::from_millis(parse_number::<u64>(ENV_POLL_MS, &value)?),
            None => defaults.poll_interval,
        };

        Ok(Self {
            secrets: SecretDerivation::new(handshake, operational),
            serial: SerialSettings::new(port_name, baud_rate),
            poll_interval,
        })
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            secrets: SecretDerivation::default(),
            serial: SerialSettings::default(),
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        }
    }
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> AccessResult<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| AccessError::Config(format!("{} must be a number, got {:?}", name, value)))
}
