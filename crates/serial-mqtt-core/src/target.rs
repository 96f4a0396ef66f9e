//! Broker target and fixed wire constants.

use std::fmt;

/// Bit rate of the serial link.  The frame format is always 8-N-1.
pub const SERIAL_BAUD_RATE: u32 = 115_200;

/// Standard unencrypted MQTT port.
pub const DEFAULT_BROKER_PORT: u16 = 1883;

/// Client identifier presented to the broker on every publish.
pub const CLIENT_ID: &str = "revspace-skip";

/// Where published messages go.
///
/// Built once at startup and never mutated; the accessors hand out shared
/// references only.
///
/// # Example
///
/// ```rust
/// use serial_mqtt_core::BrokerTarget;
///
/// let target = BrokerTarget::new("mqtt.example.org");
/// assert_eq!(target.port(), 1883);
/// assert_eq!(target.to_string(), "mqtt://mqtt.example.org:1883");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerTarget {
    host: String,
    port: u16,
    client_id: String,
}

impl BrokerTarget {
    /// Targets `host` on [`DEFAULT_BROKER_PORT`] with the fixed [`CLIENT_ID`].
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_BROKER_PORT,
            client_id: CLIENT_ID.to_string(),
        }
    }

    /// Broker hostname or IP address.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Broker TCP port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// MQTT client identifier used for every connection.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

impl fmt::Display for BrokerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mqtt://{}:{}", self.host, self.port)
    }
}
