//! Bridge configuration types.
//!
//! [`BridgeConfig`] is the single source of truth for all runtime settings.
//! `main.rs` builds it once from CLI arguments, environment variables and the
//! optional config file, then hands the pieces to the serial reader and the
//! MQTT publisher.  Nothing here reads the environment itself.

use std::time::Duration;

use serial_mqtt_core::{BrokerTarget, SERIAL_BAUD_RATE};

/// Serial device used when none is configured.
#[cfg(windows)]
pub const DEFAULT_SERIAL_DEVICE: &str = "COM1";

/// Serial device used when none is configured.
#[cfg(not(windows))]
pub const DEFAULT_SERIAL_DEVICE: &str = "/dev/ttyUSB0";

/// Upper bound on one connect → publish → disconnect exchange with the broker.
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(10);

/// How to open the serial link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    /// Device path (`/dev/ttyUSB0`) or port name (`COM3`).
    pub device: String,

    /// Bit rate.  Always [`SERIAL_BAUD_RATE`]; carried here so log lines and
    /// the port builder read it from one place.
    pub baud_rate: u32,
}

impl SerialSettings {
    /// Settings for `device` at the fixed bridge baud rate.
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            baud_rate: SERIAL_BAUD_RATE,
        }
    }
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self::new(DEFAULT_SERIAL_DEVICE)
    }
}

/// All runtime configuration for the bridge.
///
/// # Example
///
/// ```rust
/// use serial_mqtt_bridge::domain::BridgeConfig;
///
/// let cfg = BridgeConfig::default();
/// assert_eq!(cfg.broker.port(), 1883);
/// assert_eq!(cfg.serial.baud_rate, 115_200);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// The serial link to read records from.
    pub serial: SerialSettings,

    /// The broker every message is published to.
    pub broker: BrokerTarget,

    /// Maximum time a single publish may take before it is abandoned and
    /// counted as a failure.
    pub publish_timeout: Duration,
}

impl Default for BridgeConfig {
    /// Returns a `BridgeConfig` suitable for local development.
    ///
    /// | Field           | Default                           |
    /// |-----------------|-----------------------------------|
    /// | serial.device   | `/dev/ttyUSB0` (`COM1` on Windows)|
    /// | serial.baud_rate| `115200`                          |
    /// | broker          | `mqtt://localhost:1883`           |
    /// | publish_timeout | 10 seconds                        |
    fn default() -> Self {
        Self {
            serial: SerialSettings::default(),
            broker: BrokerTarget::new("localhost"),
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_serial_device_is_platform_specific() {
        let cfg = BridgeConfig::default();
        #[cfg(not(windows))]
        assert_eq!(cfg.serial.device, "/dev/ttyUSB0");
        #[cfg(windows)]
        assert_eq!(cfg.serial.device, "COM1");
    }

    #[test]
    fn test_default_baud_rate_is_115200() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.serial.baud_rate, 115_200);
    }

    #[test]
    fn test_default_broker_port_is_1883() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.broker.port(), 1883);
    }

    #[test]
    fn test_default_publish_timeout_is_10s() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.publish_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_serial_settings_new_pins_baud_rate() {
        let settings = SerialSettings::new("/dev/ttyACM0");
        assert_eq!(settings.device, "/dev/ttyACM0");
        assert_eq!(settings.baud_rate, SERIAL_BAUD_RATE);
    }

    #[test]
    fn test_config_custom_values() {
        let cfg = BridgeConfig {
            serial: SerialSettings::new("/dev/ttyS1"),
            broker: BrokerTarget::new("10.0.0.5"),
            publish_timeout: Duration::from_secs(3),
        };
        assert_eq!(cfg.serial.device, "/dev/ttyS1");
        assert_eq!(cfg.broker.host(), "10.0.0.5");
        assert_eq!(cfg.publish_timeout, Duration::from_secs(3));
    }
}
