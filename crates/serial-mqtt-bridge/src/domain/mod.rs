//! Domain layer for serial-mqtt-bridge.
//!
//! Pure configuration types with no dependencies on serial drivers, sockets,
//! or the async runtime.
//!
//! # What does NOT belong here?
//!
//! - Opening the serial port or connecting to the broker
//! - Reading files or environment variables
//! - Anything that could block or fail due to external state

pub mod config;

pub use config::{BridgeConfig, SerialSettings, DEFAULT_PUBLISH_TIMEOUT, DEFAULT_SERIAL_DEVICE};
