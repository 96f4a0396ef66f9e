//! Infrastructure layer for serial-mqtt-bridge.
//!
//! Handles all I/O: the serial device, the MQTT broker, and the config file.
//!
//! # Responsibilities
//!
//! - Opening the serial port at 115200 8-N-1 and reading lines from it
//! - Connecting to the broker and publishing at QoS 0
//! - Reading the optional TOML config file
//!
//! # What does NOT belong here?
//!
//! - Deciding which lines to forward (that is the application layer)
//! - Merging CLI, environment and file settings (that is done in `main.rs`)

pub mod config_file;
pub mod mqtt_publisher;
pub mod serial_reader;

pub use config_file::{load_config_file, ConfigError, FileConfig};
pub use mqtt_publisher::MqttPublisher;
pub use serial_reader::{open_serial, LineReader, SerialLineReader};
