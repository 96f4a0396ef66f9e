//! serial-mqtt-bridge library crate.
//!
//! Reads newline-delimited records from a serial port and republishes each
//! `<topic> <payload>` line to an MQTT broker.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Serial device (ASCII lines, 115200 8-N-1)
//!         ↓
//! [serial-mqtt-bridge]
//!   ├── domain/           BridgeConfig, SerialSettings
//!   ├── application/
//!   │     ├── dispatcher/ classify → publish, isolate publish failures
//!   │     └── pump/       the sequential read → dispatch loop
//!   └── infrastructure/
//!         ├── serial_reader/  LineReader over the serial port (serialport)
//!         ├── mqtt_publisher/ at-most-once publish (rumqttc)
//!         └── config_file/    optional TOML configuration
//!         ↓
//! MQTT broker (port 1883, QoS 0, retain false)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O.
//! - `application` talks to the outside world only through the
//!   [`application::LineSource`] and [`application::Publisher`] traits, so the
//!   whole pipeline can be tested with in-memory transports.
//! - `infrastructure` implements those traits on top of real devices.

/// Domain layer: configuration types (no I/O).
pub mod domain;

/// Application layer: dispatch logic and the pump loop.
pub mod application;

/// Infrastructure layer: serial port, MQTT client, config file.
pub mod infrastructure;
