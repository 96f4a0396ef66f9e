//! # serial-mqtt-core
//!
//! Shared, I/O-free building blocks for the serial-to-MQTT bridge.
//!
//! This crate has zero dependencies on serial drivers, sockets, or async
//! runtimes.  Everything here is a pure function of its input, which keeps the
//! framing and classification rules testable without hardware or a broker.
//!
//! # Architecture overview (for beginners)
//!
//! A device attached to a serial port prints one record per line:
//!
//! ```text
//! # comment lines start with a hash and are ignored
//! lights/kitchen on
//! alarm/zone1 motion detected near door
//! ```
//!
//! The bridge reads those lines and republishes each `<topic> <payload>` pair
//! to an MQTT broker.  This crate defines:
//!
//! - **`framing`** – How raw bytes become a line of text: terminator
//!   stripping and ASCII validation.
//!
//! - **`message`** – How a line of text is classified: comment, malformed, or
//!   a [`Message`] with a topic and a payload.
//!
//! - **`target`** – Where messages go: the [`BrokerTarget`] plus the fixed
//!   wire constants (baud rate, broker port, client identifier).

pub mod framing;
pub mod message;
pub mod target;

// Re-export the most-used items at the crate root so callers can write
// `serial_mqtt_core::classify_line` instead of the full module path.
pub use framing::{decode_line, DecodeError, LINE_TERMINATOR, MAX_LINE_LENGTH};
pub use message::{classify_line, LineClass, Message, COMMENT_MARKER};
pub use target::{BrokerTarget, CLIENT_ID, DEFAULT_BROKER_PORT, SERIAL_BAUD_RATE};
