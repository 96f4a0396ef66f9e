//! Application layer for serial-mqtt-bridge.
//!
//! Knows *what* to do with each line, and delegates *how* bytes arrive and
//! *how* messages leave to the infrastructure layer through two traits:
//!
//! - [`LineSource`]: where lines come from (the serial reader, or a script
//!   in tests)
//! - [`Publisher`]: where messages go (the MQTT client, or a mock in tests)
//!
//! # Error tiers
//!
//! - [`TransportError`] is fatal: it ends [`run_bridge`].
//! - [`PublishError`] is recoverable: the dispatcher logs it and carries on.

pub mod dispatcher;
pub mod pump;

pub use dispatcher::{DispatchOutcome, DispatchStats, MessageDispatcher, PublishError, Publisher};
pub use pump::{run_bridge, LineSource, TransportError};
