//! The pump: one read, one dispatch, repeated until the transport fails.
//!
//! ```text
//! loop {
//!     line = source.next_line()   ← only suspension point for serial input
//!     dispatcher.dispatch(line)   ← only suspension point for broker I/O
//! }
//! ```
//!
//! There is never more than one operation in flight.  The loop ends only when
//! the [`LineSource`] reports a [`TransportError`]; publish failures never
//! reach this level.

use std::convert::Infallible;

use async_trait::async_trait;
use thiserror::Error;
use tracing::error;

use serial_mqtt_core::DecodeError;

use super::dispatcher::{MessageDispatcher, Publisher};

/// Fatal errors on the inbound side.
///
/// Every variant ends the pump.  The bridge does not reconnect; the process
/// exits and a supervisor decides what happens next.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The device sent a byte that is not ASCII.
    #[error("undecodable line from {source_name}: {reason}")]
    Decode {
        source_name: String,
        #[source]
        reason: DecodeError,
    },

    /// Reading from the device failed (unplugged, driver error, ...).
    #[error("I/O error reading from {source_name}: {source}")]
    Io {
        source_name: String,
        #[source]
        source: std::io::Error,
    },

    /// The device sent more than `limit` bytes without a line terminator.
    #[error("{source_name} sent a line longer than {limit} bytes")]
    LineTooLong { source_name: String, limit: usize },

    /// The byte stream ended.
    #[error("{source_name} closed the connection")]
    Disconnected { source_name: String },

    /// The reader no longer owns a transport handle (its blocking read task
    /// died).
    #[error("{source_name} is no longer available")]
    Unavailable { source_name: String },
}

/// A lazy, infinite, non-restartable sequence of decoded lines.
#[async_trait]
pub trait LineSource: Send {
    /// Waits for the next complete line, terminator stripped.
    ///
    /// Blocks for as long as it takes; there is no read timeout.
    async fn next_line(&mut self) -> Result<String, TransportError>;
}

/// Runs the bridge until the transport fails.
///
/// Takes ownership of `source`, so the underlying connection is released
/// exactly once: when this function returns, or when its future is dropped
/// (e.g. on Ctrl+C).
///
/// # Errors
///
/// Returns the [`TransportError`] that stopped the loop.  There is no `Ok`
/// value: a healthy bridge runs forever.
pub async fn run_bridge<S, P>(
    mut source: S,
    dispatcher: &mut MessageDispatcher<P>,
) -> Result<Infallible, TransportError>
where
    S: LineSource,
    P: Publisher,
{
    loop {
        let line = match source.next_line().await {
            Ok(line) => line,
            Err(e) => {
                error!("serial transport failed, stopping: {e}");
                return Err(e);
            }
        };
        dispatcher.dispatch(&line).await;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
