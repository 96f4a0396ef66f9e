//! Line reader over the serial port.
//!
//! # Blocking driver, async pump
//!
//! `serialport` only offers blocking reads.  [`LineReader`] therefore hands
//! its reader to `tokio::task::spawn_blocking` for each line and takes it back
//! when the line is complete.  The reader is owned by exactly one place at a
//! time (the `LineReader` or the blocking task), so no lock is needed.
//!
//! # Why a driver timeout if reads block forever?
//!
//! The port is opened with a short driver timeout, and `TimedOut` results are
//! retried internally, so callers still see a read that blocks until a full
//! line arrives.  The periodic wake-up lets the blocking task notice that the
//! `LineReader` was dropped (e.g. on Ctrl+C) and release the port instead of
//! holding the runtime open until the next byte arrives.

use std::io::{self, BufRead, BufReader, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, info, warn};

use serial_mqtt_core::framing::has_terminator;
use serial_mqtt_core::{decode_line, LINE_TERMINATOR, MAX_LINE_LENGTH};

use crate::application::{LineSource, TransportError};
use crate::domain::SerialSettings;

/// How often a blocked driver read wakes up to check for cancellation.
const DRIVER_POLL_TIMEOUT: Duration = Duration::from_millis(500);

// ── Serial connection ─────────────────────────────────────────────────────────

/// The open serial port.  Closing happens on drop.
pub struct SerialConnection {
    device: String,
    port: Box<dyn SerialPort>,
}

impl Read for SerialConnection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

impl Drop for SerialConnection {
    fn drop(&mut self) {
        info!("closed serial port {}", self.device);
    }
}

/// A [`LineReader`] over a real serial port.
pub type SerialLineReader = LineReader<BufReader<SerialConnection>>;

/// Opens the serial device at the fixed baud rate, 8-N-1, no flow control.
///
/// # Errors
///
/// Returns [`TransportError::Io`] if the device does not exist, is busy, or
/// cannot be configured.
pub fn open_serial(settings: &SerialSettings) -> Result<SerialLineReader, TransportError> {
    let port = serialport::new(&settings.device, settings.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(DRIVER_POLL_TIMEOUT)
        .open()
        .map_err(|e| TransportError::Io {
            source_name: settings.device.clone(),
            source: e.into(),
        })?;

    info!(
        "opened serial port {} at {} baud (8-N-1)",
        settings.device, settings.baud_rate
    );

    let connection = SerialConnection {
        device: settings.device.clone(),
        port,
    };
    Ok(LineReader::new(
        BufReader::new(connection),
        settings.device.clone(),
    ))
}

// ── Line reader ───────────────────────────────────────────────────────────────

/// Produces one decoded line per call from any buffered byte stream.
///
/// Generic over the reader so tests can feed it a `Cursor` instead of a
/// device.
pub struct LineReader<R> {
    /// `None` only while a blocking read is in flight, or after that read's
    /// task panicked.
    reader: Option<R>,
    source_name: String,
    cancelled: Arc<AtomicBool>,
}

impl<R> LineReader<R> {
    /// Wraps `reader`; `source_name` labels log lines and errors.
    pub fn new(reader: R, source_name: impl Into<String>) -> Self {
        Self {
            reader: Some(reader),
            source_name: source_name.into(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The device path or label given at construction.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }
}

impl<R> Drop for LineReader<R> {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

#[async_trait]
impl<R> LineSource for LineReader<R>
where
    R: BufRead + Send + 'static,
{
    async fn next_line(&mut self) -> Result<String, TransportError> {
        let mut reader = self.reader.take().ok_or_else(|| TransportError::Unavailable {
            source_name: self.source_name.clone(),
        })?;
        let source_name = self.source_name.clone();
        let cancelled = Arc::clone(&self.cancelled);

        let task = tokio::task::spawn_blocking(move || {
            let result = read_line_blocking(&mut reader, &source_name, &cancelled);
            (reader, result)
        });

        match task.await {
            Ok((reader, result)) => {
                self.reader = Some(reader);
                result
            }
            Err(e) => {
                // The reader went down with the task, which also closed it.
                warn!("blocking read on {} died: {e}", self.source_name);
                Err(TransportError::Unavailable {
                    source_name: self.source_name.clone(),
                })
            }
        }
    }
}

/// Reads up to and including the next terminator, then decodes.
///
/// At most [`MAX_LINE_LENGTH`] bytes are buffered; a longer record fails with
/// [`TransportError::LineTooLong`].
fn read_line_blocking<R: BufRead>(
    reader: &mut R,
    source_name: &str,
    cancelled: &AtomicBool,
) -> Result<String, TransportError> {
    let mut raw = Vec::with_capacity(128);

    loop {
        let remaining = (MAX_LINE_LENGTH - raw.len()) as u64;
        match reader
            .by_ref()
            .take(remaining)
            .read_until(LINE_TERMINATOR, &mut raw)
        {
            Ok(_) if has_terminator(&raw) => break,
            Ok(_) if raw.len() >= MAX_LINE_LENGTH => {
                return Err(TransportError::LineTooLong {
                    source_name: source_name.to_string(),
                    limit: MAX_LINE_LENGTH,
                });
            }
            Ok(0) => {
                if !raw.is_empty() {
                    warn!(
                        "{source_name}: discarding {} bytes of unterminated line at end of stream",
                        raw.len()
                    );
                }
                return Err(TransportError::Disconnected {
                    source_name: source_name.to_string(),
                });
            }
            // End of stream in the middle of a line; the next call sees Ok(0).
            Ok(_) => {}
            // `read_until` keeps whatever it consumed before the timeout in
            // `raw`, so retrying simply continues the same line.
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                if cancelled.load(Ordering::Relaxed) {
                    debug!("{source_name}: reader dropped, abandoning read");
                    return Err(TransportError::Unavailable {
                        source_name: source_name.to_string(),
                    });
                }
            }
            Err(source) => {
                return Err(TransportError::Io {
                    source_name: source_name.to_string(),
                    source,
                });
            }
        }
    }

    debug!("{source_name}: read {} bytes", raw.len());
    decode_line(&raw).map_err(|reason| TransportError::Decode {
        source_name: source_name.to_string(),
        reason,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
