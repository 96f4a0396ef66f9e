//! Line framing: turning raw serial bytes into a line of text.
//!
//! The serial link carries ASCII text split into records by a newline byte.
//! The reader accumulates bytes up to and including [`LINE_TERMINATOR`] and
//! hands them to [`decode_line`], which strips the terminator and validates
//! the encoding.
//!
//! # Why strict ASCII?
//!
//! The devices on the other end of the cable only ever emit 7-bit text.  A
//! byte above `0x7F` means the link is misconfigured (wrong baud rate) or the
//! device is emitting garbage, and forwarding that to the broker would only
//! hide the fault.  The decode error is therefore treated as fatal by the
//! caller.

use thiserror::Error;

/// The byte that terminates every record on the wire.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Longest record accepted from the wire, terminator included.  A device
/// that streams this much without a newline is treated as faulty.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

const CARRIAGE_RETURN: u8 = b'\r';

/// Errors produced while decoding a raw line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The line contains a byte outside the 7-bit ASCII range.
    #[error("non-ASCII byte 0x{byte:02X} at offset {offset}")]
    NonAscii {
        /// Position of the offending byte within the line.
        offset: usize,
        /// The offending byte itself.
        byte: u8,
    },
}

/// Returns `true` if `raw` ends with the line terminator.
pub fn has_terminator(raw: &[u8]) -> bool {
    raw.last() == Some(&LINE_TERMINATOR)
}

/// Strips the terminator from `raw` and decodes the rest as ASCII.
///
/// One trailing `\n` is removed, followed by one `\r` if the sender uses
/// CRLF line endings.  Any other whitespace is part of the record and is
/// preserved, so `"topic \n"` decodes to `"topic "` (a message with an empty
/// payload).
///
/// # Errors
///
/// Returns [`DecodeError::NonAscii`] if any byte of the record is above
/// `0x7F`.
///
/// # Example
///
/// ```rust
/// use serial_mqtt_core::decode_line;
///
/// assert_eq!(decode_line(b"lights/kitchen on\r\n").unwrap(), "lights/kitchen on");
/// assert!(decode_line(b"caf\xC3\xA9\n").is_err());
/// ```
pub fn decode_line(raw: &[u8]) -> Result<String, DecodeError> {
    let mut body = raw;
    if let Some(rest) = body.strip_suffix(&[LINE_TERMINATOR]) {
        body = rest;
        if let Some(rest) = body.strip_suffix(&[CARRIAGE_RETURN]) {
            body = rest;
        }
    }

    if let Some(offset) = body.iter().position(|b| !b.is_ascii()) {
        return Err(DecodeError::NonAscii {
            offset,
            byte: body[offset],
        });
    }

    Ok(body.iter().copied().map(char::from).collect())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
