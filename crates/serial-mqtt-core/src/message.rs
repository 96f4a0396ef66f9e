//! Line classification and the [`Message`] type.
//!
//! Every decoded line falls into exactly one of three classes:
//!
//! ```text
//! comment-line   := "#" anything             → LineClass::Comment
//! message-line   := topic SP payload         → LineClass::Message
//! malformed-line := anything-without-a-space → LineClass::Malformed
//! ```
//!
//! Classification is a pure function of the line text, so classifying the
//! same line twice always yields the same decision and the same
//! `(topic, payload)` pair.

use std::fmt;

/// A line whose first character is this marker is a comment.
pub const COMMENT_MARKER: char = '#';

const FIELD_SEPARATOR: char = ' ';

/// A parsed `(topic, payload)` record ready to be published.
///
/// A `Message` can only be obtained through [`classify_line`] (or
/// [`Message::new`], which applies the same rules), so holding one proves the
/// topic is non-empty and free of spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    topic: String,
    payload: String,
}

impl Message {
    /// Builds a message from an explicit topic and payload.
    ///
    /// Returns `None` if `topic` is empty, contains a space, or starts with
    /// the comment marker, i.e. if `"{topic} {payload}"` would not classify as
    /// this same message.
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Option<Self> {
        let topic = topic.into();
        if topic.is_empty()
            || topic.contains(FIELD_SEPARATOR)
            || topic.starts_with(COMMENT_MARKER)
        {
            return None;
        }
        Some(Self {
            topic,
            payload: payload.into(),
        })
    }

    /// The routing key: everything before the first space.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The message body: everything after the first space.  May be empty and
    /// may contain further spaces.
    pub fn payload(&self) -> &str {
        &self.payload
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.topic, self.payload)
    }
}

/// The classification of a single decoded line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    /// The line starts with [`COMMENT_MARKER`] and is ignored.
    Comment,
    /// The line has no space (or an empty topic) and cannot be forwarded.
    Malformed,
    /// The line is a well-formed `topic SP payload` record.
    Message(Message),
}

/// Classifies a decoded line (terminator already stripped).
///
/// The split happens on the **first** space only; any later spaces belong to
/// the payload.
///
/// # Example
///
/// ```rust
/// use serial_mqtt_core::{classify_line, LineClass, Message};
///
/// assert_eq!(classify_line("#startup ok"), LineClass::Comment);
/// assert_eq!(classify_line("noSpaceHere"), LineClass::Malformed);
/// assert_eq!(
///     classify_line("sensor/temp 21 C"),
///     LineClass::Message(Message::new("sensor/temp", "21 C").unwrap())
/// );
/// ```
pub fn classify_line(line: &str) -> LineClass {
    if line.starts_with(COMMENT_MARKER) {
        return LineClass::Comment;
    }

    match line.split_once(FIELD_SEPARATOR) {
        // A leading space would produce an empty topic, which no broker
        // accepts; treat it like any other unforwardable line.
        Some(("", _)) | None => LineClass::Malformed,
        Some((topic, payload)) => LineClass::Message(Message {
            topic: topic.to_string(),
            payload: payload.to_string(),
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
