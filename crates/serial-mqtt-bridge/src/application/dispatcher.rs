//! Message dispatch: classify each line and forward well-formed ones.
//!
//! This is the fault-isolation boundary of the bridge.  Whatever happens on
//! the broker side (unreachable host, refused connection, invalid topic,
//! timeout), [`MessageDispatcher::dispatch`] logs it and returns normally so
//! the pump can read the next line.  Only the transport side is allowed to
//! end the loop.
//!
//! # Per-line decision
//!
//! ```text
//! "#..."          → SkippedComment   (info log, no publish)
//! "no-space"      → SkippedMalformed (warn log, no publish)
//! "topic payload" → publish → Published | PublishFailed (warn log)
//! ```

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use serial_mqtt_core::{classify_line, BrokerTarget, LineClass, Message};

// ── Publisher seam ────────────────────────────────────────────────────────────

/// Errors a single publish attempt can end with.
///
/// None of these are fatal to the bridge: the dispatcher logs them and moves
/// on to the next line.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The MQTT client refused the request before it reached the network,
    /// e.g. because the topic contains a wildcard.
    #[error("publish rejected by client: {0}")]
    Rejected(String),

    /// The broker could not be reached or closed the connection.
    #[error("broker connection failed: {0}")]
    Connection(String),

    /// The connect → publish → disconnect exchange took too long.
    #[error("publish did not complete within {0:?}")]
    Timeout(Duration),
}

/// Something that can deliver a [`Message`] to the broker.
///
/// The production implementation is
/// [`MqttPublisher`](crate::infrastructure::mqtt_publisher::MqttPublisher);
/// tests use a mock or an in-memory recorder.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publishes `message` once, at most once, without the retain flag.
    async fn publish(&self, message: &Message) -> Result<(), PublishError>;
}

// ── Outcomes and counters ─────────────────────────────────────────────────────

/// What happened to one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The line started with `#`.
    SkippedComment,
    /// The line had no topic/payload separator.
    SkippedMalformed,
    /// The message was handed to the broker.
    Published(Message),
    /// The publish attempt failed; the failure was logged.
    PublishFailed(Message),
}

/// Running totals of dispatch outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Every line passed to `dispatch`.
    pub lines: u64,
    /// Lines skipped as comments.
    pub comments: u64,
    /// Lines dropped for lacking a `topic payload` shape.
    pub malformed: u64,
    /// Messages the publisher accepted.
    pub published: u64,
    /// Messages whose publish attempt failed.
    pub failed: u64,
}

impl DispatchStats {
    fn record(&mut self, outcome: &DispatchOutcome) {
        self.lines += 1;
        match outcome {
            DispatchOutcome::SkippedComment => self.comments += 1,
            DispatchOutcome::SkippedMalformed => self.malformed += 1,
            DispatchOutcome::Published(_) => self.published += 1,
            DispatchOutcome::PublishFailed(_) => self.failed += 1,
        }
    }
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

/// Classifies lines and publishes the well-formed ones.
pub struct MessageDispatcher<P> {
    publisher: P,
    target: BrokerTarget,
    stats: DispatchStats,
}

impl<P: Publisher> MessageDispatcher<P> {
    /// Creates a dispatcher publishing through `publisher`.
    ///
    /// `target` is only used for log context; the publisher already knows
    /// where to connect.
    pub fn new(publisher: P, target: BrokerTarget) -> Self {
        Self {
            publisher,
            target,
            stats: DispatchStats::default(),
        }
    }

    /// Handles one decoded line.  Never fails.
    pub async fn dispatch(&mut self, line: &str) -> DispatchOutcome {
        debug!("got line \"{line}\"");

        let outcome = match classify_line(line) {
            LineClass::Comment => {
                info!("skipping comment line \"{line}\"");
                DispatchOutcome::SkippedComment
            }
            LineClass::Malformed => {
                warn!("dropping malformed line \"{line}\": expected \"<topic> <payload>\"");
                DispatchOutcome::SkippedMalformed
            }
            LineClass::Message(message) => self.forward(message).await,
        };

        self.stats.record(&outcome);
        outcome
    }

    async fn forward(&self, message: Message) -> DispatchOutcome {
        let target = &self.target;
        match self.publisher.publish(&message).await {
            Ok(()) => {
                info!(
                    "published to {target} on topic {}: {}",
                    message.topic(),
                    message.payload()
                );
                DispatchOutcome::Published(message)
            }
            Err(e) => {
                warn!(
                    "publish to {target} on topic {} failed, continuing: {e}",
                    message.topic()
                );
                DispatchOutcome::PublishFailed(message)
            }
        }
    }

    /// Totals since the dispatcher was created.
    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// The broker this dispatcher reports in its logs.
    pub fn target(&self) -> &BrokerTarget {
        &self.target
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tokio_test::block_on;

    fn dispatcher(publisher: MockPublisher) -> MessageDispatcher<MockPublisher> {
        MessageDispatcher::new(publisher, BrokerTarget::new("broker.test"))
    }

    fn msg(topic: &str, payload: &str) -> Message {
        Message::new(topic, payload).expect("valid test message")
    }

    #[test]
    fn test_comment_line_is_never_published() {
        // Arrange
        let mut publisher = MockPublisher::new();
        publisher.expect_publish().never();
        let mut dispatcher = dispatcher(publisher);

        // Act
        let outcome = block_on(dispatcher.dispatch("#startup ok"));

        // Assert
        assert_eq!(outcome, DispatchOutcome::SkippedComment);
    }

    #[test]
    fn test_line_without_space_is_never_published() {
        let mut publisher = MockPublisher::new();
        publisher.expect_publish().never();
        let mut dispatcher = dispatcher(publisher);

        let outcome = block_on(dispatcher.dispatch("noSpaceHere"));

        assert_eq!(outcome, DispatchOutcome::SkippedMalformed);
    }

    #[test]
    fn test_message_line_is_published_once_with_topic_and_payload() {
        // Arrange
        let mut publisher = MockPublisher::new();
        publisher
            .expect_publish()
            .with(eq(msg("lights/kitchen", "on")))
            .times(1)
            .returning(|_| Ok(()));
        let mut dispatcher = dispatcher(publisher);

        // Act
        let outcome = block_on(dispatcher.dispatch("lights/kitchen on"));

        // Assert
        assert_eq!(outcome, DispatchOutcome::Published(msg("lights/kitchen", "on")));
    }

    #[test]
    fn test_payload_keeps_everything_after_first_space() {
        let mut publisher = MockPublisher::new();
        publisher
            .expect_publish()
            .withf(|m| m.topic() == "alarm/zone1" && m.payload() == "motion detected near door")
            .times(1)
            .returning(|_| Ok(()));
        let mut dispatcher = dispatcher(publisher);

        let outcome = block_on(dispatcher.dispatch("alarm/zone1 motion detected near door"));

        assert!(matches!(outcome, DispatchOutcome::Published(_)));
    }

    #[test]
    fn test_publish_failure_is_reported_not_propagated() {
        // Arrange: the broker is down
        let mut publisher = MockPublisher::new();
        publisher
            .expect_publish()
            .times(1)
            .returning(|_| Err(PublishError::Connection("connection refused".to_string())));
        let mut dispatcher = dispatcher(publisher);

        // Act
        let outcome = block_on(dispatcher.dispatch("sensor/temp 21 C"));

        // Assert
        assert_eq!(outcome, DispatchOutcome::PublishFailed(msg("sensor/temp", "21 C")));
    }

    #[test]
    fn test_failure_on_one_line_does_not_block_the_next() {
        // Arrange: first publish fails, second succeeds
        let mut publisher = MockPublisher::new();
        let mut seq = mockall::Sequence::new();
        publisher
            .expect_publish()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(PublishError::Timeout(Duration::from_secs(10))));
        publisher
            .expect_publish()
            .with(eq(msg("b", "2")))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        let mut dispatcher = dispatcher(publisher);

        // Act
        let first = block_on(dispatcher.dispatch("a 1"));
        let second = block_on(dispatcher.dispatch("b 2"));

        // Assert
        assert_eq!(first, DispatchOutcome::PublishFailed(msg("a", "1")));
        assert_eq!(second, DispatchOutcome::Published(msg("b", "2")));
    }

    #[test]
    fn test_same_line_twice_gets_same_decision() {
        let mut publisher = MockPublisher::new();
        publisher
            .expect_publish()
            .with(eq(msg("power/meter", "1234 W")))
            .times(2)
            .returning(|_| Ok(()));
        let mut dispatcher = dispatcher(publisher);

        let first = block_on(dispatcher.dispatch("power/meter 1234 W"));
        let second = block_on(dispatcher.dispatch("power/meter 1234 W"));

        assert_eq!(first, second);
    }

    #[test]
    fn test_stats_count_every_outcome() {
        // Arrange
        let mut publisher = MockPublisher::new();
        publisher
            .expect_publish()
            .with(eq(msg("ok", "1")))
            .returning(|_| Ok(()));
        publisher
            .expect_publish()
            .with(eq(msg("bad+topic", "1")))
            .returning(|_| Err(PublishError::Rejected("invalid topic".to_string())));
        let mut dispatcher = dispatcher(publisher);

        // Act
        for line in ["#hello", "junk", "ok 1", "bad+topic 1", "ok 1"] {
            block_on(dispatcher.dispatch(line));
        }

        // Assert
        assert_eq!(
            dispatcher.stats(),
            DispatchStats {
                lines: 5,
                comments: 1,
                malformed: 1,
                published: 2,
                failed: 1,
            }
        );
    }

    #[test]
    fn test_publish_error_messages() {
        assert_eq!(
            PublishError::Timeout(Duration::from_secs(10)).to_string(),
            "publish did not complete within 10s"
        );
        assert_eq!(
            PublishError::Connection("refused".to_string()).to_string(),
            "broker connection failed: refused"
        );
    }

    #[test]
    fn test_target_is_kept_for_logging() {
        let dispatcher = dispatcher(MockPublisher::new());
        assert_eq!(dispatcher.target().to_string(), "mqtt://broker.test:1883");
    }

    // ── Log output ────────────────────────────────────────────────────────────

    /// In-memory sink for the `fmt` subscriber.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn lines(&self) -> Vec<String> {
            String::from_utf8(self.0.lock().unwrap().clone())
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    /// Dispatches `line` with an `info`-level subscriber installed and returns
    /// every record it wrote.
    fn dispatch_logged(publisher: MockPublisher, line: &str) -> (DispatchOutcome, Vec<String>) {
        let logs = CapturedLogs::default();
        let sink = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .without_time()
            .finish();
        let mut dispatcher = dispatcher(publisher);

        let outcome =
            tracing::subscriber::with_default(subscriber, || block_on(dispatcher.dispatch(line)));

        (outcome, logs.lines())
    }

    #[test]
    fn test_comment_line_logs_exactly_one_skip_record() {
        // Arrange
        let mut publisher = MockPublisher::new();
        publisher.expect_publish().never();

        // Act
        let (outcome, lines) = dispatch_logged(publisher, "#startup ok");

        // Assert
        assert_eq!(outcome, DispatchOutcome::SkippedComment);
        assert_eq!(lines.len(), 1, "unexpected log output: {lines:?}");
        assert!(lines[0].contains("INFO"));
        assert!(lines[0].contains("skipping comment line \"#startup ok\""));
    }

    #[test]
    fn test_malformed_line_logs_exactly_one_drop_record() {
        // Arrange
        let mut publisher = MockPublisher::new();
        publisher.expect_publish().never();

        // Act
        let (outcome, lines) = dispatch_logged(publisher, "noSpaceHere");

        // Assert
        assert_eq!(outcome, DispatchOutcome::SkippedMalformed);
        assert_eq!(lines.len(), 1, "unexpected log output: {lines:?}");
        assert!(lines[0].contains("WARN"));
        assert!(lines[0].contains("dropping malformed line \"noSpaceHere\""));
    }

    #[test]
    fn test_failed_publish_logs_one_warning_naming_the_topic() {
        // Arrange
        let mut publisher = MockPublisher::new();
        publisher
            .expect_publish()
            .times(1)
            .returning(|_| Err(PublishError::Connection("refused".to_string())));

        // Act
        let (outcome, lines) = dispatch_logged(publisher, "door/front open");

        // Assert
        assert_eq!(outcome, DispatchOutcome::PublishFailed(msg("door/front", "open")));
        assert_eq!(lines.len(), 1, "unexpected log output: {lines:?}");
        assert!(lines[0].contains("WARN"));
        assert!(lines[0].contains("topic door/front failed, continuing"));
    }
}
