//! At-most-once MQTT publisher.
//!
//! Each message gets its own short-lived connection:
//!
//! ```text
//! CONNECT (client id "revspace-skip") → CONNACK
//! PUBLISH (QoS 0, retain false)
//! DISCONNECT
//! ```
//!
//! Holding no connection between messages means a broker restart never
//! leaves the bridge with a stale session, and a failure on one message
//! cannot poison the next.  The whole exchange is bounded by the configured
//! publish timeout.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, ConnectionError, Event, EventLoop, MqttOptions, Outgoing, QoS};
use tracing::debug;

use serial_mqtt_core::{BrokerTarget, Message};

use crate::application::{PublishError, Publisher};

/// MQTT keep-alive announced in CONNECT.
const KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Requests queued between the client handle and its event loop.  One
/// publish and one disconnect per connection.
const REQUEST_CAPACITY: usize = 4;

/// Publishes each message over a fresh MQTT connection.
pub struct MqttPublisher {
    target: BrokerTarget,
    port: u16,
    timeout: Duration,
}

impl MqttPublisher {
    /// Creates a publisher for `target`; each publish is abandoned after
    /// `timeout`.
    pub fn new(target: BrokerTarget, timeout: Duration) -> Self {
        let port = target.port();
        Self {
            target,
            port,
            timeout,
        }
    }

    /// Connects to `port` instead of the fixed broker port.
    #[cfg(test)]
    fn on_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(
            self.target.client_id(),
            self.target.host(),
            self.port,
        );
        options.set_keep_alive(KEEP_ALIVE);
        options.set_clean_session(true);
        options
    }

    async fn publish_once(&self, message: &Message) -> Result<(), PublishError> {
        let (client, mut eventloop) = AsyncClient::new(self.options(), REQUEST_CAPACITY);

        // Queue the PUBLISH before the event loop connects; the client
        // validates the topic here.
        client
            .publish(
                message.topic(),
                QoS::AtMostOnce,
                false,
                message.payload().as_bytes().to_vec(),
            )
            .await
            .map_err(|e| PublishError::Rejected(e.to_string()))?;

        drive_until(&mut eventloop, |out| matches!(out, Outgoing::Publish(_)))
            .await
            .map_err(|e| PublishError::Connection(e.to_string()))?;

        // The message is on the wire.  With QoS 0 there is nothing to wait
        // for, so a failed goodbye does not fail the publish.
        if let Err(e) = client.disconnect().await {
            debug!("{}: could not queue DISCONNECT: {e}", self.target);
            return Ok(());
        }
        if let Err(e) = drive_until(&mut eventloop, |out| matches!(out, Outgoing::Disconnect)).await {
            debug!("{}: connection ended before DISCONNECT: {e}", self.target);
        }
        Ok(())
    }
}

/// Polls the event loop until an outgoing packet matching `done` is written.
async fn drive_until(
    eventloop: &mut EventLoop,
    done: impl Fn(&Outgoing) -> bool,
) -> Result<(), ConnectionError> {
    loop {
        match eventloop.poll().await? {
            Event::Outgoing(outgoing) if done(&outgoing) => return Ok(()),
            event => debug!("mqtt event: {event:?}"),
        }
    }
}

#[async_trait]
impl Publisher for MqttPublisher {
    async fn publish(&self, message: &Message) -> Result<(), PublishError> {
        match tokio::time::timeout(self.timeout, self.publish_once(message)).await {
            Ok(result) => result,
            Err(_) => Err(PublishError::Timeout(self.timeout)),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
