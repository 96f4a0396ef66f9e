//! serial-mqtt-bridge entry point.
//!
//! Forwards messages received on a serial port to an MQTT broker.  The device
//! on the serial port prints one record per line:
//!
//! ```text
//! <topic> <payload>\n      → published to <topic>
//! # anything\n             → ignored
//! ```
//!
//! # Usage
//!
//! ```text
//! serial-mqtt-bridge [OPTIONS] [MQTT_SERVER]
//!
//! Arguments:
//!   [MQTT_SERVER]  Hostname or IP address of the MQTT broker
//!
//! Options:
//!   -s, --serial-port <DEVICE>    Serial port to read from [default: /dev/ttyUSB0]
//!       --publish-timeout <SECS>  Per-message publish timeout [default: 10]
//!   -c, --config <FILE>           Optional TOML config file
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                      | Equivalent option   |
//! |-------------------------------|---------------------|
//! | `SERIAL_MQTT_SERVER`          | `MQTT_SERVER`       |
//! | `SERIAL_MQTT_SERIAL_PORT`     | `--serial-port`     |
//! | `SERIAL_MQTT_PUBLISH_TIMEOUT` | `--publish-timeout` |
//! | `SERIAL_MQTT_CONFIG`          | `--config`          |
//! | `RUST_LOG`                    | `[logging] level`   |
//!
//! Command-line and environment values win over the config file, which wins
//! over the built-in defaults.
//!
//! # Exit status
//!
//! - `0` after Ctrl+C.
//! - non-zero if startup fails or the serial transport fails (the port is
//!   closed before the process exits).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use serial_mqtt_bridge::application::{run_bridge, MessageDispatcher};
use serial_mqtt_bridge::domain::{
    BridgeConfig, SerialSettings, DEFAULT_PUBLISH_TIMEOUT, DEFAULT_SERIAL_DEVICE,
};
use serial_mqtt_bridge::infrastructure::{load_config_file, open_serial, FileConfig, MqttPublisher};
use serial_mqtt_core::BrokerTarget;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Forwards newline-delimited records from a serial port to an MQTT broker.
#[derive(Debug, Parser)]
#[command(
    name = "serial-mqtt-bridge",
    about = "Forwards messages received on a serial port to MQTT",
    version
)]
struct Cli {
    /// Hostname or IP address of the MQTT broker.
    ///
    /// Required unless the config file sets `[broker] host`.
    #[arg(env = "SERIAL_MQTT_SERVER")]
    mqtt_server: Option<String>,

    /// The serial port to read from.
    #[arg(
        short = 's',
        long = "serial-port",
        alias = "serial_port",
        value_name = "DEVICE",
        env = "SERIAL_MQTT_SERIAL_PORT"
    )]
    serial_port: Option<String>,

    /// Give up on a single publish after this many seconds.
    #[arg(long, value_name = "SECS", env = "SERIAL_MQTT_PUBLISH_TIMEOUT")]
    publish_timeout: Option<u64>,

    /// Optional TOML config file.
    #[arg(short = 'c', long, value_name = "FILE", env = "SERIAL_MQTT_CONFIG")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Merges the CLI arguments over `file` into a [`BridgeConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if no broker host is given anywhere, if the host is
    /// blank, or if the publish timeout is zero.
    fn into_bridge_config(self, file: &FileConfig) -> anyhow::Result<BridgeConfig> {
        let Some(host) = self.mqtt_server.or_else(|| file.broker.host.clone()) else {
            bail!("no MQTT server given: pass MQTT_SERVER or set [broker] host in the config file");
        };
        let host = host.trim();
        if host.is_empty() {
            bail!("MQTT server address must not be empty");
        }

        let device = self
            .serial_port
            .or_else(|| file.serial.device.clone())
            .unwrap_or_else(|| DEFAULT_SERIAL_DEVICE.to_string());

        let publish_timeout = match self.publish_timeout.or(file.broker.publish_timeout_secs) {
            Some(0) => bail!("publish timeout must be at least 1 second"),
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_PUBLISH_TIMEOUT,
        };

        Ok(BridgeConfig {
            serial: SerialSettings::new(device),
            broker: BrokerTarget::new(host),
            publish_timeout,
        })
    }
}

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set and valid; otherwise `level` from the config file
/// is used, falling back to `info` if that is not a valid filter either.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Resolves when Ctrl+C is pressed.  Never resolves if the signal handler
/// cannot be installed, so the bridge keeps running.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl+C, shutting down"),
        Err(e) => {
            error!("failed to listen for Ctrl+C signal: {e}");
            std::future::pending::<()>().await;
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file = match &cli.config {
        Some(path) => load_config_file(path)
            .with_context(|| format!("failed to load config file {}", path.display()))?,
        None => FileConfig::default(),
    };

    init_logging(&file.logging.level);

    let config = cli.into_bridge_config(&file)?;

    info!(
        "serial-mqtt bridge starting: serial={} @ {} baud, broker={}",
        config.serial.device, config.serial.baud_rate, config.broker
    );

    let reader = open_serial(&config.serial)
        .with_context(|| format!("failed to open serial port {}", config.serial.device))?;
    info!("forwarding lines from {}", reader.source_name());
    let publisher = MqttPublisher::new(config.broker.clone(), config.publish_timeout);
    let mut dispatcher = MessageDispatcher::new(publisher, config.broker.clone());

    // The pump owns the reader; whichever branch wins, the losing future is
    // dropped here and the serial port is closed with it.
    let outcome = tokio::select! {
        result = run_bridge(reader, &mut dispatcher) => Some(result),
        () = shutdown_signal() => None,
    };

    let stats = dispatcher.stats();
    info!(
        "bridge to {} stopped after {} lines: {} published, {} publish failures, {} comments, {} malformed",
        dispatcher.target(),
        stats.lines,
        stats.published,
        stats.failed,
        stats.comments,
        stats.malformed
    );

    match outcome {
        None => Ok(()),
        Some(Ok(never)) => match never {},
        Some(Err(e)) => Err(anyhow::Error::new(e).context("serial transport failed")),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
