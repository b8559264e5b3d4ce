//! RFID access node
//!
//! Serves the host protocol on a serial port. Without reader hardware the
//! board is simulated; drive it from stdin:
//!
//! ```text
//! card 04A10BFF     present a card with this UID
//! button            press the arm button
//! ```

use anyhow::Context;
use clap::Parser;
use rfid_device::{Node, NodeConfig, SimulatedHardware};
use rfid_transport::{LineTransport, SerialLineTransport, SerialSettings};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(
    name = "rfid-node",
    version,
    about = "RFID access node serving the host protocol over a serial line"
)]
struct Cli {
    /// Serial port to the host (overrides RFID_SERIAL_PORT)
    #[arg(long)]
    port: Option<String>,

    /// Baud rate (overrides RFID_BAUD_RATE)
    #[arg(long)]
    baud: Option<u32>,

    /// Control loop interval in milliseconds (overrides RFID_POLL_MS)
    #[arg(long)]
    poll_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = NodeConfig::from_env().context("Invalid node configuration")?;
    if cli.port.is_some() || cli.baud.is_some() {
        config.serial = SerialSettings::new(
            cli.port.unwrap_or(config.serial.port_name),
            cli.baud.unwrap_or(config.serial.baud_rate),
        );
    }
    if let Some(ms) = cli.poll_ms {
        config.poll_interval = Duration::from_millis(ms);
    }

    let mut transport = SerialLineTransport::new(config.serial.clone());
    transport
        .open()
        .with_context(|| format!("Cannot open {}", config.serial.port_name))?;

    let hardware = SimulatedHardware::new();
    tokio::spawn(drive_from_stdin(hardware.clone()));

    let mut node = Node::with_config(transport, hardware, &config);
    node.run().await?;

    let stats = node.statistics();
    log::info!(
        "Received {} lines, sent {}, rejected {} ({:.1}% errors)",
        stats.lines_received,
        stats.lines_sent,
        stats.frames_rejected,
        stats.error_rate()
    );
    if !node.transport().is_closed() {
        node.shutdown().await?;
    }
    Ok(())
}

/// Feed simulated card reads and button presses from stdin
async fn drive_from_stdin(hardware: SimulatedHardware) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::error!("Failed to read stdin: {}", e);
                break;
            }
        };

        let mut words = line.split_whitespace();
        match (words.next(), words.next()) {
            (Some("card"), Some(uid)) => match hex::decode(uid) {
                Ok(uid) => hardware.present_card(&uid),
                Err(e) => log::warn!("Bad card UID {:?}: {}", uid, e),
            },
            (Some("button"), None) => hardware.press_button(),
            (None, _) => {}
            _ => log::warn!("Unknown input {:?}, expected `card <HEX>` or `button`", line),
        }
    }
}
