//! Entry point for `tunnel-session`.
//!
//! Runs an upload through the in-memory simulator: one client session sends
//! random bytes to a sink peer across a lossy link, driven by a periodic tick
//! exactly as a real owner would drive it from its event loop.  `main.rs`
//! owns only process setup (logging, argument parsing) and the tick loop.

use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tunnel_session::simulator::{Loopback, SimulatorConfig};
use tunnel_session::SessionConfig;

/// Reliable session layer over a simulated lossy packet channel.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Number of random bytes to upload.
    #[arg(long, default_value_t = 4096)]
    bytes: usize,

    /// Largest packet the channel carries, framing included.
    #[arg(long, default_value_t = 64)]
    max_packet_size: usize,

    /// Probability that a packet is dropped.
    #[arg(long, default_value_t = 0.1)]
    loss_rate: f64,

    /// Probability that a packet is duplicated.
    #[arg(long, default_value_t = 0.0)]
    duplicate_rate: f64,

    /// Probability that a packet overtakes earlier ones.
    #[arg(long, default_value_t = 0.0)]
    reorder_rate: f64,

    /// Seed for the simulator and the payload.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Milliseconds between ticks.
    #[arg(long, default_value_t = 5)]
    tick_ms: u64,

    /// Give up after this many ticks.
    #[arg(long, default_value_t = 100_000)]
    max_ticks: u64,

    /// Session name sent in the SYN.
    #[arg(long)]
    name: Option<String>,

    /// Log every packet sent and received.
    #[arg(long)]
    trace: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::init();

    let cli = Cli::parse();

    let session_config = SessionConfig {
        max_packet_size: cli.max_packet_size,
        name: cli.name,
        trace_packets: cli.trace,
        ..SessionConfig::default()
    };
    let sim = SimulatorConfig {
        loss_rate: cli.loss_rate,
        duplicate_rate: cli.duplicate_rate,
        reorder_rate: cli.reorder_rate,
        seed: cli.seed,
    };

    let mut payload = vec![0u8; cli.bytes];
    StdRng::seed_from_u64(cli.seed).fill(payload.as_mut_slice());

    let mut link = Loopback::new(session_config, sim);
    log::info!(
        "Uploading {} bytes on session 0x{:04x}",
        payload.len(),
        link.session.id()
    );

    link.session.enqueue_send(&payload)?;

    // FIN goes out once everything queued has been acknowledged.
    let mut ticks = 0u64;
    if link.session.close()?.is_terminated() {
        link.exchange()?;
    } else {
        let mut interval = tokio::time::interval(Duration::from_millis(cli.tick_ms));
        loop {
            interval.tick().await;
            ticks += 1;
            if ticks > cli.max_ticks {
                bail!(
                    "transfer stalled: {} bytes unacknowledged after {} ticks",
                    link.session.outgoing_len(),
                    cli.max_ticks
                );
            }
            if link.tick()?.is_terminated() {
                break;
            }
        }
    }

    if link.peer.received() != payload.as_slice() {
        bail!(
            "peer received {} bytes that do not match the {} bytes sent",
            link.peer.received().len(),
            payload.len()
        );
    }

    let up = link.uplink_stats();
    let down = link.downlink_stats();
    println!(
        "delivered {} bytes in {} ticks ({} packets sent)",
        payload.len(),
        ticks,
        link.session.transport().sent_count
    );
    println!(
        "uplink:   offered {} dropped {} duplicated {} reordered {}",
        up.offered, up.dropped, up.duplicated, up.reordered
    );
    println!(
        "downlink: offered {} dropped {} duplicated {} reordered {}",
        down.offered, down.dropped, down.duplicated, down.reordered
    );
    Ok(())
}
