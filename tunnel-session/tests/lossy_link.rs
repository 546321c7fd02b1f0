//! Integration tests for transfers through the simulated channel.
//!
//! A client session uploads to a sink peer over two lossy links.  The only
//! retransmission trigger is the owner's tick, so these tests check that the
//! tick alone is enough to push every byte through, in order, and to finish
//! with a FIN.

use std::time::Duration;

use tunnel_session::simulator::{Loopback, SimulatorConfig};
use tunnel_session::{Outcome, SessionConfig, SessionState};

/// Deterministic, non-trivial payload.
fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

/// Queue `data`, request close, and tick until the session terminates.
/// Returns the number of ticks taken.
fn upload(link: &mut Loopback, data: &[u8], max_ticks: u32) -> u32 {
    link.session.enqueue_send(data).expect("enqueue");
    if link.session.close().expect("close").is_terminated() {
        link.exchange().expect("exchange");
        return 0;
    }

    for tick in 1..=max_ticks {
        if link.tick().expect("tick").is_terminated() {
            return tick;
        }
    }
    panic!(
        "transfer stalled with {} bytes unacknowledged",
        link.session.outgoing_len()
    );
}

// ---------------------------------------------------------------------------
// Clean channel
// ---------------------------------------------------------------------------

#[test]
fn clean_link_delivers_everything_and_fin() {
    let data = payload(1000);
    let mut link = Loopback::new(
        SessionConfig::with_max_packet_size(64),
        SimulatorConfig::default(),
    );

    upload(&mut link, &data, 1_000);

    assert_eq!(link.peer.received(), data.as_slice());
    assert!(link.peer.fin_received());
    assert_eq!(link.session.state(), SessionState::Closed);
    assert_eq!(link.uplink_stats().dropped, 0);
}

#[test]
fn transfer_larger_than_sequence_space() {
    // More than 65536 bytes: both sides' counters wrap at least once.
    let data = payload(70_000);
    let mut link = Loopback::new(
        SessionConfig::with_max_packet_size(255),
        SimulatorConfig {
            seed: 11,
            ..SimulatorConfig::default()
        },
    );

    upload(&mut link, &data, 5_000);

    assert_eq!(link.peer.received().len(), data.len());
    assert_eq!(link.peer.received(), data.as_slice());
}

#[test]
fn empty_upload_closes_immediately() {
    let mut link = Loopback::new(SessionConfig::default(), SimulatorConfig::default());

    assert_eq!(upload(&mut link, &[], 10), 0);
    assert!(link.peer.fin_received());
    assert!(link.peer.received().is_empty());
}

// ---------------------------------------------------------------------------
// Faulty channel
// ---------------------------------------------------------------------------

#[test]
fn lossy_link_still_delivers_in_order() {
    let data = payload(3_000);

    for seed in 1..=8u64 {
        let mut link = Loopback::new(
            SessionConfig::with_max_packet_size(48),
            SimulatorConfig {
                loss_rate: 0.3,
                seed,
                ..SimulatorConfig::default()
            },
        );

        upload(&mut link, &data, 20_000);

        assert_eq!(link.peer.received(), data.as_slice(), "seed {seed}");
        assert!(link.uplink_stats().dropped > 0, "seed {seed}");
    }
}

#[test]
fn duplicated_and_reordered_packets_are_harmless() {
    let data = payload(2_000);

    for seed in 20..=25u64 {
        let mut link = Loopback::new(
            SessionConfig::with_max_packet_size(40),
            SimulatorConfig {
                loss_rate: 0.1,
                duplicate_rate: 0.3,
                reorder_rate: 0.3,
                seed,
            },
        );

        upload(&mut link, &data, 20_000);

        assert_eq!(link.peer.received(), data.as_slice(), "seed {seed}");
    }
}

#[test]
fn total_loss_makes_no_progress() {
    let mut link = Loopback::new(
        SessionConfig::default(),
        SimulatorConfig {
            loss_rate: 1.0,
            ..SimulatorConfig::default()
        },
    );
    link.session.enqueue_send(b"never arrives").unwrap();

    for _ in 0..50 {
        assert_eq!(link.tick(), Ok(Outcome::Open));
    }
    assert_eq!(link.session.state(), SessionState::New);
    assert_eq!(link.session.outgoing_len(), 13);
    assert_eq!(link.session.transport().sent_count, 51);
}

// ---------------------------------------------------------------------------
// Timer-driven owner
// ---------------------------------------------------------------------------

/// The owner drives the session from a tokio interval, the way an event loop
/// would.
#[tokio::test(start_paused = true)]
async fn interval_driven_upload() {
    let data = payload(1_500);
    let mut link = Loopback::new(
        SessionConfig::with_max_packet_size(100),
        SimulatorConfig {
            loss_rate: 0.2,
            seed: 99,
            ..SimulatorConfig::default()
        },
    );

    link.session.enqueue_send(&data).unwrap();
    assert_eq!(link.session.close(), Ok(Outcome::Open));

    let mut interval = tokio::time::interval(Duration::from_millis(10));
    let mut ticks = 0u32;
    loop {
        interval.tick().await;
        ticks += 1;
        assert!(ticks < 10_000, "transfer stalled");
        if link.tick().unwrap().is_terminated() {
            break;
        }
    }

    assert_eq!(link.peer.received(), data.as_slice());
}
