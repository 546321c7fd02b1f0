//! In-memory network simulator for deterministic testing.
//!
//! Real channels drop, reorder, and duplicate packets.  To exercise the
//! session's tick-driven retransmission without a real channel, this module
//! provides:
//!
//! | Piece        | Role                                                    |
//! |--------------|---------------------------------------------------------|
//! | [`LossyLink`]| one direction of the channel, with a seeded fault model |
//! | [`Mailbox`]  | a [`Transport`] that records sends and deliveries       |
//! | [`SinkPeer`] | the far end: answers SYNs, ACKs in-order data           |
//! | [`Loopback`] | a session and a sink peer wired through two links       |
//!
//! All randomness comes from a seeded `StdRng`, so a failing run replays
//! exactly.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::packet::{Packet, PacketBody};
use crate::seq::seq_add;
use crate::session::{Outcome, Session};
use crate::state::SessionState;
use crate::transport::Transport;

/// Configuration for the fault-injection model.
///
/// All probabilities are in the range `[0.0, 1.0]`; values outside it are
/// clamped.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Probability that any given packet is silently dropped.
    pub loss_rate: f64,
    /// Probability that a delivered packet arrives twice.
    pub duplicate_rate: f64,
    /// Probability that a packet overtakes ones already in flight.
    pub reorder_rate: f64,
    /// RNG seed.
    pub seed: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        // No faults by default: the link is a transparent pass-through.
        Self {
            loss_rate: 0.0,
            duplicate_rate: 0.0,
            reorder_rate: 0.0,
            seed: 0,
        }
    }
}

/// Counters kept by a [`LossyLink`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LinkStats {
    pub offered: u64,
    pub dropped: u64,
    pub duplicated: u64,
    pub reordered: u64,
}

// ---------------------------------------------------------------------------
// LossyLink
// ---------------------------------------------------------------------------

/// One direction of a faulty channel.
pub struct LossyLink {
    loss_rate: f64,
    duplicate_rate: f64,
    reorder_rate: f64,
    rng: StdRng,
    in_flight: VecDeque<Packet>,
    stats: LinkStats,
}

impl LossyLink {
    pub fn new(config: &SimulatorConfig) -> Self {
        Self {
            loss_rate: config.loss_rate.clamp(0.0, 1.0),
            duplicate_rate: config.duplicate_rate.clamp(0.0, 1.0),
            reorder_rate: config.reorder_rate.clamp(0.0, 1.0),
            rng: StdRng::seed_from_u64(config.seed),
            in_flight: VecDeque::new(),
            stats: LinkStats::default(),
        }
    }

    /// Offer a packet to the link, applying the fault model.
    pub fn transmit(&mut self, packet: Packet) {
        self.stats.offered += 1;

        if self.rng.random_bool(self.loss_rate) {
            self.stats.dropped += 1;
            return;
        }

        if self.rng.random_bool(self.duplicate_rate) {
            self.stats.duplicated += 1;
            self.in_flight.push_back(packet.clone());
        }

        if !self.in_flight.is_empty() && self.rng.random_bool(self.reorder_rate) {
            self.stats.reordered += 1;
            let at = self.rng.random_range(0..self.in_flight.len());
            self.in_flight.insert(at, packet);
        } else {
            self.in_flight.push_back(packet);
        }
    }

    /// Everything currently in flight, in arrival order.
    pub fn drain(&mut self) -> Vec<Packet> {
        self.in_flight.drain(..).collect()
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }
}

// ---------------------------------------------------------------------------
// Mailbox
// ---------------------------------------------------------------------------

/// A [`Transport`] that keeps what the session sends and delivers.
#[derive(Debug, Default)]
pub struct Mailbox {
    /// Packets sent since the last [`take_outbox`](Self::take_outbox).
    pub outbox: Vec<Packet>,
    /// Every application byte delivered so far.
    pub delivered: Vec<u8>,
    /// Total packets ever sent.
    pub sent_count: u64,
}

impl Mailbox {
    pub fn take_outbox(&mut self) -> Vec<Packet> {
        std::mem::take(&mut self.outbox)
    }
}

impl Transport for Mailbox {
    fn send(&mut self, _session_id: u16, packet: &Packet) {
        self.sent_count += 1;
        self.outbox.push(packet.clone());
    }

    fn deliver(&mut self, _session_id: u16, data: &[u8]) {
        self.delivered.extend_from_slice(data);
    }
}

// ---------------------------------------------------------------------------
// SinkPeer
// ---------------------------------------------------------------------------

/// Minimal remote end that accepts an upload.
///
/// Every SYN is answered with our own SYN, so a lost handshake packet is
/// repaired by the client's next SYN.  Every MSG is answered with a
/// zero-length MSG carrying the cumulative ACK, whether or not its data was
/// in order.
#[derive(Debug)]
pub struct SinkPeer {
    session_id: u16,
    isn: u16,
    /// Next sequence number expected from the client, once its SYN is seen.
    expected: Option<u16>,
    received: Vec<u8>,
    fin_received: bool,
    outbox: Vec<Packet>,
}

impl SinkPeer {
    pub fn new(session_id: u16, isn: u16) -> Self {
        Self {
            session_id,
            isn,
            expected: None,
            received: Vec::new(),
            fin_received: false,
            outbox: Vec::new(),
        }
    }

    pub fn handle(&mut self, packet: &Packet) {
        if packet.session_id != self.session_id {
            return;
        }

        match &packet.body {
            PacketBody::Syn { seq, .. } => {
                if self.expected.is_none() {
                    self.expected = Some(*seq);
                }
                self.outbox.push(Packet::syn(self.session_id, self.isn, None));
            }
            PacketBody::Msg { seq, data, .. } => {
                let Some(expected) = self.expected else {
                    return;
                };
                let mut ack = expected;
                if *seq == expected {
                    self.received.extend_from_slice(data);
                    ack = seq_add(expected, data.len());
                    self.expected = Some(ack);
                }
                self.outbox
                    .push(Packet::msg(self.session_id, self.isn, ack, Vec::new()));
            }
            PacketBody::Fin => self.fin_received = true,
            PacketBody::Unknown { .. } => {}
        }
    }

    pub fn take_outbox(&mut self) -> Vec<Packet> {
        std::mem::take(&mut self.outbox)
    }

    pub fn received(&self) -> &[u8] {
        &self.received
    }

    pub fn fin_received(&self) -> bool {
        self.fin_received
    }
}

// ---------------------------------------------------------------------------
// Loopback
// ---------------------------------------------------------------------------

/// A client session uploading to a [`SinkPeer`] over two [`LossyLink`]s.
pub struct Loopback {
    pub session: Session<Mailbox>,
    pub peer: SinkPeer,
    uplink: LossyLink,
    downlink: LossyLink,
}

impl Loopback {
    pub fn new(session_config: SessionConfig, sim: SimulatorConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(sim.seed);
        let session = Session::with_rng(session_config, Mailbox::default(), &mut rng);
        let peer = SinkPeer::new(session.id(), rng.random());

        let uplink = LossyLink::new(&SimulatorConfig {
            seed: sim.seed.wrapping_add(1),
            ..sim.clone()
        });
        let downlink = LossyLink::new(&SimulatorConfig {
            seed: sim.seed.wrapping_add(2),
            ..sim
        });

        Self {
            session,
            peer,
            uplink,
            downlink,
        }
    }

    /// Carry everything pending one round trip: session → peer → session.
    ///
    /// Replies that arrive after the session closed are discarded.
    pub fn exchange(&mut self) -> Result<(), SessionError> {
        for packet in self.session.transport_mut().take_outbox() {
            self.uplink.transmit(packet);
        }
        for packet in self.uplink.drain() {
            self.peer.handle(&packet);
        }
        for packet in self.peer.take_outbox() {
            self.downlink.transmit(packet);
        }
        for packet in self.downlink.drain() {
            if self.session.state() == SessionState::Closed {
                break;
            }
            self.session.handle_received(Some(packet))?;
        }
        Ok(())
    }

    /// One owner tick followed by a round trip.
    pub fn tick(&mut self) -> Result<Outcome, SessionError> {
        let outcome = self.session.drive_pending_actions()?;
        self.exchange()?;
        Ok(outcome)
    }

    pub fn uplink_stats(&self) -> LinkStats {
        self.uplink.stats()
    }

    pub fn downlink_stats(&self) -> LinkStats {
        self.downlink.stats()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_link_is_transparent() {
        let mut link = LossyLink::new(&SimulatorConfig::default());
        link.transmit(Packet::fin(1));
        link.transmit(Packet::fin(2));
        assert_eq!(link.drain(), vec![Packet::fin(1), Packet::fin(2)]);
        assert_eq!(link.stats().dropped, 0);
    }

    #[test]
    fn total_loss_drops_everything() {
        let mut link = LossyLink::new(&SimulatorConfig {
            loss_rate: 1.0,
            ..SimulatorConfig::default()
        });
        for i in 0..10 {
            link.transmit(Packet::fin(i));
        }
        assert!(link.drain().is_empty());
        assert_eq!(link.stats().dropped, 10);
    }

    #[test]
    fn certain_duplication_doubles_packets() {
        let mut link = LossyLink::new(&SimulatorConfig {
            duplicate_rate: 1.0,
            ..SimulatorConfig::default()
        });
        link.transmit(Packet::fin(3));
        assert_eq!(link.drain(), vec![Packet::fin(3), Packet::fin(3)]);
    }

    #[test]
    fn sink_peer_answers_syn_and_acks_data() {
        let mut peer = SinkPeer::new(9, 500);
        peer.handle(&Packet::syn(9, 100, None));
        peer.handle(&Packet::msg(9, 100, 500, b"abc".to_vec()));
        peer.handle(&Packet::msg(9, 100, 500, b"abc".to_vec())); // duplicate

        assert_eq!(peer.received(), b"abc");
        assert_eq!(
            peer.take_outbox(),
            vec![
                Packet::syn(9, 500, None),
                Packet::msg(9, 500, 103, vec![]),
                Packet::msg(9, 500, 103, vec![]),
            ]
        );
    }

    #[test]
    fn sink_peer_ignores_other_sessions() {
        let mut peer = SinkPeer::new(9, 500);
        peer.handle(&Packet::syn(10, 100, None));
        assert!(peer.take_outbox().is_empty());
    }

    #[test]
    fn loopback_handshake_over_clean_link() {
        let mut lb = Loopback::new(SessionConfig::default(), SimulatorConfig::default());
        assert_eq!(lb.tick(), Ok(Outcome::Open));
        assert_eq!(lb.session.state(), SessionState::Established);
    }
}
