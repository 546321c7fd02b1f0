//! Session finite-state machine (FSM) types and transition table.
//!
//! ```text
//!           SYN from peer               FIN from peer / fatal error
//!   NEW ───────────────────▶ ESTABLISHED ─────────────────────────▶ CLOSED
//!    │                            │                                   ▲
//!    │                            └── close() + queues drained ───────┤
//!    └── FIN from peer / close() with nothing queued / fatal error ───┘
//! ```
//!
//! [`transition`] is the whole inbound table: every `(state, event)` pair is
//! matched explicitly, so a new state or packet type fails to compile until
//! it is handled.  Applying the result (adopting sequence numbers, trimming
//! queues, emitting packets) lives in [`crate::session`].

use std::fmt;

use crate::packet::PacketBody;

/// All possible states of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Created; SYNs are sent until the peer answers with its own SYN.
    #[default]
    New,
    /// Peer's initial sequence number is known; MSGs flow both ways.
    Established,
    /// Terminal.  Reached by orderly teardown or a fatal error.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::New => "NEW",
            SessionState::Established => "ESTABLISHED",
            SessionState::Closed => "CLOSED",
        };
        f.write_str(s)
    }
}

/// Inbound packet reduced to the fields the transitions act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event<'a> {
    Syn { seq: u16 },
    Msg { seq: u16, ack: u16, data: &'a [u8] },
    Fin,
    Unknown(u8),
}

impl<'a> Event<'a> {
    pub fn of(body: &'a PacketBody) -> Self {
        match body {
            PacketBody::Syn { seq, .. } => Event::Syn { seq: *seq },
            PacketBody::Msg { seq, ack, data } => Event::Msg {
                seq: *seq,
                ack: *ack,
                data,
            },
            PacketBody::Fin => Event::Fin,
            PacketBody::Unknown { packet_type } => Event::Unknown(*packet_type),
        }
    }
}

/// Why an inbound packet was dropped without touching the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    /// MSG arrived before the handshake completed.
    MsgBeforeEstablished,
    /// Peer repeated its SYN after we were already established.
    DuplicateSyn,
}

impl fmt::Display for Ignored {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ignored::MsgBeforeEstablished => f.write_str("unexpected MSG"),
            Ignored::DuplicateSyn => f.write_str("duplicate SYN"),
        }
    }
}

/// What the session must do with an inbound packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition<'a> {
    /// Adopt the peer's initial sequence number and become established.
    Establish { peer_isn: u16 },
    /// Validate SEQ and ACK, then apply the MSG.
    ProcessMsg { seq: u16, ack: u16, data: &'a [u8] },
    /// Log and drop.
    Ignore(Ignored),
    /// The peer tore the connection down.
    PeerClosed,
    /// Unrecognized packet type.  `send_fin` requests a best-effort final FIN.
    UnknownType { packet_type: u8, send_fin: bool },
    /// Nothing may happen on a closed session.
    AlreadyClosed,
}

/// The inbound transition table.
pub fn transition(state: SessionState, event: Event<'_>) -> Transition<'_> {
    use SessionState::*;

    match (state, event) {
        (New, Event::Syn { seq }) => Transition::Establish { peer_isn: seq },
        (New, Event::Msg { .. }) => Transition::Ignore(Ignored::MsgBeforeEstablished),
        (New, Event::Fin) => Transition::PeerClosed,
        (New, Event::Unknown(packet_type)) => Transition::UnknownType {
            packet_type,
            send_fin: false,
        },

        (Established, Event::Syn { .. }) => Transition::Ignore(Ignored::DuplicateSyn),
        (Established, Event::Msg { seq, ack, data }) => {
            Transition::ProcessMsg { seq, ack, data }
        }
        (Established, Event::Fin) => Transition::PeerClosed,
        (Established, Event::Unknown(packet_type)) => Transition::UnknownType {
            packet_type,
            send_fin: true,
        },

        (Closed, _) => Transition::AlreadyClosed,
    }
}
