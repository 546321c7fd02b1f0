//! The session engine: one reliable, ordered byte stream over a lossy
//! packet channel.
//!
//! A [`Session`] owns the FSM state, both sequence counters and the two byte
//! queues.  It does no I/O and keeps no timers: outgoing packets go to the
//! owner's [`Transport`], and retransmission happens whenever the owner calls
//! [`Session::drive_pending_actions`].
//!
//! # Sequence-number layout
//!
//! ```text
//!  local_seq (oldest unacked byte)
//!      │
//!  ────┼──── outgoing queue (sent or not, all unacked) ────▶ seq space
//!      │<─ peer ack - local_seq ─>│
//!            (bytes trimmed when the ACK is valid)
//! ```
//!
//! Every MSG re-sends from `local_seq`, so a lost packet is repaired by the
//! next tick and a duplicate ACK can never trim the same bytes twice.

use log::{debug, error, info, warn};
use rand::Rng;

use crate::buffer::ByteQueue;
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::packet::Packet;
use crate::seq::{seq_add, seq_distance};
use crate::state::{transition, Event, SessionState, Transition};
use crate::transport::Transport;

/// What the owner should do after a lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The session is still live.
    Open,
    /// The final FIN went out; the session is closed and may be destroyed.
    Terminated,
}

impl Outcome {
    pub fn is_terminated(self) -> bool {
        self == Outcome::Terminated
    }
}

/// One connection's protocol state.
pub struct Session<T: Transport> {
    id: u16,
    state: SessionState,
    /// Sequence number of our oldest unacknowledged byte.
    local_seq: u16,
    /// Next sequence number expected from the peer.
    peer_seq: u16,
    max_packet_payload: usize,
    /// Owner asked to close; FIN goes out once both queues drain.
    closing: bool,
    name: Option<String>,
    trace_packets: bool,
    /// Application bytes not yet acknowledged by the peer.
    outgoing: ByteQueue,
    /// Reserved for reassembly; received data is delivered straight through.
    incoming: ByteQueue,
    transport: T,
}

impl<T: Transport> Session<T> {
    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Create a session with a random id and initial sequence number.
    pub fn new(config: SessionConfig, transport: T) -> Self {
        Self::with_rng(config, transport, &mut rand::rng())
    }

    /// Like [`new`](Self::new), drawing the id and ISN from `rng`.
    pub fn with_rng<R: Rng>(config: SessionConfig, transport: T, rng: &mut R) -> Self {
        let id: u16 = rng.random();
        let isn: u16 = rng.random();
        Self::with_identity(config, transport, id, isn)
    }

    /// Create a session with a caller-chosen id and initial sequence number.
    pub fn with_identity(config: SessionConfig, transport: T, id: u16, isn: u16) -> Self {
        info!("Creating a new session (id = 0x{id:04x}, ISN = 0x{isn:04x})");

        let max_packet_payload = config.max_packet_payload();
        if max_packet_payload == 0 {
            warn!(
                "max packet size {} leaves no room for data after {} bytes of framing",
                config.max_packet_size, config.msg_overhead
            );
        }

        Self {
            id,
            state: SessionState::New,
            local_seq: isn,
            peer_seq: 0,
            max_packet_payload,
            closing: false,
            name: config.name,
            trace_packets: config.trace_packets,
            outgoing: ByteQueue::new(),
            incoming: ByteQueue::new(),
            transport,
        }
    }

    /// Tear the session down and hand the transport back to the owner.
    pub fn destroy(self) -> T {
        info!("Cleaning up session 0x{:04x}", self.id);
        self.transport
    }

    /// Request an orderly shutdown.
    ///
    /// With nothing queued the final FIN goes out immediately and the call
    /// returns [`Outcome::Terminated`]; otherwise the FIN is deferred until a
    /// later [`drive_pending_actions`](Self::drive_pending_actions) finds both
    /// queues empty.
    pub fn close(&mut self) -> Result<Outcome, SessionError> {
        self.ensure_open()?;
        self.closing = true;

        if self.queues_drained() {
            self.finish();
            return Ok(Outcome::Terminated);
        }
        info!(
            "Close requested; {} bytes still waiting for the peer",
            self.outgoing.remaining()
        );
        Ok(Outcome::Open)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn local_seq(&self) -> u16 {
        self.local_seq
    }

    pub fn peer_seq(&self) -> u16 {
        self.peer_seq
    }

    pub fn max_packet_payload(&self) -> usize {
        self.max_packet_payload
    }

    pub fn is_closing(&self) -> bool {
        self.closing
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Replace the name carried by subsequent SYNs.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Bytes queued for sending and not yet acknowledged.
    pub fn outgoing_len(&self) -> usize {
        self.outgoing.remaining()
    }

    pub fn incoming_len(&self) -> usize {
        self.incoming.remaining()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    // -----------------------------------------------------------------------
    // Send side
    // -----------------------------------------------------------------------

    /// Queue application bytes and push them out if the session is
    /// established.
    pub fn enqueue_send(&mut self, data: &[u8]) -> Result<(), SessionError> {
        self.ensure_open()?;
        info!("Queuing {} bytes of data to send", data.len());
        self.outgoing.append(data);
        self.send_pending()
    }

    /// Periodic tick.
    ///
    /// Releases drained queues, (re)sends the SYN or the current MSG, and
    /// completes a requested close once nothing is left to deliver.  Safe to
    /// call as often as the owner likes; each call emits at most one data
    /// packet, which doubles as the carrier for our current ACK.
    pub fn drive_pending_actions(&mut self) -> Result<Outcome, SessionError> {
        self.ensure_open()?;
        self.clean_up_buffers();
        self.send_pending()?;

        if self.closing && self.queues_drained() {
            self.finish();
            return Ok(Outcome::Terminated);
        }
        Ok(Outcome::Open)
    }

    /// Emit the packet the current state calls for.
    fn send_pending(&mut self) -> Result<(), SessionError> {
        let packet = match self.state {
            SessionState::New => {
                info!(
                    "In {}, sending a SYN packet (SEQ = 0x{:04x})",
                    self.state, self.local_seq
                );
                Packet::syn(self.id, self.local_seq, self.name.as_deref())
            }
            SessionState::Established => {
                // Peek only: bytes stay queued until the peer ACKs them.
                let data = self.outgoing.peek(self.max_packet_payload).to_vec();
                info!(
                    "In {}, sending a MSG packet (SEQ = 0x{:04x}, ACK = 0x{:04x}, {} bytes of data)",
                    self.state,
                    self.local_seq,
                    self.peer_seq,
                    data.len()
                );
                Packet::msg(self.id, self.local_seq, self.peer_seq, data)
            }
            SessionState::Closed => return Err(SessionError::Closed),
        };
        self.transmit(&packet);
        Ok(())
    }

    fn transmit(&mut self, packet: &Packet) {
        if self.trace_packets {
            info!("SEND: {packet}");
        }
        self.transport.send(self.id, packet);
    }

    fn send_final_fin(&mut self) {
        info!("Sending the final FIN to the peer before closing");
        let fin = Packet::fin(self.id);
        self.transmit(&fin);
    }

    /// Orderly teardown: final FIN, then the terminal state.
    fn finish(&mut self) {
        self.send_final_fin();
        self.state = SessionState::Closed;
    }

    // -----------------------------------------------------------------------
    // Receive side
    // -----------------------------------------------------------------------

    /// Process one inbound packet.
    ///
    /// `None` means the transport failed to parse what arrived; that is fatal.
    /// Packets for another session, stale or duplicate MSGs and impossible
    /// ACKs are logged and dropped with `Ok(())`.  A FIN or an unknown packet
    /// type closes the session and is returned as an error.
    pub fn handle_received(&mut self, packet: Option<Packet>) -> Result<(), SessionError> {
        self.ensure_open()?;

        let Some(packet) = packet else {
            error!("Couldn't parse an incoming packet!");
            self.state = SessionState::Closed;
            return Err(SessionError::Malformed);
        };

        if self.trace_packets {
            info!("RECV: {packet}");
        }

        if packet.session_id != self.id {
            warn!(
                "Peer responded to an invalid session id! Received 0x{:04x}, expected 0x{:04x} (ignoring it)",
                packet.session_id, self.id
            );
            return Ok(());
        }

        let mut new_bytes_acked = false;

        match transition(self.state, Event::of(&packet.body)) {
            Transition::Establish { peer_isn } => {
                info!("In {}, received SYN (ISN = 0x{peer_isn:04x})", self.state);
                self.peer_seq = peer_isn;
                self.state = SessionState::Established;
            }
            Transition::ProcessMsg { seq, ack, data } => {
                debug!("In {}, received a MSG", self.state);
                new_bytes_acked = self.apply_msg(seq, ack, data);
            }
            Transition::Ignore(why) => {
                warn!("In {}, received {why} (ignoring)", self.state);
            }
            Transition::PeerClosed => {
                let state = self.state;
                error!("In {state}, received FIN - connection closed");
                self.state = SessionState::Closed;
                return Err(SessionError::PeerClosed { state });
            }
            Transition::UnknownType {
                packet_type,
                send_fin,
            } => {
                error!("Unknown packet type: 0x{packet_type:02x}");
                if send_fin {
                    self.send_final_fin();
                }
                self.state = SessionState::Closed;
                return Err(SessionError::UnknownPacketType(packet_type));
            }
            Transition::AlreadyClosed => return Err(SessionError::Closed),
        }

        // Keep data flowing on genuine progress; a bare re-ACK of nothing new
        // is left to the owner's tick.
        if new_bytes_acked && !self.outgoing.is_empty() {
            self.send_pending()?;
        }
        Ok(())
    }

    /// Validate and apply an in-state MSG.  Returns `true` when the ACK
    /// covered bytes that were not acknowledged before.
    fn apply_msg(&mut self, seq: u16, ack: u16, data: &[u8]) -> bool {
        if seq != self.peer_seq {
            warn!(
                "Bad SEQ received (got 0x{seq:04x}, expected 0x{:04x})",
                self.peer_seq
            );
            return false;
        }

        let bytes_acked = usize::from(seq_distance(self.local_seq, ack));
        if bytes_acked > self.outgoing.remaining() {
            warn!(
                "Bad ACK received ({bytes_acked} bytes acked; {} bytes in the buffer)",
                self.outgoing.remaining()
            );
            return false;
        }

        self.peer_seq = seq_add(self.peer_seq, data.len());
        self.outgoing.consume(bytes_acked);

        let progressed = bytes_acked != 0;
        if progressed {
            self.local_seq = seq_add(self.local_seq, bytes_acked);
            debug!(
                "{bytes_acked} bytes acknowledged; SEQ now 0x{:04x}",
                self.local_seq
            );
        }

        if !data.is_empty() {
            self.transport.deliver(self.id, data);
        }
        progressed
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.state == SessionState::Closed {
            return Err(SessionError::Closed);
        }
        Ok(())
    }

    fn queues_drained(&self) -> bool {
        self.outgoing.is_empty() && self.incoming.is_empty()
    }

    fn clean_up_buffers(&mut self) {
        if self.outgoing.clear() {
            debug!("outgoing queue drained; storage released");
        }
        self.incoming.clear();
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
