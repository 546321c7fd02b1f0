//! `tunnel-session` — a reliable, ordered byte stream over an unreliable
//! packet channel (DNS queries, ICMP, ...).
//!
//! # Architecture
//!
//! ```text
//!   application bytes          delivered bytes
//!        │ enqueue_send              ▲ Transport::deliver
//!  ┌─────▼───────────────────────────┴───┐
//!  │              Session                │  ◀── drive_pending_actions (owner tick)
//!  │  (FSM + seq numbers + byte queues)  │
//!  └─────┬───────────────────────────▲───┘
//!        │ Transport::send           │ handle_received
//!        ▼ logical packets           │ parsed packets
//!  ┌─────────────────────────────────┴───┐
//!  │   owner's framing + channel         │
//!  └─────────────────────────────────────┘
//! ```
//!
//! Each module has a single responsibility:
//! - [`session`]   — the session engine
//! - [`state`]     — FSM states and the inbound transition table
//! - [`packet`]    — logical SYN / MSG / FIN packets
//! - [`buffer`]    — byte queue for unacknowledged data
//! - [`seq`]       — 16-bit wrapping sequence arithmetic
//! - [`config`]    — per-session settings
//! - [`transport`] — owner-supplied send/deliver hooks
//! - [`error`]     — fatal session errors
//! - [`simulator`] — lossy in-memory channel and sink peer for testing

pub mod buffer;
pub mod config;
pub mod error;
pub mod packet;
pub mod seq;
pub mod session;
pub mod simulator;
pub mod state;
pub mod transport;

pub use config::SessionConfig;
pub use error::SessionError;
pub use packet::{Packet, PacketBody};
pub use session::{Outcome, Session};
pub use state::SessionState;
pub use transport::{Callbacks, Transport};
