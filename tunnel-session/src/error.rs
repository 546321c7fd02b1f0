//! Errors surfaced by session operations.
//!
//! Only fatal conditions appear here.  Anomalies the session can shrug off
//! (wrong session id, stale SEQ, impossible ACK, out-of-state SYN or MSG) are
//! logged and dropped; they never reach the caller.

use thiserror::Error;

use crate::state::SessionState;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The transport could not parse an inbound packet.  There is no safe way
    /// to resynchronise without knowing what was on the wire.
    #[error("couldn't parse an incoming packet")]
    Malformed,

    /// The peer sent FIN.
    #[error("peer closed the connection while {state}")]
    PeerClosed { state: SessionState },

    /// The peer sent a packet type this layer does not know.
    #[error("unknown packet type: 0x{0:02x}")]
    UnknownPacketType(u8),

    /// The session already reached its terminal state.
    #[error("session is closed")]
    Closed,
}

impl SessionError {
    /// `true` when the owner should tear down the whole process rather than
    /// just this session.
    pub fn is_process_fatal(&self) -> bool {
        matches!(self, SessionError::Malformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            SessionError::PeerClosed {
                state: SessionState::New
            }
            .to_string(),
            "peer closed the connection while NEW"
        );
        assert_eq!(
            SessionError::UnknownPacketType(0x0a).to_string(),
            "unknown packet type: 0x0a"
        );
    }

    #[test]
    fn only_malformed_is_process_fatal() {
        assert!(SessionError::Malformed.is_process_fatal());
        assert!(!SessionError::Closed.is_process_fatal());
    }
}
