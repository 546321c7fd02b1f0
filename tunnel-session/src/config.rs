//! Per-session configuration.

use crate::packet::MSG_HEADER_LEN;

/// Settings fixed when a session is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Largest packet the channel can carry, framing included.
    pub max_packet_size: usize,
    /// Framing bytes a MSG spends before its payload.
    pub msg_overhead: usize,
    /// Label sent to the peer in the SYN.
    pub name: Option<String>,
    /// Log every packet sent and received (`SEND:` / `RECV:` lines).
    pub trace_packets: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_packet_size: 200,
            msg_overhead: MSG_HEADER_LEN,
            name: None,
            trace_packets: false,
        }
    }
}

impl SessionConfig {
    pub fn with_max_packet_size(max_packet_size: usize) -> Self {
        Self {
            max_packet_size,
            ..Self::default()
        }
    }

    /// Application bytes one MSG may carry.
    pub fn max_packet_payload(&self) -> usize {
        self.max_packet_size.saturating_sub(self.msg_overhead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_subtracts_msg_header() {
        let c = SessionConfig::with_max_packet_size(100);
        assert_eq!(c.max_packet_payload(), 100 - MSG_HEADER_LEN);
    }

    #[test]
    fn payload_saturates_at_zero() {
        let c = SessionConfig::with_max_packet_size(4);
        assert_eq!(c.max_packet_payload(), 0);
    }
}
