//! Logical packet definitions.
//!
//! A [`Packet`] is what the session engine consumes and produces.  Turning it
//! into bytes for the underlying channel (DNS query, ICMP payload, ...) and
//! parsing bytes back is the transport's job; no I/O or byte layout lives
//! here beyond the framing-overhead constant the engine needs to size MSG
//! payloads.
//!
//! # Packet types
//!
//! | Type | Code | Carries                               |
//! |------|------|---------------------------------------|
//! | SYN  | 0x00 | initial seq, options, optional name   |
//! | MSG  | 0x01 | seq, cumulative ack, payload          |
//! | FIN  | 0x02 | nothing beyond the session id         |

use std::fmt;

/// Numeric type tags as they appear in a packet header.
pub mod packet_type {
    pub const SYN: u8 = 0x00;
    pub const MSG: u8 = 0x01;
    pub const FIN: u8 = 0x02;
}

/// Bit-flag constants for the SYN `options` field.
pub mod syn_options {
    /// The SYN carries a session name.
    pub const NAME: u16 = 0x0001;
}

/// Framing bytes a MSG spends before its payload:
/// packet id(2) + type(1) + session id(2) + seq(2) + ack(2).
pub const MSG_HEADER_LEN: usize = 9;

/// Body of a packet, tagged by type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketBody {
    /// Connection establishment; `seq` is the sender's initial sequence number.
    Syn {
        seq: u16,
        options: u16,
        name: Option<String>,
    },
    /// Data transfer with a cumulative acknowledgement.
    Msg { seq: u16, ack: u16, data: Vec<u8> },
    /// Termination.
    Fin,
    /// A well-formed header whose type tag this layer does not know.
    Unknown { packet_type: u8 },
}

/// A parsed packet addressed to one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub session_id: u16,
    pub body: PacketBody,
}

impl Packet {
    /// Build a SYN; the NAME option is set iff `name` is present.
    pub fn syn(session_id: u16, seq: u16, name: Option<&str>) -> Self {
        let options = if name.is_some() { syn_options::NAME } else { 0 };
        Self {
            session_id,
            body: PacketBody::Syn {
                seq,
                options,
                name: name.map(str::to_owned),
            },
        }
    }

    pub fn msg(session_id: u16, seq: u16, ack: u16, data: Vec<u8>) -> Self {
        Self {
            session_id,
            body: PacketBody::Msg { seq, ack, data },
        }
    }

    pub fn fin(session_id: u16) -> Self {
        Self {
            session_id,
            body: PacketBody::Fin,
        }
    }

    /// The numeric type tag of this packet.
    pub fn packet_type(&self) -> u8 {
        match self.body {
            PacketBody::Syn { .. } => packet_type::SYN,
            PacketBody::Msg { .. } => packet_type::MSG,
            PacketBody::Fin => packet_type::FIN,
            PacketBody::Unknown { packet_type } => packet_type,
        }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.body {
            PacketBody::Syn { seq, options, name } => {
                write!(
                    f,
                    "SYN session=0x{:04x} seq=0x{seq:04x} options=0x{options:04x}",
                    self.session_id
                )?;
                if let Some(name) = name {
                    write!(f, " name={name:?}")?;
                }
                Ok(())
            }
            PacketBody::Msg { seq, ack, data } => write!(
                f,
                "MSG session=0x{:04x} seq=0x{seq:04x} ack=0x{ack:04x} len={}",
                self.session_id,
                data.len()
            ),
            PacketBody::Fin => write!(f, "FIN session=0x{:04x}", self.session_id),
            PacketBody::Unknown { packet_type } => write!(
                f,
                "UNKNOWN(0x{packet_type:02x}) session=0x{:04x}",
                self.session_id
            ),
        }
    }
}
