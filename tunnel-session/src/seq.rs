//! 16-bit sequence-number arithmetic.
//!
//! Sequence numbers count bytes and live in a 16-bit space that wraps modulo
//! 65536.  Wrap-around is normal operation, never an error: a session that
//! starts at `0xFFFE` and sends four bytes ends up at `0x0002`.
//!
//! All helpers here are pure; [`crate::session::Session`] is the only caller
//! that mutates sequence state.

/// Advance `seq` by `len` bytes, wrapping modulo 65536.
///
/// `len` may exceed `u16::MAX`; only its low 16 bits matter in this space.
#[inline]
pub fn seq_add(seq: u16, len: usize) -> u16 {
    seq.wrapping_add(len as u16)
}

/// Number of bytes between `base` and `ahead`, i.e. `ahead - base` modulo
/// 65536.
///
/// Used to turn a peer's cumulative ACK into a byte count relative to our
/// oldest unacknowledged byte.  A value "behind" `base` comes out as a very
/// large distance, which the ack-window check then rejects.
#[inline]
pub fn seq_distance(base: u16, ahead: u16) -> u16 {
    ahead.wrapping_sub(base)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
