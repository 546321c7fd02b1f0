//! Collaborator interface between a session and its owner.
//!
//! The engine never touches the channel.  It hands finished logical packets
//! to [`Transport::send`], which frames and transmits them, and hands
//! validated in-order payload bytes to [`Transport::deliver`].  Both calls
//! are synchronous from the engine's point of view.
//!
//! Owners that prefer plain closures over a trait impl can use
//! [`Callbacks`]; the closures capture whatever context they need.

use crate::packet::Packet;

/// Outbound and inbound hooks for one session.
pub trait Transport {
    /// Frame `packet` and put it on the channel.
    fn send(&mut self, session_id: u16, packet: &Packet);

    /// Hand newly received application bytes to the owner.
    fn deliver(&mut self, session_id: u16, data: &[u8]);
}

/// A [`Transport`] made of two closures.
pub struct Callbacks<S, D> {
    send: S,
    deliver: D,
}

impl<S, D> Callbacks<S, D>
where
    S: FnMut(u16, &Packet),
    D: FnMut(u16, &[u8]),
{
    pub fn new(send: S, deliver: D) -> Self {
        Self { send, deliver }
    }
}

impl<S, D> Transport for Callbacks<S, D>
where
    S: FnMut(u16, &Packet),
    D: FnMut(u16, &[u8]),
{
    fn send(&mut self, session_id: u16, packet: &Packet) {
        (self.send)(session_id, packet)
    }

    fn deliver(&mut self, session_id: u16, data: &[u8]) {
        (self.deliver)(session_id, data)
    }
}
