//! Randomized checks of the acknowledgement window and session-id filter.

use rand::Rng;

use tunnel_session::simulator::Mailbox;
use tunnel_session::{Packet, PacketBody, Session, SessionConfig, SessionState};

fn established(rng: &mut impl Rng, id: u16, peer_isn: u16) -> Session<Mailbox> {
    let isn: u16 = rng.random();
    let mut s = Session::with_identity(SessionConfig::default(), Mailbox::default(), id, isn);
    s.handle_received(Some(Packet::syn(id, peer_isn, None)))
        .unwrap();
    s
}

#[test]
fn fuzz_ack_window() {
    let mut rng = rand::rng();

    for _ in 0..2_000 {
        let id: u16 = rng.random();
        let peer_isn: u16 = rng.random();
        let mut s = established(&mut rng, id, peer_isn);

        let queued = rng.random_range(0..3_000usize);
        s.enqueue_send(&vec![0xAA; queued]).unwrap();

        let before = s.local_seq();
        // Half the time aim inside the window, otherwise anywhere.
        let ack: u16 = if rng.random_bool(0.5) {
            before.wrapping_add(rng.random_range(0..=queued) as u16)
        } else {
            rng.random()
        };
        let claimed = usize::from(ack.wrapping_sub(before));

        s.handle_received(Some(Packet::msg(id, peer_isn, ack, vec![1, 2])))
            .unwrap();

        if claimed <= queued {
            assert_eq!(s.outgoing_len(), queued - claimed);
            assert_eq!(s.local_seq(), ack);
            assert_eq!(s.peer_seq(), peer_isn.wrapping_add(2));
        } else {
            assert_eq!(s.outgoing_len(), queued);
            assert_eq!(s.local_seq(), before);
            assert_eq!(s.peer_seq(), peer_isn);
        }
    }
}

#[test]
fn fuzz_foreign_session_ids() {
    let mut rng = rand::rng();

    for _ in 0..2_000 {
        let id: u16 = rng.random();
        let peer_isn: u16 = rng.random();
        let mut s = established(&mut rng, id, peer_isn);
        s.enqueue_send(b"pending").unwrap();

        let mut foreign: u16 = rng.random();
        if foreign == id {
            foreign = id.wrapping_add(1);
        }
        let body = match rng.random_range(0..4) {
            0 => PacketBody::Syn {
                seq: rng.random(),
                options: 0,
                name: None,
            },
            1 => PacketBody::Msg {
                seq: peer_isn,
                ack: rng.random(),
                data: vec![7; rng.random_range(0..16)],
            },
            2 => PacketBody::Fin,
            _ => PacketBody::Unknown {
                packet_type: rng.random(),
            },
        };
        let packet = Packet {
            session_id: foreign,
            body,
        };

        let local = s.local_seq();
        assert_eq!(s.handle_received(Some(packet)), Ok(()));
        assert_eq!(s.state(), SessionState::Established);
        assert_eq!(s.local_seq(), local);
        assert_eq!(s.peer_seq(), peer_isn);
        assert_eq!(s.outgoing_len(), 7);
        assert!(s.transport().delivered.is_empty());
    }
}
