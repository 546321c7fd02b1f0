//! Byte queue holding application data that is waiting for the peer.
//!
//! [`ByteQueue`] is append-at-tail, consume-from-head.  Consuming only moves
//! a read cursor; the storage behind it is reclaimed by [`ByteQueue::clear`],
//! which the session calls from its periodic tick once everything has been
//! consumed.
//!
//! ```text
//!  0            pos                      data.len()
//!  ├─ consumed ──┼──── remaining ─────────┤
//! ```

/// Growable FIFO of bytes with non-destructive peeking.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ByteQueue {
    data: Vec<u8>,
    /// Index of the first unconsumed byte.
    pos: usize,
}

impl ByteQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `bytes` at the tail.
    pub fn append(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Up to `max` unconsumed bytes from the head, left in place.
    pub fn peek(&self, max: usize) -> &[u8] {
        let end = self.pos + max.min(self.remaining());
        &self.data[self.pos..end]
    }

    /// Drop `n` bytes from the head.
    ///
    /// Callers validate `n` against [`remaining`](Self::remaining) first;
    /// an oversized `n` is clamped so the cursor never passes the tail.
    pub fn consume(&mut self, n: usize) {
        debug_assert!(
            n <= self.remaining(),
            "consume({n}) with only {} bytes remaining",
            self.remaining()
        );
        self.pos += n.min(self.remaining());
    }

    /// Bytes appended but not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Release the storage of a drained queue.
    ///
    /// Returns `true` if the queue was drained and has been reset; a queue
    /// that still holds unconsumed bytes is left untouched.
    pub fn clear(&mut self) -> bool {
        if !self.is_empty() {
            return false;
        }
        self.data.clear();
        self.pos = 0;
        true
    }

    /// Total bytes held in storage, consumed prefix included.
    pub fn allocated(&self) -> usize {
        self.data.len()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
