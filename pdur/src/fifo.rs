//! Circular FIFO of complete PDUs.
//!
//! Read and write indices wrap around a fixed slot range. A full queue has
//! read == write just like an empty one, so fullness is tracked in an
//! explicit flag that is authoritative: it is set when a write catches up
//! with the read index and cleared by the next remove, never recomputed
//! from the indices.
//!
//! Peek ([Fifo::get]) and commit ([Fifo::remove]) are separate operations.
//! This lets the caller attempt a transmission of the oldest entry and
//! only dequeue it once the lower layer has confirmed it.

use crate::{queue::QueueError, types::PathId};

use heapless::Vec;

#[derive(Debug, Default, Clone)]
struct Slot<const M: usize> {
    path: PathId,
    data: Vec<u8, M>,
}

/// A fixed-capacity circular queue of PDUs.
///
/// `Q` is the compile-time slot count, `M` the compile-time slot capacity;
/// the configured depth and slot length may be smaller.
#[derive(Debug, Clone)]
pub(crate) struct Fifo<const Q: usize, const M: usize> {
    slots: Vec<Slot<M>, Q>,
    depth: usize,
    slot_len: usize,
    read: usize,
    write: usize,
    full: bool,
}

impl<const Q: usize, const M: usize> Fifo<Q, M> {
    /// Creates an empty queue of `depth` slots of `slot_len` bytes each.
    ///
    /// `depth <= Q` and `slot_len <= M` must hold; the caller validates
    /// this against the configuration.
    pub(crate) fn new(depth: usize, slot_len: usize) -> Self {
        let mut slots = Vec::new();
        let _ = slots.resize_default(depth);
        Self {
            slots,
            depth,
            slot_len,
            read: 0,
            write: 0,
            full: false,
        }
    }

    /// Returns the stored full flag.
    pub(crate) fn is_full(&self) -> bool {
        self.full
    }

    /// The queue is empty when the indices meet and the full flag is
    /// clear.
    pub(crate) fn is_empty(&self) -> bool {
        self.read == self.write && !self.full
    }

    fn advance(&self, index: usize) -> usize {
        let next = index + 1;
        if next == self.depth {
            0
        } else {
            next
        }
    }

    /// Enqueues a PDU.
    ///
    /// Fails without touching existing entries if the queue is full, if
    /// the payload exceeds the configured slot length (rejected, never
    /// truncated), or if the write index has left the configured slot
    /// range (a defensive check; this indicates a misconfiguration and is
    /// reported by the caller).
    pub(crate) fn put(&mut self, path: PathId, data: &[u8]) -> Result<(), QueueError> {
        if self.full {
            return Err(QueueError::Full);
        }
        if data.len() > self.slot_len {
            return Err(QueueError::TooLong);
        }
        let slot = self.slots.get_mut(self.write).ok_or(QueueError::Bounds)?;
        slot.path = path;
        slot.data.clear();
        let _ = slot.data.extend_from_slice(data);
        self.write = self.advance(self.write);
        if self.write == self.read {
            self.full = true;
        }
        Ok(())
    }

    /// Non-destructive peek of the oldest entry and the path that wrote
    /// it. The read index does not move.
    pub(crate) fn get(&self) -> Result<(PathId, &[u8]), QueueError> {
        if self.is_empty() {
            return Err(QueueError::Empty);
        }
        let slot = self.slots.get(self.read).ok_or(QueueError::Bounds)?;
        Ok((slot.path, &slot.data))
    }

    /// Commits the oldest entry: advances the read index and clears the
    /// full flag. No effect on an empty queue.
    pub(crate) fn remove(&mut self) {
        if self.is_empty() {
            return;
        }
        self.read = self.advance(self.read);
        self.full = false;
    }

    /// Discards all entries.
    pub(crate) fn flush(&mut self) {
        self.read = 0;
        self.write = 0;
        self.full = false;
    }

    /// Number of queued entries, computed from the index difference with
    /// wraparound; the ambiguous read == write case is resolved by the
    /// full flag.
    pub(crate) fn fill_level(&self) -> usize {
        if self.read == self.write {
            if self.full {
                self.depth
            } else {
                0
            }
        } else if self.write > self.read {
            self.write - self.read
        } else {
            self.depth - self.read + self.write
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(n: usize) -> Fifo<4, 8> {
        let mut q = Fifo::new(4, 8);
        for i in 0..n {
            q.put(PathId(i as u16), &[i as u8; 8]).unwrap();
        }
        q
    }

    #[test]
    fn starts_empty() {
        let q: Fifo<4, 8> = Fifo::new(4, 8);
        assert!(q.is_empty());
        assert!(!q.is_full());
        assert_eq!(q.fill_level(), 0);
        assert_eq!(q.get(), Err(QueueError::Empty));
    }

    #[test]
    fn fifo_order_is_preserved() {
        let mut q: Fifo<4, 8> = Fifo::new(4, 8);
        for pdu in [b"AAAAAAAA", b"BBBBBBBB", b"CCCCCCCC"] {
            q.put(PathId(0), pdu).unwrap();
        }
        for pdu in [b"AAAAAAAA", b"BBBBBBBB", b"CCCCCCCC"] {
            let (_, data) = q.get().unwrap();
            assert_eq!(data, pdu);
            q.remove();
        }
        assert!(q.is_empty());
    }

    #[test]
    fn full_and_empty_are_disambiguated() {
        let mut q = filled(4);
        // read == write, but the flag says full
        assert!(q.is_full());
        assert!(!q.is_empty());
        assert_eq!(q.fill_level(), 4);
        q.remove();
        assert!(!q.is_full());
        assert_eq!(q.fill_level(), 3);
    }

    #[test]
    fn put_on_full_queue_fails_without_corruption() {
        let mut q = filled(4);
        assert_eq!(q.put(PathId(9), &[0xFF; 8]), Err(QueueError::Full));
        let (path, data) = q.get().unwrap();
        assert_eq!(path, PathId(0));
        assert_eq!(data, &[0u8; 8]);
        assert_eq!(q.fill_level(), 4);
    }

    #[test]
    fn oversize_put_is_rejected() {
        let mut q: Fifo<4, 8> = Fifo::new(4, 4);
        assert_eq!(q.put(PathId(0), &[0; 5]), Err(QueueError::TooLong));
        assert!(q.is_empty());
    }

    #[test]
    fn peek_does_not_dequeue() {
        let q = filled(2);
        assert_eq!(q.get().unwrap().0, PathId(0));
        assert_eq!(q.get().unwrap().0, PathId(0));
        assert_eq!(q.fill_level(), 2);
    }

    #[test]
    fn flush_discards_everything() {
        let mut q = filled(3);
        q.flush();
        assert!(q.is_empty());
        assert_eq!(q.fill_level(), 0);
    }

    #[test]
    fn indices_wrap_around() {
        let mut q = filled(4);
        // Remove-then-refill pushes both indices across the end of the
        // slot range several times; order must survive the wrap.
        for i in 0..6u16 {
            let (path, _) = q.get().unwrap();
            assert_eq!(path, PathId(i));
            q.remove();
            q.put(PathId(i + 4), &[0; 1]).unwrap();
        }
        assert_eq!(q.fill_level(), 4);
    }

    #[test]
    fn fill_level_tracks_wrapped_indices() {
        let mut q = filled(3);
        q.remove();
        q.remove();
        q.put(PathId(5), &[1; 2]).unwrap(); // write wraps past the end
        assert_eq!(q.fill_level(), 2);
    }
}
