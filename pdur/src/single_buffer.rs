//! Single-slot overwrite buffer.
//!
//! The simplest queue strategy: one slot per destination, the latest value
//! wins. Used for periodic signals where only the newest sample matters.
//! There is no empty state and no failure mode; `get` before the first
//! `put` returns the configured init pattern at full slot length.

use crate::types::PathId;

use heapless::Vec;

/// A fixed-capacity single-slot buffer.
///
/// `M` is the compile-time slot capacity; the configured slot length may
/// be smaller.
#[derive(Debug, Clone)]
pub(crate) struct SingleBuffer<const M: usize> {
    path: PathId,
    slot_len: usize,
    data: Vec<u8, M>,
}

impl<const M: usize> SingleBuffer<M> {
    /// Creates the buffer in its init state: filled with `init` up to the
    /// configured slot length, attributed to the destination's default
    /// path.
    ///
    /// `slot_len` must not exceed `M`; the caller validates this against
    /// the configuration.
    pub(crate) fn new(default_path: PathId, slot_len: usize, init: u8) -> Self {
        let mut data = Vec::new();
        let _ = data.resize(slot_len, init);
        Self {
            path: default_path,
            slot_len,
            data,
        }
    }

    /// Overwrites the slot. Always succeeds; payloads longer than the
    /// configured slot length are truncated to it.
    pub(crate) fn put(&mut self, path: PathId, data: &[u8]) {
        let len = data.len().min(self.slot_len);
        self.data.clear();
        let _ = self.data.extend_from_slice(&data[..len]);
        self.path = path;
    }

    /// Returns the most recently written content and the path that wrote
    /// it.
    pub(crate) fn get(&self) -> (PathId, &[u8]) {
        (self.path, &self.data)
    }

    /// Resets the slot to its init state.
    pub(crate) fn flush(&mut self, init: u8) {
        self.data.clear();
        let _ = self.data.resize(self.slot_len, init);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_before_put_returns_init_pattern() {
        let buf: SingleBuffer<8> = SingleBuffer::new(PathId(3), 4, 0xA5);
        let (path, data) = buf.get();
        assert_eq!(path, PathId(3));
        assert_eq!(data, &[0xA5; 4]);
    }

    #[test]
    fn latest_put_wins() {
        let mut buf: SingleBuffer<8> = SingleBuffer::new(PathId(0), 8, 0x00);
        buf.put(PathId(1), b"AAAAAAAA");
        buf.put(PathId(2), b"BBBB");
        let (path, data) = buf.get();
        assert_eq!(path, PathId(2));
        assert_eq!(data, b"BBBB");
    }

    #[test]
    fn oversize_put_is_truncated_to_slot_length() {
        let mut buf: SingleBuffer<8> = SingleBuffer::new(PathId(0), 4, 0x00);
        buf.put(PathId(1), b"ABCDEF");
        let (_, data) = buf.get();
        assert_eq!(data, b"ABCD");
    }

    #[test]
    fn flush_restores_init_state() {
        let mut buf: SingleBuffer<8> = SingleBuffer::new(PathId(0), 4, 0xFF);
        buf.put(PathId(1), b"AB");
        buf.flush(0xFF);
        let (_, data) = buf.get();
        assert_eq!(data, &[0xFF; 4]);
    }
}
