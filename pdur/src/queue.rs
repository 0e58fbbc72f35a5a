//! Queue abstraction layer.
//!
//! Exactly one backing strategy is statically configured per destination.
//! [DestQueue] dispatches every operation to that strategy with an
//! identical contract, so the routing core never branches on the concrete
//! queue type except where the overflow policy differs.
//!
//! An operation the configured strategy does not support (such as `remove`
//! on a single buffer) returns [QueueError::Unsupported]. That is a
//! build-time misconfiguration; the router reports it to the diagnostic
//! channel and treats the call as a no-op. Nothing here panics.

use crate::{
    fifo::Fifo,
    platform::FmBackend,
    single_buffer::SingleBuffer,
    types::{DestId, PathId, QueueStrategy},
};

use core::fmt::{Display, Formatter};

/// An error occured while operating on a destination queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The queue is full; the entry was not enqueued.
    Full,
    /// The queue is empty; there is nothing to peek.
    Empty,
    /// The payload exceeds the configured slot length.
    TooLong,
    /// A derived index left the configured slot range.
    Bounds,
    /// The configured strategy does not support this operation.
    Unsupported,
}

impl Display for QueueError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Full => write!(f, "Queue is full"),
            Self::Empty => write!(f, "Queue is empty"),
            Self::TooLong => write!(f, "Payload exceeds slot length"),
            Self::Bounds => write!(f, "Index out of configured range"),
            Self::Unsupported => write!(f, "Operation not supported by the configured strategy"),
        }
    }
}

/// The queue of one buffered destination, backed by whichever strategy the
/// configuration selected.
#[derive(Debug)]
pub(crate) enum DestQueue<const Q: usize, const M: usize> {
    /// Latest-wins single slot.
    Single { buf: SingleBuffer<M>, init: u8 },
    /// Circular FIFO.
    Fifo(Fifo<Q, M>),
    /// Managed outside the router, reached through [FmBackend].
    External(DestId),
}

impl<const Q: usize, const M: usize> DestQueue<Q, M> {
    pub(crate) fn strategy(&self) -> QueueStrategy {
        match self {
            Self::Single { .. } => QueueStrategy::Single,
            Self::Fifo(_) => QueueStrategy::Fifo,
            Self::External(_) => QueueStrategy::External,
        }
    }

    /// Enqueues a PDU. Infallible for the single-buffer strategy.
    pub(crate) fn put(
        &mut self,
        fm: Option<&dyn FmBackend>,
        path: PathId,
        data: &[u8],
    ) -> Result<(), QueueError> {
        match self {
            Self::Single { buf, .. } => {
                buf.put(path, data);
                Ok(())
            }
            Self::Fifo(fifo) => fifo.put(path, data),
            Self::External(dest) => fm.ok_or(QueueError::Unsupported)?.put(*dest, path, data),
        }
    }

    /// Non-destructive peek of the oldest entry, copied into `buf`.
    /// Returns the writing path and the payload length.
    pub(crate) fn get(
        &self,
        fm: Option<&dyn FmBackend>,
        buf: &mut [u8],
    ) -> Result<(PathId, usize), QueueError> {
        match self {
            Self::Single { buf: slot, .. } => {
                let (path, data) = slot.get();
                copy_into(buf, data).map(|len| (path, len))
            }
            Self::Fifo(fifo) => {
                let (path, data) = fifo.get()?;
                copy_into(buf, data).map(|len| (path, len))
            }
            Self::External(dest) => fm.ok_or(QueueError::Unsupported)?.get(*dest, buf),
        }
    }

    /// Commits the oldest entry. A single buffer has no removable entries.
    pub(crate) fn remove(&mut self, fm: Option<&dyn FmBackend>) -> Result<(), QueueError> {
        match self {
            Self::Single { .. } => Err(QueueError::Unsupported),
            Self::Fifo(fifo) => {
                fifo.remove();
                Ok(())
            }
            Self::External(dest) => fm.ok_or(QueueError::Unsupported)?.remove(*dest),
        }
    }

    /// Discards all entries and restores the init state.
    pub(crate) fn flush(&mut self, fm: Option<&dyn FmBackend>) {
        match self {
            Self::Single { buf, init } => buf.flush(*init),
            Self::Fifo(fifo) => fifo.flush(),
            Self::External(dest) => {
                if let Some(fm) = fm {
                    fm.flush(*dest);
                }
            }
        }
    }

    /// Number of queued entries. A single buffer always holds exactly one
    /// value.
    pub(crate) fn fill_level(&self, fm: Option<&dyn FmBackend>) -> usize {
        match self {
            Self::Single { .. } => 1,
            Self::Fifo(fifo) => fifo.fill_level(),
            Self::External(dest) => fm.map(|fm| fm.fill_level(*dest)).unwrap_or(0),
        }
    }

    pub(crate) fn is_empty(&self, fm: Option<&dyn FmBackend>) -> bool {
        match self {
            Self::Single { .. } => false,
            Self::Fifo(fifo) => fifo.is_empty(),
            Self::External(dest) => fm.map(|fm| fm.fill_level(*dest) == 0).unwrap_or(true),
        }
    }
}

fn copy_into(buf: &mut [u8], data: &[u8]) -> Result<usize, QueueError> {
    let dst = buf.get_mut(..data.len()).ok_or(QueueError::Bounds)?;
    dst.copy_from_slice(data);
    Ok(data.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single() -> DestQueue<4, 8> {
        DestQueue::Single {
            buf: SingleBuffer::new(PathId(0), 8, 0x00),
            init: 0x00,
        }
    }

    #[test]
    fn single_buffer_never_empties() {
        let mut q = single();
        assert!(!q.is_empty(None));
        assert_eq!(q.fill_level(None), 1);
        q.put(None, PathId(1), b"AB").unwrap();
        assert_eq!(q.fill_level(None), 1);
    }

    #[test]
    fn remove_on_single_buffer_is_unsupported() {
        let mut q = single();
        assert_eq!(q.remove(None), Err(QueueError::Unsupported));
    }

    #[test]
    fn external_without_backend_is_unsupported() {
        let mut q: DestQueue<4, 8> = DestQueue::External(DestId(0));
        assert_eq!(q.put(None, PathId(0), b"A"), Err(QueueError::Unsupported));
        let mut buf = [0u8; 8];
        assert_eq!(q.get(None, &mut buf), Err(QueueError::Unsupported));
        assert_eq!(q.remove(None), Err(QueueError::Unsupported));
        assert_eq!(q.fill_level(None), 0);
    }

    #[test]
    fn fifo_contract_passes_through() {
        let mut q: DestQueue<4, 8> = DestQueue::Fifo(Fifo::new(2, 8));
        q.put(None, PathId(7), b"AAAA").unwrap();
        let mut buf = [0u8; 8];
        let (path, len) = q.get(None, &mut buf).unwrap();
        assert_eq!(path, PathId(7));
        assert_eq!(&buf[..len], b"AAAA");
        q.remove(None).unwrap();
        assert!(q.is_empty(None));
    }
}
