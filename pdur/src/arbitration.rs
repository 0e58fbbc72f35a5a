//! Multiple-source arbitration.
//!
//! Several routing paths can funnel into one global destination. The
//! arbitration slot of a destination tracks which path owns the in-flight
//! transmission, so that at most one transmission per destination is
//! outstanding and the asynchronous callbacks of the lower layer
//! (TriggerTransmit, TxConfirmation, CancelTransmit and their
//! transport-protocol analogues) can be routed back to the originating
//! source.
//!
//! A callback that arrives while the destination is not armed, or armed by
//! a different path than expected, is dropped with a failure return and no
//! side effect. Misdirecting a callback to the wrong source would corrupt
//! an unrelated module's state; dropping it is the safe outcome.

use crate::{
    config::PathConfig,
    platform::{LowerLayer, TransferResult, UpperLayer},
    types::{Handle, PathId},
};

use core::fmt::{Display, Formatter};

/// A transmit attempt or callback could not be serviced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmitError {
    /// The destination is already armed by an in-flight transmission.
    Busy,
    /// The lower or upper layer rejected the call.
    Rejected,
    /// The destination is not armed by the expected source.
    NotArmed,
}

impl Display for TransmitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Busy => write!(f, "Destination is occupied by another transmission"),
            Self::Rejected => write!(f, "The neighbouring module rejected the call"),
            Self::NotArmed => write!(f, "No transmission is in flight for this destination"),
        }
    }
}

/// Per-destination arbitration state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ArbitrationSlot {
    /// No transmission is outstanding; the destination is free.
    #[default]
    Idle,
    /// The given path's transmission is outstanding.
    Armed(PathId),
}

impl ArbitrationSlot {
    /// Frees the destination. Used on group disable and queue flush.
    pub(crate) fn reset(&mut self) {
        *self = Self::Idle;
    }

    pub(crate) fn armed_path(&self) -> Option<PathId> {
        match self {
            Self::Idle => None,
            Self::Armed(path) => Some(*path),
        }
    }
}

/// Forwards a transmit to the lower layer if the destination is free, and
/// arms it on acceptance. A destination armed by any path, including
/// `path` itself, rejects the attempt; arming state is never overwritten.
pub(crate) fn if_transmit(
    slot: &mut ArbitrationSlot,
    path: PathId,
    dest: Handle,
    data: &[u8],
    lower: &dyn LowerLayer,
) -> Result<(), TransmitError> {
    if slot.armed_path().is_some() {
        return Err(TransmitError::Busy);
    }
    lower.if_transmit(dest, data)?;
    *slot = ArbitrationSlot::Armed(path);
    Ok(())
}

/// Forwards the lower layer's pull request to the armed path's source.
/// Dropped when the destination is idle; a stale request must not reach an
/// absent source.
pub(crate) fn trigger_transmit(
    slot: &ArbitrationSlot,
    paths: &[PathConfig],
    upper: &dyn UpperLayer,
    buf: &mut [u8],
) -> Result<usize, TransmitError> {
    let path = slot.armed_path().ok_or(TransmitError::NotArmed)?;
    let src = paths[path.0 as usize].src_handle;
    upper.trigger_transmit(src, buf)
}

/// Forwards the confirmation to the armed path's source and frees the
/// destination for the next transmit.
pub(crate) fn if_tx_confirmation(
    slot: &mut ArbitrationSlot,
    paths: &[PathConfig],
    upper: &dyn UpperLayer,
) -> Result<PathId, TransmitError> {
    let path = slot.armed_path().ok_or(TransmitError::NotArmed)?;
    upper.tx_confirmation(paths[path.0 as usize].src_handle);
    slot.reset();
    Ok(path)
}

/// Forwards a cancel request, but only for the path that owns the
/// in-flight transmission.
pub(crate) fn if_cancel_transmit(
    slot: &ArbitrationSlot,
    path: PathId,
    dest: Handle,
    lower: &dyn LowerLayer,
) -> Result<(), TransmitError> {
    if slot.armed_path() != Some(path) {
        return Err(TransmitError::NotArmed);
    }
    lower.if_cancel_transmit(dest)
}

/// Starts a transport-protocol transmission if the destination is free.
pub(crate) fn tp_transmit(
    slot: &mut ArbitrationSlot,
    path: PathId,
    dest: Handle,
    len: usize,
    lower: &dyn LowerLayer,
) -> Result<(), TransmitError> {
    if slot.armed_path().is_some() {
        return Err(TransmitError::Busy);
    }
    lower.tp_transmit(dest, len)?;
    *slot = ArbitrationSlot::Armed(path);
    Ok(())
}

/// Forwards a transport-protocol cancel request for the owning path.
pub(crate) fn tp_cancel_transmit(
    slot: &ArbitrationSlot,
    path: PathId,
    dest: Handle,
    lower: &dyn LowerLayer,
) -> Result<(), TransmitError> {
    if slot.armed_path() != Some(path) {
        return Err(TransmitError::NotArmed);
    }
    lower.tp_cancel_transmit(dest)
}

/// Forwards the lower layer's copy request to the armed path's source.
pub(crate) fn copy_tx_data(
    slot: &ArbitrationSlot,
    paths: &[PathConfig],
    upper: &dyn UpperLayer,
    buf: &mut [u8],
) -> Result<usize, TransmitError> {
    let path = slot.armed_path().ok_or(TransmitError::NotArmed)?;
    let src = paths[path.0 as usize].src_handle;
    upper.copy_tx_data(src, buf)
}

/// Forwards the transport-protocol completion to the armed path's source
/// and frees the destination.
pub(crate) fn tp_tx_confirmation(
    slot: &mut ArbitrationSlot,
    paths: &[PathConfig],
    upper: &dyn UpperLayer,
    result: TransferResult,
) -> Result<(), TransmitError> {
    let path = slot.armed_path().ok_or(TransmitError::NotArmed)?;
    upper.tp_tx_confirmation(paths[path.0 as usize].src_handle, result);
    slot.reset();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DestId, LengthHandling, SourceId};

    use core::cell::{Cell, RefCell};

    struct Lower {
        accept: Cell<bool>,
        sent: RefCell<heapless::Vec<Handle, 4>>,
        cancelled: RefCell<heapless::Vec<Handle, 4>>,
    }

    impl Lower {
        fn new() -> Self {
            Self {
                accept: Cell::new(true),
                sent: RefCell::new(heapless::Vec::new()),
                cancelled: RefCell::new(heapless::Vec::new()),
            }
        }
    }

    impl LowerLayer for Lower {
        fn if_transmit(&self, dest: Handle, _data: &[u8]) -> Result<(), TransmitError> {
            if !self.accept.get() {
                return Err(TransmitError::Rejected);
            }
            self.sent.borrow_mut().push(dest).unwrap();
            Ok(())
        }

        fn if_cancel_transmit(&self, dest: Handle) -> Result<(), TransmitError> {
            self.cancelled.borrow_mut().push(dest).unwrap();
            Ok(())
        }

        fn tp_transmit(&self, dest: Handle, _len: usize) -> Result<(), TransmitError> {
            self.if_transmit(dest, &[])
        }

        fn tp_cancel_transmit(&self, dest: Handle) -> Result<(), TransmitError> {
            self.if_cancel_transmit(dest)
        }
    }

    struct Upper {
        confirmed: RefCell<heapless::Vec<Handle, 4>>,
    }

    impl Upper {
        fn new() -> Self {
            Self {
                confirmed: RefCell::new(heapless::Vec::new()),
            }
        }
    }

    impl UpperLayer for Upper {
        fn rx_indication(&self, _dest: Handle, _data: &[u8]) {}

        fn trigger_transmit(&self, _src: Handle, buf: &mut [u8]) -> Result<usize, TransmitError> {
            buf[..2].copy_from_slice(b"TT");
            Ok(2)
        }

        fn tx_confirmation(&self, src: Handle) {
            self.confirmed.borrow_mut().push(src).unwrap();
        }

        fn copy_tx_data(&self, _src: Handle, _buf: &mut [u8]) -> Result<usize, TransmitError> {
            Ok(0)
        }

        fn tp_tx_confirmation(&self, src: Handle, _result: TransferResult) {
            self.confirmed.borrow_mut().push(src).unwrap();
        }
    }

    fn path(src_handle: u16) -> PathConfig {
        PathConfig {
            source: SourceId(0),
            dest: DestId(0),
            src_handle: Handle(src_handle),
            queued: false,
            length_handling: LengthHandling::Ignore,
            gateway: false,
        }
    }

    #[test]
    fn transmit_arms_the_destination() {
        let lower = Lower::new();
        let mut slot = ArbitrationSlot::Idle;
        if_transmit(&mut slot, PathId(1), Handle(10), b"A", &lower).unwrap();
        assert_eq!(slot, ArbitrationSlot::Armed(PathId(1)));
        assert_eq!(lower.sent.borrow().as_slice(), &[Handle(10)]);
    }

    #[test]
    fn concurrent_transmit_to_armed_destination_is_rejected() {
        let lower = Lower::new();
        let mut slot = ArbitrationSlot::Armed(PathId(1));
        assert_eq!(
            if_transmit(&mut slot, PathId(2), Handle(10), b"B", &lower),
            Err(TransmitError::Busy)
        );
        // Arming state of the first path is untouched
        assert_eq!(slot, ArbitrationSlot::Armed(PathId(1)));
        assert!(lower.sent.borrow().is_empty());
    }

    #[test]
    fn rejected_transmit_leaves_destination_idle() {
        let lower = Lower::new();
        lower.accept.set(false);
        let mut slot = ArbitrationSlot::Idle;
        assert_eq!(
            if_transmit(&mut slot, PathId(1), Handle(10), b"A", &lower),
            Err(TransmitError::Rejected)
        );
        assert_eq!(slot, ArbitrationSlot::Idle);
    }

    #[test]
    fn trigger_transmit_reaches_only_the_armed_source() {
        let upper = Upper::new();
        let paths = [path(5), path(6)];
        let mut buf = [0u8; 8];

        let slot = ArbitrationSlot::Idle;
        assert_eq!(
            trigger_transmit(&slot, &paths, &upper, &mut buf),
            Err(TransmitError::NotArmed)
        );

        let slot = ArbitrationSlot::Armed(PathId(1));
        let len = trigger_transmit(&slot, &paths, &upper, &mut buf).unwrap();
        assert_eq!(&buf[..len], b"TT");
    }

    #[test]
    fn confirmation_frees_the_destination() {
        let upper = Upper::new();
        let paths = [path(5)];
        let mut slot = ArbitrationSlot::Armed(PathId(0));
        if_tx_confirmation(&mut slot, &paths, &upper).unwrap();
        assert_eq!(slot, ArbitrationSlot::Idle);
        assert_eq!(upper.confirmed.borrow().as_slice(), &[Handle(5)]);

        // A second confirmation has nobody to go to and is dropped
        assert_eq!(
            if_tx_confirmation(&mut slot, &paths, &upper),
            Err(TransmitError::NotArmed)
        );
        assert_eq!(upper.confirmed.borrow().len(), 1);
    }

    #[test]
    fn cancel_requires_the_owning_path() {
        let lower = Lower::new();
        let slot = ArbitrationSlot::Armed(PathId(1));
        assert_eq!(
            if_cancel_transmit(&slot, PathId(2), Handle(10), &lower),
            Err(TransmitError::NotArmed)
        );
        if_cancel_transmit(&slot, PathId(1), Handle(10), &lower).unwrap();
        assert_eq!(lower.cancelled.borrow().as_slice(), &[Handle(10)]);
    }

    #[test]
    fn tp_confirmation_forwards_result_and_frees() {
        let upper = Upper::new();
        let paths = [path(9)];
        let mut slot = ArbitrationSlot::Armed(PathId(0));
        tp_tx_confirmation(&mut slot, &paths, &upper, TransferResult::Ok).unwrap();
        assert_eq!(slot, ArbitrationSlot::Idle);
        assert_eq!(upper.confirmed.borrow().as_slice(), &[Handle(9)]);
    }
}
