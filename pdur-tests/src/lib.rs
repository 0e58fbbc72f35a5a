//! Mock platform modules for driving a router from integration tests.
//!
//! Every mock records the calls it receives in interior-mutable state, so
//! a test can hand shared references into [Platform] and still inspect
//! what the router did afterwards.

use pdur::prelude::*;

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

/// Scriptable lower layer. Accepts or rejects transmit requests depending
/// on [MockLower::accept] and records everything it sees.
#[derive(Debug)]
pub struct MockLower {
    /// Whether transmit requests are currently accepted.
    pub accept: Cell<bool>,
    /// Accepted interface transmissions, in order.
    pub transmitted: RefCell<Vec<(Handle, Vec<u8>)>>,
    /// Accepted transport-protocol transmissions, in order.
    pub tp_started: RefCell<Vec<(Handle, usize)>>,
    /// Received interface cancel requests.
    pub cancelled: RefCell<Vec<Handle>>,
    /// Received transport-protocol cancel requests.
    pub tp_cancelled: RefCell<Vec<Handle>>,
}

impl MockLower {
    pub fn new() -> Self {
        Self {
            accept: Cell::new(true),
            transmitted: RefCell::default(),
            tp_started: RefCell::default(),
            cancelled: RefCell::default(),
            tp_cancelled: RefCell::default(),
        }
    }
}

impl Default for MockLower {
    fn default() -> Self {
        Self::new()
    }
}

impl LowerLayer for MockLower {
    fn if_transmit(&self, dest: Handle, data: &[u8]) -> Result<(), TransmitError> {
        if !self.accept.get() {
            return Err(TransmitError::Rejected);
        }
        self.transmitted.borrow_mut().push((dest, data.to_vec()));
        Ok(())
    }

    fn if_cancel_transmit(&self, dest: Handle) -> Result<(), TransmitError> {
        self.cancelled.borrow_mut().push(dest);
        Ok(())
    }

    fn tp_transmit(&self, dest: Handle, len: usize) -> Result<(), TransmitError> {
        if !self.accept.get() {
            return Err(TransmitError::Rejected);
        }
        self.tp_started.borrow_mut().push((dest, len));
        Ok(())
    }

    fn tp_cancel_transmit(&self, dest: Handle) -> Result<(), TransmitError> {
        self.tp_cancelled.borrow_mut().push(dest);
        Ok(())
    }
}

/// Recording upper layer. Pull-style requests are served from
/// [MockUpper::pull_data].
#[derive(Debug, Default)]
pub struct MockUpper {
    /// Received indications, in order.
    pub indications: RefCell<Vec<(Handle, Vec<u8>)>>,
    /// Received Tx confirmations, in order.
    pub confirmations: RefCell<Vec<Handle>>,
    /// Received transport-protocol completions, in order.
    pub tp_confirmations: RefCell<Vec<(Handle, TransferResult)>>,
    /// Payload served to TriggerTransmit and CopyTxData pulls. An empty
    /// payload makes the pull fail.
    pub pull_data: RefCell<Vec<u8>>,
}

impl UpperLayer for MockUpper {
    fn rx_indication(&self, dest: Handle, data: &[u8]) {
        self.indications.borrow_mut().push((dest, data.to_vec()));
    }

    fn trigger_transmit(&self, _src: Handle, buf: &mut [u8]) -> Result<usize, TransmitError> {
        let data = self.pull_data.borrow();
        if data.is_empty() || data.len() > buf.len() {
            return Err(TransmitError::Rejected);
        }
        buf[..data.len()].copy_from_slice(&data);
        Ok(data.len())
    }

    fn tx_confirmation(&self, src: Handle) {
        self.confirmations.borrow_mut().push(src);
    }

    fn copy_tx_data(&self, src: Handle, buf: &mut [u8]) -> Result<usize, TransmitError> {
        self.trigger_transmit(src, buf)
    }

    fn tp_tx_confirmation(&self, src: Handle, result: TransferResult) {
        self.tp_confirmations.borrow_mut().push((src, result));
    }
}

/// Diagnostic sink that records every report.
#[derive(Debug, Default)]
pub struct MockDiag {
    pub reports: RefCell<Vec<(ApiId, ReportedError)>>,
    pub overflows: RefCell<Vec<DestId>>,
}

impl Diagnostics for MockDiag {
    fn report(&self, api: ApiId, error: ReportedError) {
        self.reports.borrow_mut().push((api, error));
    }

    fn queue_overflow(&self, dest: DestId) {
        self.overflows.borrow_mut().push(dest);
    }
}

/// Lock provider that records destination critical sections.
#[derive(Debug, Default)]
pub struct MockLocks {
    /// Destinations whose critical section was entered, in order.
    pub dest_sections: RefCell<Vec<DestId>>,
    depth: Cell<i32>,
}

impl MockLocks {
    /// Every entered section has been left again.
    pub fn balanced(&self) -> bool {
        self.depth.get() == 0
    }
}

impl Locking for MockLocks {
    fn enter_dest(&self, dest: DestId) {
        self.dest_sections.borrow_mut().push(dest);
        self.depth.set(self.depth.get() + 1);
    }

    fn exit_dest(&self, _dest: DestId) {
        self.depth.set(self.depth.get() - 1);
    }

    fn enter_path(&self, _path: PathId) {}

    fn exit_path(&self, _path: PathId) {}
}

/// Bounded cross-partition channel stand-in.
#[derive(Debug)]
pub struct MockChannel {
    capacity: usize,
    /// Delivered PDUs, in order.
    pub sent: RefCell<Vec<(PathId, Vec<u8>)>>,
}

impl MockChannel {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            sent: RefCell::default(),
        }
    }
}

impl McChannel for MockChannel {
    fn try_send(&self, path: PathId, data: &[u8]) -> Result<(), McChannelFull> {
        let mut sent = self.sent.borrow_mut();
        if sent.len() >= self.capacity {
            return Err(McChannelFull);
        }
        sent.push((path, data.to_vec()));
        Ok(())
    }
}

/// Externally managed queue strategy backed by one `VecDeque` per
/// destination.
#[derive(Debug)]
pub struct MockFm {
    capacity: usize,
    queues: RefCell<Vec<VecDeque<(PathId, Vec<u8>)>>>,
}

impl MockFm {
    pub fn new(dests: usize, capacity: usize) -> Self {
        Self {
            capacity,
            queues: RefCell::new(vec![VecDeque::new(); dests]),
        }
    }
}

impl FmBackend for MockFm {
    fn put(&self, dest: DestId, path: PathId, data: &[u8]) -> Result<(), QueueError> {
        let mut queues = self.queues.borrow_mut();
        let queue = queues.get_mut(dest.0 as usize).ok_or(QueueError::Bounds)?;
        if queue.len() >= self.capacity {
            return Err(QueueError::Full);
        }
        queue.push_back((path, data.to_vec()));
        Ok(())
    }

    fn get(&self, dest: DestId, buf: &mut [u8]) -> Result<(PathId, usize), QueueError> {
        let queues = self.queues.borrow();
        let queue = queues.get(dest.0 as usize).ok_or(QueueError::Bounds)?;
        let (path, data) = queue.front().ok_or(QueueError::Empty)?;
        if data.len() > buf.len() {
            return Err(QueueError::TooLong);
        }
        buf[..data.len()].copy_from_slice(data);
        Ok((*path, data.len()))
    }

    fn remove(&self, dest: DestId) -> Result<(), QueueError> {
        self.queues
            .borrow_mut()
            .get_mut(dest.0 as usize)
            .ok_or(QueueError::Bounds)?
            .pop_front()
            .map(|_| ())
            .ok_or(QueueError::Empty)
    }

    fn flush(&self, dest: DestId) {
        if let Some(queue) = self.queues.borrow_mut().get_mut(dest.0 as usize) {
            queue.clear();
        }
    }

    fn fill_level(&self, dest: DestId) -> usize {
        self.queues
            .borrow()
            .get(dest.0 as usize)
            .map(|q| q.len())
            .unwrap_or(0)
    }
}

/// The full set of mocks a router needs, plus a [Platform] view of them.
#[derive(Debug, Default)]
pub struct Bench {
    pub lower: MockLower,
    pub upper: MockUpper,
    pub diag: MockDiag,
    pub locks: NoLocking,
}

impl Bench {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn platform(&self) -> Platform<'_> {
        Platform {
            lower: &self.lower,
            upper: &self.upper,
            diag: &self.diag,
            locks: &self.locks,
            mc: None,
            fm: None,
        }
    }
}
