//! Trait seams towards the rest of the communication stack.
//!
//! The router never talks to a bus driver, an application module, a lock
//! primitive or a diagnostic channel directly. Each of these collaborators
//! is reached through one of the traits below, implemented by the
//! integration and handed to the router as a [Platform] bundle.

use crate::{
    arbitration::TransmitError,
    types::{DestId, Handle, PathId},
};

use core::fmt::{Display, Formatter};

/// Outcome of a transport-protocol transfer, forwarded verbatim to the
/// source module's confirmation callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferResult {
    /// The transfer completed.
    Ok,
    /// The transfer was aborted or failed.
    Failed,
}

/// Lower-layer communication modules (bus interfaces, transport
/// protocols), addressed by the destination's configured [Handle].
///
/// All calls are synchronous and non-blocking; a module that cannot accept
/// a request right now rejects it.
pub trait LowerLayer {
    /// Hands a complete PDU to the lower layer for transmission.
    fn if_transmit(&self, dest: Handle, data: &[u8]) -> Result<(), TransmitError>;

    /// Asks the lower layer to cancel a previously accepted transmission.
    fn if_cancel_transmit(&self, dest: Handle) -> Result<(), TransmitError>;

    /// Starts a transport-protocol transmission. The lower layer will pull
    /// the payload through [UpperLayer::copy_tx_data].
    fn tp_transmit(&self, dest: Handle, len: usize) -> Result<(), TransmitError>;

    /// Cancels an in-flight transport-protocol transmission.
    fn tp_cancel_transmit(&self, dest: Handle) -> Result<(), TransmitError>;
}

/// Upper-layer modules (the application or a source-side bus module in a
/// gateway), addressed by the routing path's configured source [Handle].
pub trait UpperLayer {
    /// Delivers a received PDU. Delivery is not refusable at this layer.
    fn rx_indication(&self, dest: Handle, data: &[u8]);

    /// Pull-style request for the current payload of `src`. On success the
    /// payload has been written to the start of `buf` and its length is
    /// returned.
    fn trigger_transmit(&self, src: Handle, buf: &mut [u8]) -> Result<usize, TransmitError>;

    /// Signals that a previously accepted PDU of `src` has been dealt
    /// with.
    fn tx_confirmation(&self, src: Handle);

    /// Copies the next chunk of an in-flight transport-protocol
    /// transmission of `src` into `buf`, returning the number of bytes
    /// written.
    fn copy_tx_data(&self, src: Handle, buf: &mut [u8]) -> Result<usize, TransmitError>;

    /// Signals completion of a transport-protocol transmission of `src`.
    fn tp_tx_confirmation(&self, src: Handle, result: TransferResult);
}

/// Router operations as identified in diagnostic reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiId {
    /// `Router::route_pdu`
    RoutePdu,
    /// A transmit attempt towards the lower layer
    Transmit,
    /// `Router::trigger_transmit`
    TriggerTransmit,
    /// `Router::tx_confirmation`
    TxConfirmation,
    /// `Router::main_function_rx`
    MainFunctionRx,
    /// A queue operation dispatched through the queue abstraction
    Queue,
}

/// Runtime conditions reported to the diagnostic channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportedError {
    /// A routed PDU was dropped and no upper layer will retransmit it.
    PduInstancesLost,
    /// A destination queue overflowed and was flushed.
    QueueOverflow,
    /// The bounded cross-partition channel was full.
    McChannelFull,
    /// An operation was dispatched to a queue strategy that does not
    /// support it. Indicates a build-time misconfiguration.
    UnsupportedOperation,
    /// A derived queue index left its configured range. Indicates a
    /// build-time misconfiguration.
    IndexOutOfRange,
}

impl Display for ReportedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PduInstancesLost => write!(f, "PDU instances lost"),
            Self::QueueOverflow => write!(f, "Queue overflow"),
            Self::McChannelFull => write!(f, "Cross-partition channel full"),
            Self::UnsupportedOperation => write!(f, "Unsupported queue operation"),
            Self::IndexOutOfRange => write!(f, "Queue index out of range"),
        }
    }
}

/// Fire-and-forget diagnostic reporting.
///
/// Implementations must be non-blocking. The router never consults the
/// outcome of a report; diagnostics exist for telemetry only and do not
/// change control flow.
pub trait Diagnostics {
    /// Reports a runtime condition observed in `api`.
    fn report(&self, api: ApiId, error: ReportedError);

    /// Observer hook fired when a destination queue overflows.
    fn queue_overflow(&self, dest: DestId) {
        let _ = dest;
    }
}

/// Diagnostics sink that swallows every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDiagnostics;

impl Diagnostics for NoDiagnostics {
    fn report(&self, _api: ApiId, _error: ReportedError) {}
}

/// Scoped mutual exclusion provided by the platform, keyed by destination
/// or routing path.
///
/// `enter`/`exit` pairs are always issued from the same caller context and
/// never nest on the same key. Destination locks protect a destination's
/// buffer and arbitration state across an enqueue-and-kick or
/// dequeue-and-re-kick sequence; path locks protect a path's enable count
/// and teardown against concurrent routing on the same path.
pub trait Locking {
    /// Enters the critical section of a global destination.
    fn enter_dest(&self, dest: DestId);

    /// Leaves the critical section of a global destination.
    fn exit_dest(&self, dest: DestId);

    /// Enters the critical section of a routing path.
    fn enter_path(&self, path: PathId);

    /// Leaves the critical section of a routing path.
    fn exit_path(&self, path: PathId);
}

/// Lock provider for integrations where all router calls happen in one
/// context.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLocking;

impl Locking for NoLocking {
    fn enter_dest(&self, _dest: DestId) {}
    fn exit_dest(&self, _dest: DestId) {}
    fn enter_path(&self, _path: PathId) {}
    fn exit_path(&self, _path: PathId) {}
}

/// The bounded cross-partition channel was full; the PDU was not
/// delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct McChannelFull;

/// Bounded channel for delivering PDUs to a routing path whose destination
/// lives in another partition or on another core.
///
/// Partitions may not share a coherent lock domain, so cross-partition
/// delivery goes through an explicit bounded queue instead of shared
/// state. `try_send` never blocks.
pub trait McChannel {
    /// Attempts to hand `data` to the partition owning `path`.
    fn try_send(&self, path: PathId, data: &[u8]) -> Result<(), McChannelFull>;
}

/// Queue strategy managed outside the router
/// ([crate::prelude::QueueStrategy::External]).
///
/// The contracts mirror the router's own queue strategies: `get` is a
/// non-destructive peek (the payload is copied into `buf`), `remove`
/// commits it.
pub trait FmBackend {
    /// Enqueues a PDU for `dest`.
    fn put(&self, dest: DestId, path: PathId, data: &[u8]) -> Result<(), crate::queue::QueueError>;

    /// Peeks the oldest entry of `dest` into `buf`.
    fn get(&self, dest: DestId, buf: &mut [u8])
        -> Result<(PathId, usize), crate::queue::QueueError>;

    /// Removes the oldest entry of `dest`.
    fn remove(&self, dest: DestId) -> Result<(), crate::queue::QueueError>;

    /// Discards all entries of `dest`.
    fn flush(&self, dest: DestId);

    /// Number of entries currently queued for `dest`.
    fn fill_level(&self, dest: DestId) -> usize;
}

/// Collection of platform collaborators handed to the router.
///
/// Use this to pass the neighbouring modules and platform primitives into
/// [crate::prelude::Router::try_new].
#[derive(Clone, Copy)]
pub struct Platform<'a> {
    /// Lower-layer dispatch target.
    pub lower: &'a dyn LowerLayer,
    /// Upper-layer dispatch target.
    pub upper: &'a dyn UpperLayer,
    /// Diagnostic channel.
    pub diag: &'a dyn Diagnostics,
    /// Critical-section primitive.
    pub locks: &'a dyn Locking,
    /// Cross-partition channel, if any path crosses partitions.
    pub mc: Option<&'a dyn McChannel>,
    /// Externally managed queue strategy, if configured.
    pub fm: Option<&'a dyn FmBackend>,
}

impl core::fmt::Debug for Platform<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str("Platform")
    }
}
