//! Routing core.
//!
//! A PDU handed in by a source module fans out to every routing path of
//! that source. Each destination independently applies its length-handling
//! policy and is then served one of three ways: direct arbitrated
//! transmission towards the lower layer, direct indication towards the
//! upper layer, or buffering in the destination's queue. Buffered
//! destinations are drained by later triggers: the lower layer's
//! TriggerTransmit pull, its TxConfirmation, or the periodic
//! [Router::main_function_rx] poll.
//!
//! All operations execute synchronously in the caller's context and are
//! bounded; nothing blocks, suspends or recurses. Per-destination state is
//! guarded by the platform's destination lock for the duration of each
//! enqueue-and-kick or dequeue-and-re-kick sequence.

use crate::{
    arbitration::{self, ArbitrationSlot, TransmitError},
    config::{ConfigError, RouterConfig},
    fifo::Fifo,
    platform::{ApiId, Platform, ReportedError, TransferResult},
    queue::{DestQueue, QueueError},
    rpg::GroupGate,
    single_buffer::SingleBuffer,
    types::{
        ApiKind, DestId, Direction, GroupId, LengthHandling, PathId, Processing, QueueStrategy,
        SourceId,
    },
};

use core::fmt::Debug;
use heapless::Vec;

/// An error occured while routing a PDU.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteError {
    /// The source id does not exist in the configuration.
    UnknownSource,
    /// At least one destination of the fan-out failed.
    Destination,
    /// The PDU did not fit and the path's policy is to drop it. This is a
    /// configured outcome, not a reported error.
    Discarded,
    /// The transmit attempt was not accepted.
    Transmit(TransmitError),
    /// The destination queue rejected the PDU.
    Queue(QueueError),
}

impl From<TransmitError> for RouteError {
    fn from(value: TransmitError) -> Self {
        RouteError::Transmit(value)
    }
}

impl From<QueueError> for RouteError {
    fn from(value: QueueError) -> Self {
        RouteError::Queue(value)
    }
}

/// The router.
///
/// `S`, `P`, `D`, `G` bound the configuration tables (sources, paths,
/// destinations, groups); `Q` is the largest configured FIFO depth and `M`
/// the largest configured PDU length.
pub struct Router<'a, const S: usize, const P: usize, const D: usize, const G: usize, const Q: usize, const M: usize>
{
    config: &'a RouterConfig<S, P, D, G>,
    platform: Platform<'a>,
    queues: Vec<Option<DestQueue<Q, M>>, D>,
    arbitration: Vec<ArbitrationSlot, D>,
    gate: GroupGate<G, P>,
}

impl<const S: usize, const P: usize, const D: usize, const G: usize, const Q: usize, const M: usize>
    Debug for Router<'_, S, P, D, G, Q, M>
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Router")
    }
}

impl<'a, const S: usize, const P: usize, const D: usize, const G: usize, const Q: usize, const M: usize>
    Router<'a, S, P, D, G, Q, M>
{
    /// Tries to initialize a new router from the given configuration.
    ///
    /// Builds the per-destination queues and arbitration slots in their
    /// init state. Creating the router has no side effects and may be
    /// attempted arbitrarily.
    ///
    /// # Errors
    /// This function will return an error if the configuration is
    /// internally inconsistent (dangling ids, a queue binding nothing can
    /// reach), exceeds the state capacities `Q` or `M`, or requires a
    /// platform collaborator that was not provided.
    pub fn try_new(
        config: &'a RouterConfig<S, P, D, G>,
        platform: Platform<'a>,
    ) -> Result<Self, ConfigError> {
        // The builder validates these, but a configuration may also come
        // from deserialized data.
        for path in &config.paths {
            if path.source.0 as usize >= config.sources.len() {
                return Err(ConfigError::Source);
            }
            let dest = config
                .dests
                .get(path.dest.0 as usize)
                .ok_or(ConfigError::Destination)?;
            if path.queued && dest.queue.is_none() {
                return Err(ConfigError::Queue);
            }
            let crosses = config.sources[path.source.0 as usize].partition != dest.partition;
            if crosses && !path.queued && dest.api == ApiKind::If && platform.mc.is_none() {
                return Err(ConfigError::Path);
            }
        }
        for group in &config.groups {
            if group
                .members
                .iter()
                .any(|m| m.0 as usize >= config.paths.len())
            {
                return Err(ConfigError::Group);
            }
        }

        let mut queues: Vec<Option<DestQueue<Q, M>>, D> = Vec::new();
        for (di, dest) in config.dests.iter().enumerate() {
            if dest.max_len > M {
                return Err(ConfigError::Destination);
            }
            let queue = match &dest.queue {
                None => None,
                Some(qc) => Some(match qc.strategy {
                    QueueStrategy::Single => {
                        let default_path = config
                            .paths
                            .iter()
                            .position(|p| p.dest.0 as usize == di)
                            .map(PathId::from)
                            .ok_or(ConfigError::Queue)?;
                        DestQueue::Single {
                            buf: SingleBuffer::new(default_path, dest.max_len, qc.slot_init),
                            init: qc.slot_init,
                        }
                    }
                    QueueStrategy::Fifo => {
                        if qc.depth == 0 || qc.depth > Q {
                            return Err(ConfigError::Queue);
                        }
                        DestQueue::Fifo(Fifo::new(qc.depth, dest.max_len))
                    }
                    QueueStrategy::External => {
                        if platform.fm.is_none() {
                            return Err(ConfigError::Queue);
                        }
                        DestQueue::External(DestId(di as u16))
                    }
                }),
            };
            queues.push(queue).or(Err(ConfigError::Storage))?;
        }

        let mut arbitration: Vec<ArbitrationSlot, D> = Vec::new();
        arbitration
            .resize(config.dests.len(), ArbitrationSlot::Idle)
            .or(Err(ConfigError::Storage))?;

        Ok(Self {
            config,
            platform,
            queues,
            arbitration,
            gate: GroupGate::new(&config.groups, config.paths.len()),
        })
    }

    /// Routes a PDU from `source` to every enabled routing path of that
    /// source.
    ///
    /// The fan-out continues past failing destinations; the result is the
    /// conjunction over all of them.
    ///
    /// # Errors
    /// Returns an error if the source is unknown or any destination
    /// failed.
    pub fn route_pdu(&mut self, source: SourceId, data: &[u8]) -> Result<(), RouteError> {
        let config = self.config;
        if source.0 as usize >= config.sources.len() {
            return Err(RouteError::UnknownSource);
        }
        let src_partition = config.sources[source.0 as usize].partition;
        let mut failed = false;
        for (pi, path) in config.paths.iter().enumerate() {
            if path.source != source {
                continue;
            }
            let pid = PathId(pi as u16);
            if !self.gate.is_enabled(pid) {
                continue;
            }
            let dest = &config.dests[path.dest.0 as usize];
            if src_partition != dest.partition && !path.queued && dest.api == ApiKind::If {
                // Partitions may not share a lock domain; delivery goes
                // through the bounded cross-partition channel.
                let sent = self
                    .platform
                    .mc
                    .map(|mc| mc.try_send(pid, data).is_ok())
                    .unwrap_or(false);
                if !sent {
                    pdur_debug!("Cross-partition channel full for path {}", pi);
                    self.platform
                        .diag
                        .report(ApiId::RoutePdu, ReportedError::McChannelFull);
                    failed = true;
                }
                continue;
            }
            if let Err(e) = self.process_dest_pdu(pid, data) {
                pdur_debug!("Routing to path {} failed: {:?}", pi, e);
                failed = true;
            }
        }
        if failed {
            Err(RouteError::Destination)
        } else {
            Ok(())
        }
    }

    /// Applies the path's length-handling policy, then dispatches.
    fn process_dest_pdu(&mut self, pid: PathId, data: &[u8]) -> Result<(), RouteError> {
        let config = self.config;
        let path = &config.paths[pid.0 as usize];
        let dest = &config.dests[path.dest.0 as usize];
        let data = match path.length_handling {
            LengthHandling::Shorten => &data[..data.len().min(dest.max_len)],
            LengthHandling::Ignore => data,
            LengthHandling::Discard => {
                if data.len() > dest.max_len {
                    return Err(RouteError::Discarded);
                }
                data
            }
        };
        self.dispatch_dest_pdu(pid, data)
    }

    fn dispatch_dest_pdu(&mut self, pid: PathId, data: &[u8]) -> Result<(), RouteError> {
        let config = self.config;
        let path = &config.paths[pid.0 as usize];
        let did = path.dest;
        let di = did.0 as usize;
        let dest = &config.dests[di];

        if path.queued {
            return self.process_buffered_routing(pid, data);
        }

        match dest.direction {
            // Rx delivery is not refusable at this layer.
            Direction::Rx => {
                self.platform.upper.rx_indication(dest.handle, data);
                Ok(())
            }
            Direction::Tx => {
                self.platform.locks.enter_dest(did);
                let slot = &mut self.arbitration[di];
                let res = match dest.api {
                    ApiKind::If => {
                        arbitration::if_transmit(slot, pid, dest.handle, data, self.platform.lower)
                    }
                    ApiKind::Tp => arbitration::tp_transmit(
                        slot,
                        pid,
                        dest.handle,
                        data.len(),
                        self.platform.lower,
                    ),
                };
                self.platform.locks.exit_dest(did);
                if res.is_err() && path.gateway {
                    // No upper layer above a gateway will retransmit
                    self.platform
                        .diag
                        .report(ApiId::Transmit, ReportedError::PduInstancesLost);
                }
                res.map_err(RouteError::from)
            }
        }
    }

    /// Stores a PDU in the destination's queue and kicks off a deferred
    /// transmission where required.
    fn process_buffered_routing(&mut self, pid: PathId, data: &[u8]) -> Result<(), RouteError> {
        let config = self.config;
        let path = &config.paths[pid.0 as usize];
        let did = path.dest;
        let dest = &config.dests[did.0 as usize];
        self.platform.locks.enter_dest(did);

        // Pull-style destinations fetch the payload from the source
        // instead of using the pushed data.
        let mut pulled = [0u8; M];
        let payload = if dest.pull {
            match self
                .platform
                .upper
                .trigger_transmit(path.src_handle, &mut pulled[..dest.max_len])
            {
                Ok(len) => Ok(&pulled[..len]),
                Err(e) => Err(RouteError::Transmit(e)),
            }
        } else {
            Ok(data)
        };

        let result = match payload {
            Ok(payload) => self.buffer_and_kick(pid, payload),
            Err(e) => Err(e),
        };

        if result.is_ok()
            && dest.direction == Direction::Tx
            && dest.processing == Processing::Deferred
        {
            // Accepted into the buffer counts as dealt with
            self.platform.upper.tx_confirmation(path.src_handle);
        }
        self.platform.locks.exit_dest(did);
        result
    }

    fn buffer_and_kick(&mut self, pid: PathId, payload: &[u8]) -> Result<(), RouteError> {
        let config = self.config;
        let did = config.paths[pid.0 as usize].dest;
        let di = did.0 as usize;
        // Rx destinations are drained by the main function, not by a
        // transmit kick.
        let kick = config.dests[di].direction == Direction::Tx;
        let fm = self.platform.fm;
        let strategy = match self.queues[di].as_ref() {
            Some(queue) => queue.strategy(),
            None => return self.queue_misconfigured(),
        };

        match strategy {
            QueueStrategy::Single => {
                if let Some(queue) = self.queues[di].as_mut() {
                    let _ = queue.put(fm, pid, payload);
                }
                // Latest value stored; try to push it out right away. A
                // failure is reported inside and the value stays current.
                if kick {
                    let _ = self.transmit_immediately(did);
                }
                Ok(())
            }
            QueueStrategy::Fifo | QueueStrategy::External => {
                let first = match self.queues[di].as_mut() {
                    Some(queue) => queue.put(fm, pid, payload),
                    None => return self.queue_misconfigured(),
                };
                let stored = match first {
                    Err(QueueError::Full) if strategy == QueueStrategy::Fifo => {
                        // Newest wins on overflow: discard the backlog,
                        // free the destination, take this PDU instead.
                        if let Some(queue) = self.queues[di].as_mut() {
                            queue.flush(fm);
                        }
                        self.arbitration[di].reset();
                        self.platform
                            .diag
                            .report(ApiId::RoutePdu, ReportedError::QueueOverflow);
                        self.platform.diag.queue_overflow(did);
                        match self.queues[di].as_mut() {
                            Some(queue) => queue.put(fm, pid, payload),
                            None => Err(QueueError::Unsupported),
                        }
                    }
                    other => other,
                };
                match stored {
                    Ok(()) => {
                        let fill = self.queues[di]
                            .as_ref()
                            .map(|q| q.fill_level(fm))
                            .unwrap_or(0);
                        if kick && fill == 1 {
                            // Nothing else will drain a queue that just
                            // went non-empty
                            let _ = self.transmit_immediately(did);
                        }
                        Ok(())
                    }
                    Err(e) => {
                        self.report_queue_error(e);
                        Err(RouteError::Queue(e))
                    }
                }
            }
        }
    }

    /// Peeks the oldest queued entry of `dest` and attempts an arbitrated
    /// transmit. The entry stays queued until the lower layer confirms it.
    ///
    /// The caller holds the destination lock.
    fn transmit_immediately(&mut self, dest: DestId) -> Result<(), RouteError> {
        let config = self.config;
        let di = dest.0 as usize;
        let dcfg = &config.dests[di];
        let fm = self.platform.fm;

        let mut buf = [0u8; M];
        let peeked = match self.queues[di].as_ref() {
            Some(queue) => queue.get(fm, &mut buf),
            None => Err(QueueError::Unsupported),
        };
        match peeked {
            Ok((pid, len)) => {
                let slot = &mut self.arbitration[di];
                let res = match dcfg.api {
                    ApiKind::If => arbitration::if_transmit(
                        slot,
                        pid,
                        dcfg.handle,
                        &buf[..len],
                        self.platform.lower,
                    ),
                    ApiKind::Tp => {
                        arbitration::tp_transmit(slot, pid, dcfg.handle, len, self.platform.lower)
                    }
                };
                match res {
                    Ok(()) => Ok(()),
                    Err(e) => {
                        // The failed entry and everything behind it is
                        // unrecoverable; the lower layer will not poll.
                        let flushable = self.queues[di]
                            .as_ref()
                            .map(|q| q.strategy() == QueueStrategy::Fifo)
                            .unwrap_or(false);
                        if flushable {
                            if let Some(queue) = self.queues[di].as_mut() {
                                queue.flush(fm);
                            }
                        }
                        self.platform
                            .diag
                            .report(ApiId::Transmit, ReportedError::PduInstancesLost);
                        Err(RouteError::Transmit(e))
                    }
                }
            }
            Err(QueueError::Empty) => Ok(()),
            Err(e) => {
                self.report_queue_error(e);
                Err(RouteError::Queue(e))
            }
        }
    }

    /// Confirmation callback of the lower layer for an interface
    /// destination.
    ///
    /// Forwards the confirmation to the source that owns the in-flight
    /// transmission, frees the destination and, for FIFO-backed
    /// destinations, dequeues the confirmed entry and immediately attempts
    /// to transmit the next one.
    ///
    /// # Errors
    /// Returns an error if no transmission is in flight for `dest`; the
    /// stale confirmation is dropped.
    pub fn tx_confirmation(&mut self, dest: DestId) -> Result<(), TransmitError> {
        let config = self.config;
        let di = dest.0 as usize;
        let dcfg = match config.dests.get(di) {
            Some(d) => d,
            None => return Err(TransmitError::NotArmed),
        };
        self.platform.locks.enter_dest(dest);
        let res = match self.arbitration[di].armed_path() {
            None => Err(TransmitError::NotArmed),
            Some(pid) => {
                if dcfg.processing == Processing::Immediate {
                    self.platform
                        .upper
                        .tx_confirmation(config.paths[pid.0 as usize].src_handle);
                }
                self.arbitration[di].reset();
                self.advance_queue(dest);
                Ok(())
            }
        };
        self.platform.locks.exit_dest(dest);
        res
    }

    /// Dequeues the confirmed entry and re-kicks the queue. Single buffers
    /// keep their value; only strategies with removable entries advance.
    fn advance_queue(&mut self, dest: DestId) {
        let di = dest.0 as usize;
        let fm = self.platform.fm;
        let removable = self.queues[di]
            .as_ref()
            .map(|q| q.strategy() != QueueStrategy::Single)
            .unwrap_or(false);
        if !removable {
            return;
        }
        if let Some(queue) = self.queues[di].as_mut() {
            let _ = queue.remove(fm);
        }
        let empty = self.queues[di]
            .as_ref()
            .map(|q| q.is_empty(fm))
            .unwrap_or(true);
        if !empty {
            let _ = self.transmit_immediately(dest);
        }
    }

    /// Pull request of the lower layer: copies the PDU to transmit for
    /// `dest` into `buf` and returns its length.
    ///
    /// Buffered destinations serve the oldest queued entry (a single
    /// buffer serves its current value); unbuffered destinations forward
    /// the pull to the source that owns the in-flight transmission.
    ///
    /// # Errors
    /// Returns an error if there is nothing to serve or no transmission is
    /// in flight.
    pub fn trigger_transmit(&mut self, dest: DestId, buf: &mut [u8]) -> Result<usize, TransmitError> {
        let config = self.config;
        let di = dest.0 as usize;
        if di >= config.dests.len() {
            return Err(TransmitError::NotArmed);
        }
        self.platform.locks.enter_dest(dest);
        let fm = self.platform.fm;
        let res = match self.queues[di].as_ref() {
            Some(queue) => match queue.get(fm, buf) {
                Ok((_pid, len)) => Ok(len),
                Err(_) => Err(TransmitError::NotArmed),
            },
            None => arbitration::trigger_transmit(
                &self.arbitration[di],
                &config.paths,
                self.platform.upper,
                buf,
            ),
        };
        self.platform.locks.exit_dest(dest);
        res
    }

    /// Cancel request of a source for its own in-flight interface
    /// transmission.
    ///
    /// # Errors
    /// Returns an error if `path` does not own the in-flight transmission
    /// of its destination.
    pub fn if_cancel_transmit(&self, path: PathId) -> Result<(), TransmitError> {
        let config = self.config;
        let pcfg = config
            .paths
            .get(path.0 as usize)
            .ok_or(TransmitError::NotArmed)?;
        let did = pcfg.dest;
        let dest = &config.dests[did.0 as usize];
        self.platform.locks.enter_dest(did);
        let res = arbitration::if_cancel_transmit(
            &self.arbitration[did.0 as usize],
            path,
            dest.handle,
            self.platform.lower,
        );
        self.platform.locks.exit_dest(did);
        res
    }

    /// Cancel request of a source for its own in-flight
    /// transport-protocol transmission.
    ///
    /// # Errors
    /// Returns an error if `path` does not own the in-flight transmission
    /// of its destination.
    pub fn tp_cancel_transmit(&self, path: PathId) -> Result<(), TransmitError> {
        let config = self.config;
        let pcfg = config
            .paths
            .get(path.0 as usize)
            .ok_or(TransmitError::NotArmed)?;
        let did = pcfg.dest;
        let dest = &config.dests[did.0 as usize];
        self.platform.locks.enter_dest(did);
        let res = arbitration::tp_cancel_transmit(
            &self.arbitration[did.0 as usize],
            path,
            dest.handle,
            self.platform.lower,
        );
        self.platform.locks.exit_dest(did);
        res
    }

    /// Copy request of the lower layer for an in-flight transport-protocol
    /// transmission: writes the next payload chunk for `dest` into `buf`.
    ///
    /// Queued transport destinations serve from their queue; unqueued ones
    /// forward the request to the owning source.
    ///
    /// # Errors
    /// Returns an error if no transmission is in flight for `dest`.
    pub fn copy_tx_data(&mut self, dest: DestId, buf: &mut [u8]) -> Result<usize, TransmitError> {
        let config = self.config;
        let di = dest.0 as usize;
        if di >= config.dests.len() {
            return Err(TransmitError::NotArmed);
        }
        self.platform.locks.enter_dest(dest);
        let fm = self.platform.fm;
        let res = if self.arbitration[di].armed_path().is_none() {
            Err(TransmitError::NotArmed)
        } else {
            match self.queues[di].as_ref() {
                Some(queue) => match queue.get(fm, buf) {
                    Ok((_pid, len)) => Ok(len),
                    Err(_) => Err(TransmitError::Rejected),
                },
                None => arbitration::copy_tx_data(
                    &self.arbitration[di],
                    &config.paths,
                    self.platform.upper,
                    buf,
                ),
            }
        };
        self.platform.locks.exit_dest(dest);
        res
    }

    /// Completion callback of the lower layer for a transport-protocol
    /// destination.
    ///
    /// Queued destinations dequeue the completed entry and kick the next;
    /// unqueued ones forward the completion to the owning source.
    ///
    /// # Errors
    /// Returns an error if no transmission is in flight for `dest`.
    pub fn tp_tx_confirmation(
        &mut self,
        dest: DestId,
        result: TransferResult,
    ) -> Result<(), TransmitError> {
        let config = self.config;
        let di = dest.0 as usize;
        let dcfg = match config.dests.get(di) {
            Some(d) => d,
            None => return Err(TransmitError::NotArmed),
        };
        self.platform.locks.enter_dest(dest);
        let res = if self.queues[di].is_some() {
            match self.arbitration[di].armed_path() {
                None => Err(TransmitError::NotArmed),
                Some(pid) => {
                    if dcfg.processing == Processing::Immediate {
                        self.platform
                            .upper
                            .tp_tx_confirmation(config.paths[pid.0 as usize].src_handle, result);
                    }
                    self.arbitration[di].reset();
                    self.advance_queue(dest);
                    Ok(())
                }
            }
        } else {
            arbitration::tp_tx_confirmation(
                &mut self.arbitration[di],
                &config.paths,
                self.platform.upper,
                result,
            )
        };
        self.platform.locks.exit_dest(dest);
        res
    }

    /// Periodic poll: drains every Rx-direction FIFO destination
    /// completely, delivering each entry to the upper layer.
    ///
    /// A backlog that survives one cycle indicates a misconfigured queue
    /// depth, not a supported steady state.
    pub fn main_function_rx(&mut self) {
        let config = self.config;
        let fm = self.platform.fm;
        for di in 0..config.dests.len() {
            let dcfg = &config.dests[di];
            if dcfg.direction != Direction::Rx {
                continue;
            }
            let drainable = self.queues[di]
                .as_ref()
                .map(|q| q.strategy() != QueueStrategy::Single)
                .unwrap_or(false);
            if !drainable {
                continue;
            }
            let dest = DestId(di as u16);
            self.platform.locks.enter_dest(dest);
            let mut buf = [0u8; M];
            loop {
                let peeked = match self.queues[di].as_ref() {
                    Some(queue) => queue.get(fm, &mut buf),
                    None => Err(QueueError::Unsupported),
                };
                match peeked {
                    Ok((_pid, len)) => {
                        self.platform.upper.rx_indication(dcfg.handle, &buf[..len]);
                        if let Some(queue) = self.queues[di].as_mut() {
                            let _ = queue.remove(fm);
                        }
                    }
                    Err(QueueError::Empty) => break,
                    Err(e) => {
                        self.report_queue_error(e);
                        break;
                    }
                }
            }
            self.platform.locks.exit_dest(dest);
        }
    }

    /// Enables every member path of `group`. A second enable without an
    /// intervening disable has no effect.
    pub fn enable_routing(&mut self, group: GroupId) {
        let config = self.config;
        let gi = group.0 as usize;
        let members = match config.groups.get(gi) {
            Some(g) => &g.members,
            None => return,
        };
        if self.gate.group_enabled(gi) {
            return;
        }
        for member in members {
            self.platform.locks.enter_path(*member);
            self.gate.increment(*member);
            self.platform.locks.exit_path(*member);
        }
        self.gate.set_group(gi, true);
        pdur_trace!("Enabled routing group {}", gi);
    }

    /// Disables every member path of `group`, tearing down its runtime
    /// state: buffered interface destinations are flushed and their
    /// arbitration reset, unbuffered Tx interface paths have their
    /// arbitration reset, and in-flight transport-protocol transmissions
    /// owned by a member path are cancelled.
    ///
    /// Teardown fires exactly once per transition; a second disable has no
    /// effect.
    pub fn disable_routing(&mut self, group: GroupId) {
        let config = self.config;
        let gi = group.0 as usize;
        let members = match config.groups.get(gi) {
            Some(g) => &g.members,
            None => return,
        };
        if !self.gate.group_enabled(gi) {
            return;
        }
        let fm = self.platform.fm;
        for member in members {
            let pid = *member;
            let pcfg = &config.paths[pid.0 as usize];
            let di = pcfg.dest.0 as usize;
            let dcfg = &config.dests[di];
            self.platform.locks.enter_path(pid);
            match dcfg.api {
                ApiKind::If => {
                    if pcfg.queued {
                        if let Some(queue) = self.queues[di].as_mut() {
                            queue.flush(fm);
                        }
                        self.arbitration[di].reset();
                    } else if dcfg.direction == Direction::Tx {
                        self.arbitration[di].reset();
                    }
                }
                ApiKind::Tp => {
                    if self.arbitration[di].armed_path() == Some(pid) {
                        let _ = self.platform.lower.tp_cancel_transmit(dcfg.handle);
                        self.arbitration[di].reset();
                    }
                }
            }
            self.gate.decrement(pid);
            self.platform.locks.exit_path(pid);
        }
        self.gate.set_group(gi, false);
        pdur_trace!("Disabled routing group {}", gi);
    }

    /// Whether `path` is currently enabled: it belongs to no group, or at
    /// least one covering group is enabled.
    pub fn is_dest_pdu_enabled(&self, path: PathId) -> bool {
        self.gate.is_enabled(path)
    }

    /// Number of entries currently queued for `dest` (0 for unbuffered
    /// destinations; a single buffer always holds one value).
    pub fn fill_level(&self, dest: DestId) -> usize {
        self.queues
            .get(dest.0 as usize)
            .and_then(|q| q.as_ref())
            .map(|q| q.fill_level(self.platform.fm))
            .unwrap_or(0)
    }

    fn report_queue_error(&self, e: QueueError) {
        let reported = match e {
            QueueError::Unsupported => ReportedError::UnsupportedOperation,
            QueueError::Bounds => ReportedError::IndexOutOfRange,
            QueueError::Full | QueueError::TooLong => ReportedError::QueueOverflow,
            QueueError::Empty => return,
        };
        self.platform.diag.report(ApiId::Queue, reported);
    }

    fn queue_misconfigured(&self) -> Result<(), RouteError> {
        self.platform
            .diag
            .report(ApiId::Queue, ReportedError::UnsupportedOperation);
        Err(RouteError::Queue(QueueError::Unsupported))
    }
}
