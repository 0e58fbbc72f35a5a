//! Static router configuration.
//!
//! Every routing path, destination, buffer and group is fixed at build
//! time. The configuration is an immutable value passed by reference into
//! [crate::prelude::Router::try_new]; the router holds no hidden global
//! state. Entries are keyed by small integer handles ([SourceId],
//! [PathId], [DestId], [GroupId]) that index the tables directly.

use crate::types::{
    ApiKind, DestId, Direction, GroupId, Handle, LengthHandling, PartitionId, PathId, Processing,
    QueueStrategy, SourceId,
};

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A source module attachment point.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// Partition or core the source executes on.
    #[cfg_attr(feature = "serde", serde(default))]
    pub partition: PartitionId,
}

/// One source-to-destination routing edge.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConfig {
    /// Owning source.
    pub source: SourceId,
    /// Global destination this edge feeds.
    pub dest: DestId,
    /// Handle under which the source module knows this PDU; used for
    /// TriggerTransmit and confirmations routed back to the source.
    pub src_handle: Handle,
    /// Whether PDUs of this path are buffered at the destination.
    #[cfg_attr(feature = "serde", serde(default))]
    pub queued: bool,
    /// What to do with PDUs longer than the destination allows.
    pub length_handling: LengthHandling,
    /// Both endpoints are lower-layer-facing (bus-to-bus forwarding). A
    /// dropped PDU on a gateway path is reported, because no upper layer
    /// will retransmit it.
    #[cfg_attr(feature = "serde", serde(default))]
    pub gateway: bool,
}

impl PathConfig {
    /// Creates an unqueued path with `Ignore` length handling.
    pub fn new(source: SourceId, dest: DestId, src_handle: Handle) -> Self {
        Self {
            source,
            dest,
            src_handle,
            queued: false,
            length_handling: LengthHandling::Ignore,
            gateway: false,
        }
    }

    /// Buffers PDUs of this path at the destination.
    pub fn queued(mut self) -> Self {
        self.queued = true;
        self
    }

    /// Selects the length-handling policy.
    pub fn length_handling(mut self, policy: LengthHandling) -> Self {
        self.length_handling = policy;
        self
    }

    /// Marks this path as bus-to-bus forwarding.
    pub fn gateway(mut self) -> Self {
        self.gateway = true;
        self
    }
}

/// Queue binding of a buffered destination.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Backing strategy.
    pub strategy: QueueStrategy,
    /// Number of slots. Meaningful for the FIFO strategy; a single buffer
    /// always has exactly one slot.
    pub depth: usize,
    /// Byte pattern a single buffer presents before the first write.
    #[cfg_attr(feature = "serde", serde(default))]
    pub slot_init: u8,
}

impl QueueConfig {
    /// Latest-wins single slot, presenting `slot_init` before the first
    /// write.
    pub fn single(slot_init: u8) -> Self {
        Self {
            strategy: QueueStrategy::Single,
            depth: 1,
            slot_init,
        }
    }

    /// Circular FIFO of `depth` slots.
    pub fn fifo(depth: usize) -> Self {
        Self {
            strategy: QueueStrategy::Fifo,
            depth,
            slot_init: 0,
        }
    }

    /// Queue managed outside the router through
    /// [crate::prelude::FmBackend].
    pub fn external() -> Self {
        Self {
            strategy: QueueStrategy::External,
            depth: 0,
            slot_init: 0,
        }
    }
}

/// A global destination: the shared sink or source that routing paths fan
/// into.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestConfig {
    /// Handle under which the neighbouring module knows this PDU.
    pub handle: Handle,
    /// Direction as seen from the router.
    pub direction: Direction,
    /// Interface or transport-protocol delivery.
    pub api: ApiKind,
    /// Maximum PDU length.
    pub max_len: usize,
    /// When the source is given its Tx confirmation.
    pub processing: Processing,
    /// The destination's upper layer prefers pull-style delivery: buffered
    /// routing fetches the payload via TriggerTransmit instead of using
    /// the pushed data.
    #[cfg_attr(feature = "serde", serde(default))]
    pub pull: bool,
    /// Partition or core the destination executes on.
    #[cfg_attr(feature = "serde", serde(default))]
    pub partition: PartitionId,
    /// Queue binding, present iff any path to this destination is queued.
    #[cfg_attr(feature = "serde", serde(default))]
    pub queue: Option<QueueConfig>,
}

impl DestConfig {
    /// Interface transmission towards the lower layer.
    pub fn tx_if(handle: Handle, max_len: usize) -> Self {
        Self {
            handle,
            direction: Direction::Tx,
            api: ApiKind::If,
            max_len,
            processing: Processing::Immediate,
            pull: false,
            partition: PartitionId::default(),
            queue: None,
        }
    }

    /// Interface reception towards the upper layer.
    pub fn rx_if(handle: Handle, max_len: usize) -> Self {
        Self {
            direction: Direction::Rx,
            ..Self::tx_if(handle, max_len)
        }
    }

    /// Transport-protocol transmission towards the lower layer.
    pub fn tx_tp(handle: Handle, max_len: usize) -> Self {
        Self {
            api: ApiKind::Tp,
            ..Self::tx_if(handle, max_len)
        }
    }

    /// Binds a queue to this destination.
    pub fn with_queue(mut self, queue: QueueConfig) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Confirms to the source as soon as the PDU is buffered.
    pub fn deferred(mut self) -> Self {
        self.processing = Processing::Deferred;
        self
    }

    /// Fetches the payload via TriggerTransmit when buffering.
    pub fn pull(mut self) -> Self {
        self.pull = true;
        self
    }

    /// Places the destination in another partition.
    pub fn in_partition(mut self, partition: PartitionId) -> Self {
        self.partition = partition;
        self
    }
}

/// A set of routing paths that are enabled and disabled together.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupConfig<const P: usize> {
    /// Member paths.
    pub members: Vec<PathId, P>,
    /// Whether the group starts enabled.
    pub enabled_at_init: bool,
}

/// Complete router configuration.
///
/// `S`, `P`, `D` and `G` bound the number of sources, paths, destinations
/// and groups.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RouterConfig<const S: usize, const P: usize, const D: usize, const G: usize> {
    /// Source table, indexed by [SourceId].
    #[cfg_attr(feature = "serde", serde(default))]
    pub sources: Vec<SourceConfig, S>,
    /// Routing path table, indexed by [PathId].
    #[cfg_attr(feature = "serde", serde(default))]
    pub paths: Vec<PathConfig, P>,
    /// Destination table, indexed by [DestId].
    #[cfg_attr(feature = "serde", serde(default))]
    pub dests: Vec<DestConfig, D>,
    /// Group table, indexed by [GroupId].
    #[cfg_attr(feature = "serde", serde(default))]
    pub groups: Vec<GroupConfig<P>, G>,
}

impl<const S: usize, const P: usize, const D: usize, const G: usize> RouterConfig<S, P, D, G> {
    /// Creates a new builder for a configuration.
    pub fn builder() -> RouterConfigBuilder<S, P, D, G> {
        RouterConfigBuilder::new()
    }
}

/// Configuration error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A path refers to a source that does not exist.
    Source,
    /// A path refers to a destination that does not exist, or a
    /// destination attribute is invalid.
    Destination,
    /// A path attribute is inconsistent with its destination.
    Path,
    /// A group refers to a path that does not exist.
    Group,
    /// A queue binding is missing, has zero depth, or exceeds the router's
    /// state capacities.
    Queue,
    /// Insufficient storage for the configuration.
    Storage,
}

/// Result of applying a change to the configuration builder.
pub type BuilderResult<'a, const S: usize, const P: usize, const D: usize, const G: usize> =
    Result<&'a mut RouterConfigBuilder<S, P, D, G>, ConfigError>;

/// The result of building a configuration.
pub type CfgResult<const S: usize, const P: usize, const D: usize, const G: usize> =
    Result<RouterConfig<S, P, D, G>, ConfigError>;

/// Config builder
///
/// Validates every construction step: paths may only refer to sources and
/// destinations added before them, groups only to existing paths.
#[derive(Debug, Default, Clone)]
pub struct RouterConfigBuilder<const S: usize, const P: usize, const D: usize, const G: usize> {
    cfg: RouterConfig<S, P, D, G>,
}

impl<const S: usize, const P: usize, const D: usize, const G: usize>
    RouterConfigBuilder<S, P, D, G>
{
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            cfg: RouterConfig::default(),
        }
    }

    /// Adds a source and returns its id.
    ///
    /// # Errors
    /// Returns an error if the source table is full.
    pub fn source(&mut self, partition: PartitionId) -> Result<SourceId, ConfigError> {
        let id = SourceId(self.cfg.sources.len() as u16);
        self.cfg
            .sources
            .push(SourceConfig { partition })
            .or(Err(ConfigError::Storage))?;
        Ok(id)
    }

    /// Adds a destination and returns its id.
    ///
    /// # Errors
    /// Returns an error if the destination attributes are invalid or the
    /// table is full.
    pub fn destination(&mut self, dest: DestConfig) -> Result<DestId, ConfigError> {
        if dest.max_len == 0 {
            return Err(ConfigError::Destination);
        }
        if let Some(queue) = &dest.queue {
            let depth_ok = match queue.strategy {
                QueueStrategy::Single => queue.depth == 1,
                QueueStrategy::Fifo => queue.depth >= 1,
                QueueStrategy::External => true,
            };
            if !depth_ok {
                return Err(ConfigError::Queue);
            }
        } else if dest.pull {
            // Pull-style delivery only exists for buffered routing
            return Err(ConfigError::Queue);
        }
        let id = DestId(self.cfg.dests.len() as u16);
        self.cfg.dests.push(dest).or(Err(ConfigError::Storage))?;
        Ok(id)
    }

    /// Adds a routing path and returns its id.
    ///
    /// # Errors
    /// Returns an error if the path refers to an unknown source or
    /// destination, or is queued towards a destination without a queue
    /// binding.
    pub fn path(&mut self, path: PathConfig) -> Result<PathId, ConfigError> {
        if path.source.0 as usize >= self.cfg.sources.len() {
            return Err(ConfigError::Source);
        }
        let dest = self
            .cfg
            .dests
            .get(path.dest.0 as usize)
            .ok_or(ConfigError::Destination)?;
        if path.queued && dest.queue.is_none() {
            return Err(ConfigError::Queue);
        }
        let id = PathId(self.cfg.paths.len() as u16);
        self.cfg.paths.push(path).or(Err(ConfigError::Storage))?;
        Ok(id)
    }

    /// Adds a routing path group and returns its id.
    ///
    /// # Errors
    /// Returns an error if a member path does not exist or the table is
    /// full.
    pub fn group(&mut self, members: &[PathId], enabled_at_init: bool) -> Result<GroupId, ConfigError> {
        if members
            .iter()
            .any(|m| m.0 as usize >= self.cfg.paths.len())
        {
            return Err(ConfigError::Group);
        }
        let id = GroupId(self.cfg.groups.len() as u16);
        self.cfg
            .groups
            .push(GroupConfig {
                members: Vec::from_slice(members).or(Err(ConfigError::Storage))?,
                enabled_at_init,
            })
            .or(Err(ConfigError::Storage))?;
        Ok(id)
    }

    /// Build the configuration.
    ///
    /// # Errors
    /// Returns an error if a buffered destination has no queued path (a
    /// queue nothing can reach) or vice versa.
    pub fn build(&self) -> CfgResult<S, P, D, G> {
        for (id, dest) in self.cfg.dests.iter().enumerate() {
            let has_queued_path = self
                .cfg
                .paths
                .iter()
                .any(|p| p.dest.0 as usize == id && p.queued);
            if dest.queue.is_some() != has_queued_path {
                return Err(ConfigError::Queue);
            }
        }
        Ok(self.cfg.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_config() {
        let mut b = RouterConfig::<4, 8, 4, 2>::builder();
        let app = b.source(PartitionId(0)).unwrap();
        let bus = b.source(PartitionId(0)).unwrap();
        let can_tx = b
            .destination(DestConfig::tx_if(Handle(0x10), 8).with_queue(QueueConfig::fifo(4)))
            .unwrap();
        let lin_tx = b.destination(DestConfig::tx_if(Handle(0x11), 8)).unwrap();
        let app_rx = b.destination(DestConfig::rx_if(Handle(0x20), 8)).unwrap();
        let p0 = b
            .path(PathConfig::new(app, can_tx, Handle(1)).queued())
            .unwrap();
        let p1 = b
            .path(PathConfig::new(app, lin_tx, Handle(1)).length_handling(LengthHandling::Shorten))
            .unwrap();
        let _p2 = b.path(PathConfig::new(bus, app_rx, Handle(2))).unwrap();
        let _g = b.group(&[p0, p1], true).unwrap();
        let cfg = b.build().unwrap();
        assert_eq!(cfg.paths.len(), 3);
        assert_eq!(cfg.groups[0].members.len(), 2);
    }

    #[test]
    fn path_to_unknown_destination_is_rejected() {
        let mut b = RouterConfig::<2, 2, 2, 1>::builder();
        let src = b.source(PartitionId(0)).unwrap();
        assert_eq!(
            b.path(PathConfig::new(src, DestId(5), Handle(0))),
            Err(ConfigError::Destination)
        );
    }

    #[test]
    fn queued_path_requires_a_queue_binding() {
        let mut b = RouterConfig::<2, 2, 2, 1>::builder();
        let src = b.source(PartitionId(0)).unwrap();
        let dst = b.destination(DestConfig::tx_if(Handle(0), 8)).unwrap();
        assert_eq!(
            b.path(PathConfig::new(src, dst, Handle(0)).queued()),
            Err(ConfigError::Queue)
        );
    }

    #[test]
    fn unreached_queue_binding_is_rejected_at_build() {
        let mut b = RouterConfig::<2, 2, 2, 1>::builder();
        let src = b.source(PartitionId(0)).unwrap();
        let dst = b
            .destination(DestConfig::tx_if(Handle(0), 8).with_queue(QueueConfig::fifo(2)))
            .unwrap();
        let _ = b.path(PathConfig::new(src, dst, Handle(0))).unwrap();
        assert_eq!(b.build(), Err(ConfigError::Queue));
    }

    #[test]
    fn zero_depth_fifo_is_rejected() {
        let mut b = RouterConfig::<1, 1, 1, 1>::builder();
        assert_eq!(
            b.destination(DestConfig::tx_if(Handle(0), 8).with_queue(QueueConfig::fifo(0))),
            Err(ConfigError::Queue)
        );
    }

    #[test]
    fn group_members_must_exist() {
        let mut b = RouterConfig::<1, 1, 1, 1>::builder();
        assert_eq!(b.group(&[PathId(0)], true), Err(ConfigError::Group));
    }
}
