//! Handle and policy types shared across the router.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Index of a source module attachment point.
///
/// Sources are the modules that hand PDUs to the router via
/// `Router::route_pdu`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SourceId(pub u16);

/// Index of a routing path (one source-to-destination edge).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PathId(pub u16);

/// Index of a global destination (a physical sink or source that several
/// routing paths may fan into).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DestId(pub u16);

/// Index of a routing path group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GroupId(pub u16);

/// Identifier of an execution partition or core.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PartitionId(pub u8);

/// Handle under which a PDU is known to the neighbouring module on the
/// other side of a platform seam (`LowerLayer` / `UpperLayer`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Handle(pub u16);

macro_rules! impl_index {
    ($t:ty) => {
        #[allow(clippy::from_over_into)]
        impl Into<usize> for $t {
            fn into(self) -> usize {
                self.0 as usize
            }
        }

        impl From<usize> for $t {
            fn from(val: usize) -> Self {
                Self(val as u16)
            }
        }
    };
}

impl_index!(SourceId);
impl_index!(PathId);
impl_index!(DestId);
impl_index!(GroupId);

/// Direction of a global destination as seen from the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Direction {
    /// Towards a lower-layer (bus) module.
    Tx,
    /// Towards an upper-layer (application) module.
    Rx,
}

/// Delivery style of a global destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ApiKind {
    /// Interface routing: fire-and-forget delivery of complete PDUs.
    If,
    /// Transport-protocol routing: streamed delivery with copy callbacks.
    Tp,
}

/// What to do with a PDU that is longer than the destination allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LengthHandling {
    /// Truncate the PDU to the destination's maximum length.
    Shorten,
    /// Forward unmodified; a downstream overflow is accepted by
    /// configuration.
    Ignore,
    /// Forward only if the PDU fits, otherwise drop it without a report.
    Discard,
}

/// When the upper layer is told that its PDU has been dealt with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Processing {
    /// Confirmation follows the physical transmission.
    Immediate,
    /// Confirmation is given as soon as the PDU is accepted into the
    /// destination's buffer.
    Deferred,
}

/// Backing strategy of a destination's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum QueueStrategy {
    /// Single-slot overwrite buffer; the latest value wins.
    Single,
    /// Circular FIFO of complete PDUs.
    Fifo,
    /// Queue managed outside the router, reached through
    /// [crate::prelude::FmBackend].
    External,
}
