//! Statically configured PDU router core in the style of the AUTOSAR PduR.
//!
//! The router forwards protocol data units (PDUs) between communication
//! stack layers: from one source module to any number of destination
//! modules (1:N fan-out), with optional per-destination buffering,
//! arbitration of concurrent senders to a shared lower-layer destination,
//! and runtime enable/disable of whole groups of routes.
//!
//! Everything is sized at build time. There is no dynamic memory
//! allocation; all storage is `heapless` collections with capacities given
//! as const generic parameters. No operation blocks, suspends or recurses.
//!
//! ## Configuration
//!
//! The router is configured through [crate::prelude::RouterConfig], an
//! immutable value constructed once (typically at ECU startup) and passed
//! by reference into [crate::prelude::Router::try_new]. Configurations can
//! be built programmatically with [crate::prelude::RouterConfigBuilder],
//! which validates every construction step, or deserialized from a
//! `no_std` compatible format such as `postcard` (see the `pdur-cfg`
//! companion crate for converting YAML configurations).
//!
//! ## Platform integration
//!
//! The router calls out to its surroundings exclusively through the traits
//! in [crate::prelude]: [crate::prelude::LowerLayer] and
//! [crate::prelude::UpperLayer] for the neighbouring communication
//! modules, [crate::prelude::Locking] for the platform's critical-section
//! primitive, [crate::prelude::Diagnostics] for fire-and-forget error
//! reporting, and optionally [crate::prelude::McChannel] for bounded
//! cross-partition delivery and [crate::prelude::FmBackend] for an
//! externally managed queue strategy.
//!
//! All of these must be implemented by the integration; `NoLocking` and
//! `NoDiagnostics` are provided for single-context use and tests.

#![no_std]
#![warn(
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]

mod config;
mod error;

#[macro_use]
mod macros;

mod arbitration;
mod fifo;
mod platform;
mod queue;
mod routing;
mod rpg;
mod single_buffer;
mod types;

/// Standard prelude to be used by router integrations and platform
/// implementations.
pub mod prelude {
    pub use crate::arbitration::{ArbitrationSlot, TransmitError};
    pub use crate::config::*;
    pub use crate::error::Error;
    pub use crate::platform::{
        ApiId, Diagnostics, FmBackend, LowerLayer, Locking, McChannel, McChannelFull,
        NoDiagnostics, NoLocking, Platform, ReportedError, TransferResult, UpperLayer,
    };
    pub use crate::queue::QueueError;
    pub use crate::routing::{RouteError, Router};
    pub use crate::types::*;
}
