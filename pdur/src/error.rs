//! Error types

use core::fmt::{Display, Formatter};

use crate::{
    arbitration::TransmitError, config::ConfigError, queue::QueueError, routing::RouteError,
};

/// General error type for this crate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Invalid configuration for the router.
    Configuration(ConfigError),

    /// An issue while routing a PDU.
    Route(RouteError),

    /// An issue while operating on a destination queue.
    Queue(QueueError),

    /// A transmit attempt or callback could not be serviced.
    Transmit(TransmitError),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Configuration(e) => write!(f, "Invalid configuration: {e:?}"),
            Error::Route(e) => write!(f, "Routing failed: {e:?}"),
            Error::Queue(e) => write!(f, "Queue operation failed: {e}"),
            Error::Transmit(e) => write!(f, "Transmission failed: {e}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(value: ConfigError) -> Self {
        Error::Configuration(value)
    }
}

impl From<RouteError> for Error {
    fn from(value: RouteError) -> Self {
        Error::Route(value)
    }
}

impl From<QueueError> for Error {
    fn from(value: QueueError) -> Self {
        Error::Queue(value)
    }
}

impl From<TransmitError> for Error {
    fn from(value: TransmitError) -> Self {
        Error::Transmit(value)
    }
}
