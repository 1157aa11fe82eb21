use std::time::Duration;

use thiserror::Error;

/// Everything that can go wrong between a driver call and the instrument.
///
/// Drivers return this type from every call, so errors of the transport, of argument checks and
/// of reply parsing can all be forwarded with `?`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InstrumentError {
    // Transport
    /// The port failed to read or write, or closed the connection.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A serial port could not be opened or configured.
    #[cfg(feature = "serial")]
    #[error(transparent)]
    Serialport(#[from] serialport::Error),
    /// The VISA library refused a call, e.g., an unknown resource.
    #[cfg(feature = "visa")]
    #[error(transparent)]
    Visa(#[from] visa_rs::Error),
    /// No complete reply arrived within the read timeout of the interface.
    #[error("No reply from the instrument within {0:?}")]
    Timeout(Duration),
    /// No complete reply to `query` arrived within `timeout`.
    #[error("No reply to {query:?} within {timeout:?}")]
    TimeoutQuery {
        /// Command that was waiting for its reply.
        query: String,
        /// How long was waited.
        timeout: Duration,
    },

    // Arguments checked before anything is sent
    /// There is no channel, input, loop or axis with this index.
    #[error("Index {idx} does not exist, the instrument has {nof_channels}")]
    ChannelIndexOutOfRange {
        /// Requested index, starting at 0.
        idx: usize,
        /// Number of channels of this kind.
        nof_channels: usize,
    },
    /// A value the instrument cannot be set to.
    #[error("{value} is outside of [{min}, {max}]")]
    FloatValueOutOfRange {
        /// Requested value.
        value: f64,
        /// Smallest accepted value.
        min: f64,
        /// Largest accepted value.
        max: f64,
    },
    /// A count or index the instrument cannot be set to.
    #[error("{value} is outside of [{min}, {max}]")]
    IntValueOutOfRange {
        /// Requested value.
        value: i64,
        /// Smallest accepted value.
        min: i64,
        /// Largest accepted value.
        max: i64,
    },
    /// Any other argument problem, the message is shown to the user as is.
    #[error("{0}")]
    InvalidArgument(String),

    // Replies
    /// The instrument answered something other than the expected acknowledgment.
    #[error("Expected an acknowledgment, got {0:?}")]
    NotAcknowledged(String),
    /// The instrument reported an error or refused the command, with its message.
    #[error("{0}")]
    InstrumentStatus(String),
    /// A reply the driver does not understand.
    #[error("Cannot parse reply {0:?}")]
    ResponseParseError(String),
    /// A sensor is missing, disabled, or over its range.
    #[error("Sensor error: {0}")]
    SensorError(String),
}
