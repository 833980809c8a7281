use thiserror::Error;

/// Errors that can occur when talking to a Sixteen Inputs board.
///
/// Range errors (`InvalidStack`, `ChannelOutOfRange`, `ArgumentOutOfRange`) are
/// always raised before any bus traffic. Transport errors mean the bus was
/// touched and the register state is unknown.
#[derive(Error, Debug)]
pub enum Error {
    /// The I2C bus device could not be opened or bound to the board address.
    #[error("Unable to open I2C bus '{path}' for address 0x{address:02X}: {source}")]
    BusOpen {
        /// Bus device path, e.g. `/dev/i2c-1`.
        path: String,
        /// 7-bit slave address being bound.
        address: u8,
        #[source]
        source: std::io::Error,
    },
    /// A register transfer failed after the transport's retry budget.
    #[error("I2C transfer failed at address 0x{address:02X}, register 0x{register:02X} ({name}): {source}")]
    Transport {
        /// 7-bit slave address of the board.
        address: u8,
        /// First register offset of the transfer.
        register: u8,
        /// Register table name.
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
    /// Stack level outside 0-7.
    #[error("Invalid stack level {0} [0..7]")]
    InvalidStack(u8),
    /// Channel number outside the feature's range.
    #[error("{feature} channel number {channel} out of range [{min}..{max}]")]
    ChannelOutOfRange {
        /// Human readable feature name ("opto", "led", ...).
        feature: &'static str,
        /// The rejected channel number.
        channel: u8,
        min: u8,
        max: u8,
    },
    /// Function argument is outside the valid range.
    #[error("Argument out of range: {0}")]
    ArgumentOutOfRange(String),
}

impl Error {
    /// True for validation failures that happened before any I2C traffic.
    pub fn is_range_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidStack(_) | Error::ChannelOutOfRange { .. } | Error::ArgumentOutOfRange(_)
        )
    }
}

/// Result type alias for board operations.
pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn out_of_range(message: impl Into<String>) -> Error {
    Error::ArgumentOutOfRange(message.into())
}
