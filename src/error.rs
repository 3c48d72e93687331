//! Errors raised while configuring a sponge or feeding it a message.
use alloc::string::String;

use crate::keccak_p::VALID_WIDTHS;

/// The broad category an [`Error`] belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A sponge parameter is out of range.
    Configuration,
    /// A parameter is well formed, but this crate can't process it.
    Unsupported,
    /// An argument passed alongside the message is inconsistent with it.
    InvalidArgument,
    /// Reading the message from a stream failed.
    Io,
}

/// An error produced by this crate.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("bitrate must be greater than zero and less than 1600 bits, got {0}")]
    InvalidBitrate(usize),
    #[error("only bitrates divisible by 8 are supported, got {0}")]
    UnsupportedBitrate(usize),
    #[error("capacity must be greater than zero and less than 1600 bits, got {0}")]
    InvalidCapacity(usize),
    #[error("suffix must be a bitstring containing only the digits 0 and 1, got {0:?}")]
    InvalidSuffix(String),
    #[error("output length must be greater than zero")]
    InvalidOutputLength,
    #[error("permutation widths smaller than 200 bits are not supported, got {0}")]
    UnsupportedWidth(usize),
    #[error("sum of bitrate and capacity must equal a valid width {widths:?}, got {0}", widths = VALID_WIDTHS)]
    InvalidWidth(usize),
    /// The message length in bits runs past the end of the message buffer.
    #[error("message length of {bits} bits exceeds the {available} bits of the message buffer")]
    MessageTooLong { bits: usize, available: usize },
    #[cfg(feature = "std")]
    #[error("failed to read message from stream")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidBitrate(_)
            | Error::InvalidCapacity(_)
            | Error::InvalidSuffix(_)
            | Error::InvalidOutputLength
            | Error::InvalidWidth(_) => ErrorKind::Configuration,
            Error::UnsupportedBitrate(_) | Error::UnsupportedWidth(_) => ErrorKind::Unsupported,
            Error::MessageTooLong { .. } => ErrorKind::InvalidArgument,
            #[cfg(feature = "std")]
            Error::Io(_) => ErrorKind::Io,
        }
    }
}
