//! Top-level error type for the qirender library
//!

use crate::qrcode::EncodeError;
use crate::writer::BarcodeFormat;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The caller passed an argument the operation cannot accept.
    #[error(transparent)]
    Argument(#[from] ArgumentError),
    /// The encoder returned a symbol without a module matrix.
    #[error("the encoder did not produce a module matrix")]
    InvalidState,
    /// The encoder failed. The inner error is passed through as-is.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Invalid caller input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    /// A sized bit array must hold at least one bit.
    #[error("size must be at least 1, got {0}")]
    InvalidSize(usize),
    /// The end of a half-open bit range came before its start.
    #[error("range end {end} is before range start {start}")]
    InvalidRange {
        /// Inclusive start of the range.
        start: usize,
        /// Exclusive end of the range.
        end: usize,
    },
    /// Only 0 to 32 bits can be appended from a single word.
    #[error("num bits must be between 0 and 32, got {0}")]
    InvalidBitCount(usize),
    /// Two bit arrays with different backing word counts were combined.
    #[error("sizes don't match: {left} words vs {right} words")]
    WordLengthMismatch {
        /// Word count of the receiver.
        left: usize,
        /// Word count of the argument.
        right: usize,
    },
    /// Nothing to encode.
    #[error("found empty contents")]
    EmptyContents,
    /// The writer only produces QR codes.
    #[error("can only encode QR_CODE, but got {0}")]
    UnsupportedFormat(BarcodeFormat),
    /// Negative output dimensions were requested.
    #[error("requested dimensions are too small: {width}x{height}")]
    InvalidDimensions {
        /// Requested width in pixels.
        width: i32,
        /// Requested height in pixels.
        height: i32,
    },
    /// A raster region was empty or ran past the raster's edge.
    #[error("region {width}x{height} at ({left}, {top}) does not fit the matrix")]
    InvalidRegion {
        /// Left edge of the region.
        left: usize,
        /// Top edge of the region.
        top: usize,
        /// Region width.
        width: usize,
        /// Region height.
        height: usize,
    },
}

impl Error {
    /// Returns `true` when the error was caused by invalid caller input.
    pub fn is_argument_error(&self) -> bool {
        matches!(self, Error::Argument(_))
    }
}
