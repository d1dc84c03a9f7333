//! Error types for blockpack operations.
//!
//! Every failure of a stream operation is returned as a [`BlockpackError`].
//! The variants carry the context needed for diagnostics; [`ErrorKind`] folds
//! them into the four status classes a caller usually branches on, and
//! [`BlockpackError::code`] gives the matching negative status code.
//!
//! Errors never roll back partial progress: cursors passed to an engine
//! reflect the bytes actually consumed and produced up to the failure.

use std::io;
use thiserror::Error;

/// The main error type for blockpack operations.
#[derive(Debug, Error)]
pub enum BlockpackError {
    /// I/O error from an underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A block or a single input is larger than a configured or hard limit.
    #[error("Block size error: {size} bytes exceeds the limit of {limit} bytes")]
    BlockTooLarge {
        /// Offending size.
        size: usize,
        /// Limit that was exceeded.
        limit: usize,
    },

    /// A decoded block does not have the size its header declares.
    #[error("Block size mismatch: header declares {expected} bytes, decoded {actual}")]
    SizeMismatch {
        /// Size recorded in the block header.
        expected: usize,
        /// Size actually produced by the decompressor.
        actual: usize,
    },

    /// The block decompressor rejected the payload.
    #[error("Block decode failed (expected {expected} bytes): {message}")]
    DecodeFailed {
        /// Size recorded in the block header.
        expected: usize,
        /// Reason reported by the decompressor.
        message: String,
    },

    /// The caller's output buffer cannot hold the next unit of output.
    #[error("Buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall {
        /// Number of bytes needed.
        needed: usize,
        /// Number of bytes available.
        available: usize,
    },

    /// An internal buffer index ran past its limit.
    #[error("Buffer index {index} exceeds limit {limit}")]
    IndexOverflow {
        /// Index that was reached.
        index: usize,
        /// Limit it must not exceed.
        limit: usize,
    },

    /// A staging buffer could not be allocated.
    #[error("Failed to allocate {size} bytes")]
    AllocationFailed {
        /// Requested size.
        size: usize,
    },

    /// The block compressor failed to produce output.
    #[error("Compression failed: {message}")]
    CompressionFailed {
        /// Description of the failure.
        message: String,
    },

    /// A block header carries impossible values.
    #[error("Damaged block header: {message}")]
    DamagedHeader {
        /// Description of the damage.
        message: String,
    },

    /// The checksum of a decoded block does not match its header.
    #[error("CRC mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    CrcMismatch {
        /// CRC stored in the block header.
        expected: u32,
        /// CRC computed over the decoded block.
        computed: u32,
    },

    /// The stream was closed and its buffers released.
    #[error("Stream is closed")]
    StreamClosed,

    /// Corrupted compressed data (reported by a block decompressor).
    #[error("Corrupted data at offset {offset}: {message}")]
    CorruptedData {
        /// Byte offset inside the compressed payload.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },
}

/// Result type alias for blockpack operations.
pub type Result<T> = std::result::Result<T, BlockpackError>;

/// Status class of a [`BlockpackError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input or block exceeds a limit, or a decoded size mismatches its header.
    BlockSize,
    /// Insufficient caller space, internal index breach, or allocation failure.
    Buffer,
    /// The underlying compressor failed.
    Compression,
    /// Invalid header fields or checksum mismatch.
    BlockDamaged,
    /// Error from a reader or writer.
    Io,
}

impl ErrorKind {
    /// Negative status code for this kind. Success is `0`.
    pub fn code(self) -> i32 {
        match self {
            ErrorKind::BlockSize => -1,
            ErrorKind::Buffer => -2,
            ErrorKind::Compression => -3,
            ErrorKind::BlockDamaged => -4,
            ErrorKind::Io => -5,
        }
    }
}

impl BlockpackError {
    /// Status class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::BlockTooLarge { .. } | Self::SizeMismatch { .. } | Self::DecodeFailed { .. } => {
                ErrorKind::BlockSize
            }
            Self::BufferTooSmall { .. }
            | Self::IndexOverflow { .. }
            | Self::AllocationFailed { .. }
            | Self::StreamClosed => ErrorKind::Buffer,
            Self::CompressionFailed { .. } => ErrorKind::Compression,
            Self::DamagedHeader { .. } | Self::CrcMismatch { .. } | Self::CorruptedData { .. } => {
                ErrorKind::BlockDamaged
            }
        }
    }

    /// Negative status code of this error.
    pub fn code(&self) -> i32 {
        self.kind().code()
    }

    /// Create a block-too-large error.
    pub fn block_too_large(size: usize, limit: usize) -> Self {
        Self::BlockTooLarge { size, limit }
    }

    /// Create a size mismatch error.
    pub fn size_mismatch(expected: usize, actual: usize) -> Self {
        Self::SizeMismatch { expected, actual }
    }

    /// Create a decode failure error.
    pub fn decode_failed(expected: usize, message: impl Into<String>) -> Self {
        Self::DecodeFailed {
            expected,
            message: message.into(),
        }
    }

    /// Create a buffer too small error.
    pub fn buffer_too_small(needed: usize, available: usize) -> Self {
        Self::BufferTooSmall { needed, available }
    }

    /// Create an index overflow error.
    pub fn index_overflow(index: usize, limit: usize) -> Self {
        Self::IndexOverflow { index, limit }
    }

    /// Create an allocation failure error.
    pub fn allocation_failed(size: usize) -> Self {
        Self::AllocationFailed { size }
    }

    /// Create a compression failure error.
    pub fn compression_failed(message: impl Into<String>) -> Self {
        Self::CompressionFailed {
            message: message.into(),
        }
    }

    /// Create a damaged header error.
    pub fn damaged_header(message: impl Into<String>) -> Self {
        Self::DamagedHeader {
            message: message.into(),
        }
    }

    /// Create a CRC mismatch error.
    pub fn crc_mismatch(expected: u32, computed: u32) -> Self {
        Self::CrcMismatch { expected, computed }
    }

    /// Create a stream closed error.
    pub fn stream_closed() -> Self {
        Self::StreamClosed
    }

    /// Create a corrupted data error.
    pub fn corrupted(offset: u64, message: impl Into<String>) -> Self {
        Self::CorruptedData {
            offset,
            message: message.into(),
        }
    }
}

impl From<BlockpackError> for io::Error {
    fn from(err: BlockpackError) -> Self {
        if let BlockpackError::Io(inner) = err {
            return inner;
        }
        let kind = match err.kind() {
            ErrorKind::BlockSize | ErrorKind::BlockDamaged => io::ErrorKind::InvalidData,
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}
