//! # blockpack core
//!
//! Core components shared by the blockpack crates:
//!
//! - [`crc`]: table-driven CRC-32 used to verify every block
//! - [`buffer`]: grow-on-demand staging buffers
//! - [`traits`]: the block codec contract and the flush/block modes
//! - [`error`]: error type and status codes
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: Callers                                             │
//! │     CLI, std::io adapters                               │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Framing (blockpack-stream)                          │
//! │     block assembly, headers, partial decoding           │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Block codec (blockpack-lz4)                         │
//! │     LZ4-HC with cross-block history                     │
//! ├─────────────────────────────────────────────────────────┤
//! │ L0: Core (this crate)                                   │
//! │     CRC-32, StagingBuffer, codec traits, errors         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use blockpack_core::crc::Crc32;
//!
//! let crc = Crc32::compute(b"Hello, World!");
//! assert_eq!(crc, 0xEC4AC3D0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod buffer;
pub mod crc;
pub mod error;
pub mod traits;

// Re-exports for convenience
pub use buffer::StagingBuffer;
pub use crc::{Crc32, crc32};
pub use error::{BlockpackError, ErrorKind, Result};
pub use traits::{BlockCompressor, BlockDecompressor, BlockMode, FlushMode};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::buffer::StagingBuffer;
    pub use crate::crc::Crc32;
    pub use crate::error::{BlockpackError, ErrorKind, Result};
    pub use crate::traits::{BlockCompressor, BlockDecompressor, BlockMode, FlushMode};
}
