//! Error types for base16384 transcoding and the file drivers

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while transcoding or driving files through the codec
#[derive(Debug, Error)]
pub enum Base16384Error {
    /// Encoded input does not have a decodable shape: too short, a body
    /// length that is not a whole number of unit groups, or a remainder
    /// marker carrying an offset outside 1..=6
    #[error("invalid encoded input: length {len} is not decodable with remainder offset {offset}")]
    InvalidInputLength { len: usize, offset: u8 },

    /// Embedded remainder checksum does not match the recomputed value
    #[error("checksum mismatch: embedded {embedded:#06x}, computed {computed:#06x}")]
    InvalidDecodingChecksum { embedded: u16, computed: u16 },

    /// Failed to query the size of the input file
    #[error("failed to get size of {path}: {source}")]
    FileSize {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to open the input file
    #[error("failed to open input file {path}: {source}")]
    OpenInput {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to create the output file
    #[error("failed to create output file {path}: {source}")]
    CreateOutput {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to memory-map the input file
    #[error("failed to map input file {path}: {source}")]
    MapInput {
        path: PathBuf,
        source: std::io::Error,
    },

    /// I/O error occurred (catch-all for read/write failures)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Result with Base16384Error
pub type Result<T> = std::result::Result<T, Base16384Error>;
