//! Sector-chained store for JS5 game caches.
//!
//! A cache keeps every stored file in one flat data blob
//! (`main_file_cache.dat2`, or `main_file_cache.dat` for the older `jag`
//! generation) cut into 520-byte sectors, plus one index blob per channel
//! (`main_file_cache.idx0`, `.idx1`, ...) holding a 6-byte record per file:
//!
//! - **Index channels**: [`IndexFile`] maps a file number to its size and
//!   first sector
//! - **Data file**: [`DataFile`] walks the sector chain, checking every
//!   sector header against the file being read
//! - **Blob set**: [`FileStore`] recognizes a named set of blobs and ties the
//!   two together
//!
//! Loading the blobs from disk (or anywhere else) is up to the caller; this
//! crate only works on bytes already in memory.
//!
//! # Example
//!
//! ```rust
//! use js5_store::{DataFile, FileStore, IndexFile, SectorWriter, StoreConfig, StoreFormat};
//!
//! # fn main() -> js5_store::Result<()> {
//! let mut data = DataFile::new(StoreFormat::Js5, Vec::new());
//! let entry = data.write_file(2, 10, b"stored bytes")?;
//! let index = IndexFile::encode(2, vec![entry])?;
//!
//! let store = FileStore::from_blobs(
//!     StoreConfig::default(),
//!     [
//!         ("main_file_cache.dat2", data.into_bytes()),
//!         ("main_file_cache.idx2", index.into_bytes()),
//!     ],
//! )?;
//! assert_eq!(store.read(2, 10)?, b"stored bytes");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![allow(clippy::must_use_candidate)]

use thiserror::Error;

// Configuration
pub mod config;

// Sector chains
pub mod data_file;
pub mod sector;

// Index channels
pub mod index;

// Blob set recognition
pub mod store;

mod u24;

pub use config::StoreConfig;
pub use data_file::{DataFile, SectorWriter, StoreFormat};
pub use index::{IndexEntry, IndexFile};
pub use sector::SectorHeader;
pub use store::FileStore;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while reading or writing the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A required blob is absent or empty.
    #[error("{what} is not loaded")]
    NotLoaded {
        /// The missing blob
        what: String,
    },

    /// An index record or sector lies past the end of its blob.
    #[error("Pointer out of bounds: {pointer}, blob length {length}")]
    OutOfBounds {
        /// Byte offset that was requested
        pointer: usize,
        /// Length of the blob
        length: usize,
    },

    /// A sector in the chain is cut short by the end of the data blob.
    #[error("File {channel}:{file} truncated at sector {sector}: only {available} bytes readable")]
    Truncated {
        /// Index channel
        channel: u8,
        /// File number
        file: u32,
        /// Sector number
        sector: u32,
        /// Bytes available from the sector start
        available: usize,
    },

    /// A sector header contradicts the file being read.
    #[error("File {channel}:{file} is corrupt at sector {sector}: {kind}")]
    Corrupt {
        /// Index channel
        channel: u8,
        /// File number
        file: u32,
        /// Sector number
        sector: u32,
        /// The mismatching header field
        kind: CorruptionKind,
    },

    /// The blob set is empty.
    #[error("No blobs provided")]
    NoBlobs,

    /// Neither data blob name is present in the blob set.
    #[error("Main cache data file not found for cache {cache_name}")]
    DataFileMissing {
        /// Configured cache base name
        cache_name: String,
    },

    /// An index blob name has no numeric channel suffix.
    #[error("Invalid index file name: {0}")]
    InvalidIndexName(String),

    /// An index was encoded from zero entries.
    #[error("No files provided to encode index {0}")]
    EmptyIndex(u8),

    /// A file exceeds the 24-bit size field.
    #[error("File too large for the store: {size} bytes")]
    FileTooLarge {
        /// File size in bytes
        size: usize,
    },

    /// A sector number exceeds the 24-bit pointer field.
    #[error("Sector number out of range: {0}")]
    SectorOutOfRange(usize),

    /// A file number does not fit the 16-bit sector header field.
    #[error("File number out of range for sector headers: {0}")]
    FileNumberOutOfRange(u32),

    /// A channel cannot be expressed in the sector header.
    #[error("Channel {0} out of range for this store format")]
    ChannelOutOfRange(u8),

    /// Binary parsing error.
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),
}

/// Sector header field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CorruptionKind {
    /// Sector belongs to a different position in the chain.
    #[error("file part number mismatch, expected {expected} but found {actual}")]
    FilePartNumber {
        /// Position of the sector in the chain
        expected: u32,
        /// Part number stored in the header
        actual: u16,
    },

    /// Sector belongs to a different channel.
    #[error("channel mismatch, expected {expected} but found {actual}")]
    ChannelId {
        /// Channel id the store format expects
        expected: u8,
        /// Channel id stored in the header
        actual: u8,
    },

    /// Sector belongs to a different file.
    #[error("file number mismatch, expected {expected} but found {actual}")]
    FileNumber {
        /// Requested file number
        expected: u32,
        /// File number stored in the header
        actual: u16,
    },
}

/// Version information for the store.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default cache base name shared by all blobs of one cache.
pub const DEFAULT_CACHE_NAME: &str = "main_file_cache";
