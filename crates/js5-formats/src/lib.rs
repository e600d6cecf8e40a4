//! Packed file and archive directory codecs for JS5 caches
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_possible_wrap)] // Intentional for binary operations
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::similar_names)] // Domain-specific naming patterns
#![allow(clippy::return_self_not_must_use)] // Builder patterns
//! This crate provides symmetric (decode and encode) implementations of the
//! two byte-level formats that sit on top of the sector store of a JS5
//! cache:
//!
//! - **File**: the packed representation of one stored file. A compression
//!   tag and length header, an optional XTEA-encrypted body compressed with
//!   bzip2 or gzip, and an optional trailing version number.
//! - **Archive**: the directory table that enumerates the groups of one
//!   archive and the child files of each group, with optional sections
//!   switched on by a settings bitmask.
//!
//! # Design Principles
//!
//! - **Symmetric Operations**: every decoder has a matching encoder
//! - **Explicit Presence**: optional fields are `Option`s whose presence is
//!   decided by the settings bitmask or by length accounting, never by
//!   sentinel values
//! - **Round-Trip Guarantee**: `decode(encode(x)) == x` for every value the
//!   encoder accepts
//!
//! All functions are pure transformations over borrowed input and freshly
//! allocated output; nothing is cached between calls.

#![warn(missing_docs)]

/// Archive directory format (group and child file tables)
///
/// See the [`archive`] module for the section layout and delta encoding.
pub mod archive;
/// Packed file format (compression, encryption and version footer)
///
/// See the [`file`] module for the header layout and footer detection rule.
pub mod file;

pub use archive::{Archive, ArchiveError, ArchiveFormat, ArchiveSettings, Group, GroupedFile};
pub use file::{CompressionType, FileError, Js5File, PackedFile, pack, unpack};
