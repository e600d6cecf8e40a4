//! Error types for archive directory operations

use thiserror::Error;

/// Archive operation result type
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Errors raised while decoding or encoding an archive directory
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Unknown format tag
    #[error("Unsupported archive format: {0}")]
    UnsupportedFormat(u8),

    /// Versioned format without a version number
    #[error("Versioned archive is missing its version number")]
    MissingVersion,

    /// Original format carrying a version number it cannot store
    #[error("Original-format archive cannot carry a version number")]
    UnexpectedVersion,

    /// A field required by the settings is absent
    #[error("Group {group} is missing {field} required by the archive settings")]
    MissingField {
        /// Group number
        group: u32,
        /// Field name
        field: &'static str,
    },

    /// A field is present although the settings exclude it
    #[error("Group {group} carries {field} but the archive settings exclude it")]
    UnexpectedField {
        /// Group number
        group: u32,
        /// Field name
        field: &'static str,
    },

    /// Group numbers decrease somewhere in the sequence
    #[error("Group numbers must be ascending: {previous} followed by {current}")]
    GroupNumbersNotAscending {
        /// Preceding group number
        previous: u32,
        /// Offending group number
        current: u32,
    },

    /// Child file numbers decrease somewhere in a group
    #[error("File numbers in group {group} must be ascending: {previous} followed by {current}")]
    FileNumbersNotAscending {
        /// Group number
        group: u32,
        /// Preceding file number
        previous: u32,
        /// Offending file number
        current: u32,
    },

    /// Gap between consecutive numbers does not fit a 16-bit delta
    #[error("Delta from {previous} to {current} does not fit in 16 bits")]
    DeltaOverflow {
        /// Preceding number
        previous: u32,
        /// Offending number
        current: u32,
    },

    /// More groups than the 16-bit count allows
    #[error("Too many groups: {0} (maximum 65535)")]
    TooManyGroups(usize),

    /// More child files than the 16-bit count allows
    #[error("Too many files in group {group}: {count} (maximum 65535)")]
    TooManyFiles {
        /// Group number
        group: u32,
        /// Number of files
        count: usize,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary parsing error (typically truncated input)
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),
}
