//! Packed file error types

use thiserror::Error;

/// Packed file error type
///
/// The four codec stages (decrypt, decompress, encrypt, compress) report
/// failures with the bytes they were working on so callers can log them or
/// retry with another key.
#[derive(Debug, Error)]
pub enum FileError {
    /// Input shorter than its header claims
    #[error("truncated packed file: need {needed} bytes, have {actual}")]
    Truncated {
        /// Bytes required by the header
        needed: usize,
        /// Bytes available
        actual: usize,
    },

    /// Unknown compression tag
    #[error("unknown compression type: {0}")]
    UnknownCompressionType(u8),

    /// Payload does not fit the 32-bit length fields
    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(usize),

    /// Decryption produced an unusable body (usually a wrong key)
    #[error("decrypt failed: {reason}")]
    DecryptFailed {
        /// The packed input as received
        raw: Vec<u8>,
        /// What went wrong
        reason: String,
    },

    /// Decompression of the body failed
    #[error("decompress failed: {reason}")]
    DecompressFailed {
        /// The packed input as received
        raw: Vec<u8>,
        /// Decompressed length read from the body, when it got that far
        decompressed_length: Option<u32>,
        /// What went wrong
        reason: String,
    },

    /// Encryption of the payload failed
    #[error("encrypt failed: {reason}")]
    EncryptFailed {
        /// The unpacked input
        raw: Vec<u8>,
        /// What went wrong
        reason: String,
    },

    /// Compression of the payload failed
    #[error("compress failed: {reason}")]
    CompressFailed {
        /// The unpacked input
        raw: Vec<u8>,
        /// What went wrong
        reason: String,
    },
}

impl FileError {
    /// Bytes retained for diagnostics, if this failure carries any
    pub fn raw(&self) -> Option<&[u8]> {
        match self {
            Self::DecryptFailed { raw, .. }
            | Self::DecompressFailed { raw, .. }
            | Self::EncryptFailed { raw, .. }
            | Self::CompressFailed { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

/// Result type for packed file operations
pub type FileResult<T> = Result<T, FileError>;
