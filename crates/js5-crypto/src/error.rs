//! Error types for cryptographic operations

use thiserror::Error;

/// Errors that can occur during cryptographic operations
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Invalid key size
    #[error("Invalid key size: expected {expected} words, got {actual}")]
    InvalidKeySize {
        /// Expected key size in 32-bit words
        expected: usize,
        /// Actual key size in 32-bit words
        actual: usize,
    },

    /// Invalid key format
    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    /// Key set file could not be parsed
    #[error("Key set parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Key set file could not be read
    #[error("Key set I/O error: {0}")]
    Io(#[from] std::io::Error),
}
