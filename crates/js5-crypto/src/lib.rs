//! Cryptographic operations for JS5 cache files
//!
//! JS5 containers protect a subset of their packed files (most notably map
//! regions) with XTEA, a 64-bit block cipher keyed by four 32-bit words.
//! This crate provides the cipher itself and the key-set plumbing around it.
//!
//! # Components
//!
//! - **Encryption**: XTEA with 32 Feistel cycles over big-endian blocks
//! - **Key Management**: [`XteaKey`] values and an [`XteaKeyStore`] indexed by
//!   archive and group number
//!
//! An all-zero key (or a key set of the wrong length) is *inactive*: every
//! cipher call becomes a pass-through instead of an error. Callers can hand an
//! unknown key straight to the codec without branching.
//!
//! # Examples
//!
//! ```
//! use js5_crypto::{XteaKey, xtea};
//!
//! let key = XteaKey::new([0x0001_0203, 0x0405_0607, 0x0809_0A0B, 0x0C0D_0E0F]);
//! let plaintext = *b"ABCDEFGH";
//!
//! let ciphertext = xtea::encrypt(&plaintext, &key);
//! assert_eq!(xtea::decrypt(&ciphertext, &key), plaintext);
//! ```
//!
//! ## Key Sets
//!
//! ```
//! use js5_crypto::XteaKeyStore;
//!
//! let json = r#"[{"archive": 5, "group": 1, "key": [1, 2, 3, 4]}]"#;
//! let store = XteaKeyStore::from_json_str(json).expect("valid key set");
//! assert!(store.key_for(5, 1).is_active());
//! assert!(!store.key_for(5, 2).is_active());
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod keys;
pub mod xtea;

pub use error::CryptoError;

// Re-export commonly used types
pub use keys::{XteaKey, XteaKeyStore};
