//! Packed file format
//!
//! Every file stored in a JS5 cache is *packed*: prefixed with a compression
//! tag and length, optionally compressed and XTEA-encrypted, and optionally
//! followed by a 2-byte version number. See [`header`] for the byte layout.
//!
//! # Examples
//!
//! ```
//! use js5_crypto::XteaKey;
//! use js5_formats::file::{CompressionType, pack, unpack};
//!
//! let key = XteaKey::new([1, 2, 3, 4]);
//! let packed = pack(b"hello, cache", CompressionType::Gzip, Some(3), &key)
//!     .expect("packs");
//!
//! let file = unpack(&packed.bytes, &key).expect("unpacks");
//! assert_eq!(file.data, b"hello, cache");
//! assert_eq!(file.version, Some(3));
//! ```

mod compression;
mod error;
pub mod header;

pub use compression::{BZIP2_MAGIC, MAX_DECOMPRESSION_SIZE, compress, decompress};
pub use error::{FileError, FileResult};
pub use header::{CompressionType, PackedHeader};

use header::{COMPRESSION_HEADER_SIZE, DECOMPRESSED_LENGTH_SIZE, VERSION_FOOTER_SIZE};
use js5_crypto::{XteaKey, xtea};

/// A file decoded from its packed representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Js5File {
    /// Compression type the file was stored with
    pub compression: CompressionType,
    /// Compressed body length (`None` for uncompressed files)
    pub compressed_length: Option<u32>,
    /// Length of the decoded data
    pub decompressed_length: u32,
    /// Version footer, if present
    pub version: Option<u16>,
    /// Decoded file contents
    pub data: Vec<u8>,
}

/// A file in its packed on-disk representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedFile {
    /// Compression type
    pub compression: CompressionType,
    /// Compressed body length (`None` for uncompressed files)
    pub compressed_length: Option<u32>,
    /// Length of the original data
    pub decompressed_length: u32,
    /// Version footer, if written
    pub version: Option<u16>,
    /// Packed bytes, ready to be stored
    pub bytes: Vec<u8>,
}

impl PackedFile {
    /// Consume the packed file and return its bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Unpack a stored file.
///
/// `key` decrypts compressed bodies; pass [`XteaKey::ZERO`] for unencrypted
/// files. Uncompressed files are never encrypted and ignore the key.
pub fn unpack(data: &[u8], key: &XteaKey) -> FileResult<Js5File> {
    let header = PackedHeader::parse(data)?;
    let body_end = header.body_end();

    if !header.compression.is_compressed() {
        return Ok(Js5File {
            compression: header.compression,
            compressed_length: None,
            decompressed_length: header.length,
            version: header.version,
            data: data[COMPRESSION_HEADER_SIZE..body_end].to_vec(),
        });
    }

    // Decompressed length and body are encrypted together
    let mut encoded = data[COMPRESSION_HEADER_SIZE..body_end].to_vec();
    xtea::decrypt_in_place(&mut encoded, key);

    let decompressed_length = u32::from_be_bytes([encoded[0], encoded[1], encoded[2], encoded[3]]);

    if key.is_active() && decompressed_length as usize > MAX_DECOMPRESSION_SIZE {
        return Err(FileError::DecryptFailed {
            raw: data.to_vec(),
            reason: format!(
                "decrypted length {decompressed_length} exceeds limit of {MAX_DECOMPRESSION_SIZE} bytes (wrong key?)"
            ),
        });
    }

    let decompressed = decompress(
        &encoded[DECOMPRESSED_LENGTH_SIZE..],
        header.compression,
        decompressed_length as usize,
    )
    .map_err(|e| FileError::DecompressFailed {
        raw: data.to_vec(),
        decompressed_length: Some(decompressed_length),
        reason: e.to_string(),
    })?;

    Ok(Js5File {
        compression: header.compression,
        compressed_length: Some(header.length),
        decompressed_length,
        version: header.version,
        data: decompressed,
    })
}

/// Pack a file for storage.
///
/// Compressed bodies are encrypted with `key` after compression; an inactive
/// key leaves them in the clear. Uncompressed files are stored verbatim and
/// ignore the key, matching [`unpack`].
pub fn pack(
    data: &[u8],
    compression: CompressionType,
    version: Option<u16>,
    key: &XteaKey,
) -> FileResult<PackedFile> {
    let decompressed_length =
        u32::try_from(data.len()).map_err(|_| FileError::PayloadTooLarge(data.len()))?;
    let footer_size = version.map_or(0, |_| VERSION_FOOTER_SIZE);

    if !compression.is_compressed() {
        let mut bytes = Vec::with_capacity(COMPRESSION_HEADER_SIZE + data.len() + footer_size);
        PackedHeader::write_prefix(compression, decompressed_length, &mut bytes);
        bytes.extend_from_slice(data);
        push_footer(&mut bytes, version);

        return Ok(PackedFile {
            compression,
            compressed_length: None,
            decompressed_length,
            version,
            bytes,
        });
    }

    let compressed = compress(data, compression).map_err(|e| FileError::CompressFailed {
        raw: data.to_vec(),
        reason: e.to_string(),
    })?;
    let compressed_length = u32::try_from(compressed.len())
        .map_err(|_| FileError::PayloadTooLarge(compressed.len()))?;

    let mut bytes =
        Vec::with_capacity(compression.header_size() + compressed.len() + footer_size);
    PackedHeader::write_prefix(compression, compressed_length, &mut bytes);
    bytes.extend_from_slice(&decompressed_length.to_be_bytes());
    bytes.extend_from_slice(&compressed);

    xtea::encrypt_in_place(&mut bytes[COMPRESSION_HEADER_SIZE..], key);
    push_footer(&mut bytes, version);

    Ok(PackedFile {
        compression,
        compressed_length: Some(compressed_length),
        decompressed_length,
        version,
        bytes,
    })
}

fn push_footer(bytes: &mut Vec<u8>, version: Option<u16>) {
    if let Some(version) = version {
        bytes.extend_from_slice(&version.to_be_bytes());
    }
}
