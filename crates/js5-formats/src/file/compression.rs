//! Packed file compression and decompression
//!
//! Gzip bodies are plain gzip streams. Bzip2 bodies are *headless*: the
//! 4-byte stream magic `BZh1` is stripped after compression and has to be
//! put back before the stream can be decoded.

use super::header::CompressionType;
use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::io::{self, Read, Write};

/// Maximum allowed decompression size (1 GB)
///
/// Limits decompression output so a corrupt or maliciously crafted length
/// field cannot exhaust memory.
pub const MAX_DECOMPRESSION_SIZE: usize = 1024 * 1024 * 1024;

/// Bzip2 stream magic for block size 1 (100k)
pub const BZIP2_MAGIC: [u8; 4] = *b"BZh1";

/// Compress data using the specified type
pub fn compress(data: &[u8], compression: CompressionType) -> io::Result<Vec<u8>> {
    match compression {
        CompressionType::None => Ok(data.to_vec()),
        CompressionType::Bzip2 => {
            let mut encoder = BzEncoder::new(Vec::new(), bzip2::Compression::new(1));
            encoder.write_all(data)?;
            let stream = encoder.finish()?;

            if !stream.starts_with(&BZIP2_MAGIC) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "bzip2 encoder did not emit a BZh1 stream",
                ));
            }
            Ok(stream[BZIP2_MAGIC.len()..].to_vec())
        }
        CompressionType::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data)?;
            encoder.finish()
        }
    }
}

/// Decompress a body, expecting `expected_len` bytes of output
pub fn decompress(
    data: &[u8],
    compression: CompressionType,
    expected_len: usize,
) -> io::Result<Vec<u8>> {
    if expected_len > MAX_DECOMPRESSION_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "decompressed size {expected_len} exceeds limit of {MAX_DECOMPRESSION_SIZE} bytes"
            ),
        ));
    }

    let decompressed = match compression {
        CompressionType::None => data.to_vec(),
        CompressionType::Bzip2 => {
            let stream = (&BZIP2_MAGIC[..]).chain(data);
            read_limited(BzDecoder::new(stream), expected_len)?
        }
        CompressionType::Gzip => read_limited(GzDecoder::new(data), expected_len)?,
    };

    if decompressed.len() != expected_len {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "decompressed size mismatch: expected {expected_len}, got {}",
                decompressed.len()
            ),
        ));
    }

    Ok(decompressed)
}

/// Read at most one byte past `expected_len` so oversized streams are caught
/// without decoding them completely
fn read_limited<R: Read>(reader: R, expected_len: usize) -> io::Result<Vec<u8>> {
    let mut decompressed = Vec::new();
    reader
        .take(expected_len as u64 + 1)
        .read_to_end(&mut decompressed)?;
    Ok(decompressed)
}
