//! Packed file header and version footer
//!
//! Layout (big-endian):
//!
//! ```text
//! offset 0: u8  compression type (0 = none, 1 = bzip2, 2 = gzip)
//! offset 1: u32 length            (body length, excluding the fields below)
//! if compressed:
//!   offset 5: u32 decompressed length
//! body:     [u8; length]
//! footer:   u16 version           (optional)
//! ```
//!
//! For compressed files everything from offset 5 up to the end of the body
//! may be XTEA-encrypted, including the decompressed length. The footer is
//! never encrypted and is not flagged anywhere: it is present exactly when at
//! least two bytes follow the body.

use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};

use super::error::{FileError, FileResult};

/// Size of the tag and length prefix
pub const COMPRESSION_HEADER_SIZE: usize = 5;

/// Size of the decompressed length that precedes compressed bodies
pub const DECOMPRESSED_LENGTH_SIZE: usize = 4;

/// Size of the optional version footer
pub const VERSION_FOOTER_SIZE: usize = 2;

/// Packed file compression types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CompressionType {
    /// Stored verbatim
    None = 0,
    /// Headerless bzip2 stream (block size 1)
    Bzip2 = 1,
    /// Gzip stream
    Gzip = 2,
}

impl CompressionType {
    /// Parse compression type from byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::None),
            1 => Some(Self::Bzip2),
            2 => Some(Self::Gzip),
            _ => None,
        }
    }

    /// Get the byte representation
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Whether the body is compressed (and may therefore be encrypted)
    pub fn is_compressed(self) -> bool {
        self != Self::None
    }

    /// Header size for this type, including the decompressed length field
    pub fn header_size(self) -> usize {
        if self.is_compressed() {
            COMPRESSION_HEADER_SIZE + DECOMPRESSED_LENGTH_SIZE
        } else {
            COMPRESSION_HEADER_SIZE
        }
    }
}

/// The fixed 5-byte prefix as stored on disk
#[derive(Debug, Clone, Copy, BinRead, BinWrite)]
#[brw(big)]
struct RawPrefix {
    compression: u8,
    length: u32,
}

/// Parsed packed file framing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedHeader {
    /// Compression type
    pub compression: CompressionType,
    /// Body length: the payload length for uncompressed files, the compressed
    /// length (excluding the decompressed length field) otherwise
    pub length: u32,
    /// Version footer, if present
    pub version: Option<u16>,
}

impl PackedHeader {
    /// Parse the framing of a packed file and detect its version footer
    pub fn parse(data: &[u8]) -> FileResult<Self> {
        if data.len() < COMPRESSION_HEADER_SIZE {
            return Err(FileError::Truncated {
                needed: COMPRESSION_HEADER_SIZE,
                actual: data.len(),
            });
        }

        let prefix = RawPrefix::read(&mut Cursor::new(&data[..COMPRESSION_HEADER_SIZE])).map_err(
            |_| FileError::Truncated {
                needed: COMPRESSION_HEADER_SIZE,
                actual: data.len(),
            },
        )?;

        let compression = CompressionType::from_byte(prefix.compression)
            .ok_or(FileError::UnknownCompressionType(prefix.compression))?;

        let mut header = Self {
            compression,
            length: prefix.length,
            version: None,
        };

        let body_end = header.body_end();
        if data.len() < body_end {
            return Err(FileError::Truncated {
                needed: body_end,
                actual: data.len(),
            });
        }

        if data.len() - body_end >= VERSION_FOOTER_SIZE {
            let footer = &data[data.len() - VERSION_FOOTER_SIZE..];
            header.version = Some(u16::from_be_bytes([footer[0], footer[1]]));
        }

        Ok(header)
    }

    /// Offset one past the end of the body
    pub fn body_end(&self) -> usize {
        self.compression.header_size() + self.length as usize
    }

    /// Total packed size including the footer, if any
    pub fn packed_size(&self) -> usize {
        self.body_end() + self.version.map_or(0, |_| VERSION_FOOTER_SIZE)
    }

    /// Write the 5-byte prefix
    pub(crate) fn write_prefix(compression: CompressionType, length: u32, out: &mut Vec<u8>) {
        out.push(compression.as_byte());
        out.extend_from_slice(&length.to_be_bytes());
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_type_conversion() {
        assert_eq!(CompressionType::from_byte(0), Some(CompressionType::None));
        assert_eq!(CompressionType::from_byte(1), Some(CompressionType::Bzip2));
        assert_eq!(CompressionType::from_byte(2), Some(CompressionType::Gzip));
        assert_eq!(CompressionType::from_byte(3), None);

        assert_eq!(CompressionType::Gzip.as_byte(), 2);
        assert_eq!(CompressionType::None.header_size(), 5);
        assert_eq!(CompressionType::Bzip2.header_size(), 9);
    }

    #[test]
    fn test_parse_uncompressed_without_footer() {
        let data = [0, 0, 0, 0, 3, b'a', b'b', b'c'];
        let header = PackedHeader::parse(&data).expect("valid header");

        assert_eq!(header.compression, CompressionType::None);
        assert_eq!(header.length, 3);
        assert_eq!(header.version, None);
        assert_eq!(header.packed_size(), data.len());
    }

    #[test]
    fn test_parse_uncompressed_with_footer() {
        let data = [0, 0, 0, 0, 3, b'a', b'b', b'c', 0x01, 0x02];
        let header = PackedHeader::parse(&data).expect("valid header");

        assert_eq!(header.version, Some(0x0102));
        assert_eq!(header.packed_size(), data.len());
    }

    #[test]
    fn test_single_trailing_byte_is_not_a_footer() {
        let data = [0, 0, 0, 0, 1, b'a', 0xFF];
        let header = PackedHeader::parse(&data).expect("valid header");
        assert_eq!(header.version, None);
    }

    #[test]
    fn test_parse_compressed_accounts_for_length_field() {
        // 9-byte header + 2-byte body, nothing else
        let mut data = vec![2, 0, 0, 0, 2, 0, 0, 0, 10, 0xAA, 0xBB];
        assert_eq!(PackedHeader::parse(&data).expect("valid").version, None);

        data.extend_from_slice(&[0x00, 0x07]);
        assert_eq!(PackedHeader::parse(&data).expect("valid").version, Some(7));
    }

    #[test]
    fn test_parse_rejects_short_input() {
        assert!(matches!(
            PackedHeader::parse(&[0, 0, 0]),
            Err(FileError::Truncated {
                needed: 5,
                actual: 3
            })
        ));

        assert!(matches!(
            PackedHeader::parse(&[0, 0, 0, 0, 10, 1, 2]),
            Err(FileError::Truncated {
                needed: 15,
                actual: 7
            })
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_compression() {
        assert!(matches!(
            PackedHeader::parse(&[9, 0, 0, 0, 0]),
            Err(FileError::UnknownCompressionType(9))
        ));
    }
}
