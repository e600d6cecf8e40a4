//! Sector layout
//!
//! The data blob is a flat array of fixed-size sectors. Sector `n` starts at
//! byte `n * 520`.
//!
//! Layout (520 bytes total):
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0x00   | 2    | File number (BE) |
//! | 0x02   | 2    | File part number, the sector's position in its chain (BE) |
//! | 0x04   | 3    | Next sector number, 0 on the terminal sector (BE) |
//! | 0x07   | 1    | Channel id |
//! | 0x08   | 512  | Payload |

use crate::Result;
use crate::u24::{read_u24, write_u24};
use binrw::{BinRead, BinWrite};
use std::io::Cursor;

/// Total size of one sector.
pub const SECTOR_SIZE: usize = 520;

/// Size of the sector header.
pub const SECTOR_HEADER_SIZE: usize = 8;

/// Payload bytes carried by one sector.
pub const SECTOR_PAYLOAD_SIZE: usize = SECTOR_SIZE - SECTOR_HEADER_SIZE;

/// Header stamped on every sector of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(big)]
pub struct SectorHeader {
    /// File the sector belongs to
    pub file_number: u16,
    /// Position of the sector in its chain, starting at 0
    pub part: u16,
    /// Next sector in the chain
    #[br(parse_with = read_u24)]
    #[bw(write_with = write_u24)]
    pub next_sector: u32,
    /// Channel id (the index channel, plus one for `jag` stores)
    pub channel: u8,
}

impl SectorHeader {
    /// Parse a header from the first 8 bytes of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Ok(Self::read(&mut Cursor::new(bytes))?)
    }

    /// Serialize the header to 8 bytes.
    pub fn to_bytes(&self) -> Result<[u8; SECTOR_HEADER_SIZE]> {
        let mut cursor = Cursor::new([0u8; SECTOR_HEADER_SIZE]);
        self.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

/// Byte offset of a sector within the data blob.
pub const fn sector_offset(sector: u32) -> usize {
    sector as usize * SECTOR_SIZE
}
