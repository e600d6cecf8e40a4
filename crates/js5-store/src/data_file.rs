//! Main data file (`.dat2` / `.dat`) and sector chain traversal
//!
//! A stored file occupies a singly linked chain of sectors. Each sector
//! header names the file, channel and chain position it belongs to, so a
//! reader that strays into another file's sectors notices at the first wrong
//! header instead of returning foreign bytes.

use crate::index::IndexEntry;
use crate::sector::{
    SECTOR_HEADER_SIZE, SECTOR_PAYLOAD_SIZE, SECTOR_SIZE, SectorHeader, sector_offset,
};
use crate::u24::U24_MAX;
use crate::{CorruptionKind, Result, StoreError};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace, warn};

/// Container generation of a store.
///
/// The two generations share the sector layout and differ only in the
/// channel id stamped on sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreFormat {
    /// Current generation (`.dat2`), sectors carry the index channel
    Js5,
    /// Legacy generation (`.dat`), sectors carry the index channel plus one
    Jag,
}

impl StoreFormat {
    /// Channel id stamped on the sectors of `channel`.
    pub fn sector_channel(self, channel: u8) -> Result<u8> {
        match self {
            Self::Js5 => Ok(channel),
            Self::Jag => channel
                .checked_add(1)
                .ok_or(StoreError::ChannelOutOfRange(channel)),
        }
    }
}

impl fmt::Display for StoreFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Js5 => write!(f, "js5"),
            Self::Jag => write!(f, "jag"),
        }
    }
}

/// Progress of a chain walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainState {
    /// More payload to read starting at `sector`, which must be part `part`
    Continuing { part: u32, sector: u32 },
    /// All bytes read
    Done,
}

/// The main data blob of a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFile {
    format: StoreFormat,
    data: Vec<u8>,
}

impl DataFile {
    /// Wrap the raw bytes of a data blob.
    pub fn new(format: StoreFormat, data: Vec<u8>) -> Self {
        Self { format, data }
    }

    /// Container generation.
    pub fn format(&self) -> StoreFormat {
        self.format
    }

    /// Raw blob bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the data file and return its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Blob length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the blob holds any data.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of sectors, counting a trailing partial one.
    pub fn sector_count(&self) -> usize {
        self.data.len().div_ceil(SECTOR_SIZE)
    }

    /// Reassemble the bytes of the file described by `entry` in `channel`.
    pub fn read(&self, channel: u8, entry: &IndexEntry) -> Result<Vec<u8>> {
        if self.data.is_empty() {
            return Err(StoreError::NotLoaded {
                what: "Main data file".to_string(),
            });
        }

        let expected_channel = self.format.sector_channel(channel)?;
        let file_size = entry.file_size as usize;
        let mut output = Vec::with_capacity(file_size.min(self.data.len()));
        let mut remaining = file_size;

        let mut state = if remaining > 0 {
            ChainState::Continuing {
                part: 0,
                sector: entry.sector_pos,
            }
        } else {
            ChainState::Done
        };

        while let ChainState::Continuing { part, sector } = state {
            let start = sector_offset(sector);
            if start >= self.data.len() {
                return Err(StoreError::OutOfBounds {
                    pointer: start,
                    length: self.data.len(),
                });
            }

            let block = &self.data[start..(start + SECTOR_SIZE).min(self.data.len())];
            let chunk = remaining.min(SECTOR_PAYLOAD_SIZE);
            if block.len() < SECTOR_HEADER_SIZE + chunk {
                warn!(
                    "File {}:{} truncated at sector {}: {} bytes readable",
                    channel,
                    entry.file_number,
                    sector,
                    block.len()
                );
                return Err(StoreError::Truncated {
                    channel,
                    file: entry.file_number,
                    sector,
                    available: block.len(),
                });
            }

            let header = SectorHeader::parse(&block[..SECTOR_HEADER_SIZE])?;
            trace!(
                "Sector {} of {}:{}: part {}, next {}",
                sector, channel, entry.file_number, header.part, header.next_sector
            );

            output.extend_from_slice(&block[SECTOR_HEADER_SIZE..SECTOR_HEADER_SIZE + chunk]);
            remaining -= chunk;

            if u32::from(header.part) != part {
                return Err(self.corrupt(
                    channel,
                    entry.file_number,
                    sector,
                    CorruptionKind::FilePartNumber {
                        expected: part,
                        actual: header.part,
                    },
                ));
            }

            // The terminal sector's channel and file fields are not checked
            if remaining > 0 {
                if header.channel != expected_channel {
                    return Err(self.corrupt(
                        channel,
                        entry.file_number,
                        sector,
                        CorruptionKind::ChannelId {
                            expected: expected_channel,
                            actual: header.channel,
                        },
                    ));
                }

                if u32::from(header.file_number) != entry.file_number {
                    return Err(self.corrupt(
                        channel,
                        entry.file_number,
                        sector,
                        CorruptionKind::FileNumber {
                            expected: entry.file_number,
                            actual: header.file_number,
                        },
                    ));
                }

                state = ChainState::Continuing {
                    part: part + 1,
                    sector: header.next_sector,
                };
            } else {
                state = ChainState::Done;
            }
        }

        debug!(
            "Read file {}:{} ({} bytes, {} sectors)",
            channel,
            entry.file_number,
            output.len(),
            file_size.div_ceil(SECTOR_PAYLOAD_SIZE)
        );

        Ok(output)
    }

    fn corrupt(&self, channel: u8, file: u32, sector: u32, kind: CorruptionKind) -> StoreError {
        warn!(
            "File {}:{} corrupt at sector {} ({} store): {}",
            channel, file, sector, self.format, kind
        );
        StoreError::Corrupt {
            channel,
            file,
            sector,
            kind,
        }
    }
}

/// Write path of a sector store.
pub trait SectorWriter {
    /// Append `data` as a new sector chain for `file_number` in `channel` and
    /// return the index record that locates it.
    fn write_file(&mut self, channel: u8, file_number: u32, data: &[u8]) -> Result<IndexEntry>;
}

impl SectorWriter for DataFile {
    /// Chains are appended after the last whole sector; sector 0 is never
    /// used. The payload of the terminal sector is zero-padded to a full
    /// sector.
    fn write_file(&mut self, channel: u8, file_number: u32, data: &[u8]) -> Result<IndexEntry> {
        if data.len() > U24_MAX as usize {
            return Err(StoreError::FileTooLarge { size: data.len() });
        }
        let header_file_number =
            u16::try_from(file_number).map_err(|_| StoreError::FileNumberOutOfRange(file_number))?;
        let sector_channel = self.format.sector_channel(channel)?;

        let first_sector = self.sector_count().max(1);
        let sector_total = data.len().div_ceil(SECTOR_PAYLOAD_SIZE).max(1);
        let last_sector = first_sector + sector_total - 1;
        if last_sector > U24_MAX as usize {
            return Err(StoreError::SectorOutOfRange(last_sector));
        }

        self.data.resize(first_sector * SECTOR_SIZE, 0);
        self.data.reserve(sector_total * SECTOR_SIZE);

        let mut chunks = data.chunks(SECTOR_PAYLOAD_SIZE).peekable();
        for part in 0..sector_total {
            let sector = first_sector + part;
            let chunk = chunks.next().unwrap_or_default();
            let next_sector = if chunks.peek().is_some() {
                sector as u32 + 1
            } else {
                0
            };

            let header = SectorHeader {
                file_number: header_file_number,
                part: part as u16,
                next_sector,
                channel: sector_channel,
            };
            self.data.extend_from_slice(&header.to_bytes()?);
            self.data.extend_from_slice(chunk);
            self.data
                .resize(self.data.len() + SECTOR_PAYLOAD_SIZE - chunk.len(), 0);
        }

        debug!(
            "Wrote file {}:{} ({} bytes) to sectors {}..={}",
            channel,
            file_number,
            data.len(),
            first_sector,
            last_sector
        );

        Ok(IndexEntry {
            file_number,
            file_size: data.len() as u32,
            sector_pos: first_sector as u32,
        })
    }
}
