//! Index channel (`.idxN`) records
//!
//! An index blob is a dense array of 6-byte records, one per file number:
//! a 3-byte file size followed by a 3-byte first sector number, both
//! big-endian. File `n` lives at byte `n * 6`.

use crate::u24::{U24_MAX, read_u24, write_u24};
use crate::{Result, StoreError};
use binrw::{BinRead, BinWrite};
use std::io::Cursor;
use tracing::debug;

/// Size of one index record.
pub const INDEX_ENTRY_SIZE: usize = 6;

/// On-disk index record
#[derive(Debug, Clone, Copy, BinRead, BinWrite)]
#[brw(big)]
struct IndexRecord {
    #[br(parse_with = read_u24)]
    #[bw(write_with = write_u24)]
    file_size: u32,
    #[br(parse_with = read_u24)]
    #[bw(write_with = write_u24)]
    sector_pos: u32,
}

/// Location of one stored file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IndexEntry {
    /// File number (the record's position in the index)
    pub file_number: u32,
    /// File size in bytes (24-bit range)
    pub file_size: u32,
    /// First sector of the file's chain (24-bit range)
    pub sector_pos: u32,
}

/// One index channel blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexFile {
    channel: u8,
    data: Vec<u8>,
}

impl IndexFile {
    /// Wrap the raw bytes of an index blob.
    pub fn new(channel: u8, data: Vec<u8>) -> Self {
        Self { channel, data }
    }

    /// Channel number of this index.
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Raw index bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the index and return its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Whether the index holds any data.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of complete records in the index.
    pub fn file_count(&self) -> usize {
        self.data.len() / INDEX_ENTRY_SIZE
    }

    /// Look up the record of one file.
    pub fn entry(&self, file_number: u32) -> Result<IndexEntry> {
        self.ensure_loaded()?;

        let pointer = file_number as usize * INDEX_ENTRY_SIZE;
        let record_end = pointer + INDEX_ENTRY_SIZE;
        if record_end > self.data.len() {
            return Err(StoreError::OutOfBounds {
                pointer,
                length: self.data.len(),
            });
        }

        let record = IndexRecord::read(&mut Cursor::new(&self.data[pointer..record_end]))?;
        Ok(IndexEntry {
            file_number,
            file_size: record.file_size,
            sector_pos: record.sector_pos,
        })
    }

    /// Decode every record in the index. A trailing partial record is
    /// ignored.
    pub fn entries(&self) -> Result<Vec<IndexEntry>> {
        self.ensure_loaded()?;

        let mut reader = Cursor::new(self.data.as_slice());
        (0..self.file_count())
            .map(|file_number| {
                let record = IndexRecord::read(&mut reader)?;
                Ok(IndexEntry {
                    file_number: file_number as u32,
                    file_size: record.file_size,
                    sector_pos: record.sector_pos,
                })
            })
            .collect()
    }

    /// Build an index from file locations.
    ///
    /// Every entry is written at `file_number * 6`; file numbers without an
    /// entry are left as zeroed records. When a file number appears twice the
    /// later entry wins. File numbers past the 16-bit sector header field are
    /// rejected before anything is allocated.
    pub fn encode(channel: u8, mut entries: Vec<IndexEntry>) -> Result<Self> {
        let Some(last) = entries.iter().map(|e| e.file_number).max() else {
            return Err(StoreError::EmptyIndex(channel));
        };
        if last > u32::from(u16::MAX) {
            return Err(StoreError::FileNumberOutOfRange(last));
        }

        entries.sort_by_key(|e| e.file_number);

        let mut writer = Cursor::new(vec![0u8; (last as usize + 1) * INDEX_ENTRY_SIZE]);
        for entry in &entries {
            if entry.file_size > U24_MAX {
                return Err(StoreError::FileTooLarge {
                    size: entry.file_size as usize,
                });
            }
            if entry.sector_pos > U24_MAX {
                return Err(StoreError::SectorOutOfRange(entry.sector_pos as usize));
            }

            writer.set_position((entry.file_number as usize * INDEX_ENTRY_SIZE) as u64);
            IndexRecord {
                file_size: entry.file_size,
                sector_pos: entry.sector_pos,
            }
            .write(&mut writer)?;
        }

        debug!("Encoded index {} with {} entries", channel, entries.len());

        Ok(Self {
            channel,
            data: writer.into_inner(),
        })
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.data.is_empty() {
            return Err(StoreError::NotLoaded {
                what: format!("Index {}", self.channel),
            });
        }
        Ok(())
    }
}
