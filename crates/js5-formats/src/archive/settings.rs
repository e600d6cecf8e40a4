//! Archive format tag, settings bitmask and section layout

use std::fmt;

/// Archive directory format tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ArchiveFormat {
    /// No version number in the header
    Original = 5,
    /// 4-byte version number after the format tag
    Versioned = 6,
}

impl ArchiveFormat {
    /// Parse format from byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            5 => Some(Self::Original),
            6 => Some(Self::Versioned),
            _ => None,
        }
    }

    /// Get the byte representation
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Whether the header carries a version number
    pub fn has_version(self) -> bool {
        self >= Self::Versioned
    }
}

/// Archive settings bitmask
///
/// Each flag switches one or two optional sections on. Unknown bits are
/// dropped on decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ArchiveSettings {
    /// Groups and child files carry name hashes
    pub groups_named: bool,
    /// Groups carry a whirlpool digest slot
    pub whirlpool_digests: bool,
    /// Groups carry compressed and decompressed lengths
    pub group_lengths: bool,
    /// Groups carry a checksum of their decompressed data
    pub decompressed_checksums: bool,
}

impl ArchiveSettings {
    /// Group and file name hashes present (bit 0)
    pub const GROUPS_NAMED: u8 = 0x01;

    /// Whirlpool digests present (bit 1)
    pub const WHIRLPOOL_DIGESTS: u8 = 0x02;

    /// Group lengths present (bit 2)
    pub const GROUP_LENGTHS: u8 = 0x04;

    /// Decompressed checksums present (bit 3)
    pub const DECOMPRESSED_CHECKSUMS: u8 = 0x08;

    /// Decode the settings byte
    pub const fn from_byte(byte: u8) -> Self {
        Self {
            groups_named: byte & Self::GROUPS_NAMED != 0,
            whirlpool_digests: byte & Self::WHIRLPOOL_DIGESTS != 0,
            group_lengths: byte & Self::GROUP_LENGTHS != 0,
            decompressed_checksums: byte & Self::DECOMPRESSED_CHECKSUMS != 0,
        }
    }

    /// Encode the settings byte
    pub const fn to_byte(self) -> u8 {
        let mut byte = 0;
        if self.groups_named {
            byte |= Self::GROUPS_NAMED;
        }
        if self.whirlpool_digests {
            byte |= Self::WHIRLPOOL_DIGESTS;
        }
        if self.group_lengths {
            byte |= Self::GROUP_LENGTHS;
        }
        if self.decompressed_checksums {
            byte |= Self::DECOMPRESSED_CHECKSUMS;
        }
        byte
    }

    /// Sections present under these settings, in wire order
    pub fn sections(self) -> impl Iterator<Item = Section> {
        Section::ORDER
            .into_iter()
            .filter(move |section| section.is_present(self))
    }
}

impl From<u8> for ArchiveSettings {
    fn from(byte: u8) -> Self {
        Self::from_byte(byte)
    }
}

impl fmt::Display for ArchiveSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.to_byte())
    }
}

/// One column of the archive directory
///
/// The directory is stored column by column: all group numbers, then all
/// name hashes, and so on. [`Section::ORDER`] is the wire order and never
/// depends on which fields happen to be populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// 2-byte group number deltas
    GroupNumbers,
    /// 4-byte group name hashes
    GroupNameHashes,
    /// 4-byte checksums of the packed group data
    CompressedChecksums,
    /// 4-byte checksums of the unpacked group data
    DecompressedChecksums,
    /// 512-byte whirlpool digest slots
    WhirlpoolDigests,
    /// 4-byte compressed and 4-byte decompressed length pairs
    GroupLengths,
    /// 4-byte group versions
    GroupVersions,
    /// 2-byte child file counts
    FileCounts,
    /// 2-byte child file number deltas, per group
    FileNumbers,
    /// 4-byte child file name hashes, per group
    FileNameHashes,
}

impl Section {
    /// Wire order of all sections
    pub const ORDER: [Self; 10] = [
        Self::GroupNumbers,
        Self::GroupNameHashes,
        Self::CompressedChecksums,
        Self::DecompressedChecksums,
        Self::WhirlpoolDigests,
        Self::GroupLengths,
        Self::GroupVersions,
        Self::FileCounts,
        Self::FileNumbers,
        Self::FileNameHashes,
    ];

    /// Whether the section is written under `settings`
    pub const fn is_present(self, settings: ArchiveSettings) -> bool {
        match self {
            Self::GroupNumbers
            | Self::CompressedChecksums
            | Self::GroupVersions
            | Self::FileCounts
            | Self::FileNumbers => true,
            Self::GroupNameHashes | Self::FileNameHashes => settings.groups_named,
            Self::DecompressedChecksums => settings.decompressed_checksums,
            Self::WhirlpoolDigests => settings.whirlpool_digests,
            Self::GroupLengths => settings.group_lengths,
        }
    }

    /// Encoded size of the section for `group_count` groups holding
    /// `file_count` child files in total
    pub const fn encoded_len(self, group_count: usize, file_count: usize) -> usize {
        match self {
            Self::GroupNumbers | Self::FileCounts => group_count * 2,
            Self::GroupNameHashes
            | Self::CompressedChecksums
            | Self::DecompressedChecksums
            | Self::GroupVersions => group_count * 4,
            Self::WhirlpoolDigests => group_count * super::WHIRLPOOL_SLOT_SIZE,
            Self::GroupLengths => group_count * 8,
            Self::FileNumbers => file_count * 2,
            Self::FileNameHashes => file_count * 4,
        }
    }
}
