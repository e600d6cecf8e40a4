//! Archive directory format
//!
//! The archive directory (sometimes called the reference table) describes
//! every group stored in one archive: its number, checksums, version and the
//! numbers of the child files packed inside it. It is itself stored as a
//! packed file.
//!
//! Layout (big-endian):
//!
//! ```text
//! u8   format              (5 = original, 6 = versioned)
//! u32  version             (versioned format only)
//! u8   settings            (see ArchiveSettings)
//! u16  group count N
//! sections, in Section::ORDER, each present only when its setting is on:
//!   N x u16        group number deltas
//!   N x i32        group name hashes            (groups named)
//!   N x i32        compressed checksums
//!   N x i32        decompressed checksums       (decompressed checksums)
//!   N x [u8; 512]  whirlpool digest slots       (whirlpool digests)
//!   N x (i32, i32) compressed/decompressed len  (group lengths)
//!   N x i32        group versions
//!   N x u16        child file counts
//!   per group: count x u16 file number deltas
//!   per group: count x i32 file name hashes     (groups named)
//! ```
//!
//! # Examples
//!
//! ```
//! use js5_formats::archive::{Archive, ArchiveSettings, Group};
//!
//! let mut archive = Archive::new(2, ArchiveSettings::default()).with_version(17);
//! let mut group = Group::new(4, 0x1234, 1);
//! assert_eq!(group.push_file(None), Some(0));
//! assert_eq!(group.push_file(None), Some(1));
//! archive.groups.push(group);
//!
//! let encoded = archive.encode().expect("valid archive");
//! assert_eq!(encoded.len(), archive.encoded_len());
//! assert_eq!(Archive::decode(2, &encoded).expect("decodes"), archive);
//! ```

mod delta;
mod error;
mod group;
mod settings;

pub use delta::{decode_deltas, encode_deltas};
pub use error::{ArchiveError, ArchiveResult};
pub use group::{Group, GroupedFile, WhirlpoolDigest};
pub use settings::{ArchiveFormat, ArchiveSettings, Section};

use binrw::io::{Cursor, Read};
use binrw::{BinReaderExt, BinWriterExt};
use std::io;

/// Bytes reserved per group for its whirlpool digest
pub const WHIRLPOOL_SLOT_SIZE: usize = 512;

/// Format tag, settings byte and group count
const FIXED_HEADER_SIZE: usize = 4;

/// Version number of versioned archives
const VERSION_SIZE: usize = 4;

/// Archive directory of one archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    /// Archive number (not stored in the directory itself)
    pub archive_number: u32,
    /// Format tag
    pub format: ArchiveFormat,
    /// Directory version, present exactly for [`ArchiveFormat::Versioned`]
    pub version: Option<u32>,
    /// Optional section switches
    pub settings: ArchiveSettings,
    /// Groups in ascending group number order
    pub groups: Vec<Group>,
}

impl Archive {
    /// Create an empty original-format archive
    pub fn new(archive_number: u32, settings: ArchiveSettings) -> Self {
        Self {
            archive_number,
            format: ArchiveFormat::Original,
            version: None,
            settings,
            groups: Vec::new(),
        }
    }

    /// Switch to the versioned format with the given version
    pub fn with_version(mut self, version: u32) -> Self {
        self.format = ArchiveFormat::Versioned;
        self.version = Some(version);
        self
    }

    /// Number of groups
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Total number of child files across all groups
    pub fn file_count(&self) -> usize {
        self.groups.iter().map(Group::file_count).sum()
    }

    /// Look up a group by number
    pub fn group(&self, group_number: u32) -> Option<&Group> {
        self.groups
            .binary_search_by_key(&group_number, |g| g.group_number)
            .ok()
            .map(|index| &self.groups[index])
    }

    /// Exact encoded size
    pub fn encoded_len(&self) -> usize {
        let group_count = self.group_count();
        let file_count = self.file_count();

        let header = FIXED_HEADER_SIZE + if self.format.has_version() { VERSION_SIZE } else { 0 };
        header
            + self
                .settings
                .sections()
                .map(|section| section.encoded_len(group_count, file_count))
                .sum::<usize>()
    }

    /// Decode an archive directory
    pub fn decode(archive_number: u32, data: &[u8]) -> ArchiveResult<Self> {
        let mut reader = Cursor::new(data);

        let format_byte: u8 = reader.read_be()?;
        let format =
            ArchiveFormat::from_byte(format_byte).ok_or(ArchiveError::UnsupportedFormat(format_byte))?;
        let version = if format.has_version() {
            Some(reader.read_be::<u32>()?)
        } else {
            None
        };
        let settings = ArchiveSettings::from_byte(reader.read_be()?);
        let group_count = usize::from(reader.read_be::<u16>()?);

        let mut groups = vec![Group::default(); group_count];

        for section in settings.sections() {
            match section {
                Section::GroupNumbers => {
                    let deltas = read_u16s(&mut reader, group_count)?;
                    for (group, number) in groups.iter_mut().zip(decode_deltas(&deltas)) {
                        group.group_number = number;
                    }
                }
                Section::GroupNameHashes => {
                    for group in &mut groups {
                        group.name_hash = Some(reader.read_be()?);
                    }
                }
                Section::CompressedChecksums => {
                    for group in &mut groups {
                        group.compressed_checksum = reader.read_be()?;
                    }
                }
                Section::DecompressedChecksums => {
                    for group in &mut groups {
                        group.decompressed_checksum = Some(reader.read_be()?);
                    }
                }
                Section::WhirlpoolDigests => {
                    for group in &mut groups {
                        let mut slot = [0u8; WHIRLPOOL_SLOT_SIZE];
                        reader.read_exact(&mut slot)?;
                        group.whirlpool_digest = Some(WhirlpoolDigest::new(slot));
                    }
                }
                Section::GroupLengths => {
                    for group in &mut groups {
                        group.compressed_length = Some(reader.read_be()?);
                        group.decompressed_length = Some(reader.read_be()?);
                    }
                }
                Section::GroupVersions => {
                    for group in &mut groups {
                        group.version = reader.read_be()?;
                    }
                }
                Section::FileCounts => {
                    let counts = read_u16s(&mut reader, group_count)?;
                    ensure_remaining(&reader, data.len(), counts.iter().map(|&c| usize::from(c) * 2).sum())?;
                    for (group, count) in groups.iter_mut().zip(counts) {
                        group.files = vec![GroupedFile::default(); usize::from(count)];
                    }
                }
                Section::FileNumbers => {
                    for group in &mut groups {
                        let deltas = read_u16s(&mut reader, group.files.len())?;
                        for (file, number) in group.files.iter_mut().zip(decode_deltas(&deltas)) {
                            file.file_number = number;
                        }
                    }
                }
                Section::FileNameHashes => {
                    for group in &mut groups {
                        for file in &mut group.files {
                            file.name_hash = Some(reader.read_be()?);
                        }
                    }
                }
            }
        }

        Ok(Self {
            archive_number,
            format,
            version,
            settings,
            groups,
        })
    }

    /// Check that the archive can be encoded and will decode back unchanged
    pub fn validate(&self) -> ArchiveResult<()> {
        match (self.format.has_version(), self.version) {
            (true, None) => return Err(ArchiveError::MissingVersion),
            (false, Some(_)) => return Err(ArchiveError::UnexpectedVersion),
            _ => {}
        }

        if self.groups.len() > usize::from(u16::MAX) {
            return Err(ArchiveError::TooManyGroups(self.groups.len()));
        }

        let settings = self.settings;
        let mut previous_group = 0u32;
        for group in &self.groups {
            let number = group.group_number;
            delta::delta(previous_group, number)?;
            previous_group = number;

            check_presence(number, "name hash", settings.groups_named, group.name_hash.is_some())?;
            check_presence(
                number,
                "decompressed checksum",
                settings.decompressed_checksums,
                group.decompressed_checksum.is_some(),
            )?;
            check_presence(
                number,
                "whirlpool digest",
                settings.whirlpool_digests,
                group.whirlpool_digest.is_some(),
            )?;
            check_presence(
                number,
                "compressed length",
                settings.group_lengths,
                group.compressed_length.is_some(),
            )?;
            check_presence(
                number,
                "decompressed length",
                settings.group_lengths,
                group.decompressed_length.is_some(),
            )?;

            if group.files.len() > usize::from(u16::MAX) {
                return Err(ArchiveError::TooManyFiles {
                    group: number,
                    count: group.files.len(),
                });
            }

            let mut previous_file = 0u32;
            for file in &group.files {
                file_delta(number, previous_file, file.file_number)?;
                previous_file = file.file_number;

                check_presence(
                    number,
                    "file name hash",
                    settings.groups_named,
                    file.name_hash.is_some(),
                )?;
            }
        }

        Ok(())
    }

    /// Encode the archive directory.
    ///
    /// The output buffer is sized from [`Archive::encoded_len`] up front.
    pub fn encode(&self) -> ArchiveResult<Vec<u8>> {
        self.validate()?;

        let encoded_len = self.encoded_len();
        let mut writer = Cursor::new(Vec::with_capacity(encoded_len));

        writer.write_be(&self.format.as_byte())?;
        if let Some(version) = self.version {
            writer.write_be(&version)?;
        }
        writer.write_be(&self.settings.to_byte())?;
        writer.write_be(&(self.groups.len() as u16))?;

        for section in self.settings.sections() {
            match section {
                Section::GroupNumbers => {
                    let numbers: Vec<u32> = self.groups.iter().map(|g| g.group_number).collect();
                    for delta in encode_deltas(&numbers)? {
                        writer.write_be(&delta)?;
                    }
                }
                Section::GroupNameHashes => {
                    for group in &self.groups {
                        writer.write_be(&required(group, group.name_hash, "name hash")?)?;
                    }
                }
                Section::CompressedChecksums => {
                    for group in &self.groups {
                        writer.write_be(&group.compressed_checksum)?;
                    }
                }
                Section::DecompressedChecksums => {
                    for group in &self.groups {
                        let checksum =
                            required(group, group.decompressed_checksum, "decompressed checksum")?;
                        writer.write_be(&checksum)?;
                    }
                }
                Section::WhirlpoolDigests => {
                    for group in &self.groups {
                        let digest = group.whirlpool_digest.as_ref().ok_or(
                            ArchiveError::MissingField {
                                group: group.group_number,
                                field: "whirlpool digest",
                            },
                        )?;
                        io::Write::write_all(&mut writer, digest.as_bytes())?;
                    }
                }
                Section::GroupLengths => {
                    for group in &self.groups {
                        let compressed =
                            required(group, group.compressed_length, "compressed length")?;
                        let decompressed =
                            required(group, group.decompressed_length, "decompressed length")?;
                        writer.write_be(&compressed)?;
                        writer.write_be(&decompressed)?;
                    }
                }
                Section::GroupVersions => {
                    for group in &self.groups {
                        writer.write_be(&group.version)?;
                    }
                }
                Section::FileCounts => {
                    for group in &self.groups {
                        writer.write_be(&(group.files.len() as u16))?;
                    }
                }
                Section::FileNumbers => {
                    for group in &self.groups {
                        let mut previous = 0u32;
                        for file in &group.files {
                            let delta = file_delta(group.group_number, previous, file.file_number)?;
                            writer.write_be(&delta)?;
                            previous = file.file_number;
                        }
                    }
                }
                Section::FileNameHashes => {
                    for group in &self.groups {
                        for file in &group.files {
                            writer.write_be(&required(group, file.name_hash, "file name hash")?)?;
                        }
                    }
                }
            }
        }

        let encoded = writer.into_inner();
        debug_assert_eq!(encoded.len(), encoded_len);
        Ok(encoded)
    }
}

fn read_u16s(reader: &mut Cursor<&[u8]>, count: usize) -> ArchiveResult<Vec<u16>> {
    (0..count)
        .map(|_| reader.read_be::<u16>().map_err(ArchiveError::from))
        .collect()
}

/// Reject counts that promise more data than the input holds before
/// allocating for them
fn ensure_remaining(reader: &Cursor<&[u8]>, total: usize, needed: usize) -> ArchiveResult<()> {
    let remaining = total.saturating_sub(reader.position() as usize);
    if needed > remaining {
        return Err(ArchiveError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("file tables need {needed} bytes, {remaining} remain"),
        )));
    }
    Ok(())
}

fn file_delta(group: u32, previous: u32, current: u32) -> ArchiveResult<u16> {
    delta::delta(previous, current).map_err(|e| match e {
        ArchiveError::GroupNumbersNotAscending { previous, current } => {
            ArchiveError::FileNumbersNotAscending {
                group,
                previous,
                current,
            }
        }
        other => other,
    })
}

fn required(group: &Group, value: Option<i32>, field: &'static str) -> ArchiveResult<i32> {
    value.ok_or(ArchiveError::MissingField {
        group: group.group_number,
        field,
    })
}

fn check_presence(group: u32, field: &'static str, expected: bool, present: bool) -> ArchiveResult<()> {
    match (expected, present) {
        (true, false) => Err(ArchiveError::MissingField { group, field }),
        (false, true) => Err(ArchiveError::UnexpectedField { group, field }),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn named_settings() -> ArchiveSettings {
        ArchiveSettings {
            groups_named: true,
            ..ArchiveSettings::default()
        }
    }

    fn sample_archive() -> Archive {
        let mut archive = Archive::new(7, named_settings());
        for (number, files) in [(5u32, 2usize), (5, 0), (20, 3), (21, 1)] {
            let mut group = Group::new(number, number as i32 * 3, 1);
            group.name_hash = Some(-(number as i32));
            for i in 0..files {
                group.push_file(Some(i as i32 + 100)).expect("free file number");
            }
            archive.groups.push(group);
        }
        archive
    }

    #[test]
    fn test_decode_minimal() {
        // original format, no settings, one group with two files (0 and 3)
        let data = [
            5, // format
            0, // settings
            0, 1, // group count
            0, 9, // group number delta
            0x12, 0x34, 0x56, 0x78, // compressed checksum
            0, 0, 0, 4, // version
            0, 2, // file count
            0, 0, 0, 3, // file number deltas
        ];

        let archive = Archive::decode(1, &data).expect("decodes");
        assert_eq!(archive.format, ArchiveFormat::Original);
        assert_eq!(archive.version, None);
        assert_eq!(archive.group_count(), 1);

        let group = archive.group(9).expect("group 9");
        assert_eq!(group.compressed_checksum, 0x1234_5678);
        assert_eq!(group.version, 4);
        assert_eq!(group.name_hash, None);
        let numbers: Vec<u32> = group.files.iter().map(|f| f.file_number).collect();
        assert_eq!(numbers, vec![0, 3]);

        assert_eq!(archive.encode().expect("encodes"), data);
    }

    #[test]
    fn test_group_number_deltas_on_wire() {
        let encoded = sample_archive().encode().expect("encodes");
        // format, settings, count, then deltas 5, 0, 15, 1
        assert_eq!(&encoded[..4], &[5, 0x01, 0, 4]);
        assert_eq!(&encoded[4..12], &[0, 5, 0, 0, 0, 15, 0, 1]);
    }

    #[test]
    fn test_round_trip_named() {
        let archive = sample_archive();
        let encoded = archive.encode().expect("encodes");
        assert_eq!(encoded.len(), archive.encoded_len());
        assert_eq!(Archive::decode(7, &encoded).expect("decodes"), archive);
    }

    #[test]
    fn test_round_trip_versioned_empty() {
        let archive = Archive::new(0, ArchiveSettings::from_byte(0x0F)).with_version(u32::MAX);
        let encoded = archive.encode().expect("encodes");
        assert_eq!(encoded, [6, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F, 0, 0]);
        assert_eq!(Archive::decode(0, &encoded).expect("decodes"), archive);
    }

    #[test]
    fn test_round_trip_all_sections() {
        let mut archive = Archive::new(3, ArchiveSettings::from_byte(0x0F)).with_version(99);
        let mut group = Group::new(1, -1, 2);
        group.name_hash = Some(42);
        group.decompressed_checksum = Some(-42);
        group.whirlpool_digest = Some(WhirlpoolDigest::from_digest(&[0x5A; 64]));
        group.compressed_length = Some(1000);
        group.decompressed_length = Some(4000);
        group.push_file(Some(1)).expect("free file number");
        archive.groups.push(group);

        let encoded = archive.encode().expect("encodes");
        assert_eq!(encoded.len(), 4 + 4 + 2 + 4 + 4 + 4 + 512 + 8 + 4 + 2 + 2 + 4);
        assert_eq!(Archive::decode(3, &encoded).expect("decodes"), archive);
    }

    #[test]
    fn test_encode_missing_field() {
        let mut archive = Archive::new(0, named_settings());
        archive.groups.push(Group::new(0, 0, 0));

        assert!(matches!(
            archive.encode(),
            Err(ArchiveError::MissingField {
                group: 0,
                field: "name hash"
            })
        ));
    }

    #[test]
    fn test_encode_unexpected_field() {
        let mut archive = Archive::new(0, ArchiveSettings::default());
        let mut group = Group::new(0, 0, 0);
        group.compressed_length = Some(1);
        archive.groups.push(group);

        assert!(matches!(
            archive.encode(),
            Err(ArchiveError::UnexpectedField { .. })
        ));
    }

    #[test]
    fn test_encode_version_mismatch() {
        let mut archive = Archive::new(0, ArchiveSettings::default());
        archive.version = Some(1);
        assert!(matches!(archive.encode(), Err(ArchiveError::UnexpectedVersion)));

        archive.format = ArchiveFormat::Versioned;
        archive.version = None;
        assert!(matches!(archive.encode(), Err(ArchiveError::MissingVersion)));
    }

    #[test]
    fn test_encode_descending_groups() {
        let mut archive = Archive::new(0, ArchiveSettings::default());
        archive.groups.push(Group::new(10, 0, 0));
        archive.groups.push(Group::new(2, 0, 0));

        assert!(matches!(
            archive.encode(),
            Err(ArchiveError::GroupNumbersNotAscending {
                previous: 10,
                current: 2
            })
        ));
    }

    #[test]
    fn test_encode_descending_files() {
        let mut archive = Archive::new(0, ArchiveSettings::default());
        let mut group = Group::new(4, 0, 0);
        group.files.push(GroupedFile {
            file_number: 3,
            name_hash: None,
        });
        group.files.push(GroupedFile {
            file_number: 1,
            name_hash: None,
        });
        archive.groups.push(group);

        assert!(matches!(
            archive.encode(),
            Err(ArchiveError::FileNumbersNotAscending {
                group: 4,
                previous: 3,
                current: 1
            })
        ));
    }

    #[test]
    fn test_file_numbers_reset_per_group() {
        let mut archive = Archive::new(0, ArchiveSettings::default());
        for number in [0, 1] {
            let mut group = Group::new(number, 0, 0);
            group.files.push(GroupedFile {
                file_number: 10,
                name_hash: None,
            });
            archive.groups.push(group);
        }

        let encoded = archive.encode().expect("encodes");
        // both groups store the delta 10 from an implicit 0
        let tail = &encoded[encoded.len() - 4..];
        assert_eq!(tail, &[0, 10, 0, 10]);
    }

    #[test]
    fn test_decode_unsupported_format() {
        assert!(matches!(
            Archive::decode(0, &[7, 0, 0, 0]),
            Err(ArchiveError::UnsupportedFormat(7))
        ));
    }

    #[test]
    fn test_decode_truncated() {
        let encoded = sample_archive().encode().expect("encodes");
        for len in [0, 1, 3, 10, encoded.len() - 1] {
            assert!(
                Archive::decode(7, &encoded[..len]).is_err(),
                "prefix of {len} bytes should not decode"
            );
        }
    }

    #[test]
    fn test_decode_rejects_oversized_file_counts() {
        // one group claiming 65535 files with no file table behind it
        let data = [5, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xFF, 0xFF];
        assert!(Archive::decode(0, &data).is_err());
    }
}
