//! Group and child file records

use super::WHIRLPOOL_SLOT_SIZE;

/// Whirlpool digest slot of one group
///
/// Archives reserve 512 bytes per group for the digest even though whirlpool
/// itself produces 64. The slot is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WhirlpoolDigest(Box<[u8; WHIRLPOOL_SLOT_SIZE]>);

impl WhirlpoolDigest {
    /// Wrap a full slot
    pub fn new(slot: [u8; WHIRLPOOL_SLOT_SIZE]) -> Self {
        Self(Box::new(slot))
    }

    /// Copy a slot out of a slice of exactly 512 bytes
    pub fn from_slice(slot: &[u8]) -> Option<Self> {
        <[u8; WHIRLPOOL_SLOT_SIZE]>::try_from(slot)
            .ok()
            .map(Self::new)
    }

    /// Build a slot from a 64-byte digest, zero-padding the remainder
    pub fn from_digest(digest: &[u8; 64]) -> Self {
        let mut slot = [0u8; WHIRLPOOL_SLOT_SIZE];
        slot[..digest.len()].copy_from_slice(digest);
        Self::new(slot)
    }

    /// The raw slot bytes
    pub fn as_bytes(&self) -> &[u8; WHIRLPOOL_SLOT_SIZE] {
        &self.0
    }
}

/// A child file of a group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct GroupedFile {
    /// File number within the group
    pub file_number: u32,
    /// Name hash (present when the archive names its groups)
    pub name_hash: Option<i32>,
}

/// A group entry of the archive directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Group {
    /// Group number within the archive
    pub group_number: u32,
    /// Name hash (present when the archive names its groups)
    pub name_hash: Option<i32>,
    /// Checksum of the packed group data
    pub compressed_checksum: i32,
    /// Checksum of the unpacked group data
    pub decompressed_checksum: Option<i32>,
    /// Whirlpool digest slot
    pub whirlpool_digest: Option<WhirlpoolDigest>,
    /// Packed length
    pub compressed_length: Option<i32>,
    /// Unpacked length
    pub decompressed_length: Option<i32>,
    /// Group version
    pub version: i32,
    /// Child files in ascending file number order
    pub files: Vec<GroupedFile>,
}

impl Group {
    /// Create a group with only the mandatory fields set
    pub fn new(group_number: u32, compressed_checksum: i32, version: i32) -> Self {
        Self {
            group_number,
            compressed_checksum,
            version,
            ..Self::default()
        }
    }

    /// Number of child files
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Look up a child file by number
    pub fn file(&self, file_number: u32) -> Option<&GroupedFile> {
        self.files
            .binary_search_by_key(&file_number, |f| f.file_number)
            .ok()
            .map(|index| &self.files[index])
    }

    /// Add a child file with the next free file number.
    ///
    /// Returns `None` without adding anything once the last file already
    /// holds `u32::MAX`.
    pub fn push_file(&mut self, name_hash: Option<i32>) -> Option<u32> {
        let file_number = match self.files.last() {
            Some(last) => last.file_number.checked_add(1)?,
            None => 0,
        };
        self.files.push(GroupedFile {
            file_number,
            name_hash,
        });
        Some(file_number)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_from_slice() {
        assert!(WhirlpoolDigest::from_slice(&[0u8; 64]).is_none());
        let slot = WhirlpoolDigest::from_slice(&[7u8; WHIRLPOOL_SLOT_SIZE]).expect("full slot");
        assert_eq!(slot.as_bytes()[511], 7);
    }

    #[test]
    fn test_digest_from_digest_pads() {
        let slot = WhirlpoolDigest::from_digest(&[0xAB; 64]);
        assert_eq!(slot.as_bytes()[63], 0xAB);
        assert_eq!(slot.as_bytes()[64], 0);
    }

    #[test]
    fn test_group_file_lookup() {
        let mut group = Group::new(3, 0, 1);
        assert_eq!(group.push_file(None), Some(0));
        assert_eq!(group.push_file(None), Some(1));
        group.files.push(GroupedFile {
            file_number: 10,
            name_hash: Some(-5),
        });

        assert_eq!(group.file_count(), 3);
        assert_eq!(group.file(10).and_then(|f| f.name_hash), Some(-5));
        assert!(group.file(5).is_none());
        assert_eq!(group.push_file(None), Some(11));
    }

    #[test]
    fn test_push_file_after_last_number() {
        let mut group = Group::new(0, 0, 1);
        group.files.push(GroupedFile {
            file_number: u32::MAX,
            name_hash: None,
        });

        assert_eq!(group.push_file(Some(1)), None);
        assert_eq!(group.file_count(), 1);
        assert_eq!(group.file(u32::MAX).and_then(|f| f.name_hash), None);
    }
}
