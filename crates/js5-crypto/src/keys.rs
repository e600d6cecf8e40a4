//! XTEA key management
//!
//! Encrypted JS5 groups are keyed per `(archive, group)` pair. Key sets are
//! commonly distributed as JSON arrays of records carrying the archive and
//! group numbers plus the four key words as *signed* 32-bit integers:
//!
//! ```json
//! [{ "archive": 5, "group": 1, "name_hash": -1153472937, "key": [1, 2, 3, 4] }]
//! ```
//!
//! Additional fields (`name`, `mapsquare`, ...) are accepted and ignored.

use std::collections::HashMap;
use std::fmt;
use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::CryptoError;

/// Number of 32-bit words in an XTEA key
pub const KEY_WORDS: usize = 4;

/// A 128-bit XTEA key held as four 32-bit words
///
/// The all-zero key is *inactive*: cipher operations pass data through
/// unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct XteaKey {
    words: [u32; KEY_WORDS],
}

impl XteaKey {
    /// The inactive all-zero key
    pub const ZERO: Self = Self {
        words: [0; KEY_WORDS],
    };

    /// Create a key from four unsigned words
    pub const fn new(words: [u32; KEY_WORDS]) -> Self {
        Self { words }
    }

    /// Create a key from four signed words, as found in key set files
    pub const fn from_signed(words: [i32; KEY_WORDS]) -> Self {
        Self {
            words: [
                words[0] as u32,
                words[1] as u32,
                words[2] as u32,
                words[3] as u32,
            ],
        }
    }

    /// Create a key from a word slice of unknown length.
    ///
    /// Any length other than four yields the inactive key.
    pub fn from_slice(words: &[u32]) -> Self {
        <[u32; KEY_WORDS]>::try_from(words).map_or(Self::ZERO, Self::new)
    }

    /// The key words
    pub const fn words(&self) -> [u32; KEY_WORDS] {
        self.words
    }

    /// The key words as signed integers
    #[allow(clippy::cast_possible_wrap)]
    pub const fn to_signed(&self) -> [i32; KEY_WORDS] {
        [
            self.words[0] as i32,
            self.words[1] as i32,
            self.words[2] as i32,
            self.words[3] as i32,
        ]
    }

    /// Whether the key actually transforms data
    pub fn is_active(&self) -> bool {
        self.words.iter().any(|&w| w != 0)
    }

    /// Parse a key from 32 hex characters (four big-endian words)
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(hex.trim())
            .map_err(|e| CryptoError::InvalidKeyFormat(format!("invalid hex: {e}")))?;

        if bytes.len() != KEY_WORDS * 4 {
            return Err(CryptoError::InvalidKeySize {
                expected: KEY_WORDS,
                actual: bytes.len() / 4,
            });
        }

        let mut words = [0u32; KEY_WORDS];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Ok(Self::new(words))
    }
}

impl From<[u32; KEY_WORDS]> for XteaKey {
    fn from(words: [u32; KEY_WORDS]) -> Self {
        Self::new(words)
    }
}

impl From<[i32; KEY_WORDS]> for XteaKey {
    fn from(words: [i32; KEY_WORDS]) -> Self {
        Self::from_signed(words)
    }
}

impl TryFrom<&[u32]> for XteaKey {
    type Error = CryptoError;

    /// Strict conversion that rejects slices of the wrong length instead of
    /// falling back to the inactive key
    fn try_from(words: &[u32]) -> Result<Self, Self::Error> {
        <[u32; KEY_WORDS]>::try_from(words)
            .map(Self::new)
            .map_err(|_| CryptoError::InvalidKeySize {
                expected: KEY_WORDS,
                actual: words.len(),
            })
    }
}

impl fmt::Display for XteaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for word in self.words {
            write!(f, "{word:08X}")?;
        }
        Ok(())
    }
}

/// One record of a JSON key set
#[derive(Debug, Clone, Serialize, Deserialize)]
struct KeyRecord {
    archive: u32,
    group: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name_hash: Option<i32>,
    key: [i32; KEY_WORDS],
}

/// Store for XTEA keys indexed by `(archive, group)`
#[derive(Debug, Clone, Default)]
pub struct XteaKeyStore {
    keys: HashMap<(u32, u32), XteaKey>,
    name_hashes: HashMap<(u32, u32), i32>,
}

impl XteaKeyStore {
    /// Create an empty key store
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a key set from its JSON text
    pub fn from_json_str(json: &str) -> Result<Self, CryptoError> {
        let records: Vec<KeyRecord> = serde_json::from_str(json)?;
        Ok(Self::from_records(records))
    }

    /// Load a key set from a JSON reader
    ///
    /// Failures of the reader itself surface as [`CryptoError::Io`].
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, CryptoError> {
        let records: Vec<KeyRecord> = serde_json::from_reader(reader).map_err(|e| {
            if e.is_io() {
                CryptoError::Io(e.into())
            } else {
                CryptoError::Json(e)
            }
        })?;
        Ok(Self::from_records(records))
    }

    fn from_records(records: Vec<KeyRecord>) -> Self {
        let mut store = Self::new();
        for record in records {
            let id = (record.archive, record.group);
            store.insert(record.archive, record.group, XteaKey::from(record.key));
            match record.name_hash {
                Some(name_hash) => store.name_hashes.insert(id, name_hash),
                None => store.name_hashes.remove(&id),
            };
        }
        store
    }

    /// Serialize the store as a JSON key set, ordered by archive then group
    pub fn to_json_string(&self) -> Result<String, CryptoError> {
        let mut records: Vec<KeyRecord> = self
            .keys
            .iter()
            .map(|(&(archive, group), key)| KeyRecord {
                archive,
                group,
                name_hash: self.name_hashes.get(&(archive, group)).copied(),
                key: key.to_signed(),
            })
            .collect();
        records.sort_by_key(|r| (r.archive, r.group));
        Ok(serde_json::to_string_pretty(&records)?)
    }

    /// Add or replace a key, returning the previous one
    pub fn insert(&mut self, archive: u32, group: u32, key: XteaKey) -> Option<XteaKey> {
        self.keys.insert((archive, group), key)
    }

    /// Remove a key along with its name hash
    pub fn remove(&mut self, archive: u32, group: u32) -> Option<XteaKey> {
        self.name_hashes.remove(&(archive, group));
        self.keys.remove(&(archive, group))
    }

    /// Name hash recorded for a key, if the key set carried one
    pub fn name_hash(&self, archive: u32, group: u32) -> Option<i32> {
        self.name_hashes.get(&(archive, group)).copied()
    }

    /// Look up a key
    pub fn get(&self, archive: u32, group: u32) -> Option<XteaKey> {
        self.keys.get(&(archive, group)).copied()
    }

    /// Look up a key, falling back to the inactive key when unknown
    pub fn key_for(&self, archive: u32, group: u32) -> XteaKey {
        self.get(archive, group).unwrap_or(XteaKey::ZERO)
    }

    /// Number of keys in the store
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the store has no keys
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterate over `((archive, group), key)` pairs in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = ((u32, u32), XteaKey)> + '_ {
        self.keys.iter().map(|(&id, &key)| (id, key))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_zero_key_inactive() {
        assert!(!XteaKey::ZERO.is_active());
        assert!(!XteaKey::default().is_active());
        assert!(XteaKey::new([0, 0, 0, 1]).is_active());
    }

    #[test]
    fn test_from_slice_wrong_length_is_inactive() {
        assert!(!XteaKey::from_slice(&[1, 2, 3]).is_active());
        assert!(!XteaKey::from_slice(&[1, 2, 3, 4, 5]).is_active());
        assert_eq!(XteaKey::from_slice(&[1, 2, 3, 4]).words(), [1, 2, 3, 4]);
    }

    #[test]
    fn test_try_from_slice_rejects_wrong_length() {
        let result = XteaKey::try_from(&[1u32, 2][..]);
        assert!(matches!(
            result,
            Err(CryptoError::InvalidKeySize {
                expected: 4,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_signed_conversion() {
        let key = XteaKey::from_signed([-1, 0, 1, i32::MIN]);
        assert_eq!(key.words(), [0xFFFF_FFFF, 0, 1, 0x8000_0000]);
        assert_eq!(key.to_signed(), [-1, 0, 1, i32::MIN]);
    }

    #[test]
    fn test_hex_round_trip() {
        let key = XteaKey::from_hex("000102030405060708090a0b0c0d0e0f").expect("valid hex");
        assert_eq!(
            key.words(),
            [0x0001_0203, 0x0405_0607, 0x0809_0A0B, 0x0C0D_0E0F]
        );
        assert_eq!(key.to_string(), "000102030405060708090A0B0C0D0E0F");

        assert!(matches!(
            XteaKey::from_hex("0001"),
            Err(CryptoError::InvalidKeySize { .. })
        ));
        assert!(matches!(
            XteaKey::from_hex("zz"),
            Err(CryptoError::InvalidKeyFormat(_))
        ));
    }

    #[test]
    fn test_store_from_json() {
        let json = r#"[
            {"archive": 5, "group": 1, "name_hash": -1153472937, "name": "l40_55", "mapsquare": 10295, "key": [-1, 2, 3, 4]},
            {"archive": 5, "group": 2, "key": [5, 6, 7, 8]}
        ]"#;

        let store = XteaKeyStore::from_json_str(json).expect("valid key set");
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(5, 1), Some(XteaKey::from_signed([-1, 2, 3, 4])));
        assert_eq!(store.key_for(5, 2).words(), [5, 6, 7, 8]);
        assert_eq!(store.key_for(5, 3), XteaKey::ZERO);
    }

    #[test]
    fn test_store_json_round_trip() {
        let mut store = XteaKeyStore::new();
        store.insert(5, 7, XteaKey::from_signed([1, -2, 3, -4]));
        store.insert(5, 3, XteaKey::new([9, 9, 9, 9]));

        let json = store.to_json_string().expect("serializes");
        let reloaded = XteaKeyStore::from_json_reader(json.as_bytes()).expect("reloads");

        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get(5, 7), store.get(5, 7));
        assert_eq!(reloaded.get(5, 3), store.get(5, 3));
    }

    #[test]
    fn test_store_keeps_name_hash_through_save() {
        let json = r#"[
            {"archive": 5, "group": 1, "name_hash": -1153472937, "key": [1, 2, 3, 4]},
            {"archive": 5, "group": 2, "key": [5, 6, 7, 8]}
        ]"#;

        let store = XteaKeyStore::from_json_str(json).expect("valid key set");
        assert_eq!(store.name_hash(5, 1), Some(-1_153_472_937));
        assert_eq!(store.name_hash(5, 2), None);

        let saved = store.to_json_string().expect("serializes");
        let reloaded = XteaKeyStore::from_json_str(&saved).expect("reloads");
        assert_eq!(reloaded.name_hash(5, 1), Some(-1_153_472_937));
        assert_eq!(reloaded.name_hash(5, 2), None);

        let mut reloaded = reloaded;
        reloaded.remove(5, 1);
        assert_eq!(reloaded.name_hash(5, 1), None);
    }

    struct BrokenReader;

    impl Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk gone"))
        }
    }

    #[test]
    fn test_store_reader_failure_is_io() {
        assert!(matches!(
            XteaKeyStore::from_json_reader(BrokenReader),
            Err(CryptoError::Io(_))
        ));
    }

    #[test]
    fn test_store_rejects_malformed_json() {
        assert!(matches!(
            XteaKeyStore::from_json_str(r#"[{"archive": 5}]"#),
            Err(CryptoError::Json(_))
        ));
    }

    #[test]
    fn test_store_insert_remove() {
        let mut store = XteaKeyStore::new();
        assert!(store.is_empty());
        assert_eq!(store.insert(1, 1, XteaKey::new([1, 1, 1, 1])), None);
        assert!(store.insert(1, 1, XteaKey::new([2, 2, 2, 2])).is_some());
        assert_eq!(store.iter().count(), 1);
        assert_eq!(store.remove(1, 1), Some(XteaKey::new([2, 2, 2, 2])));
        assert!(store.is_empty());
    }
}
