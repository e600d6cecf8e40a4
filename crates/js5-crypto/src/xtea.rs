//! XTEA block cipher as used by JS5 packed files.
//!
//! This is the reference XTEA construction: 64-bit blocks split into two
//! big-endian 32-bit halves, a 128-bit key given as four 32-bit words, and
//! 32 cycles of the Feistel network. All arithmetic wraps at 32 bits.
//!
//! Two flavours are provided:
//!
//! - [`encrypt`]/[`decrypt`] allocate an output holding only the complete
//!   blocks of the input. A trailing partial block is dropped.
//! - [`encrypt_in_place`]/[`decrypt_in_place`] transform the complete blocks
//!   of a mutable buffer and leave a trailing partial block as-is. The file
//!   codec relies on this form so payloads of any length survive a round trip.
//!
//! With an inactive key (see [`XteaKey::is_active`]) every function is the
//! identity.
//!
//! ```rust
//! use js5_crypto::{XteaKey, xtea};
//!
//! let key = XteaKey::from_signed([-1, 42, 7, 1_000_000]);
//!
//! let mut data = b"sixteen byte msg and a tail".to_vec();
//! xtea::encrypt_in_place(&mut data, &key);
//! xtea::decrypt_in_place(&mut data, &key);
//! assert_eq!(&data[..], b"sixteen byte msg and a tail");
//! ```

use crate::keys::XteaKey;

/// Key schedule constant (the golden ratio, `-0x61C88647` as a signed word)
pub const DELTA: u32 = 0x9E37_79B9;

/// Number of Feistel cycles per block
pub const ROUNDS: u32 = 32;

/// Cipher block size in bytes
pub const BLOCK_SIZE: usize = 8;

/// Encrypt all complete blocks of `data`.
///
/// The output length is `data.len() / 8 * 8`. An inactive key returns a copy
/// of the whole input.
pub fn encrypt(data: &[u8], key: &XteaKey) -> Vec<u8> {
    if !key.is_active() {
        return data.to_vec();
    }

    let mut output = data[..block_len(data)].to_vec();
    encrypt_in_place(&mut output, key);
    output
}

/// Decrypt all complete blocks of `data`.
///
/// The output length is `data.len() / 8 * 8`. An inactive key returns a copy
/// of the whole input.
pub fn decrypt(data: &[u8], key: &XteaKey) -> Vec<u8> {
    if !key.is_active() {
        return data.to_vec();
    }

    let mut output = data[..block_len(data)].to_vec();
    decrypt_in_place(&mut output, key);
    output
}

/// Encrypt the complete blocks of `data` in place.
pub fn encrypt_in_place(data: &mut [u8], key: &XteaKey) {
    if !key.is_active() {
        return;
    }

    let k = key.words();
    for block in data.chunks_exact_mut(BLOCK_SIZE) {
        let (mut v0, mut v1) = read_block(block);
        let mut sum = 0u32;

        for _ in 0..ROUNDS {
            v0 = v0.wrapping_add(mix(v1) ^ sum.wrapping_add(k[(sum & 3) as usize]));
            sum = sum.wrapping_add(DELTA);
            v1 = v1.wrapping_add(mix(v0) ^ sum.wrapping_add(k[((sum >> 11) & 3) as usize]));
        }

        write_block(block, v0, v1);
    }
}

/// Decrypt the complete blocks of `data` in place.
pub fn decrypt_in_place(data: &mut [u8], key: &XteaKey) {
    if !key.is_active() {
        return;
    }

    let k = key.words();
    for block in data.chunks_exact_mut(BLOCK_SIZE) {
        let (mut v0, mut v1) = read_block(block);
        let mut sum = DELTA.wrapping_mul(ROUNDS);

        for _ in 0..ROUNDS {
            v1 = v1.wrapping_sub(mix(v0) ^ sum.wrapping_add(k[((sum >> 11) & 3) as usize]));
            sum = sum.wrapping_sub(DELTA);
            v0 = v0.wrapping_sub(mix(v1) ^ sum.wrapping_add(k[(sum & 3) as usize]));
        }

        write_block(block, v0, v1);
    }
}

/// Round function shared by both halves
#[inline]
const fn mix(v: u32) -> u32 {
    ((v << 4) ^ (v >> 5)).wrapping_add(v)
}

#[inline]
const fn block_len(data: &[u8]) -> usize {
    data.len() / BLOCK_SIZE * BLOCK_SIZE
}

#[inline]
fn read_block(block: &[u8]) -> (u32, u32) {
    let v0 = u32::from_be_bytes([block[0], block[1], block[2], block[3]]);
    let v1 = u32::from_be_bytes([block[4], block[5], block[6], block[7]]);
    (v0, v1)
}

#[inline]
fn write_block(block: &mut [u8], v0: u32, v1: u32) {
    block[..4].copy_from_slice(&v0.to_be_bytes());
    block[4..].copy_from_slice(&v1.to_be_bytes());
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_key() -> XteaKey {
        XteaKey::new([0x0001_0203, 0x0405_0607, 0x0809_0A0B, 0x0C0D_0E0F])
    }

    #[test]
    fn test_xtea_known_vector() {
        let ciphertext = encrypt(b"ABCDEFGH", &test_key());
        assert_eq!(
            ciphertext,
            [0x49, 0x7D, 0xF3, 0xD0, 0x72, 0x61, 0x2C, 0xB5]
        );
        assert_eq!(decrypt(&ciphertext, &test_key()), b"ABCDEFGH");
    }

    #[test]
    fn test_xtea_round_trip() {
        let plaintext = b"0123456789abcdef0123456789abcdef";
        let ciphertext = encrypt(plaintext, &test_key());

        assert_eq!(ciphertext.len(), plaintext.len());
        assert_ne!(&ciphertext[..], plaintext);
        assert_eq!(decrypt(&ciphertext, &test_key()), plaintext);
    }

    #[test]
    fn test_xtea_drops_partial_block() {
        let data = b"exactly eight + 3";
        assert_eq!(encrypt(data, &test_key()).len(), 16);
        assert_eq!(decrypt(data, &test_key()).len(), 16);
        assert!(encrypt(b"short", &test_key()).is_empty());
    }

    #[test]
    fn test_xtea_in_place_keeps_tail() {
        let original = b"0123456789abcdefXYZ".to_vec();
        let mut data = original.clone();

        encrypt_in_place(&mut data, &test_key());
        assert_eq!(&data[16..], b"XYZ");
        assert_ne!(&data[..16], &original[..16]);

        decrypt_in_place(&mut data, &test_key());
        assert_eq!(data, original);
    }

    #[test]
    fn test_xtea_in_place_matches_allocating() {
        let data = b"some sixteen b..";
        let mut in_place = data.to_vec();
        encrypt_in_place(&mut in_place, &test_key());
        assert_eq!(in_place, encrypt(data, &test_key()));
    }

    #[test]
    fn test_xtea_zero_key_is_identity() {
        let data = b"not aligned at all";
        assert_eq!(encrypt(data, &XteaKey::ZERO), data);
        assert_eq!(decrypt(data, &XteaKey::ZERO), data);

        let mut buffer = data.to_vec();
        encrypt_in_place(&mut buffer, &XteaKey::ZERO);
        assert_eq!(buffer, data);
    }

    #[test]
    fn test_xtea_wrong_length_key_is_identity() {
        let data = b"12345678";
        let key = XteaKey::from_slice(&[1, 2, 3]);
        assert_eq!(encrypt(data, &key), data);
        assert_eq!(decrypt(data, &key), data);
    }

    #[test]
    fn test_xtea_signed_key_matches_unsigned() {
        let signed = XteaKey::from_signed([-1, -2, 3, 4]);
        let unsigned = XteaKey::new([0xFFFF_FFFF, 0xFFFF_FFFE, 3, 4]);
        assert_eq!(encrypt(b"ABCDEFGH", &signed), encrypt(b"ABCDEFGH", &unsigned));
    }

    proptest! {
        #[test]
        fn xtea_round_trip_aligned(
            blocks in prop::collection::vec(any::<[u8; 8]>(), 0..64),
            words in any::<[u32; 4]>(),
        ) {
            let data: Vec<u8> = blocks.concat();
            let key = XteaKey::new(words);
            prop_assert_eq!(decrypt(&encrypt(&data, &key), &key), data);
        }

        #[test]
        fn xtea_in_place_round_trip_any_length(
            data in prop::collection::vec(any::<u8>(), 0..300),
            words in any::<[u32; 4]>(),
        ) {
            let key = XteaKey::new(words);
            let mut buffer = data.clone();
            encrypt_in_place(&mut buffer, &key);
            decrypt_in_place(&mut buffer, &key);
            prop_assert_eq!(buffer, data);
        }
    }
}
