//! AES-CTR codec and keccak MAC for keystore documents.
//!
//! The IV is the full 16-byte initial counter block, incremented big-endian
//! (`Ctr128BE`). The private-key slice of the derived key is 16 bytes
//! (AES-128); the mnemonic slice is 32 bytes (AES-256). Encryption and
//! decryption are the same keystream application, length-preserving, no
//! padding.

use aes::cipher::{KeyIvInit, StreamCipher};
use aes::{Aes128, Aes256};
use alloy_primitives::{keccak256, B256};
use ctr::Ctr128BE;
use zeroize::Zeroizing;

use super::errors::KeystoreError;

type Aes128Ctr = Ctr128BE<Aes128>;
type Aes256Ctr = Ctr128BE<Aes256>;

/// Apply the AES-128-CTR keystream to `data` in place. `key` must be the
/// 16-byte cipher slice of the derived key, `iv` the 16-byte counter block.
pub(crate) fn aes128_ctr(key: &[u8], iv: &[u8], data: &mut [u8]) -> Result<(), KeystoreError> {
    let mut cipher = Aes128Ctr::new_from_slices(key, iv).map_err(|_| KeystoreError::InvalidIv)?;
    cipher.apply_keystream(data);
    Ok(())
}

/// Apply the AES-256-CTR keystream to `data` in place. `key` must be the
/// 32-byte mnemonic slice of the derived key.
pub(crate) fn aes256_ctr(key: &[u8], iv: &[u8], data: &mut [u8]) -> Result<(), KeystoreError> {
    let mut cipher = Aes256Ctr::new_from_slices(key, iv).map_err(|_| KeystoreError::InvalidIv)?;
    cipher.apply_keystream(data);
    Ok(())
}

/// Compute the document MAC: `keccak256(key[16..32] || ciphertext)`.
///
/// The MAC covers the ciphertext, not the plaintext; it doubles as the
/// password check.
pub(crate) fn keystore_mac(mac_key: &[u8], ciphertext: &[u8]) -> B256 {
    let mut input = Zeroizing::new(Vec::with_capacity(mac_key.len() + ciphertext.len()));
    input.extend_from_slice(mac_key);
    input.extend_from_slice(ciphertext);
    keccak256(input.as_slice())
}

/// Constant-time byte comparison.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        acc |= x ^ y;
    }
    acc == 0
}
