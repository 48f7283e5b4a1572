//! Encrypted-mnemonic (`x-ethers`) section of a keystore document.
//!
//! Wallets that were generated from a BIP-39 phrase store the phrase's
//! entropy alongside the key, encrypted under the upper half of the derived
//! key (`key[32..64]`, AES-256-CTR). The recovered mnemonic is never trusted
//! on its own: it must re-derive the exact private key carried by the Web3
//! section, and the same check gates encryption before any KDF work runs.

use alloy_primitives::B256;
use alloy_signer_local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner};
use bip39::Mnemonic as Bip39Mnemonic;
use serde_json::Value;
use zeroize::Zeroizing;

use super::cipher;
use super::errors::KeystoreError;
use crate::account::{AccountMnemonic, DEFAULT_DERIVATION_PATH};
use crate::{bytes, json};

/// Walk `path` from `phrase` to a signer.
pub(crate) fn derive_signer(phrase: &str, path: &str) -> Result<PrivateKeySigner, KeystoreError> {
    MnemonicBuilder::<English>::default()
        .phrase(phrase)
        .derivation_path(path)
        .map_err(|e| KeystoreError::InvalidMnemonic(e.to_string()))?
        .build()
        .map_err(|e| KeystoreError::InvalidMnemonic(e.to_string()))
}

/// The private key a signer holds, as a `B256`.
pub(crate) fn signer_key(signer: &PrivateKeySigner) -> B256 {
    B256::from_slice(signer.credential().to_bytes().as_slice())
}

/// Normalize a phrase (trim, lowercase) and recover its source entropy.
pub(crate) fn phrase_to_entropy(phrase: &str) -> Result<(String, Zeroizing<Vec<u8>>), KeystoreError> {
    let normalized = phrase.trim().to_lowercase();
    let parsed = Bip39Mnemonic::parse_normalized(&normalized)
        .map_err(|e| KeystoreError::InvalidMnemonic(e.to_string()))?;
    Ok((normalized, Zeroizing::new(parsed.to_entropy())))
}

/// Reconstruct the canonical phrase encoded by `entropy`.
pub(crate) fn entropy_to_phrase(entropy: &[u8]) -> Result<String, KeystoreError> {
    Bip39Mnemonic::from_entropy(entropy)
        .map(|m| m.to_string())
        .map_err(|e| KeystoreError::InvalidMnemonic(e.to_string()))
}

/// Decrypt the `x-ethers` section and cross-check it against the private key
/// recovered from the Web3 section.
pub(crate) fn decrypt_section(
    doc: &Value,
    mnemonic_key: &[u8],
    private_key: &B256,
) -> Result<(AccountMnemonic, String), KeystoreError> {
    let counter = bytes::loose_hex(
        json::search(doc, "x-ethers/mnemonicCounter")?.ok_or(KeystoreError::InvalidIv)?,
    )?;
    if counter.len() != 16 {
        return Err(KeystoreError::InvalidIv);
    }

    let ciphertext = json::search(doc, "x-ethers/mnemonicCiphertext")?
        .ok_or_else(|| KeystoreError::InvalidHex("mnemonicCiphertext".to_string()))?;
    let mut entropy = Zeroizing::new(bytes::loose_hex(ciphertext)?);
    cipher::aes256_ctr(mnemonic_key, &counter, &mut entropy)?;

    let phrase = entropy_to_phrase(&entropy)?;
    let path = json::search_str(doc, "x-ethers/path")?
        .unwrap_or(DEFAULT_DERIVATION_PATH)
        .to_string();

    let derived = derive_signer(&phrase, &path)?;
    if signer_key(&derived) != *private_key {
        return Err(KeystoreError::MnemonicMismatch);
    }

    Ok((AccountMnemonic { phrase, entropy: entropy.to_vec() }, path))
}

/// Encrypt a phrase's entropy under the mnemonic key slice with a fresh
/// random counter. Returns `(counter, ciphertext)`.
pub(crate) fn encrypt_entropy(
    phrase: &str,
    mnemonic_key: &[u8],
) -> Result<([u8; 16], Vec<u8>), KeystoreError> {
    let (_, entropy) = phrase_to_entropy(phrase)?;
    let counter = super::random_bytes::<16>();
    let mut ciphertext = entropy.to_vec();
    cipher::aes256_ctr(mnemonic_key, &counter, &mut ciphertext)?;
    Ok((counter, ciphertext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const JUNK_PHRASE: &str =
        "test test test test test test test test test test test junk";

    #[test]
    fn phrase_entropy_roundtrip() {
        let (normalized, entropy) = phrase_to_entropy(JUNK_PHRASE).unwrap();
        assert_eq!(normalized, JUNK_PHRASE);
        assert_eq!(entropy_to_phrase(&entropy).unwrap(), JUNK_PHRASE);
    }

    #[test]
    fn derive_signer_rejects_malformed_path() {
        assert!(matches!(
            derive_signer(JUNK_PHRASE, "m/not/a/path"),
            Err(KeystoreError::InvalidMnemonic(_))
        ));
    }

    #[test]
    fn entropy_section_roundtrip_with_cross_check() {
        let key = [0x5Au8; 32];
        let signer = derive_signer(JUNK_PHRASE, DEFAULT_DERIVATION_PATH).unwrap();
        let private_key = signer_key(&signer);

        let (counter, ciphertext) = encrypt_entropy(JUNK_PHRASE, &key).unwrap();
        let doc = json!({
            "x-ethers": {
                "version": "0.1",
                "mnemonicCounter": hex::encode(counter),
                "mnemonicCiphertext": hex::encode(&ciphertext),
            }
        });

        let (mnemonic, path) = decrypt_section(&doc, &key, &private_key).unwrap();
        assert_eq!(mnemonic.phrase, JUNK_PHRASE);
        assert_eq!(path, DEFAULT_DERIVATION_PATH);
    }

    #[test]
    fn cross_check_rejects_foreign_private_key() {
        let key = [0x5Au8; 32];
        let (counter, ciphertext) = encrypt_entropy(JUNK_PHRASE, &key).unwrap();
        let doc = json!({
            "x-ethers": {
                "mnemonicCounter": hex::encode(counter),
                "mnemonicCiphertext": hex::encode(&ciphertext),
            }
        });

        let other = B256::repeat_byte(0x07);
        assert!(matches!(
            decrypt_section(&doc, &key, &other),
            Err(KeystoreError::MnemonicMismatch)
        ));
    }

    #[test]
    fn counter_must_be_sixteen_bytes() {
        let doc = json!({
            "x-ethers": { "mnemonicCounter": "aabb", "mnemonicCiphertext": "00".repeat(16) }
        });
        assert!(matches!(
            decrypt_section(&doc, &[0u8; 32], &B256::ZERO),
            Err(KeystoreError::InvalidIv)
        ));
    }
}
