//! Account model produced by [`decrypt`](crate::decrypt) and consumed by
//! [`encrypt`](crate::encrypt).

use alloy_primitives::{Address, B256};
use alloy_signer_local::PrivateKeySigner;

use crate::keystore::errors::KeystoreError;
use crate::keystore::mnemonic;

/// Derivation path used when a keystore document or caller does not name one.
pub const DEFAULT_DERIVATION_PATH: &str = "m/44'/60'/0'/0/0";

/// A decrypted wallet account.
///
/// `address` always equals the address derived from `private_key`; when a
/// mnemonic is present, deriving it along `path` reproduces `private_key`.
/// Both invariants are enforced by the codec on every decode and encode.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    /// Account address (EIP-55 checksum casing via `Display`)
    pub address: Address,
    /// 32-byte secp256k1 private key
    pub private_key: B256,
    /// HD-wallet mnemonic that produced the key, if the document carried one
    pub mnemonic: Option<AccountMnemonic>,
    /// BIP-32 derivation path; present exactly when `mnemonic` is
    pub path: Option<String>,
}

/// A BIP-39 phrase together with the entropy that encodes it.
#[derive(Clone, PartialEq, Eq)]
pub struct AccountMnemonic {
    /// Space-separated mnemonic words, normalized to lowercase
    pub phrase: String,
    /// Source entropy (16 or 32 bytes typical)
    pub entropy: Vec<u8>,
}

impl Account {
    /// Build an account from a raw private key, deriving its address.
    pub fn from_private_key(private_key: B256) -> Result<Self, KeystoreError> {
        let signer = PrivateKeySigner::from_bytes(&private_key)
            .map_err(|_| KeystoreError::InvalidPrivateKey)?;
        Ok(Self { address: signer.address(), private_key, mnemonic: None, path: None })
    }

    /// Build an account from a mnemonic phrase, walking `path` (or the
    /// default `m/44'/60'/0'/0/0`) to the private key.
    pub fn from_mnemonic(phrase: &str, path: Option<&str>) -> Result<Self, KeystoreError> {
        let path = path.unwrap_or(DEFAULT_DERIVATION_PATH);
        let (normalized, entropy) = mnemonic::phrase_to_entropy(phrase)?;
        let signer = mnemonic::derive_signer(&normalized, path)?;
        let private_key = B256::from_slice(signer.credential().to_bytes().as_slice());

        Ok(Self {
            address: signer.address(),
            private_key,
            mnemonic: Some(AccountMnemonic { phrase: normalized, entropy: entropy.to_vec() }),
            path: Some(path.to_string()),
        })
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .field("private_key", &"[REDACTED]")
            .field("mnemonic", &self.mnemonic)
            .field("path", &self.path)
            .finish()
    }
}

impl std::fmt::Debug for AccountMnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountMnemonic")
            .field("phrase", &"[REDACTED]")
            .field("entropy", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;

    const JUNK_PHRASE: &str =
        "test test test test test test test test test test test junk";

    #[test]
    fn from_private_key_derives_address() {
        let account = Account::from_private_key(b256!(
            "0000000000000000000000000000000000000000000000000000000000000001"
        ))
        .unwrap();
        assert_eq!(
            account.address.to_checksum(None),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
        );
        assert!(account.mnemonic.is_none());
        assert!(account.path.is_none());
    }

    #[test]
    fn from_private_key_rejects_zero_scalar() {
        assert!(matches!(
            Account::from_private_key(B256::ZERO),
            Err(KeystoreError::InvalidPrivateKey)
        ));
    }

    #[test]
    fn from_mnemonic_walks_default_path() {
        let account = Account::from_mnemonic(JUNK_PHRASE, None).unwrap();
        assert_eq!(
            account.address.to_checksum(None),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
        assert_eq!(
            account.private_key,
            b256!("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80")
        );
        assert_eq!(account.path.as_deref(), Some(DEFAULT_DERIVATION_PATH));
        let mnemonic = account.mnemonic.unwrap();
        assert_eq!(mnemonic.phrase, JUNK_PHRASE);
        assert_eq!(mnemonic.entropy.len(), 16);
    }

    #[test]
    fn from_mnemonic_normalizes_phrase() {
        let shouty = JUNK_PHRASE.to_uppercase();
        let account = Account::from_mnemonic(&shouty, None).unwrap();
        assert_eq!(account.mnemonic.unwrap().phrase, JUNK_PHRASE);
    }

    #[test]
    fn from_mnemonic_rejects_bad_checksum() {
        let bad = "test test test test test test test test test test test test";
        assert!(matches!(
            Account::from_mnemonic(bad, None),
            Err(KeystoreError::InvalidMnemonic(_))
        ));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let account = Account::from_mnemonic(JUNK_PHRASE, None).unwrap();
        let rendered = format!("{account:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("junk"));
        assert!(!rendered.contains("ac0974be"));
    }
}
