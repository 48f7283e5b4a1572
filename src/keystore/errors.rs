use thiserror::Error;

/// Errors that can occur while decoding or encoding a keystore document.
///
/// The taxonomy is deliberately flat: wallet loaders branch on these kinds
/// (e.g. re-prompting on [`KeystoreError::InvalidPassword`] but surfacing
/// everything else as a corrupt file).
#[derive(Debug, Error)]
pub enum KeystoreError {
    /// Input is not valid JSON
    #[error("invalid keystore JSON: {0}")]
    BadJson(#[from] serde_json::Error),

    /// Multiple sibling JSON keys differ only in case at a traversed level
    #[error("ambiguous JSON key: multiple case variants of {0:?}")]
    AmbiguousKey(String),

    /// `crypto/kdf` missing or not scrypt/pbkdf2
    #[error("unsupported key-derivation function")]
    UnsupportedKdf,

    /// KDF parameters missing, zero, or out of range
    #[error("unsupported key-derivation parameters")]
    UnsupportedKdfParams,

    /// scrypt N is not a power of two
    #[error("unsupported scrypt N value (must be a power of two)")]
    UnsupportedKdfNValue,

    /// `dklen` field is not 32
    #[error("unsupported derived-key length {0} (must be 32)")]
    UnsupportedDkLen(u64),

    /// pbkdf2 `prf` is not hmac-sha256/hmac-sha512
    #[error("unsupported pbkdf2 PRF {0:?}")]
    UnsupportedPrf(String),

    /// `crypto/cipher` is not aes-128-ctr
    #[error("unsupported cipher {0:?}")]
    UnsupportedCipher(String),

    /// MAC mismatch: wrong password or corrupted document (indistinguishable)
    #[error("invalid password")]
    InvalidPassword,

    /// Document address does not match the address of the decrypted key
    #[error("keystore address does not match the decrypted private key")]
    AddressMismatch,

    /// Mnemonic derivation does not produce the expected private key
    #[error("mnemonic does not derive the expected private key")]
    MnemonicMismatch,

    /// Encrypt input: account address does not match its private key
    #[error("account address does not match its private key")]
    AddressPrivateKeyMismatch,

    /// Encrypt input: derivation path supplied without a mnemonic
    #[error("derivation path supplied without a mnemonic")]
    PathWithoutMnemonic,

    /// IV override or document IV is not 16 bytes
    #[error("IV must be exactly 16 bytes")]
    InvalidIv,

    /// UUID override is not 16 bytes
    #[error("UUID seed must be exactly 16 bytes")]
    InvalidUuid,

    /// Malformed hex value
    #[error("invalid hex value: {0}")]
    InvalidHex(String),

    /// Decrypted or supplied bytes are not a valid secp256k1 private key
    #[error("invalid private key")]
    InvalidPrivateKey,

    /// Mnemonic phrase, entropy, or derivation path rejected by the BIP-39/32 layer
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),
}
