//! Encrypted JSON wallet codec (Web3 Secret Storage, Version 3).
//!
//! Decrypts keystore documents produced by geth, ethers, and other Ethereum
//! clients, and encrypts accounts into fresh documents those clients can
//! read back. Key derivation is scrypt or PBKDF2, encryption is AES-128-CTR,
//! and the MAC is keccak256 over the ciphertext. Wallets generated from a
//! BIP-39 phrase carry an `x-ethers` section holding the phrase's entropy,
//! encrypted under an extension of the derived key.
//!
//! # Format
//!
//! ```json
//! {
//!   "address": "hex-address-without-0x",
//!   "id": "uuid-v4",
//!   "version": 3,
//!   "Crypto": {
//!     "cipher": "aes-128-ctr",
//!     "cipherparams": { "iv": "hex-initialization-vector" },
//!     "ciphertext": "hex-encrypted-key",
//!     "kdf": "scrypt",
//!     "kdfparams": { "salt": "hex-salt", "n": 131072, "dklen": 32, "p": 1, "r": 8 },
//!     "mac": "hex-keccak256-mac"
//!   },
//!   "x-ethers": {
//!     "client": "meowvault",
//!     "gethFilename": "UTC--2026-08-02T12-00-00.0Z--<address>",
//!     "mnemonicCounter": "hex-16-byte-counter",
//!     "mnemonicCiphertext": "hex-encrypted-entropy",
//!     "path": "m/44'/60'/0'/0/0",
//!     "version": "0.1"
//!   }
//! }
//! ```
//!
//! Decoding is case-insensitive over key names (`Crypto` vs `crypto` varies
//! by producer); emission is canonical: lowercase unprefixed hex, the
//! capital-C `Crypto` spelling, stable field order.

pub mod errors;

mod cipher;
mod kdf;
pub(crate) mod mnemonic;

use alloy_primitives::{Address, B256};
use alloy_signer_local::PrivateKeySigner;
use chrono::{Datelike, Timelike, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use zeroize::Zeroizing;

use crate::account::{Account, DEFAULT_DERIVATION_PATH};
use crate::bytes::{loose_hex, loose_hex_str, zpad};
use crate::json::{search, search_str};
use self::errors::KeystoreError;

/// Default scrypt work factor
pub const DEFAULT_SCRYPT_N: u64 = 1 << 17;
/// Default scrypt block size
pub const DEFAULT_SCRYPT_R: u32 = 8;
/// Default scrypt parallelism
pub const DEFAULT_SCRYPT_P: u32 = 1;

/// Producer tag written to `x-ethers/client` unless overridden
const DEFAULT_CLIENT: &str = "meowvault";
/// The only cipher this codec speaks
const CIPHER_AES_128_CTR: &str = "aes-128-ctr";
/// Version of the encrypted-mnemonic section
const MNEMONIC_SECTION_VERSION: &str = "0.1";

/// Options accepted by [`encrypt`]. All fields are optional; defaults are
/// fresh randomness and the standard scrypt parameters.
#[derive(Clone, Debug, Default)]
pub struct EncryptOptions {
    /// Override the IV for private-key encryption; must be 16 bytes
    pub iv: Option<Vec<u8>>,
    /// Override the scrypt salt (default: 32 random bytes)
    pub salt: Option<Vec<u8>>,
    /// Override the UUIDv4 random seed; must be 16 bytes
    pub uuid: Option<Vec<u8>>,
    /// Producer tag written to `x-ethers/client`
    pub client: Option<String>,
    /// scrypt work parameters
    pub scrypt: ScryptOptions,
    /// Reserved. Accepted and ignored; no codec path consumes it.
    pub entropy: Option<Vec<u8>>,
}

/// scrypt work parameters for [`encrypt`].
#[derive(Clone, Copy, Debug)]
pub struct ScryptOptions {
    /// Work factor; must be a power of two
    pub n: u64,
    /// Block size
    pub r: u32,
    /// Parallelism
    pub p: u32,
}

impl Default for ScryptOptions {
    fn default() -> Self {
        Self { n: DEFAULT_SCRYPT_N, r: DEFAULT_SCRYPT_R, p: DEFAULT_SCRYPT_P }
    }
}

/// Emitted keystore document (canonical field order).
#[derive(Serialize)]
struct KeystoreJson {
    /// Account address: 40 lowercase hex chars, no `0x`
    address: String,
    /// Encrypted key material
    #[serde(rename = "Crypto")]
    crypto: CryptoJson,
    /// UUIDv4 identifier
    id: String,
    /// Keystore version (always 3)
    version: u32,
    /// Encrypted-mnemonic extension, present iff the account has a mnemonic
    #[serde(rename = "x-ethers", skip_serializing_if = "Option::is_none")]
    x_ethers: Option<XEthersJson>,
}

/// The V3 `Crypto` object.
#[derive(Serialize)]
struct CryptoJson {
    cipher: String,
    cipherparams: CipherparamsJson,
    ciphertext: String,
    kdf: String,
    kdfparams: KdfparamsJson,
    mac: String,
}

#[derive(Serialize)]
struct CipherparamsJson {
    iv: String,
}

/// scrypt parameters as stored on disk. `dklen` describes the 32-byte Web3
/// half of the key; the codec always derives 64 bytes (see [`kdf`]).
#[derive(Serialize)]
struct KdfparamsJson {
    salt: String,
    n: u64,
    dklen: u32,
    p: u32,
    r: u32,
}

/// Encrypted-mnemonic extension object.
#[derive(Serialize)]
struct XEthersJson {
    client: String,
    #[serde(rename = "gethFilename")]
    geth_filename: String,
    #[serde(rename = "mnemonicCounter")]
    mnemonic_counter: String,
    #[serde(rename = "mnemonicCiphertext")]
    mnemonic_ciphertext: String,
    path: String,
    version: String,
}

/// Check whether a JSON blob looks like a V3 keystore document.
///
/// Cheap routing sniff for wallet loaders: parses the JSON and checks the
/// version field equals 3 (number or numeric string). No cryptographic work.
pub fn is_keystore_wallet(json_doc: &str) -> bool {
    let Ok(doc) = serde_json::from_str::<Value>(json_doc) else {
        return false;
    };
    match search(&doc, "version") {
        Ok(Some(version)) => {
            version.as_u64() == Some(3) || version.as_str().map(str::trim) == Some("3")
        }
        _ => false,
    }
}

/// Decrypt a keystore document with the given password.
///
/// See [`decrypt_with_progress`] for KDF progress reporting.
pub fn decrypt(json_doc: &str, password: impl AsRef<[u8]>) -> Result<Account, KeystoreError> {
    decrypt_with_progress(json_doc, password, |_| {})
}

/// Decrypt a keystore document, reporting KDF progress in `[0.0, 1.0]`.
///
/// The callback runs on the caller's thread and observes a monotone
/// sequence ending in `1.0`. The MAC is verified before anything is
/// decrypted, the recovered key's address is checked against the document's
/// `address` field if one is present, and an `x-ethers` mnemonic section is
/// decrypted and cross-checked against the recovered key.
pub fn decrypt_with_progress(
    json_doc: &str,
    password: impl AsRef<[u8]>,
    mut progress: impl FnMut(f32),
) -> Result<Account, KeystoreError> {
    let doc: Value = serde_json::from_str(json_doc)?;

    let cipher_name = search_str(&doc, "crypto/cipher")?.unwrap_or_default();
    if !cipher_name.eq_ignore_ascii_case(CIPHER_AES_128_CTR) {
        return Err(KeystoreError::UnsupportedCipher(cipher_name.to_string()));
    }

    let key = kdf::derive_key(&doc, password.as_ref(), &mut progress)?;

    // MAC gate: keccak256(key[16..32] || ciphertext) against crypto/mac.
    // A mismatch means wrong password or corruption; which one is
    // deliberately not distinguishable.
    let ciphertext = loose_hex(
        search(&doc, "crypto/ciphertext")?
            .ok_or_else(|| KeystoreError::InvalidHex("ciphertext".to_string()))?,
    )?;
    let stored_mac = loose_hex(
        search(&doc, "crypto/mac")?.ok_or_else(|| KeystoreError::InvalidHex("mac".to_string()))?,
    )?;
    let computed_mac = cipher::keystore_mac(&key[16..32], &ciphertext);
    if !cipher::constant_time_eq(computed_mac.as_slice(), &stored_mac) {
        return Err(KeystoreError::InvalidPassword);
    }

    let iv = loose_hex(search(&doc, "crypto/cipherparams/iv")?.ok_or(KeystoreError::InvalidIv)?)?;
    if iv.len() != 16 {
        return Err(KeystoreError::InvalidIv);
    }

    let mut plaintext = Zeroizing::new(ciphertext);
    cipher::aes128_ctr(&key[..16], &iv, &mut plaintext)?;
    if plaintext.len() != 32 {
        return Err(KeystoreError::InvalidPrivateKey);
    }
    let private_key = B256::from_slice(&plaintext);

    let signer =
        PrivateKeySigner::from_bytes(&private_key).map_err(|_| KeystoreError::InvalidPrivateKey)?;
    let address = signer.address();

    if let Some(stored) = search_str(&doc, "address")? {
        let stored_bytes = loose_hex_str(stored)?;
        if stored_bytes.len() != 20 {
            return Err(KeystoreError::InvalidHex(stored.to_string()));
        }
        if Address::from_slice(&stored_bytes) != address {
            return Err(KeystoreError::AddressMismatch);
        }
    }

    let (recovered_mnemonic, path) =
        if search_str(&doc, "x-ethers/version")? == Some(MNEMONIC_SECTION_VERSION) {
            let (m, p) = mnemonic::decrypt_section(&doc, &key[32..64], &private_key)?;
            (Some(m), Some(p))
        } else {
            (None, None)
        };

    debug!(%address, mnemonic = recovered_mnemonic.is_some(), "decrypted keystore document");

    Ok(Account { address, private_key, mnemonic: recovered_mnemonic, path })
}

/// Encrypt an account into a fresh keystore document.
///
/// See [`encrypt_with_progress`] for KDF progress reporting.
pub fn encrypt(
    account: &Account,
    password: impl AsRef<[u8]>,
    options: &EncryptOptions,
) -> Result<String, KeystoreError> {
    encrypt_with_progress(account, password, options, |_| {})
}

/// Encrypt an account, reporting KDF progress in `[0.0, 1.0]`.
///
/// Input coherence (address ↔ private key, mnemonic ↔ private key, path
/// only with mnemonic) is validated before any derivation work. With `iv`,
/// `salt`, and `uuid` overrides fixed, the output is a pure function of the
/// inputs for mnemonic-less accounts; the mnemonic counter is always fresh
/// randomness.
pub fn encrypt_with_progress(
    account: &Account,
    password: impl AsRef<[u8]>,
    options: &EncryptOptions,
    mut progress: impl FnMut(f32),
) -> Result<String, KeystoreError> {
    let signer = PrivateKeySigner::from_bytes(&account.private_key)
        .map_err(|_| KeystoreError::InvalidPrivateKey)?;
    if signer.address() != account.address {
        return Err(KeystoreError::AddressPrivateKeyMismatch);
    }

    if account.path.is_some() && account.mnemonic.is_none() {
        return Err(KeystoreError::PathWithoutMnemonic);
    }
    let path = account.path.as_deref().unwrap_or(DEFAULT_DERIVATION_PATH);
    if let Some(account_mnemonic) = &account.mnemonic {
        let derived = mnemonic::derive_signer(&account_mnemonic.phrase, path)?;
        if mnemonic::signer_key(&derived) != account.private_key {
            return Err(KeystoreError::MnemonicMismatch);
        }
    }

    let iv: [u8; 16] = match &options.iv {
        Some(bytes) => bytes.as_slice().try_into().map_err(|_| KeystoreError::InvalidIv)?,
        None => random_bytes::<16>(),
    };
    let uuid_seed: [u8; 16] = match &options.uuid {
        Some(bytes) => bytes.as_slice().try_into().map_err(|_| KeystoreError::InvalidUuid)?,
        None => random_bytes::<16>(),
    };
    let salt = match &options.salt {
        Some(bytes) => bytes.clone(),
        None => random_bytes::<32>().to_vec(),
    };

    let ScryptOptions { n, r, p } = options.scrypt;
    if n == 0 || r == 0 || p == 0 {
        return Err(KeystoreError::UnsupportedKdfParams);
    }
    if !n.is_power_of_two() {
        return Err(KeystoreError::UnsupportedKdfNValue);
    }
    let params = scrypt::Params::new(n.trailing_zeros() as u8, r, p, kdf::DERIVED_KEY_LENGTH)
        .map_err(|_| KeystoreError::UnsupportedKdfParams)?;

    debug!(n, r, p, "deriving keystore key with scrypt");
    progress(0.0);
    let mut key = Zeroizing::new([0u8; kdf::DERIVED_KEY_LENGTH]);
    scrypt::scrypt(password.as_ref(), &salt, &params, key.as_mut())
        .map_err(|_| KeystoreError::UnsupportedKdfParams)?;
    progress(1.0);

    // The private-key copy is overwritten in place by the keystream.
    let mut ciphertext = account.private_key.to_vec();
    cipher::aes128_ctr(&key[..16], &iv, &mut ciphertext)?;
    let mac = cipher::keystore_mac(&key[16..32], &ciphertext);

    let address_hex = hex::encode(account.address.as_slice());

    let x_ethers = match &account.mnemonic {
        Some(account_mnemonic) => {
            let (counter, entropy_ciphertext) =
                mnemonic::encrypt_entropy(&account_mnemonic.phrase, &key[32..64])?;
            Some(XEthersJson {
                client: options.client.clone().unwrap_or_else(|| DEFAULT_CLIENT.to_string()),
                geth_filename: geth_filename(&address_hex),
                mnemonic_counter: hex::encode(counter),
                mnemonic_ciphertext: hex::encode(&entropy_ciphertext),
                path: path.to_string(),
                version: MNEMONIC_SECTION_VERSION.to_string(),
            })
        }
        None => None,
    };

    let document = KeystoreJson {
        address: address_hex,
        crypto: CryptoJson {
            cipher: CIPHER_AES_128_CTR.to_string(),
            cipherparams: CipherparamsJson { iv: hex::encode(iv) },
            ciphertext: hex::encode(&ciphertext),
            kdf: "scrypt".to_string(),
            kdfparams: KdfparamsJson { salt: hex::encode(&salt), n, dklen: 32, p, r },
            mac: hex::encode(mac),
        },
        id: uuid::Builder::from_random_bytes(uuid_seed).into_uuid().to_string(),
        version: 3,
        x_ethers,
    };

    debug!(address = %account.address, "encrypted keystore document");

    Ok(serde_json::to_string(&document)?)
}

/// Geth-style filename for the document: `UTC--<timestamp>--<address>`,
/// with `:` replaced by `-` in the time and a literal `.0Z` suffix.
fn geth_filename(address_hex: &str) -> String {
    let now = Utc::now();
    format!(
        "UTC--{}-{}-{}T{}-{}-{}.0Z--{}",
        zpad(now.year() as u64, 4),
        zpad(now.month() as u64, 2),
        zpad(now.day() as u64, 2),
        zpad(now.hour() as u64, 2),
        zpad(now.minute() as u64, 2),
        zpad(now.second() as u64, 2),
        address_hex,
    )
}

/// Generate N random bytes using the platform CSPRNG via `B256::random()`.
fn random_bytes<const N: usize>() -> [u8; N] {
    let mut result = [0u8; N];
    let mut filled = 0;
    while filled < N {
        let random = B256::random();
        let copy_len = (N - filled).min(32);
        result[filled..filled + copy_len].copy_from_slice(&random[..copy_len]);
        filled += copy_len;
    }
    result
}
