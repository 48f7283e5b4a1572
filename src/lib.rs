//! # Meowvault - Encrypted JSON Wallet Codec
//!
//! A codec for the Web3 Secret Storage (keystore Version 3) format used by
//! geth, ethers, and other Ethereum clients, extended with the `x-ethers`
//! encrypted-mnemonic section. Decrypt a document with a passphrase to
//! recover an [`Account`]; encrypt an [`Account`] into a fresh document.
//!
//! ```no_run
//! use alloy_primitives::b256;
//! use meowvault::{decrypt, encrypt, Account, EncryptOptions};
//!
//! # fn main() -> Result<(), meowvault::KeystoreError> {
//! let account = Account::from_private_key(b256!(
//!     "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
//! ))?;
//! let json = encrypt(&account, "correct horse battery", &EncryptOptions::default())?;
//! let recovered = decrypt(&json, "correct horse battery")?;
//! assert_eq!(recovered.address, account.address);
//! # Ok(())
//! # }
//! ```

pub mod account;
pub mod keystore;

mod bytes;
mod json;

pub use account::{Account, AccountMnemonic, DEFAULT_DERIVATION_PATH};
pub use keystore::errors::KeystoreError;
pub use keystore::{
    decrypt, decrypt_with_progress, encrypt, encrypt_with_progress, is_keystore_wallet,
    EncryptOptions, ScryptOptions,
};
