//! Key-derivation dispatch for keystore documents.
//!
//! The stored `dklen` field describes the 32-byte Web3 half of the derived
//! key only. The codec always derives 64 bytes: `[0..16)` is the AES key,
//! `[16..32)` the MAC prefix, `[32..64)` the mnemonic-section key. This is
//! a load-bearing quirk of the ecosystem, not an implementation choice.

use serde_json::Value;
use tracing::debug;
use zeroize::Zeroizing;

use super::errors::KeystoreError;
use crate::{bytes, json};

/// Bytes always requested from the KDF, independent of the stored `dklen`.
pub(crate) const DERIVED_KEY_LENGTH: usize = 64;

/// Derive the 64-byte document key, dispatching on `crypto/kdf`.
///
/// `progress` observes `0.0` before derivation starts and `1.0` once it
/// completes, on the caller's thread.
pub(crate) fn derive_key(
    doc: &Value,
    password: &[u8],
    progress: &mut dyn FnMut(f32),
) -> Result<Zeroizing<[u8; DERIVED_KEY_LENGTH]>, KeystoreError> {
    let kdf = json::search_str(doc, "crypto/kdf")?
        .ok_or(KeystoreError::UnsupportedKdf)?
        .to_ascii_lowercase();

    match kdf.as_str() {
        "scrypt" => derive_scrypt(doc, password, progress),
        "pbkdf2" => derive_pbkdf2(doc, password, progress),
        _ => Err(KeystoreError::UnsupportedKdf),
    }
}

fn derive_scrypt(
    doc: &Value,
    password: &[u8],
    progress: &mut dyn FnMut(f32),
) -> Result<Zeroizing<[u8; DERIVED_KEY_LENGTH]>, KeystoreError> {
    let n = json::search_u64(doc, "crypto/kdfparams/n")?.unwrap_or(0);
    let r = json::search_u64(doc, "crypto/kdfparams/r")?.unwrap_or(0);
    let p = json::search_u64(doc, "crypto/kdfparams/p")?.unwrap_or(0);
    if n == 0 || r == 0 || p == 0 {
        return Err(KeystoreError::UnsupportedKdfParams);
    }
    if !n.is_power_of_two() {
        return Err(KeystoreError::UnsupportedKdfNValue);
    }

    let dklen = json::search_u64(doc, "crypto/kdfparams/dklen")?.unwrap_or(0);
    if dklen != 32 {
        return Err(KeystoreError::UnsupportedDkLen(dklen));
    }

    let salt = bytes::loose_hex(
        json::search(doc, "crypto/kdfparams/salt")?.ok_or(KeystoreError::UnsupportedKdfParams)?,
    )?;
    let r = u32::try_from(r).map_err(|_| KeystoreError::UnsupportedKdfParams)?;
    let p = u32::try_from(p).map_err(|_| KeystoreError::UnsupportedKdfParams)?;

    // n is a verified power of two, so trailing_zeros is exactly log2(n)
    let log_n = n.trailing_zeros() as u8;
    let params = scrypt::Params::new(log_n, r, p, DERIVED_KEY_LENGTH)
        .map_err(|_| KeystoreError::UnsupportedKdfParams)?;

    debug!(n, r, p, "deriving keystore key with scrypt");
    progress(0.0);
    let mut key = Zeroizing::new([0u8; DERIVED_KEY_LENGTH]);
    scrypt::scrypt(password, &salt, &params, key.as_mut())
        .map_err(|_| KeystoreError::UnsupportedKdfParams)?;
    progress(1.0);

    Ok(key)
}

fn derive_pbkdf2(
    doc: &Value,
    password: &[u8],
    progress: &mut dyn FnMut(f32),
) -> Result<Zeroizing<[u8; DERIVED_KEY_LENGTH]>, KeystoreError> {
    // prf is validated before any other parameter is read
    let prf = json::search_str(doc, "crypto/kdfparams/prf")?
        .unwrap_or_default()
        .to_ascii_lowercase();
    if prf != "hmac-sha256" && prf != "hmac-sha512" {
        return Err(KeystoreError::UnsupportedPrf(prf));
    }

    let c = json::search_u64(doc, "crypto/kdfparams/c")?.unwrap_or(0);
    if c == 0 {
        return Err(KeystoreError::UnsupportedKdfParams);
    }
    let c = u32::try_from(c).map_err(|_| KeystoreError::UnsupportedKdfParams)?;

    let dklen = json::search_u64(doc, "crypto/kdfparams/dklen")?.unwrap_or(0);
    if dklen != 32 {
        return Err(KeystoreError::UnsupportedDkLen(dklen));
    }

    let salt = bytes::loose_hex(
        json::search(doc, "crypto/kdfparams/salt")?.ok_or(KeystoreError::UnsupportedKdfParams)?,
    )?;

    debug!(c, prf = %prf, "deriving keystore key with pbkdf2");
    progress(0.0);
    let mut key = Zeroizing::new([0u8; DERIVED_KEY_LENGTH]);
    match prf.as_str() {
        "hmac-sha256" => pbkdf2::pbkdf2_hmac::<sha2::Sha256>(password, &salt, c, key.as_mut()),
        _ => pbkdf2::pbkdf2_hmac::<sha2::Sha512>(password, &salt, c, key.as_mut()),
    }
    progress(1.0);

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scrypt_doc(n: u64, r: u64, p: u64, dklen: u64) -> Value {
        json!({
            "crypto": {
                "kdf": "scrypt",
                "kdfparams": { "n": n, "r": r, "p": p, "dklen": dklen, "salt": "aa".repeat(32) }
            }
        })
    }

    #[test]
    fn scrypt_rejects_zero_or_missing_params() {
        let mut progress = |_: f32| {};
        for doc in [
            scrypt_doc(0, 8, 1, 32),
            scrypt_doc(1024, 0, 1, 32),
            scrypt_doc(1024, 8, 0, 32),
            json!({"crypto": {"kdf": "scrypt", "kdfparams": {}}}),
        ] {
            assert!(matches!(
                derive_key(&doc, b"pw", &mut progress),
                Err(KeystoreError::UnsupportedKdfParams)
            ));
        }
    }

    #[test]
    fn scrypt_rejects_non_power_of_two_n() {
        let mut progress = |_: f32| {};
        assert!(matches!(
            derive_key(&scrypt_doc(1000, 8, 1, 32), b"pw", &mut progress),
            Err(KeystoreError::UnsupportedKdfNValue)
        ));
    }

    #[test]
    fn scrypt_rejects_foreign_dklen() {
        let mut progress = |_: f32| {};
        assert!(matches!(
            derive_key(&scrypt_doc(1024, 8, 1, 64), b"pw", &mut progress),
            Err(KeystoreError::UnsupportedDkLen(64))
        ));
    }

    #[test]
    fn pbkdf2_requires_known_prf() {
        let mut progress = |_: f32| {};
        let doc = json!({
            "crypto": {
                "kdf": "pbkdf2",
                "kdfparams": { "prf": "hmac-md5", "c": 2, "dklen": 32, "salt": "00" }
            }
        });
        assert!(matches!(
            derive_key(&doc, b"pw", &mut progress),
            Err(KeystoreError::UnsupportedPrf(_))
        ));
    }

    #[test]
    fn unknown_kdf_is_rejected() {
        let mut progress = |_: f32| {};
        let doc = json!({"crypto": {"kdf": "bcrypt"}});
        assert!(matches!(
            derive_key(&doc, b"pw", &mut progress),
            Err(KeystoreError::UnsupportedKdf)
        ));
        let doc = json!({"crypto": {}});
        assert!(matches!(
            derive_key(&doc, b"pw", &mut progress),
            Err(KeystoreError::UnsupportedKdf)
        ));
    }

    #[test]
    fn derives_sixty_four_bytes_and_reports_progress() {
        let mut seen = Vec::new();
        let doc = scrypt_doc(2, 8, 1, 32);
        let key = derive_key(&doc, b"pw", &mut |f| seen.push(f)).unwrap();
        assert_eq!(key.len(), DERIVED_KEY_LENGTH);
        assert_eq!(seen.first(), Some(&0.0));
        assert_eq!(seen.last(), Some(&1.0));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn pbkdf2_sha256_and_sha512_differ() {
        let mut progress = |_: f32| {};
        let base = |prf: &str| {
            json!({
                "crypto": {
                    "kdf": "pbkdf2",
                    "kdfparams": { "prf": prf, "c": 2, "dklen": 32, "salt": "ab".repeat(32) }
                }
            })
        };
        let k256 = derive_key(&base("hmac-sha256"), b"pw", &mut progress).unwrap();
        let k512 = derive_key(&base("hmac-sha512"), b"pw", &mut progress).unwrap();
        assert_ne!(*k256, *k512);
    }
}
