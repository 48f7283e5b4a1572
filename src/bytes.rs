//! Byte-level helpers for keystore documents.
//!
//! Keystore producers disagree on hex conventions: some prefix `0x`, some
//! emit odd-length strings, and a few emit raw JSON byte arrays. The loose
//! parser here accepts all of them so the decoder can read documents from
//! any client.

use serde_json::Value;

use crate::keystore::errors::KeystoreError;

/// Parse a hex string that may or may not carry a `0x` prefix.
///
/// An odd-length string (after stripping the prefix) is left-padded with a
/// single `0`. Non-hex characters are rejected.
pub(crate) fn loose_hex_str(s: &str) -> Result<Vec<u8>, KeystoreError> {
    let stripped = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);

    let padded;
    let normalized = if stripped.len() % 2 == 1 {
        padded = format!("0{stripped}");
        &padded
    } else {
        stripped
    };

    hex::decode(normalized).map_err(|_| KeystoreError::InvalidHex(s.to_string()))
}

/// Parse a JSON value holding bytes: either a loose hex string or an
/// already-decoded array of byte values (pass-through).
pub(crate) fn loose_hex(value: &Value) -> Result<Vec<u8>, KeystoreError> {
    match value {
        Value::String(s) => loose_hex_str(s),
        Value::Array(items) => items
            .iter()
            .map(|item| match item.as_u64() {
                Some(b) if b <= u8::MAX as u64 => Ok(b as u8),
                _ => Err(KeystoreError::InvalidHex(value.to_string())),
            })
            .collect(),
        other => Err(KeystoreError::InvalidHex(other.to_string())),
    }
}

/// Decimal representation of `n`, left-padded with `'0'` to `width`.
pub(crate) fn zpad(n: u64, width: usize) -> String {
    format!("{n:0width$}")
}
