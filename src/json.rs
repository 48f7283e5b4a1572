//! Case-insensitive JSON path resolution.
//!
//! The on-disk casing of keystore keys varies by producer (`Crypto` vs
//! `crypto`, `cipherparams` vs `Cipherparams`), so every document read goes
//! through [`search`] instead of direct indexing. Two sibling keys that
//! differ only in case make the lookup ambiguous and fail the whole
//! operation rather than silently picking one.

use serde_json::Value;

use crate::keystore::errors::KeystoreError;

/// Resolve a `"a/b/c"` path against a JSON value, matching keys
/// case-insensitively at every level.
///
/// Returns `Ok(None)` when a segment is missing or a non-object is reached
/// early. A present-but-null value resolves to `Some(&Value::Null)`, which
/// is distinct from not found.
pub(crate) fn search<'a>(mut value: &'a Value, path: &str) -> Result<Option<&'a Value>, KeystoreError> {
    for segment in path.split('/') {
        let Some(object) = value.as_object() else {
            return Ok(None);
        };

        let mut matched = None;
        for (key, child) in object {
            if key.eq_ignore_ascii_case(segment) {
                if matched.is_some() {
                    return Err(KeystoreError::AmbiguousKey(segment.to_string()));
                }
                matched = Some(child);
            }
        }

        match matched {
            Some(child) => value = child,
            None => return Ok(None),
        }
    }
    Ok(Some(value))
}

/// Resolve a path to a string value, if present.
pub(crate) fn search_str<'a>(value: &'a Value, path: &str) -> Result<Option<&'a str>, KeystoreError> {
    Ok(search(value, path)?.and_then(Value::as_str))
}

/// Resolve a path to an unsigned integer, if present.
pub(crate) fn search_u64(value: &Value, path: &str) -> Result<Option<u64>, KeystoreError> {
    Ok(search(value, path)?.and_then(Value::as_u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_is_case_insensitive_per_level() {
        let doc = json!({"Crypto": {"cipherParams": {"IV": "6087dab2"}}});
        let found = search(&doc, "crypto/cipherparams/iv").unwrap().unwrap();
        assert_eq!(found.as_str(), Some("6087dab2"));
    }

    #[test]
    fn search_distinguishes_missing_from_null() {
        let doc = json!({"a": {"b": null}});
        assert_eq!(search(&doc, "a/b").unwrap(), Some(&Value::Null));
        assert_eq!(search(&doc, "a/c").unwrap(), None);
        assert_eq!(search(&doc, "a/b/c").unwrap(), None);
    }

    #[test]
    fn search_fails_on_case_ambiguous_siblings() {
        let doc = json!({"Crypto": {"kdf": "scrypt"}, "crypto": {"kdf": "pbkdf2"}});
        assert!(matches!(
            search(&doc, "crypto/kdf"),
            Err(KeystoreError::AmbiguousKey(_))
        ));
    }

    #[test]
    fn search_stops_at_scalars() {
        let doc = json!({"a": "leaf"});
        assert_eq!(search(&doc, "a/b").unwrap(), None);
        assert_eq!(search_str(&doc, "a").unwrap(), Some("leaf"));
        assert_eq!(search_u64(&json!({"n": 1024}), "n").unwrap(), Some(1024));
    }
}
