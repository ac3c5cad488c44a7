//! Common types used across storage operations.

use std::ops::Bound;

use bytes::Bytes;

/// Key-value pair returned from range and prefix queries.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use credcore_storage::KeyValue;
///
/// let kv = KeyValue::new(Bytes::from("session/abc"), Bytes::from("{}"));
/// assert_eq!(kv.key, Bytes::from("session/abc"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    /// The key identifying this entry.
    pub key: Bytes,

    /// The value stored at this key.
    pub value: Bytes,
}

impl KeyValue {
    /// Creates a new key-value pair.
    pub fn new(key: Bytes, value: Bytes) -> Self {
        Self { key, value }
    }
}

/// Returns the key range covering every key that starts with `prefix`.
///
/// The upper bound is the shortest key greater than all keys with the
/// prefix: trailing `0xFF` bytes are dropped and the last remaining byte is
/// incremented. A prefix made only of `0xFF` bytes (or an empty prefix) has
/// no finite successor, so the range is unbounded above.
///
/// # Examples
///
/// ```
/// use std::ops::Bound;
/// use credcore_storage::prefix_range;
///
/// let (start, end) = prefix_range(b"session/");
/// assert_eq!(start, Bound::Included(b"session/".to_vec()));
/// assert_eq!(end, Bound::Excluded(b"session0".to_vec()));
/// ```
#[must_use]
pub fn prefix_range(prefix: &[u8]) -> (Bound<Vec<u8>>, Bound<Vec<u8>>) {
    let start = Bound::Included(prefix.to_vec());

    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return (start, Bound::Excluded(end));
        }
    }

    (start, Bound::Unbounded)
}
