//! Key layout for session records and their secondary indexes.
//!
//! | Family | Key | Value |
//! |--------|-----|-------|
//! | primary | `session/{h(id)}` | [`StoredToken`](super::StoredToken) JSON |
//! | identity index | `session-by-identity/{h(platform)}.{h(fingerprint)}.{h(ip)}/{h(id)}` | id |
//! | user index | `session-by-user/{h(user_id)}/{h(id)}` | id |
//!
//! `h` is lowercase hex SHA-256. Every component is 64 characters from an
//! alphabet without `.` or `/`, so keys stay well under the default key limit
//! whatever the client sends, and an equality lookup is an exact prefix scan
//! over `…/{tuple}/` that never matches a different component.

use sha2::{Digest, Sha256};

use super::SessionIdentity;

/// Prefix of primary session records.
pub const SESSION_PREFIX: &str = "session/";

/// Prefix of the identity index.
pub const IDENTITY_INDEX_PREFIX: &str = "session-by-identity/";

/// Prefix of the user index.
pub const USER_INDEX_PREFIX: &str = "session-by-user/";

/// Width of one encoded key component.
pub const COMPONENT_LEN: usize = 64;

fn component(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

/// Primary key for session `id`.
#[must_use]
pub fn session_key(id: &str) -> Vec<u8> {
    format!("{SESSION_PREFIX}{}", component(id)).into_bytes()
}

/// Prefix shared by every index entry for `identity`.
#[must_use]
pub fn identity_prefix(identity: &SessionIdentity) -> Vec<u8> {
    format!(
        "{IDENTITY_INDEX_PREFIX}{}.{}.{}/",
        component(&identity.platform),
        component(&identity.fingerprint),
        component(&identity.ip)
    )
    .into_bytes()
}

/// Identity index entry for session `id`.
#[must_use]
pub fn identity_key(identity: &SessionIdentity, id: &str) -> Vec<u8> {
    let mut key = identity_prefix(identity);
    key.extend_from_slice(component(id).as_bytes());
    key
}

/// Prefix shared by every index entry for `user_id`.
#[must_use]
pub fn user_prefix(user_id: &str) -> Vec<u8> {
    format!("{USER_INDEX_PREFIX}{}/", component(user_id)).into_bytes()
}

/// User index entry for session `id`.
#[must_use]
pub fn user_key(user_id: &str, id: &str) -> Vec<u8> {
    let mut key = user_prefix(user_id);
    key.extend_from_slice(component(id).as_bytes());
    key
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::DEFAULT_MAX_KEY_SIZE;

    const ABC: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn test_layout() {
        assert_eq!(session_key("abc"), format!("session/{ABC}").into_bytes());

        let user = String::from_utf8(user_key("u", "abc")).unwrap();
        assert!(user.starts_with("session-by-user/"));
        assert!(user.ends_with(&format!("/{ABC}")));

        let identity = String::from_utf8(identity_key(&SessionIdentity::new("a", "b", "c"), "abc")).unwrap();
        let tuple = identity.strip_prefix(IDENTITY_INDEX_PREFIX).unwrap().split('/').next().unwrap();
        assert_eq!(tuple.split('.').count(), 3);
        assert!(tuple.split('.').all(|c| c.len() == COMPONENT_LEN));
    }

    #[test]
    fn test_separator_characters_cannot_collide() {
        // "a.b" + "c" must not collide with "a" + "b.c".
        let left = SessionIdentity::new("a.b", "c", "ip");
        let right = SessionIdentity::new("a", "b.c", "ip");
        assert_ne!(identity_prefix(&left), identity_prefix(&right));
        assert_ne!(user_prefix("u/1"), user_prefix("u"));
        assert_ne!(session_key("a/b"), session_key("a"));
    }

    #[test]
    fn test_key_width_is_independent_of_input_size() {
        let huge = "x".repeat(16 * 1024);
        let identity = SessionIdentity::new(&huge, &huge, &huge);

        let small = identity_key(&SessionIdentity::new("p", "f", "i"), "id");
        assert_eq!(identity_key(&identity, &huge).len(), small.len());
        assert_eq!(user_key(&huge, &huge).len(), user_key("u", "id").len());
        assert!(identity_key(&identity, &huge).len() < DEFAULT_MAX_KEY_SIZE);
    }

    proptest! {
        #[test]
        fn user_prefixes_never_nest(a in ".{0,12}", b in ".{0,12}") {
            prop_assume!(a != b);
            let pa = user_prefix(&a);
            let pb = user_prefix(&b);
            prop_assert!(!pb.starts_with(&pa));
        }

        #[test]
        fn identity_prefixes_never_nest(
            a in (".{0,6}", ".{0,6}", ".{0,6}"),
            b in (".{0,6}", ".{0,6}", ".{0,6}"),
        ) {
            prop_assume!(a != b);
            let pa = identity_prefix(&SessionIdentity::new(a.0, a.1, a.2));
            let pb = identity_prefix(&SessionIdentity::new(b.0, b.1, b.2));
            prop_assert!(!pb.starts_with(&pa));
        }
    }
}
