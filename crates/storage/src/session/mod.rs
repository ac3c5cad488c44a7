//! Refresh-session persistence.
//!
//! A [`StoredToken`] is kept under its session identifier together with two
//! secondary indexes, one by [`SessionIdentity`] and one by user. All three
//! entries of a session are written and removed in the same transaction and
//! share the same TTL.

pub mod keys;
mod record;
mod store;

pub use record::{SessionIdentity, StoredToken};
pub use store::{SessionStore, SessionTxn};
