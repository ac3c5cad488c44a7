//! Opaque access-grant blobs.
//!
//! Grant lists travel as standard base64 of their JSON array. Decoding is
//! lenient: a blob that cannot be decoded yields an empty list.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

/// Access to one namespace or volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    /// Identifier of the granted resource.
    pub id: String,
    /// Human-readable label.
    pub label: String,
    /// Access level, e.g. `"read"` or `"write"`.
    pub access: String,
}

impl AccessGrant {
    /// Creates a grant.
    pub fn new(id: impl Into<String>, label: impl Into<String>, access: impl Into<String>) -> Self {
        Self { id: id.into(), label: label.into(), access: access.into() }
    }
}

/// Encodes `grants` as base64(JSON).
#[must_use]
pub fn encode_grants(grants: &[AccessGrant]) -> String {
    match serde_json::to_vec(grants) {
        Ok(json) => STANDARD.encode(json),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode access grants, storing empty list");
            STANDARD.encode(b"[]")
        },
    }
}

/// Decodes a base64(JSON) grant blob.
///
/// Returns an empty list when the blob is empty or cannot be decoded.
#[must_use]
pub fn decode_grants(blob: &str) -> Vec<AccessGrant> {
    if blob.is_empty() {
        return Vec::new();
    }

    let bytes = match STANDARD.decode(blob) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Access grant blob is not valid base64");
            return Vec::new();
        },
    };

    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Access grant blob is not a grant list");
        Vec::new()
    })
}
