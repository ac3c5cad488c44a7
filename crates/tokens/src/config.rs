//! Service configuration.
//!
//! Key material is deliberately absent: [`TokenKeys`](credcore_authn::TokenKeys)
//! are loaded separately and handed to
//! [`TokenService::open`](crate::TokenService::open).
//!
//! ```
//! use credcore_tokens::ServiceConfig;
//!
//! let config: ServiceConfig = serde_json::from_str(r#"{
//!     "issuer": { "algorithm": "EdDSA", "issuer": "credcore", "access_ttl": "2h", "refresh_ttl": "48h" },
//!     "storage": { "type": "file", "path": "/var/lib/credcore/sessions.json" }
//! }"#).unwrap();
//!
//! assert_eq!(config.issuer.issuer(), "credcore");
//! ```

use credcore_authn::IssuerConfig;
use credcore_storage::StorageConfig;
use serde::{Deserialize, Serialize};

/// Everything the token service needs besides its keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bon::Builder)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Signing algorithm, issuer claim and token lifetimes.
    pub issuer: IssuerConfig,

    /// Where sessions are stored (default: in memory).
    #[serde(default)]
    #[builder(default)]
    pub storage: StorageConfig,
}
