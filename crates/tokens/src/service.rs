//! The token service: session creation, checking, rotation and revocation.
//!
//! Every mutating operation runs inside exactly one storage transaction.
//! The storage layer serialises writers, so no additional locking happens
//! here. Readers ([`TokenService::check_token`],
//! [`TokenService::get_user_tokens`]) read committed state directly.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use credcore_authn::{
    AccessGrant, ExtensionFields, IssuedToken, TokenClaims, TokenIssuer, TokenKeys, TokenKind,
    decode_grants, encode_grants, hash_user_id,
};
use credcore_storage::{
    Backend, StorageBackend, StorageError,
    session::{SessionStore, StoredToken},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
    config::ServiceConfig,
    error::{Result, TokenError},
    identity::platform_from_user_agent,
};

/// Inputs to [`TokenService::create_token`].
///
/// The three client signals (`user_agent`, `fingerprint`, `ip`) must be
/// passed through unmodified from the transport.
#[derive(Debug, Clone, bon::Builder)]
pub struct CreateTokenRequest {
    /// Raw user-agent string.
    #[builder(into)]
    pub user_agent: String,
    /// Opaque client fingerprint.
    #[builder(into)]
    pub fingerprint: String,
    /// Owning user.
    #[builder(into)]
    pub user_id: String,
    /// Client IP.
    #[builder(into)]
    pub ip: String,
    /// User role.
    #[builder(into)]
    pub role: String,
    /// Namespace grants.
    #[builder(default)]
    pub namespace_access: Vec<AccessGrant>,
    /// Volume grants.
    #[builder(default)]
    pub volume_access: Vec<AccessGrant>,
    /// Whether the session may write.
    #[builder(default)]
    pub rw_access: bool,
    /// Parent session for delegated tokens.
    #[builder(into)]
    pub parent_token_id: Option<String>,
}

/// An access/refresh pair sharing one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    /// Short-lived access token.
    pub access: IssuedToken,
    /// Refresh token backed by the stored session.
    pub refresh: IssuedToken,
}

impl TokenPair {
    /// The session identifier both tokens carry.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.refresh.id
    }
}

/// What a successful [`TokenService::check_token`] vouches for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedToken {
    /// Session identifier.
    pub token_id: String,
    /// Owning user.
    pub user_id: String,
    /// User role.
    pub role: String,
    /// Whether the session may write.
    pub rw_access: bool,
    /// Namespace grants.
    pub namespace_access: Vec<AccessGrant>,
    /// Volume grants.
    pub volume_access: Vec<AccessGrant>,
    /// Parent session of a delegated token.
    pub parent_token_id: Option<String>,
}

/// One entry of [`TokenService::get_user_tokens`]. Never carries token strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Session identifier.
    pub id: String,
    /// User agent the session was created from.
    pub user_agent: String,
    /// Client IP the session was created from.
    pub ip: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
}

impl From<StoredToken> for SessionInfo {
    fn from(record: StoredToken) -> Self {
        Self { id: record.id, user_agent: record.user_agent, ip: record.ip, created_at: record.created_at }
    }
}

/// Issues, checks, rotates and revokes session tokens.
///
/// Share one instance behind an `Arc`.
#[derive(Debug)]
pub struct TokenService<B = Backend> {
    issuer: TokenIssuer,
    store: SessionStore<B>,
    cancel_token: CancellationToken,
    closed: AtomicBool,
}

impl TokenService<Backend> {
    /// Builds the issuer and opens the configured storage backend.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Config`] if the issuer configuration or keys are
    /// rejected, and [`TokenError::Storage`] if the backend cannot be opened.
    pub async fn open(config: ServiceConfig, keys: TokenKeys) -> Result<Self> {
        let issuer = TokenIssuer::new(config.issuer, keys).map_err(TokenError::Config)?;
        let backend = Backend::open(&config.storage).await?;
        info!(backend = ?backend, "token service opened");
        Ok(Self::new(issuer, backend))
    }
}

impl<B: StorageBackend> TokenService<B> {
    /// Creates a service over an already-open backend.
    pub fn new(issuer: TokenIssuer, backend: B) -> Self {
        Self::with_cancel_token(issuer, backend, CancellationToken::new())
    }

    /// Creates a service that stops accepting work once `cancel_token` fires.
    ///
    /// Pass a child of an application-wide shutdown token to tie the service
    /// to it.
    pub fn with_cancel_token(issuer: TokenIssuer, backend: B, cancel_token: CancellationToken) -> Self {
        Self { issuer, store: SessionStore::new(backend), cancel_token, closed: AtomicBool::new(false) }
    }

    /// The token issuer.
    #[must_use]
    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// The underlying session store.
    #[must_use]
    pub fn store(&self) -> &SessionStore<B> {
        &self.store
    }

    /// The cancellation token checked before every operation.
    #[must_use]
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel_token
    }

    fn ensure_live(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::closed().into());
        }
        if self.cancel_token.is_cancelled() {
            return Err(TokenError::Cancelled);
        }
        Ok(())
    }

    fn verify_kind(&self, token: &str, expected: TokenKind) -> Result<TokenClaims> {
        let claims = self.issuer.verify(token).map_err(|_| TokenError::InvalidToken)?;
        if claims.kind() != expected {
            return Err(TokenError::InvalidToken);
        }
        Ok(claims)
    }

    /// Starts a session, evicting any session already bound to the same
    /// (platform, fingerprint, IP) identity.
    ///
    /// Safe to retry: a repeated call replaces the session it created.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Signing`] or [`TokenError::Storage`] on failure,
    /// and [`TokenError::Cancelled`] if the service was cancelled.
    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn create_token(&self, request: CreateTokenRequest) -> Result<TokenPair> {
        self.ensure_live()?;

        let ext = ExtensionFields::new(&request.user_id, &request.role, request.parent_token_id.clone());
        let (access, refresh) = self.issuer.issue_tokens(ext)?;

        let record = StoredToken::builder()
            .id(&refresh.id)
            .platform(platform_from_user_agent(&request.user_agent))
            .user_id(request.user_id)
            .user_agent(request.user_agent)
            .fingerprint(request.fingerprint)
            .ip(request.ip)
            .role(request.role)
            .rw_access(request.rw_access)
            .namespace_access(encode_grants(&request.namespace_access))
            .volume_access(encode_grants(&request.volume_access))
            .maybe_parent_token_id(request.parent_token_id)
            .build();

        let mut txn = self.store.begin().await?;
        let evicted = txn.evict_identity(&record.identity()).await?;
        txn.insert(&record, refresh.lifetime)?;
        txn.commit().await?;

        debug!(token_id = %record.id, evicted = evicted.len(), "session created");
        Ok(TokenPair { access, refresh })
    }

    /// Checks an access token against its live session and the presented
    /// client signals. Read-only.
    ///
    /// The session's IP and fingerprint must match. The user agent is not
    /// compared.
    ///
    /// # Errors
    ///
    /// - [`TokenError::InvalidToken`] if the token does not verify, is not an
    ///   access token, or its session is gone
    /// - [`TokenError::NotOwnedBySender`] if the IP or fingerprint differ
    #[instrument(skip(self, access_token, user_agent, fingerprint))]
    pub async fn check_token(
        &self,
        access_token: &str,
        user_agent: &str,
        ip: &str,
        fingerprint: &str,
    ) -> Result<CheckedToken> {
        self.ensure_live()?;

        let claims = self.verify_kind(access_token, TokenKind::Access)?;
        let record = self.store.get(claims.id()).await?.ok_or(TokenError::InvalidToken)?;

        if record.ip != ip || record.fingerprint != fingerprint {
            warn!(token_id = %record.id, "client signals do not match session");
            return Err(TokenError::NotOwnedBySender);
        }
        // Informational only; see decision 1 in DESIGN.md.
        if record.platform != platform_from_user_agent(user_agent) {
            debug!(token_id = %record.id, "user agent platform differs from session");
        }

        Ok(CheckedToken {
            namespace_access: decode_grants(&record.namespace_access),
            volume_access: decode_grants(&record.volume_access),
            token_id: record.id,
            user_id: record.user_id,
            role: record.role,
            rw_access: record.rw_access,
            parent_token_id: record.parent_token_id,
        })
    }

    /// Exchanges a refresh token for a new pair under a new identifier.
    ///
    /// The old session, and any other session sharing its identity, is
    /// removed. User, role, grants and client signals carry forward from the
    /// stored session.
    ///
    /// # Errors
    ///
    /// - [`TokenError::InvalidToken`] if the token does not verify, is not a
    ///   refresh token, or its session is gone
    /// - [`TokenError::NotOwnedBySender`] if the fingerprint differs
    #[instrument(skip(self, refresh_token, fingerprint))]
    pub async fn extend_token(&self, refresh_token: &str, fingerprint: &str) -> Result<TokenPair> {
        self.ensure_live()?;

        let claims = self.verify_kind(refresh_token, TokenKind::Refresh)?;

        let mut txn = self.store.begin().await?;
        let old = txn.get(claims.id()).await?.ok_or(TokenError::InvalidToken)?;

        if claims.ext.as_ref().is_some_and(|ext| ext.user_id_hash != hash_user_id(&old.user_id)) {
            warn!(token_id = %old.id, "refresh token does not belong to stored session user");
            return Err(TokenError::InvalidToken);
        }
        if old.fingerprint != fingerprint {
            warn!(token_id = %old.id, "fingerprint does not match session");
            return Err(TokenError::NotOwnedBySender);
        }

        txn.remove(&old);
        let evicted = txn.evict_identity(&old.identity()).await?;

        let ext = ExtensionFields::new(&old.user_id, &old.role, old.parent_token_id.clone());
        let (access, refresh) = self.issuer.issue_tokens(ext)?;

        let record = StoredToken { id: refresh.id.clone(), created_at: Utc::now(), ..old };
        txn.insert(&record, refresh.lifetime)?;
        txn.commit().await?;

        debug!(
            old_token_id = %claims.id(),
            token_id = %record.id,
            evicted = evicted.len(),
            "session rotated"
        );
        Ok(TokenPair { access, refresh })
    }

    /// Lists the live sessions of `user_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Storage`] on backend failure.
    #[instrument(skip(self))]
    pub async fn get_user_tokens(&self, user_id: &str) -> Result<Vec<SessionInfo>> {
        self.ensure_live()?;
        let records = self.store.list_user(user_id).await?;
        Ok(records.into_iter().map(SessionInfo::from).collect())
    }

    /// Deletes session `token_id` if `requesting_user_id` owns it.
    ///
    /// # Errors
    ///
    /// - [`TokenError::InvalidToken`] if no such session is live
    /// - [`TokenError::NotOwnedBySender`] if another user owns it; nothing is
    ///   deleted
    #[instrument(skip(self))]
    pub async fn delete_token(&self, token_id: &str, requesting_user_id: &str) -> Result<()> {
        self.ensure_live()?;

        let mut txn = self.store.begin().await?;
        let record = txn.get(token_id).await?.ok_or(TokenError::InvalidToken)?;

        if record.user_id != requesting_user_id {
            warn!(owner = %record.user_id, "delete requested by non-owner");
            return Err(TokenError::NotOwnedBySender);
        }

        txn.remove(&record);
        txn.commit().await?;

        debug!("session deleted");
        Ok(())
    }

    /// Deletes every session owned by `user_id` and returns how many there were.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Storage`] on backend failure.
    #[instrument(skip(self))]
    pub async fn delete_user_tokens(&self, user_id: &str) -> Result<usize> {
        self.ensure_live()?;

        let mut txn = self.store.begin().await?;
        let removed = txn.delete_user(user_id).await?;
        txn.commit().await?;

        info!(removed, "revoked all sessions for user");
        Ok(removed)
    }

    /// Checks the storage backend is reachable and open.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Storage`] if the backend is unhealthy or closed.
    pub async fn health_check(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::closed().into());
        }
        Ok(self.store.health_check().await?)
    }

    /// Shuts the service down: cancels its token, then flushes and closes the
    /// backend. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Storage`] if the final flush fails.
    #[instrument(skip(self))]
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.cancel_token.cancel();
        self.store.close().await?;
        info!("token service closed");
        Ok(())
    }
}
