use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{info, warn};

use shared::{domain::AuthenticatedUser, protocol::AuthRequest};
use token_store::TokenStore;

use crate::{
    error::{IdentityError, RemoteError, SessionError},
    transport::RemoteService,
};

pub const SESSION_TOKEN_KEY: &str = "session-jwt";

const IDENTITY_STRATEGY: &str = "identity";
const JWT_STRATEGY: &str = "jwt";

/// The single accessor for the process-wide session token. Every remote call
/// reads the token through this object; only login/logout/reauthenticate
/// write it. Writes go to the backing store so the session survives
/// restarts.
#[derive(Clone)]
pub struct SessionTokens {
    store: TokenStore,
    cached: Arc<RwLock<Option<String>>>,
}

impl SessionTokens {
    pub fn new(store: TokenStore) -> Self {
        Self {
            store,
            cached: Arc::new(RwLock::new(None)),
        }
    }

    /// Loads the persisted token into the in-memory cache, returning it.
    pub async fn load(&self) -> Result<Option<String>, SessionError> {
        let token = self
            .store
            .get(SESSION_TOKEN_KEY)
            .await
            .map_err(|err| SessionError::Store(err.to_string()))?;
        *self.cached.write().await = token.clone();
        Ok(token)
    }

    pub async fn current(&self) -> Option<String> {
        self.cached.read().await.clone()
    }

    pub async fn set(&self, token: &str) -> Result<(), SessionError> {
        self.store
            .set(SESSION_TOKEN_KEY, token)
            .await
            .map_err(|err| SessionError::Store(err.to_string()))?;
        *self.cached.write().await = Some(token.to_string());
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), SessionError> {
        self.store
            .remove(SESSION_TOKEN_KEY)
            .await
            .map_err(|err| SessionError::Store(err.to_string()))?;
        *self.cached.write().await = None;
        Ok(())
    }
}

/// External identity provider: exchanges email + password for an identity
/// token that the remote service accepts during authentication.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<String, IdentityError>;
    async fn sign_up(&self, email: &str, password: &str) -> Result<String, IdentityError>;
}

pub struct MissingIdentityProvider;

#[async_trait]
impl IdentityProvider for MissingIdentityProvider {
    async fn sign_in(&self, _email: &str, _password: &str) -> Result<String, IdentityError> {
        Err(IdentityError::Unavailable(
            "identity provider is not configured".to_string(),
        ))
    }

    async fn sign_up(&self, _email: &str, _password: &str) -> Result<String, IdentityError> {
        Err(IdentityError::Unavailable(
            "identity provider is not configured".to_string(),
        ))
    }
}

pub struct SessionManager {
    service: Arc<dyn RemoteService>,
    identity: Arc<dyn IdentityProvider>,
    tokens: SessionTokens,
    user: RwLock<Option<AuthenticatedUser>>,
}

impl SessionManager {
    pub fn new(
        service: Arc<dyn RemoteService>,
        identity: Arc<dyn IdentityProvider>,
        tokens: SessionTokens,
    ) -> Self {
        Self {
            service,
            identity,
            tokens,
            user: RwLock::new(None),
        }
    }

    pub async fn current_user(&self) -> Option<AuthenticatedUser> {
        self.user.read().await.clone()
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, SessionError> {
        let identity_token = self.identity.sign_in(email, password).await?;
        let result = self
            .service
            .authenticate(&AuthRequest {
                strategy: IDENTITY_STRATEGY.to_string(),
                access_token: identity_token,
                user_data: Some(serde_json::json!({ "role": "company" })),
                company_data: None,
            })
            .await?;

        self.tokens.set(&result.access_token).await?;
        *self.user.write().await = Some(result.user.clone());
        info!(user = %result.user.id, "session established");
        Ok(result.user)
    }

    /// Replays the persisted session token. Returns `Ok(None)` when no valid
    /// session exists; the invalid token is cleared in that case.
    pub async fn reauthenticate(&self) -> Result<Option<AuthenticatedUser>, SessionError> {
        let Some(token) = self.tokens.load().await? else {
            return Ok(None);
        };

        let result = self
            .service
            .authenticate(&AuthRequest {
                strategy: JWT_STRATEGY.to_string(),
                access_token: token,
                user_data: None,
                company_data: None,
            })
            .await;

        match result {
            Ok(auth) => {
                self.tokens.set(&auth.access_token).await?;
                *self.user.write().await = Some(auth.user.clone());
                Ok(Some(auth.user))
            }
            Err(RemoteError::Auth(api)) => {
                warn!(reason = %api.message, "stored session rejected, clearing");
                self.invalidate().await?;
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn logout(&self) -> Result<(), SessionError> {
        if let Err(err) = self.service.logout().await {
            warn!(error = %err, "remote logout failed, clearing local session anyway");
        }
        self.invalidate().await
    }

    /// Drops the local session without a remote call. Screens call this when
    /// any remote operation reports an auth failure.
    pub async fn invalidate(&self) -> Result<(), SessionError> {
        self.tokens.clear().await?;
        *self.user.write().await = None;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
