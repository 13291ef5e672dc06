// Session: turns a credential cache plus an authorization flow into a usable
// access token. Platform-agnostic; the HTTP and file details live in infra.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::auth_models::{AuthenticationError, Credential};

/// Durable storage for the user's credential between runs.
#[async_trait]
pub trait CredentialCache: Send + Sync {
    /// Returns `Ok(None)` when nothing has been cached yet.
    async fn load(&self) -> Result<Option<Credential>, AuthenticationError>;
    async fn save(&self, credential: &Credential) -> Result<(), AuthenticationError>;
}

/// The OAuth operations that talk to the outside world.
#[async_trait]
pub trait AuthorizationFlow: Send + Sync {
    /// Run the interactive consent flow from scratch.
    async fn authorize(&self, scope: &str) -> Result<Credential, AuthenticationError>;

    /// Exchange the credential's refresh token for a new access token.
    async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthenticationError>;
}

/// Anything that can hand out a bearer token for the documents API.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, AuthenticationError>;
}

/// Authenticated session backed by a credential cache and an OAuth flow.
pub struct Session<C: CredentialCache, F: AuthorizationFlow> {
    cache: C,
    flow: F,
    scope: String,
    current: RwLock<Option<Credential>>,
}

impl<C, F> Session<C, F>
where
    C: CredentialCache,
    F: AuthorizationFlow,
{
    pub fn new(cache: C, flow: F, scope: impl Into<String>) -> Self {
        Self {
            cache,
            flow,
            scope: scope.into(),
            current: RwLock::new(None),
        }
    }

    /// Produce a valid credential, persisting it whenever it had to be renewed.
    ///
    /// Order of preference: cached and still valid, silently refreshed,
    /// freshly authorized through the interactive flow.
    pub async fn acquire(&self) -> Result<Credential, AuthenticationError> {
        let now = Utc::now();

        let cached = match self.cache.load().await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!("Ignoring unreadable credential cache: {}", e);
                None
            }
        };

        let credential = match cached {
            Some(cached) if cached.is_valid(&self.scope, now) => {
                tracing::debug!("Using cached credential");
                return Ok(cached);
            }
            Some(cached)
                if cached.has_scope(&self.scope) && cached.is_expired(now) && cached.can_refresh() =>
            {
                match self.flow.refresh(&cached).await {
                    Ok(refreshed) => {
                        tracing::info!("Refreshed expired credential");
                        refreshed
                    }
                    Err(e) => {
                        tracing::warn!("{}; falling back to interactive authorization", e);
                        self.flow.authorize(&self.scope).await?
                    }
                }
            }
            _ => {
                tracing::info!("No usable cached credential, starting authorization flow");
                self.flow.authorize(&self.scope).await?
            }
        };

        self.cache.save(&credential).await?;
        Ok(credential)
    }
}

#[async_trait]
impl<C, F> AccessTokenProvider for Session<C, F>
where
    C: CredentialCache,
    F: AuthorizationFlow,
{
    async fn access_token(&self) -> Result<String, AuthenticationError> {
        {
            let current = self.current.read().await;
            if let Some(credential) = current.as_ref() {
                if credential.is_valid(&self.scope, Utc::now()) {
                    return Ok(credential.token.clone());
                }
            }
        }

        let credential = self.acquire().await?;
        let token = credential.token.clone();
        *self.current.write().await = Some(credential);
        Ok(token)
    }
}
