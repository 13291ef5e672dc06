// Authentication domain models.
//
// These types describe OAuth token material without knowing where it came
// from (cache file, token endpoint, service account). The infra layer fills
// them in; the session logic only reads them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scope needed to create and edit documents.
pub const DOCUMENTS_SCOPE: &str = "https://www.googleapis.com/auth/documents";

/// Credentials are treated as expired this long before their stated expiry.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Errors raised while acquiring or refreshing credentials.
#[derive(Debug, Error)]
pub enum AuthenticationError {
    #[error("Credential cache error: {0}")]
    Cache(String),
    #[error("Invalid client configuration: {0}")]
    ClientConfig(String),
    #[error("Authorization flow failed: {0}")]
    Flow(String),
    #[error("Token refresh failed: {0}")]
    Refresh(String),
    #[error("Service account error: {0}")]
    ServiceAccount(String),
}

/// OAuth credential for an authorized user.
///
/// The serialized layout matches the `token.json` files written by Google's
/// installed-app tooling, so an existing cache can be reused as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// Bearer access token.
    pub token: String,

    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Token endpoint used for refreshes.
    pub token_uri: String,

    pub client_id: String,

    pub client_secret: String,

    #[serde(default)]
    pub scopes: Vec<String>,

    /// When the access token stops being accepted. `None` means unknown.
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

impl Credential {
    /// True once the access token is (or is about to be) rejected.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => expiry - Duration::seconds(EXPIRY_SKEW_SECS) <= now,
            None => false,
        }
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|token| !token.is_empty())
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    /// Usable right now for the given scope.
    pub fn is_valid(&self, scope: &str, now: DateTime<Utc>) -> bool {
        !self.token.is_empty() && self.has_scope(scope) && !self.is_expired(now)
    }
}
