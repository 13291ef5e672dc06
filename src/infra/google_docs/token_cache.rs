use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::core::auth::{AuthenticationError, Credential, CredentialCache};

/// Credential cache kept in a single JSON file (`token.json` by default).
/// Overwritten on every refresh or fresh authorization.
pub struct JsonCredentialCache {
    path: PathBuf,
}

impl JsonCredentialCache {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl CredentialCache for JsonCredentialCache {
    async fn load(&self) -> Result<Option<Credential>, AuthenticationError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let text = fs::read_to_string(&self.path)
            .await
            .map_err(|e| AuthenticationError::Cache(e.to_string()))?;

        let credential: Credential =
            serde_json::from_str(&text).map_err(|e| AuthenticationError::Cache(e.to_string()))?;
        Ok(Some(credential))
    }

    async fn save(&self, credential: &Credential) -> Result<(), AuthenticationError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AuthenticationError::Cache(e.to_string()))?;
        }

        let text = serde_json::to_string_pretty(credential)
            .map_err(|e| AuthenticationError::Cache(e.to_string()))?;
        fs::write(&self.path, text)
            .await
            .map_err(|e| AuthenticationError::Cache(e.to_string()))?;

        tracing::debug!("Saved credential to {}", self.path.display());
        Ok(())
    }
}
