//! Secret repository
//!
//! Turns configured secret values into plaintext before they are used.

use async_trait::async_trait;
use logship_client::{KmsDecryptor, Result};

/// Repository trait for resolving secret settings
#[async_trait]
pub trait SecretRepository: Send + Sync {
    /// Returns the plaintext of an encrypted setting
    async fn reveal(&self, value: &str) -> Result<String>;
}

/// Passthrough used outside the managed environment
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaintextSecrets;

#[async_trait]
impl SecretRepository for PlaintextSecrets {
    async fn reveal(&self, value: &str) -> Result<String> {
        Ok(value.to_string())
    }
}

#[async_trait]
impl SecretRepository for KmsDecryptor {
    async fn reveal(&self, value: &str) -> Result<String> {
        self.decrypt(value).await
    }
}
