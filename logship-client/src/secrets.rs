//! Secret decryption via AWS KMS
//!
//! Encrypted settings are base64 encoded KMS ciphertext blobs. Outside the
//! managed Lambda environment secrets are taken as plaintext; see
//! [`running_in_managed_environment`].

use aws_config::BehaviorVersion;
use aws_sdk_kms::error::DisplayErrorContext;
use aws_sdk_kms::primitives::Blob;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use crate::error::{ClientError, Result};

/// Set by the Lambda runtime for every function invocation
pub const MANAGED_ENVIRONMENT_VAR: &str = "AWS_LAMBDA_FUNCTION_NAME";

/// Whether the process runs inside the managed execution environment
pub fn running_in_managed_environment() -> bool {
    std::env::var_os(MANAGED_ENVIRONMENT_VAR).is_some()
}

/// Decode a base64 ciphertext blob
pub fn decode_ciphertext(encoded: &str) -> Result<Vec<u8>> {
    let bytes = STANDARD.decode(encoded.trim())?;
    if bytes.is_empty() {
        return Err(ClientError::InvalidRequest("ciphertext is empty".to_string()));
    }
    Ok(bytes)
}

/// KMS client wrapper that turns ciphertext into plaintext strings
#[derive(Debug, Clone)]
pub struct KmsDecryptor {
    client: aws_sdk_kms::Client,
}

impl KmsDecryptor {
    /// Build a decryptor from the standard AWS config chain
    pub async fn from_env() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self {
            client: aws_sdk_kms::Client::new(&config),
        }
    }

    /// Decrypt a base64 encoded ciphertext into a UTF-8 string
    pub async fn decrypt(&self, encoded: &str) -> Result<String> {
        let ciphertext = decode_ciphertext(encoded)?;

        let output = self
            .client
            .decrypt()
            .ciphertext_blob(Blob::new(ciphertext))
            .send()
            .await
            .map_err(|e| ClientError::Decrypt(DisplayErrorContext(&e).to_string()))?;

        let plaintext = output
            .plaintext()
            .ok_or_else(|| ClientError::Decrypt("response carried no plaintext".to_string()))?;

        debug!("Decrypted secret ({} bytes)", plaintext.as_ref().len());

        String::from_utf8(plaintext.as_ref().to_vec())
            .map_err(|e| ClientError::Decrypt(format!("plaintext is not UTF-8: {}", e)))
    }
}
