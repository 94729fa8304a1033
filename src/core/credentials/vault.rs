use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use async_trait::async_trait;
use base64::Engine;
use hmac::Mac;
use sha2::Sha256;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::{CredentialProvider, TOKEN_KEY};
use crate::api::error::{ApiError, Result};
use crate::platform::{NativePlatform, Platform};

type HmacSha256 = hmac::Hmac<Sha256>;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// File-backed secret store; every value is sealed with AES-256-GCM.
pub struct VaultTokenStore {
    path: PathBuf,
    cipher: Aes256Gcm,
}

/// Derive a 256-bit encryption key from machine-specific identifiers.
/// HMAC-SHA256(hostname + username, "bankops-vault-v1"): stable across
/// restarts but tied to the local machine/user.
fn derive_key() -> Result<[u8; 32]> {
    let hostname = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown-host".to_string());
    let username = whoami::username();
    let input = format!("{}{}", hostname, username);

    let mut mac = <HmacSha256 as Mac>::new_from_slice(b"bankops-vault-v1")
        .map_err(|e| ApiError::Credentials(format!("key derivation failed: {}", e)))?;
    mac.update(input.as_bytes());
    let bytes = mac.finalize().into_bytes();

    let mut key = [0u8; 32];
    key.copy_from_slice(&bytes);
    Ok(key)
}

impl VaultTokenStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let key = derive_key()?;
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| ApiError::Credentials(format!("invalid vault key: {}", e)))?;
        Ok(Self {
            path: path.into(),
            cipher,
        })
    }

    /// The default vault at `<data_dir>/credentials.json`.
    pub fn open_default() -> Result<Self> {
        Self::open(NativePlatform::data_dir().join("credentials.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encrypt a plaintext value. Returns base64(nonce || ciphertext).
    fn encrypt(&self, plaintext: &str) -> Result<String> {
        let nonce_bytes: [u8; NONCE_LEN] = rand::random();
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| ApiError::Credentials(format!("encryption failed: {}", e)))?;

        let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);

        Ok(base64::engine::general_purpose::STANDARD.encode(&combined))
    }

    /// The raw nonce || ciphertext of a sealed value, or `None` when the value
    /// was never sealed: not base64, or too short for a nonce and tag.
    fn sealed_bytes(stored: &str) -> Option<Vec<u8>> {
        let combined = base64::engine::general_purpose::STANDARD
            .decode(stored)
            .ok()?;
        (combined.len() >= NONCE_LEN + TAG_LEN).then_some(combined)
    }

    /// Decrypt nonce || ciphertext. Returns plaintext.
    fn decrypt(&self, combined: &[u8]) -> Result<String> {
        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| ApiError::Credentials(format!("decryption failed: {}", e)))?;

        String::from_utf8(plaintext)
            .map_err(|e| ApiError::Credentials(format!("UTF-8 decode failed: {}", e)))
    }

    async fn load(&self) -> Result<BTreeMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                ApiError::Credentials(format!("{} is corrupt: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
            NativePlatform::restrict_dir_permissions(parent);
        }
        let body = serde_json::to_string_pretty(entries)?;
        let mut file = NativePlatform::private_file_options()
            .open(&self.path)
            .await?;
        file.write_all(body.as_bytes()).await?;
        file.flush().await?;
        // Files created before the vault opened them owner-only.
        NativePlatform::restrict_file_permissions(&self.path);
        Ok(())
    }

    pub async fn set_secret(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), self.encrypt(value)?);
        self.persist(&entries).await?;
        debug!(key, "vault secret stored");
        Ok(())
    }

    pub async fn get_secret(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.load().await?;
        let Some(stored) = entries.get(key).cloned() else {
            return Ok(None);
        };

        let Some(sealed) = Self::sealed_bytes(&stored) else {
            // Hand-edited plaintext value - migrate to encrypted
            warn!(
                "Vault key '{}' appears to be a plaintext value, migrating to encrypted",
                key
            );
            entries.insert(key.to_string(), self.encrypt(&stored)?);
            self.persist(&entries).await?;
            return Ok(Some(stored));
        };

        // A sealed value that will not open stays as it is on disk.
        self.decrypt(&sealed).map(Some).map_err(|e| {
            debug!(key, error = %e, "vault secret did not open");
            ApiError::Credentials(format!(
                "cannot read '{}'; it was sealed on another machine or account. \
                 Run `bankops login` again",
                key
            ))
        })
    }

    pub async fn remove_secret(&self, key: &str) -> Result<bool> {
        let mut entries = self.load().await?;
        let removed = entries.remove(key).is_some();
        if removed {
            self.persist(&entries).await?;
        }
        Ok(removed)
    }

    pub async fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.load().await?.into_keys().collect())
    }
}

#[async_trait]
impl CredentialProvider for VaultTokenStore {
    async fn get_token(&self) -> Result<Option<String>> {
        Ok(self
            .get_secret(TOKEN_KEY)
            .await?
            .filter(|t| !t.trim().is_empty()))
    }
}
