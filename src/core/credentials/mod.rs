//! Bearer-token sources for the API client.
//!
//! The console looks for its token in the "session" store first (the
//! `VPBANK_ID_TOKEN` environment variable, alive only for the current shell)
//! and then in the "local" store (the encrypted vault file under the data
//! directory). Both are [`CredentialProvider`]s so callers can inject their
//! own storage.

mod vault;

use async_trait::async_trait;
use std::sync::Arc;

use crate::api::error::Result;

pub use vault::VaultTokenStore;

/// Storage key of the identity token, shared by every store.
pub const TOKEN_KEY: &str = "vpbank_id_token";

/// Environment variable acting as the session token store.
pub const SESSION_TOKEN_ENV: &str = "VPBANK_ID_TOKEN";

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Current bearer token, `None` when the user is not logged in.
    async fn get_token(&self) -> Result<Option<String>>;
}

/// Fixed token, mostly for scripts and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

#[async_trait]
impl CredentialProvider for StaticToken {
    async fn get_token(&self) -> Result<Option<String>> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn session() -> Self {
        Self::new(SESSION_TOKEN_ENV)
    }

    pub fn new(var: &str) -> Self {
        Self {
            var: var.to_string(),
        }
    }
}

#[async_trait]
impl CredentialProvider for EnvToken {
    async fn get_token(&self) -> Result<Option<String>> {
        Ok(std::env::var(&self.var)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()))
    }
}

/// First provider that yields a token wins.
#[derive(Clone, Default)]
pub struct ChainedCredentials {
    providers: Vec<Arc<dyn CredentialProvider>>,
}

impl ChainedCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.providers.push(provider);
        self
    }
}

#[async_trait]
impl CredentialProvider for ChainedCredentials {
    async fn get_token(&self) -> Result<Option<String>> {
        for provider in &self.providers {
            if let Some(token) = provider.get_token().await? {
                return Ok(Some(token));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn chain_prefers_first_available_token() {
        let chain = ChainedCredentials::new()
            .with(Arc::new(StaticToken::none()))
            .with(Arc::new(StaticToken::new("local-token")))
            .with(Arc::new(StaticToken::new("ignored")));
        assert_eq!(
            chain.get_token().await.unwrap().as_deref(),
            Some("local-token")
        );
    }

    #[tokio::test]
    async fn empty_chain_has_no_token() {
        let chain = ChainedCredentials::new();
        assert!(chain.get_token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unset_env_var_yields_none() {
        let provider = EnvToken::new("BANKOPS_TEST_TOKEN_THAT_IS_NEVER_SET");
        assert!(provider.get_token().await.unwrap().is_none());
    }
}
