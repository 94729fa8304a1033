use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::error::{ApiError, Result};
use crate::core::credentials::CredentialProvider;

/// Thin wrapper over `reqwest` that attaches the bearer token and turns
/// every non-2xx response into an [`ApiError`]. No retries, no backoff.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
    credentials: Arc<dyn CredentialProvider>,
    timeout: Option<Duration>,
}

impl ApiClient {
    pub fn new(base_url: &str, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
            credentials,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let token = self
            .credentials
            .get_token()
            .await?
            .ok_or_else(ApiError::missing_token)?;

        let mut req = self
            .client
            .request(method, self.url(path))
            .bearer_auth(token);
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        Ok(req)
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response> {
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let detail = error_detail(&body);
        warn!(status = status.as_u16(), detail = ?detail, "API request failed");
        Err(ApiError::from_status(status, detail))
    }

    async fn decode<T: DeserializeOwned>(path: &str, resp: Response) -> Result<T> {
        let bytes = resp.bytes().await?;
        let value = if bytes.iter().all(u8::is_ascii_whitespace) {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|e| {
                ApiError::Decode(format!("{} returned invalid JSON: {}", path, e))
            })?
        };
        serde_json::from_value(value)
            .map_err(|e| ApiError::Decode(format!("{} returned an unexpected shape: {}", path, e)))
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let req = self.request(Method::GET, path).await?;
        let resp = self.send(req).await?;
        Self::decode(path, resp).await
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn get_text(&self, path: &str) -> Result<String> {
        let req = self.request(Method::GET, path).await?;
        Ok(self.send(req).await?.text().await?)
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::POST, path, body).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PUT, path, body).await
    }

    pub async fn patch_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PATCH, path, body).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(%method, path, "API request");
        let req = self.request(method, path).await?.json(body);
        let resp = self.send(req).await?;
        Self::decode(path, resp).await
    }

    /// Fire-and-forget delete; any response body is ignored.
    #[instrument(skip(self), level = "debug")]
    pub async fn delete(&self, path: &str) -> Result<()> {
        let req = self.request(Method::DELETE, path).await?;
        self.send(req).await?;
        Ok(())
    }

    pub async fn post_multipart<T: DeserializeOwned>(&self, path: &str, form: Form) -> Result<T> {
        debug!(path, "API multipart upload");
        let req = self.request(Method::POST, path).await?.multipart(form);
        let resp = self.send(req).await?;
        Self::decode(path, resp).await
    }
}

/// Pulls a human-readable reason out of an error body, if the server sent one.
fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error", "detail"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::credentials::StaticToken;

    #[test]
    fn url_joins_without_double_slashes() {
        let client = ApiClient::new("https://api.example.com/v1/", Arc::new(StaticToken::none()));
        assert_eq!(client.base_url(), "https://api.example.com/v1");
        assert_eq!(
            client.url("/admin/knowledge-bases"),
            "https://api.example.com/v1/admin/knowledge-bases"
        );
        assert_eq!(client.url("billing"), "https://api.example.com/v1/billing");
    }

    #[test]
    fn error_detail_reads_common_fields() {
        assert_eq!(
            error_detail(r#"{"message":"bad input"}"#).as_deref(),
            Some("bad input")
        );
        assert_eq!(
            error_detail(r#"{"success":false,"error":"nope"}"#).as_deref(),
            Some("nope")
        );
        assert!(error_detail("<html>502</html>").is_none());
    }

    #[tokio::test]
    async fn missing_token_fails_before_any_request() {
        // Port 9 (discard) is never contacted: the token check comes first.
        let client = ApiClient::new("http://127.0.0.1:9", Arc::new(StaticToken::none()));
        let err = client
            .get_json::<serde_json::Value>("/billing")
            .await
            .unwrap_err();
        assert!(err.is_auth());
        assert!(err.to_string().contains("Authentication failed"));
    }
}
