//! Image generation client.
//!
//! POSTs to `{base_url}/generate` with bearer auth. The upstream either
//! answers JSON `{"url": ...}` pointing at hosted output, or streams the
//! image bytes directly; both shapes come back as [`ImageResult`].

use std::time::Duration;

use serde_json::{json, Value};

use crate::ProviderError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Generated image, by reference or by value.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageResult {
    /// Hosted output URL.
    Url(String),
    /// Raw image bytes.
    Bytes(Vec<u8>),
}

/// Image generation API client.
pub struct ImageClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ImageClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Build from `IMAGE_API_URL` and `IMAGE_API_KEY`.
    pub fn from_env() -> Result<Self, ProviderError> {
        let base_url = match std::env::var("IMAGE_API_URL") {
            Ok(url) if !url.is_empty() => url,
            _ => return Err(ProviderError::NotConfigured("IMAGE_API_URL")),
        };
        let api_key = match std::env::var("IMAGE_API_KEY") {
            Ok(key) if !key.is_empty() => key,
            _ => return Err(ProviderError::NotConfigured("IMAGE_API_KEY")),
        };
        Ok(Self::new(base_url, api_key))
    }

    /// Generate an image for a prompt at the requested pixel size.
    pub async fn generate_image(
        &self,
        prompt: &str,
        width: u32,
        height: u32,
    ) -> Result<ImageResult, ProviderError> {
        let url = format!("{}/generate", self.base_url);
        log::debug!("image request {width}x{height}, prompt {} chars", prompt.len());

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&image_request(prompt, width, height))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ProviderError::Upstream {
                status: status.as_u16(),
                detail,
            });
        }

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"));

        if is_json {
            let body: Value = response
                .json()
                .await
                .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
            extract_url(&body)
        } else {
            let bytes = response
                .bytes()
                .await
                .map_err(|e| ProviderError::Transport(e.to_string()))?;
            Ok(ImageResult::Bytes(bytes.to_vec()))
        }
    }
}

/// The `/generate` request body.
fn image_request(prompt: &str, width: u32, height: u32) -> Value {
    json!({
        "prompt": prompt,
        "width": width,
        "height": height
    })
}

/// Pull the hosted URL out of a JSON response.
fn extract_url(body: &Value) -> Result<ImageResult, ProviderError> {
    body["url"]
        .as_str()
        .map(|url| ImageResult::Url(url.to_string()))
        .ok_or_else(|| ProviderError::MalformedResponse("missing url".to_string()))
}
