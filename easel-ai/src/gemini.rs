//! Gemini text generation client.
//!
//! Talks to the `generateContent` endpoint with the API key as a query
//! parameter. Request and response handling are split into pure functions
//! so the JSON contract is testable without a network.

use std::time::Duration;

use serde_json::{json, Value};

use crate::ProviderError;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Gemini API client.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    /// Client against the public endpoint with the default model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(api_key, DEFAULT_BASE_URL, DEFAULT_MODEL)
    }

    /// Client against a custom endpoint/model (stubs, regional proxies).
    pub fn with_endpoint(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    /// Build from `GEMINI_API_KEY`.
    pub fn from_env() -> Result<Self, ProviderError> {
        match std::env::var("GEMINI_API_KEY") {
            Ok(key) if !key.is_empty() => Ok(Self::new(key)),
            _ => Err(ProviderError::NotConfigured("GEMINI_API_KEY")),
        }
    }

    /// Generate text for a prompt.
    pub async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        log::debug!("gemini request, prompt {} chars", prompt.len());

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&generation_request(prompt))
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

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
        extract_text(&body)
    }

    /// Rewrite a user's image description into a generation-ready prompt.
    pub async fn optimize_image_prompt(
        &self,
        prompt: &str,
        style: &str,
    ) -> Result<String, ProviderError> {
        let instruction = format!(
            "Rewrite the following image description as a single detailed prompt \
             for an AI image generator. Keep the subject, add composition and \
             lighting detail, and render it in a {style} style. Return only the \
             rewritten prompt.\n\nDescription: {prompt}"
        );
        let text = self.generate(&instruction).await?;
        Ok(text.trim().to_string())
    }
}

/// The `generateContent` request body.
fn generation_request(prompt: &str) -> Value {
    json!({
        "contents": [{"parts": [{"text": prompt}]}],
        "generationConfig": {
            "temperature": 0.7,
            "maxOutputTokens": 8192
        }
    })
}

/// Pull the generated text out of a `generateContent` response.
fn extract_text(body: &Value) -> Result<String, ProviderError> {
    body["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| {
            ProviderError::MalformedResponse(
                "missing candidates[0].content.parts[0].text".to_string(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_request_shape() {
        let body = generation_request("a red square");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "a red square");
        assert_eq!(body["generationConfig"]["temperature"], 0.7);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
    }

    #[test]
    fn test_extract_text_success() {
        let body = json!({
            "candidates": [{
                "content": {"parts": [{"text": "generated copy"}]}
            }]
        });
        assert_eq!(extract_text(&body).unwrap(), "generated copy");
    }

    #[test]
    fn test_extract_text_missing_candidates() {
        let body = json!({"candidates": []});
        assert!(matches!(
            extract_text(&body),
            Err(ProviderError::MalformedResponse(_))
        ));

        let body = json!({"error": {"message": "quota"}});
        assert!(extract_text(&body).is_err());
    }

    #[test]
    fn test_extract_text_wrong_type() {
        let body = json!({
            "candidates": [{"content": {"parts": [{"text": 42}]}}]
        });
        assert!(extract_text(&body).is_err());
    }

    #[test]
    fn test_upstream_error_display() {
        let err = ProviderError::Upstream {
            status: 429,
            detail: "rate limited".into(),
        };
        let text = err.to_string();
        assert!(text.contains("429"));
        assert!(text.contains("rate limited"));
    }
}
