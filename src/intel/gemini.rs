//! Gemini `generateContent` client

use crate::config::IntelConfig;
use crate::error::{IntelError, Result};
use crate::intel::client::{GenerativeClient, Respondable};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

const PROVIDER: &str = "gemini";

// ============================================================================
// REQUEST / RESPONSE TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    pub fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                role: None,
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: u16,
    pub message: String,
    #[serde(default)]
    pub status: String,
}

impl Respondable for GenerateContentResponse {
    fn extract_text(&self) -> Result<String> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_deref())
        {
            return Err(IntelError::InvalidResponse(format!(
                "prompt blocked: {}",
                reason
            )));
        }

        let candidate = self
            .candidates
            .first()
            .ok_or_else(|| IntelError::InvalidResponse("no candidates returned".to_string()))?;

        let text = candidate
            .content
            .iter()
            .flat_map(|content| content.parts.iter())
            .filter_map(|part| part.text.as_deref())
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            let reason = candidate.finish_reason.as_deref().unwrap_or("unknown");
            return Err(IntelError::InvalidResponse(format!(
                "candidate has no text (finish reason: {})",
                reason
            )));
        }

        Ok(text)
    }
}

// ============================================================================
// CLIENT
// ============================================================================

/// Client for the Gemini REST API
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client for `model` at `base_url`
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(IntelError::NotConfigured("API key is empty".to_string()));
        }

        let client = Client::builder().build().map_err(|e| {
            IntelError::NotConfigured(format!("failed to build HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            api_key,
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from service configuration
    ///
    /// Fails with [`IntelError::NotConfigured`] when no API key is set.
    pub fn from_config(config: &IntelConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| IntelError::NotConfigured("GEMINI_API_KEY is not set".to_string()))?;

        Self::new(api_key, &config.model, &config.base_url)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Endpoint URL for `generateContent`
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    async fn request(&self, body: &GenerateContentRequest) -> Result<GenerateContentResponse> {
        let url = self.endpoint();
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| IntelError::RemoteError {
                provider: PROVIDER.to_string(),
                message: format!("HTTP request failed: {}", e),
            })?;

        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(|e| {
                IntelError::InvalidResponse(format!("failed to parse response: {}", e))
            });
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(status_error(status, &error_text))
    }
}

/// Map a non-success HTTP status and body to an error
fn status_error(status: StatusCode, body: &str) -> IntelError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => IntelError::RateLimited {
            provider: PROVIDER.to_string(),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => IntelError::InvalidApiKey {
            provider: PROVIDER.to_string(),
        },
        _ => {
            let message = serde_json::from_str::<ApiError>(body)
                .map(|api_error| api_error.error.message)
                .unwrap_or_else(|_| format!("{}: {}", status, body));
            IntelError::RemoteError {
                provider: PROVIDER.to_string(),
                message,
            }
        }
    }
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    fn provider(&self) -> &str {
        PROVIDER
    }

    async fn generate_content(&self, prompt: &str) -> Result<Box<dyn Respondable>> {
        let response = self
            .request(&GenerateContentRequest::from_prompt(prompt))
            .await?;
        Ok(Box::new(response))
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(GenerateContentRequest::from_prompt("hi")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"contents": [{"parts": [{"text": "hi"}]}]})
        );
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response = parse(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Water "},{"text":"flows."}]},"finishReason":"STOP"}]}"#,
        );
        assert_eq!(response.extract_text().unwrap(), "Water flows.");
    }

    #[test]
    fn test_extract_text_rejects_blocked_and_empty() {
        let blocked = parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#);
        assert!(matches!(blocked.extract_text(), Err(IntelError::InvalidResponse(m)) if m.contains("SAFETY")));

        let empty = parse(r#"{"candidates":[]}"#);
        assert!(matches!(empty.extract_text(), Err(IntelError::InvalidResponse(_))));

        let no_text = parse(r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#);
        assert!(matches!(no_text.extract_text(), Err(IntelError::InvalidResponse(m)) if m.contains("MAX_TOKENS")));
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, ""),
            IntelError::RateLimited { .. }
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, ""),
            IntelError::InvalidApiKey { .. }
        ));

        let body = r#"{"error":{"code":400,"message":"model not found","status":"NOT_FOUND"}}"#;
        assert!(matches!(
            status_error(StatusCode::BAD_REQUEST, body),
            IntelError::RemoteError { message, .. } if message == "model not found"
        ));
    }

    #[test]
    fn test_client_requires_key() {
        let config = IntelConfig::default();
        assert!(matches!(
            GeminiClient::from_config(&config),
            Err(IntelError::NotConfigured(_))
        ));

        let client = GeminiClient::new("secret", "gemini-1.5-flash", "https://example.test/v1beta/").unwrap();
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert!(!format!("{:?}", client).contains("secret"));
    }
}
