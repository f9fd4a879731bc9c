//! Generative client boundary

use crate::error::{IntelError, Result};
use async_trait::async_trait;

/// A provider response that can be reduced to plain text
///
/// Each provider adapts its own response shape here once, so call sites never
/// inspect provider-specific structures.
pub trait Respondable: Send {
    fn extract_text(&self) -> Result<String>;
}

impl Respondable for String {
    fn extract_text(&self) -> Result<String> {
        Ok(self.clone())
    }
}

/// Remote text generation used by the primary tier of each operation
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// Provider name used in errors and logs
    fn provider(&self) -> &str;

    /// Send `prompt` and return the raw response
    async fn generate_content(&self, prompt: &str) -> Result<Box<dyn Respondable>>;

    /// Send `prompt` and return the response text
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        let response = self.generate_content(prompt).await?;
        let text = response.extract_text()?;
        if text.trim().is_empty() {
            return Err(IntelError::InvalidResponse(format!(
                "{} returned an empty response",
                self.provider()
            )));
        }
        Ok(text)
    }
}
