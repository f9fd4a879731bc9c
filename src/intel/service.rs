//! Content intelligence service
//!
//! Each operation is a two-tier fallback chain: the remote generative client
//! first, bounded by the configured timeout, then the local heuristic. Results
//! from either tier are memoized by content fingerprint.

use crate::cache::{CacheKeyBuilder, CacheStats, ComputeOptions, MemoCache, Operation};
use crate::config::IntelConfig;
use crate::error::{IntelError, Result};
use crate::fallback::{self, FallbackResult, Tier};
use crate::intel::client::GenerativeClient;
use crate::intel::gemini::GeminiClient;
use crate::intel::heuristics::{local_questions_fallback, local_summary_fallback_capped, pad_questions};
use crate::intel::prompts;
use crate::lessons::{lesson_tag, Lesson};
use std::sync::Arc;
use tracing::{debug, info, warn};

const REMOTE_TIER: &str = "remote";
const LOCAL_TIER: &str = "local-heuristic";

/// Summaries and study questions with graceful degradation
///
/// A service without a client runs in fallback-only mode: the remote tier
/// fails immediately with [`IntelError::NotConfigured`] and every request is
/// served by the local heuristic.
pub struct ContentIntelligence {
    config: IntelConfig,
    client: Option<Arc<dyn GenerativeClient>>,
    /// Why `client` is missing, reported by the remote tier
    unavailable: String,
    summaries: MemoCache<FallbackResult<String>>,
    questions: MemoCache<FallbackResult<Vec<String>>>,
}

impl ContentIntelligence {
    /// Create a service with an explicit client, or none for fallback-only mode
    pub fn new(config: IntelConfig, client: Option<Arc<dyn GenerativeClient>>) -> Result<Self> {
        Self::assemble(
            config,
            client.ok_or_else(|| IntelError::NotConfigured("no generative client supplied".to_string())),
        )
    }

    /// Create a service that talks to Gemini when an API key is configured
    ///
    /// A missing key or a client that fails to build is not an error: the
    /// service logs a warning and runs fallback-only.
    pub fn from_config(config: IntelConfig) -> Result<Self> {
        let client = GeminiClient::from_config(&config)
            .map(|client| Arc::new(client) as Arc<dyn GenerativeClient>);
        Self::assemble(config, client)
    }

    /// [`ContentIntelligence::from_config`] with [`IntelConfig::from_env`]
    pub fn from_env() -> Result<Self> {
        Self::from_config(IntelConfig::from_env()?)
    }

    /// A service that never calls a remote provider
    pub fn fallback_only(config: IntelConfig) -> Result<Self> {
        Self::new(config, None)
    }

    fn assemble(config: IntelConfig, client: Result<Arc<dyn GenerativeClient>>) -> Result<Self> {
        config.validate()?;

        let (client, unavailable) = match client {
            Ok(client) => {
                info!(
                    "Content intelligence using provider '{}' with {:?} timeout",
                    client.provider(),
                    config.remote_timeout
                );
                (Some(client), String::new())
            }
            Err(e) => {
                warn!("Content intelligence running in fallback-only mode: {}", e);
                (None, e.to_string())
            }
        };

        Ok(Self {
            summaries: MemoCache::new(config.cache.clone())?,
            questions: MemoCache::new(config.cache.clone())?,
            config,
            client,
            unavailable,
        })
    }

    pub fn config(&self) -> &IntelConfig {
        &self.config
    }

    pub fn is_fallback_only(&self) -> bool {
        self.client.is_none()
    }

    // ========================================================================
    // SUMMARIES
    // ========================================================================

    /// Summary of `text`; never fails
    pub async fn summarize(&self, text: &str) -> String {
        self.summary_or_local(text, None).await
    }

    /// Summary of `text` tagged with the tier that produced it
    ///
    /// Blank input yields an empty summary without trying any tier.
    pub async fn summarize_detailed(&self, text: &str) -> Result<FallbackResult<String>> {
        self.summary_with(text, None).await
    }

    /// Summary of a lesson's content, invalidated by [`ContentIntelligence::invalidate_lesson`]
    pub async fn summarize_lesson(&self, lesson: &Lesson) -> String {
        self.summary_or_local(&lesson.content, Some(&lesson.id)).await
    }

    async fn summary_or_local(&self, text: &str, lesson_id: Option<&str>) -> String {
        match self.summary_with(text, lesson_id).await {
            Ok(result) => result.value,
            Err(e) => {
                warn!("Summary chain failed, using local heuristic: {}", e);
                self.local_summary(text)
            }
        }
    }

    async fn summary_with(&self, text: &str, lesson_id: Option<&str>) -> Result<FallbackResult<String>> {
        if text.trim().is_empty() {
            return Ok(FallbackResult::unattempted(String::new()));
        }

        let mut key = CacheKeyBuilder::new(Operation::Summary).content(text);
        let mut options = ComputeOptions::new();
        if let Some(id) = lesson_id {
            key = key.param("lesson", id);
            options = options.with_tag(lesson_tag(id));
        }

        let client = self.client.clone();
        let unavailable = self.unavailable.clone();
        let timeout = self.config.remote_timeout;
        let local = self.local_summary(text);
        let text = text.to_string();

        self.summaries
            .get_or_compute_with(key.build(), options, move || async move {
                let tiers = vec![
                    Tier::remote(REMOTE_TIER, timeout, move || remote_summary(client, unavailable, text)),
                    Tier::local(LOCAL_TIER, move || async move { Ok(local) }),
                ];
                fallback::run(tiers, |summary: &String| !summary.trim().is_empty()).await
            })
            .await
    }

    fn local_summary(&self, text: &str) -> String {
        local_summary_fallback_capped(text, self.config.summary_sentences, self.config.max_summary_chars)
    }

    // ========================================================================
    // QUESTIONS
    // ========================================================================

    /// Exactly `count` study questions about `text`, or none for blank text; never fails
    pub async fn generate_questions(&self, text: &str, count: usize) -> Vec<String> {
        self.questions_or_local(text, count, None).await
    }

    /// Study questions tagged with the tier that produced them
    pub async fn generate_questions_detailed(
        &self,
        text: &str,
        count: usize,
    ) -> Result<FallbackResult<Vec<String>>> {
        self.questions_with(text, count, None).await
    }

    /// Study questions for a lesson; `None` uses the configured question count
    pub async fn questions_for_lesson(&self, lesson: &Lesson, count: Option<usize>) -> Vec<String> {
        let count = count.unwrap_or(self.config.question_count);
        self.questions_or_local(&lesson.content, count, Some(&lesson.id))
            .await
    }

    async fn questions_or_local(&self, text: &str, count: usize, lesson_id: Option<&str>) -> Vec<String> {
        match self.questions_with(text, count, lesson_id).await {
            Ok(result) => result.value,
            Err(e) => {
                warn!("Question chain failed, using local heuristic: {}", e);
                local_questions_fallback(text, count)
            }
        }
    }

    async fn questions_with(
        &self,
        text: &str,
        count: usize,
        lesson_id: Option<&str>,
    ) -> Result<FallbackResult<Vec<String>>> {
        if text.trim().is_empty() || count == 0 {
            return Ok(FallbackResult::unattempted(Vec::new()));
        }

        let mut key = CacheKeyBuilder::new(Operation::Questions)
            .content(text)
            .param("count", count);
        let mut options = ComputeOptions::new();
        if let Some(id) = lesson_id {
            key = key.param("lesson", id);
            options = options.with_tag(lesson_tag(id));
        }

        let client = self.client.clone();
        let unavailable = self.unavailable.clone();
        let timeout = self.config.remote_timeout;
        let text = text.to_string();

        self.questions
            .get_or_compute_with(key.build(), options, move || async move {
                let remote_text = text.clone();
                let local_text = text.clone();
                let tiers = vec![
                    Tier::remote(REMOTE_TIER, timeout, move || {
                        remote_questions(client, unavailable, remote_text, count)
                    }),
                    Tier::local(LOCAL_TIER, move || async move {
                        Ok(local_questions_fallback(&local_text, count))
                    }),
                ];
                let result = fallback::run(tiers, |questions: &Vec<String>| !questions.is_empty()).await?;
                Ok(result.map(|questions| fit_questions(questions, &text, count)))
            })
            .await
    }

    // ========================================================================
    // CACHE
    // ========================================================================

    /// Forget every summary and question set derived from the lesson with `id`
    pub async fn invalidate_lesson(&self, id: &str) -> usize {
        let tag = lesson_tag(id);
        let removed = self.summaries.invalidate_tag(&tag).await.len()
            + self.questions.invalidate_tag(&tag).await.len();
        debug!("Invalidated {} cached results for lesson {}", removed, id);
        removed
    }

    /// Drop every cached result
    pub async fn clear_cache(&self) {
        self.summaries.clear().await;
        self.questions.clear().await;
    }

    /// Combined statistics of the summary and question caches
    pub async fn cache_stats(&self) -> CacheStats {
        let summaries = self.summaries.stats().await;
        let questions = self.questions.stats().await;
        summaries.combine(&questions)
    }
}

impl std::fmt::Debug for ContentIntelligence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentIntelligence")
            .field("config", &self.config)
            .field(
                "provider",
                &self.client.as_ref().map(|client| client.provider().to_string()),
            )
            .finish()
    }
}

async fn remote_summary(
    client: Option<Arc<dyn GenerativeClient>>,
    unavailable: String,
    text: String,
) -> Result<String> {
    let client = client.ok_or(IntelError::NotConfigured(unavailable))?;
    let reply = client.generate_text(&prompts::summary_prompt(&text)).await?;
    Ok(prompts::parse_summary(&reply))
}

async fn remote_questions(
    client: Option<Arc<dyn GenerativeClient>>,
    unavailable: String,
    text: String,
    count: usize,
) -> Result<Vec<String>> {
    let client = client.ok_or(IntelError::NotConfigured(unavailable))?;
    let reply = client
        .generate_text(&prompts::questions_prompt(&text, count))
        .await?;
    Ok(prompts::parse_questions(&reply))
}

/// Trim or top up `questions` to exactly `count`
///
/// Missing questions come from the local heuristic, skipping duplicates, and
/// then from the generic prompt.
fn fit_questions(mut questions: Vec<String>, text: &str, count: usize) -> Vec<String> {
    questions.truncate(count);
    if questions.len() < count {
        for question in local_questions_fallback(text, count) {
            if questions.len() >= count {
                break;
            }
            if !questions.contains(&question) {
                questions.push(question);
            }
        }
        pad_questions(&mut questions, count);
    }
    questions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intel::heuristics::GENERIC_QUESTION;

    #[test]
    fn test_fit_questions_truncates() {
        let questions = (0..9).map(|i| format!("Question {}?", i)).collect();
        assert_eq!(fit_questions(questions, "Water is wet.", 5).len(), 5);
    }

    #[test]
    fn test_fit_questions_tops_up_without_duplicates() {
        let questions = vec!["What is Water?".to_string()];
        let fitted = fit_questions(questions, "Water is wet. Ice is cold.", 4);

        assert_eq!(
            fitted,
            vec![
                "What is Water?".to_string(),
                "What is Ice?".to_string(),
                GENERIC_QUESTION.to_string(),
                GENERIC_QUESTION.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_fallback_only_service_serves_local_results() {
        let service = ContentIntelligence::fallback_only(IntelConfig::default()).unwrap();
        assert!(service.is_fallback_only());

        let result = service.summarize_detailed("A. B. C. D.").await.unwrap();
        assert_eq!(result.value, "A. B. C.");
        assert!(result.is_degraded());
        assert!(matches!(result.error(), Some(IntelError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn test_blank_input_skips_tiers() {
        let service = ContentIntelligence::fallback_only(IntelConfig::default()).unwrap();

        assert_eq!(service.summarize("  ").await, "");
        assert!(service.generate_questions("", 5).await.is_empty());
        assert!(service.generate_questions("Water is wet.", 0).await.is_empty());
        assert_eq!(service.cache_stats().await.misses, 0);

        let summary = service.summarize_detailed("\n\t").await.unwrap();
        assert!(!summary.is_degraded());
        assert!(summary.error().is_none());
        assert_eq!(summary.tier_name, crate::fallback::UNATTEMPTED_TIER);

        let questions = service.generate_questions_detailed("", 3).await.unwrap();
        assert!(!questions.is_degraded());
        assert!(questions.value.is_empty());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = IntelConfig::default();
        config.summary_sentences = 0;
        assert!(matches!(
            ContentIntelligence::fallback_only(config),
            Err(IntelError::ConfigError(_))
        ));
    }
}
