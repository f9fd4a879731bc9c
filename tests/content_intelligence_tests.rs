//! Integration tests for the content intelligence service
//!
//! The remote tier is driven by in-process test clients, so no test touches
//! the network.

use async_trait::async_trait;
use futures::future::join_all;
use lesson_intel::intel::heuristics::GENERIC_QUESTION;
use lesson_intel::{
    local_summary_fallback, ContentIntelligence, GenerativeClient, IntelConfig, IntelError,
    Lesson, Respondable, ServedBy,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const WATER: &str =
    "Water is the driving force of all nature. It covers 71% of the Earth. Fresh water is rare.";

/// Always fails like an unreachable provider
struct FailingClient;

#[async_trait]
impl GenerativeClient for FailingClient {
    fn provider(&self) -> &str {
        "failing"
    }

    async fn generate_content(&self, _prompt: &str) -> lesson_intel::Result<Box<dyn Respondable>> {
        Err(IntelError::RemoteError {
            provider: "failing".to_string(),
            message: "connection refused".to_string(),
        })
    }
}

/// Replies with a fixed text and counts calls
struct StaticClient {
    reply: String,
    delay: Duration,
    calls: AtomicUsize,
}

impl StaticClient {
    fn new(reply: &str) -> Arc<Self> {
        Self::slow(reply, Duration::ZERO)
    }

    fn slow(reply: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerativeClient for StaticClient {
    fn provider(&self) -> &str {
        "static"
    }

    async fn generate_content(&self, _prompt: &str) -> lesson_intel::Result<Box<dyn Respondable>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(Box::new(self.reply.clone()))
    }
}

fn service_with(client: Arc<dyn GenerativeClient>) -> ContentIntelligence {
    let config = IntelConfig::default().with_remote_timeout(Duration::from_millis(500));
    ContentIntelligence::new(config, Some(client)).unwrap()
}

fn looks_like_question(q: &str) -> bool {
    !q.trim().is_empty() && (q.ends_with('?') || q.starts_with("Explain:") || q.starts_with("Describe"))
}

#[test]
fn test_local_summary_is_deterministic() {
    assert_eq!(local_summary_fallback("A. B. C. D.", 2), "A. B.");
}

#[tokio::test]
async fn test_end_to_end_with_remote_disabled() {
    let service = ContentIntelligence::fallback_only(IntelConfig::default()).unwrap();

    assert_eq!(service.summarize(WATER).await, WATER);

    let questions = service.generate_questions(WATER, 3).await;
    assert_eq!(questions.len(), 3);
    assert!(questions.iter().all(|q| looks_like_question(q)), "{:?}", questions);
}

#[tokio::test]
async fn test_missing_api_key_means_fallback_only() {
    let config = IntelConfig::from_lookup(|_| None).unwrap();
    let service = ContentIntelligence::from_config(config).unwrap();

    assert!(service.is_fallback_only());
    let result = service.summarize_detailed(WATER).await.unwrap();
    assert_eq!(result.tier, ServedBy::Fallback);
    assert!(matches!(result.error(), Some(IntelError::NotConfigured(_))));
}

#[tokio::test]
async fn test_question_count_is_exact_when_remote_fails() {
    let service = service_with(Arc::new(FailingClient));

    for count in 1..=7 {
        let questions = service.generate_questions(WATER, count).await;
        assert_eq!(questions.len(), count);
        assert!(questions.iter().all(|q| looks_like_question(q)));
    }
    assert!(service.generate_questions("", 5).await.is_empty());
    assert!(service.generate_questions(" \n\t ", 5).await.is_empty());
}

#[tokio::test]
async fn test_failing_remote_falls_back_for_summary() {
    let service = service_with(Arc::new(FailingClient));

    let result = service.summarize_detailed(WATER).await.unwrap();
    assert_eq!(result.value, WATER);
    assert!(result.is_degraded());
    assert!(matches!(result.error(), Some(IntelError::RemoteError { .. })));
}

#[tokio::test]
async fn test_remote_summary_is_served_when_valid() {
    let client = StaticClient::new("  Water shapes the planet.\n");
    let service = service_with(client.clone());

    let result = service.summarize_detailed(WATER).await.unwrap();
    assert_eq!(result.value, "Water shapes the planet.");
    assert_eq!(result.tier, ServedBy::Primary);
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn test_blank_remote_reply_falls_back() {
    let service = service_with(StaticClient::new("   "));

    let result = service.summarize_detailed(WATER).await.unwrap();
    assert_eq!(result.tier, ServedBy::Fallback);
    assert!(matches!(result.error(), Some(IntelError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_remote_questions_are_cleaned_and_fitted() {
    let reply = "Sure! Here you go:\n1. What is water?\n2) Why is fresh water rare?\n- Explain the water cycle.";
    let service = service_with(StaticClient::new(reply));

    let result = service.generate_questions_detailed(WATER, 5).await.unwrap();
    assert_eq!(result.tier, ServedBy::Primary);
    assert_eq!(
        result.value,
        vec![
            "What is water?".to_string(),
            "Why is fresh water rare?".to_string(),
            "Explain the water cycle.".to_string(),
            "What is Water?".to_string(),
            "Explain: It covers 71% of the Earth.".to_string(),
        ]
    );

    let two = service.generate_questions(WATER, 2).await;
    assert_eq!(two, vec!["What is water?", "Why is fresh water rare?"]);
}

#[tokio::test]
async fn test_remote_reply_without_questions_falls_back() {
    let service = service_with(StaticClient::new("Water is important. That is all."));

    let result = service.generate_questions_detailed(WATER, 4).await.unwrap();
    assert_eq!(result.tier, ServedBy::Fallback);
    assert_eq!(result.value.len(), 4);
    assert_eq!(result.value[3], GENERIC_QUESTION);
    assert!(matches!(result.error(), Some(IntelError::ValidationFailed { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_slow_remote_times_out() {
    let client = StaticClient::slow("Too late.", Duration::from_secs(30));
    let service = service_with(client.clone());

    let result = service.summarize_detailed(WATER).await.unwrap();
    assert_eq!(result.value, WATER);
    assert!(matches!(
        result.error(),
        Some(IntelError::TimeoutError { timeout_ms: 500, .. })
    ));
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn test_results_are_cached_per_operation() {
    let client = StaticClient::new("What is water?");
    let service = service_with(client.clone());

    service.summarize(WATER).await;
    service.summarize(WATER).await;
    assert_eq!(client.calls(), 1);

    service.generate_questions(WATER, 1).await;
    service.generate_questions(WATER, 1).await;
    assert_eq!(client.calls(), 2);

    // A different count is a different request
    service.generate_questions(WATER, 2).await;
    assert_eq!(client.calls(), 3);

    let stats = service.cache_stats().await;
    assert_eq!(stats.misses, 3);
    assert_eq!(stats.hits, 2);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_requests_share_one_remote_call() {
    let client = StaticClient::slow("Water shapes the planet.", Duration::from_millis(100));
    let service = service_with(client.clone());

    let summaries = join_all((0..8).map(|_| service.summarize(WATER))).await;

    assert_eq!(client.calls(), 1);
    assert!(summaries.iter().all(|s| s == "Water shapes the planet."));
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_request_still_caches_remote_result() {
    let client = StaticClient::slow("Water shapes the planet.", Duration::from_millis(200));
    let service = service_with(client.clone());

    // The only caller gives up while the remote call is running
    let abandoned = tokio::time::timeout(Duration::from_millis(50), service.summarize_detailed(WATER)).await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_secs(60)).await;

    let result = service.summarize_detailed(WATER).await.unwrap();
    assert_eq!(result.tier, ServedBy::Primary);
    assert_eq!(result.value, "Water shapes the planet.");
    assert!(result.error().is_none());
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn test_blank_input_is_not_degraded() {
    let service = service_with(Arc::new(FailingClient));

    let result = service.summarize_detailed("   ").await.unwrap();
    assert!(result.value.is_empty());
    assert!(!result.is_degraded());
    assert!(result.error().is_none());
}

#[tokio::test]
async fn test_invalidate_lesson_drops_derived_content() {
    let client = StaticClient::new("What is water?");
    let service = service_with(client.clone());
    let lesson = Lesson::new("water-101", "Water", "science", WATER);

    service.summarize_lesson(&lesson).await;
    service.questions_for_lesson(&lesson, Some(1)).await;
    assert_eq!(client.calls(), 2);

    assert_eq!(service.invalidate_lesson("water-101").await, 2);
    assert_eq!(service.invalidate_lesson("water-101").await, 0);

    service.summarize_lesson(&lesson).await;
    assert_eq!(client.calls(), 3);
}

#[tokio::test]
async fn test_questions_for_lesson_uses_configured_count() {
    let service = ContentIntelligence::fallback_only(IntelConfig::default()).unwrap();
    let lesson = Lesson::new("water-101", "Water", "science", WATER);

    let questions = service.questions_for_lesson(&lesson, None).await;
    assert_eq!(questions.len(), service.config().question_count);
}
