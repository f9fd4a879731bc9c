//! Integration tests for the fallback chain executor

use lesson_intel::fallback::{self, FallbackChain, ServedBy, Tier};
use lesson_intel::IntelError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn remote_failure() -> IntelError {
    IntelError::RemoteError {
        provider: "test".to_string(),
        message: "503 Service Unavailable".to_string(),
    }
}

#[tokio::test]
async fn test_primary_success_is_tagged_primary() -> anyhow::Result<()> {
    let result = FallbackChain::new()
        .remote("remote", Duration::from_secs(1), || async { Ok("remote summary".to_string()) })
        .local("local", || async { Ok("local summary".to_string()) })
        .run()
        .await?;

    assert_eq!(result.value, "remote summary");
    assert_eq!(result.tier, ServedBy::Primary);
    assert_eq!(result.tier_index, 0);
    assert!(result.error().is_none());
    Ok(())
}

#[tokio::test]
async fn test_later_tiers_are_not_run_after_success() -> anyhow::Result<()> {
    let local_calls = Arc::new(AtomicUsize::new(0));
    let calls = local_calls.clone();

    FallbackChain::new()
        .local("first", || async { Ok(1) })
        .local("second", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(2)
        })
        .run()
        .await?;

    assert_eq!(local_calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn test_tiers_are_tried_in_order() -> anyhow::Result<()> {
    let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

    let tiers = (0..4)
        .map(|i| {
            let order = order.clone();
            Tier::local(format!("tier-{}", i), move || async move {
                order.lock().push(i);
                if i < 3 {
                    Err(remote_failure())
                } else {
                    Ok(i)
                }
            })
        })
        .collect();

    let result = fallback::run(tiers, |_: &i32| true).await?;

    assert_eq!(*order.lock(), vec![0, 1, 2, 3]);
    assert_eq!(result.value, 3);
    assert_eq!(result.tier, ServedBy::Fallback);
    assert_eq!(result.tier_name, "tier-3");
    let failed: Vec<_> = result.failures.iter().map(|f| f.tier_index).collect();
    assert_eq!(failed, vec![0, 1, 2]);
    Ok(())
}

#[tokio::test]
async fn test_all_tiers_failing_aggregates_reasons() {
    let result = FallbackChain::<Vec<String>>::new()
        .remote("remote", Duration::from_secs(1), || async { Err(remote_failure()) })
        .local("local", || async { Ok(Vec::new()) })
        .validate(|questions| !questions.is_empty())
        .run()
        .await;

    let failures = match result {
        Err(IntelError::AllTiersFailed { failures }) => failures,
        other => panic!("expected AllTiersFailed, got {:?}", other),
    };
    assert_eq!(failures.len(), 2);
    assert!(matches!(failures[0].error, IntelError::RemoteError { .. }));
    assert!(matches!(failures[1].error, IntelError::ValidationFailed { .. }));

    let message = IntelError::AllTiersFailed { failures }.to_string();
    assert!(message.contains("[0] remote"));
    assert!(message.contains("[1] local"));
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_tier_is_abandoned() -> anyhow::Result<()> {
    let finished = Arc::new(AtomicUsize::new(0));
    let flag = finished.clone();

    let result = FallbackChain::new()
        .remote("slow", Duration::from_millis(250), move || async move {
            tokio::time::sleep(Duration::from_secs(30)).await;
            flag.fetch_add(1, Ordering::SeqCst);
            Ok("late")
        })
        .local("fast", || async { Ok("local") })
        .run()
        .await?;

    assert_eq!(result.value, "local");
    assert!(matches!(
        result.error(),
        Some(IntelError::TimeoutError { timeout_ms: 250, .. })
    ));

    // The abandoned computation never completes
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(finished.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn test_empty_chain_is_a_programming_error() {
    let result = fallback::run(Vec::<Tier<'_, u8>>::new(), |_| true).await;
    assert!(matches!(result, Err(IntelError::InvalidArgument(_))));
}
