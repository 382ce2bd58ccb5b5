//! Integration tests for the Turnstile send path
//!
//! Exercises settings loading, the boundary cache and the send pipeline
//! together through the public API.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio_util::sync::CancellationToken;
use turnstile_core::{
    BoundaryCache, ChatProvider, ConversationTurn, EventKind, ModelSpec, ProviderError,
    ProviderId, ProviderRegistry, SendPipeline, SendRequest, SettingsLoader, StaticModelCatalog,
    TurnstileResult,
    provider::{ProviderRequest, ProviderResponse},
    telemetry::ChannelSink,
};

/// Reports overflow whenever the request carries more than `max_messages`
struct LimitedProvider {
    max_messages: usize,
    calls: AtomicU32,
}

#[async_trait]
impl ChatProvider for LimitedProvider {
    fn provider_id(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    async fn send(
        &self,
        request: &ProviderRequest,
        _cancel: CancellationToken,
    ) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.messages.len() > self.max_messages {
            return Err(ProviderError::from_status(
                400,
                "prompt is too long: 210000 tokens > 200000 maximum",
            ));
        }
        Ok(ProviderResponse::new("done").with_usage(10, 2))
    }
}

fn transcript(count: usize) -> Vec<ConversationTurn> {
    let start = Utc::now() - Duration::hours(1);
    (0..count)
        .map(|i| {
            ConversationTurn::new(format!("question {i} {}", "q".repeat(400)), "a".repeat(400))
                .with_created_at(start + Duration::minutes(i as i64))
        })
        .collect()
}

#[tokio::test]
async fn test_settings_file_cache_and_send() -> TurnstileResult<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(
        file,
        r#"{{"user_request_allowance": 500, "max_trim_attempts": 5, "system_prompt": "You are terse."}}"#
    )?;
    let settings = SettingsLoader::empty().with_file(file.path()).load()?;
    assert_eq!(settings.max_trim_attempts, 5);

    let model = ModelSpec::new("claude-test", ProviderId::Anthropic, 1_500);
    let turns = transcript(6);

    let mut cache = BoundaryCache::new(model.clone(), settings.clone());
    cache.update_turns(turns.clone());
    let boundary = cache.get_boundary();
    assert!(boundary.stats.included_count > 0);
    assert_eq!(boundary.total_count(), 6);

    let provider = Arc::new(LimitedProvider {
        max_messages: 5,
        calls: AtomicU32::new(0),
    });
    let (sink, mut events) = ChannelSink::new();
    let mut pipeline = SendPipeline::new(
        Arc::new(StaticModelCatalog::empty().with_model(model)),
        ProviderRegistry::new().with_provider(provider.clone()),
    )
    .with_settings(settings)
    .with_memo(Arc::clone(cache.memo()))
    .with_telemetry(Arc::new(sink));

    let report = pipeline
        .send(
            SendRequest::new("claude-test", "next question").with_history(turns),
            CancellationToken::new(),
        )
        .await?;

    // Two messages per turn plus the new one: at most two turns survive
    assert!(report.included.len() <= 2);
    assert_eq!(report.attempts_used, provider.calls.load(Ordering::SeqCst));
    assert!(cache.memo().hits() > 0);

    // The newest turns the boundary shows are the ones actually sent
    let sent = report.included_ids();
    let shown = boundary.included_ids();
    assert!(shown.ends_with(&sent));

    let mut kinds = Vec::new();
    while let Ok(event) = events.try_recv() {
        kinds.push(event.kind);
    }
    assert_eq!(kinds.first(), Some(&EventKind::Preflight));
    assert_eq!(kinds.last(), Some(&EventKind::Success));
    assert_eq!(
        kinds.iter().filter(|k| **k == EventKind::Attempt).count() as u32,
        report.attempts_used
    );
    Ok(())
}

#[tokio::test]
async fn test_boundary_cache_is_stable_until_changed() {
    let model = ModelSpec::new("m", ProviderId::OpenAi, 2_000);
    let mut cache = BoundaryCache::new(model, Default::default());
    cache.update_turns(transcript(3));

    let first = cache.get_boundary();
    let second = cache.get_boundary();
    assert!(Arc::ptr_eq(&first, &second));

    cache.update_turns(transcript(4));
    let third = cache.get_boundary();
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(third.total_count(), 4);
}
