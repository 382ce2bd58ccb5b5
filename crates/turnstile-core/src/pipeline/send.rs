//! Send pipeline orchestration

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use super::deadline::Deadline;
use super::retry::{AttemptPlan, run_attempts};
use super::trace::SendTrace;
use super::types::{SendPhase, SendReport, SendRequest};
use crate::budget::{BudgetAllocator, BudgetParameters};
use crate::config::{ModelCatalog, ModelSpec, SendSettings, SettingsPatch};
use crate::error::{TurnstileError, TurnstileResult};
use crate::images::{ImageMetadataSource, NoImageMetadata, resolve_dimensions};
use crate::provider::{ChatProvider, ProviderRegistry};
use crate::telemetry::{BudgetNumbers, EventKind, TelemetrySink};
use crate::tokens::{TokenEstimator, TurnTokenCache};
use crate::types::ConversationTurn;

/// Sends one user turn with as much history as the model can take
///
/// `send` borrows the pipeline mutably, so a conversation owning one pipeline
/// can never have two sends in flight.
pub struct SendPipeline {
    catalog: Arc<dyn ModelCatalog>,
    providers: ProviderRegistry,
    images: Arc<dyn ImageMetadataSource>,
    settings: SendSettings,
    telemetry: Option<Arc<dyn TelemetrySink>>,
    memo: Option<Arc<TurnTokenCache>>,
}

impl std::fmt::Debug for SendPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendPipeline")
            .field("providers", &self.providers)
            .field("settings", &self.settings)
            .field("telemetry", &self.telemetry.is_some())
            .finish()
    }
}

impl SendPipeline {
    pub fn new(catalog: Arc<dyn ModelCatalog>, providers: ProviderRegistry) -> Self {
        Self {
            catalog,
            providers,
            images: Arc::new(NoImageMetadata),
            settings: SendSettings::default(),
            telemetry: None,
            memo: None,
        }
    }

    pub fn with_images(mut self, images: Arc<dyn ImageMetadataSource>) -> Self {
        self.images = images;
        self
    }

    pub fn with_settings(mut self, settings: SendSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_telemetry(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = Some(sink);
        self
    }

    /// Reuse text estimates across sends (typically the boundary cache's memo)
    pub fn with_memo(mut self, memo: Arc<TurnTokenCache>) -> Self {
        self.memo = Some(memo);
        self
    }

    pub fn settings(&self) -> &SendSettings {
        &self.settings
    }

    /// Takes effect from the next send
    pub fn apply_settings(&mut self, patch: &SettingsPatch) {
        self.settings.apply(patch);
    }

    fn resolve(&self, model: &str) -> TurnstileResult<(ModelSpec, Arc<dyn ChatProvider>)> {
        let spec = self.catalog.resolve(model)?;
        let provider = self.providers.resolve(&spec.provider)?;
        Ok((spec, provider))
    }

    /// Run one send to completion
    ///
    /// Emits `preflight`, then `attempt` before every provider call, then
    /// exactly one `success` or `error` event. Failures before the network
    /// (unknown model, missing provider or key, oversized prompt) never call
    /// the provider. `cancel` and the request timeout apply from the start,
    /// including image metadata lookups; the timeout restarts whenever an
    /// attempt completes.
    #[instrument(skip(self, request, cancel), fields(model = %request.model, history = request.history.len()))]
    pub async fn send(
        &mut self,
        request: SendRequest,
        cancel: CancellationToken,
    ) -> TurnstileResult<SendReport> {
        let settings = self.settings.clone();
        let mut trace = SendTrace::new(request.model.as_str(), self.telemetry.clone());

        let (model, provider) = match self.resolve(&request.model) {
            Ok(resolved) => resolved,
            Err(error) => return Err(trace.fail(error)),
        };
        if cancel.is_cancelled() {
            return Err(trace.fail(TurnstileError::Cancelled));
        }

        let mut deadline = Deadline::start(settings.request_timeout_secs);

        trace.enter(SendPhase::Estimating);
        let estimator = TokenEstimator::new(model.provider.clone(), settings.chars_per_token);
        let system_tokens = settings
            .system_prompt
            .as_deref()
            .map_or(0, |prompt| estimator.estimate_text(prompt));

        let source = Arc::clone(&self.images);
        let new_images = &request.attachments;
        let history = request.history;
        let images = async move {
            let attachments = resolve_dimensions(source.as_ref(), new_images).await;
            let history = resolve_history_images(source.as_ref(), history).await;
            (attachments, history)
        };
        let (attachments, history) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(trace.fail(TurnstileError::Cancelled)),
            _ = deadline.expired() => {
                return Err(trace.fail(TurnstileError::Timeout {
                    seconds: deadline.seconds(),
                }));
            }
            resolved = images => resolved,
        };

        let params = BudgetParameters::from_model(&model, &settings, system_tokens);
        let mut allocator = BudgetAllocator::new(model.provider.clone());
        if let Some(memo) = &self.memo {
            allocator = allocator.with_memo(Arc::clone(memo));
        }
        let user_tokens = allocator.estimate_new_turn(&request.text, &attachments, &params);
        trace.budget = BudgetNumbers {
            max_context: params.max_context,
            user_request_allowance: params.user_request_allowance,
            provider_response_reserve: params.provider_response_reserve,
            system_tokens,
            user_tokens,
            predicted_capacity: params.predicted_history_limit(),
            history_capacity: params.actual_history_limit(user_tokens),
            input_tokens: system_tokens + user_tokens,
        };

        trace.enter(SendPhase::Predicting);
        let prediction = allocator.predict(&history, &params);
        trace.select(&prediction.predicted);

        trace.enter(SendPhase::LocallyTrimming);
        let finalized = match allocator.finalize_with_tokens(&prediction, user_tokens, &params) {
            Ok(finalized) => finalized,
            Err(error) => {
                // Nothing was admitted, whatever the prediction held
                trace.select(&[]);
                return Err(trace.fail(error));
            }
        };
        trace.trimmed_internal = finalized.trimmed.len();
        trace.select(&finalized.included);

        tracing::debug!(
            included = finalized.included.len(),
            trimmed_internal = trace.trimmed_internal,
            excluded = prediction.excluded.len(),
            input_tokens = finalized.input_tokens,
            max_context = params.max_context,
            "local admission complete"
        );
        trace.emit(EventKind::Preflight, None);

        let plan = AttemptPlan {
            model: &model,
            settings: &settings,
            text: &request.text,
            attachments: &attachments,
        };
        let result = run_attempts(
            provider.as_ref(),
            &plan,
            &finalized.included,
            &mut trace,
            &cancel,
            &mut deadline,
        )
        .await;

        match result {
            Ok((response, included)) => {
                trace.succeed();
                Ok(SendReport {
                    response,
                    included,
                    attempts_used: trace.attempt,
                    attempts: std::mem::take(&mut trace.attempts),
                    trimmed_internal: trace.trimmed_internal,
                    trimmed_provider: trace.trimmed_provider,
                    budget: trace.budget,
                    phases: std::mem::take(&mut trace.phases),
                })
            }
            Err(error) => Err(trace.fail(error)),
        }
    }
}

/// Fill in image dimensions missing on history turns
async fn resolve_history_images(
    source: &dyn ImageMetadataSource,
    turns: Vec<ConversationTurn>,
) -> Vec<ConversationTurn> {
    let mut resolved = Vec::with_capacity(turns.len());
    for mut turn in turns {
        if turn.images.iter().any(|image| image.dimensions.is_none()) {
            turn.images = resolve_dimensions(source, &turn.images).await;
        }
        resolved.push(turn);
    }
    resolved
}
