//! Overflow-driven provider retry loop

use tokio_util::sync::CancellationToken;

use super::assembly::assemble_request;
use super::deadline::Deadline;
use super::trace::SendTrace;
use super::types::{AttemptOutcome, SendAttempt, SendPhase};
use crate::budget::TurnEstimate;
use crate::config::{ModelSpec, SendSettings};
use crate::error::{TurnstileError, TurnstileResult};
use crate::provider::{ChatProvider, ProviderError, ProviderRequest, ProviderResponse};
use crate::telemetry::EventKind;
use crate::types::ImageRef;

/// The fixed part of every attempt
pub(super) struct AttemptPlan<'a> {
    pub model: &'a ModelSpec,
    pub settings: &'a SendSettings,
    pub text: &'a str,
    pub attachments: &'a [ImageRef],
}

/// A single call ends in one of these
enum CallError {
    Provider(ProviderError),
    Cancelled,
    TimedOut,
}

/// Send `history`, dropping the oldest remaining turn after each overflow
///
/// Returns the response and the history the successful attempt carried. The
/// loop never mutates `history`; each iteration narrows an immutable slice so
/// the attempt log reflects exactly what every call contained.
pub(super) async fn run_attempts(
    provider: &dyn ChatProvider,
    plan: &AttemptPlan<'_>,
    history: &[TurnEstimate],
    trace: &mut SendTrace,
    cancel: &CancellationToken,
    deadline: &mut Deadline,
) -> TurnstileResult<(ProviderResponse, Vec<TurnEstimate>)> {
    let max_attempts = plan.settings.max_trim_attempts.max(1);
    let mut remaining = history;

    loop {
        let index = trace.attempts.len() as u32 + 1;
        if cancel.is_cancelled() {
            return Err(TurnstileError::Cancelled);
        }

        trace.attempt = index;
        trace.select(remaining);
        trace.enter(SendPhase::Sending { attempt: index });
        trace.emit(EventKind::Attempt, None);

        let request = assemble_request(
            plan.model,
            plan.settings,
            remaining,
            plan.text,
            plan.attachments,
        );
        tracing::debug!(
            attempt = index,
            max_attempts,
            history = remaining.len(),
            input_tokens = trace.budget.input_tokens,
            "sending request"
        );

        let result = call_provider(provider, &request, cancel, deadline).await;
        if let Err(CallError::Provider(_)) = result {
            deadline.rearm();
        }
        let outcome = match &result {
            Ok(_) => AttemptOutcome::Succeeded,
            Err(CallError::Provider(error)) => AttemptOutcome::Failed {
                kind: error.kind,
                message: error.message.clone(),
            },
            Err(CallError::Cancelled) => AttemptOutcome::Cancelled,
            Err(CallError::TimedOut) => AttemptOutcome::TimedOut,
        };
        trace.attempts.push(SendAttempt {
            index,
            turn_ids: remaining.iter().map(|t| t.turn.id).collect(),
            input_tokens: trace.budget.input_tokens,
            outcome,
        });

        match result {
            Ok(response) => {
                if index > 1 {
                    tracing::info!(attempt = index, "request succeeded after trimming");
                }
                if let Some(usage) = &response.usage {
                    tracing::info!(
                        input_tokens = usage.input_tokens,
                        output_tokens = usage.output_tokens,
                        estimated_input = trace.budget.input_tokens,
                        "provider request completed"
                    );
                }
                return Ok((response, remaining.to_vec()));
            }
            Err(CallError::Cancelled) => return Err(TurnstileError::Cancelled),
            Err(CallError::TimedOut) => {
                return Err(TurnstileError::Timeout {
                    seconds: deadline.seconds(),
                });
            }
            Err(CallError::Provider(error)) if error.is_overflow() => {
                let exhausted = || TurnstileError::ContextOverflowAfterTrimming {
                    attempts: index,
                    trimmed: trace.trimmed_total(),
                };
                if index >= max_attempts {
                    tracing::warn!(attempts = index, "trim attempts exhausted");
                    return Err(exhausted());
                }
                let Some((dropped, rest)) = remaining.split_first() else {
                    tracing::warn!(attempt = index, "provider overflow with empty history");
                    return Err(exhausted());
                };
                tracing::warn!(
                    attempt = index,
                    dropped = %dropped.turn.id.short(),
                    remaining = rest.len(),
                    "provider reported overflow, dropping oldest turn"
                );
                remaining = rest;
                trace.trimmed_provider += 1;
            }
            Err(CallError::Provider(error)) => {
                tracing::warn!(attempt = index, kind = %error.kind, "non-retryable provider error");
                return Err(TurnstileError::from_provider(error, index));
            }
        }
    }
}

/// Race one call against caller cancellation and the deadline
///
/// The port receives a child token; it fires on either outcome so the port can
/// abandon its work.
async fn call_provider(
    provider: &dyn ChatProvider,
    request: &ProviderRequest,
    cancel: &CancellationToken,
    deadline: &Deadline,
) -> Result<ProviderResponse, CallError> {
    let call_token = cancel.child_token();
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CallError::Cancelled),
        _ = deadline.expired() => {
            call_token.cancel();
            Err(CallError::TimedOut)
        }
        result = provider.send(request, call_token.clone()) => result.map_err(CallError::Provider),
    }
}
