//! Provider request assembly

use crate::budget::TurnEstimate;
use crate::config::{ModelSpec, SendSettings};
use crate::provider::{ChatMessage, ProviderRequest, RequestOptions};
use crate::types::ImageRef;

/// Build the outgoing request from the admitted history and the new turn
///
/// Each history turn becomes a user message carrying that turn's own
/// attachments, followed by the assistant reply when there is one. The new
/// user message with its attachments always comes last.
pub fn assemble_request(
    model: &ModelSpec,
    settings: &SendSettings,
    history: &[TurnEstimate],
    text: &str,
    attachments: &[ImageRef],
) -> ProviderRequest {
    let mut messages = Vec::with_capacity(history.len() * 2 + 1);

    for estimate in history {
        let turn = &estimate.turn;
        messages.push(ChatMessage::user(turn.user_text.as_str()).with_attachments(turn.images.clone()));
        if !turn.assistant_text.is_empty() {
            messages.push(ChatMessage::assistant(turn.assistant_text.as_str()));
        }
    }
    messages.push(ChatMessage::user(text).with_attachments(attachments.to_vec()));

    ProviderRequest {
        model: model.id.clone(),
        messages,
        system: settings
            .system_prompt
            .as_ref()
            .filter(|prompt| !prompt.is_empty())
            .cloned(),
        options: RequestOptions {
            temperature: settings.temperature,
            max_output_tokens: Some(model.clamp_output(settings.assistant_response_allowance)),
            web_search: settings.web_search,
        },
    }
}
