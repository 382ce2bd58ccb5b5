//! Text estimation command

use crate::console::CliConsole;
use turnstile_core::{ProviderId, TokenEstimator};

pub fn run(text: &str, provider: &str, chars_per_token: f32) -> anyhow::Result<()> {
    let provider = ProviderId::from(provider);
    let estimator = TokenEstimator::new(provider.clone(), chars_per_token);
    let tokens = estimator.estimate_text(text);

    let console = CliConsole::new();
    console.field("provider", &provider);
    console.field("characters", text.chars().count());
    console.field("chars per token", estimator.chars_per_token());
    console.field("tokens", tokens);
    Ok(())
}
