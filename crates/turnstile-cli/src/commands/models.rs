//! Models listing command

use crate::console::CliConsole;
use colored::*;
use turnstile_core::{ProviderId, ReservePolicy, StaticModelCatalog};

/// List the built-in models, optionally for one provider
pub fn list(provider: Option<&str>, json: bool) -> anyhow::Result<()> {
    let filter = provider.map(ProviderId::from);
    let models: Vec<_> = StaticModelCatalog::new()
        .models()
        .into_iter()
        .filter(|m| filter.as_ref().is_none_or(|p| &m.provider == p))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&models)?);
        return Ok(());
    }

    let console = CliConsole::new();
    console.print_header("Available Models");
    if models.is_empty() {
        console.warn("No models match");
        return Ok(());
    }

    for model in &models {
        let reserve = match model.reserve_policy {
            ReservePolicy::Separate => "separate reserve",
            ReservePolicy::Folded => "folded reserve",
        };
        console.info(&format!(
            "  • {} {} {} tokens, {}",
            model.id.green(),
            format!("({})", model.provider).dimmed(),
            model.max_context,
            reserve
        ));
    }
    Ok(())
}
