//! Offline allocation plan for the next message

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use colored::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::ExitCode;

use crate::args::PlanArgs;
use crate::console::CliConsole;
use turnstile_core::{
    BudgetAllocator, BudgetParameters, ConversationTurn, Finalized, ModelCatalog, Prediction,
    SettingsLoader, StaticModelCatalog, TokenEstimator, TurnEstimate, TurnstileError,
};

/// One exchange as written in a transcript file
#[derive(Debug, Clone, Deserialize)]
struct TranscriptEntry {
    #[serde(default, alias = "user_text")]
    user: String,
    #[serde(default, alias = "assistant_text")]
    assistant: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

/// Load a transcript; entries without a timestamp are ordered as written
pub fn load_transcript(path: &Path) -> anyhow::Result<Vec<ConversationTurn>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read transcript {}", path.display()))?;
    let entries: Vec<TranscriptEntry> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid transcript {}", path.display()))?;

    let start = Utc::now() - Duration::seconds(entries.len() as i64);
    Ok(entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            let created_at = entry
                .created_at
                .unwrap_or(start + Duration::seconds(i as i64));
            ConversationTurn::new(entry.user, entry.assistant).with_created_at(created_at)
        })
        .collect())
}

#[derive(Debug, Serialize)]
struct PlannedTurn {
    id: String,
    tokens: usize,
    preview: String,
}

impl From<&TurnEstimate> for PlannedTurn {
    fn from(estimate: &TurnEstimate) -> Self {
        Self {
            id: estimate.turn.id.short(),
            tokens: estimate.tokens,
            preview: preview(&estimate.turn.user_text),
        }
    }
}

#[derive(Debug, Serialize)]
struct PlanReport {
    model: String,
    params: BudgetParameters,
    user_tokens: usize,
    included: Vec<PlannedTurn>,
    trimmed: Vec<PlannedTurn>,
    excluded: Vec<PlannedTurn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    input_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<PlanError>,
}

#[derive(Debug, Serialize)]
struct PlanError {
    code: &'static str,
    message: String,
}

fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > 48 {
        format!("{}…", line.chars().take(47).collect::<String>())
    } else {
        line.to_string()
    }
}

fn build_report(
    model: String,
    params: BudgetParameters,
    user_tokens: usize,
    prediction: &Prediction,
    finalized: &Result<Finalized, TurnstileError>,
) -> PlanReport {
    let excluded = prediction.excluded.iter().map(PlannedTurn::from).collect();
    match finalized {
        Ok(finalized) => PlanReport {
            model,
            params,
            user_tokens,
            included: finalized.included.iter().map(PlannedTurn::from).collect(),
            trimmed: finalized.trimmed.iter().map(PlannedTurn::from).collect(),
            excluded,
            input_tokens: Some(finalized.input_tokens),
            error: None,
        },
        Err(error) => PlanReport {
            model,
            params,
            user_tokens,
            included: Vec::new(),
            trimmed: Vec::new(),
            excluded,
            input_tokens: None,
            error: Some(PlanError {
                code: error.error_code(),
                message: error.to_string(),
            }),
        },
    }
}

/// Non-zero when the next message cannot be sent at all
fn exit_code(report: &PlanReport) -> ExitCode {
    if report.error.is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// The report already carries any admission failure, so it is not returned as an error
pub fn run(args: PlanArgs) -> anyhow::Result<ExitCode> {
    let mut loader = SettingsLoader::new();
    if let Some(ref path) = args.settings {
        loader = loader.with_file(path);
    }
    let mut settings = loader.load()?;
    if let Some(system) = args.system {
        settings.system_prompt = Some(system);
    }

    let mut model = StaticModelCatalog::new().resolve(&args.model)?;
    if let Some(context) = args.context {
        model.max_context = context;
    }

    let turns = load_transcript(&args.transcript)?;
    let estimator = TokenEstimator::new(model.provider.clone(), settings.chars_per_token);
    let system_tokens = settings
        .system_prompt
        .as_deref()
        .map_or(0, |prompt| estimator.estimate_text(prompt));
    let params = BudgetParameters::from_model(&model, &settings, system_tokens);

    let allocator = BudgetAllocator::new(model.provider.clone());
    let user_tokens = allocator.estimate_new_turn(&args.message, &[], &params);
    let prediction = allocator.predict(&turns, &params);
    let finalized = allocator.finalize_with_tokens(&prediction, user_tokens, &params);
    tracing::debug!(turns = turns.len(), user_tokens, "plan computed");

    let report = build_report(model.id.clone(), params, user_tokens, &prediction, &finalized);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(exit_code(&report))
}

fn print_report(report: &PlanReport) {
    let console = CliConsole::new();
    console.print_header(&format!("Plan for {}", report.model));
    console.field("context", report.params.max_context);
    console.field("user allowance", report.params.user_request_allowance);
    console.field("response reserve", report.params.provider_response_reserve);
    console.field("system tokens", report.params.system_tokens);
    console.field("message tokens", report.user_tokens);
    if let Some(input) = report.input_tokens {
        console.field("request input", input);
    }

    let sections = [
        ("Included", &report.included, "+".green()),
        ("Trimmed", &report.trimmed, "-".yellow()),
        ("Excluded", &report.excluded, "·".dimmed()),
    ];
    for (title, turns, marker) in sections {
        if turns.is_empty() {
            continue;
        }
        console.info(&format!("\n{} ({})", title.bold(), turns.len()));
        for turn in turns {
            console.info(&format!(
                "  {} {} {:>6}  {}",
                marker,
                turn.id.dimmed(),
                turn.tokens,
                turn.preview
            ));
        }
    }

    match &report.error {
        Some(error) => console.error(&format!("{}: {}", error.code, error.message)),
        None => console.success(&format!(
            "{} of {} turns fit",
            report.included.len(),
            report.included.len() + report.trimmed.len() + report.excluded.len()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_transcript_keeps_file_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"user": "first", "assistant": "a"}}, {{"user_text": "second"}}]"#
        )
        .unwrap();

        let turns = load_transcript(file.path()).unwrap();

        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].user_text, "second");
        assert!(turns[0].created_at < turns[1].created_at);
    }

    #[test]
    fn test_load_transcript_rejects_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();

        assert!(load_transcript(file.path()).is_err());
    }

    fn params(max_context: usize) -> BudgetParameters {
        BudgetParameters {
            max_context,
            user_request_allowance: 0,
            provider_response_reserve: 0,
            system_tokens: 0,
            chars_per_token: 4.0,
        }
    }

    #[test]
    fn test_oversized_message_fails_without_error_return() {
        let allocator = BudgetAllocator::new(turnstile_core::ProviderId::OpenAi);
        let params = params(100);
        let prediction = allocator.predict(&[], &params);
        let finalized = allocator.finalize_with_tokens(&prediction, 500, &params);

        let report = build_report("m".to_string(), params, 500, &prediction, &finalized);

        assert_eq!(report.error.as_ref().map(|e| e.code), Some("user_prompt_too_large"));
        assert_eq!(exit_code(&report), ExitCode::FAILURE);
    }

    #[test]
    fn test_fitting_message_exits_cleanly() {
        let allocator = BudgetAllocator::new(turnstile_core::ProviderId::OpenAi);
        let params = params(1_000);
        let turns = vec![ConversationTurn::new("u".repeat(40), "")];
        let prediction = allocator.predict(&turns, &params);
        let finalized = allocator.finalize_with_tokens(&prediction, 10, &params);

        let report = build_report("m".to_string(), params, 10, &prediction, &finalized);

        assert!(report.error.is_none());
        assert_eq!(report.included.len(), 1);
        assert_eq!(exit_code(&report), ExitCode::SUCCESS);
    }

    #[test]
    fn test_preview_truncates_first_line() {
        assert_eq!(preview("short\nsecond line"), "short");
        let long = "x".repeat(100);
        assert_eq!(preview(&long).chars().count(), 48);
    }
}
