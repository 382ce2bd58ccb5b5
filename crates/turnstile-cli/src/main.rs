//! Turnstile CLI application
//!
//! Offline inspection of token budgets for conversation transcripts.
//!
//! # Commands
//!
//! - `turnstile estimate "<text>"`: token estimate for a piece of text
//! - `turnstile plan --transcript chat.json --model <id> --message "<text>"`:
//!   which turns would be sent with the next message
//! - `turnstile models`: built-in model catalog
//!
//! Set `RUST_LOG=debug` to see allocation decisions.

mod args;
mod commands;
mod console;

use clap::Parser;
use std::process::ExitCode;

pub use args::{Cli, Commands};

fn main() -> anyhow::Result<ExitCode> {
    // Initialize logging with environment-based filtering
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Estimate {
            text,
            provider,
            chars_per_token,
        } => commands::estimate::run(&text, &provider, chars_per_token)?,
        Commands::Plan(args) => return commands::plan::run(args),
        Commands::Models { provider, json } => commands::models::list(provider.as_deref(), json)?,
    }
    Ok(ExitCode::SUCCESS)
}
