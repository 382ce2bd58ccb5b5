//! CLI argument definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "turnstile")]
#[command(about = "Turnstile - token budgets for conversation history")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Estimate the tokens a piece of text costs
    Estimate {
        /// Text to estimate
        text: String,

        /// Provider whose estimation rules apply
        #[arg(long, default_value = "openai")]
        provider: String,

        /// Characters per token
        #[arg(long, default_value_t = 4.0)]
        chars_per_token: f32,
    },

    /// Show which history turns would accompany the next message
    Plan(PlanArgs),

    /// List the built-in model catalog
    Models {
        /// Only show models of this provider
        #[arg(long)]
        provider: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    /// Transcript JSON file (array of {user, assistant, created_at?})
    #[arg(long, short)]
    pub transcript: PathBuf,

    /// Model id from the catalog
    #[arg(long, short, env = "TURNSTILE_MODEL")]
    pub model: String,

    /// The next user message
    #[arg(long)]
    pub message: String,

    /// System prompt (overrides settings)
    #[arg(long)]
    pub system: Option<String>,

    /// Settings file merged over the user settings
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Override the model's context size
    #[arg(long)]
    pub context: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
