//! Turnstile Core Library
//!
//! Token-budgeted conversation sending: estimate how many tokens each turn
//! costs, decide which history fits the model's context window, keep a cached
//! inclusion boundary for display, and send through a provider port that
//! retries with less history when the remote side reports an overflow.

pub mod budget;
pub mod config;
pub mod error;
pub mod images;
pub mod pipeline;
pub mod provider;
pub mod telemetry;
pub mod tokens;
pub mod types;

// Re-export commonly used types
pub use budget::{
    BoundaryCache, BoundarySnapshot, BudgetAllocator, BudgetParameters, DirtyReason, Finalized,
    Prediction, TurnEstimate,
};
pub use config::{
    ModelCatalog, ModelSpec, ReservePolicy, SendSettings, SettingsLoader, SettingsPatch,
    StaticModelCatalog,
};
pub use error::{TurnstileError, TurnstileResult};
pub use images::{ImageMetadataSource, InMemoryImageStore};
pub use pipeline::{SendPhase, SendPipeline, SendReport, SendRequest};
pub use provider::{ChatProvider, ProviderError, ProviderErrorKind, ProviderRegistry};
pub use telemetry::{EventKind, TelemetryEvent, TelemetrySink};
pub use tokens::{TokenEstimator, TurnTokenCache};
pub use types::*;
