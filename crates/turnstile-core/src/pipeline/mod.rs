//! Send pipeline
//!
//! One send runs through estimation, prediction, the local admission guard,
//! local trimming, request assembly and a provider retry loop driven by
//! overflow errors. Every transition is reported to the injected telemetry
//! sink and recorded in the returned [`SendReport`].
//!
//! # Retry policy
//!
//! - `overflow`: drop the single oldest remaining turn and try again
//! - any other provider error: fail at once
//! - overflow with an empty history, or after `max_trim_attempts` calls:
//!   fail with `ContextOverflowAfterTrimming`

mod assembly;
mod deadline;
mod retry;
mod send;
mod trace;
mod types;


pub use assembly::assemble_request;
pub use send::SendPipeline;
pub use types::{AttemptOutcome, SendAttempt, SendPhase, SendReport, SendRequest};
