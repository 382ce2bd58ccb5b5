//! Send telemetry
//!
//! The pipeline emits a fixed-shape [`TelemetryEvent`] at each transition:
//! `preflight` once before the first attempt, `attempt` before every provider
//! call, and exactly one terminal `success` or `error`. Delivery goes through
//! an injected [`TelemetrySink`]; the core depends on no transport.

mod events;
mod sinks;

pub use events::{BudgetNumbers, ErrorSummary, EventKind, SelectedTurn, TelemetryEvent};
pub use sinks::{ChannelSink, FnSink, RecordingSink, TelemetrySink};
