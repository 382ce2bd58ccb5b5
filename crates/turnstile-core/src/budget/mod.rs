//! Budget allocation for conversation history
//!
//! Admission is two-phase. [`BudgetAllocator::predict`] runs before the new
//! turn's exact size is known and reserves the user request allowance in its
//! place; [`BudgetAllocator::finalize`] then evicts the oldest predicted turns
//! until the real turn fits.
//!
//! # Example
//!
//! ```rust,ignore
//! use turnstile_core::budget::{BudgetAllocator, BudgetParameters};
//!
//! let allocator = BudgetAllocator::new(ProviderId::Anthropic);
//! let prediction = allocator.predict(&history, &params);
//! let finalized = allocator.finalize(&prediction, "next question", &[], &params)?;
//! ```

mod allocator;
mod cache;
mod params;
mod snapshot;

pub use allocator::{BudgetAllocator, Finalized, Prediction, TurnEstimate};
pub use cache::{BoundaryCache, CacheState, DirtyReason};
pub use params::BudgetParameters;
pub use snapshot::{BoundarySnapshot, BoundaryStats};
