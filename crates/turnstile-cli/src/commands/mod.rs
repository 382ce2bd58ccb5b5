//! CLI commands

pub mod estimate;
pub mod models;
pub mod plan;
