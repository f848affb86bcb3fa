//! CLI module for cpn-unfold
//!
//! Handles input loading, output files and run summaries

pub mod inputs;
pub mod output;

pub use inputs::*;
pub use output::*;
