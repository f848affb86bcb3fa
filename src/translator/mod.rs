//! Property translation
//!
//! This module contains:
//! - `template`: the closed catalogue of named templates
//! - `property`: template schemas and proposition discovery
//! - `formula`: shunting-yard compilation of literal formulas

pub mod formula;
pub mod property;
pub mod template;

pub use formula::{compile_formula, references, Reference};
pub use property::{CompiledProperty, PropertyCompiler, Propositions};
pub use template::Template;

use crate::error::Result;
use crate::parser::{PropertyRequest, StatementIndex};

/// Compile `request` against `index`
pub fn translate(index: &StatementIndex, request: &PropertyRequest) -> Result<CompiledProperty> {
    PropertyCompiler::new(index).compile(request)
}
