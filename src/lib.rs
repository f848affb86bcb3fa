//! # cpn-unfolder
//!
//! Unfolds the Colored Petri Net of a smart contract for one property and
//! compiles that property to LTL, producing Helena (`.lna`) input.
//!
//! This crate provides:
//! - `net`: the structured net model and its deterministic rendering
//! - `parser`: LNA text, statement index, property request and marking inputs
//! - `translator`: vulnerability templates and literal formulas to LTL plus propositions
//! - `unfolder`: dependency pruning, initial marking and the context merge
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cpn_unfolder::{parse_net, unfold, Context, MarkingSpec, PropertyRequest, StatementIndex, UnfoldInputs};
//! use rand::SeedableRng;
//!
//! # fn main() -> cpn_unfolder::Result<()> {
//! let contract = parse_net(&std::fs::read_to_string("Bank.lna").unwrap())?;
//! let index = StatementIndex::from_json(&std::fs::read_to_string("Bank.json").unwrap())?;
//! let request = PropertyRequest::from_json(r#"{"type": "specific", "formula": "[] 'total' > 0"}"#)?;
//! let marking = MarkingSpec::from_json(r#"{"NumberOfUser": 2, "balance": {"type": "fixed", "fixed": 10}}"#)?;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(0);
//! let inputs = UnfoldInputs { index: &index, request: &request, marking: &marking, contract };
//! let unfolded = unfold(inputs, &Context::Free, &mut rng)?;
//! println!("{}\n{}", unfolded.net, unfolded.property);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod net;
pub mod parser;
pub mod translator;
pub mod unfolder;

pub use error::{Error, Result};
pub use net::{Section, StructuredNet};
pub use parser::{parse_net, MarkingSpec, PropertyRequest, StatementIndex, TemplateInputs};
pub use translator::{translate, CompiledProperty, Template};
pub use unfolder::{unfold, Context, ContextKind, RetainedSet, UnfoldInputs, Unfolded};
