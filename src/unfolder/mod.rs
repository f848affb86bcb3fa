//! Unfolding
//!
//! This module contains:
//! - `dependency`: which sub-models a property depends on
//! - `marking`: initial marking synthesis
//! - `merge`: contract/context merge and control-flow wiring
//!
//! `unfold` runs the three steps in order and compiles the property.

pub mod dependency;
pub mod marking;
pub mod merge;

pub use dependency::{find_retained, RetainedSet};
pub use marking::{apply_marking, parameter_init};
pub use merge::{complete_control_flow, merge_free, merge_with_context};

use std::fmt;
use std::str::FromStr;

use log::info;
use rand::Rng;

use crate::error::Result;
use crate::net::{Comment, StructuredNet};
use crate::parser::{MarkingSpec, PropertyRequest, StatementIndex};
use crate::translator::translate;

/// Kind of behavioral context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    /// DCR graph, already translated to LNA
    Dcr,
    Cpn,
    /// No context: every function may be called at any time
    Free,
}

impl ContextKind {
    /// Whether a context net file must be supplied
    pub fn needs_net(self) -> bool {
        !matches!(self, ContextKind::Free)
    }
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContextKind::Dcr => "DCR",
            ContextKind::Cpn => "CPN",
            ContextKind::Free => "FREE",
        };
        f.write_str(name)
    }
}

impl FromStr for ContextKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DCR" => Ok(ContextKind::Dcr),
            "CPN" => Ok(ContextKind::Cpn),
            "FREE" => Ok(ContextKind::Free),
            _ => Err(format!("Unknown context type: {}. Expected: DCR, CPN, FREE", s)),
        }
    }
}

/// Context the contract is merged with
#[derive(Debug, Clone)]
pub enum Context {
    Net { kind: ContextKind, net: StructuredNet },
    Free,
}

impl Context {
    pub fn kind(&self) -> ContextKind {
        match self {
            Context::Net { kind, .. } => *kind,
            Context::Free => ContextKind::Free,
        }
    }
}

/// Everything one unfolding run reads
#[derive(Debug)]
pub struct UnfoldInputs<'a> {
    pub index: &'a StatementIndex,
    pub request: &'a PropertyRequest,
    pub marking: &'a MarkingSpec,
    pub contract: StructuredNet,
}

/// Result of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unfolded {
    /// Rendered merged net, propositions included
    pub net: String,
    /// `ltl property` declaration
    pub property: String,
    pub retained: Vec<String>,
}

/// Unfold the contract against `context` for the requested property
///
/// Nothing is produced unless every step succeeds; an unsupported template
/// or a bad marking value aborts the run.
pub fn unfold<R: Rng + ?Sized>(inputs: UnfoldInputs<'_>, context: &Context, rng: &mut R) -> Result<Unfolded> {
    let UnfoldInputs {
        index,
        request,
        marking,
        mut contract,
    } = inputs;

    let retained = find_retained(index, request)?;
    info!("retained sub-models: {}", retained.names().join(", "));

    apply_marking(&mut contract, marking, &retained, rng)?;

    let mut merged = match context {
        Context::Net { kind, net } => {
            info!("merging `{}` with {} context `{}`", contract.name, kind, net.name);
            merge_with_context(net, &contract, &retained)
        }
        Context::Free => {
            info!("merging `{}` without context", contract.name);
            merge_free(&contract, &retained)
        }
    };

    let compiled = translate(index, request)?;
    merged.add_transition(Comment::new(compiled.propositions));

    Ok(Unfolded {
        net: merged.render(),
        property: compiled.property,
        retained: retained.into_vec(),
    })
}
