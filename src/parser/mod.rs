//! Input parsing
//!
//! This module contains:
//! - `lna`: Helena `.lna` net text into a `StructuredNet`
//! - `statements`: the statement index emitted by the contract translator
//! - `request`: property requests (template, formula or literal)
//! - `marking`: initial marking description

pub mod lna;
pub mod marking;
pub mod request;
pub mod statements;

pub use lna::{parse_net, LnaParser};
pub use marking::{BalancePolicy, ContractMarking, FunctionMarking, MarkingSpec, ValueRange};
pub use request::{PropertyRequest, TemplateInputs};
pub use statements::{
    FunctionInfo, GlobalVariable, LocalVariable, Query, Statement, StatementIndex, StatementKind,
};
