//! Net model
//!
//! In-memory Colored Petri Net in the Helena dialect: nodes, the structured
//! net container and the naming conventions shared by the compiler and the
//! unfolder.

pub mod node;
pub mod structured;

pub use node::{
    Arc, Color, Comment, Component, Constant, Function, Node, Param, Parameter, Place, Transition,
    BANNER_MARKER,
};
pub use structured::{Section, StructuredNet, SECTION_ORDER};

/// Place holding the global contract state
pub const STATE_PLACE: &str = "S";

/// Sub-model name of the global state
pub const STATE_SUB_MODEL: &str = "state";

/// Control-flow place of a sub-model: `<name>_cflow`
pub fn cflow_place(sub_model: &str) -> String {
    format!("{}_cflow", sub_model)
}

/// Parameter place of a function: `P_<name>`
pub fn parameter_place(function: &str) -> String {
    format!("P_{}", function)
}
