//! Dependency discovery
//!
//! Finds the sub-models (contract functions) a property depends on. Only
//! these are unfolded; every other function is reduced to a control-flow
//! self-loop by the merge.

use log::{debug, warn};

use crate::error::Result;
use crate::net::STATE_SUB_MODEL;
use crate::parser::{PropertyRequest, Query, Statement, StatementIndex, StatementKind, TemplateInputs};
use crate::translator::{references, Reference, Template};

/// Ordered, duplicate-free set of retained sub-model names
///
/// Always starts with the `state` sub-model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetainedSet {
    names: Vec<String>,
}

impl Default for RetainedSet {
    fn default() -> Self {
        RetainedSet {
            names: vec![STATE_SUB_MODEL.to_string()],
        }
    }
}

impl RetainedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `name` unless present; returns whether it was added
    pub fn insert(&mut self, name: &str) -> bool {
        if name.is_empty() || self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.names
    }
}

/// Functions and variables a request mentions
fn mentioned(request: &PropertyRequest) -> Result<(Vec<String>, Vec<String>)> {
    let quoted = |text: &str| -> Result<(Vec<String>, Vec<String>)> {
        let mut functions = Vec::new();
        let mut variables = Vec::new();
        for reference in references(text)? {
            match reference {
                Reference::Function(name) => functions.push(name),
                Reference::Variable(name) => variables.push(name),
            }
        }
        Ok((functions, variables))
    };

    match request {
        PropertyRequest::General { .. } => Ok((request.function_inputs(), request.variable_inputs())),
        PropertyRequest::Formula { formula } => quoted(formula),
        PropertyRequest::Literal { property, .. } => quoted(property),
    }
}

/// Functions owning the statements a template reads its places from,
/// beyond the functions it names directly
fn evidence_owners<'i>(index: &'i StatementIndex, template: Template, inputs: &TemplateInputs) -> Vec<&'i str> {
    let calls = [StatementKind::FunctionCall];
    let rows: Vec<&Statement> = match template {
        Template::IsAlwaysCalled
        | Template::IsNeverCalled
        | Template::IsExecuted
        | Template::IsSequential
        | Template::AlwaysFollowedBy
        | Template::NeverFollowedBy => ["selected_function", "second_function"]
            .iter()
            .filter_map(|key| inputs.get(key))
            .flat_map(|function| index.query(&Query::kinds(&calls).calling(&function)))
            .collect(),
        Template::SelfDestruction => match inputs.get("rival_contract") {
            Some(rival) => index.query(&Query::kinds(&calls).in_contract(&rival)),
            None => Vec::new(),
        },
        Template::UninitializedStorageVariable if inputs.get("selected_function").is_none() => {
            match inputs.get("selected_variable") {
                Some(variable) => {
                    let target = [variable.clone()];
                    let reads = index
                        .query(&Query::kinds(&StatementKind::ALL[..]))
                        .into_iter()
                        .filter(|row| row.reads_any(&target));
                    let writes = index
                        .query(&Query::kinds(&StatementKind::WRITES[..]))
                        .into_iter()
                        .filter(|row| row.variable == variable);
                    reads.chain(writes).collect()
                }
                None => Vec::new(),
            }
        }
        _ => Vec::new(),
    };
    rows.iter().map(|row| row.parent.as_str()).collect()
}

/// Sub-models `request` depends on
///
/// Order: `state`, referenced functions, owners of the statements a
/// template draws its propositions from, functions declaring a referenced
/// local (statement-index order), then every function if a global is
/// referenced.
pub fn find_retained(index: &StatementIndex, request: &PropertyRequest) -> Result<RetainedSet> {
    let mut retained = RetainedSet::new();
    let (functions, variables) = mentioned(request)?;

    for function in &functions {
        if retained.insert(function) {
            debug!("retaining `{}`: referenced directly", function);
        }
    }

    if let PropertyRequest::General { template, inputs } = request {
        if let Some(template) = Template::from_name(template) {
            for owner in evidence_owners(index, template, inputs) {
                if retained.insert(owner) {
                    debug!("retaining `{}`: holds evidence for {}", owner, template);
                }
            }
        }
    }

    for function in &index.functions {
        let declares = variables
            .iter()
            .any(|v| function.local_variables.iter().any(|local| &local.name == v));
        if declares && retained.insert(&function.name) {
            debug!("retaining `{}`: declares a referenced local", function.name);
        }
    }

    if let Some(global) = variables.iter().find(|v| index.is_global(v)) {
        debug!("global `{}` referenced, retaining every function", global);
        for function in index.function_names() {
            retained.insert(function);
        }
    }

    for variable in &variables {
        if !index.is_global(variable) && index.owners_of(variable).is_empty() {
            warn!("variable `{}` is not declared in the statement index", variable);
        }
    }

    Ok(retained)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> StatementIndex {
        StatementIndex::from_json(
            r#"{"global_variables": [{"name": "total"}],
                "functions": [
                    {"name": "deposit", "local_variables": [{"name": "amt", "place": "deposit_amt"}]},
                    {"name": "withdraw", "local_variables": [{"name": "out", "place": "withdraw_out"}]},
                    {"name": "audit"}
                ]}"#,
        )
        .unwrap()
    }

    fn overflow(variable: &str) -> PropertyRequest {
        PropertyRequest::general(
            "Integer Overflow/Underflow",
            TemplateInputs::new()
                .with("selected_variable", variable)
                .with("min_threshold", "0")
                .with("max_threshold", "100"),
        )
    }

    #[test]
    fn test_local_variable_retains_its_owner() {
        let retained = find_retained(&index(), &overflow("amt")).unwrap();
        assert_eq!(retained.names(), ["state", "deposit"]);
    }

    #[test]
    fn test_global_variable_retains_everything() {
        let retained = find_retained(&index(), &overflow("total")).unwrap();
        assert_eq!(retained.names(), ["state", "deposit", "withdraw", "audit"]);
    }

    #[test]
    fn test_unknown_variable_retains_only_state() {
        let retained = find_retained(&index(), &overflow("ghost")).unwrap();
        assert_eq!(retained.names(), ["state"]);
    }

    #[test]
    fn test_function_inputs_are_retained_first() {
        let request = PropertyRequest::general(
            "AlwaysFollowedBy",
            TemplateInputs::new()
                .with("selected_function", "withdraw")
                .with("second_function", "audit"),
        );
        let retained = find_retained(&index(), &request).unwrap();
        assert_eq!(retained.names(), ["state", "withdraw", "audit"]);
    }

    #[test]
    fn test_formula_references() {
        let request = PropertyRequest::formula("[] ('audit.func' => 'out' > 'amt.var')");
        let retained = find_retained(&index(), &request).unwrap();
        assert_eq!(retained.names(), ["state", "audit", "deposit", "withdraw"]);
    }

    #[test]
    fn test_insert_deduplicates() {
        let mut set = RetainedSet::new();
        assert!(!set.insert("state"));
        assert!(set.insert("f"));
        assert!(!set.insert("f"));
        assert!(!set.insert(""));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_callers_of_called_functions_are_retained() {
        let index = StatementIndex::from_json(
            r#"{"global_variables": [],
                "functions": [{"name": "main"}, {"name": "withdraw"}, {"name": "audit"}],
                "statements": [
                    {"type": "function_call", "smart_contract": "Bank", "parent": "main",
                     "function": "withdraw", "input_place": "main_1", "output_place": "main_2"},
                    {"type": "function_call", "smart_contract": "Bank", "parent": "audit",
                     "function": "log", "input_place": "audit_1", "output_place": "audit_2"}
                ]}"#,
        )
        .unwrap();
        let request = PropertyRequest::general(
            "IsAlwaysCalled",
            TemplateInputs::new().with("selected_function", "withdraw"),
        );
        let retained = find_retained(&index, &request).unwrap();
        assert_eq!(retained.names(), ["state", "withdraw", "main"]);
    }
}
