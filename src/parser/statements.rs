//! Statement index
//!
//! Program-point metadata emitted by the contract translator: global and
//! local variables, and one row per instrumented statement. The rows are
//! kept in input order and indexed by statement kind; all queries return
//! rows in input order so "first match" and "first-seen" semantics survive.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::net::STATE_PLACE;

/// The nine statement kinds of the instrumented control flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Assignment,
    Sending,
    Selection,
    FunctionCall,
    VariableDeclaration,
    Return,
    Require,
    ForLoop,
    WhileLoop,
}

impl StatementKind {
    pub const ALL: [StatementKind; 9] = [
        StatementKind::Assignment,
        StatementKind::Sending,
        StatementKind::Selection,
        StatementKind::FunctionCall,
        StatementKind::VariableDeclaration,
        StatementKind::Return,
        StatementKind::Require,
        StatementKind::ForLoop,
        StatementKind::WhileLoop,
    ];

    /// Kinds that test a condition before branching
    pub const TESTS: [StatementKind; 4] = [
        StatementKind::Selection,
        StatementKind::Require,
        StatementKind::ForLoop,
        StatementKind::WhileLoop,
    ];

    /// Kinds that write `variable`
    pub const WRITES: [StatementKind; 2] =
        [StatementKind::Assignment, StatementKind::VariableDeclaration];
}

/// One instrumented statement
#[derive(Debug, Clone, Deserialize)]
pub struct Statement {
    #[serde(rename = "type")]
    pub kind: StatementKind,
    #[serde(default)]
    pub smart_contract: String,
    /// Owning function
    #[serde(default)]
    pub parent: String,
    /// Written variable
    #[serde(default)]
    pub variable: String,
    /// Called function
    #[serde(default)]
    pub function: String,
    /// Program point before the statement
    #[serde(default)]
    pub input_place: String,
    /// Program point after the statement
    #[serde(default)]
    pub output_place: String,
    #[serde(default)]
    pub param_place: String,
    #[serde(default)]
    pub right_hand_variables: Vec<String>,
    #[serde(default)]
    pub timestamp: bool,
}

impl Statement {
    /// Whether the right-hand side reads any of `variables`
    pub fn reads_any(&self, variables: &[String]) -> bool {
        self.right_hand_variables.iter().any(|v| variables.contains(v))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GlobalVariable {
    pub name: String,
    #[serde(default, alias = "placeType")]
    pub place_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalVariable {
    pub name: String,
    pub place: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    #[serde(default, alias = "localVariables")]
    pub local_variables: Vec<LocalVariable>,
}

#[derive(Debug, Deserialize)]
struct RawIndex {
    #[serde(alias = "globalVariables")]
    global_variables: Vec<GlobalVariable>,
    functions: Vec<FunctionInfo>,
    #[serde(default)]
    statements: Vec<Statement>,
}

/// Row filter for `StatementIndex::query`
#[derive(Debug, Clone, Copy, Default)]
pub struct Query<'q> {
    pub kinds: &'q [StatementKind],
    pub parent: Option<&'q str>,
    pub contract: Option<&'q str>,
    pub function: Option<&'q str>,
}

impl<'q> Query<'q> {
    pub fn kinds(kinds: &'q [StatementKind]) -> Self {
        Query {
            kinds,
            ..Default::default()
        }
    }

    /// Restrict to rows owned by function `parent`
    pub fn in_function(mut self, parent: &'q str) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Restrict to rows of contract `contract`; an empty name does not filter
    pub fn in_contract(mut self, contract: &'q str) -> Self {
        if !contract.is_empty() {
            self.contract = Some(contract);
        }
        self
    }

    /// Restrict to calls of `function`
    pub fn calling(mut self, function: &'q str) -> Self {
        self.function = Some(function);
        self
    }

    fn matches(&self, statement: &Statement) -> bool {
        self.parent.map_or(true, |p| statement.parent == p)
            && self.contract.map_or(true, |c| statement.smart_contract == c)
            && self.function.map_or(true, |f| statement.function == f)
    }
}

/// Statement table plus variable declarations
#[derive(Debug, Clone)]
pub struct StatementIndex {
    pub global_variables: Vec<GlobalVariable>,
    pub functions: Vec<FunctionInfo>,
    statements: Vec<Statement>,
    by_kind: HashMap<StatementKind, Vec<usize>>,
}

impl StatementIndex {
    pub fn new(
        global_variables: Vec<GlobalVariable>,
        functions: Vec<FunctionInfo>,
        statements: Vec<Statement>,
    ) -> Self {
        let mut by_kind: HashMap<StatementKind, Vec<usize>> = HashMap::new();
        for (i, statement) in statements.iter().enumerate() {
            by_kind.entry(statement.kind).or_default().push(i);
        }
        StatementIndex {
            global_variables,
            functions,
            statements,
            by_kind,
        }
    }

    /// Decode the translator's JSON
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawIndex = Error::from_json(text, "statement index")?;
        Ok(Self::new(raw.global_variables, raw.functions, raw.statements))
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn is_global(&self, variable: &str) -> bool {
        self.global_variables.iter().any(|g| g.name == variable)
    }

    /// Places declared for local `variable`, deduplicated in first-seen order
    pub fn local_places(&self, variable: &str) -> Vec<String> {
        let places = self
            .functions
            .iter()
            .flat_map(|f| f.local_variables.iter())
            .filter(|local| local.name == variable)
            .map(|local| local.place.as_str());
        unique(places)
    }

    /// Places holding `variable`: the state place for a global, the declared
    /// places for a local, nothing for an unknown name
    pub fn variable_places(&self, variable: &str) -> Vec<String> {
        if self.is_global(variable) {
            vec![STATE_PLACE.to_string()]
        } else {
            self.local_places(variable)
        }
    }

    /// Functions declaring a local named `variable`, in declaration order
    pub fn owners_of(&self, variable: &str) -> Vec<&str> {
        self.functions
            .iter()
            .filter(|f| f.local_variables.iter().any(|l| l.name == variable))
            .map(|f| f.name.as_str())
            .collect()
    }

    pub fn function_names(&self) -> Vec<&str> {
        self.functions.iter().map(|f| f.name.as_str()).collect()
    }

    /// Rows matching `query`, in input order
    pub fn query<'s>(&'s self, query: &Query<'_>) -> Vec<&'s Statement> {
        let mut rows: Vec<usize> = query
            .kinds
            .iter()
            .filter_map(|kind| self.by_kind.get(kind))
            .flatten()
            .copied()
            .collect();
        rows.sort_unstable();
        rows.dedup();
        rows.into_iter()
            .filter_map(|i| self.statements.get(i))
            .filter(|s| query.matches(s))
            .collect()
    }

    /// Close `seed` under assignments and declarations: a variable written
    /// from any variable of the set joins the set. Only rows of `contract`
    /// are followed when it is non-empty.
    pub fn alias_closure(&self, seed: Vec<String>, contract: &str) -> Vec<String> {
        let writes = self.query(&Query::kinds(&StatementKind::WRITES).in_contract(contract));
        let mut aliases = seed;
        loop {
            let mut grew = false;
            for row in &writes {
                if !row.variable.is_empty()
                    && !aliases.contains(&row.variable)
                    && row.reads_any(&aliases)
                {
                    aliases.push(row.variable.clone());
                    grew = true;
                }
            }
            if !grew {
                return aliases;
            }
        }
    }
}

/// Deduplicate non-empty names preserving first-seen order
pub fn unique<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();
    for name in names {
        if !name.is_empty() && !result.iter().any(|n| n == name) {
            result.push(name.to_string());
        }
    }
    result
}

/// Distinct `input_place`s of `rows`
pub fn input_places(rows: &[&Statement]) -> Vec<String> {
    unique(rows.iter().map(|s| s.input_place.as_str()))
}

/// Distinct `output_place`s of `rows`
pub fn output_places(rows: &[&Statement]) -> Vec<String> {
    unique(rows.iter().map(|s| s.output_place.as_str()))
}
