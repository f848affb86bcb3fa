//! Property compiler
//!
//! Maps a property request onto an LTL property plus the propositions it
//! refers to. Each template has a fixed schema; the places the propositions
//! talk about are discovered in the statement index. When the evidence a
//! schema needs is absent, the template's degenerate branch is emitted
//! instead (`true` or `false`, no propositions), never an empty disjunction.

use log::{debug, warn};

use super::formula;
use super::template::Template;
use crate::error::{Error, Result};
use crate::parser::statements::{input_places, output_places, unique};
use crate::parser::{PropertyRequest, Query, StatementIndex, StatementKind, TemplateInputs};

/// Variables that denote the contract balance before alias closure
pub const BALANCE_ALIASES: [&str; 3] = ["balance", "this.balance", "address(this).balance"];

/// Functions that destroy a contract
const SELFDESTRUCT_CALLS: [&str; 2] = ["selfdestruct", "suicide"];

/// Output of the property step
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompiledProperty {
    pub property: String,
    pub propositions: String,
}

impl CompiledProperty {
    pub fn new(property: impl Into<String>, propositions: impl Into<String>) -> Self {
        CompiledProperty {
            property: property.into(),
            propositions: propositions.into(),
        }
    }

    /// Holds on every run
    pub fn vacuous() -> Self {
        CompiledProperty::new("true", "")
    }

    /// Fails on every run
    pub fn falsified() -> Self {
        CompiledProperty::new("false", "")
    }
}

/// `ltl property NAME: FORMULA;`
pub fn ltl(name: &str, formula: &str) -> String {
    format!("ltl property {}: {};", name, formula)
}

/// Proposition expression for "control reached `place`"
pub fn marked(place: &str) -> String {
    format!("{}'card > 0", place)
}

/// Proposition declarations in declaration order, each name declared once
#[derive(Debug, Clone, Default)]
pub struct Propositions {
    names: Vec<String>,
    lines: Vec<String>,
}

impl Propositions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `name` unless already declared; returns the name
    pub fn declare(&mut self, name: &str, expression: &str) -> String {
        if !self.names.iter().any(|n| n == name) {
            self.names.push(name.to_string());
            self.lines.push(format!("proposition {}: {};", name, expression));
        }
        name.to_string()
    }

    /// One proposition `<prefix>_<place>` per place; returns the disjunction
    /// referencing them
    pub fn group<F>(&mut self, prefix: &str, places: &[String], expression: F) -> String
    where
        F: Fn(&str) -> String,
    {
        let names: Vec<String> = places
            .iter()
            .map(|place| self.declare(&format!("{}_{}", prefix, place), &expression(place)))
            .collect();
        match names.as_slice() {
            [single] => single.clone(),
            _ => format!("({})", names.join(" or ")),
        }
    }

    /// Group of "place is marked" propositions
    pub fn marked_group(&mut self, prefix: &str, places: &[String]) -> String {
        self.group(prefix, places, marked)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

/// Right operand of a relational template
enum RightOperand {
    Variable(String),
    Constant(String),
}

/// Compiles requests against one statement index
pub struct PropertyCompiler<'a> {
    index: &'a StatementIndex,
}

impl<'a> PropertyCompiler<'a> {
    pub fn new(index: &'a StatementIndex) -> Self {
        PropertyCompiler { index }
    }

    /// Compile `request` into `{property, propositions}`
    pub fn compile(&self, request: &PropertyRequest) -> Result<CompiledProperty> {
        match request {
            PropertyRequest::General { template, inputs } => {
                let resolved = Template::from_name(template).ok_or_else(|| Error::UnsupportedTemplate {
                    name: template.clone(),
                })?;
                debug!("compiling template {} (requested as `{}`)", resolved, template);
                self.compile_template(resolved, inputs)
            }
            PropertyRequest::Formula { formula } => Ok(formula::compile_formula(self.index, formula)),
            PropertyRequest::Literal {
                property,
                propositions,
            } => Ok(CompiledProperty::new(property.clone(), propositions.clone())),
        }
    }

    pub fn compile_template(&self, template: Template, inputs: &TemplateInputs) -> Result<CompiledProperty> {
        match template {
            Template::IntegerOverflowUnderflow => self.integer_overflow(template, inputs),
            Template::AlwaysLessThan => self.relation(template, inputs, ">", "more", "smaller"),
            Template::AlwaysMoreThan => self.relation(template, inputs, "<", "less", "bigger"),
            Template::AlwaysEqual => self.relation(template, inputs, "!=", "different", "equals"),
            Template::SelfDestruction => self.self_destruction(template, inputs),
            Template::Reentrancy => self.reentrancy(template, inputs),
            Template::TimestampDependence => self.timestamp_dependence(template, inputs),
            Template::UninitializedStorageVariable => self.uninitialized_storage(template, inputs),
            Template::SkipEmptyStringLiteral => self.skip_empty_string(template, inputs),
            Template::IsAlwaysCalled
            | Template::IsNeverCalled
            | Template::IsExecuted => self.call_occurrence(template, inputs),
            Template::IsSequential | Template::AlwaysFollowedBy | Template::NeverFollowedBy => {
                self.call_order(template, inputs)
            }
        }
    }

    fn known_variable_places(&self, template: Template, variable: &str) -> Option<Vec<String>> {
        let places = self.index.variable_places(variable);
        if places.is_empty() {
            warn!("{}: variable `{}` is not declared in the statement index", template, variable);
            None
        } else {
            Some(places)
        }
    }

    fn integer_overflow(&self, template: Template, inputs: &TemplateInputs) -> Result<CompiledProperty> {
        let name = template.to_string();
        let variable = inputs.require("selected_variable", &name)?;
        let min = inputs.require("min_threshold", &name)?;
        let max = inputs.require("max_threshold", &name)?;

        let Some(places) = self.known_variable_places(template, &variable) else {
            return Ok(CompiledProperty::vacuous());
        };

        let clauses: Vec<String> = places
            .iter()
            .map(|place| {
                format!(
                    "exists (t in {place} | (t->1).{v} < {min}) or exists (t in {place} | (t->1).{v} > {max})",
                    place = place,
                    v = variable,
                    min = min,
                    max = max
                )
            })
            .collect();

        Ok(CompiledProperty::new(
            "ltl property outOfRange: [] ( not OUFlow ) ;",
            format!("proposition OUFlow: {};", clauses.join(" or ")),
        ))
    }

    /// `always not (v OP rhs)`; `op` is the violating comparison
    fn relation(
        &self,
        template: Template,
        inputs: &TemplateInputs,
        op: &str,
        proposition: &str,
        property: &str,
    ) -> Result<CompiledProperty> {
        let name = template.to_string();
        let variable = inputs.require("selected_variable", &name)?;
        let right = match (inputs.get("second_variable"), inputs.get("constant")) {
            (Some(second), _) => RightOperand::Variable(second),
            (None, Some(constant)) => RightOperand::Constant(constant),
            (None, None) => return Err(Error::missing("constant", format!("inputs of template `{}`", name))),
        };

        let Some(left_places) = self.known_variable_places(template, &variable) else {
            return Ok(CompiledProperty::vacuous());
        };

        let mut clauses = Vec::new();
        match right {
            RightOperand::Constant(constant) => {
                for place in &left_places {
                    clauses.push(format!(
                        "exists (t in {} | (t->1).{} {} {})",
                        place, variable, op, constant
                    ));
                }
            }
            RightOperand::Variable(second) => {
                let Some(right_places) = self.known_variable_places(template, &second) else {
                    return Ok(CompiledProperty::vacuous());
                };
                for place in &left_places {
                    for other in &right_places {
                        if place == other {
                            clauses.push(format!(
                                "exists (t in {} | (t->1).{} {} (t->1).{})",
                                place, variable, op, second
                            ));
                        } else {
                            clauses.push(format!(
                                "exists (t in {} | exists (u in {} | (t->1).{} {} (u->1).{}))",
                                place, other, variable, op, second
                            ));
                        }
                    }
                }
            }
        }

        Ok(CompiledProperty::new(
            ltl(property, &format!("[] not {}", proposition)),
            format!("proposition {}: {};", proposition, clauses.join(" or ")),
        ))
    }

    fn self_destruction(&self, template: Template, inputs: &TemplateInputs) -> Result<CompiledProperty> {
        let name = template.to_string();
        let function = inputs.require("selected_function", &name)?;
        let contract = inputs.require("smart_contract", &name)?;
        let rival = inputs.get("rival_contract");

        let aliases = self.index.alias_closure(balance_seed(), &contract);
        let tests = self.index.query(
            &Query::kinds(&StatementKind::TESTS)
                .in_function(&function)
                .in_contract(&contract),
        );
        let tests: Vec<_> = tests.into_iter().filter(|row| row.reads_any(&aliases)).collect();
        let test_places = output_places(&tests);
        if test_places.is_empty() {
            debug!("{}: `{}` never tests the balance", template, function);
            return Ok(CompiledProperty::vacuous());
        }

        let mut propositions = Propositions::new();
        let Some(rival) = rival else {
            let test = propositions.marked_group("test", &test_places);
            return Ok(CompiledProperty::new(
                ltl("selfDestruction", &format!("[] not {}", test)),
                propositions.render(),
            ));
        };

        let rival_calls = self
            .index
            .query(&Query::kinds(&[StatementKind::FunctionCall]).in_contract(&rival));
        let destroys: Vec<_> = rival_calls
            .iter()
            .copied()
            .filter(|row| SELFDESTRUCT_CALLS.contains(&row.function.as_str()))
            .collect();
        let starts: Vec<_> = rival_calls
            .iter()
            .copied()
            .filter(|row| row.function == function)
            .collect();
        let destroy_places = output_places(&destroys);
        let start_places = input_places(&starts);
        if destroy_places.is_empty() || start_places.is_empty() {
            debug!(
                "{}: rival `{}` cannot destroy itself before calling `{}`",
                template, rival, function
            );
            return Ok(CompiledProperty::vacuous());
        }

        let test = propositions.marked_group("test", &test_places);
        let destroy = propositions.marked_group("selfdestruct", &destroy_places);
        let start = propositions.marked_group("start", &start_places);
        Ok(CompiledProperty::new(
            ltl(
                "selfDestruction",
                &format!("[] ( not {} ) or not ( {} until {} )", test, destroy, start),
            ),
            propositions.render(),
        ))
    }

    fn reentrancy(&self, template: Template, inputs: &TemplateInputs) -> Result<CompiledProperty> {
        let function = inputs.require("selected_function", &template.to_string())?;
        let seed = match inputs.get("selected_variable") {
            Some(variable) => vec![variable],
            None => balance_seed(),
        };

        let sends = self
            .index
            .query(&Query::kinds(&[StatementKind::Sending]).in_function(&function));
        let send_places = output_places(&sends);
        if send_places.is_empty() {
            debug!("{}: `{}` sends nothing", template, function);
            return Ok(CompiledProperty::vacuous());
        }

        let aliases = self.index.alias_closure(seed, "");
        let writes: Vec<_> = self
            .index
            .query(&Query::kinds(&StatementKind::WRITES).in_function(&function))
            .into_iter()
            .filter(|row| aliases.contains(&row.variable))
            .collect();
        let write_places = output_places(&writes);

        let mut propositions = Propositions::new();
        let send = propositions.marked_group("send", &send_places);
        let formula = if write_places.is_empty() {
            format!("[] not {}", send)
        } else {
            let write = propositions.marked_group("write", &write_places);
            format!("[] not ( ( not {} ) until {} )", write, send)
        };
        Ok(CompiledProperty::new(ltl("reentrancy", &formula), propositions.render()))
    }

    fn timestamp_dependence(&self, template: Template, inputs: &TemplateInputs) -> Result<CompiledProperty> {
        let function = inputs.require("selected_function", &template.to_string())?;
        let contract = inputs.get("smart_contract").unwrap_or_default();

        let rows: Vec<_> = self
            .index
            .query(
                &Query::kinds(&StatementKind::ALL)
                    .in_function(&function)
                    .in_contract(&contract),
            )
            .into_iter()
            .filter(|row| row.timestamp)
            .collect();
        let places = output_places(&rows);
        if places.is_empty() {
            debug!("{}: `{}` never reads the block timestamp", template, function);
            return Ok(CompiledProperty::vacuous());
        }

        let mut propositions = Propositions::new();
        let timestamp = propositions.marked_group("timestamp", &places);
        Ok(CompiledProperty::new(
            ltl("timestampDependence", &format!("[] not {}", timestamp)),
            propositions.render(),
        ))
    }

    fn uninitialized_storage(&self, template: Template, inputs: &TemplateInputs) -> Result<CompiledProperty> {
        let variable = inputs.require("selected_variable", &template.to_string())?;
        let function = inputs.get("selected_function");
        let scoped = |kinds: &'static [StatementKind]| {
            let query = Query::kinds(kinds);
            match &function {
                Some(f) => self.index.query(&query.in_function(f)),
                None => self.index.query(&query),
            }
        };

        let target = [variable.clone()];
        let reads: Vec<_> = scoped(&StatementKind::ALL[..])
            .into_iter()
            .filter(|row| row.reads_any(&target))
            .collect();
        let writes: Vec<_> = scoped(&StatementKind::WRITES[..])
            .into_iter()
            .filter(|row| row.variable == variable)
            .collect();

        let read_places = output_places(&reads);
        let write_places = output_places(&writes);
        if read_places.is_empty() {
            debug!("{}: `{}` is never read", template, variable);
            return Ok(CompiledProperty::vacuous());
        }
        if write_places.is_empty() {
            debug!("{}: `{}` is read but never written", template, variable);
            return Ok(CompiledProperty::falsified());
        }

        let mut propositions = Propositions::new();
        let read = propositions.marked_group("read", &read_places);
        let write = propositions.marked_group("write", &write_places);
        Ok(CompiledProperty::new(
            ltl("uninitialized", &format!("not ( {} until {} )", read, write)),
            propositions.render(),
        ))
    }

    fn skip_empty_string(&self, template: Template, inputs: &TemplateInputs) -> Result<CompiledProperty> {
        let function = inputs.require("selected_function", &template.to_string())?;
        let calls = self
            .index
            .query(&Query::kinds(&[StatementKind::FunctionCall]).in_function(&function));
        let params = unique(calls.iter().map(|row| row.param_place.as_str()));
        if params.is_empty() {
            debug!("{}: `{}` passes no parameters", template, function);
            return Ok(CompiledProperty::vacuous());
        }

        let mut propositions = Propositions::new();
        let empty = propositions.group("emptyparam", &params, |place| {
            format!(
                "exists (t in {} | ((t->1)'space > 0) and ((t->1)'last'card > 0))",
                place
            )
        });
        Ok(CompiledProperty::new(
            ltl("skipEmpty", &format!("[] not {}", empty)),
            propositions.render(),
        ))
    }

    /// Program points before (`called`) and after (`returned`) each call of `function`
    fn call_sites(&self, function: &str) -> (Vec<String>, Vec<String>) {
        let calls = self
            .index
            .query(&Query::kinds(&[StatementKind::FunctionCall]).calling(function));
        (input_places(&calls), output_places(&calls))
    }

    fn call_occurrence(&self, template: Template, inputs: &TemplateInputs) -> Result<CompiledProperty> {
        let function = inputs.require("selected_function", &template.to_string())?;
        let (called, returned) = self.call_sites(&function);
        if called.is_empty() {
            debug!("{}: `{}` is never called", template, function);
            return Ok(match template {
                Template::IsAlwaysCalled => CompiledProperty::falsified(),
                _ => CompiledProperty::vacuous(),
            });
        }

        let mut propositions = Propositions::new();
        let call = propositions.marked_group(&format!("{}_called", function), &called);
        let property = match template {
            Template::IsAlwaysCalled => ltl("alwaysCalled", &format!("<> {}", call)),
            Template::IsNeverCalled => ltl("neverCalled", &format!("[] not {}", call)),
            _ => {
                if returned.is_empty() {
                    warn!("{}: calls of `{}` have no return point", template, function);
                    return Ok(CompiledProperty::vacuous());
                }
                let ret = propositions.marked_group(&format!("{}_returned", function), &returned);
                ltl("executed", &format!("[] ({} => <> {})", call, ret))
            }
        };
        Ok(CompiledProperty::new(property, propositions.render()))
    }

    fn call_order(&self, template: Template, inputs: &TemplateInputs) -> Result<CompiledProperty> {
        let name = template.to_string();
        let first = inputs.require("selected_function", &name)?;
        let second = inputs.require("second_function", &name)?;
        let (first_called, first_returned) = self.call_sites(&first);
        let (second_called, _) = self.call_sites(&second);

        let mut propositions = Propositions::new();
        let property = match template {
            // the second function never starts before the first returned
            Template::IsSequential => {
                if second_called.is_empty() {
                    return Ok(CompiledProperty::vacuous());
                }
                let b = propositions.marked_group(&format!("{}_called", second), &second_called);
                if first_returned.is_empty() {
                    ltl("sequential", &format!("[] not {}", b))
                } else {
                    let a = propositions.marked_group(&format!("{}_returned", first), &first_returned);
                    ltl("sequential", &format!("[] not ( ( not {} ) until {} )", a, b))
                }
            }
            Template::AlwaysFollowedBy => {
                if first_called.is_empty() {
                    return Ok(CompiledProperty::vacuous());
                }
                let a = propositions.marked_group(&format!("{}_called", first), &first_called);
                if second_called.is_empty() {
                    ltl("followedBy", &format!("[] not {}", a))
                } else {
                    let b = propositions.marked_group(&format!("{}_called", second), &second_called);
                    ltl("followedBy", &format!("[] ({} => <> {})", a, b))
                }
            }
            _ => {
                if first_called.is_empty() || second_called.is_empty() {
                    return Ok(CompiledProperty::vacuous());
                }
                let a = propositions.marked_group(&format!("{}_called", first), &first_called);
                let b = propositions.marked_group(&format!("{}_called", second), &second_called);
                ltl("neverFollowedBy", &format!("[] ({} => [] not {})", a, b))
            }
        };
        Ok(CompiledProperty::new(property, propositions.render()))
    }
}

fn balance_seed() -> Vec<String> {
    BALANCE_ALIASES.iter().map(|alias| alias.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> StatementIndex {
        StatementIndex::from_json(
            r#"{
            "global_variables": [{"name": "total"}, {"name": "cap"}],
            "functions": [
                {"name": "deposit", "local_variables": [{"name": "amt", "place": "deposit_amt"}]},
                {"name": "withdraw", "local_variables": [{"name": "out", "place": "withdraw_out"}]},
                {"name": "pay", "local_variables": [{"name": "fee", "place": "deposit_amt"}]}
            ],
            "statements": [
                {"type": "assignment", "smart_contract": "Bank", "parent": "withdraw",
                 "variable": "bal", "right_hand_variables": ["this.balance"], "output_place": "w1"},
                {"type": "require", "smart_contract": "Bank", "parent": "withdraw",
                 "right_hand_variables": ["bal"], "input_place": "w1", "output_place": "w2"},
                {"type": "sending", "smart_contract": "Bank", "parent": "withdraw",
                 "input_place": "w2", "output_place": "w3", "timestamp": true},
                {"type": "assignment", "smart_contract": "Bank", "parent": "withdraw",
                 "variable": "balance", "right_hand_variables": ["out"], "output_place": "w4"},
                {"type": "function_call", "smart_contract": "Bank", "parent": "deposit",
                 "function": "log", "input_place": "d1", "output_place": "d2", "param_place": "log_PAR"},
                {"type": "function_call", "smart_contract": "Rival", "parent": "attack",
                 "function": "withdraw", "input_place": "r1", "output_place": "r2"},
                {"type": "function_call", "smart_contract": "Rival", "parent": "attack",
                 "function": "selfdestruct", "input_place": "r3", "output_place": "r4"},
                {"type": "function_call", "smart_contract": "Rival", "parent": "attack",
                 "function": "deposit", "input_place": "r5", "output_place": "r6"}
            ]}"#,
        )
        .unwrap()
    }

    fn general(template: &str, inputs: TemplateInputs) -> Result<CompiledProperty> {
        let index = index();
        PropertyCompiler::new(&index).compile(&PropertyRequest::general(template, inputs))
    }

    #[test]
    fn test_integer_overflow_local_and_global() {
        let local = general(
            "Integer Overflow/Underflow",
            TemplateInputs::new()
                .with("selected_variable", "amt")
                .with("min_threshold", "0")
                .with("max_threshold", 100),
        )
        .unwrap();
        assert_eq!(local.property, "ltl property outOfRange: [] ( not OUFlow ) ;");
        assert_eq!(
            local.propositions,
            "proposition OUFlow: exists (t in deposit_amt | (t->1).amt < 0) or exists (t in deposit_amt | (t->1).amt > 100);"
        );

        let global = general(
            "under_over_flow",
            TemplateInputs::new()
                .with("selected_variable", "total")
                .with("min_threshold", "1")
                .with("max_threshold", "9"),
        )
        .unwrap();
        assert!(global.propositions.contains("exists (t in S | (t->1).total < 1)"));
    }

    #[test]
    fn test_unknown_template_is_an_error() {
        let err = general("Buffer Overflow", TemplateInputs::new()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedTemplate { ref name } if name == "Buffer Overflow"));
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let err = general("Reentrancy", TemplateInputs::new()).unwrap_err();
        assert!(matches!(err, Error::MissingField { ref field, .. } if field == "selected_function"));
        let err = general("AlwaysLessThan", TemplateInputs::new().with("selected_variable", "amt"))
            .unwrap_err();
        assert!(matches!(err, Error::MissingField { .. }));
    }

    #[test]
    fn test_unknown_variable_is_vacuous() {
        let result = general(
            "AlwaysEqual",
            TemplateInputs::new()
                .with("selected_variable", "ghost")
                .with("constant", "1"),
        )
        .unwrap();
        assert_eq!(result, CompiledProperty::vacuous());
    }

    #[test]
    fn test_relational_placements() {
        let with_constant = general(
            "IsConstant",
            TemplateInputs::new().with("selected_variable", "total").with("constant", 7),
        )
        .unwrap();
        assert_eq!(with_constant.property, "ltl property equals: [] not different;");
        assert_eq!(
            with_constant.propositions,
            "proposition different: exists (t in S | (t->1).total != 7);"
        );

        // both global: one token
        let globals = general(
            "AlwaysLessThan",
            TemplateInputs::new()
                .with("selected_variable", "total")
                .with("second_variable", "cap"),
        )
        .unwrap();
        assert_eq!(
            globals.propositions,
            "proposition more: exists (t in S | (t->1).total > (t->1).cap);"
        );

        // locals sharing a place: one token
        let shared = general(
            "AlwaysMoreThan",
            TemplateInputs::new()
                .with("selected_variable", "amt")
                .with("second_variable", "fee"),
        )
        .unwrap();
        assert_eq!(shared.property, "ltl property bigger: [] not less;");
        assert_eq!(
            shared.propositions,
            "proposition less: exists (t in deposit_amt | (t->1).amt < (t->1).fee);"
        );

        // global against local: two tokens
        let mixed = general(
            "AlwaysLessThan",
            TemplateInputs::new()
                .with("selected_variable", "total")
                .with("second_variable", "out"),
        )
        .unwrap();
        assert_eq!(
            mixed.propositions,
            "proposition more: exists (t in S | exists (u in withdraw_out | (t->1).total > (u->1).out));"
        );
    }

    #[test]
    fn test_relational_mirrors_all_placements() {
        let compile = |template: &str, left: &str, right: &str| {
            general(
                template,
                TemplateInputs::new()
                    .with("selected_variable", left)
                    .with("second_variable", right),
            )
            .unwrap()
        };
        // (left, right, AlwaysLessThan(left, right), AlwaysMoreThan(right, left))
        let cases = [
            (
                "total",
                "cap",
                "exists (t in S | (t->1).total > (t->1).cap)",
                "exists (t in S | (t->1).cap < (t->1).total)",
            ),
            (
                "amt",
                "fee",
                "exists (t in deposit_amt | (t->1).amt > (t->1).fee)",
                "exists (t in deposit_amt | (t->1).fee < (t->1).amt)",
            ),
            (
                "total",
                "out",
                "exists (t in S | exists (u in withdraw_out | (t->1).total > (u->1).out))",
                "exists (t in withdraw_out | exists (u in S | (t->1).out < (u->1).total))",
            ),
            (
                "out",
                "total",
                "exists (t in withdraw_out | exists (u in S | (t->1).out > (u->1).total))",
                "exists (t in S | exists (u in withdraw_out | (t->1).total < (u->1).out))",
            ),
        ];

        for (left, right, less, more) in cases {
            let smaller = compile("AlwaysLessThan", left, right);
            assert_eq!(smaller.property, "ltl property smaller: [] not more;");
            assert_eq!(smaller.propositions, format!("proposition more: {};", less));

            let bigger = compile("AlwaysMoreThan", right, left);
            assert_eq!(bigger.property, "ltl property bigger: [] not less;");
            assert_eq!(bigger.propositions, format!("proposition less: {};", more));
        }
    }

    #[test]
    fn test_self_destruction_branches() {
        let single = general(
            "Self Destruction",
            TemplateInputs::new()
                .with("selected_function", "withdraw")
                .with("smart_contract", "Bank"),
        )
        .unwrap();
        assert_eq!(single.property, "ltl property selfDestruction: [] not test_w2;");
        assert_eq!(single.propositions, "proposition test_w2: w2'card > 0;");

        let rival = general(
            "SelfDestruction",
            TemplateInputs::new()
                .with("selected_function", "withdraw")
                .with("smart_contract", "Bank")
                .with("rival_contract", "Rival"),
        )
        .unwrap();
        assert_eq!(
            rival.property,
            "ltl property selfDestruction: [] ( not test_w2 ) or not ( selfdestruct_r4 until start_r1 );"
        );
        assert_eq!(rival.propositions.lines().count(), 3);

        let untested = general(
            "SelfDestruction",
            TemplateInputs::new()
                .with("selected_function", "deposit")
                .with("smart_contract", "Bank"),
        )
        .unwrap();
        assert_eq!(untested, CompiledProperty::vacuous());
    }

    #[test]
    fn test_reentrancy_branches() {
        let with_write = general("Reentrancy", TemplateInputs::new().with("selected_function", "withdraw"))
            .unwrap();
        assert_eq!(
            with_write.property,
            "ltl property reentrancy: [] not ( ( not (write_w1 or write_w4) ) until send_w3 );"
        );

        let without_write = general(
            "Reentrancy",
            TemplateInputs::new()
                .with("selected_function", "withdraw")
                .with("selected_variable", "cap"),
        )
        .unwrap();
        assert_eq!(without_write.property, "ltl property reentrancy: [] not send_w3;");

        let no_send = general("Reentrancy", TemplateInputs::new().with("selected_function", "deposit"))
            .unwrap();
        assert_eq!(no_send.property, "true");
        assert_eq!(no_send.propositions, "");
    }

    #[test]
    fn test_timestamp_and_uninitialized() {
        let ts = general(
            "Timestamp Dependance",
            TemplateInputs::new().with("selected_function", "withdraw"),
        )
        .unwrap();
        assert_eq!(ts.property, "ltl property timestampDependence: [] not timestamp_w3;");

        let none = general(
            "TimestampDependence",
            TemplateInputs::new().with("selected_function", "deposit"),
        )
        .unwrap();
        assert_eq!(none, CompiledProperty::vacuous());

        let read_written = general(
            "UninitializedStorageVariable",
            TemplateInputs::new().with("selected_variable", "bal"),
        )
        .unwrap();
        assert_eq!(read_written.property, "ltl property uninitialized: not ( read_w2 until write_w1 );");

        let read_only = general(
            "Uninitialized Storage Variable",
            TemplateInputs::new().with("selected_variable", "out"),
        )
        .unwrap();
        assert_eq!(read_only, CompiledProperty::falsified());

        let unread = general(
            "UninitializedStorageVariable",
            TemplateInputs::new().with("selected_variable", "cap"),
        )
        .unwrap();
        assert_eq!(unread, CompiledProperty::vacuous());
    }

    #[test]
    fn test_skip_empty_string_literal() {
        let result = general(
            "Skip Empty String Literal",
            TemplateInputs::new().with("selected_function", "deposit"),
        )
        .unwrap();
        assert_eq!(result.property, "ltl property skipEmpty: [] not emptyparam_log_PAR;");
        assert!(result.propositions.starts_with("proposition emptyparam_log_PAR: exists (t in log_PAR |"));

        let none = general("SkipEmptyStringLiteral", TemplateInputs::new().with("selected_function", "withdraw"))
            .unwrap();
        assert_eq!(none, CompiledProperty::vacuous());
    }

    #[test]
    fn test_call_occurrence() {
        let always = general("IsAlwaysCalled", TemplateInputs::new().with("selected_function", "withdraw"))
            .unwrap();
        assert_eq!(always.property, "ltl property alwaysCalled: <> withdraw_called_r1;");

        let never = general("IsAlwaysCalled", TemplateInputs::new().with("selected_function", "ghost"))
            .unwrap();
        assert_eq!(never, CompiledProperty::falsified());

        let executed = general("IsExecuted", TemplateInputs::new().with("selected_function", "log"))
            .unwrap();
        assert_eq!(
            executed.property,
            "ltl property executed: [] (log_called_d1 => <> log_returned_d2);"
        );
        assert_eq!(
            executed.propositions,
            "proposition log_called_d1: d1'card > 0;\nproposition log_returned_d2: d2'card > 0;"
        );

        let not_called = general("IsNeverCalled", TemplateInputs::new().with("selected_function", "ghost"))
            .unwrap();
        assert_eq!(not_called, CompiledProperty::vacuous());
    }

    #[test]
    fn test_call_order() {
        let inputs = |a: &str, b: &str| {
            TemplateInputs::new()
                .with("selected_function", a)
                .with("second_function", b)
        };

        let sequential = general("IsSequential", inputs("withdraw", "deposit")).unwrap();
        assert_eq!(
            sequential.property,
            "ltl property sequential: [] not ( ( not withdraw_returned_r2 ) until deposit_called_r5 );"
        );
        let no_first = general("IsSequential", inputs("ghost", "deposit")).unwrap();
        assert_eq!(no_first.property, "ltl property sequential: [] not deposit_called_r5;");
        assert_eq!(
            general("IsSequential", inputs("withdraw", "ghost")).unwrap(),
            CompiledProperty::vacuous()
        );

        let followed = general("AlwaysFollowedBy", inputs("withdraw", "deposit")).unwrap();
        assert_eq!(
            followed.property,
            "ltl property followedBy: [] (withdraw_called_r1 => <> deposit_called_r5);"
        );
        let dangling = general("AlwaysFollowedBy", inputs("withdraw", "ghost")).unwrap();
        assert_eq!(dangling.property, "ltl property followedBy: [] not withdraw_called_r1;");

        let never = general("NeverFollowedBy", inputs("withdraw", "deposit")).unwrap();
        assert_eq!(
            never.property,
            "ltl property neverFollowedBy: [] (withdraw_called_r1 => [] not deposit_called_r5);"
        );
        assert_eq!(
            general("NeverFollowedBy", inputs("ghost", "deposit")).unwrap(),
            CompiledProperty::vacuous()
        );
    }

    #[test]
    fn test_literal_passes_through() {
        let index = index();
        let request = PropertyRequest::Literal {
            property: "ltl property p: [] q;".to_string(),
            propositions: "proposition q: true;".to_string(),
        };
        let result = PropertyCompiler::new(&index).compile(&request).unwrap();
        assert_eq!(result, CompiledProperty::new("ltl property p: [] q;", "proposition q: true;"));
    }

    #[test]
    fn test_group_rendering() {
        let mut propositions = Propositions::new();
        let group = propositions.marked_group("send", &["a".to_string(), "b".to_string()]);
        assert_eq!(group, "(send_a or send_b)");
        // redeclaring is a no-op
        propositions.marked_group("send", &["a".to_string()]);
        assert_eq!(
            propositions.render(),
            "proposition send_a: a'card > 0;\nproposition send_b: b'card > 0;"
        );
    }
}
