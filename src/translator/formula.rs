//! Literal LTL formulas
//!
//! A formula refers to contract entities through single-quoted references:
//! `'deposit.func'` is a function, `'amt'` (or `'amt.var'`) a variable.
//! Parsing uses a shunting-yard pass with, from tightest to loosest:
//! comparisons, the unary operators `not`/`[]`/`<>`, `until` (right
//! associative), `and`, `or`, `=>` (right associative).
//!
//! Every atomic condition becomes a proposition `p1, p2, ...` in first-seen
//! order. A formula that cannot be compiled is passed through with its
//! quotes stripped and no propositions.

use std::sync::OnceLock;

use log::{debug, warn};
use regex::Regex;

use super::property::{ltl, CompiledProperty, Propositions};
use crate::net::cflow_place;
use crate::parser::StatementIndex;

/// A quoted reference inside a formula
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Function(String),
    Variable(String),
}

impl Reference {
    /// Classify the text between the quotes
    ///
    /// Only the `func` and `var` suffixes are understood; any other dotted
    /// suffix is not a reference and yields `None`.
    pub fn parse(text: &str) -> Option<Reference> {
        let text = text.trim();
        match text.rsplit_once('.') {
            Some((name, "func")) => Some(Reference::Function(name.to_string())),
            Some((name, "var")) => Some(Reference::Variable(name.to_string())),
            Some(_) => None,
            None => Some(Reference::Variable(text.to_string())),
        }
    }
}

fn quoted_pattern() -> crate::error::Result<&'static Regex> {
    static QUOTED: OnceLock<Regex> = OnceLock::new();
    if let Some(pattern) = QUOTED.get() {
        return Ok(pattern);
    }
    let pattern = Regex::new(r"'([^']*)'")?;
    Ok(QUOTED.get_or_init(|| pattern))
}

/// Quoted references of `formula`, deduplicated in first-seen order
pub fn references(formula: &str) -> crate::error::Result<Vec<Reference>> {
    let mut result: Vec<Reference> = Vec::new();
    for caps in quoted_pattern()?.captures_iter(formula) {
        let Some(reference) = Reference::parse(&caps[1]) else {
            debug!("ignoring quoted text `{}`", &caps[1]);
            continue;
        };
        if !result.contains(&reference) {
            result.push(reference);
        }
    }
    Ok(result)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ref(Reference),
    Literal(String),
    Compare(&'static str),
    Not,
    Always,
    Eventually,
    And,
    Or,
    Implies,
    Until,
    LParen,
    RParen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unary {
    Not,
    Always,
    Eventually,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binary {
    Compare(&'static str),
    Until,
    And,
    Or,
    Implies,
}

impl Binary {
    fn precedence(self) -> u8 {
        match self {
            Binary::Compare(_) => 6,
            Binary::Until => 4,
            Binary::And => 3,
            Binary::Or => 2,
            Binary::Implies => 1,
        }
    }

    fn right_associative(self) -> bool {
        matches!(self, Binary::Until | Binary::Implies)
    }

    fn symbol(self) -> &'static str {
        match self {
            Binary::Compare(op) => op,
            Binary::Until => "until",
            Binary::And => "and",
            Binary::Or => "or",
            Binary::Implies => "=>",
        }
    }
}

const UNARY_PRECEDENCE: u8 = 5;

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Ref(Reference),
    Literal(String),
    Unary(Unary, Box<Expr>),
    Binary(Binary, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy)]
enum Operator {
    Unary(Unary),
    Binary(Binary),
    LParen,
}

fn tokenize(formula: &str) -> Result<Vec<Token>, String> {
    const SYMBOLS: [(&str, Token); 15] = [
        ("[]", Token::Always),
        ("<>", Token::Eventually),
        ("=>", Token::Implies),
        ("->", Token::Implies),
        ("&&", Token::And),
        ("||", Token::Or),
        ("<=", Token::Compare("<=")),
        (">=", Token::Compare(">=")),
        ("==", Token::Compare("=")),
        ("!=", Token::Compare("!=")),
        ("<", Token::Compare("<")),
        (">", Token::Compare(">")),
        ("=", Token::Compare("=")),
        ("!", Token::Not),
        ("(", Token::LParen),
    ];

    let mut tokens = Vec::new();
    let mut rest = formula.trim_start();
    'scan: while !rest.is_empty() {
        if let Some(quoted) = rest.strip_prefix('\'') {
            let end = quoted
                .find('\'')
                .ok_or_else(|| "unterminated quoted reference".to_string())?;
            let reference = Reference::parse(&quoted[..end])
                .ok_or_else(|| format!("unsupported reference `{}`", &quoted[..end]))?;
            tokens.push(Token::Ref(reference));
            rest = quoted[end + 1..].trim_start();
            continue;
        }
        if let Some(after) = rest.strip_prefix(')') {
            tokens.push(Token::RParen);
            rest = after.trim_start();
            continue;
        }
        // a minus sign where an operand is expected starts a negative number
        let operand_ends = matches!(
            tokens.last(),
            Some(Token::Ref(_) | Token::Literal(_) | Token::RParen)
        );
        if let Some(after) = rest.strip_prefix('-') {
            if !operand_ends && after.starts_with(|c: char| c.is_ascii_digit()) {
                let len = after.find(|c: char| !c.is_ascii_digit()).unwrap_or(after.len());
                tokens.push(Token::Literal(format!("-{}", &after[..len])));
                rest = after[len..].trim_start();
                continue;
            }
        }
        for (symbol, token) in SYMBOLS.iter() {
            if let Some(after) = rest.strip_prefix(symbol) {
                tokens.push(token.clone());
                rest = after.trim_start();
                continue 'scan;
            }
        }

        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(format!("unexpected character `{}`", rest.chars().next().unwrap_or(' ')));
        }
        let word = &rest[..len];
        tokens.push(match word {
            "not" => Token::Not,
            "and" => Token::And,
            "or" => Token::Or,
            "until" | "U" => Token::Until,
            _ => Token::Literal(word.to_string()),
        });
        rest = rest[len..].trim_start();
    }
    Ok(tokens)
}

fn apply(operands: &mut Vec<Expr>, operator: Operator) -> Result<(), String> {
    match operator {
        Operator::Unary(op) => {
            let inner = operands.pop().ok_or("missing operand")?;
            operands.push(Expr::Unary(op, Box::new(inner)));
        }
        Operator::Binary(op) => {
            let right = operands.pop().ok_or("missing operand")?;
            let left = operands.pop().ok_or("missing operand")?;
            operands.push(Expr::Binary(op, Box::new(left), Box::new(right)));
        }
        Operator::LParen => return Err("unbalanced parenthesis".to_string()),
    }
    Ok(())
}

fn parse(formula: &str) -> Result<Expr, String> {
    let mut operands: Vec<Expr> = Vec::new();
    let mut operators: Vec<Operator> = Vec::new();
    // true while an operand (or prefix operator) is expected
    let mut expect_operand = true;

    for token in tokenize(formula)? {
        let binary = match token {
            Token::Compare(op) => Some(Binary::Compare(op)),
            Token::Until => Some(Binary::Until),
            Token::And => Some(Binary::And),
            Token::Or => Some(Binary::Or),
            Token::Implies => Some(Binary::Implies),
            _ => None,
        };

        if let Some(op) = binary {
            if expect_operand {
                return Err(format!("operator `{}` without left operand", op.symbol()));
            }
            while let Some(&top) = operators.last() {
                let pops = match top {
                    Operator::Unary(_) => UNARY_PRECEDENCE > op.precedence(),
                    Operator::Binary(prev) => {
                        prev.precedence() > op.precedence()
                            || (prev.precedence() == op.precedence() && !op.right_associative())
                    }
                    Operator::LParen => false,
                };
                if !pops {
                    break;
                }
                operators.pop();
                apply(&mut operands, top)?;
            }
            operators.push(Operator::Binary(op));
            expect_operand = true;
            continue;
        }

        match token {
            Token::Ref(reference) if expect_operand => {
                operands.push(Expr::Ref(reference));
                expect_operand = false;
            }
            Token::Literal(word) if expect_operand => {
                operands.push(Expr::Literal(word));
                expect_operand = false;
            }
            Token::Not if expect_operand => operators.push(Operator::Unary(Unary::Not)),
            Token::Always if expect_operand => operators.push(Operator::Unary(Unary::Always)),
            Token::Eventually if expect_operand => operators.push(Operator::Unary(Unary::Eventually)),
            Token::LParen if expect_operand => operators.push(Operator::LParen),
            Token::RParen if !expect_operand => loop {
                match operators.pop() {
                    Some(Operator::LParen) => break,
                    Some(top) => apply(&mut operands, top)?,
                    None => return Err("unbalanced parenthesis".to_string()),
                }
            },
            other => return Err(format!("unexpected token {:?}", other)),
        }
    }

    if expect_operand {
        return Err("formula ends without an operand".to_string());
    }
    while let Some(top) = operators.pop() {
        apply(&mut operands, top)?;
    }
    match (operands.pop(), operands.is_empty()) {
        (Some(expr), true) => Ok(expr),
        _ => Err("dangling operands".to_string()),
    }
}

/// Term of a comparison
enum Term<'e> {
    Variable(&'e str),
    Literal(&'e str),
}

fn term(expr: &Expr) -> Result<Term<'_>, String> {
    match expr {
        Expr::Ref(Reference::Variable(v)) => Ok(Term::Variable(v)),
        Expr::Literal(l) => Ok(Term::Literal(l)),
        _ => Err("comparison operand must be a variable or a value".to_string()),
    }
}

/// Helena text of a term, variables read through their bound token
fn term_text(term: &Term<'_>, bindings: &[(&str, &str)]) -> String {
    match term {
        Term::Literal(l) => l.to_string(),
        Term::Variable(v) => {
            let token = bindings
                .iter()
                .find(|(name, _)| name == v)
                .map(|(_, token)| *token)
                .unwrap_or("t");
            format!("({}->1).{}", token, v)
        }
    }
}

struct FormulaCompiler<'a> {
    index: &'a StatementIndex,
    atoms: Vec<String>,
    propositions: Propositions,
}

impl<'a> FormulaCompiler<'a> {
    /// Name of the proposition for `expression`, declaring it on first use
    fn atom(&mut self, expression: String) -> String {
        let position = match self.atoms.iter().position(|a| *a == expression) {
            Some(position) => position,
            None => {
                self.atoms.push(expression.clone());
                self.atoms.len() - 1
            }
        };
        let name = format!("p{}", position + 1);
        self.propositions.declare(&name, &expression)
    }

    fn places(&self, variable: &str) -> Result<Vec<String>, String> {
        let places = self.index.variable_places(variable);
        if places.is_empty() {
            Err(format!("unknown variable `{}`", variable))
        } else {
            Ok(places)
        }
    }

    fn render(&mut self, expr: &Expr) -> Result<String, String> {
        match expr {
            Expr::Literal(word) if word == "true" || word == "false" => Ok(word.clone()),
            Expr::Literal(word) => Err(format!("literal `{}` used as a condition", word)),
            Expr::Ref(Reference::Function(function)) => {
                Ok(self.atom(format!("{}'card > 0", cflow_place(function))))
            }
            Expr::Ref(Reference::Variable(variable)) => {
                let clauses: Vec<String> = self
                    .places(variable)?
                    .iter()
                    .map(|place| format!("exists (t in {} | (t->1).{})", place, variable))
                    .collect();
                Ok(self.atom(clauses.join(" or ")))
            }
            Expr::Binary(Binary::Compare(op), left, right) => {
                let expression = self.comparison(op, left, right)?;
                Ok(self.atom(expression))
            }
            Expr::Unary(op, inner) => {
                let inner = self.render(inner)?;
                Ok(match op {
                    Unary::Not => format!("not {}", inner),
                    Unary::Always => format!("[] {}", inner),
                    Unary::Eventually => format!("<> {}", inner),
                })
            }
            Expr::Binary(op, left, right) => {
                let left = self.render(left)?;
                let right = self.render(right)?;
                Ok(format!("({} {} {})", left, op.symbol(), right))
            }
        }
    }

    fn comparison(&self, op: &str, left: &Expr, right: &Expr) -> Result<String, String> {
        let (left, right) = (term(left)?, term(right)?);

        let mut variables: Vec<&str> = Vec::new();
        for t in [&left, &right] {
            if let Term::Variable(v) = t {
                if !variables.contains(v) {
                    variables.push(*v);
                }
            }
        }
        let text = term_text;

        let mut clauses = Vec::new();
        match variables.as_slice() {
            [] => clauses.push(format!("{} {} {}", text(&left, &[]), op, text(&right, &[]))),
            [v] => {
                for place in self.places(v)? {
                    let bindings = [(*v, "t")];
                    clauses.push(format!(
                        "exists (t in {} | {} {} {})",
                        place,
                        text(&left, &bindings),
                        op,
                        text(&right, &bindings)
                    ));
                }
            }
            [v, w, ..] => {
                let (v_places, w_places) = (self.places(v)?, self.places(w)?);
                for p in &v_places {
                    for q in &w_places {
                        if p == q {
                            let bindings = [(*v, "t"), (*w, "t")];
                            clauses.push(format!(
                                "exists (t in {} | {} {} {})",
                                p,
                                text(&left, &bindings),
                                op,
                                text(&right, &bindings)
                            ));
                        } else {
                            let bindings = [(*v, "t"), (*w, "u")];
                            clauses.push(format!(
                                "exists (t in {} | exists (u in {} | {} {} {}))",
                                p,
                                q,
                                text(&left, &bindings),
                                op,
                                text(&right, &bindings)
                            ));
                        }
                    }
                }
            }
        }
        Ok(clauses.join(" or "))
    }
}

/// Compile a literal formula; never fails
pub fn compile_formula(index: &StatementIndex, formula: &str) -> CompiledProperty {
    let compiled = parse(formula).and_then(|expr| {
        let mut compiler = FormulaCompiler {
            index,
            atoms: Vec::new(),
            propositions: Propositions::new(),
        };
        let body = compiler.render(&expr)?;
        Ok(CompiledProperty::new(
            ltl("specific", &body),
            compiler.propositions.render(),
        ))
    });

    match compiled {
        Ok(result) => result,
        Err(reason) => {
            warn!("formula `{}` is passed through uncompiled: {}", formula, reason);
            CompiledProperty::new(ltl("specific", formula.replace('\'', "").trim()), "")
        }
    }
}
