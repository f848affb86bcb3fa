//! Structured net: the top-level container of a CPN model
//!
//! Members live in four ordered sections. Rendering always emits them as
//! colors → functions → places → transitions, each under its banner comment,
//! whatever order they were added in. The downstream checker relies on it.

use super::node::{Node, Parameter, Place, Transition};
use crate::error::{Error, Result};

/// The four member sections of a structured net
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Colors,
    Functions,
    Places,
    Transitions,
}

impl Section {
    /// Name used in diagnostics
    pub fn label(self) -> &'static str {
        match self {
            Section::Colors => "colors",
            Section::Functions => "functions",
            Section::Places => "places",
            Section::Transitions => "transitions",
        }
    }

    /// Section announced by the banner comment `text`
    pub fn from_banner(text: &str) -> Option<Section> {
        SECTION_ORDER
            .into_iter()
            .find(|section| section.banner().trim() == text.trim())
    }

    fn banner(self) -> &'static str {
        match self {
            Section::Colors => {
                "\n/**************************\n *** Colour Definitions ***\n **************************/\n"
            }
            Section::Functions => {
                "\n/****************************\n *** Function Definitions ***\n ****************************/\n"
            }
            Section::Places => {
                "\n/*************************\n *** Place Definitions ***\n *************************/\n"
            }
            Section::Transitions => {
                "\n/******************************\n *** Transition Definitions ***\n ******************************/\n"
            }
        }
    }
}

/// Render order of the sections
pub const SECTION_ORDER: [Section; 4] = [
    Section::Colors,
    Section::Functions,
    Section::Places,
    Section::Transitions,
];

/// A named, parameterized net with its four member sections
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructuredNet {
    pub name: String,
    parameters: Vec<Parameter>,
    colors: Vec<Node>,
    functions: Vec<Node>,
    places: Vec<Node>,
    transitions: Vec<Node>,
}

impl StructuredNet {
    pub fn new(name: impl Into<String>) -> Self {
        StructuredNet {
            name: name.into(),
            ..Default::default()
        }
    }

    // ---- parameters ----

    pub fn add_parameter(&mut self, parameter: Parameter) {
        self.parameters.push(parameter);
    }

    pub fn parameter(&self, index: usize) -> Result<&Parameter> {
        let len = self.parameters.len();
        self.parameters.get(index).ok_or(Error::StructuralIndex {
            collection: "parameters",
            index,
            len,
        })
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn num_parameters(&self) -> usize {
        self.parameters.len()
    }

    // ---- generic section access ----

    fn section(&self, section: Section) -> &Vec<Node> {
        match section {
            Section::Colors => &self.colors,
            Section::Functions => &self.functions,
            Section::Places => &self.places,
            Section::Transitions => &self.transitions,
        }
    }

    fn section_mut(&mut self, section: Section) -> &mut Vec<Node> {
        match section {
            Section::Colors => &mut self.colors,
            Section::Functions => &mut self.functions,
            Section::Places => &mut self.places,
            Section::Transitions => &mut self.transitions,
        }
    }

    fn out_of_range(&self, section: Section, index: usize) -> Error {
        Error::StructuralIndex {
            collection: section.label(),
            index,
            len: self.section(section).len(),
        }
    }

    /// Append a member to `section`
    pub fn push(&mut self, section: Section, node: impl Into<Node>) {
        self.section_mut(section).push(node.into());
    }

    /// Member `index` of `section`
    pub fn get(&self, section: Section, index: usize) -> Result<&Node> {
        self.section(section)
            .get(index)
            .ok_or_else(|| self.out_of_range(section, index))
    }

    pub fn get_mut(&mut self, section: Section, index: usize) -> Result<&mut Node> {
        let err = self.out_of_range(section, index);
        self.section_mut(section).get_mut(index).ok_or(err)
    }

    /// Replace member `index` of `section`
    pub fn update(&mut self, section: Section, index: usize, node: impl Into<Node>) -> Result<()> {
        let slot = self.get_mut(section, index)?;
        *slot = node.into();
        Ok(())
    }

    /// Remove and return member `index` of `section`
    pub fn delete(&mut self, section: Section, index: usize) -> Result<Node> {
        if index >= self.section(section).len() {
            return Err(self.out_of_range(section, index));
        }
        Ok(self.section_mut(section).remove(index))
    }

    pub fn len(&self, section: Section) -> usize {
        self.section(section).len()
    }

    pub fn members(&self, section: Section) -> &[Node] {
        self.section(section)
    }

    // ---- typed shorthands ----

    pub fn add_color(&mut self, node: impl Into<Node>) {
        self.push(Section::Colors, node);
    }

    pub fn add_function(&mut self, node: impl Into<Node>) {
        self.push(Section::Functions, node);
    }

    pub fn add_place(&mut self, node: impl Into<Node>) {
        self.push(Section::Places, node);
    }

    pub fn add_transition(&mut self, node: impl Into<Node>) {
        self.push(Section::Transitions, node);
    }

    pub fn colors(&self) -> &[Node] {
        &self.colors
    }

    pub fn functions(&self) -> &[Node] {
        &self.functions
    }

    pub fn places(&self) -> &[Node] {
        &self.places
    }

    pub fn transitions(&self) -> &[Node] {
        &self.transitions
    }

    /// Mutable iteration over the place members that are actual places
    pub fn places_mut(&mut self) -> impl Iterator<Item = &mut Place> {
        self.places.iter_mut().filter_map(Node::as_place_mut)
    }

    pub fn place_by_name(&self, name: &str) -> Option<&Place> {
        self.places
            .iter()
            .filter_map(Node::as_place)
            .find(|p| p.name == name)
    }

    pub fn transition_by_name(&self, name: &str) -> Option<&Transition> {
        self.transitions
            .iter()
            .filter_map(Node::as_transition)
            .find(|t| t.name == name)
    }

    /// Sub-model names announced by banners in `section`, first-seen order
    pub fn sub_models(&self, section: Section) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for name in self.section(section).iter().filter_map(Node::banner_name) {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }

    /// Helena text of the whole net
    pub fn render(&self) -> String {
        let mut result = self.name.clone();

        if !self.parameters.is_empty() {
            let params: Vec<String> = self.parameters.iter().map(Parameter::render).collect();
            result.push_str(&format!("({})", params.join(", ")));
        }

        result.push_str(" {\n");
        for section in SECTION_ORDER {
            result.push_str(section.banner());
            for node in self.section(section) {
                result.push_str(&node.render());
            }
        }
        result.push_str("\n}");
        result
    }
}
