//! Net nodes of the Helena CPN surface language
//!
//! Every node is a plain owned value with public fields and a side-effect-free
//! `render()` producing Helena text. `Node` is the closed set of all variants;
//! a `StructuredNet` stores its members as `Node`s.

use super::StructuredNet;

/// Prefix of the comment that opens a sub-model (one contract function)
pub const BANNER_MARKER: &str = "Function:";

/// A net parameter: `name := value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Parameter {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn render(&self) -> String {
        format!("{} := {}", self.name, self.value)
    }
}

/// Verbatim text member
///
/// Besides free comments this carries sub-model banners and the trailing
/// proposition block appended to the transition section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
}

impl Comment {
    pub fn new(text: impl Into<String>) -> Self {
        Comment { text: text.into() }
    }

    /// Banner grouping the following places/transitions under sub-model `name`
    pub fn banner(name: &str) -> Self {
        Comment {
            text: format!("\n/*\n * {} {}\n */\n", BANNER_MARKER, name),
        }
    }

    /// Sub-model name announced by this comment, if it is a banner
    pub fn banner_name(&self) -> Option<&str> {
        let start = self.text.find(BANNER_MARKER)? + BANNER_MARKER.len();
        let rest = &self.text[start..];
        let end = rest.find("*/").unwrap_or(rest.len());
        Some(rest[..end].trim())
    }

    pub fn render(&self) -> String {
        self.text.clone()
    }
}

/// A struct color component: `TYPE name;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub name: String,
    pub ty: String,
}

impl Component {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Component {
            name: name.into(),
            ty: ty.into(),
        }
    }

    pub fn render(&self) -> String {
        format!("{} {};", self.ty, self.name)
    }
}

/// Color (type) declarations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Color {
    /// `type N : <definition>;` for definitions without a dedicated variant
    Defined { name: String, definition: String },
    /// `type N : range L .. H;`
    Range { name: String, low: String, high: String },
    /// `type N : mod M;`
    Mod { name: String, modulus: String },
    /// `type N : enum (a, b);`
    Enum { name: String, values: Vec<String> },
    /// `type N : vector [I1, I2] of E;`
    Vector {
        name: String,
        indexes: Vec<String>,
        element: String,
    },
    /// `type N : struct { T a;U b;};`
    Struct {
        name: String,
        components: Vec<Component>,
    },
    /// `type N : list[I] of E with capacity C;`
    List {
        name: String,
        index: String,
        element: String,
        capacity: String,
    },
    /// `subtype N : P constraint;`
    Sub {
        name: String,
        parent: String,
        constraint: String,
    },
}

impl Color {
    pub fn name(&self) -> &str {
        match self {
            Color::Defined { name, .. }
            | Color::Range { name, .. }
            | Color::Mod { name, .. }
            | Color::Enum { name, .. }
            | Color::Vector { name, .. }
            | Color::Struct { name, .. }
            | Color::List { name, .. }
            | Color::Sub { name, .. } => name,
        }
    }

    /// Look up a struct component by name
    pub fn component(&self, component: &str) -> Option<&Component> {
        match self {
            Color::Struct { components, .. } => components.iter().find(|c| c.name == component),
            _ => None,
        }
    }

    pub fn render(&self) -> String {
        match self {
            Color::Defined { name, definition } => format!("type {} : {};\n", name, definition),
            Color::Range { name, low, high } => format!("type {} : range {} .. {};\n", name, low, high),
            Color::Mod { name, modulus } => format!("type {} : mod {};\n", name, modulus),
            Color::Enum { name, values } => format!("type {} : enum ({});\n", name, values.join(", ")),
            Color::Vector { name, indexes, element } => {
                format!("type {} : vector [{}] of {};\n", name, indexes.join(", "), element)
            }
            Color::Struct { name, components } => {
                let body: String = components.iter().map(Component::render).collect();
                format!("type {} : struct {{ {}}};\n", name, body)
            }
            Color::List { name, index, element, capacity } => format!(
                "type {} : list[{}] of {} with capacity {};\n",
                name, index, element, capacity
            ),
            Color::Sub { name, parent, constraint } => {
                if constraint.is_empty() {
                    format!("subtype {} : {};\n", name, parent)
                } else {
                    format!("subtype {} : {} {};\n", name, parent, constraint)
                }
            }
        }
    }
}

/// `constant TYPE name:=expression;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constant {
    pub name: String,
    pub ty: String,
    pub expression: String,
}

impl Constant {
    pub fn new(name: impl Into<String>, ty: impl Into<String>, expression: impl Into<String>) -> Self {
        Constant {
            name: name.into(),
            ty: ty.into(),
            expression: expression.into(),
        }
    }

    pub fn render(&self) -> String {
        format!("constant {} {}:={};\n", self.ty, self.name, self.expression)
    }
}

/// A function parameter: `TYPE name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: String,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Param {
            name: name.into(),
            ty: ty.into(),
        }
    }

    pub fn render(&self) -> String {
        format!("{} {}", self.ty, self.name)
    }
}

/// A net function; without a body it renders as a prototype
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: String,
    pub body: Option<String>,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Function {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Parameter at position `index`, if any
    pub fn param(&self, index: usize) -> Option<&Param> {
        self.params.get(index)
    }

    pub fn render(&self) -> String {
        let params: Vec<String> = self.params.iter().map(Param::render).collect();
        let mut result = format!("function {} ({})", self.name, params.join(", "));
        if !self.return_type.is_empty() {
            result.push_str(" -> ");
            result.push_str(&self.return_type);
        }
        match &self.body {
            Some(body) => result.push_str(&format!("{{\n{}\n}}\n", body)),
            None => result.push_str(";\n"),
        }
        result
    }
}

/// A place holding a multiset of tokens of color `domain`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Place {
    pub name: String,
    pub domain: String,
    pub init: Option<String>,
    pub capacity: Option<String>,
    pub type_tag: Option<String>,
}

impl Place {
    pub fn new(name: impl Into<String>, domain: impl Into<String>) -> Self {
        Place {
            name: name.into(),
            domain: domain.into(),
            ..Default::default()
        }
    }

    /// Builder-style initial marking
    pub fn with_init(mut self, init: impl Into<String>) -> Self {
        self.init = Some(init.into());
        self
    }

    pub fn render(&self) -> String {
        let mut result = format!("place {} {{\n\tdom : {};", self.name, self.domain);
        if let Some(init) = &self.init {
            result.push_str(&format!("\n\tinit : {};", init));
        }
        if let Some(capacity) = &self.capacity {
            result.push_str(&format!("\n\tcapacity : {};", capacity));
        }
        if let Some(type_tag) = &self.type_tag {
            result.push_str(&format!("\n\ttype : {};", type_tag));
        }
        result.push_str("\n}\n");
        result
    }
}

/// An arc between a transition and `place`, carrying the token expression `label`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arc {
    pub place: String,
    pub label: String,
}

impl Arc {
    pub fn new(place: impl Into<String>, label: impl Into<String>) -> Self {
        Arc {
            place: place.into(),
            label: label.into(),
        }
    }

    /// Control-flow arc carrying the uncolored `epsilon` token
    pub fn epsilon(place: impl Into<String>) -> Self {
        Arc::new(place, "epsilon")
    }

    pub fn render(&self) -> String {
        format!("{} : {};", self.place, self.label)
    }
}

/// A transition with its in/out/inhibitor arcs and optional attributes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transition {
    pub name: String,
    pub inputs: Vec<Arc>,
    pub outputs: Vec<Arc>,
    pub inhibitors: Vec<Arc>,
    /// Bindings of the `let` block, without the trailing `;`
    pub lets: Vec<String>,
    pub guard: Option<String>,
    pub priority: Option<String>,
    pub description: Option<String>,
    pub safe: bool,
}

impl Transition {
    pub fn new(name: impl Into<String>) -> Self {
        Transition {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn add_input(&mut self, arc: Arc) {
        self.inputs.push(arc);
    }

    pub fn add_output(&mut self, arc: Arc) {
        self.outputs.push(arc);
    }

    pub fn add_inhibitor(&mut self, arc: Arc) {
        self.inhibitors.push(arc);
    }

    pub fn add_let(&mut self, binding: impl Into<String>) {
        self.lets.push(binding.into());
    }

    /// First input arc consuming from `place`
    pub fn input_from(&self, place: &str) -> Option<&Arc> {
        self.inputs.iter().find(|arc| arc.place == place)
    }

    /// First output arc producing into `place`
    pub fn output_to(&self, place: &str) -> Option<&Arc> {
        self.outputs.iter().find(|arc| arc.place == place)
    }

    pub fn render(&self) -> String {
        let mut result = format!("transition {} {{\n\tin {{\n", self.name);
        for arc in &self.inputs {
            result.push_str(&format!("\t\t{}\n", arc.render()));
        }
        result.push_str("\t}\n\tout {\n");
        for arc in &self.outputs {
            result.push_str(&format!("\t\t{}\n", arc.render()));
        }
        result.push_str("\t}\n");

        if !self.lets.is_empty() {
            result.push_str("\tlet {\n");
            for binding in &self.lets {
                result.push_str(&format!("\t\t{};\n", binding));
            }
            result.push_str("\t}\n");
        }

        if !self.inhibitors.is_empty() {
            result.push_str("\tinhibit {\n");
            for arc in &self.inhibitors {
                result.push_str(&format!("\t\t{}\n", arc.render()));
            }
            result.push_str("\t}\n");
        }

        if let Some(guard) = &self.guard {
            result.push_str(&format!("\tguard : {};\n", guard));
        }
        if let Some(priority) = &self.priority {
            result.push_str(&format!("\tpriority : {};\n", priority));
        }
        if let Some(description) = &self.description {
            result.push_str(&format!("\tdescription : {};\n", description));
        }
        if self.safe {
            result.push_str("\tsafe;\n");
        }

        result.push_str("}\n");
        result
    }
}

/// Closed set of net nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Parameter(Parameter),
    Comment(Comment),
    Color(Color),
    Component(Component),
    Constant(Constant),
    Param(Param),
    Function(Function),
    Place(Place),
    Arc(Arc),
    Transition(Transition),
    StructuredNet(Box<StructuredNet>),
}

impl Node {
    /// Helena text of the node
    pub fn render(&self) -> String {
        match self {
            Node::Parameter(n) => n.render(),
            Node::Comment(n) => n.render(),
            Node::Color(n) => n.render(),
            Node::Component(n) => n.render(),
            Node::Constant(n) => n.render(),
            Node::Param(n) => n.render(),
            Node::Function(n) => n.render(),
            Node::Place(n) => n.render(),
            Node::Arc(n) => n.render(),
            Node::Transition(n) => n.render(),
            Node::StructuredNet(n) => n.render(),
        }
    }

    pub fn as_comment(&self) -> Option<&Comment> {
        match self {
            Node::Comment(c) => Some(c),
            _ => None,
        }
    }

    /// Sub-model name if this node is a banner comment
    pub fn banner_name(&self) -> Option<&str> {
        self.as_comment().and_then(Comment::banner_name)
    }

    pub fn as_place(&self) -> Option<&Place> {
        match self {
            Node::Place(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_place_mut(&mut self) -> Option<&mut Place> {
        match self {
            Node::Place(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_transition(&self) -> Option<&Transition> {
        match self {
            Node::Transition(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_transition_mut(&mut self) -> Option<&mut Transition> {
        match self {
            Node::Transition(t) => Some(t),
            _ => None,
        }
    }
}

impl From<Parameter> for Node {
    fn from(node: Parameter) -> Self {
        Node::Parameter(node)
    }
}

impl From<Comment> for Node {
    fn from(node: Comment) -> Self {
        Node::Comment(node)
    }
}

impl From<Color> for Node {
    fn from(node: Color) -> Self {
        Node::Color(node)
    }
}

impl From<Constant> for Node {
    fn from(node: Constant) -> Self {
        Node::Constant(node)
    }
}

impl From<Function> for Node {
    fn from(node: Function) -> Self {
        Node::Function(node)
    }
}

impl From<Place> for Node {
    fn from(node: Place) -> Self {
        Node::Place(node)
    }
}

impl From<Transition> for Node {
    fn from(node: Transition) -> Self {
        Node::Transition(node)
    }
}

impl From<StructuredNet> for Node {
    fn from(node: StructuredNet) -> Self {
        Node::StructuredNet(Box::new(node))
    }
}
