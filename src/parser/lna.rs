//! LNA text parser
//!
//! Turns Helena net source text back into a `StructuredNet`. Accepts the text
//! produced by `StructuredNet::render` as well as the per-function layout the
//! upstream contract translator emits, where banners and declarations are
//! interleaved.
//!
//! A comment announcing `Function: NAME` opens a sub-model: a banner for it is
//! inserted before the next place and before the next transition, until a
//! section banner closes it. All other comments (section banners included)
//! are dropped. `proposition` declarations are kept verbatim as a trailing
//! comment of the transition section.

use log::debug;
use regex::Regex;

use crate::error::{Error, Result};
use crate::net::{
    Arc, Color, Comment, Component, Constant, Function, Node, Param, Parameter, Place, Section,
    StructuredNet, Transition,
};

/// Parse a whole `.lna` net
pub fn parse_net(text: &str) -> Result<StructuredNet> {
    LnaParser::new(text).parse()
}

/// Cursor-based parser over LNA source text
pub struct LnaParser<'a> {
    text: &'a str,
    pos: usize,
    line: usize,
    pending_place_banner: Option<String>,
    pending_transition_banner: Option<String>,
    /// Set while consecutive `proposition` declarations are being collected
    in_propositions: bool,
}

impl<'a> LnaParser<'a> {
    pub fn new(text: &'a str) -> Self {
        LnaParser {
            text,
            pos: 0,
            line: 1,
            pending_place_banner: None,
            pending_transition_banner: None,
            in_propositions: false,
        }
    }

    /// Parse the net header and every member declaration
    pub fn parse(mut self) -> Result<StructuredNet> {
        self.skip_trivia();
        let name = self.ident()?;
        let mut net = StructuredNet::new(name);

        self.skip_trivia();
        if self.peek() == Some('(') {
            self.bump();
            let params = self.scan_until(&[')'])?.0;
            for param in params.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                let (name, value) = param
                    .split_once(":=")
                    .ok_or_else(|| self.error(format!("malformed net parameter `{}`", param)))?;
                net.add_parameter(Parameter::new(name.trim(), value.trim()));
            }
            self.skip_trivia();
        }
        self.expect('{')?;

        loop {
            self.skip_trivia();
            match self.peek() {
                Some('}') => {
                    self.bump();
                    break;
                }
                None => return Err(self.error("unexpected end of input, net is not closed")),
                _ => {}
            }

            let keyword = self.ident()?;
            if keyword != "proposition" {
                self.in_propositions = false;
            }
            match keyword.as_str() {
                "type" => {
                    let color = self.color()?;
                    net.add_color(color);
                }
                "subtype" => {
                    let color = self.subtype()?;
                    net.add_color(color);
                }
                "constant" => {
                    let constant = self.constant()?;
                    net.add_color(constant);
                }
                "function" => {
                    let function = self.function()?;
                    net.add_function(function);
                }
                "place" => {
                    let place = self.place()?;
                    if let Some(banner) = self.pending_place_banner.take() {
                        net.add_place(Comment::banner(&banner));
                    }
                    net.add_place(place);
                }
                "transition" => {
                    let transition = self.transition()?;
                    if let Some(banner) = self.pending_transition_banner.take() {
                        net.add_transition(Comment::banner(&banner));
                    }
                    net.add_transition(transition);
                }
                "proposition" => {
                    let declaration = format!("proposition {};", self.scan_until(&[';'])?.0);
                    self.push_proposition(&mut net, declaration);
                }
                other => {
                    return Err(self.error(format!("unexpected keyword `{}`", other)));
                }
            }
        }

        Ok(net)
    }

    // ---- declarations ----

    fn color(&mut self) -> Result<Color> {
        self.skip_trivia();
        let name = self.ident()?;
        self.skip_trivia();
        self.expect(':')?;
        let definition = self.scan_until(&[';'])?.0;
        self.color_definition(name, &definition)
    }

    fn color_definition(&self, name: String, definition: &str) -> Result<Color> {
        let regex = |pattern: &str| {
            Regex::new(pattern).map_err(|e| self.error(format!("Regex error: {}", e)))
        };

        let range_re = regex(r"^range\s+(.+?)\s*\.\.\s*(.+)$")?;
        let mod_re = regex(r"^mod\s+(.+)$")?;
        let enum_re = regex(r"^enum\s*\((.*)\)$")?;
        let vector_re = regex(r"^vector\s*\[(.*)\]\s*of\s+(.+)$")?;
        let struct_re = regex(r"(?s)^struct\s*\{(.*)\}$")?;
        let list_re = regex(r"^list\s*\[(.+?)\]\s*of\s+(.+?)\s+with\s+capacity\s+(.+)$")?;

        let color = if let Some(caps) = range_re.captures(definition) {
            Color::Range {
                name,
                low: caps[1].trim().to_string(),
                high: caps[2].trim().to_string(),
            }
        } else if let Some(caps) = mod_re.captures(definition) {
            Color::Mod {
                name,
                modulus: caps[1].trim().to_string(),
            }
        } else if let Some(caps) = enum_re.captures(definition) {
            Color::Enum {
                name,
                values: split_list(&caps[1], ','),
            }
        } else if let Some(caps) = vector_re.captures(definition) {
            Color::Vector {
                name,
                indexes: split_list(&caps[1], ','),
                element: caps[2].trim().to_string(),
            }
        } else if let Some(caps) = struct_re.captures(definition) {
            let mut components = Vec::new();
            for field in split_list(&caps[1], ';') {
                let (ty, field_name) = field
                    .rsplit_once(char::is_whitespace)
                    .ok_or_else(|| self.error(format!("malformed struct component `{}`", field)))?;
                components.push(Component::new(field_name.trim(), ty.trim()));
            }
            Color::Struct { name, components }
        } else if let Some(caps) = list_re.captures(definition) {
            Color::List {
                name,
                index: caps[1].trim().to_string(),
                element: caps[2].trim().to_string(),
                capacity: caps[3].trim().to_string(),
            }
        } else {
            Color::Defined {
                name,
                definition: definition.to_string(),
            }
        };
        Ok(color)
    }

    fn subtype(&mut self) -> Result<Color> {
        self.skip_trivia();
        let name = self.ident()?;
        self.skip_trivia();
        self.expect(':')?;
        let definition = self.scan_until(&[';'])?.0;
        let (parent, constraint) = match definition.split_once(char::is_whitespace) {
            Some((parent, constraint)) => (parent.to_string(), constraint.trim().to_string()),
            None => (definition, String::new()),
        };
        Ok(Color::Sub {
            name,
            parent,
            constraint,
        })
    }

    fn constant(&mut self) -> Result<Constant> {
        let text = self.scan_until(&[';'])?.0;
        let (head, expression) = text
            .split_once(":=")
            .ok_or_else(|| self.error(format!("constant without `:=`: `{}`", text)))?;
        let (ty, name) = head
            .trim()
            .rsplit_once(char::is_whitespace)
            .ok_or_else(|| self.error(format!("constant without type: `{}`", head.trim())))?;
        Ok(Constant::new(name.trim(), ty.trim(), expression.trim()))
    }

    fn function(&mut self) -> Result<Function> {
        self.skip_trivia();
        let mut function = Function::new(self.ident()?);
        self.skip_trivia();
        self.expect('(')?;

        let params = self.scan_until(&[')'])?.0;
        for param in split_list(&params, ',') {
            let (ty, name) = param
                .rsplit_once(char::is_whitespace)
                .ok_or_else(|| self.error(format!("malformed function parameter `{}`", param)))?;
            function.params.push(Param::new(name.trim(), ty.trim()));
        }

        let (signature, stop) = self.scan_until(&[';', '{'])?;
        if let Some(return_type) = signature.strip_prefix("->") {
            function.return_type = return_type.trim().to_string();
        } else if !signature.is_empty() {
            return Err(self.error(format!("unexpected `{}` after parameters of `{}`", signature, function.name)));
        }

        if stop == '{' {
            let body = self.raw_block()?;
            let body = body.strip_prefix('\n').unwrap_or(&body);
            let body = body.strip_suffix('\n').unwrap_or(body);
            function.body = Some(body.to_string());
        }
        Ok(function)
    }

    fn place(&mut self) -> Result<Place> {
        self.skip_trivia();
        let mut place = Place::new(self.ident()?, "");
        self.skip_trivia();
        self.expect('{')?;

        loop {
            self.skip_trivia();
            if self.peek() == Some('}') {
                self.bump();
                break;
            }
            let attribute = self.ident()?;
            self.skip_trivia();
            self.expect(':')?;
            let value = self.scan_until(&[';'])?.0;
            match attribute.as_str() {
                "dom" => place.domain = value,
                "init" => place.init = Some(value),
                "capacity" => place.capacity = Some(value),
                "type" => place.type_tag = Some(value),
                other => {
                    return Err(self.error(format!("unknown attribute `{}` in place `{}`", other, place.name)))
                }
            }
        }
        Ok(place)
    }

    fn transition(&mut self) -> Result<Transition> {
        self.skip_trivia();
        let mut transition = Transition::new(self.ident()?);
        self.skip_trivia();
        self.expect('{')?;

        loop {
            self.skip_trivia();
            if self.peek() == Some('}') {
                self.bump();
                break;
            }
            let attribute = self.ident()?;
            self.skip_trivia();
            match attribute.as_str() {
                "in" => transition.inputs = self.arcs()?,
                "out" => transition.outputs = self.arcs()?,
                "inhibit" => transition.inhibitors = self.arcs()?,
                "let" => {
                    self.expect('{')?;
                    loop {
                        self.skip_trivia();
                        if self.peek() == Some('}') {
                            self.bump();
                            break;
                        }
                        let binding = self.scan_until(&[';'])?.0;
                        transition.add_let(binding);
                    }
                }
                "guard" | "priority" | "description" => {
                    self.expect(':')?;
                    let value = Some(self.scan_until(&[';'])?.0);
                    match attribute.as_str() {
                        "guard" => transition.guard = value,
                        "priority" => transition.priority = value,
                        _ => transition.description = value,
                    }
                }
                "safe" => {
                    self.expect(';')?;
                    transition.safe = true;
                }
                other => {
                    return Err(self.error(format!(
                        "unknown attribute `{}` in transition `{}`",
                        other, transition.name
                    )))
                }
            }
        }
        Ok(transition)
    }

    fn arcs(&mut self) -> Result<Vec<Arc>> {
        self.expect('{')?;
        let mut arcs = Vec::new();
        loop {
            self.skip_trivia();
            if self.peek() == Some('}') {
                self.bump();
                return Ok(arcs);
            }
            let text = self.scan_until(&[';'])?.0;
            let (place, label) = text
                .split_once(':')
                .ok_or_else(|| self.error(format!("malformed arc `{}`", text)))?;
            arcs.push(Arc::new(place.trim(), label.trim()));
        }
    }

    fn push_proposition(&mut self, net: &mut StructuredNet, declaration: String) {
        if self.in_propositions {
            if let Some(index) = net.len(Section::Transitions).checked_sub(1) {
                if let Ok(Node::Comment(comment)) = net.get_mut(Section::Transitions, index) {
                    comment.text.push('\n');
                    comment.text.push_str(&declaration);
                    return;
                }
            }
        }
        net.add_transition(Comment::new(declaration));
        self.in_propositions = true;
    }

    // ---- lexical helpers ----

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.advance(c.len_utf8());
        }
    }

    fn advance(&mut self, bytes: usize) {
        let end = (self.pos + bytes).min(self.text.len());
        self.line += self.text[self.pos..end].matches('\n').count();
        self.pos = end;
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::Parse {
            line: self.line,
            message: message.into(),
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected `{}`, found `{}`", expected, c))),
            None => Err(self.error(format!("expected `{}`, found end of input", expected))),
        }
    }

    fn ident(&mut self) -> Result<String> {
        let len = self
            .rest()
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(self.rest().len());
        if len == 0 {
            return Err(match self.peek() {
                Some(c) => self.error(format!("expected identifier, found `{}`", c)),
                None => self.error("expected identifier, found end of input"),
            });
        }
        let ident = self.rest()[..len].to_string();
        self.advance(len);
        Ok(ident)
    }

    /// Skip whitespace and comments, remembering sub-model banners until the
    /// next section banner
    fn skip_trivia(&mut self) {
        loop {
            let trimmed = self.rest().trim_start();
            let skipped = self.rest().len() - trimmed.len();
            self.advance(skipped);

            let rest = self.rest();
            let comment_len = if rest.starts_with("/*") {
                rest.find("*/").map(|end| end + 2).unwrap_or(rest.len())
            } else if rest.starts_with("//") {
                rest.find('\n').unwrap_or(rest.len())
            } else {
                return;
            };

            let comment = Comment::new(&rest[..comment_len]);
            if let Some(section) = Section::from_banner(&rest[..comment_len]) {
                // a sub-model never spans a section boundary
                debug!("entering {} section at line {}", section.label(), self.line);
                self.pending_place_banner = None;
                self.pending_transition_banner = None;
            } else if let Some(name) = comment.banner_name().filter(|n| !n.is_empty()) {
                self.pending_place_banner = Some(name.to_string());
                self.pending_transition_banner = Some(name.to_string());
            }
            self.advance(comment_len);
        }
    }

    /// Consume text up to the first of `stops` found outside brackets and
    /// string literals. Returns the trimmed text and the stop character.
    fn scan_until(&mut self, stops: &[char]) -> Result<(String, char)> {
        let rest = self.rest();
        let mut depth = 0usize;
        let mut in_string = false;

        for (i, c) in rest.char_indices() {
            if in_string {
                if c == '"' {
                    in_string = false;
                }
                continue;
            }
            if depth == 0 && stops.contains(&c) {
                let text = rest[..i].trim().to_string();
                self.advance(i + c.len_utf8());
                return Ok((text, c));
            }
            match c {
                '"' => in_string = true,
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }

        let expected: Vec<String> = stops.iter().map(|c| format!("`{}`", c)).collect();
        Err(self.error(format!(
            "unexpected end of input, expected {}",
            expected.join(" or ")
        )))
    }

    /// Consume a brace block whose `{` was already read, returning its raw content
    fn raw_block(&mut self) -> Result<String> {
        let rest = self.rest();
        let mut depth = 0usize;
        for (i, c) in rest.char_indices() {
            match c {
                '{' => depth += 1,
                '}' if depth == 0 => {
                    let body = rest[..i].to_string();
                    self.advance(i + 1);
                    return Ok(body);
                }
                '}' => depth -= 1,
                _ => {}
            }
        }
        Err(self.error("unexpected end of input, block is not closed"))
    }
}

fn split_list(text: &str, separator: char) -> Vec<String> {
    text.split(separator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTRACT: &str = r#"
Bank(N := 3) {
    type UINT : range 0 .. 255;
    type ADDRESS : range 0 .. 10;
    type STATE : struct { UINT total; ADDRESS owner; };
    type ACCOUNT : list[UINT] of UINT with capacity 4;
    subtype SMALL : UINT range 0 .. 9;
    constant UINT limit := 100;
    function inc (UINT x) -> UINT {
        return x + 1;
    }
    function dec (UINT x) -> UINT;

    /*
     * Function: state
     */
    place S {
        dom : STATE;
        init : <( {0, 1} )>;
    }

    /*
     * Function: deposit
     */
    place P_deposit { dom : ADDRESS * UINT; }
    place deposit_amt { dom : UINT; capacity : 1; }
    transition deposit_t1 {
        in { S : <( s )>; P_deposit : <( a, v )>; }
        out { S : <( {s.total + v, s.owner} )>; deposit_amt : <( v )>; }
        guard : v > 0;
        priority : 1;
    }
    // trailing line comment
    transition deposit_t2 {
        in { deposit_amt : <( v )>; }
        out { }
        let { UINT w := v; }
        safe;
    }
}
"#;

    #[test]
    fn test_parse_contract_layout() {
        let net = parse_net(CONTRACT).unwrap();
        assert_eq!(net.name, "Bank");
        assert_eq!(net.parameter(0).unwrap().render(), "N := 3");
        assert_eq!(net.len(Section::Colors), 6);
        assert_eq!(net.len(Section::Functions), 2);

        // banner + S, banner + P_deposit + deposit_amt
        assert_eq!(net.len(Section::Places), 5);
        assert_eq!(net.sub_models(Section::Places), vec!["state", "deposit"]);
        // only deposit announces itself before a transition
        assert_eq!(net.sub_models(Section::Transitions), vec!["deposit"]);

        let s = net.place_by_name("S").unwrap();
        assert_eq!(s.domain, "STATE");
        assert_eq!(s.init.as_deref(), Some("<( {0, 1} )>"));
        assert_eq!(net.place_by_name("deposit_amt").unwrap().capacity.as_deref(), Some("1"));

        let t1 = net.transition_by_name("deposit_t1").unwrap();
        assert_eq!(t1.inputs.len(), 2);
        assert_eq!(t1.output_to("S").unwrap().label, "<( {s.total + v, s.owner} )>");
        assert_eq!(t1.guard.as_deref(), Some("v > 0"));
        assert_eq!(t1.priority.as_deref(), Some("1"));

        let t2 = net.transition_by_name("deposit_t2").unwrap();
        assert!(t2.safe);
        assert_eq!(t2.lets, vec!["UINT w := v".to_string()]);
        assert!(t2.outputs.is_empty());
    }

    #[test]
    fn test_parse_colors_and_functions() {
        let net = parse_net(CONTRACT).unwrap();
        let colors: Vec<String> = net.colors().iter().map(Node::render).collect();
        assert_eq!(colors[0], "type UINT : range 0 .. 255;\n");
        assert_eq!(colors[2], "type STATE : struct { UINT total;ADDRESS owner;};\n");
        assert_eq!(colors[3], "type ACCOUNT : list[UINT] of UINT with capacity 4;\n");
        assert_eq!(colors[4], "subtype SMALL : UINT range 0 .. 9;\n");
        assert_eq!(colors[5], "constant UINT limit:=100;\n");

        match &net.functions()[0] {
            Node::Function(f) => {
                assert_eq!(f.name, "inc");
                assert_eq!(f.return_type, "UINT");
                assert_eq!(f.body.as_deref().map(str::trim), Some("return x + 1;"));
            }
            other => panic!("unexpected node: {:?}", other),
        }
        match &net.functions()[1] {
            Node::Function(f) => assert!(f.body.is_none()),
            other => panic!("unexpected node: {:?}", other),
        }
    }

    #[test]
    fn test_render_parse_render_is_stable() {
        let first = parse_net(CONTRACT).unwrap().render();
        let second = parse_net(&first).unwrap().render();
        assert_eq!(first, second);
    }

    #[test]
    fn test_propositions_are_kept_as_one_trailing_comment() {
        let text = "N {\n transition t { in { } out { } }\n\
                    proposition a: p'card > 0;\nproposition b: q'card > 0;\n}";
        let net = parse_net(text).unwrap();
        assert_eq!(net.len(Section::Transitions), 2);
        assert_eq!(
            net.transitions()[1].render(),
            "proposition a: p'card > 0;\nproposition b: q'card > 0;"
        );
    }

    #[test]
    fn test_place_banner_stays_in_its_section() {
        let mut net = StructuredNet::new("N");
        net.add_place(Comment::banner("state"));
        net.add_place(Place::new("S", "STATE"));
        net.add_transition(Transition::new("t"));

        let parsed = parse_net(&net.render()).unwrap();
        assert_eq!(parsed.len(Section::Transitions), 1);
        assert!(parsed.sub_models(Section::Transitions).is_empty());
        assert_eq!(parsed, net);
    }

    #[test]
    fn test_parse_errors_carry_line() {
        let err = parse_net("N {\n\n  bogus x;\n}").unwrap_err();
        match err {
            Error::Parse { line, message } => {
                assert_eq!(line, 3);
                assert!(message.contains("bogus"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(parse_net("N {\n place p { dom : UINT;\n").is_err());
        assert!(parse_net("N {\n place p { color : UINT; }\n}").is_err());
    }
}
