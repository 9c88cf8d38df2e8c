#![forbid(unsafe_code)]

//! Fragment markup: a strict HTML subset for building fixtures.
//!
//! Handles tags with quoted, unquoted and bare attributes, void and
//! self-closing elements, comments, and the basic character references
//! (`&amp;` `&lt;` `&gt;` `&quot;` `&apos;` `&#39;`). Unlike HTML there is no
//! error recovery: mismatched or unclosed tags fail the parse.

use crate::error::{MarkupError, MarkupErrorKind};
use crate::node::{Element, Node, Text, is_void};

/// Parse `input` into detached top-level nodes.
pub fn parse_fragment(input: &str) -> Result<Vec<Node>, MarkupError> {
    Parser::new(input).run()
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    roots: Vec<Node>,
    open: Vec<Element>,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            roots: Vec::new(),
            open: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn starts_with(&self, prefix: &str) -> bool {
        let mut at = self.pos;
        for c in prefix.chars() {
            if self.chars.get(at) != Some(&c) {
                return false;
            }
            at += 1;
        }
        true
    }

    fn error(&self, kind: MarkupErrorKind) -> MarkupError {
        MarkupError::new(self.pos, kind)
    }

    fn unexpected(&self) -> MarkupError {
        match self.peek() {
            Some(c) => self.error(MarkupErrorKind::UnexpectedChar(c)),
            None => self.error(MarkupErrorKind::UnexpectedEnd),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, c: char) -> Result<(), MarkupError> {
        if self.peek() == Some(c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn append(&mut self, node: Node) {
        match self.open.last() {
            Some(parent) => parent.push_node(node),
            None => self.roots.push(node),
        }
    }

    fn run(mut self) -> Result<Vec<Node>, MarkupError> {
        while self.pos < self.chars.len() {
            if self.starts_with("<!--") {
                self.comment()?;
            } else if self.starts_with("</") {
                self.close_tag()?;
            } else if self.peek() == Some('<') {
                self.open_tag()?;
            } else {
                self.text();
            }
        }
        if let Some(unclosed) = self.open.last() {
            return Err(self.error(MarkupErrorKind::UnclosedTag(
                unclosed.tag_name().to_owned(),
            )));
        }
        Ok(self.roots)
    }

    fn comment(&mut self) -> Result<(), MarkupError> {
        let open = self.pos;
        self.pos += 4;
        while self.pos < self.chars.len() {
            if self.starts_with("-->") {
                self.pos += 3;
                return Ok(());
            }
            self.pos += 1;
        }
        Err(MarkupError::new(open, MarkupErrorKind::UnterminatedComment))
    }

    fn tag_name(&mut self) -> Result<String, MarkupError> {
        if !self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            return Err(self.error(MarkupErrorKind::InvalidTagName));
        }
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            self.pos += 1;
        }
        Ok(self.chars[start..self.pos]
            .iter()
            .collect::<String>()
            .to_ascii_lowercase())
    }

    fn close_tag(&mut self) -> Result<(), MarkupError> {
        let at = self.pos;
        self.pos += 2;
        let name = self.tag_name()?;
        self.skip_whitespace();
        self.expect('>')?;
        match self.open.pop() {
            Some(open) if open.tag_name() == name => Ok(()),
            Some(open) => Err(MarkupError::new(
                at,
                MarkupErrorKind::MismatchedTag {
                    expected: open.tag_name().to_owned(),
                    found: name,
                },
            )),
            None => Err(MarkupError::new(
                at,
                MarkupErrorKind::UnexpectedCloseTag(name),
            )),
        }
    }

    fn open_tag(&mut self) -> Result<(), MarkupError> {
        self.pos += 1;
        let name = self.tag_name()?;
        let element = Element::new(&name);
        let self_closing = loop {
            self.skip_whitespace();
            match self.peek() {
                Some('>') => {
                    self.pos += 1;
                    break false;
                }
                Some('/') => {
                    self.pos += 1;
                    self.expect('>')?;
                    break true;
                }
                None => return Err(self.unexpected()),
                Some(_) => {
                    let (attr, value) = self.attribute()?;
                    element.set_attribute(&attr, &value);
                }
            }
        };
        self.append(Node::Element(element.clone()));
        if !self_closing && !is_void(&name) {
            self.open.push(element);
        }
        Ok(())
    }

    fn attribute(&mut self) -> Result<(String, String), MarkupError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| !c.is_whitespace() && !matches!(c, '=' | '>' | '/' | '"' | '\'' | '<'))
        {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.unexpected());
        }
        let name: String = self.chars[start..self.pos].iter().collect();
        self.skip_whitespace();
        if self.peek() != Some('=') {
            return Ok((name, String::new()));
        }
        self.pos += 1;
        self.skip_whitespace();
        let raw = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                let open = self.pos;
                self.pos += 1;
                let value_start = self.pos;
                while self.peek().is_some_and(|c| c != quote) {
                    self.pos += 1;
                }
                if self.peek().is_none() {
                    return Err(MarkupError::new(open, MarkupErrorKind::UnexpectedEnd));
                }
                let raw: String = self.chars[value_start..self.pos].iter().collect();
                self.pos += 1;
                raw
            }
            _ => {
                let value_start = self.pos;
                while self
                    .peek()
                    .is_some_and(|c| !c.is_whitespace() && c != '>')
                {
                    self.pos += 1;
                }
                if self.pos == value_start {
                    return Err(self.unexpected());
                }
                self.chars[value_start..self.pos].iter().collect()
            }
        };
        Ok((name, decode_entities(&raw)))
    }

    fn text(&mut self) {
        let start = self.pos;
        while self.peek().is_some_and(|c| c != '<') {
            self.pos += 1;
        }
        let raw: String = self.chars[start..self.pos].iter().collect();
        self.append(Node::Text(Text::new(decode_entities(&raw))));
    }
}

const ENTITIES: &[(&str, char)] = &[
    ("&amp;", '&'),
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&quot;", '"'),
    ("&apos;", '\''),
    ("&#39;", '\''),
];

/// Replace the basic character references. Unknown ones are left as-is.
#[must_use]
pub fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_owned();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(at) = rest.find('&') {
        out.push_str(&rest[..at]);
        rest = &rest[at..];
        match ENTITIES.iter().find(|(name, _)| rest.starts_with(name)) {
            Some((name, c)) => {
                out.push(*c);
                rest = &rest[name.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn escape_into(raw: &str, attribute: bool, out: &mut String) {
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

/// Append the markup for `node` to `out`.
pub fn serialize(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => escape_into(&text.content(), false, out),
        Node::Element(element) => {
            out.push('<');
            out.push_str(element.tag_name());
            for (name, value) in element.attributes() {
                out.push(' ');
                out.push_str(&name);
                out.push_str("=\"");
                escape_into(&value, true, out);
                out.push('"');
            }
            out.push('>');
            if is_void(element.tag_name()) {
                return;
            }
            for child in element.child_nodes() {
                serialize(&child, out);
            }
            out.push_str("</");
            out.push_str(element.tag_name());
            out.push('>');
        }
    }
}
