#![forbid(unsafe_code)]

//! A small CSS selector subset.
//!
//! Supported:
//!
//! - type selectors (`div`), the universal selector (`*`)
//! - `#id`, `.class`
//! - `[attr]`, `[attr=value]`, `[attr="quoted value"]`
//! - descendant (whitespace) and child (`>`) combinators
//! - selector groups separated by `,`
//!
//! Matching runs right to left from the candidate element. Ancestor walks use
//! [`Element::parent`], so they stop at a shadow root boundary.

use crate::error::{SelectorError, SelectorErrorKind};
use crate::node::Element;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrMatch {
    Exists(String),
    Equals(String, String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<AttrMatch>,
}

impl Compound {
    fn matches(&self, element: &Element) -> bool {
        if self.tag.as_deref().is_some_and(|tag| tag != element.tag_name()) {
            return false;
        }
        if !self.ids.is_empty() {
            let id = element.id();
            if !self.ids.iter().all(|want| id.as_deref() == Some(want.as_str())) {
                return false;
            }
        }
        if !self.classes.iter().all(|class| element.has_class(class)) {
            return false;
        }
        self.attrs.iter().all(|attr| match attr {
            AttrMatch::Exists(name) => element.has_attribute(name),
            AttrMatch::Equals(name, value) => {
                element.get_attribute(name).as_deref() == Some(value.as_str())
            }
        })
    }
}

/// One selector of a group: compounds joined by combinators.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`.
    combinators: Vec<Combinator>,
}

impl Complex {
    fn matches(&self, element: &Element) -> bool {
        self.matches_at(self.compounds.len() - 1, element)
    }

    fn matches_at(&self, index: usize, element: &Element) -> bool {
        if !self.compounds[index].matches(element) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match self.combinators[index - 1] {
            Combinator::Child => element
                .parent()
                .is_some_and(|parent| self.matches_at(index - 1, &parent)),
            Combinator::Descendant => {
                let mut ancestor = element.parent();
                while let Some(candidate) = ancestor {
                    if self.matches_at(index - 1, &candidate) {
                        return true;
                    }
                    ancestor = candidate.parent();
                }
                false
            }
        }
    }
}

/// A parsed, comma-separated selector group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<Complex>,
}

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        Parser::new(input).parse_list()
    }

    /// Whether `element` matches any selector in the group.
    #[must_use]
    pub fn matches(&self, element: &Element) -> bool {
        self.selectors.iter().any(|selector| selector.matches(element))
    }

    /// Number of comma-separated selectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn error(&self, kind: SelectorErrorKind) -> SelectorError {
        SelectorError::new(self.pos, kind)
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(c) => self.error(SelectorErrorKind::UnexpectedChar(c)),
            None => self.error(SelectorErrorKind::UnexpectedEnd),
        }
    }

    /// Returns whether any whitespace was consumed.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn parse_list(mut self) -> Result<SelectorList, SelectorError> {
        let mut selectors = Vec::new();
        loop {
            self.skip_whitespace();
            if matches!(self.peek(), None | Some(',')) {
                return Err(self.error(SelectorErrorKind::Empty));
            }
            selectors.push(self.parse_complex()?);
            match self.peek() {
                None => break,
                Some(',') => self.pos += 1,
                Some(_) => return Err(self.unexpected()),
            }
        }
        Ok(SelectorList { selectors })
    }

    fn parse_complex(&mut self) -> Result<Complex, SelectorError> {
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_space = self.skip_whitespace();
            match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    combinators.push(Combinator::Child);
                }
                Some(_) if had_space => combinators.push(Combinator::Descendant),
                Some(_) => return Err(self.unexpected()),
            }
            compounds.push(self.parse_compound()?);
        }
        Ok(Complex {
            compounds,
            combinators,
        })
    }

    fn parse_compound(&mut self) -> Result<Compound, SelectorError> {
        let start = self.pos;
        let mut compound = Compound::default();
        match self.peek() {
            Some('*') => self.pos += 1,
            Some(c) if is_ident_start(c) => {
                compound.tag = Some(self.ident()?.to_ascii_lowercase());
            }
            _ => {}
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.ids.push(self.ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attrs.push(self.attribute()?);
                }
                _ => break,
            }
        }
        if self.pos == start {
            return Err(self.unexpected());
        }
        Ok(compound)
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        if !self.peek().is_some_and(is_ident_start) {
            return Err(self.error(SelectorErrorKind::ExpectedIdent));
        }
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn attribute(&mut self) -> Result<AttrMatch, SelectorError> {
        self.skip_whitespace();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_whitespace();
        let matcher = match self.peek() {
            Some(']') => AttrMatch::Exists(name),
            Some('=') => {
                self.pos += 1;
                self.skip_whitespace();
                let value = match self.peek() {
                    Some(quote @ ('"' | '\'')) => self.quoted(quote)?,
                    _ => self.ident()?,
                };
                self.skip_whitespace();
                AttrMatch::Equals(name, value)
            }
            _ => return Err(self.unexpected()),
        };
        if self.peek() != Some(']') {
            return Err(self.unexpected());
        }
        self.pos += 1;
        Ok(matcher)
    }

    fn quoted(&mut self, quote: char) -> Result<String, SelectorError> {
        let open = self.pos;
        self.pos += 1;
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == quote {
                let value = self.chars[start..self.pos].iter().collect();
                self.pos += 1;
                return Ok(value);
            }
            self.pos += 1;
        }
        Err(SelectorError::new(open, SelectorErrorKind::UnterminatedString))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}
