//! Minimal XML Tree Parser
//!
//! A small, tolerant XML subset parser for timed-text caption documents.
//! Supports the structures those documents actually use: nested elements,
//! attributes in either quote style, text nodes, CDATA, comments, processing
//! instructions, a doctype, and the standard character entities.
//!
//! Anything structurally invalid is an error; the caption parser maps that
//! to an empty result rather than failing the pipeline.

use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Errors produced while building the document tree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XmlError {
    #[error("Unexpected end of input")]
    UnexpectedEof,

    #[error("Unexpected character '{0}' at offset {1}")]
    UnexpectedChar(char, usize),

    #[error("Mismatched closing tag: expected </{expected}>, found </{found}>")]
    MismatchedTag { expected: String, found: String },

    #[error("Invalid character reference: {0}")]
    InvalidCharRef(String),

    #[error("Document has no root element")]
    NoRootElement,
}

// =============================================================================
// Document Tree
// =============================================================================

/// A child of an element: either a nested element or a run of text
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An element with its attributes and children, in document order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    /// Tag name as written, possibly prefixed (e.g. "tt:p")
    pub name: String,
    /// Attributes as written, in document order
    pub attributes: Vec<(String, String)>,
    /// Child nodes in document order
    pub children: Vec<Node>,
}

impl Element {
    /// Returns the tag name with any namespace prefix stripped
    pub fn local_name(&self) -> &str {
        match self.name.rsplit_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// Looks up an attribute by local name, ignoring any namespace prefix
    /// (so "lang" matches both `lang` and `xml:lang`)
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| {
                let attr_local = match name.rsplit_once(':') {
                    Some((_, l)) => l,
                    None => name.as_str(),
                };
                attr_local == local
            })
            .map(|(_, value)| value.as_str())
    }
}

/// Parses a document into its root element
pub fn parse(input: &str) -> Result<Element, XmlError> {
    let mut cursor = Cursor::new(input);
    cursor.skip_misc();

    if cursor.peek().is_none() {
        return Err(XmlError::NoRootElement);
    }

    let root = cursor.parse_element()?;
    cursor.skip_misc();

    match cursor.peek() {
        None => Ok(root),
        Some(c) => Err(XmlError::UnexpectedChar(c, cursor.pos)),
    }
}

// =============================================================================
// Cursor
// =============================================================================

struct Cursor {
    chars: Vec<char>,
    pos: usize,
}

impl Cursor {
    fn new(input: &str) -> Self {
        Self {
            chars: input.trim_start_matches('\u{FEFF}').chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn starts_with(&self, s: &str) -> bool {
        s.chars()
            .enumerate()
            .all(|(i, c)| self.chars.get(self.pos + i) == Some(&c))
    }

    fn expect(&mut self, expected: char) -> Result<(), XmlError> {
        match self.next() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(XmlError::UnexpectedChar(c, self.pos - 1)),
            None => Err(XmlError::UnexpectedEof),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    /// Skips whitespace, comments, processing instructions and a doctype —
    /// everything allowed around the root element and between children.
    fn skip_misc(&mut self) {
        loop {
            self.skip_whitespace();
            if self.starts_with("<!--") {
                self.skip_until("-->");
            } else if self.starts_with("<?") {
                self.skip_until("?>");
            } else if self.starts_with("<!DOCTYPE") || self.starts_with("<!doctype") {
                self.skip_until(">");
            } else {
                return;
            }
        }
    }

    /// Advances past the next occurrence of `marker` (or to end of input)
    fn skip_until(&mut self, marker: &str) {
        while self.peek().is_some() {
            if self.starts_with(marker) {
                self.pos += marker.chars().count();
                return;
            }
            self.pos += 1;
        }
    }

    /// Reads the text up to the next occurrence of `marker`, consuming both
    fn take_until(&mut self, marker: &str) -> Result<String, XmlError> {
        let mut out = String::new();
        while self.peek().is_some() {
            if self.starts_with(marker) {
                self.pos += marker.chars().count();
                return Ok(out);
            }
            out.push(self.chars[self.pos]);
            self.pos += 1;
        }
        Err(XmlError::UnexpectedEof)
    }

    fn read_name(&mut self) -> Result<String, XmlError> {
        let mut name = String::new();
        match self.peek() {
            Some(c) if c.is_alphabetic() || c == '_' => {
                name.push(c);
                self.pos += 1;
            }
            Some(c) => return Err(XmlError::UnexpectedChar(c, self.pos)),
            None => return Err(XmlError::UnexpectedEof),
        }
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':') {
                name.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(name)
    }

    /// Parses an element starting at its '<'
    fn parse_element(&mut self) -> Result<Element, XmlError> {
        self.expect('<')?;
        let name = self.read_name()?;
        let attributes = self.parse_attributes()?;

        self.skip_whitespace();
        if self.starts_with("/>") {
            self.pos += 2;
            return Ok(Element {
                name,
                attributes,
                children: Vec::new(),
            });
        }
        self.expect('>')?;

        let children = self.parse_children(&name)?;
        Ok(Element {
            name,
            attributes,
            children,
        })
    }

    fn parse_attributes(&mut self) -> Result<Vec<(String, String)>, XmlError> {
        let mut attributes = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('>') | Some('/') => return Ok(attributes),
                Some(_) => {}
                None => return Err(XmlError::UnexpectedEof),
            }

            let name = self.read_name()?;
            self.skip_whitespace();
            self.expect('=')?;
            self.skip_whitespace();

            let quote = match self.next() {
                Some(q @ ('"' | '\'')) => q,
                Some(c) => return Err(XmlError::UnexpectedChar(c, self.pos - 1)),
                None => return Err(XmlError::UnexpectedEof),
            };
            let raw = self.take_until(&quote.to_string())?;
            attributes.push((name, decode_entities(&raw)?));
        }
    }

    /// Parses child nodes until the matching close tag for `parent`
    fn parse_children(&mut self, parent: &str) -> Result<Vec<Node>, XmlError> {
        let mut children = Vec::new();
        loop {
            if self.starts_with("</") {
                self.pos += 2;
                let found = self.read_name()?;
                self.skip_whitespace();
                self.expect('>')?;
                if found != parent {
                    return Err(XmlError::MismatchedTag {
                        expected: parent.to_string(),
                        found,
                    });
                }
                return Ok(children);
            }

            if self.starts_with("<!--") {
                self.skip_until("-->");
            } else if self.starts_with("<![CDATA[") {
                self.pos += "<![CDATA[".chars().count();
                let raw = self.take_until("]]>")?;
                children.push(Node::Text(raw));
            } else if self.starts_with("<?") {
                self.skip_until("?>");
            } else if self.peek() == Some('<') {
                children.push(Node::Element(self.parse_element()?));
            } else if self.peek().is_some() {
                let mut text = String::new();
                while let Some(c) = self.peek() {
                    if c == '<' {
                        break;
                    }
                    text.push(c);
                    self.pos += 1;
                }
                children.push(Node::Text(decode_entities(&text)?));
            } else {
                return Err(XmlError::UnexpectedEof);
            }
        }
    }
}

// =============================================================================
// Entities
// =============================================================================

/// Decodes the five named entities and numeric character references
fn decode_entities(input: &str) -> Result<String, XmlError> {
    if !input.contains('&') {
        return Ok(input.to_string());
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let Some(semi) = rest.find(';') else {
            return Err(XmlError::InvalidCharRef(rest.to_string()));
        };
        let entity = &rest[1..semi];
        match entity {
            "amp" => out.push('&'),
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "quot" => out.push('"'),
            "apos" => out.push('\''),
            _ => {
                let code = if let Some(hex) = entity.strip_prefix("#x").or(entity.strip_prefix("#X")) {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                match code.and_then(char::from_u32) {
                    Some(c) => out.push(c),
                    None => return Err(XmlError::InvalidCharRef(entity.to_string())),
                }
            }
        }
        rest = &rest[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

// =============================================================================
// Tests
// =============================================================================
