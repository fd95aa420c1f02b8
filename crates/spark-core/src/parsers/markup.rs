//! Minimal XML well-formedness scanner.
//!
//! The classifier only needs two things from a document: whether it is
//! well-formed XML, and the name and attributes of its root element. This
//! module walks the whole document to answer the first question and keeps
//! only the root element for the second.
//!
//! Accepted before the root: a UTF-8 BOM, the XML declaration, comments,
//! processing instructions and a DOCTYPE (including an internal subset).
//! Only the five predefined entities and numeric character references are
//! resolved; any other entity reference is an error.
//!
//! Names are checked against XML namespace rules: a qualified name has at
//! most one colon with a non-empty prefix and local part, and every prefix
//! other than `xml` must be declared by an `xmlns:prefix` attribute on the
//! element itself or an ancestor. Namespace URIs are not otherwise
//! interpreted.
//!
//! ## Security
//!
//! Nesting is tracked with an explicit stack rather than recursion, so deeply
//! nested input cannot exhaust the call stack. No external entities or DTDs
//! are ever fetched.

use thiserror::Error;

/// Root element of a well-formed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootElement {
    /// Qualified tag name exactly as written (prefix included).
    pub name: String,
    /// Attributes in document order, values entity-decoded.
    pub attributes: Vec<(String, String)>,
}

impl RootElement {
    /// Look up an attribute by exact name, like DOM `getAttribute` on an XML
    /// document.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Reasons a document is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkupError {
    #[error("document has no root element")]
    MissingRoot,

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("unexpected character '{found}' at byte {offset}")]
    UnexpectedChar { found: char, offset: usize },

    #[error("invalid name at byte {offset}")]
    InvalidName { offset: usize },

    #[error("expected '</{expected}>' but found '</{found}>'")]
    MismatchedTag { expected: String, found: String },

    #[error("invalid entity or character reference at byte {offset}")]
    InvalidReference { offset: usize },

    #[error("duplicate attribute '{name}'")]
    DuplicateAttribute { name: String },

    #[error("content after the root element at byte {offset}")]
    TrailingContent { offset: usize },

    #[error("misplaced XML declaration at byte {offset}")]
    MisplacedDeclaration { offset: usize },

    #[error("'{name}' is not a valid qualified name")]
    InvalidQualifiedName { name: String },

    #[error("namespace prefix of '{name}' is not declared")]
    UndeclaredPrefix { name: String },
}

type MarkupResult<T> = Result<T, MarkupError>;

/// Parse `content` and return its root element.
///
/// Fails on anything a conforming non-validating XML parser would reject
/// for the constructs listed in the module docs.
pub fn parse_root(content: &str) -> MarkupResult<RootElement> {
    let mut scanner = Scanner::new(content.strip_prefix('\u{feff}').unwrap_or(content));

    scanner.skip_declaration()?;
    scanner.skip_misc(true)?;
    if scanner.at_end() {
        return Err(MarkupError::MissingRoot);
    }

    let root = scanner.parse_element_tree()?;

    scanner.skip_misc(false)?;
    if !scanner.at_end() {
        return Err(MarkupError::TrailingContent {
            offset: scanner.pos,
        });
    }
    Ok(root)
}

/// Start tag as read from the input.
struct StartTag {
    name: String,
    attributes: Vec<(String, String)>,
    self_closing: bool,
}

impl StartTag {
    /// Prefixes declared by this tag's `xmlns:prefix` attributes.
    fn declared_prefixes(&self) -> MarkupResult<Vec<String>> {
        let mut prefixes = Vec::new();
        for (key, value) in &self.attributes {
            let Some(prefix) = key.strip_prefix("xmlns:") else {
                continue;
            };
            // Undeclaring a prefix is not allowed in namespaces 1.0.
            if prefix == "xmlns" || value.is_empty() {
                return Err(MarkupError::InvalidQualifiedName { name: key.clone() });
            }
            prefixes.push(prefix.to_string());
        }
        Ok(prefixes)
    }

    /// Check the tag and attribute names against the prefixes in scope.
    fn check_namespaces(&self, in_scope: &[String]) -> MarkupResult<()> {
        let bound = |prefix: &str| prefix == "xml" || in_scope.iter().any(|p| p == prefix);

        match split_qualified_name(&self.name)? {
            Some("xmlns") => {
                return Err(MarkupError::InvalidQualifiedName {
                    name: self.name.clone(),
                });
            }
            Some(prefix) if !bound(prefix) => {
                return Err(MarkupError::UndeclaredPrefix {
                    name: self.name.clone(),
                });
            }
            _ => {}
        }
        for (key, _) in &self.attributes {
            match split_qualified_name(key)? {
                Some(prefix) if prefix != "xmlns" && !bound(prefix) => {
                    return Err(MarkupError::UndeclaredPrefix { name: key.clone() });
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Element open while scanning, with the length of the prefix scope to
/// restore when it closes.
struct OpenElement {
    name: String,
    scope_len: usize,
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn starts_with(&self, needle: &str) -> bool {
        self.rest().starts_with(needle)
    }

    fn bump(&mut self) -> MarkupResult<char> {
        let c = self.peek().ok_or(MarkupError::UnexpectedEof)?;
        self.pos += c.len_utf8();
        Ok(c)
    }

    fn expect(&mut self, literal: &str) -> MarkupResult<()> {
        if self.starts_with(literal) {
            self.pos += literal.len();
            return Ok(());
        }
        match self.peek() {
            Some(found) => Err(MarkupError::UnexpectedChar {
                found,
                offset: self.pos,
            }),
            None => Err(MarkupError::UnexpectedEof),
        }
    }

    /// Skip whitespace, returning whether any was consumed.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !is_whitespace(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        self.pos > start
    }

    /// Advance past the next occurrence of `terminator`, returning the text
    /// before it.
    fn take_until(&mut self, terminator: &str) -> MarkupResult<&'a str> {
        let rest = self.rest();
        let idx = rest.find(terminator).ok_or(MarkupError::UnexpectedEof)?;
        self.pos += idx + terminator.len();
        Ok(&rest[..idx])
    }

    fn read_name(&mut self) -> MarkupResult<&'a str> {
        let start = self.pos;
        match self.peek() {
            Some(c) if is_name_start(c) => self.pos += c.len_utf8(),
            Some(_) => return Err(MarkupError::InvalidName { offset: start }),
            None => return Err(MarkupError::UnexpectedEof),
        }
        while let Some(c) = self.peek() {
            if !is_name_char(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        Ok(&self.src[start..self.pos])
    }

    fn skip_declaration(&mut self) -> MarkupResult<()> {
        if self.starts_with("<?xml") {
            let after = self.src[self.pos + 5..].chars().next();
            if after.is_some_and(is_whitespace) {
                self.take_until("?>")?;
            }
        }
        Ok(())
    }

    /// Skip comments, processing instructions and whitespace. In the prolog a
    /// single DOCTYPE is also allowed.
    fn skip_misc(&mut self, prolog: bool) -> MarkupResult<()> {
        let mut seen_doctype = false;
        loop {
            self.skip_whitespace();
            if self.starts_with("<!--") {
                self.skip_comment()?;
            } else if self.starts_with("<?") {
                self.skip_processing_instruction()?;
            } else if prolog && !seen_doctype && self.starts_with("<!DOCTYPE") {
                self.skip_doctype()?;
                seen_doctype = true;
            } else {
                break;
            }
        }
        match self.peek() {
            None => Ok(()),
            Some('<') if prolog => Ok(()),
            Some(found) if prolog => Err(MarkupError::UnexpectedChar {
                found,
                offset: self.pos,
            }),
            Some(_) => Err(MarkupError::TrailingContent { offset: self.pos }),
        }
    }

    fn skip_comment(&mut self) -> MarkupResult<()> {
        let start = self.pos;
        self.expect("<!--")?;
        let body = self.take_until("-->")?;
        if body.contains("--") || body.ends_with('-') {
            return Err(MarkupError::UnexpectedChar {
                found: '-',
                offset: start,
            });
        }
        Ok(())
    }

    fn skip_processing_instruction(&mut self) -> MarkupResult<()> {
        let start = self.pos;
        self.expect("<?")?;
        let target = self.read_name()?;
        if target.eq_ignore_ascii_case("xml") {
            return Err(MarkupError::MisplacedDeclaration { offset: start });
        }
        self.take_until("?>")?;
        Ok(())
    }

    fn skip_doctype(&mut self) -> MarkupResult<()> {
        self.expect("<!DOCTYPE")?;
        if !self.skip_whitespace() {
            return Err(MarkupError::UnexpectedEof);
        }
        self.read_name()?;
        let mut quote: Option<char> = None;
        let mut in_subset = false;
        loop {
            let c = self.bump()?;
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"' | '\'') => quote = Some(c),
                (None, '[') if !in_subset => in_subset = true,
                (None, ']') if in_subset => in_subset = false,
                (None, '>') if !in_subset => return Ok(()),
                _ => {}
            }
        }
    }

    /// Parse the root element and all of its descendants.
    fn parse_element_tree(&mut self) -> MarkupResult<RootElement> {
        let mut in_scope: Vec<String> = Vec::new();
        let mut open: Vec<OpenElement> = Vec::new();

        let root = self.parse_start_tag()?;
        enter_element(&root, &mut in_scope, &mut open)?;

        while let Some(current) = open.last() {
            if self.at_end() {
                return Err(MarkupError::UnexpectedEof);
            }
            if self.starts_with("</") {
                let offset = self.pos;
                self.pos += 2;
                let name = self.read_name()?;
                self.skip_whitespace();
                self.expect(">")?;
                if name != current.name {
                    tracing::trace!(offset, "closing tag does not match open element");
                    return Err(MarkupError::MismatchedTag {
                        expected: current.name.clone(),
                        found: name.to_string(),
                    });
                }
                let scope_len = current.scope_len;
                open.pop();
                in_scope.truncate(scope_len);
            } else if self.starts_with("<!--") {
                self.skip_comment()?;
            } else if self.starts_with("<![CDATA[") {
                self.pos += "<![CDATA[".len();
                self.take_until("]]>")?;
            } else if self.starts_with("<?") {
                self.skip_processing_instruction()?;
            } else if self.starts_with("<") {
                let tag = self.parse_start_tag()?;
                enter_element(&tag, &mut in_scope, &mut open)?;
            } else {
                self.skip_text()?;
            }
        }

        Ok(RootElement {
            name: root.name,
            attributes: root.attributes,
        })
    }

    fn parse_start_tag(&mut self) -> MarkupResult<StartTag> {
        self.expect("<")?;
        let name = self.read_name()?.to_string();
        let mut attributes: Vec<(String, String)> = Vec::new();

        loop {
            let had_space = self.skip_whitespace();
            if self.starts_with("/>") {
                self.pos += 2;
                return Ok(StartTag {
                    name,
                    attributes,
                    self_closing: true,
                });
            }
            if self.starts_with(">") {
                self.pos += 1;
                return Ok(StartTag {
                    name,
                    attributes,
                    self_closing: false,
                });
            }
            if self.at_end() {
                return Err(MarkupError::UnexpectedEof);
            }
            if !had_space {
                let found = self.peek().unwrap_or('\0');
                return Err(MarkupError::UnexpectedChar {
                    found,
                    offset: self.pos,
                });
            }

            let key = self.read_name()?.to_string();
            self.skip_whitespace();
            self.expect("=")?;
            self.skip_whitespace();
            let value = self.read_attribute_value()?;
            if attributes.iter().any(|(existing, _)| *existing == key) {
                return Err(MarkupError::DuplicateAttribute { name: key });
            }
            attributes.push((key, value));
        }
    }

    fn read_attribute_value(&mut self) -> MarkupResult<String> {
        let offset = self.pos;
        let quote = match self.bump()? {
            q @ ('"' | '\'') => q,
            found => return Err(MarkupError::UnexpectedChar { found, offset }),
        };
        let mut value = String::new();
        loop {
            let c = self.bump()?;
            match c {
                c if c == quote => return Ok(value),
                '<' => {
                    return Err(MarkupError::UnexpectedChar {
                        found: '<',
                        offset: self.pos - 1,
                    });
                }
                '&' => value.push_str(&self.read_reference()?),
                '\r' => {
                    // A literal CRLF is one line break.
                    if self.peek() == Some('\n') {
                        self.pos += 1;
                    }
                    value.push(' ');
                }
                '\t' | '\n' => value.push(' '),
                c => value.push(c),
            }
        }
    }

    /// Character data between tags; only references need checking.
    fn skip_text(&mut self) -> MarkupResult<()> {
        while let Some(c) = self.peek() {
            match c {
                '<' => break,
                '&' => {
                    self.pos += 1;
                    self.read_reference()?;
                }
                c => self.pos += c.len_utf8(),
            }
        }
        Ok(())
    }

    /// Resolve a reference whose leading `&` was already consumed.
    fn read_reference(&mut self) -> MarkupResult<String> {
        let offset = self.pos - 1;
        let body = self
            .take_until(";")
            .map_err(|_| MarkupError::InvalidReference { offset })?;
        decode_reference(body)
            .map(String::from)
            .ok_or(MarkupError::InvalidReference { offset })
    }
}

/// Bring `tag`'s namespace declarations into scope and validate it. Open
/// tags stay on `open` until their end tag; self-closing tags drop their
/// declarations again immediately.
fn enter_element(
    tag: &StartTag,
    in_scope: &mut Vec<String>,
    open: &mut Vec<OpenElement>,
) -> MarkupResult<()> {
    let scope_len = in_scope.len();
    in_scope.extend(tag.declared_prefixes()?);
    tag.check_namespaces(in_scope)?;
    if tag.self_closing {
        in_scope.truncate(scope_len);
    } else {
        open.push(OpenElement {
            name: tag.name.clone(),
            scope_len,
        });
    }
    Ok(())
}

/// Split `name` into its prefix, if any. Fails when the name is not a
/// valid qualified name.
fn split_qualified_name(name: &str) -> MarkupResult<Option<&str>> {
    let Some((prefix, local)) = name.split_once(':') else {
        return Ok(None);
    };
    let local_ok = local.chars().next().is_some_and(is_name_start) && !local.contains(':');
    if prefix.is_empty() || !local_ok {
        return Err(MarkupError::InvalidQualifiedName {
            name: name.to_string(),
        });
    }
    Ok(Some(prefix))
}

fn decode_reference(body: &str) -> Option<char> {
    match body {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let digits = body.strip_prefix('#')?;
            let code = match digits.strip_prefix('x') {
                Some(hex) if !hex.is_empty() => u32::from_str_radix(hex, 16).ok()?,
                Some(_) => return None,
                None if !digits.is_empty() => digits.parse::<u32>().ok()?,
                None => return None,
            };
            char::from_u32(code).filter(|&c| is_xml_char(c))
        }
    }
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == ':' || (!c.is_ascii() && c.is_alphabetic())
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || c == '-' || c == '.' || (!c.is_ascii() && c.is_alphanumeric())
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || c >= ' '
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn parse_root_never_panics(content in ".*") {
            let _ = parse_root(&content);
        }

        #[test]
        fn parse_root_never_panics_on_markup_soup(
            content in "[<>/!?\\[\\]&;#x=\"' a-z0-9-]{0,64}"
        ) {
            let _ = parse_root(&content);
        }

        #[test]
        fn well_formed_element_round_trips_name(
            name in "[a-z][a-z0-9]{0,8}",
            value in "[a-zA-Z0-9 ]{0,16}"
        ) {
            let doc = format!("<{name} k=\"{value}\"><child/></{name}>");
            let root = parse_root(&doc).unwrap();
            prop_assert_eq!(&root.name, &name);
            prop_assert_eq!(root.attribute("k"), Some(value.as_str()));
        }
    }
}
