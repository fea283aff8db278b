//! Tolerant HTML fragment parser
//!
//! Handles what server-rendered component markup contains: elements with
//! quoted, unquoted and boolean attributes, void elements, comments,
//! doctype declarations and raw text inside `script`/`style`. Unclosed
//! elements are closed at the end of input and stray end tags are ignored.
//! Attribute names keep their case so framework syntax such as `*ngIf`
//! survives.

use crate::node::{RAW_TEXT_ELEMENTS, VOID_ELEMENTS};
use crate::{DomError, DomResult};

/// Parsed node tree, materialized into a document afterwards
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ParsedNode {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        children: Vec<ParsedNode>,
    },
    Text(String),
    Comment(String),
}

struct OpenElement {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<ParsedNode>,
}

impl OpenElement {
    fn close(self) -> ParsedNode {
        ParsedNode::Element {
            tag: self.tag,
            attributes: self.attributes,
            children: self.children,
        }
    }
}

pub(crate) fn parse_fragment(source: &str) -> DomResult<Vec<ParsedNode>> {
    Parser::new(source).parse()
}

struct Parser<'a> {
    source: &'a str,
    pos: usize,
    stack: Vec<OpenElement>,
    top: Vec<ParsedNode>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            stack: Vec::new(),
            top: Vec::new(),
        }
    }

    fn parse(mut self) -> DomResult<Vec<ParsedNode>> {
        while self.pos < self.source.len() {
            let rest = self.rest();
            if rest.starts_with("<!--") {
                self.parse_comment()?;
            } else if rest.starts_with("</") {
                self.parse_end_tag()?;
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                self.skip_declaration()?;
            } else if rest.starts_with('<') && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic())
            {
                self.parse_start_tag()?;
            } else {
                self.parse_text();
            }
        }

        while let Some(open) = self.stack.pop() {
            let node = open.close();
            self.push(node);
        }
        Ok(self.top)
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn push(&mut self, node: ParsedNode) {
        match self.stack.last_mut() {
            Some(open) => open.children.push(node),
            None => self.top.push(node),
        }
    }

    fn error(&self, message: impl Into<String>) -> DomError {
        DomError::Parse {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn parse_comment(&mut self) -> DomResult<()> {
        let body_start = self.pos + 4;
        let end = self.source[body_start..]
            .find("-->")
            .ok_or_else(|| self.error("unterminated comment"))?;
        let text = self.source[body_start..body_start + end].to_string();
        self.pos = body_start + end + 3;
        self.push(ParsedNode::Comment(text));
        Ok(())
    }

    fn skip_declaration(&mut self) -> DomResult<()> {
        let end = self
            .rest()
            .find('>')
            .ok_or_else(|| self.error("unterminated declaration"))?;
        self.pos += end + 1;
        Ok(())
    }

    fn parse_end_tag(&mut self) -> DomResult<()> {
        let end = self
            .rest()
            .find('>')
            .ok_or_else(|| self.error("unterminated end tag"))?;
        let name = self.rest()[2..end].trim().to_ascii_lowercase();
        self.pos += end + 1;

        if let Some(depth) = self.stack.iter().rposition(|open| open.tag == name) {
            while self.stack.len() > depth {
                if let Some(open) = self.stack.pop() {
                    let node = open.close();
                    self.push(node);
                }
            }
        }
        Ok(())
    }

    fn parse_start_tag(&mut self) -> DomResult<()> {
        self.pos += 1;
        let tag = self.take_while(|c| !c.is_whitespace() && c != '>' && c != '/');
        let tag = tag.to_ascii_lowercase();
        let mut attributes: Vec<(String, String)> = Vec::new();
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                return Err(self.error(format!("unterminated start tag <{}>", tag)));
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                self_closing = true;
                break;
            }
            if rest.starts_with('>') {
                self.pos += 1;
                break;
            }
            if rest.starts_with('/') {
                self.pos += 1;
                continue;
            }

            let name = self.take_while(|c| !c.is_whitespace() && c != '=' && c != '>' && c != '/');
            self.skip_whitespace();
            let value = if self.rest().starts_with('=') {
                self.pos += 1;
                self.skip_whitespace();
                self.parse_attribute_value()?
            } else {
                String::new()
            };
            if !attributes.iter().any(|(n, _)| *n == name) {
                attributes.push((name, value));
            }
        }

        if self_closing || VOID_ELEMENTS.contains(&tag.as_str()) {
            self.push(ParsedNode::Element {
                tag,
                attributes,
                children: Vec::new(),
            });
            return Ok(());
        }

        if RAW_TEXT_ELEMENTS.contains(&tag.as_str()) {
            let close = format!("</{}", tag);
            let lowered = self.rest().to_ascii_lowercase();
            let (text, advance) = match lowered.find(&close) {
                Some(idx) => {
                    let after = lowered[idx..].find('>').map(|g| idx + g + 1);
                    (self.rest()[..idx].to_string(), after.unwrap_or(lowered.len()))
                }
                None => (self.rest().to_string(), lowered.len()),
            };
            self.pos += advance;
            let children = if text.is_empty() {
                Vec::new()
            } else {
                vec![ParsedNode::Text(text)]
            };
            self.push(ParsedNode::Element {
                tag,
                attributes,
                children,
            });
            return Ok(());
        }

        self.stack.push(OpenElement {
            tag,
            attributes,
            children: Vec::new(),
        });
        Ok(())
    }

    fn parse_attribute_value(&mut self) -> DomResult<String> {
        let rest = self.rest();
        match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let end = rest[1..]
                    .find(quote)
                    .ok_or_else(|| self.error("unterminated attribute value"))?;
                let raw = &rest[1..1 + end];
                self.pos += end + 2;
                Ok(decode_entities(raw))
            }
            _ => {
                let raw = self.take_while(|c| !c.is_whitespace() && c != '>');
                Ok(decode_entities(&raw))
            }
        }
    }

    fn parse_text(&mut self) {
        let rest = self.rest();
        // A '<' that does not open markup is literal text
        let skip = if rest.starts_with('<') { 1 } else { 0 };
        let end = rest[skip..].find('<').map(|i| i + skip).unwrap_or(rest.len());
        let text = decode_entities(&rest[..end]);
        self.pos += end;
        if !text.is_empty() {
            match self.stack.last_mut().and_then(|open| open.children.last_mut()) {
                Some(ParsedNode::Text(existing)) => existing.push_str(&text),
                _ => self.push(ParsedNode::Text(text)),
            }
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let rest = self.rest();
        let end = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += end;
        rest[..end].to_string()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let end = rest
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(rest.len());
        self.pos += end;
    }
}

/// Decode the named and numeric character references markup commonly uses
pub(crate) fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        let decoded = candidate.find(';').and_then(|semi| {
            let name = &candidate[1..semi];
            let ch = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" | "#39" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ if name.starts_with("#x") || name.starts_with("#X") => {
                    u32::from_str_radix(&name[2..], 16).ok().and_then(char::from_u32)
                }
                _ if name.starts_with('#') => name[1..].parse::<u32>().ok().and_then(char::from_u32),
                _ => None,
            };
            ch.map(|c| (c, semi + 1))
        });
        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &candidate[len..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
