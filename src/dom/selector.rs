//! Selectors - the small subset role options are written in.
//!
//! Supported:
//! - compound parts: `tag`, `#id`, `.class`, `[attr]`, `[attr=value]`, `*`
//! - combinators: descendant (whitespace) and child (`>`)
//! - a leading `>`, meaning "children of the scope element"
//!
//! Parsing happens when options are validated, so a malformed selector fails
//! configuration instead of failing a click later.

use crate::error::{Error, Result};
use crate::types::ElementId;

use super::document as doc;

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrMatch {
    Present(String),
    Equals(String, String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrMatch>,
}

impl Compound {
    fn matches(&self, el: ElementId) -> bool {
        if let Some(tag) = &self.tag {
            if doc::tag_name(el).as_deref() != Some(tag.as_str()) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if doc::get_attribute(el, "id").as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| doc::has_class(el, c)) {
            return false;
        }
        self.attrs.iter().all(|attr| match attr {
            AttrMatch::Present(name) => doc::has_attribute(el, name),
            AttrMatch::Equals(name, value) => {
                doc::get_attribute(el, name).as_deref() == Some(value.as_str())
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// A parsed selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    /// Leading `>`: first compound must be a direct child of the scope.
    scoped: bool,
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`.
    combinators: Vec<Combinator>,
}

impl Selector {
    /// Parse a selector string.
    pub fn parse(source: &str) -> Result<Self> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Err(Error::selector(source, "empty selector"));
        }
        if trimmed.starts_with('+') || trimmed.starts_with('~') || trimmed.contains(',') {
            return Err(Error::selector(source, "unsupported combinator"));
        }

        let (scoped, rest) = match trimmed.strip_prefix('>') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, trimmed),
        };

        let mut compounds = Vec::new();
        let mut combinators = Vec::new();
        let mut pending: Option<Combinator> = None;
        let mut chars = rest.chars().peekable();

        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                chars.next();
                if pending.is_none() && !compounds.is_empty() {
                    pending = Some(Combinator::Descendant);
                }
                continue;
            }
            if c == '>' {
                chars.next();
                if compounds.is_empty() || pending == Some(Combinator::Child) {
                    return Err(Error::selector(source, "dangling `>`"));
                }
                pending = Some(Combinator::Child);
                continue;
            }

            let compound = parse_compound(source, &mut chars)?;
            if !compounds.is_empty() {
                combinators.push(pending.take().unwrap_or(Combinator::Descendant));
            }
            pending = None;
            compounds.push(compound);
        }

        if compounds.is_empty() {
            return Err(Error::selector(source, "no element selector"));
        }
        if pending == Some(Combinator::Child) {
            return Err(Error::selector(source, "trailing `>`"));
        }

        Ok(Self {
            source: source.to_string(),
            scoped,
            compounds,
            combinators,
        })
    }

    /// Original text.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True for selectors starting with a combinator (resolved inside a scope).
    pub fn is_scoped(&self) -> bool {
        self.scoped
    }

    /// Does `el` match, with `scope` anchoring a leading `>`.
    pub fn matches(&self, el: ElementId, scope: Option<ElementId>) -> bool {
        self.match_at(el, self.compounds.len() - 1, scope)
    }

    fn match_at(&self, el: ElementId, index: usize, scope: Option<ElementId>) -> bool {
        if !self.compounds[index].matches(el) {
            return false;
        }
        if index == 0 {
            return match (self.scoped, scope) {
                (true, Some(scope)) => doc::parent(el) == Some(scope),
                (true, None) => false,
                (false, Some(scope)) => el != scope && doc::contains(scope, el),
                (false, None) => true,
            };
        }
        match self.combinators[index - 1] {
            Combinator::Child => doc::parent(el)
                .is_some_and(|parent| self.match_at(parent, index - 1, scope)),
            Combinator::Descendant => doc::ancestors(el)
                .into_iter()
                .any(|ancestor| self.match_at(ancestor, index - 1, scope)),
        }
    }

    /// All matching elements in document order.
    ///
    /// With a scope, only the scope's descendants are candidates; without one,
    /// the whole connected document is searched.
    pub fn query(&self, scope: Option<ElementId>) -> Vec<ElementId> {
        let root = scope.unwrap_or_else(doc::body);
        doc::descendants(root)
            .into_iter()
            .filter(|&el| self.matches(el, scope))
            .collect()
    }
}

fn parse_compound(
    source: &str,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<Compound> {
    let mut compound = Compound::default();
    let mut any = false;

    while let Some(&c) = chars.peek() {
        match c {
            '.' | '#' => {
                chars.next();
                let name = take_ident(chars);
                if name.is_empty() {
                    return Err(Error::selector(source, format!("expected name after `{}`", c)));
                }
                if c == '.' {
                    compound.classes.push(name);
                } else {
                    compound.id = Some(name);
                }
            }
            '[' => {
                chars.next();
                let mut body = String::new();
                let mut closed = false;
                for next in chars.by_ref() {
                    if next == ']' {
                        closed = true;
                        break;
                    }
                    body.push(next);
                }
                if !closed {
                    return Err(Error::selector(source, "unclosed `[`"));
                }
                compound.attrs.push(parse_attr(source, &body)?);
            }
            '*' => {
                chars.next();
            }
            c if is_ident_char(c) => {
                if any {
                    return Err(Error::selector(source, "tag must come first"));
                }
                compound.tag = Some(take_ident(chars).to_ascii_lowercase());
            }
            c if c.is_whitespace() || c == '>' => break,
            other => {
                return Err(Error::selector(source, format!("unexpected `{}`", other)));
            }
        }
        any = true;
    }

    Ok(compound)
}

fn parse_attr(source: &str, body: &str) -> Result<AttrMatch> {
    let (name, value) = match body.split_once('=') {
        Some((name, value)) => (name.trim(), Some(value.trim())),
        None => (body.trim(), None),
    };
    if name.is_empty() || !name.chars().all(is_ident_char) {
        return Err(Error::selector(source, "bad attribute name"));
    }
    Ok(match value {
        Some(value) => {
            let value = value.trim_matches(|c| c == '"' || c == '\'');
            AttrMatch::Equals(name.to_string(), value.to_string())
        }
        None => AttrMatch::Present(name.to_string()),
    })
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut out = String::new();
    while let Some(&c) = chars.peek() {
        if !is_ident_char(c) {
            break;
        }
        out.push(c);
        chars.next();
    }
    out
}
