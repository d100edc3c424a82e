//! Descriptors — the compact textual form of one condition or action.
//!
//! A descriptor token has the grammar `[-]<keyword>[:<parameter>]`:
//!
//! - an optional leading `-` inverts the condition or action,
//! - the keyword is one or more of `[A-Za-z_-]`,
//! - everything after the first `:` is the parameter, verbatim. It may be
//!   empty and may contain further colons.
//!
//! [`DescriptorSpec`] is the unparsed value as it appears in a rule document:
//! either one token or an ordered list of specs meaning "all of".

use serde::de::{self, Deserialize, Deserializer, SeqAccess, Visitor};
use std::fmt;

/// A parsed descriptor token.
///
/// # Example
///
/// ```
/// use mailsift::Descriptor;
///
/// let d = Descriptor::parse("-label:spam").unwrap();
/// assert!(d.inverted());
/// assert_eq!(d.keyword(), "label");
/// assert_eq!(d.parameter(), Some("spam"));
/// assert_eq!(d.to_string(), "-label:spam");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Descriptor {
    inverted: bool,
    keyword: String,
    parameter: Option<String>,
}

impl Descriptor {
    /// Build a descriptor from its parts.
    pub fn new(inverted: bool, keyword: impl Into<String>, parameter: Option<String>) -> Self {
        Self {
            inverted,
            keyword: keyword.into(),
            parameter,
        }
    }

    /// Parse a token. Returns `None` when the token does not fit the grammar.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        // A leading '-' is the inversion flag unless the rest fails to parse, in
        // which case the '-' is read back as the first keyword character.
        if let Some(rest) = token.strip_prefix('-') {
            if let Some((keyword, parameter)) = split_keyword(rest) {
                return Some(Self::new(true, keyword, parameter.map(str::to_owned)));
            }
        }
        split_keyword(token)
            .map(|(keyword, parameter)| Self::new(false, keyword, parameter.map(str::to_owned)))
    }

    /// Whether the descriptor started with `-`.
    #[must_use]
    pub fn inverted(&self) -> bool {
        self.inverted
    }

    /// The keyword, exactly as written.
    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// The parameter after the first `:`, if any.
    #[must_use]
    pub fn parameter(&self) -> Option<&str> {
        self.parameter.as_deref()
    }
}

fn is_keyword_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-'
}

fn split_keyword(token: &str) -> Option<(&str, Option<&str>)> {
    let end = token
        .find(|c: char| !is_keyword_char(c))
        .unwrap_or(token.len());
    if end == 0 {
        return None;
    }
    let (keyword, rest) = token.split_at(end);
    if rest.is_empty() {
        return Some((keyword, None));
    }
    rest.strip_prefix(':').map(|parameter| (keyword, Some(parameter)))
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inverted {
            f.write_str("-")?;
        }
        f.write_str(&self.keyword)?;
        if let Some(parameter) = &self.parameter {
            write!(f, ":{parameter}")?;
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DescriptorSpec
// ═══════════════════════════════════════════════════════════════════════════════

/// The raw value of a condition or action slot in a rule document.
///
/// Deserializes from a string (one token) or a sequence (all of). Non-string
/// scalars become tokens via their textual form, so a stray `42:` key only
/// drops its own rule instead of rejecting the whole document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DescriptorSpec {
    /// A single descriptor token, not yet parsed.
    Token(String),
    /// An ordered list; every element must hold (conditions) or runs (actions).
    List(Vec<DescriptorSpec>),
}

impl DescriptorSpec {
    /// Nesting depth: a token is 1, a list is one more than its deepest child.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth_up_to(usize::MAX)
    }

    /// Like [`depth()`](Self::depth), but stops descending past `limit`.
    ///
    /// Returns the exact depth when it is at most `limit`, otherwise
    /// `limit + 1`. The walk never recurses deeper than `limit + 1` levels.
    #[must_use]
    pub fn depth_up_to(&self, limit: usize) -> usize {
        match self {
            Self::Token(_) => 1,
            Self::List(_) if limit == 0 => 1,
            Self::List(items) => {
                let mut deepest = 0;
                for item in items {
                    deepest = deepest.max(item.depth_up_to(limit - 1));
                    if deepest >= limit {
                        break;
                    }
                }
                1 + deepest
            }
        }
    }
}

impl From<&str> for DescriptorSpec {
    fn from(token: &str) -> Self {
        Self::Token(token.to_owned())
    }
}

impl From<String> for DescriptorSpec {
    fn from(token: String) -> Self {
        Self::Token(token)
    }
}

impl<T: Into<DescriptorSpec>> From<Vec<T>> for DescriptorSpec {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for DescriptorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(token) => f.write_str(token),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl<'de> Deserialize<'de> for DescriptorSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SpecVisitor)
    }
}

struct SpecVisitor;

impl<'de> Visitor<'de> for SpecVisitor {
    type Value = DescriptorSpec;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a descriptor string or a list of descriptors")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(DescriptorSpec::Token(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(DescriptorSpec::Token(v))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(DescriptorSpec::Token(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(DescriptorSpec::Token(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(DescriptorSpec::Token(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(DescriptorSpec::Token(v.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(DescriptorSpec::Token(String::new()))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(DescriptorSpec::List(items))
    }
}
