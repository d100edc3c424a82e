//! Condition — what a rule tests about a record.
//!
//! A [`Condition`] is either a leaf built from one descriptor or a `Multi`
//! holding an ordered list of conditions that must all hold. Leaf tests are
//! pure. Inversion is applied on top: `matches = test XOR inverted`.

use crate::record::labels;
use crate::{ConditionTrace, Descriptor, Record, RecordField, RuleError, Slot, TextPattern};
use std::fmt;

/// The fixed vocabulary of condition keywords.
///
/// | Keyword | Kind | Tests |
/// |---------|------|-------|
/// | `match` | [`Match`](Self::Match) | raw text against the regex parameter |
/// | `from` | [`From`](Self::From) | sender against the regex parameter |
/// | `to` | [`To`](Self::To) | recipient against the regex parameter |
/// | `subj` | [`Subject`](Self::Subject) | subject against the regex parameter |
/// | `body` | [`Body`](Self::Body) | raw text against the regex parameter |
/// | `list` | [`List`](Self::List) | list address against the regex parameter |
/// | `label` | [`Label`](Self::Label) | presence of the label named by the parameter |
/// | `spam` | [`Spam`](Self::Spam) | presence of `spam` |
/// | `inbox` | [`Inbox`](Self::Inbox) | presence of `inbox` |
/// | `deleted` | [`Deleted`](Self::Deleted) | presence of `deleted` |
/// | `starred` | [`Starred`](Self::Starred) | presence of `starred` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionKind {
    /// Regex over the raw message text.
    Match,
    /// Regex over the sender.
    From,
    /// Regex over the recipient.
    To,
    /// Regex over the subject.
    Subject,
    /// Regex over the raw message text. Same as [`Match`](Self::Match); it does
    /// not isolate the body part.
    Body,
    /// Regex over the mailing-list address.
    List,
    /// Literal label presence.
    Label,
    /// `spam` label presence.
    Spam,
    /// `inbox` label presence.
    Inbox,
    /// `deleted` label presence.
    Deleted,
    /// `starred` label presence.
    Starred,
}

impl ConditionKind {
    /// Look up a keyword. Matching is exact and case-sensitive.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "match" => Some(Self::Match),
            "from" => Some(Self::From),
            "to" => Some(Self::To),
            "subj" => Some(Self::Subject),
            "body" => Some(Self::Body),
            "list" => Some(Self::List),
            "label" => Some(Self::Label),
            "spam" => Some(Self::Spam),
            "inbox" => Some(Self::Inbox),
            "deleted" => Some(Self::Deleted),
            "starred" => Some(Self::Starred),
            _ => None,
        }
    }

    /// The canonical keyword for this kind.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::From => "from",
            Self::To => "to",
            Self::Subject => "subj",
            Self::Body => "body",
            Self::List => "list",
            Self::Label => "label",
            Self::Spam => "spam",
            Self::Inbox => "inbox",
            Self::Deleted => "deleted",
            Self::Starred => "starred",
        }
    }

    /// The record field a text kind reads, `None` for label kinds.
    #[must_use]
    pub fn text_field(self) -> Option<RecordField> {
        match self {
            Self::Match | Self::Body => Some(RecordField::RawText),
            Self::From => Some(RecordField::From),
            Self::To => Some(RecordField::To),
            Self::Subject => Some(RecordField::Subject),
            Self::List => Some(RecordField::ListAddress),
            Self::Label | Self::Spam | Self::Inbox | Self::Deleted | Self::Starred => None,
        }
    }

    fn fixed_label(self) -> Option<&'static str> {
        match self {
            Self::Spam => Some(labels::SPAM),
            Self::Inbox => Some(labels::INBOX),
            Self::Deleted => Some(labels::DELETED),
            Self::Starred => Some(labels::STARRED),
            _ => None,
        }
    }
}

/// The compiled test behind a leaf.
#[derive(Debug, Clone)]
enum LeafTest {
    Text {
        field: RecordField,
        pattern: TextPattern,
    },
    Label(String),
}

/// A single-descriptor condition.
#[derive(Debug, Clone)]
pub struct LeafCondition {
    kind: ConditionKind,
    inverted: bool,
    parameter: Option<String>,
    test: LeafTest,
}

impl LeafCondition {
    /// Build a leaf from a parsed descriptor.
    ///
    /// # Errors
    ///
    /// - [`RuleError::UnknownKeyword`] if the keyword is not in the vocabulary
    /// - [`RuleError::MissingParameter`] for text and `label` kinds without `:parameter`
    /// - [`RuleError::InvalidPattern`] / [`RuleError::PatternTooLong`] for bad regexes
    pub fn from_descriptor(descriptor: &Descriptor) -> Result<Self, RuleError> {
        let kind = ConditionKind::from_keyword(descriptor.keyword()).ok_or_else(|| {
            RuleError::UnknownKeyword {
                slot: Slot::Condition,
                keyword: descriptor.keyword().to_owned(),
                descriptor: descriptor.to_string(),
            }
        })?;
        let parameter = descriptor.parameter();
        let missing = || RuleError::MissingParameter {
            descriptor: descriptor.to_string(),
        };

        let test = if let Some(field) = kind.text_field() {
            let pattern = TextPattern::compile(parameter.ok_or_else(missing)?)?;
            LeafTest::Text { field, pattern }
        } else if let Some(label) = kind.fixed_label() {
            LeafTest::Label(label.to_owned())
        } else {
            LeafTest::Label(parameter.ok_or_else(missing)?.to_owned())
        };

        Ok(Self {
            kind,
            inverted: descriptor.inverted(),
            parameter: parameter.map(str::to_owned),
            test,
        })
    }

    /// The condition kind.
    #[must_use]
    pub fn kind(&self) -> ConditionKind {
        self.kind
    }

    /// Whether the result is inverted.
    #[must_use]
    pub fn inverted(&self) -> bool {
        self.inverted
    }

    /// The parameter as written. Fixed-label kinds keep but ignore it.
    #[must_use]
    pub fn parameter(&self) -> Option<&str> {
        self.parameter.as_deref()
    }

    /// The raw test, before inversion. Never mutates the record.
    pub fn test<R: Record + ?Sized>(&self, record: &R) -> bool {
        match &self.test {
            LeafTest::Text { field, pattern } => pattern.is_match(&field.get(record)),
            LeafTest::Label(label) => record.has_label(label),
        }
    }

    /// `test` XOR `inverted`.
    pub fn matches<R: Record + ?Sized>(&self, record: &R) -> bool {
        self.test(record) != self.inverted
    }

    /// Evaluate with a trace of the raw test and the final result.
    #[must_use]
    pub fn evaluate_with_trace<R: Record + ?Sized>(&self, record: &R) -> ConditionTrace {
        let tested = self.test(record);
        ConditionTrace::Leaf {
            descriptor: self.to_string(),
            tested,
            matched: tested != self.inverted,
        }
    }
}

impl fmt::Display for LeafCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inverted {
            f.write_str("-")?;
        }
        f.write_str(self.kind.keyword())?;
        if let Some(parameter) = &self.parameter {
            write!(f, ":{parameter}")?;
        }
        Ok(())
    }
}

/// A rule condition.
///
/// `Multi` is the only composite: every child must match. Children are
/// evaluated in order and evaluation stops at the first `false`; since leaf
/// tests are pure this is unobservable apart from cost. An empty `Multi`
/// matches everything.
///
/// # Example
///
/// ```
/// use mailsift::Condition;
///
/// let c = Condition::parse("-label:read").unwrap();
/// assert_eq!(c.to_string(), "-label:read");
/// assert!(Condition::parse("bogus:x").is_err());
/// ```
#[derive(Debug, Clone)]
pub enum Condition {
    /// One descriptor.
    Leaf(LeafCondition),
    /// All children must match.
    Multi(Vec<Condition>),
}

impl Condition {
    /// Parse and build a leaf condition from one token.
    ///
    /// # Errors
    ///
    /// [`RuleError::InvalidDescriptor`] if the token does not parse, otherwise
    /// whatever [`LeafCondition::from_descriptor`] reports.
    pub fn parse(token: &str) -> Result<Self, RuleError> {
        let descriptor = Descriptor::parse(token).ok_or_else(|| RuleError::InvalidDescriptor {
            token: token.to_owned(),
        })?;
        LeafCondition::from_descriptor(&descriptor).map(Self::Leaf)
    }

    /// Whether this condition holds for the record.
    pub fn matches<R: Record + ?Sized>(&self, record: &R) -> bool {
        match self {
            Self::Leaf(leaf) => leaf.matches(record),
            Self::Multi(children) => children.iter().all(|c| c.matches(record)),
        }
    }

    /// Evaluate with full trace for debugging.
    ///
    /// Unlike [`matches()`](Self::matches), this evaluates every `Multi` child
    /// so the trace shows all of them. The `matched` result is the same.
    #[must_use]
    pub fn evaluate_with_trace<R: Record + ?Sized>(&self, record: &R) -> ConditionTrace {
        match self {
            Self::Leaf(leaf) => leaf.evaluate_with_trace(record),
            Self::Multi(children) => {
                let children: Vec<ConditionTrace> = children
                    .iter()
                    .map(|c| c.evaluate_with_trace(record))
                    .collect();
                let matched = children.iter().all(ConditionTrace::matched);
                ConditionTrace::Multi { matched, children }
            }
        }
    }

    /// Returns `true` if this is a `Multi` condition.
    #[must_use]
    pub fn is_multi(&self) -> bool {
        matches!(self, Self::Multi(_))
    }

    /// Depth of the condition tree; a leaf is 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Multi(children) => 1 + children.iter().map(Self::depth).max().unwrap_or(0),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(leaf) => write!(f, "{leaf}"),
            Self::Multi(children) => {
                f.write_str("[")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{child}")?;
                }
                f.write_str("]")
            }
        }
    }
}
