//! Action — how a rule relabels a record.
//!
//! Every action mutates the record's label set; none are pure. `Multi` runs
//! each child in order, always, regardless of what earlier children did.

use crate::record::labels;
use crate::{Descriptor, Record, RuleError, Slot};
use std::collections::BTreeSet;
use std::fmt;

/// The parameter `-label:*` uses to clear every label.
pub const WILDCARD_LABEL: &str = "*";

/// The fixed vocabulary of action keywords.
///
/// | Kind | not inverted | inverted |
/// |------|--------------|----------|
/// | `label` / `L` | add the parameter | remove the parameter, or clear all for `*` |
/// | `inbox` | add `inbox` | remove `inbox` |
/// | `unread` | add `unread` | remove `unread` |
/// | `read` | remove `unread` | add `unread` |
/// | `star` | remove `starred` | add `starred` |
/// | `spam` | add `spam`, remove `inbox` | remove `spam` |
/// | `delete` / `deleted` | add `deleted`, remove `inbox` | remove `deleted` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Add or remove an arbitrary label.
    Label,
    /// Move into or out of the inbox.
    Inbox,
    /// Mark unread.
    Unread,
    /// Mark read.
    Read,
    /// Toggle the `starred` label.
    Star,
    /// Classify as spam.
    Spam,
    /// Mark deleted.
    Delete,
}

impl ActionKind {
    /// Look up a keyword.
    ///
    /// Exact match, except that `L`/`l` abbreviate `label` and both `delete`
    /// and `deleted` name [`Delete`](Self::Delete).
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "label" | "L" | "l" => Some(Self::Label),
            "inbox" => Some(Self::Inbox),
            "unread" => Some(Self::Unread),
            "read" => Some(Self::Read),
            "star" => Some(Self::Star),
            "spam" => Some(Self::Spam),
            "delete" | "deleted" => Some(Self::Delete),
            _ => None,
        }
    }

    /// The canonical keyword for this kind.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Label => "label",
            Self::Inbox => "inbox",
            Self::Unread => "unread",
            Self::Read => "read",
            Self::Star => "star",
            Self::Spam => "spam",
            Self::Delete => "delete",
        }
    }
}

/// A single-descriptor action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafAction {
    kind: ActionKind,
    inverted: bool,
    parameter: Option<String>,
}

impl LeafAction {
    /// Build a leaf from a parsed descriptor.
    ///
    /// # Errors
    ///
    /// - [`RuleError::UnknownKeyword`] if the keyword is not in the vocabulary
    /// - [`RuleError::MissingParameter`] for `label` without `:parameter`
    /// - [`RuleError::WildcardLabel`] for `label:*` (only `-label:*` is legal)
    pub fn from_descriptor(descriptor: &Descriptor) -> Result<Self, RuleError> {
        let kind = ActionKind::from_keyword(descriptor.keyword()).ok_or_else(|| {
            RuleError::UnknownKeyword {
                slot: Slot::Action,
                keyword: descriptor.keyword().to_owned(),
                descriptor: descriptor.to_string(),
            }
        })?;

        if kind == ActionKind::Label {
            match descriptor.parameter() {
                None => {
                    return Err(RuleError::MissingParameter {
                        descriptor: descriptor.to_string(),
                    })
                }
                Some(WILDCARD_LABEL) if !descriptor.inverted() => {
                    return Err(RuleError::WildcardLabel {
                        descriptor: descriptor.to_string(),
                    })
                }
                Some(_) => {}
            }
        }

        Ok(Self {
            kind,
            inverted: descriptor.inverted(),
            parameter: descriptor.parameter().map(str::to_owned),
        })
    }

    /// The action kind.
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    /// Whether add/remove are flipped.
    #[must_use]
    pub fn inverted(&self) -> bool {
        self.inverted
    }

    /// The parameter as written.
    #[must_use]
    pub fn parameter(&self) -> Option<&str> {
        self.parameter.as_deref()
    }

    /// Apply to a record.
    pub fn apply<R: Record + ?Sized>(&self, record: &mut R) {
        match (self.kind, self.inverted) {
            (ActionKind::Label, inverted) => {
                // Guaranteed present by from_descriptor.
                let Some(label) = self.parameter.as_deref() else {
                    return;
                };
                match (inverted, label) {
                    (true, WILDCARD_LABEL) => record.replace_labels(BTreeSet::new()),
                    (true, label) => record.remove_label(label),
                    (false, label) => record.add_label(label),
                }
            }
            (ActionKind::Inbox, false) => record.add_label(labels::INBOX),
            (ActionKind::Inbox, true) => record.remove_label(labels::INBOX),
            (ActionKind::Unread, false) | (ActionKind::Read, true) => {
                record.add_label(labels::UNREAD);
            }
            (ActionKind::Unread, true) | (ActionKind::Read, false) => {
                record.remove_label(labels::UNREAD);
            }
            (ActionKind::Star, false) => record.remove_label(labels::STARRED),
            (ActionKind::Star, true) => record.add_label(labels::STARRED),
            (ActionKind::Spam, false) => {
                record.add_label(labels::SPAM);
                record.remove_label(labels::INBOX);
            }
            (ActionKind::Spam, true) => record.remove_label(labels::SPAM),
            (ActionKind::Delete, false) => {
                record.add_label(labels::DELETED);
                record.remove_label(labels::INBOX);
            }
            (ActionKind::Delete, true) => record.remove_label(labels::DELETED),
        }
    }
}

impl fmt::Display for LeafAction {
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

/// A rule action.
///
/// # Example
///
/// ```
/// use mailsift::Action;
///
/// let a = Action::parse("L:work").unwrap();
/// assert_eq!(a.to_string(), "label:work");
/// assert!(Action::parse("label:*").is_err());
/// assert!(Action::parse("-label:*").is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// One descriptor.
    Leaf(LeafAction),
    /// Every child, in order.
    Multi(Vec<Action>),
}

impl Action {
    /// Parse and build a leaf action from one token.
    ///
    /// # Errors
    ///
    /// [`RuleError::InvalidDescriptor`] if the token does not parse, otherwise
    /// whatever [`LeafAction::from_descriptor`] reports.
    pub fn parse(token: &str) -> Result<Self, RuleError> {
        let descriptor = Descriptor::parse(token).ok_or_else(|| RuleError::InvalidDescriptor {
            token: token.to_owned(),
        })?;
        LeafAction::from_descriptor(&descriptor).map(Self::Leaf)
    }

    /// Apply to a record. `Multi` runs every child in order.
    pub fn apply<R: Record + ?Sized>(&self, record: &mut R) {
        match self {
            Self::Leaf(leaf) => leaf.apply(record),
            Self::Multi(children) => {
                for child in children {
                    child.apply(record);
                }
            }
        }
    }

    /// Returns `true` if this is a `Multi` action.
    #[must_use]
    pub fn is_multi(&self) -> bool {
        matches!(self, Self::Multi(_))
    }
}

impl fmt::Display for Action {
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
