//! mailsift - descriptor-driven mail labelling rules
//!
//! A rule maps a *condition* to an *action*, both written as compact
//! descriptors of the form `[-]keyword[:parameter]`:
//!
//! ```yaml
//! spam: read                          # spam is never unread
//! "from:@github\\.com$": label:dev    # regex, case-insensitive
//! [list:rust-users, -label:rust]: [label:rust, -inbox]
//! ```
//!
//! # Architecture
//!
//! - [`Descriptor`] / [`DescriptorSpec`] — Parsed token / raw token-or-list
//! - [`Condition`] — Closed set of tests over a [`Record`], `Multi` is AND
//! - [`Action`] — Closed set of label mutations, `Multi` runs all
//! - [`RuleCompiler`] — `RawRules` → [`RuleSet`] plus [`Diagnostic`]s
//! - [`RuleLoader<S>`] — Resolves a [`RuleSource`] through a [`ConfigSource`],
//!   caching named sources in a [`RuleSetCache`]
//! - [`Filter<S>`] — The entry point: resolve, then apply every rule in order
//!
//! # Key Invariants
//!
//! 1. **Builders are total**: a bad descriptor drops one rule (or one list
//!    element) with a diagnostic; it never fails the whole document.
//!
//! 2. **Every rule, once, in order**: later rules observe the labels earlier
//!    rules changed within the same pass.
//!
//! 3. **Filtering never fails**: absent, malformed, and empty sources all mean
//!    "no filtering".
//!
//! # Example
//!
//! ```
//! use mailsift::prelude::*;
//! use std::borrow::Cow;
//! use std::collections::BTreeSet;
//!
//! #[derive(Debug, Default)]
//! struct Mail { from: String, labels: BTreeSet<String> }
//!
//! impl Record for Mail {
//!     fn from(&self) -> Cow<'_, str> { Cow::Borrowed(&self.from) }
//!     fn to(&self) -> Cow<'_, str> { Cow::Borrowed("") }
//!     fn subject(&self) -> Cow<'_, str> { Cow::Borrowed("") }
//!     fn list_address(&self) -> Cow<'_, str> { Cow::Borrowed("") }
//!     fn raw_text(&self) -> Cow<'_, str> { Cow::Borrowed("") }
//!     fn has_label(&self, label: &str) -> bool { self.labels.contains(label) }
//!     fn add_label(&mut self, label: &str) { self.labels.insert(label.to_owned()); }
//!     fn remove_label(&mut self, label: &str) { self.labels.remove(label); }
//!     fn replace_labels(&mut self, labels: BTreeSet<String>) { self.labels = labels; }
//! }
//!
//! let rules = RawRules::new()
//!     .with(r"from:@spam\.example$", "spam")
//!     .with("spam", "read");
//!
//! let filter = Filter::new(RuleLoader::new(MemorySource::new()));
//! let mut mail = Mail {
//!     from: "bot@SPAM.example".into(),
//!     labels: ["inbox".to_owned(), "unread".to_owned()].into(),
//! };
//! filter.apply_filters(&mut mail, &RuleSource::Inline(rules));
//!
//! assert!(mail.has_label("spam"));
//! assert!(!mail.has_label("inbox"));
//! assert!(!mail.has_label("unread"));
//! ```

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod action;
mod compiler;
mod condition;
mod descriptor;
mod filter;
mod loader;
mod pattern;
mod record;
mod rule_set;
mod source;
mod trace;

#[cfg(test)]
mod testing;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

// Descriptors and records
pub use descriptor::{Descriptor, DescriptorSpec};
pub use record::{labels, Record, RecordField};

// Rule building blocks
pub use action::{Action, ActionKind, LeafAction, WILDCARD_LABEL};
pub use condition::{Condition, ConditionKind, LeafCondition};
pub use pattern::TextPattern;
pub use rule_set::{RawRules, Rule, RuleSet};

// Compilation
pub use compiler::{CompiledRules, Diagnostic, Outcome, RuleCompiler};

// Loading and filtering
pub use filter::Filter;
pub use loader::{RuleLoader, RuleSetCache, RuleSource};
pub use source::{default_identifier, ConfigSource, FileSource, MemorySource, FILTERS_ENV};

// Trace types
pub use trace::{ConditionTrace, EvalTrace, RuleStep};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use mailsift::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Core types
        Action,
        Condition,
        ConfigSource,
        Descriptor,
        DescriptorSpec,
        // Trace types
        EvalTrace,
        // Entry points
        Filter,
        FileSource,
        MemorySource,
        RawRules,
        Record,
        Rule,
        RuleCompiler,
        // Errors
        RuleError,
        RuleLoader,
        RuleSet,
        RuleSource,
        SourceError,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum nesting depth of a descriptor list.
///
/// `[[[...]]]` in a rule document nests `Multi` inside `Multi`; deeper lists
/// are dropped at compile time.
pub const MAX_DEPTH: usize = 32;

/// Maximum length, in bytes, of a text-condition pattern.
pub const MAX_PATTERN_LENGTH: usize = 4096;

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Which side of a rule a descriptor sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// The condition (mapping key).
    Condition,
    /// The action (mapping value).
    Action,
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Condition => "condition",
            Self::Action => "action",
        })
    }
}

/// Why a single condition or action could not be built.
///
/// These are caught at compile time, never at evaluation time. The offending
/// rule is dropped and the rest of the document still loads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    /// The token is not `[-]keyword[:parameter]`.
    #[error("invalid descriptor \"{token}\"")]
    InvalidDescriptor {
        /// The token as written.
        token: String,
    },
    /// The keyword is not known for this slot.
    #[error("unknown {slot} keyword \"{keyword}\" in \"{descriptor}\"")]
    UnknownKeyword {
        /// Condition or action.
        slot: Slot,
        /// The unrecognized keyword.
        keyword: String,
        /// The full descriptor.
        descriptor: String,
    },
    /// A text, label, or label-action descriptor has no `:parameter`.
    #[error("\"{descriptor}\" requires a parameter")]
    MissingParameter {
        /// The full descriptor.
        descriptor: String,
    },
    /// The parameter is not a valid regular expression.
    #[error("invalid pattern \"{pattern}\": {reason}")]
    InvalidPattern {
        /// The pattern that failed to compile.
        pattern: String,
        /// The underlying error message.
        reason: String,
    },
    /// The parameter exceeds [`MAX_PATTERN_LENGTH`].
    #[error("pattern length is {len}, but maximum allowed is {max}")]
    PatternTooLong {
        /// Actual length of the pattern.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },
    /// `label:*` without inversion. Only `-label:*` (clear all) is legal.
    #[error("\"{descriptor}\" cannot add the wildcard label; only \"-label:*\" is allowed")]
    WildcardLabel {
        /// The full descriptor.
        descriptor: String,
    },
    /// Descriptor lists nest deeper than [`MAX_DEPTH`].
    #[error("descriptor nesting depth is at least {depth}, but maximum allowed is {max}")]
    DepthExceeded {
        /// Depth reached before the walk stopped; `max + 1` for any deeper list.
        depth: usize,
        /// Maximum allowed depth.
        max: usize,
    },
}

/// Why a [`ConfigSource`] could not supply a rule document.
///
/// Every variant means "no filtering" to [`Filter`]; they are distinguished
/// for logging only.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Nothing exists under this identifier.
    #[error("rule source \"{id}\" does not exist")]
    Absent {
        /// The identifier looked up.
        id: String,
    },
    /// The source exists but could not be read.
    #[error("failed to read rule source \"{id}\"")]
    Read {
        /// The identifier looked up.
        id: String,
        /// The I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The source is not a mapping of descriptors.
    #[error("rule source \"{id}\" is malformed: {reason}")]
    Malformed {
        /// The identifier looked up.
        id: String,
        /// The parser's message.
        reason: String,
    },
}

impl SourceError {
    /// Returns `true` for [`SourceError::Absent`].
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent { .. })
    }
}
