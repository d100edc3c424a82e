//! Rules, rule sets, and the raw rule document they are compiled from.
//!
//! A rule document is an ordered mapping of condition → action, each side a
//! [`DescriptorSpec`]:
//!
//! ```yaml
//! spam: read
//! "from:@example\\.com$": label:work
//! [list:rust-users, -label:rust]: [label:rust, -inbox]
//! -label:*: inbox      # keys may be any descriptor, values too
//! ```
//!
//! Document order is rule order, and rule order matters: a rule sees every
//! label change made by the rules before it in the same pass.

use crate::{Action, Condition, ConditionTrace, DescriptorSpec, EvalTrace, Record, RuleStep};
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use std::fmt;
use tracing::debug;

// ═══════════════════════════════════════════════════════════════════════════════
// Raw document
// ═══════════════════════════════════════════════════════════════════════════════

/// An uncompiled rule document: ordered (condition, action) descriptor pairs.
///
/// Deserializes from a YAML or JSON mapping, keeping document order. An empty
/// document (`null`/`~`) is an empty rule list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRules {
    entries: Vec<(DescriptorSpec, DescriptorSpec)>,
}

impl RawRules {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry (builder pattern).
    #[must_use]
    pub fn with(
        mut self,
        condition: impl Into<DescriptorSpec>,
        action: impl Into<DescriptorSpec>,
    ) -> Self {
        self.push(condition, action);
        self
    }

    /// Append an entry.
    pub fn push(&mut self, condition: impl Into<DescriptorSpec>, action: impl Into<DescriptorSpec>) {
        self.entries.push((condition.into(), action.into()));
    }

    /// Entries in document order.
    pub fn iter(&self) -> impl Iterator<Item = &(DescriptorSpec, DescriptorSpec)> {
        self.entries.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the document has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C: Into<DescriptorSpec>, A: Into<DescriptorSpec>> FromIterator<(C, A)> for RawRules {
    fn from_iter<I: IntoIterator<Item = (C, A)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(c, a)| (c.into(), a.into()))
                .collect(),
        }
    }
}

impl<'de> Deserialize<'de> for RawRules {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RawRulesVisitor)
    }
}

struct RawRulesVisitor;

impl<'de> Visitor<'de> for RawRulesVisitor {
    type Value = RawRules;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a mapping of condition descriptors to action descriptors")
    }

    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(RawRules::default())
    }

    fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(RawRules::default())
    }

    fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> Result<Self::Value, M::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(entry) = map.next_entry::<DescriptorSpec, DescriptorSpec>()? {
            entries.push(entry);
        }
        Ok(RawRules { entries })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Compiled rules
// ═══════════════════════════════════════════════════════════════════════════════

/// A compiled (condition, action) pair.
#[derive(Debug, Clone)]
pub struct Rule {
    condition: Condition,
    action: Action,
}

impl Rule {
    /// Pair a condition with an action.
    #[must_use]
    pub fn new(condition: Condition, action: Action) -> Self {
        Self { condition, action }
    }

    /// The condition.
    #[must_use]
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// The action.
    #[must_use]
    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Apply the action if the condition matches. Returns whether it fired.
    pub fn apply<R: Record + ?Sized>(&self, record: &mut R) -> bool {
        let fired = self.condition.matches(record);
        if fired {
            self.action.apply(record);
        }
        fired
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.condition, self.action)
    }
}

/// An ordered, immutable list of compiled rules.
///
/// # INV: every rule, once, in order
///
/// [`apply()`](Self::apply) tests each rule exactly once, in order, and runs
/// its action immediately on match. There is no priority and no early exit;
/// later conditions see the labels earlier actions left behind.
///
/// # Example
///
/// ```ignore
/// // spam: read      -> a spam message is also marked read
/// // -inbox: unread  -> ...and, having left the inbox, is marked unread again
/// let fired = rules.apply(&mut message);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Create a rule set from rules in evaluation order.
    #[must_use]
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in evaluation order.
    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    /// Run one pass over the record. Returns how many rules fired.
    pub fn apply<R: Record + ?Sized>(&self, record: &mut R) -> usize {
        let mut fired = 0;
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.apply(record) {
                debug!(index, rule = %rule, "rule fired");
                fired += 1;
            }
        }
        fired
    }

    /// Run one pass and record how every rule evaluated.
    ///
    /// Mutates the record exactly like [`apply()`](Self::apply).
    pub fn apply_with_trace<R: Record + ?Sized>(&self, record: &mut R) -> EvalTrace {
        let steps = self
            .rules
            .iter()
            .enumerate()
            .map(|(index, rule)| {
                let trace: ConditionTrace = rule.condition.evaluate_with_trace(record);
                let fired = trace.matched();
                if fired {
                    rule.action.apply(record);
                }
                RuleStep {
                    index,
                    condition: rule.condition.to_string(),
                    action: rule.action.to_string(),
                    trace,
                    fired,
                }
            })
            .collect();
        EvalTrace { steps }
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
