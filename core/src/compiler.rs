//! Rule compilation: [`RawRules`] → [`RuleSet`] plus diagnostics.
//!
//! Compilation is total. Every entry either becomes a rule or is dropped with
//! a [`Diagnostic`] naming the offending value; a bad element inside a
//! descriptor list is dropped on its own and the rest of the list survives.
//! The compiler never logs, callers decide what to do with diagnostics.

use crate::{
    Action, Condition, Descriptor, DescriptorSpec, LeafAction, LeafCondition, RawRules, Rule,
    RuleError, RuleSet, Slot, MAX_DEPTH,
};
use std::fmt;

/// What happened to the rule a [`Diagnostic`] is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The whole entry was dropped.
    RuleDropped,
    /// One list element was dropped; the rule was kept without it.
    ElementDropped,
}

/// A problem found while compiling one entry of a rule document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Zero-based position of the entry in the document.
    pub entry: usize,
    /// Condition or action side.
    pub slot: Slot,
    /// The offending value as written.
    pub value: String,
    /// What was wrong with it.
    pub error: RuleError,
    /// What happened as a result.
    pub outcome: Outcome,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = match self.outcome {
            Outcome::RuleDropped => "rule dropped",
            Outcome::ElementDropped => "element dropped",
        };
        write!(
            f,
            "entry {}: {} \"{}\": {} ({outcome})",
            self.entry, self.slot, self.value, self.error
        )
    }
}

/// Result of [`RuleCompiler::compile()`].
#[derive(Debug, Clone, Default)]
pub struct CompiledRules {
    /// The surviving rules, in document order.
    pub rule_set: RuleSet,
    /// Everything that was dropped, in document order.
    pub diagnostics: Vec<Diagnostic>,
}

/// Builds conditions, actions, and rule sets from descriptors.
///
/// For one-shot use call [`compile()`](Self::compile) or
/// [`check()`](Self::check). The builder methods collect diagnostics on the
/// compiler so a host can build single conditions or actions the same way.
///
/// # Example
///
/// ```
/// use mailsift::{RawRules, RuleCompiler};
///
/// let raw = RawRules::new()
///     .with("spam", "read")
///     .with("frobnicate", "star")
///     .with(vec!["inbox", "-label:seen"], vec!["label:new", "bogus"]);
///
/// let compiled = RuleCompiler::compile(&raw);
/// assert_eq!(compiled.rule_set.len(), 2);
/// assert_eq!(compiled.diagnostics.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct RuleCompiler {
    entry: usize,
    diagnostics: Vec<Diagnostic>,
}

impl RuleCompiler {
    /// Create a compiler with no diagnostics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a whole document.
    #[must_use]
    pub fn compile(raw: &RawRules) -> CompiledRules {
        let mut compiler = Self::new();
        let rules = raw
            .iter()
            .enumerate()
            .filter_map(|(entry, (condition, action))| {
                compiler.entry = entry;
                // Build both sides so both get reported.
                let condition = compiler.condition(condition);
                let action = compiler.action(action);
                Some(Rule::new(condition?, action?))
            })
            .collect();
        CompiledRules {
            rule_set: RuleSet::new(rules),
            diagnostics: compiler.into_diagnostics(),
        }
    }

    /// Compile a document and keep only the diagnostics.
    #[must_use]
    pub fn check(raw: &RawRules) -> Vec<Diagnostic> {
        Self::compile(raw).diagnostics
    }

    /// Build a condition. `None` means the value is unusable and a
    /// diagnostic was recorded.
    pub fn condition(&mut self, spec: &DescriptorSpec) -> Option<Condition> {
        self.build(
            spec,
            Slot::Condition,
            |descriptor| LeafCondition::from_descriptor(descriptor).map(Condition::Leaf),
            Condition::Multi,
        )
    }

    /// Build an action. `None` means the value is unusable and a diagnostic
    /// was recorded.
    pub fn action(&mut self, spec: &DescriptorSpec) -> Option<Action> {
        self.build(
            spec,
            Slot::Action,
            |descriptor| LeafAction::from_descriptor(descriptor).map(Action::Leaf),
            Action::Multi,
        )
    }

    /// Diagnostics recorded so far.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consume the compiler, returning its diagnostics.
    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    fn build<T>(
        &mut self,
        spec: &DescriptorSpec,
        slot: Slot,
        leaf: impl Fn(&Descriptor) -> Result<T, RuleError> + Copy,
        multi: impl Fn(Vec<T>) -> T + Copy,
    ) -> Option<T> {
        let depth = spec.depth_up_to(MAX_DEPTH);
        if depth > MAX_DEPTH {
            self.report(
                slot,
                elided(spec, MAX_DEPTH),
                RuleError::DepthExceeded {
                    depth,
                    max: MAX_DEPTH,
                },
                Outcome::RuleDropped,
            );
            return None;
        }
        match self.build_nested(spec, slot, leaf, multi) {
            Ok(built) => Some(built),
            Err(error) => {
                self.report(slot, spec.to_string(), error, Outcome::RuleDropped);
                None
            }
        }
    }

    fn build_nested<T>(
        &mut self,
        spec: &DescriptorSpec,
        slot: Slot,
        leaf: impl Fn(&Descriptor) -> Result<T, RuleError> + Copy,
        multi: impl Fn(Vec<T>) -> T + Copy,
    ) -> Result<T, RuleError> {
        match spec {
            DescriptorSpec::Token(token) => {
                let descriptor =
                    Descriptor::parse(token).ok_or_else(|| RuleError::InvalidDescriptor {
                        token: token.clone(),
                    })?;
                leaf(&descriptor)
            }
            DescriptorSpec::List(items) => {
                let mut children = Vec::with_capacity(items.len());
                for item in items {
                    match self.build_nested(item, slot, leaf, multi) {
                        Ok(child) => children.push(child),
                        Err(error) => {
                            self.report(slot, item.to_string(), error, Outcome::ElementDropped);
                        }
                    }
                }
                Ok(multi(children))
            }
        }
    }

    fn report(&mut self, slot: Slot, value: String, error: RuleError, outcome: Outcome) {
        self.diagnostics.push(Diagnostic {
            entry: self.entry,
            slot,
            value,
            error,
            outcome,
        });
    }
}

/// Render `spec` like its `Display`, with lists below `limit` levels shown as `[..]`.
fn elided(spec: &DescriptorSpec, limit: usize) -> String {
    match spec {
        DescriptorSpec::Token(token) => token.clone(),
        DescriptorSpec::List(_) if limit == 0 => "[..]".to_owned(),
        DescriptorSpec::List(items) => {
            let items: Vec<String> = items.iter().map(|item| elided(item, limit - 1)).collect();
            format!("[{}]", items.join(", "))
        }
    }
}
