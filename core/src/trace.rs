//! Evaluation trace types for debugging filter files.
//!
//! Trace types mirror the runtime types ([`Condition`](crate::Condition),
//! [`RuleSet`](crate::RuleSet)) but capture results instead of inputs. Use
//! [`RuleSet::apply_with_trace()`](crate::RuleSet::apply_with_trace) to see
//! which rules fired on a message and why.
//!
//! # Example
//!
//! ```ignore
//! let trace = rules.apply_with_trace(&mut message);
//! for step in &trace.steps {
//!     println!("rule[{}] {} -> {}: fired={}", step.index, step.condition, step.action, step.fired);
//! }
//! ```

use std::fmt;

/// Trace of a condition evaluation.
///
/// In `Multi`, all children are evaluated (no short-circuit) for maximum
/// debugging value. The `matched` result is still correct.
#[derive(Clone, PartialEq, Eq)]
pub enum ConditionTrace {
    /// A leaf condition.
    Leaf {
        /// The leaf in descriptor form, e.g. `"-label:read"`.
        descriptor: String,
        /// Raw test result, before inversion.
        tested: bool,
        /// Final result, after inversion.
        matched: bool,
    },
    /// All children must match.
    Multi {
        /// Whether every child matched.
        matched: bool,
        /// Trace of each child, in order.
        children: Vec<ConditionTrace>,
    },
}

impl ConditionTrace {
    /// Get the overall match result.
    #[must_use]
    pub fn matched(&self) -> bool {
        match self {
            Self::Leaf { matched, .. } | Self::Multi { matched, .. } => *matched,
        }
    }
}

impl fmt::Debug for ConditionTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf {
                descriptor,
                tested,
                matched,
            } => f
                .debug_struct("Leaf")
                .field("descriptor", descriptor)
                .field("tested", tested)
                .field("matched", matched)
                .finish(),
            Self::Multi { matched, children } => f
                .debug_struct("Multi")
                .field("matched", matched)
                .field("children", children)
                .finish(),
        }
    }
}

/// One rule in an [`EvalTrace`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleStep {
    /// Position of the rule in its rule set.
    pub index: usize,
    /// The condition in descriptor form.
    pub condition: String,
    /// The action in descriptor form.
    pub action: String,
    /// How the condition evaluated against the record as it was at this point.
    pub trace: ConditionTrace,
    /// Whether the action ran.
    pub fired: bool,
}

/// Trace of a full rule-set pass over one record.
///
/// # INV: same effect as `apply()`
///
/// Tracing applies actions exactly as [`RuleSet::apply()`](crate::RuleSet::apply)
/// does; the record ends up with the same labels either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalTrace {
    /// Every rule, in evaluation order.
    pub steps: Vec<RuleStep>,
}

impl EvalTrace {
    /// Number of rules whose action ran.
    #[must_use]
    pub fn fired(&self) -> usize {
        self.steps.iter().filter(|s| s.fired).count()
    }

    /// Indices of the rules whose action ran.
    #[must_use]
    pub fn fired_indices(&self) -> Vec<usize> {
        self.steps
            .iter()
            .filter(|s| s.fired)
            .map(|s| s.index)
            .collect()
    }
}
