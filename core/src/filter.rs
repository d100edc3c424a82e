//! `Filter` — the entry point hosts call per message.

use crate::{ConfigSource, EvalTrace, Record, RuleLoader, RuleSource};
use tracing::debug;

/// Applies resolved rule sets to records.
///
/// Filtering never fails: when the source resolves to nothing (absent,
/// malformed, or empty) the record is left untouched.
///
/// # Example
///
/// ```ignore
/// let filter = Filter::new(RuleLoader::new(FileSource::new()));
/// filter.apply_default(&mut message); // ~/.mailsift/filters.yaml
/// ```
#[derive(Debug)]
pub struct Filter<S> {
    loader: RuleLoader<S>,
}

impl<S: ConfigSource> Filter<S> {
    /// Create a filter over a loader.
    pub fn new(loader: RuleLoader<S>) -> Self {
        Self { loader }
    }

    /// The underlying loader.
    pub fn loader(&self) -> &RuleLoader<S> {
        &self.loader
    }

    /// Apply the rules from `source` to `record`, in order. Returns how many
    /// rules fired; zero when there are no rules.
    pub fn apply_filters<R: Record + ?Sized>(&self, record: &mut R, source: &RuleSource) -> usize {
        match self.loader.resolve(source) {
            Some(rule_set) => rule_set.apply(record),
            None => {
                debug!(%source, "no rules, record left unchanged");
                0
            }
        }
    }

    /// Apply the rules from the default source.
    pub fn apply_default<R: Record + ?Sized>(&self, record: &mut R) -> usize {
        self.apply_filters(record, &RuleSource::Default)
    }

    /// Like [`apply_filters()`](Self::apply_filters), returning a trace.
    /// `None` when there are no rules.
    pub fn apply_with_trace<R: Record + ?Sized>(
        &self,
        record: &mut R,
        source: &RuleSource,
    ) -> Option<EvalTrace> {
        self.loader
            .resolve(source)
            .map(|rule_set| rule_set.apply_with_trace(record))
    }
}
