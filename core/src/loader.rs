//! Rule set resolution and caching.
//!
//! [`RuleLoader`] turns a [`RuleSource`] into a compiled [`RuleSet`]. Named
//! sources are compiled once and cached for the life of the
//! [`RuleSetCache`]; inline documents are compiled on every call.

use crate::{ConfigSource, RawRules, RuleCompiler, RuleSet};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, instrument, warn};

/// Where a rule set comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    /// The source's default identifier (see [`ConfigSource::default_id`]).
    Default,
    /// A named document, e.g. a file path.
    Named(String),
    /// An in-memory document. Never cached.
    Inline(RawRules),
}

impl RuleSource {
    /// A named source.
    #[must_use]
    pub fn named(id: impl Into<String>) -> Self {
        Self::Named(id.into())
    }
}

impl From<RawRules> for RuleSource {
    fn from(raw: RawRules) -> Self {
        Self::Inline(raw)
    }
}

impl fmt::Display for RuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default"),
            Self::Named(id) => f.write_str(id),
            Self::Inline(raw) => write!(f, "inline ({} entries)", raw.len()),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Cache
// ═══════════════════════════════════════════════════════════════════════════════

/// One cache slot. `value` is set at most once; `init` serializes the
/// load-and-compile for this identifier only.
#[derive(Debug, Default)]
struct CacheEntry {
    value: OnceLock<Arc<RuleSet>>,
    init: Mutex<()>,
}

/// Compiled rule sets by canonical source identifier.
///
/// Entries are added on first successful resolution and never evicted.
/// Share one cache between loaders with [`RuleLoader::with_cache`].
#[derive(Debug, Default)]
pub struct RuleSetCache {
    entries: Mutex<HashMap<String, Arc<CacheEntry>>>,
}

impl RuleSetCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached rule set for `id`, if any.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<RuleSet>> {
        self.entries
            .lock()
            .get(id)
            .and_then(|slot| slot.value.get().cloned())
    }

    /// Whether `id` is cached.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Cached identifiers, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .entries
            .lock()
            .iter()
            .filter(|(_, slot)| slot.value.get().is_some())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Number of cached rule sets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .values()
            .filter(|slot| slot.value.get().is_some())
            .count()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The slot for `id`, created empty on first use. The map lock is
    /// released before the caller touches the slot.
    fn slot(&self, id: &str) -> Arc<CacheEntry> {
        Arc::clone(self.entries.lock().entry(id.to_owned()).or_default())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Loader
// ═══════════════════════════════════════════════════════════════════════════════

/// Resolves [`RuleSource`]s to compiled rule sets.
///
/// # INV: absent means `None`
///
/// An absent, unreadable, malformed, or empty source resolves to `None`, and
/// none of those outcomes is cached: the next call asks the source again.
///
/// # INV: compile once per identifier
///
/// Named sources are keyed by [`ConfigSource::canonical_id`], so every
/// spelling of one document shares an entry. Each entry has its own init
/// lock held from re-check through insertion: concurrent callers resolving
/// the same identifier compile it exactly once, while other identifiers
/// and cache hits never wait on that load.
pub struct RuleLoader<S> {
    source: S,
    cache: Arc<RuleSetCache>,
}

impl<S: ConfigSource> RuleLoader<S> {
    /// Create a loader with its own cache.
    pub fn new(source: S) -> Self {
        Self::with_cache(source, Arc::new(RuleSetCache::new()))
    }

    /// Create a loader sharing an existing cache.
    pub fn with_cache(source: S, cache: Arc<RuleSetCache>) -> Self {
        Self { source, cache }
    }

    /// The configuration source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The cache.
    pub fn cache(&self) -> &Arc<RuleSetCache> {
        &self.cache
    }

    /// Cached identifiers, sorted.
    #[must_use]
    pub fn cached_ids(&self) -> Vec<String> {
        self.cache.ids()
    }

    /// Whether `id`, in any spelling the source folds together, is cached.
    #[must_use]
    pub fn is_cached(&self, id: &str) -> bool {
        self.cache.contains(&self.source.canonical_id(id))
    }

    /// Resolve a source to a non-empty rule set, or `None` for "no filtering".
    #[instrument(skip(self, source), fields(source = %source))]
    pub fn resolve(&self, source: &RuleSource) -> Option<Arc<RuleSet>> {
        match source {
            RuleSource::Inline(raw) => compile(raw).map(Arc::new),
            RuleSource::Named(id) => self.resolve_named(id),
            RuleSource::Default => match self.source.default_id() {
                Some(id) => self.resolve_named(&id),
                None => {
                    debug!("no default rule source configured");
                    None
                }
            },
        }
    }

    fn resolve_named(&self, id: &str) -> Option<Arc<RuleSet>> {
        let key = self.source.canonical_id(id);
        let slot = self.cache.slot(&key);
        if let Some(rule_set) = slot.value.get() {
            debug!(id = %key, "rule set cache hit");
            return Some(Arc::clone(rule_set));
        }

        let _init = slot.init.lock();
        if let Some(rule_set) = slot.value.get() {
            debug!(id = %key, "rule set compiled by another caller");
            return Some(Arc::clone(rule_set));
        }
        debug!(id = %key, "rule set cache miss");

        if !self.source.exists(&key) {
            debug!(id = %key, "rule source absent");
            return None;
        }
        let raw = match self.source.load(&key) {
            Ok(raw) => raw,
            Err(e) if e.is_absent() => {
                debug!(id = %key, "rule source vanished before load");
                return None;
            }
            Err(e) => {
                warn!(id = %key, error = %e, "ignoring unusable rule source");
                return None;
            }
        };

        let rule_set = Arc::new(compile(&raw)?);
        info!(id = %key, rules = rule_set.len(), "rule set compiled and cached");
        Some(Arc::clone(slot.value.get_or_init(|| rule_set)))
    }
}

impl<S: fmt::Debug> fmt::Debug for RuleLoader<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleLoader")
            .field("source", &self.source)
            .field("cached", &self.cache.len())
            .finish()
    }
}

/// Compile, log diagnostics, and treat an empty result as no rules.
fn compile(raw: &RawRules) -> Option<RuleSet> {
    let compiled = RuleCompiler::compile(raw);
    for diagnostic in &compiled.diagnostics {
        warn!(%diagnostic, "rule skipped");
    }
    if compiled.rule_set.is_empty() {
        debug!("rule set is empty");
        return None;
    }
    Some(compiled.rule_set)
}
