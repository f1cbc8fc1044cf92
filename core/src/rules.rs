// core/src/rules.rs
//
// Custom rule matching. Rules belong to the configuration; the engine only
// keeps compiled patterns around so repeated cursor events don't recompile.

use crate::model::{CustomRule, InputMethodKind};
use regex::Regex;
use std::cell::RefCell;
use std::num::NonZeroUsize;

/// Default number of compiled patterns kept in the cache.
pub const DEFAULT_PATTERN_CACHE: usize = 64;

/// Matches text against user rules in priority order.
///
/// The engine holds no copy of the rules. Compiled patterns are cached by
/// pattern text, so editing a rule's pattern simply misses the cache. A
/// pattern that fails to compile is remembered as invalid and skipped.
pub struct RuleEngine {
    patterns: RefCell<lru::LruCache<String, Option<Regex>>>,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_PATTERN_CACHE)
    }

    /// Create an engine caching at most `capacity` compiled patterns.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            patterns: RefCell::new(lru::LruCache::new(capacity)),
        }
    }

    /// Find the first enabled rule, by descending priority, whose pattern
    /// occurs anywhere in `text`.
    ///
    /// Rules with equal priority keep their declared order (stable sort).
    pub fn match_rule<'r>(&self, rules: &'r [CustomRule], text: &str) -> Option<&'r CustomRule> {
        let mut ordered: Vec<&CustomRule> = rules.iter().filter(|r| r.enabled).collect();
        ordered.sort_by(|a, b| b.priority.cmp(&a.priority));

        ordered.into_iter().find(|rule| self.is_match(rule, text))
    }

    /// Target method for `text`: the matched rule's target, or `default`.
    pub fn resolve_target(
        &self,
        rules: &[CustomRule],
        text: &str,
        default: InputMethodKind,
    ) -> InputMethodKind {
        match self.match_rule(rules, text) {
            Some(rule) => {
                tracing::debug!(rule = %rule.id, target = %rule.target, "custom rule matched");
                rule.target
            }
            None => default,
        }
    }

    /// Number of patterns currently cached (valid or not).
    pub fn cached_patterns(&self) -> usize {
        self.patterns.borrow().len()
    }

    fn is_match(&self, rule: &CustomRule, text: &str) -> bool {
        let mut cache = self.patterns.borrow_mut();
        if let Some(compiled) = cache.get(rule.pattern.as_str()) {
            return compiled.as_ref().map(|re| re.is_match(text)).unwrap_or(false);
        }

        let compiled = match Regex::new(&rule.pattern) {
            Ok(re) => Some(re),
            Err(err) => {
                tracing::warn!(rule = %rule.id, pattern = %rule.pattern, error = %err, "skipping invalid rule pattern");
                None
            }
        };
        let matched = compiled.as_ref().map(|re| re.is_match(text)).unwrap_or(false);
        cache.put(rule.pattern.clone(), compiled);
        matched
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}
