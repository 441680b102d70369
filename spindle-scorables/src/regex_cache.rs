//! RegexCache: compiled patterns owned by the component that uses them.

use regex::Regex;
use std::collections::HashMap;
use std::sync::RwLock;

/// A cache of compiled regular expressions keyed by pattern source.
///
/// Lock poisoning is ignored; a cache entry is either fully inserted or
/// absent, so a panicked writer leaves nothing half-built.
#[derive(Debug, Default)]
pub struct RegexCache {
    entries: RwLock<HashMap<String, Regex>>,
}

impl RegexCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The compiled pattern, compiling and caching it on first use.
    pub fn get_or_compile(&self, pattern: &str) -> Result<Regex, regex::Error> {
        if let Some(regex) = self.lookup(pattern) {
            return Ok(regex);
        }
        let regex = Regex::new(pattern)?;
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        Ok(entries
            .entry(pattern.to_owned())
            .or_insert(regex)
            .clone())
    }

    /// The compiled pattern, if cached.
    pub fn lookup(&self, pattern: &str) -> Option<Regex> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(pattern).cloned()
    }

    /// Drop one pattern. Returns whether it was cached.
    pub fn invalidate(&self, pattern: &str) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(pattern).is_some()
    }

    /// Drop every pattern.
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }

    /// Number of cached patterns.
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
