use anyhow::Result;
use dashmap::DashMap;
use tracing::debug;

/// A cached artifact together with the fingerprint of the input it was
/// derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoEntry<V> {
    pub fingerprint: String,
    pub value: V,
}

/// Keyed memoization of derived artifacts, validated by fingerprint.
///
/// An entry is served only while its stored fingerprint equals the one the
/// caller presents; a mismatch recomputes and replaces the entry. Entries
/// are never mutated after insertion, and there is no eviction policy:
/// callers that process large inputs should invalidate keys themselves or
/// accept the retention cost.
#[derive(Debug)]
pub struct MemoCache<V: Clone> {
    entries: DashMap<String, MemoEntry<V>>,
}

impl<V: Clone> MemoCache<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Returns the value stored under `key` when its fingerprint matches,
    /// otherwise computes, stores, and returns a fresh value.
    ///
    /// The compute closure runs outside the map lock, so two callers racing
    /// on the same key may both compute and either store may win. Both
    /// observe equivalent values: equal fingerprints mean equal inputs.
    pub fn get_or_try_insert<F>(&self, key: &str, fingerprint: &str, compute: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        if let Some(hit) = self.entries.get(key) {
            if hit.fingerprint == fingerprint {
                debug!("memo hit: {}", key);
                return Ok(hit.value.clone());
            }
            debug!("memo stale: {}", key);
        }

        let value = compute()?;
        self.entries.insert(
            key.to_owned(),
            MemoEntry {
                fingerprint: fingerprint.to_owned(),
                value: value.clone(),
            },
        );
        Ok(value)
    }

    /// Drops the entry stored under `key`, if any.
    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Drops every entry whose key starts with `prefix`. This clears all
    /// artifacts derived from a single input at once.
    pub fn invalidate_prefix(&self, prefix: &str) {
        self.entries.retain(|key, _| !key.starts_with(prefix));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> Default for MemoCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::MemoCache;
    use anyhow::{anyhow, Result};
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    fn counting_compute<'a>(calls: &'a Cell<usize>, value: &'a str) -> impl Fn() -> Result<String> + 'a {
        move || {
            calls.set(calls.get() + 1);
            Ok(value.to_owned())
        }
    }

    #[test]
    fn test_serves_cached_value_for_matching_fingerprint() {
        let cache = MemoCache::new();
        let calls = Cell::new(0);

        let first = cache
            .get_or_try_insert("file::analysis", "v1", counting_compute(&calls, "result"))
            .unwrap();
        let second = cache
            .get_or_try_insert("file::analysis", "v1", counting_compute(&calls, "result"))
            .unwrap();

        assert_eq!(first, "result");
        assert_eq!(second, "result");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_fingerprint_mismatch_recomputes() {
        let cache = MemoCache::new();
        let calls = Cell::new(0);

        cache
            .get_or_try_insert("file::analysis", "v1", counting_compute(&calls, "old"))
            .unwrap();
        let fresh = cache
            .get_or_try_insert("file::analysis", "v2", counting_compute(&calls, "new"))
            .unwrap();

        assert_eq!(fresh, "new");
        assert_eq!(calls.get(), 2);

        // the replacement entry is valid for the new fingerprint only
        let again = cache
            .get_or_try_insert("file::analysis", "v2", counting_compute(&calls, "new"))
            .unwrap();
        assert_eq!(again, "new");
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_compute_errors_are_not_cached() {
        let cache: MemoCache<String> = MemoCache::new();

        let err = cache
            .get_or_try_insert("file::analysis", "v1", || Err(anyhow!("boom")))
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(cache.is_empty());

        let value = cache
            .get_or_try_insert("file::analysis", "v1", || Ok("ok".to_owned()))
            .unwrap();
        assert_eq!(value, "ok");
    }

    #[test]
    fn test_invalidate_prefix_clears_derived_entries_only() {
        let cache = MemoCache::new();
        for key in ["a.ts::analysis", "a.ts::chunk::x", "b.ts::analysis"] {
            cache
                .get_or_try_insert(key, "v1", || Ok(key.to_owned()))
                .unwrap();
        }

        cache.invalidate_prefix("a.ts::");
        assert_eq!(cache.len(), 1);

        let calls = Cell::new(0);
        cache
            .get_or_try_insert("b.ts::analysis", "v1", counting_compute(&calls, "unused"))
            .unwrap();
        assert_eq!(calls.get(), 0);
    }
}
