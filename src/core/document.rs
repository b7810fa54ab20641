//! Document lookup seam used by the validator.
//!
//! The validator never touches the filesystem; it asks a [`DocumentSource`]
//! for document text by id. A missing document is `None`, which callers treat
//! as "document unavailable".

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

use lru::LruCache;
use tracing::debug;

/// Default number of documents kept by [`CachedSource`]
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Something that can return document text by id
pub trait DocumentSource {
    /// Document text with any front-matter removed, `None` if unavailable
    fn get_document(&self, doc_id: &str) -> Option<String>;
}

impl<S: DocumentSource + ?Sized> DocumentSource for &S {
    fn get_document(&self, doc_id: &str) -> Option<String> {
        (**self).get_document(doc_id)
    }
}

impl DocumentSource for HashMap<String, String> {
    fn get_document(&self, doc_id: &str) -> Option<String> {
        self.get(doc_id).cloned()
    }
}

/// Least-recently-used cache in front of another source
///
/// Only hits are cached; a missing document is looked up again next time.
pub struct CachedSource<S> {
    inner: S,
    entries: Mutex<LruCache<String, String>>,
}

impl<S: DocumentSource> CachedSource<S> {
    pub fn new(inner: S) -> Self {
        Self::with_capacity(inner, DEFAULT_CACHE_CAPACITY)
    }

    /// A capacity of zero is treated as one
    pub fn with_capacity(inner: S, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of documents currently cached
    pub fn cached(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, String>> {
        // a poisoned cache only holds complete entries, keep using it
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<S: DocumentSource> DocumentSource for CachedSource<S> {
    fn get_document(&self, doc_id: &str) -> Option<String> {
        if let Some(content) = self.lock().get(doc_id) {
            debug!(doc_id, "Document cache hit");
            return Some(content.clone());
        }

        let content = self.inner.get_document(doc_id)?;
        self.lock().put(doc_id.to_string(), content.clone());

        Some(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingSource {
        docs: HashMap<String, String>,
        lookups: Cell<usize>,
    }

    impl DocumentSource for CountingSource {
        fn get_document(&self, doc_id: &str) -> Option<String> {
            self.lookups.set(self.lookups.get() + 1);
            self.docs.get(doc_id).cloned()
        }
    }

    fn source() -> CountingSource {
        let docs = [("a.md", "alpha"), ("b.md", "beta"), ("c.md", "gamma")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CountingSource {
            docs,
            lookups: Cell::new(0),
        }
    }

    #[test]
    fn test_cache_hit_skips_inner_lookup() {
        let cache = CachedSource::new(source());

        assert_eq!(cache.get_document("a.md").as_deref(), Some("alpha"));
        assert_eq!(cache.get_document("a.md").as_deref(), Some("alpha"));
        assert_eq!(cache.inner().lookups.get(), 1);
    }

    #[test]
    fn test_missing_documents_are_not_cached() {
        let cache = CachedSource::new(source());

        assert_eq!(cache.get_document("missing.md"), None);
        assert_eq!(cache.get_document("missing.md"), None);
        assert_eq!(cache.inner().lookups.get(), 2);
        assert_eq!(cache.cached(), 0);
    }

    #[test]
    fn test_least_recently_used_is_evicted() {
        let cache = CachedSource::with_capacity(source(), 2);

        cache.get_document("a.md");
        cache.get_document("b.md");
        // touch a.md so b.md becomes the eviction candidate
        cache.get_document("a.md");
        cache.get_document("c.md");
        assert_eq!(cache.cached(), 2);
        assert_eq!(cache.inner().lookups.get(), 3);

        cache.get_document("a.md");
        assert_eq!(cache.inner().lookups.get(), 3);

        cache.get_document("b.md");
        assert_eq!(cache.inner().lookups.get(), 4);
    }
}
