//! Ephemeral per-session blob cache.
//!
//! Caches synthesized diff blobs keyed by the fully-qualified pull-request
//! reference, so repeated runs against the same PR within a session skip
//! re-synthesis. Best-effort: IO errors read as cache misses.

pub mod store;

use sha2::{Digest, Sha256};

use crate::models::{DiffBlob, PullRequestRef};
use crate::pipeline::SynthesisOptions;

/// Compute a filesystem-safe cache key for one synthesis run.
///
/// The key covers the pull-request reference, the head revision, and the
/// options fingerprint: a new push or a different mode/budget misses
/// instead of serving a stale or mismatched blob.
pub fn cache_key(pr: &PullRequestRef, head_revision: &str, opts: &SynthesisOptions) -> String {
    let mut hasher = Sha256::new();
    hasher.update(pr.qualified().as_bytes());
    hasher.update(pr.host_variant.to_string().as_bytes());
    hasher.update(head_revision.as_bytes());
    hasher.update(opts.fingerprint().as_bytes());
    hex::encode(hasher.finalize())
}

/// The cache engine for diff blobs.
pub struct BlobCache {
    enabled: bool,
    store: store::FileStore,
}

impl BlobCache {
    /// Create a new cache engine.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            store: store::FileStore::new(),
        }
    }

    /// Look up a cached blob.
    pub fn get(&self, key: &str) -> Option<DiffBlob> {
        if !self.enabled {
            return None;
        }
        self.store.get(key)
    }

    /// Store a blob in the cache.
    pub fn put(&self, key: &str, blob: &DiffBlob) {
        if !self.enabled {
            return;
        }
        self.store.put(key, blob);
    }

    /// Remove all cached entries.
    pub fn clear(&self) -> Result<store::CacheStats, std::io::Error> {
        self.store.clear()
    }

    /// Compute statistics about the cache.
    pub fn stats(&self) -> Result<store::CacheStats, std::io::Error> {
        self.store.stats()
    }

    /// Return the cache directory path.
    pub fn path(&self) -> Option<&std::path::PathBuf> {
        self.store.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DiffMode, HostVariant};

    fn sample_ref(id: u64) -> PullRequestRef {
        PullRequestRef {
            organization: "acme".into(),
            project: "widgets".into(),
            repository: "api".into(),
            pull_request_id: id,
            host_variant: HostVariant::Cloud,
        }
    }

    #[test]
    fn cache_key_is_stable_and_distinct() {
        let opts = SynthesisOptions::default();
        assert_eq!(
            cache_key(&sample_ref(1), "abc", &opts),
            cache_key(&sample_ref(1), "abc", &opts)
        );
        assert_ne!(
            cache_key(&sample_ref(1), "abc", &opts),
            cache_key(&sample_ref(2), "abc", &opts)
        );
    }

    #[test]
    fn cache_key_distinguishes_host_variants() {
        let opts = SynthesisOptions::default();
        let cloud = sample_ref(1);
        let mut server = sample_ref(1);
        server.host_variant = HostVariant::Server;
        assert_ne!(
            cache_key(&cloud, "abc", &opts),
            cache_key(&server, "abc", &opts)
        );
    }

    #[test]
    fn cache_key_distinguishes_options_and_revisions() {
        let base = SynthesisOptions::default();
        let key = cache_key(&sample_ref(1), "abc", &base);

        let full_file = SynthesisOptions {
            mode: DiffMode::FullFile,
            ..SynthesisOptions::default()
        };
        assert_ne!(key, cache_key(&sample_ref(1), "abc", &full_file));

        let tight = SynthesisOptions {
            budget: 500,
            max_files: 3,
            ..SynthesisOptions::default()
        };
        assert_ne!(key, cache_key(&sample_ref(1), "abc", &tight));

        // A new push moves the head revision and misses the old entry.
        assert_ne!(key, cache_key(&sample_ref(1), "def", &base));
    }

    #[test]
    fn disabled_cache_never_hits() {
        let cache = BlobCache::new(false);
        let blob = DiffBlob {
            text: "x".into(),
            files_emitted: 1,
            files_omitted: 0,
        };
        cache.put("key", &blob);
        assert!(cache.get("key").is_none());
    }
}
