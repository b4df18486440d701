//! Filesystem-based cache store.
//!
//! Stores cached blobs as JSON files in the user cache directory
//! (e.g. `~/.cache/prdiff/`).

use std::path::PathBuf;

use crate::models::DiffBlob;

/// Filesystem-based cache store.
pub struct FileStore {
    cache_dir: Option<PathBuf>,
}

impl FileStore {
    /// Create a new file store using the default cache directory.
    pub fn new() -> Self {
        let cache_dir = dirs::cache_dir().map(|d| d.join(crate::constants::CACHE_DIR));
        Self { cache_dir }
    }

    /// Create a file store with a specific cache directory (useful for testing).
    pub fn new_with_dir(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir: Some(cache_dir),
        }
    }

    /// Get a cached blob by key.
    pub fn get(&self, key: &str) -> Option<DiffBlob> {
        let path = self.key_path(key)?;
        if !path.exists() {
            return None;
        }

        let content = std::fs::read_to_string(&path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Store a blob by key.
    pub fn put(&self, key: &str, blob: &DiffBlob) {
        let Some(path) = self.key_path(key) else {
            return;
        };

        // Ensure cache directory exists
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let content = match serde_json::to_string(blob) {
            Ok(c) => c,
            Err(_) => return,
        };

        let _ = std::fs::write(&path, content);
    }

    /// Remove all cached entries.
    pub fn clear(&self) -> Result<CacheStats, std::io::Error> {
        let stats = self.stats();
        if let Some(ref dir) = self.cache_dir {
            if dir.exists() {
                std::fs::remove_dir_all(dir)?;
            }
        }
        stats
    }

    /// Compute statistics about the cache.
    pub fn stats(&self) -> Result<CacheStats, std::io::Error> {
        let Some(ref dir) = self.cache_dir else {
            return Ok(CacheStats {
                entries: 0,
                total_bytes: 0,
            });
        };

        if !dir.exists() {
            return Ok(CacheStats {
                entries: 0,
                total_bytes: 0,
            });
        }

        let mut entries: usize = 0;
        let mut total_bytes: u64 = 0;

        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "json") {
                entries += 1;
                total_bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
            }
        }

        Ok(CacheStats {
            entries,
            total_bytes,
        })
    }

    /// Return the cache directory path.
    pub fn path(&self) -> Option<&PathBuf> {
        self.cache_dir.as_ref()
    }

    /// Get the file path for a cache key.
    fn key_path(&self, key: &str) -> Option<PathBuf> {
        self.cache_dir
            .as_ref()
            .map(|dir| dir.join(format!("{key}.json")))
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached entries.
    pub entries: usize,
    /// Total size in bytes.
    pub total_bytes: u64,
}

impl CacheStats {
    /// Format total_bytes as a human-readable string.
    pub fn human_size(&self) -> String {
        const KB: u64 = 1024;
        const MB: u64 = 1024 * KB;

        if self.total_bytes >= MB {
            format!("{:.1} MiB", self.total_bytes as f64 / MB as f64)
        } else if self.total_bytes >= KB {
            format!("{:.1} KiB", self.total_bytes as f64 / KB as f64)
        } else {
            format!("{} B", self.total_bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_blob() -> DiffBlob {
        DiffBlob {
            text: "# PR: test\n\nFiles changed: 0\n\nNo changes detected.\n".into(),
            files_emitted: 0,
            files_omitted: 0,
        }
    }

    #[test]
    fn put_then_get_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new_with_dir(dir.path().to_path_buf());

        store.put("abc123", &sample_blob());
        let loaded = store.get("abc123").expect("blob should be cached");
        assert_eq!(loaded.text, sample_blob().text);
        assert_eq!(loaded.files_emitted, 0);
    }

    #[test]
    fn missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new_with_dir(dir.path().to_path_buf());
        assert!(store.get("nope").is_none());
    }

    #[test]
    fn corrupt_entry_reads_as_miss() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        let store = FileStore::new_with_dir(dir.path().to_path_buf());
        assert!(store.get("bad").is_none());
    }

    #[test]
    fn human_size_units() {
        let stats = |total_bytes| CacheStats {
            entries: 1,
            total_bytes,
        };
        assert_eq!(stats(500).human_size(), "500 B");
        assert_eq!(stats(2048).human_size(), "2.0 KiB");
        assert_eq!(stats(2 * 1024 * 1024).human_size(), "2.0 MiB");
    }

    #[test]
    fn stats_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new_with_dir(dir.path().join("cache"));

        store.put("one", &sample_blob());
        store.put("two", &sample_blob());

        let stats = store.stats().unwrap();
        assert_eq!(stats.entries, 2);
        assert!(stats.total_bytes > 0);

        let cleared = store.clear().unwrap();
        assert_eq!(cleared.entries, 2);
        assert_eq!(store.stats().unwrap().entries, 0);
    }
}
