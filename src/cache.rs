//! SQLite-backed fingerprint cache.
//!
//! # Overview
//!
//! fpcalc decodes the whole file on every run, which dominates rescan time
//! for unchanged libraries. The cache stores each file's raw codes keyed by
//! absolute path and invalidates entries whose recorded modification time
//! no longer matches the file on disk. Stale entries are replaced on the
//! next store.
//!
//! Cache failures are never fatal: callers degrade to plain extraction and
//! log at debug level.

use std::path::Path;
use std::time::UNIX_EPOCH;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};

use crate::fingerprint::Fingerprint;

/// Persistent fingerprint cache keyed by `(path, mtime)`.
pub struct FingerprintCache {
    conn: Connection,
}

impl FingerprintCache {
    /// Open (or create) a cache database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating cache directory {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("opening fingerprint cache {}", path.display()))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS fingerprints (
                path  TEXT PRIMARY KEY,
                mtime INTEGER NOT NULL,
                codes BLOB NOT NULL
            );",
        )
        .context("initializing fingerprint cache schema")?;
        Ok(Self { conn })
    }

    /// Open the cache at the default platform-specific location.
    pub fn open_default() -> Result<Self> {
        let project_dirs = ProjectDirs::from("com", "clipsync", "clipsync")
            .context("failed to determine project directories")?;
        Self::open(&project_dirs.cache_dir().join("fingerprints.db"))
    }

    /// Look up a cached fingerprint, honoring mtime invalidation.
    ///
    /// Returns `None` on miss or when the file changed since the entry was
    /// stored.
    pub fn get(&self, path: &Path, mtime: i64) -> Result<Option<Fingerprint>> {
        let row: Option<(i64, Vec<u8>)> = self
            .conn
            .query_row(
                "SELECT mtime, codes FROM fingerprints WHERE path = ?1",
                params![path.to_string_lossy().into_owned()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .context("querying fingerprint cache")?;

        match row {
            Some((cached_mtime, blob)) if cached_mtime == mtime => {
                Ok(Some(Fingerprint::new(blob_to_codes(&blob))))
            }
            Some(_) => {
                log::debug!("stale cache entry for {}", path.display());
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Store (or replace) a fingerprint for `path` at the given mtime.
    pub fn put(&self, path: &Path, mtime: i64, fingerprint: &Fingerprint) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO fingerprints (path, mtime, codes) VALUES (?1, ?2, ?3)",
                params![
                    path.to_string_lossy().into_owned(),
                    mtime,
                    codes_to_blob(fingerprint.codes())
                ],
            )
            .context("storing fingerprint cache entry")?;
        Ok(())
    }

    /// Drop every cached entry.
    pub fn clear(&self) -> Result<()> {
        self.conn
            .execute("DELETE FROM fingerprints", [])
            .context("clearing fingerprint cache")?;
        Ok(())
    }

    /// Number of cached entries.
    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM fingerprints", [], |row| row.get(0))
            .context("counting fingerprint cache entries")?;
        Ok(count as usize)
    }
}

/// Modification time of `path` as unix seconds, for use as a cache key.
pub fn file_mtime(path: &Path) -> Option<i64> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    let secs = modified.duration_since(UNIX_EPOCH).ok()?.as_secs();
    i64::try_from(secs).ok()
}

fn codes_to_blob(codes: &[u32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(codes.len() * 4);
    for code in codes {
        blob.extend_from_slice(&code.to_le_bytes());
    }
    blob
}

fn blob_to_codes(blob: &[u8]) -> Vec<u32> {
    blob.chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_cache(dir: &TempDir) -> FingerprintCache {
        FingerprintCache::open(&dir.path().join("cache.db")).unwrap()
    }

    #[test]
    fn test_miss_on_empty_cache() {
        let dir = TempDir::new().unwrap();
        let cache = open_cache(&dir);
        assert!(cache.get(Path::new("/a.mp3"), 100).unwrap().is_none());
    }

    #[test]
    fn test_put_then_get() {
        let dir = TempDir::new().unwrap();
        let cache = open_cache(&dir);
        let fp = Fingerprint::new(vec![1, 2, u32::MAX]);

        cache.put(Path::new("/a.mp3"), 100, &fp).unwrap();
        let hit = cache.get(Path::new("/a.mp3"), 100).unwrap().unwrap();
        assert_eq!(hit, fp);
    }

    #[test]
    fn test_mtime_mismatch_is_miss() {
        let dir = TempDir::new().unwrap();
        let cache = open_cache(&dir);
        let fp = Fingerprint::new(vec![7]);

        cache.put(Path::new("/a.mp3"), 100, &fp).unwrap();
        assert!(cache.get(Path::new("/a.mp3"), 101).unwrap().is_none());
    }

    #[test]
    fn test_replace_stale_entry() {
        let dir = TempDir::new().unwrap();
        let cache = open_cache(&dir);

        cache
            .put(Path::new("/a.mp3"), 100, &Fingerprint::new(vec![1]))
            .unwrap();
        cache
            .put(Path::new("/a.mp3"), 200, &Fingerprint::new(vec![2]))
            .unwrap();

        assert_eq!(cache.len().unwrap(), 1);
        let hit = cache.get(Path::new("/a.mp3"), 200).unwrap().unwrap();
        assert_eq!(hit.codes(), &[2]);
    }

    #[test]
    fn test_clear() {
        let dir = TempDir::new().unwrap();
        let cache = open_cache(&dir);
        cache
            .put(Path::new("/a.mp3"), 1, &Fingerprint::new(vec![1]))
            .unwrap();
        cache.clear().unwrap();
        assert_eq!(cache.len().unwrap(), 0);
    }

    #[test]
    fn test_empty_fingerprint_round_trip() {
        let dir = TempDir::new().unwrap();
        let cache = open_cache(&dir);
        cache
            .put(Path::new("/a.mp3"), 1, &Fingerprint::new(Vec::new()))
            .unwrap();
        let hit = cache.get(Path::new("/a.mp3"), 1).unwrap().unwrap();
        assert!(hit.is_empty());
    }

    #[test]
    fn test_blob_round_trip() {
        let codes = vec![0, 1, 0xDEAD_BEEF, u32::MAX];
        assert_eq!(blob_to_codes(&codes_to_blob(&codes)), codes);
    }
}
