//! Disk-backed content store.
//!
//! Reads go through `tokio::fs`; writes run on the blocking pool so that a
//! temp file can be synced and renamed into place.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use tempfile::NamedTempFile;

use super::hash::{StoreKey, store_path};
use crate::Error;

/// Content-addressed cache rooted at a directory.
///
/// Cheap to clone; clones share the same root.
#[derive(Clone, Debug)]
pub struct ContentStore {
    root: Arc<PathBuf>,
}

impl ContentStore {
    /// Open a store rooted at `root`.
    ///
    /// Nothing is created until the first [`put`](Self::put).
    pub fn open(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
        Self { root: Arc::new(root) }
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of the entry for `key`.
    pub fn path_for(&self, key: &StoreKey) -> PathBuf {
        self.root.join(store_path(key))
    }

    /// Whether an entry exists for `key`.
    ///
    /// Only a regular file at the entry path counts.
    pub async fn exists(&self, key: &StoreKey) -> bool {
        tokio::fs::metadata(self.path_for(key))
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    /// Last modification time of the entry, or `None` if absent.
    pub async fn modified(&self, key: &StoreKey) -> Result<Option<SystemTime>, Error> {
        let path = self.path_for(key);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if !meta.is_file() => Ok(None),
            Ok(meta) => meta
                .modified()
                .map(Some)
                .map_err(|e| Error::StoreRead(format!("{}: {}", path.display(), e))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::StoreRead(format!("{}: {}", path.display(), e))),
        }
    }

    /// Whether the entry exists and is younger than `window`.
    ///
    /// A zero window never expires. An entry whose age equals the window is stale.
    pub async fn is_fresh(&self, key: &StoreKey, window: Duration) -> bool {
        self.is_fresh_at(key, window, SystemTime::now()).await
    }

    /// [`is_fresh`](Self::is_fresh) evaluated at an explicit instant.
    pub async fn is_fresh_at(&self, key: &StoreKey, window: Duration, now: SystemTime) -> bool {
        let modified = match self.modified(key).await {
            Ok(Some(modified)) => modified,
            Ok(None) => return false,
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "treating unreadable entry as stale");
                return false;
            }
        };

        if window.is_zero() {
            return true;
        }

        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        age < window
    }

    /// Read the entry for `key`.
    ///
    /// Returns `None` if no entry exists.
    pub async fn get(&self, key: &StoreKey) -> Result<Option<Bytes>, Error> {
        let path = self.path_for(key);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::StoreRead(format!("{}: {}", path.display(), e))),
        }
    }

    /// Write `data` as the entry for `key`, replacing any previous entry.
    ///
    /// Missing parent directories are created. The bytes are written to a
    /// temporary file beside the target and renamed into place.
    pub async fn put(&self, key: &StoreKey, data: Bytes) -> Result<(), Error> {
        let path = self.path_for(key);
        tokio::task::spawn_blocking(move || write_atomic(&path, &data))
            .await
            .map_err(|e| Error::StoreWrite(format!("write task failed: {}", e)))?
    }
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<(), Error> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::StoreWrite(format!("{} has no parent directory", path.display())))?;

    std::fs::create_dir_all(parent).map_err(|e| Error::StoreWrite(format!("{}: {}", parent.display(), e)))?;

    let mut tmp =
        NamedTempFile::new_in(parent).map_err(|e| Error::StoreWrite(format!("{}: {}", parent.display(), e)))?;
    tmp.write_all(data)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| Error::StoreWrite(format!("{}: {}", tmp.path().display(), e)))?;

    tmp.persist(path)
        .map_err(|e| Error::StoreWrite(format!("{}: {}", path.display(), e.error)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(identity: &str) -> StoreKey {
        StoreKey::from_identity(identity)
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::open(dir.path());
        let k = key("http://x/a");

        store.put(&k, Bytes::from_static(b"\x00\xffpayload")).await.unwrap();
        let data = store.get(&k).await.unwrap();
        assert_eq!(data.as_deref(), Some(&b"\x00\xffpayload"[..]));
    }

    #[tokio::test]
    async fn test_put_creates_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::open(dir.path().join("not/yet/there"));
        let k = key("http://x/a");

        store.put(&k, Bytes::from_static(b"hello")).await.unwrap();
        assert!(store.path_for(&k).is_file());
        assert!(store.path_for(&k).starts_with(dir.path()));
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::open(dir.path());
        let k = key("http://x/a");

        store.put(&k, Bytes::from_static(b"first")).await.unwrap();
        store.put(&k, Bytes::from_static(b"second")).await.unwrap();
        assert_eq!(store.get(&k).await.unwrap().as_deref(), Some(&b"second"[..]));
    }

    #[tokio::test]
    async fn test_put_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::open(dir.path());
        let k = key("http://x/a");

        store.put(&k, Bytes::from_static(b"hello")).await.unwrap();
        let parent = store.path_for(&k).parent().unwrap().to_path_buf();
        let entries: Vec<_> = std::fs::read_dir(parent).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::open(dir.path());
        assert!(store.get(&key("nothing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_unreadable_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::open(dir.path());
        let k = key("http://x/a");
        std::fs::create_dir_all(store.path_for(&k)).unwrap();

        let result = store.get(&k).await;
        assert!(matches!(result, Err(Error::StoreRead(_))));
    }

    #[tokio::test]
    async fn test_directory_at_entry_path_is_not_an_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::open(dir.path());
        let k = key("http://x/a");
        std::fs::create_dir_all(store.path_for(&k)).unwrap();

        assert!(!store.exists(&k).await);
        assert_eq!(store.modified(&k).await.unwrap(), None);
        assert!(!store.is_fresh(&k, Duration::ZERO).await);
        assert!(!store.is_fresh(&k, Duration::from_secs(60)).await);
    }

    #[tokio::test]
    async fn test_never_written_is_not_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::open(dir.path());
        let k = key("nothing");

        assert!(!store.exists(&k).await);
        assert!(!store.is_fresh(&k, Duration::ZERO).await);
        assert!(!store.is_fresh(&k, Duration::from_secs(60)).await);
    }

    #[tokio::test]
    async fn test_zero_window_matches_exists() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::open(dir.path());
        let written = key("written");
        let absent = key("absent");
        store.put(&written, Bytes::from_static(b"x")).await.unwrap();

        for k in [&written, &absent] {
            assert_eq!(store.is_fresh(k, Duration::ZERO).await, store.exists(k).await);
        }
    }

    #[tokio::test]
    async fn test_zero_window_never_expires() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::open(dir.path());
        let k = key("old");
        store.put(&k, Bytes::from_static(b"x")).await.unwrap();

        let far_future = SystemTime::now() + Duration::from_secs(10 * 365 * 24 * 60 * 60);
        assert!(store.is_fresh_at(&k, Duration::ZERO, far_future).await);
    }

    #[tokio::test]
    async fn test_freshness_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::open(dir.path());
        let k = key("http://x/a");
        store.put(&k, Bytes::from_static(b"x")).await.unwrap();

        let t0 = store.modified(&k).await.unwrap().unwrap();
        let window = Duration::from_secs(60);

        assert!(store.is_fresh_at(&k, window, t0).await);
        assert!(store.is_fresh_at(&k, window, t0 + window - Duration::from_millis(1)).await);
        assert!(!store.is_fresh_at(&k, window, t0 + window).await);
        assert!(!store.is_fresh_at(&k, window, t0 + window + Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn test_future_mtime_counts_as_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::open(dir.path());
        let k = key("http://x/a");
        store.put(&k, Bytes::from_static(b"x")).await.unwrap();

        let t0 = store.modified(&k).await.unwrap().unwrap();
        let before_write = t0 - Duration::from_secs(5);
        assert!(store.is_fresh_at(&k, Duration::from_secs(1), before_write).await);
    }

    #[tokio::test]
    async fn test_concurrent_puts_distinct_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::open(dir.path());

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let k = key(&format!("http://x/{i}"));
                store.put(&k, Bytes::from(format!("body-{i}"))).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        for i in 0..16 {
            let data = store.get(&key(&format!("http://x/{i}"))).await.unwrap().unwrap();
            assert_eq!(data, Bytes::from(format!("body-{i}")));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_key_reads_never_see_partial_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::open(dir.path());
        let k = key("http://x/large");

        let a = Bytes::from(vec![b'a'; 1024 * 1024]);
        let b = Bytes::from(vec![b'b'; 1024 * 1024]);
        store.put(&k, a.clone()).await.unwrap();

        let writer = {
            let store = store.clone();
            let k = k.clone();
            let (a, b) = (a.clone(), b.clone());
            tokio::spawn(async move {
                for i in 0..20 {
                    let payload = if i % 2 == 0 { b.clone() } else { a.clone() };
                    store.put(&k, payload).await.unwrap();
                }
            })
        };

        let mut readers = Vec::new();
        for _ in 0..4 {
            let store = store.clone();
            let k = k.clone();
            let (a, b) = (a.clone(), b.clone());
            readers.push(tokio::spawn(async move {
                for _ in 0..50 {
                    let data = store.get(&k).await.unwrap().unwrap();
                    assert!(data == a || data == b, "read {} bytes of a mixed or truncated entry", data.len());
                }
            }));
        }

        writer.await.unwrap();
        for reader in readers {
            reader.await.unwrap();
        }
    }
}
