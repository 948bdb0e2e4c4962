//! Known-users store: one user id per line.

use super::UserId;
use super::error::StoreError;
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::debug;

/// Line-oriented set of known user ids.
pub struct UserStore {
    path: PathBuf,
    /// Writer exclusion: `register` is read-then-append.
    lock: Mutex<()>,
}

impl UserStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Add `id` to the set if absent. Returns `true` when the id was newly
    /// persisted, `false` when it was already known (a no-op).
    pub async fn register(&self, id: UserId) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;

        if self.read_ids()?.contains(&id) {
            return Ok(false);
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", id)?;
        file.sync_all()?;

        debug!(user_id = id, "Registered new user");
        Ok(true)
    }

    /// Whether `id` has been registered.
    pub async fn contains(&self, id: UserId) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_ids()?.contains(&id))
    }

    /// Number of known users.
    pub async fn count(&self) -> Result<usize, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_ids()?.len())
    }

    /// Load the full id set. A missing file is an empty set.
    fn read_ids(&self) -> Result<HashSet<UserId>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(content
            .lines()
            .filter_map(|line| line.trim().parse::<UserId>().ok())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store(name: &str) -> UserStore {
        let dir = PathBuf::from(format!("target/test_users_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        UserStore::new(dir.join("users.db"))
    }

    #[tokio::test]
    async fn test_register_is_idempotent() {
        let store = test_store("idempotent");

        assert!(store.register(1001).await.unwrap());
        assert!(!store.register(1001).await.unwrap());
        assert!(!store.register(1001).await.unwrap());

        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.contains(1001).await.unwrap());
    }

    #[tokio::test]
    async fn test_register_multiple_users() {
        let store = test_store("multiple");

        for id in [1, 2, 3] {
            assert!(store.register(id).await.unwrap());
        }

        assert_eq!(store.count().await.unwrap(), 3);
        assert!(store.contains(2).await.unwrap());
        assert!(!store.contains(4).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_set() {
        let store = test_store("missing");

        assert_eq!(store.count().await.unwrap(), 0);
        assert!(!store.contains(1).await.unwrap());
    }
}
