//! Wallet-record store: `owner|secret` lines, positions derived from rank.
//!
//! Append is the hot path and only ever adds one line. Deletion is a full
//! read-modify-write: the surviving lines are written to a temp file which
//! is fsynced and atomically renamed over the store, so readers observe
//! either the pre- or post-delete state and never a partial file.

use super::UserId;
use super::error::StoreError;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// One stored wallet secret.
///
/// `position` is the zero-based rank of the record among its owner's
/// records in insertion order. It is not a stable identifier: deleting a
/// record renumbers every later record for that owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletRecord {
    pub owner: UserId,
    pub secret: String,
    pub position: usize,
}

/// Line-oriented wallet file with a single writer lock.
pub struct WalletStore {
    path: PathBuf,
    /// Serializes every operation on the file. Delete is read-modify-write
    /// and add derives its position from the current count, so both must
    /// exclude each other.
    lock: Mutex<()>,
}

impl WalletStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Append a record for `owner`. The new record's position equals the
    /// count of records the owner had before the call.
    ///
    /// The secret is stored verbatim apart from the non-empty check; phrase
    /// validation belongs to the caller.
    pub async fn add(&self, owner: UserId, secret: &str) -> Result<WalletRecord, StoreError> {
        if secret.trim().is_empty() {
            return Err(StoreError::EmptySecret);
        }

        let _guard = self.lock.lock().await;

        let position = self
            .read_lines()?
            .iter()
            .filter(|(id, _)| *id == owner)
            .count();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}|{}", owner, secret)?;
        file.sync_all()?;

        info!(owner = owner, position = position, "Wallet record appended");
        Ok(WalletRecord {
            owner,
            secret: secret.to_string(),
            position,
        })
    }

    /// All records for `owner` in insertion order, positions equal to rank.
    pub async fn list(&self, owner: UserId) -> Result<Vec<WalletRecord>, StoreError> {
        let _guard = self.lock.lock().await;

        Ok(self
            .read_lines()?
            .into_iter()
            .filter(|(id, _)| *id == owner)
            .enumerate()
            .map(|(position, (_, secret))| WalletRecord {
                owner,
                secret,
                position,
            })
            .collect())
    }

    /// Remove the record at `position` for `owner`.
    ///
    /// Returns `false` (store untouched) when `position` is outside
    /// `[0, count)`. Otherwise rewrites the file without that line via a
    /// temp-file swap and returns `true`.
    pub async fn delete(&self, owner: UserId, position: usize) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;

        let lines = self.read_lines()?;
        let target = lines
            .iter()
            .enumerate()
            .filter(|(_, (id, _))| *id == owner)
            .map(|(file_index, _)| file_index)
            .nth(position);

        let Some(file_index) = target else {
            debug!(owner = owner, position = position, "Delete out of range");
            return Ok(false);
        };

        let tmp_path = self.path.with_extension(format!(
            "tmp-{}",
            chrono::Utc::now().timestamp_millis()
        ));

        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            for (i, (id, secret)) in lines.iter().enumerate() {
                if i != file_index {
                    writeln!(writer, "{}|{}", id, secret)?;
                }
            }
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }

        std::fs::rename(&tmp_path, &self.path)?;

        info!(owner = owner, position = position, "Wallet record removed");
        Ok(true)
    }

    /// Parse the file into `(owner, secret)` pairs, preserving file order.
    /// A missing file is an empty store; malformed lines are skipped.
    fn read_lines(&self) -> Result<Vec<(UserId, String)>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| {
                let (id, secret) = line.split_once('|')?;
                Some((id.trim().parse::<UserId>().ok()?, secret.to_string()))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store(name: &str) -> WalletStore {
        let dir = PathBuf::from(format!("target/test_wallets_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        WalletStore::new(dir.join("wallets.db"))
    }

    fn secrets(records: &[WalletRecord]) -> Vec<&str> {
        records.iter().map(|r| r.secret.as_str()).collect()
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let store = test_store("order");

        for phrase in ["alpha one", "bravo two", "charlie three"] {
            store.add(7, phrase).await.unwrap();
        }

        let records = store.list(7).await.unwrap();
        assert_eq!(
            secrets(&records),
            vec!["alpha one", "bravo two", "charlie three"]
        );
        for (rank, record) in records.iter().enumerate() {
            assert_eq!(record.position, rank);
        }
    }

    #[tokio::test]
    async fn test_owners_are_partitioned() {
        let store = test_store("partition");

        store.add(1, "a a a").await.unwrap();
        store.add(2, "b b b").await.unwrap();
        let record = store.add(1, "c c c").await.unwrap();

        // Second record for owner 1 despite owner 2's interleaved add.
        assert_eq!(record.position, 1);
        assert_eq!(secrets(&store.list(1).await.unwrap()), vec!["a a a", "c c c"]);
        assert_eq!(secrets(&store.list(2).await.unwrap()), vec!["b b b"]);
    }

    #[tokio::test]
    async fn test_delete_shifts_later_positions() {
        let store = test_store("shift");

        for phrase in ["first", "second", "third", "fourth"] {
            store.add(5, phrase).await.unwrap();
        }

        assert!(store.delete(5, 1).await.unwrap());

        let records = store.list(5).await.unwrap();
        assert_eq!(secrets(&records), vec!["first", "third", "fourth"]);
        assert_eq!(records[0].position, 0);
        assert_eq!(records[1].position, 1);
        assert_eq!(records[2].position, 2);
    }

    #[tokio::test]
    async fn test_delete_out_of_range_is_noop() {
        let store = test_store("range");

        store.add(9, "only one").await.unwrap();

        assert!(!store.delete(9, 1).await.unwrap());
        assert!(!store.delete(9, 99).await.unwrap());
        assert!(!store.delete(42, 0).await.unwrap());

        assert_eq!(secrets(&store.list(9).await.unwrap()), vec!["only one"]);
    }

    #[tokio::test]
    async fn test_add_then_delete_last_round_trips() {
        let store = test_store("roundtrip");

        store.add(3, "keep me").await.unwrap();
        let before = store.list(3).await.unwrap();

        let added = store.add(3, "transient").await.unwrap();
        assert!(store.delete(3, added.position).await.unwrap());

        assert_eq!(store.list(3).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_delete_leaves_other_owners_untouched() {
        let store = test_store("others");

        store.add(1, "mine").await.unwrap();
        store.add(2, "theirs").await.unwrap();

        assert!(store.delete(1, 0).await.unwrap());

        assert!(store.list(1).await.unwrap().is_empty());
        assert_eq!(secrets(&store.list(2).await.unwrap()), vec!["theirs"]);
    }

    #[tokio::test]
    async fn test_empty_secret_rejected() {
        let store = test_store("empty");

        assert!(matches!(
            store.add(1, "").await,
            Err(StoreError::EmptySecret)
        ));
        assert!(matches!(
            store.add(1, "   ").await,
            Err(StoreError::EmptySecret)
        ));
        assert!(store.list(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_secret_may_contain_separator() {
        let store = test_store("separator");

        store.add(6, "odd|phrase").await.unwrap();
        assert_eq!(secrets(&store.list(6).await.unwrap()), vec!["odd|phrase"]);
    }
}
