//! Record Store
//!
//! Durable storage for the two entity kinds the bot owns:
//!
//! - **Known users** (`users.db`): one user id per line, no duplicates.
//! - **Wallet records** (`wallets.db`): one `owner|secret` line per record,
//!   in append order. A record's position is its rank among its owner's
//!   lines, derived on read, never stored.
//!
//! # Concurrency
//!
//! Each file is guarded by its own writer mutex: every operation that
//! reads-then-writes holds the lock for its full duration, so mutations of
//! one file are totally ordered across all users. Deletion rewrites the
//! wallet file through a temp-file-then-rename swap, so a crash mid-write
//! never leaves a truncated store behind.
//!
//! # Durability
//!
//! Every successful mutating call fsyncs before returning.

pub mod error;
pub mod users;
pub mod wallets;

pub use error::StoreError;
pub use users::UserStore;
pub use wallets::{WalletRecord, WalletStore};

use std::path::Path;

/// Telegram-issued numeric user id. Primary key for both entity files.
pub type UserId = u64;

/// Facade over the two entity stores.
///
/// Constructed once at startup and shared via `Arc`; there is no
/// module-level default instance.
pub struct RecordStore {
    users: UserStore,
    wallets: WalletStore,
}

impl RecordStore {
    /// Open (creating if needed) the data directory and both entity files.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;

        Ok(Self {
            users: UserStore::new(data_dir.join("users.db")),
            wallets: WalletStore::new(data_dir.join("wallets.db")),
        })
    }

    /// Persist a user id if absent. Idempotent; returns whether the id was
    /// newly added.
    pub async fn register_user(&self, id: UserId) -> Result<bool, StoreError> {
        self.users.register(id).await
    }

    /// Number of known users.
    pub async fn user_count(&self) -> Result<usize, StoreError> {
        self.users.count().await
    }

    /// All wallet records for `owner`, in insertion order. Empty (not an
    /// error) when none exist or the file has never been written.
    pub async fn list_wallets(&self, owner: UserId) -> Result<Vec<WalletRecord>, StoreError> {
        self.wallets.list(owner).await
    }

    /// Append a record for `owner`; its position is the current per-owner
    /// record count. The secret must be non-empty, nothing else is
    /// validated here.
    pub async fn add_wallet(&self, owner: UserId, secret: &str) -> Result<WalletRecord, StoreError> {
        self.wallets.add(owner, secret).await
    }

    /// Remove the record at `position` for `owner`, compacting later
    /// positions down by one. Returns `false` when `position` is out of
    /// range, leaving the store untouched.
    pub async fn delete_wallet(&self, owner: UserId, position: usize) -> Result<bool, StoreError> {
        self.wallets.delete(owner, position).await
    }
}
