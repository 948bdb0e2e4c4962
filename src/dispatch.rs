//! Update dispatch: fans inbound updates out to per-user workers.
//!
//! The polling loop hands every update to [`Dispatcher::dispatch`], which
//! routes it into an unbounded mpsc mailbox keyed by user id. One worker
//! task drains each mailbox in FIFO order, so a user's messages reach the
//! coordinator in arrival order even when several land in the same
//! `getUpdates` batch. Distinct users still run concurrently.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::coordinator::{Coordinator, Inbound, Reply};
use crate::store::UserId;
use crate::telegram::{TelegramApi, Update};

/// Where finished replies go. [`TelegramApi`] is the production sink.
#[async_trait]
pub trait ReplySink: Send + Sync + 'static {
    async fn deliver(&self, chat_id: i64, reply: &Reply);
}

#[async_trait]
impl ReplySink for TelegramApi {
    async fn deliver(&self, chat_id: i64, reply: &Reply) {
        if let Err(e) = self.send_reply(chat_id, reply).await {
            error!(chat_id = chat_id, error = %e, "Failed to send reply");
        }
    }
}

/// Routes updates to one long-lived worker task per user.
pub struct Dispatcher<S: ReplySink> {
    coordinator: Arc<Coordinator>,
    sink: Arc<S>,
    mailboxes: DashMap<UserId, mpsc::UnboundedSender<(i64, String)>>,
}

impl<S: ReplySink> Dispatcher<S> {
    pub fn new(coordinator: Arc<Coordinator>, sink: Arc<S>) -> Self {
        Self {
            coordinator,
            sink,
            mailboxes: DashMap::new(),
        }
    }

    /// Route one update to its user's mailbox, starting the worker on
    /// first contact. Updates without a message, sender, or text are
    /// dropped.
    pub fn dispatch(&self, update: Update) {
        let Some(message) = update.message else {
            return;
        };
        let (Some(from), Some(text)) = (message.from, message.text) else {
            return;
        };
        let chat_id = message.chat.id;

        let tx = self
            .mailboxes
            .entry(from.id)
            .or_insert_with(|| self.spawn_worker(from.id))
            .clone();

        // A worker only exits when its sender leaves the map, so this
        // cannot fail in practice.
        if tx.send((chat_id, text)).is_err() {
            error!(user = from.id, "User worker gone, message dropped");
        }
    }

    fn spawn_worker(&self, user: UserId) -> mpsc::UnboundedSender<(i64, String)> {
        let (tx, mut rx) = mpsc::unbounded_channel::<(i64, String)>();
        let coordinator = self.coordinator.clone();
        let sink = self.sink.clone();

        tokio::spawn(async move {
            debug!(user = user, "User worker started");
            while let Some((chat_id, text)) = rx.recv().await {
                let reply = coordinator.handle(Inbound { user, text }).await;
                sink.deliver(chat_id, &reply).await;
            }
        });

        tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{BalanceLookup, LookupError};
    use crate::coordinator::NoopNotifier;
    use crate::store::RecordStore;
    use crate::telegram::{TgChat, TgMessage, TgUser};
    use rust_decimal::Decimal;

    struct NoLookup;

    #[async_trait]
    impl BalanceLookup for NoLookup {
        async fn get_balance(&self, _address: &str) -> Result<Decimal, LookupError> {
            Err(LookupError::Timeout)
        }
    }

    struct DropSink;

    #[async_trait]
    impl ReplySink for DropSink {
        async fn deliver(&self, _chat_id: i64, _reply: &Reply) {}
    }

    fn dispatcher(name: &str) -> Dispatcher<DropSink> {
        let dir = format!("target/test_dispatch_{}_{}", name, std::process::id());
        let _ = std::fs::remove_dir_all(&dir);
        let store = Arc::new(RecordStore::open(&dir).unwrap());
        let coordinator = Arc::new(Coordinator::new(
            store,
            Arc::new(NoLookup),
            Arc::new(NoopNotifier),
            0,
        ));
        Dispatcher::new(coordinator, Arc::new(DropSink))
    }

    fn text_update(update_id: i64, user: u64, text: &str) -> Update {
        Update {
            update_id,
            message: Some(TgMessage {
                message_id: update_id,
                from: Some(TgUser { id: user }),
                chat: TgChat { id: user as i64 },
                text: Some(text.to_string()),
            }),
        }
    }

    #[tokio::test]
    async fn test_updates_without_sender_or_text_are_dropped() {
        let d = dispatcher("drops");

        d.dispatch(Update {
            update_id: 1,
            message: None,
        });
        d.dispatch(Update {
            update_id: 2,
            message: Some(TgMessage {
                message_id: 2,
                from: None,
                chat: TgChat { id: 5 },
                text: Some("hello".to_string()),
            }),
        });
        d.dispatch(Update {
            update_id: 3,
            message: Some(TgMessage {
                message_id: 3,
                from: Some(TgUser { id: 5 }),
                chat: TgChat { id: 5 },
                text: None,
            }),
        });

        assert!(d.mailboxes.is_empty());
    }

    #[tokio::test]
    async fn test_one_worker_per_user() {
        let d = dispatcher("one_worker");

        for i in 0..3 {
            d.dispatch(text_update(i, 7, "/start"));
        }
        d.dispatch(text_update(4, 8, "/start"));

        assert_eq!(d.mailboxes.len(), 2);
    }
}
