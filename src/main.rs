//! Seedkeeper - Telegram wallet-keeper bot
//!
//! Entry point. Architecture:
//!
//! ```text
//! ┌──────────┐    ┌────────────┐    ┌─────────────┐    ┌──────────────┐
//! │ Telegram │───▶│ Dispatcher │───▶│ Coordinator │───▶│ Record Store │
//! │ (poll)   │◀───│ (per-user  │    │ (per-user   │    │ (users.db /  │
//! └──────────┘    │  mailbox)  │    │  FSM)       │    │  wallets.db) │
//!                 └────────────┘    └─────────────┘    └──────────────┘
//! ```
//!
//! The dispatcher runs one worker per user, so each user's messages are
//! handled in arrival order while distinct users run concurrently.

use std::sync::Arc;

use tracing::{error, info};

use seedkeeper::chain::EthRpcClient;
use seedkeeper::config::AppConfig;
use seedkeeper::coordinator::{Coordinator, NoopNotifier, Notifier};
use seedkeeper::dispatch::Dispatcher;
use seedkeeper::logging::init_logging;
use seedkeeper::store::RecordStore;
use seedkeeper::telegram::{TelegramApi, next_offset};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "default".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load(&get_env());
    let _guard = init_logging(&config);

    info!(
        "seedkeeper {} ({}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    );

    let token = config.bot_token()?;
    let store = Arc::new(RecordStore::open(&config.store.data_dir)?);
    let lookup = Arc::new(EthRpcClient::new(&config.chain.rpc_url, config.chain_timeout())?);
    let api = Arc::new(TelegramApi::new(&token, config.poll_timeout())?);

    // With no operator configured, new-wallet notifications go nowhere.
    let notifier: Arc<dyn Notifier> = if config.telegram.admin_id == 0 {
        Arc::new(NoopNotifier)
    } else {
        api.clone()
    };
    let coordinator = Arc::new(Coordinator::new(
        store,
        lookup,
        notifier,
        config.telegram.admin_id,
    ));
    let dispatcher = Dispatcher::new(coordinator, api.clone());

    // Whatever queued up while the bot was down is stale flow input;
    // acknowledge it unseen instead of replaying it into fresh sessions.
    let mut offset = match api.skip_pending().await {
        Ok(offset) => offset,
        Err(e) => {
            error!(error = %e, "Could not skip pending updates");
            0
        }
    };

    info!("Polling for updates");

    loop {
        match api.get_updates(offset).await {
            Ok(updates) => {
                offset = offset.max(next_offset(&updates));
                for update in updates {
                    dispatcher.dispatch(update);
                }
            }
            Err(e) => {
                // Transient transport trouble; back off and keep polling.
                error!(error = %e, "getUpdates failed");
                tokio::time::sleep(std::time::Duration::from_secs(3)).await;
            }
        }
    }
}
