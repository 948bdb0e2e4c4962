//! Seedkeeper - Telegram wallet-keeper bot
//!
//! A seed-phrase vault driven by a conversational interface, with ETH
//! balance lookup against a JSON-RPC node.
//!
//! # Modules
//!
//! - [`store`] - durable record store (known users, wallet records)
//! - [`coordinator`] - per-user conversation state machine
//! - [`dispatch`] - per-user FIFO workers between transport and FSM
//! - [`chain`] - Ethereum balance lookup collaborator
//! - [`telegram`] - Bot API transport and admin notifier
//! - [`config`] - YAML configuration with env overrides
//! - [`logging`] - tracing setup

pub mod chain;
pub mod config;
pub mod coordinator;
pub mod dispatch;
pub mod logging;
pub mod store;
pub mod telegram;

// Convenient re-exports at crate root
pub use chain::{BalanceLookup, EthRpcClient, LookupError};
pub use config::AppConfig;
pub use coordinator::{
    Command, ConversationState, Coordinator, Inbound, Keyboard, NoopNotifier, Notifier,
    NotifyError, Reply,
};
pub use dispatch::{Dispatcher, ReplySink};
pub use store::{RecordStore, StoreError, UserId, WalletRecord};
pub use telegram::{TelegramApi, TransportError};
