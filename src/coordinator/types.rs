//! Coordinator request/response types.

use crate::store::UserId;

/// Main-menu button labels. These double as the command vocabulary: a
/// message matching a label is a command even while a flow is pending
/// (last-message-wins).
pub const BTN_MY_WALLETS: &str = "My wallets";
pub const BTN_ADD_WALLET: &str = "Add wallet";
pub const BTN_REMOVE_WALLET: &str = "Remove wallet";
pub const BTN_CHECK_BALANCE: &str = "Check balance";

/// One inbound message as delivered by the transport.
#[derive(Debug, Clone)]
pub struct Inbound {
    pub user: UserId,
    pub text: String,
}

/// Commands recognized while idle (and overriding any pending flow).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    MyWallets,
    AddWallet,
    RemoveWallet,
    CheckBalance,
}

impl Command {
    /// Parse a message into a command. Anything else is flow input or
    /// noise, depending on the user's state.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "/start" => Some(Command::Start),
            "/help" => Some(Command::Help),
            BTN_MY_WALLETS => Some(Command::MyWallets),
            BTN_ADD_WALLET => Some(Command::AddWallet),
            BTN_REMOVE_WALLET => Some(Command::RemoveWallet),
            BTN_CHECK_BALANCE => Some(Command::CheckBalance),
            _ => None,
        }
    }
}

/// Opaque keyboard descriptor attached to a reply. The transport decides
/// how to render it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Keyboard {
    /// Remove any custom keyboard.
    #[default]
    None,
    /// The four main-menu buttons.
    MainMenu,
    /// Shown while picking a wallet number to remove.
    RemoveMenu,
}

/// The single reply emitted for an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Keyboard,
}

impl Reply {
    /// Reply with no keyboard change beyond removal.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: Keyboard::None,
        }
    }

    /// Reply restoring the main menu.
    pub fn menu(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: Keyboard::MainMenu,
        }
    }
}
