//! Conversation FSM State Definitions

use std::fmt;

/// Per-user conversation states.
///
/// Held in memory only: a restart silently returns every user to `Idle`.
/// Every entry into a non-idle state has exactly one exit back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConversationState {
    /// No flow in progress; the next message is a command or noise.
    #[default]
    Idle,

    /// "Add wallet" accepted; the next message is a seed phrase.
    AwaitingSeedPhrase,

    /// "Check balance" accepted; the next message is an ETH address.
    AwaitingAddress,

    /// "Remove wallet" accepted; the next message is a 1-based wallet number.
    AwaitingRemovePosition,
}

impl ConversationState {
    #[inline]
    pub fn is_idle(&self) -> bool {
        matches!(self, ConversationState::Idle)
    }

    /// Get human-readable state name
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationState::Idle => "IDLE",
            ConversationState::AwaitingSeedPhrase => "AWAITING_SEED_PHRASE",
            ConversationState::AwaitingAddress => "AWAITING_ADDRESS",
            ConversationState::AwaitingRemovePosition => "AWAITING_REMOVE_POSITION",
        }
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
