//! Conversation Coordinator
//!
//! A per-user finite-state machine driving multi-step input collection.
//!
//! # State Machine
//!
//! ```text
//! IDLE ──"Add wallet"────▶ AWAITING_SEED_PHRASE ──any text──▶ IDLE
//! IDLE ──"Check balance"─▶ AWAITING_ADDRESS ─────any text──▶ IDLE
//! IDLE ──"Remove wallet"─▶ AWAITING_REMOVE_POSITION ─any──▶ IDLE
//! ```
//!
//! # Safety Invariants
//!
//! 1. **Single exit**: every non-idle entry returns to `IDLE` on the next
//!    message, success or failure alike.
//! 2. **Last-message-wins**: a recognized command overrides a stale
//!    pending flow for the same user.
//! 3. **One reply**: exactly one outbound reply per inbound message.
//! 4. **Per-user exclusion**: a user's transitions never interleave; the
//!    session lock guards every caller. Arrival ordering is owned by the
//!    dispatcher, which feeds each user's messages through one FIFO
//!    worker. Distinct users run concurrently.

pub mod coordinator;
pub mod notify;
pub mod state;
pub mod types;

pub use coordinator::Coordinator;
pub use notify::{NoopNotifier, Notifier, NotifyError};
pub use state::ConversationState;
pub use types::{Command, Inbound, Keyboard, Reply};
