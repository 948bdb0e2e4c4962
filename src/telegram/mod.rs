//! Telegram Bot API transport.
//!
//! Thin typed client over the HTTP Bot API: `getUpdates` long polling in,
//! `sendMessage` out. The coordinator never sees any of this; it consumes
//! [`Inbound`](crate::coordinator::Inbound) values and returns
//! [`Reply`](crate::coordinator::Reply) values, and the transport maps
//! both at the process edge. Also implements the coordinator's
//! [`Notifier`](crate::coordinator::Notifier) seam for admin messages.

pub mod api;
pub mod error;
pub mod types;

pub use api::{TelegramApi, next_offset};
pub use error::TransportError;
pub use types::{TgChat, TgMessage, TgUser, Update};
