//! Typed Bot API client: long polling and message sending.

use super::error::TransportError;
use super::types::{ApiResponse, Update};
use crate::coordinator::{Keyboard, Notifier, NotifyError, Reply};
use crate::coordinator::types::{
    BTN_ADD_WALLET, BTN_CHECK_BALANCE, BTN_MY_WALLETS, BTN_REMOVE_WALLET,
};
use crate::store::UserId;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

/// Telegram Bot API client.
///
/// One instance per process; shared via `Arc` between the polling loop
/// and the coordinator's notifier seam.
pub struct TelegramApi {
    client: reqwest::Client,
    base: String,
    /// Long-poll duration passed to `getUpdates`.
    poll_timeout: Duration,
}

impl TelegramApi {
    /// Create a client for `token`. The HTTP timeout is the poll timeout
    /// plus headroom so a quiet long poll is not reported as an error.
    pub fn new(token: &str, poll_timeout: Duration) -> Result<Self, TransportError> {
        info!("Initializing Telegram Bot API client");

        let client = reqwest::Client::builder()
            .timeout(poll_timeout + Duration::from_secs(10))
            .build()
            .map_err(|e| TransportError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base: format!("https://api.telegram.org/bot{}", token),
            poll_timeout,
        })
    }

    /// Call one Bot API method and unwrap the `ok`/`result` envelope.
    async fn call<R>(&self, method: &str, body: serde_json::Value) -> Result<R, TransportError>
    where
        R: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(format!("{}/{}", self.base, method))
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Http(format!("{} failed: {}", method, e)))?;

        let api_response: ApiResponse<R> = response
            .json()
            .await
            .map_err(|e| TransportError::Http(format!("Failed to parse {} response: {}", method, e)))?;

        if !api_response.ok {
            return Err(TransportError::Api(
                api_response
                    .description
                    .unwrap_or_else(|| format!("{} returned ok=false", method)),
            ));
        }

        api_response
            .result
            .ok_or_else(|| TransportError::Api(format!("No result in {} response", method)))
    }

    /// Long-poll for the next batch of updates after `offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TransportError> {
        let updates: Vec<Update> = self
            .call(
                "getUpdates",
                json!({
                    "offset": offset,
                    "timeout": self.poll_timeout.as_secs(),
                    "allowed_updates": ["message"],
                }),
            )
            .await?;

        if !updates.is_empty() {
            debug!(count = updates.len(), "Received updates");
        }
        Ok(updates)
    }

    /// Confirm and discard everything queued before startup, returning
    /// the offset to poll from. Replaying a stale backlog would feed old
    /// flow input into fresh sessions.
    pub async fn skip_pending(&self) -> Result<i64, TransportError> {
        let updates: Vec<Update> = self
            .call(
                "getUpdates",
                json!({
                    "offset": -1,
                    "timeout": 0,
                    "allowed_updates": ["message"],
                }),
            )
            .await?;

        if !updates.is_empty() {
            info!(count = updates.len(), "Skipping pending updates");
        }
        Ok(next_offset(&updates))
    }

    /// Send a bare text message, leaving the recipient's keyboard alone.
    pub async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        let _: serde_json::Value = self
            .call(
                "sendMessage",
                json!({
                    "chat_id": chat_id,
                    "text": text,
                }),
            )
            .await?;
        Ok(())
    }

    /// Deliver the coordinator's reply to `chat_id`, rendering its
    /// keyboard descriptor.
    pub async fn send_reply(&self, chat_id: i64, reply: &Reply) -> Result<(), TransportError> {
        let _: serde_json::Value = self
            .call(
                "sendMessage",
                json!({
                    "chat_id": chat_id,
                    "text": reply.text,
                    "reply_markup": markup(reply.keyboard),
                }),
            )
            .await?;
        Ok(())
    }
}

/// Offset that acknowledges every update in `updates`; 0 when the batch
/// is empty.
pub fn next_offset(updates: &[Update]) -> i64 {
    updates
        .iter()
        .map(|u| u.update_id + 1)
        .max()
        .unwrap_or(0)
}

/// Render a keyboard descriptor as Bot API reply markup.
///
/// `RemoveMenu` clears the custom keyboard too: the user answers with a
/// typed number, and the menu returns with the flow's final reply.
fn markup(keyboard: Keyboard) -> serde_json::Value {
    match keyboard {
        Keyboard::MainMenu => json!({
            "keyboard": [
                [{"text": BTN_MY_WALLETS}, {"text": BTN_ADD_WALLET}],
                [{"text": BTN_REMOVE_WALLET}, {"text": BTN_CHECK_BALANCE}],
            ],
            "resize_keyboard": true,
        }),
        Keyboard::None | Keyboard::RemoveMenu => json!({"remove_keyboard": true}),
    }
}

#[async_trait]
impl Notifier for TelegramApi {
    async fn notify(&self, user: UserId, text: &str) -> Result<(), NotifyError> {
        self.send_text(user as i64, text)
            .await
            .map_err(|e| NotifyError(e.to_string()))
    }
}
