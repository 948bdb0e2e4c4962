//! Bot API wire types (the subset this bot consumes).

use serde::Deserialize;

/// Envelope every Bot API response arrives in.
#[derive(Deserialize, Debug)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

/// One long-poll update.
#[derive(Deserialize, Debug, Clone)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<TgMessage>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TgMessage {
    pub message_id: i64,
    pub from: Option<TgUser>,
    pub chat: TgChat,
    pub text: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TgUser {
    pub id: u64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TgChat {
    pub id: i64,
}
