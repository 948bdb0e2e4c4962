use thiserror::Error;

/// Transport error types. None of these are process-fatal: the polling
/// loop logs and keeps going.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Telegram API rejected the call: {0}")]
    Api(String),
}
