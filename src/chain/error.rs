use thiserror::Error;

/// Balance lookup error types.
///
/// A timeout is not distinguished from other transient failures by the
/// caller: every variant resolves to the same retry-later reply.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("RPC connection failed: {0}")]
    RpcConnection(String),

    #[error("Balance lookup timed out")]
    Timeout,

    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),
}
