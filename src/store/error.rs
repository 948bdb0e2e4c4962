use thiserror::Error;

/// Record store error types.
///
/// IO failures never leave the store partially written: appends fsync
/// before reporting success and the delete rewrite swaps a fully-written
/// temp file into place.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Secret phrase must not be empty")]
    EmptySecret,
}
