use thiserror::Error;

/// Failure of a single storage tier. Never escapes `TieredStorage`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    #[error("{0} storage is not available")]
    Unavailable(String),

    #[error("{area} storage rejected the request: {message}")]
    Rejected { area: String, message: String },

    #[error("{0} storage returned a non-object result")]
    Malformed(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChannelError {
    /// The message could not be handed to the runtime at all
    #[error("failed to dispatch message: {0}")]
    Dispatch(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClipboardError {
    #[error("clipboard is not available")]
    Unavailable,

    #[error("clipboard write rejected: {0}")]
    Rejected(String),
}
