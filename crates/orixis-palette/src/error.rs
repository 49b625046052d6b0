//! Error types for palette configuration, command actions and persistence.

/// Problems reported synchronously to the caller when creating or
/// reconfiguring a palette.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaletteError {
    /// A palette was created without any commands and `allow_empty` is off.
    #[error("no commands supplied to palette")]
    NoCommands,
    /// A command id is already registered and the duplicate policy is `Reject`.
    #[error("duplicate command id `{0}`")]
    DuplicateId(String),
    /// A configuration value is out of range.
    #[error("invalid palette configuration: {0}")]
    InvalidConfig(String),
}

/// Failure of a command action. Cloneable so it can travel inside messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// The action reported a failure.
    #[error("{0}")]
    Failed(String),
    /// The action panicked; the payload message when one was available.
    #[error("action panicked: {0}")]
    Panicked(String),
    /// The palette closed with `PendingPolicy::Cancel` before the action settled.
    #[error("action cancelled")]
    Cancelled,
}

impl ActionError {
    /// Shorthand for [`ActionError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        ActionError::Failed(message.into())
    }
}

/// Key-value store I/O failures. These are logged and swallowed by
/// [`UsageStore`](crate::usage::UsageStore); they never reach palette callers.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A stored payload was not valid JSON of the expected shape.
    #[error("store payload error: {0}")]
    Json(#[from] serde_json::Error),
}
