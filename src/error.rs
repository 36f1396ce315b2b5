// MIT License - Copyright (c) 2026 The dmp-bridge developers
// Error types

/// All errors that can occur in the dmp-bridge library.
#[derive(Debug, thiserror::Error)]
pub enum DmpError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection timeout")]
    ConnectionTimeout,

    #[error("Command timeout: {command}")]
    CommandTimeout { command: String },

    #[error("Invalid response: {details}")]
    InvalidResponse { details: String },

    #[error("Unknown account number: {account}")]
    UnknownAccount { account: String },

    #[error("Panel already registered: {account}")]
    DuplicateAccount { account: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl DmpError {
    /// Whether this error is transient and the command may be retried by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DmpError::Io(_) | DmpError::ConnectionTimeout | DmpError::CommandTimeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DmpError>;
