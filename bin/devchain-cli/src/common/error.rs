use alloy_primitives::hex::FromHexError;
use devchain::ChainError;

/// Error types for the devchain sub-commands
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error reported by the chain session
    #[error("{0}")]
    Chain(#[from] ChainError),

    /// Failed to read or write a file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid hex string
    #[error("Invalid hex string: {0}")]
    InvalidHex(#[from] FromHexError),

    /// Failed to render output
    #[error("Failed to serialize output: {0}")]
    Output(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for the devchain sub-commands
pub type Result<T> = std::result::Result<T, CliError>;
