//! Unified error types for the maze-bounty adapter.
//!
//! Every public operation of [`MazeContract`](crate::contract::MazeContract)
//! returns [`Result`]. Hosts that prefer a `{ success, message }` payload
//! convert the result into an
//! [`OperationResult`](crate::contract::OperationResult) instead.

use crate::wallet::WalletError;

/// Result type alias for adapter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An operation was attempted before [`connect`] succeeded.
    ///
    /// [`connect`]: crate::contract::MazeContract::connect
    #[error("wallet not connected")]
    NotConnected,

    /// No wallet provider is available to the adapter.
    #[error("no wallet provider available")]
    NoWallet,

    /// The user declined an account or transaction request.
    #[error("request rejected by user: {0}")]
    UserRejected(String),

    /// The remote call failed, was rejected by the node, or reverted.
    #[error("remote call failed: {0}")]
    RemoteCallFailed(String),

    /// The interface descriptor could not be fetched or parsed.
    #[error("failed to load contract interface: {0}")]
    DescriptorLoadFailed(String),

    /// The descriptor does not describe the requested item, or the
    /// arguments and results do not match it.
    #[error("ABI error: {0}")]
    Abi(String),

    /// An argument was rejected before any remote call was made.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid adapter or wallet configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a remote call error with a message.
    #[must_use]
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::RemoteCallFailed(msg.into())
    }

    /// Create a descriptor load error with a message.
    #[must_use]
    pub fn descriptor(msg: impl Into<String>) -> Self {
        Self::DescriptorLoadFailed(msg.into())
    }

    /// Create an ABI error with a message.
    #[must_use]
    pub fn abi(msg: impl Into<String>) -> Self {
        Self::Abi(msg.into())
    }

    /// Create an invalid argument error with a message.
    #[must_use]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<WalletError> for Error {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::Rejected(msg) => Self::UserRejected(msg),
            WalletError::Config(msg) | WalletError::Derivation(msg) => Self::Config(msg),
            other => Self::RemoteCallFailed(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::descriptor("request timed out")
        } else if err.is_connect() {
            Self::descriptor(format!("connection failed: {err}"))
        } else {
            Self::descriptor(err.to_string())
        }
    }
}
