//! Wallet error types.

use alloy::transports::{RpcError, TransportErrorKind};

/// EIP-1193 error code for a request the user declined.
pub const USER_REJECTED_CODE: i64 = 4001;

/// Errors raised by wallet providers and contract callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum WalletError {
    /// Invalid wallet configuration.
    #[error("wallet configuration error: {0}")]
    Config(String),

    /// Key derivation from a mnemonic or private key failed.
    #[error("key derivation error: {0}")]
    Derivation(String),

    /// The RPC provider failed or returned an error.
    #[error("provider error: {0}")]
    Provider(String),

    /// The user (or the wallet on their behalf) declined the request.
    #[error("{0}")]
    Rejected(String),

    /// Submitting or awaiting a transaction failed.
    #[error("transaction error: {0}")]
    Transaction(String),
}

impl WalletError {
    /// Classify a JSON-RPC error, treating EIP-1193 code 4001 as a rejection.
    #[must_use]
    pub fn from_rpc(err: &RpcError<TransportErrorKind>, context: &str) -> Self {
        if let Some(payload) = err.as_error_resp() {
            if payload.code == USER_REJECTED_CODE {
                return Self::Rejected(payload.message.to_string());
            }
        }
        Self::Provider(format!("{context}: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::rpc::json_rpc::ErrorPayload;

    fn error_resp(code: i64, message: &'static str) -> RpcError<TransportErrorKind> {
        RpcError::ErrorResp(ErrorPayload {
            code,
            message: message.into(),
            data: None,
        })
    }

    #[test]
    fn test_user_rejection_is_classified() {
        let err = WalletError::from_rpc(
            &error_resp(USER_REJECTED_CODE, "User rejected the request."),
            "eth_requestAccounts",
        );
        assert_eq!(err, WalletError::Rejected("User rejected the request.".into()));
    }

    #[test]
    fn test_other_codes_are_provider_errors() {
        let err = WalletError::from_rpc(
            &error_resp(-32000, "insufficient funds for gas * price + value"),
            "send failed",
        );
        match err {
            WalletError::Provider(msg) => {
                assert!(msg.starts_with("send failed: "));
                assert!(msg.contains("insufficient funds"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
