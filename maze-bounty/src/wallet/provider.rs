//! The seams between the adapter and the wallet.
//!
//! A [`WalletProvider`] is the capability that holds the user's keys and
//! grants account access. Once access is granted it hands out a
//! [`ContractCaller`] acting for one account, which is everything the adapter
//! needs to submit transactions, wait for them, and run read-only calls.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, Log, TxHash};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;

use super::error::WalletError;

/// The finalized outcome of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    /// Hash of the transaction.
    pub transaction_hash: TxHash,
    /// `true` if execution succeeded, `false` if it reverted.
    pub status: bool,
    /// Block the transaction was included in.
    pub block_number: Option<u64>,
    /// Logs emitted during execution, in emission order.
    pub logs: Vec<Log>,
}

/// A wallet that can grant account access.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Request access to the user's accounts (`eth_requestAccounts`).
    ///
    /// Returns the accounts in the wallet's preferred order.
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// Obtain a caller that signs on behalf of `account`.
    async fn signer(&self, account: Address) -> Result<Arc<dyn ContractCaller>, WalletError>;
}

/// Submits transactions and read calls on behalf of a single account.
#[async_trait]
pub trait ContractCaller: Send + Sync {
    /// The account this caller acts for.
    fn address(&self) -> Address;

    /// Sign and broadcast a transaction, returning its hash.
    async fn submit(&self, tx: TransactionRequest) -> Result<TxHash, WalletError>;

    /// Wait until the transaction is included and return its receipt.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, WalletError>;

    /// Execute a read-only call against the latest state.
    async fn call(&self, tx: TransactionRequest) -> Result<Bytes, WalletError>;
}
