//! Wallet provider boundary.
//!
//! The adapter never touches keys. It asks a [`WalletProvider`] for account
//! access and receives a [`ContractCaller`] that signs, submits, and reads on
//! behalf of the chosen account.
//!
//! # Architecture
//!
//! ```text
//! EvmWallet (kobe HD / local key / node-managed accounts + alloy provider)
//!   ├── request_accounts() → eth_requestAccounts (or the local address)
//!   └── signer(account)    → EvmCaller
//!                              ├── submit()           → eth_sendTransaction
//!                              ├── wait_for_receipt() → TxReceipt
//!                              └── call()             → eth_call
//! ```

mod error;
mod evm;
mod provider;

pub use error::{USER_REJECTED_CODE, WalletError};
pub use evm::{EvmCaller, EvmWallet, EvmWalletBuilder};
pub use provider::{ContractCaller, TxReceipt, WalletProvider};
