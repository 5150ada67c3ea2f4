//! EVM-compatible wallet implementation.
//!
//! Provides [`EvmWallet`], a [`WalletProvider`] backed by an [`alloy`]
//! JSON-RPC provider. Keys are either held locally (derived with [`kobe`]
//! from a mnemonic, or given as a raw private key) or managed by the node the
//! wallet talks to, in which case account access goes through
//! `eth_requestAccounts` exactly as a browser wallet would.

use std::sync::Arc;

use alloy::network::{Ethereum, ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::Signer;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use tracing::{debug, info};

use super::error::WalletError;
use super::provider::{ContractCaller, TxReceipt, WalletProvider};

/// Builder for constructing an [`EvmWallet`].
///
/// Created by [`EvmWallet::builder`]. Use method chaining to configure
/// the wallet, then call [`build`](Self::build).
///
/// # Examples
///
/// ```rust,ignore
/// // From HD mnemonic
/// let wallet = EvmWallet::builder()
///     .mnemonic("abandon abandon ...")
///     .index(0)
///     .rpc_url("https://sepolia.base.org")
///     .build()
///     .await?;
///
/// // Accounts managed by the node (e.g. a local dev node)
/// let wallet = EvmWallet::builder()
///     .rpc_url("http://127.0.0.1:8545")
///     .build()
///     .await?;
/// ```
#[derive(Debug, Default)]
pub struct EvmWalletBuilder {
    /// BIP39 mnemonic phrase.
    mnemonic: Option<String>,
    /// BIP39 passphrase (optional "25th word").
    passphrase: Option<String>,
    /// HD derivation index (default 0).
    index: u32,
    /// Raw private key hex string.
    private_key: Option<String>,
    /// JSON-RPC endpoint URL.
    rpc_url: Option<String>,
    /// Chain ID (auto-detected if not set).
    chain_id: Option<u64>,
}

impl EvmWalletBuilder {
    /// Set the BIP39 mnemonic phrase for HD key derivation.
    #[must_use]
    pub fn mnemonic(mut self, mnemonic: impl Into<String>) -> Self {
        self.mnemonic = Some(mnemonic.into());
        self
    }

    /// Set the BIP39 passphrase (optional "25th word").
    #[must_use]
    pub fn passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(passphrase.into());
        self
    }

    /// Set the HD derivation index (default 0).
    #[must_use]
    pub const fn index(mut self, index: u32) -> Self {
        self.index = index;
        self
    }

    /// Set the private key directly (hex string, with or without 0x prefix).
    #[must_use]
    pub fn private_key(mut self, key: impl Into<String>) -> Self {
        self.private_key = Some(key.into());
        self
    }

    /// Set the JSON-RPC endpoint URL.
    #[must_use]
    pub fn rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    /// Set the chain ID explicitly (auto-detected from RPC if not set).
    #[must_use]
    pub const fn chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    /// Build the [`EvmWallet`].
    ///
    /// `rpc_url` is required. Without a `mnemonic` or `private_key` the
    /// wallet relies on accounts managed by the node.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::Config`] or [`WalletError::Derivation`] for bad
    /// key material, and [`WalletError::Provider`] if the endpoint cannot be
    /// reached.
    pub async fn build(mut self) -> Result<EvmWallet, WalletError> {
        let rpc_url = self
            .rpc_url
            .take()
            .ok_or_else(|| WalletError::Config("rpc_url is required".into()))?;

        let mut signer = if let Some(ref mnemonic) = self.mnemonic {
            Some(self.signer_from_mnemonic(mnemonic)?)
        } else if let Some(ref key) = self.private_key {
            Some(Self::signer_from_private_key(key)?)
        } else {
            None
        };

        if let (Some(signer), Some(chain_id)) = (signer.as_mut(), self.chain_id) {
            signer.set_chain_id(Some(chain_id));
        }

        let provider: DynProvider<Ethereum> = match signer.clone() {
            Some(signer) => ProviderBuilder::new()
                .wallet(signer)
                .connect(&rpc_url)
                .await
                .map_err(|e| {
                    WalletError::Provider(format!("failed to connect to '{rpc_url}': {e}"))
                })?
                .erased(),
            None => ProviderBuilder::new()
                .connect(&rpc_url)
                .await
                .map_err(|e| {
                    WalletError::Provider(format!("failed to connect to '{rpc_url}': {e}"))
                })?
                .erased(),
        };

        let chain_id = if let Some(id) = self.chain_id {
            id
        } else {
            provider
                .get_chain_id()
                .await
                .map_err(|e| WalletError::Provider(format!("failed to get chain ID: {e}")))?
        };

        info!(
            address = ?signer.as_ref().map(|s| s.address()),
            chain_id,
            node_managed = signer.is_none(),
            "EVM wallet initialized",
        );

        Ok(EvmWallet {
            signer,
            provider,
            chain_id,
        })
    }

    /// Derive a signer from a BIP39 mnemonic using kobe.
    fn signer_from_mnemonic(&self, mnemonic: &str) -> Result<PrivateKeySigner, WalletError> {
        let wallet = kobe::Wallet::from_mnemonic(mnemonic, self.passphrase.as_deref())
            .map_err(|e| WalletError::Derivation(format!("invalid mnemonic: {e}")))?;

        let deriver = kobe_eth::Deriver::new(&wallet);
        let derived = deriver
            .derive(self.index)
            .map_err(|e| WalletError::Derivation(format!("key derivation failed: {e}")))?;

        let key_hex = &*derived.private_key_hex;
        key_hex
            .parse::<PrivateKeySigner>()
            .map_err(|e| WalletError::Derivation(format!("signer creation failed: {e}")))
    }

    /// Create a signer from a raw private key hex string.
    fn signer_from_private_key(key: &str) -> Result<PrivateKeySigner, WalletError> {
        let key = key.strip_prefix("0x").unwrap_or(key);
        key.parse::<PrivateKeySigner>()
            .map_err(|e| WalletError::Config(format!("invalid private key: {e}")))
    }
}

/// A wallet talking to an EVM chain over JSON-RPC.
///
/// # Construction
///
/// Use [`EvmWallet::builder`] with method chaining:
///
/// ```rust,ignore
/// let wallet = EvmWallet::builder()
///     .private_key("0xac09...")
///     .rpc_url("http://127.0.0.1:8545")
///     .build()
///     .await?;
/// ```
pub struct EvmWallet {
    /// Local signer, absent when the node manages the accounts.
    signer: Option<PrivateKeySigner>,
    /// Type-erased provider for RPC calls.
    provider: DynProvider<Ethereum>,
    /// The chain ID this wallet is connected to.
    chain_id: u64,
}

impl std::fmt::Debug for EvmWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmWallet")
            .field("address", &self.signer.as_ref().map(|s| s.address()))
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

impl EvmWallet {
    /// Create a builder for constructing an [`EvmWallet`].
    #[must_use]
    pub fn builder() -> EvmWalletBuilder {
        EvmWalletBuilder::default()
    }

    /// The locally held address, if keys are held locally.
    #[must_use]
    pub fn local_address(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }

    /// Get the chain ID.
    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Get a reference to the underlying provider.
    #[must_use]
    pub const fn provider(&self) -> &DynProvider<Ethereum> {
        &self.provider
    }
}

#[async_trait]
impl WalletProvider for EvmWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        if let Some(address) = self.local_address() {
            return Ok(vec![address]);
        }

        let accounts: Vec<Address> = self
            .provider
            .raw_request("eth_requestAccounts".into(), ())
            .await
            .map_err(|e| WalletError::from_rpc(&e, "eth_requestAccounts failed"))?;
        debug!(count = accounts.len(), "accounts granted by node");
        Ok(accounts)
    }

    async fn signer(&self, account: Address) -> Result<Arc<dyn ContractCaller>, WalletError> {
        if let Some(local) = self.local_address() {
            if local != account {
                return Err(WalletError::Config(format!(
                    "account {account} is not held by this wallet"
                )));
            }
        }
        Ok(Arc::new(EvmCaller {
            provider: self.provider.clone(),
            account,
        }))
    }
}

/// [`ContractCaller`] for one account of an [`EvmWallet`].
#[derive(Clone)]
pub struct EvmCaller {
    provider: DynProvider<Ethereum>,
    account: Address,
}

impl std::fmt::Debug for EvmCaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmCaller")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ContractCaller for EvmCaller {
    fn address(&self) -> Address {
        self.account
    }

    async fn submit(&self, tx: TransactionRequest) -> Result<TxHash, WalletError> {
        let pending = self
            .provider
            .send_transaction(tx.with_from(self.account))
            .await
            .map_err(|e| WalletError::from_rpc(&e, "send failed"))?;
        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, WalletError> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), tx_hash)
            .get_receipt()
            .await
            .map_err(|e| WalletError::Transaction(format!("receipt failed: {e}")))?;

        Ok(TxReceipt {
            transaction_hash: ReceiptResponse::transaction_hash(&receipt),
            status: ReceiptResponse::status(&receipt),
            block_number: ReceiptResponse::block_number(&receipt),
            logs: receipt
                .inner
                .logs()
                .iter()
                .map(|log| log.inner.clone())
                .collect(),
        })
    }

    async fn call(&self, tx: TransactionRequest) -> Result<Bytes, WalletError> {
        self.provider
            .call(tx.with_from(self.account))
            .await
            .map_err(|e| WalletError::from_rpc(&e, "call failed"))
    }
}
