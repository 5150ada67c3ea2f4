//! The contract adapter exposed to the game.

use std::fmt;
use std::sync::Arc;

use alloy::primitives::utils::parse_ether;
use alloy::primitives::{Address, TxHash, U256};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use super::bound::BoundContract;
use super::output::CallOutput;
use super::result::CreatedGame;
use crate::config::AdapterConfig;
use crate::descriptor::{DescriptorCache, DescriptorSource, InterfaceDescriptor, source_for};
use crate::error::{Error, Result};
use crate::wallet::WalletProvider;

/// Event the contract emits when a game is created.
pub const GAME_CREATED_EVENT: &str = "GameCreated";

/// An established wallet connection.
#[derive(Debug)]
struct Connection {
    account: Address,
    contract: BoundContract,
}

/// Builder for a [`MazeContract`].
#[derive(Default)]
pub struct MazeContractBuilder {
    config: AdapterConfig,
    wallet: Option<Arc<dyn WalletProvider>>,
    source: Option<Arc<dyn DescriptorSource>>,
}

impl fmt::Debug for MazeContractBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MazeContractBuilder")
            .field("config", &self.config)
            .field("wallet", &self.wallet.is_some())
            .field("source", &self.source)
            .finish()
    }
}

impl MazeContractBuilder {
    /// Use `config` (default: [`AdapterConfig::default`]).
    #[must_use]
    pub fn config(mut self, config: AdapterConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `wallet` as the wallet provider.
    ///
    /// Without one, [`MazeContract::connect`] fails with [`Error::NoWallet`].
    #[must_use]
    pub fn wallet(mut self, wallet: Arc<dyn WalletProvider>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    /// Load the descriptor from `source` instead of the configured location.
    #[must_use]
    pub fn descriptor_source(mut self, source: Arc<dyn DescriptorSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Build the adapter. Nothing is fetched or requested yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the descriptor source cannot be created.
    pub fn build(self) -> Result<MazeContract> {
        let source = match self.source {
            Some(source) => source,
            None => source_for(&self.config)?,
        };
        Ok(MazeContract {
            contract_address: self.config.contract_address,
            wallet: self.wallet,
            descriptors: DescriptorCache::new(source),
            connection: RwLock::new(None),
            submissions: Mutex::new(()),
        })
    }
}

/// Client-side adapter for the `MazeGameBounty` contract.
///
/// Connects a wallet, submits the three state-changing operations
/// (`createGame`, `updatePlayerProgress`, `claimReward`) and runs the two
/// view queries (`getGame`, `getPlayerProgress`).
///
/// Every operation returns [`Result`]. Operations other than
/// [`connect`](Self::connect) and [`load_descriptor`](Self::load_descriptor)
/// fail with [`Error::NotConnected`] until a connection is established.
/// Convert a result into an [`OperationResult`](super::OperationResult) to get
/// the `{ success, ... }` envelope.
///
/// # Examples
///
/// ```rust,ignore
/// let wallet = EvmWallet::builder().rpc_url(rpc).private_key(key).build().await?;
/// let maze = MazeContract::builder()
///     .config(AdapterConfig::from_env()?)
///     .wallet(Arc::new(wallet))
///     .build()?;
///
/// let account = maze.connect().await?;
/// let created = maze.create_game(5, "0.1").await?;
/// let envelope = OperationResult::from(maze.claim_reward(game_id, 1).await);
/// ```
pub struct MazeContract {
    contract_address: Address,
    wallet: Option<Arc<dyn WalletProvider>>,
    descriptors: DescriptorCache,
    connection: RwLock<Option<Arc<Connection>>>,
    submissions: Mutex<()>,
}

impl fmt::Debug for MazeContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MazeContract")
            .field("contract_address", &self.contract_address)
            .field("wallet", &self.wallet.is_some())
            .field("descriptors", &self.descriptors)
            .finish_non_exhaustive()
    }
}

impl MazeContract {
    /// Create a builder.
    #[must_use]
    pub fn builder() -> MazeContractBuilder {
        MazeContractBuilder::default()
    }

    /// Address of the contract this adapter talks to.
    #[must_use]
    pub const fn contract_address(&self) -> Address {
        self.contract_address
    }

    /// Load the interface descriptor, or return the one already loaded.
    ///
    /// Hosts may call this at start-up to warm the cache; [`connect`] awaits
    /// it regardless. Concurrent callers share one in-flight load.
    ///
    /// [`connect`]: Self::connect
    ///
    /// # Errors
    ///
    /// Returns [`Error::DescriptorLoadFailed`] if the load fails.
    pub async fn load_descriptor(&self) -> Result<Arc<InterfaceDescriptor>> {
        self.descriptors.get().await
    }

    /// Whether a wallet connection has been established.
    #[must_use]
    pub async fn is_connected(&self) -> bool {
        self.connection.read().await.is_some()
    }

    /// The connected account, if any.
    #[must_use]
    pub async fn account(&self) -> Option<Address> {
        self.connection.read().await.as_ref().map(|c| c.account)
    }

    /// Request account access and bind the contract to the granted account.
    ///
    /// Calling it again re-requests access and rebinds; the descriptor is not
    /// fetched again.
    ///
    /// # Errors
    ///
    /// - [`Error::NoWallet`] if no wallet provider was configured.
    /// - [`Error::UserRejected`] if access was declined or no account was
    ///   granted.
    /// - [`Error::DescriptorLoadFailed`] if the descriptor cannot be loaded.
    ///
    /// On error the existing connection state is left untouched.
    pub async fn connect(&self) -> Result<Address> {
        let wallet = self.wallet.as_ref().ok_or(Error::NoWallet)?;

        let accounts = wallet.request_accounts().await?;
        let requested = *accounts
            .first()
            .ok_or_else(|| Error::UserRejected("wallet granted no accounts".into()))?;
        let caller = wallet.signer(requested).await?;
        let account = caller.address();

        let descriptor = self.descriptors.get().await?;
        let contract = BoundContract::new(self.contract_address, descriptor, caller);

        *self.connection.write().await = Some(Arc::new(Connection { account, contract }));
        info!(%account, contract = %self.contract_address, "wallet connected");
        Ok(account)
    }

    /// Create a game with `total_rounds` rounds, funding it with `bounty`
    /// (in ether, e.g. `"0.1"`).
    ///
    /// The game identifier is read from the `GameCreated` event; a receipt
    /// without that event still counts as success, with no identifier.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] before [`connect`](Self::connect).
    /// - [`Error::InvalidArgument`] for zero rounds or a malformed bounty.
    /// - [`Error::UserRejected`] / [`Error::RemoteCallFailed`] if the
    ///   transaction is declined, fails, or reverts.
    pub async fn create_game(
        &self,
        total_rounds: u64,
        bounty: impl fmt::Display + Send,
    ) -> Result<CreatedGame> {
        let connection = self.connection().await?;
        if total_rounds == 0 {
            return Err(Error::invalid_argument("total rounds must be positive"));
        }
        let value = parse_bounty(&bounty.to_string())?;

        let contract = &connection.contract;
        let outcome = async {
            let tx_hash = self
                .submit(contract, "createGame", &[total_rounds.to_string()], value)
                .await?;
            let receipt = contract.finalize(tx_hash).await?;
            let game_id = contract
                .event_field(&receipt, GAME_CREATED_EVENT, "gameId")
                .and_then(|value| value.as_uint().map(|(id, _)| id));
            if game_id.is_none() {
                warn!(tx_hash = %tx_hash, "no GameCreated event in receipt");
            }
            Ok(CreatedGame {
                game_id,
                transaction_id: tx_hash,
            })
        }
        .await;

        match &outcome {
            Ok(created) => info!(
                game_id = ?created.game_id,
                tx_hash = %created.transaction_id,
                total_rounds,
                "game created"
            ),
            Err(err) => warn!(error = %err, "createGame failed"),
        }
        outcome
    }

    /// Report `current_round` and `completion_time` for the connected player.
    ///
    /// # Errors
    ///
    /// [`Error::NotConnected`] before [`connect`](Self::connect); otherwise
    /// the transaction's failure.
    pub async fn update_player_progress(
        &self,
        game_id: U256,
        current_round: u64,
        completion_time: u64,
    ) -> Result<()> {
        let args = [
            game_id.to_string(),
            current_round.to_string(),
            completion_time.to_string(),
        ];
        self.execute("updatePlayerProgress", &args).await
    }

    /// Claim the reward for finishing `game_id` in `position`.
    ///
    /// # Errors
    ///
    /// [`Error::NotConnected`] before [`connect`](Self::connect); otherwise
    /// the transaction's failure.
    pub async fn claim_reward(&self, game_id: U256, position: u64) -> Result<()> {
        self.execute("claimReward", &[game_id.to_string(), position.to_string()])
            .await
    }

    /// Read a game's on-chain record.
    ///
    /// # Errors
    ///
    /// [`Error::NotConnected`] before [`connect`](Self::connect); otherwise
    /// the call's failure.
    pub async fn get_game(&self, game_id: U256) -> Result<CallOutput> {
        let connection = self.connection().await?;
        connection
            .contract
            .call("getGame", &[game_id.to_string()])
            .await
    }

    /// Read `player`'s progress in `game_id`.
    ///
    /// # Errors
    ///
    /// [`Error::NotConnected`] before [`connect`](Self::connect); otherwise
    /// the call's failure.
    pub async fn get_player_progress(&self, game_id: U256, player: Address) -> Result<CallOutput> {
        let connection = self.connection().await?;
        connection
            .contract
            .call(
                "getPlayerProgress",
                &[game_id.to_string(), player.to_string()],
            )
            .await
    }

    async fn connection(&self) -> Result<Arc<Connection>> {
        self.connection
            .read()
            .await
            .as_ref()
            .map(Arc::clone)
            .ok_or(Error::NotConnected)
    }

    /// Submit a value-less call of `function` and wait for it.
    async fn execute(&self, function: &str, args: &[String]) -> Result<()> {
        let connection = self.connection().await?;
        let contract = &connection.contract;
        let outcome = async {
            let tx_hash = self.submit(contract, function, args, U256::ZERO).await?;
            contract.finalize(tx_hash).await?;
            info!(function, tx_hash = %tx_hash, "transaction confirmed");
            Ok(())
        }
        .await;

        if let Err(err) = &outcome {
            warn!(function, error = %err, "transaction failed");
        }
        outcome
    }

    /// Submissions from one adapter go out one at a time so the wallet
    /// assigns nonces in order.
    async fn submit(
        &self,
        contract: &BoundContract,
        function: &str,
        args: &[String],
        value: U256,
    ) -> Result<TxHash> {
        let tx = contract.transaction(function, args, value)?;
        let _guard = self.submissions.lock().await;
        let tx_hash = contract.submit(tx).await?;
        info!(function, tx_hash = %tx_hash, %value, "transaction submitted");
        Ok(tx_hash)
    }
}

/// Decimal places of one ether.
const ETHER_DECIMALS: usize = 18;

/// Convert a human-readable ether amount into wei.
///
/// Amounts finer than one wei are rejected rather than truncated.
fn parse_bounty(amount: &str) -> Result<U256> {
    let trimmed = amount.trim();
    if trimmed.starts_with('-') {
        return Err(Error::invalid_argument(format!(
            "bounty amount {amount:?} is negative"
        )));
    }
    if trimmed
        .split_once('.')
        .is_some_and(|(_, fraction)| fraction.len() > ETHER_DECIMALS)
    {
        return Err(Error::invalid_argument(format!(
            "bounty amount {amount:?} has more than {ETHER_DECIMALS} decimal places"
        )));
    }
    parse_ether(trimmed)
        .map_err(|e| Error::invalid_argument(format!("invalid bounty amount {amount:?}: {e}")))
}
