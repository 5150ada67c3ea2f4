//! In-memory stand-ins for the wallet and descriptor seams.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, B256, Bytes, Log, TxHash, U256, address, keccak256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;

use crate::config::AdapterConfig;
use crate::contract::MazeContract;
use crate::descriptor::{DescriptorSource, InterfaceDescriptor};
use crate::error::{Error, Result};
use crate::wallet::{ContractCaller, TxReceipt, WalletError, WalletProvider};

pub(crate) use crate::descriptor::BUNDLED_ABI as MAZE_ABI;

pub(crate) const PLAYER: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");

/// Counts fetches; optionally fails the first one.
#[derive(Debug)]
pub(crate) struct CountingSource {
    text: &'static str,
    fail_first: bool,
    fetches: AtomicUsize,
}

impl CountingSource {
    pub(crate) const fn maze() -> Self {
        Self {
            text: MAZE_ABI,
            fail_first: false,
            fetches: AtomicUsize::new(0),
        }
    }

    pub(crate) const fn failing_first(text: &'static str) -> Self {
        Self {
            text,
            fail_first: true,
            fetches: AtomicUsize::new(0),
        }
    }

    pub(crate) fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DescriptorSource for CountingSource {
    async fn fetch(&self) -> Result<InterfaceDescriptor> {
        let attempt = self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if self.fail_first && attempt == 0 {
            return Err(Error::descriptor("HTTP status server error (503)"));
        }
        InterfaceDescriptor::from_json_str(self.text)
    }
}

/// Scripted contract caller.
#[derive(Debug)]
pub(crate) struct FakeCaller {
    account: Address,
    submit_error: Mutex<Option<WalletError>>,
    status: AtomicBool,
    logs: Mutex<Vec<Log>>,
    call_result: Mutex<Option<std::result::Result<Bytes, WalletError>>>,
    submitted: Mutex<Vec<TransactionRequest>>,
    calls: AtomicUsize,
    next_hash: AtomicU8,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeCaller {
    pub(crate) fn new(account: Address) -> Self {
        Self {
            account,
            submit_error: Mutex::new(None),
            status: AtomicBool::new(true),
            logs: Mutex::new(Vec::new()),
            call_result: Mutex::new(None),
            submitted: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            next_hash: AtomicU8::new(1),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub(crate) fn reject_submissions(&self, err: WalletError) {
        *self.submit_error.lock().unwrap() = Some(err);
    }

    pub(crate) fn revert(&self) {
        self.status.store(false, Ordering::SeqCst);
    }

    pub(crate) fn emit(&self, log: Log) {
        self.logs.lock().unwrap().push(log);
    }

    pub(crate) fn respond(&self, result: std::result::Result<Bytes, WalletError>) {
        *self.call_result.lock().unwrap() = Some(result);
    }

    pub(crate) fn submitted(&self) -> Vec<TransactionRequest> {
        self.submitted.lock().unwrap().clone()
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Hash the `n`th submission (1-based) will receive.
    pub(crate) fn hash(n: u8) -> TxHash {
        TxHash::with_last_byte(n)
    }
}

#[async_trait]
impl ContractCaller for FakeCaller {
    fn address(&self) -> Address {
        self.account
    }

    async fn submit(&self, tx: TransactionRequest) -> std::result::Result<TxHash, WalletError> {
        let rejection = self.submit_error.lock().unwrap().clone();
        if let Some(err) = rejection {
            return Err(err);
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.submitted.lock().unwrap().push(tx);
        Ok(Self::hash(self.next_hash.fetch_add(1, Ordering::SeqCst)))
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
    ) -> std::result::Result<TxReceipt, WalletError> {
        Ok(TxReceipt {
            transaction_hash: tx_hash,
            status: self.status.load(Ordering::SeqCst),
            block_number: Some(1),
            logs: self.logs.lock().unwrap().clone(),
        })
    }

    async fn call(&self, _tx: TransactionRequest) -> std::result::Result<Bytes, WalletError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(WalletError::Provider("no call result scripted".into())))
    }
}

/// Wallet granting a fixed account list.
#[derive(Debug)]
pub(crate) struct FakeWallet {
    accounts: Mutex<std::result::Result<Vec<Address>, WalletError>>,
    caller: Arc<FakeCaller>,
    requests: AtomicUsize,
}

impl FakeWallet {
    pub(crate) fn granting(caller: Arc<FakeCaller>) -> Self {
        Self {
            accounts: Mutex::new(Ok(vec![caller.address()])),
            caller,
            requests: AtomicUsize::new(0),
        }
    }

    pub(crate) fn refusing(err: WalletError) -> Self {
        Self {
            accounts: Mutex::new(Err(err)),
            caller: Arc::new(FakeCaller::new(PLAYER)),
            requests: AtomicUsize::new(0),
        }
    }

    /// Decline every later account request with `err`.
    pub(crate) fn refuse(&self, err: WalletError) {
        *self.accounts.lock().unwrap() = Err(err);
    }

    pub(crate) fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletProvider for FakeWallet {
    async fn request_accounts(&self) -> std::result::Result<Vec<Address>, WalletError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.accounts.lock().unwrap().clone()
    }

    async fn signer(
        &self,
        _account: Address,
    ) -> std::result::Result<Arc<dyn ContractCaller>, WalletError> {
        Ok(Arc::clone(&self.caller) as Arc<dyn ContractCaller>)
    }
}

/// Adapter over the bundled ABI with an optional wallet.
pub(crate) fn adapter(
    wallet: Option<Arc<FakeWallet>>,
    source: Arc<CountingSource>,
) -> MazeContract {
    let mut builder = MazeContract::builder()
        .config(AdapterConfig::default())
        .descriptor_source(source);
    if let Some(wallet) = wallet {
        builder = builder.wallet(wallet);
    }
    builder.build().unwrap()
}

/// A `GameCreated(gameId, creator, totalRounds, bounty)` log from `contract`.
pub(crate) fn game_created_log(
    contract: Address,
    game_id: u64,
    creator: Address,
    total_rounds: u64,
    bounty: U256,
) -> Log {
    let selector = keccak256("GameCreated(uint256,address,uint256,uint256)");
    let data = DynSolValue::Tuple(vec![
        DynSolValue::Uint(U256::from(total_rounds), 256),
        DynSolValue::Uint(bounty, 256),
    ])
    .abi_encode_params();
    Log::new_unchecked(
        contract,
        vec![
            selector,
            B256::from(U256::from(game_id).to_be_bytes::<32>()),
            creator.into_word(),
        ],
        data.into(),
    )
}
