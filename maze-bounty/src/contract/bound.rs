//! A contract bound to a descriptor and a signer.

use std::fmt;
use std::sync::Arc;

use alloy::dyn_abi::{DecodedEvent, DynSolValue, EventExt, FunctionExt, JsonAbiExt, Specifier};
use alloy::json_abi::{Event, Function, StateMutability};
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use tracing::debug;

use super::output::CallOutput;
use crate::descriptor::InterfaceDescriptor;
use crate::error::{Error, Result};
use crate::wallet::{ContractCaller, TxReceipt};

/// The capability to invoke operations on one deployed contract.
///
/// Arguments are given as strings and coerced to the parameter types the
/// descriptor declares, so decimal integers, `0x` addresses and `true` /
/// `false` all work regardless of the exact Solidity integer width.
#[derive(Clone)]
pub struct BoundContract {
    address: Address,
    descriptor: Arc<InterfaceDescriptor>,
    caller: Arc<dyn ContractCaller>,
}

impl fmt::Debug for BoundContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundContract")
            .field("address", &self.address)
            .field("account", &self.caller.address())
            .finish_non_exhaustive()
    }
}

impl BoundContract {
    /// Bind `address` to a descriptor and a caller.
    #[must_use]
    pub fn new(
        address: Address,
        descriptor: Arc<InterfaceDescriptor>,
        caller: Arc<dyn ContractCaller>,
    ) -> Self {
        Self {
            address,
            descriptor,
            caller,
        }
    }

    /// Address of the deployed contract.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Account the calls are made from.
    #[must_use]
    pub fn account(&self) -> Address {
        self.caller.address()
    }

    /// ABI-encode a call to `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Abi`] if the descriptor has no matching function and
    /// [`Error::InvalidArgument`] if an argument does not fit its parameter.
    pub fn encode(&self, name: &str, args: &[String]) -> Result<(&Function, Bytes)> {
        let function = self.descriptor.function(name, args.len())?;
        let values = function
            .inputs
            .iter()
            .zip(args)
            .map(|(param, arg)| {
                let ty = param.resolve().map_err(|e| {
                    Error::abi(format!("`{name}` parameter `{}`: {e}", param.name))
                })?;
                ty.coerce_str(arg).map_err(|e| {
                    Error::invalid_argument(format!(
                        "`{name}` parameter `{}` = {arg:?}: {e}",
                        param.name
                    ))
                })
            })
            .collect::<Result<Vec<DynSolValue>>>()?;

        let input = function
            .abi_encode_input(&values)
            .map_err(|e| Error::abi(format!("cannot encode `{name}`: {e}")))?;
        Ok((function, input.into()))
    }

    /// Build the transaction for a state-changing call of `name`.
    ///
    /// `value` is attached only when non-zero.
    ///
    /// # Errors
    ///
    /// Fails as [`encode`](Self::encode) does, and with
    /// [`Error::InvalidArgument`] if value is attached to a non-payable
    /// function.
    pub fn transaction(
        &self,
        name: &str,
        args: &[String],
        value: U256,
    ) -> Result<TransactionRequest> {
        let (function, input) = self.encode(name, args)?;
        let mut tx = self.request(input);
        if !value.is_zero() {
            if function.state_mutability != StateMutability::Payable {
                return Err(Error::invalid_argument(format!(
                    "`{name}` does not accept a value"
                )));
            }
            tx = tx.with_value(value);
        }
        Ok(tx)
    }

    /// Sign and broadcast `tx`.
    ///
    /// # Errors
    ///
    /// Returns the caller's failure converted into [`Error`].
    pub async fn submit(&self, tx: TransactionRequest) -> Result<TxHash> {
        Ok(self.caller.submit(tx).await?)
    }

    /// Wait for `tx_hash` to be included.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RemoteCallFailed`] if waiting fails or the
    /// transaction reverted.
    pub async fn finalize(&self, tx_hash: TxHash) -> Result<TxReceipt> {
        let receipt = self.caller.wait_for_receipt(tx_hash).await?;
        if !receipt.status {
            return Err(Error::remote(format!("transaction {tx_hash} reverted")));
        }
        debug!(
            tx_hash = %tx_hash,
            block = ?receipt.block_number,
            logs = receipt.logs.len(),
            "transaction finalized"
        );
        Ok(receipt)
    }

    /// Run a read-only call of `name` and decode its outputs.
    ///
    /// # Errors
    ///
    /// Fails as [`encode`](Self::encode) does, and with
    /// [`Error::RemoteCallFailed`] if the call fails or its return data does
    /// not decode.
    pub async fn call(&self, name: &str, args: &[String]) -> Result<CallOutput> {
        let (function, input) = self.encode(name, args)?;
        debug!(function = name, "calling contract");
        let data = self.caller.call(self.request(input)).await?;
        let values = function
            .abi_decode_output(&data)
            .map_err(|e| Error::remote(format!("cannot decode `{name}` result: {e}")))?;
        Ok(CallOutput::new(function.outputs.clone(), values))
    }

    /// Find `field` of the last `event` this contract emitted in `receipt`.
    ///
    /// Logs from other addresses, and logs that fail to decode, are skipped.
    #[must_use]
    pub fn event_field(
        &self,
        receipt: &TxReceipt,
        event: &str,
        field: &str,
    ) -> Option<DynSolValue> {
        let event = self.descriptor.event(event)?;
        let selector = event.selector();
        receipt
            .logs
            .iter()
            .filter(|log| log.address == self.address)
            .filter(|log| log.data.topics().first() == Some(&selector))
            .filter_map(|log| event.decode_log(&log.data).ok())
            .filter_map(|decoded| named_field(event, decoded, field))
            .last()
    }

    fn request(&self, input: Bytes) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(self.caller.address())
            .with_to(self.address)
            .with_input(input)
    }
}

fn named_field(event: &Event, decoded: DecodedEvent, field: &str) -> Option<DynSolValue> {
    let mut indexed = decoded.indexed.into_iter();
    let mut body = decoded.body.into_iter();
    for input in &event.inputs {
        let value = if input.indexed {
            indexed.next()
        } else {
            body.next()
        }?;
        if input.name == field {
            return Some(value);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Log, address};
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::testing::{FakeCaller, MAZE_ABI, PLAYER, game_created_log};

    const CONTRACT: Address = address!("c7d14837893b8a2d8011242b8891202cd76ec1a1");

    fn bound() -> (BoundContract, Arc<FakeCaller>) {
        let caller = Arc::new(FakeCaller::new(PLAYER));
        let descriptor = Arc::new(InterfaceDescriptor::from_json_str(MAZE_ABI).unwrap());
        let contract = BoundContract::new(
            CONTRACT,
            descriptor,
            Arc::clone(&caller) as Arc<dyn ContractCaller>,
        );
        (contract, caller)
    }

    fn receipt(logs: Vec<Log>) -> TxReceipt {
        TxReceipt {
            transaction_hash: TxHash::with_last_byte(9),
            status: true,
            block_number: Some(7),
            logs,
        }
    }

    #[test]
    fn test_encode_uses_descriptor_selector() {
        let (contract, _) = bound();
        let (function, input) =
            assert_ok!(contract.encode("claimReward", &["3".into(), "1".into()]));
        assert_eq!(function.signature(), "claimReward(uint256,uint256)");
        assert_eq!(&input[..4], function.selector().as_slice());
        assert_eq!(input.len(), 4 + 2 * 32);
        assert_eq!(input[4 + 31], 3);
        assert_eq!(input[4 + 63], 1);
    }

    #[test]
    fn test_encode_rejects_bad_arguments() {
        let (contract, _) = bound();
        let err = assert_err!(
            contract.encode("getPlayerProgress", &["1".into(), "not-an-address".into()])
        );
        assert!(matches!(err, Error::InvalidArgument(_)));

        let err = assert_err!(contract.encode("selfDestruct", &[]));
        assert!(matches!(err, Error::Abi(_)));
    }

    #[test]
    fn test_value_only_on_payable() {
        let (contract, _) = bound();
        let value = U256::from(10_u64.pow(17));

        let tx = assert_ok!(contract.transaction("createGame", &["5".into()], value));
        assert_eq!(tx.value, Some(value));
        assert_eq!(tx.from, Some(PLAYER));

        let claim = ["1".to_string(), "1".to_string()];
        let err = assert_err!(contract.transaction("claimReward", &claim, value));
        assert!(matches!(err, Error::InvalidArgument(_)));

        let tx = assert_ok!(contract.transaction("claimReward", &claim, U256::ZERO));
        assert_eq!(tx.value, None);
    }

    #[test]
    fn test_event_field_from_contract_logs_only() {
        let (contract, _) = bound();
        let stranger = address!("5fbdb2315678afecb367f032d93f642f64180aa3");
        let bounty = U256::from(10_u64.pow(17));

        let logs = vec![
            game_created_log(stranger, 7, PLAYER, 5, bounty),
            game_created_log(CONTRACT, 42, PLAYER, 5, bounty),
        ];
        let value = contract.event_field(&receipt(logs), "GameCreated", "gameId");
        assert_eq!(value, Some(DynSolValue::Uint(U256::from(42), 256)));

        let single = receipt(vec![game_created_log(CONTRACT, 42, PLAYER, 5, bounty)]);
        let value = contract.event_field(&single, "GameCreated", "bounty");
        assert_eq!(value, Some(DynSolValue::Uint(bounty, 256)));
    }

    #[test]
    fn test_event_field_absent() {
        let (contract, _) = bound();
        let empty = receipt(Vec::new());
        assert_eq!(contract.event_field(&empty, "GameCreated", "gameId"), None);
        assert_eq!(contract.event_field(&empty, "Unknown", "gameId"), None);
    }

    #[tokio::test]
    async fn test_finalize_rejects_reverted_receipt() {
        let (contract, caller) = bound();
        caller.revert();
        let err = assert_err!(contract.finalize(TxHash::with_last_byte(1)).await);
        assert!(matches!(err, Error::RemoteCallFailed(msg) if msg.contains("reverted")));
    }

    #[tokio::test]
    async fn test_call_decodes_outputs() {
        let (contract, caller) = bound();
        let encoded = DynSolValue::Tuple(vec![DynSolValue::Tuple(vec![
            DynSolValue::Uint(U256::from(3), 256),
            DynSolValue::Uint(U256::from(95), 256),
            DynSolValue::Bool(true),
            DynSolValue::Bool(false),
        ])])
        .abi_encode_params();
        caller.respond(Ok(encoded.into()));

        let output = assert_ok!(
            contract
                .call("getPlayerProgress", &["1".into(), PLAYER.to_string()])
                .await
        );
        assert_eq!(output.values().len(), 1);
        assert_eq!(output.to_json()["completionTime"], "95");
    }

    #[tokio::test]
    async fn test_call_with_undecodable_data() {
        let (contract, caller) = bound();
        caller.respond(Ok(Bytes::new()));
        let err = assert_err!(contract.call("getGame", &["1".into()]).await);
        assert!(matches!(err, Error::RemoteCallFailed(_)));
    }
}
