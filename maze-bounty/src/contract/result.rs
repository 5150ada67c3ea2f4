//! Operation outcomes and the host-facing result envelope.

use alloy::primitives::{TxHash, U256};
use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

/// Outcome of a finalized `createGame` transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedGame {
    /// Identifier assigned by the contract, taken from the `GameCreated`
    /// event. `None` when the receipt carries no such event.
    #[serde(serialize_with = "serialize_game_id")]
    pub game_id: Option<U256>,
    /// Hash of the `createGame` transaction.
    pub transaction_id: TxHash,
}

#[allow(clippy::ref_option)]
fn serialize_game_id<S: Serializer>(
    game_id: &Option<U256>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match game_id {
        Some(id) => serializer.serialize_str(&id.to_string()),
        None => serializer.serialize_none(),
    }
}

/// The `{ success, ... }` envelope handed to UI code.
///
/// Built from the [`Result`] of any adapter operation, so a host that only
/// deals in envelopes never has to handle a raised error:
///
/// ```json
/// { "success": true, "gameId": "42", "transactionId": "0x…" }
/// { "success": true }
/// { "success": false, "message": "wallet not connected" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    /// Whether the operation completed.
    pub success: bool,
    /// Payload of a successful `createGame`.
    #[serde(flatten)]
    pub game: Option<CreatedGame>,
    /// Failure reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl OperationResult {
    /// A success without payload.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            success: true,
            game: None,
            message: None,
        }
    }

    /// A failure carrying the error's message.
    #[must_use]
    pub fn failed(err: &Error) -> Self {
        Self {
            success: false,
            game: None,
            message: Some(err.to_string()),
        }
    }
}

impl From<Result<CreatedGame>> for OperationResult {
    fn from(result: Result<CreatedGame>) -> Self {
        match result {
            Ok(game) => Self {
                success: true,
                game: Some(game),
                message: None,
            },
            Err(err) => Self::failed(&err),
        }
    }
}

impl From<Result<()>> for OperationResult {
    fn from(result: Result<()>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(err) => Self::failed(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_created_game_envelope() {
        let envelope = OperationResult::from(Ok::<_, Error>(CreatedGame {
            game_id: Some(U256::from(42)),
            transaction_id: TxHash::with_last_byte(1),
        }));
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "success": true,
                "gameId": "42",
                "transactionId": format!("{:#x}", TxHash::with_last_byte(1)),
            })
        );
    }

    #[test]
    fn test_missing_game_id_serializes_as_null() {
        let envelope = OperationResult::from(Ok::<_, Error>(CreatedGame {
            game_id: None,
            transaction_id: TxHash::with_last_byte(2),
        }));
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["gameId"], json!(null));
        assert!(value.as_object().unwrap().contains_key("gameId"));
    }

    #[test]
    fn test_unit_envelopes() {
        assert_eq!(
            serde_json::to_value(OperationResult::from(Ok::<(), Error>(()))).unwrap(),
            json!({ "success": true })
        );
        assert_eq!(
            serde_json::to_value(OperationResult::from(Err::<(), _>(
                Error::remote("execution reverted: game not active")
            )))
            .unwrap(),
            json!({
                "success": false,
                "message": "remote call failed: execution reverted: game not active"
            })
        );
    }
}
