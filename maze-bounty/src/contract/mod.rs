//! The `MazeGameBounty` contract adapter.
//!
//! [`MazeContract`] is what the game talks to. Underneath, a
//! [`BoundContract`] pairs the deployed address with the loaded descriptor
//! and the connected account's [`ContractCaller`](crate::wallet::ContractCaller).

mod adapter;
mod bound;
mod output;
mod result;

pub use adapter::{GAME_CREATED_EVENT, MazeContract, MazeContractBuilder};
pub use bound::BoundContract;
pub use output::CallOutput;
pub use result::{CreatedGame, OperationResult};
