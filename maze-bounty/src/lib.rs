//! Client-side adapter for the `MazeGameBounty` smart contract.
//!
//! A maze game uses this crate to connect a wallet, fund and create bounty
//! games, report player progress, claim rewards, and read game and player
//! records from the chain.
//!
//! ```rust,ignore
//! use maze_bounty::prelude::*;
//!
//! let wallet = EvmWallet::builder().rpc_url(rpc).build().await?;
//! let maze = MazeContract::builder()
//!     .config(AdapterConfig::from_env()?)
//!     .wallet(Arc::new(wallet))
//!     .build()?;
//!
//! maze.connect().await?;
//! let created = maze.create_game(5, "0.1").await?;
//! ```

pub mod config;
pub mod contract;
pub mod descriptor;
pub mod error;
pub mod prelude;
pub mod wallet;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};
