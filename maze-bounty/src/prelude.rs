//! Commonly used types, for glob import.

pub use crate::config::{AdapterConfig, DescriptorLocation, HttpClientConfig};
pub use crate::contract::{CallOutput, CreatedGame, MazeContract, OperationResult};
pub use crate::descriptor::{DescriptorSource, InterfaceDescriptor};
pub use crate::error::Error;
pub use crate::wallet::{ContractCaller, EvmWallet, WalletError, WalletProvider};
