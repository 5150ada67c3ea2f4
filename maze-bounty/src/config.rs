//! Adapter configuration.
//!
//! The deployed contract address and the location of its interface
//! descriptor are the only inputs the adapter needs besides a wallet.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use alloy::primitives::{Address, address};
use url::Url;

use crate::error::{Error, Result};

/// Address of the deployed `MazeGameBounty` contract.
pub const DEFAULT_CONTRACT_ADDRESS: Address = address!("c7d14837893b8a2d8011242b8891202cd76ec1a1");

/// Keyword selecting the ABI compiled into the crate.
pub const BUNDLED_DESCRIPTOR: &str = "bundled";

/// Environment variable overriding the contract address.
pub const ENV_CONTRACT_ADDRESS: &str = "MAZE_CONTRACT_ADDRESS";
/// Environment variable overriding the descriptor location.
pub const ENV_DESCRIPTOR: &str = "MAZE_ABI";
/// Environment variable overriding the HTTP timeout in seconds.
pub const ENV_HTTP_TIMEOUT: &str = "MAZE_HTTP_TIMEOUT_SECS";

/// Where the interface descriptor is loaded from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DescriptorLocation {
    /// The ABI shipped with this crate.
    #[default]
    Bundled,
    /// Fetched with an HTTP GET.
    Url(Url),
    /// Read from the local filesystem.
    File(PathBuf),
}

impl FromStr for DescriptorLocation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::config("descriptor location is empty"));
        }
        if s.eq_ignore_ascii_case(BUNDLED_DESCRIPTOR) {
            return Ok(Self::Bundled);
        }
        if s.starts_with("http://") || s.starts_with("https://") {
            let url = Url::parse(s)
                .map_err(|e| Error::config(format!("invalid descriptor URL '{s}': {e}")))?;
            Ok(Self::Url(url))
        } else {
            Ok(Self::File(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for DescriptorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bundled => f.write_str(BUNDLED_DESCRIPTOR),
            Self::Url(url) => write!(f, "{url}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// HTTP client configuration for descriptor fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// User agent string.
    pub user_agent: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Some(30),
            user_agent: None,
        }
    }
}

impl HttpClientConfig {
    /// Build a reqwest client with this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the client cannot be built.
    pub fn build_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();

        if let Some(timeout) = self.timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(timeout));
        }

        if let Some(ref user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }

        builder
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))
    }
}

/// Configuration for a [`MazeContract`](crate::contract::MazeContract).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    /// Address of the deployed contract.
    pub contract_address: Address,
    /// Where the contract's ABI is loaded from.
    pub descriptor: DescriptorLocation,
    /// HTTP settings used when the descriptor is a URL.
    pub http: HttpClientConfig,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            contract_address: DEFAULT_CONTRACT_ADDRESS,
            descriptor: DescriptorLocation::default(),
            http: HttpClientConfig::default(),
        }
    }
}

impl AdapterConfig {
    /// Build a configuration from the defaults, overridden by environment
    /// variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is set but malformed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a value is present but malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(address) = lookup(ENV_CONTRACT_ADDRESS) {
            config.contract_address = address.trim().parse().map_err(|e| {
                Error::config(format!("invalid {ENV_CONTRACT_ADDRESS} '{address}': {e}"))
            })?;
        }

        if let Some(location) = lookup(ENV_DESCRIPTOR) {
            config.descriptor = location.parse()?;
        }

        if let Some(timeout) = lookup(ENV_HTTP_TIMEOUT) {
            let secs = timeout.trim().parse::<u64>().map_err(|e| {
                Error::config(format!("invalid {ENV_HTTP_TIMEOUT} '{timeout}': {e}"))
            })?;
            config.http.timeout_secs = (secs > 0).then_some(secs);
        }

        Ok(config)
    }

    /// Set the contract address.
    #[must_use]
    pub const fn with_contract_address(mut self, address: Address) -> Self {
        self.contract_address = address;
        self
    }

    /// Set the descriptor location.
    #[must_use]
    pub fn with_descriptor(mut self, descriptor: DescriptorLocation) -> Self {
        self.descriptor = descriptor;
        self
    }
}
