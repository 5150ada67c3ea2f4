//! Contract interface descriptor (ABI) loading.
//!
//! The descriptor is an external, trusted JSON document. It is loaded through
//! a [`DescriptorSource`] and cached by a [`DescriptorCache`] so that it is
//! fetched at most once per adapter, no matter how many callers race for it.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use alloy::json_abi::{Event, Function, JsonAbi};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use url::Url;

use crate::config::{AdapterConfig, DescriptorLocation};
use crate::error::{Error, Result};

/// The `MazeGameBounty` ABI shipped with this crate.
pub const BUNDLED_ABI: &str = include_str!("../abi/MazeGameBounty.json");

/// A parsed contract interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDescriptor {
    abi: JsonAbi,
}

impl InterfaceDescriptor {
    /// Wrap an already parsed ABI.
    #[must_use]
    pub const fn new(abi: JsonAbi) -> Self {
        Self { abi }
    }

    /// Parse a descriptor document.
    ///
    /// Accepts either a bare ABI array or a build artifact carrying the ABI
    /// under an `abi` key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DescriptorLoadFailed`] if the document is not an ABI.
    pub fn from_json(document: Value) -> Result<Self> {
        let abi = match document {
            Value::Object(mut artifact) => artifact
                .remove("abi")
                .ok_or_else(|| Error::descriptor("document has no `abi` entry"))?,
            other => other,
        };
        let abi: JsonAbi = serde_json::from_value(abi)
            .map_err(|e| Error::descriptor(format!("malformed ABI: {e}")))?;
        Ok(Self { abi })
    }

    /// The descriptor for [`BUNDLED_ABI`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::DescriptorLoadFailed`] if the bundled ABI is malformed.
    pub fn bundled() -> Result<Self> {
        Self::from_json_str(BUNDLED_ABI)
    }

    /// Parse a descriptor from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DescriptorLoadFailed`] if the text is not an ABI.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(text)
            .map_err(|e| Error::descriptor(format!("invalid JSON: {e}")))?;
        Self::from_json(document)
    }

    /// Look up a function by name, preferring the overload with `arity`
    /// inputs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Abi`] if no function with that name and arity exists.
    pub fn function(&self, name: &str, arity: usize) -> Result<&Function> {
        self.abi
            .function(name)
            .and_then(|overloads| overloads.iter().find(|f| f.inputs.len() == arity))
            .ok_or_else(|| {
                Error::abi(format!("no function `{name}` taking {arity} argument(s)"))
            })
    }

    /// Look up a non-anonymous event by name.
    #[must_use]
    pub fn event(&self, name: &str) -> Option<&Event> {
        self.abi
            .event(name)
            .and_then(|events| events.iter().find(|e| !e.anonymous))
    }

    /// The underlying ABI.
    #[must_use]
    pub const fn abi(&self) -> &JsonAbi {
        &self.abi
    }
}

/// Somewhere an interface descriptor can be loaded from.
#[async_trait]
pub trait DescriptorSource: Send + Sync + fmt::Debug {
    /// Load and parse the descriptor.
    async fn fetch(&self) -> Result<InterfaceDescriptor>;
}

/// Fetches the descriptor with an HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpDescriptorSource {
    client: reqwest::Client,
    url: Url,
}

impl HttpDescriptorSource {
    /// Create a source for `url` using `client`.
    #[must_use]
    pub const fn new(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }

    /// The URL that will be fetched.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl DescriptorSource for HttpDescriptorSource {
    async fn fetch(&self) -> Result<InterfaceDescriptor> {
        debug!(url = %self.url, "fetching contract interface");
        let document: Value = self
            .client
            .get(self.url.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        InterfaceDescriptor::from_json(document)
    }
}

/// Reads the descriptor from a local file.
#[derive(Debug, Clone)]
pub struct FileDescriptorSource {
    path: PathBuf,
}

impl FileDescriptorSource {
    /// Create a source reading `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DescriptorSource for FileDescriptorSource {
    async fn fetch(&self) -> Result<InterfaceDescriptor> {
        debug!(path = %self.path.display(), "reading contract interface");
        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            Error::descriptor(format!("cannot read {}: {e}", self.path.display()))
        })?;
        InterfaceDescriptor::from_json_str(&text)
    }
}

/// A descriptor that is already in memory.
#[derive(Debug, Clone)]
pub struct StaticDescriptorSource {
    descriptor: InterfaceDescriptor,
}

impl StaticDescriptorSource {
    /// Serve `descriptor` on every fetch.
    #[must_use]
    pub const fn new(descriptor: InterfaceDescriptor) -> Self {
        Self { descriptor }
    }
}

#[async_trait]
impl DescriptorSource for StaticDescriptorSource {
    async fn fetch(&self) -> Result<InterfaceDescriptor> {
        Ok(self.descriptor.clone())
    }
}

/// Build the source named by a configuration.
///
/// # Errors
///
/// Returns [`Error::Config`] if an HTTP client is needed and cannot be built,
/// and [`Error::DescriptorLoadFailed`] if the bundled ABI does not parse.
pub fn source_for(config: &AdapterConfig) -> Result<Arc<dyn DescriptorSource>> {
    Ok(match &config.descriptor {
        DescriptorLocation::Bundled => {
            Arc::new(StaticDescriptorSource::new(InterfaceDescriptor::bundled()?))
        }
        DescriptorLocation::Url(url) => Arc::new(HttpDescriptorSource::new(
            config.http.build_client()?,
            url.clone(),
        )),
        DescriptorLocation::File(path) => Arc::new(FileDescriptorSource::new(path.clone())),
    })
}

/// Loads a descriptor exactly once and shares it.
///
/// Concurrent callers of [`get`](Self::get) wait on the same in-flight load.
/// A failed load is not cached; the next caller tries again.
pub struct DescriptorCache {
    source: Arc<dyn DescriptorSource>,
    cell: OnceCell<Arc<InterfaceDescriptor>>,
}

impl fmt::Debug for DescriptorCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorCache")
            .field("source", &self.source)
            .field("loaded", &self.cell.initialized())
            .finish()
    }
}

impl DescriptorCache {
    /// Create an empty cache over `source`.
    #[must_use]
    pub fn new(source: Arc<dyn DescriptorSource>) -> Self {
        Self {
            source,
            cell: OnceCell::new(),
        }
    }

    /// Return the descriptor, loading it on first use.
    ///
    /// # Errors
    ///
    /// Returns the source's error if the load fails.
    pub async fn get(&self) -> Result<Arc<InterfaceDescriptor>> {
        self.cell
            .get_or_try_init(|| async {
                let descriptor = self.source.fetch().await?;
                info!(
                    functions = descriptor.abi().functions.len(),
                    events = descriptor.abi().events.len(),
                    "contract interface loaded"
                );
                Ok::<_, Error>(Arc::new(descriptor))
            })
            .await
            .map(Arc::clone)
    }

    #[cfg(test)]
    pub(crate) fn loaded(&self) -> Option<Arc<InterfaceDescriptor>> {
        self.cell.get().map(Arc::clone)
    }
}
