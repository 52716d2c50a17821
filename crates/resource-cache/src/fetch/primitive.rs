//! # Fetch Capabilities
//!
//! The two collaborator capabilities the cache engine consumes. Platform
//! specifics (retries, local path rewriting, host bridges) live behind them.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{FetchError, ProbeError};

/// Download the payload at a URI
#[async_trait]
pub trait FetchPrimitive: Send + Sync {
    /// Fetch the full payload. A non-success status is an error.
    async fn fetch(&self, uri: &str) -> Result<Bytes, FetchError>;
}

/// Check that a URI is directly loadable as an image
#[async_trait]
pub trait ImageProbe: Send + Sync {
    async fn probe(&self, uri: &str) -> Result<(), ProbeError>;
}
