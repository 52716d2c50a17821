//! # Fallback Fetch Orchestrator
//!
//! Resolves one cache group through an ordered fallback strategy:
//!
//! 1. fetch the representative's primary URI
//! 2. fetch the origin URI, when it differs from the primary URI
//! 3. probe the origin URI as an image and, when it loads, hand the origin
//!    URI back as-is
//!
//! Tier failures are logged and only decide whether the next tier runs. Only
//! the terminal failure of the last tier leaves the orchestrator.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, error, warn};

use crate::cache::{HandleRegistry, ObjectUrl};
use crate::error::{CacheError, FetchTier};
use crate::fetch::{FetchPrimitive, ImageProbe};

/// Value a group resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedValue {
    /// A freshly allocated local handle
    Handle(ObjectUrl),
    /// No local copy; the origin URI is used directly
    Origin(String),
}

impl ResolvedValue {
    pub fn as_str(&self) -> &str {
        match self {
            ResolvedValue::Handle(handle) => handle.as_str(),
            ResolvedValue::Origin(uri) => uri,
        }
    }
}

impl fmt::Display for ResolvedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of resolving one group, together with the group's origin URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub value: ResolvedValue,
    pub origin_uri: String,
}

impl Resolution {
    /// Whether the value is the origin URI itself rather than a local handle
    pub fn is_origin_sentinel(&self) -> bool {
        self.value.as_str() == self.origin_uri
    }

    pub fn handle(&self) -> Option<&ObjectUrl> {
        match &self.value {
            ResolvedValue::Handle(handle) => Some(handle),
            ResolvedValue::Origin(_) => None,
        }
    }

    /// URI to render with
    pub fn uri(&self) -> &str {
        self.value.as_str()
    }
}

/// Runs the three-tier strategy and allocates handles for fetched payloads
pub struct FallbackFetcher {
    fetcher: Arc<dyn FetchPrimitive>,
    probe: Arc<dyn ImageProbe>,
    registry: Arc<HandleRegistry>,
}

impl FallbackFetcher {
    pub fn new(
        fetcher: Arc<dyn FetchPrimitive>,
        probe: Arc<dyn ImageProbe>,
        registry: Arc<HandleRegistry>,
    ) -> Self {
        Self {
            fetcher,
            probe,
            registry,
        }
    }

    /// Resolve one group. A terminal failure comes back as `GroupFailure`.
    pub async fn resolve(
        &self,
        primary_uri: &str,
        origin_uri: &str,
        keys: &[String],
    ) -> Result<Resolution, CacheError> {
        match self.fetch_tier(FetchTier::Primary, primary_uri, keys).await {
            Ok(data) => return Ok(self.allocate(data, origin_uri)),
            Err(e) => warn!(keys = ?keys, error = %e, "Primary fetch failed, falling back"),
        }

        if origin_uri != primary_uri {
            match self.fetch_tier(FetchTier::Origin, origin_uri, keys).await {
                Ok(data) => return Ok(self.allocate(data, origin_uri)),
                Err(e) => warn!(keys = ?keys, error = %e, "Origin fetch failed, probing origin"),
            }
        } else {
            debug!(uri = %origin_uri, "Origin equals primary URI, skipping origin fetch");
        }

        match self.probe_origin(origin_uri, keys).await {
            Ok(()) => {
                debug!(uri = %origin_uri, keys = ?keys, "Origin loads directly, no local copy");
                Ok(Resolution {
                    value: ResolvedValue::Origin(origin_uri.to_owned()),
                    origin_uri: origin_uri.to_owned(),
                })
            }
            Err(e) => {
                error!(uri = %origin_uri, keys = ?keys, error = %e, "Resource caching failed at every tier");
                Err(CacheError::GroupFailure {
                    origin_uri: origin_uri.to_owned(),
                    keys: keys.to_vec(),
                    source: Box::new(e),
                })
            }
        }
    }

    async fn fetch_tier(
        &self,
        tier: FetchTier,
        uri: &str,
        keys: &[String],
    ) -> Result<Bytes, CacheError> {
        if uri.is_empty() {
            return Err(CacheError::InvalidUri {
                tier,
                keys: keys.to_vec(),
            });
        }

        debug!(uri = %uri, tier = %tier, "Fetching resource");
        self.fetcher
            .fetch(uri)
            .await
            .map_err(|source| CacheError::FetchFailed {
                tier,
                uri: uri.to_owned(),
                keys: keys.to_vec(),
                source,
            })
    }

    async fn probe_origin(&self, uri: &str, keys: &[String]) -> Result<(), CacheError> {
        if uri.is_empty() {
            return Err(CacheError::InvalidUri {
                tier: FetchTier::Probe,
                keys: keys.to_vec(),
            });
        }

        self.probe
            .probe(uri)
            .await
            .map_err(|source| CacheError::ProbeFailed {
                uri: uri.to_owned(),
                keys: keys.to_vec(),
                source,
            })
    }

    fn allocate(&self, data: Bytes, origin_uri: &str) -> Resolution {
        Resolution {
            value: ResolvedValue::Handle(self.registry.create(data)),
            origin_uri: origin_uri.to_owned(),
        }
    }
}
