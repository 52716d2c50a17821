//! # Resource Cache
//!
//! Caching of the resources an embedded game unit needs (fonts, images,
//! placeholders) before it is shown inside a host application.
//!
//! ## Features
//!
//! - One fetch per origin URI, shared by every resource pointing at it
//! - Fallback from host-local bundled copies to the remote origin, and
//!   finally to using the origin URI directly
//! - Process-local object URL handles with explicit revocation
//! - Batch caching that never lets one failing group affect the others

pub mod builder;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod resource;

#[cfg(test)]
mod test_utils;

pub use builder::EngineConfigBuilder;
pub use config::{EngineConfig, FetcherConfig};
pub use engine::CacheEngine;
pub use error::{CacheError, FetchError, FetchTier, ProbeError};

pub use cache::{BatchState, ObjectUrl, Resolution, ResolvedValue};
pub use fetch::{FetchPrimitive, HttpFetcher, HttpImageProbe, ImageProbe};
pub use resource::{
    CacheRequest, HostContext, HostPlatform, ListKind, ResourceDescriptor, ResourceList,
    ResourceManifest, ResourceSet,
};
