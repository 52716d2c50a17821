//! # Resources
//!
//! Descriptors of the assets a game unit wants cached and the lists that
//! group them.

mod descriptor;
mod list;
mod manifest;

pub use descriptor::{CacheRequest, ResourceDescriptor};
pub use list::{HostContext, HostPlatform, ListKind, ResourceList, ResourceSet};
pub use manifest::{GameResources, Placeholder, PlaceholderType, ResourceManifest};
