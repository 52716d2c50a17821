//! # Cache System
//!
//! Deduplicated caching of resource descriptors: grouping by origin, the
//! fallback fetch strategy, and the lifecycle of the handles it allocates.

mod group;
mod handle;
mod lifecycle;
mod orchestrator;
mod session;

pub use group::{CacheGroup, CacheGroups, GroupBuilder, build_groups};
pub use handle::{HandleRegistry, ObjectUrl};
pub use lifecycle::LifecycleManager;
pub use orchestrator::{FallbackFetcher, Resolution, ResolvedValue};
pub use session::{BatchState, CacheSession};
