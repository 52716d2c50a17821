//! # Object URL Handles
//!
//! Process-local handles standing in for fetched payloads. A handle is an
//! opaque `blob:<origin>/<uuid>` string backed by bytes held in the
//! [`HandleRegistry`] until it is released.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

/// An allocated object URL
///
/// Clones share the same underlying string, so every member of a cache group
/// holds the same allocation.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(Arc<str>);

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether both values point at the same allocation
    pub fn ptr_eq(&self, other: &ObjectUrl) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectUrl({})", self.0)
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Store of live object URLs and the payloads behind them
#[derive(Debug)]
pub struct HandleRegistry {
    origin: String,
    entries: Mutex<HashMap<ObjectUrl, Bytes>>,
}

impl HandleRegistry {
    /// Create an empty registry allocating URLs under `origin`
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Allocate a new object URL for `data`
    pub fn create(&self, data: Bytes) -> ObjectUrl {
        let url = ObjectUrl(Arc::from(format!("blob:{}/{}", self.origin, Uuid::new_v4())));
        debug!(url = %url, size = data.len(), "Allocated object URL");
        self.entries.lock().insert(url.clone(), data);
        url
    }

    /// Payload behind a live object URL
    pub fn resolve(&self, url: &ObjectUrl) -> Option<Bytes> {
        self.entries.lock().get(url).cloned()
    }

    /// Release an object URL. Returns `false` when it was not live.
    pub fn revoke(&self, url: &ObjectUrl) -> bool {
        let removed = self.entries.lock().remove(url).is_some();
        if removed {
            debug!(url = %url, "Revoked object URL");
        }
        removed
    }

    /// Release every live object URL, returning how many were dropped
    pub fn revoke_all(&self) -> usize {
        let mut entries = self.entries.lock();
        let count = entries.len();
        entries.clear();
        count
    }

    pub fn is_live(&self, url: &ObjectUrl) -> bool {
        self.entries.lock().contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_resolve() {
        let registry = HandleRegistry::new("null");
        let url = registry.create(Bytes::from_static(b"font-bytes"));

        assert!(url.as_str().starts_with("blob:null/"));
        assert_eq!(registry.resolve(&url), Some(Bytes::from_static(b"font-bytes")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_handles_are_unique() {
        let registry = HandleRegistry::new("null");
        let a = registry.create(Bytes::from_static(b"same"));
        let b = registry.create(Bytes::from_static(b"same"));

        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_revoke_is_idempotent() {
        let registry = HandleRegistry::new("null");
        let url = registry.create(Bytes::from_static(b"x"));

        assert!(registry.revoke(&url));
        assert!(!registry.revoke(&url));
        assert!(registry.resolve(&url).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_clone_shares_allocation() {
        let registry = HandleRegistry::new("null");
        let url = registry.create(Bytes::from_static(b"x"));
        let copy = url.clone();

        assert!(url.ptr_eq(&copy));
    }
}
