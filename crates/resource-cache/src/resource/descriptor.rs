use parking_lot::RwLock;

use crate::cache::ObjectUrl;

/// One named asset a consumer wants available locally
#[derive(Debug)]
pub struct ResourceDescriptor {
    key: String,
    primary_uri: String,
    origin_uri: String,
    fetch_priority: i32,
    cache_handle: RwLock<Option<ObjectUrl>>,
}

impl ResourceDescriptor {
    /// Create a descriptor with the default fetch priority of zero
    pub fn new(
        key: impl Into<String>,
        primary_uri: impl Into<String>,
        origin_uri: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            primary_uri: primary_uri.into(),
            origin_uri: origin_uri.into(),
            fetch_priority: 0,
            cache_handle: RwLock::new(None),
        }
    }

    /// Set the fetch priority (highest value in a group performs the fetch)
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.fetch_priority = priority;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn primary_uri(&self) -> &str {
        &self.primary_uri
    }

    pub fn origin_uri(&self) -> &str {
        &self.origin_uri
    }

    pub fn fetch_priority(&self) -> i32 {
        self.fetch_priority
    }

    /// The assigned cache handle, if caching succeeded
    pub fn cache_handle(&self) -> Option<ObjectUrl> {
        self.cache_handle.read().clone()
    }

    pub fn has_cache_handle(&self) -> bool {
        self.cache_handle.read().is_some()
    }

    /// Store a handle, returning the one it replaced
    pub(crate) fn set_cache_handle(&self, handle: ObjectUrl) -> Option<ObjectUrl> {
        self.cache_handle.write().replace(handle)
    }

    /// Clear the handle, returning the one that was set
    pub(crate) fn unset_cache_handle(&self) -> Option<ObjectUrl> {
        self.cache_handle.write().take()
    }

    /// URI to render with: the cache handle when set, the origin otherwise
    pub fn effective_uri(&self) -> String {
        match self.cache_handle.read().as_ref() {
            Some(handle) => handle.as_str().to_owned(),
            None => self.origin_uri.clone(),
        }
    }
}

/// Ad hoc request for caching a single location outside a resource list
#[derive(Debug, Clone, Default)]
pub struct CacheRequest {
    /// Location fetched first
    pub uri: String,
    /// Fallback location, defaults to `uri`
    pub origin_uri: Option<String>,
    /// Keys reported in diagnostics
    pub keys: Vec<String>,
}

impl CacheRequest {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }

    pub fn with_origin_uri(mut self, origin_uri: impl Into<String>) -> Self {
        self.origin_uri = Some(origin_uri.into());
        self
    }

    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Fallback location, `uri` when none was given
    pub fn origin(&self) -> &str {
        self.origin_uri.as_deref().unwrap_or(&self.uri)
    }

    /// Keys reported in diagnostics, the URI itself when none were given
    pub(crate) fn diagnostic_keys(&self) -> Vec<String> {
        if self.keys.is_empty() {
            vec![self.uri.clone()]
        } else {
            self.keys.clone()
        }
    }
}
