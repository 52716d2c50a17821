//! # Resource Lists
//!
//! Ordered collections of [`ResourceDescriptor`]s handed to the engine as one
//! unit. Every list is told when a caching pass over it has finished.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Deserialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::resource::ResourceDescriptor;

/// Capability every resource collection handed to the engine provides
pub trait ResourceSet: Send + Sync {
    /// Name used in diagnostics
    fn name(&self) -> &str;

    /// Descriptors in insertion order
    fn descriptors(&self) -> &[Arc<ResourceDescriptor>];

    /// Called exactly once at the end of every caching pass, success or not
    fn notify_cache_done(&self);
}

/// Platform hosting the game unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostPlatform {
    Android,
    Ios,
    #[default]
    Web,
}

impl HostPlatform {
    /// Native shells ship bundled copies of dynamic resources
    pub fn is_native(&self) -> bool {
        matches!(self, HostPlatform::Android | HostPlatform::Ios)
    }
}

/// What the resource list builders need to know about the host
#[derive(Debug, Clone, Default)]
pub struct HostContext {
    pub platform: HostPlatform,
    pub game_instance_id: Option<u64>,
}

impl HostContext {
    pub fn new(platform: HostPlatform, game_instance_id: Option<u64>) -> Self {
        Self {
            platform,
            game_instance_id,
        }
    }

    /// Host-local path a native shell serves a bundled resource from
    pub fn local_resource_path(&self, key: &str) -> Option<String> {
        if !self.platform.is_native() {
            return None;
        }
        self.game_instance_id
            .map(|id| format!("./resources_{id}/{key}"))
    }
}

/// How descriptors of a list were derived from their URI map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// Primary and origin are the same remote URI
    Static,
    /// Primary is the host-local bundled copy when the host provides one
    Dynamic,
}

type DoneHook = Box<dyn Fn() + Send + Sync>;

/// Concrete resource list built from a key to URI map
pub struct ResourceList {
    name: String,
    kind: ListKind,
    descriptors: Vec<Arc<ResourceDescriptor>>,
    done_tx: watch::Sender<bool>,
    completions: AtomicUsize,
    on_done: Option<DoneHook>,
}

impl ResourceList {
    /// Create a list from prepared descriptors
    pub fn new(name: impl Into<String>, kind: ListKind, descriptors: Vec<ResourceDescriptor>) -> Self {
        let (done_tx, _) = watch::channel(false);
        Self {
            name: name.into(),
            kind,
            descriptors: descriptors.into_iter().map(Arc::new).collect(),
            done_tx,
            completions: AtomicUsize::new(0),
            on_done: None,
        }
    }

    /// Build a list whose resources are always fetched from their remote URI
    pub fn new_static<I, K, V>(name: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let descriptors = entries
            .into_iter()
            .map(|(key, uri)| {
                let uri = uri.into();
                ResourceDescriptor::new(key, uri.clone(), uri)
            })
            .collect();
        Self::new(name, ListKind::Static, descriptors)
    }

    /// Build a list preferring the host's bundled copy over the remote URI
    pub fn new_dynamic<I, K, V>(name: impl Into<String>, entries: I, host: &HostContext) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let name = name.into();
        if host.platform.is_native() && host.game_instance_id.is_none() {
            warn!(
                list = %name,
                platform = ?host.platform,
                "No game instance id on native host, bundled resources are unreachable"
            );
        }

        let descriptors = entries
            .into_iter()
            .map(|(key, uri)| {
                let key = key.into();
                let origin = uri.into();
                let primary = host
                    .local_resource_path(&key)
                    .unwrap_or_else(|| origin.clone());
                ResourceDescriptor::new(key, primary, origin)
            })
            .collect();
        Self::new(name, ListKind::Dynamic, descriptors)
    }

    /// Register a hook run each time a caching pass over this list finishes
    pub fn with_on_done(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_done = Some(Box::new(hook));
        self
    }

    pub fn kind(&self) -> ListKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Descriptor registered under `key`
    pub fn descriptor(&self, key: &str) -> Option<&Arc<ResourceDescriptor>> {
        self.descriptors.iter().find(|d| d.key() == key)
    }

    /// Key to render URI for every resource
    pub fn assets(&self) -> BTreeMap<String, String> {
        self.descriptors
            .iter()
            .map(|d| (d.key().to_owned(), d.effective_uri()))
            .collect()
    }

    /// Render URI of one resource
    pub fn asset_by_key(&self, key: &str) -> Option<String> {
        self.descriptor(key).map(|d| d.effective_uri())
    }

    /// Number of caching passes that finished over this list
    pub fn completions(&self) -> usize {
        self.completions.load(Ordering::Acquire)
    }

    /// Wait until at least one caching pass over this list has finished
    pub async fn wait_cache_done(&self) {
        let mut rx = self.done_tx.subscribe();
        // The sender lives as long as `self`, so the wait cannot fail
        let _ = rx.wait_for(|done| *done).await;
    }
}

impl ResourceSet for ResourceList {
    fn name(&self) -> &str {
        &self.name
    }

    fn descriptors(&self) -> &[Arc<ResourceDescriptor>] {
        &self.descriptors
    }

    fn notify_cache_done(&self) {
        let pass = self.completions.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(list = %self.name, pass, "Resource list caching finished");
        self.done_tx.send_replace(true);
        if let Some(hook) = &self.on_done {
            hook();
        }
    }
}

impl fmt::Debug for ResourceList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceList")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("descriptors", &self.descriptors)
            .field("completions", &self.completions())
            .finish_non_exhaustive()
    }
}
