//! # Cache Handle Lifecycle
//!
//! Assigns a group's resolved handle to all of its members and releases
//! handles on revoke. A group owns at most one live handle at a time.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::orchestrator::{Resolution, ResolvedValue};
use crate::cache::{CacheGroup, CacheGroups, HandleRegistry};

pub struct LifecycleManager {
    registry: Arc<HandleRegistry>,
    // Groups that received a handle since the last revoke, including ones
    // assigned after their session was cleared
    assigned: Mutex<Vec<Arc<CacheGroup>>>,
}

impl LifecycleManager {
    pub fn new(registry: Arc<HandleRegistry>) -> Self {
        Self {
            registry,
            assigned: Mutex::new(Vec::new()),
        }
    }

    /// Share the resolved handle with every member of `group`.
    ///
    /// The origin sentinel assigns nothing: members keep rendering from the
    /// origin URI, and a handle left over from an earlier pass is released.
    /// Returns the number of members that received the handle.
    pub fn assign(&self, group: &Arc<CacheGroup>, resolution: &Resolution) -> usize {
        let handle = match &resolution.value {
            ResolvedValue::Handle(handle) => handle,
            ResolvedValue::Origin(_) => {
                debug!(origin = %group.origin_key(), "Group resolved to its origin URI, no handle assigned");
                self.revoke_group(group);
                self.track(group, false);
                return 0;
            }
        };

        for member in group.members() {
            if let Some(previous) = member.set_cache_handle(handle.clone()) {
                if previous != *handle && self.registry.revoke(&previous) {
                    debug!(key = %member.key(), url = %previous, "Released stale handle");
                }
            }
        }
        self.track(group, true);

        debug!(
            origin = %group.origin_key(),
            url = %handle,
            members = group.members().len(),
            "Handle assigned to group"
        );
        group.members().len()
    }

    /// Record `group` for the next revoke, dropping entries it supersedes
    fn track(&self, group: &Arc<CacheGroup>, holds_handle: bool) {
        let mut assigned = self.assigned.lock();
        // Keep only groups with a handle on a member `group` does not cover
        assigned.retain(|tracked| {
            tracked.members().iter().any(|m| {
                m.has_cache_handle() && !group.members().iter().any(|n| Arc::ptr_eq(m, n))
            })
        });
        if holds_handle {
            assigned.push(group.clone());
        }
    }

    /// Number of groups held for the next revoke
    pub fn tracked(&self) -> usize {
        self.assigned.lock().len()
    }

    /// Release every group's handle and reset all members.
    ///
    /// Missing handles are skipped; this never fails.
    pub fn revoke_all(&self, groups: &CacheGroups) {
        let assigned = std::mem::take(&mut *self.assigned.lock());

        for group in groups.iter().chain(assigned.iter()) {
            self.revoke_group(group);
        }
    }

    fn revoke_group(&self, group: &CacheGroup) {
        let representative = group.representative();
        match representative.unset_cache_handle() {
            Some(handle) => {
                self.registry.revoke(&handle);
            }
            None => debug!(key = %representative.key(), "No handle to release"),
        }

        for member in group.members() {
            if let Some(handle) = member.unset_cache_handle() {
                // Members normally share the representative's handle
                self.registry.revoke(&handle);
            }
        }
    }
}
