use std::sync::Arc;

use crate::cache::CacheGroups;

/// Progress of the most recent batch caching pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchState {
    #[default]
    Idle,
    Building,
    Fetching,
    Completing,
    Done { success: bool },
}

/// Engine-owned state between a caching pass and the matching revoke
#[derive(Debug, Default)]
pub struct CacheSession {
    groups: Arc<CacheGroups>,
    state: BatchState,
}

impl CacheSession {
    pub fn groups(&self) -> &Arc<CacheGroups> {
        &self.groups
    }

    pub fn replace_groups(&mut self, groups: CacheGroups) -> Arc<CacheGroups> {
        self.groups = Arc::new(groups);
        self.groups.clone()
    }

    /// Drop all groups, returning them for cleanup
    pub fn clear(&mut self) -> Arc<CacheGroups> {
        self.state = BatchState::Idle;
        std::mem::take(&mut self.groups)
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn set_state(&mut self, state: BatchState) {
        self.state = state;
    }
}
