//! # Cache Engine
//!
//! Entry point of the crate. One engine is constructed per process and shared
//! by reference; it owns the cache session and every allocated handle.
//!
//! A batch pass moves through `Idle → Building → Fetching → Completing → Done`.
//! All groups are fetched concurrently and each assigns its handle as soon as
//! it settles. The pass waits for every group, reports the first failure, and
//! tells every resource list it is done whatever the outcome.

use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::cache::{
    BatchState, CacheGroup, CacheSession, FallbackFetcher, HandleRegistry, LifecycleManager,
    ObjectUrl, Resolution, build_groups,
};
use crate::config::EngineConfig;
use crate::error::CacheError;
use crate::fetch::{FetchPrimitive, HttpFetcher, HttpImageProbe, ImageProbe, create_client};
use crate::resource::{CacheRequest, ResourceSet};

pub struct CacheEngine {
    orchestrator: FallbackFetcher,
    lifecycle: LifecycleManager,
    registry: Arc<HandleRegistry>,
    session: Mutex<CacheSession>,
}

impl CacheEngine {
    /// Create an engine over the given collaborators with default settings
    pub fn new(fetcher: Arc<dyn FetchPrimitive>, probe: Arc<dyn ImageProbe>) -> Self {
        Self::with_config(fetcher, probe, &EngineConfig::default())
    }

    pub fn with_config(
        fetcher: Arc<dyn FetchPrimitive>,
        probe: Arc<dyn ImageProbe>,
        config: &EngineConfig,
    ) -> Self {
        let registry = Arc::new(HandleRegistry::new(config.handle_origin.clone()));
        Self {
            orchestrator: FallbackFetcher::new(fetcher, probe, registry.clone()),
            lifecycle: LifecycleManager::new(registry.clone()),
            registry,
            session: Mutex::new(CacheSession::default()),
        }
    }

    /// Create an engine fetching over HTTP, sharing one client between the
    /// fetcher and the image probe
    pub fn from_config(config: EngineConfig) -> Result<Self, CacheError> {
        let client = create_client(&config.fetcher)?;
        let probe = HttpImageProbe::with_client(client.clone(), &config.fetcher)?;
        let fetcher = HttpFetcher::with_client(client, config.fetcher.clone())?;
        Ok(Self::with_config(
            Arc::new(fetcher),
            Arc::new(probe),
            &config,
        ))
    }

    /// Cache every resource of `lists`.
    ///
    /// Each list is notified once the pass is over, also when it failed. The
    /// first group failure is returned as `BatchFailure`; later ones are only
    /// logged.
    pub async fn cache_all_resources(&self, lists: &[&dyn ResourceSet]) -> Result<(), CacheError> {
        info!(lists = lists.len(), "Caching resources");

        let groups = {
            let mut session = self.session.lock();
            session.set_state(BatchState::Building);
            let groups = session.replace_groups(build_groups(lists));
            session.set_state(BatchState::Fetching);
            groups
        };

        let mut tasks: FuturesUnordered<_> = groups
            .iter()
            .map(|group| self.cache_group(group.clone()))
            .collect();

        let mut first_failure = None;
        let mut suppressed = 0;
        while let Some(result) = tasks.next().await {
            if let Err(e) = result {
                if first_failure.is_none() {
                    first_failure = Some(e);
                } else {
                    suppressed += 1;
                    warn!(error = %e, "Additional group failure suppressed");
                }
            }
        }

        self.session.lock().set_state(BatchState::Completing);
        for list in lists {
            list.notify_cache_done();
        }

        let success = first_failure.is_none();
        self.session.lock().set_state(BatchState::Done { success });
        info!(
            groups = groups.len(),
            success,
            suppressed,
            "Resource caching finished"
        );

        match first_failure {
            Some(e) => Err(CacheError::BatchFailure {
                source: Box::new(e),
                suppressed,
            }),
            None => Ok(()),
        }
    }

    async fn cache_group(&self, group: Arc<CacheGroup>) -> Result<(), CacheError> {
        let keys = group.member_keys();
        let resolution = self
            .orchestrator
            .resolve(group.representative().primary_uri(), group.origin_key(), &keys)
            .await?;
        self.lifecycle.assign(&group, &resolution);
        Ok(())
    }

    /// Cache a single location outside any resource list.
    ///
    /// The caller owns the result; a returned handle stays live until the
    /// next [`revoke_cache`](Self::revoke_cache).
    pub async fn cache_resource(&self, request: CacheRequest) -> Result<Resolution, CacheError> {
        let keys = request.diagnostic_keys();
        self.orchestrator
            .resolve(&request.uri, request.origin(), &keys)
            .await
    }

    /// Release every outstanding handle and clear the session
    pub fn revoke_cache(&self) {
        let groups = self.session.lock().clear();
        self.lifecycle.revoke_all(&groups);

        let orphans = self.registry.revoke_all();
        debug!(groups = groups.len(), orphans, "Cache revoked");
    }

    /// Payload behind a live handle
    pub fn handle_bytes(&self, handle: &ObjectUrl) -> Option<Bytes> {
        self.registry.resolve(handle)
    }

    /// Number of groups in the current session
    pub fn group_count(&self) -> usize {
        self.session.lock().groups().len()
    }

    /// Number of live handles
    pub fn live_handles(&self) -> usize {
        self.registry.len()
    }

    pub fn state(&self) -> BatchState {
        self.session.lock().state()
    }
}
