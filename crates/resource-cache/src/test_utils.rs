use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::error::{FetchError, ProbeError};
use crate::fetch::{FetchPrimitive, ImageProbe};

#[inline]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Fetch primitive answering from a fixed table. Unknown URIs fail with 404.
#[derive(Default)]
pub struct StubFetcher {
    responses: HashMap<String, Bytes>,
    delays: HashMap<String, Duration>,
    success_limits: HashMap<String, usize>,
    calls: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, uri: &str, body: &'static [u8]) -> Self {
        self.responses.insert(uri.to_owned(), Bytes::from_static(body));
        self
    }

    pub fn with_delay(mut self, uri: &str, delay: Duration) -> Self {
        self.delays.insert(uri.to_owned(), delay);
        self
    }

    /// Answer `uri` successfully `times` times, then with 503
    pub fn with_success_limit(mut self, uri: &str, times: usize) -> Self {
        self.success_limits.insert(uri.to_owned(), times);
        self
    }

    /// Every URI fetched so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, uri: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.as_str() == uri).count()
    }
}

#[async_trait]
impl FetchPrimitive for StubFetcher {
    async fn fetch(&self, uri: &str) -> Result<Bytes, FetchError> {
        let attempt = {
            let mut calls = self.calls.lock();
            calls.push(uri.to_owned());
            calls.iter().filter(|c| c.as_str() == uri).count()
        };
        if let Some(delay) = self.delays.get(uri) {
            tokio::time::sleep(*delay).await;
        }
        if self
            .success_limits
            .get(uri)
            .is_some_and(|&limit| attempt > limit)
        {
            return Err(FetchError::Status {
                uri: uri.to_owned(),
                status: 503,
            });
        }
        self.responses
            .get(uri)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                uri: uri.to_owned(),
                status: 404,
            })
    }
}

/// Image probe succeeding only for listed URIs
#[derive(Default)]
pub struct StubProbe {
    reachable: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl StubProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reachable(mut self, uri: &str) -> Self {
        self.reachable.insert(uri.to_owned());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ImageProbe for StubProbe {
    async fn probe(&self, uri: &str) -> Result<(), ProbeError> {
        self.calls.lock().push(uri.to_owned());
        if self.reachable.contains(uri) {
            Ok(())
        } else {
            Err(ProbeError::Unreachable {
                uri: uri.to_owned(),
                message: "image failed to load".to_owned(),
            })
        }
    }
}
