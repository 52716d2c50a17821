//! # Builder for EngineConfig
//!
//! Fluent construction of [`EngineConfig`] values.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use resource_cache::EngineConfig;
//!
//! let config = EngineConfig::builder()
//!     .with_timeout(Duration::from_secs(15))
//!     .with_max_retries(3)
//!     .with_base_url("https://games.example.com/g/42/index.html")
//!     .with_header("X-Game-Instance", "42")
//!     .build();
//!
//! assert_eq!(config.fetcher.max_retries, 3);
//! ```

use std::time::Duration;

use reqwest::header::HeaderValue;

use crate::EngineConfig;

/// Builder for creating EngineConfig instances with a fluent API
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    /// Internal config being built
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Set the origin embedded in allocated object URLs
    pub fn with_handle_origin(mut self, origin: impl Into<String>) -> Self {
        self.config.handle_origin = origin.into();
        self
    }

    /// Set the overall timeout for a single HTTP request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.fetcher.timeout = timeout;
        self
    }

    /// Set the connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.fetcher.connect_timeout = timeout;
        self
    }

    /// Set whether to follow redirects
    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.config.fetcher.follow_redirects = follow;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.fetcher.user_agent = user_agent.into();
        self
    }

    /// Add a custom HTTP header
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.as_ref().parse::<reqwest::header::HeaderName>(),
            HeaderValue::from_str(value.as_ref()),
        ) {
            self.config.fetcher.headers.insert(name, value);
        }
        self
    }

    /// Set the number of retries on transport errors and 5xx responses
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.config.fetcher.max_retries = retries;
        self
    }

    /// Set the base delay for exponential backoff
    pub fn with_retry_delay_base(mut self, delay: Duration) -> Self {
        self.config.fetcher.retry_delay_base = delay;
        self
    }

    /// Set the document location relative paths are resolved against
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.fetcher.base_url = Some(base_url.into());
        self
    }

    /// Set the host `file:///` URIs are rewritten to, `None` disables rewriting
    pub fn with_local_asset_host(mut self, host: Option<String>) -> Self {
        self.config.fetcher.local_asset_host = host;
        self
    }

    /// Build the final EngineConfig
    pub fn build(self) -> EngineConfig {
        self.config
    }
}
