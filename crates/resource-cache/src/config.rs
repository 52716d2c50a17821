use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 11) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Mobile Safari/537.36";

/// Host the native shell serves bundled files from once `file:///` is rewritten
pub const DEFAULT_LOCAL_ASSET_HOST: &str = "http://file-assets/";

/// Origin embedded in allocated object URLs (`blob:<origin>/<uuid>`)
pub const DEFAULT_HANDLE_ORIGIN: &str = "null";

/// Configurable options for the HTTP fetch primitive
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Overall timeout for a single HTTP request
    pub timeout: Duration,

    /// Connection timeout (time to establish initial connection)
    pub connect_timeout: Duration,

    /// Whether to follow redirects
    pub follow_redirects: bool,

    /// User agent string
    pub user_agent: String,

    /// Custom HTTP headers for requests
    pub headers: HeaderMap,

    /// Maximum retries on transport errors and 5xx responses
    pub max_retries: u32,

    /// Base for exponential backoff between retries
    pub retry_delay_base: Duration,

    /// Document location relative paths (`./x`, `/x`) are resolved against
    pub base_url: Option<String>,

    /// Replacement for the `file:///` prefix, `None` keeps file URIs untouched
    pub local_asset_host: Option<String>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            follow_redirects: true,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers: FetcherConfig::get_default_headers(),
            max_retries: 2,
            retry_delay_base: Duration::from_millis(250),
            base_url: None,
            local_asset_host: Some(DEFAULT_LOCAL_ASSET_HOST.to_owned()),
        }
    }
}

impl FetcherConfig {
    pub fn get_default_headers() -> HeaderMap {
        let mut default_headers = HeaderMap::new();

        default_headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("*/*"),
        );

        default_headers.insert(
            reqwest::header::CONNECTION,
            HeaderValue::from_static("keep-alive"),
        );
        default_headers
    }
}

/// Configuration for the cache engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Origin part of allocated object URLs
    pub handle_origin: String,

    /// Options for the HTTP fetch primitive and image probe
    pub fetcher: FetcherConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            handle_origin: DEFAULT_HANDLE_ORIGIN.to_owned(),
            fetcher: FetcherConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn builder() -> crate::builder::EngineConfigBuilder {
        crate::builder::EngineConfigBuilder::new()
    }
}
