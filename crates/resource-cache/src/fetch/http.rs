// HTTP fetch primitive and image probe backed by reqwest, with retry logic and
// host-local path resolution.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use rustls::{ClientConfig, crypto::aws_lc_rs};
use rustls_platform_verifier::BuilderVerifierExt;
use tracing::{debug, warn};
use url::Url;

use crate::config::FetcherConfig;
use crate::error::{CacheError, FetchError, ProbeError};
use crate::fetch::{FetchPrimitive, ImageProbe};

/// Create a reqwest Client with the provided configuration
pub fn create_client(config: &FetcherConfig) -> Result<Client, CacheError> {
    let provider = Arc::new(aws_lc_rs::default_provider());

    // Build platform default TLS configuration
    let tls_config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| CacheError::Client(e.to_string()))?
        .with_platform_verifier()
        .map_err(|e| CacheError::Client(e.to_string()))?
        .with_no_client_auth();

    let mut client_builder = Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(config.headers.clone())
        .use_preconfigured_tls(tls_config)
        .redirect(if config.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        });

    if !config.timeout.is_zero() {
        client_builder = client_builder.timeout(config.timeout);
    }

    if !config.connect_timeout.is_zero() {
        client_builder = client_builder.connect_timeout(config.connect_timeout);
    }

    client_builder
        .build()
        .map_err(|e| CacheError::Client(e.to_string()))
}

/// Turn a host-local or relative location into an absolute fetchable URL.
///
/// `./x` and `/x` are joined against `base`. A `file:///` prefix is replaced
/// by `local_asset_host` when one is configured.
pub fn resolve_uri(
    uri: &str,
    base: Option<&Url>,
    local_asset_host: Option<&str>,
) -> Result<Url, FetchError> {
    let url_error = |message: String| FetchError::Url {
        uri: uri.to_owned(),
        message,
    };

    let absolute = if uri.starts_with('/') || uri.starts_with("./") || uri.starts_with("../") {
        let base = base.ok_or_else(|| url_error("relative path without a base URL".to_owned()))?;
        base.join(uri).map_err(|e| url_error(e.to_string()))?
    } else {
        Url::parse(uri).map_err(|e| url_error(e.to_string()))?
    };

    match local_asset_host {
        Some(host) if absolute.scheme() == "file" => {
            let rewritten = absolute.as_str().replacen("file:///", host, 1);
            Url::parse(&rewritten).map_err(|e| url_error(e.to_string()))
        }
        _ => Ok(absolute),
    }
}

fn parse_base(config: &FetcherConfig) -> Result<Option<Url>, CacheError> {
    config
        .base_url
        .as_deref()
        .map(Url::parse)
        .transpose()
        .map_err(|e| CacheError::Config(format!("invalid base URL: {e}")))
}

/// Exponential backoff before retrying after `attempt`, saturating on overflow
fn retry_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2_u32.saturating_pow(attempt.saturating_sub(1)))
}

/// `FetchPrimitive` over HTTP
pub struct HttpFetcher {
    http_client: Client,
    config: Arc<FetcherConfig>,
    base_url: Option<Url>,
}

impl HttpFetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, CacheError> {
        let http_client = create_client(&config)?;
        Self::with_client(http_client, config)
    }

    /// Reuse an existing client
    pub fn with_client(http_client: Client, config: FetcherConfig) -> Result<Self, CacheError> {
        let base_url = parse_base(&config)?;
        Ok(Self {
            http_client,
            config: Arc::new(config),
            base_url,
        })
    }

    fn resolve(&self, uri: &str) -> Result<Url, FetchError> {
        resolve_uri(
            uri,
            self.base_url.as_ref(),
            self.config.local_asset_host.as_deref(),
        )
    }

    /// Fetches with retry logic.
    /// Retries on network errors and server errors (5xx).
    async fn fetch_with_retries(&self, uri: &str, url: &Url) -> Result<Bytes, FetchError> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.http_client.get(url.clone()).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.bytes().await.map_err(|e| FetchError::Body {
                            uri: uri.to_owned(),
                            message: e.to_string(),
                        });
                    }
                    // Client errors are final, server errors retry until exhausted
                    if status.is_client_error() || attempts > self.config.max_retries {
                        return Err(FetchError::Status {
                            uri: uri.to_owned(),
                            status: status.as_u16(),
                        });
                    }
                    debug!(url = %url, status = %status, attempt = attempts, "Retrying after server error");
                }
                Err(e) => {
                    let retryable = e.is_connect() || e.is_timeout() || e.is_request();
                    if !retryable || attempts > self.config.max_retries {
                        return Err(FetchError::Network {
                            uri: uri.to_owned(),
                            message: e.to_string(),
                        });
                    }
                    debug!(url = %url, error = %e, attempt = attempts, "Retrying after network error");
                }
            }

            tokio::time::sleep(retry_delay(self.config.retry_delay_base, attempts)).await;
        }
    }
}

#[async_trait]
impl FetchPrimitive for HttpFetcher {
    async fn fetch(&self, uri: &str) -> Result<Bytes, FetchError> {
        let url = self.resolve(uri)?;
        let data = self.fetch_with_retries(uri, &url).await?;
        debug!("Downloaded {} bytes from {}", data.len(), url);
        Ok(data)
    }
}

/// `ImageProbe` over HTTP: the location must answer with an image
pub struct HttpImageProbe {
    http_client: Client,
    base_url: Option<Url>,
    local_asset_host: Option<String>,
}

impl HttpImageProbe {
    pub fn new(config: &FetcherConfig) -> Result<Self, CacheError> {
        let http_client = create_client(config)?;
        Self::with_client(http_client, config)
    }

    pub fn with_client(http_client: Client, config: &FetcherConfig) -> Result<Self, CacheError> {
        Ok(Self {
            http_client,
            base_url: parse_base(config)?,
            local_asset_host: config.local_asset_host.clone(),
        })
    }
}

#[async_trait]
impl ImageProbe for HttpImageProbe {
    async fn probe(&self, uri: &str) -> Result<(), ProbeError> {
        let probe_failed = |message: String| ProbeError::Unreachable {
            uri: uri.to_owned(),
            message,
        };

        let url = resolve_uri(uri, self.base_url.as_ref(), self.local_asset_host.as_deref())
            .map_err(|e| probe_failed(e.to_string()))?;

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| probe_failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(probe_failed(format!("status {}", response.status())));
        }

        // A missing content type is left to the image decoder, like a browser would
        match response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            Some(content_type) if !content_type.starts_with("image/") => {
                warn!(uri = %uri, content_type = %content_type, "Probed resource is not an image");
                Err(ProbeError::NotAnImage {
                    uri: uri.to_owned(),
                    content_type: content_type.to_owned(),
                })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const NOT_FOUND: &str = "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
    const UNAVAILABLE: &str =
        "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
    const HTML: &str = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok";
    const PNG: &str = "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: 4\r\nConnection: close\r\n\r\nPNG!";
    const UNTYPED: &str = "HTTP/1.1 200 OK\r\nContent-Length: 3\r\nConnection: close\r\n\r\nabc";

    /// Serve `response` to every connection, counting requests
    async fn serve(response: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{addr}/resource"), hits)
    }

    fn test_config() -> FetcherConfig {
        FetcherConfig {
            timeout: Duration::ZERO,
            connect_timeout: Duration::ZERO,
            max_retries: 2,
            retry_delay_base: Duration::from_millis(1),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let (url, hits) = serve(UNTYPED).await;
        let fetcher = HttpFetcher::new(test_config()).unwrap();

        let data = fetcher.fetch(&url).await.unwrap();

        assert_eq!(data, Bytes::from_static(b"abc"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let (url, hits) = serve(NOT_FOUND).await;
        let fetcher = HttpFetcher::new(test_config()).unwrap();

        let err = fetcher.fetch(&url).await.unwrap_err();

        assert_eq!(err.status(), Some(404));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_retried_until_exhausted() {
        let (url, hits) = serve(UNAVAILABLE).await;
        let config = test_config();
        let max_retries = config.max_retries as usize;
        let fetcher = HttpFetcher::new(config).unwrap();

        let err = fetcher.fetch(&url).await.unwrap_err();

        assert_eq!(err.status(), Some(503));
        assert_eq!(hits.load(Ordering::SeqCst), max_retries + 1);
    }

    #[tokio::test]
    async fn test_image_probe_rejects_non_image() {
        let (url, _hits) = serve(HTML).await;
        let probe = HttpImageProbe::new(&test_config()).unwrap();

        let err = probe.probe(&url).await.unwrap_err();
        assert!(
            matches!(&err, ProbeError::NotAnImage { content_type, .. } if content_type == "text/html")
        );
    }

    #[tokio::test]
    async fn test_image_probe_accepts_image() {
        let (url, _hits) = serve(PNG).await;
        let probe = HttpImageProbe::new(&test_config()).unwrap();

        probe.probe(&url).await.unwrap();
    }

    #[tokio::test]
    async fn test_image_probe_accepts_missing_content_type() {
        let (url, _hits) = serve(UNTYPED).await;
        let probe = HttpImageProbe::new(&test_config()).unwrap();

        probe.probe(&url).await.unwrap();
    }

    #[tokio::test]
    async fn test_image_probe_rejects_error_status() {
        let (url, _hits) = serve(NOT_FOUND).await;
        let probe = HttpImageProbe::new(&test_config()).unwrap();

        let err = probe.probe(&url).await.unwrap_err();
        assert!(matches!(err, ProbeError::Unreachable { .. }));
    }

    #[test]
    fn test_retry_delay_backs_off_and_saturates() {
        let base = Duration::from_millis(250);
        assert_eq!(retry_delay(base, 1), base);
        assert_eq!(retry_delay(base, 3), Duration::from_secs(1));
        assert_eq!(
            retry_delay(base, 40),
            Duration::from_millis(250 * u64::from(u32::MAX))
        );
    }

    fn base() -> Url {
        Url::parse("file:///android_asset/games/7/index.html").unwrap()
    }

    #[test]
    fn test_resolve_relative_path_against_base() {
        let url = resolve_uri("./resources_7/boardImage", Some(&base()), None).unwrap();
        assert_eq!(
            url.as_str(),
            "file:///android_asset/games/7/resources_7/boardImage"
        );
    }

    #[test]
    fn test_resolve_rewrites_file_scheme_to_local_host() {
        let url = resolve_uri(
            "./resources_7/boardImage",
            Some(&base()),
            Some("http://file-assets/"),
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "http://file-assets/android_asset/games/7/resources_7/boardImage"
        );
    }

    #[test]
    fn test_resolve_leaves_remote_uri_untouched() {
        let url = resolve_uri(
            "https://cdn.example.com/a.webp?k=1",
            Some(&base()),
            Some("http://file-assets/"),
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/a.webp?k=1");
    }

    #[test]
    fn test_resolve_relative_without_base_fails() {
        let err = resolve_uri("./resources_7/a", None, None).unwrap_err();
        assert!(matches!(err, FetchError::Url { .. }));
    }

    #[test]
    fn test_invalid_base_url_is_a_config_error() {
        let config = FetcherConfig {
            base_url: Some("not a url".to_owned()),
            ..Default::default()
        };
        assert!(matches!(parse_base(&config), Err(CacheError::Config(_))));
    }
}
