use std::fmt;

/// Which step of the fallback strategy produced a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchTier {
    /// Fetch of the representative's primary URI
    Primary,
    /// Fetch of the group's origin URI
    Origin,
    /// Image-load probe of the origin URI
    Probe,
}

impl fmt::Display for FetchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchTier::Primary => f.write_str("primary"),
            FetchTier::Origin => f.write_str("origin"),
            FetchTier::Probe => f.write_str("probe"),
        }
    }
}

/// Failure reported by a fetch primitive
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("Server returned status code {status} for {uri}")]
    Status { uri: String, status: u16 },

    #[error("Network error for {uri}: {message}")]
    Network { uri: String, message: String },

    #[error("Failed to read payload from {uri}: {message}")]
    Body { uri: String, message: String },

    #[error("Invalid URL {uri}: {message}")]
    Url { uri: String, message: String },
}

impl FetchError {
    /// HTTP-like status code, when the failure carried one
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure reported by an image probe
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProbeError {
    #[error("Image probe for {uri} failed: {message}")]
    Unreachable { uri: String, message: String },

    #[error("Resource at {uri} is not an image (content type: {content_type})")]
    NotAnImage { uri: String, content_type: String },
}

// Custom error type for caching operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    #[error("Empty {tier} location for resources {keys:?}")]
    InvalidUri { tier: FetchTier, keys: Vec<String> },

    #[error("Fetching {uri} ({tier}) failed for resources {keys:?}: {source}")]
    FetchFailed {
        tier: FetchTier,
        uri: String,
        keys: Vec<String>,
        #[source]
        source: FetchError,
    },

    #[error("Image probe of {uri} failed for resources {keys:?}: {source}")]
    ProbeFailed {
        uri: String,
        keys: Vec<String>,
        #[source]
        source: ProbeError,
    },

    #[error("Caching group {origin_uri:?} failed for resources {keys:?}: {source}")]
    GroupFailure {
        origin_uri: String,
        keys: Vec<String>,
        #[source]
        source: Box<CacheError>,
    },

    #[error("Resource caching failed ({suppressed} more group failures suppressed): {source}")]
    BatchFailure {
        #[source]
        source: Box<CacheError>,
        suppressed: usize,
    },

    #[error("HTTP client setup failed: {0}")]
    Client(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl CacheError {
    /// Resource keys the failure refers to
    pub fn keys(&self) -> &[String] {
        match self {
            CacheError::InvalidUri { keys, .. }
            | CacheError::FetchFailed { keys, .. }
            | CacheError::ProbeFailed { keys, .. }
            | CacheError::GroupFailure { keys, .. } => keys,
            CacheError::BatchFailure { source, .. } => source.keys(),
            CacheError::Client(_) | CacheError::Config(_) => &[],
        }
    }

    /// Origin URI of the failed group, for group and batch failures
    pub fn origin_uri(&self) -> Option<&str> {
        match self {
            CacheError::GroupFailure { origin_uri, .. } => Some(origin_uri),
            CacheError::BatchFailure { source, .. } => source.origin_uri(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_failure_exposes_group_context() {
        let group = CacheError::GroupFailure {
            origin_uri: "https://cdn.example.com/b.png".to_string(),
            keys: vec!["b".to_string(), "b2".to_string()],
            source: Box::new(CacheError::ProbeFailed {
                uri: "https://cdn.example.com/b.png".to_string(),
                keys: vec!["b".to_string(), "b2".to_string()],
                source: ProbeError::Unreachable {
                    uri: "https://cdn.example.com/b.png".to_string(),
                    message: "connection refused".to_string(),
                },
            }),
        };
        let batch = CacheError::BatchFailure {
            source: Box::new(group),
            suppressed: 0,
        };

        assert_eq!(batch.keys(), ["b".to_string(), "b2".to_string()]);
        assert_eq!(batch.origin_uri(), Some("https://cdn.example.com/b.png"));
        assert!(batch.to_string().contains("connection refused"));
    }

    #[test]
    fn test_fetch_error_status() {
        let err = FetchError::Status {
            uri: "https://cdn.example.com/a".to_string(),
            status: 404,
        };
        assert_eq!(err.status(), Some(404));

        let err = FetchError::Network {
            uri: "https://cdn.example.com/a".to_string(),
            message: "timed out".to_string(),
        };
        assert_eq!(err.status(), None);
    }
}
