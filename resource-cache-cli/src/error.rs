use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] resource_cache::CacheError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} caching step(s) failed")]
    Incomplete(usize),

    #[error("Initialization failed: {0}")]
    Initialization(String),
}
