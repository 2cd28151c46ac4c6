/// Failure modes of a scrape.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The caller's query parameters are unusable.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A required upstream query failed.
    #[error(transparent)]
    Upstream(#[from] client::Error),

    /// Prometheus metric construction or encoding failed.
    #[error(transparent)]
    Metrics(#[from] prometheus::Error),
}

/// The crate result type.
pub type Result<T> = std::result::Result<T, Error>;
