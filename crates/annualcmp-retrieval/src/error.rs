use thiserror::Error;

/// Errors from the embedding and answer services and from index builds.
///
/// Service errors are mostly consumed inside this crate and turned into mock
/// vectors or placeholder answers; callers see them only from index builds.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The service answered 2xx but the payload held nothing usable.
    #[error("empty response from {0}")]
    EmptyResponse(String),

    #[error("no chunks to index")]
    EmptyIndex,

    #[error("embedding for {chunk_id} has {got} dimensions, expected {expected}")]
    DimensionMismatch {
        expected: usize,
        got: usize,
        chunk_id: String,
    },
}
