use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to one of the upstream collaborators.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned HTTP {0}")]
    Status(StatusCode),

    #[error("malformed payload: {0}")]
    Payload(String),
}

/// Every way a single request can degrade. None of these reach the caller;
/// each is absorbed at its own layer through [`OrEmpty`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("search unavailable: {0}")]
    SearchUnavailable(#[source] FetchError),

    #[error("fetch unavailable for {url}: {source}")]
    FetchUnavailable {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("markup conversion failed: {0}")]
    ConversionFailure(String),

    #[error("token truncation failed: {0}")]
    TruncationFailure(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Turns a failed step into its empty value, logging what was swallowed.
pub trait OrEmpty<T> {
    fn or_empty(self) -> T;
}

impl<T: Default> OrEmpty<T> for Result<T> {
    fn or_empty(self) -> T {
        match self {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "degrading to empty value");
                T::default()
            }
        }
    }
}
