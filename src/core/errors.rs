use crate::core::cache::CacheError;
use crate::core::provider::ProviderId;

/*-------------------------------------------------------------------------------------------------
  Errors and Results
-------------------------------------------------------------------------------------------------*/

/// Error type used throughout the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A provider's ranges could not be retrieved or parsed.
    #[error("{provider} fetch failed: {message}")]
    Fetch {
        provider: ProviderId,
        message: String,
    },

    /// The cache was unreachable or returned a malformed entry.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The registry was used in a way its configuration does not allow.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Caller-supplied text could not be parsed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A bounded I/O step did not complete in time.
    #[error("{provider} {step} timed out after {millis} ms")]
    Timeout {
        provider: ProviderId,
        step: &'static str,
        millis: u64,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Prefix(#[from] ipnetwork::IpNetworkError),
}

impl Error {
    pub(crate) fn fetch(provider: ProviderId, message: impl std::fmt::Display) -> Self {
        Error::Fetch {
            provider,
            message: message.to_string(),
        }
    }
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
