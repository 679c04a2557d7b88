use std::sync::Arc;

use reqwest::StatusCode;
use thiserror::Error;

/// A result type for Flipper client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the Flipper client.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// Neither an explicit API key nor the environment provided one.
    #[error("FLIP_API_KEY is not set, and no API key was provided")]
    MissingApiKey,

    /// Invalid base URL configuration.
    #[error("invalid base_url configuration")]
    InvalidBaseUrl(#[source] url::ParseError),

    /// Fetching flippers from the server failed.
    ///
    /// The message is always the same. The underlying cause is available through
    /// [`std::error::Error::source`].
    #[error("Failed to fetch flippers")]
    Api(#[source] FetchError),
}

impl Error {
    /// Returns `true` if the error happened while building a client.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Error::MissingApiKey | Error::InvalidBaseUrl(_))
    }

    /// Returns `true` if the error came from a failed call to the Flipper API.
    pub fn is_api_error(&self) -> bool {
        matches!(self, Error::Api(_))
    }
}

/// The reason a request to the Flipper API failed.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum FetchError {
    /// The request could not be completed (connection refused, DNS failure, timeout, etc.).
    #[error(transparent)]
    // reqwest::Error is not clonable, so we're wrapping it in an Arc.
    Network(Arc<reqwest::Error>),

    /// The server answered with a non-2xx status.
    #[error("received non-success response: {0}")]
    UnexpectedStatus(StatusCode),

    /// The response body is not JSON or does not contain a `data` array.
    #[error("failed to parse flippers response body")]
    MalformedResponse(#[source] Arc<serde_json::Error>),

    /// The request URL could not be built from the base URL and tenant id.
    #[error("failed to build request url")]
    InvalidUrl(#[source] url::ParseError),
}

impl From<reqwest::Error> for FetchError {
    fn from(value: reqwest::Error) -> Self {
        FetchError::Network(Arc::new(value.without_url()))
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(value: serde_json::Error) -> Self {
        FetchError::MalformedResponse(Arc::new(value))
    }
}

impl From<FetchError> for Error {
    fn from(value: FetchError) -> Self {
        Error::Api(value)
    }
}
