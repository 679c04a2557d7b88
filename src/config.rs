use url::Url;

use crate::{Error, FlipperClient, Result};

/// Environment variable holding the API key used when none is set explicitly.
pub const API_KEY_ENV_VAR: &str = "FLIP_API_KEY";

/// Environment variable overriding [`ClientConfig::DEFAULT_BASE_URL`].
pub const BASE_URL_ENV_VAR: &str = "FLIP_API_BASE_URL";

/// Configuration for [`FlipperClient`].
///
/// Values not set explicitly are taken from the environment when the client is built.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    api_key: Option<String>,
    base_url: Option<String>,
    cache: bool,
    defaults_fallback: bool,
    http_client: Option<reqwest::Client>,
}

/// Configuration with every value resolved. Held by the client for its whole lifetime.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedConfig {
    pub api_key: String,
    pub base_url: String,
    pub cache: bool,
    pub defaults_fallback: bool,
    pub http_client: reqwest::Client,
}

impl ClientConfig {
    /// Default base URL for API calls.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.feature-flipper.com";

    /// Create a configuration that reads the API key from `FLIP_API_KEY`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration using the specified API key.
    ///
    /// ```
    /// # use flipper::ClientConfig;
    /// ClientConfig::from_api_key("api-key");
    /// ```
    pub fn from_api_key(api_key: impl Into<String>) -> Self {
        ClientConfig {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Set the API key. An empty key is treated as unset.
    pub fn api_key(&mut self, api_key: impl Into<String>) -> &mut Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Override base URL for API calls. Clients should use the default setting in most cases.
    pub fn base_url(&mut self, base_url: impl Into<String>) -> &mut Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Keep the last loaded tenant's flippers in memory and serve lookups for that tenant from
    /// it. Disabled by default.
    pub fn cache(&mut self, cache: bool) -> &mut Self {
        self.cache = cache;
        self
    }

    /// Ask the server to substitute default values for flippers that have no tenant-specific
    /// value. Disabled by default.
    pub fn defaults_fallback(&mut self, defaults_fallback: bool) -> &mut Self {
        self.defaults_fallback = defaults_fallback;
        self
    }

    /// Use a preconfigured HTTP client (e.g. with timeouts or a proxy).
    pub fn http_client(&mut self, http_client: reqwest::Client) -> &mut Self {
        self.http_client = Some(http_client);
        self
    }

    /// Create a new [`FlipperClient`] using the specified configuration.
    ///
    /// Fails if no API key is set and `FLIP_API_KEY` is empty or missing, or if the base URL
    /// is not a valid URL. Does not perform any network requests.
    ///
    /// ```
    /// # use flipper::{ClientConfig, FlipperClient};
    /// let client: FlipperClient = ClientConfig::from_api_key("api-key")
    ///     .cache(true)
    ///     .to_client()
    ///     .unwrap();
    /// ```
    pub fn to_client(&self) -> Result<FlipperClient> {
        let config = self.resolve_with(|name| std::env::var(name).ok())?;
        Ok(FlipperClient::new(config))
    }

    pub(crate) fn resolve_with(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<ResolvedConfig> {
        let api_key = non_empty(self.api_key.clone())
            .or_else(|| non_empty(env(API_KEY_ENV_VAR)))
            .ok_or(Error::MissingApiKey)?;

        let base_url = non_empty(self.base_url.clone())
            .or_else(|| non_empty(env(BASE_URL_ENV_VAR)))
            .unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_owned());
        let base_url = base_url.trim_end_matches('/').to_owned();
        Url::parse(&base_url).map_err(Error::InvalidBaseUrl)?;

        Ok(ResolvedConfig {
            api_key,
            base_url,
            cache: self.cache,
            defaults_fallback: self.defaults_fallback,
            http_client: self.http_client.clone().unwrap_or_default(),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
