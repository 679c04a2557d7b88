//! An HTTP client that fetches flippers from the server.
use reqwest::Url;

use crate::{
    config::ResolvedConfig,
    error::FetchError,
    flipper::{FlipperData, FlippersResponse},
};

const FLIPPERS_ENDPOINT: &str = "/flippers";

const API_KEY_HEADER: &str = "x-api-key";

/// Fetches flippers for a tenant. Makes a single attempt per call, without retries.
pub(crate) struct FlipperFetcher {
    // Client holds a connection pool internally, so we're reusing the client between requests.
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    defaults_fallback: bool,
}

impl FlipperFetcher {
    pub fn new(config: ResolvedConfig) -> FlipperFetcher {
        FlipperFetcher {
            client: config.http_client,
            base_url: config.base_url,
            api_key: config.api_key,
            defaults_fallback: config.defaults_fallback,
        }
    }

    /// `{base_url}/flippers/{tenant_id}?defaultsFallback={true|false}` with the tenant id
    /// percent-encoded as a single path segment.
    fn flippers_url(&self, tenant_id: &str) -> Result<Url, FetchError> {
        Url::parse_with_params(
            &format!(
                "{}{}/{}",
                self.base_url,
                FLIPPERS_ENDPOINT,
                urlencoding::encode(tenant_id)
            ),
            &[("defaultsFallback", self.defaults_fallback.to_string())],
        )
        .map_err(FetchError::InvalidUrl)
    }

    pub async fn fetch_flippers(&self, tenant_id: &str) -> Result<FlipperData, FetchError> {
        let url = self.flippers_url(tenant_id)?;

        log::debug!(target: "flipper", tenant_id; "fetching flippers");
        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus(status));
        }

        let body = response.bytes().await?;
        let response: FlippersResponse = serde_json::from_slice(&body)?;

        log::debug!(target: "flipper", tenant_id, count = response.data.len(); "successfully fetched flippers");

        Ok(response.into())
    }
}
