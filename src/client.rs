use std::sync::Arc;

use crate::{
    config::ResolvedConfig, fetcher::FlipperFetcher, flipper::FlipperData,
    flipper_store::FlipperStore, Result,
};

/// A client for the Flipper API.
///
/// In order to create a client instance, first create [`ClientConfig`](crate::ClientConfig).
///
/// When caching is enabled, the client keeps flippers of the most recently loaded tenant only.
/// Interleaved lookups for different tenants evict each other and each one triggers a new
/// request; the last completed load wins.
///
/// # Examples
/// ```no_run
/// # async fn run() -> flipper::Result<()> {
/// use flipper::ClientConfig;
///
/// let client = ClientConfig::from_api_key("api-key").cache(true).to_client()?;
/// if client.is_enabled("new-checkout", "acme").await {
///     // ...
/// }
/// # Ok(())
/// # }
/// ```
pub struct FlipperClient {
    fetcher: FlipperFetcher,
    store: FlipperStore,
    cache: bool,
}

impl FlipperClient {
    pub(crate) fn new(config: ResolvedConfig) -> Self {
        FlipperClient {
            cache: config.cache,
            fetcher: FlipperFetcher::new(config),
            store: FlipperStore::new(),
        }
    }

    /// Fetch all flippers for `tenant_id`.
    ///
    /// Always issues a request. If caching is enabled, a successful response replaces the cached
    /// flippers. On failure, returns [`Error::Api`](crate::Error::Api) and leaves the cache
    /// untouched.
    pub async fn load_flipper_data(&self, tenant_id: &str) -> Result<Arc<FlipperData>> {
        let data = self
            .fetcher
            .fetch_flippers(tenant_id)
            .await
            .inspect_err(|err| {
                log::warn!(target: "flipper", tenant_id; "failed to fetch flippers: {:?}", err);
            })?;

        let data = Arc::new(data);
        if self.cache {
            self.store.set(tenant_id, Arc::clone(&data));
        }

        Ok(data)
    }

    /// Returns the value of a boolean flipper.
    ///
    /// Returns `false` if the flipper does not exist or flippers could not be fetched.
    pub async fn is_enabled(&self, flipper_name: &str, tenant_id: &str) -> bool {
        if let Some(data) = self.cached(tenant_id, |data| !data.boolean_flippers().is_empty()) {
            return data.is_enabled(flipper_name);
        }

        match self.load_flipper_data(tenant_id).await {
            Ok(data) => data.is_enabled(flipper_name),
            Err(_) => false,
        }
    }

    /// Returns the values of a string-list flipper.
    ///
    /// Returns an empty list if the flipper does not exist or flippers could not be fetched.
    pub async fn get_string_list(&self, flipper_name: &str, tenant_id: &str) -> Vec<String> {
        if let Some(data) =
            self.cached(tenant_id, |data| !data.string_list_flippers().is_empty())
        {
            return data.get_string_list(flipper_name).to_vec();
        }

        match self.load_flipper_data(tenant_id).await {
            Ok(data) => data.get_string_list(flipper_name).to_vec(),
            Err(_) => Vec::new(),
        }
    }

    /// Tenant whose flippers are cached. Always `None` when caching is disabled.
    pub fn cached_tenant_id(&self) -> Option<String> {
        self.store.tenant_id()
    }

    /// Flippers from the last cached load. Always `None` when caching is disabled.
    pub fn last_flipper_data(&self) -> Option<Arc<FlipperData>> {
        self.store.last_flipper_data()
    }

    /// Cached flippers for `tenant_id`, provided caching is enabled and `has_entries` holds for
    /// them. An empty table of the requested kind counts as a miss.
    fn cached(
        &self,
        tenant_id: &str,
        has_entries: impl FnOnce(&FlipperData) -> bool,
    ) -> Option<Arc<FlipperData>> {
        if !self.cache {
            return None;
        }

        let hit = self.store.get(tenant_id).filter(|data| has_entries(data));
        log::debug!(target: "flipper", tenant_id, hit = hit.is_some(); "checked flipper cache");
        hit
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use httpmock::prelude::*;
    use serde_json::json;

    use crate::{error::FetchError, flipper::TryParse, ClientConfig, Error, FlipperClient};

    fn client(base_url: &str, configure: impl FnOnce(&mut ClientConfig)) -> FlipperClient {
        let mut config = ClientConfig::from_api_key("test-api-key");
        config
            .base_url(base_url)
            .http_client(reqwest::Client::builder().no_proxy().build().unwrap());
        configure(&mut config);
        config.to_client().unwrap()
    }

    fn flippers() -> serde_json::Value {
        json!({
            "data": [
                { "name": "feature1", "tenantId": "tenant1", "type": "boolean", "enabled": true, "isDefault": false },
                { "name": "feature2", "tenantId": "tenant1", "type": "stringList", "values": ["a", "b"], "isDefault": false }
            ]
        })
    }

    async fn mock_flippers<'a>(
        server: &'a MockServer,
        tenant_id: &str,
        body: serde_json::Value,
    ) -> httpmock::Mock<'a> {
        let path = format!("/flippers/{tenant_id}");
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path(path)
                    .query_param("defaultsFallback", "false")
                    .header("x-api-key", "test-api-key");
                then.status(200).json_body(body);
            })
            .await
    }

    #[tokio::test]
    async fn loads_flipper_data() {
        let server = MockServer::start_async().await;
        let mock = mock_flippers(&server, "tenant1", flippers()).await;

        let data = client(&server.base_url(), |_| {})
            .load_flipper_data("tenant1")
            .await
            .unwrap();

        let raw: Vec<serde_json::Value> = data
            .flipper_data()
            .iter()
            .map(|entry| serde_json::to_value(entry).unwrap())
            .collect();
        assert_eq!(json!(raw), flippers()["data"]);
        assert!(data.boolean_flippers()["feature1"].enabled);
        assert_eq!(data.string_list_flippers()["feature2"].values, vec!["a", "b"]);
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn keeps_unrecognized_entries_in_raw_list() {
        let server = MockServer::start_async().await;
        mock_flippers(
            &server,
            "tenant1",
            json!({
                "data": [
                    { "name": "feature1", "tenantId": "tenant1", "type": "boolean", "enabled": true, "isDefault": false },
                    { "name": "feature9", "tenantId": "tenant1", "type": "json", "value": {}, "isDefault": false }
                ]
            }),
        )
        .await;

        let data = client(&server.base_url(), |_| {})
            .load_flipper_data("tenant1")
            .await
            .unwrap();

        assert_eq!(data.flipper_data().len(), 2);
        assert!(matches!(data.flipper_data()[1], TryParse::ParseFailed(_)));
        assert_eq!(data.boolean_flippers().len(), 1);
        assert!(data.string_list_flippers().is_empty());
    }

    #[tokio::test]
    async fn handles_network_errors() {
        // Nothing listens on port 1.
        let client = client("http://127.0.0.1:1", |_| {});

        let err = client.load_flipper_data("tenant1").await.unwrap_err();

        assert_eq!(err.to_string(), "Failed to fetch flippers");
        assert!(err.is_api_error());
        assert!(matches!(err, Error::Api(FetchError::Network(_))));
        assert!(err.source().is_some());

        assert!(!client.is_enabled("feature1", "tenant1").await);
        assert!(client.get_string_list("feature2", "tenant1").await.is_empty());
    }

    #[tokio::test]
    async fn handles_non_ok_responses() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/flippers/tenant1");
                then.status(404).json_body(json!({ "error": "Not found" }));
            })
            .await;
        let client = client(&server.base_url(), |_| {});

        let err = client.load_flipper_data("tenant1").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch flippers");

        assert!(!client.is_enabled("feature1", "tenant1").await);
        assert!(client.get_string_list("feature2", "tenant1").await.is_empty());
        mock.assert_hits_async(3).await;
    }

    #[tokio::test]
    async fn handles_malformed_responses() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/flippers/tenant1");
                then.status(200).json_body(json!({ "flippers": [] }));
            })
            .await;
        let client = client(&server.base_url(), |config| {
            config.cache(true);
        });

        let err = client.load_flipper_data("tenant1").await.unwrap_err();

        assert!(matches!(err, Error::Api(FetchError::MalformedResponse(_))));
        assert!(client.cached_tenant_id().is_none());
    }

    #[tokio::test]
    async fn checks_boolean_flipper() {
        let server = MockServer::start_async().await;
        mock_flippers(&server, "tenant1", flippers()).await;

        let enabled = client(&server.base_url(), |_| {})
            .is_enabled("feature1", "tenant1")
            .await;

        assert!(enabled);
    }

    #[tokio::test]
    async fn returns_false_for_missing_boolean_flipper() {
        let server = MockServer::start_async().await;
        mock_flippers(&server, "tenant1", json!({ "data": [] })).await;

        let enabled = client(&server.base_url(), |_| {})
            .is_enabled("nonexistent", "tenant1")
            .await;

        assert!(!enabled);
    }

    #[tokio::test]
    async fn gets_string_list() {
        let server = MockServer::start_async().await;
        mock_flippers(&server, "tenant1", flippers()).await;

        let values = client(&server.base_url(), |_| {})
            .get_string_list("feature2", "tenant1")
            .await;

        assert_eq!(values, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn returns_empty_list_for_missing_string_list_flipper() {
        let server = MockServer::start_async().await;
        mock_flippers(&server, "tenant1", json!({ "data": [] })).await;

        let values = client(&server.base_url(), |_| {})
            .get_string_list("nonexistent", "tenant1")
            .await;

        assert!(values.is_empty());
    }

    #[tokio::test]
    async fn uses_cache_when_enabled() {
        let server = MockServer::start_async().await;
        let mock = mock_flippers(&server, "tenant1", flippers()).await;
        let client = client(&server.base_url(), |config| {
            config.cache(true);
        });

        client.load_flipper_data("tenant1").await.unwrap();
        let enabled = client.is_enabled("feature1", "tenant1").await;
        let values = client.get_string_list("feature2", "tenant1").await;

        assert!(enabled);
        assert_eq!(values, vec!["a", "b"]);
        assert_eq!(client.cached_tenant_id().as_deref(), Some("tenant1"));
        assert_eq!(client.last_flipper_data().unwrap().flipper_data().len(), 2);
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn accessor_populates_cache() {
        let server = MockServer::start_async().await;
        let mock = mock_flippers(&server, "tenant1", flippers()).await;
        let client = client(&server.base_url(), |config| {
            config.cache(true);
        });

        assert!(client.is_enabled("feature1", "tenant1").await);
        assert!(client.is_enabled("feature1", "tenant1").await);
        assert_eq!(client.get_string_list("feature2", "tenant1").await, vec!["a", "b"]);
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn bypasses_cache_when_disabled() {
        let server = MockServer::start_async().await;
        let mock = mock_flippers(&server, "tenant1", flippers()).await;
        let client = client(&server.base_url(), |config| {
            config.cache(false);
        });

        client.load_flipper_data("tenant1").await.unwrap();
        client.is_enabled("feature1", "tenant1").await;

        assert!(client.cached_tenant_id().is_none());
        assert!(client.last_flipper_data().is_none());
        mock.assert_hits_async(2).await;
    }

    #[tokio::test]
    async fn repeated_loads_are_not_memoized() {
        let server = MockServer::start_async().await;
        let mock = mock_flippers(&server, "tenant1", flippers()).await;
        let client = client(&server.base_url(), |config| {
            config.cache(true);
        });

        client.load_flipper_data("tenant1").await.unwrap();
        client.load_flipper_data("tenant1").await.unwrap();

        mock.assert_hits_async(2).await;
    }

    #[tokio::test]
    async fn cache_is_scoped_to_tenant() {
        let server = MockServer::start_async().await;
        let tenant1 = mock_flippers(&server, "tenant1", flippers()).await;
        let tenant2 = mock_flippers(
            &server,
            "tenant2",
            json!({
                "data": [
                    { "name": "feature1", "tenantId": "tenant2", "type": "boolean", "enabled": false, "isDefault": false }
                ]
            }),
        )
        .await;
        let client = client(&server.base_url(), |config| {
            config.cache(true);
        });

        assert!(client.is_enabled("feature1", "tenant1").await);
        assert!(!client.is_enabled("feature1", "tenant2").await);
        assert_eq!(client.cached_tenant_id().as_deref(), Some("tenant2"));

        // Switching back evicts tenant2 and refetches tenant1.
        assert!(client.is_enabled("feature1", "tenant1").await);

        tenant1.assert_hits_async(2).await;
        tenant2.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn empty_table_counts_as_cache_miss() {
        let server = MockServer::start_async().await;
        let mock = mock_flippers(
            &server,
            "tenant1",
            json!({
                "data": [
                    { "name": "feature2", "tenantId": "tenant1", "type": "stringList", "values": ["a"], "isDefault": false }
                ]
            }),
        )
        .await;
        let client = client(&server.base_url(), |config| {
            config.cache(true);
        });

        client.load_flipper_data("tenant1").await.unwrap();
        assert_eq!(client.get_string_list("feature2", "tenant1").await, vec!["a"]);
        assert!(!client.is_enabled("feature1", "tenant1").await);

        mock.assert_hits_async(2).await;
    }

    #[tokio::test]
    async fn failed_load_keeps_cache() {
        let server = MockServer::start_async().await;
        mock_flippers(&server, "tenant1", flippers()).await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/flippers/tenant2");
                then.status(503);
            })
            .await;
        let client = client(&server.base_url(), |config| {
            config.cache(true);
        });

        client.load_flipper_data("tenant1").await.unwrap();
        assert!(client.load_flipper_data("tenant2").await.is_err());

        assert_eq!(client.cached_tenant_id().as_deref(), Some("tenant1"));
    }

    #[tokio::test]
    async fn includes_defaults_fallback_parameter() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/flippers/tenant1")
                    .query_param("defaultsFallback", "true");
                then.status(200).json_body(json!({ "data": [] }));
            })
            .await;

        client(&server.base_url(), |config| {
            config.defaults_fallback(true);
        })
        .load_flipper_data("tenant1")
        .await
        .unwrap();

        mock.assert_hits_async(1).await;
    }
}
