//! HTTP client for the product catalog API.

use std::fmt::Debug;
use std::str::FromStr;

use reqwest::header::{self, HeaderMap};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::config::CatalogClientConfig;
use crate::error::{CatalogClientError, Operation};
use crate::types::*;

/// A client for the catalog service.
///
/// Every call performs exactly one request, nothing is cached or retried.
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: Url,
    config: CatalogClientConfig,
}

impl Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("catalog_url", &self.config.catalog_url)
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Create a new catalog client from configuration.
    pub fn new(config: CatalogClientConfig) -> Result<Self, CatalogClientError> {
        let base_url = Url::parse(&config.catalog_url).map_err(|e| {
            CatalogClientError::Config(format!(
                "catalog url '{}' is not a valid url: {e}",
                config.catalog_url
            ))
        })?;
        let http = build_http_client(&config)?;

        Ok(Self {
            http,
            base_url,
            config,
        })
    }

    /// Get the configured catalog URL.
    pub fn catalog_url(&self) -> &str {
        &self.config.catalog_url
    }

    /// Url of `path` below the base url, keeping any path prefix of the base.
    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let joined = format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        url.set_path(&joined);
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: Operation,
        path: &str,
        query: &QueryPairs,
    ) -> Result<T, CatalogClientError> {
        let url = self.endpoint(path);
        debug!(%url, ?query, %operation, "sending catalog request");

        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|source| CatalogClientError::Network { operation, source })?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, %operation, "catalog request failed");
            return Err(CatalogClientError::Http { operation, status });
        }

        response.json::<T>().await.map_err(|source| {
            if source.is_decode() {
                CatalogClientError::Decode { operation, source }
            } else {
                CatalogClientError::Network { operation, source }
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Catalog trait
// ---------------------------------------------------------------------------

/// The complete catalog API interface.
///
/// This trait enables alternate implementations:
/// - **HTTP**: REST calls to the catalog service via [`CatalogClient`]
/// - **Mock** (tests): canned responses without HTTP via `MockCatalog`
#[allow(async_fn_in_trait)]
pub trait Catalog {
    /// Every product in the catalog.
    async fn list_products(&self) -> Result<Vec<Product>, CatalogClientError>;

    /// Products discounted by at least `params.min_discount` percent.
    async fn list_hot_deals(
        &self,
        params: &HotDealsParams,
    ) -> Result<Vec<Product>, CatalogClientError>;

    /// Most recently updated products, optionally filtered.
    async fn list_latest(&self, params: &LatestParams)
        -> Result<Vec<Product>, CatalogClientError>;

    /// Unique category names.
    async fn list_categories(&self) -> Result<Vec<String>, CatalogClientError>;

    /// Products matching `query`.
    ///
    /// Callers are expected to filter out trivial (short) queries.
    async fn search_products(&self, query: &str) -> Result<Vec<Product>, CatalogClientError>;

    /// One page of offers along with the total number of matching offers.
    async fn get_offers_page(
        &self,
        params: &OffersParams,
    ) -> Result<OffersPage, CatalogClientError>;

    /// A single product, [CatalogClientError::NotFound] if there is none with `id`.
    async fn get_product_by_id(&self, id: ProductId) -> Result<Product, CatalogClientError>;
}

// ---------------------------------------------------------------------------
// Catalog implementation for CatalogClient
// ---------------------------------------------------------------------------

impl Catalog for CatalogClient {
    #[instrument(skip_all)]
    async fn list_products(&self) -> Result<Vec<Product>, CatalogClientError> {
        let products: Vec<Product> = self
            .get_json(Operation::Products, "products", &QueryPairs::new())
            .await?;
        debug!(n_products = products.len(), "received products");
        Ok(products)
    }

    #[instrument(skip_all, fields(min_discount = params.min_discount, limit = params.limit))]
    async fn list_hot_deals(
        &self,
        params: &HotDealsParams,
    ) -> Result<Vec<Product>, CatalogClientError> {
        self.get_json(
            Operation::HotDeals,
            "products/hot-deals",
            &params.query_pairs(),
        )
        .await
    }

    #[instrument(skip_all, fields(limit = params.limit, filter = ?params.filter))]
    async fn list_latest(
        &self,
        params: &LatestParams,
    ) -> Result<Vec<Product>, CatalogClientError> {
        self.get_json(
            Operation::LatestProducts,
            "products/latest",
            &params.query_pairs(),
        )
        .await
    }

    #[instrument(skip_all)]
    async fn list_categories(&self) -> Result<Vec<String>, CatalogClientError> {
        self.get_json(
            Operation::Categories,
            "products/categories",
            &QueryPairs::new(),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn search_products(&self, query: &str) -> Result<Vec<Product>, CatalogClientError> {
        let products: Vec<Product> = self
            .get_json(Operation::Search, "products/search", &vec![(
                "query",
                query.to_string(),
            )])
            .await?;
        debug!(n_products = products.len(), "received search results");
        Ok(products)
    }

    #[instrument(skip_all, fields(limit = params.limit, offset = params.offset, filter = ?params.filter))]
    async fn get_offers_page(
        &self,
        params: &OffersParams,
    ) -> Result<OffersPage, CatalogClientError> {
        let page: OffersPage = self
            .get_json(Operation::Offers, "products/offers", &params.query_pairs())
            .await?;
        debug!(
            n_products = page.products.len(),
            total = page.total,
            "received offers page"
        );
        Ok(page)
    }

    #[instrument(skip(self))]
    async fn get_product_by_id(&self, id: ProductId) -> Result<Product, CatalogClientError> {
        self.get_json(
            Operation::Product,
            &format!("products/{id}"),
            &QueryPairs::new(),
        )
        .await
        .map_err(|e| match e {
            CatalogClientError::Http { status, .. } if status == StatusCode::NOT_FOUND => {
                CatalogClientError::NotFound { id }
            },
            other => other,
        })
    }
}

// ---------------------------------------------------------------------------
// HTTP client builder
// ---------------------------------------------------------------------------

fn build_http_client(config: &CatalogClientConfig) -> Result<reqwest::Client, CatalogClientError> {
    let mut headers = HeaderMap::new();

    for (key, value) in &config.extra_headers {
        headers.insert(
            header::HeaderName::from_str(key).map_err(
                |e: reqwest::header::InvalidHeaderName| CatalogClientError::Config(e.to_string()),
            )?,
            header::HeaderValue::from_str(value).map_err(
                |e: reqwest::header::InvalidHeaderValue| CatalogClientError::Config(e.to_string()),
            )?,
        );
    }

    debug!(
        catalog_url = %config.catalog_url,
        extra_headers = config.extra_headers.len(),
        "building catalog HTTP client"
    );

    let client_builder = reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout);

    let client_builder = if let Some(ref user_agent) = config.user_agent {
        client_builder.user_agent(user_agent)
    } else {
        client_builder
    };

    client_builder
        .build()
        .map_err(|e| CatalogClientError::Config(e.to_string()))
}

#[cfg(test)]
pub mod tests {
    use std::collections::BTreeMap;

    use httpmock::Method::GET;
    use httpmock::MockServer;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn client_config(url: &str) -> CatalogClientConfig {
        CatalogClientConfig::with_url(url)
    }

    fn product_json(id: u64) -> serde_json::Value {
        json!({
            "id": id,
            "name": format!("Product {id}"),
            "price": 49.99,
            "oldPrice": 59.99,
            "imageUrl": null,
            "store": "SuperMart",
            "category": "Dairy",
            "lastUpdated": "2025-06-01T12:00:00Z",
            "productUrl": format!("https://example.com/p/{id}"),
        })
    }

    #[tokio::test]
    async fn offers_page_sends_paging_and_filter_params() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/products/offers")
                .query_param("limit", "20")
                .query_param("offset", "20")
                .query_param("category", "Dairy");
            then.status(200).json_body(json!({
                "products": [product_json(21), product_json(22)],
                "total": 57,
            }));
        });

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let page = client
            .get_offers_page(&OffersParams {
                limit: 20,
                offset: 20,
                filter: CatalogFilter::category("Dairy"),
            })
            .await
            .unwrap();

        mock.assert();
        assert_eq!(page.total, 57);
        assert_eq!(
            page.products.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![21, 22]
        );
        assert_eq!(page.products[0].discount(), 17);
    }

    #[tokio::test]
    async fn hot_deals_use_default_params() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/products/hot-deals")
                .query_param("minDiscount", "10")
                .query_param("limit", "10");
            then.status(200).json_body(json!([product_json(1)]));
        });

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let deals = client
            .list_hot_deals(&HotDealsParams::default())
            .await
            .unwrap();

        mock.assert();
        assert_eq!(deals.len(), 1);
    }

    #[tokio::test]
    async fn latest_omits_missing_filters() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/products/latest")
                .query_param("limit", "10")
                .query_param_missing("category")
                .query_param_missing("store");
            then.status(200).json_body(json!([]));
        });

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let latest = client.list_latest(&LatestParams::default()).await.unwrap();

        mock.assert();
        assert!(latest.is_empty());
    }

    #[tokio::test]
    async fn categories_and_search() {
        let server = MockServer::start_async().await;
        let categories = server.mock(|when, then| {
            when.method(GET).path("/products/categories");
            then.status(200).json_body(json!(["Dairy", "Bakery"]));
        });
        let search = server.mock(|when, then| {
            when.method(GET)
                .path("/products/search")
                .query_param("query", "milk 2.5%");
            then.status(200).json_body(json!([product_json(3)]));
        });

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        assert_eq!(client.list_categories().await.unwrap(), vec![
            "Dairy".to_string(),
            "Bakery".to_string()
        ]);
        assert_eq!(client.search_products("milk 2.5%").await.unwrap().len(), 1);

        categories.assert();
        search.assert();
    }

    #[tokio::test]
    async fn base_url_path_prefix_is_kept() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/products");
            then.status(200).json_body(json!([]));
        });

        let client = CatalogClient::new(client_config(&server.url("/api/"))).unwrap();
        client.list_products().await.unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn extra_headers_set_on_all_requests() {
        let mut extra_headers: BTreeMap<String, String> = BTreeMap::new();
        extra_headers.insert("x-client".to_string(), "pricewatch".to_string());

        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.header("x-client", "pricewatch");
            then.status(200).json_body(json!([]));
        });

        let config = CatalogClientConfig {
            extra_headers,
            ..client_config(&server.base_url())
        };

        let client = CatalogClient::new(config).unwrap();
        let _ = client.list_products().await;
        mock.assert();
    }

    #[tokio::test]
    async fn user_agent_set_on_all_requests() {
        let expected_agent = "pricewatch-test-agent";

        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.header("user-agent", expected_agent);
            then.status(200).json_body(json!([]));
        });

        let config = CatalogClientConfig {
            user_agent: Some(expected_agent.to_owned()),
            ..client_config(&server.base_url())
        };

        let client = CatalogClient::new(config).unwrap();
        let _ = client.list_categories().await;
        mock.assert();
    }

    // region: Error response handling

    /// 404 on a single product is mapped to [CatalogClientError::NotFound]
    #[tokio::test]
    async fn product_not_found() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.path("/products/99");
            then.status(404).json_body(json!({"message": "not here"}));
        });

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let result = client.get_product_by_id(99).await;
        assert!(
            matches!(result, Err(CatalogClientError::NotFound { id: 99 })),
            "expected NotFound, found: {result:?}"
        );
        mock.assert();
    }

    /// Non-2xx responses carry the operation, not the body
    #[tokio::test]
    async fn server_error_is_labelled() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.path("/products/offers");
            then.status(500).body("<html>oops</html>");
        });

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let err = client
            .get_offers_page(&OffersParams::default())
            .await
            .unwrap_err();
        assert!(
            matches!(
                err,
                CatalogClientError::Http { operation: Operation::Offers, status }
                    if status == StatusCode::INTERNAL_SERVER_ERROR
            ),
            "expected Http error, found: {err:?}"
        );
        assert_eq!(err.to_string(), "Failed to fetch offers");
        mock.assert();
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.path("/products/categories");
            then.status(200).json_body(json!({"not": "a list"}));
        });

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let err = client.list_categories().await.unwrap_err();
        assert!(
            matches!(err, CatalogClientError::Decode {
                operation: Operation::Categories,
                ..
            }),
            "expected Decode error, found: {err:?}"
        );
        mock.assert();
    }

    #[tokio::test]
    async fn unreachable_server_is_network_error() {
        // Nothing listens on the discard port
        let client = CatalogClient::new(client_config("http://127.0.0.1:9")).unwrap();
        let err = client.list_products().await.unwrap_err();
        assert!(
            matches!(err, CatalogClientError::Network {
                operation: Operation::Products,
                ..
            }),
            "expected Network error, found: {err:?}"
        );
    }

    // endregion

    #[test]
    fn invalid_url_is_config_error() {
        let result = CatalogClient::new(client_config("not a url"));
        assert!(matches!(result, Err(CatalogClientError::Config(_))));
    }
}
