//! Single request queries: products, categories, hot deals, latest
//! products and product details.
//!
//! Each query sets `loading`, calls the catalog, stores the result or the
//! error message and clears `loading` once settled. Nothing is cached or
//! retried; changing a parameter re-runs the query.

use std::future::Future;
use std::sync::{Arc, Mutex};

use pricewatch_catalog::{
    Catalog,
    CatalogClientError,
    HotDealsParams,
    LatestParams,
    Product,
    ProductId,
};
use tracing::warn;

use crate::request::{RequestTracker, lock};

#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for QueryState<T> {
    /// Queries start out loading, they are expected to run right away.
    fn default() -> Self {
        Self {
            data: None,
            loading: true,
            error: None,
        }
    }
}

#[derive(Debug)]
struct Inner<T> {
    state: QueryState<T>,
    tracker: RequestTracker,
}

/// Loading/error/data state around one catalog request at a time.
#[derive(Debug)]
pub struct Query<T> {
    inner: Mutex<Inner<T>>,
}

impl<T> Default for Query<T> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: QueryState::default(),
                tracker: RequestTracker::default(),
            }),
        }
    }
}

impl<T: Clone> Query<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> QueryState<T> {
        lock(&self.inner).state.clone()
    }

    /// Run `request`, superseding any earlier run.
    ///
    /// Previous data stays visible until the new result arrives.
    pub async fn run<F>(&self, request: F)
    where
        F: Future<Output = Result<T, CatalogClientError>>,
    {
        let id = {
            let mut inner = lock(&self.inner);
            if inner.tracker.is_disposed() {
                return;
            }
            inner.state.loading = true;
            inner.tracker.issue()
        };

        let result = request.await;

        let mut inner = lock(&self.inner);
        if !inner.tracker.is_current(id) {
            return;
        }
        let state = &mut inner.state;
        state.loading = false;
        match result {
            Ok(data) => {
                state.data = Some(data);
                state.error = None;
            },
            Err(e) => {
                warn!(error = %e, "catalog query failed");
                state.error = Some(e.to_string());
            },
        }
    }

    pub fn dispose(&self) {
        lock(&self.inner).tracker.dispose();
    }
}

/// All products.
#[derive(Debug)]
pub struct ProductsQuery<C> {
    client: Arc<C>,
    query: Query<Vec<Product>>,
}

impl<C: Catalog> ProductsQuery<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            query: Query::new(),
        }
    }

    pub async fn load(&self) {
        self.query.run(self.client.list_products()).await;
    }

    pub fn state(&self) -> QueryState<Vec<Product>> {
        self.query.state()
    }

    pub fn dispose(&self) {
        self.query.dispose();
    }
}

/// Category names for the filter bar.
#[derive(Debug)]
pub struct CategoriesQuery<C> {
    client: Arc<C>,
    query: Query<Vec<String>>,
}

impl<C: Catalog> CategoriesQuery<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            query: Query::new(),
        }
    }

    pub async fn load(&self) {
        self.query.run(self.client.list_categories()).await;
    }

    pub fn state(&self) -> QueryState<Vec<String>> {
        self.query.state()
    }

    /// Filter bar entries: [pricewatch_catalog::ALL_CATEGORIES] followed by
    /// the loaded categories.
    pub fn filter_options(&self) -> Vec<String> {
        std::iter::once(pricewatch_catalog::ALL_CATEGORIES.to_string())
            .chain(self.state().data.unwrap_or_default())
            .collect()
    }

    pub fn dispose(&self) {
        self.query.dispose();
    }
}

/// Hot deals for the home screen.
#[derive(Debug)]
pub struct HotDealsQuery<C> {
    client: Arc<C>,
    params: Mutex<HotDealsParams>,
    query: Query<Vec<Product>>,
}

impl<C: Catalog> HotDealsQuery<C> {
    pub fn new(client: Arc<C>, params: HotDealsParams) -> Self {
        Self {
            client,
            params: Mutex::new(params),
            query: Query::new(),
        }
    }

    pub async fn load(&self) {
        let params = *lock(&self.params);
        self.query.run(self.client.list_hot_deals(&params)).await;
    }

    /// Re-run with `params` if they differ from the current ones.
    pub async fn set_params(&self, params: HotDealsParams) {
        {
            let mut current = lock(&self.params);
            if *current == params {
                return;
            }
            *current = params;
        }
        self.load().await;
    }

    pub fn state(&self) -> QueryState<Vec<Product>> {
        self.query.state()
    }

    pub fn dispose(&self) {
        self.query.dispose();
    }
}

/// Latest products, optionally filtered by category and store.
#[derive(Debug)]
pub struct LatestQuery<C> {
    client: Arc<C>,
    params: Mutex<LatestParams>,
    query: Query<Vec<Product>>,
}

impl<C: Catalog> LatestQuery<C> {
    pub fn new(client: Arc<C>, params: LatestParams) -> Self {
        Self {
            client,
            params: Mutex::new(params),
            query: Query::new(),
        }
    }

    pub async fn load(&self) {
        let params = lock(&self.params).clone();
        self.query.run(self.client.list_latest(&params)).await;
    }

    /// Re-run with `params` if they differ from the current ones.
    pub async fn set_params(&self, params: LatestParams) {
        {
            let mut current = lock(&self.params);
            if *current == params {
                return;
            }
            *current = params;
        }
        self.load().await;
    }

    pub fn state(&self) -> QueryState<Vec<Product>> {
        self.query.state()
    }

    pub fn dispose(&self) {
        self.query.dispose();
    }
}

/// A single product for the details screen.
#[derive(Debug)]
pub struct ProductQuery<C> {
    client: Arc<C>,
    id: Mutex<ProductId>,
    query: Query<Product>,
}

impl<C: Catalog> ProductQuery<C> {
    pub fn new(client: Arc<C>, id: ProductId) -> Self {
        Self {
            client,
            id: Mutex::new(id),
            query: Query::new(),
        }
    }

    pub async fn load(&self) {
        let id = *lock(&self.id);
        self.query.run(self.client.get_product_by_id(id)).await;
    }

    /// Show another product; the previous one is dropped right away.
    pub async fn set_id(&self, id: ProductId) {
        {
            let mut current = lock(&self.id);
            if *current == id {
                return;
            }
            *current = id;
        }
        lock(&self.query.inner).state.data = None;
        self.load().await;
    }

    pub fn state(&self) -> QueryState<Product> {
        self.query.state()
    }

    pub fn dispose(&self) {
        self.query.dispose();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use pricewatch_catalog::mock::{MockCatalog, Request, Response, product, products};
    use pricewatch_catalog::{CatalogFilter, StatusCode};
    use tokio::time::sleep;

    use super::*;

    #[tokio::test]
    async fn stores_data_and_clears_loading() {
        let mock = Arc::new(MockCatalog::new());
        mock.push_response(Response::Categories(vec![
            "Dairy".to_string(),
            "Bakery".to_string(),
        ]));
        let categories = CategoriesQuery::new(mock.clone());
        assert!(categories.state().loading);

        categories.load().await;
        let state = categories.state();
        assert!(!state.loading);
        assert_eq!(state.error, None);
        assert_eq!(categories.filter_options(), vec!["All", "Dairy", "Bakery"]);
    }

    #[tokio::test]
    async fn stores_error_message() {
        let mock = Arc::new(MockCatalog::new());
        mock.push_response(Response::Status(StatusCode::BAD_GATEWAY));
        let deals = HotDealsQuery::new(mock.clone(), HotDealsParams::default());

        deals.load().await;
        let state = deals.state();
        assert!(!state.loading);
        assert_eq!(state.data, None);
        assert_eq!(state.error.as_deref(), Some("Failed to fetch hot deals"));
    }

    #[tokio::test]
    async fn products_query_lists_everything() {
        let mock = Arc::new(MockCatalog::new());
        mock.push_response(Response::Products(products(1, 4, "Dairy")));
        let query = ProductsQuery::new(mock.clone());
        query.load().await;
        assert_eq!(query.state().data.map(|p| p.len()), Some(4));
        assert_eq!(mock.requests(), vec![Request::Products]);
    }

    #[tokio::test]
    async fn latest_reruns_on_param_change() {
        let mock = Arc::new(MockCatalog::new());
        mock.push_response(Response::Products(products(1, 2, "Dairy")));
        mock.push_response(Response::Products(products(10, 1, "Bakery")));
        let latest = LatestQuery::new(mock.clone(), LatestParams::default());
        latest.load().await;

        let bakery = LatestParams {
            limit: 10,
            filter: CatalogFilter::category("Bakery"),
        };
        latest.set_params(bakery.clone()).await;
        latest.set_params(bakery.clone()).await;

        assert_eq!(mock.requests(), vec![
            Request::Latest(LatestParams::default()),
            Request::Latest(bakery),
        ]);
        assert_eq!(
            latest.state().data.unwrap()[0].category,
            "Bakery".to_string()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_run_is_dropped() {
        let mock = Arc::new(MockCatalog::new());
        mock.push_delayed_response(
            Response::Products(products(1, 5, "Dairy")),
            Duration::from_secs(1),
        );
        mock.push_response(Response::Products(products(100, 1, "Dairy")));
        let deals = HotDealsQuery::new(mock.clone(), HotDealsParams::default());

        tokio::join!(deals.load(), async {
            sleep(Duration::from_millis(10)).await;
            deals
                .set_params(HotDealsParams {
                    min_discount: 50,
                    limit: 1,
                })
                .await;
        });

        let state = deals.state();
        assert_eq!(state.data.map(|p| p[0].id), Some(100));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn product_not_found() {
        let mock = Arc::new(MockCatalog::new());
        mock.push_response(Response::Product(product(1, "Dairy")));
        mock.push_response(Response::Status(StatusCode::NOT_FOUND));
        let details = ProductQuery::new(mock.clone(), 1);

        details.load().await;
        assert_eq!(details.state().data.map(|p| p.id), Some(1));

        details.set_id(2).await;
        let state = details.state();
        assert_eq!(state.data, None);
        assert_eq!(state.error.as_deref(), Some("Product 2 not found"));
    }

    #[tokio::test(start_paused = true)]
    async fn disposed_query_ignores_response() {
        let mock = Arc::new(MockCatalog::new());
        mock.push_delayed_response(
            Response::Categories(vec!["Dairy".to_string()]),
            Duration::from_millis(100),
        );
        let categories = CategoriesQuery::new(mock.clone());

        tokio::join!(categories.load(), async {
            sleep(Duration::from_millis(10)).await;
            categories.dispose();
        });
        assert_eq!(categories.state().data, None);
    }
}
