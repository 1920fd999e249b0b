//! In-memory [Catalog] for tests.
//!
//! Responses are queued up front and handed out in order. Every call is
//! recorded so tests can assert on the requests a controller issued.
//! Offers can alternatively be served from a fixed product list,
//! sliced by `offset`/`limit` like the real endpoint does.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::StatusCode;

use crate::client::Catalog;
use crate::error::{CatalogClientError, Operation};
use crate::types::*;

// Arc allows you to push things into the client from outside the client if necessary
// Mutex allows you to share across threads (necessary because of tokio)
type MockField<T> = Arc<Mutex<T>>;

/// A request as seen by [MockCatalog].
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Products,
    HotDeals(HotDealsParams),
    Latest(LatestParams),
    Categories,
    Search(String),
    Offers(OffersParams),
    Product(ProductId),
}

/// A canned response.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Answers any of the product list operations
    Products(Vec<Product>),
    Categories(Vec<String>),
    Offers(OffersPage),
    Product(Product),
    /// Fails the call with a non-2xx status
    Status(StatusCode),
}

#[derive(Debug)]
struct QueuedResponse {
    response: Response,
    delay: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct MockCatalog {
    responses: MockField<VecDeque<QueuedResponse>>,
    requests: MockField<Vec<Request>>,
    offers: MockField<Option<Vec<Product>>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: Response) {
        self.push_delayed_response(response, Duration::ZERO);
    }

    /// Queue a response that is only delivered after `delay`.
    pub fn push_delayed_response(&self, response: Response, delay: Duration) {
        self.responses
            .lock()
            .expect("couldn't acquire mock lock")
            .push_back(QueuedResponse { response, delay });
    }

    /// Serve offers pages from `products` once the response queue is empty.
    pub fn serve_offers(&self, products: Vec<Product>) {
        *self.offers.lock().expect("couldn't acquire mock lock") = Some(products);
    }

    /// All requests received so far, in order.
    pub fn requests(&self) -> Vec<Request> {
        self.requests
            .lock()
            .expect("couldn't acquire mock lock")
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("couldn't acquire mock lock").len()
    }

    /// Offers requests received so far.
    pub fn offers_requests(&self) -> Vec<OffersParams> {
        self.requests()
            .into_iter()
            .filter_map(|request| match request {
                Request::Offers(params) => Some(params),
                _ => None,
            })
            .collect()
    }

    /// Record `request` and hand out the next queued response.
    async fn next_response(&self, request: Request) -> Option<Response> {
        self.requests
            .lock()
            .expect("couldn't acquire mock lock")
            .push(request);
        let queued = self
            .responses
            .lock()
            .expect("couldn't acquire mock lock")
            .pop_front()?;
        if !queued.delay.is_zero() {
            tokio::time::sleep(queued.delay).await;
        }
        Some(queued.response)
    }

    fn slice_offers(&self, params: &OffersParams) -> Option<OffersPage> {
        let offers = self.offers.lock().expect("couldn't acquire mock lock");
        let matching = offers
            .as_ref()?
            .iter()
            .filter(|p| params.filter.category.as_ref().is_none_or(|c| &p.category == c))
            .filter(|p| params.filter.store.as_ref().is_none_or(|s| &p.store == s))
            .collect::<Vec<_>>();
        let total = matching.len() as u64;
        let products = matching
            .into_iter()
            .skip(params.offset as usize)
            .take(params.limit as usize)
            .cloned()
            .collect();
        Some(OffersPage { products, total })
    }
}

fn status_error(operation: Operation, status: StatusCode) -> CatalogClientError {
    CatalogClientError::Http { operation, status }
}

fn expect_products(
    operation: Operation,
    response: Option<Response>,
) -> Result<Vec<Product>, CatalogClientError> {
    match response {
        Some(Response::Products(products)) => Ok(products),
        Some(Response::Status(status)) => Err(status_error(operation, status)),
        other => panic!("expected products response for {operation}, found {other:?}"),
    }
}

impl Catalog for MockCatalog {
    async fn list_products(&self) -> Result<Vec<Product>, CatalogClientError> {
        let response = self.next_response(Request::Products).await;
        expect_products(Operation::Products, response)
    }

    async fn list_hot_deals(
        &self,
        params: &HotDealsParams,
    ) -> Result<Vec<Product>, CatalogClientError> {
        let response = self.next_response(Request::HotDeals(*params)).await;
        expect_products(Operation::HotDeals, response)
    }

    async fn list_latest(
        &self,
        params: &LatestParams,
    ) -> Result<Vec<Product>, CatalogClientError> {
        let response = self.next_response(Request::Latest(params.clone())).await;
        expect_products(Operation::LatestProducts, response)
    }

    async fn list_categories(&self) -> Result<Vec<String>, CatalogClientError> {
        match self.next_response(Request::Categories).await {
            Some(Response::Categories(categories)) => Ok(categories),
            Some(Response::Status(status)) => Err(status_error(Operation::Categories, status)),
            other => panic!("expected categories response, found {other:?}"),
        }
    }

    async fn search_products(&self, query: &str) -> Result<Vec<Product>, CatalogClientError> {
        let response = self.next_response(Request::Search(query.to_string())).await;
        expect_products(Operation::Search, response)
    }

    async fn get_offers_page(
        &self,
        params: &OffersParams,
    ) -> Result<OffersPage, CatalogClientError> {
        match self.next_response(Request::Offers(params.clone())).await {
            Some(Response::Offers(page)) => Ok(page),
            Some(Response::Status(status)) => Err(status_error(Operation::Offers, status)),
            None => Ok(self
                .slice_offers(params)
                .expect("no queued offers response and no offers to serve")),
            other => panic!("expected offers response, found {other:?}"),
        }
    }

    async fn get_product_by_id(&self, id: ProductId) -> Result<Product, CatalogClientError> {
        match self.next_response(Request::Product(id)).await {
            Some(Response::Product(product)) => Ok(product),
            Some(Response::Status(StatusCode::NOT_FOUND)) => {
                Err(CatalogClientError::NotFound { id })
            },
            Some(Response::Status(status)) => Err(status_error(Operation::Product, status)),
            other => panic!("expected product response, found {other:?}"),
        }
    }
}

/// A product fixture with a stable shape, for tests.
pub fn product(id: ProductId, category: &str) -> Product {
    Product {
        id,
        name: format!("Product {id}"),
        price: 49.99,
        old_price: Some(59.99),
        image_url: None,
        store: "SuperMart".to_string(),
        category: category.to_string(),
        last_updated: "2025-06-01T12:00:00Z".to_string(),
        product_url: format!("https://example.com/p/{id}"),
    }
}

/// `count` products in `category` with ids starting at `first_id`.
pub fn products(first_id: ProductId, count: usize, category: &str) -> Vec<Product> {
    (first_id..)
        .take(count)
        .map(|id| product(id, category))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn responses_are_handed_out_in_order() {
        let mock = MockCatalog::new();
        mock.push_response(Response::Categories(vec!["Dairy".to_string()]));
        mock.push_response(Response::Status(StatusCode::BAD_GATEWAY));

        assert_eq!(mock.list_categories().await.unwrap(), vec![
            "Dairy".to_string()
        ]);
        let err = mock.list_categories().await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
        assert_eq!(mock.requests(), vec![
            Request::Categories,
            Request::Categories
        ]);
    }

    #[tokio::test]
    async fn serves_offers_by_slicing() {
        let mock = MockCatalog::new();
        let mut all = products(1, 5, "Dairy");
        all.extend(products(100, 3, "Bakery"));
        mock.serve_offers(all);

        let page = mock
            .get_offers_page(&OffersParams {
                limit: 2,
                offset: 4,
                filter: CatalogFilter::category("Dairy"),
            })
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(
            page.products.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![5]
        );
    }

    #[tokio::test]
    async fn not_found_status_maps_to_not_found() {
        let mock = MockCatalog::new();
        mock.push_response(Response::Status(StatusCode::NOT_FOUND));
        let result = mock.get_product_by_id(5).await;
        assert!(matches!(result, Err(CatalogClientError::NotFound { id: 5 })));
    }
}
