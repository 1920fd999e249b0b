//! Debounced product search.

use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pricewatch_catalog::{Catalog, Product};
use thiserror::Error;
use tracing::{debug, warn};

use crate::request::{RequestTracker, lock};

/// Queries shorter than this are not sent.
pub const MIN_QUERY_CHARS: usize = 3;
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    PriceAsc,
    PriceDesc,
    /// Biggest discount first
    Discount,
    Name,
}

#[derive(Debug, Error)]
#[error("unknown sort order '{0}', expected one of price_asc, price_desc, discount, name")]
pub struct ParseSortOrderError(String);

impl FromStr for SortOrder {
    type Err = ParseSortOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price_asc" => Ok(SortOrder::PriceAsc),
            "price_desc" => Ok(SortOrder::PriceDesc),
            "discount" => Ok(SortOrder::Discount),
            "name" => Ok(SortOrder::Name),
            other => Err(ParseSortOrderError(other.to_string())),
        }
    }
}

impl SortOrder {
    pub fn sort(self, products: &mut [Product]) {
        let by_price = |a: &Product, b: &Product| a.price.total_cmp(&b.price);
        match self {
            SortOrder::PriceAsc => products.sort_by(by_price),
            SortOrder::PriceDesc => products.sort_by(|a, b| by_price(b, a)),
            SortOrder::Discount => products.sort_by(|a, b| {
                b.discount()
                    .cmp(&a.discount())
                    .then_with(|| by_price(a, b))
            }),
            SortOrder::Name => products.sort_by(|a, b| match a.name.cmp(&b.name) {
                Ordering::Equal => a.id.cmp(&b.id),
                other => other,
            }),
        }
    }
}

/// Whether `query` is long enough to be sent.
pub fn is_searchable(query: &str) -> bool {
    query.trim().chars().count() >= MIN_QUERY_CHARS
}

/// Snapshot of a search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    /// Text as typed
    pub input: String,
    /// The query the results belong to, `None` while nothing is searched
    pub active_query: Option<String>,
    pub results: Vec<Product>,
    pub loading: bool,
    pub error: Option<String>,
    pub sort: SortOrder,
}

#[derive(Debug, Default)]
struct Inner {
    state: SearchState,
    /// Bumped on every keystroke, a pending debounce only fires if unchanged
    inputs: RequestTracker,
    requests: RequestTracker,
}

/// Search box backed by the catalog search endpoint.
///
/// Input is debounced; only the latest issued request may update the
/// results, so a slow earlier response can't overwrite a newer one.
#[derive(Debug)]
pub struct SearchController<C> {
    client: Arc<C>,
    debounce: Duration,
    inner: Mutex<Inner>,
}

impl<C: Catalog> SearchController<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self::with_debounce(client, SEARCH_DEBOUNCE)
    }

    pub fn with_debounce(client: Arc<C>, debounce: Duration) -> Self {
        Self {
            client,
            debounce,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn state(&self) -> SearchState {
        lock(&self.inner).state.clone()
    }

    /// Handle a change of the search text.
    ///
    /// Resolves once the text has been searched for, or as soon as it is
    /// clear that it won't be: the text is too short, was superseded by
    /// newer input within the debounce delay, or is already the active query.
    pub async fn input(&self, text: impl Into<String>) {
        let text = text.into();
        let query = text.trim().to_string();

        let input_id = {
            let mut inner = lock(&self.inner);
            if inner.inputs.is_disposed() {
                return;
            }
            inner.state.input = text;
            let input_id = inner.inputs.issue();

            if !is_searchable(&query) {
                // nothing to search, drop results and anything in flight
                inner.requests.invalidate();
                let state = &mut inner.state;
                state.active_query = None;
                state.results.clear();
                state.loading = false;
                state.error = None;
                return;
            }
            input_id
        };

        tokio::time::sleep(self.debounce).await;

        let request_id = {
            let mut inner = lock(&self.inner);
            if !inner.inputs.is_current(input_id) {
                return;
            }
            if inner.state.active_query.as_deref() == Some(query.as_str()) {
                return;
            }
            let request_id = inner.requests.issue();
            inner.state.active_query = Some(query.clone());
            inner.state.loading = true;
            inner.state.error = None;
            request_id
        };

        debug!(%query, "searching products");
        let result = self.client.search_products(&query).await;

        let mut inner = lock(&self.inner);
        if !inner.requests.is_current(request_id) {
            debug!(%query, "dropping superseded search results");
            return;
        }
        let state = &mut inner.state;
        state.loading = false;
        match result {
            Ok(mut products) => {
                state.sort.sort(&mut products);
                state.results = products;
            },
            Err(e) => {
                warn!(error = %e, %query, "search failed");
                state.results.clear();
                state.error = Some(e.to_string());
            },
        }
    }

    /// Change the order of current and future results.
    pub fn set_sort(&self, sort: SortOrder) {
        let mut inner = lock(&self.inner);
        let state = &mut inner.state;
        state.sort = sort;
        sort.sort(&mut state.results);
    }

    pub fn dispose(&self) {
        let mut inner = lock(&self.inner);
        inner.inputs.dispose();
        inner.requests.dispose();
    }
}
