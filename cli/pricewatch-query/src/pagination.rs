//! Paginated offers list with infinite scroll and pull-to-refresh.

use std::sync::{Arc, Mutex};

use pricewatch_catalog::{
    Catalog,
    CatalogFilter,
    DEFAULT_PAGE_SIZE,
    Offer,
    OffersPage,
    OffersParams,
    Product,
};
use tracing::{debug, instrument, warn};

use crate::filter::FilterContext;
use crate::request::{RequestTracker, lock};

/// Observable phase of an [OffersController].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing requested yet
    IdleEmpty,
    LoadingInitial,
    Ready,
    LoadingMore,
    Refreshing,
    /// The last request failed, see [OffersState::error]
    Error,
}

/// Snapshot of the offers list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OffersState {
    /// Append-only while the filter stays the same
    pub items: Vec<Product>,
    /// Number of matching offers on the server
    pub total: u64,
    /// Offset of the next page, always `items.len()` once a request settled
    pub offset: u64,
    pub is_initial_loading: bool,
    pub is_fetching_more: bool,
    pub refreshing: bool,
    pub error: Option<String>,
    /// Whether a first page has been received for the current filter
    pub loaded: bool,
}

impl OffersState {
    pub fn phase(&self) -> Phase {
        if self.is_initial_loading {
            Phase::LoadingInitial
        } else if self.refreshing {
            Phase::Refreshing
        } else if self.is_fetching_more {
            Phase::LoadingMore
        } else if self.error.is_some() {
            Phase::Error
        } else if self.loaded {
            Phase::Ready
        } else {
            Phase::IdleEmpty
        }
    }

    /// Whether the server has offers beyond the loaded ones.
    pub fn has_more(&self) -> bool {
        self.loaded && (self.items.len() as u64) < self.total
    }

    pub fn offers(&self) -> Vec<Offer> {
        self.items.iter().map(Offer::from).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FirstPage {
    Initial,
    Refresh,
}

#[derive(Debug, Default)]
struct Inner {
    state: OffersState,
    filter: CatalogFilter,
    tracker: RequestTracker,
    in_flight: bool,
}

/// Offers list for one filter session.
///
/// At most one request is outstanding: [OffersController::fetch_more] is
/// suppressed while anything is in flight, while
/// [OffersController::refresh] and [OffersController::set_filter]
/// supersede the in-flight request. Responses of superseded requests and
/// responses arriving after [OffersController::dispose] are dropped.
#[derive(Debug)]
pub struct OffersController<C> {
    client: Arc<C>,
    page_size: u32,
    inner: Mutex<Inner>,
}

impl<C: Catalog> OffersController<C> {
    pub fn new(client: Arc<C>, filter: CatalogFilter) -> Self {
        Self::with_page_size(client, filter, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(client: Arc<C>, filter: CatalogFilter, page_size: u32) -> Self {
        Self {
            client,
            page_size,
            inner: Mutex::new(Inner {
                filter,
                ..Default::default()
            }),
        }
    }

    pub fn state(&self) -> OffersState {
        lock(&self.inner).state.clone()
    }

    pub fn filter(&self) -> CatalogFilter {
        lock(&self.inner).filter.clone()
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Reset the list and fetch the first page for the current filter.
    pub async fn load(&self) {
        {
            let mut inner = lock(&self.inner);
            if inner.tracker.is_disposed() {
                return;
            }
            inner.state = OffersState::default();
        }
        self.fetch_first_page(FirstPage::Initial).await;
    }

    /// Switch to `filter`, discarding every loaded item.
    ///
    /// Does nothing if `filter` is the current filter.
    pub async fn set_filter(&self, filter: CatalogFilter) {
        {
            let mut inner = lock(&self.inner);
            if inner.tracker.is_disposed() || inner.filter == filter {
                return;
            }
            debug!(?filter, "offers filter changed");
            inner.filter = filter;
            inner.state = OffersState::default();
        }
        self.fetch_first_page(FirstPage::Initial).await;
    }

    /// Apply the selection of a shared [FilterContext].
    pub async fn sync_filter(&self, context: &FilterContext) {
        self.set_filter(CatalogFilter::from(&context.selected()))
            .await;
    }

    /// Re-fetch the first page and replace the list with it.
    pub async fn refresh(&self) {
        self.fetch_first_page(FirstPage::Refresh).await;
    }

    /// Manual retry after a failure.
    ///
    /// Refreshes if offers are shown, starts over otherwise.
    pub async fn retry(&self) {
        let has_items = !lock(&self.inner).state.items.is_empty();
        if has_items {
            self.refresh().await;
        } else {
            self.load().await;
        }
    }

    /// Append the next page.
    ///
    /// Returns whether a request was issued. Nothing is requested while
    /// another request is in flight, before the first page arrived, or
    /// once every offer is loaded.
    #[instrument(skip_all)]
    pub async fn fetch_more(&self) -> bool {
        let (id, params) = {
            let mut inner = lock(&self.inner);
            if inner.tracker.is_disposed() || inner.in_flight || !inner.state.has_more() {
                return false;
            }
            let id = inner.tracker.issue();
            inner.in_flight = true;
            inner.state.is_fetching_more = true;
            let params = OffersParams {
                limit: self.page_size,
                offset: inner.state.items.len() as u64,
                filter: inner.filter.clone(),
            };
            (id, params)
        };

        debug!(offset = params.offset, "fetching more offers");
        let result = self.client.get_offers_page(&params).await;

        let mut inner = lock(&self.inner);
        if !inner.tracker.is_current(id) {
            debug!(offset = params.offset, "dropping superseded offers page");
            return true;
        }
        inner.in_flight = false;
        let state = &mut inner.state;
        state.is_fetching_more = false;

        match result {
            Ok(OffersPage { products, total }) => {
                if products.is_empty() {
                    // The server ran out before reaching its own total.
                    // Stop paging instead of asking for the same offset forever.
                    warn!(
                        loaded = state.items.len(),
                        total, "empty offers page before reaching total"
                    );
                    state.total = state.items.len() as u64;
                } else {
                    state.items.extend(products);
                    state.total = total;
                    truncate_to_total(state);
                }
                state.offset = state.items.len() as u64;
                state.error = None;
            },
            Err(e) => {
                warn!(error = %e, "fetching more offers failed");
                state.error = Some(e.to_string());
            },
        }
        true
    }

    /// Drop the controller's interest in any pending response.
    pub fn dispose(&self) {
        let mut inner = lock(&self.inner);
        inner.tracker.dispose();
        inner.in_flight = false;
    }

    #[instrument(skip(self))]
    async fn fetch_first_page(&self, kind: FirstPage) {
        let (id, params) = {
            let mut inner = lock(&self.inner);
            if inner.tracker.is_disposed() {
                return;
            }
            let id = inner.tracker.issue();
            inner.in_flight = true;
            let state = &mut inner.state;
            state.is_fetching_more = false;
            match kind {
                FirstPage::Initial => {
                    state.is_initial_loading = true;
                    state.error = None;
                },
                FirstPage::Refresh => state.refreshing = true,
            }
            let params = OffersParams {
                limit: self.page_size,
                offset: 0,
                filter: inner.filter.clone(),
            };
            (id, params)
        };

        let result = self.client.get_offers_page(&params).await;

        let mut inner = lock(&self.inner);
        if !inner.tracker.is_current(id) {
            debug!("dropping superseded first offers page");
            return;
        }
        inner.in_flight = false;
        let state = &mut inner.state;
        state.is_initial_loading = false;
        state.refreshing = false;

        match result {
            Ok(page) => {
                debug!(
                    n_products = page.products.len(),
                    total = page.total,
                    "received first offers page"
                );
                state.items = page.products;
                state.total = page.total;
                truncate_to_total(state);
                state.offset = state.items.len() as u64;
                state.error = None;
                state.loaded = true;
            },
            Err(e) => {
                warn!(error = %e, ?kind, "fetching offers failed");
                state.error = Some(e.to_string());
            },
        }
    }
}

/// Keep `items.len() <= total` even if the server overshoots.
fn truncate_to_total(state: &mut OffersState) {
    let total = usize::try_from(state.total).unwrap_or(usize::MAX);
    if state.items.len() > total {
        warn!(
            loaded = state.items.len(),
            total = state.total,
            "server returned more offers than its total"
        );
        state.items.truncate(total);
    }
}
