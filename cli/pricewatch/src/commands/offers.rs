use std::sync::Arc;

use anyhow::{Result, anyhow};
use bpaf::Bpaf;
use pricewatch_catalog::{Catalog, CatalogFilter};
use pricewatch_query::{FilterContext, OffersController, OffersState};
use serde_json::json;
use tracing::{debug, instrument};

use crate::config::Config;
use crate::utils::display::{DisplayOffers, print_json};
use crate::utils::message;

// Page through discounted offers
#[derive(Debug, Bpaf, Clone)]
pub struct Offers {
    /// Display offers as a JSON object
    #[bpaf(long)]
    pub json: bool,

    /// Only show offers in this category
    #[bpaf(long, short, argument("CATEGORY"))]
    pub category: Option<String>,

    /// Only show offers from this store
    #[bpaf(long, short, argument("STORE"))]
    pub store: Option<String>,

    /// Number of pages to load
    #[bpaf(long, argument("N"), fallback(1))]
    pub pages: usize,

    /// Load every page
    #[bpaf(short, long)]
    pub all: bool,
}

impl Offers {
    /// The filter selected by the command line flags.
    fn filter_context(&self) -> FilterContext {
        let context = FilterContext::new();
        if let Some(category) = &self.category {
            context.set_category(category.clone());
        }
        context.set_store(self.store.clone());
        context
    }

    /// Load the first page, then keep fetching until enough pages are shown,
    /// everything is loaded or a page fails.
    async fn load_pages<C: Catalog>(&self, controller: &OffersController<C>) -> OffersState {
        controller.load().await;
        let mut pages = 1;
        while self.all || pages < self.pages {
            if controller.state().error.is_some() || !controller.fetch_more().await {
                break;
            }
            pages += 1;
        }
        controller.state()
    }

    #[instrument(name = "offers", fields(pages = self.pages, all = self.all), skip_all)]
    pub async fn handle(self, config: Config, client: Arc<impl Catalog>) -> Result<()> {
        let context = self.filter_context();
        let controller = OffersController::with_page_size(
            client,
            CatalogFilter::from(&context.selected()),
            config.page_size,
        );
        let state = self.load_pages(&controller).await;
        controller.dispose();
        debug!(
            loaded = state.items.len(),
            total = state.total,
            phase = ?state.phase(),
            "offers settled"
        );

        if let Some(error) = &state.error {
            if state.items.is_empty() {
                return Err(anyhow!(error.clone()));
            }
            message::warning(format!("{error}, showing the offers loaded so far"));
        }

        let offers = state.offers();
        if self.json {
            return print_json(&json!({
                "offers": offers,
                "total": state.total,
            }));
        }
        if offers.is_empty() {
            message::plain("No offers found");
            return Ok(());
        }
        print!("{}", DisplayOffers(&offers));
        message::plain(format!("Showing {} of {} offers", offers.len(), state.total));
        if state.has_more() {
            message::plain("Use '--pages' or '--all' to load more");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use pricewatch_catalog::mock::{MockCatalog, Response, products};
    use pricewatch_catalog::{OffersPage, StatusCode};

    use super::*;

    fn offers(pages: usize, all: bool) -> Offers {
        Offers {
            json: true,
            category: Some("Dairy".to_string()),
            store: None,
            pages,
            all,
        }
    }

    fn config() -> Config {
        Config::from_sources(vec![], HashMap::new()).unwrap()
    }

    #[tokio::test]
    async fn loads_requested_pages() {
        let mock = Arc::new(MockCatalog::new());
        mock.serve_offers(products(1, 57, "Dairy"));
        let controller =
            OffersController::with_page_size(mock.clone(), CatalogFilter::category("Dairy"), 20);

        let state = offers(2, false).load_pages(&controller).await;
        assert_eq!(state.items.len(), 40);
        assert_eq!(mock.offers_requests().len(), 2);
    }

    #[tokio::test]
    async fn all_loads_every_page() {
        let mock = Arc::new(MockCatalog::new());
        mock.serve_offers(products(1, 57, "Dairy"));
        let controller =
            OffersController::with_page_size(mock.clone(), CatalogFilter::category("Dairy"), 20);

        let state = offers(1, true).load_pages(&controller).await;
        assert_eq!(state.items.len(), 57);
        assert!(!state.has_more());
        assert_eq!(
            mock.offers_requests()
                .iter()
                .map(|params| params.offset)
                .collect::<Vec<_>>(),
            vec![0, 20, 40]
        );
    }

    #[tokio::test]
    async fn failing_page_stops_loading() {
        let mock = Arc::new(MockCatalog::new());
        mock.push_response(Response::Offers(OffersPage {
            products: products(1, 20, "Dairy"),
            total: 57,
        }));
        mock.push_response(Response::Status(StatusCode::BAD_GATEWAY));
        let controller =
            OffersController::with_page_size(mock.clone(), CatalogFilter::category("Dairy"), 20);

        let state = offers(1, true).load_pages(&controller).await;
        assert_eq!(state.items.len(), 20);
        assert_eq!(state.error.as_deref(), Some("Failed to fetch offers"));
        assert_eq!(mock.request_count(), 2);
    }

    #[tokio::test]
    async fn failed_first_page_is_an_error() {
        let mock = Arc::new(MockCatalog::new());
        mock.push_response(Response::Status(StatusCode::BAD_GATEWAY));
        let error = offers(1, false)
            .handle(config(), mock.clone())
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "Failed to fetch offers");
    }

    #[test]
    fn flags_select_filter() {
        let mut args = offers(1, false);
        args.store = Some("FreshCo".to_string());
        assert_eq!(
            CatalogFilter::from(&args.filter_context().selected()),
            CatalogFilter::category("Dairy").with_store("FreshCo")
        );

        args.category = None;
        args.store = None;
        assert!(CatalogFilter::from(&args.filter_context().selected()).is_empty());
    }
}
