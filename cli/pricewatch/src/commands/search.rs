use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use bpaf::Bpaf;
use pricewatch_catalog::Catalog;
use pricewatch_query::search::{MIN_QUERY_CHARS, is_searchable};
use pricewatch_query::{SearchController, SortOrder};
use tracing::{debug, instrument};

use crate::config::Config;
use crate::utils::display::{DisplayProducts, print_json};
use crate::utils::message;

// Search for products by name
#[derive(Debug, Bpaf, Clone)]
pub struct Search {
    /// Display search results as a JSON array
    #[bpaf(long)]
    pub json: bool,

    /// Order of the results, one of price_asc, price_desc, discount, name
    #[bpaf(long, argument("ORDER"), fallback(SortOrder::default()))]
    pub sort: SortOrder,

    /// The product name to search for, at least three characters
    #[bpaf(positional("QUERY"))]
    pub query: String,
}

impl Search {
    #[instrument(name = "search", fields(json = self.json, query = self.query), skip_all)]
    pub async fn handle(self, config: Config, client: Arc<impl Catalog>) -> Result<()> {
        if !is_searchable(&self.query) {
            bail!("Search term must be at least {MIN_QUERY_CHARS} characters long");
        }

        let search = SearchController::with_debounce(client, config.search_debounce());
        search.set_sort(self.sort);
        search.input(self.query.as_str()).await;
        let state = search.state();
        debug!(results = state.results.len(), "search settled");

        if let Some(error) = state.error {
            return Err(anyhow!(error));
        }

        if self.json {
            return print_json(&state.results);
        }
        if state.results.is_empty() {
            message::plain(format!("No products matched '{}'", self.query.trim()));
            return Ok(());
        }
        print!("{}", DisplayProducts(&state.results));
        Ok(())
    }
}
