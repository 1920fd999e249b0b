mod browse;
mod offers;
mod search;

use std::sync::Arc;

use anyhow::{Context, Result};
use bpaf::Bpaf;
use indoc::indoc;
use pricewatch_catalog::CatalogClient;
use tracing::debug;

use crate::config::Config;

const PRICEWATCH_DESCRIPTION: &str = indoc! {"
    Pricewatch compares product prices across stores.

    Browse the catalog, search for products and page through discounted offers."
};

fn vec_len<T>(x: Vec<T>) -> usize {
    Vec::len(&x)
}

#[derive(Bpaf, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verbosity {
    Verbose(
        /// Increase logging verbosity
        ///
        /// Invoke multiple times for increasing detail.
        #[bpaf(short('v'), long("verbose"), req_flag(()), many, map(vec_len))]
        usize,
    ),

    /// Silence logs except for errors
    #[bpaf(short, long)]
    Quiet,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Verbose(0)
    }
}

#[derive(Bpaf)]
#[bpaf(options, version, descr(PRICEWATCH_DESCRIPTION))]
pub struct PricewatchCli(#[bpaf(external(pricewatch_args))] pub PricewatchArgs);

/// Main pricewatch args parser
///
/// To parse the pricewatch CLI, use [`PricewatchCli`] via [`pricewatch_cli()`].
#[derive(Debug, Bpaf)]
#[bpaf(ignore_rustdoc)] // we don't want this struct to be interpreted as a group
pub struct PricewatchArgs {
    /// Verbose mode
    ///
    /// Invoke multiple times for increasing detail.
    #[bpaf(external, fallback(Default::default()))]
    pub verbosity: Verbosity,

    #[bpaf(external(commands))]
    command: Commands,
}

impl PricewatchArgs {
    pub async fn handle(self, config: Config) -> Result<()> {
        let client = CatalogClient::new(config.catalog_client_config())
            .context("Could not create catalog client")?;
        debug!(catalog_url = %client.catalog_url(), "created catalog client");
        self.command.handle(config, Arc::new(client)).await
    }
}

#[derive(Bpaf, Clone, Debug)]
enum Commands {
    /// List every product in the catalog
    #[bpaf(command)]
    Products(#[bpaf(external(browse::products))] browse::Products),

    /// Show the biggest discounts
    #[bpaf(command("hot-deals"))]
    HotDeals(#[bpaf(external(browse::hot_deals))] browse::HotDeals),

    /// Show the most recently updated products
    #[bpaf(command)]
    Latest(#[bpaf(external(browse::latest))] browse::Latest),

    /// List product categories
    #[bpaf(command)]
    Categories(#[bpaf(external(browse::categories))] browse::Categories),

    /// Search for products by name
    #[bpaf(command)]
    Search(#[bpaf(external(search::search))] search::Search),

    /// Page through discounted offers
    #[bpaf(command)]
    Offers(#[bpaf(external(offers::offers))] offers::Offers),

    /// Show a single product
    #[bpaf(command)]
    Product(#[bpaf(external(browse::product))] browse::Product),
}

impl Commands {
    async fn handle(self, config: Config, client: Arc<CatalogClient>) -> Result<()> {
        match self {
            Commands::Products(args) => args.handle(client).await,
            Commands::HotDeals(args) => args.handle(client).await,
            Commands::Latest(args) => args.handle(client).await,
            Commands::Categories(args) => args.handle(client).await,
            Commands::Search(args) => args.handle(config, client).await,
            Commands::Offers(args) => args.handle(config, client).await,
            Commands::Product(args) => args.handle(client).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use bpaf::Args;
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(args: &[&str]) -> PricewatchArgs {
        let PricewatchCli(args) = pricewatch_cli()
            .run_inner(Args::from(args))
            .unwrap_or_else(|e| panic!("{e:?}"));
        args
    }

    #[test]
    fn counts_verbose_flags() {
        assert_eq!(parse(&["-vv", "products"]).verbosity, Verbosity::Verbose(2));
        assert_eq!(parse(&["products"]).verbosity, Verbosity::Verbose(0));
        assert_eq!(parse(&["-q", "products"]).verbosity, Verbosity::Quiet);
    }

    #[test]
    fn parses_hot_deals_defaults() {
        match parse(&["hot-deals"]).command {
            Commands::HotDeals(args) => {
                assert_eq!((args.min_discount, args.limit), (10, 10));
            },
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_offers_filters() {
        match parse(&["offers", "--category", "Dairy", "--store", "FreshCo", "--all"]).command {
            Commands::Offers(args) => {
                assert_eq!(args.category.as_deref(), Some("Dairy"));
                assert_eq!(args.store.as_deref(), Some("FreshCo"));
                assert!(args.all);
            },
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_search_sort() {
        match parse(&["search", "--sort", "discount", "milk"]).command {
            Commands::Search(args) => {
                assert_eq!(args.query, "milk");
                assert_eq!(args.sort, pricewatch_query::SortOrder::Discount);
            },
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_sort() {
        assert!(
            pricewatch_cli()
                .run_inner(Args::from(&["search", "--sort", "cheapest", "milk"]))
                .is_err()
        );
    }

    #[test]
    fn product_requires_numeric_id() {
        assert!(
            pricewatch_cli()
                .run_inner(Args::from(&["product", "milk"]))
                .is_err()
        );
        match parse(&["product", "42"]).command {
            Commands::Product(args) => assert_eq!(args.id, 42),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
