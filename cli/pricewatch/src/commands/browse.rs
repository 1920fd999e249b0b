//! One-shot catalog listings: products, hot deals, latest, categories and
//! product details.

use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use bpaf::Bpaf;
use itertools::Itertools;
use pricewatch_catalog::{Catalog, CatalogFilter, HotDealsParams, LatestParams, ProductId};
use pricewatch_query::{
    CategoriesQuery,
    HotDealsQuery,
    LatestQuery,
    ProductQuery,
    ProductsQuery,
    QueryState,
};
use tracing::instrument;

use crate::utils::display::{DisplayProduct, DisplayProducts, print_json};
use crate::utils::message;

/// The data of a settled query, or its error.
fn settled<T>(state: QueryState<T>) -> Result<T> {
    match (state.data, state.error) {
        (_, Some(error)) => Err(anyhow!(error)),
        (Some(data), None) => Ok(data),
        (None, None) => bail!("Query did not complete"),
    }
}

fn render_products(products: &[pricewatch_catalog::Product], json: bool) -> Result<()> {
    if json {
        return print_json(&products);
    }
    if products.is_empty() {
        message::plain("No products found");
        return Ok(());
    }
    print!("{}", DisplayProducts(products));
    Ok(())
}

// List every product
#[derive(Debug, Bpaf, Clone)]
pub struct Products {
    /// Display products as a JSON array
    #[bpaf(long)]
    pub json: bool,
}

impl Products {
    #[instrument(name = "products", skip_all)]
    pub async fn handle(self, client: Arc<impl Catalog>) -> Result<()> {
        let query = ProductsQuery::new(client);
        query.load().await;
        render_products(&settled(query.state())?, self.json)
    }
}

// Show the biggest discounts
#[derive(Debug, Bpaf, Clone)]
pub struct HotDeals {
    /// Display products as a JSON array
    #[bpaf(long)]
    pub json: bool,

    /// Only show products discounted by at least this many percent
    #[bpaf(long("min-discount"), argument("PERCENT"), fallback(10))]
    pub min_discount: u32,

    /// Number of products to show
    #[bpaf(long, argument("N"), fallback(10))]
    pub limit: u32,
}

impl HotDeals {
    #[instrument(
        name = "hot-deals",
        fields(min_discount = self.min_discount, limit = self.limit),
        skip_all
    )]
    pub async fn handle(self, client: Arc<impl Catalog>) -> Result<()> {
        let query = HotDealsQuery::new(client, HotDealsParams {
            min_discount: self.min_discount,
            limit: self.limit,
        });
        query.load().await;
        render_products(&settled(query.state())?, self.json)
    }
}

// Show the most recently updated products
#[derive(Debug, Bpaf, Clone)]
pub struct Latest {
    /// Display products as a JSON array
    #[bpaf(long)]
    pub json: bool,

    /// Number of products to show
    #[bpaf(long, argument("N"), fallback(10))]
    pub limit: u32,

    /// Only show products in this category
    #[bpaf(long, short, argument("CATEGORY"))]
    pub category: Option<String>,

    /// Only show products from this store
    #[bpaf(long, short, argument("STORE"))]
    pub store: Option<String>,
}

impl Latest {
    fn params(&self) -> LatestParams {
        let filter = CatalogFilter {
            category: self.category.clone(),
            store: self.store.clone(),
        };
        LatestParams {
            limit: self.limit,
            filter,
        }
    }

    #[instrument(name = "latest", fields(limit = self.limit), skip_all)]
    pub async fn handle(self, client: Arc<impl Catalog>) -> Result<()> {
        let query = LatestQuery::new(client, self.params());
        query.load().await;
        render_products(&settled(query.state())?, self.json)
    }
}

// List product categories
#[derive(Debug, Bpaf, Clone)]
pub struct Categories {
    /// Display categories as a JSON array
    #[bpaf(long)]
    pub json: bool,
}

impl Categories {
    #[instrument(name = "categories", skip_all)]
    pub async fn handle(self, client: Arc<impl Catalog>) -> Result<()> {
        let query = CategoriesQuery::new(client);
        query.load().await;
        let categories = settled(query.state())?;
        if self.json {
            return print_json(&categories);
        }
        if categories.is_empty() {
            message::plain("No categories found");
            return Ok(());
        }
        println!("{}", categories.iter().join("\n"));
        Ok(())
    }
}

// Show a single product
#[derive(Debug, Bpaf, Clone)]
pub struct Product {
    /// Display the product as JSON
    #[bpaf(long)]
    pub json: bool,

    /// Id of the product
    #[bpaf(positional("ID"))]
    pub id: ProductId,
}

impl Product {
    #[instrument(name = "product", fields(id = self.id), skip_all)]
    pub async fn handle(self, client: Arc<impl Catalog>) -> Result<()> {
        let query = ProductQuery::new(client, self.id);
        query.load().await;
        let product = settled(query.state())?;
        if self.json {
            return print_json(&product);
        }
        println!("{}", DisplayProduct(&product));
        Ok(())
    }
}
