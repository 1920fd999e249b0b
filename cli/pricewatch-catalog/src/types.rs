//! Catalog interaction types.
//!
//! These types represent the products and query parameters of the catalog
//! API, plus the values derived from them for display.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub type ProductId = u64;

/// Category value meaning "no category constraint".
pub const ALL_CATEGORIES: &str = "All";

/// Image value used when a product has no image.
pub const IMAGE_PLACEHOLDER: &str = "placeholder";

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// A catalog item as returned by the product endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub store: String,
    pub category: String,
    /// ISO-8601 timestamp, shown as "offer valid until"
    pub last_updated: String,
    pub product_url: String,
}

impl Product {
    /// Discount in whole percent, `0` unless `old_price > price`.
    pub fn discount(&self) -> u32 {
        discount_percent(self.price, self.old_price)
    }

    pub fn has_discount(&self) -> bool {
        self.discount() > 0
    }

    /// `last_updated` parsed as a timestamp.
    ///
    /// Accepts RFC 3339 and bare `YYYY-MM-DD` dates,
    /// anything else yields `None`.
    pub fn last_updated_at(&self) -> Option<DateTime<Utc>> {
        if let Ok(timestamp) = DateTime::parse_from_rfc3339(&self.last_updated) {
            return Some(timestamp.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(&self.last_updated, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }
}

/// `round(100 * (1 - price / old_price))` when `old_price > price`, else `0`.
pub fn discount_percent(price: f64, old_price: Option<f64>) -> u32 {
    match old_price {
        Some(old_price) if old_price > price && old_price > 0.0 => {
            let percent = (100.0 * (1.0 - price / old_price)).round();
            percent.clamp(0.0, 100.0) as u32
        },
        _ => 0,
    }
}

/// A product viewed through its discount, as listed on the offers screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: String,
    pub title: String,
    pub store: String,
    pub valid_until: String,
    /// Image url or [IMAGE_PLACEHOLDER]
    pub image: String,
    pub description: String,
    pub discount: u32,
}

impl From<&Product> for Offer {
    fn from(product: &Product) -> Self {
        Offer {
            id: product.id.to_string(),
            title: product.name.clone(),
            store: product.store.clone(),
            valid_until: product.last_updated.clone(),
            image: product
                .image_url
                .clone()
                .unwrap_or_else(|| IMAGE_PLACEHOLDER.to_string()),
            description: product.category.clone(),
            discount: product.discount(),
        }
    }
}

/// One page of the offers endpoint.
///
/// `total` counts every matching record on the server, not just this page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OffersPage {
    pub products: Vec<Product>,
    pub total: u64,
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

pub(crate) type QueryPairs = Vec<(&'static str, String)>;

/// Category and store constraints for listing queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CatalogFilter {
    pub category: Option<String>,
    pub store: Option<String>,
}

impl CatalogFilter {
    /// Filter on `category`, where [ALL_CATEGORIES] means unconstrained.
    pub fn category(category: impl Into<String>) -> Self {
        let category = category.into();
        Self {
            category: (category != ALL_CATEGORIES).then_some(category),
            store: None,
        }
    }

    pub fn with_store(mut self, store: impl Into<String>) -> Self {
        self.store = Some(store.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.store.is_none()
    }

    fn append_to(&self, pairs: &mut QueryPairs) {
        let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());
        if let Some(category) = non_empty(&self.category) {
            pairs.push(("category", category));
        }
        if let Some(store) = non_empty(&self.store) {
            pairs.push(("store", store));
        }
    }
}

/// Zero values are left out of the query, the server applies its defaults.
fn push_nonzero(pairs: &mut QueryPairs, key: &'static str, value: u32) {
    if value != 0 {
        pairs.push((key, value.to_string()));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotDealsParams {
    pub min_discount: u32,
    pub limit: u32,
}

impl Default for HotDealsParams {
    fn default() -> Self {
        Self {
            min_discount: 10,
            limit: 10,
        }
    }
}

impl HotDealsParams {
    pub(crate) fn query_pairs(&self) -> QueryPairs {
        let mut pairs = QueryPairs::new();
        push_nonzero(&mut pairs, "minDiscount", self.min_discount);
        push_nonzero(&mut pairs, "limit", self.limit);
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestParams {
    pub limit: u32,
    pub filter: CatalogFilter,
}

impl Default for LatestParams {
    fn default() -> Self {
        Self {
            limit: 10,
            filter: CatalogFilter::default(),
        }
    }
}

impl LatestParams {
    pub(crate) fn query_pairs(&self) -> QueryPairs {
        let mut pairs = QueryPairs::new();
        push_nonzero(&mut pairs, "limit", self.limit);
        self.filter.append_to(&mut pairs);
        pairs
    }
}

pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffersParams {
    pub limit: u32,
    pub offset: u64,
    pub filter: CatalogFilter,
}

impl Default for OffersParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
            filter: CatalogFilter::default(),
        }
    }
}

impl OffersParams {
    pub(crate) fn query_pairs(&self) -> QueryPairs {
        let mut pairs = QueryPairs::new();
        push_nonzero(&mut pairs, "limit", self.limit);
        // offset 0 is meaningful for paging, always send it
        pairs.push(("offset", self.offset.to_string()));
        self.filter.append_to(&mut pairs);
        pairs
    }
}
