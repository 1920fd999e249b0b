//! HTTP client for the pricewatch product catalog API.
//!
//! This crate provides:
//! - HTTP client construction with timeouts and default headers
//! - Typed operations for every catalog endpoint behind the [Catalog] trait
//! - Product types and the values derived from them (discount, offer view)
//! - An in-memory [mock::MockCatalog] for tests (feature-gated)
//!
//! ## Usage
//!
//! ```ignore
//! use pricewatch_catalog::{Catalog, CatalogClient, CatalogClientConfig, OffersParams};
//!
//! let client = CatalogClient::new(CatalogClientConfig::with_url("http://localhost:3000"))?;
//! let page = client.get_offers_page(&OffersParams::default()).await?;
//! ```

mod client;
mod config;
mod error;
mod types;

#[cfg(any(test, feature = "tests"))]
pub mod mock;

pub use client::{Catalog, CatalogClient};
pub use config::{CatalogClientConfig, DEFAULT_CATALOG_URL};
pub use error::{CatalogClientError, Operation};
pub use reqwest::StatusCode;
pub use types::{
    ALL_CATEGORIES,
    CatalogFilter,
    DEFAULT_PAGE_SIZE,
    HotDealsParams,
    IMAGE_PLACEHOLDER,
    LatestParams,
    Offer,
    OffersPage,
    OffersParams,
    Product,
    ProductId,
    discount_percent,
};
