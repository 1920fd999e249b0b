//! Error handling for catalog API operations.

use std::fmt::Display;

use reqwest::StatusCode;
use thiserror::Error;

use crate::types::ProductId;

/// The catalog operation a request was made for.
///
/// Used to label errors the way the app shows them,
/// e.g. "Failed to fetch hot deals".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Products,
    HotDeals,
    LatestProducts,
    Categories,
    Search,
    Offers,
    Product,
}

impl Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Operation::Products => "products",
            Operation::HotDeals => "hot deals",
            Operation::LatestProducts => "latest products",
            Operation::Categories => "categories",
            Operation::Search => "search results",
            Operation::Offers => "offers",
            Operation::Product => "product",
        };
        write!(f, "{label}")
    }
}

/// Common error type for catalog API operations.
///
/// Response bodies of failed requests are never parsed,
/// the message only names the operation.
#[derive(Debug, Error)]
pub enum CatalogClientError {
    /// The request never completed (connection, timeout, ...)
    #[error("Failed to fetch {operation}")]
    Network {
        operation: Operation,
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a non-2xx status
    #[error("Failed to fetch {operation}")]
    Http {
        operation: Operation,
        status: StatusCode,
    },
    /// The response body was not the expected JSON
    #[error("Failed to fetch {operation}: invalid response")]
    Decode {
        operation: Operation,
        #[source]
        source: reqwest::Error,
    },
    #[error("Product {id} not found")]
    NotFound { id: ProductId },
    #[error("invalid catalog client configuration: {0}")]
    Config(String),
}

impl CatalogClientError {
    /// The operation that failed, if the error came from a request.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            CatalogClientError::Network { operation, .. }
            | CatalogClientError::Http { operation, .. }
            | CatalogClientError::Decode { operation, .. } => Some(*operation),
            CatalogClientError::NotFound { .. } => Some(Operation::Product),
            CatalogClientError::Config(_) => None,
        }
    }

    /// HTTP status of the failed response, if one was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            CatalogClientError::Http { status, .. } => Some(*status),
            CatalogClientError::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            _ => None,
        }
    }
}
