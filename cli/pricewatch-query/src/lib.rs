//! State controllers over the pricewatch catalog.
//!
//! Every controller owns its state behind a `&self` API: actions are async
//! and update the state once the catalog answers, [state snapshots] can be
//! read at any time. Responses that were superseded by a newer request, or
//! that arrive after a controller was disposed, are dropped.
//!
//! [state snapshots]: pagination::OffersState

pub mod filter;
pub mod pagination;
pub mod query;
mod request;
pub mod search;

pub use filter::{FilterContext, FilterSelection, Tab};
pub use pagination::{OffersController, OffersState, Phase};
pub use query::{
    CategoriesQuery,
    HotDealsQuery,
    LatestQuery,
    ProductQuery,
    ProductsQuery,
    Query,
    QueryState,
};
pub use search::{SearchController, SearchState, SortOrder};
