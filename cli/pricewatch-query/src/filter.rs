//! Category/store selection shared between the home and offers screens.

use std::sync::Arc;

use pricewatch_catalog::{ALL_CATEGORIES, CatalogFilter};
use tokio::sync::watch;
use tracing::debug;

/// Top level navigation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Home,
    Search,
    Offers,
    List,
    Profile,
}

/// The selected filter values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    /// A category name or [ALL_CATEGORIES]
    pub category: String,
    pub store: Option<String>,
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self {
            category: ALL_CATEGORIES.to_string(),
            store: None,
        }
    }
}

impl From<&FilterSelection> for CatalogFilter {
    fn from(selection: &FilterSelection) -> Self {
        let filter = CatalogFilter::category(selection.category.clone());
        match &selection.store {
            Some(store) => filter.with_store(store.clone()),
            None => filter,
        }
    }
}

/// Shared, cloneable handle to the selected filter.
///
/// Every clone refers to the same selection; the last write wins.
/// Changes apply immediately and can be observed with
/// [FilterContext::subscribe].
#[derive(Debug, Clone)]
pub struct FilterContext {
    sender: Arc<watch::Sender<FilterSelection>>,
}

impl Default for FilterContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterContext {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(FilterSelection::default());
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn selected(&self) -> FilterSelection {
        self.sender.borrow().clone()
    }

    pub fn selected_category(&self) -> String {
        self.sender.borrow().category.clone()
    }

    pub fn selected_store(&self) -> Option<String> {
        self.sender.borrow().store.clone()
    }

    /// Returns whether the selection changed.
    pub fn set_category(&self, category: impl Into<String>) -> bool {
        let category = category.into();
        self.sender.send_if_modified(|selection| {
            if selection.category == category {
                return false;
            }
            debug!(%category, "category filter selected");
            selection.category = category;
            true
        })
    }

    /// Returns whether the selection changed.
    pub fn set_store(&self, store: Option<String>) -> bool {
        self.sender.send_if_modified(|selection| {
            if selection.store == store {
                return false;
            }
            debug!(?store, "store filter selected");
            selection.store = store;
            true
        })
    }

    /// Back to all categories and stores.
    pub fn reset(&self) -> bool {
        self.sender.send_if_modified(|selection| {
            if *selection == FilterSelection::default() {
                return false;
            }
            *selection = FilterSelection::default();
            true
        })
    }

    /// Navigating to the home tab clears the filter.
    pub fn on_navigate(&self, tab: Tab) {
        if tab == Tab::Home {
            self.reset();
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FilterSelection> {
        self.sender.subscribe()
    }
}
