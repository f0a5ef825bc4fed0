//! Filter criteria and pagination for catalog listings.

use serde::{Deserialize, Serialize};

use eshop_catalog::CatalogItem;
use eshop_core::CatalogItemId;

/// Default page size when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Upper bound on page size.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Page request (0-based page index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn new(page: Option<u32>, size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(0),
            size: size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.size)
    }
}

/// One page of results plus the total across all pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub pagination: Pagination,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, pagination: Pagination) -> Self {
        let has_more = total > pagination.offset() + items.len() as u64;
        Self {
            items,
            total,
            pagination,
            has_more,
        }
    }

    /// Slice an already filtered, ordered collection.
    pub fn from_sorted(all: Vec<T>, pagination: Pagination) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit() as usize)
            .collect();
        Self::new(items, total, pagination)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            pagination: self.pagination,
            has_more: self.has_more,
        }
    }
}

/// Optional criteria for listing catalog items. All present criteria must match.
///
/// `name`, `description`, `brand` and `catalog_type` are exact matches (brand
/// and type against their labels); `term` is a substring of name or description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItemFilter {
    pub ids: Option<Vec<CatalogItemId>>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub catalog_type: Option<String>,
    pub term: Option<String>,
}

impl CatalogItemFilter {
    /// Evaluate the filter against an item whose brand/type labels are resolved.
    pub fn matches(&self, item: &CatalogItem) -> bool {
        if let Some(ids) = &self.ids {
            if !item.id_typed().is_some_and(|id| ids.contains(&id)) {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if item.name() != name {
                return false;
            }
        }
        if let Some(description) = &self.description {
            if item.description() != Some(description.as_str()) {
                return false;
            }
        }
        if let Some(brand) = &self.brand {
            if item.catalog_brand().label.as_deref() != Some(brand.as_str()) {
                return false;
            }
        }
        if let Some(catalog_type) = &self.catalog_type {
            if item.catalog_type().label.as_deref() != Some(catalog_type.as_str()) {
                return false;
            }
        }
        if let Some(term) = &self.term {
            let in_name = item.name().contains(term.as_str());
            let in_description = item.description().is_some_and(|d| d.contains(term.as_str()));
            if !in_name && !in_description {
                return false;
            }
        }
        true
    }
}
