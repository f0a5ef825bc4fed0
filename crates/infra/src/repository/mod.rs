//! Catalog persistence boundary.
//!
//! Async repository traits plus two implementations: an in-memory store for
//! tests/dev and a PostgreSQL store for production.

pub mod in_memory;
pub mod postgres;
pub mod query;
pub mod r#trait;

pub use in_memory::InMemoryCatalogStore;
pub use postgres::PostgresCatalogStore;
pub use query::{CatalogItemFilter, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Page, Pagination};
pub use r#trait::{CatalogItemRepository, ReferenceRepository, RepositoryError};

use eshop_catalog::{CatalogBrand, CatalogItem, CatalogType, ReferenceEntity};

/// Storage layout of a brand/type table and how items point at it.
pub trait ReferenceTable: ReferenceEntity {
    const TABLE: &'static str;
    const LABEL_COLUMN: &'static str;

    /// The id of this kind of record an item refers to.
    fn referenced_by(item: &CatalogItem) -> Self::Id;
}

impl ReferenceTable for CatalogBrand {
    const TABLE: &'static str = "catalog_brand";
    const LABEL_COLUMN: &'static str = "brand";

    fn referenced_by(item: &CatalogItem) -> Self::Id {
        item.catalog_brand().id
    }
}

impl ReferenceTable for CatalogType {
    const TABLE: &'static str = "catalog_type";
    const LABEL_COLUMN: &'static str = "type";

    fn referenced_by(item: &CatalogItem) -> Self::Id {
        item.catalog_type().id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use eshop_catalog::{BrandRef, CatalogItemBuilder, CatalogItemDraft, TypeRef};
    use eshop_core::{CatalogBrandId, CatalogTypeId};

    #[test]
    fn reference_tables_follow_the_item_foreign_keys() {
        let item = CatalogItemBuilder::new()
            .with_draft(CatalogItemDraft {
                name: Some("Mug".to_string()),
                price: Some(850),
                available_stock: Some(1),
                restock_threshold: Some(0),
                max_stock_threshold: Some(5),
                catalog_brand: Some(BrandRef::with_id(CatalogBrandId::from_i64(3))),
                catalog_type: Some(TypeRef::with_id(CatalogTypeId::from_i64(7))),
                ..CatalogItemDraft::default()
            })
            .build()
            .unwrap();

        assert_eq!(CatalogBrand::referenced_by(&item), CatalogBrandId::from_i64(3));
        assert_eq!(CatalogType::referenced_by(&item), CatalogTypeId::from_i64(7));
        assert_eq!(
            (CatalogBrand::TABLE, CatalogBrand::LABEL_COLUMN),
            ("catalog_brand", "brand")
        );
        assert_eq!((CatalogType::TABLE, CatalogType::LABEL_COLUMN), ("catalog_type", "type"));
    }
}
