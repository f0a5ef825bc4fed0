//! Persistence rows <-> domain values.
//!
//! Rows are read with `try_get` by column name; turning a row back into a
//! [`CatalogItem`] goes through the validating builder, so a row that breaks
//! an item invariant surfaces as [`RepositoryError::Mapping`] instead of an
//! invalid aggregate.

use sqlx::Row;
use sqlx::postgres::PgRow;

use eshop_catalog::{BrandRef, CatalogItem, CatalogItemBuilder, CatalogItemDraft, TypeRef};
use eshop_core::{CatalogBrandId, CatalogItemId, CatalogTypeId, ExpectedVersion};

use crate::repository::{ReferenceTable, RepositoryError};

/// Joined `catalog_item` row (brand/type labels included).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItemRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub picture_file_name: Option<String>,
    pub picture_url: Option<String>,
    pub available_stock: i32,
    pub restock_threshold: i32,
    pub max_stock_threshold: i32,
    pub on_reorder: bool,
    pub catalog_brand_id: i64,
    pub brand_label: Option<String>,
    pub catalog_type_id: i64,
    pub type_label: Option<String>,
    pub version: i64,
}

impl<'r> sqlx::FromRow<'r, PgRow> for CatalogItemRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(CatalogItemRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: row.try_get("price")?,
            picture_file_name: row.try_get("picture_file_name")?,
            picture_url: row.try_get("picture_url")?,
            available_stock: row.try_get("available_stock")?,
            restock_threshold: row.try_get("restock_threshold")?,
            max_stock_threshold: row.try_get("max_stock_threshold")?,
            on_reorder: row.try_get("on_reorder")?,
            catalog_brand_id: row.try_get("catalog_brand_id")?,
            brand_label: row.try_get("brand_label")?,
            catalog_type_id: row.try_get("catalog_type_id")?,
            type_label: row.try_get("type_label")?,
            version: row.try_get("version")?,
        })
    }
}

impl TryFrom<CatalogItemRow> for CatalogItem {
    type Error = RepositoryError;

    fn try_from(row: CatalogItemRow) -> Result<Self, Self::Error> {
        let id = CatalogItemId::from_i64(row.id);
        let version = u64::try_from(row.version)
            .map_err(|_| RepositoryError::Mapping(format!("catalog_item {id}: negative version")))?;

        let draft = CatalogItemDraft {
            id: Some(id),
            name: Some(row.name),
            description: row.description,
            price: Some(row.price),
            picture_file_name: row.picture_file_name,
            picture_url: row.picture_url,
            available_stock: Some(row.available_stock),
            restock_threshold: Some(row.restock_threshold),
            max_stock_threshold: Some(row.max_stock_threshold),
            on_reorder: Some(row.on_reorder),
            catalog_brand: Some(BrandRef::new(
                Some(CatalogBrandId::from_i64(row.catalog_brand_id)),
                row.brand_label,
            )),
            catalog_type: Some(TypeRef::new(
                Some(CatalogTypeId::from_i64(row.catalog_type_id)),
                row.type_label,
            )),
            version: Some(version),
        };

        CatalogItemBuilder::new()
            .with_draft(draft)
            .build()
            .map_err(|e| RepositoryError::Mapping(format!("catalog_item {id}: {e}")))
    }
}

/// Column values written for an item (everything except id and version).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItemValues {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub picture_file_name: Option<String>,
    pub picture_url: Option<String>,
    pub available_stock: i32,
    pub restock_threshold: i32,
    pub max_stock_threshold: i32,
    pub on_reorder: bool,
    pub catalog_brand_id: i64,
    pub catalog_type_id: i64,
}

impl From<&CatalogItem> for CatalogItemValues {
    fn from(item: &CatalogItem) -> Self {
        Self {
            name: item.name().to_string(),
            description: item.description().map(str::to_string),
            price: item.price().minor_units(),
            picture_file_name: item.picture_file_name().map(str::to_string),
            picture_url: item.picture_url().map(str::to_string),
            available_stock: item.available_stock(),
            restock_threshold: item.restock_threshold(),
            max_stock_threshold: item.max_stock_threshold(),
            on_reorder: item.on_reorder(),
            catalog_brand_id: item.catalog_brand().id.as_i64(),
            catalog_type_id: item.catalog_type().id.as_i64(),
        }
    }
}

/// Expected version as a query parameter (`None` = unconditional write).
pub fn version_param(expected: ExpectedVersion) -> Option<i64> {
    match expected {
        ExpectedVersion::Any => None,
        ExpectedVersion::Exact(v) => Some(i64::try_from(v).unwrap_or(i64::MAX)),
    }
}

/// `catalog_brand` / `catalog_type` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceRow {
    pub id: i64,
    pub label: String,
}

impl<'r> sqlx::FromRow<'r, PgRow> for ReferenceRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ReferenceRow {
            id: row.try_get("id")?,
            label: row.try_get("label")?,
        })
    }
}

impl ReferenceRow {
    pub fn into_domain<R: ReferenceTable>(self) -> Result<R, RepositoryError> {
        R::from_parts(Some(R::Id::from(self.id)), Some(self.label))
            .map_err(|e| RepositoryError::Mapping(format!("{} {}: {e}", R::TABLE, self.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eshop_catalog::{CatalogBrand, ReferenceEntity};
    use eshop_core::AggregateRoot;

    fn row() -> CatalogItemRow {
        CatalogItemRow {
            id: 5,
            name: ".NET Bot Black Hoodie".to_string(),
            description: None,
            price: 1950,
            picture_file_name: Some("1.png".to_string()),
            picture_url: None,
            available_stock: 100,
            restock_threshold: 10,
            max_stock_threshold: 200,
            on_reorder: false,
            catalog_brand_id: 1,
            brand_label: Some(".NET".to_string()),
            catalog_type_id: 2,
            type_label: Some("T-Shirt".to_string()),
            version: 4,
        }
    }

    #[test]
    fn row_maps_to_item_and_back() {
        let item = CatalogItem::try_from(row()).unwrap();
        assert_eq!(item.id_typed(), Some(CatalogItemId::from_i64(5)));
        assert_eq!(item.version(), 4);
        assert_eq!(item.catalog_brand().label.as_deref(), Some(".NET"));

        let values = CatalogItemValues::from(&item);
        assert_eq!(values.price, 1950);
        assert_eq!(values.catalog_type_id, 2);
        assert_eq!(values.picture_file_name.as_deref(), Some("1.png"));
    }

    #[test]
    fn invalid_row_is_a_mapping_error() {
        let mut bad = row();
        bad.available_stock = 500;
        let err = CatalogItem::try_from(bad).unwrap_err();
        assert!(matches!(err, RepositoryError::Mapping(_)));
    }

    #[test]
    fn reference_row_maps_to_brand() {
        let brand: CatalogBrand = ReferenceRow {
            id: 3,
            label: "Azure".to_string(),
        }
        .into_domain()
        .unwrap();
        assert_eq!(brand.label(), "Azure");
    }

    #[test]
    fn version_param_is_none_for_any() {
        assert_eq!(version_param(ExpectedVersion::Any), None);
        assert_eq!(version_param(ExpectedVersion::Exact(7)), Some(7));
    }
}
