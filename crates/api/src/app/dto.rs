//! Request/response DTOs (camelCase JSON) and their mapping to domain values.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value as JsonValue;

use eshop_catalog::{
    BrandRef, CatalogBrand, CatalogItem, CatalogItemDraft, CatalogType, ItemReference,
    ReferenceDraft, ReferenceEntity, TypeRef,
};
use eshop_core::{AggregateRoot, CatalogBrandId, CatalogItemId, CatalogTypeId, DomainError, Entity};
use eshop_infra::repository::{CatalogItemFilter, Page, Pagination};

// -------------------------
// Brands / types
// -------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogBrandDto {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub brand: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogTypeDto {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl From<CatalogBrandDto> for ReferenceDraft<CatalogBrandId> {
    fn from(dto: CatalogBrandDto) -> Self {
        ReferenceDraft::new(dto.id.map(CatalogBrandId::from_i64), dto.brand)
    }
}

impl From<CatalogTypeDto> for ReferenceDraft<CatalogTypeId> {
    fn from(dto: CatalogTypeDto) -> Self {
        ReferenceDraft::new(dto.id.map(CatalogTypeId::from_i64), dto.kind)
    }
}

impl From<&CatalogBrand> for CatalogBrandDto {
    fn from(brand: &CatalogBrand) -> Self {
        Self {
            id: brand.id().map(|id| id.as_i64()),
            brand: Some(brand.label().to_string()),
        }
    }
}

impl From<&CatalogType> for CatalogTypeDto {
    fn from(catalog_type: &CatalogType) -> Self {
        Self {
            id: catalog_type.id().map(|id| id.as_i64()),
            kind: Some(catalog_type.label().to_string()),
        }
    }
}

impl From<&ItemReference<CatalogBrandId>> for CatalogBrandDto {
    fn from(reference: &ItemReference<CatalogBrandId>) -> Self {
        Self {
            id: Some(reference.id.as_i64()),
            brand: reference.label.clone(),
        }
    }
}

impl From<&ItemReference<CatalogTypeId>> for CatalogTypeDto {
    fn from(reference: &ItemReference<CatalogTypeId>) -> Self {
        Self {
            id: Some(reference.id.as_i64()),
            kind: reference.label.clone(),
        }
    }
}

// -------------------------
// Prices
// -------------------------

/// A price as sent by a client: a JSON number or numeric string, kept as its
/// decimal text until it is converted to minor units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceAmount(String);

impl PriceAmount {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Exact conversion to cents. At most two fractional digits are allowed.
    pub fn minor_units(&self) -> Result<i64, DomainError> {
        parse_minor_units(&self.0).ok_or_else(|| {
            DomainError::validation(format!(
                "price {} must be a decimal with at most 2 fractional digits",
                self.0
            ))
        })
    }
}

impl<'de> Deserialize<'de> for PriceAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // serde_json renders floats with their shortest round-trip text, so
        // 19.99 arrives here as "19.99".
        match JsonValue::deserialize(deserializer)? {
            JsonValue::Number(n) => Ok(Self(n.to_string())),
            JsonValue::String(s) => Ok(Self(s.trim().to_string())),
            other => Err(de::Error::custom(format!(
                "price must be a decimal number, got {other}"
            ))),
        }
    }
}

fn parse_minor_units(raw: &str) -> Option<i64> {
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    if whole.is_empty()
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > 2 {
        return None;
    }
    let cents: i64 = format!("{fraction:0<2}").parse().ok()?;
    let units = whole.parse::<i64>().ok()?.checked_mul(100)?.checked_add(cents)?;
    Some(if negative { -units } else { units })
}

/// Minor units on the domain side, a decimal amount on the wire.
mod decimal_price {
    use super::*;

    pub fn serialize<S: Serializer>(minor_units: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(*minor_units as f64 / 100.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        PriceAmount::deserialize(deserializer)?
            .minor_units()
            .map_err(de::Error::custom)
    }
}

// -------------------------
// Items
// -------------------------

/// Body of create, full update and merge-patch requests. Absent fields stay `None`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogItemRequest {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<PriceAmount>,
    pub picture_file_name: Option<String>,
    pub picture_url: Option<String>,
    pub available_stock: Option<i32>,
    pub restock_threshold: Option<i32>,
    pub max_stock_threshold: Option<i32>,
    pub on_reorder: Option<bool>,
    pub catalog_brand: Option<CatalogBrandDto>,
    pub catalog_type: Option<CatalogTypeDto>,
    pub version: Option<u64>,
}

impl TryFrom<CatalogItemRequest> for CatalogItemDraft {
    type Error = DomainError;

    fn try_from(req: CatalogItemRequest) -> Result<Self, Self::Error> {
        let price = req.price.as_ref().map(PriceAmount::minor_units).transpose()?;

        Ok(CatalogItemDraft {
            id: req.id.map(CatalogItemId::from_i64),
            name: req.name,
            description: req.description,
            price,
            picture_file_name: req.picture_file_name,
            picture_url: req.picture_url,
            available_stock: req.available_stock,
            restock_threshold: req.restock_threshold,
            max_stock_threshold: req.max_stock_threshold,
            on_reorder: req.on_reorder,
            catalog_brand: req.catalog_brand.map(BrandRef::from),
            catalog_type: req.catalog_type.map(TypeRef::from),
            version: req.version,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItemResponse {
    pub id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "decimal_price")]
    pub price: i64,
    pub picture_file_name: Option<String>,
    pub picture_url: Option<String>,
    pub available_stock: i32,
    pub restock_threshold: i32,
    pub max_stock_threshold: i32,
    pub on_reorder: bool,
    pub catalog_brand: CatalogBrandDto,
    pub catalog_type: CatalogTypeDto,
    pub version: u64,
}

impl From<&CatalogItem> for CatalogItemResponse {
    fn from(item: &CatalogItem) -> Self {
        Self {
            id: item.id_typed().map(|id| id.as_i64()),
            name: item.name().to_string(),
            description: item.description().map(str::to_string),
            price: item.price().minor_units(),
            picture_file_name: item.picture_file_name().map(str::to_string),
            picture_url: item.picture_url().map(str::to_string),
            available_stock: item.available_stock(),
            restock_threshold: item.restock_threshold(),
            max_stock_threshold: item.max_stock_threshold(),
            on_reorder: item.on_reorder(),
            catalog_brand: item.catalog_brand().into(),
            catalog_type: item.catalog_type().into(),
            version: item.version(),
        }
    }
}

/// Body of the add/remove stock endpoints; only the id matters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StockRequest {
    pub id: Option<i64>,
}

// -------------------------
// Listing
// -------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl PageQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.size)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ItemListQuery {
    /// Comma-separated item ids.
    pub ids: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
    #[serde(rename = "type")]
    pub catalog_type: Option<String>,
    pub term: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl ItemListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.size)
    }

    pub fn filter(&self) -> Result<CatalogItemFilter, DomainError> {
        let ids = match self.ids.as_deref() {
            None => None,
            Some(raw) => Some(
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::parse::<CatalogItemId>)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };

        Ok(CatalogItemFilter {
            ids,
            name: self.name.clone(),
            description: self.description.clone(),
            brand: self.brand.clone(),
            catalog_type: self.catalog_type.clone(),
            term: self.term.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
    pub has_more: bool,
}

impl<T> PageResponse<T> {
    pub fn from_page<U>(page: Page<U>, f: impl FnMut(&U) -> T) -> Self {
        Self {
            items: page.items.iter().map(f).collect(),
            total: page.total,
            page: page.pagination.page,
            size: page.pagination.size,
            has_more: page.has_more,
        }
    }
}
