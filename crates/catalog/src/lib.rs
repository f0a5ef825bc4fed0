//! Catalog domain module.
//!
//! Business rules for catalog items, brands and types, implemented as
//! deterministic domain logic (no IO, no HTTP, no storage). Persistence and
//! transport live in `eshop-infra` / `eshop-api`.

pub mod brand;
pub mod catalog_type;
pub mod item;
pub mod reference;

pub use brand::CatalogBrand;
pub use catalog_type::CatalogType;
pub use item::{
    BrandRef, CatalogItem, CatalogItemBuilder, CatalogItemDraft, ItemReference, ItemValidationError,
    Price, RestockThresholdReached, StockError, TypeRef,
};
pub use reference::{ReferenceDraft, ReferenceEntity};
