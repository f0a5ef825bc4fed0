use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use eshop_core::{
    AggregateRoot, CatalogBrandId, CatalogItemId, CatalogTypeId, DomainError, Entity, ValueObject,
};
use eshop_events::Event;

use crate::brand::CatalogBrand;
use crate::catalog_type::CatalogType;
use crate::reference::{ReferenceDraft, ReferenceEntity};

/// Price in the smallest currency unit (e.g. cents).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    pub fn from_minor_units(amount: i64) -> Option<Self> {
        (amount >= 0).then_some(Self(amount))
    }

    pub fn minor_units(self) -> i64 {
        self.0
    }
}

impl ValueObject for Price {}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

pub type BrandRef = ReferenceDraft<CatalogBrandId>;
pub type TypeRef = ReferenceDraft<CatalogTypeId>;

/// A brand/type reference held by a validated item (identifier always present).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemReference<I> {
    pub id: I,
    pub label: Option<String>,
}

impl<I: Copy> ItemReference<I> {
    fn to_draft(&self) -> ReferenceDraft<I> {
        ReferenceDraft::new(Some(self.id), self.label.clone())
    }
}

/// Unvalidated catalog item input. Every field is optional so the same shape
/// serves create, full update and merge-patch requests.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogItemDraft {
    pub id: Option<CatalogItemId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub picture_file_name: Option<String>,
    pub picture_url: Option<String>,
    pub available_stock: Option<i32>,
    pub restock_threshold: Option<i32>,
    pub max_stock_threshold: Option<i32>,
    pub on_reorder: Option<bool>,
    pub catalog_brand: Option<BrandRef>,
    pub catalog_type: Option<TypeRef>,
    pub version: Option<u64>,
}

impl CatalogItemDraft {
    /// Merge-patch: fields present in `self` override the existing item's
    /// values, absent fields keep them.
    ///
    /// The result is still a draft; run it through [`CatalogItemBuilder`]
    /// before storing it.
    pub fn merge_onto(&self, existing: &CatalogItem) -> CatalogItemDraft {
        let base = existing.to_draft();
        let patch = self.clone();

        CatalogItemDraft {
            id: base.id.or(patch.id),
            name: patch.name.or(base.name),
            description: patch.description.or(base.description),
            price: patch.price.or(base.price),
            picture_file_name: patch.picture_file_name.or(base.picture_file_name),
            picture_url: patch.picture_url.or(base.picture_url),
            available_stock: patch.available_stock.or(base.available_stock),
            restock_threshold: patch.restock_threshold.or(base.restock_threshold),
            max_stock_threshold: patch.max_stock_threshold.or(base.max_stock_threshold),
            on_reorder: patch.on_reorder.or(base.on_reorder),
            catalog_brand: merge_reference(patch.catalog_brand, base.catalog_brand),
            catalog_type: merge_reference(patch.catalog_type, base.catalog_type),
            version: patch.version.or(base.version),
        }
    }
}

fn merge_reference<I: Copy + PartialEq>(
    patch: Option<ReferenceDraft<I>>,
    base: Option<ReferenceDraft<I>>,
) -> Option<ReferenceDraft<I>> {
    match (patch, base) {
        (None, base) => base,
        (Some(patch), None) => Some(patch),
        (Some(patch), Some(base)) => {
            let id = patch.id.or(base.id);
            // A different id points at another record, so the old label no longer applies.
            let label = match patch.label {
                Some(label) => Some(label),
                None if id == base.id => base.label,
                None => None,
            };
            Some(ReferenceDraft::new(id, label))
        }
    }
}

/// Why a draft could not become a [`CatalogItem`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    #[error("record cannot be null")]
    MissingRecord,

    #[error(
        "name, price, availableStock, restockThreshold, maxStockThreshold, catalogBrand and catalogType cannot be null"
    )]
    MissingRequiredFields,

    #[error("price must be non-negative")]
    NegativePrice,

    #[error("available stock must be non-negative")]
    NegativeAvailableStock,

    #[error("restock threshold must be non-negative")]
    NegativeRestockThreshold,

    #[error("max stock threshold must be positive")]
    NonPositiveMaxStockThreshold,

    #[error("available stock must not exceed max stock threshold")]
    AvailableStockAboveMax,

    #[error("restock threshold must not exceed max stock threshold")]
    RestockThresholdAboveMax,

    #[error("brand must already exist")]
    BrandNotPersisted,

    #[error("type must already exist")]
    TypeNotPersisted,
}

impl From<ItemValidationError> for DomainError {
    fn from(err: ItemValidationError) -> Self {
        DomainError::validation(err.to_string())
    }
}

/// Why a stock adjustment was refused. State is untouched when this is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockError {
    #[error("empty stock, product {item} is sold out")]
    OutOfStock { item: String },

    #[error("units to adjust should be greater than zero (got {quantity})")]
    InvalidQuantity { quantity: i32 },
}

impl From<StockError> for DomainError {
    fn from(err: StockError) -> Self {
        match &err {
            StockError::OutOfStock { .. } => DomainError::out_of_stock(err.to_string()),
            StockError::InvalidQuantity { .. } => DomainError::invalid_quantity(err.to_string()),
        }
    }
}

/// Validating constructor for [`CatalogItem`].
///
/// Checks run in a fixed order and the first failure wins:
///
/// 1. a draft was supplied
/// 2. name, price, stock levels, brand and type are all present
/// 3. price, available stock and restock threshold are non-negative
/// 4. max stock threshold is positive
/// 5. available stock and restock threshold do not exceed max stock threshold
/// 6. brand and type carry an identifier
#[derive(Debug, Default)]
pub struct CatalogItemBuilder {
    draft: Option<CatalogItemDraft>,
}

impl CatalogItemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_draft(mut self, draft: CatalogItemDraft) -> Self {
        self.draft = Some(draft);
        self
    }

    pub fn build(self) -> Result<CatalogItem, ItemValidationError> {
        let draft = self.draft.ok_or(ItemValidationError::MissingRecord)?;

        let (
            Some(name),
            Some(price),
            Some(available_stock),
            Some(restock_threshold),
            Some(max_stock_threshold),
            Some(catalog_brand),
            Some(catalog_type),
        ) = (
            draft.name,
            draft.price,
            draft.available_stock,
            draft.restock_threshold,
            draft.max_stock_threshold,
            draft.catalog_brand,
            draft.catalog_type,
        )
        else {
            return Err(ItemValidationError::MissingRequiredFields);
        };

        let price = Price::from_minor_units(price).ok_or(ItemValidationError::NegativePrice)?;
        if available_stock < 0 {
            return Err(ItemValidationError::NegativeAvailableStock);
        }
        if restock_threshold < 0 {
            return Err(ItemValidationError::NegativeRestockThreshold);
        }
        if max_stock_threshold <= 0 {
            return Err(ItemValidationError::NonPositiveMaxStockThreshold);
        }
        if available_stock > max_stock_threshold {
            return Err(ItemValidationError::AvailableStockAboveMax);
        }
        if restock_threshold > max_stock_threshold {
            return Err(ItemValidationError::RestockThresholdAboveMax);
        }

        let brand_id = catalog_brand.id.ok_or(ItemValidationError::BrandNotPersisted)?;
        let type_id = catalog_type.id.ok_or(ItemValidationError::TypeNotPersisted)?;

        Ok(CatalogItem {
            id: draft.id,
            name,
            description: draft.description,
            price,
            picture_file_name: draft.picture_file_name,
            picture_url: draft.picture_url,
            available_stock,
            restock_threshold,
            max_stock_threshold,
            on_reorder: draft.on_reorder.unwrap_or(false),
            catalog_brand: ItemReference {
                id: brand_id,
                label: catalog_brand.label,
            },
            catalog_type: ItemReference {
                id: type_id,
                label: catalog_type.label,
            },
            version: draft.version.unwrap_or(0),
        })
    }
}

/// Aggregate root: CatalogItem.
///
/// Only obtainable through [`CatalogItemBuilder`], so every instance satisfies
/// `available_stock <= max_stock_threshold` and `restock_threshold <= max_stock_threshold`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    id: Option<CatalogItemId>,
    name: String,
    description: Option<String>,
    price: Price,
    picture_file_name: Option<String>,
    picture_url: Option<String>,
    available_stock: i32,
    restock_threshold: i32,
    max_stock_threshold: i32,
    on_reorder: bool,
    catalog_brand: ItemReference<CatalogBrandId>,
    catalog_type: ItemReference<CatalogTypeId>,
    version: u64,
}

impl CatalogItem {
    pub fn id_typed(&self) -> Option<CatalogItemId> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn picture_file_name(&self) -> Option<&str> {
        self.picture_file_name.as_deref()
    }

    pub fn picture_url(&self) -> Option<&str> {
        self.picture_url.as_deref()
    }

    pub fn available_stock(&self) -> i32 {
        self.available_stock
    }

    pub fn restock_threshold(&self) -> i32 {
        self.restock_threshold
    }

    pub fn max_stock_threshold(&self) -> i32 {
        self.max_stock_threshold
    }

    pub fn on_reorder(&self) -> bool {
        self.on_reorder
    }

    pub fn catalog_brand(&self) -> &ItemReference<CatalogBrandId> {
        &self.catalog_brand
    }

    pub fn catalog_type(&self) -> &ItemReference<CatalogTypeId> {
        &self.catalog_type
    }

    /// Stamp storage-assigned identity onto a freshly written item.
    pub fn into_persisted(mut self, id: CatalogItemId, version: u64) -> Self {
        self.id = Some(id);
        self.version = version;
        self
    }

    /// Replace the brand reference with a stored brand record.
    pub fn resolve_brand(&mut self, brand: &CatalogBrand) -> Result<(), ItemValidationError> {
        let id = brand.id().ok_or(ItemValidationError::BrandNotPersisted)?;
        self.catalog_brand = ItemReference {
            id,
            label: Some(brand.label().to_string()),
        };
        Ok(())
    }

    /// Replace the type reference with a stored type record.
    pub fn resolve_type(&mut self, catalog_type: &CatalogType) -> Result<(), ItemValidationError> {
        let id = catalog_type.id().ok_or(ItemValidationError::TypeNotPersisted)?;
        self.catalog_type = ItemReference {
            id,
            label: Some(catalog_type.label().to_string()),
        };
        Ok(())
    }

    /// Decrement stock by up to `quantity_desired`.
    ///
    /// If less stock is available than desired, whatever is left is removed
    /// and that amount returned; callers compare it with what they asked for.
    pub fn remove_stock(&mut self, quantity_desired: i32) -> Result<i32, StockError> {
        if self.available_stock == 0 {
            return Err(StockError::OutOfStock {
                item: self.name.clone(),
            });
        }
        if quantity_desired <= 0 {
            return Err(StockError::InvalidQuantity {
                quantity: quantity_desired,
            });
        }

        let removed = quantity_desired.min(self.available_stock);
        self.available_stock -= removed;
        Ok(removed)
    }

    /// Increment stock, clamped to the max stock threshold. Clears `on_reorder`.
    ///
    /// Returns the amount actually added.
    pub fn add_stock(&mut self, quantity: i32) -> Result<i32, StockError> {
        if quantity <= 0 {
            return Err(StockError::InvalidQuantity { quantity });
        }

        let original = self.available_stock;
        self.available_stock = original
            .saturating_add(quantity)
            .min(self.max_stock_threshold);
        self.on_reorder = false;
        Ok(self.available_stock - original)
    }

    pub fn at_restock_threshold(&self) -> bool {
        self.available_stock == self.restock_threshold
    }

    /// The notification to publish when stock sits exactly at the restock threshold.
    ///
    /// `None` when stock is elsewhere or the item was never stored.
    pub fn restock_notification(&self, occurred_at: DateTime<Utc>) -> Option<RestockThresholdReached> {
        let item_id = self.id?;
        self.at_restock_threshold().then(|| RestockThresholdReached {
            item_id,
            name: self.name.clone(),
            available_stock: self.available_stock,
            restock_threshold: self.restock_threshold,
            max_stock_threshold: self.max_stock_threshold,
            occurred_at,
        })
    }

    /// Back to the loose form, e.g. as the base for a merge-patch.
    pub fn to_draft(&self) -> CatalogItemDraft {
        CatalogItemDraft {
            id: self.id,
            name: Some(self.name.clone()),
            description: self.description.clone(),
            price: Some(self.price.minor_units()),
            picture_file_name: self.picture_file_name.clone(),
            picture_url: self.picture_url.clone(),
            available_stock: Some(self.available_stock),
            restock_threshold: Some(self.restock_threshold),
            max_stock_threshold: Some(self.max_stock_threshold),
            on_reorder: Some(self.on_reorder),
            catalog_brand: Some(self.catalog_brand.to_draft()),
            catalog_type: Some(self.catalog_type.to_draft()),
            version: Some(self.version),
        }
    }
}

impl AggregateRoot for CatalogItem {
    type Id = CatalogItemId;

    fn id(&self) -> Option<&Self::Id> {
        self.id.as_ref()
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Event: stock of an item dropped to its restock threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestockThresholdReached {
    pub item_id: CatalogItemId,
    pub name: String,
    pub available_stock: i32,
    pub restock_threshold: i32,
    pub max_stock_threshold: i32,
    pub occurred_at: DateTime<Utc>,
}

impl RestockThresholdReached {
    pub const AGGREGATE_TYPE: &'static str = "catalog.item";
}

impl Event for RestockThresholdReached {
    fn event_type(&self) -> &'static str {
        "catalog.item.restock_threshold_reached"
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(available: i32, restock: i32, max: i32) -> CatalogItemDraft {
        CatalogItemDraft {
            name: Some("Roslyn Red Sheet".to_string()),
            description: Some("A sheet of red".to_string()),
            price: Some(850),
            available_stock: Some(available),
            restock_threshold: Some(restock),
            max_stock_threshold: Some(max),
            catalog_brand: Some(BrandRef::new(
                Some(CatalogBrandId::from_i64(1)),
                Some(".NET".to_string()),
            )),
            catalog_type: Some(TypeRef::new(
                Some(CatalogTypeId::from_i64(2)),
                Some("T-Shirt".to_string()),
            )),
            ..CatalogItemDraft::default()
        }
    }

    fn item(available: i32, restock: i32, max: i32) -> CatalogItem {
        CatalogItemBuilder::new()
            .with_draft(draft(available, restock, max))
            .build()
            .unwrap()
    }

    fn build(d: CatalogItemDraft) -> Result<CatalogItem, ItemValidationError> {
        CatalogItemBuilder::new().with_draft(d).build()
    }

    #[test]
    fn builder_without_draft_is_rejected() {
        let err = CatalogItemBuilder::new().build().unwrap_err();
        assert_eq!(err, ItemValidationError::MissingRecord);
        assert_eq!(err.to_string(), "record cannot be null");
    }

    #[test]
    fn builder_names_every_required_field() {
        let all = "name, price, availableStock, restockThreshold, maxStockThreshold, catalogBrand and catalogType cannot be null";

        let err = build(CatalogItemDraft::default()).unwrap_err();
        assert_eq!(err, ItemValidationError::MissingRequiredFields);
        assert_eq!(err.to_string(), all);

        // One absent field still reports the whole list.
        let mut d = draft(1, 1, 5);
        d.name = None;
        assert_eq!(build(d).unwrap_err().to_string(), all);

        let mut d = draft(1, 1, 5);
        d.catalog_type = None;
        assert_eq!(build(d).unwrap_err().to_string(), all);
    }

    #[test]
    fn builder_rejects_negative_price() {
        let mut d = draft(1, 1, 5);
        d.price = Some(-1);
        assert_eq!(build(d).unwrap_err(), ItemValidationError::NegativePrice);
    }

    #[test]
    fn builder_accepts_zero_price() {
        let mut d = draft(1, 1, 5);
        d.price = Some(0);
        assert_eq!(build(d).unwrap().price().minor_units(), 0);
    }

    #[test]
    fn builder_checks_run_in_order() {
        fn message(d: CatalogItemDraft) -> String {
            build(d).unwrap_err().to_string()
        }

        // Negative price and stock above max: price is reported first.
        let mut d = draft(50, 1, 5);
        d.price = Some(-5);
        assert_eq!(build(d.clone()).unwrap_err(), ItemValidationError::NegativePrice);
        assert_eq!(message(d), "price must be non-negative");

        // Negative stock beats non-positive max.
        assert_eq!(
            build(draft(-1, 0, 0)).unwrap_err(),
            ItemValidationError::NegativeAvailableStock
        );
        assert_eq!(message(draft(-1, 0, 0)), "available stock must be non-negative");

        assert_eq!(
            build(draft(0, -1, 0)).unwrap_err(),
            ItemValidationError::NegativeRestockThreshold
        );
        assert_eq!(message(draft(0, -1, 0)), "restock threshold must be non-negative");

        assert_eq!(
            build(draft(0, 0, 0)).unwrap_err(),
            ItemValidationError::NonPositiveMaxStockThreshold
        );
        assert_eq!(message(draft(0, 0, 0)), "max stock threshold must be positive");

        assert_eq!(
            build(draft(11, 20, 10)).unwrap_err(),
            ItemValidationError::AvailableStockAboveMax
        );
        assert_eq!(
            message(draft(11, 0, 10)),
            "available stock must not exceed max stock threshold"
        );

        assert_eq!(
            build(draft(5, 11, 10)).unwrap_err(),
            ItemValidationError::RestockThresholdAboveMax
        );
        assert_eq!(
            message(draft(1, 11, 10)),
            "restock threshold must not exceed max stock threshold"
        );
    }

    #[test]
    fn restock_equal_to_max_is_accepted() {
        let item = item(10, 10, 10);
        assert_eq!(item.restock_threshold(), item.max_stock_threshold());
    }

    #[test]
    fn builder_requires_persisted_references() {
        let mut d = draft(1, 1, 5);
        d.catalog_brand = Some(BrandRef::new(None, Some("New".to_string())));
        d.catalog_type = Some(TypeRef::new(None, None));
        assert_eq!(build(d).unwrap_err(), ItemValidationError::BrandNotPersisted);

        let mut d = draft(1, 1, 5);
        d.catalog_type = Some(TypeRef::new(None, Some("New".to_string())));
        let err = build(d).unwrap_err();
        assert_eq!(err, ItemValidationError::TypeNotPersisted);
        assert_eq!(err.to_string(), "type must already exist");
    }

    #[test]
    fn builder_defaults_on_reorder_to_false() {
        assert!(!item(1, 1, 5).on_reorder());
    }

    #[test]
    fn remove_stock_partial_fulfilment() {
        let mut item = item(20, 5, 50);
        assert_eq!(item.remove_stock(25), Ok(20));
        assert_eq!(item.available_stock(), 0);
    }

    #[test]
    fn remove_stock_on_empty_item_names_the_item() {
        let mut item = item(0, 0, 50);
        let err = item.remove_stock(1).unwrap_err();
        assert_eq!(
            err,
            StockError::OutOfStock {
                item: "Roslyn Red Sheet".to_string()
            }
        );
        assert!(matches!(DomainError::from(err), DomainError::OutOfStock(_)));
    }

    #[test]
    fn remove_stock_rejects_non_positive_quantity() {
        let mut item = item(3, 0, 50);
        assert_eq!(
            item.remove_stock(0),
            Err(StockError::InvalidQuantity { quantity: 0 })
        );
        assert_eq!(item.available_stock(), 3);
    }

    #[test]
    fn add_stock_clamps_to_max() {
        let mut item = item(20, 5, 30);
        assert_eq!(item.add_stock(15), Ok(10));
        assert_eq!(item.available_stock(), 30);
    }

    #[test]
    fn add_stock_clears_on_reorder() {
        let mut d = draft(30, 5, 30);
        d.on_reorder = Some(true);
        let mut item = build(d).unwrap();

        // Already full: nothing added, flag still cleared.
        assert_eq!(item.add_stock(1), Ok(0));
        assert!(!item.on_reorder());
    }

    #[test]
    fn add_stock_rejects_non_positive_quantity() {
        let mut item = item(3, 0, 50);
        let err = item.add_stock(-2).unwrap_err();
        assert_eq!(err, StockError::InvalidQuantity { quantity: -2 });
        assert!(matches!(
            DomainError::from(err),
            DomainError::InvalidQuantity(_)
        ));
    }

    #[test]
    fn restock_notification_only_at_threshold_for_stored_items() {
        let now = Utc::now();

        let unsaved = item(5, 5, 10);
        assert!(unsaved.at_restock_threshold());
        assert!(unsaved.restock_notification(now).is_none());

        let stored = item(6, 5, 10).into_persisted(CatalogItemId::from_i64(3), 1);
        assert!(stored.restock_notification(now).is_none());

        let mut stored = stored;
        stored.remove_stock(1).unwrap();
        let event = stored.restock_notification(now).unwrap();
        assert_eq!(event.item_id, CatalogItemId::from_i64(3));
        assert_eq!(event.available_stock, 5);
        assert_eq!(event.event_type(), "catalog.item.restock_threshold_reached");
    }

    #[test]
    fn restock_event_serializes_camel_case() {
        let stored = item(5, 5, 10).into_persisted(CatalogItemId::from_i64(3), 1);
        let event = stored.restock_notification(Utc::now()).unwrap();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["itemId"], 3);
        assert_eq!(json["restockThreshold"], 5);
    }

    #[test]
    fn merge_patch_overrides_present_fields_only() {
        let existing = item(10, 5, 50).into_persisted(CatalogItemId::from_i64(7), 3);
        let patch = CatalogItemDraft {
            price: Some(999),
            available_stock: Some(12),
            ..CatalogItemDraft::default()
        };

        let merged = patch.merge_onto(&existing);
        assert_eq!(merged.id, Some(CatalogItemId::from_i64(7)));
        assert_eq!(merged.price, Some(999));
        assert_eq!(merged.available_stock, Some(12));
        assert_eq!(merged.name.as_deref(), Some("Roslyn Red Sheet"));
        assert_eq!(merged.version, Some(3));

        let rebuilt = build(merged).unwrap();
        assert_eq!(rebuilt.price().minor_units(), 999);
        assert_eq!(rebuilt.description(), existing.description());
    }

    #[test]
    fn merge_patch_result_is_revalidated() {
        let existing = item(10, 5, 50).into_persisted(CatalogItemId::from_i64(7), 1);
        let patch = CatalogItemDraft {
            max_stock_threshold: Some(8),
            ..CatalogItemDraft::default()
        };

        let err = build(patch.merge_onto(&existing)).unwrap_err();
        assert_eq!(err, ItemValidationError::AvailableStockAboveMax);
    }

    #[test]
    fn merge_patch_brand_switch_drops_old_label() {
        let existing = item(10, 5, 50).into_persisted(CatalogItemId::from_i64(7), 1);
        let patch = CatalogItemDraft {
            catalog_brand: Some(BrandRef::with_id(CatalogBrandId::from_i64(9))),
            ..CatalogItemDraft::default()
        };

        let merged = patch.merge_onto(&existing);
        let brand = merged.catalog_brand.unwrap();
        assert_eq!(brand.id, Some(CatalogBrandId::from_i64(9)));
        assert_eq!(brand.label, None);
        assert_eq!(
            merged.catalog_type.unwrap().label.as_deref(),
            Some("T-Shirt")
        );
    }

    #[test]
    fn resolve_brand_takes_stored_label() {
        let mut item = item(1, 1, 5);
        let brand = CatalogBrand::new(Some(CatalogBrandId::from_i64(1)), "Azure").unwrap();
        item.resolve_brand(&brand).unwrap();
        assert_eq!(item.catalog_brand().label.as_deref(), Some("Azure"));

        let unsaved = CatalogBrand::new(None, "Nope").unwrap();
        assert_eq!(
            item.resolve_brand(&unsaved),
            Err(ItemValidationError::BrandNotPersisted)
        );
    }

    #[test]
    fn price_displays_major_units() {
        assert_eq!(Price::from_minor_units(1999).unwrap().to_string(), "19.99");
        assert_eq!(Price::from_minor_units(-1), None);
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Property: removing no more than is available removes exactly that much.
            #[test]
            fn remove_within_stock_is_exact(max in 1i32..10_000, stock_seed in 1i32..10_000, q_seed in 1i32..10_000) {
                let stock = 1 + stock_seed % max;
                let q = 1 + q_seed % stock;
                let mut item = item(stock, 0, max);

                prop_assert_eq!(item.remove_stock(q), Ok(q));
                prop_assert_eq!(item.available_stock(), stock - q);
            }

            /// Property: over-asking empties the stock and returns what was there.
            #[test]
            fn remove_beyond_stock_empties(max in 1i32..10_000, stock_seed in 1i32..10_000, extra in 1i32..10_000) {
                let stock = 1 + stock_seed % max;
                let mut item = item(stock, 0, max);

                prop_assert_eq!(item.remove_stock(stock + extra), Ok(stock));
                prop_assert_eq!(item.available_stock(), 0);
            }

            /// Property: empty stock is reported regardless of the requested quantity.
            #[test]
            fn remove_from_empty_is_out_of_stock(max in 1i32..10_000, q in any::<i32>()) {
                let mut item = item(0, 0, max);
                let is_out_of_stock = matches!(item.remove_stock(q), Err(StockError::OutOfStock { .. }));
                prop_assert!(is_out_of_stock);
            }

            /// Property: non-positive removals are invalid when stock is available.
            #[test]
            fn remove_non_positive_is_invalid(max in 1i32..10_000, q in i32::MIN..=0) {
                let mut item = item(max, 0, max);
                prop_assert_eq!(item.remove_stock(q), Err(StockError::InvalidQuantity { quantity: q }));
                prop_assert_eq!(item.available_stock(), max);
            }

            /// Property: add_stock never exceeds max, clamps exactly to it, and clears on_reorder.
            #[test]
            fn add_never_exceeds_max(max in 1i32..10_000, stock_seed in 0i32..10_000, q in 1i32..=i32::MAX, on_reorder in any::<bool>()) {
                let stock = stock_seed % (max + 1);
                let mut d = draft(stock, 0, max);
                d.on_reorder = Some(on_reorder);
                let mut item = build(d).unwrap();

                let applied = item.add_stock(q).unwrap();
                prop_assert!(item.available_stock() <= max);
                prop_assert_eq!(item.available_stock(), stock + applied);
                if i64::from(stock) + i64::from(q) >= i64::from(max) {
                    prop_assert_eq!(item.available_stock(), max);
                } else {
                    prop_assert_eq!(applied, q);
                }
                prop_assert!(!item.on_reorder());
            }

            /// Property: the builder accepts restock <= max and rejects restock > max.
            #[test]
            fn restock_threshold_bound(max in 1i32..10_000, restock in 0i32..20_000) {
                let result = build(draft(0, restock, max));
                if restock <= max {
                    prop_assert!(result.is_ok());
                } else {
                    prop_assert_eq!(result.unwrap_err(), ItemValidationError::RestockThresholdAboveMax);
                }
            }

            /// Property: the builder is deterministic.
            #[test]
            fn builder_is_deterministic(price in -1_000i64..1_000, stock in -10i32..100, restock in -10i32..100, max in -10i32..100) {
                let mut d = draft(stock, restock, max);
                d.price = Some(price);
                prop_assert_eq!(build(d.clone()), build(d));
            }
        }
    }
}
