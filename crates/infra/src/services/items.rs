use std::sync::Arc;

use tracing::debug;

use eshop_catalog::{CatalogBrand, CatalogItem, CatalogItemBuilder, CatalogItemDraft, CatalogType};
use eshop_core::{AggregateRoot, CatalogItemId, DomainError, ExpectedVersion};

use super::{ServiceError, check_identity, reject_new_with_id};
use crate::notifications::RestockNotifier;
use crate::repository::{
    CatalogItemFilter, CatalogItemRepository, Page, Pagination, ReferenceRepository,
    RepositoryError,
};

const ENTITY: &str = "catalogItem";

pub const DEFAULT_STOCK_UPDATE_ATTEMPTS: u32 = 3;

/// Outcome of a stock change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockAdjustment {
    pub item: CatalogItem,
    pub requested: i32,
    /// Units actually added/removed (clamping and partial removal included).
    pub applied: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StockChange {
    Add,
    Remove,
}

/// Catalog item use cases.
#[derive(Clone)]
pub struct CatalogItemService {
    items: Arc<dyn CatalogItemRepository>,
    brands: Arc<dyn ReferenceRepository<CatalogBrand>>,
    types: Arc<dyn ReferenceRepository<CatalogType>>,
    notifier: RestockNotifier,
    stock_update_attempts: u32,
}

impl CatalogItemService {
    pub fn new(
        items: Arc<dyn CatalogItemRepository>,
        brands: Arc<dyn ReferenceRepository<CatalogBrand>>,
        types: Arc<dyn ReferenceRepository<CatalogType>>,
        notifier: RestockNotifier,
    ) -> Self {
        Self {
            items,
            brands,
            types,
            notifier,
            stock_update_attempts: DEFAULT_STOCK_UPDATE_ATTEMPTS,
        }
    }

    /// How many times a stock change is tried when the row keeps moving.
    pub fn with_stock_update_attempts(mut self, attempts: u32) -> Self {
        self.stock_update_attempts = attempts.max(1);
        self
    }

    pub async fn create(&self, draft: CatalogItemDraft) -> Result<CatalogItem, ServiceError> {
        debug!("request to save CatalogItem: {draft:?}");
        reject_new_with_id(ENTITY, draft.id)?;

        let item = self.validated(draft).await?;
        Ok(self.items.insert(item).await?)
    }

    pub async fn update(
        &self,
        id: CatalogItemId,
        draft: CatalogItemDraft,
    ) -> Result<CatalogItem, ServiceError> {
        debug!(%id, "request to update CatalogItem: {draft:?}");
        check_identity(ENTITY, id, draft.id)?;
        let existing = self.require(id).await?;

        let expected = ExpectedVersion::from(draft.version);
        let item = self.validated(draft).await?;
        self.write(&existing, item, expected).await
    }

    pub async fn partial_update(
        &self,
        id: CatalogItemId,
        patch: CatalogItemDraft,
    ) -> Result<CatalogItem, ServiceError> {
        debug!(%id, "request to partially update CatalogItem: {patch:?}");
        check_identity(ENTITY, id, patch.id)?;
        let existing = self.require(id).await?;

        // An omitted version means last writer wins.
        let expected = ExpectedVersion::from(patch.version);
        let item = self.validated(patch.merge_onto(&existing)).await?;
        self.write(&existing, item, expected).await
    }

    pub async fn find_all(
        &self,
        filter: &CatalogItemFilter,
        pagination: Pagination,
    ) -> Result<Page<CatalogItem>, ServiceError> {
        debug!("request to get all CatalogItems: {filter:?}");
        Ok(self.items.find_all(filter, pagination).await?)
    }

    pub async fn find_one(&self, id: CatalogItemId) -> Result<Option<CatalogItem>, ServiceError> {
        debug!(%id, "request to get CatalogItem");
        Ok(self.items.find_by_id(id).await?)
    }

    pub async fn delete(&self, id: CatalogItemId) -> Result<(), ServiceError> {
        debug!(%id, "request to delete CatalogItem");
        self.items.delete(id).await?;
        Ok(())
    }

    pub async fn add_stock(
        &self,
        id: CatalogItemId,
        quantity: i32,
    ) -> Result<StockAdjustment, ServiceError> {
        debug!(%id, quantity, "request to add stock");
        self.adjust_stock(id, quantity, StockChange::Add).await
    }

    pub async fn remove_stock(
        &self,
        id: CatalogItemId,
        quantity: i32,
    ) -> Result<StockAdjustment, ServiceError> {
        debug!(%id, quantity, "request to remove stock");
        self.adjust_stock(id, quantity, StockChange::Remove).await
    }

    /// Load, adjust, then write conditionally on the loaded version.
    async fn adjust_stock(
        &self,
        id: CatalogItemId,
        quantity: i32,
        change: StockChange,
    ) -> Result<StockAdjustment, ServiceError> {
        if quantity <= 0 {
            return Err(DomainError::invalid_quantity(format!(
                "units to adjust should be greater than zero (got {quantity})"
            ))
            .into());
        }

        for attempt in 1..=self.stock_update_attempts {
            let mut item = self.require(id).await?;
            let loaded_version = item.version();

            let applied = match change {
                StockChange::Add => item.add_stock(quantity)?,
                StockChange::Remove => item.remove_stock(quantity)?,
            };

            match self
                .items
                .update(item, ExpectedVersion::Exact(loaded_version))
                .await
            {
                Ok(stored) => {
                    if change == StockChange::Remove {
                        self.notifier.notify_if_needed(&stored);
                    }
                    return Ok(StockAdjustment {
                        item: stored,
                        requested: quantity,
                        applied,
                    });
                }
                Err(RepositoryError::Concurrency(msg)) => {
                    debug!(%id, attempt, "stock update lost a race: {msg}");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ServiceError::Concurrency(format!(
            "catalog_item {id}: stock update gave up after {} attempts",
            self.stock_update_attempts
        )))
    }

    async fn write(
        &self,
        existing: &CatalogItem,
        item: CatalogItem,
        expected: ExpectedVersion,
    ) -> Result<CatalogItem, ServiceError> {
        let stored = self.items.update(item, expected).await?;
        if stored.available_stock() < existing.available_stock() {
            self.notifier.notify_if_needed(&stored);
        }
        Ok(stored)
    }

    async fn require(&self, id: CatalogItemId) -> Result<CatalogItem, ServiceError> {
        self.items
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found().into())
    }

    /// Builder validation, then brand/type lookup.
    async fn validated(&self, draft: CatalogItemDraft) -> Result<CatalogItem, ServiceError> {
        let mut item = CatalogItemBuilder::new().with_draft(draft).build()?;

        let brand = self
            .brands
            .find_by_id(item.catalog_brand().id)
            .await?
            .ok_or_else(|| DomainError::validation("brand must already exist"))?;
        item.resolve_brand(&brand)?;

        let catalog_type = self
            .types
            .find_by_id(item.catalog_type().id)
            .await?
            .ok_or_else(|| DomainError::validation("type must already exist"))?;
        item.resolve_type(&catalog_type)?;

        Ok(item)
    }
}
