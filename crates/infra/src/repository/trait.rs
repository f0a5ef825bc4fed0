use std::sync::Arc;

use thiserror::Error;

use eshop_catalog::{CatalogItem, ReferenceEntity};
use eshop_core::{CatalogItemId, ExpectedVersion};

use super::query::{CatalogItemFilter, Page, Pagination};

/// Repository operation error.
///
/// These are **infrastructure errors** (storage, concurrency, integrity) as
/// opposed to domain errors (validation, stock rules).
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Optimistic concurrency check failed (row version moved on).
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    /// An integrity rule was broken (duplicate key, dangling or still-referenced row).
    #[error("integrity conflict: {0}")]
    Conflict(String),

    /// The row to update does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A stored row could not be turned back into a domain value.
    #[error("row mapping failed: {0}")]
    Mapping(String),

    /// Driver / connection failure.
    #[error("database error: {0}")]
    Database(String),
}

/// Persistence gateway for catalog items.
///
/// Items returned from any method have their brand/type labels resolved
/// against the current brand/type records.
///
/// ## Versioning
///
/// `insert` stores version 1. `update` only writes when `expected` matches the
/// stored version and bumps it by one; otherwise it fails with
/// [`RepositoryError::Concurrency`].
#[async_trait::async_trait]
pub trait CatalogItemRepository: Send + Sync {
    async fn insert(&self, item: CatalogItem) -> Result<CatalogItem, RepositoryError>;

    async fn update(
        &self,
        item: CatalogItem,
        expected: ExpectedVersion,
    ) -> Result<CatalogItem, RepositoryError>;

    async fn find_by_id(&self, id: CatalogItemId) -> Result<Option<CatalogItem>, RepositoryError>;

    /// Items matching `filter`, ordered by id.
    async fn find_all(
        &self,
        filter: &CatalogItemFilter,
        pagination: Pagination,
    ) -> Result<Page<CatalogItem>, RepositoryError>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: CatalogItemId) -> Result<bool, RepositoryError>;
}

/// Persistence gateway for brands and types.
#[async_trait::async_trait]
pub trait ReferenceRepository<R: ReferenceEntity>: Send + Sync {
    async fn insert(&self, record: R) -> Result<R, RepositoryError>;

    /// Overwrite the label of an existing record.
    async fn update(&self, record: R) -> Result<R, RepositoryError>;

    async fn find_by_id(&self, id: R::Id) -> Result<Option<R>, RepositoryError>;

    /// All records ordered by id.
    async fn find_all(&self, pagination: Pagination) -> Result<Page<R>, RepositoryError>;

    /// Fails with [`RepositoryError::Conflict`] while items still reference the record.
    async fn delete(&self, id: R::Id) -> Result<bool, RepositoryError>;
}

#[async_trait::async_trait]
impl<S> CatalogItemRepository for Arc<S>
where
    S: CatalogItemRepository + ?Sized,
{
    async fn insert(&self, item: CatalogItem) -> Result<CatalogItem, RepositoryError> {
        (**self).insert(item).await
    }

    async fn update(
        &self,
        item: CatalogItem,
        expected: ExpectedVersion,
    ) -> Result<CatalogItem, RepositoryError> {
        (**self).update(item, expected).await
    }

    async fn find_by_id(&self, id: CatalogItemId) -> Result<Option<CatalogItem>, RepositoryError> {
        (**self).find_by_id(id).await
    }

    async fn find_all(
        &self,
        filter: &CatalogItemFilter,
        pagination: Pagination,
    ) -> Result<Page<CatalogItem>, RepositoryError> {
        (**self).find_all(filter, pagination).await
    }

    async fn delete(&self, id: CatalogItemId) -> Result<bool, RepositoryError> {
        (**self).delete(id).await
    }
}

#[async_trait::async_trait]
impl<R, S> ReferenceRepository<R> for Arc<S>
where
    R: ReferenceEntity,
    S: ReferenceRepository<R> + ?Sized,
{
    async fn insert(&self, record: R) -> Result<R, RepositoryError> {
        (**self).insert(record).await
    }

    async fn update(&self, record: R) -> Result<R, RepositoryError> {
        (**self).update(record).await
    }

    async fn find_by_id(&self, id: R::Id) -> Result<Option<R>, RepositoryError> {
        (**self).find_by_id(id).await
    }

    async fn find_all(&self, pagination: Pagination) -> Result<Page<R>, RepositoryError> {
        (**self).find_all(pagination).await
    }

    async fn delete(&self, id: R::Id) -> Result<bool, RepositoryError> {
        (**self).delete(id).await
    }
}
