use std::sync::Arc;

use tracing::debug;

use eshop_catalog::{ReferenceDraft, ReferenceEntity};
use eshop_core::DomainError;

use super::{ServiceError, check_identity, reject_new_with_id};
use crate::repository::{Page, Pagination, ReferenceRepository};

/// CRUD for brands and types.
pub struct ReferenceService<R: ReferenceEntity> {
    repository: Arc<dyn ReferenceRepository<R>>,
}

impl<R: ReferenceEntity> Clone for ReferenceService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
        }
    }
}

impl<R: ReferenceEntity> ReferenceService<R> {
    pub fn new(repository: Arc<dyn ReferenceRepository<R>>) -> Self {
        Self { repository }
    }

    pub async fn create(&self, draft: ReferenceDraft<R::Id>) -> Result<R, ServiceError> {
        debug!(kind = R::KIND, "request to create: {draft:?}");
        reject_new_with_id(R::KIND, draft.id)?;

        let record = R::from_parts(None, draft.label)?;
        Ok(self.repository.insert(record).await?)
    }

    pub async fn update(&self, id: R::Id, draft: ReferenceDraft<R::Id>) -> Result<R, ServiceError> {
        debug!(kind = R::KIND, %id, "request to update: {draft:?}");
        check_identity(R::KIND, id, draft.id)?;
        self.require(id).await?;

        let record = R::from_parts(Some(id), draft.label)?;
        Ok(self.repository.update(record).await?)
    }

    pub async fn partial_update(
        &self,
        id: R::Id,
        patch: ReferenceDraft<R::Id>,
    ) -> Result<R, ServiceError> {
        debug!(kind = R::KIND, %id, "request to partially update: {patch:?}");
        check_identity(R::KIND, id, patch.id)?;
        let existing = self.require(id).await?;

        let merged = existing.merged(patch)?;
        Ok(self.repository.update(merged).await?)
    }

    pub async fn find_all(&self, pagination: Pagination) -> Result<Page<R>, ServiceError> {
        debug!(kind = R::KIND, "request to get all");
        Ok(self.repository.find_all(pagination).await?)
    }

    pub async fn find_one(&self, id: R::Id) -> Result<Option<R>, ServiceError> {
        debug!(kind = R::KIND, %id, "request to get");
        Ok(self.repository.find_by_id(id).await?)
    }

    pub async fn delete(&self, id: R::Id) -> Result<(), ServiceError> {
        debug!(kind = R::KIND, %id, "request to delete");
        self.repository.delete(id).await?;
        Ok(())
    }

    async fn require(&self, id: R::Id) -> Result<R, ServiceError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found().into())
    }
}
