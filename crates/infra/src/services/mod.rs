//! Application services: validation, identity rules, reference resolution and
//! persistence, composed per use case.
//!
//! ```text
//! Handler → Service → Builder (validate) → Repository (write) → RestockNotifier
//! ```

pub mod items;
pub mod references;

pub use items::{CatalogItemService, StockAdjustment};
pub use references::ReferenceService;

use thiserror::Error;

use eshop_catalog::{ItemValidationError, StockError};
use eshop_core::DomainError;

use crate::repository::RepositoryError;

/// Service-level error.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Business failure (validation, identity, stock rules, not found).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The record changed underneath the caller.
    #[error("concurrent modification: {0}")]
    Concurrency(String),

    /// Storage failure.
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Concurrency(msg) => ServiceError::Concurrency(msg),
            RepositoryError::Conflict(msg) => ServiceError::Domain(DomainError::conflict(msg)),
            RepositoryError::NotFound(_) => ServiceError::Domain(DomainError::not_found()),
            other => ServiceError::Repository(other),
        }
    }
}

impl From<ItemValidationError> for ServiceError {
    fn from(err: ItemValidationError) -> Self {
        ServiceError::Domain(err.into())
    }
}

impl From<StockError> for ServiceError {
    fn from(err: StockError) -> Self {
        ServiceError::Domain(err.into())
    }
}

/// Path/body identity rules shared by every update endpoint.
fn check_identity<I>(entity: &str, path_id: I, body_id: Option<I>) -> Result<(), DomainError>
where
    I: PartialEq + core::fmt::Display,
{
    match body_id {
        None => Err(DomainError::conflict(format!("{entity} id is required"))),
        Some(body_id) if body_id != path_id => Err(DomainError::conflict(format!(
            "{entity} id {body_id} does not match path id {path_id}"
        ))),
        Some(_) => Ok(()),
    }
}

fn reject_new_with_id<I>(entity: &str, body_id: Option<I>) -> Result<(), DomainError> {
    if body_id.is_some() {
        return Err(DomainError::conflict(format!(
            "a new {entity} cannot already have an id"
        )));
    }
    Ok(())
}
