//! Infrastructure layer: persistence, notification transport and the
//! application services that tie them to the catalog domain.

pub mod db;
pub mod event_bus;
pub mod mapping;
pub mod notifications;
pub mod repository;
pub mod services;

pub use notifications::RestockNotifier;
pub use services::{CatalogItemService, ReferenceService, ServiceError, StockAdjustment};
