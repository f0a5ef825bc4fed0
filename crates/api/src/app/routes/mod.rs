use axum::Router;

use eshop_catalog::{CatalogBrand, CatalogType};

pub mod items;
pub mod references;
pub mod system;

/// Router for the `/api` surface.
pub fn router() -> Router {
    Router::new()
        .nest("/api/catalog-items", items::router())
        .nest("/api/catalog-brands", references::router::<CatalogBrand>())
        .nest("/api/catalog-types", references::router::<CatalogType>())
}
