//! Brand and type endpoints. Both resources share one set of handlers,
//! specialised through [`ReferenceResource`].

use std::fmt::Debug;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use eshop_catalog::{CatalogBrand, CatalogType, ReferenceDraft, ReferenceEntity};
use eshop_core::DomainError;
use eshop_infra::ReferenceService;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// HTTP face of a brand/type record.
pub trait ReferenceResource: ReferenceEntity {
    type Dto: Serialize + DeserializeOwned + Debug + Send + 'static;

    /// Name used in log lines.
    const NAME: &'static str;
    /// Collection path, used for `Location` headers.
    const PATH: &'static str;

    fn service(services: &AppServices) -> &ReferenceService<Self>;

    fn to_dto(&self) -> Self::Dto;

    fn into_draft(dto: Self::Dto) -> ReferenceDraft<Self::Id>;
}

impl ReferenceResource for CatalogBrand {
    type Dto = dto::CatalogBrandDto;
    const NAME: &'static str = "CatalogBrand";
    const PATH: &'static str = "/api/catalog-brands";

    fn service(services: &AppServices) -> &ReferenceService<Self> {
        &services.brands
    }

    fn to_dto(&self) -> Self::Dto {
        self.into()
    }

    fn into_draft(dto: Self::Dto) -> ReferenceDraft<Self::Id> {
        dto.into()
    }
}

impl ReferenceResource for CatalogType {
    type Dto = dto::CatalogTypeDto;
    const NAME: &'static str = "CatalogType";
    const PATH: &'static str = "/api/catalog-types";

    fn service(services: &AppServices) -> &ReferenceService<Self> {
        &services.types
    }

    fn to_dto(&self) -> Self::Dto {
        self.into()
    }

    fn into_draft(dto: Self::Dto) -> ReferenceDraft<Self::Id> {
        dto.into()
    }
}

pub fn router<R: ReferenceResource>() -> Router {
    Router::new()
        .route("/", post(create::<R>).get(list::<R>))
        .route(
            "/:id",
            get(get_one::<R>)
                .put(update::<R>)
                .patch(partial_update::<R>)
                .delete(delete::<R>),
        )
}

fn parse_id<R: ReferenceResource>(raw: &str) -> Result<R::Id, axum::response::Response> {
    raw.trim()
        .parse::<i64>()
        .map(R::Id::from)
        .map_err(|e| {
            errors::domain_error_to_response(DomainError::invalid_id(format!("{}: {e}", R::NAME)))
        })
}

pub async fn create<R: ReferenceResource>(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<R::Dto>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::json_body(body) {
        Ok(body) => body,
        Err(resp) => return resp,
    };
    debug!("REST request to save {}: {body:?}", R::NAME);

    let record = match R::service(&services).create(R::into_draft(body)).await {
        Ok(r) => r,
        Err(e) => return errors::service_error_to_response(e),
    };

    let mut headers = HeaderMap::new();
    if let Some(id) = record.id() {
        if let Ok(location) = HeaderValue::from_str(&format!("{}/{id}", R::PATH)) {
            headers.insert(header::LOCATION, location);
        }
    }

    (StatusCode::CREATED, headers, Json(record.to_dto())).into_response()
}

pub async fn update<R: ReferenceResource>(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<R::Dto>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::json_body(body) {
        Ok(body) => body,
        Err(resp) => return resp,
    };
    debug!(%id, "REST request to update {}: {body:?}", R::NAME);
    let id = match parse_id::<R>(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match R::service(&services).update(id, R::into_draft(body)).await {
        Ok(record) => (StatusCode::OK, Json(record.to_dto())).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn partial_update<R: ReferenceResource>(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<R::Dto>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::json_body(body) {
        Ok(body) => body,
        Err(resp) => return resp,
    };
    debug!(%id, "REST request to partially update {}: {body:?}", R::NAME);
    let id = match parse_id::<R>(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match R::service(&services)
        .partial_update(id, R::into_draft(body))
        .await
    {
        Ok(record) => (StatusCode::OK, Json(record.to_dto())).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list<R: ReferenceResource>(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::PageQuery>,
) -> axum::response::Response {
    debug!("REST request to get a page of {}s", R::NAME);

    let page = match R::service(&services).find_all(query.pagination()).await {
        Ok(p) => p,
        Err(e) => return errors::service_error_to_response(e),
    };

    let mut headers = HeaderMap::new();
    headers.insert(super::items::TOTAL_COUNT_HEADER, HeaderValue::from(page.total));

    let body = dto::PageResponse::from_page(page, |record: &R| record.to_dto());
    (StatusCode::OK, headers, Json(body)).into_response()
}

pub async fn get_one<R: ReferenceResource>(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    debug!(%id, "REST request to get {}", R::NAME);
    let id = match parse_id::<R>(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match R::service(&services).find_one(id).await {
        Ok(Some(record)) => (StatusCode::OK, Json(record.to_dto())).into_response(),
        Ok(None) => errors::not_found(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete<R: ReferenceResource>(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    debug!(%id, "REST request to delete {}", R::NAME);
    let id = match parse_id::<R>(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match R::service(&services).delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
