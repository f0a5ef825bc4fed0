use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
    routing::{get, patch, post},
};
use tracing::debug;

use eshop_catalog::CatalogItemDraft;
use eshop_core::CatalogItemId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub const STOCK_APPLIED_HEADER: &str = "x-stock-applied";
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_item).get(list_items))
        .route(
            "/:id",
            get(get_item)
                .put(update_item)
                .patch(partial_update_item)
                .delete(delete_item),
        )
        .route("/add/:quantity", patch(add_stock))
        .route("/remove/:quantity", patch(remove_stock))
}

fn parse_id(raw: &str) -> Result<CatalogItemId, axum::response::Response> {
    raw.parse().map_err(errors::domain_error_to_response)
}

fn item_json(item: &eshop_catalog::CatalogItem) -> Json<dto::CatalogItemResponse> {
    Json(dto::CatalogItemResponse::from(item))
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CatalogItemRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::json_body(body) {
        Ok(body) => body,
        Err(resp) => return resp,
    };
    debug!("REST request to save CatalogItem: {body:?}");
    let draft = match CatalogItemDraft::try_from(body) {
        Ok(draft) => draft,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let item = match services.items.create(draft).await {
        Ok(item) => item,
        Err(e) => return errors::service_error_to_response(e),
    };

    let mut headers = HeaderMap::new();
    if let Some(id) = item.id_typed() {
        if let Ok(location) = HeaderValue::from_str(&format!("/api/catalog-items/{id}")) {
            headers.insert(header::LOCATION, location);
        }
    }

    (StatusCode::CREATED, headers, item_json(&item)).into_response()
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::CatalogItemRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::json_body(body) {
        Ok(body) => body,
        Err(resp) => return resp,
    };
    debug!(%id, "REST request to update CatalogItem: {body:?}");
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let draft = match CatalogItemDraft::try_from(body) {
        Ok(draft) => draft,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.items.update(id, draft).await {
        Ok(item) => (StatusCode::OK, item_json(&item)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn partial_update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::CatalogItemRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::json_body(body) {
        Ok(body) => body,
        Err(resp) => return resp,
    };
    debug!(%id, "REST request to partially update CatalogItem: {body:?}");
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let draft = match CatalogItemDraft::try_from(body) {
        Ok(draft) => draft,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.items.partial_update(id, draft).await {
        Ok(item) => (StatusCode::OK, item_json(&item)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ItemListQuery>,
) -> axum::response::Response {
    debug!("REST request to get CatalogItems by criteria: {query:?}");
    let filter = match query.filter() {
        Ok(f) => f,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let page = match services.items.find_all(&filter, query.pagination()).await {
        Ok(p) => p,
        Err(e) => return errors::service_error_to_response(e),
    };

    let mut headers = HeaderMap::new();
    headers.insert(TOTAL_COUNT_HEADER, HeaderValue::from(page.total));

    let body = dto::PageResponse::from_page(page, |item| dto::CatalogItemResponse::from(item));
    (StatusCode::OK, headers, Json(body)).into_response()
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    debug!(%id, "REST request to get CatalogItem");
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.items.find_one(id).await {
        Ok(Some(item)) => (StatusCode::OK, item_json(&item)).into_response(),
        Ok(None) => errors::not_found(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    debug!(%id, "REST request to delete CatalogItem");
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.items.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn add_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(quantity): Path<i32>,
    body: Result<Json<dto::StockRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::json_body(body) {
        Ok(body) => body,
        Err(resp) => return resp,
    };
    debug!(quantity, "REST request to add stock to CatalogItem: {body:?}");
    let id = match stock_target(&body) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.items.add_stock(id, quantity).await {
        Ok(adjustment) => stock_response(adjustment),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn remove_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(quantity): Path<i32>,
    body: Result<Json<dto::StockRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::json_body(body) {
        Ok(body) => body,
        Err(resp) => return resp,
    };
    debug!(quantity, "REST request to remove stock from CatalogItem: {body:?}");
    let id = match stock_target(&body) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.items.remove_stock(id, quantity).await {
        Ok(adjustment) => stock_response(adjustment),
        Err(e) => errors::service_error_to_response(e),
    }
}

fn stock_target(body: &dto::StockRequest) -> Result<CatalogItemId, axum::response::Response> {
    body.id.map(CatalogItemId::from_i64).ok_or_else(|| {
        errors::json_error(StatusCode::BAD_REQUEST, "id_conflict", "catalogItem id is required")
    })
}

fn stock_response(adjustment: eshop_infra::StockAdjustment) -> axum::response::Response {
    let mut headers = HeaderMap::new();
    headers.insert(STOCK_APPLIED_HEADER, HeaderValue::from(adjustment.applied));
    (StatusCode::OK, headers, item_json(&adjustment.item)).into_response()
}
