use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::{debug, error};

use eshop_core::DomainError;
use eshop_infra::ServiceError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::Concurrency(msg) => {
            json_error(StatusCode::CONFLICT, "concurrent_modification", msg)
        }
        ServiceError::Repository(e) => {
            error!("repository failure: {e}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::Conflict(msg) => json_error(StatusCode::BAD_REQUEST, "id_conflict", msg),
        DomainError::OutOfStock(msg) => json_error(StatusCode::BAD_REQUEST, "out_of_stock", msg),
        DomainError::InvalidQuantity(msg) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_quantity", msg)
        }
        DomainError::NotFound => not_found(),
    }
}

/// Unwraps a JSON body, answering 400 `invalid_body` when it is malformed or
/// does not fit the DTO.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, axum::response::Response> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            debug!("rejected request body: {rejection}");
            Err(json_error(
                StatusCode::BAD_REQUEST,
                "invalid_body",
                rejection.body_text(),
            ))
        }
    }
}

pub fn not_found() -> axum::response::Response {
    json_error(StatusCode::NOT_FOUND, "not_found", "not found")
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    use eshop_infra::repository::RepositoryError;

    fn status(err: ServiceError) -> StatusCode {
        service_error_to_response(err).status()
    }

    #[test]
    fn statuses_follow_error_class() {
        assert_eq!(
            status(DomainError::validation("x").into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(DomainError::conflict("x").into()), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(DomainError::out_of_stock("x").into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(DomainError::not_found().into()), StatusCode::NOT_FOUND);
        assert_eq!(
            status(ServiceError::Concurrency("x".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(RepositoryError::Database("down".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
