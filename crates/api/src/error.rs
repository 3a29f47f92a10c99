//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        DomainError::InsufficientStock { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
        }
        DomainError::Validation(_) | DomainError::InvalidUnit(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        DomainError::Conflict(_) => (StatusCode::CONFLICT, err.to_string()),
        DomainError::Store(store_err) => {
            tracing::error!(error = %store_err, "store failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal storage error".to_string(),
            )
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Entity;
    use store::StoreError;

    fn status_of(err: DomainError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn maps_domain_errors_to_statuses() {
        assert_eq!(
            status_of(DomainError::not_found(Entity::Order, "x")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(DomainError::InsufficientStock {
                subject: "menu item 1".into(),
                detail: "none left".into()
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(DomainError::InvalidUnit("cup".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DomainError::Conflict("retry".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DomainError::Store(StoreError::CommitFailed("io".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
