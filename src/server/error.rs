//! Mapping of catalog failures onto HTTP responses.

use crate::catalog::CatalogError;
use crate::catalog_store::ValidationMessage;
use crate::short_id::ShortIdError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error};

#[derive(Debug)]
pub struct ApiError(pub CatalogError);

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
struct ValidationErrorsBody {
    errors: Vec<ValidationMessage>,
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError(CatalogError::Storage(err))
    }
}

impl From<ShortIdError> for ApiError {
    fn from(err: ShortIdError) -> Self {
        debug!("Unresolvable id: {}", err);
        ApiError(CatalogError::NotFound)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            CatalogError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ValidationErrorsBody {
                    errors: errors.messages(),
                }),
            )
                .into_response(),
            CatalogError::NotFound => StatusCode::NOT_FOUND.into_response(),
            CatalogError::Forbidden => StatusCode::FORBIDDEN.into_response(),
            CatalogError::Storage(err) => {
                error!("Storage failure: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}
