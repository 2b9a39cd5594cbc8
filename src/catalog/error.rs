use crate::catalog_store::{ValidationError, ValidationErrors};
use thiserror::Error;

/// Errors returned by catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Not found")]
    NotFound,

    #[error("Only the author can change this review")]
    Forbidden,

    #[error("Store error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<ValidationErrors> for CatalogError {
    fn from(errors: ValidationErrors) -> Self {
        CatalogError::Validation(errors)
    }
}

impl From<ValidationError> for CatalogError {
    fn from(error: ValidationError) -> Self {
        CatalogError::Validation(ValidationErrors::single(error))
    }
}
