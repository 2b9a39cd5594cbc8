//! Author identity, as asserted by the fronting auth layer.

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{request::Parts, StatusCode},
    response::IntoResponse,
};
use tracing::debug;

pub const AUTHOR_HEADER: &str = "X-User-Id";

/// The user performing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Author {
    pub user_id: i64,
}

#[derive(Debug)]
pub enum AuthorExtractionError {
    Missing,
    Invalid,
}

impl IntoResponse for AuthorExtractionError {
    fn into_response(self) -> axum::response::Response {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

fn extract_author(parts: &Parts) -> Result<Author, AuthorExtractionError> {
    let value = parts
        .headers
        .get(AUTHOR_HEADER)
        .ok_or(AuthorExtractionError::Missing)?;
    let user_id = value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .ok_or_else(|| {
            debug!("Rejecting malformed {} header {:?}", AUTHOR_HEADER, value);
            AuthorExtractionError::Invalid
        })?;
    Ok(Author { user_id })
}

impl<S: Send + Sync> FromRequestParts<S> for Author {
    type Rejection = AuthorExtractionError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        extract_author(parts)
    }
}

/// Anonymous when the header is absent; a malformed header is still rejected.
impl<S: Send + Sync> OptionalFromRequestParts<S> for Author {
    type Rejection = AuthorExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        match extract_author(parts) {
            Ok(author) => Ok(Some(author)),
            Err(AuthorExtractionError::Missing) => Ok(None),
            Err(err) => Err(err),
        }
    }
}
