//! Review routes. Reads are public; writes need an [`Author`].

use crate::catalog_store::ReviewInput;
use crate::short_id;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::ApiResult;
use super::session::Author;
use super::state::ServerState;
use super::views::{ReviewView, SongReviewsResponse};

#[derive(Deserialize, Debug)]
struct ReviewsQuery {
    tag: Option<String>,
}

#[derive(Serialize)]
struct DeletedReviews {
    deleted: usize,
}

async fn list_song_reviews(
    viewer: Option<Author>,
    State(state): State<ServerState>,
    Path(song_id): Path<String>,
    Query(params): Query<ReviewsQuery>,
) -> ApiResult<Json<SongReviewsResponse>> {
    let song_id = short_id::decode(&song_id)?;
    let tag = params.tag.as_deref().filter(|t| !t.trim().is_empty());
    let reviews = state.catalog.list_song_reviews(song_id, tag)?;
    let user_review = match viewer {
        Some(author) => state.catalog.find_user_review(song_id, author.user_id)?,
        None => None,
    };
    Ok(Json(SongReviewsResponse {
        reviews: reviews.into_iter().map(ReviewView::from).collect(),
        user_review: user_review.map(ReviewView::from),
    }))
}

async fn create_review(
    author: Author,
    State(state): State<ServerState>,
    Path(song_id): Path<String>,
    Json(input): Json<ReviewInput>,
) -> ApiResult<impl IntoResponse> {
    let song_id = short_id::decode(&song_id)?;
    let review = state.catalog.create_review(song_id, author.user_id, input)?;
    Ok((StatusCode::CREATED, Json(ReviewView::from(review))))
}

async fn get_review(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ReviewView>> {
    let id = short_id::decode(&id)?;
    Ok(Json(state.catalog.get_review(id)?.into()))
}

async fn update_review(
    author: Author,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(input): Json<ReviewInput>,
) -> ApiResult<Json<ReviewView>> {
    let id = short_id::decode(&id)?;
    let review = state.catalog.update_review(id, author.user_id, input)?;
    Ok(Json(review.into()))
}

async fn delete_review(
    author: Author,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = short_id::decode(&id)?;
    state.catalog.delete_review(id, author.user_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Removes every review of the requesting user, as done on account removal.
async fn delete_own_reviews(
    author: Author,
    State(state): State<ServerState>,
) -> ApiResult<Json<DeletedReviews>> {
    let deleted = state.catalog.delete_user_reviews(author.user_id)?;
    info!("Deleted {} reviews of user {}", deleted, author.user_id);
    Ok(Json(DeletedReviews { deleted }))
}

pub fn make_review_routes(state: ServerState) -> Router {
    Router::new()
        .route(
            "/v1/songs/{id}/reviews",
            get(list_song_reviews).post(create_review),
        )
        .route(
            "/v1/reviews/{id}",
            get(get_review).put(update_review).delete(delete_review),
        )
        .route("/v1/users/me/reviews", delete(delete_own_reviews))
        .with_state(state)
}
