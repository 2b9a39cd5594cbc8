//! Song routes: search listing, lookups, and author-gated edits.

use crate::catalog::{check_duplicate, DuplicateCheck};
use crate::catalog_store::{SongFields, SongWithStats};
use crate::search::SearchParams;
use crate::short_id;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use super::error::ApiResult;
use super::session::Author;
use super::state::ServerState;
use super::views::{SongListResponse, SongView};

#[derive(Deserialize, Debug)]
struct AutocompleteQuery {
    field: Option<String>,
    query: Option<String>,
}

#[derive(Deserialize, Debug)]
struct DuplicateQuery {
    title: Option<String>,
    composer: Option<String>,
    arranger: Option<String>,
}

fn song_view(state: &ServerState, stats: SongWithStats) -> ApiResult<SongView> {
    let hit = state
        .search
        .with_top_tags(vec![stats])?
        .pop()
        .ok_or_else(|| anyhow::anyhow!("Song lost while attaching top tags"))?;
    Ok(hit.into())
}

async fn list_songs(
    State(state): State<ServerState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<SongListResponse>> {
    let page = state.search.search_page(&params)?;
    Ok(Json(SongListResponse {
        songs: page.songs.into_iter().map(SongView::from).collect(),
        selected_tags: page.selected_tags,
        page: page.page,
        per_page: page.per_page,
        total_pages: page.total_pages,
        total_count: page.total_count,
    }))
}

async fn autocomplete_songs(
    State(state): State<ServerState>,
    Query(params): Query<AutocompleteQuery>,
) -> ApiResult<Json<Vec<String>>> {
    let values = state.search.autocomplete(
        params.field.as_deref().unwrap_or_default(),
        params.query.as_deref(),
    )?;
    Ok(Json(values))
}

async fn check_song_duplicate(
    State(state): State<ServerState>,
    Query(params): Query<DuplicateQuery>,
) -> ApiResult<Json<DuplicateCheck>> {
    let check = check_duplicate(
        state.catalog.store(),
        params.title.as_deref(),
        params.composer.as_deref(),
        params.arranger.as_deref(),
    )?;
    Ok(Json(check))
}

async fn create_song(
    author: Author,
    State(state): State<ServerState>,
    Json(fields): Json<SongFields>,
) -> ApiResult<impl IntoResponse> {
    let song = state.catalog.create_song(fields)?;
    info!("User {} created song {}", author.user_id, song.short_id());
    let stats = state.catalog.get_song(song.id)?;
    Ok((StatusCode::CREATED, Json(song_view(&state, stats)?)))
}

async fn get_song(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SongView>> {
    let id = short_id::decode(&id)?;
    let stats = state.catalog.get_song(id)?;
    Ok(Json(song_view(&state, stats)?))
}

async fn update_song(
    author: Author,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(fields): Json<SongFields>,
) -> ApiResult<Json<SongView>> {
    let id = short_id::decode(&id)?;
    let song = state.catalog.update_song(id, fields)?;
    info!("User {} updated song {}", author.user_id, song.short_id());
    let stats = state.catalog.get_song(song.id)?;
    Ok(Json(song_view(&state, stats)?))
}

async fn delete_song(
    author: Author,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = short_id::decode(&id)?;
    state.catalog.delete_song(id)?;
    info!("User {} deleted song {}", author.user_id, id);
    Ok(StatusCode::NO_CONTENT)
}

pub fn make_song_routes(state: ServerState) -> Router {
    Router::new()
        .route("/v1/songs", get(list_songs).post(create_song))
        .route("/v1/songs/autocomplete", get(autocomplete_songs))
        .route("/v1/songs/check_duplicate", get(check_song_duplicate))
        .route(
            "/v1/songs/{id}",
            get(get_song).put(update_song).delete(delete_song),
        )
        .with_state(state)
}
