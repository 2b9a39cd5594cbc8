//! JSON shapes returned by the HTTP API. Ids are exposed as short tokens.

use crate::catalog_store::{Review, ReviewRatings, SongWithStats};
use crate::search::SongHit;
use crate::short_id;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SongView {
    pub id: String,
    pub title: String,
    pub composer: Option<String>,
    pub arranger: Option<String>,
    pub reviews_count: usize,
    pub average_overall_rating: Option<f64>,
    pub top_tags: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl SongView {
    pub fn new(stats: SongWithStats, top_tags: Vec<String>) -> Self {
        let id = stats.song.short_id();
        let song = stats.song;
        SongView {
            id,
            title: song.title,
            composer: song.composer,
            arranger: song.arranger,
            reviews_count: stats.reviews_count,
            average_overall_rating: stats.average_overall_rating,
            top_tags,
            created_at: song.created_at,
            updated_at: song.updated_at,
        }
    }
}

impl From<SongHit> for SongView {
    fn from(hit: SongHit) -> Self {
        SongView::new(hit.song, hit.top_tags)
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewView {
    pub id: String,
    pub song_id: String,
    pub user_id: i64,
    #[serde(flatten)]
    pub ratings: ReviewRatings,
    pub overall_rating: f64,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<Review> for ReviewView {
    fn from(review: Review) -> Self {
        ReviewView {
            id: review.short_id(),
            song_id: short_id::encode(&review.song_id),
            user_id: review.user_id,
            ratings: review.ratings,
            overall_rating: review.overall_rating,
            summary: review.summary,
            tags: review.tags,
            created_at: review.created_at,
            updated_at: review.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SongListResponse {
    pub songs: Vec<SongView>,
    pub selected_tags: Vec<String>,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub total_count: usize,
}

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub recent: Vec<SongView>,
    pub most_reviewed: Vec<SongView>,
}

#[derive(Debug, Serialize)]
pub struct SongReviewsResponse {
    pub reviews: Vec<ReviewView>,
    /// The requesting user's own review of the song, if any.
    pub user_review: Option<ReviewView>,
}
