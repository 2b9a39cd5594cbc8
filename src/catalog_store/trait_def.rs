//! CatalogStore trait definition.
//!
//! This trait abstracts song and review persistence so the catalog manager,
//! the search engine and the HTTP layer never touch SQL directly.

use super::models::{
    DuplicateProbe, Review, ReviewWrite, Song, SongField, SongFields, SongQuery, SongWithStats,
    SongWrite,
};
use anyhow::Result;
use std::collections::HashMap;
use uuid::Uuid;

/// Trait for catalog storage backends.
pub trait CatalogStore: Send + Sync {
    // =========================================================================
    // Songs
    // =========================================================================

    /// Insert a song. The normalized columns are derived from `fields` before
    /// persisting. If a song with the same normalized title, composer and
    /// arranger exists, nothing is written and that song is returned as
    /// [`SongWrite::Duplicate`].
    fn insert_song(&self, id: Uuid, fields: &SongFields) -> Result<SongWrite>;

    /// Update a song's fields, with the same duplicate guard as
    /// [`CatalogStore::insert_song`] (the song itself excluded).
    /// Returns `None` if the song does not exist.
    fn update_song(&self, id: Uuid, fields: &SongFields) -> Result<Option<SongWrite>>;

    fn get_song(&self, id: Uuid) -> Result<Option<Song>>;

    fn get_song_with_stats(&self, id: Uuid) -> Result<Option<SongWithStats>>;

    /// Delete a song and, through the foreign key, its reviews.
    fn delete_song(&self, id: Uuid) -> Result<bool>;

    fn get_songs_count(&self) -> usize;

    // =========================================================================
    // Duplicate and Search Support
    // =========================================================================

    /// Earliest-created song matching the probe.
    fn find_duplicate(&self, probe: &DuplicateProbe) -> Result<Option<Song>>;

    /// Songs matching every clause of the query, with review statistics,
    /// newest first.
    fn query_songs(&self, query: &SongQuery) -> Result<Vec<SongWithStats>>;

    /// Tag lists of every review of the given songs, keyed by song id.
    /// Each song's lists are in review creation order.
    fn review_tags_by_song(&self, song_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Vec<String>>>>;

    /// Distinct non-blank original values of `field` whose normalized form
    /// contains `normalized_needle`.
    fn autocomplete_values(
        &self,
        field: SongField,
        normalized_needle: &str,
        limit: usize,
    ) -> Result<Vec<String>>;

    // =========================================================================
    // Listings
    // =========================================================================

    fn recent_songs(&self, limit: usize) -> Result<Vec<SongWithStats>>;

    /// Songs with at least one review, most reviewed first.
    fn most_reviewed_songs(&self, limit: usize) -> Result<Vec<SongWithStats>>;

    // =========================================================================
    // Reviews
    // =========================================================================

    /// Insert a review unless its author already reviewed the song.
    fn insert_review(&self, review: &Review) -> Result<ReviewWrite>;

    /// Overwrite ratings, summary and tags. Returns false if the review is gone.
    fn update_review(&self, review: &Review) -> Result<bool>;

    fn get_review(&self, id: Uuid) -> Result<Option<Review>>;

    fn delete_review(&self, id: Uuid) -> Result<bool>;

    /// Reviews of a song, newest first, optionally only those carrying `tag`.
    fn list_song_reviews(&self, song_id: Uuid, tag: Option<&str>) -> Result<Vec<Review>>;

    fn find_review_by_author(&self, song_id: Uuid, user_id: i64) -> Result<Option<Review>>;

    /// Remove every review written by a user. Returns the number removed.
    fn delete_reviews_by_author(&self, user_id: i64) -> Result<usize>;
}
