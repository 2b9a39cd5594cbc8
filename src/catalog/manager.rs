//! Song and review lifecycle: validation, duplicate gating and authorship.

use super::duplicate;
use super::error::CatalogError;
use crate::catalog_store::{
    validate_review, validate_song_fields, CatalogStore, Review, ReviewInput, ReviewWrite, Song,
    SongFields, SongWithStats, SongWrite, ValidationError, ValidationErrors,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Clone)]
pub struct CatalogManager {
    store: Arc<dyn CatalogStore>,
}

/// A review submission after decoding its tags and dropping a blank summary.
struct PreparedReview {
    input: ReviewInput,
    tags: Vec<String>,
    summary: Option<String>,
}

impl PreparedReview {
    fn new(input: ReviewInput) -> Self {
        let tags = input.tags.clone().into_tags();
        let summary = input.summary.clone().filter(|s| !s.trim().is_empty());
        PreparedReview {
            input,
            tags,
            summary,
        }
    }

    fn validate(&self) -> ValidationErrors {
        validate_review(&self.input.ratings, self.summary.as_deref(), &self.tags)
    }
}

impl CatalogManager {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        CatalogManager { store }
    }

    pub fn store(&self) -> &dyn CatalogStore {
        self.store.as_ref()
    }

    // =========================================================================
    // Songs
    // =========================================================================

    /// Field validation, plus a non-transactional duplicate lookup so a
    /// rejected submission reports every problem at once.
    fn reject_invalid_song(&self, fields: &SongFields, exclude_id: Option<Uuid>) -> CatalogResult<()> {
        let mut errors = validate_song_fields(fields);
        if errors.is_empty() {
            return Ok(());
        }
        let existing = duplicate::find_duplicate(
            self.store(),
            Some(&fields.title),
            fields.composer.as_deref(),
            fields.arranger.as_deref(),
            exclude_id,
            false,
        )?;
        if existing.is_some() {
            errors.push(ValidationError::DuplicateSong);
        }
        Err(errors.into())
    }

    pub fn create_song(&self, fields: SongFields) -> CatalogResult<Song> {
        let fields = fields.cleaned();
        self.reject_invalid_song(&fields, None)?;

        match self.store.insert_song(Uuid::new_v4(), &fields)? {
            SongWrite::Written(song) => {
                info!("Created song {} \"{}\"", song.short_id(), song.title);
                Ok(song)
            }
            SongWrite::Duplicate(existing) => {
                debug!("Rejected duplicate of song {}", existing.short_id());
                Err(ValidationError::DuplicateSong.into())
            }
        }
    }

    pub fn update_song(&self, id: Uuid, fields: SongFields) -> CatalogResult<Song> {
        let fields = fields.cleaned();
        self.reject_invalid_song(&fields, Some(id))?;

        match self.store.update_song(id, &fields)? {
            None => Err(CatalogError::NotFound),
            Some(SongWrite::Written(song)) => {
                info!("Updated song {}", song.short_id());
                Ok(song)
            }
            Some(SongWrite::Duplicate(_)) => Err(ValidationError::DuplicateSong.into()),
        }
    }

    pub fn get_song(&self, id: Uuid) -> CatalogResult<SongWithStats> {
        self.store
            .get_song_with_stats(id)?
            .ok_or(CatalogError::NotFound)
    }

    pub fn delete_song(&self, id: Uuid) -> CatalogResult<()> {
        if self.store.delete_song(id)? {
            info!("Deleted song {}", id);
            Ok(())
        } else {
            Err(CatalogError::NotFound)
        }
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    pub fn create_review(&self, song_id: Uuid, user_id: i64, input: ReviewInput) -> CatalogResult<Review> {
        if self.store.get_song(song_id)?.is_none() {
            return Err(CatalogError::NotFound);
        }

        let prepared = PreparedReview::new(input);
        let mut errors = prepared.validate();
        if !errors.is_empty() {
            if self.store.find_review_by_author(song_id, user_id)?.is_some() {
                errors.push(ValidationError::AlreadyReviewed);
            }
            return Err(errors.into());
        }

        let ratings = prepared.input.ratings;
        let overall_rating = ratings.overall_rating().ok_or_else(|| {
            anyhow::anyhow!("Validated review is missing a rating")
        })?;
        let now = chrono::Utc::now().timestamp_millis();
        let review = Review {
            id: Uuid::new_v4(),
            song_id,
            user_id,
            ratings,
            overall_rating,
            summary: prepared.summary,
            tags: prepared.tags,
            created_at: now,
            updated_at: now,
        };

        match self.store.insert_review(&review)? {
            ReviewWrite::Written(review) => {
                info!("User {} reviewed song {}", user_id, song_id);
                Ok(review)
            }
            ReviewWrite::AlreadyReviewed => Err(ValidationError::AlreadyReviewed.into()),
        }
    }

    /// Load a review and check that `user_id` wrote it.
    fn authored_review(&self, review_id: Uuid, user_id: i64) -> CatalogResult<Review> {
        let review = self.get_review(review_id)?;
        if review.user_id != user_id {
            return Err(CatalogError::Forbidden);
        }
        Ok(review)
    }

    pub fn update_review(&self, review_id: Uuid, user_id: i64, input: ReviewInput) -> CatalogResult<Review> {
        let current = self.authored_review(review_id, user_id)?;

        let prepared = PreparedReview::new(input);
        prepared.validate().into_result()?;

        let ratings = prepared.input.ratings;
        let overall_rating = ratings.overall_rating().ok_or_else(|| {
            anyhow::anyhow!("Validated review is missing a rating")
        })?;
        let review = Review {
            ratings,
            overall_rating,
            summary: prepared.summary,
            tags: prepared.tags,
            updated_at: chrono::Utc::now().timestamp_millis(),
            ..current
        };

        if self.store.update_review(&review)? {
            Ok(review)
        } else {
            Err(CatalogError::NotFound)
        }
    }

    pub fn get_review(&self, review_id: Uuid) -> CatalogResult<Review> {
        self.store.get_review(review_id)?.ok_or(CatalogError::NotFound)
    }

    pub fn delete_review(&self, review_id: Uuid, user_id: i64) -> CatalogResult<()> {
        self.authored_review(review_id, user_id)?;
        if self.store.delete_review(review_id)? {
            Ok(())
        } else {
            Err(CatalogError::NotFound)
        }
    }

    pub fn list_song_reviews(&self, song_id: Uuid, tag: Option<&str>) -> CatalogResult<Vec<Review>> {
        if self.store.get_song(song_id)?.is_none() {
            return Err(CatalogError::NotFound);
        }
        Ok(self.store.list_song_reviews(song_id, tag)?)
    }

    pub fn find_user_review(&self, song_id: Uuid, user_id: i64) -> CatalogResult<Option<Review>> {
        Ok(self.store.find_review_by_author(song_id, user_id)?)
    }

    /// Called when a user account is removed.
    pub fn delete_user_reviews(&self, user_id: i64) -> CatalogResult<usize> {
        Ok(self.store.delete_reviews_by_author(user_id)?)
    }
}
