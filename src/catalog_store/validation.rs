//! Validation for catalog entities.
//!
//! Checks here only look at the submitted values. Checks that need the store
//! (duplicate songs, one review per author) produce the same error type from
//! the catalog manager.

use super::models::{
    RatingDimension, ReviewRatings, SongFields, AVAILABLE_TAGS, MAX_PERSON_NAME_LENGTH,
    MAX_SUMMARY_LENGTH, MAX_TAGS_PER_REVIEW, MAX_TITLE_LENGTH,
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} can't be blank")]
    Blank { field: &'static str },

    #[error("{field} is too long (maximum is {max} characters)")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} must be rated between 1 and 5")]
    MissingRating { field: &'static str },

    #[error("{field} must be rated between 1 and 5, got {value}")]
    RatingOutOfRange { field: &'static str, value: i64 },

    #[error("tag '{tag}' is not available")]
    UnknownTag { tag: String },

    #[error("tag '{tag}' is given more than once")]
    DuplicateTag { tag: String },

    #[error("too many tags ({count}), at most {max} are allowed")]
    TooManyTags { count: usize, max: usize },

    /// Record-level: the conflict spans title, composer and arranger.
    #[error("a song with the same title, composer and arranger is already registered")]
    DuplicateSong,

    #[error("this song has already been reviewed by this user")]
    AlreadyReviewed,
}

impl ValidationError {
    /// The attribute the error belongs to, `None` for record-level errors.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::Blank { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::MissingRating { field }
            | ValidationError::RatingOutOfRange { field, .. } => Some(field),
            ValidationError::UnknownTag { .. }
            | ValidationError::DuplicateTag { .. }
            | ValidationError::TooManyTags { .. } => Some("tags"),
            ValidationError::AlreadyReviewed => Some("song_id"),
            ValidationError::DuplicateSong => None,
        }
    }
}

/// All validation failures of a single record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

#[derive(Debug, Serialize)]
pub struct ValidationMessage {
    pub field: Option<&'static str>,
    pub message: String,
}

impl ValidationErrors {
    pub fn single(error: ValidationError) -> Self {
        ValidationErrors(vec![error])
    }

    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn contains(&self, error: &ValidationError) -> bool {
        self.0.contains(error)
    }

    pub fn for_field(&self, field: &str) -> Vec<&ValidationError> {
        self.0.iter().filter(|e| e.field() == Some(field)).collect()
    }

    /// Errors not attached to any attribute.
    pub fn base(&self) -> Vec<&ValidationError> {
        self.0.iter().filter(|e| e.field().is_none()).collect()
    }

    pub fn messages(&self) -> Vec<ValidationMessage> {
        self.0
            .iter()
            .map(|e| ValidationMessage {
                field: e.field(),
                message: e.to_string(),
            })
            .collect()
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

fn check_length(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<&str>,
    max: usize,
) {
    if let Some(value) = value {
        if value.chars().count() > max {
            errors.push(ValidationError::TooLong { field, max });
        }
    }
}

/// Validate song fields. Expects fields already passed through
/// [`SongFields::cleaned`].
pub fn validate_song_fields(fields: &SongFields) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    if fields.title.trim().is_empty() {
        errors.push(ValidationError::Blank { field: "title" });
    }
    check_length(&mut errors, "title", Some(&fields.title), MAX_TITLE_LENGTH);
    check_length(
        &mut errors,
        "composer",
        fields.composer.as_deref(),
        MAX_PERSON_NAME_LENGTH,
    );
    check_length(
        &mut errors,
        "arranger",
        fields.arranger.as_deref(),
        MAX_PERSON_NAME_LENGTH,
    );
    errors
}

/// Length of a free-text body, not counting line breaks.
pub fn content_length(value: &str) -> usize {
    value.chars().filter(|c| *c != '\r' && *c != '\n').count()
}

pub fn validate_review(ratings: &ReviewRatings, summary: Option<&str>, tags: &[String]) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    for dimension in RatingDimension::ALL {
        let field = dimension.field_name();
        match ratings.get(dimension) {
            None => errors.push(ValidationError::MissingRating { field }),
            Some(value) if !(1..=5).contains(&value) => {
                errors.push(ValidationError::RatingOutOfRange { field, value })
            }
            Some(_) => {}
        }
    }

    if let Some(summary) = summary {
        if content_length(summary) > MAX_SUMMARY_LENGTH {
            errors.push(ValidationError::TooLong {
                field: "summary",
                max: MAX_SUMMARY_LENGTH,
            });
        }
    }

    if tags.len() > MAX_TAGS_PER_REVIEW {
        errors.push(ValidationError::TooManyTags {
            count: tags.len(),
            max: MAX_TAGS_PER_REVIEW,
        });
    }
    for (index, tag) in tags.iter().enumerate() {
        if !AVAILABLE_TAGS.contains(&tag.as_str()) {
            errors.push(ValidationError::UnknownTag { tag: tag.clone() });
        } else if tags[..index].contains(tag) {
            errors.push(ValidationError::DuplicateTag { tag: tag.clone() });
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_song() {
        let fields = SongFields::new("Love me", Some("John Smith"), None).cleaned();
        assert!(validate_song_fields(&fields).is_empty());
    }

    #[test]
    fn rejects_blank_title() {
        let fields = SongFields::new("   ", None, None).cleaned();
        let errors = validate_song_fields(&fields);
        assert!(errors.contains(&ValidationError::Blank { field: "title" }));
        assert!(errors.base().is_empty());
    }

    #[test]
    fn rejects_too_long_fields() {
        let fields = SongFields::new(
            "a".repeat(MAX_TITLE_LENGTH + 1),
            Some(&"b".repeat(MAX_PERSON_NAME_LENGTH + 1)),
            Some(&"c".repeat(MAX_PERSON_NAME_LENGTH + 1)),
        );
        let errors = validate_song_fields(&fields);
        assert_eq!(errors.for_field("title").len(), 1);
        assert_eq!(errors.for_field("composer").len(), 1);
        assert_eq!(errors.for_field("arranger").len(), 1);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let fields = SongFields::new("曲".repeat(MAX_TITLE_LENGTH), None, None);
        assert!(validate_song_fields(&fields).is_empty());
    }

    #[test]
    fn accepts_valid_review() {
        let tags = vec!["tremolo".to_string(), "slur".to_string()];
        let errors = validate_review(&ReviewRatings::uniform(3), Some("Nice piece"), &tags);
        assert!(errors.is_empty(), "{}", errors);
    }

    #[test]
    fn rejects_ratings_out_of_range_or_missing() {
        let mut ratings = ReviewRatings::uniform(3);
        ratings.tempo_rating = Some(6);
        ratings.memorization_rating = None;
        let errors = validate_review(&ratings, None, &[]);
        assert!(errors.contains(&ValidationError::RatingOutOfRange {
            field: "tempo_rating",
            value: 6
        }));
        assert!(errors.contains(&ValidationError::MissingRating {
            field: "memorization_rating"
        }));

        ratings.tempo_rating = Some(0);
        ratings.memorization_rating = Some(1);
        let errors = validate_review(&ratings, None, &[]);
        assert_eq!(errors.errors().len(), 1);
    }

    #[test]
    fn summary_length_excludes_line_breaks() {
        let exactly_max = format!("{}\r\n\n", "a".repeat(MAX_SUMMARY_LENGTH));
        assert!(validate_review(&ReviewRatings::uniform(2), Some(&exactly_max), &[]).is_empty());

        let over = "a".repeat(MAX_SUMMARY_LENGTH + 1);
        let errors = validate_review(&ReviewRatings::uniform(2), Some(&over), &[]);
        assert_eq!(errors.for_field("summary").len(), 1);
    }

    #[test]
    fn rejects_bad_tags() {
        let tags: Vec<String> = ["tremolo", "kazoo", "tremolo"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let errors = validate_review(&ReviewRatings::uniform(2), None, &tags);
        assert!(errors.contains(&ValidationError::UnknownTag { tag: "kazoo".into() }));
        assert!(errors.contains(&ValidationError::DuplicateTag {
            tag: "tremolo".into()
        }));

        let too_many: Vec<String> = AVAILABLE_TAGS
            .iter()
            .take(MAX_TAGS_PER_REVIEW + 1)
            .map(|s| s.to_string())
            .collect();
        let errors = validate_review(&ReviewRatings::uniform(2), None, &too_many);
        assert_eq!(
            errors.errors(),
            &[ValidationError::TooManyTags {
                count: MAX_TAGS_PER_REVIEW + 1,
                max: MAX_TAGS_PER_REVIEW
            }]
        );
    }

    #[test]
    fn duplicate_song_is_record_level() {
        let errors = ValidationErrors::single(ValidationError::DuplicateSong);
        assert_eq!(errors.base().len(), 1);
        assert_eq!(errors.messages()[0].field, None);
    }
}
