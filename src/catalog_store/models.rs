//! Catalog models for the SQLite-backed song and review storage.

use crate::normalize::{is_blank, normalize_opt};
use crate::short_id;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Limits and whitelists
// =============================================================================

pub const MAX_TITLE_LENGTH: usize = 100;
pub const MAX_PERSON_NAME_LENGTH: usize = 50;
pub const MAX_SUMMARY_LENGTH: usize = 400;
pub const MAX_TAGS_PER_REVIEW: usize = 5;

/// Tags a review may carry.
pub const AVAILABLE_TAGS: &[&str] = &[
    "arpeggio",
    "tremolo",
    "rasgueado",
    "harmonics",
    "barre-chords",
    "slur",
    "campanella",
    "fast-scales",
    "high-positions",
    "polyphony",
    "rhythm",
    "stretches",
    "dynamics",
    "tone-color",
    "long-piece",
    "beginner-friendly",
];

// =============================================================================
// Songs
// =============================================================================

/// The user-editable fields of a song, as submitted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongFields {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub composer: Option<String>,
    #[serde(default)]
    pub arranger: Option<String>,
}

/// Normalized shadows of [`SongFields`], used for identity and search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedSongFields {
    pub title: String,
    pub composer: String,
    pub arranger: String,
}

impl SongFields {
    pub fn new<T: Into<String>>(title: T, composer: Option<&str>, arranger: Option<&str>) -> Self {
        SongFields {
            title: title.into(),
            composer: composer.map(str::to_owned),
            arranger: arranger.map(str::to_owned),
        }
    }

    /// Trims surrounding whitespace and turns blank optional fields into `None`.
    pub fn cleaned(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            if is_blank(value.as_deref()) {
                None
            } else {
                value.map(|v| v.trim().to_owned())
            }
        }
        SongFields {
            title: self.title.trim().to_owned(),
            composer: clean(self.composer),
            arranger: clean(self.arranger),
        }
    }

    pub fn normalized(&self) -> NormalizedSongFields {
        NormalizedSongFields {
            title: normalize_opt(Some(&self.title)),
            composer: normalize_opt(self.composer.as_deref()),
            arranger: normalize_opt(self.arranger.as_deref()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Song {
    pub id: Uuid,
    pub title: String,
    pub composer: Option<String>,
    pub arranger: Option<String>,
    pub normalized_title: String,
    pub normalized_composer: String,
    pub normalized_arranger: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Song {
    pub fn short_id(&self) -> String {
        short_id::encode(&self.id)
    }
}

/// A song together with statistics aggregated over its reviews.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SongWithStats {
    pub song: Song,
    pub reviews_count: usize,
    /// `None` when the song has no reviews.
    pub average_overall_rating: Option<f64>,
}

impl SongWithStats {
    pub fn has_average(&self) -> bool {
        self.reviews_count > 0 && self.average_overall_rating.is_some()
    }
}

/// Searchable song attributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SongField {
    Title,
    Composer,
    Arranger,
}

impl SongField {
    pub const ALL: [SongField; 3] = [SongField::Title, SongField::Composer, SongField::Arranger];

    pub fn from_param(s: &str) -> Option<Self> {
        match s {
            "title" => Some(SongField::Title),
            "composer" => Some(SongField::Composer),
            "arranger" => Some(SongField::Arranger),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SongField::Title => "title",
            SongField::Composer => "composer",
            SongField::Arranger => "arranger",
        }
    }

    pub fn column(&self) -> &'static str {
        self.as_str()
    }

    pub fn normalized_column(&self) -> &'static str {
        match self {
            SongField::Title => "normalized_title",
            SongField::Composer => "normalized_composer",
            SongField::Arranger => "normalized_arranger",
        }
    }
}

/// A substring predicate: `needle` must appear in at least one of `fields`
/// (compared against the normalized columns).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainsClause {
    pub fields: Vec<SongField>,
    pub needle: String,
}

/// Store-side song selection. All clauses must hold. When
/// `reviewed_with_any_tag` is non-empty, only songs with at least one review
/// carrying at least one of those tags are selected.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SongQuery {
    pub all_of: Vec<ContainsClause>,
    pub reviewed_with_any_tag: Vec<String>,
}

/// How a composer or arranger input constrains a duplicate lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldMatch {
    /// Normalized values must be equal ("" matches only blank values).
    Exact(String),
    /// Any stored value matches.
    Any,
}

/// A normalized duplicate lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DuplicateProbe {
    pub normalized_title: String,
    pub composer: FieldMatch,
    pub arranger: FieldMatch,
    pub exclude_id: Option<Uuid>,
}

impl DuplicateProbe {
    /// Exact match on all three normalized fields, the identity the store
    /// enforces on write.
    pub fn strict(normalized: &NormalizedSongFields, exclude_id: Option<Uuid>) -> Self {
        DuplicateProbe {
            normalized_title: normalized.title.clone(),
            composer: FieldMatch::Exact(normalized.composer.clone()),
            arranger: FieldMatch::Exact(normalized.arranger.clone()),
            exclude_id,
        }
    }
}

/// Outcome of a song write guarded by the duplicate check.
#[derive(Clone, Debug, PartialEq)]
pub enum SongWrite {
    Written(Song),
    Duplicate(Song),
}

// =============================================================================
// Reviews
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RatingDimension {
    Tempo,
    FingeringTechnique,
    PluckingTechnique,
    Expression,
    Memorization,
}

impl RatingDimension {
    pub const ALL: [RatingDimension; 5] = [
        RatingDimension::Tempo,
        RatingDimension::FingeringTechnique,
        RatingDimension::PluckingTechnique,
        RatingDimension::Expression,
        RatingDimension::Memorization,
    ];

    pub fn field_name(&self) -> &'static str {
        match self {
            RatingDimension::Tempo => "tempo_rating",
            RatingDimension::FingeringTechnique => "fingering_technique_rating",
            RatingDimension::PluckingTechnique => "plucking_technique_rating",
            RatingDimension::Expression => "expression_rating",
            RatingDimension::Memorization => "memorization_rating",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRatings {
    pub tempo_rating: Option<i64>,
    pub fingering_technique_rating: Option<i64>,
    pub plucking_technique_rating: Option<i64>,
    pub expression_rating: Option<i64>,
    pub memorization_rating: Option<i64>,
}

impl ReviewRatings {
    pub fn uniform(value: i64) -> Self {
        ReviewRatings {
            tempo_rating: Some(value),
            fingering_technique_rating: Some(value),
            plucking_technique_rating: Some(value),
            expression_rating: Some(value),
            memorization_rating: Some(value),
        }
    }

    pub fn get(&self, dimension: RatingDimension) -> Option<i64> {
        match dimension {
            RatingDimension::Tempo => self.tempo_rating,
            RatingDimension::FingeringTechnique => self.fingering_technique_rating,
            RatingDimension::PluckingTechnique => self.plucking_technique_rating,
            RatingDimension::Expression => self.expression_rating,
            RatingDimension::Memorization => self.memorization_rating,
        }
    }

    /// Mean of the five ratings rounded to two decimals, or `None` unless
    /// every rating is present.
    pub fn overall_rating(&self) -> Option<f64> {
        let ratings: Option<Vec<i64>> = RatingDimension::ALL.iter().map(|d| self.get(*d)).collect();
        let ratings = ratings?;
        let mean = ratings.iter().sum::<i64>() as f64 / ratings.len() as f64;
        Some((mean * 100.0).round() / 100.0)
    }
}

/// Tags as submitted by a client: either a list or a JSON-encoded list.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    Encoded(String),
}

impl Default for TagsInput {
    fn default() -> Self {
        TagsInput::List(Vec::new())
    }
}

impl TagsInput {
    /// Unparsable encoded input yields no tags.
    pub fn into_tags(self) -> Vec<String> {
        match self {
            TagsInput::List(tags) => tags,
            TagsInput::Encoded(raw) if raw.trim().is_empty() => Vec::new(),
            TagsInput::Encoded(raw) => serde_json::from_str(&raw).unwrap_or_default(),
        }
    }
}

/// Review fields submitted by the author.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ReviewInput {
    #[serde(flatten)]
    pub ratings: ReviewRatings,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: TagsInput,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Review {
    pub id: Uuid,
    pub song_id: Uuid,
    pub user_id: i64,
    #[serde(flatten)]
    pub ratings: ReviewRatings,
    pub overall_rating: f64,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Review {
    pub fn short_id(&self) -> String {
        short_id::encode(&self.id)
    }
}

/// Outcome of a review insert guarded by the one-review-per-author rule.
#[derive(Clone, Debug, PartialEq)]
pub enum ReviewWrite {
    Written(Review),
    AlreadyReviewed,
}
