//! SQLite schema definitions for the song catalog database.
//!
//! Songs and reviews are keyed by UUID text. Review tags are stored as a JSON
//! array in a TEXT column and queried with `json_each`.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema};

// =============================================================================
// Tables
// =============================================================================

/// Songs. The normalized columns are the identity used for duplicates.
const SONGS_TABLE: Table = Table {
    name: "songs",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("composer", &SqlType::Text),
        sqlite_column!("arranger", &SqlType::Text),
        sqlite_column!("normalized_title", &SqlType::Text, non_null = true),
        sqlite_column!(
            "normalized_composer",
            &SqlType::Text,
            non_null = true,
            default_value = Some("''")
        ),
        sqlite_column!(
            "normalized_arranger",
            &SqlType::Text,
            non_null = true,
            default_value = Some("''")
        ),
        sqlite_column!("created_at", &SqlType::Integer, non_null = true), // unix millis
        sqlite_column!("updated_at", &SqlType::Integer, non_null = true),
    ],
    indices: &[
        ("idx_songs_normalized_title", "normalized_title"),
        ("idx_songs_created_at", "created_at"),
    ],
    unique_constraints: &[&["normalized_title", "normalized_composer", "normalized_arranger"]],
};

/// Reviews, at most one per author and song.
const REVIEWS_TABLE: Table = Table {
    name: "reviews",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!(
            "song_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "songs",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("user_id", &SqlType::Integer, non_null = true),
        sqlite_column!("tempo_rating", &SqlType::Integer, non_null = true),
        sqlite_column!("fingering_technique_rating", &SqlType::Integer, non_null = true),
        sqlite_column!("plucking_technique_rating", &SqlType::Integer, non_null = true),
        sqlite_column!("expression_rating", &SqlType::Integer, non_null = true),
        sqlite_column!("memorization_rating", &SqlType::Integer, non_null = true),
        sqlite_column!("overall_rating", &SqlType::Real, non_null = true),
        sqlite_column!("summary", &SqlType::Text),
        sqlite_column!(
            "tags",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'[]'")
        ), // JSON array of strings
        sqlite_column!("created_at", &SqlType::Integer, non_null = true),
        sqlite_column!("updated_at", &SqlType::Integer, non_null = true),
    ],
    indices: &[
        ("idx_reviews_song", "song_id"),
        ("idx_reviews_user", "user_id"),
    ],
    unique_constraints: &[&["user_id", "song_id"]],
};

// =============================================================================
// Versioned Schema Definition
// =============================================================================

pub const CATALOG_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[SONGS_TABLE, REVIEWS_TABLE],
    migration: None,
}];
