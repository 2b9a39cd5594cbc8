//! Test fixture creation for the catalog database

use super::constants::*;
use anyhow::{bail, Result};
use songbook_server::catalog_store::{CatalogStore, SongFields, SongWrite, SqliteCatalogStore};
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

/// Short ids of the seeded songs.
#[derive(Debug, Clone)]
pub struct SeededSongs {
    pub love_me: String,
    pub lovely_day: String,
    pub yesterday: String,
}

fn insert(store: &SqliteCatalogStore, fields: SongFields) -> Result<String> {
    match store.insert_song(Uuid::new_v4(), &fields)? {
        SongWrite::Written(song) => Ok(song.short_id()),
        SongWrite::Duplicate(song) => bail!("Seed song {:?} already present", song.title),
    }
}

/// Creates a temporary catalog database holding three songs without reviews.
/// Returns (temp_dir, store, seeded song ids)
pub fn create_test_catalog() -> Result<(TempDir, Arc<SqliteCatalogStore>, SeededSongs)> {
    let dir = TempDir::new()?;
    let store = Arc::new(SqliteCatalogStore::new(dir.path().join("catalog.db"), 2)?);

    let love_me = insert(
        &store,
        SongFields::new(SONG_1_TITLE, Some(SONG_1_COMPOSER), Some(SONG_1_ARRANGER)),
    )?;
    let lovely_day = insert(
        &store,
        SongFields::new(SONG_2_TITLE, Some(SONG_2_COMPOSER), Some(SONG_2_ARRANGER)),
    )?;
    let yesterday = insert(
        &store,
        SongFields::new(SONG_3_TITLE, Some(SONG_3_COMPOSER), None),
    )?;

    Ok((
        dir,
        store,
        SeededSongs {
            love_me,
            lovely_day,
            yesterday,
        },
    ))
}
