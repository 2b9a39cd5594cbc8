//! SQLite-backed song catalog store.
//!
//! Reads go through a small round-robin pool of read-only connections, writes
//! through a single connection. Every write that must observe the duplicate
//! rules runs inside one `BEGIN IMMEDIATE` transaction on that connection.

use super::models::*;
use super::schema::CATALOG_VERSIONED_SCHEMAS;
use super::trait_def::CatalogStore;
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, Connection};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

const SONG_COLUMNS: &str = "s.id, s.title, s.composer, s.arranger, s.normalized_title, \
     s.normalized_composer, s.normalized_arranger, s.created_at, s.updated_at";

const SONG_STATS_FROM: &str = "FROM songs s LEFT JOIN reviews r ON r.song_id = s.id";

const REVIEW_COLUMNS: &str = "r.id, r.song_id, r.user_id, r.tempo_rating, \
     r.fingering_technique_rating, r.plucking_technique_rating, r.expression_rating, \
     r.memorization_rating, r.overall_rating, r.summary, r.tags, r.created_at, r.updated_at";

/// Max ids bound in a single `IN (...)` list.
const IN_CHUNK_SIZE: usize = 500;

/// SQLite-backed catalog store for songs and reviews.
#[derive(Clone)]
pub struct SqliteCatalogStore {
    read_pool: Vec<Arc<Mutex<Connection>>>,
    write_conn: Arc<Mutex<Connection>>,
    read_index: Arc<AtomicUsize>,
}

fn migrate_if_needed(conn: &mut Connection) -> Result<()> {
    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;

    let latest_version = CATALOG_VERSIONED_SCHEMAS.len() - 1;
    let latest_schema = &CATALOG_VERSIONED_SCHEMAS[latest_version];

    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if table_count == 0 {
        info!("Creating catalog db schema at version {}", latest_version);
        latest_schema.create(conn)?;
        return Ok(());
    }

    if db_version < BASE_DB_VERSION as i64 {
        anyhow::bail!(
            "Catalog db has user_version {}, it was not created by this server",
            db_version
        );
    }
    let mut current_version = (db_version - BASE_DB_VERSION as i64) as usize;

    if current_version >= latest_version {
        CATALOG_VERSIONED_SCHEMAS[current_version.min(latest_version)]
            .validate(conn)
            .context("Catalog db schema validation failed")?;
        return Ok(());
    }

    let tx = conn.transaction()?;
    for schema in CATALOG_VERSIONED_SCHEMAS.iter().skip(current_version + 1) {
        if let Some(migration_fn) = schema.migration {
            info!(
                "Migrating catalog db from version {} to {}",
                current_version, schema.version
            );
            migration_fn(&tx)?;
            current_version = schema.version;
        }
    }
    tx.pragma_update(None, "user_version", BASE_DB_VERSION + current_version)?;
    tx.commit()?;
    Ok(())
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Escape `\`, `%` and `_` for a `LIKE ... ESCAPE '\'` pattern.
pub(crate) fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn contains_pattern(needle: &str) -> String {
    format!("%{}%", escape_like(needle))
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn parse_uuid(index: usize, value: String) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(&value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_song_row(row: &rusqlite::Row) -> rusqlite::Result<Song> {
    Ok(Song {
        id: parse_uuid(0, row.get(0)?)?,
        title: row.get(1)?,
        composer: row.get(2)?,
        arranger: row.get(3)?,
        normalized_title: row.get(4)?,
        normalized_composer: row.get(5)?,
        normalized_arranger: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn parse_song_with_stats_row(row: &rusqlite::Row) -> rusqlite::Result<SongWithStats> {
    let song = parse_song_row(row)?;
    let reviews_count: i64 = row.get(9)?;
    let average_overall_rating: Option<f64> = row.get(10)?;
    Ok(SongWithStats {
        song,
        reviews_count: reviews_count as usize,
        average_overall_rating,
    })
}

fn parse_tags(index: usize, raw: String) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_review_row(row: &rusqlite::Row) -> rusqlite::Result<Review> {
    Ok(Review {
        id: parse_uuid(0, row.get(0)?)?,
        song_id: parse_uuid(1, row.get(1)?)?,
        user_id: row.get(2)?,
        ratings: ReviewRatings {
            tempo_rating: row.get(3)?,
            fingering_technique_rating: row.get(4)?,
            plucking_technique_rating: row.get(5)?,
            expression_rating: row.get(6)?,
            memorization_rating: row.get(7)?,
        },
        overall_rating: row.get(8)?,
        summary: row.get(9)?,
        tags: parse_tags(10, row.get(10)?)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

impl SqliteCatalogStore {
    /// Create a new SqliteCatalogStore.
    ///
    /// # Arguments
    /// * `db_path` - Path to the SQLite database file, created if missing
    /// * `read_pool_size` - Number of connections for concurrent read operations
    pub fn new<P: AsRef<Path>>(db_path: P, read_pool_size: usize) -> Result<Self> {
        let db_path_ref = db_path.as_ref();

        let mut write_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open catalog database")?;

        migrate_if_needed(&mut write_conn)?;

        write_conn.pragma_update(None, "journal_mode", "WAL")?;
        write_conn.pragma_update(None, "foreign_keys", "ON")?;

        let song_count: i64 = write_conn
            .query_row("SELECT COUNT(*) FROM songs", [], |r| r.get(0))
            .unwrap_or(0);
        let review_count: i64 = write_conn
            .query_row("SELECT COUNT(*) FROM reviews", [], |r| r.get(0))
            .unwrap_or(0);
        info!(
            "Opened song catalog at {:?}: {} songs, {} reviews",
            db_path_ref, song_count, review_count
        );

        let mut read_pool = Vec::with_capacity(read_pool_size.max(1));
        for _ in 0..read_pool_size.max(1) {
            let read_conn = Connection::open_with_flags(
                db_path_ref,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            read_conn.pragma_update(None, "journal_mode", "WAL")?;
            read_pool.push(Arc::new(Mutex::new(read_conn)));
        }

        Ok(SqliteCatalogStore {
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_pool,
            read_index: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn get_read_conn(&self) -> Arc<Mutex<Connection>> {
        let index = self.read_index.fetch_add(1, Ordering::SeqCst) % self.read_pool.len();
        self.read_pool[index].clone()
    }

    fn get_song_inner(conn: &Connection, id: Uuid) -> Result<Option<Song>> {
        let result = conn.query_row(
            &format!("SELECT {} FROM songs s WHERE s.id = ?1", SONG_COLUMNS),
            params![id.to_string()],
            parse_song_row,
        );
        match result {
            Ok(song) => Ok(Some(song)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn find_duplicate_inner(conn: &Connection, probe: &DuplicateProbe) -> Result<Option<Song>> {
        let mut conditions = vec!["s.normalized_title = ?1".to_string()];
        let mut values = vec![probe.normalized_title.clone()];

        for (column, field_match) in [
            ("normalized_composer", &probe.composer),
            ("normalized_arranger", &probe.arranger),
        ] {
            if let FieldMatch::Exact(value) = field_match {
                values.push(value.clone());
                conditions.push(format!("s.{} = ?{}", column, values.len()));
            }
        }
        if let Some(exclude_id) = probe.exclude_id {
            values.push(exclude_id.to_string());
            conditions.push(format!("s.id != ?{}", values.len()));
        }

        let sql = format!(
            "SELECT {} FROM songs s WHERE {} ORDER BY s.created_at ASC, s.rowid ASC LIMIT 1",
            SONG_COLUMNS,
            conditions.join(" AND ")
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query_map(params_from_iter(values.iter()), parse_song_row)?;
        match rows.next() {
            Some(song) => Ok(Some(song?)),
            None => Ok(None),
        }
    }

    fn query_stats(&self, sql: &str, values: &[String]) -> Result<Vec<SongWithStats>> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let mut stmt = conn.prepare(sql)?;
        let songs = stmt
            .query_map(params_from_iter(values.iter()), parse_song_with_stats_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(songs)
    }

    fn get_review_inner(conn: &Connection, id: Uuid) -> Result<Option<Review>> {
        let result = conn.query_row(
            &format!("SELECT {} FROM reviews r WHERE r.id = ?1", REVIEW_COLUMNS),
            params![id.to_string()],
            parse_review_row,
        );
        match result {
            Ok(review) => Ok(Some(review)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Runs `f` inside `BEGIN IMMEDIATE` on the write connection.
    fn with_write_transaction<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute("BEGIN IMMEDIATE", [])?;

        let result = f(&*conn).and_then(|value| {
            conn.execute("COMMIT", [])?;
            Ok(value)
        });
        if result.is_err() && !conn.is_autocommit() {
            let _ = conn.execute("ROLLBACK", []);
        }
        result
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn insert_song(&self, id: Uuid, fields: &SongFields) -> Result<SongWrite> {
        let normalized = fields.normalized();
        let probe = DuplicateProbe::strict(&normalized, None);

        self.with_write_transaction(|conn| {
            if let Some(existing) = Self::find_duplicate_inner(conn, &probe)? {
                return Ok(SongWrite::Duplicate(existing));
            }

            let now = now_millis();
            let song = Song {
                id,
                title: fields.title.clone(),
                composer: fields.composer.clone(),
                arranger: fields.arranger.clone(),
                normalized_title: normalized.title.clone(),
                normalized_composer: normalized.composer.clone(),
                normalized_arranger: normalized.arranger.clone(),
                created_at: now,
                updated_at: now,
            };
            let inserted = conn.execute(
                "INSERT INTO songs (id, title, composer, arranger, normalized_title,
                    normalized_composer, normalized_arranger, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    song.id.to_string(),
                    &song.title,
                    &song.composer,
                    &song.arranger,
                    &song.normalized_title,
                    &song.normalized_composer,
                    &song.normalized_arranger,
                    song.created_at,
                    song.updated_at
                ],
            );
            match inserted {
                Ok(_) => {
                    debug!("Inserted song {} ({})", song.id, song.title);
                    Ok(SongWrite::Written(song))
                }
                Err(e) if is_unique_violation(&e) => match Self::find_duplicate_inner(conn, &probe)? {
                    Some(existing) => Ok(SongWrite::Duplicate(existing)),
                    None => Err(e.into()),
                },
                Err(e) => Err(e.into()),
            }
        })
    }

    fn update_song(&self, id: Uuid, fields: &SongFields) -> Result<Option<SongWrite>> {
        let normalized = fields.normalized();
        let probe = DuplicateProbe::strict(&normalized, Some(id));

        self.with_write_transaction(|conn| {
            let Some(current) = Self::get_song_inner(conn, id)? else {
                return Ok(None);
            };
            if let Some(existing) = Self::find_duplicate_inner(conn, &probe)? {
                return Ok(Some(SongWrite::Duplicate(existing)));
            }

            let song = Song {
                title: fields.title.clone(),
                composer: fields.composer.clone(),
                arranger: fields.arranger.clone(),
                normalized_title: normalized.title.clone(),
                normalized_composer: normalized.composer.clone(),
                normalized_arranger: normalized.arranger.clone(),
                updated_at: now_millis(),
                ..current
            };
            let updated = conn.execute(
                "UPDATE songs SET title = ?1, composer = ?2, arranger = ?3, normalized_title = ?4,
                    normalized_composer = ?5, normalized_arranger = ?6, updated_at = ?7
                 WHERE id = ?8",
                params![
                    &song.title,
                    &song.composer,
                    &song.arranger,
                    &song.normalized_title,
                    &song.normalized_composer,
                    &song.normalized_arranger,
                    song.updated_at,
                    id.to_string()
                ],
            );
            match updated {
                Ok(_) => Ok(Some(SongWrite::Written(song))),
                Err(e) if is_unique_violation(&e) => match Self::find_duplicate_inner(conn, &probe)? {
                    Some(existing) => Ok(Some(SongWrite::Duplicate(existing))),
                    None => Err(e.into()),
                },
                Err(e) => Err(e.into()),
            }
        })
    }

    fn get_song(&self, id: Uuid) -> Result<Option<Song>> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        Self::get_song_inner(&conn, id)
    }

    fn get_song_with_stats(&self, id: Uuid) -> Result<Option<SongWithStats>> {
        let sql = format!(
            "SELECT {}, COUNT(r.id), AVG(r.overall_rating) {} WHERE s.id = ?1 GROUP BY s.id",
            SONG_COLUMNS, SONG_STATS_FROM
        );
        Ok(self.query_stats(&sql, &[id.to_string()])?.into_iter().next())
    }

    fn delete_song(&self, id: Uuid) -> Result<bool> {
        let conn = self.write_conn.lock().unwrap();
        let deleted = conn
            .execute("DELETE FROM songs WHERE id = ?1", params![id.to_string()])
            .context("Failed to delete song")?;
        Ok(deleted > 0)
    }

    fn get_songs_count(&self) -> usize {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM songs", [], |r| r.get::<_, i64>(0))
            .unwrap_or(0) as usize
    }

    fn find_duplicate(&self, probe: &DuplicateProbe) -> Result<Option<Song>> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        Self::find_duplicate_inner(&conn, probe)
    }

    fn query_songs(&self, query: &SongQuery) -> Result<Vec<SongWithStats>> {
        let mut conditions: Vec<String> = Vec::new();
        let mut values: Vec<String> = Vec::new();

        for clause in &query.all_of {
            if clause.fields.is_empty() {
                continue;
            }
            let pattern = contains_pattern(&clause.needle);
            let alternatives: Vec<String> = clause
                .fields
                .iter()
                .map(|field| {
                    values.push(pattern.clone());
                    format!(
                        "s.{} LIKE ?{} ESCAPE '\\'",
                        field.normalized_column(),
                        values.len()
                    )
                })
                .collect();
            conditions.push(format!("({})", alternatives.join(" OR ")));
        }

        if !query.reviewed_with_any_tag.is_empty() {
            let placeholders: Vec<String> = query
                .reviewed_with_any_tag
                .iter()
                .map(|tag| {
                    values.push(tag.clone());
                    format!("?{}", values.len())
                })
                .collect();
            conditions.push(format!(
                "s.id IN (SELECT tr.song_id FROM reviews tr, json_each(tr.tags) jt \
                 WHERE jt.value IN ({}))",
                placeholders.join(", ")
            ));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT {}, COUNT(r.id), AVG(r.overall_rating) {}{} \
             GROUP BY s.id ORDER BY s.created_at DESC, s.rowid DESC",
            SONG_COLUMNS, SONG_STATS_FROM, where_clause
        );
        debug!("query_songs: {} with {} params", sql, values.len());
        self.query_stats(&sql, &values)
    }

    fn review_tags_by_song(&self, song_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Vec<String>>>> {
        let mut by_song: HashMap<Uuid, Vec<Vec<String>>> = HashMap::new();
        if song_ids.is_empty() {
            return Ok(by_song);
        }

        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        for chunk in song_ids.chunks(IN_CHUNK_SIZE) {
            let placeholders: Vec<String> = (1..=chunk.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT r.song_id, r.tags FROM reviews r WHERE r.song_id IN ({}) \
                 ORDER BY r.created_at ASC, r.rowid ASC",
                placeholders.join(", ")
            );
            let ids: Vec<String> = chunk.iter().map(Uuid::to_string).collect();
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(ids.iter()), |row| {
                Ok((parse_uuid(0, row.get(0)?)?, parse_tags(1, row.get(1)?)?))
            })?;
            for row in rows {
                let (song_id, tags) = row?;
                by_song.entry(song_id).or_default().push(tags);
            }
        }
        Ok(by_song)
    }

    fn autocomplete_values(
        &self,
        field: SongField,
        normalized_needle: &str,
        limit: usize,
    ) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT DISTINCT {col} FROM songs \
             WHERE {ncol} LIKE ?1 ESCAPE '\\' AND {col} IS NOT NULL AND TRIM({col}) != '' \
             ORDER BY {col} LIMIT ?2",
            col = field.column(),
            ncol = field.normalized_column()
        );
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let values = stmt
            .query_map(
                params![contains_pattern(normalized_needle), limit as i64],
                |row| row.get::<_, String>(0),
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(values)
    }

    fn recent_songs(&self, limit: usize) -> Result<Vec<SongWithStats>> {
        let sql = format!(
            "SELECT {}, COUNT(r.id), AVG(r.overall_rating) {} \
             GROUP BY s.id ORDER BY s.created_at DESC, s.rowid DESC LIMIT {}",
            SONG_COLUMNS, SONG_STATS_FROM, limit
        );
        self.query_stats(&sql, &[])
    }

    fn most_reviewed_songs(&self, limit: usize) -> Result<Vec<SongWithStats>> {
        let sql = format!(
            "SELECT {}, COUNT(r.id), AVG(r.overall_rating) {} \
             GROUP BY s.id HAVING COUNT(r.id) > 0 \
             ORDER BY COUNT(r.id) DESC, s.created_at DESC, s.rowid DESC LIMIT {}",
            SONG_COLUMNS, SONG_STATS_FROM, limit
        );
        self.query_stats(&sql, &[])
    }

    fn insert_review(&self, review: &Review) -> Result<ReviewWrite> {
        let tags = serde_json::to_string(&review.tags)?;
        self.with_write_transaction(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM reviews WHERE user_id = ?1 AND song_id = ?2)",
                params![review.user_id, review.song_id.to_string()],
                |r| r.get(0),
            )?;
            if exists {
                return Ok(ReviewWrite::AlreadyReviewed);
            }

            let inserted = conn.execute(
                "INSERT INTO reviews (id, song_id, user_id, tempo_rating, fingering_technique_rating,
                    plucking_technique_rating, expression_rating, memorization_rating,
                    overall_rating, summary, tags, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    review.id.to_string(),
                    review.song_id.to_string(),
                    review.user_id,
                    review.ratings.tempo_rating,
                    review.ratings.fingering_technique_rating,
                    review.ratings.plucking_technique_rating,
                    review.ratings.expression_rating,
                    review.ratings.memorization_rating,
                    review.overall_rating,
                    &review.summary,
                    &tags,
                    review.created_at,
                    review.updated_at
                ],
            );
            match inserted {
                Ok(_) => Ok(ReviewWrite::Written(review.clone())),
                Err(e) if is_unique_violation(&e) => Ok(ReviewWrite::AlreadyReviewed),
                Err(e) => Err(e).context("Failed to insert review"),
            }
        })
    }

    fn update_review(&self, review: &Review) -> Result<bool> {
        let tags = serde_json::to_string(&review.tags)?;
        let conn = self.write_conn.lock().unwrap();
        let updated = conn
            .execute(
                "UPDATE reviews SET tempo_rating = ?1, fingering_technique_rating = ?2,
                    plucking_technique_rating = ?3, expression_rating = ?4,
                    memorization_rating = ?5, overall_rating = ?6, summary = ?7, tags = ?8,
                    updated_at = ?9
                 WHERE id = ?10",
                params![
                    review.ratings.tempo_rating,
                    review.ratings.fingering_technique_rating,
                    review.ratings.plucking_technique_rating,
                    review.ratings.expression_rating,
                    review.ratings.memorization_rating,
                    review.overall_rating,
                    &review.summary,
                    &tags,
                    review.updated_at,
                    review.id.to_string()
                ],
            )
            .context("Failed to update review")?;
        Ok(updated > 0)
    }

    fn get_review(&self, id: Uuid) -> Result<Option<Review>> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        Self::get_review_inner(&conn, id)
    }

    fn delete_review(&self, id: Uuid) -> Result<bool> {
        let conn = self.write_conn.lock().unwrap();
        let deleted = conn
            .execute("DELETE FROM reviews WHERE id = ?1", params![id.to_string()])
            .context("Failed to delete review")?;
        Ok(deleted > 0)
    }

    fn list_song_reviews(&self, song_id: Uuid, tag: Option<&str>) -> Result<Vec<Review>> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let mut values = vec![song_id.to_string()];
        let mut sql = format!("SELECT {} FROM reviews r WHERE r.song_id = ?1", REVIEW_COLUMNS);
        if let Some(tag) = tag {
            values.push(tag.to_string());
            sql.push_str(" AND EXISTS (SELECT 1 FROM json_each(r.tags) jt WHERE jt.value = ?2)");
        }
        sql.push_str(" ORDER BY r.created_at DESC, r.rowid DESC");

        let mut stmt = conn.prepare(&sql)?;
        let reviews = stmt
            .query_map(params_from_iter(values.iter()), parse_review_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reviews)
    }

    fn find_review_by_author(&self, song_id: Uuid, user_id: i64) -> Result<Option<Review>> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let result = conn.query_row(
            &format!(
                "SELECT {} FROM reviews r WHERE r.song_id = ?1 AND r.user_id = ?2",
                REVIEW_COLUMNS
            ),
            params![song_id.to_string(), user_id],
            parse_review_row,
        );
        match result {
            Ok(review) => Ok(Some(review)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete_reviews_by_author(&self, user_id: i64) -> Result<usize> {
        let conn = self.write_conn.lock().unwrap();
        let deleted = conn
            .execute("DELETE FROM reviews WHERE user_id = ?1", params![user_id])
            .context("Failed to delete reviews by author")?;
        info!("Deleted {} reviews of user {}", deleted, user_id);
        Ok(deleted)
    }
}
