//! Song search pipeline.
//!
//! Stages run in this order:
//! 1. text matching and tag phase A, both pushed down to the store
//! 2. difficulty range over the aggregated average rating
//! 3. tag phase B over each candidate's top tags
//! 4. pagination

use super::autocomplete::autocomplete;
use super::difficulty::{retain_in_range, DifficultyRange};
use super::tag_filter::{retain_top_tag_matches, SelectedTags};
use super::text_match::TextMatch;
use super::top_tags::top_tags_by_song;
use crate::catalog_store::{CatalogStore, SongQuery, SongWithStats};
use crate::config::SearchSettings;
use anyhow::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Raw search parameters as received from a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub title: Option<String>,
    pub composer: Option<String>,
    pub arranger: Option<String>,
    pub tag: Option<String>,
    pub tags: Option<String>,
    pub min_difficulty: Option<String>,
    pub max_difficulty: Option<String>,
    pub page: Option<String>,
}

/// A matching song with its top tags.
#[derive(Debug, Clone, PartialEq)]
pub struct SongHit {
    pub song: SongWithStats,
    pub top_tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Newest first.
    pub songs: Vec<SongHit>,
    pub selected_tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    pub songs: Vec<SongHit>,
    pub selected_tags: Vec<String>,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub total_count: usize,
}

/// 1-based page number; missing or invalid values mean the first page.
pub fn parse_page(raw: Option<&str>) -> usize {
    raw.and_then(|p| p.trim().parse::<usize>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1)
}

fn attach_top_tags(
    songs: Vec<SongWithStats>,
    mut top_tags: HashMap<Uuid, Vec<String>>,
) -> Vec<SongHit> {
    songs
        .into_iter()
        .map(|song| SongHit {
            top_tags: top_tags.remove(&song.song.id).unwrap_or_default(),
            song,
        })
        .collect()
}

#[derive(Clone)]
pub struct SearchEngine {
    store: Arc<dyn CatalogStore>,
    settings: SearchSettings,
}

impl SearchEngine {
    pub fn new(store: Arc<dyn CatalogStore>, settings: SearchSettings) -> Self {
        SearchEngine { store, settings }
    }

    /// Top tags of each song, for songs that have tagged reviews.
    pub fn top_tags_for(&self, songs: &[SongWithStats]) -> Result<HashMap<Uuid, Vec<String>>> {
        let ids: Vec<Uuid> = songs.iter().map(|s| s.song.id).collect();
        let review_tags = self.store.review_tags_by_song(&ids)?;
        Ok(top_tags_by_song(&review_tags, self.settings.top_tags_count))
    }

    /// Attach top tags to songs, keeping their order.
    pub fn with_top_tags(&self, songs: Vec<SongWithStats>) -> Result<Vec<SongHit>> {
        let top_tags = self.top_tags_for(&songs)?;
        Ok(attach_top_tags(songs, top_tags))
    }

    pub fn search(&self, params: &SearchParams) -> Result<SearchOutcome> {
        let text = TextMatch::from_params(
            params.query.as_deref(),
            params.title.as_deref(),
            params.composer.as_deref(),
            params.arranger.as_deref(),
        );
        let selected = SelectedTags::from_params(params.tag.as_deref(), params.tags.as_deref());
        let range = DifficultyRange::from_params(
            params.min_difficulty.as_deref(),
            params.max_difficulty.as_deref(),
        );

        let query = SongQuery {
            all_of: text.clauses(),
            reviewed_with_any_tag: selected.any_review_tags(),
        };
        let candidates = self.store.query_songs(&query)?;
        let candidate_count = candidates.len();

        let in_range = retain_in_range(candidates, &range);
        let top_tags = self.top_tags_for(&in_range)?;
        let matched = retain_top_tag_matches(in_range, &top_tags, &selected);

        debug!(
            "Search {:?} tags {:?} range {:?}: {} candidates, {} matched",
            text,
            selected.as_slice(),
            range,
            candidate_count,
            matched.len()
        );

        Ok(SearchOutcome {
            songs: attach_top_tags(matched, top_tags),
            selected_tags: selected.into_vec(),
        })
    }

    pub fn search_page(&self, params: &SearchParams) -> Result<SearchPage> {
        let outcome = self.search(params)?;
        let per_page = self.settings.per_page.max(1);
        let page = parse_page(params.page.as_deref());
        let total_count = outcome.songs.len();
        let total_pages = total_count.div_ceil(per_page);

        let songs = outcome
            .songs
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .collect();
        Ok(SearchPage {
            songs,
            selected_tags: outcome.selected_tags,
            page,
            per_page,
            total_pages,
            total_count,
        })
    }

    pub fn autocomplete(&self, field: &str, query: Option<&str>) -> Result<Vec<String>> {
        autocomplete(
            self.store.as_ref(),
            field,
            query,
            self.settings.autocomplete_limit,
        )
    }
}
