//! Tag stage of song search.
//!
//! Phase A narrows candidates in the store to songs with at least one review
//! carrying any selected tag. Phase B keeps only songs whose top tags contain
//! every selected tag.

use crate::catalog_store::SongWithStats;
use std::collections::HashMap;
use uuid::Uuid;

/// Decode one raw tag parameter.
///
/// Values wrapped in `[` `]` are read as a JSON array of strings; if that
/// fails the raw value is a single tag. Anything else is a single tag.
pub fn parse_tag_param(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        match serde_json::from_str::<Vec<String>>(trimmed) {
            Ok(tags) => return tags,
            Err(_) => return vec![raw.to_string()],
        }
    }
    vec![raw.to_string()]
}

/// Tags a search is filtered by, de-duplicated in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectedTags(Vec<String>);

impl SelectedTags {
    /// `tag` takes precedence over `tags` when it is not blank.
    pub fn from_params(tag: Option<&str>, tags: Option<&str>) -> Self {
        let raw = [tag, tags]
            .into_iter()
            .flatten()
            .find(|value| !value.trim().is_empty());
        match raw {
            Some(raw) => Self::new(parse_tag_param(raw)),
            None => SelectedTags::default(),
        }
    }

    pub fn new(tags: Vec<String>) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(tags.len());
        for tag in tags {
            if !tag.trim().is_empty() && !unique.contains(&tag) {
                unique.push(tag);
            }
        }
        SelectedTags(unique)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    /// Phase A: tags of which a candidate's reviews must carry at least one.
    pub fn any_review_tags(&self) -> Vec<String> {
        self.0.clone()
    }

    /// Phase B predicate.
    pub fn all_within(&self, top_tags: &[String]) -> bool {
        self.0.iter().all(|tag| top_tags.contains(tag))
    }
}

/// Phase B: keep songs whose top tags contain every selected tag.
/// With no selected tags every song is kept.
pub fn retain_top_tag_matches(
    songs: Vec<SongWithStats>,
    top_tags: &HashMap<Uuid, Vec<String>>,
    selected: &SelectedTags,
) -> Vec<SongWithStats> {
    if selected.is_empty() {
        return songs;
    }
    songs
        .into_iter()
        .filter(|song| {
            let tags = top_tags
                .get(&song.song.id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            selected.all_within(tags)
        })
        .collect()
}
