//! Duplicate song detection.
//!
//! Two lookups share one probe builder: the strict one used when saving
//! (blank composer/arranger only match blank values) and the input-driven one
//! behind the live check endpoint (blank inputs match anything).

use crate::catalog_store::{CatalogStore, DuplicateProbe, FieldMatch, Song};
use crate::normalize::{is_blank, normalize, normalize_opt};
use anyhow::Result;
use serde::Serialize;
use uuid::Uuid;

/// Build the probe for a lookup, or `None` when the title is blank.
pub fn build_probe(
    title: Option<&str>,
    composer: Option<&str>,
    arranger: Option<&str>,
    exclude_id: Option<Uuid>,
    skip_blank_fields: bool,
) -> Option<DuplicateProbe> {
    let title = title.filter(|t| !is_blank(Some(*t)))?;

    let field_match = |value: Option<&str>| {
        if skip_blank_fields && is_blank(value) {
            FieldMatch::Any
        } else {
            FieldMatch::Exact(normalize_opt(value))
        }
    };

    Some(DuplicateProbe {
        normalized_title: normalize(title),
        composer: field_match(composer),
        arranger: field_match(arranger),
        exclude_id,
    })
}

/// Earliest-created song sharing the normalized identity of the inputs.
pub fn find_duplicate(
    store: &dyn CatalogStore,
    title: Option<&str>,
    composer: Option<&str>,
    arranger: Option<&str>,
    exclude_id: Option<Uuid>,
    skip_blank_fields: bool,
) -> Result<Option<Song>> {
    match build_probe(title, composer, arranger, exclude_id, skip_blank_fields) {
        Some(probe) => store.find_duplicate(&probe),
        None => Ok(None),
    }
}

/// Lookup for partially filled forms: blank composer or arranger match any value.
pub fn find_duplicate_by_input(
    store: &dyn CatalogStore,
    title: Option<&str>,
    composer: Option<&str>,
    arranger: Option<&str>,
) -> Result<Option<Song>> {
    find_duplicate(store, title, composer, arranger, None, true)
}

/// Response of the live duplicate check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateCheck {
    pub duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

pub fn check_duplicate(
    store: &dyn CatalogStore,
    title: Option<&str>,
    composer: Option<&str>,
    arranger: Option<&str>,
) -> Result<DuplicateCheck> {
    let found = find_duplicate_by_input(store, title, composer, arranger)?;
    Ok(match found {
        Some(_) => DuplicateCheck {
            duplicate: true,
            url: Some(filter_url(title.unwrap_or_default(), composer, arranger)),
        },
        None => DuplicateCheck {
            duplicate: false,
            url: None,
        },
    })
}

/// Song listing URL filtered by the non-blank inputs.
fn filter_url(title: &str, composer: Option<&str>, arranger: Option<&str>) -> String {
    let mut query = vec![format!("title={}", urlencoding::encode(title))];
    for (name, value) in [("composer", composer), ("arranger", arranger)] {
        if let Some(value) = value.filter(|v| !is_blank(Some(*v))) {
            query.push(format!("{}={}", name, urlencoding::encode(value)));
        }
    }
    format!("/v1/songs?{}", query.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::{SongFields, SongWrite, SqliteCatalogStore};
    use tempfile::TempDir;

    fn create_store() -> (TempDir, SqliteCatalogStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteCatalogStore::new(temp_dir.path().join("catalog.db"), 1).unwrap();
        (temp_dir, store)
    }

    fn add_song(
        store: &SqliteCatalogStore,
        title: &str,
        composer: Option<&str>,
        arranger: Option<&str>,
    ) -> Song {
        match store
            .insert_song(Uuid::new_v4(), &SongFields::new(title, composer, arranger))
            .unwrap()
        {
            SongWrite::Written(song) => song,
            SongWrite::Duplicate(_) => panic!("unexpected duplicate"),
        }
    }

    #[test]
    fn blank_title_never_matches() {
        let (_dir, store) = create_store();
        add_song(&store, "Love me", None, None);
        assert!(build_probe(Some("  "), None, None, None, true).is_none());
        assert!(find_duplicate_by_input(&store, None, Some("x"), None)
            .unwrap()
            .is_none());
        assert!(find_duplicate_by_input(&store, Some(""), None, None)
            .unwrap()
            .is_none());
    }

    #[test]
    fn strict_mode_treats_blank_as_value() {
        let (_dir, store) = create_store();
        add_song(&store, "Love me", Some("John Smith"), Some("Jane Doe"));

        assert!(find_duplicate(&store, Some("Love me"), None, None, None, false)
            .unwrap()
            .is_none());
        assert!(find_duplicate(
            &store,
            Some("ＬＯＶＥ　ＭＥ"),
            Some("johnsmith"),
            Some("JANE DOE"),
            None,
            false
        )
        .unwrap()
        .is_some());
    }

    #[test]
    fn strict_mode_does_not_match_stored_blank_against_value() {
        let (_dir, store) = create_store();
        add_song(&store, "Love me", Some("John Smith"), None);

        let found = find_duplicate(
            &store,
            Some("Love me"),
            Some("John Smith"),
            Some("Something"),
            None,
            false,
        )
        .unwrap();
        assert!(found.is_none());
        assert!(
            find_duplicate(&store, Some("Love me"), Some("John Smith"), Some(" "), None, false)
                .unwrap()
                .is_some()
        );
    }

    #[test]
    fn input_mode_treats_blank_as_wildcard() {
        let (_dir, store) = create_store();
        let song = add_song(&store, "Love me", Some("John Smith"), Some("Jane Doe"));

        let found = find_duplicate_by_input(&store, Some("loveme"), None, Some(" ")).unwrap();
        assert_eq!(found.map(|s| s.id), Some(song.id));

        let other = find_duplicate_by_input(&store, Some("loveme"), Some("Mary"), None).unwrap();
        assert!(other.is_none());
    }

    #[test]
    fn excludes_given_song() {
        let (_dir, store) = create_store();
        let song = add_song(&store, "Love me", None, None);
        assert!(find_duplicate(&store, Some("Love me"), None, None, Some(song.id), false)
            .unwrap()
            .is_none());
    }

    #[test]
    fn returns_earliest_match() {
        let (_dir, store) = create_store();
        let first = add_song(&store, "Love me", Some("A"), None);
        add_song(&store, "Love me", Some("B"), None);
        let found = find_duplicate_by_input(&store, Some("Love me"), None, None).unwrap();
        assert_eq!(found.map(|s| s.id), Some(first.id));
    }

    #[test]
    fn check_reports_filter_url_with_present_fields() {
        let (_dir, store) = create_store();
        add_song(&store, "Love me", Some("John Smith"), None);

        let check = check_duplicate(&store, Some("Love me"), Some("John Smith"), Some("")).unwrap();
        assert!(check.duplicate);
        assert_eq!(
            check.url.as_deref(),
            Some("/v1/songs?title=Love%20me&composer=John%20Smith")
        );

        let miss = check_duplicate(&store, Some("Yesterday"), None, None).unwrap();
        assert_eq!(
            serde_json::to_value(&miss).unwrap(),
            serde_json::json!({"duplicate": false})
        );
    }
}
