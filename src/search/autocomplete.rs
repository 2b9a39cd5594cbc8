//! Field value suggestions for the search form.

use crate::catalog_store::{CatalogStore, SongField};
use crate::normalize::normalize;
use anyhow::Result;

/// Distinct original values of `field` whose normalized form contains the
/// normalized query. Unknown fields and blank queries give no suggestions.
pub fn autocomplete(
    store: &dyn CatalogStore,
    field: &str,
    query: Option<&str>,
    limit: usize,
) -> Result<Vec<String>> {
    let Some(field) = SongField::from_param(field) else {
        return Ok(Vec::new());
    };
    let needle = normalize(query.unwrap_or_default());
    if needle.is_empty() {
        return Ok(Vec::new());
    }
    store.autocomplete_values(field, &needle, limit)
}
