//! Free-text stage of song search.
//!
//! Field mode applies when any of title, composer or arranger is given;
//! otherwise the `query` string is split into keywords. Every input is
//! normalized before it reaches the store, which matches it as a substring of
//! the normalized columns.

use crate::catalog_store::{ContainsClause, SongField};
use crate::normalize::{is_blank, normalize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextMatch {
    /// Each keyword must appear in at least one of title, composer, arranger.
    Keywords(Vec<String>),
    /// Each listed field must contain its value.
    Fields(Vec<(SongField, String)>),
}

impl TextMatch {
    pub fn from_params(
        query: Option<&str>,
        title: Option<&str>,
        composer: Option<&str>,
        arranger: Option<&str>,
    ) -> Self {
        if [title, composer, arranger].iter().any(|v| !is_blank(*v)) {
            Self::fields(title, composer, arranger)
        } else {
            Self::keywords(query)
        }
    }

    /// Split on whitespace runs, normalize each token, drop empty ones.
    pub fn keywords(query: Option<&str>) -> Self {
        let tokens = query
            .unwrap_or_default()
            .split_whitespace()
            .map(normalize)
            .filter(|token| !token.is_empty())
            .collect();
        TextMatch::Keywords(tokens)
    }

    pub fn fields(title: Option<&str>, composer: Option<&str>, arranger: Option<&str>) -> Self {
        let constraints = [
            (SongField::Title, title),
            (SongField::Composer, composer),
            (SongField::Arranger, arranger),
        ]
        .into_iter()
        .filter_map(|(field, value)| {
            let normalized = normalize(value?);
            (!normalized.is_empty()).then_some((field, normalized))
        })
        .collect();
        TextMatch::Fields(constraints)
    }

    /// True when no text constraint applies and every song matches.
    /// Store predicates, all of which must hold.
    pub fn clauses(&self) -> Vec<ContainsClause> {
        match self {
            TextMatch::Keywords(tokens) => tokens
                .iter()
                .map(|token| ContainsClause {
                    fields: SongField::ALL.to_vec(),
                    needle: token.clone(),
                })
                .collect(),
            TextMatch::Fields(constraints) => constraints
                .iter()
                .map(|(field, value)| ContainsClause {
                    fields: vec![*field],
                    needle: value.clone(),
                })
                .collect(),
        }
    }
}
