mod autocomplete;
mod difficulty;
mod engine;
mod tag_filter;
mod text_match;
mod top_tags;

pub use autocomplete::autocomplete;
pub use difficulty::{retain_in_range, DifficultyRange};
pub use engine::{parse_page, SearchEngine, SearchOutcome, SearchPage, SearchParams, SongHit};
pub use tag_filter::{parse_tag_param, retain_top_tag_matches, SelectedTags};
pub use text_match::TextMatch;
pub use top_tags::{top_tags, top_tags_by_song};
