//! Most frequent tags across a song's reviews.

use std::collections::HashMap;
use uuid::Uuid;

/// The `k` most frequent tags in `review_tags`.
///
/// Ties keep first-seen order: reviews are visited in the order given and
/// tags in each review's own order.
pub fn top_tags(review_tags: &[Vec<String>], k: usize) -> Vec<String> {
    // tag -> (count, first seen position)
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut position = 0;
    for tags in review_tags {
        for tag in tags {
            counts
                .entry(tag.as_str())
                .and_modify(|(count, _)| *count += 1)
                .or_insert((1, position));
            position += 1;
        }
    }

    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(tag, (count, first_seen))| (tag, count, first_seen))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked
        .into_iter()
        .take(k)
        .map(|(tag, ..)| tag.to_string())
        .collect()
}

/// [`top_tags`] for every song in `review_tags_by_song`.
pub fn top_tags_by_song(
    review_tags_by_song: &HashMap<Uuid, Vec<Vec<String>>>,
    k: usize,
) -> HashMap<Uuid, Vec<String>> {
    review_tags_by_song
        .iter()
        .map(|(song_id, review_tags)| (*song_id, top_tags(review_tags, k)))
        .collect()
}
