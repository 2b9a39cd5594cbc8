//! Average-difficulty range stage of song search.

use crate::catalog_store::SongWithStats;

/// Inclusive bounds on a song's average overall rating. A missing bound is
/// open.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DifficultyRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Longest leading decimal number of `s`, or 0 when there is none.
/// `"2abc"` reads as 2 and `"hard"` as 0.
fn leading_number(s: &str) -> f64 {
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_end = digits_from(end);
    let mut has_digits = int_end > end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if frac_end > end + 1 {
            has_digits = true;
            end = frac_end;
        }
    }
    if !has_digits {
        return 0.0;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().unwrap_or(0.0)
}

/// Blank means absent; anything else is a bound.
fn parse_bound(raw: Option<&str>) -> Option<f64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(leading_number)
}

impl DifficultyRange {
    /// Blank bounds are absent; text that is not a number reads as its
    /// numeric prefix, or 0.
    pub fn from_params(min: Option<&str>, max: Option<&str>) -> Self {
        DifficultyRange {
            min: parse_bound(min),
            max: parse_bound(max),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Songs without a positive average never match a bounded range.
    pub fn contains(&self, song: &SongWithStats) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let Some(average) = song.average_overall_rating.filter(|_| song.has_average()) else {
            return false;
        };
        average > 0.0
            && average >= self.min.unwrap_or(f64::NEG_INFINITY)
            && average <= self.max.unwrap_or(f64::INFINITY)
    }
}

pub fn retain_in_range(songs: Vec<SongWithStats>, range: &DifficultyRange) -> Vec<SongWithStats> {
    if range.is_unbounded() {
        return songs;
    }
    songs.into_iter().filter(|song| range.contains(song)).collect()
}
