use crate::models::Entry;
use std::collections::{HashMap, HashSet};

pub const ALL_KEY: &str = "watchlist.allGenres";
pub const UNKNOWN_KEY: &str = "genres.unknown";

/// TMDB movie genres: (id, translation key, English label).
const TMDB_MOVIE_GENRES: &[(i64, &str, &str)] = &[
    (28, "genres.action", "Action"),
    (12, "genres.adventure", "Adventure"),
    (16, "genres.animation", "Animation"),
    (35, "genres.comedy", "Comedy"),
    (80, "genres.crime", "Crime"),
    (99, "genres.documentary", "Documentary"),
    (18, "genres.drama", "Drama"),
    (10751, "genres.family", "Family"),
    (14, "genres.fantasy", "Fantasy"),
    (36, "genres.history", "History"),
    (27, "genres.horror", "Horror"),
    (10402, "genres.music", "Music"),
    (9648, "genres.mystery", "Mystery"),
    (10749, "genres.romance", "Romance"),
    (878, "genres.sciFi", "Science Fiction"),
    (10770, "genres.tvMovie", "TV Movie"),
    (53, "genres.thriller", "Thriller"),
    (10752, "genres.war", "War"),
    (37, "genres.western", "Western"),
];

/// Maps genre ids to display labels. Stateless after construction.
#[derive(Debug, Clone)]
pub struct GenreResolver {
    labels: HashMap<i64, String>,
    order: Vec<i64>,
    unknown: String,
    all: String,
}

impl Default for GenreResolver {
    fn default() -> Self {
        Self::english()
    }
}

impl GenreResolver {
    pub fn english() -> Self {
        Self::with_lookup(|_| None)
    }

    /// Labels come from `lookup(key)`; keys it does not know fall back to English.
    pub fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut labels = HashMap::with_capacity(TMDB_MOVIE_GENRES.len());
        let mut order = Vec::with_capacity(TMDB_MOVIE_GENRES.len());
        for (id, key, english) in TMDB_MOVIE_GENRES {
            let label = lookup(key).unwrap_or_else(|| english.to_string());
            labels.insert(*id, label);
            order.push(*id);
        }
        Self {
            labels,
            order,
            unknown: lookup(UNKNOWN_KEY).unwrap_or_else(|| "Unknown".to_string()),
            all: lookup(ALL_KEY).unwrap_or_else(|| "All".to_string()),
        }
    }

    pub fn unknown_label(&self) -> &str {
        &self.unknown
    }

    pub fn all_label(&self) -> &str {
        &self.all
    }

    pub fn label_for(&self, genre_id: i64) -> Option<&str> {
        self.labels.get(&genre_id).map(String::as_str)
    }

    /// Label of the first id that has a mapping, otherwise the unknown sentinel.
    pub fn resolve(&self, genre_ids: &[i64]) -> &str {
        genre_ids
            .iter()
            .find_map(|id| self.label_for(*id))
            .unwrap_or(&self.unknown)
    }

    /// The "All" wildcard followed by every known label, in catalogue order.
    pub fn list_known_labels(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        std::iter::once(self.all.as_str())
            .chain(self.order.iter().filter_map(|id| self.label_for(*id)))
            .filter(|label| seen.insert(*label))
            .map(str::to_string)
            .collect()
    }

    /// The "All" wildcard followed by the labels actually present in `entries`,
    /// first-seen order. Entries with no resolvable genre are skipped.
    pub fn labels_in<'a, I>(&self, entries: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a Entry>,
    {
        let mut labels = vec![self.all.clone()];
        for entry in entries {
            let label = self.resolve(&entry.genre_ids);
            if label == self.unknown || labels.iter().any(|l| l == label) {
                continue;
            }
            labels.push(label.to_string());
        }
        labels
    }
}
