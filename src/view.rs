//! Derived, read-only projection of the watchlist for display.

use crate::error::{CatalogError, CatalogResult};
use crate::genres::GenreResolver;
use crate::models::Entry;
use serde::Serialize;
use std::cmp::Ordering;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    None,
    Rating,
    Popularity,
}

impl FromStr for SortKey {
    type Err = CatalogError;

    fn from_str(s: &str) -> CatalogResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(SortKey::None),
            "rating" => Ok(SortKey::Rating),
            "popularity" => Ok(SortKey::Popularity),
            other => Err(CatalogError::invalid(format!("unknown sort key '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenreFilter {
    #[default]
    All,
    Label(String),
}

impl GenreFilter {
    /// Treats both the literal "All" and the resolver's (possibly localised)
    /// wildcard label as the wildcard.
    pub fn from_label(label: &str, genres: &GenreResolver) -> Self {
        if label.is_empty() || label == "All" || label == genres.all_label() {
            GenreFilter::All
        } else {
            GenreFilter::Label(label.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ViewFilter {
    pub search_text: String,
    pub genre: GenreFilter,
    pub sort: SortKey,
}

impl ViewFilter {
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    pub fn genre(mut self, genre: GenreFilter) -> Self {
        self.genre = genre;
        self
    }

    pub fn sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }
}

/// Applies genre filter, then title search, then a stable descending sort.
pub fn project(snapshot: &[Entry], filter: &ViewFilter, genres: &GenreResolver) -> Vec<Entry> {
    let needle = filter.search_text.to_lowercase();
    let mut out: Vec<Entry> = snapshot
        .iter()
        .filter(|entry| match &filter.genre {
            GenreFilter::All => true,
            GenreFilter::Label(label) => genres.resolve(&entry.genre_ids) == label,
        })
        .filter(|entry| needle.is_empty() || entry.title.to_lowercase().contains(&needle))
        .cloned()
        .collect();

    match filter.sort {
        SortKey::None => {}
        SortKey::Rating => out.sort_by(|a, b| descending(a.vote_average, b.vote_average)),
        SortKey::Popularity => out.sort_by(|a, b| descending(a.popularity, b.popularity)),
    }
    out
}

// Missing and NaN values rank below every real number.
fn descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    let a = a.filter(|v| !v.is_nan());
    let b = b.filter(|v| !v.is_nan());
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
