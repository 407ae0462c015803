use crate::error::{CatalogError, CatalogResult, FailureReason};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

/// Catalog identifier: TMDB hands out integers, other sources may use strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryId {
    Num(i64),
    Text(String),
}

impl EntryId {
    fn is_blank(&self) -> bool {
        matches!(self, EntryId::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryId::Num(n) => write!(f, "{n}"),
            EntryId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for EntryId {
    fn from(n: i64) -> Self {
        EntryId::Num(n)
    }
}

impl FromStr for EntryId {
    type Err = CatalogError;

    fn from_str(s: &str) -> CatalogResult<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(CatalogError::invalid("entry id must not be empty"));
        }
        Ok(trimmed
            .parse::<i64>()
            .map(EntryId::Num)
            .unwrap_or_else(|_| EntryId::Text(trimmed.to_string())))
    }
}

/// A catalog item as received from the listing endpoint. Never mutated after
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub id: EntryId,
    pub title: String,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
    pub popularity: Option<f64>,
    pub genre_ids: Vec<i64>,
}

impl Entry {
    pub fn new(id: impl Into<EntryId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            poster_path: None,
            vote_average: None,
            popularity: None,
            genre_ids: Vec::new(),
        }
    }

    pub fn validate(&self) -> CatalogResult<()> {
        if self.id.is_blank() {
            return Err(CatalogError::invalid(format!(
                "entry '{}' has a blank id",
                self.title
            )));
        }
        Ok(())
    }

    /// One decimal, or "N/A" when the rating is missing or zero.
    pub fn rating_label(&self) -> String {
        match self.vote_average {
            Some(v) if v != 0.0 && v.is_finite() => format!("{v:.1}"),
            _ => "N/A".to_string(),
        }
    }

    /// Rounded to an integer, or "N/A" when missing or zero.
    pub fn popularity_label(&self) -> String {
        match self.popularity {
            Some(p) if p != 0.0 && p.is_finite() => format!("{}", p.round() as i64),
            _ => "N/A".to_string(),
        }
    }
}

/// Wire shape of one row of the listing response.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEntry {
    #[serde(default)]
    pub id: Option<EntryId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub genre_ids: Option<Vec<i64>>,
}

impl TryFrom<RawEntry> for Entry {
    type Error = CatalogError;

    fn try_from(raw: RawEntry) -> CatalogResult<Self> {
        let title = raw.title.unwrap_or_default();
        let id = raw
            .id
            .ok_or_else(|| CatalogError::invalid(format!("entry '{title}' has no id")))?;
        let entry = Entry {
            id,
            title,
            poster_path: raw.poster_path.filter(|p| !p.is_empty()),
            vote_average: raw.vote_average,
            popularity: raw.popularity,
            genre_ids: raw.genre_ids.unwrap_or_default(),
        };
        entry.validate()?;
        Ok(entry)
    }
}

/// 1-based page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PageIndex(NonZeroU32);

impl PageIndex {
    pub const FIRST: PageIndex = PageIndex(NonZeroU32::MIN);

    pub fn new(index: i64) -> CatalogResult<Self> {
        u32::try_from(index)
            .ok()
            .and_then(NonZeroU32::new)
            .map(PageIndex)
            .ok_or_else(|| {
                CatalogError::invalid(format!("page index must be >= 1, got {index}"))
            })
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    pub fn next(self) -> Self {
        PageIndex(self.0.saturating_add(1))
    }

    pub fn previous(self) -> Option<Self> {
        NonZeroU32::new(self.0.get() - 1).map(PageIndex)
    }
}

impl fmt::Display for PageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageState {
    Loading,
    Error {
        reason: FailureReason,
    },
    Loaded {
        page_index: PageIndex,
        entries: Vec<Entry>,
    },
}

/// Builds the display URL for a poster reference. Reachability is not checked.
pub fn poster_url(image_base: &str, poster_path: Option<&str>) -> Option<String> {
    let path = poster_path?.trim_start_matches('/');
    if path.is_empty() {
        return None;
    }
    Some(format!("{}/{}", image_base.trim_end_matches('/'), path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_entry_without_id_is_rejected() {
        let raw: RawEntry = serde_json::from_value(json!({ "title": "Nameless" })).unwrap();
        let err = Entry::try_from(raw).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidArgument(_)));
    }

    #[test]
    fn raw_entry_accepts_numeric_and_string_ids() {
        let raw: RawEntry = serde_json::from_value(json!({
            "id": 438631,
            "title": "Dune",
            "poster_path": "/d5NXSklXo0qyIYkgV94XAgMIckC.jpg",
            "vote_average": 7.8,
            "popularity": 120.5,
            "genre_ids": [878, 12]
        }))
        .unwrap();
        let entry = Entry::try_from(raw).unwrap();
        assert_eq!(entry.id, EntryId::Num(438631));
        assert_eq!(entry.genre_ids, vec![878, 12]);

        let raw: RawEntry =
            serde_json::from_value(json!({ "id": "tt1160419", "title": "Dune", "genre_ids": null }))
                .unwrap();
        let entry = Entry::try_from(raw).unwrap();
        assert_eq!(entry.id, EntryId::Text("tt1160419".into()));
        assert!(entry.genre_ids.is_empty());
    }

    #[test]
    fn blank_string_id_is_malformed() {
        let entry = Entry::new(EntryId::Text("  ".into()), "Blank");
        assert!(entry.validate().is_err());
    }

    #[test]
    fn entry_id_parses_from_path_segments() {
        assert_eq!("42".parse::<EntryId>().unwrap(), EntryId::Num(42));
        assert_eq!(
            "abc".parse::<EntryId>().unwrap(),
            EntryId::Text("abc".into())
        );
        assert!("".parse::<EntryId>().is_err());
    }

    #[test]
    fn page_index_rejects_non_positive() {
        assert!(PageIndex::new(0).is_err());
        assert!(PageIndex::new(-3).is_err());
        assert!(PageIndex::new(i64::from(u32::MAX) + 1).is_err());
        assert_eq!(PageIndex::new(1).unwrap(), PageIndex::FIRST);
        assert_eq!(PageIndex::FIRST.previous(), None);
        assert_eq!(PageIndex::new(3).unwrap().previous(), PageIndex::new(2).ok());
    }

    #[test]
    fn display_labels_match_card_rendering() {
        let mut entry = Entry::new(1, "Dune");
        assert_eq!(entry.rating_label(), "N/A");
        assert_eq!(entry.popularity_label(), "N/A");
        entry.vote_average = Some(8.14);
        entry.popularity = Some(99.6);
        assert_eq!(entry.rating_label(), "8.1");
        assert_eq!(entry.popularity_label(), "100");
    }

    #[test]
    fn poster_url_joins_without_double_slash() {
        assert_eq!(
            poster_url("https://image.tmdb.org/t/p/original/", Some("/abc.jpg")).as_deref(),
            Some("https://image.tmdb.org/t/p/original/abc.jpg")
        );
        assert_eq!(poster_url("https://img", None), None);
        assert_eq!(poster_url("https://img", Some("")), None);
    }
}
