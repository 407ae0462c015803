//! Page state machine for the catalog listing.
//!
//! The pager never performs I/O. Every navigation action hands back a
//! [`PageTicket`]; the caller runs the fetch (see [`CatalogFetcher::fetch`])
//! and passes the result to [`CatalogPager::resolve`]. Only the most recently
//! issued ticket is accepted, so a slow response for an older page can never
//! overwrite a newer one.
//!
//! [`CatalogFetcher::fetch`]: crate::catalog::CatalogFetcher::fetch

use crate::error::{CatalogError, CatalogResult};
use crate::genres::GenreResolver;
use crate::models::{poster_url, Entry, EntryId, PageIndex, PageState};
use crate::watchlist::Watchlist;
use serde::Serialize;
use tracing::debug;

/// Handle for one outstanding page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTicket {
    token: u64,
    page: PageIndex,
}

impl PageTicket {
    pub fn page(&self) -> PageIndex {
        self.page
    }
}

/// A catalog entry as shown on the page, annotated for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogCard {
    pub entry: Entry,
    pub genre: String,
    pub in_watchlist: bool,
    pub poster_url: Option<String>,
    pub rating: String,
    pub popularity: String,
}

impl CatalogCard {
    pub fn new(
        entry: Entry,
        in_watchlist: bool,
        genres: &GenreResolver,
        image_base: &str,
    ) -> Self {
        Self {
            genre: genres.resolve(&entry.genre_ids).to_string(),
            poster_url: poster_url(image_base, entry.poster_path.as_deref()),
            rating: entry.rating_label(),
            popularity: entry.popularity_label(),
            in_watchlist,
            entry,
        }
    }
}

#[derive(Debug)]
pub struct CatalogPager {
    page: PageIndex,
    state: Option<PageState>,
    issued: u64,
    outstanding: Option<u64>,
}

impl Default for CatalogPager {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogPager {
    /// Idle, positioned on page 1.
    pub fn new() -> Self {
        Self {
            page: PageIndex::FIRST,
            state: None,
            issued: 0,
            outstanding: None,
        }
    }

    pub fn page_index(&self) -> PageIndex {
        self.page
    }

    /// `None` while idle.
    pub fn state(&self) -> Option<&PageState> {
        self.state.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.state.is_none()
    }

    /// Requests the current page; used for the first load.
    pub fn start(&mut self) -> PageTicket {
        self.request(self.page)
    }

    pub fn next_page(&mut self) -> PageTicket {
        self.request(self.page.next())
    }

    /// No-op on page 1.
    pub fn previous_page(&mut self) -> Option<PageTicket> {
        let previous = self.page.previous()?;
        Some(self.request(previous))
    }

    /// Re-issues the current page even though the index is unchanged.
    pub fn retry(&mut self) -> PageTicket {
        self.request(self.page)
    }

    pub fn go_to(&mut self, page_index: i64) -> CatalogResult<PageTicket> {
        let page = PageIndex::new(page_index)?;
        Ok(self.request(page))
    }

    fn request(&mut self, page: PageIndex) -> PageTicket {
        self.issued += 1;
        if let Some(stale) = self.outstanding.replace(self.issued) {
            debug!("Request {} superseded by page {}", stale, page);
        }
        self.page = page;
        self.state = Some(PageState::Loading);
        PageTicket {
            token: self.issued,
            page,
        }
    }

    /// Applies a fetch result. Returns `false` (and changes nothing) when the
    /// ticket has been superseded or already resolved.
    pub fn resolve(&mut self, ticket: PageTicket, outcome: PageState) -> bool {
        if self.outstanding != Some(ticket.token) {
            debug!(
                "Discarding stale result for page {} (request {})",
                ticket.page, ticket.token
            );
            return false;
        }
        self.outstanding = None;
        self.state = Some(outcome);
        true
    }

    pub fn entries(&self) -> &[Entry] {
        match &self.state {
            Some(PageState::Loaded { entries, .. }) => entries,
            _ => &[],
        }
    }

    pub fn cards(
        &self,
        watchlist: &Watchlist,
        genres: &GenreResolver,
        image_base: &str,
    ) -> Vec<CatalogCard> {
        self.entries()
            .iter()
            .map(|entry| {
                let in_watchlist = watchlist.contains(&entry.id);
                CatalogCard::new(entry.clone(), in_watchlist, genres, image_base)
            })
            .collect()
    }

    /// Toggles watchlist membership of an entry on the loaded page.
    pub fn toggle_membership(
        &self,
        id: &EntryId,
        watchlist: &mut Watchlist,
    ) -> CatalogResult<bool> {
        let entry = self
            .entries()
            .iter()
            .find(|e| &e.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("entry {id} is not on the current page")))?;
        watchlist.toggle(entry)
    }
}
